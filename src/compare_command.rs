use anyhow::{Context, Result};
use chrono::NaiveDate;
use log::info;

use crate::datetime;
use crate::detailed_command::{default_range, parse_date};
use crate::store::SnapshotRepository;
use crate::summary::{compare, CompareBy, ComparisonRow};

/// プロジェクトまたはクライアントを比較するためのサブコマンド。
#[derive(Debug, clap::Args)]
pub struct CompareArgs {
    #[clap(
        short = 'f',
        long = "from",
        help = "Sets the first date in the format YYYY-MM-DD (default: 30 days ago)",
        parse(try_from_str = parse_date),
    )]
    from: Option<NaiveDate>,

    #[clap(
        short = 't',
        long = "to",
        help = "Sets the last date in the format YYYY-MM-DD (default: today)",
        parse(try_from_str = parse_date),
    )]
    to: Option<NaiveDate>,

    #[clap(
        short = 'b',
        long = "by",
        default_value = "projects",
        help = "Compares by projects or clients"
    )]
    by: CompareBy,
}

pub struct CompareCommand<'a, T: SnapshotRepository> {
    repository: &'a T,
}

impl<'a, T: SnapshotRepository> CompareCommand<'a, T> {
    /// 新しい`CompareCommand`を返す。
    pub fn new(repository: &'a T) -> Self {
        Self { repository }
    }

    /// `compare`サブコマンドの処理を行う。
    ///
    /// 範囲内のエントリーをプロジェクトまたはクライアントごとに集計し、売上の降順で返す。
    pub async fn run(&self, args: CompareArgs) -> Result<Vec<ComparisonRow>> {
        let now = datetime::now();
        let range = default_range(&now, args.from, args.to);
        info!("Start at: {}, End at: {}", range.start, range.end);

        let snapshot = self
            .repository
            .read_snapshot()
            .await
            .context("Failed to read snapshot")?;

        let rows = compare(
            &snapshot.entries,
            &snapshot.projects,
            &snapshot.clients,
            &range,
            args.by,
        );
        info!("Compared {} rows by {:?}", rows.len(), args.by);

        Ok(rows)
    }
}
