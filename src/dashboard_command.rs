use anyhow::{Context, Result};
use log::info;

use crate::bucket::WeekStart;
use crate::datetime;
use crate::series::{weekly_series, Metric, Series};
use crate::store::SnapshotRepository;
use crate::summary::{day_summary, DaySummary};

/// 今日と今週の状況を出力するためのサブコマンド。
#[derive(Debug, clap::Args)]
pub struct DashboardArgs {
    #[clap(
        short = 'w',
        long = "week-start",
        default_value = "monday",
        help = "Sets the first day of the week"
    )]
    week_start: WeekStart,

    #[clap(
        short = 'm',
        long = "metric",
        default_value = "duration",
        help = "Sets the weekly chart metric: earnings or duration"
    )]
    metric: Metric,
}

/// `dashboard`サブコマンドの結果。
#[derive(Clone, Debug, PartialEq)]
pub struct DashboardReport {
    pub today: DaySummary,
    pub metric: Metric,
    pub week: Series,
}

pub struct DashboardCommand<'a, T: SnapshotRepository> {
    repository: &'a T,
}

impl<'a, T: SnapshotRepository> DashboardCommand<'a, T> {
    /// 新しい`DashboardCommand`を返す。
    pub fn new(repository: &'a T) -> Self {
        Self { repository }
    }

    /// `dashboard`サブコマンドの処理を行う。
    ///
    /// Localタイムゾーンで今日開始したエントリーの合計と、今週の日毎の系列を計算する。
    pub async fn run(&self, args: DashboardArgs) -> Result<DashboardReport> {
        let now = datetime::now();
        let snapshot = self
            .repository
            .read_snapshot()
            .await
            .context("Failed to read snapshot")?;
        info!("Dashboard for {} (week starts on {})", now.date_naive(), args.week_start);

        Ok(DashboardReport {
            today: day_summary(
                &snapshot.entries,
                &snapshot.projects,
                now.date_naive(),
                &now.timezone(),
            ),
            metric: args.metric,
            week: weekly_series(
                &snapshot.entries,
                &snapshot.projects,
                args.week_start,
                args.metric,
                &now,
            ),
        })
    }
}
