use anyhow::{Context, Result};
use log::info;

use crate::bucket::WeekStart;
use crate::datetime;
use crate::period::{filter_by_period, Period};
use crate::productivity::{trend, Productivity};
use crate::series::{productivity_series, series, Metric, QuarterBuckets, ReportConfig, Series};
use crate::store::SnapshotRepository;
use crate::summary::{by_client, by_project, totals, GroupTotal, Totals};

/// 期間ごとの集計を出力するためのサブコマンド。
#[derive(Debug, clap::Args)]
pub struct SummaryArgs {
    #[clap(
        short = 'p',
        long = "period",
        default_value = "30days",
        help = "Sets the period: all, 30days, quarter or year"
    )]
    period: Period,

    #[clap(
        short = 'w',
        long = "week-start",
        default_value = "monday",
        help = "Sets the first day of the week"
    )]
    week_start: WeekStart,

    #[clap(
        long = "quarter-buckets",
        default_value = "fixed",
        help = "Buckets the quarter chart by fixed 7-day strides (fixed) or calendar weeks (calendar)"
    )]
    quarter_buckets: QuarterBuckets,

    #[clap(
        short = 'm',
        long = "metric",
        default_value = "earnings",
        help = "Sets the chart metric: earnings or duration"
    )]
    metric: Metric,
}

/// `summary`サブコマンドの結果。
#[derive(Clone, Debug, PartialEq)]
pub struct SummaryReport {
    pub period: Period,
    pub metric: Metric,
    pub totals: Totals,
    pub series: Series,
    pub productivity_series: Series,
    pub productivity: Productivity,
    pub projects: Vec<GroupTotal>,
    pub clients: Vec<GroupTotal>,
}

pub struct SummaryCommand<'a, T: SnapshotRepository> {
    repository: &'a T,
}

impl<'a, T: SnapshotRepository> SummaryCommand<'a, T> {
    /// 新しい`SummaryCommand`を返す。
    ///
    /// # Arguments
    /// * `repository` - スナップショットを読み込むためのリポジトリ
    pub fn new(repository: &'a T) -> Self {
        Self { repository }
    }

    /// `summary`サブコマンドの処理を行う。
    ///
    /// 期間で絞り込んだエントリーの合計、グラフ用の系列、生産性、
    /// プロジェクト・クライアントごとの合計を計算する。
    ///
    /// # Arguments
    ///
    /// * `args` - `summary`サブコマンドの引数
    pub async fn run(&self, args: SummaryArgs) -> Result<SummaryReport> {
        let now = datetime::now();
        let snapshot = self
            .repository
            .read_snapshot()
            .await
            .context("Failed to read snapshot")?;
        info!("Summary for period {} at {}", args.period, now);

        let config = ReportConfig {
            week_start: args.week_start,
            quarter_buckets: args.quarter_buckets,
        };
        let filtered = filter_by_period(&snapshot.entries, args.period, &now);
        info!("Time entries in period: {}", filtered.len());

        Ok(SummaryReport {
            period: args.period,
            metric: args.metric,
            totals: totals(&filtered, &snapshot.projects),
            series: series(
                &snapshot.entries,
                &snapshot.projects,
                args.period,
                &config,
                args.metric,
                &now,
            ),
            productivity_series: productivity_series(&snapshot.entries, args.period, &config, &now),
            productivity: trend(&filtered, &snapshot.entries, args.period, &now),
            projects: by_project(&filtered, &snapshot.projects),
            clients: by_client(&filtered, &snapshot.projects, &snapshot.clients),
        })
    }
}
