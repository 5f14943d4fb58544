use anyhow::{Context, Result};
use chrono::NaiveDate;
use log::info;

use crate::datetime;
use crate::store::SnapshotRepository;
use crate::summary::{month_calendar, MonthCalendar};

/// 1ヶ月分の日毎の作業時間を出力するためのサブコマンド。
#[derive(Debug, clap::Args)]
pub struct CalendarArgs {
    #[clap(
        short = 'm',
        long = "month",
        help = "Sets the month in the format YYYY-MM (default: this month)",
        parse(try_from_str = parse_month),
    )]
    month: Option<NaiveDate>,
}

pub struct CalendarCommand<'a, T: SnapshotRepository> {
    repository: &'a T,
}

impl<'a, T: SnapshotRepository> CalendarCommand<'a, T> {
    /// 新しい`CalendarCommand`を返す。
    pub fn new(repository: &'a T) -> Self {
        Self { repository }
    }

    /// `calendar`サブコマンドの処理を行う。
    ///
    /// 指定した月の各日について、その日に開始したエントリーと合計時間を返す。
    pub async fn run(&self, args: CalendarArgs) -> Result<MonthCalendar> {
        let now = datetime::now();
        let month = args.month.unwrap_or_else(|| now.date_naive());
        let snapshot = self
            .repository
            .read_snapshot()
            .await
            .context("Failed to read snapshot")?;

        let calendar = month_calendar(
            &snapshot.entries,
            &snapshot.projects,
            month,
            &now.timezone(),
        );
        info!(
            "Calendar for {}: {} days with entries",
            calendar.month.format("%Y-%m"),
            calendar.days.iter().filter(|day| !day.entries.is_empty()).count()
        );

        Ok(calendar)
    }
}

/// `YYYY-MM`形式の月をその月の初日としてパースする。
fn parse_month(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(&format!("{}-01", s), "%Y-%m-%d")
        .with_context(|| format!("Failed to parse month: {}", s))
}
