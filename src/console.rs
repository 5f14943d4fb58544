use std::io::Write;

use anyhow::{Context, Result};
use chrono::{Local, TimeZone};

use crate::dashboard_command::DashboardReport;
use crate::detailed_command::DetailedReport;
use crate::series::{Metric, Series};
use crate::summary::{ComparisonRow, GroupTotal, MonthCalendar};
use crate::summary_command::SummaryReport;

const MILLIS_PER_HOUR: f64 = 3_600_000.0;

/// Consoleにレポートを表示するためのtrait。
pub trait ConsolePresenter {
    /// 期間の集計を表示する。
    fn show_summary(&mut self, report: &SummaryReport) -> Result<()>;

    /// 今日と今週の状況を表示する。
    fn show_dashboard(&mut self, report: &DashboardReport) -> Result<()>;

    /// 絞り込んだタイムエントリーを表示する。
    fn show_detailed(&mut self, report: &DetailedReport) -> Result<()>;

    /// 比較結果を表示する。
    fn show_comparison(&mut self, rows: &[ComparisonRow]) -> Result<()>;

    /// 1ヶ月分の日毎の作業時間を表示する。
    fn show_calendar(&mut self, calendar: &MonthCalendar) -> Result<()>;
}

/// レポートをMarkdownのlist形式で表示する。
///
/// 時間は時間単位、売上は小数点以下2桁で表示する。
pub struct ConsoleMarkdownList<'a, W: Write> {
    writer: &'a mut W,
}

impl<'a, W: Write> ConsoleMarkdownList<'a, W> {
    /// 新しい`ConsoleMarkdownList`を返す。
    pub fn new(writer: &'a mut W) -> Self {
        Self { writer }
    }

    fn show_series(&mut self, title: &str, series: &Series, metric: Option<Metric>) -> Result<()> {
        writeln!(self.writer, "## {}", title).context("Failed to write series title")?;
        for (label, value) in series.labels.iter().zip(&series.values) {
            let value = match metric {
                Some(Metric::Duration) => value / MILLIS_PER_HOUR,
                _ => *value,
            };
            writeln!(self.writer, "- {}: {:.2}", label, value)
                .with_context(|| format!("Failed to write bucket: {}", label))?;
        }
        Ok(())
    }

    fn show_groups(&mut self, title: &str, groups: &[GroupTotal]) -> Result<()> {
        writeln!(self.writer, "## {}", title).context("Failed to write group title")?;
        for group in groups {
            writeln!(
                self.writer,
                "- {}: {:.2}h, {:.2}",
                group.name,
                hours(group.total_time),
                group.total_earnings
            )
            .with_context(|| format!("Failed to write group: {:?}", group))?;
        }
        Ok(())
    }
}

fn hours(millis: i64) -> f64 {
    millis as f64 / MILLIS_PER_HOUR
}

fn clock(millis: i64) -> String {
    Local
        .timestamp_millis_opt(millis)
        .single()
        .map(|datetime| datetime.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| "-".to_string())
}

impl<'a, W: Write> ConsolePresenter for ConsoleMarkdownList<'a, W> {
    fn show_summary(&mut self, report: &SummaryReport) -> Result<()> {
        writeln!(
            self.writer,
            "# Summary ({})\n- time: {:.2}h\n- earnings: {:.2}\n- entries: {}",
            report.period,
            hours(report.totals.total_time),
            report.totals.total_earnings,
            report.totals.entries_found
        )
        .context("Failed to write totals")?;

        let written = if report.productivity.has_data {
            writeln!(
                self.writer,
                "- productivity: {}% ({:+}%)",
                report.productivity.percentage, report.productivity.trend_delta
            )
        } else {
            writeln!(self.writer, "- productivity: no data")
        };
        written.context("Failed to write productivity")?;

        let title = match report.metric {
            Metric::Earnings => "Earnings",
            Metric::Duration => "Hours",
        };
        self.show_series(title, &report.series, Some(report.metric))?;
        self.show_series("Productivity", &report.productivity_series, None)?;
        self.show_groups("Projects", &report.projects)?;
        self.show_groups("Clients", &report.clients)?;

        Ok(())
    }

    fn show_dashboard(&mut self, report: &DashboardReport) -> Result<()> {
        writeln!(
            self.writer,
            "# Today\n- time: {:.2}h\n- billable: {:.2}h\n- non-billable: {:.2}h\n- earnings: {:.2}",
            hours(report.today.total_time),
            hours(report.today.billable_time),
            hours(report.today.non_billable_time),
            report.today.earnings
        )
        .context("Failed to write today's summary")?;

        self.show_series("This week", &report.week, Some(report.metric))
    }

    fn show_detailed(&mut self, report: &DetailedReport) -> Result<()> {
        for entry in &report.entries {
            writeln!(
                self.writer,
                "- {} ~ {}: {}",
                clock(entry.start_time),
                clock(entry.end_time),
                entry.description
            )
            .with_context(|| format!("Failed to write time entry: {:?}", entry))?;
        }
        writeln!(
            self.writer,
            "## Total\n- time: {:.2}h\n- earnings: {:.2}\n- entries: {}",
            hours(report.totals.total_time),
            report.totals.total_earnings,
            report.totals.entries_found
        )
        .context("Failed to write totals")?;

        Ok(())
    }

    fn show_comparison(&mut self, rows: &[ComparisonRow]) -> Result<()> {
        for row in rows {
            writeln!(
                self.writer,
                "- {}: {:.2}h ({:.2}h billable), {:.2}",
                row.name,
                hours(row.time_logged),
                hours(row.billable_time),
                row.total_earnings
            )
            .with_context(|| format!("Failed to write comparison: {:?}", row))?;
        }

        Ok(())
    }

    fn show_calendar(&mut self, calendar: &MonthCalendar) -> Result<()> {
        writeln!(self.writer, "# {}", calendar.month.format("%Y-%m"))
            .context("Failed to write calendar title")?;
        for day in calendar.days.iter().filter(|day| !day.entries.is_empty()) {
            writeln!(
                self.writer,
                "- {}: {:.2}h, {:.2} ({} entries)",
                day.date.format("%m/%d (%a)"),
                hours(day.total_duration),
                day.earnings,
                day.entries.len()
            )
            .with_context(|| format!("Failed to write calendar day: {}", day.key))?;
        }
        writeln!(self.writer, "## Total\n- time: {:.2}h", hours(calendar.total_duration()))
            .context("Failed to write calendar total")?;

        Ok(())
    }
}
