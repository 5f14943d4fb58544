use std::str::FromStr;

use anyhow::anyhow;
use chrono::{DateTime, TimeZone};

use crate::bucket::{days_before, months_before, week_buckets, Bucket, WeekStart, Window};
use crate::earnings::earnings;
use crate::period::{filter_by_period, Period};
use crate::productivity::productivity;
use crate::time_entry::{Project, TimeEntry};

/// 系列として集計する値。
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Metric {
    /// 売上
    #[default]
    Earnings,
    /// 作業時間(ミリ秒)
    Duration,
}

impl Metric {
    fn value(self, entry: &TimeEntry, projects: &[Project]) -> f64 {
        match self {
            Metric::Earnings => earnings(entry, projects),
            Metric::Duration => entry.duration_millis() as f64,
        }
    }

    /// エントリーの値の合計を返す。エントリーがなければ`+0.0`。
    fn total(self, entries: &[TimeEntry], projects: &[Project]) -> f64 {
        entries
            .iter()
            .map(|entry| self.value(entry, projects))
            .fold(0.0, |total, value| total + value)
    }
}

impl FromStr for Metric {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "earnings" => Ok(Metric::Earnings),
            "duration" => Ok(Metric::Duration),
            _ => Err(anyhow!("Unknown metric: {}", s)),
        }
    }
}

/// 四半期のグラフを週ごとに区切る方法。
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum QuarterBuckets {
    /// 今日から7日ずつ遡る固定幅の区間
    #[default]
    FixedStride,
    /// 週の始まりの曜日に揃えた暦週
    CalendarWeeks,
}

impl FromStr for QuarterBuckets {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "fixed" => Ok(QuarterBuckets::FixedStride),
            "calendar" => Ok(QuarterBuckets::CalendarWeeks),
            _ => Err(anyhow!("Unknown quarter bucketing: {}", s)),
        }
    }
}

/// 利用者ごとのレポート設定。
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ReportConfig {
    pub week_start: WeekStart,
    pub quarter_buckets: QuarterBuckets,
}

/// ラベルと値が同じ長さで並ぶ系列。古いバケットが先頭。
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Series {
    pub labels: Vec<String>,
    pub values: Vec<f64>,
}

impl Series {
    pub fn total(&self) -> f64 {
        self.values.iter().fold(0.0, |total, value| total + value)
    }

    /// グラフの縮尺に使う最大値を返す。
    ///
    /// 空の系列や全て0の系列では1を返す。
    pub fn scale_max(&self) -> f64 {
        self.values.iter().copied().fold(1.0, f64::max)
    }
}

/// 期間に対応するバケットを古い順に返す。
///
/// * `All`, `Year` - 今月までの12ヶ月
/// * `Last30Days` - 今日までの30日
/// * `Quarter` - 今日までの13週
pub fn buckets<Tz: TimeZone>(
    period: Period,
    config: &ReportConfig,
    now: &DateTime<Tz>,
) -> Vec<Bucket> {
    let tz = now.timezone();
    let today = now.date_naive();
    match period {
        Period::All | Period::Year => (0..12)
            .rev()
            .map(|back| {
                let month = months_before(today, back);
                Bucket {
                    label: month.format("%b").to_string(),
                    window: Window::month(month),
                }
            })
            .collect(),
        Period::Last30Days => (0..30)
            .rev()
            .map(|back| {
                let day = days_before(today, back);
                Bucket {
                    label: day.format("%m/%d").to_string(),
                    window: Window::Day(day),
                }
            })
            .collect(),
        Period::Quarter => (0..13)
            .rev()
            .map(|back| {
                let anchor = days_before(today, 7 * back);
                let (first, last) = match config.quarter_buckets {
                    QuarterBuckets::FixedStride => (days_before(anchor, 6), anchor),
                    QuarterBuckets::CalendarWeeks => {
                        let week = week_buckets(anchor, config.week_start);
                        (week[0], week[6])
                    }
                };
                Bucket {
                    label: first.format("%m/%d").to_string(),
                    window: Window::days(&tz, first, last),
                }
            })
            .collect(),
    }
}

/// `series`と同じ長さのラベルを返す。
pub fn labels<Tz: TimeZone>(
    period: Period,
    config: &ReportConfig,
    now: &DateTime<Tz>,
) -> Vec<String> {
    buckets(period, config, now)
        .into_iter()
        .map(|bucket| bucket.label)
        .collect()
}

/// 期間で絞り込んだエントリーをバケットごとに集計する。
///
/// # Arguments
///
/// * `entries` - タイムエントリー
/// * `projects` - プロジェクト一覧
/// * `period` - 集計期間
/// * `config` - 週の始まりなどの設定
/// * `metric` - 集計する値
/// * `now` - 基準となる現在日時
pub fn series<Tz: TimeZone>(
    entries: &[TimeEntry],
    projects: &[Project],
    period: Period,
    config: &ReportConfig,
    metric: Metric,
    now: &DateTime<Tz>,
) -> Series {
    let filtered = filter_by_period(entries, period, now);
    let buckets = buckets(period, config, now);
    aggregate(&filtered, &buckets, &now.timezone(), |bucket_entries| {
        metric.total(bucket_entries, projects)
    })
}

/// 今週の7日間を`week_start`から順に集計する。
pub fn weekly_series<Tz: TimeZone>(
    entries: &[TimeEntry],
    projects: &[Project],
    week_start: WeekStart,
    metric: Metric,
    now: &DateTime<Tz>,
) -> Series {
    let buckets: Vec<Bucket> = week_buckets(now.date_naive(), week_start)
        .into_iter()
        .map(|day| Bucket {
            label: day.format("%a").to_string(),
            window: Window::Day(day),
        })
        .collect();
    aggregate(entries, &buckets, &now.timezone(), |bucket_entries| {
        metric.total(bucket_entries, projects)
    })
}

/// バケットごとの生産性(%)を返す。エントリーのないバケットは0。
pub fn productivity_series<Tz: TimeZone>(
    entries: &[TimeEntry],
    period: Period,
    config: &ReportConfig,
    now: &DateTime<Tz>,
) -> Series {
    let filtered = filter_by_period(entries, period, now);
    let buckets = buckets(period, config, now);
    aggregate(&filtered, &buckets, &now.timezone(), |bucket_entries| {
        productivity(bucket_entries) as f64
    })
}

fn aggregate<Tz, F>(entries: &[TimeEntry], buckets: &[Bucket], tz: &Tz, value: F) -> Series
where
    Tz: TimeZone,
    F: Fn(&[TimeEntry]) -> f64,
{
    let values = buckets
        .iter()
        .map(|bucket| {
            let bucket_entries: Vec<TimeEntry> = entries
                .iter()
                .filter(|entry| bucket.window.contains(tz, entry.start_time))
                .cloned()
                .collect();
            let total = value(&bucket_entries);
            if total.is_finite() {
                total
            } else {
                0.0
            }
        })
        .collect();

    Series {
        labels: buckets.iter().map(|bucket| bucket.label.clone()).collect(),
        values,
    }
}
