use std::fmt;
use std::str::FromStr;

use anyhow::anyhow;
use chrono::{DateTime, NaiveDate, TimeZone};
use log::debug;

use crate::bucket::{days_before, end_of_day, quarter_start, start_of_day, year_start};
use crate::time_entry::TimeEntry;

/// 現在日時を基準とした集計期間。
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Period {
    #[default]
    All,
    Last30Days,
    Quarter,
    Year,
}

impl FromStr for Period {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "all" => Ok(Period::All),
            "30days" => Ok(Period::Last30Days),
            "quarter" => Ok(Period::Quarter),
            "year" => Ok(Period::Year),
            _ => Err(anyhow!("Unknown period: {}", s)),
        }
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Period::All => "all",
            Period::Last30Days => "30days",
            Period::Quarter => "quarter",
            Period::Year => "year",
        };
        write!(f, "{}", name)
    }
}

impl Period {
    /// 期間の範囲を両端を含むミリ秒で返す。
    ///
    /// 開始は期間の初日の00:00:00.000、終了は`now`の日の23:59:59.999。
    /// `All`の場合は範囲を持たないため`None`を返す。
    pub fn range<Tz: TimeZone>(self, now: &DateTime<Tz>) -> Option<(i64, i64)> {
        let tz = now.timezone();
        let today = now.date_naive();
        let first = match self {
            Period::All => return None,
            Period::Last30Days => days_before(today, 30),
            Period::Quarter => quarter_start(today),
            Period::Year => year_start(today),
        };
        Some((start_of_day(&tz, first), end_of_day(&tz, today)))
    }
}

/// 開始時刻が期間内にあるエントリーだけを返す。
///
/// 判定には開始時刻のみを使い、境界は両端を含む。
///
/// # Arguments
///
/// * `entries` - タイムエントリー
/// * `period` - 集計期間
/// * `now` - 基準となる現在日時
pub fn filter_by_period<Tz: TimeZone>(
    entries: &[TimeEntry],
    period: Period,
    now: &DateTime<Tz>,
) -> Vec<TimeEntry> {
    let Some((start, end)) = period.range(now) else {
        return entries.to_vec();
    };
    let filtered: Vec<TimeEntry> = entries
        .iter()
        .filter(|entry| start <= entry.start_time && entry.start_time <= end)
        .cloned()
        .collect();
    debug!(
        "Period {}: {} of {} entries in [{}, {}]",
        period,
        filtered.len(),
        entries.len(),
        start,
        end
    );
    filtered
}

/// 日付で指定する両端を含む範囲。
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DateRange {
    pub start: i64,
    pub end: i64,
}

impl DateRange {
    /// ローカル日付から範囲を作る。
    ///
    /// `from`がなければエポック、`to`がなければ`now`までとする。
    pub fn from_dates<Tz: TimeZone>(
        now: &DateTime<Tz>,
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
    ) -> Self {
        let tz = now.timezone();
        Self {
            start: from.map(|date| start_of_day(&tz, date)).unwrap_or(0),
            end: to
                .map(|date| end_of_day(&tz, date))
                .unwrap_or_else(|| now.timestamp_millis()),
        }
    }

    pub fn contains(&self, millis: i64) -> bool {
        self.start <= millis && millis <= self.end
    }
}
