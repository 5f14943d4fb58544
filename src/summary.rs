use std::collections::{HashMap, HashSet};
use std::str::FromStr;

use anyhow::anyhow;
use chrono::{NaiveDate, TimeZone};

use crate::bucket::{day_key, local_date, month_end, month_start};
use crate::earnings::{earnings, total_earnings};
use crate::period::DateRange;
use crate::time_entry::{Client, Project, TimeEntry};

const UNKNOWN_PROJECT: &str = "Unknown Project";

/// プロジェクトまたはクライアントごとの合計。
#[derive(Clone, Debug, PartialEq)]
pub struct GroupTotal {
    pub id: String,
    pub name: String,
    /// 作業時間(ミリ秒)
    pub total_time: i64,
    pub total_earnings: f64,
}

#[derive(Debug, Default)]
struct Accumulator {
    time: i64,
    billable_time: i64,
    earnings: f64,
}

impl Accumulator {
    fn add(&mut self, entry: &TimeEntry, projects: &[Project]) {
        let duration = entry.duration_millis();
        self.time = self.time.saturating_add(duration);
        if entry.billable {
            self.billable_time = self.billable_time.saturating_add(duration);
        }
        self.earnings += earnings(entry, projects);
    }
}

fn finite_or_zero(value: f64) -> f64 {
    if value.is_finite() {
        value
    } else {
        0.0
    }
}

/// プロジェクトごとに作業時間と売上を集計し、売上の降順で返す。
///
/// プロジェクトのないエントリーは除外する。削除済みのプロジェクトも
/// エントリーから参照されていれば`Unknown Project`として含める。
pub fn by_project(entries: &[TimeEntry], projects: &[Project]) -> Vec<GroupTotal> {
    let groups: HashMap<&str, Accumulator> =
        entries.iter().fold(HashMap::new(), |mut groups, entry| {
            if let Some(project_id) = entry.project_id.as_deref() {
                groups.entry(project_id).or_default().add(entry, projects);
            }
            groups
        });

    let mut totals: Vec<GroupTotal> = groups
        .into_iter()
        .map(|(project_id, acc)| GroupTotal {
            id: project_id.to_string(),
            name: projects
                .iter()
                .find(|project| project.id == project_id)
                .map(|project| project.name.clone())
                .unwrap_or_else(|| UNKNOWN_PROJECT.to_string()),
            total_time: acc.time,
            total_earnings: finite_or_zero(acc.earnings),
        })
        .collect();
    totals.sort_by(|a, b| {
        b.total_earnings
            .total_cmp(&a.total_earnings)
            .then_with(|| a.id.cmp(&b.id))
    });
    totals
}

/// クライアントごとに作業時間と売上を集計し、名前の昇順で返す。
///
/// クライアントに属するプロジェクトのエントリーを合計する。
/// エントリーのないクライアントも0として含める。
pub fn by_client(
    entries: &[TimeEntry],
    projects: &[Project],
    clients: &[Client],
) -> Vec<GroupTotal> {
    let mut totals: Vec<GroupTotal> = clients
        .iter()
        .map(|client| {
            let project_ids: HashSet<&str> = projects
                .iter()
                .filter(|project| project.client_id == client.id)
                .map(|project| project.id.as_str())
                .collect();
            let mut acc = Accumulator::default();
            entries
                .iter()
                .filter(|entry| {
                    entry
                        .project_id
                        .as_deref()
                        .map(|id| project_ids.contains(id))
                        .unwrap_or(false)
                })
                .for_each(|entry| acc.add(entry, projects));
            GroupTotal {
                id: client.id.clone(),
                name: client.name.clone(),
                total_time: acc.time,
                total_earnings: finite_or_zero(acc.earnings),
            }
        })
        .collect();
    totals.sort_by(|a, b| {
        a.name
            .to_lowercase()
            .cmp(&b.name.to_lowercase())
            .then_with(|| a.name.cmp(&b.name))
            .then_with(|| a.id.cmp(&b.id))
    });
    totals
}

/// 比較レポートの集計単位。
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum CompareBy {
    #[default]
    Projects,
    Clients,
}

impl FromStr for CompareBy {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "projects" | "project" => Ok(CompareBy::Projects),
            "clients" | "client" => Ok(CompareBy::Clients),
            _ => Err(anyhow!("Unknown comparison: {}", s)),
        }
    }
}

/// 比較レポートの1行。
#[derive(Clone, Debug, PartialEq)]
pub struct ComparisonRow {
    pub id: String,
    pub name: String,
    pub time_logged: i64,
    pub billable_time: i64,
    pub total_earnings: f64,
}

/// 範囲内のエントリーをプロジェクトまたはクライアントごとに比較する。
///
/// 登録済みのプロジェクト・クライアントのみを対象とし、作業時間が0の行は除く。
/// 売上の降順で返す。
///
/// # Arguments
///
/// * `entries` - タイムエントリー
/// * `projects` - プロジェクト一覧
/// * `clients` - クライアント一覧
/// * `range` - 開始時刻で絞り込む範囲
/// * `by` - 集計単位
pub fn compare(
    entries: &[TimeEntry],
    projects: &[Project],
    clients: &[Client],
    range: &DateRange,
    by: CompareBy,
) -> Vec<ComparisonRow> {
    let names: HashMap<&str, &str> = match by {
        CompareBy::Projects => projects
            .iter()
            .map(|project| (project.id.as_str(), project.name.as_str()))
            .collect(),
        CompareBy::Clients => clients
            .iter()
            .map(|client| (client.id.as_str(), client.name.as_str()))
            .collect(),
    };
    let project_clients: HashMap<&str, &str> = projects
        .iter()
        .map(|project| (project.id.as_str(), project.client_id.as_str()))
        .collect();

    let mut groups: HashMap<&str, Accumulator> = HashMap::new();
    for entry in entries.iter().filter(|entry| range.contains(entry.start_time)) {
        let Some(project_id) = entry.project_id.as_deref() else {
            continue;
        };
        let key = match by {
            CompareBy::Projects => Some(project_id),
            CompareBy::Clients => project_clients.get(project_id).copied(),
        };
        if let Some(key) = key.filter(|key| names.contains_key(key)) {
            groups.entry(key).or_default().add(entry, projects);
        }
    }

    let mut rows: Vec<ComparisonRow> = groups
        .into_iter()
        .filter(|(_, acc)| acc.time > 0)
        .map(|(id, acc)| ComparisonRow {
            id: id.to_string(),
            name: names.get(id).copied().unwrap_or_default().to_string(),
            time_logged: acc.time,
            billable_time: acc.billable_time,
            total_earnings: finite_or_zero(acc.earnings),
        })
        .collect();
    rows.sort_by(|a, b| {
        b.total_earnings
            .total_cmp(&a.total_earnings)
            .then_with(|| a.id.cmp(&b.id))
    });
    rows
}

/// エントリー全体の合計。
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Totals {
    pub total_time: i64,
    pub total_earnings: f64,
    pub entries_found: usize,
}

pub fn totals(entries: &[TimeEntry], projects: &[Project]) -> Totals {
    let mut acc = Accumulator::default();
    entries.iter().for_each(|entry| acc.add(entry, projects));
    Totals {
        total_time: acc.time,
        total_earnings: finite_or_zero(acc.earnings),
        entries_found: entries.len(),
    }
}

/// 1日分の作業時間と売上。
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DaySummary {
    pub total_time: i64,
    pub billable_time: i64,
    pub non_billable_time: i64,
    pub earnings: f64,
}

/// 指定した日に開始したエントリーを集計する。
pub fn day_summary<Tz: TimeZone>(
    entries: &[TimeEntry],
    projects: &[Project],
    date: NaiveDate,
    tz: &Tz,
) -> DaySummary {
    let mut acc = Accumulator::default();
    entries
        .iter()
        .filter(|entry| local_date(tz, entry.start_time) == Some(date))
        .for_each(|entry| acc.add(entry, projects));
    DaySummary {
        total_time: acc.time,
        billable_time: acc.billable_time,
        non_billable_time: acc.time - acc.billable_time,
        earnings: finite_or_zero(acc.earnings),
    }
}

/// カレンダーの1日分。
#[derive(Clone, Debug, PartialEq)]
pub struct CalendarDay {
    pub date: NaiveDate,
    /// `YYYY-MM-DD`形式のキー
    pub key: String,
    /// 開始時刻順のエントリー
    pub entries: Vec<TimeEntry>,
    /// 作業時間(ミリ秒)
    pub total_duration: i64,
    pub earnings: f64,
}

impl CalendarDay {
    fn empty(date: NaiveDate) -> Self {
        Self {
            date,
            key: day_key(date),
            entries: Vec::new(),
            total_duration: 0,
            earnings: 0.0,
        }
    }
}

/// 1ヶ月分のカレンダー。`days`は月初から月末まで欠けずに並ぶ。
#[derive(Clone, Debug, PartialEq)]
pub struct MonthCalendar {
    /// 月の初日
    pub month: NaiveDate,
    pub days: Vec<CalendarDay>,
}

impl MonthCalendar {
    pub fn total_duration(&self) -> i64 {
        self.days.iter().map(|day| day.total_duration).sum()
    }
}

/// エントリーを開始したローカル日付ごとにまとめる。
///
/// キーは`day_key`の`YYYY-MM-DD`。売上は計算しない。
pub fn entries_by_day<Tz: TimeZone>(
    entries: &[TimeEntry],
    tz: &Tz,
) -> HashMap<String, CalendarDay> {
    let mut days: HashMap<String, CalendarDay> = HashMap::new();
    for entry in entries {
        let Some(date) = local_date(tz, entry.start_time) else {
            continue;
        };
        let day = days
            .entry(day_key(date))
            .or_insert_with(|| CalendarDay::empty(date));
        day.total_duration += entry.duration_millis();
        day.entries.push(entry.clone());
    }
    days
}

/// `date`を含む月のカレンダーを返す。
///
/// # Arguments
///
/// * `entries` - タイムエントリー
/// * `projects` - プロジェクト一覧
/// * `date` - 対象の月に含まれる日付
/// * `tz` - 日付の区切りに使うタイムゾーン
pub fn month_calendar<Tz: TimeZone>(
    entries: &[TimeEntry],
    projects: &[Project],
    date: NaiveDate,
    tz: &Tz,
) -> MonthCalendar {
    let first = month_start(date);
    let last = month_end(date);
    let mut by_day = entries_by_day(entries, tz);

    let days = first
        .iter_days()
        .take_while(|day| *day <= last)
        .map(|day| {
            let mut calendar_day = by_day
                .remove(&day_key(day))
                .unwrap_or_else(|| CalendarDay::empty(day));
            calendar_day.entries.sort_by_key(|entry| entry.start_time);
            calendar_day.earnings = total_earnings(&calendar_day.entries, projects);
            calendar_day
        })
        .collect();

    MonthCalendar { month: first, days }
}
