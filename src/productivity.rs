use chrono::{DateTime, TimeZone};
use log::debug;

use crate::bucket::{
    days_before, end_of_day, months_before, quarter_start, start_of_day, year_start,
};
use crate::period::Period;
use crate::time_entry::TimeEntry;

/// 生産性と前の期間からの変化。
///
/// `has_data`が`false`の場合、エントリーが1件もなかったことを表す。
/// 課金対象の時間が0%だった場合と区別するために使う。
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Productivity {
    pub percentage: i64,
    pub trend_delta: i64,
    pub has_data: bool,
}

/// 全作業時間に対する課金対象時間の割合(%)を四捨五入して返す。
///
/// 作業時間の合計が0の場合は0を返す。
pub fn productivity(entries: &[TimeEntry]) -> i64 {
    round_percent(ratio(entries))
}

fn ratio(entries: &[TimeEntry]) -> f64 {
    let (total, billable) = entries.iter().fold((0i64, 0i64), |(total, billable), entry| {
        let duration = entry.duration_millis();
        (
            total.saturating_add(duration),
            if entry.billable {
                billable.saturating_add(duration)
            } else {
                billable
            },
        )
    });
    if total == 0 {
        return 0.0;
    }
    billable as f64 / total as f64 * 100.0
}

/// 0.5を切り上げる四捨五入。NaNや無限大は0とする。
pub fn round_percent(value: f64) -> i64 {
    if !value.is_finite() {
        return 0;
    }
    (value + 0.5).floor() as i64
}

/// 比較対象となる直前の期間を両端を含むミリ秒で返す。
///
/// * `All`, `Last30Days` - 31日前から60日前まで
/// * `Quarter` - 前の四半期
/// * `Year` - 前年
pub fn comparison_range<Tz: TimeZone>(period: Period, now: &DateTime<Tz>) -> (i64, i64) {
    let tz = now.timezone();
    let today = now.date_naive();
    match period {
        Period::All | Period::Last30Days => (
            start_of_day(&tz, days_before(today, 60)),
            start_of_day(&tz, days_before(today, 30)) - 1,
        ),
        Period::Quarter => {
            let current = quarter_start(today);
            (
                start_of_day(&tz, months_before(current, 3)),
                end_of_day(&tz, days_before(current, 1)),
            )
        }
        Period::Year => {
            let current = year_start(today);
            (
                start_of_day(&tz, months_before(current, 12)),
                end_of_day(&tz, days_before(current, 1)),
            )
        }
    }
}

/// 現在の期間の生産性と、直前の同じ長さの期間との差を返す。
///
/// 直前の期間の生産性が0の場合は、現在の生産性をそのまま差とする。
///
/// # Arguments
///
/// * `filtered` - 現在の期間で絞り込んだエントリー
/// * `all` - 絞り込む前の全エントリー
/// * `period` - 現在の期間
/// * `now` - 基準となる現在日時
pub fn trend<Tz: TimeZone>(
    filtered: &[TimeEntry],
    all: &[TimeEntry],
    period: Period,
    now: &DateTime<Tz>,
) -> Productivity {
    if filtered.is_empty() {
        return Productivity::default();
    }

    let current = ratio(filtered);
    let (start, end) = comparison_range(period, now);
    let previous_entries: Vec<TimeEntry> = all
        .iter()
        .filter(|entry| start <= entry.start_time && entry.start_time <= end)
        .cloned()
        .collect();
    let previous = ratio(&previous_entries);
    debug!(
        "Productivity {:.2}% against {:.2}% over {} previous entries",
        current,
        previous,
        previous_entries.len()
    );

    let delta = if previous > 0.0 {
        current - previous
    } else {
        current
    };

    Productivity {
        percentage: round_percent(current),
        trend_delta: round_percent(delta),
        has_data: true,
    }
}

#[cfg(test)]
mod tests {
    use chrono::{DateTime, TimeZone, Utc};
    use rstest::rstest;

    use super::{comparison_range, productivity, round_percent, trend, Productivity};
    use crate::period::{filter_by_period, Period};
    use crate::time_entry::TimeEntry;

    const HOUR: i64 = 3_600_000;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 15, 12, 0, 0).unwrap()
    }

    fn at(y: i32, m: u32, d: u32, h: u32) -> i64 {
        Utc.with_ymd_and_hms(y, m, d, h, 0, 0)
            .unwrap()
            .timestamp_millis()
    }

    fn entry(start: i64, hours: i64, billable: bool) -> TimeEntry {
        TimeEntry {
            id: format!("e{}", start),
            description: String::new(),
            start_time: start,
            end_time: start + hours * HOUR,
            project_id: None,
            task_id: None,
            billable,
            user_id: "u1".to_string(),
            is_manual: None,
        }
    }

    #[rstest]
    #[case::empty(vec![], 0)]
    #[case::all_billable(vec![entry(0, 2, true)], 100)]
    #[case::none_billable(vec![entry(0, 2, false)], 0)]
    #[case::one_third(vec![entry(0, 1, true), entry(0, 2, false)], 33)]
    #[case::half_up(vec![entry(0, 1, true), entry(0, 7, false)], 13)]
    #[case::zero_duration(vec![entry(0, 0, true)], 0)]
    fn test_productivity(#[case] entries: Vec<TimeEntry>, #[case] expected: i64) {
        let result = productivity(&entries);

        assert_eq!(result, expected);
        assert!((0..=100).contains(&result));
    }

    #[rstest]
    #[case(2.5, 3)]
    #[case(-2.5, -2)]
    #[case(-2.6, -3)]
    #[case(f64::NAN, 0)]
    #[case(f64::INFINITY, 0)]
    fn test_round_percent(#[case] input: f64, #[case] expected: i64) {
        assert_eq!(round_percent(input), expected);
    }

    #[test]
    fn test_trend_no_data() {
        let all = vec![entry(at(2024, 4, 1, 9), 1, true)];

        assert_eq!(
            trend(&[], &all, Period::Last30Days, &now()),
            Productivity {
                percentage: 0,
                trend_delta: 0,
                has_data: false
            }
        );
    }

    /// 0%の生産性でもデータがあることを区別できることを確認する。
    #[test]
    fn test_trend_zero_percent_with_data() {
        let all = vec![entry(at(2024, 5, 10, 9), 1, false)];
        let filtered = filter_by_period(&all, Period::Last30Days, &now());

        let result = trend(&filtered, &all, Period::Last30Days, &now());

        assert_eq!(result.percentage, 0);
        assert_eq!(result.trend_delta, 0);
        assert!(result.has_data);
    }

    #[rstest]
    #[case::improved(1, 3, 25)]
    #[case::declined(3, 1, -25)]
    fn test_trend_last_30_days(
        #[case] previous_billable: i64,
        #[case] previous_other: i64,
        #[case] expected_delta: i64,
    ) {
        let all = vec![
            entry(at(2024, 5, 10, 9), 1, true),
            entry(at(2024, 5, 11, 9), 1, false),
            entry(at(2024, 4, 1, 9), previous_billable, true),
            entry(at(2024, 4, 2, 9), previous_other, false),
        ];
        let filtered = filter_by_period(&all, Period::Last30Days, &now());

        let result = trend(&filtered, &all, Period::Last30Days, &now());

        assert_eq!(result.percentage, 50);
        assert_eq!(result.trend_delta, expected_delta);
    }

    /// 直前の期間にデータがない場合は現在の生産性が差になることを確認する。
    #[test]
    fn test_trend_without_previous_data() {
        let all = vec![
            entry(at(2024, 5, 10, 9), 3, true),
            entry(at(2024, 5, 11, 9), 1, false),
        ];
        let filtered = filter_by_period(&all, Period::Last30Days, &now());

        let result = trend(&filtered, &all, Period::Last30Days, &now());

        assert_eq!(result.percentage, 75);
        assert_eq!(result.trend_delta, 75);
    }

    #[test]
    fn test_comparison_range_last_30_days() {
        let (start, end) = comparison_range(Period::Last30Days, &now());
        let (current_start, _) = Period::Last30Days.range(&now()).unwrap();

        assert_eq!(start, at(2024, 3, 16, 0));
        assert_eq!(end, current_start - 1);
        assert_eq!(comparison_range(Period::All, &now()), (start, end));
    }

    #[rstest]
    #[case::quarter(Period::Quarter, at(2024, 1, 1, 0), at(2024, 4, 1, 0) - 1)]
    #[case::year(Period::Year, at(2023, 1, 1, 0), at(2024, 1, 1, 0) - 1)]
    fn test_comparison_range_calendar(
        #[case] period: Period,
        #[case] start: i64,
        #[case] end: i64,
    ) {
        assert_eq!(comparison_range(period, &now()), (start, end));
    }

    #[test]
    fn test_trend_quarter() {
        let all = vec![
            entry(at(2024, 4, 2, 9), 4, true),
            entry(at(2024, 3, 31, 20), 1, true),
            entry(at(2024, 2, 1, 9), 3, false),
            entry(at(2023, 12, 31, 9), 10, false),
        ];
        let filtered = filter_by_period(&all, Period::Quarter, &now());

        let result = trend(&filtered, &all, Period::Quarter, &now());

        assert_eq!(result.percentage, 100);
        assert_eq!(result.trend_delta, 75);
    }
}
