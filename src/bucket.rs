use std::fmt;
use std::str::FromStr;

use anyhow::anyhow;
use chrono::{
    Datelike, Days, Duration, LocalResult, Months, NaiveDate, NaiveDateTime, NaiveTime, Offset,
    TimeZone, Utc, Weekday,
};

/// 週の始まりの曜日。
///
/// 既定は月曜日。
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WeekStart(Weekday);

impl WeekStart {
    pub fn new(weekday: Weekday) -> Self {
        Self(weekday)
    }

    pub fn weekday(self) -> Weekday {
        self.0
    }

    /// 日曜始まりの曜日列における位置を返す。
    fn offset(self) -> u32 {
        self.0.num_days_from_sunday()
    }
}

impl Default for WeekStart {
    fn default() -> Self {
        Self(Weekday::Mon)
    }
}

impl FromStr for WeekStart {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let weekday = match s.trim().to_ascii_lowercase().as_str() {
            "sunday" => Weekday::Sun,
            "monday" => Weekday::Mon,
            "tuesday" => Weekday::Tue,
            "wednesday" => Weekday::Wed,
            "thursday" => Weekday::Thu,
            "friday" => Weekday::Fri,
            "saturday" => Weekday::Sat,
            _ => return Err(anyhow!("Unknown first day of week: {}", s)),
        };
        Ok(Self(weekday))
    }
}

impl fmt::Display for WeekStart {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self.0 {
            Weekday::Sun => "sunday",
            Weekday::Mon => "monday",
            Weekday::Tue => "tuesday",
            Weekday::Wed => "wednesday",
            Weekday::Thu => "thursday",
            Weekday::Fri => "friday",
            Weekday::Sat => "saturday",
        };
        write!(f, "{}", name)
    }
}

/// 暦日を`YYYY-MM-DD`形式のキーにする。
pub fn day_key(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// ミリ秒のタイムスタンプを指定タイムゾーンの暦日に変換する。
pub fn local_date<Tz: TimeZone>(tz: &Tz, millis: i64) -> Option<NaiveDate> {
    tz.timestamp_millis_opt(millis)
        .single()
        .map(|datetime| datetime.date_naive())
}

/// 指定タイムゾーンでの日付の00:00:00.000をミリ秒で返す。
pub fn start_of_day<Tz: TimeZone>(tz: &Tz, date: NaiveDate) -> i64 {
    resolve_local(tz, date.and_time(NaiveTime::MIN))
}

/// 指定タイムゾーンでの日付の最後のミリ秒を返す。
pub fn end_of_day<Tz: TimeZone>(tz: &Tz, date: NaiveDate) -> i64 {
    start_of_day(tz, date + Days::new(1)) - 1
}

/// ローカル時刻をミリ秒に解決する。
///
/// 夏時間の重複では早い方を採用する。
/// 夏時間の開始で存在しない時刻は、切り替え前のオフセットで解決して切り替え後に繰り下げる。
fn resolve_local<Tz: TimeZone>(tz: &Tz, naive: NaiveDateTime) -> i64 {
    match tz.from_local_datetime(&naive) {
        LocalResult::Single(datetime) => datetime.timestamp_millis(),
        LocalResult::Ambiguous(earliest, _) => earliest.timestamp_millis(),
        LocalResult::None => {
            let before = tz
                .offset_from_utc_datetime(&(naive - Duration::days(1)))
                .fix()
                .local_minus_utc();
            Utc.from_utc_datetime(&(naive - Duration::seconds(i64::from(before))))
                .timestamp_millis()
        }
    }
}

pub fn days_before(date: NaiveDate, days: u64) -> NaiveDate {
    date - Days::new(days)
}

/// `reference`を含む週の7日間を`week_start`から順に返す。
///
/// # Arguments
///
/// * `reference` - 基準日
/// * `week_start` - 週の始まりの曜日
pub fn week_buckets(reference: NaiveDate, week_start: WeekStart) -> [NaiveDate; 7] {
    let back = (reference.weekday().num_days_from_sunday() + 7 - week_start.offset()) % 7;
    let first = days_before(reference, u64::from(back));
    std::array::from_fn(|i| first + Days::new(i as u64))
}

/// 日付が属する月の初日を返す。
pub fn month_start(date: NaiveDate) -> NaiveDate {
    NaiveDate::from_ymd_opt(date.year(), date.month(), 1).unwrap_or(date)
}

/// 日付が属する月の末日を返す。
pub fn month_end(date: NaiveDate) -> NaiveDate {
    month_start(date)
        .checked_add_months(Months::new(1))
        .and_then(|next| next.pred_opt())
        .unwrap_or(date)
}

/// 日付が属する月から`months`ヶ月前の月の初日を返す。
pub fn months_before(date: NaiveDate, months: u32) -> NaiveDate {
    let start = month_start(date);
    start.checked_sub_months(Months::new(months)).unwrap_or(start)
}

/// 日付が属する四半期の初日を返す。
pub fn quarter_start(date: NaiveDate) -> NaiveDate {
    let month = (date.month0() / 3) * 3 + 1;
    NaiveDate::from_ymd_opt(date.year(), month, 1).unwrap_or(date)
}

/// 日付が属する年の1月1日を返す。
pub fn year_start(date: NaiveDate) -> NaiveDate {
    NaiveDate::from_ymd_opt(date.year(), 1, 1).unwrap_or(date)
}

/// バケットに含まれるかどうかの判定方法。
#[derive(Clone, Debug, PartialEq)]
pub enum Window {
    /// 同じ暦日
    Day(NaiveDate),
    /// 両端を含むミリ秒の範囲
    Span { start: i64, end: i64 },
    /// 同じ年月
    Month { year: i32, month: u32 },
}

impl Window {
    /// 日付の範囲を両端を含む`Span`に変換する。
    pub fn days<Tz: TimeZone>(tz: &Tz, first: NaiveDate, last: NaiveDate) -> Self {
        Window::Span {
            start: start_of_day(tz, first),
            end: end_of_day(tz, last),
        }
    }

    pub fn month(date: NaiveDate) -> Self {
        Window::Month {
            year: date.year(),
            month: date.month(),
        }
    }

    /// タイムスタンプがこのバケットに含まれるかを返す。
    pub fn contains<Tz: TimeZone>(&self, tz: &Tz, millis: i64) -> bool {
        match self {
            Window::Day(date) => local_date(tz, millis) == Some(*date),
            Window::Span { start, end } => *start <= millis && millis <= *end,
            Window::Month { year, month } => local_date(tz, millis)
                .map(|date| date.year() == *year && date.month() == *month)
                .unwrap_or(false),
        }
    }
}

/// ラベル付きのバケット。
#[derive(Clone, Debug, PartialEq)]
pub struct Bucket {
    pub label: String,
    pub window: Window,
}

#[cfg(test)]
mod tests {
    use chrono::{FixedOffset, NaiveDate, TimeZone, Utc, Weekday};
    use chrono_tz::America::Santiago;
    use rstest::rstest;

    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_day_key() {
        assert_eq!(day_key(date(2024, 3, 7)), "2024-03-07");
    }

    /// ローカル日付への変換がタイムゾーンに従うことを確認する。
    #[test]
    fn test_local_date_with_offset() {
        let millis = Utc
            .with_ymd_and_hms(2024, 3, 7, 20, 0, 0)
            .unwrap()
            .timestamp_millis();
        let tokyo = FixedOffset::east_opt(9 * 3600).unwrap();

        assert_eq!(local_date(&Utc, millis), Some(date(2024, 3, 7)));
        assert_eq!(local_date(&tokyo, millis), Some(date(2024, 3, 8)));
    }

    #[test]
    fn test_day_boundaries() {
        let start = start_of_day(&Utc, date(2024, 1, 1));
        let end = end_of_day(&Utc, date(2024, 1, 1));

        assert_eq!(start, 1_704_067_200_000);
        assert_eq!(end, start + 86_400_000 - 1);
    }

    /// サンティアゴでは2024-09-08の00:00が存在せず、01:00(-03)から始まる。
    #[test]
    fn test_day_boundaries_in_dst_gap() {
        let first_instant = Utc
            .with_ymd_and_hms(2024, 9, 8, 4, 0, 0)
            .unwrap()
            .timestamp_millis();
        let previous_evening = Santiago
            .with_ymd_and_hms(2024, 9, 7, 21, 0, 0)
            .unwrap()
            .timestamp_millis();
        let window = Window::days(&Santiago, date(2024, 9, 8), date(2024, 9, 8));

        assert_eq!(start_of_day(&Santiago, date(2024, 9, 8)), first_instant);
        assert_eq!(end_of_day(&Santiago, date(2024, 9, 7)), first_instant - 1);
        assert_eq!(local_date(&Santiago, previous_evening), Some(date(2024, 9, 7)));
        assert!(!window.contains(&Santiago, previous_evening));
        assert!(window.contains(&Santiago, first_instant));
        assert!(Window::Day(date(2024, 9, 8)).contains(&Santiago, first_instant));
    }

    #[rstest]
    #[case::sunday("sunday", Weekday::Sun)]
    #[case::monday("Monday", Weekday::Mon)]
    #[case::saturday(" SATURDAY ", Weekday::Sat)]
    fn test_week_start_from_str(#[case] input: &str, #[case] expected: Weekday) {
        let week_start: WeekStart = input.parse().unwrap();

        assert_eq!(week_start.weekday(), expected);
    }

    #[test]
    fn test_week_start_from_str_invalid() {
        assert!("someday".parse::<WeekStart>().is_err());
        assert_eq!(WeekStart::default().weekday(), Weekday::Mon);
        assert_eq!(WeekStart::default().to_string(), "monday");
    }

    /// 2024-05-15は水曜日。
    #[rstest]
    #[case::monday(Weekday::Mon, date(2024, 5, 13))]
    #[case::sunday(Weekday::Sun, date(2024, 5, 12))]
    #[case::wednesday(Weekday::Wed, date(2024, 5, 15))]
    #[case::thursday(Weekday::Thu, date(2024, 5, 9))]
    fn test_week_buckets(#[case] start: Weekday, #[case] first: NaiveDate) {
        let days = week_buckets(date(2024, 5, 15), WeekStart::new(start));

        assert_eq!(days[0], first);
        assert_eq!(days[0].weekday(), start);
        assert!(days.contains(&date(2024, 5, 15)));
        for pair in days.windows(2) {
            assert_eq!(pair[1], pair[0].succ_opt().unwrap());
        }
    }

    #[rstest]
    #[case::leap_february(date(2024, 2, 10), date(2024, 2, 1), date(2024, 2, 29))]
    #[case::december(date(2023, 12, 31), date(2023, 12, 1), date(2023, 12, 31))]
    #[case::april(date(2024, 4, 1), date(2024, 4, 1), date(2024, 4, 30))]
    fn test_month_boundaries(
        #[case] input: NaiveDate,
        #[case] first: NaiveDate,
        #[case] last: NaiveDate,
    ) {
        assert_eq!(month_start(input), first);
        assert_eq!(month_end(input), last);
    }

    #[rstest]
    #[case(date(2024, 1, 31), date(2024, 1, 1))]
    #[case(date(2024, 5, 15), date(2024, 4, 1))]
    #[case(date(2024, 9, 30), date(2024, 7, 1))]
    #[case(date(2024, 12, 1), date(2024, 10, 1))]
    fn test_quarter_start(#[case] input: NaiveDate, #[case] expected: NaiveDate) {
        assert_eq!(quarter_start(input), expected);
    }

    #[test]
    fn test_months_before_crosses_year() {
        assert_eq!(months_before(date(2024, 2, 20), 3), date(2023, 11, 1));
        assert_eq!(year_start(date(2024, 2, 20)), date(2024, 1, 1));
    }

    #[test]
    fn test_window_contains() {
        let noon = Utc
            .with_ymd_and_hms(2024, 5, 15, 12, 0, 0)
            .unwrap()
            .timestamp_millis();

        assert!(Window::Day(date(2024, 5, 15)).contains(&Utc, noon));
        assert!(!Window::Day(date(2024, 5, 16)).contains(&Utc, noon));
        assert!(Window::month(date(2024, 5, 1)).contains(&Utc, noon));
        assert!(!Window::month(date(2023, 5, 1)).contains(&Utc, noon));
        assert!(Window::days(&Utc, date(2024, 5, 9), date(2024, 5, 15)).contains(&Utc, noon));
        assert!(!Window::days(&Utc, date(2024, 5, 16), date(2024, 5, 22)).contains(&Utc, noon));
    }

    /// 範囲の両端が含まれることを確認する。
    #[test]
    fn test_span_is_inclusive() {
        let window = Window::Span { start: 10, end: 20 };

        assert!(window.contains(&Utc, 10));
        assert!(window.contains(&Utc, 20));
        assert!(!window.contains(&Utc, 21));
    }
}
