use anyhow::{Context, Result};
use chrono::{DateTime, Local, NaiveDate};
use log::info;

use crate::bucket::days_before;
use crate::datetime;
use crate::filter::{BillableStatus, EntryFilter};
use crate::period::DateRange;
use crate::store::SnapshotRepository;
use crate::summary::{totals, Totals};
use crate::time_entry::TimeEntry;

/// 条件で絞り込んだエントリーを出力するためのサブコマンド。
#[derive(Debug, clap::Args)]
pub struct DetailedArgs {
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

    #[clap(short = 'c', long = "client", help = "Shows only entries of the client id")]
    client: Option<String>,

    #[clap(short = 'p', long = "project", help = "Shows only entries of the project id")]
    project: Option<String>,

    #[clap(
        short = 'b',
        long = "billable",
        default_value = "all",
        help = "Sets the billable status: all, billable or non-billable"
    )]
    billable: BillableStatus,
}

/// `detailed`サブコマンドの結果。
#[derive(Clone, Debug, PartialEq)]
pub struct DetailedReport {
    pub entries: Vec<TimeEntry>,
    pub totals: Totals,
}

pub struct DetailedCommand<'a, T: SnapshotRepository> {
    repository: &'a T,
}

impl<'a, T: SnapshotRepository> DetailedCommand<'a, T> {
    /// 新しい`DetailedCommand`を返す。
    ///
    /// # Arguments
    /// * `repository` - スナップショットを読み込むためのリポジトリ
    pub fn new(repository: &'a T) -> Self {
        Self { repository }
    }

    /// `detailed`サブコマンドの処理を行う。
    ///
    /// 日付の範囲、クライアント、プロジェクト、課金対象かどうかでエントリーを絞り込み、
    /// 開始時刻順に並べて合計と共に返す。
    pub async fn run(&self, args: DetailedArgs) -> Result<DetailedReport> {
        let now = datetime::now();
        let range = default_range(&now, args.from, args.to);
        info!("Start at: {}, End at: {}", range.start, range.end);

        let snapshot = self
            .repository
            .read_snapshot()
            .await
            .context("Failed to read snapshot")?;

        let filter = EntryFilter {
            range: Some(range),
            client_id: args.client,
            project_id: args.project,
            billable: args.billable,
        };
        let mut entries = filter.apply(&snapshot.entries, &snapshot.projects);
        entries.sort_by_key(|entry| entry.start_time);
        info!("Time entries found: {}", entries.len());

        Ok(DetailedReport {
            totals: totals(&entries, &snapshot.projects),
            entries,
        })
    }
}

/// 日付の指定がなければ30日前から今日までの範囲にする。
pub(crate) fn default_range(
    now: &DateTime<Local>,
    from: Option<NaiveDate>,
    to: Option<NaiveDate>,
) -> DateRange {
    let today = now.date_naive();
    DateRange::from_dates(
        now,
        Some(from.unwrap_or_else(|| days_before(today, 30))),
        Some(to.unwrap_or(today)),
    )
}

/// 日付をパースする。
pub(crate) fn parse_date(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").with_context(|| format!("Failed to parse date: {}", s))
}

#[cfg(test)]
mod tests {
    use chrono::{Local, NaiveDate, TimeZone};
    use rstest::rstest;

    use super::{default_range, parse_date, DetailedArgs, DetailedCommand};
    use crate::datetime::mock_datetime;
    use crate::filter::BillableStatus;
    use crate::store::{MockSnapshotRepository, Snapshot};
    use crate::time_entry::{Project, TimeEntry};

    const HOUR: i64 = 3_600_000;

    fn entry(id: &str, d: u32, project_id: &str, billable: bool) -> TimeEntry {
        let start = Local
            .with_ymd_and_hms(2024, 5, d, 9, 0, 0)
            .unwrap()
            .timestamp_millis();
        TimeEntry {
            id: id.to_string(),
            description: id.to_string(),
            start_time: start,
            end_time: start + HOUR,
            project_id: Some(project_id.to_string()),
            task_id: None,
            billable,
            user_id: "u1".to_string(),
            is_manual: None,
        }
    }

    fn snapshot() -> Snapshot {
        Snapshot {
            entries: vec![
                entry("c", 12, "p1", true),
                entry("a", 2, "p1", true),
                entry("b", 10, "p2", false),
            ],
            projects: vec![
                Project {
                    id: "p1".to_string(),
                    name: "Website".to_string(),
                    client_id: "c1".to_string(),
                    is_billable: true,
                    hourly_rate: 60.0,
                },
                Project {
                    id: "p2".to_string(),
                    name: "Mobile".to_string(),
                    client_id: "c2".to_string(),
                    is_billable: true,
                    hourly_rate: 60.0,
                },
            ],
            ..Default::default()
        }
    }

    fn args() -> DetailedArgs {
        DetailedArgs {
            from: None,
            to: None,
            client: None,
            project: None,
            billable: BillableStatus::All,
        }
    }

    #[rstest]
    #[case::defaults(args(), vec!["a", "b", "c"], 120.0)]
    #[case::from(
        DetailedArgs { from: NaiveDate::from_ymd_opt(2024, 5, 10), ..args() },
        vec!["b", "c"],
        60.0,
    )]
    #[case::to(
        DetailedArgs { to: NaiveDate::from_ymd_opt(2024, 5, 10), ..args() },
        vec!["a", "b"],
        60.0,
    )]
    #[case::client(
        DetailedArgs { client: Some("c2".to_string()), ..args() },
        vec!["b"],
        0.0,
    )]
    #[case::billable(
        DetailedArgs { billable: BillableStatus::Billable, ..args() },
        vec!["a", "c"],
        120.0,
    )]
    #[tokio::test]
    async fn test_detailed_command(
        #[case] args: DetailedArgs,
        #[case] expected: Vec<&str>,
        #[case] earnings: f64,
    ) {
        mock_datetime::set_mock_time(Local.with_ymd_and_hms(2024, 5, 15, 12, 0, 0).unwrap());
        let mut repository = MockSnapshotRepository::new();
        repository
            .expect_read_snapshot()
            .times(1)
            .returning(|| Ok(snapshot()));

        let command = DetailedCommand::new(&repository);
        let report = command.run(args).await.unwrap();
        mock_datetime::clear_mock_time();

        let ids: Vec<&str> = report.entries.iter().map(|entry| entry.id.as_str()).collect();
        assert_eq!(ids, expected);
        assert_eq!(report.totals.entries_found, expected.len());
        assert_eq!(report.totals.total_earnings, earnings);
    }

    #[test]
    fn test_default_range() {
        let now = Local.with_ymd_and_hms(2024, 5, 15, 12, 0, 0).unwrap();

        let range = default_range(&now, None, None);

        assert_eq!(
            range.start,
            Local
                .with_ymd_and_hms(2024, 4, 15, 0, 0, 0)
                .unwrap()
                .timestamp_millis()
        );
        assert_eq!(
            range.end,
            Local
                .with_ymd_and_hms(2024, 5, 16, 0, 0, 0)
                .unwrap()
                .timestamp_millis()
                - 1
        );
    }

    #[rstest]
    #[case("2024-05-01", NaiveDate::from_ymd_opt(2024, 5, 1))]
    #[case("2024-02-29", NaiveDate::from_ymd_opt(2024, 2, 29))]
    fn test_parse_date(#[case] input: &str, #[case] expected: Option<NaiveDate>) {
        assert_eq!(parse_date(input).ok(), expected);
    }

    #[rstest]
    #[case("2023-02-29")]
    #[case("05/01/2024")]
    #[case("")]
    fn test_parse_date_invalid(#[case] input: &str) {
        assert!(parse_date(input).is_err());
    }
}
