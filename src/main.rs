use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use hourly::calendar_command::{CalendarArgs, CalendarCommand};
use hourly::compare_command::{CompareArgs, CompareCommand};
use hourly::console::{ConsoleMarkdownList, ConsolePresenter};
use hourly::dashboard_command::{DashboardArgs, DashboardCommand};
use hourly::detailed_command::{DetailedArgs, DetailedCommand};
use hourly::logging;
use hourly::store::JsonFileStore;
use hourly::summary_command::{SummaryArgs, SummaryCommand};

/// タイムエントリーのレポートを表示するためのCLIアプリケーション。
///
/// # Examples
/// ```
/// $ cargo run -- summary --period quarter
/// $ cargo run -- dashboard --week-start sunday
/// ```
#[derive(Debug, Parser)]
#[clap(version, about)]
struct Args {
    #[clap(
        short = 's',
        long = "snapshot",
        help = "Sets the snapshot file (default: $HOURLY_SNAPSHOT or the data directory)"
    )]
    snapshot: Option<PathBuf>,

    #[clap(short = 'v', long = "verbose", help = "Shows debug logs")]
    verbose: bool,

    #[clap(subcommand)]
    subcommand: SubCommands,
}

/// サブコマンドを表す列挙型。
#[derive(Debug, Subcommand)]
enum SubCommands {
    Summary(SummaryArgs),
    Dashboard(DashboardArgs),
    Detailed(DetailedArgs),
    Compare(CompareArgs),
    Calendar(CalendarArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    logging::init(logging::level(args.verbose))?;

    let store =
        JsonFileStore::from_env(args.snapshot).context("Failed to configure snapshot store")?;
    let mut stdout = std::io::stdout();
    let mut presenter = ConsoleMarkdownList::new(&mut stdout);

    match args.subcommand {
        SubCommands::Summary(summary) => {
            let report = SummaryCommand::new(&store).run(summary).await?;
            presenter.show_summary(&report)?;
        }
        SubCommands::Dashboard(dashboard) => {
            let report = DashboardCommand::new(&store).run(dashboard).await?;
            presenter.show_dashboard(&report)?;
        }
        SubCommands::Detailed(detailed) => {
            let report = DetailedCommand::new(&store).run(detailed).await?;
            presenter.show_detailed(&report)?;
        }
        SubCommands::Compare(compare) => {
            let rows = CompareCommand::new(&store).run(compare).await?;
            presenter.show_comparison(&rows)?;
        }
        SubCommands::Calendar(calendar) => {
            let calendar = CalendarCommand::new(&store).run(calendar).await?;
            presenter.show_calendar(&calendar)?;
        }
    }

    Ok(())
}
