use std::process::ExitCode;
use std::time::Duration;

use camino::Utf8PathBuf;
use clap::Parser;
use miette::IntoDiagnostic;
use tracing_subscriber::EnvFilter;

use subharvester::app::App;
use subharvester::config::Settings;
use subharvester::dispatch::{LogReporter, RunSummary, TargetStatus};
use subharvester::error::HarvestError;
use subharvester::fetch::HttpFetcher;
use subharvester::output::JsonOutput;
use subharvester::store::Store;

#[derive(Parser)]
#[command(name = "subharvest")]
#[command(about = "Bulk-download a published subdomain dataset catalog into a sanitized local layout")]
#[command(version, author)]
struct Cli {
    /// Index document to read the target catalog from.
    #[arg(long)]
    index_url: Option<String>,

    /// Root directory for downloaded targets (default: ~/subdomains).
    #[arg(long)]
    root: Option<Utf8PathBuf>,

    /// Number of concurrent download workers (default: hardware parallelism).
    #[arg(long, short = 'j')]
    jobs: Option<usize>,

    /// Per-request timeout in seconds (no timeout when unset).
    #[arg(long)]
    timeout_secs: Option<u64>,

    /// Print the run summary as JSON instead of a closing line.
    #[arg(long)]
    non_interactive: bool,
}

fn main() -> ExitCode {
    if let Err(report) = run() {
        eprintln!("{report:?}");
        if let Some(err) = report.downcast_ref::<HarvestError>() {
            return ExitCode::from(map_exit_code(err));
        }
        return ExitCode::from(1);
    }
    ExitCode::SUCCESS
}

fn map_exit_code(error: &HarvestError) -> u8 {
    match error {
        HarvestError::HomeDir | HarvestError::IndexParse(_) => 2,
        HarvestError::IndexFetch(_) | HarvestError::Http(_) | HarvestError::HttpStatus { .. } => 3,
        _ => 1,
    }
}

fn run() -> miette::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let settings = Settings::resolve(
        cli.index_url,
        cli.root,
        cli.jobs,
        cli.timeout_secs.map(Duration::from_secs),
    )
    .into_diagnostic()?;

    let fetcher = HttpFetcher::new(settings.http_timeout).into_diagnostic()?;
    let store = Store::new(settings.base_root.clone());
    let app = App::new(store, fetcher);

    let summary = app
        .run(&settings.index_url, settings.workers, &LogReporter)
        .into_diagnostic()?;

    if cli.non_interactive {
        JsonOutput::print_run(&summary).into_diagnostic()?;
    } else {
        print_closing_line(&summary);
    }
    Ok(())
}

fn print_closing_line(summary: &RunSummary) {
    let failed = summary
        .items
        .iter()
        .filter(|item| !matches!(item.status, TargetStatus::Completed))
        .count();
    let done = summary.items.len() - failed;
    println!("{done} targets downloaded and extracted, {failed} failed");
}
