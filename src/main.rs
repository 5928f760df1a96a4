mod cli;
mod diffing;
mod event;
mod fingerprint;
mod reconcile;
mod report;
mod snapshot;
mod store;
mod util;
mod watch;

use cli::{Cli, Command};
use snapshot::{ScanOptions, build_snapshot, check_root};
use std::fmt as stdfmt;
use std::io::{IsTerminal, stderr};
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::level_filters::LevelFilter;
use tracing::{Event, Level, Subscriber, error, info};
use tracing_subscriber::filter::EnvFilter;
use tracing_subscriber::fmt as tracing_fmt;
use tracing_subscriber::fmt::FmtContext;
use tracing_subscriber::fmt::format::{FormatEvent, FormatFields, Writer};
use tracing_subscriber::prelude::*;
use tracing_subscriber::registry::LookupSpan;

const DEFAULT_REPORT_NAME: &str = "report.html";

struct MonitorExitCode;

impl MonitorExitCode {
    /// Exit code used when verification finds modified, missing or extra files.
    fn issues_found() -> ExitCode {
        ExitCode::from(1)
    }

    /// Exit code used for other errors (I/O errors, invalid arguments, etc.).
    fn any_error() -> ExitCode {
        ExitCode::from(255)
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    init_tracing(cli.verbose, cli.log_level);

    let result: anyhow::Result<ExitCode> = match cli.command {
        Command::Init {
            path,
            baseline,
            jobs,
        } => handle_init(&path, &baseline, scan_options(jobs)),
        Command::Verify {
            path,
            baseline,
            jobs,
        } => handle_verify(&path, &baseline, scan_options(jobs)),
        Command::Watch {
            path,
            baseline,
            events,
            report,
        } => {
            let report = report.unwrap_or_else(|| default_report_path(&events));
            handle_watch(&path, &baseline, &events, &report)
        }
        Command::Report { events, out } => handle_report(&events, &out),
    };

    match result {
        Ok(exit_code) => exit_code,
        Err(err) => {
            error!("{err}");
            MonitorExitCode::any_error()
        }
    }
}

fn scan_options(jobs: Option<NonZeroUsize>) -> ScanOptions {
    match jobs {
        Some(jobs) => ScanOptions { jobs },
        None => ScanOptions::default(),
    }
}

fn default_report_path(events: &Path) -> PathBuf {
    match events.parent() {
        Some(parent) => parent.join(DEFAULT_REPORT_NAME),
        None => PathBuf::from(DEFAULT_REPORT_NAME),
    }
}

fn handle_init(path: &Path, baseline_path: &Path, options: ScanOptions) -> anyhow::Result<ExitCode> {
    let root = check_root(path)?;

    info!("Scanning {}", root.display());
    let baseline = build_snapshot(&root, &options)?;

    println!("Found {} files", baseline.len());
    store::save_baseline(&baseline, baseline_path)?;
    println!("Baseline saved to {}", baseline_path.display());

    Ok(ExitCode::SUCCESS)
}

fn handle_verify(
    path: &Path,
    baseline_path: &Path,
    options: ScanOptions,
) -> anyhow::Result<ExitCode> {
    let root = check_root(path)?;
    let baseline = store::load_baseline(baseline_path)?;

    info!("Verifying {} files in {}", baseline.len(), root.display());
    let current = build_snapshot(&root, &options)?;
    let result = diffing::diff(&baseline, &current);

    if result.is_clean() {
        println!("All {} files match baseline", baseline.len());
        return Ok(ExitCode::SUCCESS);
    }

    diffing::print_diff(&result);
    println!();
    println!("Found {} integrity issues", result.total_issues());

    Ok(MonitorExitCode::issues_found())
}

fn handle_watch(
    path: &Path,
    baseline_path: &Path,
    events_path: &Path,
    report_path: &Path,
) -> anyhow::Result<ExitCode> {
    let root = check_root(path)?;
    let baseline = store::load_baseline(baseline_path)?;
    let mut events = store::load_events(events_path)?;

    let cancel = watch::interrupt_flag()?;
    println!("Watching {} (press Ctrl-C to stop)", root.display());

    let outcome = watch::watch_tree(&root, baseline, &cancel)?;
    let new_events = outcome.events.len();
    events.extend(outcome.events);

    store::save_baseline(&outcome.baseline, baseline_path)?;
    store::save_events(&events, events_path)?;

    println!("Detected {} new events", new_events);
    println!("Updated baseline saved to {}", baseline_path.display());
    println!("Events saved to {}", events_path.display());

    report::write_report(&events, report_path)?;
    println!("Report saved to {}", report_path.display());

    Ok(ExitCode::SUCCESS)
}

fn handle_report(events_path: &Path, out: &Path) -> anyhow::Result<ExitCode> {
    if !events_path.exists() {
        return Err(store::StoreError::NotFound(events_path.to_path_buf()).into());
    }
    let events = store::load_events(events_path)?;

    report::write_report(&events, out)?;
    println!("Report saved to {} ({} events)", out.display(), events.len());

    Ok(ExitCode::SUCCESS)
}

fn init_tracing(verbose: u8, log_level: Option<LevelFilter>) {
    let stderr_is_terminal = stderr().is_terminal();
    let formatter = EmojiFormatter { stderr_is_terminal };

    let explicit_level = match (log_level, verbose) {
        (Some(level), _) => Some(level),
        (None, 0) => None,
        (None, 1) => Some(LevelFilter::INFO),
        (None, _) => Some(LevelFilter::DEBUG),
    };

    let filter = match explicit_level {
        Some(level) => EnvFilter::default().add_directive(level.into()),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
    };

    let fmt_layer = tracing_fmt::layer()
        .event_format(formatter)
        .with_writer(std::io::stderr);

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .init();
}

struct EmojiFormatter {
    stderr_is_terminal: bool,
}

impl<S, N> FormatEvent<S, N> for EmojiFormatter
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> stdfmt::Result {
        if self.stderr_is_terminal {
            match *event.metadata().level() {
                Level::TRACE => write!(writer, "🔬 ")?,
                Level::DEBUG => write!(writer, "🔍 ")?,
                Level::INFO => write!(writer, "ℹ️ ")?,
                Level::WARN => write!(writer, "⚠️  ")?,
                Level::ERROR => write!(writer, "❌️ ")?,
                _ => {}
            }
        } else {
            match *event.metadata().level() {
                Level::TRACE => writer.write_str("TRACE: ")?,
                Level::DEBUG => writer.write_str("DEBUG: ")?,
                Level::INFO => writer.write_str("INFO: ")?,
                Level::WARN => writer.write_str("WARN: ")?,
                Level::ERROR => writer.write_str("ERROR: ")?,
                _ => {}
            }
        }

        ctx.format_fields(writer.by_ref(), event)?;
        writeln!(writer)
    }
}
