mod help_text;

use clap::{ArgAction, Parser, Subcommand};
use std::num::NonZeroUsize;
use std::path::PathBuf;
use tracing::level_filters::LevelFilter;

/// File integrity monitor for directory trees
#[derive(Parser, Debug)]
#[command(name = "tamperwatch", version, about, long_about = help_text::ROOT_LONG_ABOUT)]
pub struct Cli {
    /// Increase log verbosity (-v for info, -vv for debug)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Set the log level explicitly (error, warn, info, debug, trace)
    #[arg(long, value_name = "LEVEL", global = true, conflicts_with = "verbose")]
    pub log_level: Option<LevelFilter>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Scan a directory and record its baseline
    #[command(long_about = help_text::INIT_LONG_ABOUT)]
    Init {
        /// Directory to scan
        #[arg(long, value_name = "DIR")]
        path: PathBuf,

        /// Where to write the baseline
        #[arg(long, value_name = "FILE")]
        baseline: PathBuf,

        /// Number of hashing threads (defaults to available parallelism)
        #[arg(long, short = 'j', value_name = "N")]
        jobs: Option<NonZeroUsize>,
    },

    /// Compare a directory against its baseline, exit with success if clean
    #[command(long_about = help_text::VERIFY_LONG_ABOUT)]
    Verify {
        /// Directory to verify
        #[arg(long, value_name = "DIR")]
        path: PathBuf,

        /// Baseline to compare against
        #[arg(long, value_name = "FILE")]
        baseline: PathBuf,

        /// Number of hashing threads (defaults to available parallelism)
        #[arg(long, short = 'j', value_name = "N")]
        jobs: Option<NonZeroUsize>,
    },

    /// Watch a directory and record changes until interrupted
    #[command(long_about = help_text::WATCH_LONG_ABOUT)]
    Watch {
        /// Directory to watch
        #[arg(long, value_name = "DIR")]
        path: PathBuf,

        /// Baseline to start from; rewritten when the session ends
        #[arg(long, value_name = "FILE")]
        baseline: PathBuf,

        /// Event log to append to
        #[arg(long, value_name = "FILE")]
        events: PathBuf,

        /// Where to write the HTML report (defaults to report.html beside the event log)
        #[arg(long, value_name = "FILE")]
        report: Option<PathBuf>,
    },

    /// Render an HTML report from an event log
    #[command(long_about = help_text::REPORT_LONG_ABOUT)]
    Report {
        /// Event log to read
        #[arg(long, value_name = "FILE")]
        events: PathBuf,

        /// Where to write the HTML report
        #[arg(long, value_name = "FILE")]
        out: PathBuf,
    },
}

impl Cli {
    pub fn parse() -> Self {
        <Self as Parser>::parse()
    }
}
