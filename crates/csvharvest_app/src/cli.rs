//! Command line definitions.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use csvharvest_engine::DEFAULT_API_BASE;
use engine_logging::LogDestination;
use log::LevelFilter;

/// Discover CSV resources on data.gouv.fr and profile their first line.
#[derive(Parser, Debug)]
#[command(name = "csvharvest")]
#[command(author, version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Where log lines go
    #[arg(long, value_enum, global = true, default_value_t = LogTarget::Terminal)]
    pub log: LogTarget,

    /// Log file used by `--log file|both`
    #[arg(long, global = true)]
    pub log_file: Option<PathBuf>,

    /// Increase output verbosity (-v for debug, -vv for trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Walk the catalog and write `dataset|id|url` records for CSV resources
    Fetch(FetchArgs),
    /// Sniff every resource of a fetch output and write a JSON array of profiles
    Process(ProcessArgs),
    /// Print datasets as the catalog pages them
    List(ListArgs),
}

#[derive(Args, Debug)]
pub struct FetchArgs {
    /// Output file for resource records
    #[arg(short, long)]
    pub output: PathBuf,

    /// Datasets requested per page job
    #[arg(short = 'I', long, default_value_t = 10, value_parser = clap::value_parser!(u32).range(1..=1000))]
    pub increment: u32,

    /// Concurrent page jobs
    #[arg(short = 't', long, default_value_t = 2, value_parser = clap::value_parser!(u16).range(1..))]
    pub threads: u16,

    /// Base URL of the catalog API
    #[arg(long, default_value = DEFAULT_API_BASE)]
    pub api: String,
}

#[derive(Args, Debug)]
pub struct ProcessArgs {
    /// Records file written by `fetch`
    #[arg(short, long)]
    pub input: PathBuf,

    /// Output JSON file
    #[arg(short, long)]
    pub output: PathBuf,

    /// Concurrent sniffing jobs
    #[arg(short = 't', long, default_value_t = 16, value_parser = clap::value_parser!(u16).range(1..))]
    pub threads: u16,
}

#[derive(Args, Debug)]
pub struct ListArgs {
    /// Stop after this many datasets
    #[arg(long)]
    pub limit: Option<usize>,

    /// Datasets requested per page
    #[arg(short = 'I', long, default_value_t = 10, value_parser = clap::value_parser!(u32).range(1..=1000))]
    pub increment: u32,

    /// Base URL of the catalog API
    #[arg(long, default_value = DEFAULT_API_BASE)]
    pub api: String,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogTarget {
    Terminal,
    File,
    Both,
}

impl From<LogTarget> for LogDestination {
    fn from(target: LogTarget) -> Self {
        match target {
            LogTarget::Terminal => LogDestination::Terminal,
            LogTarget::File => LogDestination::File,
            LogTarget::Both => LogDestination::Both,
        }
    }
}

impl Cli {
    pub fn level(&self) -> LevelFilter {
        match self.verbose {
            0 => LevelFilter::Info,
            1 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    }
}
