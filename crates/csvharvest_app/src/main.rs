//! `csvharvest` command line entry point.

use std::process::ExitCode;

use clap::Parser;
use engine_logging::{engine_debug, engine_error};

mod cli;
mod commands;

use cli::{Cli, Command};

fn main() -> ExitCode {
    // Parse first so --help works before any logger is installed.
    let cli = Cli::parse();
    engine_logging::initialize(cli.log.into(), cli.level(), cli.log_file.as_deref());
    engine_debug!("{:?}", cli);

    let runtime = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(err) => {
            engine_error!("failed to start runtime: {}", err);
            return ExitCode::FAILURE;
        }
    };

    let result = runtime.block_on(async move {
        match cli.command {
            Command::Fetch(args) => commands::fetch(args).await,
            Command::Process(args) => commands::process(args).await,
            Command::List(args) => commands::list(args).await,
        }
    });

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            engine_error!("{:#}", err);
            ExitCode::FAILURE
        }
    }
}
