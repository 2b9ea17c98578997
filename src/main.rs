use std::{path::PathBuf, process::ExitCode};

use clap::Parser;
use log::{error, info, LevelFilter};
use strongarm::{config::Config, pipeline, sql};

/// Searches short closed-form equations over a few mathematical constants
/// and dumps the shortest one per value as SQL inserts.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// Where to write the insert statements
    #[arg(short, long, default_value = sql::DEFAULT_OUTPUT)]
    output: PathBuf,

    /// More progress output (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Only report warnings and errors
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

impl Args {
    fn log_level(&self) -> LevelFilter {
        match (self.quiet, self.verbose) {
            (true, _) => LevelFilter::Warn,
            (false, 0) => LevelFilter::Info,
            (false, 1) => LevelFilter::Debug,
            (false, _) => LevelFilter::Trace,
        }
    }
}

fn main() -> ExitCode {
    let args = Args::parse();
    colog::default_builder()
        .filter_level(args.log_level())
        .init();

    info!("Started");

    let results = match pipeline::run(&Config::default()) {
        Ok(results) => results,
        Err(e) => {
            error!("Invalid configuration: {e}");
            return ExitCode::FAILURE;
        },
    };

    match sql::save(&results, &args.output) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("Could not write {}: {e}", args.output.display());
            ExitCode::FAILURE
        },
    }
}
