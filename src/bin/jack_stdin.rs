use std::process::ExitCode;

use clap::Parser;

use jack_stdio::cli::StdinArgs;
use jack_stdio::lifecycle;

fn main() -> ExitCode {
    let args = StdinArgs::parse();
    let quiet = args.common.quiet;

    let level = if quiet { log::LevelFilter::Error } else { log::LevelFilter::Info };
    env_logger::Builder::from_default_env().filter_level(level).init();

    let source = match lifecycle::open_source(&args) {
        Ok(source) => source,
        Err(e) => {
            log::error!("{e}");
            return ExitCode::FAILURE;
        }
    };

    match lifecycle::run_stdin(args, source) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{e}");
            ExitCode::FAILURE
        }
    }
}
