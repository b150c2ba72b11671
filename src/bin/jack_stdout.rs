use std::io;
use std::process::ExitCode;

use clap::Parser;

use jack_stdio::cli::StdoutArgs;
use jack_stdio::lifecycle;

fn main() -> ExitCode {
    let args = StdoutArgs::parse();
    let quiet = args.common.quiet;

    let level = if quiet { log::LevelFilter::Error } else { log::LevelFilter::Info };
    env_logger::Builder::from_default_env().filter_level(level).init();

    let sink: Box<dyn io::Write + Send> = Box::new(io::stdout());

    match lifecycle::run_stdout(args, sink) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{e}");
            ExitCode::FAILURE
        }
    }
}
