use clap::Parser;
use log::error;

use std::io;
use std::process::ExitCode;

use hashchain::app::run;
use hashchain::config::Cli;

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize logger
    env_logger::init_from_env(env_logger::Env::new().default_filter_or(cli.log_filter()));

    match run(&cli, &mut io::stdout().lock()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{:#}", err);
            eprintln!("Encountered error: {:#}", err);
            ExitCode::FAILURE
        }
    }
}
