//! `ftext` binary entry point.

use std::io;
use std::process::ExitCode;

use clap::Parser;
use ftext_cli::{Cli, Streams, run};
use tracing_subscriber::{EnvFilter, fmt};

fn init_logging(verbose: u8) {
    let filter = match verbose {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .init();
}

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            let _ = err.print();
            // --help and --version are not failures
            return if err.use_stderr() {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            };
        }
    };
    init_logging(cli.verbose);

    let mut stdin = io::stdin().lock();
    let mut stdout = io::stdout().lock();
    let mut stderr = io::stderr().lock();
    let mut streams = Streams::new(&mut stdin, &mut stdout, &mut stderr);

    let code = match run(cli.command, &mut streams) {
        Ok(outcome) => outcome.exit_code(),
        Err(err) => {
            let _ = err.report(streams.stderr);
            err.exit_code()
        }
    };
    let _ = streams.stdout.flush();
    code
}
