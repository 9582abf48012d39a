use mdr_core::logging;

mod cli;

use crate::cli::CliCommand;

#[tokio::main]
async fn main() {
    // Initialize logging as early as possible; fall back to stderr when the
    // log file cannot be opened.
    if logging::init().is_err() {
        logging::init_stderr();
    }

    // Parse CLI and dispatch.
    if let Err(err) = CliCommand::run_from_args().await {
        eprintln!("mdr error: {:#}", err);
        std::process::exit(1);
    }
}
