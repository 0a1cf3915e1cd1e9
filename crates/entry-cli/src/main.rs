//! `entry` binary entrypoint.
//!
//! `entry <ng_ip> <ng_port> <dockerd_ip> <container_id>`

use std::io;
use std::process::ExitCode;

use clap::Parser;

use entry_cli::cli::Cli;
use entry_cli::commands::{EnterCommand, EnterStatus};
use entry_cli::logging;
use entry_cli::request::term_type_from_env;

fn main() -> ExitCode {
    // Usage errors exit here, before any network activity.
    let cli = Cli::parse();

    if let Err(e) = logging::init(&cli.log_config()) {
        eprintln!("Failed to initialize logging: {e}");
    }

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("Failed to create async runtime: {e}");
            return ExitCode::FAILURE;
        }
    };

    let config = cli.client_config();
    let status = match term_type_from_env() {
        Ok(term_type) => {
            let request = cli.connection_request(term_type);
            runtime.block_on(async {
                let mut stdout = io::stdout();
                EnterCommand::new(&request, &config).execute(&mut stdout).await
            })
        }
        Err(e) => EnterStatus::report(e, &mut io::stdout()),
    };

    // The stdin reader may still be blocked on a read nobody will finish.
    runtime.shutdown_background();

    status.exit_code(cli.fail_on_error)
}
