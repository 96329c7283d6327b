//! nm-novpn-auth-dialog-gui binary
//!
//! Spawned by nm-novpn-auth-dialog with a prompt descriptor on stdin. Shows
//! the password prompt and prints the answers to stdout.
//! It receives the auth dialog's own arguments and only honours `-v`.

use std::io::{self, Read};
use std::process::ExitCode;

use clap::Parser;
use tracing::info;

use novpn::cli::AuthDialogArgs;
use novpn::descriptor::{write_secrets, PromptSession};
use novpn::{show_prompt, PromptOutcome, EXIT_ERROR};

fn main() -> ExitCode {
    // Arguments are the auth dialog's; only the verbosity matters here.
    let verbosity = AuthDialogArgs::try_parse().map_or(0, |args| args.verbose);
    novpn::logging::init(verbosity);

    let mut data = String::new();
    if let Err(e) = io::stdin().read_to_string(&mut data) {
        eprintln!("Error: {e}");
        return ExitCode::from(EXIT_ERROR);
    }

    let session = match PromptSession::from_data(&data) {
        Ok(session) => session,
        Err(e) => {
            eprintln!("Error: {e}");
            return ExitCode::from(EXIT_ERROR);
        }
    };

    for entry in session.skipped() {
        eprintln!("Skipping entry: {}", entry.reason);
    }

    // Nothing to ask: report the values we were given without locking the screen.
    let outcome = if session.prompts().is_empty() {
        info!("no entries to prompt for");
        PromptOutcome::Accepted(Vec::new())
    } else {
        match show_prompt(&session) {
            Ok(outcome) => outcome,
            Err(e) => {
                eprintln!("Error: {e}");
                return ExitCode::from(EXIT_ERROR);
            }
        }
    };

    let code = outcome.exit_code();
    let PromptOutcome::Accepted(values) = outcome else {
        info!("prompt cancelled");
        return ExitCode::from(code);
    };

    let keyfile = session.respond(&values);
    if let Err(e) = write_secrets(&keyfile, &mut io::stdout().lock()) {
        eprintln!("Error: {e}");
        return ExitCode::from(EXIT_ERROR);
    }

    ExitCode::from(code)
}
