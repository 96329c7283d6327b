//! nm-novpn-auth-dialog binary
//!
//! Spawned by NetworkManager or a secret agent to collect the password of a
//! mock VPN connection. Reads the connection details from stdin, builds the
//! prompt descriptor and either prints it (external UI mode) or runs the GUI
//! helper and forwards the secrets it prints.

use std::ffi::{OsStr, OsString};
use std::io::{self, Write};
use std::process::ExitCode;

use clap::error::ErrorKind;
use clap::Parser;
use tracing::{debug, info};

use novpn::cli::AuthDialogArgs;
use novpn::descriptor::{
    build_descriptor, parse_secrets, SecretRequest, DEFAULT_DESCRIPTION, DEFAULT_TITLE,
};
use novpn::details::read_vpn_details;
use novpn::helper::{helper_path, run_gui_helper};
use novpn::setting::{VpnSetting, PASSWORD_SECRET};

const DEFAULT_PROGNAME: &str = "nm-novpn-auth-dialog";

fn main() -> ExitCode {
    let args: Vec<OsString> = std::env::args_os().collect();

    let cli = match AuthDialogArgs::try_parse_from(&args) {
        Ok(cli) => cli,
        Err(e) if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => e.exit(),
        Err(e) => {
            eprintln!("Bad command line options: {e}");
            return ExitCode::FAILURE;
        }
    };

    novpn::logging::init(cli.verbose);

    let (Some(uuid), Some(name), Some(service)) = (&cli.uuid, &cli.name, &cli.service) else {
        eprintln!("A connection UUID, name, and VPN plugin service name are required.");
        return ExitCode::FAILURE;
    };

    let details = match read_vpn_details(&mut io::stdin().lock()) {
        Ok(details) => details,
        Err(e) => {
            eprintln!("Failed to read '{name}' ({uuid}) data and secrets from stdin: {e}");
            return ExitCode::FAILURE;
        }
    };

    let setting = VpnSetting::from_details(service.as_str(), details);
    debug!(setting = %setting.dump(false), "connection details");

    let request = SecretRequest {
        name: PASSWORD_SECRET,
        label: "Password",
        value: setting.secret(PASSWORD_SECRET),
        allow_interaction: cli.allow_interaction,
        reprompt: cli.reprompt,
    };
    let descriptor = build_descriptor(DEFAULT_TITLE, DEFAULT_DESCRIPTION, &[request]).to_data();

    let result = if cli.external_ui_mode {
        print_stdout(&descriptor)
    } else {
        forward_secrets(&args, &descriptor)
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

/// Run the GUI helper and pass its answers on to our caller.
fn forward_secrets(args: &[OsString], descriptor: &str) -> novpn::Result<()> {
    let progname = args
        .first()
        .map(OsString::as_os_str)
        .unwrap_or(OsStr::new(DEFAULT_PROGNAME));
    let helper = helper_path(progname);

    let secrets = run_gui_helper(&helper, args.get(1..).unwrap_or_default(), descriptor)?;
    info!(count = parse_secrets(&secrets).len(), "received secrets from helper");

    print_stdout(&secrets)
}

fn print_stdout(data: &str) -> novpn::Result<()> {
    let mut stdout = io::stdout().lock();
    stdout.write_all(data.as_bytes())?;
    stdout.flush()?;
    Ok(())
}
