//! Command line of the auth dialog. The GUI helper is spawned with the same
//! arguments and reads them with the same parser.

use clap::{ArgAction, Parser};

#[derive(Parser, Debug)]
#[command(name = "nm-novpn-auth-dialog")]
#[command(about = "novpn auth dialog")]
pub struct AuthDialogArgs {
    /// Reprompt for passwords
    #[arg(short, long)]
    pub reprompt: bool,

    /// UUID of VPN connection
    #[arg(short, long)]
    pub uuid: Option<String>,

    /// Name of VPN connection
    #[arg(short, long)]
    pub name: Option<String>,

    /// VPN service type
    #[arg(short, long)]
    pub service: Option<String>,

    /// Allow user interaction
    #[arg(short = 'i', long)]
    pub allow_interaction: bool,

    /// External UI mode
    #[arg(long)]
    pub external_ui_mode: bool,

    /// More log output on stderr (repeat for more)
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_nm_style_arguments() {
        let args = AuthDialogArgs::try_parse_from([
            "nm-novpn-auth-dialog",
            "-u",
            "7d3a1b4e",
            "--name=Mock VPN",
            "--service",
            "org.freedesktop.NetworkManager.Novpn",
            "-i",
            "-vv",
        ])
        .unwrap();

        assert_eq!(args.uuid.as_deref(), Some("7d3a1b4e"));
        assert_eq!(args.name.as_deref(), Some("Mock VPN"));
        assert!(args.allow_interaction);
        assert!(!args.reprompt && !args.external_ui_mode);
        assert_eq!(args.verbose, 2);
    }

    #[test]
    fn verbosity_defaults_to_zero() {
        let args = AuthDialogArgs::try_parse_from(["nm-novpn-auth-dialog", "-r"]).unwrap();
        assert!(args.reprompt);
        assert_eq!(args.verbose, 0);
    }
}
