//! Mock VPN plugin for NetworkManager
//!
//! Everything a VPN plugin provides, with nothing behind it: a service that
//! "connects" by publishing a fixed IPv4 configuration, a connection editor,
//! an import/export format and an auth dialog.
//!
//! The auth dialog is split in two processes. `nm-novpn-auth-dialog` reads
//! the connection from NetworkManager, decides what to ask and hands a
//! [prompt descriptor](descriptor) to `nm-novpn-auth-dialog-gui`, which
//! shows a session-lock prompt and prints the answers back.
//!
//! # Usage
//!
//! Building the descriptor for the helper:
//!
//! ```
//! use novpn::descriptor::{build_descriptor, SecretRequest, DEFAULT_DESCRIPTION, DEFAULT_TITLE};
//!
//! let request = SecretRequest {
//!     name: "password",
//!     label: "Password",
//!     value: None,
//!     allow_interaction: true,
//!     reprompt: false,
//! };
//! let data = build_descriptor(DEFAULT_TITLE, DEFAULT_DESCRIPTION, &[request]).to_data();
//! assert!(data.starts_with("[VPN Plugin UI]\nVersion=2\n"));
//! ```

pub mod cli;
pub mod descriptor;
pub mod details;
pub mod editor;
pub mod error;
pub mod helper;
pub mod keyfile;
pub mod logging;
pub mod plugin;
pub mod service;
pub mod setting;
mod ui;

pub use error::{Error, KeyFileError, Result};

use crate::descriptor::PromptSession;

/// Helper exit code: the user accepted.
pub const EXIT_ACCEPTED: u8 = 0;
/// Helper exit code: the user cancelled.
pub const EXIT_CANCELLED: u8 = 1;
/// Helper exit code: anything else went wrong.
pub const EXIT_ERROR: u8 = 3;

/// How a prompt ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PromptOutcome {
    /// Answers in slot order
    Accepted(Vec<String>),
    Cancelled,
}

impl PromptOutcome {
    pub fn exit_code(&self) -> u8 {
        match self {
            PromptOutcome::Accepted(_) => EXIT_ACCEPTED,
            PromptOutcome::Cancelled => EXIT_CANCELLED,
        }
    }
}

/// Show the prompt for `session` and block until the user responds.
pub fn show_prompt(session: &PromptSession) -> Result<PromptOutcome> {
    ui::run(session)
}
