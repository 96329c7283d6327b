//! Error types for the mock VPN plugin.

use std::path::PathBuf;
use std::process::ExitStatus;

/// Result type alias using the crate's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while reading or querying a key file.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum KeyFileError {
    /// A key/value line appeared before any `[group]` header.
    #[error("line {line}: key file does not start with a group")]
    KeyOutsideGroup { line: usize },

    /// A `[group]` header is malformed or has an invalid name.
    #[error("line {line}: invalid group name")]
    InvalidGroup { line: usize },

    /// A line that is neither a comment, a group header nor `key=value`.
    #[error("line {line}: key file contains line \"{content}\" which is not a key-value pair, group, or comment")]
    InvalidLine { line: usize, content: String },

    /// A key name is empty or contains characters not allowed in keys.
    #[error("line {line}: invalid key name \"{key}\"")]
    InvalidKey { line: usize, key: String },

    #[error("key file does not have group \"{0}\"")]
    GroupNotFound(String),

    #[error("key file does not have key \"{key}\" in group \"{group}\"")]
    KeyNotFound { group: String, key: String },

    #[error("key file contains escape sequence \"\\{sequence}\" which is invalid")]
    InvalidEscape { sequence: char },

    #[error("key file contains escape character at end of line")]
    TrailingEscape,

    #[error("key file contains key \"{key}\" in group \"{group}\" which has a value that cannot be interpreted")]
    InvalidValue { group: String, key: String },
}

/// Errors that can occur in the plugin and its helpers.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    KeyFile(#[from] KeyFileError),

    /// The prompt descriptor does not start with the document group.
    #[error("Expected [{expected}]")]
    UnexpectedGroup { expected: &'static str },

    /// The prompt descriptor speaks another protocol version.
    #[error("Expected Version={expected}")]
    UnsupportedVersion { expected: i64, found: String },

    /// More entries ask for secrets than the prompt can show.
    #[error("More than {max} passwords are not supported.")]
    TooManySecrets { max: usize },

    /// The VPN details stream ended before its `DONE` marker.
    #[error("unexpected end of input while reading VPN details")]
    DetailsIncomplete,

    /// A secret flags data item is not a decimal number.
    #[error("invalid flags \"{value}\" for secret \"{secret}\"")]
    InvalidSecretFlags { secret: String, value: String },

    /// The connection has no VPN setting to operate on.
    #[error("connection \"{0}\" has no VPN setting")]
    MissingVpnSetting(String),

    #[error("{}: {source}", .helper.display())]
    Spawn {
        helper: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write to {}: {source}", .helper.display())]
    HelperWrite {
        helper: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to wait for {}: {source}", .helper.display())]
    HelperWait {
        helper: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The helper ran but did not exit successfully.
    #[error("{} exited with {status}", .helper.display())]
    HelperFailed { helper: PathBuf, status: ExitStatus },

    /// The helper printed something that is not UTF-8.
    #[error("{} produced output that is not valid UTF-8", .helper.display())]
    HelperOutput { helper: PathBuf },

    /// The prompt UI could not be started.
    #[error("failed to run the prompt UI: {0}")]
    Ui(String),

    /// A service request or signal could not be encoded or decoded.
    #[error("invalid service message: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
