//! Prompt descriptor
//!
//! The key file handed from the auth dialog to its GUI helper. The first
//! group is always `[VPN Plugin UI]`:
//!
//! ```text
//! [VPN Plugin UI]
//! Version=2
//! Description=Tell me all your secrets
//! Title=Authenticate VPN
//!
//! [password]
//! Label=Password
//! IsSecret=true
//! ShouldAsk=true
//! ```
//!
//! Every following group names one secret. Entries that are both secret and
//! marked `ShouldAsk` are shown to the user; the answers are written back
//! into their `Value` keys and reported as `name\nvalue\n` pairs followed by
//! a blank line.

use std::io::Write;

use tracing::debug;

use crate::error::{Error, KeyFileError, Result};
use crate::keyfile::KeyFile;

/// Name of the document group.
pub const UI_GROUP: &str = "VPN Plugin UI";
/// The only protocol version understood by the helper.
pub const UI_VERSION: i64 = 2;
/// Number of password fields the prompt can show.
pub const MAX_PROMPTS: usize = 3;

pub const DEFAULT_TITLE: &str = "Authenticate VPN";
pub const DEFAULT_DESCRIPTION: &str = "Tell me all your secrets";

/// Decide whether the user has to be asked for a secret.
///
/// A known value suppresses the prompt unless a reprompt is requested, and
/// nothing is ever asked when interaction is not allowed.
pub fn should_ask(allow_interaction: bool, reprompt: bool, has_value: bool) -> bool {
    let mut ask = true;
    if !allow_interaction {
        ask = false;
    }
    if has_value {
        ask = false;
    }
    if reprompt {
        ask = true;
    }
    if !allow_interaction {
        ask = false;
    }
    ask
}

/// One secret the auth dialog wants resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SecretRequest<'a> {
    /// Secret name, used as the entry's group name.
    pub name: &'a str,
    pub label: &'a str,
    /// Value already known to the caller.
    pub value: Option<&'a str>,
    pub allow_interaction: bool,
    pub reprompt: bool,
}

impl SecretRequest<'_> {
    pub fn should_ask(&self) -> bool {
        should_ask(self.allow_interaction, self.reprompt, self.value.is_some())
    }
}

/// Build a descriptor for the given secrets.
pub fn build_descriptor(title: &str, description: &str, requests: &[SecretRequest<'_>]) -> KeyFile {
    let mut keyfile = KeyFile::new();

    keyfile.set_integer(UI_GROUP, "Version", UI_VERSION);
    keyfile.set_string(UI_GROUP, "Description", description);
    keyfile.set_string(UI_GROUP, "Title", title);

    for request in requests {
        keyfile.set_string(request.name, "Label", request.label);
        if let Some(value) = request.value {
            keyfile.set_string(request.name, "Value", value);
        }
        keyfile.set_boolean(request.name, "IsSecret", true);
        keyfile.set_boolean(request.name, "ShouldAsk", request.should_ask());
    }

    keyfile
}

/// A password field shown to the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompt {
    /// Group the answer is written back to.
    pub group: String,
    pub label: String,
    /// Pre-filled value.
    pub value: Option<String>,
}

/// An eligible entry that could not be shown.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedEntry {
    pub group: String,
    pub reason: KeyFileError,
}

/// One authentication attempt on the helper side.
///
/// Owns the parsed descriptor and the slot assignment from entries to
/// prompts. Consumed by [`respond`](Self::respond) once the user accepts.
#[derive(Debug, Clone)]
pub struct PromptSession {
    keyfile: KeyFile,
    title: String,
    description: String,
    prompts: Vec<Prompt>,
    skipped: Vec<SkippedEntry>,
}

impl PromptSession {
    /// Parse and validate descriptor text.
    pub fn from_data(data: &str) -> Result<Self> {
        Self::from_keyfile(KeyFile::parse(data)?)
    }

    /// Validate a descriptor and assign its eligible entries to prompts.
    ///
    /// The document group is checked before any entry is looked at. An
    /// eligible entry without a `Label` is skipped; more than
    /// [`MAX_PROMPTS`] eligible entries fail the whole session.
    pub fn from_keyfile(keyfile: KeyFile) -> Result<Self> {
        if keyfile.start_group() != Some(UI_GROUP) {
            return Err(Error::UnexpectedGroup { expected: UI_GROUP });
        }

        let version = keyfile.get_string(UI_GROUP, "Version")?;
        if version != UI_VERSION.to_string() {
            return Err(Error::UnsupportedVersion {
                expected: UI_VERSION,
                found: version,
            });
        }

        let title = keyfile.get_string(UI_GROUP, "Title")?;
        let description = keyfile.get_string(UI_GROUP, "Description")?;

        let mut prompts = Vec::new();
        let mut skipped = Vec::new();

        for group in keyfile.groups().skip(1) {
            match eligible_prompt(&keyfile, group) {
                Ok(Some(prompt)) => {
                    if prompts.len() == MAX_PROMPTS {
                        return Err(Error::TooManySecrets { max: MAX_PROMPTS });
                    }
                    debug!(group, slot = prompts.len(), "assigned prompt");
                    prompts.push(prompt);
                }
                Ok(None) => {}
                Err(reason) => {
                    debug!(group, %reason, "entry not shown");
                    skipped.push(SkippedEntry {
                        group: group.to_owned(),
                        reason,
                    });
                }
            }
        }

        Ok(Self {
            keyfile,
            title,
            description,
            prompts,
            skipped,
        })
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    /// Prompts in slot order.
    pub fn prompts(&self) -> &[Prompt] {
        &self.prompts
    }

    pub fn skipped(&self) -> &[SkippedEntry] {
        &self.skipped
    }

    /// Write the user's answers into the descriptor and return it.
    ///
    /// `responses[i]` answers `prompts()[i]`. Missing responses leave the
    /// entry as it was; extra ones are ignored.
    pub fn respond<S: AsRef<str>>(mut self, responses: &[S]) -> KeyFile {
        for (prompt, response) in self.prompts.iter().zip(responses) {
            self.keyfile
                .set_string(&prompt.group, "Value", response.as_ref());
        }
        self.keyfile
    }
}

fn eligible_prompt(keyfile: &KeyFile, group: &str) -> std::result::Result<Option<Prompt>, KeyFileError> {
    let is_secret = keyfile.get_boolean(group, "IsSecret").unwrap_or(false);
    let should_ask = keyfile.get_boolean(group, "ShouldAsk").unwrap_or(false);
    if !is_secret || !should_ask {
        return Ok(None);
    }

    let label = keyfile.get_string(group, "Label")?;
    // An unreadable pre-fill still gets its slot, just empty.
    let value = keyfile.get_optional_string(group, "Value").ok().flatten();

    Ok(Some(Prompt {
        group: group.to_owned(),
        label,
        value,
    }))
}

/// Print every entry with a non-empty `Value` as `name\nvalue\n`, then a
/// terminating blank line.
pub fn write_secrets<W: Write>(keyfile: &KeyFile, out: &mut W) -> Result<()> {
    for group in keyfile.groups().filter(|g| *g != UI_GROUP) {
        let Ok(Some(value)) = keyfile.get_optional_string(group, "Value") else {
            continue;
        };
        if value.is_empty() {
            continue;
        }
        writeln!(out, "{group}")?;
        writeln!(out, "{value}")?;
    }
    writeln!(out)?;
    out.flush()?;
    Ok(())
}

/// Parse the reporter's output back into `(name, value)` pairs.
///
/// Reading stops at the first empty name line.
pub fn parse_secrets(output: &str) -> Vec<(String, String)> {
    let mut secrets = Vec::new();
    let mut lines = output.lines();

    while let Some(name) = lines.next() {
        if name.is_empty() {
            break;
        }
        let Some(value) = lines.next() else {
            break;
        };
        secrets.push((name.to_owned(), value.to_owned()));
    }

    secrets
}
