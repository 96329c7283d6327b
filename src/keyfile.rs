//! Key file codec
//!
//! The `[Group]` / `Key=Value` document format shared by the auth dialog,
//! its GUI helper and the import/export adapter. Groups and keys keep their
//! document order. Values are stored escaped and decoded on access, so a bad
//! escape sequence only fails the lookup that touches it.

use std::fs;
use std::path::Path;

use crate::error::{KeyFileError, Result};

type KeyFileResult<T> = std::result::Result<T, KeyFileError>;

#[derive(Debug, Clone, PartialEq, Eq)]
struct Group {
    name: String,
    entries: Vec<(String, String)>,
}

impl Group {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_owned(),
            entries: Vec::new(),
        }
    }

    fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    fn set(&mut self, key: &str, raw: String) {
        match self.entries.iter_mut().find(|(k, _)| k == key) {
            Some((_, value)) => *value = raw,
            None => self.entries.push((key.to_owned(), raw)),
        }
    }
}

/// An ordered key file document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeyFile {
    groups: Vec<Group>,
}

impl KeyFile {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a key file from text.
    ///
    /// Blank lines and `#` comments are dropped. A group that appears twice
    /// is merged into its first occurrence; a repeated key keeps the last
    /// value.
    pub fn parse(data: &str) -> KeyFileResult<Self> {
        let mut keyfile = Self::new();
        let mut current: Option<usize> = None;

        for (index, line) in data.lines().enumerate() {
            let line_no = index + 1;
            let line = line.trim_start();

            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            if line.starts_with('[') {
                let end = line
                    .rfind(']')
                    .ok_or(KeyFileError::InvalidGroup { line: line_no })?;
                let name = &line[1..end];
                if !is_group_name(name) || !line[end + 1..].trim().is_empty() {
                    return Err(KeyFileError::InvalidGroup { line: line_no });
                }
                current = Some(keyfile.group_index_or_insert(name));
                continue;
            }

            let Some((key, value)) = line.split_once('=') else {
                return Err(KeyFileError::InvalidLine {
                    line: line_no,
                    content: line.to_owned(),
                });
            };

            let key = key.trim_end();
            if !is_key_name(key) {
                return Err(KeyFileError::InvalidKey {
                    line: line_no,
                    key: key.to_owned(),
                });
            }

            let group = current.ok_or(KeyFileError::KeyOutsideGroup { line: line_no })?;
            keyfile.groups[group].set(key, value.trim_start().to_owned());
        }

        Ok(keyfile)
    }

    /// Load and parse a key file from disk.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let data = fs::read_to_string(path)?;
        Ok(Self::parse(&data)?)
    }

    /// Write the serialized document to disk, replacing any existing file.
    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        fs::write(path, self.to_data())?;
        Ok(())
    }

    /// Serialize to text. Groups are separated by a blank line.
    pub fn to_data(&self) -> String {
        let mut out = String::new();
        for (index, group) in self.groups.iter().enumerate() {
            if index > 0 {
                out.push('\n');
            }
            out.push('[');
            out.push_str(&group.name);
            out.push_str("]\n");
            for (key, value) in &group.entries {
                out.push_str(key);
                out.push('=');
                out.push_str(value);
                out.push('\n');
            }
        }
        out
    }

    /// Group names in document order.
    pub fn groups(&self) -> impl Iterator<Item = &str> {
        self.groups.iter().map(|g| g.name.as_str())
    }

    /// Name of the first group, if any.
    pub fn start_group(&self) -> Option<&str> {
        self.groups.first().map(|g| g.name.as_str())
    }

    pub fn has_group(&self, group: &str) -> bool {
        self.group(group).is_ok()
    }

    /// Keys of a group in document order.
    pub fn keys(&self, group: &str) -> KeyFileResult<Vec<&str>> {
        Ok(self
            .group(group)?
            .entries
            .iter()
            .map(|(k, _)| k.as_str())
            .collect())
    }

    /// The stored value without unescaping.
    pub fn get_value(&self, group: &str, key: &str) -> KeyFileResult<&str> {
        self.group(group)?
            .get(key)
            .ok_or_else(|| KeyFileError::KeyNotFound {
                group: group.to_owned(),
                key: key.to_owned(),
            })
    }

    pub fn get_string(&self, group: &str, key: &str) -> KeyFileResult<String> {
        unescape(self.get_value(group, key)?)
    }

    /// Like [`get_string`](Self::get_string), but a missing key is `None`.
    pub fn get_optional_string(&self, group: &str, key: &str) -> KeyFileResult<Option<String>> {
        match self.get_string(group, key) {
            Ok(value) => Ok(Some(value)),
            Err(KeyFileError::KeyNotFound { .. }) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Accepts `true`/`1` and `false`/`0`.
    pub fn get_boolean(&self, group: &str, key: &str) -> KeyFileResult<bool> {
        match self.get_value(group, key)?.trim_end() {
            "true" | "1" => Ok(true),
            "false" | "0" => Ok(false),
            _ => Err(KeyFileError::InvalidValue {
                group: group.to_owned(),
                key: key.to_owned(),
            }),
        }
    }

    pub fn get_integer(&self, group: &str, key: &str) -> KeyFileResult<i64> {
        self.get_value(group, key)?
            .trim_end()
            .parse()
            .map_err(|_| KeyFileError::InvalidValue {
                group: group.to_owned(),
                key: key.to_owned(),
            })
    }

    /// Store a value verbatim, creating the group if needed.
    pub fn set_value(&mut self, group: &str, key: &str, raw: &str) {
        let index = self.group_index_or_insert(group);
        self.groups[index].set(key, raw.to_owned());
    }

    pub fn set_string(&mut self, group: &str, key: &str, value: &str) {
        let index = self.group_index_or_insert(group);
        self.groups[index].set(key, escape(value));
    }

    pub fn set_boolean(&mut self, group: &str, key: &str, value: bool) {
        self.set_value(group, key, if value { "true" } else { "false" });
    }

    pub fn set_integer(&mut self, group: &str, key: &str, value: i64) {
        self.set_value(group, key, &value.to_string());
    }

    fn group(&self, name: &str) -> KeyFileResult<&Group> {
        self.groups
            .iter()
            .find(|g| g.name == name)
            .ok_or_else(|| KeyFileError::GroupNotFound(name.to_owned()))
    }

    fn group_index_or_insert(&mut self, name: &str) -> usize {
        match self.groups.iter().position(|g| g.name == name) {
            Some(index) => index,
            None => {
                self.groups.push(Group::new(name));
                self.groups.len() - 1
            }
        }
    }
}

fn is_group_name(name: &str) -> bool {
    !name.is_empty() && !name.chars().any(|c| c == '[' || c == ']' || c.is_control())
}

fn is_key_name(key: &str) -> bool {
    !key.is_empty() && !key.starts_with(' ') && !key.chars().any(|c| c.is_control())
}

/// Escape a string for storage. Leading blanks become `\s`/`\t` so they
/// survive the whitespace trimming done by the parser.
fn escape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut leading = true;
    for c in value.chars() {
        match c {
            ' ' if leading => out.push_str("\\s"),
            '\t' if leading => out.push_str("\\t"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\\' => out.push_str("\\\\"),
            _ => out.push(c),
        }
        if c != ' ' && c != '\t' {
            leading = false;
        }
    }
    out
}

fn unescape(raw: &str) -> KeyFileResult<String> {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('s') => out.push(' '),
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some('\\') => out.push('\\'),
            Some(other) => return Err(KeyFileError::InvalidEscape { sequence: other }),
            None => return Err(KeyFileError::TrailingEscape),
        }
    }
    Ok(out)
}
