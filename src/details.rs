//! Reader for the connection details NetworkManager writes to an auth
//! dialog's standard input.
//!
//! ```text
//! DATA_KEY=gateway
//! DATA_VAL=novpn.example.com
//! SECRET_KEY=password
//! SECRET_VAL=hunter2
//! DONE
//! ```

use std::collections::BTreeMap;
use std::io::BufRead;

use tracing::trace;

use crate::error::{Error, Result};

const DATA_KEY_TAG: &str = "DATA_KEY=";
const DATA_VAL_TAG: &str = "DATA_VAL=";
const SECRET_KEY_TAG: &str = "SECRET_KEY=";
const SECRET_VAL_TAG: &str = "SECRET_VAL=";
const DONE_TAG: &str = "DONE";

/// Data items and secrets of a VPN connection.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VpnDetails {
    pub data: BTreeMap<String, String>,
    pub secrets: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Kind {
    Data,
    Secret,
}

/// Read details up to and including the `DONE` line.
///
/// Lines after `DONE` are left in the reader. A line that carries no tag
/// continues the value read just before it.
pub fn read_vpn_details<R: BufRead>(reader: &mut R) -> Result<VpnDetails> {
    let mut details = VpnDetails::default();
    let mut key: Option<(Kind, String)> = None;
    let mut last: Option<(Kind, String)> = None;
    let mut line = String::new();

    loop {
        line.clear();
        if reader.read_line(&mut line)? == 0 {
            return Err(Error::DetailsIncomplete);
        }
        let text = line.strip_suffix('\n').unwrap_or(&line);

        if text == DONE_TAG {
            return Ok(details);
        }

        if let Some(k) = text.strip_prefix(DATA_KEY_TAG) {
            key = Some((Kind::Data, k.to_owned()));
            last = None;
        } else if let Some(k) = text.strip_prefix(SECRET_KEY_TAG) {
            key = Some((Kind::Secret, k.to_owned()));
            last = None;
        } else if let Some(v) = text.strip_prefix(DATA_VAL_TAG) {
            last = take_pending(&mut key, Kind::Data).map(|k| {
                details.data.insert(k.clone(), v.to_owned());
                (Kind::Data, k)
            });
        } else if let Some(v) = text.strip_prefix(SECRET_VAL_TAG) {
            last = take_pending(&mut key, Kind::Secret).map(|k| {
                details.secrets.insert(k.clone(), v.to_owned());
                (Kind::Secret, k)
            });
        } else if let Some((kind, k)) = &last {
            let map = match kind {
                Kind::Data => &mut details.data,
                Kind::Secret => &mut details.secrets,
            };
            if let Some(value) = map.get_mut(k) {
                value.push('\n');
                value.push_str(text);
            }
        } else {
            trace!(line = text, "ignoring details line");
        }
    }
}

fn take_pending(key: &mut Option<(Kind, String)>, kind: Kind) -> Option<String> {
    match key.take() {
        Some((k, name)) if k == kind => Some(name),
        other => {
            *key = other;
            None
        }
    }
}
