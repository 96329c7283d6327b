//! Connection and VPN setting model shared by the editor, the import/export
//! adapter and the service.

use std::collections::BTreeMap;
use std::fmt::Write as _;

use serde::{Deserialize, Serialize};

use crate::details::VpnDetails;
use crate::error::{Error, Result};

/// D-Bus service type of the mock VPN plugin.
pub const SERVICE_TYPE: &str = "org.freedesktop.NetworkManager.Novpn";

/// Name of the secret the plugin asks for.
pub const PASSWORD_SECRET: &str = "password";

bitflags::bitflags! {
    /// How a secret is stored and whether it is required.
    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
    pub struct SecretFlags: u32 {
        /// Stored by NetworkManager.
        const NONE = 0x0;
        /// Stored by a user secret agent.
        const AGENT_OWNED = 0x1;
        /// Asked for on every activation.
        const NOT_SAVED = 0x2;
        /// Not needed to connect.
        const NOT_REQUIRED = 0x4;
    }
}

/// The `vpn` setting of a connection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct VpnSetting {
    pub service_type: String,
    #[serde(default)]
    pub data: BTreeMap<String, String>,
    #[serde(default)]
    pub secrets: BTreeMap<String, String>,
}

impl VpnSetting {
    pub fn new(service_type: impl Into<String>) -> Self {
        Self {
            service_type: service_type.into(),
            data: BTreeMap::new(),
            secrets: BTreeMap::new(),
        }
    }

    /// A setting populated from the details an auth dialog receives.
    pub fn from_details(service_type: impl Into<String>, details: VpnDetails) -> Self {
        Self {
            service_type: service_type.into(),
            data: details.data,
            secrets: details.secrets,
        }
    }

    pub fn data_item(&self, key: &str) -> Option<&str> {
        self.data.get(key).map(String::as_str)
    }

    pub fn add_data_item(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.data.insert(key.into(), value.into());
    }

    pub fn secret(&self, name: &str) -> Option<&str> {
        self.secrets.get(name).map(String::as_str)
    }

    pub fn add_secret(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.secrets.insert(name.into(), value.into());
    }

    /// Flags of a secret, kept in the `<name>-flags` data item. A missing
    /// item means [`SecretFlags::NONE`].
    pub fn secret_flags(&self, name: &str) -> Result<SecretFlags> {
        let key = flags_key(name);
        match self.data.get(&key) {
            None => Ok(SecretFlags::NONE),
            Some(value) => value
                .trim()
                .parse()
                .map(SecretFlags::from_bits_retain)
                .map_err(|_| Error::InvalidSecretFlags {
                    secret: name.to_owned(),
                    value: value.clone(),
                }),
        }
    }

    pub fn set_secret_flags(&mut self, name: &str, flags: SecretFlags) {
        self.data.insert(flags_key(name), flags.bits().to_string());
    }

    /// Human-readable listing. Secret values are replaced by `<hidden>`
    /// unless `show_secrets` is set.
    pub fn dump(&self, show_secrets: bool) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "[vpn]");
        let _ = writeln!(out, "service-type={}", self.service_type);
        for (key, value) in &self.data {
            let _ = writeln!(out, "data.{key}={value}");
        }
        for (key, value) in &self.secrets {
            let shown = if show_secrets { value.as_str() } else { "<hidden>" };
            let _ = writeln!(out, "secrets.{key}={shown}");
        }
        out
    }
}

fn flags_key(name: &str) -> String {
    format!("{name}-flags")
}

/// A connection profile as far as the plugin cares about it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Connection {
    pub id: String,
    pub uuid: Option<String>,
    pub vpn: Option<VpnSetting>,
}

impl Connection {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            uuid: None,
            vpn: None,
        }
    }

    pub fn with_vpn(mut self, vpn: VpnSetting) -> Self {
        self.vpn = Some(vpn);
        self
    }

    pub fn vpn(&self) -> Option<&VpnSetting> {
        self.vpn.as_ref()
    }

    /// The VPN setting, or an error naming the connection.
    pub fn require_vpn(&self) -> Result<&VpnSetting> {
        self.vpn
            .as_ref()
            .ok_or_else(|| Error::MissingVpnSetting(self.id.clone()))
    }

    pub fn dump(&self, show_secrets: bool) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "[connection]");
        let _ = writeln!(out, "id={}", self.id);
        if let Some(uuid) = &self.uuid {
            let _ = writeln!(out, "uuid={uuid}");
        }
        if let Some(vpn) = &self.vpn {
            out.push_str(&vpn.dump(show_secrets));
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn secret_flags_default_to_none() {
        let setting = VpnSetting::new(SERVICE_TYPE);
        assert_eq!(setting.secret_flags(PASSWORD_SECRET).unwrap(), SecretFlags::NONE);
    }

    #[test]
    fn secret_flags_are_stored_as_data_item() {
        let mut setting = VpnSetting::new(SERVICE_TYPE);
        setting.set_secret_flags(PASSWORD_SECRET, SecretFlags::AGENT_OWNED | SecretFlags::NOT_REQUIRED);

        assert_eq!(setting.data_item("password-flags"), Some("5"));
        let flags = setting.secret_flags(PASSWORD_SECRET).unwrap();
        assert!(flags.contains(SecretFlags::NOT_REQUIRED));
        assert!(!flags.contains(SecretFlags::NOT_SAVED));
    }

    #[test]
    fn unknown_flag_bits_are_kept() {
        let mut setting = VpnSetting::new(SERVICE_TYPE);
        setting.add_data_item("password-flags", "12");

        let flags = setting.secret_flags(PASSWORD_SECRET).unwrap();
        assert!(flags.contains(SecretFlags::NOT_REQUIRED));
        assert_eq!(flags.bits(), 12);

        setting.set_secret_flags(PASSWORD_SECRET, flags);
        assert_eq!(setting.data_item("password-flags"), Some("12"));
    }

    #[test]
    fn bad_secret_flags_are_an_error() {
        let mut setting = VpnSetting::new(SERVICE_TYPE);
        setting.add_data_item("password-flags", "lots");
        assert!(matches!(
            setting.secret_flags(PASSWORD_SECRET),
            Err(Error::InvalidSecretFlags { .. })
        ));
    }

    #[test]
    fn dump_hides_secrets_by_default() {
        let mut setting = VpnSetting::new(SERVICE_TYPE);
        setting.add_data_item("gateway", "novpn.example.com");
        setting.add_secret(PASSWORD_SECRET, "hunter2");
        let connection = Connection::new("Mock").with_vpn(setting);

        let hidden = connection.dump(false);
        assert!(hidden.contains("data.gateway=novpn.example.com"));
        assert!(hidden.contains("secrets.password=<hidden>"));
        assert!(!hidden.contains("hunter2"));
        assert!(connection.dump(true).contains("secrets.password=hunter2"));
    }

    #[test]
    fn require_vpn_names_the_connection() {
        let err = Connection::new("Lonely").require_vpn().unwrap_err();
        assert_eq!(err.to_string(), "connection \"Lonely\" has no VPN setting");
    }
}
