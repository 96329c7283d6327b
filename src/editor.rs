//! Connection editor form
//!
//! Holds the values of the editor's entry fields. The host renders them and
//! writes user edits back into the public fields; `update_connection` turns
//! the form into a fresh VPN setting.

use tracing::{debug, warn};

use crate::error::Result;
use crate::plugin::Editor;
use crate::setting::{Connection, SecretFlags, VpnSetting, PASSWORD_SECRET, SERVICE_TYPE};

/// Gateway shown for connections that do not have one yet.
pub const DEFAULT_GATEWAY: &str = "novpn.example.com";

const GATEWAY_KEY: &str = "gateway";
const USERNAME_KEY: &str = "username";
const CA_CERT_KEY: &str = "ca-cert";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NovpnEditor {
    pub gateway: String,
    pub username: String,
    pub password: String,
    /// Storage mode picked for the password.
    pub password_flags: SecretFlags,
    /// URI of the CA certificate.
    pub ca_cert: String,
}

impl NovpnEditor {
    /// Fill the form from an existing connection.
    pub fn new(connection: &Connection) -> Self {
        debug!(connection = %connection.dump(false), "creating editor");

        let empty;
        let setting = match connection.require_vpn() {
            Ok(setting) => setting,
            Err(e) => {
                warn!("{e}, proceeding with an empty one");
                empty = VpnSetting::new(SERVICE_TYPE);
                &empty
            }
        };

        let mut editor = Self {
            gateway: DEFAULT_GATEWAY.to_owned(),
            password_flags: setting.secret_flags(PASSWORD_SECRET).unwrap_or_default(),
            ..Self::default()
        };

        if let Some(gateway) = non_empty(setting.data_item(GATEWAY_KEY)) {
            editor.gateway = gateway.to_owned();
        }
        if let Some(username) = non_empty(setting.data_item(USERNAME_KEY)) {
            editor.username = username.to_owned();
        }
        if let Some(password) = non_empty(setting.secret(PASSWORD_SECRET)) {
            editor.password = password.to_owned();
        }
        if let Some(ca_cert) = non_empty(setting.data_item(CA_CERT_KEY)) {
            editor.ca_cert = ca_cert.to_owned();
        }

        editor
    }
}

impl Editor for NovpnEditor {
    fn update_connection(&self, connection: &mut Connection) -> Result<()> {
        let mut setting = VpnSetting::new(SERVICE_TYPE);

        if !self.gateway.is_empty() {
            setting.add_data_item(GATEWAY_KEY, &self.gateway);
        }
        if !self.username.is_empty() {
            setting.add_data_item(USERNAME_KEY, &self.username);
        }
        if !self.password.is_empty() {
            setting.add_secret(PASSWORD_SECRET, &self.password);
        }
        setting.set_secret_flags(PASSWORD_SECRET, self.password_flags);
        if !self.ca_cert.is_empty() {
            setting.add_data_item(CA_CERT_KEY, &self.ca_cert);
        }

        connection.vpn = Some(setting);
        Ok(())
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}
