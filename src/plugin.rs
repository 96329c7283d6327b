//! Editor plugin contract and the mock plugin's import/export format
//!
//! A host that wants to edit, import or export mock VPN connections holds a
//! `dyn EditorPlugin`. The plugin is linked in directly; [`editor_plugin`]
//! is its factory.
//!
//! The import/export format is a key file:
//!
//! ```text
//! [connection]
//! id=Mock VPN
//!
//! [vpn]
//! gateway=novpn.example.com
//!
//! [vpn-secrets]
//! password=hunter2
//! ```

use std::path::Path;

use tracing::{debug, info};

use crate::editor::NovpnEditor;
use crate::error::Result;
use crate::keyfile::KeyFile;
use crate::setting::{Connection, VpnSetting, SERVICE_TYPE};

pub const PLUGIN_NAME: &str = "Mock VPN Plugin";
pub const PLUGIN_DESCRIPTION: &str = "For testing";

const CONNECTION_GROUP: &str = "connection";
const VPN_GROUP: &str = "vpn";
const SECRETS_GROUP: &str = "vpn-secrets";

bitflags::bitflags! {
    /// Features an editor plugin offers to its host.
    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
    pub struct Capabilities: u32 {
        const IMPORT = 0x1;
        const EXPORT = 0x2;
        const IPV6 = 0x4;
    }
}

/// The settings form for one connection.
pub trait Editor {
    /// Store the form's values in `connection`, replacing its VPN setting.
    fn update_connection(&self, connection: &mut Connection) -> Result<()>;
}

/// What a VPN plugin exposes to the connection editor of its host.
pub trait EditorPlugin {
    fn name(&self) -> &str;

    fn description(&self) -> &str;

    /// Service type the plugin handles.
    fn service(&self) -> &str;

    fn capabilities(&self) -> Capabilities;

    fn get_editor(&self, connection: &Connection) -> Result<Box<dyn Editor>>;

    fn import_from_file(&self, path: &Path) -> Result<Connection>;

    fn export_to_file(&self, path: &Path, connection: &Connection) -> Result<()>;

    /// File name to offer when exporting, if the plugin has an opinion.
    fn suggested_filename(&self, _connection: &Connection) -> Option<String> {
        None
    }
}

/// The mock VPN editor plugin.
#[derive(Debug, Clone, Copy, Default)]
pub struct NovpnEditorPlugin;

/// Create the plugin instance handed to the host.
pub fn editor_plugin() -> Box<dyn EditorPlugin> {
    Box::new(NovpnEditorPlugin)
}

impl EditorPlugin for NovpnEditorPlugin {
    fn name(&self) -> &str {
        PLUGIN_NAME
    }

    fn description(&self) -> &str {
        PLUGIN_DESCRIPTION
    }

    fn service(&self) -> &str {
        SERVICE_TYPE
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities::IMPORT | Capabilities::EXPORT | Capabilities::IPV6
    }

    fn get_editor(&self, connection: &Connection) -> Result<Box<dyn Editor>> {
        Ok(Box::new(NovpnEditor::new(connection)))
    }

    fn import_from_file(&self, path: &Path) -> Result<Connection> {
        debug!(path = %path.display(), "importing connection");
        import_connection(&KeyFile::load_from_file(path)?)
    }

    fn export_to_file(&self, path: &Path, connection: &Connection) -> Result<()> {
        export_connection(connection).save_to_file(path)?;
        info!(id = %connection.id, path = %path.display(), "exported connection");
        Ok(())
    }
}

/// Build a connection from the import format. `[connection] id` is required;
/// the VPN groups may be absent.
pub fn import_connection(keyfile: &KeyFile) -> Result<Connection> {
    let id = keyfile.get_string(CONNECTION_GROUP, "id")?;
    let mut setting = VpnSetting::new(SERVICE_TYPE);

    if keyfile.has_group(VPN_GROUP) {
        for key in keyfile.keys(VPN_GROUP)? {
            setting.add_data_item(key, keyfile.get_string(VPN_GROUP, key)?);
        }
    }
    if keyfile.has_group(SECRETS_GROUP) {
        for key in keyfile.keys(SECRETS_GROUP)? {
            setting.add_secret(key, keyfile.get_string(SECRETS_GROUP, key)?);
        }
    }

    Ok(Connection::new(id).with_vpn(setting))
}

pub fn export_connection(connection: &Connection) -> KeyFile {
    let mut keyfile = KeyFile::new();
    keyfile.set_string(CONNECTION_GROUP, "id", &connection.id);

    if let Some(vpn) = connection.vpn() {
        for (key, value) in &vpn.data {
            keyfile.set_string(VPN_GROUP, key, value);
        }
        for (key, value) in &vpn.secrets {
            keyfile.set_string(SECRETS_GROUP, key, value);
        }
    }

    keyfile
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{Error, KeyFileError};

    #[test]
    fn plugin_identity() {
        let plugin = editor_plugin();
        assert_eq!(plugin.name(), "Mock VPN Plugin");
        assert_eq!(plugin.description(), "For testing");
        assert_eq!(plugin.service(), "org.freedesktop.NetworkManager.Novpn");
        assert_eq!(plugin.suggested_filename(&Connection::new("x")), None);

        let caps = plugin.capabilities();
        assert!(caps.contains(Capabilities::IMPORT));
        assert!(caps.contains(Capabilities::EXPORT));
        assert!(caps.contains(Capabilities::IPV6));
        assert_eq!(caps.bits(), 0x7);
    }

    #[test]
    fn import_reads_data_and_secrets() {
        let kf = KeyFile::parse(
            "[connection]\nid=Office\n\n[vpn]\ngateway=gw.example\nusername=bob\n\n\
             [vpn-secrets]\npassword=hunter2\n",
        )
        .unwrap();
        let connection = import_connection(&kf).unwrap();
        let vpn = connection.vpn().unwrap();

        assert_eq!(connection.id, "Office");
        assert_eq!(vpn.service_type, SERVICE_TYPE);
        assert_eq!(vpn.data_item("gateway"), Some("gw.example"));
        assert_eq!(vpn.data_item("username"), Some("bob"));
        assert_eq!(vpn.secret("password"), Some("hunter2"));
    }

    #[test]
    fn import_without_vpn_groups_gives_empty_setting() {
        let kf = KeyFile::parse("[connection]\nid=Bare\n").unwrap();
        let connection = import_connection(&kf).unwrap();
        let vpn = connection.vpn().unwrap();
        assert!(vpn.data.is_empty());
        assert!(vpn.secrets.is_empty());
    }

    #[test]
    fn import_requires_connection_id() {
        let kf = KeyFile::parse("[vpn]\ngateway=gw\n").unwrap();
        assert!(matches!(
            import_connection(&kf),
            Err(Error::KeyFile(KeyFileError::GroupNotFound(_)))
        ));
    }

    #[test]
    fn export_then_import_through_files() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("office.novpn");
        let plugin = NovpnEditorPlugin;

        let mut setting = VpnSetting::new(SERVICE_TYPE);
        setting.add_data_item("gateway", "gw.example");
        setting.add_secret("password", " leading space");
        let original = Connection::new("Office").with_vpn(setting);

        plugin.export_to_file(&path, &original).unwrap();
        let data = std::fs::read_to_string(&path).unwrap();
        assert!(data.starts_with("[connection]\nid=Office\n"));

        let imported = plugin.import_from_file(&path).unwrap();
        assert_eq!(imported, original);
    }

    #[test]
    fn import_of_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = NovpnEditorPlugin.import_from_file(&dir.path().join("missing"));
        assert!(matches!(result, Err(Error::Io(_))));
    }

    #[test]
    fn editor_from_plugin_updates_connection() {
        let plugin = editor_plugin();
        let mut connection = Connection::new("New");
        let editor = plugin.get_editor(&connection).unwrap();
        editor.update_connection(&mut connection).unwrap();

        let vpn = connection.vpn().unwrap();
        assert_eq!(vpn.data_item("gateway"), Some("novpn.example.com"));
        assert_eq!(vpn.data_item("password-flags"), Some("0"));
    }
}
