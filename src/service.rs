//! Mock VPN service
//!
//! Pretends to bring up a tunnel: `connect` answers immediately and, on the
//! next idle dispatch, publishes a fixed configuration to the host. Nothing
//! is routed anywhere.
//!
//! [`serve`] drives the service over a line-delimited JSON stream: one
//! request per input line, answered by a reply line followed by whatever
//! signals the request caused.
//!
//! ```text
//! > {"method":"connect","params":{"id":"Mock","vpn":{"service-type":"org.freedesktop.NetworkManager.Novpn"}}}
//! < {"reply":"done"}
//! < {"signal":"state-changed","args":"starting"}
//! < {"signal":"config","args":{"banner":"Behold, Mock Net Connected!","has-ip4":true,"has-ip6":false}}
//! ```

use std::io::{BufRead, Write};
use std::net::Ipv4Addr;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::Result;
use crate::setting::{Connection, SecretFlags, PASSWORD_SECRET};

/// Setting name reported when secrets are missing.
pub const VPN_SETTING_NAME: &str = "vpn";

pub const BANNER: &str = "Behold, Mock Net Connected!";

/// Service states as NetworkManager numbers them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
#[repr(u32)]
pub enum ServiceState {
    Unknown = 0,
    Init = 1,
    Shutdown = 2,
    Starting = 3,
    Started = 4,
    Stopping = 5,
    Stopped = 6,
}

/// Connection-wide configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct GenericConfig {
    pub banner: String,
    pub has_ip4: bool,
    pub has_ip6: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Ip4Config {
    pub address: Ipv4Addr,
    pub prefix: u8,
    pub never_default: bool,
    pub domain: String,
}

/// Receives what the service publishes. Implemented by the daemon side.
pub trait ServiceHost {
    fn set_config(&mut self, config: &GenericConfig);

    fn set_ip4_config(&mut self, config: &Ip4Config);

    fn state_changed(&mut self, state: ServiceState);
}

/// Operations the daemon calls on a VPN service.
pub trait ServicePlugin {
    /// Name of the setting that lacks secrets, or `None` if the connection
    /// can be brought up as is.
    fn need_secrets(&self, connection: &Connection) -> Option<&'static str>;

    fn connect(&mut self, connection: &Connection) -> Result<()>;

    fn disconnect(&mut self) -> Result<()>;

    /// Run work deferred to the main loop. Returns true if a connection
    /// attempt finished.
    fn dispatch_idle(&mut self, host: &mut dyn ServiceHost) -> bool;
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ServiceOptions {
    /// Keep running after the connection goes down.
    pub persist: bool,
    /// Log connection dumps with secrets. Pass the same value to
    /// [`NovpnService::new`].
    pub debug: bool,
}

/// The mock service.
#[derive(Debug, Default)]
pub struct NovpnService {
    debug: bool,
    pending_connect: bool,
}

impl NovpnService {
    pub fn new(debug: bool) -> Self {
        Self {
            debug,
            pending_connect: false,
        }
    }

    /// The configuration published on connect.
    pub fn generic_config() -> GenericConfig {
        GenericConfig {
            banner: BANNER.to_owned(),
            has_ip4: true,
            has_ip6: false,
        }
    }

    pub fn ip4_config() -> Ip4Config {
        Ip4Config {
            address: Ipv4Addr::new(192, 0, 2, 1),
            prefix: 32,
            never_default: true,
            domain: "example.com".to_owned(),
        }
    }
}

impl ServicePlugin for NovpnService {
    fn need_secrets(&self, connection: &Connection) -> Option<&'static str> {
        info!("need secrets");
        debug!(connection = %connection.dump(self.debug));

        let setting = match connection.require_vpn() {
            Ok(setting) => setting,
            Err(e) => {
                debug!(%e, "secrets needed");
                return Some(VPN_SETTING_NAME);
            }
        };

        if setting.secret(PASSWORD_SECRET).is_some() {
            return None;
        }

        match setting.secret_flags(PASSWORD_SECRET) {
            Ok(flags) if flags.contains(SecretFlags::NOT_REQUIRED) => None,
            _ => Some(VPN_SETTING_NAME),
        }
    }

    fn connect(&mut self, connection: &Connection) -> Result<()> {
        info!("connect");
        debug!(connection = %connection.dump(self.debug));
        self.pending_connect = true;
        Ok(())
    }

    fn disconnect(&mut self) -> Result<()> {
        info!("disconnect");
        self.pending_connect = false;
        Ok(())
    }

    fn dispatch_idle(&mut self, host: &mut dyn ServiceHost) -> bool {
        if !std::mem::take(&mut self.pending_connect) {
            return false;
        }

        info!("sending config");
        host.set_config(&Self::generic_config());
        host.set_ip4_config(&Self::ip4_config());
        true
    }
}

/// A call from the daemon.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "method", content = "params", rename_all = "kebab-case")]
pub enum Request {
    NeedSecrets(Connection),
    Connect(Connection),
    Disconnect,
}

/// Answer to a [`Request`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "reply", content = "args", rename_all = "kebab-case")]
pub enum Response {
    /// Setting lacking secrets, if any.
    Secrets(Option<&'static str>),
    Done,
}

/// Drives a service plugin for one daemon session and tracks its state.
pub struct ServiceSession<P, H> {
    plugin: P,
    host: H,
    options: ServiceOptions,
    state: ServiceState,
}

impl<P: ServicePlugin, H: ServiceHost> ServiceSession<P, H> {
    pub fn new(plugin: P, host: H, options: ServiceOptions) -> Self {
        if options.debug {
            warn!("debug logging enabled, connection dumps may expose passwords");
        }
        Self {
            plugin,
            host,
            options,
            state: ServiceState::Init,
        }
    }

    pub fn state(&self) -> ServiceState {
        self.state
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    /// Handle one request and run any deferred work it scheduled.
    pub fn handle(&mut self, request: Request) -> Result<Response> {
        let response = match request {
            Request::NeedSecrets(connection) => {
                Response::Secrets(self.plugin.need_secrets(&connection))
            }
            Request::Connect(connection) => {
                self.set_state(ServiceState::Starting);
                self.plugin.connect(&connection)?;
                Response::Done
            }
            Request::Disconnect => {
                self.set_state(ServiceState::Stopping);
                self.plugin.disconnect()?;
                self.set_state(ServiceState::Stopped);
                Response::Done
            }
        };

        if self.plugin.dispatch_idle(&mut self.host) {
            self.set_state(ServiceState::Started);
        }

        Ok(response)
    }

    /// Serve requests until the stream ends, or until the connection stops
    /// when not persisting. Returns the host.
    pub fn run<I>(mut self, requests: I) -> Result<H>
    where
        I: IntoIterator<Item = Request>,
    {
        for request in requests {
            self.handle(request)?;
            if self.finished() {
                break;
            }
        }
        Ok(self.host)
    }

    /// True once the connection stopped and the session should not persist.
    pub fn finished(&self) -> bool {
        let done = self.state == ServiceState::Stopped && !self.options.persist;
        if done {
            debug!("connection stopped, quitting");
        }
        done
    }

    fn set_state(&mut self, state: ServiceState) {
        if self.state != state {
            info!(state = state as u32, "state changed");
            self.state = state;
            self.host.state_changed(state);
        }
    }
}

/// Something the service told the daemon, as sent by [`serve`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "signal", content = "args", rename_all = "kebab-case")]
pub enum Signal {
    Config(GenericConfig),
    Ip4Config(Ip4Config),
    StateChanged(ServiceState),
}

/// A [`ServiceHost`] that queues signals until they are sent.
#[derive(Debug, Default)]
pub struct SignalQueue {
    signals: Vec<Signal>,
}

impl SignalQueue {
    pub fn take(&mut self) -> Vec<Signal> {
        std::mem::take(&mut self.signals)
    }
}

impl ServiceHost for SignalQueue {
    fn set_config(&mut self, config: &GenericConfig) {
        self.signals.push(Signal::Config(config.clone()));
    }

    fn set_ip4_config(&mut self, config: &Ip4Config) {
        self.signals.push(Signal::Ip4Config(config.clone()));
    }

    fn state_changed(&mut self, state: ServiceState) {
        self.signals.push(Signal::StateChanged(state));
    }
}

/// Serve JSON requests from `input` until it ends or the session finishes.
///
/// Blank lines are ignored. A line that is not a valid request ends the
/// session with [`Error::Json`](crate::Error::Json).
pub fn serve<P, R, W>(plugin: P, options: ServiceOptions, input: R, mut output: W) -> Result<()>
where
    P: ServicePlugin,
    R: BufRead,
    W: Write,
{
    let mut session = ServiceSession::new(plugin, SignalQueue::default(), options);

    for line in input.lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }

        let request: Request = serde_json::from_str(&line)?;
        let response = session.handle(request)?;

        write_message(&mut output, &response)?;
        for signal in session.host.take() {
            write_message(&mut output, &signal)?;
        }
        output.flush()?;

        if session.finished() {
            break;
        }
    }

    Ok(())
}

fn write_message<W: Write, T: Serialize>(output: &mut W, message: &T) -> Result<()> {
    serde_json::to_writer(&mut *output, message)?;
    output.write_all(b"\n")?;
    Ok(())
}
