//! Platform-specific detection of a server listening on a TCP port.
//!
//! Each supported OS family shells out to its own inspection tool and parses
//! the text it prints. The probe is chosen once, from the running platform;
//! unknown platforms get a probe that always fails with
//! [`Error::UnsupportedPlatform`] instead of guessing.

use std::collections::HashSet;
use std::process::Command;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use log::debug;

use crate::command;
use crate::error::{Error, Result};
use crate::Port;

/// Bind addresses accepted as "listening for everyone".
const WILDCARD_ADDRESSES: [&str; 3] = ["0.0.0.0", "::", "*"];

/// Loopback addresses. PostgreSQL binds these under its default
/// `listen_addresses = 'localhost'`.
const LOOPBACK_ADDRESSES: [&str; 2] = ["127.0.0.1", "::1"];

/// `lsof` truncates the COMMAND column to this many characters.
const LSOF_COMMAND_WIDTH: usize = 9;

/// Detects which ports a named server process is listening on.
pub trait PortProbe: Send + Sync {
    /// All ports the server process currently listens on.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ProbeCommandFailed`] if the inspection command cannot
    /// run, or [`Error::UnsupportedPlatform`] on platforms without a probe.
    fn listening_ports(&self) -> Result<Vec<Port>>;

    /// Whether the server process listens on `port`.
    ///
    /// # Errors
    ///
    /// See [`PortProbe::listening_ports`].
    fn is_listening(&self, port: Port) -> Result<bool> {
        Ok(self.listening_ports()?.contains(&port))
    }
}

impl<P: PortProbe + ?Sized> PortProbe for Arc<P> {
    fn listening_ports(&self) -> Result<Vec<Port>> {
        (**self).listening_ports()
    }

    fn is_listening(&self, port: Port) -> Result<bool> {
        (**self).is_listening(port)
    }
}

/// Select the probe for `platform` (a `std::env::consts::OS` value).
///
/// # Examples
///
/// ```
/// use testdb::probe::listening::for_platform;
/// use testdb::{Error, Port};
///
/// let probe = for_platform("plan9", "postgres");
/// let err = probe.is_listening(Port::try_from(5432).unwrap()).unwrap_err();
/// assert!(matches!(err, Error::UnsupportedPlatform { .. }));
/// ```
#[must_use]
pub fn for_platform(platform: &str, server_name: &str) -> Box<dyn PortProbe> {
    match platform {
        "macos" => Box::new(LsofPortProbe::new(server_name)),
        "linux" => Box::new(SocketTablePortProbe::new(server_name)),
        other => Box::new(UnsupportedPortProbe::new(other)),
    }
}

/// The probe for the platform this process runs on.
#[must_use]
pub fn platform_probe(server_name: &str) -> Box<dyn PortProbe> {
    for_platform(std::env::consts::OS, server_name)
}

/// macOS probe: open TCP listening handles, via `lsof`.
#[derive(Debug, Clone)]
pub struct LsofPortProbe {
    server_name: String,
}

impl LsofPortProbe {
    /// Probe for sockets held by processes named `server_name`.
    #[must_use]
    pub fn new(server_name: &str) -> Self {
        Self {
            server_name: server_name.to_string(),
        }
    }
}

impl PortProbe for LsofPortProbe {
    fn listening_ports(&self) -> Result<Vec<Port>> {
        let mut cmd = Command::new("lsof");
        cmd.args(["-nP", "-iTCP", "-sTCP:LISTEN"]);
        let output = command::run_unchecked(&mut cmd)
            .map_err(|source| Error::ProbeCommandFailed { source })?;

        // lsof exits 1 when nothing matched.
        if !output.status.success() && !output.stderr.is_empty() {
            return Err(Error::ProbeCommandFailed {
                source: command::status_error(&cmd, &output),
            });
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let ports = parse_lsof_ports(&stdout, &self.server_name);
        debug!("lsof reports {} listening on {ports:?}", self.server_name);
        Ok(ports)
    }
}

/// Linux probe: the kernel's TCP listening-socket table, via `ss`.
#[derive(Debug, Clone)]
pub struct SocketTablePortProbe {
    server_name: String,
}

impl SocketTablePortProbe {
    /// Probe for sockets held by processes named `server_name`.
    #[must_use]
    pub fn new(server_name: &str) -> Self {
        Self {
            server_name: server_name.to_string(),
        }
    }
}

impl PortProbe for SocketTablePortProbe {
    fn listening_ports(&self) -> Result<Vec<Port>> {
        let mut cmd = Command::new("ss");
        cmd.arg("-Htlnp");
        let output =
            command::run(&mut cmd).map_err(|source| Error::ProbeCommandFailed { source })?;

        let stdout = String::from_utf8_lossy(&output.stdout);
        let ports = parse_socket_table_ports(&stdout, &self.server_name);
        debug!("ss reports {} listening on {ports:?}", self.server_name);
        Ok(ports)
    }
}

/// Fallback for platforms without a port inspection method.
#[derive(Debug, Clone)]
pub struct UnsupportedPortProbe {
    platform: String,
}

impl UnsupportedPortProbe {
    /// A probe that reports `platform` as unsupported.
    #[must_use]
    pub fn new(platform: &str) -> Self {
        Self {
            platform: platform.to_string(),
        }
    }
}

impl PortProbe for UnsupportedPortProbe {
    fn listening_ports(&self) -> Result<Vec<Port>> {
        Err(Error::UnsupportedPlatform {
            platform: self.platform.clone(),
        })
    }
}

/// Extract ports from `lsof -nP -iTCP -sTCP:LISTEN` output.
///
/// Keeps rows whose COMMAND is `server_name` and takes the trailing port of
/// the address following the `TCP` protocol marker.
///
/// # Examples
///
/// ```
/// use testdb::probe::listening::parse_lsof_ports;
///
/// let output = "\
/// COMMAND    PID USER   FD   TYPE  DEVICE SIZE/OFF NODE NAME
/// postgres 4242 me      7u  IPv6 0x1a2b      0t0  TCP [::1]:54321 (LISTEN)
/// ";
/// let ports = parse_lsof_ports(output, "postgres");
/// assert_eq!(ports[0].value(), 54321);
/// ```
#[must_use]
pub fn parse_lsof_ports(output: &str, server_name: &str) -> Vec<Port> {
    let expected: String = server_name.chars().take(LSOF_COMMAND_WIDTH).collect();
    let mut ports = Vec::new();

    for line in output.lines() {
        let fields: Vec<&str> = line.split_whitespace().collect();
        let Some(command) = fields.first() else {
            continue;
        };
        if *command != expected {
            continue;
        }
        let Some(marker) = fields.iter().position(|field| *field == "TCP") else {
            continue;
        };
        let Some(address) = fields.get(marker + 1) else {
            continue;
        };
        if let Some((_, port)) = split_host_port(address) {
            push_unique(&mut ports, port);
        }
    }

    ports
}

/// Extract ports from `ss -Htlnp` output.
///
/// Keeps rows whose process column names `server_name` and whose local
/// address is a wildcard or loopback bind address.
///
/// # Examples
///
/// ```
/// use testdb::probe::listening::parse_socket_table_ports;
///
/// let output = "LISTEN 0 244 0.0.0.0:54321 0.0.0.0:* users:((\"postgres\",pid=4242,fd=6))\n\n";
/// let ports = parse_socket_table_ports(output, "postgres");
/// assert_eq!(ports.len(), 1);
/// assert_eq!(ports[0].value(), 54321);
/// ```
#[must_use]
pub fn parse_socket_table_ports(output: &str, server_name: &str) -> Vec<Port> {
    let mut ports = Vec::new();

    for line in output.lines() {
        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.len() < 6 {
            continue;
        }
        let process_column = fields[5..].join(" ");
        if !process_names(&process_column).any(|name| name == server_name) {
            continue;
        }
        let Some((host, port)) = split_host_port(fields[3]) else {
            continue;
        };
        if is_accepted_bind_address(host) {
            push_unique(&mut ports, port);
        }
    }

    ports
}

/// Quoted process names in an `ss` process column,
/// e.g. `users:(("postgres",pid=1,fd=6),("postgres",pid=2,fd=6))`.
fn process_names(column: &str) -> impl Iterator<Item = &str> {
    column.split('"').skip(1).step_by(2)
}

/// Split `host:port`, `[v6]:port` or `host%iface:port` at the last colon.
fn split_host_port(address: &str) -> Option<(&str, Port)> {
    let (host, port) = address.rsplit_once(':')?;
    let port = port.parse().ok()?;
    let host = host.trim_start_matches('[').trim_end_matches(']');
    let host = host.split_once('%').map_or(host, |(bare, _)| bare);
    Some((host, port))
}

fn is_accepted_bind_address(host: &str) -> bool {
    WILDCARD_ADDRESSES.contains(&host) || LOOPBACK_ADDRESSES.contains(&host)
}

fn push_unique(ports: &mut Vec<Port>, port: Port) {
    if !ports.contains(&port) {
        ports.push(port);
    }
}

/// Scripted probe for tests.
///
/// Uses interior mutability so a test can flip a port to "listening" from
/// inside another mock while the probe is shared through an `Arc`.
///
/// # Examples
///
/// ```
/// use testdb::probe::{MockPortProbe, PortProbe};
/// use testdb::Port;
///
/// let port = Port::try_from(54321).unwrap();
/// let probe = MockPortProbe::empty();
/// assert!(!probe.is_listening(port).unwrap());
///
/// probe.mark_listening(port);
/// assert!(probe.is_listening(port).unwrap());
/// assert_eq!(probe.calls(), 2);
/// ```
#[derive(Debug, Default)]
pub struct MockPortProbe {
    listening: Mutex<HashSet<Port>>,
    calls: AtomicUsize,
}

impl MockPortProbe {
    /// A probe reporting `ports` as listening.
    #[must_use]
    pub fn new(ports: HashSet<Port>) -> Self {
        Self {
            listening: Mutex::new(ports),
            calls: AtomicUsize::new(0),
        }
    }

    /// A probe reporting nothing listening.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Report `port` as listening from now on.
    pub fn mark_listening(&self, port: Port) {
        self.ports().insert(port);
    }

    /// Report `port` as closed from now on.
    pub fn mark_closed(&self, port: Port) {
        self.ports().remove(&port);
    }

    /// Number of times the probe has been consulted.
    #[must_use]
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn ports(&self) -> std::sync::MutexGuard<'_, HashSet<Port>> {
        self.listening.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl PortProbe for MockPortProbe {
    fn listening_ports(&self) -> Result<Vec<Port>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let mut ports: Vec<Port> = self.ports().iter().copied().collect();
        ports.sort_unstable();
        Ok(ports)
    }
}
