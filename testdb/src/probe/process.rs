//! Process table enumeration and signal-zero liveness checks.

use std::collections::HashSet;

use nix::errno::Errno;
use nix::sys::signal::kill;
use nix::unistd::Pid;
use sysinfo::{ProcessRefreshKind, RefreshKind, System};

use crate::error::{Error, Result};

/// One visible OS process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessEntry {
    /// Executable name as reported by the OS.
    pub name: String,
    /// Process id.
    pub pid: u32,
}

impl ProcessEntry {
    /// Create an entry.
    #[must_use]
    pub fn new(name: impl Into<String>, pid: u32) -> Self {
        Self {
            name: name.into(),
            pid,
        }
    }
}

/// Access to the OS process table.
pub trait ProcessTable: Send + Sync {
    /// List every process visible to the caller.
    ///
    /// # Errors
    ///
    /// Returns an error if the process table cannot be read.
    fn processes(&self) -> Result<Vec<ProcessEntry>>;

    /// Whether `pid` is alive, without affecting it.
    ///
    /// # Errors
    ///
    /// Returns an error if liveness cannot be determined.
    fn is_alive(&self, pid: u32) -> Result<bool>;
}

/// Process table backed by `sysinfo`, with liveness via `kill(pid, 0)`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemProcessTable;

impl ProcessTable for SystemProcessTable {
    fn processes(&self) -> Result<Vec<ProcessEntry>> {
        let system = System::new_with_specifics(
            RefreshKind::new().with_processes(ProcessRefreshKind::new()),
        );
        Ok(system
            .processes()
            .iter()
            .map(|(pid, process)| ProcessEntry::new(process.name(), pid.as_u32()))
            .collect())
    }

    fn is_alive(&self, pid: u32) -> Result<bool> {
        signal_zero(pid)
    }
}

/// Deliver signal zero to `pid`.
///
/// `EPERM` means the process exists but belongs to someone else, so it
/// counts as alive. An exited but unreaped child is a zombie and still
/// counts; its parent decides when to reap it.
pub(crate) fn signal_zero(pid: u32) -> Result<bool> {
    let Ok(raw) = i32::try_from(pid) else {
        return Ok(false);
    };
    if raw <= 0 {
        return Ok(false);
    }
    match kill(Pid::from_raw(raw), None) {
        Ok(()) | Err(Errno::EPERM) => Ok(true),
        Err(Errno::ESRCH) => Ok(false),
        Err(source) => Err(Error::ProcessLookupFailed { pid, source }),
    }
}

/// In-memory process table for tests.
///
/// # Examples
///
/// ```
/// use testdb::probe::{MockProcessTable, ProcessEntry, ProcessTable};
///
/// let table = MockProcessTable::new(vec![ProcessEntry::new("postgres", 42)]);
/// assert!(table.is_alive(42).unwrap());
/// assert!(!table.is_alive(43).unwrap());
/// ```
#[derive(Debug, Clone, Default)]
pub struct MockProcessTable {
    entries: Vec<ProcessEntry>,
    dead: HashSet<u32>,
}

impl MockProcessTable {
    /// A table listing `entries`, all of them alive.
    #[must_use]
    pub fn new(entries: Vec<ProcessEntry>) -> Self {
        Self {
            entries,
            dead: HashSet::new(),
        }
    }

    /// Keep listing `pid` but make its liveness check fail, like a zombie.
    pub fn mark_dead(&mut self, pid: u32) {
        self.dead.insert(pid);
    }
}

impl ProcessTable for MockProcessTable {
    fn processes(&self) -> Result<Vec<ProcessEntry>> {
        Ok(self.entries.clone())
    }

    fn is_alive(&self, pid: u32) -> Result<bool> {
        Ok(!self.dead.contains(&pid) && self.entries.iter().any(|entry| entry.pid == pid))
    }
}
