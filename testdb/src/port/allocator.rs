//! Free TCP port allocation.
//!
//! Allocation is a trait so the orchestrator can be driven with a fixed port
//! in tests. There is no reservation: a port reported free may be taken by
//! another process before the server binds it.

use log::debug;
use port_selector::{is_free_tcp, random_free_tcp_port, select_free_port, Selector};

use crate::error::{Error, Result};
use crate::{Port, PortRange};

/// How many random candidates to try inside a configured range.
const RANGE_ATTEMPTS: u16 = 128;

/// Source of currently-unused TCP ports.
///
/// # Examples
///
/// ```
/// use testdb::port::{FixedPortAllocator, PortAllocator};
/// use testdb::Port;
///
/// let allocator = FixedPortAllocator::new(Port::try_from(54321).unwrap());
/// assert_eq!(allocator.allocate().unwrap().value(), 54321);
/// ```
pub trait PortAllocator {
    /// Returns a port that is unused at the time of the call.
    ///
    /// # Errors
    ///
    /// Returns [`Error::PortUnavailable`] if no free port could be found.
    fn allocate(&self) -> Result<Port>;
}

/// Allocator backed by the OS, via the `port-selector` crate.
///
/// Without a range the OS picks from its ephemeral range; with a range,
/// random candidates inside it are probed by binding, then the whole range
/// is scanned in order if sampling found nothing. Both bounds are eligible.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemPortAllocator {
    range: Option<PortRange>,
}

impl SystemPortAllocator {
    /// Allocator drawing from the OS ephemeral range.
    #[must_use]
    pub const fn new() -> Self {
        Self { range: None }
    }

    /// Allocator restricted to `range`.
    #[must_use]
    pub const fn within(range: PortRange) -> Self {
        Self { range: Some(range) }
    }

    /// The configured range, if any.
    #[must_use]
    pub const fn range(&self) -> Option<PortRange> {
        self.range
    }
}

impl PortAllocator for SystemPortAllocator {
    fn allocate(&self) -> Result<Port> {
        let candidate = match self.range {
            None => random_free_tcp_port(),
            Some(range) => free_port_in(range),
        };

        let value = candidate.ok_or_else(|| Error::PortUnavailable {
            reason: match self.range {
                Some(range) => format!("no free TCP port found in {range}"),
                None => "the OS did not hand out an ephemeral port".to_string(),
            },
        })?;

        let port = Port::try_from(value)?;
        if port.is_privileged() {
            return Err(Error::PortUnavailable {
                reason: format!("allocated port {port} is privileged"),
            });
        }

        debug!("allocated free port {port}");
        Ok(port)
    }
}

fn free_port_in(range: PortRange) -> Option<u16> {
    let (min, max) = (range.min().value(), range.max().value());

    // `select_free_port` samples the half-open range `from..to`.
    let sampled = match max.checked_add(1) {
        Some(end) => sample(min, end),
        None if min < max => sample(min, max),
        None => None,
    };

    sampled.or_else(|| (min..=max).find(|&port| is_free_tcp(port)))
}

fn sample(from: u16, to: u16) -> Option<u16> {
    select_free_port(Selector {
        check_tcp: true,
        check_udp: false,
        port_range: (from, to),
        max_random_times: RANGE_ATTEMPTS,
    })
}

/// Allocator that always returns the same port.
///
/// Used when the caller already knows the port (CLI `--port`) and by tests
/// that need a deterministic port.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedPortAllocator {
    port: Port,
}

impl FixedPortAllocator {
    /// Create an allocator that hands out `port`.
    #[must_use]
    pub const fn new(port: Port) -> Self {
        Self { port }
    }
}

impl PortAllocator for FixedPortAllocator {
    fn allocate(&self) -> Result<Port> {
        Ok(self.port)
    }
}

impl<A: PortAllocator + ?Sized> PortAllocator for &A {
    fn allocate(&self) -> Result<Port> {
        (**self).allocate()
    }
}
