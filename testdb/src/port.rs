//! Port and port range types, plus free-port allocation.
//!
//! Server ports are handed out by a [`allocator::PortAllocator`]; the types
//! here only validate and describe them.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

pub mod allocator;

#[cfg(test)]
mod proptests;

pub use allocator::{FixedPortAllocator, PortAllocator, SystemPortAllocator};

/// A valid network port number (1-65535).
///
/// Port 0 is rejected: it means "any port" to the OS and can never be the
/// port a server is reachable on.
///
/// # Examples
///
/// ```
/// use testdb::Port;
///
/// let port = Port::try_from(5432).unwrap();
/// assert_eq!(port.value(), 5432);
///
/// assert!(Port::try_from(0).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u16", into = "u16")]
pub struct Port(u16);

impl Port {
    /// The minimum valid port number.
    pub const MIN: u16 = 1;

    /// The maximum valid port number.
    pub const MAX: u16 = 65535;

    /// The first port outside the privileged range.
    pub const FIRST_UNPRIVILEGED: u16 = 1024;

    /// Returns the underlying port number.
    #[must_use]
    pub const fn value(self) -> u16 {
        self.0
    }

    /// Returns `true` if this is a privileged port (< 1024).
    ///
    /// # Examples
    ///
    /// ```
    /// use testdb::Port;
    ///
    /// assert!(Port::try_from(80).unwrap().is_privileged());
    /// assert!(!Port::try_from(5432).unwrap().is_privileged());
    /// ```
    #[must_use]
    pub const fn is_privileged(self) -> bool {
        self.0 < Self::FIRST_UNPRIVILEGED
    }
}

impl TryFrom<u16> for Port {
    type Error = InvalidPortError;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        if value == 0 {
            Err(InvalidPortError {
                value,
                reason: "port 0 is invalid".into(),
            })
        } else {
            Ok(Self(value))
        }
    }
}

impl From<Port> for u16 {
    fn from(port: Port) -> Self {
        port.0
    }
}

impl FromStr for Port {
    type Err = InvalidPortError;

    /// Parses a decimal port number, as found in the trailing component of
    /// `host:port` listings.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value: u16 = s.trim().parse().map_err(|_| InvalidPortError {
            value: 0,
            reason: format!("'{s}' is not a port number"),
        })?;
        Self::try_from(value)
    }
}

impl fmt::Display for Port {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Error type for invalid port numbers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidPortError {
    /// The invalid port value.
    pub value: u16,
    /// The reason the port is invalid.
    pub reason: String,
}

impl fmt::Display for InvalidPortError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid port {}: {}", self.value, self.reason)
    }
}

impl std::error::Error for InvalidPortError {}

/// A range of ports (inclusive on both ends) to allocate server ports from.
///
/// # Examples
///
/// ```
/// use testdb::{Port, PortRange};
///
/// let min = Port::try_from(20000).unwrap();
/// let max = Port::try_from(20010).unwrap();
/// let range = PortRange::new(min, max).unwrap();
///
/// assert_eq!(range.len(), 11);
/// assert!(range.contains(Port::try_from(20005).unwrap()));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PortRange {
    min: Port,
    max: Port,
}

impl PortRange {
    /// Creates a new port range.
    ///
    /// # Errors
    ///
    /// Returns an error if `max` is less than `min`.
    pub fn new(min: Port, max: Port) -> Result<Self, InvalidPortRangeError> {
        if max < min {
            Err(InvalidPortRangeError {
                min,
                max,
                reason: "max must be greater than or equal to min".into(),
            })
        } else {
            Ok(Self { min, max })
        }
    }

    /// Returns the minimum port in the range.
    #[must_use]
    pub const fn min(&self) -> Port {
        self.min
    }

    /// Returns the maximum port in the range.
    #[must_use]
    pub const fn max(&self) -> Port {
        self.max
    }

    /// Returns `true` if the range contains the given port.
    #[must_use]
    pub const fn contains(&self, port: Port) -> bool {
        port.value() >= self.min.value() && port.value() <= self.max.value()
    }

    /// Returns the number of ports in the range (inclusive).
    #[must_use]
    pub const fn len(&self) -> u32 {
        self.max.value() as u32 - self.min.value() as u32 + 1
    }

    /// Always `false`: a valid range holds at least one port.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        false
    }
}

impl fmt::Display for PortRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.min, self.max)
    }
}

/// Error type for invalid port ranges.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidPortRangeError {
    /// The minimum port.
    pub min: Port,
    /// The maximum port.
    pub max: Port,
    /// The reason the range is invalid.
    pub reason: String,
}

impl fmt::Display for InvalidPortRangeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "invalid port range {}-{}: {}",
            self.min, self.max, self.reason
        )
    }
}

impl std::error::Error for InvalidPortRangeError {}
