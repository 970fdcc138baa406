//! Address family selection
//!
//! The family is an explicit two-valued enum threaded through the resolver,
//! the record client and the engine, rather than a boolean flag at each call
//! site.

use serde::{Deserialize, Serialize};
use std::fmt;

/// IP address family under management
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Family {
    /// IPv4 / A records
    V4,
    /// IPv6 / AAAA records
    V6,
}

impl Family {
    /// The DNS record type managed for this family
    pub fn record_type(self) -> &'static str {
        match self {
            Family::V4 => "A",
            Family::V6 => "AAAA",
        }
    }

    /// Reserved placeholder address used to materialize a record that does
    /// not exist yet. Link-local, never routable, and always distinct from a
    /// real discovered address, so the first comparison after bootstrap is
    /// guaranteed to be well-defined.
    pub fn sentinel(self) -> &'static str {
        match self {
            Family::V4 => "169.254.0.1",
            Family::V6 => "fe80::1",
        }
    }
}

impl fmt::Display for Family {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Family::V4 => write!(f, "v4"),
            Family::V6 => write!(f, "v6"),
        }
    }
}
