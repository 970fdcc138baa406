//! Error types for the r53-dyndns agent
//!
//! One flat taxonomy shared across the resolver, the record client and the
//! engine. The resolver retries transient failures internally and surfaces
//! `LookupFailed` once its budget is spent; the record client never retries
//! and surfaces read/write failures directly to the engine.

use crate::family::Family;
use thiserror::Error;

/// Result type alias for agent operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for the r53-dyndns agent
#[derive(Error, Debug)]
pub enum Error {
    /// The configured lookup URL does not match `scheme://host[:port][/path]`
    #[error("malformed lookup URL {url:?}: {reason}")]
    MalformedUrl {
        /// The offending URL as configured
        url: String,
        /// Why it was rejected
        reason: String,
    },

    /// A hostname DNS query failed or returned no usable answer
    #[error("DNS lookup error: {0}")]
    Dns(String),

    /// An HTTP fetch against the lookup service failed
    #[error("HTTP error: {0}")]
    Http(String),

    /// The lookup service answered, but no IP-shaped substring was found
    #[error("no {family} address found in response body from {url}")]
    UnparsableResponse {
        /// Address family that was being discovered
        family: Family,
        /// The configured lookup URL
        url: String,
    },

    /// External IP discovery failed after the retry budget was exhausted
    #[error("external IP discovery failed after {attempts} attempt(s)")]
    LookupFailed {
        /// Number of attempts made
        attempts: u32,
        /// The error from the last attempt
        #[source]
        source: Box<Error>,
    },

    /// No hosted zone matched the configured zone name
    #[error("no hosted zone found matching {zone:?}")]
    ZoneNotFound {
        /// The zone name that was searched for
        zone: String,
    },

    /// The authoritative API rejected or failed a record read
    #[error("failed to read record set for {fqdn}: {message}")]
    RecordReadFailed {
        /// The FQDN whose record was being read
        fqdn: String,
        /// API error detail
        message: String,
    },

    /// The authoritative API rejected or failed a record upsert
    #[error("failed to write record set for {fqdn}: {message}")]
    RecordWriteFailed {
        /// The FQDN whose record was being written
        fqdn: String,
        /// API error detail
        message: String,
    },

    /// A caller supplied arguments that make no sense
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Configuration errors
    #[error("configuration error: {0}")]
    Config(String),
}

impl Error {
    /// Create a DNS lookup error
    pub fn dns(msg: impl Into<String>) -> Self {
        Self::Dns(msg.into())
    }

    /// Create an HTTP error
    pub fn http(msg: impl Into<String>) -> Self {
        Self::Http(msg.into())
    }

    /// Create an invalid input error
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }
}
