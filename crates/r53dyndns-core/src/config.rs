//! Configuration types for the r53-dyndns agent
//!
//! The agent consumes a resolved configuration object; how it gets parsed
//! (file format, CLI flags) is the daemon binary's concern. The shape mirrors
//! the classic r53-dyndns config file: one main section plus one section per
//! managed FQDN carrying that name's zone and credentials.

use crate::error::Error;
use serde::{Deserialize, Serialize};

/// Main agent configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    /// URL of the external-IP lookup service (plain-text body with the IP)
    pub lookup_url: String,

    /// Connect timeout for each lookup attempt, in seconds
    #[serde(default = "default_lookup_timeout_secs")]
    pub lookup_timeout_secs: u64,

    /// Number of lookup attempts before giving up
    #[serde(default = "default_lookup_max_retries")]
    pub lookup_max_retries: u32,

    /// Seconds to sleep between passes in continuous mode
    #[serde(default = "default_update_interval_secs")]
    pub update_interval_secs: u64,

    /// Keep A records in sync (legacy default: on)
    #[serde(default = "default_true")]
    pub ipv4: bool,

    /// Keep AAAA records in sync
    #[serde(default)]
    pub ipv6: bool,

    /// The FQDNs under management
    pub names: Vec<NameConfig>,
}

impl AgentConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<(), Error> {
        if self.lookup_url.is_empty() {
            return Err(Error::config("lookup_url cannot be empty"));
        }
        if self.lookup_max_retries == 0 {
            return Err(Error::config("lookup_max_retries must be at least 1"));
        }
        if self.update_interval_secs == 0 {
            return Err(Error::config("update_interval_secs must be at least 1"));
        }
        if !self.ipv4 && !self.ipv6 {
            return Err(Error::config("at least one of ipv4/ipv6 must be enabled"));
        }
        if self.names.is_empty() {
            return Err(Error::config("no names configured"));
        }
        for name in &self.names {
            name.validate()?;
        }
        Ok(())
    }
}

/// Configuration for one managed FQDN
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NameConfig {
    /// The fully-qualified name to keep in sync
    pub fqdn: String,

    /// Name of the hosted zone containing the FQDN's record
    pub zone: String,

    /// Access key for the authoritative DNS API
    pub access_key: String,

    /// Secret key for the authoritative DNS API
    pub secret_key: String,

    /// Record TTL in seconds; keep this low so changes propagate quickly
    #[serde(default = "default_ttl")]
    pub ttl: i64,
}

impl NameConfig {
    /// Validate one name section
    pub fn validate(&self) -> Result<(), Error> {
        if self.fqdn.is_empty() || !self.fqdn.contains('.') {
            return Err(Error::config(format!("invalid fqdn {:?}", self.fqdn)));
        }
        if self.zone.is_empty() {
            return Err(Error::config(format!("no zone configured for {}", self.fqdn)));
        }
        if self.access_key.is_empty() || self.secret_key.is_empty() {
            return Err(Error::config(format!(
                "missing credentials for {}",
                self.fqdn
            )));
        }
        if self.ttl <= 0 {
            return Err(Error::config(format!(
                "ttl for {} must be positive, got {}",
                self.fqdn, self.ttl
            )));
        }
        Ok(())
    }
}

fn default_lookup_timeout_secs() -> u64 {
    3
}

fn default_lookup_max_retries() -> u32 {
    3
}

fn default_update_interval_secs() -> u64 {
    300
}

fn default_true() -> bool {
    true
}

fn default_ttl() -> i64 {
    60
}
