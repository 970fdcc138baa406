// # Record Client Trait
//
// Defines the narrow read/bootstrap/upsert interface against the
// authoritative DNS API, scoped to one managed FQDN in one hosted zone.
//
// ## Implementations
//
// - Route53: `r53dyndns-route53` crate
//
// Clients never retry: any API failure is surfaced to the engine immediately.
// In continuous mode the engine absorbs it as a failed pass; in single-shot
// mode it becomes the process's failure.

use crate::error::Result;
use crate::family::Family;
use async_trait::async_trait;

/// A record set as currently present in the hosted zone
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceRecord {
    /// Record name, unescaped, lowercased, trailing dot stripped
    pub name: String,
    /// The family (A or AAAA) the record belongs to
    pub family: Family,
    /// Record TTL in seconds
    pub ttl: i64,
    /// The single record value, verbatim as stored
    pub value: String,
}

/// Trait for authoritative record access, scoped to one managed FQDN
#[async_trait]
pub trait RecordClient: Send + Sync {
    /// Read the record currently present for the FQDN and family
    ///
    /// Returns `Ok(None)` when the zone holds no exactly-matching record. A
    /// near match (alphabetically adjacent name, or a different type) is
    /// absence, not a hit.
    async fn read_record(&self, family: Family) -> Result<Option<ResourceRecord>>;

    /// Upsert the A and/or AAAA record with the supplied value(s)
    ///
    /// At least one of `ipv4`/`ipv6` must be set; otherwise the call fails
    /// with `InvalidInput` without touching the network. This is the single
    /// remote mutation the whole agent performs.
    async fn update(&self, ipv4: Option<&str>, ipv6: Option<&str>) -> Result<()>;

    /// Read the current value, materializing the record if it is absent
    ///
    /// A never-before-seen name is created with the family's sentinel address
    /// so that this call always ends with a defined, comparable value. A
    /// present record's value is returned verbatim, with no validation that
    /// it parses as an IP.
    async fn get_or_bootstrap(&self, family: Family) -> Result<String> {
        if let Some(record) = self.read_record(family).await? {
            return Ok(record.value);
        }

        let sentinel = family.sentinel();
        match family {
            Family::V4 => self.update(Some(sentinel), None).await?,
            Family::V6 => self.update(None, Some(sentinel)).await?,
        }
        Ok(sentinel.to_string())
    }
}

/// Helper trait for constructing record clients per managed name
///
/// The engine builds a fresh client for every name on every pass; any cache a
/// client keeps (such as a resolved zone id) therefore lives for one pass.
pub trait RecordClientFactory: Send + Sync {
    /// Create a client for one managed FQDN
    fn create(&self, name: &crate::config::NameConfig) -> Result<Box<dyn RecordClient>>;
}
