// # IP Resolver Trait
//
// Defines the interface for discovering the host's current external address.
//
// ## Implementations
//
// - HTTP(S) lookup service with DNS URL pinning: `r53dyndns-ip-http` crate

use crate::error::Result;
use crate::family::Family;
use async_trait::async_trait;

/// Trait for external-IP discovery implementations
///
/// Implementations own their retry policy: transient failures are retried up
/// to an internal budget before an error is surfaced. The engine never
/// retries a discovery call.
///
/// The discovered address is deliberately a `String`, not an `IpAddr`: the
/// reconciliation comparison is exact text equality against whatever the
/// authoritative record stores, and the lookup service's answer is taken
/// as-is.
#[async_trait]
pub trait IpResolver: Send + Sync {
    /// Discover the current external address of the requested family
    ///
    /// # Returns
    ///
    /// - `Ok(String)`: the address literal, e.g. `203.0.113.5` or `2002::1`
    /// - `Err(Error::LookupFailed)`: the retry budget was exhausted; the last
    ///   underlying failure is attached as the source
    async fn discover(&self, family: Family) -> Result<String>;
}
