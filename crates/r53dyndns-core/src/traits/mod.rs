//! Trait seams between the engine and its collaborators
//!
//! - [`IpResolver`]: discover the host's current external address
//! - [`RecordClient`]: read/bootstrap/upsert one managed record set
//! - [`RecordClientFactory`]: build a client for one managed FQDN

pub mod ip_resolver;
pub mod record_client;

pub use ip_resolver::IpResolver;
pub use record_client::{RecordClient, RecordClientFactory, ResourceRecord};
