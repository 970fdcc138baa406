// # r53dyndns-core
//
// Core library for the r53-dyndns agent.
//
// The agent keeps one or more DNS records in a Route53-style hosted zone
// pointed at this host's current external address. This crate holds the
// pieces that do not talk to any particular service:
//
// - **IpResolver**: trait for discovering the host's external IPv4/IPv6 address
// - **RecordClient**: trait for the narrow read/bootstrap/upsert cycle against
//   one managed FQDN in one hosted zone
// - **Engine**: the reconciliation loop that compares discovered addresses
//   against authoritative records and writes only on drift
//
// Concrete implementations live in sibling crates (`r53dyndns-ip-http`,
// `r53dyndns-route53`); the daemon binary wires them together.

pub mod config;
pub mod engine;
pub mod error;
pub mod family;
pub mod traits;

pub use config::{AgentConfig, NameConfig};
pub use engine::Engine;
pub use error::{Error, Result};
pub use family::Family;
pub use traits::{IpResolver, RecordClient, RecordClientFactory, ResourceRecord};
