//! Test doubles and common utilities for engine tests
//!
//! The doubles share their state behind `Arc` so a test can keep a handle
//! for assertions after handing a clone to the engine.

use async_trait::async_trait;
use r53dyndns_core::config::{AgentConfig, NameConfig};
use r53dyndns_core::error::{Error, Result};
use r53dyndns_core::traits::{IpResolver, RecordClient, RecordClientFactory, ResourceRecord};
use r53dyndns_core::Family;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// A resolver that answers from fixed values; `None` means the discovery
/// fails for that family.
#[derive(Clone)]
pub struct ScriptedResolver {
    inner: Arc<ResolverState>,
}

struct ResolverState {
    v4: Option<String>,
    v6: Option<String>,
    v4_calls: AtomicUsize,
    v6_calls: AtomicUsize,
}

impl ScriptedResolver {
    pub fn new(v4: Option<&str>, v6: Option<&str>) -> Self {
        Self {
            inner: Arc::new(ResolverState {
                v4: v4.map(str::to_string),
                v6: v6.map(str::to_string),
                v4_calls: AtomicUsize::new(0),
                v6_calls: AtomicUsize::new(0),
            }),
        }
    }

    pub fn v4_calls(&self) -> usize {
        self.inner.v4_calls.load(Ordering::SeqCst)
    }

    pub fn v6_calls(&self) -> usize {
        self.inner.v6_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl IpResolver for ScriptedResolver {
    async fn discover(&self, family: Family) -> Result<String> {
        let (value, calls) = match family {
            Family::V4 => (&self.inner.v4, &self.inner.v4_calls),
            Family::V6 => (&self.inner.v6, &self.inner.v6_calls),
        };
        calls.fetch_add(1, Ordering::SeqCst);

        value.clone().ok_or_else(|| Error::LookupFailed {
            attempts: 3,
            source: Box::new(Error::http("scripted discovery failure")),
        })
    }
}

/// Per-name record state shared between a test and the clients the factory
/// hands to the engine.
#[derive(Default)]
pub struct ClientState {
    stored: Mutex<HashMap<Family, String>>,
    updates: Mutex<Vec<(Option<String>, Option<String>)>>,
    fail_reads: AtomicBool,
}

/// A factory whose clients record every update call
#[derive(Clone, Default)]
pub struct MockClientFactory {
    records: Arc<Mutex<HashMap<String, Arc<ClientState>>>>,
}

impl MockClientFactory {
    pub fn new() -> Self {
        Self::default()
    }

    fn state_for(&self, fqdn: &str) -> Arc<ClientState> {
        self.records
            .lock()
            .unwrap()
            .entry(fqdn.to_string())
            .or_default()
            .clone()
    }

    /// Pre-populate the authoritative value for one name/family
    pub fn seed(&self, fqdn: &str, family: Family, value: &str) {
        self.state_for(fqdn)
            .stored
            .lock()
            .unwrap()
            .insert(family, value.to_string());
    }

    /// Make every read for this name fail with `RecordReadFailed`
    pub fn fail_reads(&self, fqdn: &str) {
        self.state_for(fqdn).fail_reads.store(true, Ordering::SeqCst);
    }

    /// All update calls made for this name, in order
    pub fn updates(&self, fqdn: &str) -> Vec<(Option<String>, Option<String>)> {
        self.state_for(fqdn).updates.lock().unwrap().clone()
    }
}

impl RecordClientFactory for MockClientFactory {
    fn create(&self, name: &NameConfig) -> Result<Box<dyn RecordClient>> {
        Ok(Box::new(MockRecordClient {
            fqdn: name.fqdn.clone(),
            state: self.state_for(&name.fqdn),
        }))
    }
}

pub struct MockRecordClient {
    fqdn: String,
    state: Arc<ClientState>,
}

#[async_trait]
impl RecordClient for MockRecordClient {
    async fn read_record(&self, family: Family) -> Result<Option<ResourceRecord>> {
        if self.state.fail_reads.load(Ordering::SeqCst) {
            return Err(Error::RecordReadFailed {
                fqdn: self.fqdn.clone(),
                message: "scripted read failure".to_string(),
            });
        }

        Ok(self
            .state
            .stored
            .lock()
            .unwrap()
            .get(&family)
            .map(|value| ResourceRecord {
                name: self.fqdn.clone(),
                family,
                ttl: 60,
                value: value.clone(),
            }))
    }

    async fn update(&self, ipv4: Option<&str>, ipv6: Option<&str>) -> Result<()> {
        if ipv4.is_none() && ipv6.is_none() {
            return Err(Error::invalid_input("update requires at least one value"));
        }

        self.state
            .updates
            .lock()
            .unwrap()
            .push((ipv4.map(str::to_string), ipv6.map(str::to_string)));

        let mut stored = self.state.stored.lock().unwrap();
        if let Some(value) = ipv4 {
            stored.insert(Family::V4, value.to_string());
        }
        if let Some(value) = ipv6 {
            stored.insert(Family::V6, value.to_string());
        }
        Ok(())
    }
}

/// Build a config managing the given FQDNs
pub fn test_config(fqdns: &[&str], ipv4: bool, ipv6: bool) -> AgentConfig {
    AgentConfig {
        lookup_url: "https://ip.example.net".to_string(),
        lookup_timeout_secs: 3,
        lookup_max_retries: 3,
        update_interval_secs: 60,
        ipv4,
        ipv6,
        names: fqdns
            .iter()
            .map(|fqdn| NameConfig {
                fqdn: (*fqdn).to_string(),
                zone: "example.com".to_string(),
                access_key: "AKIATEST".to_string(),
                secret_key: "s3cret".to_string(),
                ttl: 60,
            })
            .collect(),
    }
}
