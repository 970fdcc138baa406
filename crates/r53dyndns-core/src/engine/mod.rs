//! The reconciliation engine
//!
//! One pass discovers the host's current external address(es), then walks the
//! configured names and compares each authoritative record against the
//! discovered value. Only drift causes a write; matching records make no API
//! mutation at all.
//!
//! ```text
//! IpResolver ── current address ──▶ Engine ◀── stored value ── RecordClient
//!                                    │
//!                                    └── update() only when they differ
//! ```
//!
//! Two outer modes, selected once at startup: single-shot (one pass, errors
//! propagate to the caller) and continuous (passes forever on an interval;
//! a failed pass is logged and the loop keeps going).

use crate::config::{AgentConfig, NameConfig};
use crate::error::{Error, Result};
use crate::family::Family;
use crate::traits::{IpResolver, RecordClient, RecordClientFactory};
use std::time::Duration;
use tokio::sync::oneshot;
use tracing::{debug, error, info, warn};

/// Reconciliation engine
///
/// Holds the resolver and client factory behind trait objects so tests can
/// substitute controlled doubles. The engine itself keeps no state between
/// passes; clients (and their zone-id caches) are rebuilt per pass.
pub struct Engine {
    /// External-IP discovery
    resolver: Box<dyn IpResolver>,

    /// Builds a record client per managed name
    clients: Box<dyn RecordClientFactory>,

    /// Resolved agent configuration
    config: AgentConfig,
}

impl Engine {
    /// Create a new engine from a validated configuration
    pub fn new(
        resolver: Box<dyn IpResolver>,
        clients: Box<dyn RecordClientFactory>,
        config: AgentConfig,
    ) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            resolver,
            clients,
            config,
        })
    }

    /// Run exactly one reconciliation pass
    ///
    /// Any pass-level error is returned to the caller; the daemon maps it to
    /// a non-zero exit in single-shot mode.
    pub async fn run_once(&self) -> Result<()> {
        self.run_pass().await
    }

    /// Run passes forever, sleeping `update_interval_secs` between them
    ///
    /// A failed pass is logged and the loop continues; no error is fatal in
    /// continuous mode.
    pub async fn run_forever(&self) -> Result<()> {
        self.run_with_shutdown(None).await
    }

    /// Continuous mode with an optional programmatic shutdown signal
    ///
    /// The shutdown channel exists for tests that need to stop the loop
    /// deterministically; the daemon passes `None` and relies on process
    /// termination.
    pub async fn run_with_shutdown(
        &self,
        shutdown_rx: Option<oneshot::Receiver<()>>,
    ) -> Result<()> {
        let interval = Duration::from_secs(self.config.update_interval_secs);

        if let Some(mut rx) = shutdown_rx {
            loop {
                if let Err(e) = self.run_pass().await {
                    error!("Error trying to check/update IPs: {}", e);
                }
                tokio::select! {
                    _ = &mut rx => {
                        info!("Shutdown signal received, stopping engine");
                        return Ok(());
                    }
                    _ = tokio::time::sleep(interval) => {}
                }
            }
        }

        loop {
            if let Err(e) = self.run_pass().await {
                error!("Error trying to check/update IPs: {}", e);
            }
            tokio::time::sleep(interval).await;
        }
    }

    /// One full pass: discover, then reconcile every configured name
    async fn run_pass(&self) -> Result<()> {
        debug!("Starting reconciliation pass");

        // v4 discovery failure fails the pass; v6 discovery failure only
        // skips v6 for this pass.
        let current_v4 = if self.config.ipv4 {
            let ip = self.resolver.discover(Family::V4).await?;
            debug!("Current external IPv4: {}", ip);
            Some(ip)
        } else {
            None
        };

        let current_v6 = if self.config.ipv6 {
            match self.resolver.discover(Family::V6).await {
                Ok(ip) => {
                    debug!("Current external IPv6: {}", ip);
                    Some(ip)
                }
                Err(e) => {
                    warn!("Could not discover external IPv6, skipping v6 this pass: {}", e);
                    None
                }
            }
        } else {
            None
        };

        // One name's failure must not abort the others; the first error is
        // still reported so single-shot mode exits non-zero.
        let mut first_err = None;
        for name in &self.config.names {
            if let Err(e) = self
                .reconcile_name(name, current_v4.as_deref(), current_v6.as_deref())
                .await
            {
                error!("Failed to reconcile {}: {}", name.fqdn, e);
                first_err.get_or_insert(e);
            }
        }

        match first_err {
            None => Ok(()),
            Some(e) => Err(e),
        }
    }

    /// Reconcile one managed name for every family with a discovered value
    async fn reconcile_name(
        &self,
        name: &NameConfig,
        current_v4: Option<&str>,
        current_v6: Option<&str>,
    ) -> Result<()> {
        let client = self.clients.create(name)?;

        for (family, current) in [(Family::V4, current_v4), (Family::V6, current_v6)] {
            let Some(current) = current else { continue };
            self.reconcile_family(name, client.as_ref(), family, current)
                .await?;
        }

        Ok(())
    }

    /// Compare one record against the discovered value, upserting on drift
    ///
    /// The comparison is exact string equality. No canonicalization is
    /// applied; a record stored in a different (but equivalent) textual form
    /// costs one extra upsert and then converges.
    async fn reconcile_family(
        &self,
        name: &NameConfig,
        client: &dyn RecordClient,
        family: Family,
        current: &str,
    ) -> Result<()> {
        let authoritative = client.get_or_bootstrap(family).await?;
        debug!("Current {} value for {}: {}", family, name.fqdn, authoritative);

        if authoritative == current {
            debug!("{} ({}) already points at {}", name.fqdn, family, current);
            return Ok(());
        }

        info!(
            "Changing {} value for {} from {} to {}",
            family, name.fqdn, authoritative, current
        );
        match family {
            Family::V4 => client.update(Some(current), None).await?,
            Family::V6 => client.update(None, Some(current)).await?,
        }

        Ok(())
    }
}
