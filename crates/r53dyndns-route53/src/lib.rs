// # Route53 Record Client
//
// Wraps the Route53 API with the narrow operations the agent needs, scoped
// to one managed FQDN in one hosted zone:
//
// - find the hosted zone id by exact zone-name match (cached per client)
// - read the single A or AAAA record for the FQDN
// - upsert the record via a change batch
//
// Reads are scoped to exactly one record with a start-key + max-1 listing
// rather than a zone dump, so the per-pass check stays cheap in large zones.
// No retries here: any API failure is surfaced to the engine immediately.
//
// ## API Reference
//
// - ListHostedZonesByName: zone discovery
// - ListResourceRecordSets (StartRecordName/StartRecordType, MaxItems=1)
// - ChangeResourceRecordSets (ChangeBatch, Action=UPSERT)

use async_trait::async_trait;
use aws_sdk_route53::config::{BehaviorVersion, Credentials, Region};
use aws_sdk_route53::error::DisplayErrorContext;
use aws_sdk_route53::types::{
    Change, ChangeAction, ChangeBatch, ResourceRecord as AwsResourceRecord, ResourceRecordSet,
    RrType,
};
use aws_sdk_route53::Client;
use r53dyndns_core::config::NameConfig;
use r53dyndns_core::traits::{RecordClient, RecordClientFactory, ResourceRecord};
use r53dyndns_core::{Error, Family, Result};
use tokio::sync::OnceCell;
use tracing::debug;

// Route53 is a global service; its control-plane endpoint lives here.
const ROUTE53_REGION: &str = "us-east-1";

/// Record client for one managed FQDN in one Route53 hosted zone
pub struct Route53RecordClient {
    /// Managed name, lowercased, trailing dot stripped
    fqdn: String,

    /// Hosted zone name, lowercased, trailing dot stripped
    zone: String,

    /// TTL applied on upserts
    ttl: i64,

    client: Client,

    /// Hosted zone id, resolved on first use and cached for this client's
    /// lifetime (one reconciliation pass)
    zone_id: OnceCell<String>,
}

impl Route53RecordClient {
    /// Create a client from one name section of the configuration
    pub fn new(name: &NameConfig) -> Self {
        let credentials =
            Credentials::from_keys(name.access_key.clone(), name.secret_key.clone(), None);
        let config = aws_sdk_route53::Config::builder()
            .behavior_version(BehaviorVersion::latest())
            .region(Region::new(ROUTE53_REGION))
            .credentials_provider(credentials)
            .build();

        Self {
            fqdn: normalize_name(&name.fqdn),
            zone: normalize_name(&name.zone),
            ttl: name.ttl,
            client: Client::from_conf(config),
            zone_id: OnceCell::new(),
        }
    }

    /// Resolve (and cache) the hosted zone id for the configured zone name
    ///
    /// Exact match only: a listing that starts at a similarly-named zone
    /// does not count.
    async fn zone_id(&self) -> Result<&str> {
        let id = self
            .zone_id
            .get_or_try_init(|| async {
                let listing = self
                    .client
                    .list_hosted_zones_by_name()
                    .dns_name(&self.zone)
                    .max_items(1)
                    .send()
                    .await
                    .map_err(|e| Error::RecordReadFailed {
                        fqdn: self.fqdn.clone(),
                        message: format!("listing hosted zones: {}", DisplayErrorContext(&e)),
                    })?;

                let zone = listing
                    .hosted_zones()
                    .first()
                    .filter(|z| normalize_name(z.name()) == self.zone)
                    .ok_or_else(|| Error::ZoneNotFound {
                        zone: self.zone.clone(),
                    })?;

                // Ids come back as "/hostedzone/Z123..."; the change API
                // accepts either form, keep the bare id for log clarity.
                let id = zone.id().trim_start_matches("/hostedzone/").to_string();
                debug!("Resolved zone {} to {}", self.zone, id);
                Ok::<String, Error>(id)
            })
            .await?;

        Ok(id.as_str())
    }
}

#[async_trait]
impl RecordClient for Route53RecordClient {
    async fn read_record(&self, family: Family) -> Result<Option<ResourceRecord>> {
        let zone_id = self.zone_id().await?;

        let listing = self
            .client
            .list_resource_record_sets()
            .hosted_zone_id(zone_id)
            .start_record_name(&self.fqdn)
            .start_record_type(rr_type(family))
            .max_items(1)
            .send()
            .await
            .map_err(|e| Error::RecordReadFailed {
                fqdn: self.fqdn.clone(),
                message: DisplayErrorContext(&e).to_string(),
            })?;

        Ok(listing
            .resource_record_sets()
            .first()
            .and_then(|set| match_record_set(set, &self.fqdn, family)))
    }

    async fn update(&self, ipv4: Option<&str>, ipv6: Option<&str>) -> Result<()> {
        if ipv4.is_none() && ipv6.is_none() {
            return Err(Error::invalid_input(
                "update requires at least one of an IPv4 or IPv6 value",
            ));
        }

        let zone_id = self.zone_id().await?.to_string();

        let mut batch = ChangeBatch::builder().comment(format!(
            "r53-dyndns update for {} at {}",
            self.fqdn,
            chrono::Utc::now().to_rfc3339()
        ));
        for (family, value) in [(Family::V4, ipv4), (Family::V6, ipv6)] {
            let Some(value) = value else { continue };
            batch = batch.changes(upsert_change(&self.fqdn, family, value, self.ttl)?);
        }
        let batch = batch
            .build()
            .map_err(|e| Error::invalid_input(e.to_string()))?;

        self.client
            .change_resource_record_sets()
            .hosted_zone_id(&zone_id)
            .change_batch(batch)
            .send()
            .await
            .map_err(|e| Error::RecordWriteFailed {
                fqdn: self.fqdn.clone(),
                message: DisplayErrorContext(&e).to_string(),
            })?;

        debug!("Upserted record set for {} in zone {}", self.fqdn, zone_id);
        Ok(())
    }
}

/// Factory used by the engine to build one client per managed name per pass
pub struct Route53ClientFactory;

impl RecordClientFactory for Route53ClientFactory {
    fn create(&self, name: &NameConfig) -> Result<Box<dyn RecordClient>> {
        Ok(Box::new(Route53RecordClient::new(name)))
    }
}

fn rr_type(family: Family) -> RrType {
    match family {
        Family::V4 => RrType::A,
        Family::V6 => RrType::Aaaa,
    }
}

/// Build one UPSERT change for a single-value record set
fn upsert_change(fqdn: &str, family: Family, value: &str, ttl: i64) -> Result<Change> {
    let record = AwsResourceRecord::builder()
        .value(value)
        .build()
        .map_err(|e| Error::invalid_input(e.to_string()))?;
    let set = ResourceRecordSet::builder()
        .name(fqdn)
        .r#type(rr_type(family))
        .ttl(ttl)
        .resource_records(record)
        .build()
        .map_err(|e| Error::invalid_input(e.to_string()))?;

    Change::builder()
        .action(ChangeAction::Upsert)
        .resource_record_set(set)
        .build()
        .map_err(|e| Error::invalid_input(e.to_string()))
}

/// Decide whether a listed record set is the one being looked for
///
/// The listing starts at (fqdn, type), so the first result may be the next
/// record alphabetically; that near-match must read as absence. Names come
/// back with special characters octal-escaped and a trailing dot.
fn match_record_set(
    set: &ResourceRecordSet,
    fqdn: &str,
    family: Family,
) -> Option<ResourceRecord> {
    if *set.r#type() != rr_type(family) {
        return None;
    }

    let name = normalize_name(&unescape_record_name(set.name()));
    if name != fqdn {
        return None;
    }

    let value = set.resource_records().first()?.value().to_string();
    Some(ResourceRecord {
        name,
        family,
        ttl: set.ttl().unwrap_or_default(),
        value,
    })
}

/// Lowercase and strip the trailing dot
fn normalize_name(name: &str) -> String {
    name.trim_end_matches('.').to_ascii_lowercase()
}

/// Undo the `\NNN` octal escaping Route53 applies to special characters in
/// record names (e.g. `\052` for `*`)
fn unescape_record_name(name: &str) -> String {
    let bytes = name.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;

    while i < bytes.len() {
        if bytes[i] == b'\\' && i + 3 < bytes.len() {
            let digits = &bytes[i + 1..i + 4];
            if digits.iter().all(|b| (b'0'..=b'7').contains(b)) {
                let value = digits
                    .iter()
                    .fold(0u32, |acc, b| acc * 8 + u32::from(b - b'0'));
                if let Ok(byte) = u8::try_from(value) {
                    out.push(byte);
                    i += 4;
                    continue;
                }
            }
        }
        out.push(bytes[i]);
        i += 1;
    }

    String::from_utf8_lossy(&out).into_owned()
}
