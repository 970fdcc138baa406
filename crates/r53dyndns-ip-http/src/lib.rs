// # HTTP IP Resolver
//
// Discovers the host's external address by fetching an HTTP(S) lookup
// service whose response body contains the caller's IP.
//
// ## Address-family pinning
//
// A plain fetch of the lookup URL would let the HTTP stack pick whichever
// address family it likes for the service's hostname. To make `discover(v4)`
// and `discover(v6)` deterministic, the hostname is first resolved to an
// address of the requested family with an explicit A or AAAA query, and the
// URL is rebuilt around that literal (IPv6 bracketed, scheme/port/path
// preserved). The original hostname travels in the `Host` header, and
// certificate verification is disabled for this client only: the peer's
// identity is already pinned by having chosen its resolved address
// ourselves, and the certificate cannot match an IP literal.

mod retry;

use async_trait::async_trait;
use hickory_resolver::TokioAsyncResolver;
use r53dyndns_core::{Error, Family, IpResolver, Result};
use regex::Regex;
use reqwest::header::HOST;
use std::net::IpAddr;
use std::time::Duration;
use tracing::debug;
use url::Url;

/// Dotted-quad scan; deliberately permissive, the body is expected to be
/// "the IP and nothing else" but is not guaranteed to be.
const IPV4_PATTERN: &str = r"(?:\d{1,3}\.){3}\d{1,3}";

/// Hex-and-colon run with at least two colons
const IPV6_PATTERN: &str = r"[A-Fa-f0-9]*(?::[A-Fa-f0-9]*){2,}";

/// External-IP resolver backed by an HTTP(S) lookup service
pub struct HttpIpResolver {
    /// The lookup URL as configured, hostname intact
    url: Url,

    /// The configured hostname, sent as the `Host` header on pinned fetches
    host: String,

    /// Attempt budget for one discovery call
    max_retries: u32,

    /// HTTP client; connect timeout set, certificate verification off
    client: reqwest::Client,

    /// Hostname resolution for the family-pinning step
    resolver: TokioAsyncResolver,

    re_v4: Regex,
    re_v6: Regex,
}

impl HttpIpResolver {
    /// Create a resolver for the given lookup service
    ///
    /// # Parameters
    ///
    /// - `lookup_url`: `scheme://host[:port][/path]`, scheme http or https
    /// - `timeout`: connect timeout for each fetch attempt
    /// - `max_retries`: attempts per `discover` call
    pub fn new(lookup_url: &str, timeout: Duration, max_retries: u32) -> Result<Self> {
        let url = parse_lookup_url(lookup_url)?;
        let host = url
            .host_str()
            .ok_or_else(|| malformed(lookup_url, "missing host"))?
            .to_string();

        let client = reqwest::Client::builder()
            .connect_timeout(timeout)
            .danger_accept_invalid_certs(true)
            .build()
            .map_err(|e| Error::http(format!("failed to build HTTP client: {e}")))?;

        let resolver = TokioAsyncResolver::tokio_from_system_conf()
            .map_err(|e| Error::dns(format!("failed to build DNS resolver: {e}")))?;

        Ok(Self {
            url,
            host,
            max_retries,
            client,
            resolver,
            re_v4: Regex::new(IPV4_PATTERN).expect("v4 pattern is valid"),
            re_v6: Regex::new(IPV6_PATTERN).expect("v6 pattern is valid"),
        })
    }

    /// One discovery attempt: resolve, pin, fetch, scan
    async fn attempt(&self, family: Family) -> Result<String> {
        let addr = self.resolve_host(family).await?;
        let pinned = build_lookup_url(&self.url, addr)?;
        debug!("Fetching {} with Host: {}", pinned, self.host);

        let body = self.fetch(pinned).await?;
        let re = match family {
            Family::V4 => &self.re_v4,
            Family::V6 => &self.re_v6,
        };
        find_ip(re, &body)
            .map(str::to_string)
            .ok_or_else(|| Error::UnparsableResponse {
                family,
                url: self.url.to_string(),
            })
    }

    /// Resolve the lookup host to one address of the requested family
    async fn resolve_host(&self, family: Family) -> Result<IpAddr> {
        // A literal host needs no pinning query.
        match self.url.host() {
            Some(url::Host::Ipv4(addr)) => return Ok(IpAddr::V4(addr)),
            Some(url::Host::Ipv6(addr)) => return Ok(IpAddr::V6(addr)),
            _ => {}
        }

        match family {
            Family::V4 => {
                let lookup = self
                    .resolver
                    .ipv4_lookup(self.host.as_str())
                    .await
                    .map_err(|e| Error::dns(format!("A lookup for {} failed: {e}", self.host)))?;
                let a = lookup
                    .iter()
                    .next()
                    .ok_or_else(|| Error::dns(format!("no A records for {}", self.host)))?;
                Ok(IpAddr::V4(a.0))
            }
            Family::V6 => {
                let lookup = self
                    .resolver
                    .ipv6_lookup(self.host.as_str())
                    .await
                    .map_err(|e| {
                        Error::dns(format!("AAAA lookup for {} failed: {e}", self.host))
                    })?;
                let aaaa = lookup
                    .iter()
                    .next()
                    .ok_or_else(|| Error::dns(format!("no AAAA records for {}", self.host)))?;
                Ok(IpAddr::V6(aaaa.0))
            }
        }
    }

    /// Fetch the pinned URL, presenting the original hostname via `Host`
    async fn fetch(&self, url: Url) -> Result<String> {
        let response = self
            .client
            .get(url)
            .header(HOST, &self.host)
            .send()
            .await
            .map_err(|e| Error::http(e.to_string()))?
            .error_for_status()
            .map_err(|e| Error::http(e.to_string()))?;

        response.text().await.map_err(|e| Error::http(e.to_string()))
    }
}

#[async_trait]
impl IpResolver for HttpIpResolver {
    async fn discover(&self, family: Family) -> Result<String> {
        let ip = retry::run(self.max_retries, retry::RETRY_PAUSE, || {
            self.attempt(family)
        })
        .await?;
        debug!("Discovered external {} address: {}", family, ip);
        Ok(ip)
    }
}

/// Parse and vet the configured lookup URL
fn parse_lookup_url(raw: &str) -> Result<Url> {
    let url = Url::parse(raw).map_err(|e| malformed(raw, &e.to_string()))?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(malformed(raw, "scheme must be http or https"));
    }
    if url.host_str().is_none() {
        return Err(malformed(raw, "missing host"));
    }

    Ok(url)
}

fn malformed(url: &str, reason: &str) -> Error {
    Error::MalformedUrl {
        url: url.to_string(),
        reason: reason.to_string(),
    }
}

/// Rebuild the lookup URL with the resolved address substituted for the
/// hostname. IPv6 literals come out bracketed; scheme, port and path are
/// preserved exactly.
pub fn build_lookup_url(url: &Url, addr: IpAddr) -> Result<Url> {
    let mut pinned = url.clone();
    pinned
        .set_ip_host(addr)
        .map_err(|()| malformed(url.as_str(), "URL cannot carry a host"))?;
    Ok(pinned)
}

/// Best-effort scan for an IP-shaped substring, not a validated parse
fn find_ip<'b>(re: &Regex, body: &'b str) -> Option<&'b str> {
    re.find(body).map(|m| m.as_str())
}
