// # r53dyndnsd - Dynamic-DNS Daemon
//
// Thin integration layer: reads the config file, sets up logging, wires the
// HTTP IP resolver and the Route53 client factory into the reconciliation
// engine, and runs it in the selected mode. All decision logic lives in
// r53dyndns-core.
//
// ## Configuration
//
// One JSON file, path given with `--config`:
//
// ```json
// {
//   "lookup_url": "https://ip.example.net",
//   "lookup_timeout_secs": 3,
//   "lookup_max_retries": 3,
//   "update_interval_secs": 300,
//   "ipv4": true,
//   "ipv6": false,
//   "names": [
//     {
//       "fqdn": "home.example.com",
//       "zone": "example.com",
//       "access_key": "...",
//       "secret_key": "...",
//       "ttl": 60
//     }
//   ]
// }
// ```
//
// Process plumbing (daemonizing, PID files, privilege drops, log rotation)
// is left to the service manager; the daemon runs in the foreground and logs
// to stderr.

use anyhow::{Context, Result};
use clap::Parser;
use r53dyndns_core::{AgentConfig, Engine};
use r53dyndns_ip_http::HttpIpResolver;
use r53dyndns_route53::Route53ClientFactory;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;
use tracing::{error, info, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser)]
#[command(name = "r53dyndnsd", version, about)]
struct Args {
    /// Path to the config file
    #[arg(short, long, default_value = "/etc/r53-dyndns.json")]
    config: PathBuf,

    /// Run continuously, reconciling every update interval; without this
    /// flag exactly one pass is run
    #[arg(short, long)]
    daemon: bool,

    /// Output debugging info
    #[arg(short = 'D', long)]
    debug: bool,
}

/// Exit codes for different termination scenarios
///
/// - 0: clean exit
/// - 1: configuration error or failed pass
/// - 2: unexpected runtime failure
#[derive(Debug, Clone, Copy)]
enum AgentExitCode {
    Clean = 0,
    Operational = 1,
    Unexpected = 2,
}

impl From<AgentExitCode> for ExitCode {
    fn from(code: AgentExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

fn main() -> ExitCode {
    let args = Args::parse();

    let level = if args.debug { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder().with_max_level(level).finish();
    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        return AgentExitCode::Unexpected.into();
    }

    let config = match load_config(&args.config) {
        Ok(config) => config,
        Err(e) => {
            error!("Configuration error: {:#}", e);
            return AgentExitCode::Operational.into();
        }
    };

    let rt = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to create tokio runtime: {}", e);
            return AgentExitCode::Unexpected.into();
        }
    };

    rt.block_on(async {
        match run(config, args.daemon).await {
            Ok(()) => AgentExitCode::Clean,
            Err(e) => {
                error!("Error trying to check/update IPs: {:#}", e);
                AgentExitCode::Operational
            }
        }
    })
    .into()
}

/// Read, parse and validate the config file
fn load_config(path: &PathBuf) -> Result<AgentConfig> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("could not read config file {}", path.display()))?;
    let config: AgentConfig = serde_json::from_str(&raw)
        .with_context(|| format!("could not parse config file {}", path.display()))?;
    config.validate()?;
    Ok(config)
}

/// Build the engine and run it in the selected mode
async fn run(config: AgentConfig, daemon: bool) -> Result<()> {
    let resolver = HttpIpResolver::new(
        &config.lookup_url,
        Duration::from_secs(config.lookup_timeout_secs),
        config.lookup_max_retries,
    )?;

    info!(
        "Managing {} name(s), lookup via {}",
        config.names.len(),
        config.lookup_url
    );

    let engine = Engine::new(
        Box::new(resolver),
        Box::new(Route53ClientFactory),
        config,
    )?;

    if daemon {
        info!("Running continuously");
        engine.run_forever().await?;
    } else {
        engine.run_once().await?;
    }

    Ok(())
}
