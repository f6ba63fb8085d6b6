// # dnsdeploy - DNS Deployment CLI
//
// This binary is a THIN integration layer: all workflow logic lives in
// dnsdeploy-core. It is responsible for:
// 1. Reading configuration from environment variables
// 2. Parsing the subcommand
// 3. Wiring the engine to the live provider, resolver and prober
// 4. Rendering results and progress events
//
// ## Configuration
//
// All configuration is done via environment variables:
//
// - `DNSDEPLOY_API_TOKEN`: Cloudflare API token (required)
// - `DNSDEPLOY_ZONE_ID`: Zone ID (optional, auto-discovered otherwise; set
//   it explicitly when the zone apex has a short second-level label such as
//   `abc.com`, where apex discovery can mis-derive the zone)
// - `DNSDEPLOY_STATE_PATH`: Path to the deployments file
//   (default: deployments.json)
// - `DNSDEPLOY_PROPAGATION_TIMEOUT_SECS`: Propagation polling budget
//   (default: 60)
// - `DNSDEPLOY_POLL_INTERVAL_SECS`: Interval between polls (default: 5)
// - `DNSDEPLOY_LOG_LEVEL`: trace, debug, info, warn, error (default: warn)
//
// ## Example
//
// ```bash
// export DNSDEPLOY_API_TOKEN=your_token
//
// dnsdeploy deploy blog blog.example.com https://xyz.manus.space
// dnsdeploy status blog
// dnsdeploy list
// dnsdeploy monitor blog.example.com --duration 60
// dnsdeploy remove blog
// ```

use anyhow::Result;
use clap::{Parser, Subcommand};
use futures::StreamExt;
use std::env;
use std::process::ExitCode;
use std::time::Duration;
use tracing::{Level, error};
use tracing_subscriber::FmtSubscriber;

use dnsdeploy_core::{
    DeployConfig, DeployEngine, DeploymentRecord, DeploymentStore, EngineEvent,
    FileDeploymentStore, MemoryDeploymentStore, ProviderConfig, StoreConfig, WorkflowConfig,
};
use dnsdeploy_probe::{HickoryTargetResolver, HttpLivenessProber};
use dnsdeploy_provider_cloudflare::CloudflareProvider;

/// Exit codes for different termination scenarios
///
/// - 0: Success (including deploys that are still propagating)
/// - 1: Configuration error
/// - 2: Runtime error (provider failure, unknown name, ...)
#[derive(Debug, Clone, Copy)]
enum CliExitCode {
    Success = 0,
    ConfigError = 1,
    RuntimeError = 2,
}

impl From<CliExitCode> for ExitCode {
    fn from(code: CliExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

#[derive(Parser)]
#[command(name = "dnsdeploy", version, about = "Deploy and verify custom-domain DNS records")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Create a CNAME record and verify propagation and liveness
    Deploy {
        /// Unique deployment name
        name: String,
        /// Fully-qualified custom domain (e.g. blog.example.com)
        domain: String,
        /// Deployment target: a hostname or a URL, reduced to its host
        target: String,
    },

    /// Re-check DNS propagation and liveness for a tracked deployment
    Status {
        /// Deployment name
        name: String,
    },

    /// List all tracked deployments
    List,

    /// Re-point a tracked deployment at a new target
    Update {
        /// Deployment name
        name: String,
        /// New target: a hostname or a URL, reduced to its host
        target: String,
    },

    /// Delete the DNS record and stop tracking the deployment
    Remove {
        /// Deployment name
        name: String,
    },

    /// Observe resolution and liveness of a domain for a bounded duration
    Monitor {
        /// Domain to observe
        domain: String,
        /// How long to observe, in seconds
        #[arg(long, default_value_t = 60)]
        duration: u64,
    },

    /// List the zones visible to the API token
    Zones,

    /// List the provider's DNS records in the zone covering a domain
    Records {
        /// Any domain within the zone
        domain: String,
    },
}

/// Application configuration, from environment variables only
struct Config {
    api_token: String,
    zone_id: Option<String>,
    state_path: String,
    propagation_timeout_secs: u64,
    poll_interval_secs: u64,
    log_level: String,
}

impl Config {
    /// Load configuration from environment variables
    fn from_env() -> Result<Self> {
        let api_token = env::var("DNSDEPLOY_API_TOKEN").map_err(|_| {
            anyhow::anyhow!(
                "DNSDEPLOY_API_TOKEN is required. \
                Set it via: export DNSDEPLOY_API_TOKEN=your_token"
            )
        })?;

        Ok(Self {
            api_token,
            zone_id: env::var("DNSDEPLOY_ZONE_ID").ok(),
            state_path: env::var("DNSDEPLOY_STATE_PATH")
                .unwrap_or_else(|_| "deployments.json".to_string()),
            propagation_timeout_secs: parse_secs(
                "DNSDEPLOY_PROPAGATION_TIMEOUT_SECS",
                env::var("DNSDEPLOY_PROPAGATION_TIMEOUT_SECS").ok(),
                60,
            )?,
            poll_interval_secs: parse_secs(
                "DNSDEPLOY_POLL_INTERVAL_SECS",
                env::var("DNSDEPLOY_POLL_INTERVAL_SECS").ok(),
                5,
            )?,
            log_level: env::var("DNSDEPLOY_LOG_LEVEL").unwrap_or_else(|_| "warn".to_string()),
        })
    }

    /// Assemble the engine-facing configuration
    fn deploy_config(&self) -> DeployConfig {
        DeployConfig {
            provider: ProviderConfig::Cloudflare {
                api_token: self.api_token.clone(),
                zone_id: self.zone_id.clone(),
            },
            store: StoreConfig::File {
                path: self.state_path.clone(),
            },
            workflow: WorkflowConfig {
                propagation_timeout_secs: self.propagation_timeout_secs,
                poll_interval_secs: self.poll_interval_secs,
                ..WorkflowConfig::default()
            },
        }
    }

    /// Validate the configuration
    fn validate(&self) -> Result<()> {
        if self.api_token.len() < 20 {
            anyhow::bail!(
                "DNSDEPLOY_API_TOKEN appears too short ({} chars). \
                Cloudflare tokens are typically 40 characters. \
                Verify your token is correct.",
                self.api_token.len()
            );
        }

        // Catch obvious placeholder tokens
        let token_lower = self.api_token.to_lowercase();
        if token_lower.contains("your_token")
            || token_lower.contains("replace_me")
            || token_lower.contains("example")
        {
            anyhow::bail!(
                "DNSDEPLOY_API_TOKEN appears to be a placeholder. \
                Use an actual API token from Cloudflare."
            );
        }

        if self.state_path.is_empty() {
            anyhow::bail!("DNSDEPLOY_STATE_PATH cannot be empty");
        }

        if !(1..=300).contains(&self.poll_interval_secs) {
            anyhow::bail!(
                "DNSDEPLOY_POLL_INTERVAL_SECS must be between 1 and 300. Got: {}",
                self.poll_interval_secs
            );
        }

        if !(self.poll_interval_secs..=3600).contains(&self.propagation_timeout_secs) {
            anyhow::bail!(
                "DNSDEPLOY_PROPAGATION_TIMEOUT_SECS must be between {} (the poll interval) \
                and 3600. Got: {}",
                self.poll_interval_secs,
                self.propagation_timeout_secs
            );
        }

        match self.log_level.to_lowercase().as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => anyhow::bail!(
                "DNSDEPLOY_LOG_LEVEL '{}' is not valid. \
                Valid levels: trace, debug, info, warn, error",
                self.log_level
            ),
        }

        Ok(())
    }
}

/// Parse an optional seconds value, failing loudly on a typo
///
/// A missing variable falls back to the default; a present but non-numeric
/// value is a configuration error, never silently replaced.
fn parse_secs(name: &str, raw: Option<String>, default: u64) -> Result<u64> {
    match raw {
        Some(value) => value.parse().map_err(|_| {
            anyhow::anyhow!("{name} must be a whole number of seconds. Got: {value}")
        }),
        None => Ok(default),
    }
}

/// Validate that a string is a plausible domain name per RFC 1035
fn validate_domain_name(domain: &str) -> Result<()> {
    if domain.is_empty() {
        anyhow::bail!("Domain name cannot be empty");
    }

    if domain.len() > 253 {
        anyhow::bail!(
            "Domain name too long: {} chars (max 253). Got: {}",
            domain.len(),
            domain
        );
    }

    for label in domain.split('.') {
        if label.is_empty() {
            anyhow::bail!("Domain name has empty label: '{}'", domain);
        }

        if label.len() > 63 {
            anyhow::bail!(
                "Domain label too long: {} chars (max 63). Label: '{}'",
                label.len(),
                label
            );
        }

        if !label.chars().all(|c| c.is_alphanumeric() || c == '-') {
            anyhow::bail!(
                "Domain label contains invalid characters. Label: '{}'. \
                Valid: alphanumeric and hyphen only.",
                label
            );
        }

        if label.starts_with('-') || label.ends_with('-') {
            anyhow::bail!(
                "Domain label cannot start or end with hyphen. Label: '{}'",
                label
            );
        }
    }

    Ok(())
}

/// Reduce a deployment target to a bare hostname
///
/// Targets are commonly pasted as full URLs ("https://xyz.manus.space/");
/// the DNS record only wants the host.
fn extract_target_host(target: &str) -> String {
    let stripped = target
        .strip_prefix("https://")
        .or_else(|| target.strip_prefix("http://"))
        .unwrap_or(target);
    let host = stripped.split('/').next().unwrap_or(stripped);
    host.trim_end_matches('.').to_string()
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Configuration error: {e}");
            return CliExitCode::ConfigError.into();
        }
    };

    if let Err(e) = config.validate() {
        eprintln!("Configuration validation error: {e}");
        return CliExitCode::ConfigError.into();
    }

    let log_level = match config.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::WARN,
    };

    let subscriber = FmtSubscriber::builder().with_max_level(log_level).finish();
    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {e}");
        return CliExitCode::ConfigError.into();
    }

    let rt = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to create tokio runtime: {}", e);
            return CliExitCode::RuntimeError.into();
        }
    };

    rt.block_on(async {
        match run(cli.command, config).await {
            Ok(()) => CliExitCode::Success,
            Err(e) => {
                eprintln!("Error: {e}");
                CliExitCode::RuntimeError
            }
        }
    })
    .into()
}

/// Build the engine and execute one subcommand
async fn run(command: Command, config: Config) -> Result<()> {
    let deploy_config = config.deploy_config();
    deploy_config.validate()?;

    let provider = match &deploy_config.provider {
        ProviderConfig::Cloudflare { api_token, zone_id } => {
            CloudflareProvider::new(api_token.clone(), zone_id.clone())?
        }
    };

    let store: Box<dyn DeploymentStore> = match &deploy_config.store {
        StoreConfig::File { path } => Box::new(FileDeploymentStore::new(path).await?),
        StoreConfig::Memory => Box::new(MemoryDeploymentStore::new()),
    };

    let (engine, events) = DeployEngine::new(
        Box::new(provider),
        Box::new(HickoryTargetResolver::new()),
        Box::new(HttpLivenessProber::new()),
        store,
        deploy_config.workflow.clone(),
    )?;

    // Progress events render on stderr so stdout stays machine-readable
    let printer = tokio::spawn(print_events(events));

    let result = match command {
        Command::Deploy {
            name,
            domain,
            target,
        } => {
            validate_domain_name(&domain)?;
            let target = extract_target_host(&target);
            validate_domain_name(&target)?;

            let record = engine.deploy(&name, &domain, &target).await?;
            print_record(&record);
            if !record.dns_propagated {
                println!();
                println!(
                    "DNS is still propagating; run `dnsdeploy status {name}` to check again."
                );
            }
            Ok(())
        }

        Command::Status { name } => {
            let record = engine.status(&name).await?;
            print_record(&record);
            Ok(())
        }

        Command::List => {
            let records = engine.list().await?;
            if records.is_empty() {
                println!("No tracked deployments.");
            } else {
                println!(
                    "{:<16} {:<30} {:<30} {:<11} {:<5} {:<5}",
                    "NAME", "DOMAIN", "TARGET", "STATUS", "DNS", "LIVE"
                );
                for record in records {
                    println!(
                        "{:<16} {:<30} {:<30} {:<11} {:<5} {:<5}",
                        record.name,
                        record.custom_domain,
                        record.target,
                        record.status,
                        mark(record.dns_propagated),
                        mark(record.site_live),
                    );
                }
            }
            Ok(())
        }

        Command::Update { name, target } => {
            let target = extract_target_host(&target);
            validate_domain_name(&target)?;
            let record = engine.update(&name, &target).await?;
            print_record(&record);
            Ok(())
        }

        Command::Remove { name } => {
            engine.remove(&name).await?;
            println!("Removed deployment '{name}'.");
            Ok(())
        }

        Command::Monitor { domain, duration } => {
            validate_domain_name(&domain)?;
            println!("Monitoring {domain} for {duration}s...");
            let stream = engine.monitor(&domain, Duration::from_secs(duration));
            futures::pin_mut!(stream);
            while let Some(obs) = stream.next().await {
                let dns = if obs.resolved { "resolves" } else { "no answer" };
                let http = match obs.http_status {
                    Some(status) => format!("HTTP {status}"),
                    None => "unreachable".to_string(),
                };
                println!(
                    "[{:>4}s] {}  dns: {:<9}  site: {}",
                    obs.elapsed.as_secs(),
                    obs.timestamp.format("%H:%M:%S"),
                    dns,
                    http
                );
            }
            Ok(())
        }

        Command::Zones => {
            let zones = engine.zones().await?;
            if zones.is_empty() {
                println!("No zones visible to this token.");
            } else {
                println!("{:<34} NAME", "ID");
                for zone in zones {
                    println!("{:<34} {}", zone.id, zone.name);
                }
            }
            Ok(())
        }

        Command::Records { domain } => {
            validate_domain_name(&domain)?;
            let records = engine.records(&domain).await?;
            println!(
                "{:<8} {:<34} {:<34} {:<7}",
                "TYPE", "NAME", "CONTENT", "PROXIED"
            );
            for record in records {
                println!(
                    "{:<8} {:<34} {:<34} {:<7}",
                    record.record_type,
                    record.name,
                    record.content,
                    record.proxied,
                );
            }
            Ok(())
        }
    };

    // The engine is done; dropping it closes the event channel
    drop(engine);
    let _ = printer.await;

    result
}

/// Render engine progress events as they arrive
async fn print_events(mut events: tokio::sync::mpsc::Receiver<EngineEvent>) {
    while let Some(event) = events.recv().await {
        match event {
            EngineEvent::ZoneResolved { zone_name, zone_id } => {
                eprintln!("zone: {zone_name} ({zone_id})");
            }
            EngineEvent::RecordCreated { name, record_id } => {
                eprintln!("record created for '{name}' ({record_id})");
            }
            EngineEvent::PropagationPoll { attempt, matched } => {
                if !matched {
                    eprintln!("waiting for DNS propagation (poll {attempt})...");
                }
            }
            EngineEvent::DnsPropagated { polls } => {
                eprintln!("DNS propagated after {polls} poll(s)");
            }
            EngineEvent::PropagationTimedOut { polls } => {
                eprintln!("DNS not yet propagated after {polls} poll(s)");
            }
            EngineEvent::LivenessProbed { status, live } => match status {
                Some(status) if live => eprintln!("site is live (HTTP {status})"),
                Some(status) => eprintln!("site responded with HTTP {status}"),
                None => eprintln!("site not reachable yet"),
            },
            EngineEvent::RecordUpdated { name, target } => {
                eprintln!("record for '{name}' now points at {target}");
            }
            EngineEvent::RecordRemoved { name } => {
                eprintln!("record for '{name}' removed");
            }
        }
    }
}

/// Print one deployment record as a detail block
fn print_record(record: &DeploymentRecord) {
    println!("name:       {}", record.name);
    println!("domain:     {}", record.custom_domain);
    println!("target:     {}", record.target);
    println!("status:     {}", record.status);
    println!("dns:        {}", mark(record.dns_propagated));
    println!("live:       {}", mark(record.site_live));
    println!("created:    {}", record.created_at.format("%Y-%m-%d %H:%M:%S UTC"));
    println!("updated:    {}", record.updated_at.format("%Y-%m-%d %H:%M:%S UTC"));
}

fn mark(flag: bool) -> &'static str {
    if flag { "yes" } else { "no" }
}
