//! okctld: the okctl daemon.
//!
//! Builds the composition root once (state store, providers, services,
//! middleware chain) and either serves it over HTTP or applies a cluster
//! declaration through it.
//!
//! # Usage
//!
//! ```text
//! okctld serve --listen 127.0.0.1:8085 --data-dir .okctl/state
//! okctld apply cluster.yaml
//! okctld apply cluster.yaml --remote http://127.0.0.1:8085
//! okctld teardown cluster.yaml
//! ```

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use okctl_api::{ApiState, build_router};
use okctl_client::{Applier, Client, ClusterDeclaration};
use okctl_core::config::{Config, LogConfig, LogFormat};
use okctl_provider::Providers;
use okctl_service::{Chain, Handler, Logging, Services};
use okctl_state::StateStore;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "okctld", about = "okctl provisioning daemon")]
struct Cli {
    /// TOML configuration file; defaults apply when it does not exist.
    #[arg(long, global = true, default_value = "okctld.toml")]
    config: PathBuf,

    /// State directory, overrides `state.data_dir`.
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Serve the okctl API.
    Serve {
        /// Address to listen on, overrides `server.listen`.
        #[arg(long)]
        listen: Option<String>,

        /// Synthesize provider results instead of calling the cloud.
        #[arg(long)]
        dry_run: bool,
    },

    /// Create everything a cluster declaration asks for.
    Apply {
        /// YAML cluster declaration.
        file: PathBuf,

        /// Daemon to apply through; in-process when absent.
        #[arg(long)]
        remote: Option<String>,
    },

    /// Remove everything a cluster declaration created.
    Teardown {
        file: PathBuf,

        #[arg(long)]
        remote: Option<String>,
    },

    /// Print the effective configuration.
    Config,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = effective_config(&cli)?;
    init_tracing(&config.log)?;

    match cli.command {
        Command::Serve { dry_run, .. } => serve(config, dry_run).await,
        Command::Apply { file, remote } => {
            let decl = read_declaration(&file)?;
            let applier = Applier::new(client(&config, remote)?);
            let applied = applier.apply(&decl).await?;
            println!("{}", serde_json::to_string_pretty(&applied)?);
            Ok(())
        }
        Command::Teardown { file, remote } => {
            let decl = read_declaration(&file)?;
            Applier::new(client(&config, remote)?).teardown(&decl).await?;
            info!(cluster = %decl.id.cluster_name, "teardown complete");
            Ok(())
        }
        Command::Config => {
            print!("{}", config.to_toml_string()?);
            Ok(())
        }
    }
}

/// Config file, then command-line overrides.
fn effective_config(cli: &Cli) -> anyhow::Result<Config> {
    let mut config = Config::load_or_default(&cli.config)?;
    if let Some(dir) = &cli.data_dir {
        config.state.data_dir = dir.clone();
    }
    if let Command::Serve {
        listen: Some(listen), ..
    } = &cli.command
    {
        config.server.listen = listen.clone();
    }
    Ok(config)
}

fn init_tracing(log: &LogConfig) -> anyhow::Result<()> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(&log.level)
            .with_context(|| format!("invalid log level {:?}", log.level))?,
    };
    match log.format {
        LogFormat::Text => tracing_subscriber::fmt().with_env_filter(filter).init(),
        LogFormat::Json => tracing_subscriber::fmt().json().with_env_filter(filter).init(),
    }
    Ok(())
}

/// State store, providers, services and the middleware chain, wired once.
fn compose(config: &Config) -> anyhow::Result<Arc<dyn Handler>> {
    let state = StateStore::open(&config.state.data_dir)
        .with_context(|| format!("opening state at {}", config.state.data_dir.display()))?;
    info!(path = %config.state.data_dir.display(), "state store opened");

    let services = Services::new(Providers::dry_run(), state);
    let chain = Chain::new(Arc::new(services)).with(Logging::new(config.log.anonymize));
    Ok(Arc::new(chain))
}

fn client(config: &Config, remote: Option<String>) -> anyhow::Result<Client> {
    Ok(match remote {
        Some(url) => Client::remote(url),
        None => Client::direct(compose(config)?),
    })
}

fn read_declaration(path: &Path) -> anyhow::Result<ClusterDeclaration> {
    let content =
        std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    serde_yaml::from_str(&content).with_context(|| format!("parsing {}", path.display()))
}

async fn serve(config: Config, dry_run: bool) -> anyhow::Result<()> {
    info!("okctl daemon starting");
    if !dry_run {
        warn!("no cloud adapters are linked into this build, using dry-run providers");
    }

    let handler = compose(&config)?;
    let router = build_router(ApiState::new(handler, &config.server));

    let listener = tokio::net::TcpListener::bind(&config.server.listen)
        .await
        .with_context(|| format!("binding {}", config.server.listen))?;
    info!(
        addr = %config.server.listen,
        encoding = ?config.server.response_encoding,
        "API server starting"
    );

    axum::serve(listener, router)
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!(error = %e, "cannot listen for ctrl-c");
                std::future::pending::<()>().await;
            }
            info!("shutdown signal received");
        })
        .await?;

    info!("okctl daemon stopped");
    Ok(())
}

#[cfg(test)]
mod tests {
    use okctl_client::{ClusterApi, Integrations};
    use okctl_core::Id;
    use okctl_core::types::GetClusterOpts;

    use super::*;

    fn declaration() -> ClusterDeclaration {
        ClusterDeclaration {
            id: Id::new("eu-west-1", "123456789012", "staging", "okctl", "okctl-staging"),
            cidr: "192.168.0.0/20".to_string(),
            domain: "okctl-staging.oslo.systems".to_string(),
            minimal_vpc: true,
            integrations: Integrations::default(),
        }
    }

    #[test]
    fn flags_override_the_config_file() {
        let cli = Cli::try_parse_from([
            "okctld",
            "--config",
            "/nonexistent/okctld.toml",
            "serve",
            "--listen",
            "0.0.0.0:9000",
            "--data-dir",
            "/tmp/okctl-state",
        ])
        .unwrap();

        let config = effective_config(&cli).unwrap();
        assert_eq!(config.server.listen, "0.0.0.0:9000");
        assert_eq!(config.state.data_dir, PathBuf::from("/tmp/okctl-state"));
        assert_eq!(config.server.request_timeout_secs, 1800);
    }

    #[test]
    fn declaration_reads_from_yaml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cluster.yaml");
        std::fs::write(
            &path,
            r#"
id:
  region: eu-west-1
  accountID: "123456789012"
  environment: staging
  repository: okctl
  clusterName: okctl-staging
cidr: 192.168.0.0/20
domain: okctl-staging.oslo.systems
integrations:
  externalSecrets: false
"#,
        )
        .unwrap();

        let decl = read_declaration(&path).unwrap();
        assert_eq!(decl.id.account_id, "123456789012");
        assert!(decl.integrations.autoscaler);
        assert!(!decl.integrations.external_secrets);
        assert!(!decl.minimal_vpc);
    }

    #[tokio::test]
    async fn dry_run_applies_and_tears_down_in_process() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = Config::default();
        config.state.data_dir = dir.path().to_path_buf();

        let applier = Applier::new(client(&config, None).unwrap());
        let applied = applier.apply(&declaration()).await.unwrap();
        assert_eq!(applied.controllers.len(), 5);
        assert!(applied.hosted_zone.is_some());

        let reader = client(&config, None).unwrap();
        let stored = reader.get_cluster(GetClusterOpts { id: declaration().id }).await.unwrap();
        assert_eq!(stored, applied.cluster);

        applier.teardown(&declaration()).await.unwrap();
        let err = reader.get_cluster(GetClusterOpts { id: declaration().id }).await.unwrap_err();
        assert_eq!(err.kind(), okctl_core::Kind::NotExist);
    }
}
