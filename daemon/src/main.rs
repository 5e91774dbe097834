//! Mirror daemon: entry point for running a governance node.

use anyhow::Context;
use clap::Parser;
use mirror_node::{init_logging, LogFormat, MirrorConfig, MirrorNode};
use mirror_types::UserId;
use std::net::IpAddr;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "mirror-daemon", about = "The Mirror governance backend")]
struct Cli {
    /// Path to a TOML configuration file. If provided, file settings
    /// are used as the base; CLI flags and env vars override them.
    #[arg(long, env = "MIRROR_CONFIG")]
    config: Option<PathBuf>,

    /// Data directory for the LMDB environment.
    #[arg(long, env = "MIRROR_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Address the HTTP API binds to.
    #[arg(long, env = "MIRROR_RPC_HOST")]
    rpc_host: Option<IpAddr>,

    /// HTTP API port.
    #[arg(long, env = "MIRROR_RPC_PORT")]
    rpc_port: Option<u16>,

    /// Guardian identities (comma-separated). Replaces the file's list.
    #[arg(long, env = "MIRROR_GUARDIANS", value_delimiter = ',')]
    guardians: Vec<String>,

    /// Allowed CORS origins (comma-separated). Replaces the file's list.
    #[arg(long, env = "MIRROR_CORS_ORIGINS", value_delimiter = ',')]
    cors_origins: Vec<String>,

    /// Base URL of the integrity service.
    #[arg(long, env = "MIRROR_INTEGRITY_URL")]
    integrity_url: Option<String>,

    /// Seconds between sweeps for expired votes.
    #[arg(long, env = "MIRROR_RESOLVER_INTERVAL_SECS")]
    resolver_interval_secs: Option<u64>,

    /// Log format: "human" or "json".
    #[arg(long, env = "MIRROR_LOG_FORMAT")]
    log_format: Option<String>,

    /// Log level: "trace", "debug", "info", "warn", "error".
    #[arg(long, env = "MIRROR_LOG_LEVEL")]
    log_level: Option<String>,

    /// Use short voting windows and a small early-resolution quorum.
    #[arg(long, env = "MIRROR_DEV")]
    dev: bool,

    /// Subcommand.
    #[command(subcommand)]
    command: Command,
}

#[derive(clap::Subcommand)]
enum Command {
    /// Run the node.
    #[command(name = "node")]
    Node {
        #[command(subcommand)]
        action: NodeAction,
    },
    /// Inspect configuration.
    #[command(name = "config")]
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(clap::Subcommand)]
enum NodeAction {
    /// Run the node.
    Run,
}

#[derive(clap::Subcommand)]
enum ConfigAction {
    /// Print the default configuration as TOML.
    Default,
    /// Print the configuration after applying file, env and flags.
    Show,
}

impl Cli {
    fn resolve_config(&self) -> anyhow::Result<MirrorConfig> {
        let mut config = match &self.config {
            Some(path) => MirrorConfig::from_toml_file(&path.to_string_lossy())
                .with_context(|| format!("loading {}", path.display()))?,
            None => MirrorConfig::default(),
        };

        if let Some(dir) = &self.data_dir {
            config.data_dir = dir.clone();
        }
        if let Some(host) = self.rpc_host {
            config.rpc_host = host;
        }
        if let Some(port) = self.rpc_port {
            config.rpc_port = port;
        }
        if !self.guardians.is_empty() {
            config.guardians = self
                .guardians
                .iter()
                .map(|g| UserId::parse(g.trim()))
                .collect::<Result<_, _>>()
                .context("invalid --guardians entry")?;
        }
        if !self.cors_origins.is_empty() {
            config.cors_origins = self.cors_origins.clone();
        }
        if let Some(url) = &self.integrity_url {
            config.integrity_url = Some(url.clone());
        }
        if let Some(secs) = self.resolver_interval_secs {
            config.resolver_interval_secs = secs;
        }
        if let Some(format) = &self.log_format {
            config.log_format = format.parse::<LogFormat>()?;
        }
        if let Some(level) = &self.log_level {
            config.log_level = level.clone();
        }
        if self.dev {
            config.governance = config.governance.with_dev_windows();
        }

        config.validate()?;
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Command::Config { ref action } => match action {
            ConfigAction::Default => {
                print!("{}", MirrorConfig::default().to_toml_string()?);
            }
            ConfigAction::Show => {
                print!("{}", cli.resolve_config()?.to_toml_string()?);
            }
        },
        Command::Node { ref action } => match action {
            NodeAction::Run => {
                let config = cli.resolve_config()?;
                init_logging(config.log_format, &config.log_level)?;

                tracing::info!(
                    data_dir = %config.data_dir.display(),
                    rpc = %config.rpc_addr(),
                    guardians = config.guardians.len(),
                    integrity = config.integrity_url.is_some(),
                    dev = cli.dev,
                    "starting Mirror node"
                );

                let node = MirrorNode::new(config).context("starting node")?;
                node.run().await?;

                tracing::info!("Mirror daemon exited cleanly");
            }
        },
    }

    Ok(())
}
