use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use serde::{Deserialize, Serialize};
use std::fs;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use crate::store::mongo::{DEFAULT_DATABASE, MongoSettings};

const DEFAULT_HTTP_BIND: &str = "127.0.0.1:8000";

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreKind {
    #[value(alias = "mongodb")]
    #[serde(alias = "mongodb")]
    Mongo,
    Memory,
}

impl std::fmt::Display for StoreKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreKind::Mongo => write!(f, "mongo"),
            StoreKind::Memory => write!(f, "memory"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub store: StoreKind,
    /// Present exactly when `store` is `Mongo`
    pub mongo: Option<MongoSettings>,
    pub http_bind_address: SocketAddr,
    /// Fixture loaded into the memory store at startup
    pub seed_file: Option<PathBuf>,
}

impl ServerConfig {
    pub fn from_args(args: CliArgs) -> Result<Self> {
        let CliArgs {
            config,
            store: cli_store,
            db_host: cli_db_host,
            db_port: cli_db_port,
            db_name: cli_db_name,
            http_bind: cli_http_bind,
            seed: cli_seed,
        } = args;

        let file_config = if let Some(path) = config.as_ref() {
            load_config_file(path)?
        } else {
            PartialConfig::default()
        };

        let PartialConfig {
            store: file_store,
            db_host: file_db_host,
            db_port: file_db_port,
            db_name: file_db_name,
            http_bind: file_http_bind,
            seed: file_seed,
        } = file_config;

        let store = cli_store.or(file_store).unwrap_or(StoreKind::Mongo);

        let mongo = match store {
            StoreKind::Mongo => {
                let host = cli_db_host
                    .or(file_db_host)
                    .map(|host| host.trim().to_string())
                    .filter(|host| !host.is_empty())
                    .context("DB_HOST must be set when using the mongo store")?;
                let port = cli_db_port
                    .or(file_db_port)
                    .context("DB_PORT must be set when using the mongo store")?;
                let database = cli_db_name
                    .or(file_db_name)
                    .unwrap_or_else(|| DEFAULT_DATABASE.to_string());
                Some(MongoSettings {
                    host,
                    port,
                    database,
                    server_selection_timeout: None,
                })
            }
            StoreKind::Memory => None,
        };

        let http_bind_address = match cli_http_bind.or(file_http_bind) {
            Some(addr) => addr,
            None => DEFAULT_HTTP_BIND
                .parse()
                .context("default bind address is invalid")?,
        };

        let seed_file = cli_seed.or(file_seed);

        Ok(Self {
            store,
            mongo,
            http_bind_address,
            seed_file,
        })
    }

    /// Fail fast on combinations that cannot start.
    pub fn validate(&self) -> Result<()> {
        match self.store {
            StoreKind::Mongo => {
                let mongo = self
                    .mongo
                    .as_ref()
                    .context("mongo store selected without connection settings")?;
                anyhow::ensure!(mongo.port != 0, "DB_PORT must not be 0");
                anyhow::ensure!(
                    !mongo.database.trim().is_empty(),
                    "database name must not be empty"
                );
                anyhow::ensure!(
                    self.seed_file.is_none(),
                    "seed fixtures are only supported with the memory store"
                );
            }
            StoreKind::Memory => {
                if let Some(seed) = self.seed_file.as_ref() {
                    anyhow::ensure!(seed.is_file(), "seed file {:?} does not exist", seed);
                }
            }
        }
        Ok(())
    }
}

#[derive(Parser, Debug, Default, Clone)]
#[command(name = "toybox", about = "My Little ToyBox HTTP service", version)]
pub struct CliArgs {
    #[arg(
        long,
        value_name = "FILE",
        help = "Path to a configuration file (YAML or JSON)",
        global = true
    )]
    pub config: Option<PathBuf>,

    #[arg(
        long,
        env = "TOYBOX_STORE",
        value_enum,
        value_name = "STORE",
        help = "Document store backend (mongo or memory)"
    )]
    pub store: Option<StoreKind>,

    #[arg(
        long,
        env = "DB_HOST",
        value_name = "HOST",
        help = "Document store host"
    )]
    pub db_host: Option<String>,

    #[arg(
        long,
        env = "DB_PORT",
        value_name = "PORT",
        help = "Document store port",
        value_parser = clap::value_parser!(u16)
    )]
    pub db_port: Option<u16>,

    #[arg(
        long,
        env = "DB_NAME",
        value_name = "NAME",
        help = "Database holding the toys and users collections"
    )]
    pub db_name: Option<String>,

    #[arg(
        long,
        env = "TOYBOX_HTTP_BIND",
        value_name = "ADDR",
        help = "HTTP bind address"
    )]
    pub http_bind: Option<SocketAddr>,

    #[arg(
        long,
        env = "TOYBOX_SEED_FILE",
        value_name = "FILE",
        help = "JSON fixture with toys and users to preload into the memory store"
    )]
    pub seed: Option<PathBuf>,
}

#[derive(Debug, Default, Deserialize)]
struct PartialConfig {
    store: Option<StoreKind>,
    db_host: Option<String>,
    db_port: Option<u16>,
    db_name: Option<String>,
    http_bind: Option<SocketAddr>,
    seed: Option<PathBuf>,
}

fn load_config_file(path: &Path) -> Result<PartialConfig> {
    if !path.exists() {
        anyhow::bail!("config file {:?} does not exist", path);
    }
    let contents = fs::read_to_string(path)
        .with_context(|| format!("failed to read config file {:?}", path))?;
    let ext = path
        .extension()
        .and_then(|os| os.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    let parsed = match ext.as_str() {
        "yaml" | "yml" => serde_yaml::from_str(&contents)
            .with_context(|| format!("failed to parse YAML config {:?}", path))?,
        "json" => serde_json::from_str(&contents)
            .with_context(|| format!("failed to parse JSON config {:?}", path))?,
        other => anyhow::bail!("unsupported config extension: {other}"),
    };
    Ok(parsed)
}
