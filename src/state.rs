use crate::commands::ToyCommandProcessor;
use crate::config::{ServerConfig, StoreKind};
use crate::model::{ToyRecord, UserRecord};
use crate::queries::ToyQueryProcessor;
use crate::store::{
    self, DocumentStore, InMemoryDocumentStore, MongoDocumentStore, TOYS_COLLECTION,
    USERS_COLLECTION,
};
use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use tracing::info;

/// Shared handles for request handlers
#[derive(Clone)]
pub struct AppState {
    store: Arc<dyn DocumentStore>,
    queries: ToyQueryProcessor,
    commands: ToyCommandProcessor,
}

impl AppState {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            queries: ToyQueryProcessor::new(store.clone()),
            commands: ToyCommandProcessor::new(store.clone()),
            store,
        }
    }

    /// Replace the command processor, e.g. to inject a deterministic id source.
    pub fn with_commands(mut self, commands: ToyCommandProcessor) -> Self {
        self.commands = commands;
        self
    }

    pub fn from_config(config: &ServerConfig) -> Result<Self> {
        let store: Arc<dyn DocumentStore> = match config.store {
            StoreKind::Mongo => {
                let settings = config
                    .mongo
                    .clone()
                    .context("mongo store selected without connection settings")?;
                Arc::new(MongoDocumentStore::new(settings))
            }
            StoreKind::Memory => {
                let memory = match config.seed_file.as_deref() {
                    Some(path) => load_seed_fixture(path)?,
                    None => InMemoryDocumentStore::new(),
                };
                Arc::new(memory)
            }
        };
        info!(backend = store.backend_name(), "document store configured");
        Ok(Self::new(store))
    }

    pub fn store(&self) -> &Arc<dyn DocumentStore> {
        &self.store
    }

    pub fn queries(&self) -> &ToyQueryProcessor {
        &self.queries
    }

    pub fn commands(&self) -> &ToyCommandProcessor {
        &self.commands
    }
}

/// Fixture file layout: `{"toys": [...], "users": [...]}`
#[derive(Debug, Default, Deserialize)]
struct SeedFixture {
    #[serde(default)]
    toys: Vec<ToyRecord>,
    #[serde(default)]
    users: Vec<UserRecord>,
}

/// Build a memory store preloaded with validated toys and users.
pub fn load_seed_fixture(path: &Path) -> Result<InMemoryDocumentStore> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("failed to read seed file {:?}", path))?;
    let fixture: SeedFixture = serde_json::from_str(&contents)
        .with_context(|| format!("invalid seed file {:?}", path))?;

    if let Some(unnamed) = fixture.toys.iter().position(|toy| toy.toy_id.is_empty()) {
        anyhow::bail!("seed toy #{unnamed} in {:?} has no toy_id", path);
    }

    let toys = fixture
        .toys
        .iter()
        .map(store::to_document)
        .collect::<Result<Vec<_>, _>>()?;
    let users = fixture
        .users
        .iter()
        .map(store::to_document)
        .collect::<Result<Vec<_>, _>>()?;

    info!(
        toys = toys.len(),
        users = users.len(),
        seed = %path.display(),
        "seeding memory store"
    );
    Ok(InMemoryDocumentStore::new()
        .with_documents(TOYS_COLLECTION, toys)
        .with_documents(USERS_COLLECTION, users))
}
