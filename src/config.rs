//! Configuration loading

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;

use crate::store::{FirestoreStore, InMemoryRequestStore, RequestStore};

/// Default collection requests are written to.
pub const DEFAULT_COLLECTION: &str = "requests";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub store: StoreConfig,

    #[serde(default)]
    pub log: LogConfig,
}

/// Which backend receives submitted requests.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "backend", rename_all = "kebab-case")]
pub enum StoreConfig {
    #[default]
    InMemory,
    Firestore {
        project_id: String,
        #[serde(default = "default_collection")]
        collection: String,
        #[serde(default)]
        api_key: Option<String>,
        #[serde(default)]
        base_url: Option<String>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogConfig {
    /// Directive used when `RUST_LOG` is unset.
    #[serde(default = "default_filter")]
    pub filter: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            filter: default_filter(),
        }
    }
}

fn default_collection() -> String {
    DEFAULT_COLLECTION.to_string()
}

fn default_filter() -> String {
    "info,credit_request=debug".to_string()
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading config file {}", path.display()))?;
        Self::from_toml_str(&content).with_context(|| format!("parsing {}", path.display()))
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Like [`Config::from_toml_file`], but a missing file yields the defaults.
    pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if path.exists() {
            Self::from_toml_file(path)
        } else {
            Ok(Self::default())
        }
    }
}

impl StoreConfig {
    pub fn name(&self) -> &'static str {
        match self {
            StoreConfig::InMemory => "in-memory",
            StoreConfig::Firestore { .. } => "firestore",
        }
    }

    pub fn build(&self) -> Arc<dyn RequestStore> {
        match self {
            StoreConfig::InMemory => Arc::new(InMemoryRequestStore::new()),
            StoreConfig::Firestore {
                project_id,
                collection,
                api_key,
                base_url,
            } => {
                let mut store = FirestoreStore::new(project_id, collection);
                if let Some(url) = base_url {
                    store = store.with_base_url(url);
                }
                if let Some(key) = api_key {
                    store = store.with_api_key(key);
                }
                Arc::new(store)
            }
        }
    }
}
