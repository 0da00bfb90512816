// Store configuration loaded from config.yaml

use crate::file::FileBackend;
use crate::kv::{KvBackend, MemoryBackend};
use crate::sqlite::SqliteBackend;
use crate::store::DEFAULT_KEY;
use eyre::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::debug;

pub const CONFIG_FILE: &str = "config.yaml";

/// Which key-value backend holds the collection
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    #[default]
    Sqlite,
    File,
    Memory,
}

impl BackendKind {
    /// Whether stored items outlive the process
    pub fn is_durable(self) -> bool {
        !matches!(self, BackendKind::Memory)
    }
}

impl FromStr for BackendKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sqlite" => Ok(BackendKind::Sqlite),
            "file" => Ok(BackendKind::File),
            "memory" => Ok(BackendKind::Memory),
            other => Err(format!("unknown backend: {} (expected sqlite, file or memory)", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub backend: BackendKind,
    /// Storage key of the serialized collection
    pub key: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            backend: BackendKind::default(),
            key: DEFAULT_KEY.to_string(),
        }
    }
}

impl Config {
    /// Read `config.yaml` from the store directory, defaults if it is missing
    pub fn load(store_path: &Path) -> Result<Self> {
        let path = store_path.join(CONFIG_FILE);
        if !path.exists() {
            debug!(path = ?path, "No config file, using defaults");
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&path).with_context(|| format!("Failed to read {}", path.display()))?;
        let config: Config =
            serde_yaml::from_str(&content).with_context(|| format!("Failed to parse {}", path.display()))?;
        debug!(path = ?path, ?config, "Loaded config");
        Ok(config)
    }

    /// Open the configured backend rooted at `store_path`
    pub fn open_backend(&self, store_path: &Path) -> Result<Box<dyn KvBackend>> {
        let backend: Box<dyn KvBackend> = match self.backend {
            BackendKind::Sqlite => Box::new(SqliteBackend::open(store_path)?),
            BackendKind::File => Box::new(FileBackend::open(store_path)?),
            BackendKind::Memory => Box::new(MemoryBackend::new()),
        };
        Ok(backend)
    }
}

/// Platform data directory for the store, falling back to the current directory
pub fn default_store_path() -> PathBuf {
    dirs::data_dir()
        .map(|dir| dir.join("wishstore"))
        .unwrap_or_else(|| PathBuf::from(".wishstore"))
}
