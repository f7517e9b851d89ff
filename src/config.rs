use anyhow::{Context, Result};
use serde::Deserialize;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::debug;

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct RlmConfig {
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub embedding: EmbeddingConfig,
    pub search: SearchConfig,
    pub retention: RetentionConfig,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServerConfig {
    pub log_level: String,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct StorageConfig {
    /// Root directory holding the index files, chunks/ and archive/.
    /// A leading `~` is expanded to the home directory.
    pub context_dir: String,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct EmbeddingConfig {
    /// `"model2vec"`, `"fastembed"`, or `"auto"` (best compiled-in backend).
    pub provider: String,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct SearchConfig {
    pub default_limit: usize,
    /// Weight of the cosine signal in hybrid fusion.
    pub hybrid_alpha: f64,
    pub bm25_k1: f64,
    pub bm25_b: f64,
    pub fuzzy_threshold: u8,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct RetentionConfig {
    pub archive_after_days: i64,
    pub purge_after_days: i64,
    /// Chunks read this many times (or more) are never archived or purged.
    pub immune_access_count: u32,
}

impl Default for RlmConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            storage: StorageConfig::default(),
            embedding: EmbeddingConfig::default(),
            search: SearchConfig::default(),
            retention: RetentionConfig::default(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            log_level: "info".into(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        let context_dir = default_rlm_dir()
            .join("context")
            .to_string_lossy()
            .into_owned();
        Self { context_dir }
    }
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: "auto".into(),
        }
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            default_limit: 10,
            hybrid_alpha: 0.6,
            bm25_k1: 1.5,
            bm25_b: 0.75,
            fuzzy_threshold: 80,
        }
    }
}

impl Default for RetentionConfig {
    fn default() -> Self {
        Self {
            archive_after_days: 30,
            purge_after_days: 180,
            immune_access_count: 3,
        }
    }
}

/// Returns `~/.claude/rlm/`
pub fn default_rlm_dir() -> PathBuf {
    dirs::home_dir()
        .expect("home directory must exist")
        .join(".claude")
        .join("rlm")
}

/// Returns the default config file path: `~/.claude/rlm/config.toml`
pub fn default_config_path() -> PathBuf {
    default_rlm_dir().join("config.toml")
}

impl RlmConfig {
    /// Load config from the default TOML file, then apply env var overrides.
    pub fn load() -> Result<Self> {
        Self::load_from(default_config_path())
    }

    /// Load from a specific path. A missing file is not an error: defaults
    /// apply, and env vars override either way.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let mut config = match std::fs::read_to_string(path) {
            Ok(text) => toml::from_str(&text)
                .with_context(|| format!("invalid config TOML at {}", path.display()))?,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(path = %path.display(), "no config file, using defaults");
                Self::default()
            }
            Err(e) => {
                return Err(e).context(format!("failed to read {}", path.display()));
            }
        };

        config.apply_env_overrides();
        Ok(config)
    }

    /// Environment variables override the file:
    /// RLM_CONTEXT_DIR, RLM_LOG_LEVEL, RLM_EMBEDDING_PROVIDER.
    fn apply_env_overrides(&mut self) {
        let slots: [(&str, &mut String); 3] = [
            ("RLM_CONTEXT_DIR", &mut self.storage.context_dir),
            ("RLM_LOG_LEVEL", &mut self.server.log_level),
            ("RLM_EMBEDDING_PROVIDER", &mut self.embedding.provider),
        ];
        for (var, slot) in slots {
            if let Ok(value) = std::env::var(var) {
                *slot = value;
            }
        }
    }

    /// Storage root as a path, with `~` expanded.
    pub fn resolved_context_dir(&self) -> PathBuf {
        let raw = Path::new(&self.storage.context_dir);
        match raw.strip_prefix("~") {
            Ok(rest) => dirs::home_dir()
                .expect("home directory must exist")
                .join(rest),
            Err(_) => raw.to_path_buf(),
        }
    }
}
