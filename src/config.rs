//! Engine configuration: TOML files, then environment, then defaults.
//!
//! Precedence (highest first): explicit CLI flags, environment variables, the first
//! config file that sets a key, built-in defaults.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::errors::BulkError;
use crate::executor::ExecutorConfig;
use crate::retry::RetryPolicy;

pub const CONFIG_ENV: &str = "NEXUS_BULK_CONFIG";
const CONFIG_FILE_NAME: &str = "nexus-bulk.toml";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BulkConfig {
    pub batch_size: usize,
    pub max_retries: u32,
    pub retry_delay_ms: u64,
    pub inter_batch_pause_ms: u64,
    pub enable_undo: bool,
    pub dry_run: bool,
    pub data_file: Option<PathBuf>,
    pub default_collection: Option<String>,
    pub log_dir: Option<PathBuf>,
    pub log_level: Option<String>,
}

impl Default for BulkConfig {
    fn default() -> Self {
        Self {
            batch_size: 500,
            max_retries: 3,
            retry_delay_ms: 1000,
            inter_batch_pause_ms: 100,
            enable_undo: false,
            dry_run: false,
            data_file: None,
            default_collection: None,
            log_dir: None,
            log_level: None,
        }
    }
}

/// Same shape as [`BulkConfig`] with every key optional, so files can be layered.
#[derive(Debug, Clone, Default, Deserialize)]
struct PartialConfig {
    batch_size: Option<usize>,
    max_retries: Option<u32>,
    retry_delay_ms: Option<u64>,
    inter_batch_pause_ms: Option<u64>,
    enable_undo: Option<bool>,
    dry_run: Option<bool>,
    data_file: Option<PathBuf>,
    default_collection: Option<String>,
    log_dir: Option<PathBuf>,
    log_level: Option<String>,
}

impl PartialConfig {
    // Keys already set win; `other` only fills gaps.
    fn fill_from(&mut self, other: Self) {
        macro_rules! fill {
            ($($k:ident),*) => { $( if self.$k.is_none() { self.$k = other.$k; } )* };
        }
        fill!(
            batch_size,
            max_retries,
            retry_delay_ms,
            inter_batch_pause_ms,
            enable_undo,
            dry_run,
            data_file,
            default_collection,
            log_dir,
            log_level
        );
    }

    fn from_env_with<F: Fn(&str) -> Option<String>>(get: F) -> Self {
        let parse_bool = |s: String| matches!(s.to_ascii_lowercase().as_str(), "1" | "true" | "yes");
        Self {
            batch_size: get("NEXUS_BULK_BATCH_SIZE").and_then(|s| s.parse().ok()),
            max_retries: get("NEXUS_BULK_MAX_RETRIES").and_then(|s| s.parse().ok()),
            retry_delay_ms: get("NEXUS_BULK_RETRY_DELAY_MS").and_then(|s| s.parse().ok()),
            inter_batch_pause_ms: get("NEXUS_BULK_PAUSE_MS").and_then(|s| s.parse().ok()),
            enable_undo: get("NEXUS_BULK_ENABLE_UNDO").map(parse_bool),
            dry_run: get("NEXUS_BULK_DRY_RUN").map(parse_bool),
            data_file: get("NEXUS_BULK_DATA").map(PathBuf::from),
            default_collection: get("NEXUS_BULK_DEFAULT_COLLECTION"),
            log_dir: get("NEXUS_BULK_LOG_DIR").map(PathBuf::from),
            log_level: get("NEXUS_BULK_LOG_LEVEL"),
        }
    }

    fn resolve(self) -> BulkConfig {
        let d = BulkConfig::default();
        BulkConfig {
            batch_size: self.batch_size.unwrap_or(d.batch_size),
            max_retries: self.max_retries.unwrap_or(d.max_retries),
            retry_delay_ms: self.retry_delay_ms.unwrap_or(d.retry_delay_ms),
            inter_batch_pause_ms: self.inter_batch_pause_ms.unwrap_or(d.inter_batch_pause_ms),
            enable_undo: self.enable_undo.unwrap_or(d.enable_undo),
            dry_run: self.dry_run.unwrap_or(d.dry_run),
            data_file: self.data_file,
            default_collection: self.default_collection,
            log_dir: self.log_dir,
            log_level: self.log_level,
        }
    }
}

impl BulkConfig {
    /// Parses one TOML document; missing keys take defaults.
    ///
    /// # Errors
    /// Returns [`BulkError::Toml`] on malformed input.
    pub fn from_toml_str(s: &str) -> Result<Self, BulkError> {
        Ok(toml::from_str::<PartialConfig>(s)?.resolve())
    }

    /// Candidate config files, highest priority first.
    pub fn search_paths(explicit: Option<&Path>) -> Vec<PathBuf> {
        let mut paths = Vec::new();
        if let Some(p) = explicit {
            paths.push(p.to_path_buf());
        }
        if let Ok(p) = std::env::var(CONFIG_ENV) {
            paths.push(PathBuf::from(p));
        }
        if let Some(dir) = dirs_next::config_dir() {
            paths.push(dir.join(CONFIG_FILE_NAME));
        }
        if let Ok(cur) = std::env::current_dir() {
            paths.push(cur.join(CONFIG_FILE_NAME));
        }
        paths
    }

    /// Loads configuration from the environment and the files in `paths`.
    ///
    /// # Errors
    /// Returns an error if an existing file cannot be read or parsed.
    pub fn load_from(paths: &[PathBuf]) -> Result<Self, BulkError> {
        Self::load_with(paths, |k| std::env::var(k).ok())
    }

    /// Like [`Self::load_from`] with an injectable environment lookup.
    ///
    /// # Errors
    /// Returns an error if an existing file cannot be read or parsed.
    pub fn load_with<F>(paths: &[PathBuf], env: F) -> Result<Self, BulkError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut merged = PartialConfig::from_env_with(env);
        for p in paths {
            if !p.exists() {
                continue;
            }
            let text = std::fs::read_to_string(p)?;
            let file_cfg: PartialConfig = toml::from_str(&text)?;
            log::debug!("config file {} loaded", p.display());
            merged.fill_from(file_cfg);
        }
        let cfg = merged.resolve();
        cfg.validate()?;
        Ok(cfg)
    }

    /// # Errors
    /// Returns [`BulkError::Config`] when `batch_size` is zero.
    pub fn validate(&self) -> Result<(), BulkError> {
        if self.batch_size == 0 {
            return Err(BulkError::Config("batch_size must be at least 1".into()));
        }
        Ok(())
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }

    pub fn executor(&self) -> ExecutorConfig {
        ExecutorConfig {
            retry: RetryPolicy::new(self.max_retries, self.retry_delay()),
            inter_batch_pause: Duration::from_millis(self.inter_batch_pause_ms),
        }
    }
}
