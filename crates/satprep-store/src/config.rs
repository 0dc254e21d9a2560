//! Store configuration and factory.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use satprep_core::parser::load_test_directory;
use satprep_core::traits::Store;

use crate::file::FileStore;
use crate::http::HttpStore;
use crate::memory::MemoryStore;

/// Name of the store used when nothing is configured.
pub const BUILTIN_STORE: &str = "local";

/// Configuration for a single store.
///
/// Debug output masks the HTTP token.
#[derive(Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum StoreConfig {
    File {
        #[serde(default = "default_tests_dir")]
        tests_dir: PathBuf,
        #[serde(default = "default_results_dir")]
        results_dir: PathBuf,
    },
    Http {
        base_url: String,
        #[serde(default)]
        token: Option<String>,
        #[serde(default)]
        timeout_secs: Option<u64>,
    },
    Memory {
        /// Optional directory of test files to preload.
        #[serde(default)]
        tests_dir: Option<PathBuf>,
    },
}

impl std::fmt::Debug for StoreConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreConfig::File {
                tests_dir,
                results_dir,
            } => f
                .debug_struct("File")
                .field("tests_dir", tests_dir)
                .field("results_dir", results_dir)
                .finish(),
            StoreConfig::Http {
                base_url,
                token,
                timeout_secs,
            } => f
                .debug_struct("Http")
                .field("base_url", base_url)
                .field("token", &token.as_ref().map(|_| "***"))
                .field("timeout_secs", timeout_secs)
                .finish(),
            StoreConfig::Memory { tests_dir } => f
                .debug_struct("Memory")
                .field("tests_dir", tests_dir)
                .finish(),
        }
    }
}

fn default_tests_dir() -> PathBuf {
    PathBuf::from("tests")
}

fn default_results_dir() -> PathBuf {
    PathBuf::from("satprep-results")
}

/// Top-level satprep configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SatprepConfig {
    /// Store configurations keyed by name.
    #[serde(default)]
    pub stores: HashMap<String, StoreConfig>,
    /// Store used when none is named.
    #[serde(default = "default_store")]
    pub default_store: String,
    /// Max attempts graded concurrently.
    #[serde(default = "default_parallelism")]
    pub parallelism: usize,
    /// Retries on transient store errors.
    #[serde(default = "default_retries")]
    pub max_retries: u32,
    /// Initial delay between retries in milliseconds.
    #[serde(default = "default_retry_delay")]
    pub retry_delay_ms: u64,
    /// Where rendered reports are written.
    #[serde(default = "default_results_dir")]
    pub output_dir: PathBuf,
}

fn default_store() -> String {
    BUILTIN_STORE.to_string()
}
fn default_parallelism() -> usize {
    4
}
fn default_retries() -> u32 {
    3
}
fn default_retry_delay() -> u64 {
    500
}

impl Default for SatprepConfig {
    fn default() -> Self {
        Self {
            stores: HashMap::new(),
            default_store: default_store(),
            parallelism: default_parallelism(),
            max_retries: default_retries(),
            retry_delay_ms: default_retry_delay(),
            output_dir: default_results_dir(),
        }
    }
}

impl SatprepConfig {
    /// Look up a store by name, falling back to the default store.
    ///
    /// The built-in `local` store reads `./tests` and writes to `output_dir`
    /// unless a `[stores.local]` table overrides it.
    pub fn store(&self, name: Option<&str>) -> Result<(String, StoreConfig)> {
        let name = name.unwrap_or(&self.default_store);
        if let Some(config) = self.stores.get(name) {
            return Ok((name.to_string(), config.clone()));
        }
        if name == BUILTIN_STORE {
            return Ok((
                name.to_string(),
                StoreConfig::File {
                    tests_dir: default_tests_dir(),
                    results_dir: self.output_dir.clone(),
                },
            ));
        }

        let mut known: Vec<&str> = self.stores.keys().map(String::as_str).collect();
        known.sort_unstable();
        anyhow::bail!(
            "store '{name}' not configured (available: {})",
            if known.is_empty() {
                BUILTIN_STORE.to_string()
            } else {
                known.join(", ")
            }
        )
    }
}

/// Resolve environment variable references like `${VAR_NAME}` in a string.
///
/// Unset variables expand to an empty string.
fn resolve_env_vars(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    let mut rest = s;
    while let Some(start) = rest.find("${") {
        let Some(end) = rest[start..].find('}') else {
            break;
        };
        result.push_str(&rest[..start]);
        let var_name = &rest[start + 2..start + end];
        result.push_str(&std::env::var(var_name).unwrap_or_default());
        rest = &rest[start + end + 1..];
    }
    result.push_str(rest);
    result
}

fn resolve_path(p: &Path) -> PathBuf {
    PathBuf::from(resolve_env_vars(&p.to_string_lossy()))
}

fn resolve_store_config(config: &StoreConfig) -> StoreConfig {
    match config {
        StoreConfig::File {
            tests_dir,
            results_dir,
        } => StoreConfig::File {
            tests_dir: resolve_path(tests_dir),
            results_dir: resolve_path(results_dir),
        },
        StoreConfig::Http {
            base_url,
            token,
            timeout_secs,
        } => StoreConfig::Http {
            base_url: resolve_env_vars(base_url),
            token: token.as_ref().map(|t| resolve_env_vars(t)),
            timeout_secs: *timeout_secs,
        },
        StoreConfig::Memory { tests_dir } => StoreConfig::Memory {
            tests_dir: tests_dir.as_deref().map(resolve_path),
        },
    }
}

/// Load configuration from well-known paths.
///
/// Search order:
/// 1. `satprep.toml` in the current directory
/// 2. `~/.config/satprep/config.toml`
///
/// `SATPREP_STORE_TOKEN` overrides the token of every HTTP store.
pub fn load_config() -> Result<SatprepConfig> {
    load_config_from(None)
}

/// Load config from an explicit path, or search the default locations.
pub fn load_config_from(path: Option<&Path>) -> Result<SatprepConfig> {
    let config_path = match path {
        Some(p) if p.exists() => Some(p.to_path_buf()),
        Some(p) => anyhow::bail!("config file not found: {}", p.display()),
        None => {
            let local = PathBuf::from("satprep.toml");
            if local.exists() {
                Some(local)
            } else {
                dirs_path()
                    .map(|home| home.join("config.toml"))
                    .filter(|global| global.exists())
            }
        }
    };

    let mut config = match config_path {
        Some(path) => {
            let content = std::fs::read_to_string(&path)
                .with_context(|| format!("failed to read config: {}", path.display()))?;
            let config = parse_config(&content)
                .with_context(|| format!("failed to parse config: {}", path.display()))?;
            tracing::debug!("loaded config from {}", path.display());
            config
        }
        None => SatprepConfig::default(),
    };

    if let Ok(token) = std::env::var("SATPREP_STORE_TOKEN") {
        apply_token_override(&mut config, &token);
    }

    Ok(config)
}

/// Parse a config document and expand `${VAR}` references in store tables.
pub fn parse_config(content: &str) -> Result<SatprepConfig> {
    let mut config: SatprepConfig = toml::from_str(content)?;
    config.stores = config
        .stores
        .iter()
        .map(|(k, v)| (k.clone(), resolve_store_config(v)))
        .collect();
    config.output_dir = resolve_path(&config.output_dir);
    Ok(config)
}

fn apply_token_override(config: &mut SatprepConfig, value: &str) {
    for store in config.stores.values_mut() {
        if let StoreConfig::Http { token, .. } = store {
            *token = Some(value.to_string());
        }
    }
}

fn dirs_path() -> Option<PathBuf> {
    std::env::var("HOME")
        .ok()
        .map(|h| PathBuf::from(h).join(".config").join("satprep"))
}

/// Create a store instance from its configuration.
pub fn create_store(name: &str, config: &StoreConfig) -> Result<Arc<dyn Store>> {
    let store: Arc<dyn Store> = match config {
        StoreConfig::File {
            tests_dir,
            results_dir,
        } => Arc::new(FileStore::new(tests_dir, results_dir)),
        StoreConfig::Http {
            base_url,
            token,
            timeout_secs,
        } => {
            if base_url.is_empty() {
                anyhow::bail!("store '{name}': base_url is empty");
            }
            Arc::new(
                HttpStore::new(base_url, token.clone(), *timeout_secs)
                    .with_context(|| format!("store '{name}'"))?,
            )
        }
        StoreConfig::Memory { tests_dir } => {
            let tests = match tests_dir {
                Some(dir) => load_test_directory(dir)
                    .with_context(|| format!("store '{name}': failed to preload tests"))?,
                None => Vec::new(),
            };
            Arc::new(MemoryStore::new(tests))
        }
    };
    tracing::debug!(store = name, kind = store.name(), "created store");
    Ok(store)
}
