//! Server-side configuration, loaded from a TOML file.
//!
//! The config name resolves to `/etc/shiperp/<name>.toml`; a value
//! containing `/` or `.` is treated as a direct path.

use std::path::{Path, PathBuf};

use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub storage: StorageConfig,

    #[serde(default)]
    pub rates: RatesSection,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// Directory holding the SQLite database.
    pub data_dir: String,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct RatesSection {
    /// Shipments to this country are domestic: no duty estimation.
    #[serde(default)]
    pub home_country: Option<String>,

    /// Optional flat-rate duty estimator. Absent means duty estimation
    /// reports unavailable and quotes carry shipping prices only.
    #[serde(default)]
    pub flat_duty: Option<FlatDutyConfig>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FlatDutyConfig {
    pub duty_rate_bps: i64,
    pub tax_rate_bps: i64,
}

impl ServerConfig {
    /// Resolve a context name or path to a config file path.
    pub fn resolve_path(name_or_path: &str) -> PathBuf {
        if name_or_path.contains('/') || name_or_path.contains('.') {
            PathBuf::from(name_or_path)
        } else {
            PathBuf::from(format!("/etc/shiperp/{name_or_path}.toml"))
        }
    }

    /// Load configuration from disk.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("cannot read {}: {}", path.display(), e))?;
        let config: ServerConfig = toml::from_str(&content)?;
        Ok(config)
    }
}
