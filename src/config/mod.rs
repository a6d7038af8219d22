#[cfg(feature = "cli")]
pub mod cli;
pub mod toml_config;

use crate::domain::model::MalformedRowPolicy;
use crate::utils::error::Result;
use crate::utils::validation::{self, Validate};
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const DEFAULT_CONFIG_PATH: &str = "conf/conf.toml";
pub const DEFAULT_TIMEOUT_SECONDS: u64 = 900;

/// Immutable configuration of one importer run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImporterConfig {
    pub origin: OriginConfig,
    pub destination: DestinationConfig,
    #[serde(default)]
    pub store: StoreSettings,
    #[serde(default)]
    pub job: JobConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OriginConfig {
    pub bucket: String,
    #[serde(default)]
    pub prefix: String,
    /// The bucket serves gzip objects decoded, so no inline gunzip is needed.
    #[serde(default)]
    pub decompressive_transcoding: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DestinationConfig {
    pub bucket: String,
    #[serde(default)]
    pub prefix: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    #[default]
    S3,
    Local,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StoreSettings {
    #[serde(default)]
    pub backend: StoreBackend,
    pub region: Option<String>,
    pub endpoint: Option<String>,
    pub force_path_style: Option<bool>,
    /// Root directory of the `local` backend.
    pub root: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobConfig {
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
    #[serde(default)]
    pub malformed_rows: MalformedRowPolicy,
}

fn default_timeout_seconds() -> u64 {
    DEFAULT_TIMEOUT_SECONDS
}

impl Default for JobConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: DEFAULT_TIMEOUT_SECONDS,
            malformed_rows: MalformedRowPolicy::default(),
        }
    }
}

impl JobConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}

impl Validate for ImporterConfig {
    fn validate(&self) -> Result<()> {
        validation::validate_bucket_name("origin.bucket", &self.origin.bucket)?;
        validation::validate_prefix("origin.prefix", &self.origin.prefix)?;
        validation::validate_bucket_name("destination.bucket", &self.destination.bucket)?;
        validation::validate_prefix("destination.prefix", &self.destination.prefix)?;

        match self.store.backend {
            StoreBackend::Local => {
                let root = validation::validate_required_field("store.root", &self.store.root)?;
                validation::validate_path("store.root", root)?;
            }
            StoreBackend::S3 => {
                if let Some(endpoint) = &self.store.endpoint {
                    validation::validate_url("store.endpoint", endpoint)?;
                }
                if let Some(region) = &self.store.region {
                    validation::validate_non_empty_string("store.region", region)?;
                }
            }
        }

        validation::validate_range("job.timeout_seconds", self.job.timeout_seconds, 1, 86_400)?;

        tracing::debug!("Configuration validation passed");
        Ok(())
    }
}
