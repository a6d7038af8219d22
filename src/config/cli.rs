use crate::config::{ImporterConfig, DEFAULT_CONFIG_PATH};
use clap::Parser;
use std::path::PathBuf;

#[derive(Debug, Clone, Parser)]
#[command(name = "file-service-importer")]
#[command(about = "Imports completed CSV archives from an origin bucket into a normalized destination layout")]
pub struct CliArgs {
    #[arg(long, default_value = DEFAULT_CONFIG_PATH)]
    pub config: PathBuf,

    #[arg(long)]
    pub origin_bucket: Option<String>,

    #[arg(long)]
    pub origin_prefix: Option<String>,

    #[arg(long)]
    pub destination_bucket: Option<String>,

    #[arg(long)]
    pub destination_prefix: Option<String>,

    #[arg(long, help = "Select and filter files without writing anything")]
    pub dry_run: bool,

    #[arg(long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Emit logs as JSON lines")]
    pub json_logs: bool,
}

impl CliArgs {
    /// Command line values take precedence over the file.
    pub fn apply_overrides(&self, config: &mut ImporterConfig) {
        if let Some(bucket) = &self.origin_bucket {
            config.origin.bucket = bucket.clone();
        }
        if let Some(prefix) = &self.origin_prefix {
            config.origin.prefix = prefix.clone();
        }
        if let Some(bucket) = &self.destination_bucket {
            config.destination.bucket = bucket.clone();
        }
        if let Some(prefix) = &self.destination_prefix {
            config.destination.prefix = prefix.clone();
        }
    }
}
