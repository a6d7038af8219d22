pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::cli::CliArgs;
pub use config::ImporterConfig;

pub use adapters::{AnyStore, LocalStore, MemoryStore};
pub use core::importer::{ImportPlan, Importer, RunSummary};
pub use core::transformer::TransformReport;
pub use utils::error::{ImporterError, Result};
