use crate::config::ImporterConfig;
use crate::core::incremental::{destination_timestamps, files_to_process, watermark};
use crate::core::selector::select_candidates;
use crate::core::transformer::{transform_file, TransformOptions, TransformReport};
use crate::domain::model::FileMetadata;
use crate::domain::ports::ObjectStore;
use crate::utils::deadline::Deadline;
use crate::utils::error::Result;

/// Files selected for this run, oldest first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportPlan {
    pub candidates: usize,
    pub watermark: Option<String>,
    pub files: Vec<FileMetadata>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub plan: ImportPlan,
    pub reports: Vec<TransformReport>,
}

impl RunSummary {
    pub fn files_written(&self) -> usize {
        self.reports.len()
    }

    pub fn rows_written(&self) -> u64 {
        self.reports.iter().map(|r| r.rows_written).sum()
    }
}

pub struct Importer<S: ObjectStore> {
    store: S,
    config: ImporterConfig,
}

impl<S: ObjectStore> Importer<S> {
    pub fn new(store: S, config: ImporterConfig) -> Self {
        Self { store, config }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn config(&self) -> &ImporterConfig {
        &self.config
    }

    /// Selection and incremental filtering, without writing anything.
    pub async fn plan(&self, deadline: &Deadline) -> Result<ImportPlan> {
        let origin = &self.config.origin;
        let destination = &self.config.destination;

        let candidates =
            select_candidates(&self.store, &origin.bucket, &origin.prefix, deadline).await?;
        let timestamps =
            destination_timestamps(&self.store, &destination.bucket, &destination.prefix, deadline)
                .await?;

        let candidate_count = candidates.len();
        let latest = watermark(timestamps.clone());
        let mut files = files_to_process(candidates, timestamps);
        files.sort_by_key(|file| file.updated_at);

        Ok(ImportPlan {
            candidates: candidate_count,
            watermark: latest,
            files,
        })
    }

    pub async fn run(&self) -> Result<RunSummary> {
        let deadline = Deadline::after(self.config.job.timeout());
        tracing::info!(
            "Starting import from {}/{} to {}/{}",
            self.config.origin.bucket,
            self.config.origin.prefix,
            self.config.destination.bucket,
            self.config.destination.prefix
        );

        let plan = self.plan(&deadline).await?;
        if plan.files.is_empty() {
            tracing::info!("Nothing to do");
            return Ok(RunSummary {
                plan,
                reports: Vec::new(),
            });
        }

        let options = TransformOptions::from(&self.config);
        let mut reports = Vec::with_capacity(plan.files.len());
        for file in &plan.files {
            reports.push(transform_file(&self.store, &options, file, &deadline).await?);
        }

        tracing::info!("Job completed, {} file(s) written", reports.len());
        Ok(RunSummary { plan, reports })
    }

    pub async fn dry_run(&self) -> Result<ImportPlan> {
        let deadline = Deadline::after(self.config.job.timeout());
        let plan = self.plan(&deadline).await?;

        for file in &plan.files {
            tracing::info!(
                "Would process {} -> {}",
                file.name,
                file.destination_name(&self.config.destination.prefix)
            );
        }
        if plan.files.is_empty() {
            tracing::info!("Nothing to do");
        }
        Ok(plan)
    }
}
