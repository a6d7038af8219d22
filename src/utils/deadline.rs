use crate::utils::error::{ImporterError, Result};
use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;

/// One deadline shared by every store call of a run.
#[derive(Debug, Clone, Copy)]
pub struct Deadline {
    at: Instant,
}

impl Deadline {
    pub fn after(timeout: Duration) -> Self {
        Self {
            at: Instant::now() + timeout,
        }
    }

    pub fn remaining(&self) -> Duration {
        self.at.saturating_duration_since(Instant::now())
    }

    pub async fn run<T, F>(&self, operation: &str, fut: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        match tokio::time::timeout_at(self.at, fut).await {
            Ok(result) => result,
            Err(_) => Err(ImporterError::Timeout {
                operation: operation.to_string(),
            }),
        }
    }
}
