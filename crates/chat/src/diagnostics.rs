//! Append-only record of fatal post failures.

use std::path::{Path, PathBuf};

use {async_trait::async_trait, tokio::io::AsyncWriteExt, tracing::debug};

use crate::{Result, error::Context};

const NO_RESPONSE_DATA: &str = "No response data";

/// Durable sink for fatal post failures.
#[async_trait]
pub trait DiagnosticLog: Send + Sync {
    /// Record one failure. `response_body` is the last body seen, if any.
    async fn record(&self, message: &str, response_body: Option<&str>) -> Result<()>;
}

/// Appends records to a text file: timestamp and message, the last response
/// body, then a blank line.
#[derive(Debug, Clone)]
pub struct FileDiagnosticLog {
    path: PathBuf,
}

impl FileDiagnosticLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Render one record in the on-disk format.
#[must_use]
pub fn format_record(
    timestamp: chrono::DateTime<chrono::Local>,
    message: &str,
    response_body: Option<&str>,
) -> String {
    format!(
        "{} {message}\r\n{}\r\n\r\n",
        timestamp.format("%Y-%m-%d %H:%M:%S"),
        response_body.unwrap_or(NO_RESPONSE_DATA)
    )
}

#[async_trait]
impl DiagnosticLog for FileDiagnosticLog {
    async fn record(&self, message: &str, response_body: Option<&str>) -> Result<()> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            tokio::fs::create_dir_all(parent)
                .await
                .with_context(|| format!("creating {}", parent.display()))?;
        }
        let record = format_record(chrono::Local::now(), message, response_body);
        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await
            .with_context(|| format!("opening {}", self.path.display()))?;
        file.write_all(record.as_bytes()).await?;
        file.flush().await?;
        debug!(path = %self.path.display(), "diagnostic record appended");
        Ok(())
    }
}
