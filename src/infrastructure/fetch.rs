use async_trait::async_trait;
use tracing::debug;

use crate::domain::error::BatchError;
use crate::domain::ports::PageFetcher;
use crate::domain::value_objects::SourceName;

/// Reads payloads saved to disk by whatever downloads them (cron + curl, a
/// headless browser, ...). Any I/O failure is an unreachable upstream.
#[derive(Debug, Clone, Default)]
pub struct FilePageFetcher;

impl FilePageFetcher {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl PageFetcher for FilePageFetcher {
    async fn fetch(&self, source: &SourceName, location: &str) -> Result<Vec<u8>, BatchError> {
        debug!(%source, location, "reading payload");
        tokio::fs::read(location)
            .await
            .map_err(|e| BatchError::Unreachable(format!("{location}: {e}")))
    }
}
