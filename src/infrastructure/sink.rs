use async_trait::async_trait;
use std::path::PathBuf;
use tracing::info;

use crate::domain::error::SinkWriteError;
use crate::domain::ports::{SheetWriter, TabularSink};
use crate::domain::sheet::SheetDocument;
use crate::domain::value_objects::SourceName;
use crate::presentation::writers::output_path;

/// Writes one file per configured writer per source into `dir`, replacing
/// the previous run's files.
pub struct FileSheetSink {
    dir: PathBuf,
    writers: Vec<Box<dyn SheetWriter>>,
}

impl FileSheetSink {
    pub fn new(dir: impl Into<PathBuf>, writers: Vec<Box<dyn SheetWriter>>) -> Self {
        Self {
            dir: dir.into(),
            writers,
        }
    }
}

#[async_trait]
impl TabularSink for FileSheetSink {
    async fn write(&self, source: &SourceName, sheet: &SheetDocument) -> Result<(), SinkWriteError> {
        // Render everything before touching disk, so a template failure
        // leaves the previous files intact.
        let mut rendered = Vec::with_capacity(self.writers.len());
        for writer in &self.writers {
            let content = writer
                .format(source, sheet)
                .map_err(|e| SinkWriteError(format!("{} writer: {e:#}", writer.extension())))?;
            rendered.push((output_path(&self.dir, source, writer.as_ref()), content));
        }

        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| SinkWriteError(format!("{}: {e}", self.dir.display())))?;
        for (path, content) in rendered {
            tokio::fs::write(&path, content)
                .await
                .map_err(|e| SinkWriteError(format!("{}: {e}", path.display())))?;
            info!(%source, path = %path.display(), "sheet written");
        }
        Ok(())
    }
}
