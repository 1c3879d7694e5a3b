use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::info;

use crate::config::OutputConfig;
use crate::error::OutputError;
use crate::models::CompositeResult;

/// Paths of the documents written for one run
#[derive(Debug, Clone, Default)]
pub struct SavedFiles {
    pub summary: PathBuf,
    pub sentiment: PathBuf,
    pub soap: PathBuf,
    pub entities: PathBuf,
    pub complete: PathBuf,
}

impl SavedFiles {
    pub fn all(&self) -> [&Path; 5] {
        [
            &self.summary,
            &self.sentiment,
            &self.soap,
            &self.entities,
            &self.complete,
        ]
    }
}

/// Writes the part documents and the composite result as JSON files
#[derive(Debug, Clone)]
pub struct ResultWriter {
    config: OutputConfig,
}

impl ResultWriter {
    pub fn new(config: &OutputConfig) -> Self {
        Self {
            config: config.clone(),
        }
    }

    /// Point the writer at a different directory
    pub fn with_directory(mut self, directory: impl Into<PathBuf>) -> Self {
        self.config.directory = directory.into();
        self
    }

    pub fn directory(&self) -> &Path {
        &self.config.directory
    }

    /// Path of `filename` for the run identified by `timestamp`
    pub fn path_for(&self, timestamp: &str, filename: &str) -> PathBuf {
        self.config
            .directory
            .join(format!("{}_{}", timestamp, filename))
    }

    /// Write all five documents, creating the output directory if needed.
    ///
    /// Files are named `{timestamp}_{filename}` using the run timestamp of
    /// `result`, so a later run never overwrites an earlier one.
    pub fn save(&self, result: &CompositeResult) -> Result<SavedFiles, OutputError> {
        let dir = &self.config.directory;
        std::fs::create_dir_all(dir).map_err(|source| OutputError::CreateDir {
            path: dir.clone(),
            source,
        })?;

        let timestamp = &result.transcript_info.timestamp;
        let names = &self.config.filenames;

        let saved = SavedFiles {
            summary: self.write(timestamp, &names.summary, &result.medical_summary)?,
            sentiment: self.write(timestamp, &names.sentiment, &result.sentiment_intent)?,
            soap: self.write(timestamp, &names.soap, &result.soap_note)?,
            entities: self.write(timestamp, &names.entities, &result.entities)?,
            complete: self.write(timestamp, &names.complete, result)?,
        };

        info!("Saved results to {:?}", dir);
        Ok(saved)
    }

    fn write<T: Serialize>(
        &self,
        timestamp: &str,
        filename: &str,
        document: &T,
    ) -> Result<PathBuf, OutputError> {
        let path = self.path_for(timestamp, filename);

        let json = if self.config.pretty {
            serde_json::to_string_pretty(document)
        } else {
            serde_json::to_string(document)
        }
        .map_err(|source| OutputError::Serialize {
            name: filename.to_string(),
            source,
        })?;

        std::fs::write(&path, json).map_err(|source| OutputError::Write {
            path: path.clone(),
            source,
        })?;

        Ok(path)
    }
}
