// src/storage/mod.rs
use crate::utils::error::StorageError;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

/// A located acquisition section, ready to be persisted for reporting.
#[derive(Debug, Clone)]
pub struct ExtractionReport {
    pub cik: String,
    pub target_name: String,
    pub filing_type: String,
    pub filing_date: String,
    pub source_doc: PathBuf,
    pub source_url: String,
    pub content: String,
}

impl ExtractionReport {
    fn doc_stem(&self) -> String {
        self.source_doc
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "document".to_string())
    }
}

pub struct StorageManager {
    base_dir: PathBuf,
}

impl StorageManager {
    /// Creates a new StorageManager with the specified base directory
    pub fn new<P: AsRef<Path>>(base_dir: P) -> Result<Self, StorageError> {
        let base_path = base_dir.as_ref().to_path_buf();
        if !base_path.exists() {
            fs::create_dir_all(&base_path).map_err(StorageError::IoError)?;
        }
        Ok(Self { base_dir: base_path })
    }

    /// Saves the composed extraction text under `<base>/<cik>/`.
    pub fn save_report(&self, report: &ExtractionReport) -> Result<PathBuf, StorageError> {
        let target_dir = self.base_dir.join(&report.cik);
        if !target_dir.exists() {
            fs::create_dir_all(&target_dir).map_err(StorageError::IoError)?;
        }

        let file_path = target_dir.join(format!("{}_acquisition.txt", report.doc_stem()));
        let mut file = fs::File::create(&file_path).map_err(StorageError::IoError)?;
        file.write_all(report.content.as_bytes())
            .map_err(StorageError::IoError)?;

        tracing::info!("Saved report to {}", file_path.display());
        Ok(file_path)
    }

    /// Saves metadata about the extraction in JSON format
    pub fn save_report_metadata(&self, report: &ExtractionReport) -> Result<PathBuf, StorageError> {
        let target_dir = self.base_dir.join(&report.cik);
        if !target_dir.exists() {
            fs::create_dir_all(&target_dir).map_err(StorageError::IoError)?;
        }

        let file_path = target_dir.join(format!("{}_acquisition_meta.json", report.doc_stem()));
        let metadata = serde_json::json!({
            "cik": report.cik,
            "target_name": report.target_name,
            "filing_type": report.filing_type,
            "filing_date": report.filing_date,
            "source_doc": report.source_doc.display().to_string(),
            "source_url": report.source_url,
            "content_length": report.content.len(),
            "extraction_timestamp": chrono::Utc::now().to_rfc3339(),
        });

        let metadata_str = serde_json::to_string_pretty(&metadata)
            .map_err(|e| StorageError::SerializationError(e.to_string()))?;
        fs::write(&file_path, metadata_str).map_err(StorageError::IoError)?;

        tracing::info!("Saved metadata to {}", file_path.display());
        Ok(file_path)
    }
}
