use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::error::{ImportExportError, Result};
use crate::ingest::RawTrace;

pub mod csv;
pub mod gpx;
pub mod json;
pub mod tcx;

/// Trait for decoding activity files into raw sample records
pub trait ImportFormat: Send + Sync {
    /// Check if this importer can handle the given file
    fn can_import(&self, file_path: &Path) -> bool;

    /// Decode file content into a raw trace
    fn parse(&self, content: &str) -> Result<RawTrace>;

    /// Read and decode a file. The file stem names the trace when the
    /// content carries no name.
    fn import_file(&self, file_path: &Path) -> Result<RawTrace> {
        let content = fs::read_to_string(file_path)?;
        let mut raw = self.parse(&content)?;

        if raw.name.is_none() {
            raw.name = file_path
                .file_stem()
                .map(|stem| stem.to_string_lossy().to_string());
        }

        debug!(
            file = %file_path.display(),
            format = self.format_name(),
            samples = raw.samples.len(),
            "Decoded activity file"
        );

        Ok(raw)
    }

    /// Get the format name for this importer
    fn format_name(&self) -> &'static str;
}

/// Case-insensitive extension check shared by the importers
pub(crate) fn has_extension(file_path: &Path, expected: &str) -> bool {
    file_path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case(expected))
        .unwrap_or(false)
}

/// Manager for coordinating different import formats
pub struct ImportManager {
    importers: Vec<Box<dyn ImportFormat>>,
}

impl ImportManager {
    /// Create a new import manager with all available importers
    pub fn new() -> Self {
        let importers: Vec<Box<dyn ImportFormat>> = vec![
            Box::new(csv::CsvImporter::new()),
            Box::new(tcx::TcxImporter::new()),
            Box::new(gpx::GpxImporter::new()),
            Box::new(json::JsonImporter::new()),
        ];

        Self { importers }
    }

    /// Importer responsible for a path, if any
    pub fn importer_for(&self, file_path: &Path) -> Option<&dyn ImportFormat> {
        self.importers
            .iter()
            .find(|importer| importer.can_import(file_path))
            .map(|importer| importer.as_ref())
    }

    /// Import a single file, auto-detecting the format
    pub fn import_file(&self, file_path: &Path) -> Result<RawTrace> {
        let importer = self.importer_for(file_path).ok_or_else(|| {
            ImportExportError::UnsupportedFormat {
                format: file_path
                    .extension()
                    .map(|ext| ext.to_string_lossy().to_string())
                    .unwrap_or_else(|| file_path.display().to_string()),
            }
        })?;

        info!(
            file = %file_path.display(),
            format = importer.format_name(),
            "Importing activity"
        );
        importer.import_file(file_path)
    }

    /// Collect all files in a directory that can be imported, sorted by path
    pub fn collect_importable_files(&self, dir_path: &Path) -> Result<Vec<PathBuf>> {
        if !dir_path.is_dir() {
            return Err(ImportExportError::MissingData {
                field: format!("directory {}", dir_path.display()),
            }
            .into());
        }

        let mut files = Vec::new();
        for entry in fs::read_dir(dir_path)? {
            let path = entry?.path();
            if path.is_file() && self.can_import_file(&path) {
                files.push(path);
            }
        }
        files.sort();

        Ok(files)
    }

    /// Check if this manager can import a given file
    pub fn can_import_file(&self, file_path: &Path) -> bool {
        self.importers.iter().any(|importer| importer.can_import(file_path))
    }
}

impl Default for ImportManager {
    fn default() -> Self {
        Self::new()
    }
}
