//! Resource loading utilities
//!
//! This module reads schema files from disk: extension check, size limit
//! and UTF-8 decoding happen here, before any parsing.

use crate::error::{Error, Result};
use crate::limits::Limits;
use serde::Serialize;
use std::fs;
use std::path::Path;
use tracing::debug;

/// Extensions accepted for schema files
pub const VALID_EXTENSIONS: &[&str] = &[".xsd", ".xml"];

/// Whether `file_name` ends in `.xsd` or `.xml` (case-insensitive)
pub fn is_valid_file_type(file_name: &str) -> bool {
    match file_name.rfind('.') {
        Some(idx) => {
            let extension = file_name[idx..].to_lowercase();
            VALID_EXTENSIONS.contains(&extension.as_str())
        }
        None => false,
    }
}

/// Human-readable size: `0 Bytes`, `512 Bytes`, `1.5 KB`, `2.25 MB`, ...
pub fn format_file_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["Bytes", "KB", "MB", "GB"];

    if bytes == 0 {
        return "0 Bytes".to_string();
    }

    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }

    let rounded = format!("{:.2}", value);
    let trimmed = rounded.trim_end_matches('0').trim_end_matches('.');
    format!("{} {}", trimmed, UNITS[unit])
}

/// Name and size of a loaded file
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceInfo {
    /// File name (last path component)
    pub name: String,
    /// Size in bytes
    pub size: u64,
}

impl SourceInfo {
    /// Create source info for an in-memory text
    pub fn new(name: impl Into<String>, size: u64) -> Self {
        Self {
            name: name.into(),
            size,
        }
    }

    /// Size formatted with [`format_file_size`]
    pub fn formatted_size(&self) -> String {
        format_file_size(self.size)
    }
}

/// Raw text of a schema file
#[derive(Debug, Clone)]
pub struct SourceFile {
    /// Where the text came from
    pub info: SourceInfo,
    /// Decoded file content
    pub text: String,
}

/// Resource loader for schema files
#[derive(Debug, Default)]
pub struct Loader {
    /// Resource limits
    limits: Limits,
}

impl Loader {
    /// Create a new loader with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the limits
    pub fn with_limits(mut self, limits: Limits) -> Self {
        self.limits = limits;
        self
    }

    /// The limits this loader applies
    pub fn limits(&self) -> &Limits {
        &self.limits
    }

    /// Read a schema file as text
    pub fn load(&self, path: impl AsRef<Path>) -> Result<SourceFile> {
        let path = path.as_ref();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        if !is_valid_file_type(&name) {
            return Err(Error::UnsupportedFileType(name));
        }

        let metadata = fs::metadata(path).map_err(|e| {
            Error::Resource(format!("Failed to read file '{}': {}", path.display(), e))
        })?;
        let size = usize::try_from(metadata.len()).unwrap_or(usize::MAX);
        self.limits.check_file_size(size)?;

        let bytes = fs::read(path).map_err(|e| {
            Error::Resource(format!("Failed to read file '{}': {}", path.display(), e))
        })?;
        let text = String::from_utf8(bytes).map_err(|e| {
            Error::Resource(format!(
                "File '{}' is not valid UTF-8: {}",
                path.display(),
                e.utf8_error()
            ))
        })?;

        debug!(file = %path.display(), size = text.len(), "loaded schema file");

        Ok(SourceFile {
            info: SourceInfo::new(name, metadata.len()),
            text,
        })
    }
}
