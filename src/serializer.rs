//! Serialization of generated documents to JSON or YAML, and writing them
//! out.

use crate::error::{Error, Result};
use log::debug;
use serde::Serialize;
use std::fs;
use std::path::Path;

/// Serializes a document to pretty-printed JSON.
///
/// Maps serialize with their keys in order, so the same document always
/// prints identically.
///
/// # Errors
///
/// Returns an error if serialization fails.
pub fn serialize_json<T: Serialize>(doc: &T) -> Result<String> {
    debug!("Serializing document to JSON");
    Ok(serde_json::to_string_pretty(doc)?)
}

/// Serializes a document to YAML.
///
/// # Errors
///
/// Returns an error if serialization fails.
pub fn serialize_yaml<T: Serialize>(doc: &T) -> Result<String> {
    debug!("Serializing document to YAML");
    Ok(serde_yaml::to_string(doc)?)
}

/// Writes string content to a file, creating parent directories as needed.
///
/// # Errors
///
/// [`Error::Io`] naming the path that could not be created or written.
pub fn write_to_file(content: &str, path: &Path) -> Result<()> {
    debug!("Writing content to file: {}", path.display());

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|source| Error::Io {
            path: parent.to_path_buf(),
            source,
        })?;
    }

    fs::write(path, content).map_err(|source| Error::Io {
        path: path.to_path_buf(),
        source,
    })?;

    debug!("Wrote {} bytes to {}", content.len(), path.display());
    Ok(())
}
