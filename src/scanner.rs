use anyhow::{Context, Result};
use log::{debug, warn};
use std::path::{Path, PathBuf};
use walkdir::{DirEntry, WalkDir};

/// Finds the Rust sources that make up a documentation source root.
///
/// Build output (`target`) and hidden directories are never descended into.
/// Further directory names can be excluded with [`SourceScanner::exclude`].
///
/// # Example
///
/// ```no_run
/// use routedoc::scanner::SourceScanner;
///
/// let sources = SourceScanner::new("./src").scan().unwrap();
/// println!("{} files to index", sources.rust_files.len());
/// ```
pub struct SourceScanner {
    root: PathBuf,
    excluded: Vec<String>,
}

/// Files discovered under a source root.
pub struct ScanResult {
    /// Absolute or root-joined paths of every `.rs` file found
    pub rust_files: Vec<PathBuf>,
    /// Entries that could not be read; scanning continued past them
    pub warnings: Vec<String>,
}

impl SourceScanner {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            excluded: vec!["target".to_string()],
        }
    }

    /// Skips every directory with the given name.
    pub fn exclude(mut self, dir_name: &str) -> Self {
        self.excluded.push(dir_name.to_string());
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Walks the root and collects `.rs` files in a stable (sorted) order.
    ///
    /// # Errors
    ///
    /// Returns an error if the root itself is not a readable directory.
    pub fn scan(&self) -> Result<ScanResult> {
        let metadata = std::fs::metadata(&self.root)
            .with_context(|| format!("Failed to access source root: {}", self.root.display()))?;
        if !metadata.is_dir() {
            anyhow::bail!("Source root is not a directory: {}", self.root.display());
        }

        let mut rust_files = Vec::new();
        let mut warnings = Vec::new();

        let walker = WalkDir::new(&self.root)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| e.depth() == 0 || !self.is_skipped(e));

        for entry in walker {
            match entry {
                Ok(entry) => {
                    let path = entry.path();
                    if entry.file_type().is_file()
                        && path.extension().and_then(|s| s.to_str()) == Some("rs")
                    {
                        rust_files.push(path.to_path_buf());
                    }
                }
                Err(e) => {
                    let warning = format!("Failed to access path: {}", e);
                    warn!("{}", warning);
                    warnings.push(warning);
                }
            }
        }

        debug!(
            "Scanned {}: {} Rust files",
            self.root.display(),
            rust_files.len()
        );

        Ok(ScanResult {
            rust_files,
            warnings,
        })
    }

    fn is_skipped(&self, entry: &DirEntry) -> bool {
        let name = entry.file_name().to_string_lossy();
        if name.starts_with('.') {
            return true;
        }
        entry.file_type().is_dir() && self.excluded.iter().any(|d| *d == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn file_names(result: &ScanResult) -> Vec<String> {
        result
            .rust_files
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
            .collect()
    }

    #[test]
    fn test_scan_collects_nested_sources_sorted() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        fs::create_dir_all(root.join("handlers")).unwrap();
        fs::write(root.join("main.rs"), "fn main() {}").unwrap();
        fs::write(root.join("handlers/mod.rs"), "pub mod articles;").unwrap();
        fs::write(root.join("handlers/articles.rs"), "pub fn list() {}").unwrap();
        fs::write(root.join("README.md"), "# routes").unwrap();

        let result = SourceScanner::new(root).scan().unwrap();

        assert!(result.warnings.is_empty());
        assert_eq!(file_names(&result), vec!["articles.rs", "mod.rs", "main.rs"]);
    }

    #[test]
    fn test_scan_skips_target_and_hidden_directories() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        fs::create_dir(root.join("target")).unwrap();
        fs::create_dir(root.join(".git")).unwrap();
        fs::write(root.join("target/build.rs"), "fn main() {}").unwrap();
        fs::write(root.join(".git/hook.rs"), "fn main() {}").unwrap();
        fs::write(root.join("lib.rs"), "pub fn ping() {}").unwrap();

        let result = SourceScanner::new(root).scan().unwrap();

        assert_eq!(file_names(&result), vec!["lib.rs"]);
    }

    #[test]
    fn test_scan_honours_excluded_directories() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        fs::create_dir(root.join("vendor")).unwrap();
        fs::write(root.join("vendor/dep.rs"), "pub fn x() {}").unwrap();
        fs::write(root.join("lib.rs"), "pub fn ping() {}").unwrap();

        let result = SourceScanner::new(root).exclude("vendor").scan().unwrap();

        assert_eq!(file_names(&result), vec!["lib.rs"]);
    }

    #[test]
    fn test_scan_missing_root_is_an_error() {
        let temp_dir = TempDir::new().unwrap();
        let missing = temp_dir.path().join("nope");

        let err = SourceScanner::new(&missing).scan().err().unwrap();

        assert!(err.to_string().contains("Failed to access source root"));
    }
}
