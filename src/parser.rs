use anyhow::{Context, Result};
use log::{debug, warn};
use std::fs;
use std::path::{Path, PathBuf};

/// Parses Rust source files for the documentation index.
///
/// `syn` only keeps doc comments (as attributes), so the raw text is kept
/// alongside the syntax tree for the plain `//` comment scan.
///
/// # Example
///
/// ```no_run
/// use routedoc::parser::AstParser;
/// use std::path::Path;
///
/// let parsed = AstParser::parse_file(Path::new("src/main.rs")).unwrap();
/// println!("Parsed {} items", parsed.syntax_tree.items.len());
/// ```
pub struct AstParser;

/// A successfully parsed Rust file.
#[derive(Debug)]
pub struct ParsedFile {
    /// Path to the source file
    pub path: PathBuf,
    /// The file contents the tree was parsed from
    pub source: String,
    /// The parsed abstract syntax tree
    pub syntax_tree: syn::File,
}

impl AstParser {
    /// Reads and parses a single file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not valid Rust.
    pub fn parse_file(path: &Path) -> Result<ParsedFile> {
        debug!("Parsing file: {}", path.display());

        let source = fs::read_to_string(path)
            .with_context(|| format!("Failed to read file: {}", path.display()))?;
        let mut parsed = Self::parse_source(path, source)?;
        parsed.path = path.to_path_buf();

        Ok(parsed)
    }

    /// Parses in-memory source text as if it had been read from `path`.
    pub fn parse_source(path: &Path, source: String) -> Result<ParsedFile> {
        let syntax_tree = syn::parse_file(&source)
            .with_context(|| format!("Failed to parse Rust syntax in file: {}", path.display()))?;

        Ok(ParsedFile {
            path: path.to_path_buf(),
            source,
            syntax_tree,
        })
    }

    /// Parses every file, logging and dropping the ones that fail.
    ///
    /// A documentation index is best effort: one broken file must not hide
    /// the handlers declared in the others.
    pub fn parse_files(paths: &[PathBuf]) -> Vec<ParsedFile> {
        debug!("Parsing {} files", paths.len());

        let parsed: Vec<ParsedFile> = paths
            .iter()
            .filter_map(|path| match Self::parse_file(path) {
                Ok(parsed) => Some(parsed),
                Err(e) => {
                    warn!("Skipping {}: {:#}", path.display(), e);
                    None
                }
            })
            .collect();

        debug!(
            "Parsing complete: {} succeeded, {} failed",
            parsed.len(),
            paths.len() - parsed.len()
        );

        parsed
    }
}
