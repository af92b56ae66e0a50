//! Documentation index over a source tree.
//!
//! Handler identities are captured as fully qualified item paths. This module
//! answers the questions the resolver has about those paths: where an item is
//! declared, which module a file belongs to, and which comment blocks a file
//! carries. The index is built once per resolver and queried afterwards,
//! instead of re-reading sources for every handler.

use crate::parser::{AstParser, ParsedFile};
use crate::scanner::SourceScanner;
use log::{debug, warn};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use syn::visit::{self, Visit};
use syn::{ImplItem, ItemFn, ItemImpl, ItemMod, Type};

/// A run of consecutive `//` comment lines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommentBlock {
    pub start_line: usize,
    pub end_line: usize,
    /// Comment text without markers, one `\n`-terminated line per source line
    pub text: String,
}

/// Declaration site of an indexed function or method.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemSite {
    /// Path relative to the index root
    pub file: PathBuf,
    /// 1-based line of the `fn` keyword
    pub line: usize,
}

#[derive(Debug, Clone)]
pub struct IndexedFile {
    /// Path relative to the index root
    pub path: PathBuf,
    /// Module path derived from the file location, empty for crate roots
    pub module: Vec<String>,
    pub comments: Vec<CommentBlock>,
}

impl IndexedFile {
    /// Short name of the module this file declares, `None` for crate roots.
    pub fn module_name(&self) -> Option<&str> {
        self.module.last().map(String::as_str)
    }
}

#[derive(Debug, Default)]
pub struct SourceIndex {
    root: PathBuf,
    files: Vec<IndexedFile>,
    items: BTreeMap<String, ItemSite>,
}

impl SourceIndex {
    /// An index that knows nothing; every lookup misses.
    pub fn empty(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            ..Self::default()
        }
    }

    /// Scans and parses every Rust file under `root`.
    ///
    /// Unreadable roots and unparsable files are logged and skipped, which
    /// leaves the affected handlers unresolved rather than failing the build.
    pub fn build(root: &Path) -> Self {
        let scan = match SourceScanner::new(root).scan() {
            Ok(scan) => scan,
            Err(e) => {
                warn!("Source index disabled: {:#}", e);
                return Self::empty(root);
            }
        };
        let parsed = AstParser::parse_files(&scan.rust_files);
        Self::from_parsed(root, parsed)
    }

    pub fn from_parsed(root: &Path, parsed_files: Vec<ParsedFile>) -> Self {
        let mut items = BTreeMap::new();
        let mut files = Vec::with_capacity(parsed_files.len());

        for parsed in parsed_files {
            let relative = parsed
                .path
                .strip_prefix(root)
                .unwrap_or(&parsed.path)
                .to_path_buf();
            let module = module_path_for(&relative);

            let mut collector = ItemCollector {
                scope: module.clone(),
                file: &relative,
                items: &mut items,
            };
            collector.visit_file(&parsed.syntax_tree);

            files.push(IndexedFile {
                comments: comment_blocks(&parsed.source),
                path: relative,
                module,
            });
        }

        debug!(
            "Indexed {} files, {} items under {}",
            files.len(),
            items.len(),
            root.display()
        );

        Self {
            root: root.to_path_buf(),
            files,
            items,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn item_count(&self) -> usize {
        self.items.len()
    }

    /// Finds the declaration of a fully qualified item path such as
    /// `my_crate::handlers::list_articles`.
    ///
    /// The leading segment names the crate, which the index cannot see, so
    /// items are matched on the remaining segments. When several files
    /// declare a matching item, one whose module is named after the crate
    /// (a `tests/<crate>.rs` target) wins over the others.
    pub fn lookup(&self, item_path: &str) -> Option<&ItemSite> {
        let (krate, rest) = item_path.split_once("::")?;
        if let Some(site) = self.items.get(rest) {
            return Some(site);
        }

        let suffix = format!("::{}", rest);
        let mut fallback = None;
        for (key, site) in &self.items {
            let Some(head) = key.strip_suffix(&suffix) else {
                continue;
            };
            if head == krate || head.ends_with(&format!("::{}", krate)) {
                return Some(site);
            }
            fallback.get_or_insert(site);
        }
        fallback
    }

    /// Finds the indexed file for a path that is absolute, relative to the
    /// index root, or relative to some ancestor of the root.
    pub fn file(&self, path: &Path) -> Option<&IndexedFile> {
        let path = path.strip_prefix(&self.root).unwrap_or(path);
        if let Some(file) = self.files.iter().find(|f| f.path == path) {
            return Some(file);
        }
        self.files
            .iter()
            .filter(|f| path.ends_with(&f.path))
            .max_by_key(|f| f.path.components().count())
    }
}

/// Module path a file declares, as rustc would derive it from the layout.
///
/// `src/` components are transparent and `lib.rs`, `main.rs` and `mod.rs`
/// name their directory's module.
pub fn module_path_for(relative: &Path) -> Vec<String> {
    let mut module: Vec<String> = relative
        .components()
        .filter_map(|c| c.as_os_str().to_str())
        .filter(|c| *c != "src" && *c != "." && *c != "/")
        .map(str::to_string)
        .collect();

    if let Some(last) = module.pop() {
        let stem = last.strip_suffix(".rs").unwrap_or(&last);
        if !matches!(stem, "lib" | "main" | "mod") {
            module.push(stem.to_string());
        }
    }
    module
}

/// Splits source text into blocks of consecutive line comments.
pub fn comment_blocks(source: &str) -> Vec<CommentBlock> {
    let mut blocks = Vec::new();
    let mut current: Option<CommentBlock> = None;

    for (idx, raw) in source.lines().enumerate() {
        let line_no = idx + 1;
        match comment_text(raw.trim()) {
            Some(text) => {
                let block = current.get_or_insert_with(|| CommentBlock {
                    start_line: line_no,
                    end_line: line_no,
                    text: String::new(),
                });
                block.end_line = line_no;
                block.text.push_str(text);
                block.text.push('\n');
            }
            None => blocks.extend(current.take()),
        }
    }
    blocks.extend(current);
    blocks
}

fn comment_text(line: &str) -> Option<&str> {
    let body = line
        .strip_prefix("///")
        .or_else(|| line.strip_prefix("//!"))
        .or_else(|| line.strip_prefix("//"))?;
    Some(body.strip_prefix(' ').unwrap_or(body))
}

/// Records every `fn` and inherent/trait method under its qualified path.
struct ItemCollector<'a> {
    scope: Vec<String>,
    file: &'a Path,
    items: &'a mut BTreeMap<String, ItemSite>,
}

impl ItemCollector<'_> {
    fn record(&mut self, name: String, line: usize) {
        let mut path = self.scope.clone();
        path.push(name);
        self.items.entry(path.join("::")).or_insert_with(|| ItemSite {
            file: self.file.to_path_buf(),
            line,
        });
    }
}

impl<'ast> Visit<'ast> for ItemCollector<'_> {
    fn visit_item_mod(&mut self, node: &'ast ItemMod) {
        // `mod foo;` declarations live in their own files
        if node.content.is_none() {
            return;
        }
        self.scope.push(node.ident.to_string());
        visit::visit_item_mod(self, node);
        self.scope.pop();
    }

    fn visit_item_fn(&mut self, node: &'ast ItemFn) {
        let name = node.sig.ident.to_string();
        self.record(name.clone(), node.sig.fn_token.span.start().line);
        self.scope.push(name);
        visit::visit_item_fn(self, node);
        self.scope.pop();
    }

    fn visit_item_impl(&mut self, node: &'ast ItemImpl) {
        let Some(type_name) = self_type_name(&node.self_ty) else {
            return;
        };
        for item in &node.items {
            if let ImplItem::Fn(method) = item {
                self.record(
                    format!("{}::{}", type_name, method.sig.ident),
                    method.sig.fn_token.span.start().line,
                );
            }
        }
    }
}

fn self_type_name(ty: &Type) -> Option<String> {
    match ty {
        Type::Path(type_path) => type_path
            .path
            .segments
            .last()
            .map(|segment| segment.ident.to_string()),
        Type::Reference(reference) => self_type_name(&reference.elem),
        _ => None,
    }
}
