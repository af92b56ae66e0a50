//! Function identity resolution.
//!
//! Every handler and middleware registered on a [`Mux`](crate::mux::Mux)
//! carries a [`Callable`]: the fully qualified path of its type plus, for
//! functions and closures, the place it was registered. The
//! [`FunctionResolver`] turns that into a [`FuncInfo`] by consulting a
//! [`SourceIndex`] for declaration sites and comments.

use crate::error::{Error, Result};
use crate::mux::{Handler, HANDLER_METHOD, ROUTER_MODULE};
use crate::source_index::{comment_blocks, CommentBlock, SourceIndex};
use log::debug;
use serde::{Deserialize, Serialize};
use std::any::type_name;
use std::fmt;
use std::panic::Location;
use std::path::{Path, PathBuf};

const CLOSURE_MARKER: &str = "{{closure}}";

/// Environment variable overriding the source root.
pub const SOURCE_ROOT_ENV: &str = "ROUTEDOC_SOURCE_ROOT";

/// Metadata describing a handler or middleware function.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FuncInfo {
    #[serde(default)]
    pub pkg: String,
    #[serde(default)]
    pub func: String,
    #[serde(default)]
    pub comment: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub file: String,
    #[serde(default, skip_serializing_if = "is_zero")]
    pub line: usize,
    #[serde(default, skip_serializing_if = "is_false")]
    pub anonymous: bool,
    /// When set, every other field is meaningless.
    #[serde(default, skip_serializing_if = "is_false")]
    pub unresolvable: bool,
}

impl FuncInfo {
    pub fn unresolvable() -> Self {
        Self {
            unresolvable: true,
            ..Self::default()
        }
    }
}

fn is_zero(n: &usize) -> bool {
    *n == 0
}

fn is_false(b: &bool) -> bool {
    !*b
}

/// Identity of a callable, captured when it is registered.
#[derive(Debug, Clone, Copy)]
pub enum Callable {
    /// A function or closure value.
    Func {
        path: &'static str,
        site: &'static Location<'static>,
    },
    /// A value implementing [`Handler`]; resolves to its `serve_http`.
    Object { type_path: &'static str },
    /// Anything else. Never resolvable.
    Opaque { type_path: &'static str },
}

impl Callable {
    /// Captures a function or closure. Values whose type name is not an
    /// item path (`fn` pointers, trait objects, references) only name their
    /// signature, so they are captured as [`Callable::Opaque`].
    #[track_caller]
    pub fn of_fn<F>(_f: &F) -> Self {
        let path = type_name::<F>();
        if !is_item_path(path) {
            return Callable::Opaque { type_path: path };
        }
        Callable::Func {
            path,
            site: Location::caller(),
        }
    }

    pub fn of_handler<H: Handler>(_h: &H) -> Self {
        Callable::Object {
            type_path: type_name::<H>(),
        }
    }

    pub fn of_value<T: ?Sized>(_v: &T) -> Self {
        Callable::Opaque {
            type_path: type_name::<T>(),
        }
    }

    pub fn path(&self) -> &'static str {
        match self {
            Callable::Func { path, .. } => path,
            Callable::Object { type_path } | Callable::Opaque { type_path } => type_path,
        }
    }
}

/// The printed form is the type path only, so two registrations of the
/// same function compare equal wherever they were registered.
impl fmt::Display for Callable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}

/// Resolver configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolverConfig {
    /// Directory indexed for declarations; also stripped from reported
    /// file paths.
    pub source_root: PathBuf,
}

impl ResolverConfig {
    pub fn new(source_root: impl Into<PathBuf>) -> Self {
        Self {
            source_root: source_root.into(),
        }
    }

    /// Derives the source root from the environment.
    ///
    /// # Errors
    ///
    /// [`Error::SourceRootUnavailable`] when no candidate exists.
    pub fn from_env() -> Result<Self> {
        crate::util::source_root_from_env()
            .map(Self::new)
            .ok_or(Error::SourceRootUnavailable)
    }
}

/// Where a callable was found.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Frame {
    /// Fully qualified function path, generics stripped
    func_path: String,
    /// Type whose name opens its documenting comment by convention; only
    /// set for handler objects
    item_name: Option<String>,
    /// Path used to derive the package when no file is known
    declaring_path: String,
    site: Option<(PathBuf, usize)>,
}

pub struct FunctionResolver {
    config: ResolverConfig,
    index: SourceIndex,
}

impl FunctionResolver {
    /// Builds the source index for `config.source_root`.
    pub fn new(config: ResolverConfig) -> Self {
        let index = SourceIndex::build(&config.source_root);
        Self { config, index }
    }

    pub fn with_index(config: ResolverConfig, index: SourceIndex) -> Self {
        Self { config, index }
    }

    pub fn from_env() -> Result<Self> {
        Ok(Self::new(ResolverConfig::from_env()?))
    }

    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    /// Describes a callable. Never fails: anything that cannot be
    /// identified comes back with `unresolvable` set.
    pub fn resolve(&self, callable: &Callable) -> FuncInfo {
        let Some(frame) = self.frame(callable) else {
            return FuncInfo::unresolvable();
        };

        let mut fi = FuncInfo::default();
        let package = self.package_name(&frame);

        match frame.func_path.split("::").position(|seg| seg == package) {
            Some(idx) => {
                let segments: Vec<&str> = frame.func_path.split("::").collect();
                fi.pkg = segments[..=idx].join("::");
                fi.func = segments[idx + 1..].join("::");
            }
            None => fi.func = frame.func_path.clone(),
        }

        if fi.pkg == ROUTER_MODULE {
            fi.unresolvable = true;
        }
        if fi.func.contains(CLOSURE_MARKER) {
            fi.anonymous = true;
        }
        if let Some((file, line)) = &frame.site {
            fi.file = self.normalize(file);
            fi.line = *line;
        }
        if !frame.func_path.contains(&package) {
            fi.unresolvable = true;
        }

        if !fi.unresolvable {
            if let Some((file, line)) = &frame.site {
                fi.comment = self.comment(file, *line, frame.item_name.as_deref());
            }
        }

        debug!("Resolved {} -> {}::{}", callable, fi.pkg, fi.func);
        fi
    }

    fn frame(&self, callable: &Callable) -> Option<Frame> {
        match callable {
            Callable::Opaque { .. } => None,
            Callable::Func { path, site } => {
                let func_path = strip_generics(path);
                if func_path.contains(CLOSURE_MARKER) {
                    let declaring_path = func_path
                        .split("::")
                        .take_while(|seg| *seg != CLOSURE_MARKER)
                        .collect::<Vec<_>>()
                        .join("::");
                    Some(Frame {
                        site: Some((PathBuf::from(site.file()), site.line() as usize)),
                        item_name: None,
                        declaring_path,
                        func_path,
                    })
                } else {
                    let site = self
                        .index
                        .lookup(&func_path)
                        .map(|item| (item.file.clone(), item.line));
                    Some(Frame {
                        item_name: None,
                        declaring_path: func_path.clone(),
                        site,
                        func_path,
                    })
                }
            }
            Callable::Object { type_path } => {
                let type_path = strip_generics(type_path);
                let func_path = format!("{}::{}", type_path, HANDLER_METHOD);
                let site = self
                    .index
                    .lookup(&func_path)
                    .map(|item| (item.file.clone(), item.line));
                Some(Frame {
                    item_name: type_path.rsplit("::").next().map(str::to_string),
                    declaring_path: type_path,
                    site,
                    func_path,
                })
            }
        }
    }

    /// Short name of the module that declares the frame: from the file's
    /// location in the index when known, else from the item path.
    fn package_name(&self, frame: &Frame) -> String {
        let crate_name = frame.func_path.split("::").next().unwrap_or_default();
        let from_file = frame
            .site
            .as_ref()
            .and_then(|(file, _)| self.index.file(file))
            .map(|indexed| indexed.module_name().unwrap_or(crate_name).to_string());

        from_file.unwrap_or_else(|| {
            let segments: Vec<&str> = frame.declaring_path.split("::").collect();
            match segments.len() {
                0 | 1 => crate_name.to_string(),
                n => segments[n - 2].to_string(),
            }
        })
    }

    fn normalize(&self, file: &Path) -> String {
        file.strip_prefix(&self.config.source_root)
            .unwrap_or(file)
            .to_string_lossy()
            .into_owned()
    }

    fn comment(&self, file: &Path, line: usize, item_name: Option<&str>) -> String {
        let read;
        let blocks: &[CommentBlock] = match self.index.file(file) {
            Some(indexed) => &indexed.comments,
            None => match self.read_source(file) {
                Some(source) => {
                    read = comment_blocks(&source);
                    &read
                }
                None => return String::new(),
            },
        };

        if let Some(name) = item_name {
            let prefix = format!("{} ", name);
            if let Some(block) = blocks.iter().find(|b| b.text.starts_with(&prefix)) {
                return block.text.clone();
            }
        }

        blocks
            .iter()
            .find(|b| b.end_line + 1 == line)
            .map(|b| b.text.clone())
            .unwrap_or_default()
    }

    fn read_source(&self, file: &Path) -> Option<String> {
        let candidates = [file.to_path_buf(), self.config.source_root.join(file)];
        candidates
            .iter()
            .find_map(|path| std::fs::read_to_string(path).ok())
    }
}

/// Whether a type name is a path to a function item or closure, as opposed
/// to a signature such as `fn(&Request) -> Response` or `dyn Fn(..)`.
fn is_item_path(name: &str) -> bool {
    let signature_prefixes = ["fn(", "for<", "unsafe ", "extern ", "&", "(", "[", "*"];
    !signature_prefixes.iter().any(|p| name.starts_with(p)) && !name.contains("dyn ")
}

/// Drops generic arguments: `app::list<u8>` becomes `app::list`.
fn strip_generics(path: &str) -> String {
    let mut out = String::with_capacity(path.len());
    let mut depth = 0usize;
    for ch in path.chars() {
        match ch {
            '<' => depth += 1,
            '>' => depth = depth.saturating_sub(1),
            _ if depth == 0 => out.push(ch),
            _ => {}
        }
    }
    out
}
