//! Small helpers shared by the renderers.

use crate::doc::DocRouter;
use crate::funcinfo::SOURCE_ROOT_ENV;
use std::env;
use std::path::PathBuf;

/// Deep copy of a doc router; the copy shares nothing with `dr`.
pub fn copy_doc_router(dr: &DocRouter) -> DocRouter {
    dr.clone()
}

/// Source root from the environment: the override variable, then the
/// manifest directory cargo exports, then the working directory.
pub fn source_root_from_env() -> Option<PathBuf> {
    [SOURCE_ROOT_ENV, "CARGO_MANIFEST_DIR"]
        .iter()
        .filter_map(|var| env::var_os(var))
        .filter(|value| !value.is_empty())
        .map(PathBuf::from)
        .next()
        .or_else(|| env::current_dir().ok())
}
