//! routedoc - documentation generated from an in-memory routing table.
//!
//! A [`mux::Mux`] records every route, method binding and middleware along
//! with the identity of the function behind it. The crate walks that table
//! and produces JSON, an HTML/Markdown routes page or a RAML 1.0 document
//! describing the routes, their middleware chains and where each handler
//! is declared, including its doc comment.
//!
//! # Architecture
//!
//! 1. [`mux`] - The routing table and the read-only [`mux::Routes`] view
//! 2. [`scanner`] - Finds the Rust sources under a source root
//! 3. [`parser`] - Parses those sources into syntax trees
//! 4. [`source_index`] - Declaration sites, module paths and comments
//! 5. [`funcinfo`] - Resolves handlers and middlewares to [`funcinfo::FuncInfo`]
//! 6. [`doc`] - Builds the documentation tree and renders it as JSON
//! 7. [`markup`] - Renders the flattened routes page
//! 8. [`raml`] - Builds and renders RAML documents
//! 9. [`serializer`] - JSON/YAML output and file writing
//!
//! # Example Usage
//!
//! ```no_run
//! use routedoc::doc::json_routes_doc;
//! use routedoc::markup::{markup_routes_doc, MarkupOpts};
//! use routedoc::mux::{Mux, Request, Response};
//!
//! fn ping(_req: &Request) -> Response {
//!     Response::new(b"pong".to_vec())
//! }
//!
//! let mut r = Mux::new();
//! r.get("/ping", ping);
//!
//! println!("{}", json_routes_doc(&r));
//! println!(
//!     "{}",
//!     markup_routes_doc(
//!         &r,
//!         MarkupOpts {
//!             project_path: "github.com/acme/api".to_string(),
//!             ..MarkupOpts::default()
//!         }
//!     )
//! );
//! ```
//!
//! Declarations are looked up under the source root: `ROUTEDOC_SOURCE_ROOT`
//! when set, else the crate's manifest directory, else the working
//! directory.

pub mod doc;
pub mod error;
pub mod funcinfo;
pub mod markup;
pub mod mux;
pub mod parser;
pub mod raml;
pub mod scanner;
pub mod serializer;
pub mod source_index;
pub mod util;

pub use doc::{json_routes_doc, print_routes};
pub use error::{Error, Result};
pub use markup::{markup_routes_doc, MarkupOpts};
