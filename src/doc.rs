//! The documentation tree and the builder that derives it from a routing
//! table.

use crate::error::Result;
use crate::funcinfo::{FuncInfo, FunctionResolver};
use crate::mux::{Endpoint, Routes, METHOD_ANY};
use crate::serializer::serialize_json;
use log::{debug, error, warn};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Root of a JSON routes document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Doc {
    pub router: DocRouter,
}

impl Doc {
    /// Parses a document produced by [`json_routes_doc`], restoring each
    /// route's pattern from its map key.
    pub fn from_json(json: &str) -> Result<Self> {
        let mut doc: Doc = serde_json::from_str(json)?;
        doc.router.restore_patterns();
        Ok(doc)
    }
}

/// One router level: its middlewares and its patterns.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocRouter {
    #[serde(default)]
    pub middlewares: Vec<DocMiddleware>,
    #[serde(default)]
    pub routes: DocRoutes,
}

impl DocRouter {
    pub fn is_empty(&self) -> bool {
        self.middlewares.is_empty() && self.routes.is_empty()
    }

    fn restore_patterns(&mut self) {
        for (pattern, route) in self.routes.iter_mut() {
            route.pattern = pattern.clone();
            if let Some(router) = route.router.as_mut() {
                router.restore_patterns();
            }
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocMiddleware {
    #[serde(flatten)]
    pub func_info: FuncInfo,
}

/// A pattern of a router level. Holds either a nested router or the
/// handlers bound to the pattern, never both.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocRoute {
    #[serde(skip)]
    pub pattern: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub handlers: DocHandlers,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub router: Option<Box<DocRouter>>,
}

impl DocRoute {
    pub fn leaf(pattern: &str, handlers: DocHandlers) -> Self {
        Self {
            pattern: pattern.to_string(),
            handlers,
            router: None,
        }
    }

    pub fn nested(pattern: &str, router: DocRouter) -> Self {
        Self {
            pattern: pattern.to_string(),
            handlers: DocHandlers::new(),
            router: Some(Box::new(router)),
        }
    }
}

/// Pattern to route.
pub type DocRoutes = BTreeMap<String, DocRoute>;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocHandler {
    #[serde(default)]
    pub middlewares: Vec<DocMiddleware>,
    pub method: String,
    #[serde(flatten)]
    pub func_info: FuncInfo,
}

/// Method to handler.
pub type DocHandlers = BTreeMap<String, DocHandler>;

/// Walks routing tables into [`Doc`] trees.
pub struct DocBuilder {
    resolver: FunctionResolver,
}

impl DocBuilder {
    pub fn new(resolver: FunctionResolver) -> Self {
        Self { resolver }
    }

    /// A builder configured from the environment.
    ///
    /// # Errors
    ///
    /// Fails when no source root can be determined.
    pub fn from_env() -> Result<Self> {
        Ok(Self::new(FunctionResolver::from_env()?))
    }

    pub fn resolver(&self) -> &FunctionResolver {
        &self.resolver
    }

    pub fn build_doc(&self, routes: &dyn Routes) -> Doc {
        Doc {
            router: self.build_router(Some(routes)),
        }
    }

    /// Builds one level and, recursively, every level mounted below it.
    /// A missing table yields an empty router.
    pub fn build_router(&self, routes: Option<&dyn Routes>) -> DocRouter {
        let Some(routes) = routes else {
            return DocRouter::default();
        };

        let mut dr = DocRouter::default();
        for mw in routes.middlewares() {
            dr.middlewares.push(DocMiddleware {
                func_info: self.resolver.resolve(mw.callable()),
            });
        }

        for rt in routes.routes() {
            let route = match rt.sub_routes {
                Some(sub) => DocRoute::nested(rt.pattern, self.build_router(Some(sub))),
                None => DocRoute::leaf(rt.pattern, self.build_handlers(rt.pattern, rt.handlers)),
            };
            if route.router.is_none() && route.handlers.is_empty() {
                warn!("Skipping {}: route has neither handlers nor a sub-router", rt.pattern);
                continue;
            }
            dr.routes.insert(rt.pattern.to_string(), route);
        }

        dr
    }

    fn build_handlers(&self, pattern: &str, bindings: &BTreeMap<String, Endpoint>) -> DocHandlers {
        let catch_all = bindings.get(METHOD_ANY).map(Endpoint::fingerprint);
        let mut handlers = DocHandlers::new();

        for (method, endpoint) in bindings {
            if method != METHOD_ANY && catch_all.as_ref() == Some(&endpoint.fingerprint()) {
                debug!("{} {} duplicates the catch-all handler", method, pattern);
                continue;
            }

            let mut dh = DocHandler {
                method: method.clone(),
                ..DocHandler::default()
            };
            let terminal = match endpoint {
                Endpoint::Chain(chain) => {
                    for mw in &chain.middlewares {
                        dh.middlewares.push(DocMiddleware {
                            func_info: self.resolver.resolve(mw.callable()),
                        });
                    }
                    &chain.endpoint
                }
                Endpoint::Handler(handler) => handler,
            };
            dh.func_info = self.resolver.resolve(terminal.callable());

            handlers.insert(method.clone(), dh);
        }

        handlers
    }
}

/// Builds the routes document using environment-derived configuration.
///
/// # Errors
///
/// Fails only when no source root can be determined.
pub fn build_doc(routes: &dyn Routes) -> Result<Doc> {
    Ok(DocBuilder::from_env()?.build_doc(routes))
}

/// Pretty-printed JSON routes document.
pub fn json_routes_doc(routes: &dyn Routes) -> String {
    let doc = build_doc(routes).unwrap_or_else(|e| {
        warn!("Documenting routes without source information: {}", e);
        Doc::default()
    });
    serialize_json(&doc).unwrap_or_else(|e| {
        error!("Failed to serialize routes document: {}", e);
        String::new()
    })
}

pub fn json_routes_bytes(routes: &dyn Routes) -> Vec<u8> {
    json_routes_doc(routes).into_bytes()
}

/// Full pattern of every leaf route, in registration order.
pub fn route_patterns(routes: &dyn Routes) -> Vec<String> {
    fn collect(parent: &str, routes: &dyn Routes, out: &mut Vec<String>) {
        for rt in routes.routes() {
            let pattern = format!("{}{}", parent, rt.pattern);
            match rt.sub_routes {
                Some(sub) => collect(&pattern, sub, out),
                None => out.push(pattern),
            }
        }
    }

    let mut out = Vec::new();
    collect("", routes, &mut out);
    out
}

/// Prints every leaf route's full pattern to stdout.
pub fn print_routes(routes: &dyn Routes) {
    for pattern in route_patterns(routes) {
        println!("{}", pattern);
    }
}
