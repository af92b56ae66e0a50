//! In-memory HTTP routing table.
//!
//! [`Routes`] is the read-only view the documentation builder walks; [`Mux`]
//! is the table applications register their handlers on. Registration
//! captures the identity of every handler and middleware (see
//! [`Callable`]) so documentation can later name them and point at their
//! source. Matching and dispatch are left to the server that owns the table.

use crate::funcinfo::Callable;
use log::{debug, warn};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

pub type Request = http::Request<Vec<u8>>;
pub type Response = http::Response<Vec<u8>>;

/// Module path of the routing table itself. Handlers declared here are
/// router plumbing and are never attributed to application code.
pub const ROUTER_MODULE: &str = module_path!();

/// Method key of the catch-all binding registered by [`Mux::handle`].
pub const METHOD_ANY: &str = "*";

/// Methods bound by [`Mux::handle`] next to the catch-all.
pub const STANDARD_METHODS: [&str; 9] = [
    "CONNECT", "DELETE", "GET", "HEAD", "OPTIONS", "PATCH", "POST", "PUT", "TRACE",
];

/// Name of the [`Handler`] method, used to locate handler objects in source.
pub const HANDLER_METHOD: &str = "serve_http";

/// The HTTP handler capability.
pub trait Handler: Send + Sync + 'static {
    fn serve_http(&self, req: &Request) -> Response;
}

pub type BoxHandler = Arc<dyn Handler>;

struct FnHandler<F>(F);

impl<F> Handler for FnHandler<F>
where
    F: Fn(&Request) -> Response + Send + Sync + 'static,
{
    fn serve_http(&self, req: &Request) -> Response {
        (self.0)(req)
    }
}

/// A registered handler together with its captured identity.
#[derive(Clone)]
pub struct HandlerRef {
    handler: BoxHandler,
    callable: Callable,
}

impl HandlerRef {
    /// Wraps a function or closure.
    #[track_caller]
    pub fn func<F>(f: F) -> Self
    where
        F: Fn(&Request) -> Response + Send + Sync + 'static,
    {
        let callable = Callable::of_fn(&f);
        Self {
            handler: Arc::new(FnHandler(f)),
            callable,
        }
    }

    /// Wraps a value implementing [`Handler`].
    pub fn object<H: Handler>(handler: H) -> Self {
        let callable = Callable::of_handler(&handler);
        Self {
            handler: Arc::new(handler),
            callable,
        }
    }

    pub fn callable(&self) -> &Callable {
        &self.callable
    }

    pub fn handler(&self) -> BoxHandler {
        Arc::clone(&self.handler)
    }

    /// Printed identity. An opaque callable's type name only spells out
    /// its signature, so the shared allocation's address is added.
    pub fn fingerprint(&self) -> String {
        match self.callable {
            Callable::Opaque { .. } => {
                format!("{}@{:p}", self.callable, Arc::as_ptr(&self.handler))
            }
            _ => self.callable.to_string(),
        }
    }
}

impl fmt::Debug for HandlerRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "HandlerRef({})", self.callable)
    }
}

type WrapFn = dyn Fn(BoxHandler) -> BoxHandler + Send + Sync;

/// A function wrapping a handler to run before/after it.
#[derive(Clone)]
pub struct Middleware {
    wrap: Arc<WrapFn>,
    callable: Callable,
}

impl Middleware {
    #[track_caller]
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(BoxHandler) -> BoxHandler + Send + Sync + 'static,
    {
        let callable = Callable::of_fn(&f);
        Self {
            wrap: Arc::new(f),
            callable,
        }
    }

    pub fn callable(&self) -> &Callable {
        &self.callable
    }

    pub fn wrap(&self, next: BoxHandler) -> BoxHandler {
        (self.wrap)(next)
    }

    /// Printed identity; see [`HandlerRef::fingerprint`].
    pub fn fingerprint(&self) -> String {
        match self.callable {
            Callable::Opaque { .. } => format!("{}@{:p}", self.callable, Arc::as_ptr(&self.wrap)),
            _ => self.callable.to_string(),
        }
    }
}

impl fmt::Debug for Middleware {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Middleware({})", self.callable)
    }
}

/// A handler registered through an inline middleware stack
/// ([`Mux::group`] / [`Mux::with`]).
#[derive(Clone, Debug)]
pub struct ChainHandler {
    pub middlewares: Vec<Middleware>,
    pub endpoint: HandlerRef,
}

/// What a method binding points at.
#[derive(Clone, Debug)]
pub enum Endpoint {
    Handler(HandlerRef),
    Chain(ChainHandler),
}

impl Endpoint {
    /// Printed identity of the binding. Two bindings with the same
    /// fingerprint document the same code.
    pub fn fingerprint(&self) -> String {
        match self {
            Endpoint::Handler(h) => h.fingerprint(),
            Endpoint::Chain(chain) => {
                let links: Vec<String> = chain
                    .middlewares
                    .iter()
                    .map(Middleware::fingerprint)
                    .collect();
                format!("[{}] -> {}", links.join(", "), chain.endpoint.fingerprint())
            }
        }
    }

    /// Composes chain links around the endpoint, first link outermost.
    pub fn handler(&self) -> BoxHandler {
        match self {
            Endpoint::Handler(h) => h.handler(),
            Endpoint::Chain(chain) => chain
                .middlewares
                .iter()
                .rev()
                .fold(chain.endpoint.handler(), |next, mw| mw.wrap(next)),
        }
    }
}

/// One registered pattern as seen through [`Routes`].
pub struct RouteEntry<'a> {
    pub pattern: &'a str,
    /// Method (or [`METHOD_ANY`]) to binding; empty for sub-routers
    pub handlers: &'a BTreeMap<String, Endpoint>,
    pub sub_routes: Option<&'a dyn Routes>,
}

/// Read-only view of one level of a routing table.
pub trait Routes {
    /// Middlewares of this level in registration order.
    fn middlewares(&self) -> &[Middleware];
    /// Patterns of this level in registration order.
    fn routes(&self) -> Vec<RouteEntry<'_>>;
}

struct MuxRoute {
    pattern: String,
    handlers: BTreeMap<String, Endpoint>,
    sub: Option<Box<Mux>>,
}

/// A composable routing table.
///
/// ```
/// use routedoc::mux::{Mux, Request, Response};
///
/// fn ping(_req: &Request) -> Response {
///     Response::new(b"pong".to_vec())
/// }
///
/// let mut r = Mux::new();
/// r.get("/ping", ping);
/// r.route("/articles", |r| {
///     r.get("/", |_req: &Request| Response::new(Vec::new()));
/// });
/// ```
#[derive(Default)]
pub struct Mux {
    middlewares: Vec<Middleware>,
    routes: Vec<MuxRoute>,
    /// Set for group/with muxes; their handlers are registered as chains
    inline: Option<Vec<Middleware>>,
}

impl Mux {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a middleware to this level, or to the inline stack inside
    /// [`Mux::group`] / [`Mux::with`].
    pub fn use_middleware(&mut self, mw: Middleware) -> &mut Self {
        match &mut self.inline {
            Some(stack) => stack.push(mw),
            None => self.middlewares.push(mw),
        }
        self
    }

    /// Binds `handler` to every method plus the catch-all.
    pub fn handle(&mut self, pattern: &str, handler: HandlerRef) -> &mut Self {
        self.bind(METHOD_ANY, pattern, handler.clone());
        for method in STANDARD_METHODS {
            self.bind(method, pattern, handler.clone());
        }
        self
    }

    #[track_caller]
    pub fn handle_fn<F>(&mut self, pattern: &str, f: F) -> &mut Self
    where
        F: Fn(&Request) -> Response + Send + Sync + 'static,
    {
        self.handle(pattern, HandlerRef::func(f))
    }

    /// Binds `handler` to one method.
    pub fn method(&mut self, method: &str, pattern: &str, handler: HandlerRef) -> &mut Self {
        self.bind(&method.to_ascii_uppercase(), pattern, handler);
        self
    }

    #[track_caller]
    pub fn get<F>(&mut self, pattern: &str, f: F) -> &mut Self
    where
        F: Fn(&Request) -> Response + Send + Sync + 'static,
    {
        self.method("GET", pattern, HandlerRef::func(f))
    }

    #[track_caller]
    pub fn post<F>(&mut self, pattern: &str, f: F) -> &mut Self
    where
        F: Fn(&Request) -> Response + Send + Sync + 'static,
    {
        self.method("POST", pattern, HandlerRef::func(f))
    }

    #[track_caller]
    pub fn put<F>(&mut self, pattern: &str, f: F) -> &mut Self
    where
        F: Fn(&Request) -> Response + Send + Sync + 'static,
    {
        self.method("PUT", pattern, HandlerRef::func(f))
    }

    #[track_caller]
    pub fn patch<F>(&mut self, pattern: &str, f: F) -> &mut Self
    where
        F: Fn(&Request) -> Response + Send + Sync + 'static,
    {
        self.method("PATCH", pattern, HandlerRef::func(f))
    }

    #[track_caller]
    pub fn delete<F>(&mut self, pattern: &str, f: F) -> &mut Self
    where
        F: Fn(&Request) -> Response + Send + Sync + 'static,
    {
        self.method("DELETE", pattern, HandlerRef::func(f))
    }

    #[track_caller]
    pub fn head<F>(&mut self, pattern: &str, f: F) -> &mut Self
    where
        F: Fn(&Request) -> Response + Send + Sync + 'static,
    {
        self.method("HEAD", pattern, HandlerRef::func(f))
    }

    #[track_caller]
    pub fn options<F>(&mut self, pattern: &str, f: F) -> &mut Self
    where
        F: Fn(&Request) -> Response + Send + Sync + 'static,
    {
        self.method("OPTIONS", pattern, HandlerRef::func(f))
    }

    /// Builds a sub-router with `f` and mounts it at `pattern`.
    pub fn route(&mut self, pattern: &str, f: impl FnOnce(&mut Mux)) -> &mut Self {
        let mut sub = Mux::new();
        f(&mut sub);
        self.mount(pattern, sub)
    }

    /// Mounts an existing router at `pattern`. Inline middlewares of a
    /// group are placed in front of the sub-router's own.
    pub fn mount(&mut self, pattern: &str, mut sub: Mux) -> &mut Self {
        if let Some(stack) = self.inline.as_ref().filter(|s| !s.is_empty()) {
            let mut middlewares = stack.clone();
            middlewares.append(&mut sub.middlewares);
            sub.middlewares = middlewares;
        }

        let route = self.entry(pattern);
        if !route.handlers.is_empty() {
            warn!("Mounting over handlers already bound to {}", pattern);
            route.handlers.clear();
        }
        route.sub = Some(Box::new(sub));
        self
    }

    /// Registers routes sharing this level's patterns but with their own
    /// inline middleware stack.
    pub fn group(&mut self, f: impl FnOnce(&mut Mux)) -> &mut Self {
        self.with(Vec::new(), f)
    }

    /// Like [`Mux::group`], starting the inline stack with `middlewares`.
    pub fn with(&mut self, middlewares: Vec<Middleware>, f: impl FnOnce(&mut Mux)) -> &mut Self {
        let mut stack = self.inline.clone().unwrap_or_default();
        stack.extend(middlewares);

        let mut inline = Mux {
            inline: Some(stack),
            ..Mux::default()
        };
        f(&mut inline);

        for route in inline.routes {
            let target = self.entry(&route.pattern);
            match route.sub {
                Some(sub) => {
                    target.handlers.clear();
                    target.sub = Some(sub);
                }
                None => {
                    target.sub = None;
                    target.handlers.extend(route.handlers);
                }
            }
        }
        self
    }

    /// The handler this table answers unmatched requests with.
    pub fn not_found_handler() -> HandlerRef {
        HandlerRef::func(default_not_found)
    }

    fn bind(&mut self, method: &str, pattern: &str, handler: HandlerRef) {
        let endpoint = match &self.inline {
            Some(stack) if !stack.is_empty() => Endpoint::Chain(ChainHandler {
                middlewares: stack.clone(),
                endpoint: handler,
            }),
            _ => Endpoint::Handler(handler),
        };
        debug!("Binding {} {} -> {}", method, pattern, endpoint.fingerprint());

        let route = self.entry(pattern);
        if route.sub.take().is_some() {
            warn!("Binding {} replaces the sub-router mounted at {}", method, pattern);
        }
        route.handlers.insert(method.to_string(), endpoint);
    }

    fn entry(&mut self, pattern: &str) -> &mut MuxRoute {
        let idx = match self.routes.iter().position(|r| r.pattern == pattern) {
            Some(idx) => idx,
            None => {
                self.routes.push(MuxRoute {
                    pattern: pattern.to_string(),
                    handlers: BTreeMap::new(),
                    sub: None,
                });
                self.routes.len() - 1
            }
        };
        &mut self.routes[idx]
    }
}

impl Routes for Mux {
    fn middlewares(&self) -> &[Middleware] {
        &self.middlewares
    }

    fn routes(&self) -> Vec<RouteEntry<'_>> {
        self.routes
            .iter()
            .map(|r| RouteEntry {
                pattern: &r.pattern,
                handlers: &r.handlers,
                sub_routes: r.sub.as_deref().map(|m| m as &dyn Routes),
            })
            .collect()
    }
}

fn default_not_found(_req: &Request) -> Response {
    let mut response = Response::new(b"404 page not found\n".to_vec());
    *response.status_mut() = http::StatusCode::NOT_FOUND;
    response
}

/// Visits every method binding of every leaf route.
///
/// `f` receives the method, the full route (ancestor patterns
/// concatenated), the terminal handler and the middlewares that apply to
/// it: every ancestor level's, this level's, then the chain links. The
/// catch-all binding is skipped since every method is bound alongside it.
/// The first error returned by `f` stops the walk.
pub fn walk<E, F>(routes: &dyn Routes, f: &mut F) -> Result<(), E>
where
    F: FnMut(&str, &str, &HandlerRef, &[Middleware]) -> Result<(), E>,
{
    walk_level(routes, "", &[], f)
}

fn walk_level<E, F>(
    routes: &dyn Routes,
    parent_route: &str,
    parent_middlewares: &[Middleware],
    f: &mut F,
) -> Result<(), E>
where
    F: FnMut(&str, &str, &HandlerRef, &[Middleware]) -> Result<(), E>,
{
    let mut middlewares = parent_middlewares.to_vec();
    middlewares.extend_from_slice(routes.middlewares());

    for route in routes.routes() {
        let full_route = format!("{}{}", parent_route, route.pattern);
        if let Some(sub) = route.sub_routes {
            walk_level(sub, &full_route, &middlewares, f)?;
            continue;
        }

        for (method, endpoint) in route.handlers {
            if method == METHOD_ANY {
                continue;
            }
            match endpoint {
                Endpoint::Handler(handler) => f(method, &full_route, handler, &middlewares)?,
                Endpoint::Chain(chain) => {
                    let mut all = middlewares.clone();
                    all.extend_from_slice(&chain.middlewares);
                    f(method, &full_route, &chain.endpoint, &all)?;
                }
            }
        }
    }
    Ok(())
}
