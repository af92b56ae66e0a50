#[path = "fixtures/articles.rs"]
mod articles;

use pretty_assertions::assert_eq;
use routedoc::doc::{json_routes_doc, print_routes, route_patterns, Doc, DocBuilder};
use routedoc::funcinfo::{Callable, FunctionResolver, ResolverConfig, SOURCE_ROOT_ENV};
use routedoc::markup::{markup_routes_doc, MarkupDoc, MarkupOpts};
use routedoc::mux::{BoxHandler, HandlerRef, Middleware, Mux, Request, Response};
use std::path::PathBuf;
use std::sync::Once;
use tempfile::TempDir;

static INIT: Once = Once::new();

fn tests_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests")
}

/// Points every environment-configured resolver at this directory.
fn init() {
    INIT.call_once(|| {
        let _ = env_logger::builder().is_test(true).try_init();
        std::env::set_var(SOURCE_ROOT_ENV, tests_dir());
    });
}

// ping answers with pong.
fn ping(_req: &Request) -> Response {
    Response::new(b"pong".to_vec())
}

// request_id tags every request.
fn request_id(next: BoxHandler) -> BoxHandler {
    next
}

fn hub_index(_req: &Request) -> Response {
    Response::new(b"hub".to_vec())
}

fn articles_router() -> Mux {
    let mut r = Mux::new();
    r.use_middleware(Middleware::new(request_id));
    r.get("/ping", ping);
    r.route("/articles", |r| {
        r.with(vec![Middleware::new(articles::paginate)], |r| {
            r.get("/", articles::list_articles);
        });
        r.post("/", articles::create_article);
        r.get("/search", articles::search_articles);
        r.route("/{articleID}", |r| {
            r.use_middleware(Middleware::new(articles::article_ctx));
            r.handle("/", HandlerRef::object(articles::ArticleHandler));
        });
    });
    r
}

fn hubs_router() -> Mux {
    let mut r = Mux::new();
    r.use_middleware(Middleware::new(request_id));
    r.group(|r| {
        r.use_middleware(Middleware::new(|next: BoxHandler| next));
        r.route("/hubs", |r| {
            r.route("/{hubID}", |r| {
                r.get("/", hub_index);
                r.get("/touch", |_req: &Request| Response::new(b"touch".to_vec()));
            });
        });
        r.route("/folders/", |r| {
            r.get("/", |_req: &Request| Response::new(b"folders".to_vec()));
            r.get("/public", |_req: &Request| Response::new(b"public".to_vec()));
        });
    });
    r
}

#[test]
fn test_ping_json_end_to_end() {
    init();
    let mut r = Mux::new();
    r.get("/ping", ping);

    let json = json_routes_doc(&r);
    let doc = Doc::from_json(&json).expect("routes document should parse");

    assert!(doc.router.middlewares.is_empty());
    let handler = &doc.router.routes["/ping"].handlers["GET"];
    assert!(handler.middlewares.is_empty());
    assert_eq!(handler.method, "GET");
    assert_eq!(handler.func_info.pkg, "integration_test");
    assert_eq!(handler.func_info.func, "ping");
    assert_eq!(handler.func_info.file, "integration_test.rs");
    assert_eq!(handler.func_info.comment, "ping answers with pong.\n");
    assert!(!handler.func_info.anonymous);
    assert!(!handler.func_info.unresolvable);
}

#[test]
fn test_articles_json_tree() {
    init();
    let doc = Doc::from_json(&json_routes_doc(&articles_router())).unwrap();

    assert_eq!(doc.router.middlewares[0].func_info.func, "request_id");

    let articles = doc.router.routes["/articles"].router.as_ref().unwrap();
    let index = &articles.routes["/"].handlers;
    assert_eq!(index.keys().collect::<Vec<_>>(), vec!["GET", "POST"]);
    assert_eq!(index["GET"].middlewares[0].func_info.func, "paginate");
    assert_eq!(index["GET"].func_info.pkg, "integration_test::articles");
    assert_eq!(index["GET"].func_info.func, "list_articles");
    assert!(index["POST"].middlewares.is_empty());
    assert_eq!(
        index["POST"].func_info.comment,
        "create_article persists the posted article and returns it\n\
         back to the client as an acknowledgement.\n"
    );
    assert_eq!(
        articles.routes["/search"].handlers["GET"].func_info.comment,
        "Search articles.\nLooks through the article data for a matching article.\n"
    );

    let article = articles.routes["/{articleID}"].router.as_ref().unwrap();
    assert_eq!(article.middlewares[0].func_info.func, "article_ctx");
    let handlers = &article.routes["/"].handlers;
    assert_eq!(handlers.keys().collect::<Vec<_>>(), vec!["*"]);
    assert_eq!(handlers["*"].func_info.func, "ArticleHandler::serve_http");
    assert_eq!(
        handlers["*"].func_info.comment,
        "ArticleHandler serves a single article.\n"
    );
}

#[test]
fn test_markup_hubs_page() {
    init();
    let r = hubs_router();
    let html = markup_routes_doc(
        &r,
        MarkupOpts {
            project_path: "github.com/acme/hubs".to_string(),
            intro: "Hub service routes.".to_string(),
            ..MarkupOpts::default()
        },
    );

    assert!(!html.starts_with("ERROR"));
    assert!(html.contains("<title>github.com/acme/hubs</title>"));
    assert!(html.contains("Hub service routes."));
    assert!(html.contains("<summary>`/hubs/{hubID}`</summary>"));
    assert!(html.contains("<summary>`/hubs/{hubID}/touch`</summary>"));
    assert!(html.contains("Total # of routes: 4"));
}

#[test]
fn test_markup_route_chain_keeps_level_middlewares() {
    init();
    let r = hubs_router();
    let builder = DocBuilder::new(FunctionResolver::new(ResolverConfig::new(tests_dir())));
    let mut mu = MarkupDoc::new(Some(&r), MarkupOpts::default()).with_builder(builder);
    mu.generate().unwrap();

    assert_eq!(
        mu.route_paths(),
        vec![
            "/folders/",
            "/folders//public",
            "/hubs/{hubID}",
            "/hubs/{hubID}/touch"
        ]
    );

    let root = mu.route_tree("/hubs/{hubID}").unwrap();
    assert_eq!(root.middlewares.len(), 1);
    assert_eq!(root.middlewares[0].func_info.func, "request_id");

    // The group's inline middleware moves onto the mounted router
    let hubs = root.routes["/hubs"].router.as_ref().unwrap();
    assert_eq!(hubs.middlewares.len(), 1);
    assert!(hubs.middlewares[0].func_info.anonymous);

    let hub = hubs.routes["/{hubID}"].router.as_ref().unwrap();
    assert_eq!(hub.routes.len(), 1);
    assert_eq!(hub.routes["/"].handlers["GET"].func_info.func, "hub_index");
}

#[test]
fn test_markup_without_router_reports_error() {
    init();
    let mut mu = MarkupDoc::new(None, MarkupOpts::default());

    assert!(mu.generate().is_err());
    assert_eq!(mu.to_string(), "");
}

#[test]
fn test_resolve_from_relocated_source_root() {
    init();
    let source = include_str!("fixtures/articles.rs");
    let temp_dir = TempDir::new().unwrap();
    std::fs::create_dir_all(temp_dir.path().join("src")).unwrap();
    std::fs::write(temp_dir.path().join("src/articles.rs"), source).unwrap();

    let resolver = FunctionResolver::new(ResolverConfig::new(temp_dir.path()));
    let fi = resolver.resolve(&Callable::of_fn(&articles::list_articles));

    let expected_line = source
        .lines()
        .position(|line| line.starts_with("pub fn list_articles"))
        .unwrap()
        + 1;
    assert_eq!(fi.pkg, "integration_test::articles");
    assert_eq!(fi.func, "list_articles");
    assert_eq!(PathBuf::from(&fi.file), PathBuf::from("src/articles.rs"));
    assert_eq!(fi.line, expected_line);
    assert_eq!(fi.comment, "list_articles returns an array of articles.\n");
}

#[test]
fn test_route_patterns_and_print() {
    init();
    let r = articles_router();

    assert_eq!(
        route_patterns(&r),
        vec![
            "/ping",
            "/articles/",
            "/articles/search",
            "/articles/{articleID}/"
        ]
    );
    print_routes(&r);
}
