//! Article handlers shared by the integration tests.
#![allow(dead_code)]

use routedoc::mux::{BoxHandler, Handler, Request, Response};

// list_articles returns an array of articles.
pub fn list_articles(_req: &Request) -> Response {
    Response::new(b"[]".to_vec())
}

// create_article persists the posted article and returns it
// back to the client as an acknowledgement.
pub fn create_article(req: &Request) -> Response {
    Response::new(req.body().clone())
}

// Search articles.
// Looks through the article data for a matching article.
pub fn search_articles(_req: &Request) -> Response {
    Response::new(b"[]".to_vec())
}

// article_ctx loads the article named in the URL.
pub fn article_ctx(next: BoxHandler) -> BoxHandler {
    next
}

// paginate reads the page cursor from the query.
pub fn paginate(next: BoxHandler) -> BoxHandler {
    next
}

// ArticleHandler serves a single article.
pub struct ArticleHandler;

impl Handler for ArticleHandler {
    fn serve_http(&self, _req: &Request) -> Response {
        Response::new(b"{}".to_vec())
    }
}
