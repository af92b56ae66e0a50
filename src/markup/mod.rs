//! HTML/Markdown routes page.
//!
//! The doc tree is flattened into one entry per full route path. Each entry
//! is a chain of single-route routers from the root down to the leaf, so the
//! middlewares every level contributes stay grouped under that level.

pub mod templates;

use crate::doc::{Doc, DocBuilder, DocMiddleware, DocRoute, DocRouter};
use crate::error::{Error, Result};
use crate::funcinfo::FuncInfo;
use crate::mux::Routes;
use crate::util::copy_doc_router;
use log::{debug, warn};
use std::collections::BTreeMap;
use std::fmt;
use templates::{
    base_template, bass_css, div, favicon_ico_data, head, list_item, milligram_min_css,
    unordered_list,
};

/// Stylesheet embedded in the page.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Theme {
    #[default]
    Milligram,
    Bass,
}

#[derive(Debug, Clone, Default)]
pub struct MarkupOpts {
    /// Base import path of the project; also the page title
    pub project_path: String,

    /// Text placed above the routes.
    pub intro: String,

    /// Link to sources even when they are not hosted on github.com
    pub force_relative_links: bool,

    /// Source path prefixes mapped to the URL their files are browsable
    /// under, e.g. a vendored dependency to its upstream repository:
    /// `"my/project/vendor/router/" => "https://github.com/acme/router/blob/main/"`
    pub url_map: BTreeMap<String, String>,

    pub theme: Theme,
}

/// A routes page being generated.
pub struct MarkupDoc<'a> {
    pub opts: MarkupOpts,
    router: Option<&'a dyn Routes>,
    builder: Option<DocBuilder>,
    doc: Doc,
    routes: BTreeMap<String, DocRouter>,
    formatted_html: String,
}

impl<'a> MarkupDoc<'a> {
    pub fn new(router: Option<&'a dyn Routes>, opts: MarkupOpts) -> Self {
        Self {
            opts,
            router,
            builder: None,
            doc: Doc::default(),
            routes: BTreeMap::new(),
            formatted_html: String::new(),
        }
    }

    /// Uses `builder` instead of one configured from the environment.
    pub fn with_builder(mut self, builder: DocBuilder) -> Self {
        self.builder = Some(builder);
        self
    }

    /// Builds the doc tree, flattens it and renders the page.
    ///
    /// # Errors
    ///
    /// [`Error::NilRouter`] without a router, or a configuration error when
    /// no builder was supplied and none can be derived from the environment.
    pub fn generate(&mut self) -> Result<()> {
        let router = self.router.ok_or(Error::NilRouter)?;
        let builder = match self.builder.take() {
            Some(builder) => builder,
            None => DocBuilder::from_env()?,
        };
        self.doc = builder.build_doc(router);
        self.builder = Some(builder);

        self.routes = BTreeMap::new();
        flatten_routes("", &[], &self.doc.router, &mut self.routes);
        debug!("Flattened {} routes", self.routes.len());

        let routes_html = self.write_routes();
        let css = match self.opts.theme {
            Theme::Milligram => milligram_min_css(),
            Theme::Bass => bass_css(),
        };
        self.formatted_html = replace_placeholders(
            base_template(),
            &[
                ("{title}", self.opts.project_path.as_str()),
                ("{css}", css),
                ("{intro}", self.opts.intro.as_str()),
                ("{routes}", routes_html.as_str()),
                ("{favicon.ico}", favicon_ico_data()),
            ],
        );

        Ok(())
    }

    pub fn doc(&self) -> &Doc {
        &self.doc
    }

    /// Flattened route keys in output order.
    pub fn route_paths(&self) -> Vec<&str> {
        self.routes.keys().map(String::as_str).collect()
    }

    /// A detached copy of the tree recorded for one flattened route.
    pub fn route_tree(&self, path: &str) -> Option<DocRouter> {
        self.routes.get(path).map(copy_doc_router)
    }

    fn write_routes(&self) -> String {
        let mut buf = head(2, "Routes");

        for (pattern, dr) in &self.routes {
            buf.push_str("<details>\n");
            buf.push_str(&format!("<summary>`{}`</summary>\n", pattern));
            buf.push_str(&self.render_router(dr));
            buf.push_str("</details>\n");
        }

        buf.push_str(&format!("\nTotal # of routes: {}\n", self.routes.len()));
        buf
    }

    fn render_router(&self, dr: &DocRouter) -> String {
        let middlewares = self.render_middlewares(&dr.middlewares);

        let routes: String = dr
            .routes
            .iter()
            .map(|(pattern, rt)| match &rt.router {
                Some(nested) => list_item(&format!("{}{}", pattern, self.render_router(nested))),
                None => {
                    let methods: String = rt
                        .handlers
                        .iter()
                        .map(|(method, dh)| {
                            list_item(&format!(
                                "{} {}<br />{}",
                                method,
                                self.func_link(&dh.func_info),
                                div(&self.render_middlewares(&dh.middlewares))
                            ))
                        })
                        .collect();
                    list_item(&format!("{}<br />{}", pattern, unordered_list(&methods)))
                }
            })
            .collect();

        format!(
            "{}{}{}{}",
            head(3, "Middlewares"),
            div(&middlewares),
            head(3, "Routes"),
            div(&unordered_list(&routes))
        )
    }

    fn render_middlewares(&self, middlewares: &[DocMiddleware]) -> String {
        let items: String = middlewares
            .iter()
            .map(|mw| list_item(&self.func_link(&mw.func_info)))
            .collect();
        unordered_list(&items)
    }

    fn func_link(&self, fi: &FuncInfo) -> String {
        format!("[{}]({})", fi.func, self.source_url(&fi.file, fi.line))
    }

    /// Link to a function's source, or an empty string when there is none.
    ///
    /// URL map prefixes are tried first, then the project path (producing
    /// a relative link), then the file is taken as a host-qualified path.
    pub fn source_url(&self, file: &str, line: usize) -> String {
        if file.is_empty() {
            return String::new();
        }
        if !file.starts_with("github.com/") && !self.opts.force_relative_links {
            return String::new();
        }
        if self.opts.project_path.is_empty() {
            return String::new();
        }

        for (pkg, url) in &self.opts.url_map {
            if let Some(idx) = file.find(pkg.as_str()) {
                let rest = file[idx + pkg.len()..].trim_start_matches('/');
                return format!("{}/{}#L{}", url.trim_end_matches('/'), rest, line);
            }
        }

        if let Some(idx) = file.find(self.opts.project_path.as_str()) {
            return format!("{}#L{}", &file[idx + self.opts.project_path.len()..], line);
        }

        format!("https://{}#L{}", file, line)
    }
}

impl fmt::Display for MarkupDoc<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.formatted_html)
    }
}

/// Renders the routes page for `router` with environment-derived
/// configuration. Failures are reported inline as `ERROR: <message>`.
pub fn markup_routes_doc(router: &dyn Routes, opts: MarkupOpts) -> String {
    let mut mu = MarkupDoc::new(Some(router), opts);
    if let Err(e) = mu.generate() {
        return format!("ERROR: {}\n", e);
    }
    mu.to_string()
}

#[derive(Clone, Copy)]
struct Level<'d> {
    pattern: &'d str,
    middlewares: &'d [DocMiddleware],
}

/// Records one entry per leaf route, keyed by the full path. Each call
/// owns its ancestor list, so recorded entries never share state with the
/// walk that produced them.
fn flatten_routes<'d>(
    prefix: &str,
    ancestors: &[Level<'d>],
    dr: &'d DocRouter,
    out: &mut BTreeMap<String, DocRouter>,
) {
    for (pat, rt) in &dr.routes {
        let pattern = format!("{}{}", prefix, pat);
        let mut levels = ancestors.to_vec();
        levels.push(Level {
            pattern: pat,
            middlewares: &dr.middlewares,
        });

        if let Some(nested) = &rt.router {
            flatten_routes(&pattern, &levels, nested, out);
        } else if !rt.handlers.is_empty() {
            // A "/" leaf documents its parent's path
            let key = if pat == "/" && pattern.len() > 1 {
                pattern[..pattern.len() - 1].to_string()
            } else {
                pattern
            };
            out.insert(key, route_chain(&levels, rt));
        } else {
            warn!("Skipping {}: route has neither handlers nor a sub-router", pattern);
        }
    }
}

fn route_chain(levels: &[Level<'_>], leaf: &DocRoute) -> DocRouter {
    let Some((last, parents)) = levels.split_last() else {
        return DocRouter::default();
    };

    let innermost = DocRouter {
        middlewares: last.middlewares.to_vec(),
        routes: BTreeMap::from([(last.pattern.to_string(), leaf.clone())]),
    };
    parents.iter().rev().fold(innermost, |inner, level| DocRouter {
        middlewares: level.middlewares.to_vec(),
        routes: BTreeMap::from([(
            level.pattern.to_string(),
            DocRoute::nested(level.pattern, inner),
        )]),
    })
}

/// Substitutes every placeholder in one pass, so substituted text is never
/// scanned for further placeholders.
fn replace_placeholders(template: &str, pairs: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    'scan: while let Some(start) = rest.find('{') {
        out.push_str(&rest[..start]);
        let candidate = &rest[start..];
        for (placeholder, value) in pairs {
            if candidate.starts_with(placeholder) {
                out.push_str(value);
                rest = &candidate[placeholder.len()..];
                continue 'scan;
            }
        }
        out.push('{');
        rest = &candidate[1..];
    }
    out.push_str(rest);
    out
}
