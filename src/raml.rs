//! RAML 1.0 documents.
//!
//! Resources form a tree keyed by `"/segment"`; the node at the end of a
//! route holds one resource per lowercased HTTP method.

use crate::error::{Error, Result};
use crate::funcinfo::FunctionResolver;
use crate::mux::{walk, HandlerRef, Middleware, Routes};
use crate::serializer::serialize_yaml;
use log::debug;
use serde::Serialize;
use std::collections::btree_map::Entry;
use std::collections::BTreeMap;

const HEADER: &str = "#%RAML 1.0\n---\n";

/// Path segment or lowercased method to resource.
pub type Resources = BTreeMap<String, Resource>;

/// Status code to response.
pub type Responses = BTreeMap<u16, Response>;

/// Content type to example.
pub type Body = BTreeMap<String, Example>;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Raml {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub title: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub base_uri: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub protocols: Vec<String>,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub media_type: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub version: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub documentation: Vec<Documentation>,

    #[serde(flatten)]
    pub resources: Resources,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Documentation {
    pub title: String,
    pub content: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Resource {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub display_name: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub description: String,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub responses: Responses,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub body: Body,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub is: Vec<String>,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub example: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub secured_by: Vec<String>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub uri_parameters: Body,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub query_parameters: Body,

    #[serde(flatten)]
    pub resources: Resources,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Response {
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub body: Body,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Example {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub example: String,
    #[serde(rename = "type", skip_serializing_if = "String::is_empty")]
    pub type_: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub description: String,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub required: bool,
}

impl Raml {
    /// Registers `resource` for `method` at `route`, creating intermediate
    /// segments. A method already registered at that route keeps its first
    /// resource.
    pub fn add(&mut self, method: &str, route: &str, resource: Resource) {
        upsert(&mut self.resources, method, route, resource);
    }

    /// Like [`add`](Self::add), but nests the route below the top-level
    /// node keyed by the literal `parent_route`.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidParent`] when `parent_route` is empty or `/`, or is
    /// not a prefix of `route`.
    pub fn add_under(
        &mut self,
        parent_route: &str,
        method: &str,
        route: &str,
        resource: Resource,
    ) -> Result<()> {
        if parent_route.is_empty() || parent_route == "/" {
            return Err(Error::InvalidParent {
                parent: parent_route.to_string(),
                reason: "parent route can't be empty or '/'",
            });
        }
        let Some(rest) = route.strip_prefix(parent_route) else {
            return Err(Error::InvalidParent {
                parent: parent_route.to_string(),
                reason: "parent route must prefix the route",
            });
        };
        let rest = if rest.is_empty() { "/" } else { rest };

        let parent = self.resources.entry(parent_route.to_string()).or_default();
        upsert(&mut parent.resources, method, rest, resource);
        Ok(())
    }

    /// Adds every method binding of `routes`, describing each handler with
    /// its resolved doc comment.
    pub fn add_routes(&mut self, routes: &dyn Routes, resolver: &FunctionResolver) -> Result<()> {
        walk(
            routes,
            &mut |method: &str, route: &str, handler: &HandlerRef, _middlewares: &[Middleware]| {
                let info = resolver.resolve(handler.callable());
                self.add(
                    method,
                    route,
                    Resource {
                        description: info.comment,
                        ..Resource::default()
                    },
                );
                Ok::<(), Error>(())
            },
        )
    }

    /// The document as RAML: the version header followed by YAML.
    pub fn to_raml_string(&self) -> Result<String> {
        Ok(format!("{}{}", HEADER, serialize_yaml(self)?))
    }
}

fn upsert(resources: &mut Resources, method: &str, route: &str, resource: Resource) {
    let mut node = resources;
    for part in route.split('/').filter(|part| !part.is_empty()) {
        node = &mut node.entry(format!("/{}", part)).or_default().resources;
    }

    match node.entry(method.to_lowercase()) {
        Entry::Occupied(_) => debug!("{} {} already documented", method, route),
        Entry::Vacant(slot) => {
            slot.insert(resource);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::funcinfo::ResolverConfig;
    use crate::mux::{Mux, Request, Response as HttpResponse};
    use crate::source_index::SourceIndex;
    use pretty_assertions::assert_eq;
    use std::path::Path;

    // list_articles returns every article.
    fn list_articles(_req: &Request) -> HttpResponse {
        HttpResponse::new(Vec::new())
    }

    fn described(text: &str) -> Resource {
        Resource {
            description: text.to_string(),
            ..Resource::default()
        }
    }

    #[test]
    fn test_add_builds_segment_tree() {
        let mut raml = Raml::default();
        raml.add("GET", "/articles/{id}", described("one"));

        let articles = &raml.resources["/articles"];
        let article = &articles.resources["/{id}"];
        assert_eq!(article.resources["get"].description, "one");
    }

    #[test]
    fn test_add_root_route_lands_at_top_level() {
        let mut raml = Raml::default();
        raml.add("GET", "/", described("root"));

        assert_eq!(raml.resources["get"].description, "root");
    }

    #[test]
    fn test_first_registration_wins() {
        let mut raml = Raml::default();
        raml.add("GET", "/ping", described("first"));
        let before = raml.clone();
        raml.add("get", "/ping", described("second"));

        assert_eq!(raml, before);
        assert_eq!(raml.resources["/ping"].resources["get"].description, "first");
    }

    #[test]
    fn test_add_under_nests_below_literal_parent() {
        let mut raml = Raml::default();
        raml.add_under("/admin", "GET", "/admin/users/{id}", described("user"))
            .unwrap();
        raml.add_under("/admin", "GET", "/admin", described("index"))
            .unwrap();

        let admin = &raml.resources["/admin"];
        assert_eq!(admin.resources["get"].description, "index");
        assert_eq!(
            admin.resources["/users"].resources["/{id}"].resources["get"].description,
            "user"
        );
    }

    #[test]
    fn test_add_under_rejects_bad_parents() {
        let mut raml = Raml::default();

        for parent in ["", "/"] {
            let err = raml
                .add_under(parent, "GET", "/x", Resource::default())
                .unwrap_err();
            assert!(matches!(err, Error::InvalidParent { .. }));
        }
        let err = raml
            .add_under("/admin", "GET", "/users", Resource::default())
            .unwrap_err();
        assert!(matches!(err, Error::InvalidParent { .. }));
        assert!(raml.resources.is_empty());
    }

    #[test]
    fn test_to_raml_string_has_header_and_omits_empty_fields() {
        let mut raml = Raml {
            title: "Big Mux".to_string(),
            base_uri: "https://bigmux.example.com".to_string(),
            media_type: "application/json".to_string(),
            version: "v1.0".to_string(),
            ..Raml::default()
        };
        raml.add("GET", "/ping", described("pong"));

        let out = raml.to_raml_string().unwrap();

        assert!(out.starts_with("#%RAML 1.0\n---\n"));
        assert!(out.contains("title: Big Mux"));
        assert!(out.contains("baseUri: https://bigmux.example.com"));
        assert!(out.contains("mediaType: application/json"));
        assert!(out.contains("description: pong"));
        assert!(!out.contains("protocols"));
        assert!(!out.contains("displayName"));
        assert!(!out.contains("securedBy"));
    }

    #[test]
    fn test_add_routes_walks_table() {
        let resolver = FunctionResolver::new(ResolverConfig::new(
            Path::new(env!("CARGO_MANIFEST_DIR")).join("src"),
        ));
        let mut r = Mux::new();
        r.handle_fn("/any", list_articles);
        r.route("/articles", |r| {
            r.get("/", list_articles);
        });

        let mut raml = Raml::default();
        raml.add_routes(&r, &resolver).unwrap();

        let articles = &raml.resources["/articles"];
        assert_eq!(
            articles.resources["get"].description,
            "list_articles returns every article.\n"
        );
        // The catch-all is skipped; each standard method is documented
        let any = &raml.resources["/any"];
        assert!(!any.resources.contains_key("*"));
        assert!(any.resources.contains_key("get"));
        assert!(any.resources.contains_key("delete"));
    }

    #[test]
    fn test_add_routes_without_sources_leaves_descriptions_empty() {
        let resolver = FunctionResolver::with_index(
            ResolverConfig::new("/nowhere"),
            SourceIndex::empty("/nowhere"),
        );
        let mut r = Mux::new();
        r.get("/ping", list_articles);

        let mut raml = Raml::default();
        raml.add_routes(&r, &resolver).unwrap();

        assert_eq!(raml.resources["/ping"].resources["get"], Resource::default());
    }
}
