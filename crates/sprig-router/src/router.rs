//! Route tables, compiled routes, and request dispatch.

use std::fmt;

use indexmap::IndexMap;
use sprig_core::{RawAttributes, RouteError};
use tracing::debug;

use crate::client::ApiMap;
use crate::pattern::{parse_declaration, parse_query, Method, Params, PathPattern};

/// Ordered `action name -> route` table as declared on a component.
pub type RouteTable<H> = IndexMap<String, RouteSpec<H>>;

/// A declared server action: method, path pattern, and handler.
///
/// The pattern is validated when the table is compiled.
#[derive(Clone)]
pub struct RouteSpec<H> {
    method: Method,
    pattern: String,
    handler: H,
    target: Option<String>,
    swap: Option<String>,
}

impl<H> RouteSpec<H> {
    pub fn new(method: Method, pattern: impl Into<String>, handler: H) -> Self {
        Self {
            method,
            pattern: pattern.into(),
            handler,
            target: None,
            swap: None,
        }
    }

    pub fn get(pattern: impl Into<String>, handler: H) -> Self {
        Self::new(Method::Get, pattern, handler)
    }

    pub fn post(pattern: impl Into<String>, handler: H) -> Self {
        Self::new(Method::Post, pattern, handler)
    }

    pub fn put(pattern: impl Into<String>, handler: H) -> Self {
        Self::new(Method::Put, pattern, handler)
    }

    pub fn patch(pattern: impl Into<String>, handler: H) -> Self {
        Self::new(Method::Patch, pattern, handler)
    }

    pub fn delete(pattern: impl Into<String>, handler: H) -> Self {
        Self::new(Method::Delete, pattern, handler)
    }

    /// Build from a `"METHOD /path"` declaration.
    pub fn parse(declaration: &str, handler: H) -> Result<Self, RouteError> {
        let (method, pattern) = parse_declaration(declaration)?;
        Ok(Self::new(method, pattern, handler))
    }

    /// Element the response replaces on the client (`hx-target`).
    pub fn target(mut self, selector: impl Into<String>) -> Self {
        self.target = Some(selector.into());
        self
    }

    /// How the response is swapped in (`hx-swap`).
    pub fn swap(mut self, strategy: impl Into<String>) -> Self {
        self.swap = Some(strategy.into());
        self
    }

    pub fn method(&self) -> Method {
        self.method
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    pub fn handler(&self) -> &H {
        &self.handler
    }
}

impl<H> fmt::Debug for RouteSpec<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouteSpec")
            .field("method", &self.method)
            .field("pattern", &self.pattern)
            .field("target", &self.target)
            .field("swap", &self.swap)
            .finish_non_exhaustive()
    }
}

/// A route with its pattern compiled.
#[derive(Clone)]
pub struct CompiledRoute<H> {
    pub action: String,
    pub method: Method,
    pub pattern: PathPattern,
    pub handler: H,
    pub target: Option<String>,
    pub swap: Option<String>,
}

impl<H> CompiledRoute<H> {
    fn compile(action: &str, spec: &RouteSpec<H>) -> Result<Self, RouteError>
    where
        H: Clone,
    {
        Ok(Self {
            action: action.to_string(),
            method: spec.method,
            pattern: PathPattern::parse(&spec.pattern)?,
            handler: spec.handler.clone(),
            target: spec.target.clone(),
            swap: spec.swap.clone(),
        })
    }
}

impl<H> fmt::Debug for CompiledRoute<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompiledRoute")
            .field("action", &self.action)
            .field("method", &self.method)
            .field("pattern", &self.pattern.as_str())
            .finish_non_exhaustive()
    }
}

/// A successful dispatch.
#[derive(Debug)]
pub struct RouteMatch<'r, H> {
    pub route: &'r CompiledRoute<H>,
    pub params: Params,
    /// Decoded query string of the request path.
    pub query: RawAttributes,
}

impl<'r, H> RouteMatch<'r, H> {
    pub fn handler(&self) -> &'r H {
        &self.route.handler
    }

    pub fn action(&self) -> &'r str {
        &self.route.action
    }
}

/// What a handler sees of the request it serves.
#[derive(Debug, Clone, Copy)]
pub struct ActionContext<'a> {
    pub method: Method,
    /// Request path without the query string.
    pub path: &'a str,
    pub params: &'a Params,
    pub query: &'a RawAttributes,
    /// Decoded form fields sent with the request.
    pub form: &'a RawAttributes,
}

impl<'a> ActionContext<'a> {
    pub fn param(&self, name: &str) -> Option<&'a str> {
        self.params.get(name)
    }

    /// Path parameter, with an error naming the parameter if it is missing.
    pub fn require_param(&self, name: &str) -> Result<&'a str, RouteError> {
        self.param(name).ok_or_else(|| RouteError::InvalidPattern {
            pattern: self.path.to_string(),
            reason: format!("no parameter ':{}' bound", name),
        })
    }

    pub fn query(&self, name: &str) -> Option<&'a str> {
        self.query.get(name).map(String::as_str)
    }

    pub fn field(&self, name: &str) -> Option<&'a str> {
        self.form.get(name).map(String::as_str)
    }
}

/// Ordered list of compiled routes. The first matching route wins.
#[derive(Clone)]
pub struct Router<H> {
    routes: Vec<CompiledRoute<H>>,
}

impl<H> Default for Router<H> {
    fn default() -> Self {
        Self { routes: Vec::new() }
    }
}

impl<H> fmt::Debug for Router<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Router").field("routes", &self.routes).finish()
    }
}

impl<H> Router<H> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Compile a route table, keeping declaration order.
    pub fn compile(table: &RouteTable<H>) -> Result<Self, RouteError>
    where
        H: Clone,
    {
        let routes = table
            .iter()
            .map(|(action, spec)| CompiledRoute::compile(action, spec))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { routes })
    }

    /// Append another router's routes after this one's.
    pub fn extend(&mut self, other: Router<H>) {
        self.routes.extend(other.routes);
    }

    pub fn routes(&self) -> &[CompiledRoute<H>] {
        &self.routes
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// Find the first route matching `method` and `path`.
    ///
    /// `None` is the normal "not found" answer. The query string takes no part
    /// in matching.
    pub fn dispatch(&self, method: Method, path: &str) -> Option<RouteMatch<'_, H>> {
        let (path, query) = match path.split_once('?') {
            Some((path, query)) => (path, query),
            None => (path, ""),
        };
        let path = path.split('#').next().unwrap_or(path);

        let found = self.routes.iter().find_map(|route| {
            if route.method != method {
                return None;
            }
            route.pattern.matches(path).map(|params| (route, params))
        });

        match found {
            Some((route, params)) => Some(RouteMatch {
                route,
                params,
                query: parse_query(query.split('#').next().unwrap_or(query)),
            }),
            None => {
                debug!(%method, path, "no route matched");
                None
            }
        }
    }

    /// Client attribute generators for every route, keyed by action.
    ///
    /// If two routes share an action name the first is kept.
    pub fn api_map(&self) -> ApiMap {
        let mut api = ApiMap::default();
        for route in &self.routes {
            api.insert(route);
        }
        api
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(routes: Vec<(&str, RouteSpec<&'static str>)>) -> RouteTable<&'static str> {
        routes
            .into_iter()
            .map(|(action, spec)| (action.to_string(), spec))
            .collect()
    }

    fn items_router() -> Router<&'static str> {
        Router::compile(&table(vec![
            ("list", RouteSpec::get("/api/items", "list")),
            ("show", RouteSpec::get("/api/items/:id", "show")),
            ("remove", RouteSpec::delete("/api/items/:id", "remove")),
            ("create", RouteSpec::parse("POST /api/items", "create").unwrap()),
        ]))
        .unwrap()
    }

    #[test]
    fn test_dispatch_binds_params() {
        let router = items_router();
        let found = router.dispatch(Method::Get, "/api/items/42").unwrap();
        assert_eq!(found.action(), "show");
        assert_eq!(*found.handler(), "show");
        assert_eq!(found.params.get("id"), Some("42"));
    }

    #[test]
    fn test_dispatch_negative_results() {
        let router = items_router();
        assert!(router.dispatch(Method::Get, "/api/items/42/extra").is_none());
        assert!(router.dispatch(Method::Post, "/api/items/42").is_none());
        assert!(router.dispatch(Method::Patch, "/api/items").is_none());
        assert!(router.dispatch(Method::Get, "/nowhere").is_none());
    }

    #[test]
    fn test_method_selects_route() {
        let router = items_router();
        let found = router.dispatch(Method::Delete, "/api/items/7").unwrap();
        assert_eq!(found.action(), "remove");
        let found = router.dispatch(Method::Post, "/api/items").unwrap();
        assert_eq!(found.action(), "create");
    }

    #[test]
    fn test_first_registered_wins() {
        let router = Router::compile(&table(vec![
            ("byId", RouteSpec::get("/items/:id", "by-id")),
            ("latest", RouteSpec::get("/items/latest", "latest")),
        ]))
        .unwrap();
        let found = router.dispatch(Method::Get, "/items/latest").unwrap();
        assert_eq!(found.action(), "byId");
        assert_eq!(found.params.get("id"), Some("latest"));
    }

    #[test]
    fn test_query_is_ignored_for_matching() {
        let router = items_router();
        let found = router.dispatch(Method::Get, "/api/items?page=2&q=a+b").unwrap();
        assert_eq!(found.action(), "list");
        assert_eq!(found.query["page"], "2");
        assert_eq!(found.query["q"], "a b");
    }

    #[test]
    fn test_invalid_pattern_fails_compilation() {
        let err = Router::compile(&table(vec![("bad", RouteSpec::get("items/:id", "bad"))]))
            .unwrap_err();
        assert!(matches!(err, RouteError::InvalidPattern { pattern, .. } if pattern == "items/:id"));
    }

    #[test]
    fn test_extend_keeps_order() {
        let mut router = items_router();
        let other = Router::compile(&table(vec![("shadow", RouteSpec::get("/api/items", "shadow"))]))
            .unwrap();
        router.extend(other);
        assert_eq!(router.len(), 5);
        assert_eq!(router.dispatch(Method::Get, "/api/items").unwrap().action(), "list");
    }

    #[test]
    fn test_action_context_accessors() {
        let router = items_router();
        let found = router.dispatch(Method::Get, "/api/items/9?full=1").unwrap();
        let form = RawAttributes::from([("title".to_string(), "Milk".to_string())]);
        let ctx = ActionContext {
            method: Method::Get,
            path: "/api/items/9",
            params: &found.params,
            query: &found.query,
            form: &form,
        };
        assert_eq!(ctx.param("id"), Some("9"));
        assert_eq!(ctx.require_param("id").unwrap(), "9");
        assert!(ctx.require_param("slug").is_err());
        assert_eq!(ctx.query("full"), Some("1"));
        assert_eq!(ctx.field("title"), Some("Milk"));
    }
}
