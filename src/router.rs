//! Radix-tree request router and route-table composition.
//!
//! One `matchit` tree per HTTP method. O(path-length) lookup. The router only
//! ever stores fully composed handlers: every middleware layer is folded in
//! once by [`Router::apply`] before the first request is served.

use std::borrow::Cow;
use std::collections::HashMap;

use http::header::{ALLOW, HeaderValue};
use http::{Method, StatusCode};
use matchit::Router as MatchitRouter;
use percent_encoding::percent_decode_str;
use tracing::{debug, info};

use crate::config::Config;
use crate::error::Error;
use crate::handler::Next;
use crate::request::Request;
use crate::response::Response;

/// The application router.
///
/// Build it once at startup with [`Router::apply`]; pass it to
/// [`Server::serve`](crate::Server::serve).
#[derive(Default)]
pub struct Router {
    routes: HashMap<Method, MatchitRouter<Next>>,
    len: usize,
}

/// Outcome of a lookup, before the handler runs.
enum Lookup {
    Found(Next, HashMap<String, String>),
    MethodNotAllowed(Vec<Method>),
    NotFound,
}

impl Router {
    pub fn new() -> Self {
        Self::default()
    }

    /// Composes every route in `config` and registers it.
    ///
    /// Standalone routes are registered first, then each group, all in
    /// declaration order. Each route's handler is wrapped as
    /// global ▶ group ▶ route ▶ handler, and registered at
    /// `base_path + group prefix + route path`.
    ///
    /// Fails on the first route the underlying tree rejects, e.g. the same
    /// method and path declared twice.
    pub fn apply(config: Config) -> Result<Self, Error> {
        let Config { base_path, pipeline, routes, groups } = config;
        let mut router = Self::new();

        for route in &routes {
            let handler = pipeline.compose(route.compose());
            let path = join(&[&base_path, &route.path]);
            let layers = pipeline.len() + route.pipeline.len();
            router.register(route.method.clone(), &path, handler, layers)?;
        }

        for group in &groups {
            group.apply(&base_path, &pipeline, &mut router)?;
        }

        info!(routes = router.len, "route table composed");
        Ok(router)
    }

    /// Registers an already composed handler for a method + path pair.
    ///
    /// Path parameters use `{name}` syntax: `req.param("name")` retrieves them.
    pub fn handle(&mut self, method: Method, path: &str, handler: Next) -> Result<(), Error> {
        self.insert(&method, path, handler)?;
        debug!(%method, path, "route registered");
        Ok(())
    }

    /// Registration from [`Router::apply`]; `layers` is the number of
    /// middleware folded into `handler` across all scopes.
    pub(crate) fn register(
        &mut self,
        method: Method,
        path: &str,
        handler: Next,
        layers: usize,
    ) -> Result<(), Error> {
        self.insert(&method, path, handler)?;
        debug!(%method, path, layers, "route registered");
        Ok(())
    }

    fn insert(&mut self, method: &Method, path: &str, handler: Next) -> Result<(), Error> {
        self.routes
            .entry(method.clone())
            .or_default()
            .insert(path, handler)
            .map_err(|e| Error::route(method.clone(), path, e))?;
        self.len += 1;
        Ok(())
    }

    /// Number of registered method + path pairs.
    pub fn len(&self) -> usize { self.len }
    pub fn is_empty(&self) -> bool { self.len == 0 }

    /// Routes `req` and runs the matching handler.
    ///
    /// Answers `404 Not Found` when no method has the path and
    /// `405 Method Not Allowed` (with an `allow` header) when only other
    /// methods do.
    pub async fn dispatch(&self, mut req: Request) -> Response {
        match self.lookup(&req.method, &req.path) {
            Lookup::Found(handler, params) => {
                req.params = params;
                handler.run(req).await
            }
            Lookup::MethodNotAllowed(allowed) => {
                let allow = allowed.iter().map(Method::as_str).collect::<Vec<_>>().join(", ");
                let mut res = Response::status(StatusCode::METHOD_NOT_ALLOWED);
                if let Ok(value) = HeaderValue::from_str(&allow) {
                    res.headers.insert(ALLOW, value);
                }
                res
            }
            Lookup::NotFound => Response::status(StatusCode::NOT_FOUND),
        }
    }

    fn lookup(&self, method: &Method, path: &str) -> Lookup {
        if let Some(matched) = self.routes.get(method).and_then(|tree| tree.at(path).ok()) {
            let params = matched.params.iter()
                .map(|(k, v)| (k.to_owned(), decode(v)))
                .collect();
            return Lookup::Found(matched.value.clone(), params);
        }

        let mut allowed: Vec<Method> = self.routes.iter()
            .filter(|(m, tree)| *m != method && tree.at(path).is_ok())
            .map(|(m, _)| m.clone())
            .collect();

        if allowed.is_empty() {
            return Lookup::NotFound;
        }
        allowed.sort_by(|a, b| a.as_str().cmp(b.as_str()));
        Lookup::MethodNotAllowed(allowed)
    }
}

/// Percent-decodes a matched segment. Values that do not decode to UTF-8
/// are kept as sent.
fn decode(raw: &str) -> String {
    percent_decode_str(raw)
        .decode_utf8()
        .map_or_else(|_| raw.to_owned(), Cow::into_owned)
}

/// Concatenates path segments as declared. An empty result maps to `/`.
pub(crate) fn join(parts: &[&str]) -> String {
    let path = parts.concat();
    if path.is_empty() { "/".to_owned() } else { path }
}

#[cfg(test)]
mod tests {
    use bytes::Bytes;

    use super::*;
    use crate::group::Group;
    use crate::middleware::{Middleware, Pipeline, from_fn};
    use crate::route::Route;

    /// Accumulated middleware names, space separated.
    #[derive(Clone)]
    struct Trace(String);

    fn tag(name: &'static str) -> impl Middleware {
        from_fn(move |mut req: Request, next: Next| async move {
            let trace = match req.context().get::<Trace>() {
                Some(Trace(prev)) => format!("{prev} {name}"),
                None => name.to_owned(),
            };
            req.context_mut().insert(Trace(trace));
            next.run(req).await
        })
    }

    async fn echo_trace(req: Request) -> String {
        req.context()
            .get::<Trace>()
            .map_or_else(|| "null".to_owned(), |t| t.0.clone())
    }

    async fn send(router: &Router, method: Method, path: &str) -> Response {
        let req = http::Request::builder()
            .method(method)
            .uri(path)
            .body(Bytes::new())
            .unwrap();
        router.dispatch(Request::from(req)).await
    }

    async fn body(router: &Router, path: &str) -> String {
        let res = send(router, Method::GET, path).await;
        String::from_utf8(res.body().to_vec()).unwrap()
    }

    #[tokio::test]
    async fn standalone_route_runs_global_then_route_layers() {
        let config = Config::new()
            .route(Route::get("/route", echo_trace).with(tag("route")).with(tag("route2")))
            .with(tag("global"))
            .with(tag("global2"));

        let router = Router::apply(config).unwrap();

        assert_eq!(body(&router, "/route").await, "global global2 route route2");
    }

    #[tokio::test]
    async fn grouped_route_runs_global_group_route_layers() {
        let group = Group::new("")
            .with(tag("group"))
            .with(tag("group2"))
            .route(Route::get("/route", echo_trace).with(tag("route")).with(tag("route2")));
        let config = Config::new().group(group).with(tag("global")).with(tag("global2"));

        let router = Router::apply(config).unwrap();

        assert_eq!(body(&router, "/route").await, "global global2 group group2 route route2");
    }

    #[tokio::test]
    async fn no_pipeline_leaves_handler_untouched() {
        let config = Config::new().route(Route::get("/route", echo_trace));
        let router = Router::apply(config).unwrap();

        assert_eq!(body(&router, "/route").await, "null");
    }

    #[tokio::test]
    async fn pipelines_set_as_values_nest_the_same_way() {
        let group = Group::new("/g")
            .pipeline(Pipeline::new().with(tag("Gr1")).with(tag("Gr2")))
            .route(
                Route::get("/r", echo_trace)
                    .pipeline(Pipeline::new().with(tag("R1")).with(tag("R2"))),
            );
        let config = Config::new()
            .pipeline(Pipeline::new().with(tag("G1")).with(tag("G2")))
            .group(group);

        let router = Router::apply(config).unwrap();

        assert_eq!(body(&router, "/g/r").await, "G1 G2 Gr1 Gr2 R1 R2");
    }

    #[tokio::test]
    async fn global_layers_do_not_leak_between_routes() {
        let config = Config::new()
            .with(tag("global"))
            .route(Route::get("/a", echo_trace).with(tag("a")))
            .route(Route::get("/b", echo_trace));

        let router = Router::apply(config).unwrap();

        assert_eq!(body(&router, "/a").await, "global a");
        assert_eq!(body(&router, "/b").await, "global");
        assert_eq!(body(&router, "/a").await, "global a");
    }

    #[tokio::test]
    async fn paths_concatenate_base_prefix_and_route() {
        async fn show(req: Request) -> String {
            req.param("id").unwrap_or("none").to_owned()
        }

        let config = Config::new()
            .base_path("/api")
            .route(Route::get("/healthz", |_req: Request| async { "ok" }))
            .group(Group::new("/users").route(Route::get("/{id}", show)));

        let router = Router::apply(config).unwrap();

        assert_eq!(router.len(), 2);
        assert_eq!(body(&router, "/api/healthz").await, "ok");
        assert_eq!(body(&router, "/api/users/42").await, "42");
        assert_eq!(send(&router, Method::GET, "/users/42").await.status_code(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn empty_path_registers_root() {
        let config = Config::new().group(Group::new("").route(Route::get("", |_req: Request| async { "root" })));
        let router = Router::apply(config).unwrap();

        assert_eq!(body(&router, "/").await, "root");
    }

    #[tokio::test]
    async fn other_method_answers_405_with_allow() {
        let config = Config::new()
            .route(Route::post("/items", |_req: Request| async { "created" }))
            .route(Route::delete("/items", |_req: Request| async { "gone" }));
        let router = Router::apply(config).unwrap();

        let res = send(&router, Method::GET, "/items").await;

        assert_eq!(res.status_code(), StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(res.headers()[ALLOW], "DELETE, POST");
    }

    #[test]
    fn duplicate_route_fails_apply() {
        let config = Config::new()
            .route(Route::get("/dup", echo_trace))
            .group(Group::new("/d").route(Route::get("up", echo_trace)));

        let err = Router::apply(config).err().unwrap();

        assert!(err.is_route());
        assert!(err.to_string().contains("GET /dup"), "{err}");
    }

    #[test]
    fn same_path_different_methods_is_fine() {
        let config = Config::new()
            .route(Route::get("/x", echo_trace))
            .route(Route::put("/x", echo_trace))
            .route(Route::patch("/x", echo_trace));

        assert_eq!(Router::apply(config).unwrap().len(), 3);
    }

    #[tokio::test]
    async fn params_are_percent_decoded() {
        async fn show(req: Request) -> String {
            req.param("name").unwrap_or("none").to_owned()
        }

        let router = Router::apply(Config::new().route(Route::get("/users/{name}", show))).unwrap();

        assert_eq!(body(&router, "/users/a%20b").await, "a b");
        assert_eq!(body(&router, "/users/caf%C3%A9").await, "caf\u{e9}");
        // Not UTF-8 once decoded: passed through untouched.
        assert_eq!(body(&router, "/users/%FF").await, "%FF");
    }

    /// Collects formatted log output for assertions.
    #[derive(Clone, Default)]
    struct Captured(std::sync::Arc<std::sync::Mutex<Vec<u8>>>);

    impl std::io::Write for Captured {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn registration_log_counts_layers_across_scopes() {
        let captured = Captured::default();
        let writer = captured.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_ansi(false)
            .with_writer(move || writer.clone())
            .finish();

        let config = Config::new()
            .with(tag("g1"))
            .route(Route::get("/solo", echo_trace).with(tag("r1")).with(tag("r2")))
            .group(Group::new("/grp").with(tag("gr1")).route(Route::get("/in", echo_trace).with(tag("r1"))));

        tracing::subscriber::with_default(subscriber, || Router::apply(config).unwrap());

        let logs = String::from_utf8(captured.0.lock().unwrap().clone()).unwrap();
        let line = |path: &str| {
            logs.lines()
                .find(|l| l.contains("route registered") && l.contains(path))
                .unwrap_or_else(|| panic!("no registration line for {path}:\n{logs}"))
                .to_owned()
        };
        assert!(line("path=\"/solo\"").contains("layers=3"), "{logs}");
        assert!(line("path=\"/grp/in\"").contains("layers=3"), "{logs}");
    }
}
