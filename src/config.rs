//! Declarative route table.
//!
//! A [`Config`] is plain data: a base path, the global pipeline, standalone
//! routes, and groups. Nothing is composed until it is handed to
//! [`Router::apply`](crate::Router::apply), which consumes it.

use crate::group::Group;
use crate::middleware::{Middleware, Pipeline};
use crate::route::Route;

/// Everything the router needs to build its table.
///
/// ```rust
/// # use strata::{Config, Group, Request, Route, Router, middleware};
/// # async fn health(_: Request) -> &'static str { "ok" }
/// # async fn show(_: Request) -> &'static str { "" }
/// let config = Config::new()
///     .base_path("/api")
///     .with(middleware::trace())
///     .route(Route::get("/healthz", health))
///     .group(Group::new("/users").route(Route::get("/{id}", show)));
///
/// let router = Router::apply(config).expect("route table");
/// ```
#[derive(Clone, Debug, Default)]
pub struct Config {
    pub(crate) base_path: String,
    pub(crate) pipeline: Pipeline,
    pub(crate) routes: Vec<Route>,
    pub(crate) groups: Vec<Group>,
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    /// Prefix prepended to every registered path. Empty by default.
    pub fn base_path(mut self, base_path: impl Into<String>) -> Self {
        self.base_path = base_path.into();
        self
    }

    /// Appends a global middleware. Global layers wrap every route.
    pub fn with(mut self, middleware: impl Middleware) -> Self {
        self.pipeline.push(middleware);
        self
    }

    /// Replaces the global pipeline.
    pub fn pipeline(mut self, pipeline: Pipeline) -> Self {
        self.pipeline = pipeline;
        self
    }

    pub fn route(mut self, route: Route) -> Self {
        self.routes.push(route);
        self
    }

    pub fn group(mut self, group: Group) -> Self {
        self.groups.push(group);
        self
    }
}
