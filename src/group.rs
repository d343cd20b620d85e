//! Route groups: a shared path prefix and a shared pipeline.

use tracing::debug;

use crate::error::Error;
use crate::middleware::{Middleware, Pipeline};
use crate::route::Route;
use crate::router::{Router, join};

/// A set of routes under one prefix.
///
/// The group pipeline wraps each route's own pipeline, so for every route in
/// the group the nesting is group layers ▶ route layers ▶ handler.
///
/// ```rust
/// # use strata::{Group, Request, Route, middleware};
/// # async fn list(_: Request) -> &'static str { "" }
/// # async fn show(_: Request) -> &'static str { "" }
/// Group::new("/users")
///     .with(middleware::trace())
///     .route(Route::get("", list))
///     .route(Route::get("/{id}", show));
/// ```
#[derive(Clone, Debug, Default)]
pub struct Group {
    pub(crate) prefix: String,
    pub(crate) pipeline: Pipeline,
    pub(crate) routes: Vec<Route>,
}

impl Group {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self { prefix: prefix.into(), ..Self::default() }
    }

    /// Appends a group-scoped middleware. Returns `self` for chaining.
    pub fn with(mut self, middleware: impl Middleware) -> Self {
        self.pipeline.push(middleware);
        self
    }

    /// Replaces the group-scoped pipeline.
    pub fn pipeline(mut self, pipeline: Pipeline) -> Self {
        self.pipeline = pipeline;
        self
    }

    pub fn route(mut self, route: Route) -> Self {
        self.routes.push(route);
        self
    }

    pub fn prefix(&self) -> &str { &self.prefix }
    pub fn routes(&self) -> &[Route] { &self.routes }

    /// Composes route, group, then global layers around every route and
    /// registers the results in declaration order.
    pub(crate) fn apply(
        &self,
        base_path: &str,
        global: &Pipeline,
        router: &mut Router,
    ) -> Result<(), Error> {
        debug!(prefix = %self.prefix, routes = self.routes.len(), "applying group");

        for route in &self.routes {
            let handler = global.compose(self.pipeline.compose(route.compose()));
            let path = join(&[base_path, &self.prefix, &route.path]);
            let layers = global.len() + self.pipeline.len() + route.pipeline.len();
            router.register(route.method.clone(), &path, handler, layers)?;
        }
        Ok(())
    }
}
