//! A single route declaration.

use http::Method;

use crate::handler::{Handler, Next};
use crate::middleware::{Middleware, Pipeline};

/// Method, path, handler, and the middleware that applies to this route only.
///
/// ```rust
/// # use strata::{Request, Route, middleware};
/// # async fn get_user(_: Request) -> &'static str { "" }
/// Route::get("/users/{id}", get_user).with(middleware::trace());
/// ```
#[derive(Clone, Debug)]
pub struct Route {
    pub(crate) method: Method,
    pub(crate) path: String,
    pub(crate) handler: Next,
    pub(crate) pipeline: Pipeline,
}

impl Route {
    pub fn new(method: Method, path: impl Into<String>, handler: impl Handler) -> Self {
        Self {
            method,
            path: path.into(),
            handler: Next::new(handler),
            pipeline: Pipeline::new(),
        }
    }

    pub fn get(path: impl Into<String>, handler: impl Handler) -> Self {
        Self::new(Method::GET, path, handler)
    }

    pub fn post(path: impl Into<String>, handler: impl Handler) -> Self {
        Self::new(Method::POST, path, handler)
    }

    pub fn put(path: impl Into<String>, handler: impl Handler) -> Self {
        Self::new(Method::PUT, path, handler)
    }

    pub fn patch(path: impl Into<String>, handler: impl Handler) -> Self {
        Self::new(Method::PATCH, path, handler)
    }

    pub fn delete(path: impl Into<String>, handler: impl Handler) -> Self {
        Self::new(Method::DELETE, path, handler)
    }

    /// Appends a route-scoped middleware. Returns `self` for chaining.
    pub fn with(mut self, middleware: impl Middleware) -> Self {
        self.pipeline.push(middleware);
        self
    }

    /// Replaces the route-scoped pipeline.
    pub fn pipeline(mut self, pipeline: Pipeline) -> Self {
        self.pipeline = pipeline;
        self
    }

    pub fn method(&self) -> &Method { &self.method }
    pub fn path(&self) -> &str { &self.path }

    /// The handler wrapped in this route's own pipeline, without any group or
    /// global layers.
    pub fn compose(&self) -> Next {
        self.pipeline.compose(self.handler.clone())
    }
}

#[cfg(test)]
mod tests {
    use bytes::Bytes;

    use super::*;
    use crate::middleware::from_fn;
    use crate::request::Request;

    fn suffix(s: &'static str) -> impl Middleware {
        from_fn(move |req: Request, next: Next| async move {
            let res = next.run(req).await;
            format!("{}{s}", String::from_utf8_lossy(res.body()))
        })
    }

    #[tokio::test]
    async fn compose_applies_only_route_layers() {
        let route = Route::get("/r", |_req: Request| async { "h" })
            .with(suffix("1"))
            .with(suffix("2"));

        let req = Request::from(http::Request::get("/r").body(Bytes::new()).unwrap());
        let res = route.compose().run(req).await;

        // Inner layer finishes first on the way out.
        assert_eq!(res.body(), b"h21");
        assert_eq!(route.method(), Method::GET);
        assert_eq!(route.path(), "/r");
    }
}
