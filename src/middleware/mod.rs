//! Middleware and composition.
//!
//! A [`Middleware`] receives the rest of the chain as a [`Next`] and returns a
//! new [`Next`] that may do work before and after calling it, or not call it
//! at all. A [`Pipeline`] is an ordered list of middleware, and [`compose`]
//! folds one around a handler:
//!
//! ```text
//! pipeline = [A, B, C]
//! compose(h, pipeline) == A(B(C(h)))
//!
//! request  ─▶ A ─▶ B ─▶ C ─▶ h
//! response ◀─ A ◀─ B ◀─ C ◀─┘
//! ```
//!
//! Index 0 is the outermost layer. The same rule applies at every scope, and
//! scopes nest as global ▶ group ▶ route ▶ handler (see [`Router::apply`]).
//!
//! [`Router::apply`]: crate::Router::apply
//!
//! Built-in middleware:
//! - [`trace()`]: per-request span with method, path, status, latency

mod trace;

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use crate::handler::Next;
use crate::request::Request;
use crate::response::IntoResponse;

pub use trace::trace;

// ── Middleware ────────────────────────────────────────────────────────────────

/// Wraps a downstream handler.
///
/// Any `Fn(Next) -> Next` closure is a middleware. Most of the time
/// [`from_fn`] is the more convenient way to write one.
pub trait Middleware: Send + Sync + 'static {
    fn apply(&self, next: Next) -> Next;
}

impl<F> Middleware for F
where
    F: Fn(Next) -> Next + Send + Sync + 'static,
{
    fn apply(&self, next: Next) -> Next {
        self(next)
    }
}

/// Builds a middleware from an async function of the request and the
/// downstream handler.
///
/// ```rust
/// use strata::middleware::{self, Middleware};
/// use strata::{Next, Request, Response, StatusCode};
///
/// fn require_token() -> impl Middleware {
///     middleware::from_fn(|req: Request, next: Next| async move {
///         if req.header("authorization").is_none() {
///             return Response::status(StatusCode::UNAUTHORIZED);
///         }
///         next.run(req).await
///     })
/// }
/// ```
pub fn from_fn<F, Fut, R>(f: F) -> impl Middleware
where
    F: Fn(Request, Next) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = R> + Send + 'static,
    R: IntoResponse + Send + 'static,
{
    let f = Arc::new(f);
    move |next: Next| -> Next {
        let f = Arc::clone(&f);
        Next::new(move |req: Request| (*f)(req, next.clone()))
    }
}

// ── Pipeline ──────────────────────────────────────────────────────────────────

/// An ordered list of middleware for one scope (global, group, or route).
///
/// Declaration order is nesting order: the first middleware added runs first
/// on the way in and last on the way out. Cloning is cheap; layers are shared.
#[derive(Clone, Default)]
pub struct Pipeline {
    layers: Vec<Arc<dyn Middleware>>,
}

impl Pipeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `middleware` as the new innermost layer. Returns `self` for chaining.
    pub fn with(mut self, middleware: impl Middleware) -> Self {
        self.push(middleware);
        self
    }

    pub fn push(&mut self, middleware: impl Middleware) {
        self.layers.push(Arc::new(middleware));
    }

    pub fn len(&self) -> usize { self.layers.len() }
    pub fn is_empty(&self) -> bool { self.layers.is_empty() }

    /// Same as [`compose(handler, self)`](compose).
    pub fn compose(&self, handler: Next) -> Next {
        compose(handler, self)
    }
}

impl fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pipeline").field("len", &self.len()).finish()
    }
}

// ── Composer ──────────────────────────────────────────────────────────────────

/// Wraps `handler` in every layer of `pipeline`, `pipeline[0]` outermost.
///
/// The fold starts from the handler and walks the layers back to front, so
/// the last layer is applied first and ends up innermost. An empty pipeline
/// returns `handler` itself. Pure: calling it twice yields two handlers with
/// the same behaviour.
pub fn compose(handler: Next, pipeline: &Pipeline) -> Next {
    pipeline
        .layers
        .iter()
        .rev()
        .fold(handler, |next, layer| layer.apply(next))
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use bytes::Bytes;

    use super::*;
    use crate::response::Response;

    type Log = Arc<Mutex<Vec<String>>>;

    fn request() -> Request {
        Request::from(http::Request::get("/").body(Bytes::new()).unwrap())
    }

    /// Records `"<name>:in"` before calling next and `"<name>:out"` after.
    fn record(name: &'static str, log: &Log) -> impl Middleware {
        let log = Arc::clone(log);
        from_fn(move |req: Request, next: Next| {
            let log = Arc::clone(&log);
            async move {
                log.lock().unwrap().push(format!("{name}:in"));
                let res = next.run(req).await;
                log.lock().unwrap().push(format!("{name}:out"));
                res
            }
        })
    }

    fn handler(log: &Log) -> Next {
        let log = Arc::clone(log);
        Next::new(move |_req: Request| {
            let log = Arc::clone(&log);
            async move {
                log.lock().unwrap().push("handler".to_owned());
                "done"
            }
        })
    }

    fn entries(log: &Log) -> Vec<String> {
        log.lock().unwrap().clone()
    }

    #[tokio::test]
    async fn empty_pipeline_is_identity() {
        let log = Log::default();
        let h = handler(&log);
        let composed = compose(h.clone(), &Pipeline::new());

        assert!(composed.ptr_eq(&h));
        let res = composed.run(request()).await;
        assert_eq!(res.body(), b"done");
        assert_eq!(entries(&log), ["handler"]);
    }

    #[tokio::test]
    async fn first_layer_is_outermost() {
        let log = Log::default();
        let pipeline = Pipeline::new().with(record("a", &log)).with(record("b", &log));

        compose(handler(&log), &pipeline).run(request()).await;

        assert_eq!(entries(&log), ["a:in", "b:in", "handler", "b:out", "a:out"]);
    }

    #[tokio::test]
    async fn every_layer_of_a_long_pipeline_runs() {
        let log = Log::default();
        let names = ["m0", "m1", "m2", "m3", "m4"];
        let mut pipeline = Pipeline::new();
        for name in names {
            pipeline.push(record(name, &log));
        }

        compose(handler(&log), &pipeline).run(request()).await;

        let ins: Vec<_> = entries(&log)
            .into_iter()
            .filter(|e| e.ends_with(":in"))
            .collect();
        assert_eq!(ins, ["m0:in", "m1:in", "m2:in", "m3:in", "m4:in"]);
        assert_eq!(entries(&log).len(), names.len() * 2 + 1);
    }

    #[tokio::test]
    async fn composing_twice_behaves_the_same() {
        let log = Log::default();
        let pipeline = Pipeline::new().with(record("a", &log)).with(record("b", &log));
        let h = handler(&log);

        let first = pipeline.compose(h.clone());
        let second = pipeline.compose(h);

        first.run(request()).await;
        let once = entries(&log);
        log.lock().unwrap().clear();
        second.run(request()).await;

        assert_eq!(entries(&log), once);
    }

    #[tokio::test]
    async fn middleware_may_skip_next() {
        let log = Log::default();
        let deny = from_fn(|_req: Request, _next: Next| async {
            Response::status(http::StatusCode::FORBIDDEN)
        });
        let pipeline = Pipeline::new().with(record("outer", &log)).with(deny);

        let res = compose(handler(&log), &pipeline).run(request()).await;

        assert_eq!(res.status_code(), http::StatusCode::FORBIDDEN);
        assert_eq!(entries(&log), ["outer:in", "outer:out"]);
    }

    #[tokio::test]
    async fn closures_are_middleware() {
        let upper = |next: Next| -> Next {
            Next::new(move |req: Request| {
                let next = next.clone();
                async move {
                    let res = next.run(req).await;
                    String::from_utf8_lossy(res.body()).to_uppercase()
                }
            })
        };
        let pipeline = Pipeline::new().with(upper);
        let h = Next::new(|_req: Request| async { "quiet" });

        let res = compose(h, &pipeline).run(request()).await;
        assert_eq!(res.body(), b"QUIET");
    }
}
