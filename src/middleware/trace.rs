//! Request tracing middleware.

use std::time::{Duration, Instant};

use tracing::{Instrument, info, info_span};

use super::{Middleware, from_fn};
use crate::handler::Next;
use crate::request::Request;

/// Opens an `info` span per request carrying method and path, and logs the
/// response status and latency when the inner chain completes.
///
/// Place it first in the global pipeline so the span covers every other layer.
pub fn trace() -> impl Middleware {
    from_fn(|req: Request, next: Next| async move {
        let span = info_span!("request", method = %req.method(), path = req.path());
        let started = Instant::now();

        let res = next.run(req).instrument(span.clone()).await;

        span.in_scope(|| {
            info!(
                status = res.status_code().as_u16(),
                latency_us = latency_us(started.elapsed()),
                "request completed"
            );
        });
        res
    })
}

/// Whole microseconds, saturating at `u64::MAX`.
fn latency_us(elapsed: Duration) -> u64 {
    u64::try_from(elapsed.as_micros()).unwrap_or(u64::MAX)
}
