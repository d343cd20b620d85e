//! Per-request typed context.
//!
//! Middleware passes data downstream by storing it in the request's
//! [`Context`]. Entries are keyed by their Rust type, so two middleware can
//! only collide if they share the very same type. Define a newtype per value:
//!
//! ```rust
//! use strata::Context;
//!
//! #[derive(Clone)]
//! struct UserId(u64);
//!
//! let mut ctx = Context::new();
//! ctx.insert(UserId(42));
//! assert_eq!(ctx.get::<UserId>().map(|u| u.0), Some(42));
//! ```
//!
//! The context lives inside the owned [`Request`](crate::Request) and moves
//! with it down the chain. Nothing here is shared between requests.

use http::Extensions;

/// A type-keyed map carried by every request.
#[derive(Debug, Default)]
pub struct Context(Extensions);

impl Context {
    pub fn new() -> Self {
        Self(Extensions::new())
    }

    /// Stores `value`, returning the previous value of the same type.
    pub fn insert<T: Clone + Send + Sync + 'static>(&mut self, value: T) -> Option<T> {
        self.0.insert(value)
    }

    pub fn get<T: Send + Sync + 'static>(&self) -> Option<&T> {
        self.0.get::<T>()
    }

    pub fn get_mut<T: Send + Sync + 'static>(&mut self) -> Option<&mut T> {
        self.0.get_mut::<T>()
    }

    pub fn remove<T: Send + Sync + 'static>(&mut self) -> Option<T> {
        self.0.remove::<T>()
    }

    pub fn contains<T: Send + Sync + 'static>(&self) -> bool {
        self.get::<T>().is_some()
    }
}

/// Seeds the context with whatever the transport attached to the request.
impl From<Extensions> for Context {
    fn from(ext: Extensions) -> Self {
        Self(ext)
    }
}
