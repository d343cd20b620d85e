//! # strata
//!
//! Scoped middleware composition on top of a radix-tree router.
//!
//! You declare routes and groups as plain data. Each of three scopes carries
//! its own ordered [`Pipeline`] of middleware:
//!
//! - **global**: on the [`Config`], wraps every route
//! - **group**: on a [`Group`], wraps every route in the group
//! - **route**: on a [`Route`], wraps that route only
//!
//! [`Router::apply`] folds them into one handler per route, once, before the
//! server starts. A request then runs through
//!
//! ```text
//! global[0] ▶ … ▶ group[0] ▶ … ▶ route[0] ▶ … ▶ handler
//! ```
//!
//! and back out in reverse. The matching itself (params, 404, 405) is
//! [`matchit`]'s job; transport is hyper's.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use strata::{Config, Group, Next, Request, Response, Route, Router, Server, middleware};
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = Config::new()
//!         .base_path("/api")
//!         .with(middleware::trace())
//!         .route(Route::get("/healthz", |_req: Request| async { "ok" }))
//!         .group(
//!             Group::new("/users")
//!                 .with(middleware::from_fn(require_auth))
//!                 .route(Route::get("/{id}", get_user)),
//!         );
//!
//!     let app = Router::apply(config).expect("invalid route table");
//!     Server::bind("0.0.0.0:3000").serve(app).await.unwrap();
//! }
//!
//! async fn require_auth(req: Request, next: Next) -> Response {
//!     match req.header("authorization") {
//!         Some(_) => next.run(req).await,
//!         None => Response::status(strata::StatusCode::UNAUTHORIZED),
//!     }
//! }
//!
//! async fn get_user(req: Request) -> Response {
//!     let id = req.param("id").unwrap_or("unknown");
//!     Response::json(format!(r#"{{"id":"{id}"}}"#))
//! }
//! ```

mod config;
mod context;
mod error;
mod group;
mod handler;
mod request;
mod response;
mod route;
mod router;
mod server;

pub mod middleware;

pub use config::Config;
pub use context::Context;
pub use error::Error;
pub use group::Group;
pub use handler::{Handler, Next};
pub use http::{Method, StatusCode};
pub use middleware::{Middleware, Pipeline, compose};
pub use request::Request;
pub use response::{IntoResponse, Response, ResponseBuilder};
pub use route::Route;
pub use router::Router;
pub use server::Server;
