//! Minimal strata example with global, group, and route middleware.
//!
//! Run with:
//!   RUST_LOG=info cargo run --example basic
//!
//! Try:
//!   curl http://localhost:3000/api/healthz
//!   curl http://localhost:3000/api/users/42
//!   curl -H 'authorization: Bearer x' http://localhost:3000/api/users/42
//!   curl -X DELETE -H 'authorization: Bearer x' http://localhost:3000/api/users/42

use strata::{
    Config, Group, Next, Request, Response, Route, Router, Server, StatusCode, middleware,
};

/// Set by `require_auth`, read by handlers downstream.
#[derive(Clone)]
struct Caller(String);

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let config = Config::new()
        .base_path("/api")
        .with(middleware::trace())
        .route(Route::get("/healthz", |_req: Request| async { "ok" }))
        .group(
            Group::new("/users")
                .with(middleware::from_fn(require_auth))
                .route(Route::get("/{id}", get_user))
                .route(Route::post("", create_user))
                .route(Route::delete("/{id}", delete_user).with(middleware::from_fn(audit))),
        );

    let app = Router::apply(config).expect("invalid route table");

    Server::bind("0.0.0.0:3000")
        .serve(app)
        .await
        .expect("server error");
}

async fn require_auth(mut req: Request, next: Next) -> Response {
    let Some(token) = req.header("authorization").map(str::to_owned) else {
        return Response::status(StatusCode::UNAUTHORIZED);
    };
    req.context_mut().insert(Caller(token));
    next.run(req).await
}

// Route-only layer: runs after `require_auth`, so `Caller` is always set.
async fn audit(req: Request, next: Next) -> Response {
    let caller = req.context().get::<Caller>().map(|c| c.0.clone()).unwrap_or_default();
    let path = req.path().to_owned();
    let res = next.run(req).await;
    tracing::info!(%caller, %path, status = res.status_code().as_u16(), "delete audited");
    res
}

// GET /api/users/{id}
async fn get_user(req: Request) -> Response {
    let id = req.param("id").unwrap_or("unknown");
    Response::json(format!(r#"{{"id":"{id}","name":"alice"}}"#))
}

// POST /api/users
async fn create_user(req: Request) -> Response {
    if req.body().is_empty() {
        return Response::status(StatusCode::BAD_REQUEST);
    }

    Response::builder()
        .status(StatusCode::CREATED)
        .header("location", "/api/users/99")
        .json(r#"{"id":"99","name":"new_user"}"#)
}

// DELETE /api/users/{id} → 204 No Content
async fn delete_user(_req: Request) -> StatusCode {
    StatusCode::NO_CONTENT
}
