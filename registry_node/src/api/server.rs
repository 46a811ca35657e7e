//! HTTP server: application state, router and serve loop

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post, put},
    Json, Router,
};
use log::info;
use serde::Serialize;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};

use super::handlers;
use crate::artifacts::{ArtifactStore, MAX_VIDEO_BYTES};
use crate::identity::IdentityManager;
use crate::workflow::WorkflowEngine;

/// Shared application state injected into every handler
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<WorkflowEngine>,
    pub identity: Arc<IdentityManager>,
    pub artifacts: Arc<ArtifactStore>,
}

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
}

async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Build the full application router
pub fn build_router(state: AppState) -> Router {
    let auth_routes = Router::new()
        .route("/register", post(handlers::auth::register))
        .route("/login", post(handlers::auth::login))
        .route("/me", get(handlers::auth::me))
        .route("/verify-otp", post(handlers::auth::verify_otp));

    let transaction_routes = Router::new()
        .route(
            "/",
            get(handlers::transactions::list).post(handlers::transactions::create),
        )
        .route(
            "/:id",
            get(handlers::transactions::get)
                .put(handlers::transactions::update)
                .delete(handlers::transactions::delete),
        )
        .route("/:id/consent", put(handlers::consent::verify_consent))
        .route("/:id/sign", put(handlers::signature::upload_signature))
        .route("/:id/approve", put(handlers::transactions::approve))
        .route(
            "/:id/confirm-payment",
            put(handlers::transactions::confirm_payment),
        )
        .route("/:id/finalize", put(handlers::transactions::finalize));

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health_check))
        .nest("/api/auth", auth_routes)
        .nest("/api/transactions", transaction_routes)
        // Uploads carry up to a 50 MB video plus multipart framing
        .layer(DefaultBodyLimit::max(MAX_VIDEO_BYTES + 1024 * 1024))
        .layer(cors)
        .with_state(state)
}

/// Bind and serve until shutdown
pub async fn serve(state: AppState, bind_addr: &str, port: u16) -> anyhow::Result<()> {
    let addr: SocketAddr = format!("{}:{}", bind_addr, port).parse()?;
    let listener = TcpListener::bind(addr).await?;
    info!("registry API listening on {}", listener.local_addr()?);
    axum::serve(listener, build_router(state)).await?;
    Ok(())
}
