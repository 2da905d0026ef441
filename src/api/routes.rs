//! REST API routes configuration

use crate::api::handlers::{self, ApiState};
use axum::{
    body::Body,
    http::{header, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};

/// JSON 404 for unknown routes
async fn fallback_handler() -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        [(header::CONTENT_TYPE, "application/json")],
        Body::from(r#"{"error":"Not Found"}"#),
    )
        .into_response()
}

/// Create the API router with all routes
pub fn create_router(state: ApiState) -> Router {
    // Configure CORS for browser access
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Health check
        .route("/health", get(handlers::health_check))
        // Wallet
        .route("/api/wallet", get(handlers::get_wallet))
        .route("/api/events", get(handlers::list_events))
        // Transactions
        .route("/api/transactions", get(handlers::list_transactions))
        .route("/api/transactions/{id}", get(handlers::get_transaction))
        .route(
            "/api/transactions/{id}/approvals/{signer}",
            get(handlers::has_approved),
        )
        .route(
            "/api/transactions/native",
            post(handlers::initiate_native),
        )
        .route("/api/transactions/asset", post(handlers::initiate_asset))
        .route(
            "/api/transactions/native/{id}/approve",
            post(handlers::approve_native),
        )
        .route(
            "/api/transactions/asset/{id}/approve",
            post(handlers::approve_asset),
        )
        // Funding
        .route("/api/deposits/native", post(handlers::deposit_native))
        .route("/api/deposits/asset", post(handlers::deposit_asset))
        .route("/api/fund", post(handlers::fund))
        // Tokens
        .route(
            "/api/tokens",
            get(handlers::list_tokens).post(handlers::create_token),
        )
        .route("/api/tokens/{address}/mint", post(handlers::mint_tokens))
        .route(
            "/api/tokens/{address}/balance/{holder}",
            get(handlers::get_token_balance),
        )
        .fallback(fallback_handler)
        // Add state and middleware
        .with_state(state)
        .layer(cors)
}
