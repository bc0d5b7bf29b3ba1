//! Analysis API router.
//!
//! Returns a composable `Router` that can be mounted on any axum server.
//! Route surface mirrors the original service: eight analysis endpoints
//! plus the online checker and a health probe, behind allow-all CORS.

use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;

use crate::api::endpoints;
use crate::api::types::AppContext;

/// Build the analysis API router.
pub fn api_router(ctx: AppContext) -> Router {
    Router::new()
        .route("/health", get(endpoints::health::check))
        .route("/timeline", post(endpoints::timeline::extract))
        .route("/similarity", post(endpoints::similarity::check))
        .route("/chat/guidelines", post(endpoints::chat::guidelines))
        .route("/chat/specialist", post(endpoints::chat::specialist))
        .route("/extract", post(endpoints::extraction::extract))
        .route("/novelty", post(endpoints::scoring::novelty))
        .route("/cost", post(endpoints::scoring::cost))
        .route("/plag", post(endpoints::scoring::plagiarism))
        .route(
            "/online-check",
            get(endpoints::online::check_get).post(endpoints::online::check_post),
        )
        .with_state(ctx)
        // The original service ran behind allow-all CORS for its frontend.
        .layer(CorsLayer::permissive())
}
