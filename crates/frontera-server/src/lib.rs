pub mod analytics;
pub mod auth;
pub mod error;
pub mod routes;
pub mod state;

use axum::routing::{get, post};
use axum::Router;
use frontera_core::config::Config;
use tower_http::cors::{Any, CorsLayer};

/// Build the axum Router with all API routes and middleware.
/// Used by `serve()` and available for integration testing.
pub fn build_router(app_state: state::AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Conversations
        .route(
            "/api/conversations",
            post(routes::conversations::create_conversation),
        )
        .route(
            "/api/conversations",
            get(routes::conversations::list_conversations),
        )
        .route(
            "/api/conversations/{id}",
            get(routes::conversations::get_conversation),
        )
        .route(
            "/api/conversations/{id}/status",
            post(routes::conversations::set_conversation_status),
        )
        .route(
            "/api/conversations/{id}/messages",
            post(routes::conversations::post_message),
        )
        .route(
            "/api/conversations/{id}/phase",
            post(routes::conversations::apply_phase_event),
        )
        // Insights
        .route(
            "/api/conversations/{id}/insights",
            post(routes::insights::upsert_insight),
        )
        .route(
            "/api/conversations/{id}/insights",
            get(routes::insights::list_insights),
        )
        // Assessment
        .route("/api/assessment", post(routes::assessment::submit_assessment))
        .route("/api/assessment", get(routes::assessment::get_assessment))
        // Gamification
        .route("/api/gamification", get(routes::gamification::get_gamification))
        .route("/api/gamification/xp", post(routes::gamification::award_xp))
        // Bets
        .route("/api/bets", post(routes::bets::create_bet))
        .route("/api/bets", get(routes::bets::list_bets))
        .route("/api/bets/{id}/status", post(routes::bets::set_bet_status))
        // Assumptions
        .route("/api/assumptions", post(routes::assumptions::create_assumption))
        .route("/api/assumptions", get(routes::assumptions::list_assumptions))
        .route(
            "/api/assumptions/{id}/status",
            post(routes::assumptions::set_assumption_status),
        )
        // Reviews
        .route("/api/reviews/due", get(routes::reviews::due_reviews))
        .route("/api/reviews/complete", post(routes::reviews::complete_review))
        .layer(cors)
        .with_state(app_state)
}

/// Start the Frontera API server.
pub async fn serve(config: Config) -> anyhow::Result<()> {
    let port = config.port;
    let app_state = state::AppState::new(&config)?;
    let app = build_router(app_state);

    let addr = format!("0.0.0.0:{port}");
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("frontera API server listening on http://localhost:{port}");

    axum::serve(listener, app).await?;
    Ok(())
}
