use axum::extract::State;
use axum::Json;
use chrono::Utc;

use crate::auth::Identity;
use crate::error::AppError;
use crate::routes::with_store;
use crate::state::AppState;
use frontera_core::cadence::review_triggers;

/// GET /api/reviews/due — review reminders for the caller's strategy.
pub async fn due_reviews(
    State(app): State<AppState>,
    identity: Identity,
) -> Result<Json<serde_json::Value>, AppError> {
    let org = identity.org_id.clone();
    let user = identity.user_id.clone();
    let now = Utc::now();
    let triggers = with_store(&app, move |store| {
        let bets = store.list_bets(&org)?;
        let assumptions = store.list_assumptions(&org)?;
        let meta = store.strategy_meta(&org, &user)?;
        Ok(review_triggers(
            now,
            &bets,
            &assumptions,
            meta.last_review,
            meta.strategy_set,
        ))
    })
    .await?;

    Ok(Json(serde_json::json!({
        "generated_at": now,
        "triggers": triggers,
    })))
}

/// POST /api/reviews/complete — record that a strategy review happened now.
pub async fn complete_review(
    State(app): State<AppState>,
    identity: Identity,
) -> Result<Json<serde_json::Value>, AppError> {
    let org = identity.org_id.clone();
    let user = identity.user_id.clone();
    let now = Utc::now();
    with_store(&app, move |store| {
        store.set_last_review(&org, &user, now)?;
        Ok(())
    })
    .await?;

    app.analytics.emit(
        "review_completed",
        &identity.org_id,
        &identity.user_id,
        serde_json::json!({}),
    );
    Ok(Json(serde_json::json!({ "completed_at": now })))
}
