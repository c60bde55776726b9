use axum::extract::{Path, State};
use axum::Json;
use chrono::{DateTime, Utc};
use std::str::FromStr;
use uuid::Uuid;

use crate::auth::Identity;
use crate::error::AppError;
use crate::routes::conversations::update_state_with_retry;
use crate::routes::with_store;
use crate::state::AppState;
use frontera_core::framework::{advance_phase, PhaseEvent};
use frontera_core::types::{BetStatus, Phase};

#[derive(serde::Deserialize)]
pub struct CreateBetBody {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub kill_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub kill_criteria: Option<String>,
    /// When set, the bet is also recorded on this conversation's strategy
    /// document, advancing it out of the bets phase.
    #[serde(default)]
    pub conversation_id: Option<Uuid>,
}

/// POST /api/bets — place a strategic bet.
///
/// The first bet pins the strategy-set date used by the quarterly review
/// cycle.
pub async fn create_bet(
    State(app): State<AppState>,
    identity: Identity,
    Json(body): Json<CreateBetBody>,
) -> Result<Json<serde_json::Value>, AppError> {
    let org = identity.org_id.clone();
    let user = identity.user_id.clone();
    let bet = with_store(&app, move |store| {
        let bet = store.create_bet(
            &org,
            &user,
            &body.title,
            body.description.as_deref(),
            body.kill_date,
            body.kill_criteria.as_deref(),
        )?;
        store.mark_strategy_set(&org, &user, bet.created_at)?;
        if let Some(conversation_id) = body.conversation_id {
            update_state_with_retry(store, &org, conversation_id, |current| {
                let mut next = current.clone();
                next.add_strategic_bet(body.title.clone());
                if next.current_phase == Phase::Bets {
                    next = advance_phase(&next, PhaseEvent::BetCreated)?;
                }
                Ok(next)
            })?;
        }
        Ok(bet)
    })
    .await?;

    app.analytics.emit(
        "bet_created",
        &identity.org_id,
        &identity.user_id,
        serde_json::json!({ "bet_id": bet.id, "has_kill_date": bet.kill_date.is_some() }),
    );
    Ok(Json(serde_json::to_value(&bet)?))
}

/// GET /api/bets
pub async fn list_bets(
    State(app): State<AppState>,
    identity: Identity,
) -> Result<Json<serde_json::Value>, AppError> {
    let org = identity.org_id.clone();
    let bets = with_store(&app, move |store| Ok(store.list_bets(&org)?)).await?;
    Ok(Json(serde_json::to_value(&bets)?))
}

#[derive(serde::Deserialize)]
pub struct BetStatusBody {
    pub status: String,
}

/// POST /api/bets/{id}/status — activate, validate, or kill a bet.
pub async fn set_bet_status(
    State(app): State<AppState>,
    identity: Identity,
    Path(id): Path<Uuid>,
    Json(body): Json<BetStatusBody>,
) -> Result<Json<serde_json::Value>, AppError> {
    let status = BetStatus::from_str(&body.status)?;
    let org = identity.org_id.clone();
    let bet = with_store(&app, move |store| Ok(store.set_bet_status(&org, id, status)?)).await?;
    Ok(Json(serde_json::to_value(&bet)?))
}
