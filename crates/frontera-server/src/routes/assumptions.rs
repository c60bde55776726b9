use axum::extract::{Path, State};
use axum::Json;
use std::str::FromStr;
use uuid::Uuid;

use crate::auth::Identity;
use crate::error::AppError;
use crate::routes::with_store;
use crate::state::AppState;
use frontera_core::types::AssumptionStatus;

#[derive(serde::Deserialize)]
pub struct CreateAssumptionBody {
    pub statement: String,
}

/// POST /api/assumptions — record a strategic assumption.
pub async fn create_assumption(
    State(app): State<AppState>,
    identity: Identity,
    Json(body): Json<CreateAssumptionBody>,
) -> Result<Json<serde_json::Value>, AppError> {
    let org = identity.org_id.clone();
    let user = identity.user_id.clone();
    let assumption =
        with_store(&app, move |store| Ok(store.create_assumption(&org, &user, &body.statement)?))
            .await?;
    Ok(Json(serde_json::to_value(&assumption)?))
}

/// GET /api/assumptions
pub async fn list_assumptions(
    State(app): State<AppState>,
    identity: Identity,
) -> Result<Json<serde_json::Value>, AppError> {
    let org = identity.org_id.clone();
    let assumptions = with_store(&app, move |store| Ok(store.list_assumptions(&org)?)).await?;
    Ok(Json(serde_json::to_value(&assumptions)?))
}

#[derive(serde::Deserialize)]
pub struct AssumptionStatusBody {
    pub status: String,
}

/// POST /api/assumptions/{id}/status — validate or invalidate.
///
/// An invalidation's `updated_at` feeds the review cadence calculator, which
/// raises a high-urgency trigger for the following week.
pub async fn set_assumption_status(
    State(app): State<AppState>,
    identity: Identity,
    Path(id): Path<Uuid>,
    Json(body): Json<AssumptionStatusBody>,
) -> Result<Json<serde_json::Value>, AppError> {
    let status = AssumptionStatus::from_str(&body.status)?;
    let org = identity.org_id.clone();
    let assumption =
        with_store(&app, move |store| Ok(store.set_assumption_status(&org, id, status)?)).await?;
    Ok(Json(serde_json::to_value(&assumption)?))
}
