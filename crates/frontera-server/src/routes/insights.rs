use axum::extract::{Path, State};
use axum::Json;
use std::str::FromStr;
use uuid::Uuid;

use crate::auth::Identity;
use crate::error::AppError;
use crate::routes::conversations::update_state_with_retry;
use crate::routes::with_store;
use crate::state::AppState;
use frontera_core::framework::{
    advance_phase, PhaseEvent, SYNTHESIS_READY_AREAS, TOTAL_RESEARCH_AREAS,
};
use frontera_core::types::{InsightStatus, Phase, Territory};

#[derive(serde::Deserialize)]
pub struct UpsertInsightBody {
    pub territory: String,
    pub research_area: String,
    #[serde(default)]
    pub response: Option<String>,
    /// Defaults to `in_progress`; send `mapped` to mark the area done.
    #[serde(default)]
    pub status: Option<String>,
}

/// POST /api/conversations/{id}/insights — manual insight capture.
///
/// The same path the marker pipeline uses, exposed for clients that record
/// research outside a coach conversation. Marking an area mapped re-runs
/// phase progression.
pub async fn upsert_insight(
    State(app): State<AppState>,
    identity: Identity,
    Path(id): Path<Uuid>,
    Json(body): Json<UpsertInsightBody>,
) -> Result<Json<serde_json::Value>, AppError> {
    let territory = Territory::from_str(&body.territory)?;
    let status = match &body.status {
        Some(raw) => InsightStatus::from_str(raw)?,
        None => InsightStatus::InProgress,
    };
    let responses: Vec<String> = body.response.into_iter().collect();

    let org = identity.org_id.clone();
    let (insight, mapped, phase) = with_store(&app, move |store| {
        let insight =
            store.upsert_insight(&org, id, territory, &body.research_area, &responses, status)?;
        let mapped = store.count_mapped(&org, id)?;

        let state = update_state_with_retry(store, &org, id, |current| {
            if current.current_phase == Phase::Research {
                advance_phase(current, PhaseEvent::ResearchProgress { mapped })
            } else {
                Ok(current.clone())
            }
        })?;

        Ok((insight, mapped, state.current_phase))
    })
    .await?;

    Ok(Json(serde_json::json!({
        "insight": insight,
        "mapped_count": mapped,
        "synthesis_ready": mapped >= SYNTHESIS_READY_AREAS,
        "fully_mapped": mapped >= TOTAL_RESEARCH_AREAS,
        "phase": phase.as_str(),
    })))
}

/// GET /api/conversations/{id}/insights
pub async fn list_insights(
    State(app): State<AppState>,
    identity: Identity,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, AppError> {
    let org = identity.org_id.clone();
    let (insights, mapped) = with_store(&app, move |store| {
        // Ownership check doubles as the 404 path.
        store.get_conversation(&org, id)?;
        let insights = store.list_insights(&org, id)?;
        let mapped = store.count_mapped(&org, id)?;
        Ok((insights, mapped))
    })
    .await?;

    Ok(Json(serde_json::json!({
        "insights": insights,
        "mapped_count": mapped,
        "synthesis_ready": mapped >= SYNTHESIS_READY_AREAS,
        "fully_mapped": mapped >= TOTAL_RESEARCH_AREAS,
    })))
}
