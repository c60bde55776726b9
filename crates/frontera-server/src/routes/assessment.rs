use axum::extract::State;
use axum::Json;
use std::collections::BTreeMap;
use uuid::Uuid;

use crate::auth::Identity;
use crate::error::AppError;
use crate::routes::conversations::update_state_with_retry;
use crate::routes::{gamification::apply_xp, with_store};
use crate::state::AppState;
use frontera_core::assessment::{score, AssessmentSubmission};
use frontera_core::framework::{advance_phase, PhaseEvent};
use frontera_core::gamification::XpEvent;

#[derive(serde::Deserialize)]
pub struct SubmitAssessmentBody {
    pub likert: BTreeMap<String, u8>,
    pub situational: BTreeMap<String, String>,
    /// When set, completing the assessment also advances this conversation
    /// out of discovery.
    #[serde(default)]
    pub conversation_id: Option<Uuid>,
}

/// POST /api/assessment — score and persist the founder assessment.
pub async fn submit_assessment(
    State(app): State<AppState>,
    identity: Identity,
    Json(body): Json<SubmitAssessmentBody>,
) -> Result<Json<serde_json::Value>, AppError> {
    let submission = AssessmentSubmission {
        likert: body.likert,
        situational: body.situational,
    };
    // Validation errors map to 400 before anything is written.
    let result = score(&submission)?;

    let org = identity.org_id.clone();
    let user = identity.user_id.clone();
    let result_for_store = result.clone();
    let (xp, phase) = with_store(&app, move |store| {
        store.upsert_assessment(&org, &user, &submission, &result_for_store)?;
        let xp = apply_xp(store, &org, &user, &[XpEvent::AssessmentCompleted])?;

        let phase = match body.conversation_id {
            Some(id) => {
                let state = update_state_with_retry(store, &org, id, |current| {
                    advance_phase(current, PhaseEvent::AssessmentCompleted)
                })?;
                Some(state.current_phase)
            }
            None => None,
        };
        Ok((xp, phase))
    })
    .await?;

    app.analytics.emit(
        "assessment_completed",
        &identity.org_id,
        &identity.user_id,
        serde_json::json!({ "archetype": result.archetype.as_str() }),
    );

    Ok(Json(serde_json::json!({
        "scores": result.scores,
        "overall": result.overall,
        "archetype": result.archetype,
        "xp": xp,
        "phase": phase.map(|p| p.as_str()),
    })))
}

/// GET /api/assessment — the caller's stored assessment, 404 if never taken.
pub async fn get_assessment(
    State(app): State<AppState>,
    identity: Identity,
) -> Result<Json<serde_json::Value>, AppError> {
    let org = identity.org_id.clone();
    let user = identity.user_id.clone();
    let record = with_store(&app, move |store| Ok(store.get_assessment(&org, &user)?))
        .await?
        .ok_or_else(|| AppError::not_found("no assessment on file"))?;

    Ok(Json(serde_json::json!({
        "scores": record.result.scores,
        "overall": record.result.overall,
        "archetype": record.result.archetype,
        "updated_at": record.updated_at,
    })))
}
