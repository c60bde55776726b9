use axum::extract::{Path, State};
use axum::Json;
use uuid::Uuid;

use crate::auth::Identity;
use crate::error::AppError;
use crate::routes::{gamification::apply_xp, with_store};
use crate::state::AppState;
use frontera_coach::{prompt, ChatMessage};
use frontera_core::framework::{
    advance_phase, FrameworkState, PhaseEvent, SYNTHESIS_READY_AREAS, TOTAL_RESEARCH_AREAS,
};
use frontera_core::gamification::XpEvent;
use frontera_core::markers::extract_markers;
use frontera_core::store::Store;
use frontera_core::types::{AgentType, ConversationStatus, Phase};
use frontera_core::FronteraError;
use std::str::FromStr;

/// Apply a state mutation under optimistic concurrency: on a lost race,
/// re-read and re-apply exactly once. A second conflict surfaces as 409.
pub(crate) fn update_state_with_retry<F>(
    store: &Store,
    org_id: &str,
    id: Uuid,
    mutate: F,
) -> Result<FrameworkState, FronteraError>
where
    F: Fn(&FrameworkState) -> Result<FrameworkState, FronteraError>,
{
    let conversation = store.get_conversation(org_id, id)?;
    let next = mutate(&conversation.framework_state)?;
    match store.update_framework_state(org_id, id, conversation.version, &next) {
        Ok(_) => Ok(next),
        Err(FronteraError::StaleWrite { .. }) => {
            let conversation = store.get_conversation(org_id, id)?;
            let next = mutate(&conversation.framework_state)?;
            store.update_framework_state(org_id, id, conversation.version, &next)?;
            Ok(next)
        }
        Err(e) => Err(e),
    }
}

#[derive(serde::Deserialize)]
pub struct CreateConversationBody {
    pub agent_type: String,
}

/// POST /api/conversations — start a new coaching conversation.
pub async fn create_conversation(
    State(app): State<AppState>,
    identity: Identity,
    Json(body): Json<CreateConversationBody>,
) -> Result<Json<serde_json::Value>, AppError> {
    let agent_type = AgentType::from_str(&body.agent_type)?;
    let org = identity.org_id.clone();
    let user = identity.user_id.clone();
    let conversation = with_store(&app, move |store| {
        Ok(store.create_conversation(&org, &user, agent_type)?)
    })
    .await?;

    app.analytics.emit(
        "conversation_created",
        &identity.org_id,
        &identity.user_id,
        serde_json::json!({ "agent_type": agent_type.as_str(), "role": identity.role }),
    );
    Ok(Json(serde_json::to_value(&conversation)?))
}

/// GET /api/conversations — the caller's conversations.
pub async fn list_conversations(
    State(app): State<AppState>,
    identity: Identity,
) -> Result<Json<serde_json::Value>, AppError> {
    let org = identity.org_id.clone();
    let user = identity.user_id.clone();
    let conversations =
        with_store(&app, move |store| Ok(store.list_conversations(&org, &user)?)).await?;
    Ok(Json(serde_json::to_value(&conversations)?))
}

/// GET /api/conversations/{id}
pub async fn get_conversation(
    State(app): State<AppState>,
    identity: Identity,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, AppError> {
    let org = identity.org_id.clone();
    let conversation = with_store(&app, move |store| Ok(store.get_conversation(&org, id)?)).await?;
    Ok(Json(serde_json::to_value(&conversation)?))
}

#[derive(serde::Deserialize)]
pub struct StatusBody {
    pub status: String,
}

/// POST /api/conversations/{id}/status — archive or complete.
///
/// Completing a conversation counts as a finished coaching session: the
/// session counter ticks and session XP is awarded.
pub async fn set_conversation_status(
    State(app): State<AppState>,
    identity: Identity,
    Path(id): Path<Uuid>,
    Json(body): Json<StatusBody>,
) -> Result<Json<serde_json::Value>, AppError> {
    let status = ConversationStatus::from_str(&body.status)?;
    let org = identity.org_id.clone();
    let user = identity.user_id.clone();
    let xp = with_store(&app, move |store| {
        store.set_conversation_status(&org, id, status)?;
        if status != ConversationStatus::Completed {
            return Ok(None);
        }
        update_state_with_retry(store, &org, id, |current| {
            let mut next = current.clone();
            next.record_session();
            Ok(next)
        })?;
        Ok(Some(apply_xp(store, &org, &user, &[XpEvent::SessionCompleted])?))
    })
    .await?;
    Ok(Json(serde_json::json!({
        "id": id,
        "status": status.as_str(),
        "xp": xp,
    })))
}

#[derive(serde::Deserialize)]
pub struct MessageBody {
    pub content: String,
}

/// POST /api/conversations/{id}/messages — the main coaching exchange.
///
/// Calls the coach, extracts research markers from its reply, persists
/// captured insights, re-evaluates phase progression, awards XP, and
/// attaches an optional reflection that degrades to null if the second
/// coach call fails.
pub async fn post_message(
    State(app): State<AppState>,
    identity: Identity,
    Path(id): Path<Uuid>,
    Json(body): Json<MessageBody>,
) -> Result<Json<serde_json::Value>, AppError> {
    let org = identity.org_id.clone();
    let conversation = with_store(&app, move |store| Ok(store.get_conversation(&org, id)?)).await?;

    let system = prompt::system_prompt(
        conversation.agent_type,
        conversation.framework_state.current_phase,
    );
    let messages = [ChatMessage::system(system), ChatMessage::user(&body.content)];
    let reply = app.coach.chat(&messages).await?;

    let extracted = extract_markers(&reply);
    for warning in &extracted.warnings {
        tracing::warn!(conversation = %id, warning, "dropped malformed research marker");
    }

    let org = identity.org_id.clone();
    let user = identity.user_id.clone();
    let markers = extracted.clone();
    let (phase, mapped, xp) = with_store(&app, move |store| {
        for capture in &markers.captures {
            store.upsert_insight(
                &org,
                id,
                capture.territory,
                &capture.area_id,
                std::slice::from_ref(&capture.answer),
                frontera_core::types::InsightStatus::InProgress,
            )?;
        }
        for completion in &markers.area_completions {
            store.upsert_insight(
                &org,
                id,
                completion.territory,
                &completion.area_id,
                &[],
                frontera_core::types::InsightStatus::Mapped,
            )?;
        }
        let mapped = store.count_mapped(&org, id)?;

        let state = update_state_with_retry(store, &org, id, |current| {
            let mut next = current.clone();
            next.record_message();
            for capture in &markers.captures {
                next.add_key_insight(capture.answer.clone());
            }
            if next.current_phase == Phase::Research {
                next = advance_phase(&next, PhaseEvent::ResearchProgress { mapped })?;
            }
            Ok(next)
        })?;

        let mut events = Vec::new();
        events.extend(markers.captures.iter().map(|_| XpEvent::ResearchCaptured));
        events.extend(markers.area_completions.iter().map(|_| XpEvent::AreaMapped));
        let xp = if events.is_empty() {
            None
        } else {
            Some(apply_xp(store, &org, &user, &events)?)
        };

        Ok((state.current_phase, mapped, xp))
    })
    .await?;

    // Optional enrichment; a coach failure here is not the caller's problem.
    let reflection = match app
        .coach
        .chat(&prompt::reflection_messages(
            &body.content,
            &extracted.clean_content,
        ))
        .await
    {
        Ok(text) if text.trim() != "none" => Some(text),
        Ok(_) => None,
        Err(err) => {
            tracing::debug!(conversation = %id, error = %err, "reflection call failed");
            None
        }
    };

    app.analytics.emit(
        "message_processed",
        &identity.org_id,
        &identity.user_id,
        serde_json::json!({
            "conversation_id": id,
            "captures": extracted.captures.len(),
            "area_completions": extracted.area_completions.len(),
            "phase": phase.as_str(),
        }),
    );

    Ok(Json(serde_json::json!({
        "reply": extracted.clean_content,
        "captures": extracted.captures,
        "area_completions": extracted.area_completions,
        "warnings": extracted.warnings,
        "phase": phase.as_str(),
        "mapped_count": mapped,
        "synthesis_ready": mapped >= SYNTHESIS_READY_AREAS,
        "fully_mapped": mapped >= TOTAL_RESEARCH_AREAS,
        "xp": xp,
        "reflection": reflection,
    })))
}

/// POST /api/conversations/{id}/phase — apply an explicit phase event.
///
/// `research_progress` recomputes the mapped count server-side; the body's
/// count, if any, is ignored.
pub async fn apply_phase_event(
    State(app): State<AppState>,
    identity: Identity,
    Path(id): Path<Uuid>,
    Json(event): Json<PhaseEvent>,
) -> Result<Json<serde_json::Value>, AppError> {
    let org = identity.org_id.clone();
    let user = identity.user_id.clone();
    let (phase, xp) = with_store(&app, move |store| {
        let event = match event {
            PhaseEvent::ResearchProgress { .. } => PhaseEvent::ResearchProgress {
                mapped: store.count_mapped(&org, id)?,
            },
            other => other,
        };
        let state = update_state_with_retry(store, &org, id, |current| {
            advance_phase(current, event)
        })?;

        let xp_event = match event {
            PhaseEvent::AssessmentCompleted => Some(XpEvent::AssessmentCompleted),
            PhaseEvent::SynthesisGenerated => Some(XpEvent::SynthesisGenerated),
            PhaseEvent::BetCreated => Some(XpEvent::BetCreated),
            PhaseEvent::ResearchProgress { .. } => None,
        };
        let xp = xp_event
            .map(|e| apply_xp(store, &org, &user, &[e]))
            .transpose()?;

        Ok((state.current_phase, xp))
    })
    .await?;

    app.analytics.emit(
        "phase_event",
        &identity.org_id,
        &identity.user_id,
        serde_json::json!({ "conversation_id": id, "phase": phase.as_str() }),
    );

    Ok(Json(serde_json::json!({
        "id": id,
        "phase": phase.as_str(),
        "xp": xp,
    })))
}
