use axum::extract::State;
use axum::Json;
use chrono::Utc;

use crate::auth::Identity;
use crate::error::AppError;
use crate::routes::with_store;
use crate::state::AppState;
use frontera_core::gamification::{
    advance_streak, check_achievements, check_level_up, level_info, XpEvent, ACHIEVEMENTS,
};
use frontera_core::store::Store;
use frontera_core::FronteraError;
use std::str::FromStr;

/// Net effect of applying one or more XP events to a user's record.
#[derive(Debug, serde::Serialize)]
pub(crate) struct XpOutcome {
    pub xp_awarded: u32,
    pub total_xp: u32,
    pub level: u32,
    pub leveled_up: bool,
    pub achievements_unlocked: Vec<&'static str>,
}

/// Apply XP events: bump totals, recompute level, advance the daily streak,
/// and unlock any achievements not already earned.
pub(crate) fn apply_xp(
    store: &Store,
    org_id: &str,
    user_id: &str,
    events: &[XpEvent],
) -> Result<XpOutcome, FronteraError> {
    let mut record = store.get_or_create_gamification(org_id, user_id)?;
    let delta: u32 = events.iter().map(|e| e.xp_amount()).sum();
    let level_up = check_level_up(record.total_xp, delta);

    let today = Utc::now().date_naive();
    record.total_xp += delta;
    record.level = level_up.new_level;
    record.streak = advance_streak(record.last_active, record.streak, today);
    record.last_active = Some(today);
    store.save_gamification(&record)?;

    let mut earned = store.earned_achievements(org_id, user_id)?;
    let mut unlocked = Vec::new();
    for event in events {
        for id in check_achievements(*event, &earned) {
            store.add_achievement(org_id, user_id, id)?;
            earned.insert(id.to_string());
            unlocked.push(id);
        }
    }

    Ok(XpOutcome {
        xp_awarded: delta,
        total_xp: record.total_xp,
        level: record.level,
        leveled_up: level_up.leveled_up,
        achievements_unlocked: unlocked,
    })
}

/// GET /api/gamification — XP, level, streak, and earned achievements.
pub async fn get_gamification(
    State(app): State<AppState>,
    identity: Identity,
) -> Result<Json<serde_json::Value>, AppError> {
    let org = identity.org_id.clone();
    let user = identity.user_id.clone();
    let (record, earned) = with_store(&app, move |store| {
        let record = store.get_or_create_gamification(&org, &user)?;
        let earned = store.earned_achievements(&org, &user)?;
        Ok((record, earned))
    })
    .await?;

    let info = level_info(record.total_xp);
    let achievements: Vec<serde_json::Value> = ACHIEVEMENTS
        .iter()
        .filter(|def| earned.contains(def.id))
        .map(|def| serde_json::json!({ "id": def.id, "title": def.title }))
        .collect();

    Ok(Json(serde_json::json!({
        "total_xp": record.total_xp,
        "level": info.level,
        "title": info.title,
        "xp_for_next_level": info.xp_for_next_level,
        "progress_in_level": info.progress_in_level,
        "streak": record.streak,
        "achievements": achievements,
    })))
}

#[derive(serde::Deserialize)]
pub struct AwardXpBody {
    pub event: String,
    pub idempotency_key: String,
}

/// POST /api/gamification/xp — award XP for a named event.
///
/// The idempotency key makes retries safe: a replayed key returns the
/// originally recorded award with `duplicate: true` and changes nothing.
pub async fn award_xp(
    State(app): State<AppState>,
    identity: Identity,
    Json(body): Json<AwardXpBody>,
) -> Result<Json<serde_json::Value>, AppError> {
    if body.idempotency_key.trim().is_empty() {
        return Err(AppError::bad_request("idempotency_key is required"));
    }
    let event = XpEvent::from_str(&body.event)?;

    let org = identity.org_id.clone();
    let user = identity.user_id.clone();
    let key = body.idempotency_key.clone();
    let response = with_store(&app, move |store| {
        if let Some(prior) = store.record_xp_award(&org, &user, &key, event, event.xp_amount())? {
            let record = store.get_or_create_gamification(&org, &user)?;
            return Ok(serde_json::json!({
                "duplicate": true,
                "event": prior.event.as_str(),
                "xp_awarded": prior.amount,
                "total_xp": record.total_xp,
                "level": record.level,
            }));
        }

        let outcome = apply_xp(store, &org, &user, &[event])?;
        Ok(serde_json::json!({
            "duplicate": false,
            "event": event.as_str(),
            "xp_awarded": outcome.xp_awarded,
            "total_xp": outcome.total_xp,
            "level": outcome.level,
            "leveled_up": outcome.leveled_up,
            "achievements_unlocked": outcome.achievements_unlocked,
        }))
    })
    .await?;

    app.analytics.emit(
        "xp_awarded",
        &identity.org_id,
        &identity.user_id,
        serde_json::json!({ "event": body.event }),
    );
    Ok(Json(response))
}
