//! Org-scoped relational store.
//!
//! Every query is filtered by `org_id`, so a caller can never read or write
//! rows belonging to another organization; cross-org lookups surface as
//! not-found. Conversations carry an integer `version` column for optimistic
//! concurrency: `update_framework_state` rejects writes against a stale
//! version with [`FronteraError::StaleWrite`], and the caller retries.
//!
//! Timestamps are stored as RFC 3339 text, JSON payloads as serialized text
//! columns.

use crate::assessment::{AssessmentResult, AssessmentSubmission};
use crate::error::{FronteraError, Result};
use crate::framework::FrameworkState;
use crate::gamification::XpEvent;
use crate::types::{
    AgentType, AssumptionStatus, BetStatus, ConversationStatus, InsightStatus, Territory,
};
use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use std::str::FromStr;
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Records
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Conversation {
    pub id: Uuid,
    pub org_id: String,
    pub user_id: String,
    pub agent_type: AgentType,
    pub status: ConversationStatus,
    pub framework_state: FrameworkState,
    /// Optimistic concurrency token; bumped on every state write.
    pub version: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TerritoryInsight {
    pub conversation_id: Uuid,
    pub territory: Territory,
    pub research_area: String,
    pub responses: Vec<String>,
    pub status: InsightStatus,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssessmentRecord {
    pub user_id: String,
    pub org_id: String,
    pub submission: AssessmentSubmission,
    pub result: AssessmentResult,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GamificationRecord {
    pub user_id: String,
    pub org_id: String,
    pub total_xp: u32,
    pub level: u32,
    pub streak: u32,
    pub last_active: Option<NaiveDate>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct XpAward {
    pub idempotency_key: String,
    pub event: XpEvent,
    pub amount: u32,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bet {
    pub id: Uuid,
    pub org_id: String,
    pub user_id: String,
    pub title: String,
    pub description: Option<String>,
    pub status: BetStatus,
    pub kill_date: Option<DateTime<Utc>>,
    pub kill_criteria: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Assumption {
    pub id: Uuid,
    pub org_id: String,
    pub user_id: String,
    pub statement: String,
    pub status: AssumptionStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StrategyMeta {
    pub last_review: Option<DateTime<Utc>>,
    pub strategy_set: Option<DateTime<Utc>>,
}

// ---------------------------------------------------------------------------
// Schema
// ---------------------------------------------------------------------------

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS conversations (
    id              TEXT PRIMARY KEY,
    org_id          TEXT NOT NULL,
    user_id         TEXT NOT NULL,
    agent_type      TEXT NOT NULL,
    status          TEXT NOT NULL,
    framework_state TEXT NOT NULL,
    version         INTEGER NOT NULL DEFAULT 1,
    created_at      TEXT NOT NULL,
    updated_at      TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_conversations_org ON conversations(org_id, user_id);

CREATE TABLE IF NOT EXISTS territory_insights (
    conversation_id TEXT NOT NULL,
    org_id          TEXT NOT NULL,
    territory       TEXT NOT NULL,
    research_area   TEXT NOT NULL,
    responses       TEXT NOT NULL,
    status          TEXT NOT NULL,
    updated_at      TEXT NOT NULL,
    UNIQUE(conversation_id, territory, research_area)
);

CREATE TABLE IF NOT EXISTS assessments (
    user_id    TEXT NOT NULL,
    org_id     TEXT NOT NULL,
    submission TEXT NOT NULL,
    result     TEXT NOT NULL,
    updated_at TEXT NOT NULL,
    PRIMARY KEY (user_id, org_id)
);

CREATE TABLE IF NOT EXISTS gamification (
    user_id     TEXT NOT NULL,
    org_id      TEXT NOT NULL,
    total_xp    INTEGER NOT NULL DEFAULT 0,
    level       INTEGER NOT NULL DEFAULT 1,
    streak      INTEGER NOT NULL DEFAULT 0,
    last_active TEXT,
    PRIMARY KEY (user_id, org_id)
);

CREATE TABLE IF NOT EXISTS achievements (
    user_id        TEXT NOT NULL,
    org_id         TEXT NOT NULL,
    achievement_id TEXT NOT NULL,
    earned_at      TEXT NOT NULL,
    PRIMARY KEY (user_id, org_id, achievement_id)
);

CREATE TABLE IF NOT EXISTS xp_awards (
    user_id         TEXT NOT NULL,
    org_id          TEXT NOT NULL,
    idempotency_key TEXT NOT NULL,
    event           TEXT NOT NULL,
    amount          INTEGER NOT NULL,
    created_at      TEXT NOT NULL,
    PRIMARY KEY (user_id, org_id, idempotency_key)
);

CREATE TABLE IF NOT EXISTS bets (
    id            TEXT PRIMARY KEY,
    org_id        TEXT NOT NULL,
    user_id       TEXT NOT NULL,
    title         TEXT NOT NULL,
    description   TEXT,
    status        TEXT NOT NULL,
    kill_date     TEXT,
    kill_criteria TEXT,
    created_at    TEXT NOT NULL,
    updated_at    TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_bets_org ON bets(org_id);

CREATE TABLE IF NOT EXISTS assumptions (
    id         TEXT PRIMARY KEY,
    org_id     TEXT NOT NULL,
    user_id    TEXT NOT NULL,
    statement  TEXT NOT NULL,
    status     TEXT NOT NULL,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_assumptions_org ON assumptions(org_id);

CREATE TABLE IF NOT EXISTS strategy_meta (
    org_id       TEXT NOT NULL,
    user_id      TEXT NOT NULL,
    last_review  TEXT,
    strategy_set TEXT,
    PRIMARY KEY (org_id, user_id)
);
"#;

// ---------------------------------------------------------------------------
// Row helpers
// ---------------------------------------------------------------------------

fn ts(dt: DateTime<Utc>) -> String {
    dt.to_rfc3339()
}

fn conv_err<E: std::error::Error + Send + Sync + 'static>(e: E) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(0, rusqlite::types::Type::Text, Box::new(e))
}

fn parse_ts(value: &str) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(conv_err)
}

fn parse_opt_ts(value: Option<String>) -> rusqlite::Result<Option<DateTime<Utc>>> {
    value.as_deref().map(parse_ts).transpose()
}

fn parse_uuid(value: &str) -> rusqlite::Result<Uuid> {
    Uuid::parse_str(value).map_err(conv_err)
}

// ---------------------------------------------------------------------------
// Store
// ---------------------------------------------------------------------------

pub struct Store {
    conn: Connection,
}

impl Store {
    /// Open (or create) the database at `path` and apply the schema.
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self { conn })
    }

    /// In-memory store for tests.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self { conn })
    }

    // -----------------------------------------------------------------------
    // Conversations
    // -----------------------------------------------------------------------

    pub fn create_conversation(
        &self,
        org_id: &str,
        user_id: &str,
        agent_type: AgentType,
    ) -> Result<Conversation> {
        let now = Utc::now();
        let conversation = Conversation {
            id: Uuid::new_v4(),
            org_id: org_id.to_string(),
            user_id: user_id.to_string(),
            agent_type,
            status: ConversationStatus::Active,
            framework_state: FrameworkState::new(),
            version: 1,
            created_at: now,
            updated_at: now,
        };
        self.conn.execute(
            "INSERT INTO conversations
                (id, org_id, user_id, agent_type, status, framework_state, version, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                conversation.id.to_string(),
                conversation.org_id,
                conversation.user_id,
                conversation.agent_type.as_str(),
                conversation.status.as_str(),
                serde_json::to_string(&conversation.framework_state)?,
                conversation.version,
                ts(conversation.created_at),
                ts(conversation.updated_at),
            ],
        )?;
        Ok(conversation)
    }

    pub fn get_conversation(&self, org_id: &str, id: Uuid) -> Result<Conversation> {
        self.conn
            .query_row(
                "SELECT id, org_id, user_id, agent_type, status, framework_state, version, created_at, updated_at
                 FROM conversations WHERE id = ?1 AND org_id = ?2",
                params![id.to_string(), org_id],
                row_to_conversation,
            )
            .optional()?
            .ok_or(FronteraError::ConversationNotFound(id))
    }

    pub fn list_conversations(&self, org_id: &str, user_id: &str) -> Result<Vec<Conversation>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, org_id, user_id, agent_type, status, framework_state, version, created_at, updated_at
             FROM conversations WHERE org_id = ?1 AND user_id = ?2 ORDER BY created_at DESC",
        )?;
        let rows = stmt.query_map(params![org_id, user_id], row_to_conversation)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    /// Write a new framework state against an expected version. Bumps the
    /// version on success; fails with `StaleWrite` when another writer got
    /// there first.
    pub fn update_framework_state(
        &self,
        org_id: &str,
        id: Uuid,
        expected_version: i64,
        state: &FrameworkState,
    ) -> Result<i64> {
        let changed = self.conn.execute(
            "UPDATE conversations
             SET framework_state = ?1, version = version + 1, updated_at = ?2
             WHERE id = ?3 AND org_id = ?4 AND version = ?5",
            params![
                serde_json::to_string(state)?,
                ts(Utc::now()),
                id.to_string(),
                org_id,
                expected_version,
            ],
        )?;
        if changed == 0 {
            // Distinguish a missing row from a lost race.
            self.get_conversation(org_id, id)?;
            return Err(FronteraError::StaleWrite {
                conversation: id,
                expected: expected_version,
            });
        }
        Ok(expected_version + 1)
    }

    pub fn set_conversation_status(
        &self,
        org_id: &str,
        id: Uuid,
        status: ConversationStatus,
    ) -> Result<()> {
        let changed = self.conn.execute(
            "UPDATE conversations SET status = ?1, updated_at = ?2 WHERE id = ?3 AND org_id = ?4",
            params![status.as_str(), ts(Utc::now()), id.to_string(), org_id],
        )?;
        if changed == 0 {
            return Err(FronteraError::ConversationNotFound(id));
        }
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Territory insights
    // -----------------------------------------------------------------------

    /// Insert or update the single row for (conversation, territory, area).
    /// New responses are appended; a `mapped` status is never downgraded.
    pub fn upsert_insight(
        &self,
        org_id: &str,
        conversation_id: Uuid,
        territory: Territory,
        research_area: &str,
        new_responses: &[String],
        status: InsightStatus,
    ) -> Result<TerritoryInsight> {
        // Ownership check before touching the row.
        self.get_conversation(org_id, conversation_id)?;

        let existing: Option<(String, String)> = self
            .conn
            .query_row(
                "SELECT responses, status FROM territory_insights
                 WHERE conversation_id = ?1 AND org_id = ?2 AND territory = ?3 AND research_area = ?4",
                params![
                    conversation_id.to_string(),
                    org_id,
                    territory.as_str(),
                    research_area
                ],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?;

        let (mut responses, merged_status) = match existing {
            Some((responses_json, status_str)) => {
                let responses: Vec<String> = serde_json::from_str(&responses_json)?;
                let current = InsightStatus::from_str(&status_str)?;
                let merged = if current == InsightStatus::Mapped {
                    InsightStatus::Mapped
                } else {
                    status
                };
                (responses, merged)
            }
            None => (Vec::new(), status),
        };
        responses.extend(new_responses.iter().cloned());

        let now = Utc::now();
        self.conn.execute(
            "INSERT INTO territory_insights
                (conversation_id, org_id, territory, research_area, responses, status, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
             ON CONFLICT(conversation_id, territory, research_area)
             DO UPDATE SET responses = excluded.responses,
                           status = excluded.status,
                           updated_at = excluded.updated_at",
            params![
                conversation_id.to_string(),
                org_id,
                territory.as_str(),
                research_area,
                serde_json::to_string(&responses)?,
                merged_status.as_str(),
                ts(now),
            ],
        )?;

        Ok(TerritoryInsight {
            conversation_id,
            territory,
            research_area: research_area.to_string(),
            responses,
            status: merged_status,
            updated_at: now,
        })
    }

    pub fn list_insights(
        &self,
        org_id: &str,
        conversation_id: Uuid,
    ) -> Result<Vec<TerritoryInsight>> {
        let mut stmt = self.conn.prepare(
            "SELECT conversation_id, territory, research_area, responses, status, updated_at
             FROM territory_insights WHERE conversation_id = ?1 AND org_id = ?2
             ORDER BY territory, research_area",
        )?;
        let rows = stmt.query_map(params![conversation_id.to_string(), org_id], |row| {
            let conversation_id: String = row.get(0)?;
            let territory: String = row.get(1)?;
            let responses: String = row.get(3)?;
            let status: String = row.get(4)?;
            let updated_at: String = row.get(5)?;
            Ok(TerritoryInsight {
                conversation_id: parse_uuid(&conversation_id)?,
                territory: Territory::from_str(&territory).map_err(conv_err)?,
                research_area: row.get(2)?,
                responses: serde_json::from_str(&responses).map_err(conv_err)?,
                status: InsightStatus::from_str(&status).map_err(conv_err)?,
                updated_at: parse_ts(&updated_at)?,
            })
        })?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    pub fn count_mapped(&self, org_id: &str, conversation_id: Uuid) -> Result<usize> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM territory_insights
             WHERE conversation_id = ?1 AND org_id = ?2 AND status = 'mapped'",
            params![conversation_id.to_string(), org_id],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }

    // -----------------------------------------------------------------------
    // Assessments
    // -----------------------------------------------------------------------

    /// Resubmission overwrites the prior record; results are not versioned.
    pub fn upsert_assessment(
        &self,
        org_id: &str,
        user_id: &str,
        submission: &AssessmentSubmission,
        result: &AssessmentResult,
    ) -> Result<AssessmentRecord> {
        let now = Utc::now();
        self.conn.execute(
            "INSERT INTO assessments (user_id, org_id, submission, result, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5)
             ON CONFLICT(user_id, org_id)
             DO UPDATE SET submission = excluded.submission,
                           result = excluded.result,
                           updated_at = excluded.updated_at",
            params![
                user_id,
                org_id,
                serde_json::to_string(submission)?,
                serde_json::to_string(result)?,
                ts(now),
            ],
        )?;
        Ok(AssessmentRecord {
            user_id: user_id.to_string(),
            org_id: org_id.to_string(),
            submission: submission.clone(),
            result: result.clone(),
            updated_at: now,
        })
    }

    pub fn get_assessment(&self, org_id: &str, user_id: &str) -> Result<Option<AssessmentRecord>> {
        Ok(self
            .conn
            .query_row(
                "SELECT user_id, org_id, submission, result, updated_at
                 FROM assessments WHERE user_id = ?1 AND org_id = ?2",
                params![user_id, org_id],
                |row| {
                    let submission: String = row.get(2)?;
                    let result: String = row.get(3)?;
                    let updated_at: String = row.get(4)?;
                    Ok(AssessmentRecord {
                        user_id: row.get(0)?,
                        org_id: row.get(1)?,
                        submission: serde_json::from_str(&submission).map_err(conv_err)?,
                        result: serde_json::from_str(&result).map_err(conv_err)?,
                        updated_at: parse_ts(&updated_at)?,
                    })
                },
            )
            .optional()?)
    }

    // -----------------------------------------------------------------------
    // Gamification
    // -----------------------------------------------------------------------

    pub fn get_or_create_gamification(
        &self,
        org_id: &str,
        user_id: &str,
    ) -> Result<GamificationRecord> {
        let existing = self
            .conn
            .query_row(
                "SELECT user_id, org_id, total_xp, level, streak, last_active
                 FROM gamification WHERE user_id = ?1 AND org_id = ?2",
                params![user_id, org_id],
                |row| {
                    let last_active: Option<String> = row.get(5)?;
                    let last_active = last_active
                        .as_deref()
                        .map(|s| NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(conv_err))
                        .transpose()?;
                    Ok(GamificationRecord {
                        user_id: row.get(0)?,
                        org_id: row.get(1)?,
                        total_xp: row.get::<_, i64>(2)? as u32,
                        level: row.get::<_, i64>(3)? as u32,
                        streak: row.get::<_, i64>(4)? as u32,
                        last_active,
                    })
                },
            )
            .optional()?;

        if let Some(record) = existing {
            return Ok(record);
        }

        let record = GamificationRecord {
            user_id: user_id.to_string(),
            org_id: org_id.to_string(),
            total_xp: 0,
            level: 1,
            streak: 0,
            last_active: None,
        };
        self.conn.execute(
            "INSERT INTO gamification (user_id, org_id, total_xp, level, streak, last_active)
             VALUES (?1, ?2, 0, 1, 0, NULL)",
            params![user_id, org_id],
        )?;
        Ok(record)
    }

    pub fn save_gamification(&self, record: &GamificationRecord) -> Result<()> {
        self.conn.execute(
            "UPDATE gamification
             SET total_xp = ?1, level = ?2, streak = ?3, last_active = ?4
             WHERE user_id = ?5 AND org_id = ?6",
            params![
                record.total_xp as i64,
                record.level as i64,
                record.streak as i64,
                record.last_active.map(|d| d.format("%Y-%m-%d").to_string()),
                record.user_id,
                record.org_id,
            ],
        )?;
        Ok(())
    }

    pub fn earned_achievements(&self, org_id: &str, user_id: &str) -> Result<HashSet<String>> {
        let mut stmt = self.conn.prepare(
            "SELECT achievement_id FROM achievements WHERE user_id = ?1 AND org_id = ?2",
        )?;
        let rows = stmt.query_map(params![user_id, org_id], |row| row.get::<_, String>(0))?;
        Ok(rows.collect::<rusqlite::Result<HashSet<_>>>()?)
    }

    /// Append-only: re-inserting an earned achievement is a no-op.
    pub fn add_achievement(&self, org_id: &str, user_id: &str, achievement_id: &str) -> Result<()> {
        self.conn.execute(
            "INSERT OR IGNORE INTO achievements (user_id, org_id, achievement_id, earned_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![user_id, org_id, achievement_id, ts(Utc::now())],
        )?;
        Ok(())
    }

    /// Record an XP award under an idempotency key. Returns the previously
    /// recorded award when the key was already used, `None` when this call
    /// recorded a fresh one.
    pub fn record_xp_award(
        &self,
        org_id: &str,
        user_id: &str,
        idempotency_key: &str,
        event: XpEvent,
        amount: u32,
    ) -> Result<Option<XpAward>> {
        let existing = self
            .conn
            .query_row(
                "SELECT idempotency_key, event, amount, created_at
                 FROM xp_awards WHERE user_id = ?1 AND org_id = ?2 AND idempotency_key = ?3",
                params![user_id, org_id, idempotency_key],
                |row| {
                    let event: String = row.get(1)?;
                    let created_at: String = row.get(3)?;
                    Ok(XpAward {
                        idempotency_key: row.get(0)?,
                        event: XpEvent::from_str(&event).map_err(conv_err)?,
                        amount: row.get::<_, i64>(2)? as u32,
                        created_at: parse_ts(&created_at)?,
                    })
                },
            )
            .optional()?;

        if existing.is_some() {
            return Ok(existing);
        }

        self.conn.execute(
            "INSERT INTO xp_awards (user_id, org_id, idempotency_key, event, amount, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                user_id,
                org_id,
                idempotency_key,
                event.as_str(),
                amount as i64,
                ts(Utc::now()),
            ],
        )?;
        Ok(None)
    }

    // -----------------------------------------------------------------------
    // Bets
    // -----------------------------------------------------------------------

    #[allow(clippy::too_many_arguments)]
    pub fn create_bet(
        &self,
        org_id: &str,
        user_id: &str,
        title: &str,
        description: Option<&str>,
        kill_date: Option<DateTime<Utc>>,
        kill_criteria: Option<&str>,
    ) -> Result<Bet> {
        let now = Utc::now();
        let bet = Bet {
            id: Uuid::new_v4(),
            org_id: org_id.to_string(),
            user_id: user_id.to_string(),
            title: title.to_string(),
            description: description.map(str::to_string),
            status: BetStatus::Proposed,
            kill_date,
            kill_criteria: kill_criteria.map(str::to_string),
            created_at: now,
            updated_at: now,
        };
        self.conn.execute(
            "INSERT INTO bets (id, org_id, user_id, title, description, status, kill_date, kill_criteria, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            params![
                bet.id.to_string(),
                bet.org_id,
                bet.user_id,
                bet.title,
                bet.description,
                bet.status.as_str(),
                bet.kill_date.map(ts),
                bet.kill_criteria,
                ts(bet.created_at),
                ts(bet.updated_at),
            ],
        )?;
        Ok(bet)
    }

    pub fn list_bets(&self, org_id: &str) -> Result<Vec<Bet>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, org_id, user_id, title, description, status, kill_date, kill_criteria, created_at, updated_at
             FROM bets WHERE org_id = ?1 ORDER BY created_at",
        )?;
        let rows = stmt.query_map(params![org_id], row_to_bet)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    pub fn set_bet_status(&self, org_id: &str, id: Uuid, status: BetStatus) -> Result<Bet> {
        let changed = self.conn.execute(
            "UPDATE bets SET status = ?1, updated_at = ?2 WHERE id = ?3 AND org_id = ?4",
            params![status.as_str(), ts(Utc::now()), id.to_string(), org_id],
        )?;
        if changed == 0 {
            return Err(FronteraError::BetNotFound(id));
        }
        self.conn
            .query_row(
                "SELECT id, org_id, user_id, title, description, status, kill_date, kill_criteria, created_at, updated_at
                 FROM bets WHERE id = ?1 AND org_id = ?2",
                params![id.to_string(), org_id],
                row_to_bet,
            )
            .optional()?
            .ok_or(FronteraError::BetNotFound(id))
    }

    // -----------------------------------------------------------------------
    // Assumptions
    // -----------------------------------------------------------------------

    pub fn create_assumption(
        &self,
        org_id: &str,
        user_id: &str,
        statement: &str,
    ) -> Result<Assumption> {
        let now = Utc::now();
        let assumption = Assumption {
            id: Uuid::new_v4(),
            org_id: org_id.to_string(),
            user_id: user_id.to_string(),
            statement: statement.to_string(),
            status: AssumptionStatus::Open,
            created_at: now,
            updated_at: now,
        };
        self.conn.execute(
            "INSERT INTO assumptions (id, org_id, user_id, statement, status, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                assumption.id.to_string(),
                assumption.org_id,
                assumption.user_id,
                assumption.statement,
                assumption.status.as_str(),
                ts(assumption.created_at),
                ts(assumption.updated_at),
            ],
        )?;
        Ok(assumption)
    }

    pub fn list_assumptions(&self, org_id: &str) -> Result<Vec<Assumption>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, org_id, user_id, statement, status, created_at, updated_at
             FROM assumptions WHERE org_id = ?1 ORDER BY created_at",
        )?;
        let rows = stmt.query_map(params![org_id], row_to_assumption)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    pub fn set_assumption_status(
        &self,
        org_id: &str,
        id: Uuid,
        status: AssumptionStatus,
    ) -> Result<Assumption> {
        let changed = self.conn.execute(
            "UPDATE assumptions SET status = ?1, updated_at = ?2 WHERE id = ?3 AND org_id = ?4",
            params![status.as_str(), ts(Utc::now()), id.to_string(), org_id],
        )?;
        if changed == 0 {
            return Err(FronteraError::AssumptionNotFound(id));
        }
        self.conn
            .query_row(
                "SELECT id, org_id, user_id, statement, status, created_at, updated_at
                 FROM assumptions WHERE id = ?1 AND org_id = ?2",
                params![id.to_string(), org_id],
                row_to_assumption,
            )
            .optional()?
            .ok_or(FronteraError::AssumptionNotFound(id))
    }

    // -----------------------------------------------------------------------
    // Strategy meta
    // -----------------------------------------------------------------------

    pub fn strategy_meta(&self, org_id: &str, user_id: &str) -> Result<StrategyMeta> {
        Ok(self
            .conn
            .query_row(
                "SELECT last_review, strategy_set FROM strategy_meta
                 WHERE org_id = ?1 AND user_id = ?2",
                params![org_id, user_id],
                |row| {
                    Ok(StrategyMeta {
                        last_review: parse_opt_ts(row.get(0)?)?,
                        strategy_set: parse_opt_ts(row.get(1)?)?,
                    })
                },
            )
            .optional()?
            .unwrap_or_default())
    }

    pub fn set_last_review(&self, org_id: &str, user_id: &str, when: DateTime<Utc>) -> Result<()> {
        self.conn.execute(
            "INSERT INTO strategy_meta (org_id, user_id, last_review)
             VALUES (?1, ?2, ?3)
             ON CONFLICT(org_id, user_id) DO UPDATE SET last_review = excluded.last_review",
            params![org_id, user_id, ts(when)],
        )?;
        Ok(())
    }

    /// Records when the strategy was first set; later calls keep the
    /// original date.
    pub fn mark_strategy_set(&self, org_id: &str, user_id: &str, when: DateTime<Utc>) -> Result<()> {
        self.conn.execute(
            "INSERT INTO strategy_meta (org_id, user_id, strategy_set)
             VALUES (?1, ?2, ?3)
             ON CONFLICT(org_id, user_id)
             DO UPDATE SET strategy_set = COALESCE(strategy_meta.strategy_set, excluded.strategy_set)",
            params![org_id, user_id, ts(when)],
        )?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Row mappers
// ---------------------------------------------------------------------------

fn row_to_conversation(row: &rusqlite::Row<'_>) -> rusqlite::Result<Conversation> {
    let id: String = row.get(0)?;
    let agent_type: String = row.get(3)?;
    let status: String = row.get(4)?;
    let framework_state: String = row.get(5)?;
    let created_at: String = row.get(7)?;
    let updated_at: String = row.get(8)?;
    Ok(Conversation {
        id: parse_uuid(&id)?,
        org_id: row.get(1)?,
        user_id: row.get(2)?,
        agent_type: AgentType::from_str(&agent_type).map_err(conv_err)?,
        status: ConversationStatus::from_str(&status).map_err(conv_err)?,
        framework_state: serde_json::from_str(&framework_state).map_err(conv_err)?,
        version: row.get(6)?,
        created_at: parse_ts(&created_at)?,
        updated_at: parse_ts(&updated_at)?,
    })
}

fn row_to_bet(row: &rusqlite::Row<'_>) -> rusqlite::Result<Bet> {
    let id: String = row.get(0)?;
    let status: String = row.get(5)?;
    let kill_date: Option<String> = row.get(6)?;
    let created_at: String = row.get(8)?;
    let updated_at: String = row.get(9)?;
    Ok(Bet {
        id: parse_uuid(&id)?,
        org_id: row.get(1)?,
        user_id: row.get(2)?,
        title: row.get(3)?,
        description: row.get(4)?,
        status: BetStatus::from_str(&status).map_err(conv_err)?,
        kill_date: parse_opt_ts(kill_date)?,
        kill_criteria: row.get(7)?,
        created_at: parse_ts(&created_at)?,
        updated_at: parse_ts(&updated_at)?,
    })
}

fn row_to_assumption(row: &rusqlite::Row<'_>) -> rusqlite::Result<Assumption> {
    let id: String = row.get(0)?;
    let status: String = row.get(4)?;
    let created_at: String = row.get(5)?;
    let updated_at: String = row.get(6)?;
    Ok(Assumption {
        id: parse_uuid(&id)?,
        org_id: row.get(1)?,
        user_id: row.get(2)?,
        statement: row.get(3)?,
        status: AssumptionStatus::from_str(&status).map_err(conv_err)?,
        created_at: parse_ts(&created_at)?,
        updated_at: parse_ts(&updated_at)?,
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::framework::{advance_phase, PhaseEvent};
    use crate::types::Phase;

    const ORG: &str = "org-acme";
    const USER: &str = "user-ada";

    #[test]
    fn conversation_roundtrip() {
        let store = Store::open_in_memory().unwrap();
        let created = store
            .create_conversation(ORG, USER, AgentType::StrategyCoach)
            .unwrap();
        let loaded = store.get_conversation(ORG, created.id).unwrap();
        assert_eq!(loaded.id, created.id);
        assert_eq!(loaded.agent_type, AgentType::StrategyCoach);
        assert_eq!(loaded.framework_state.current_phase, Phase::Discovery);
        assert_eq!(loaded.version, 1);
    }

    #[test]
    fn conversation_opens_on_disk() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("frontera.db");
        {
            let store = Store::open(&path).unwrap();
            store
                .create_conversation(ORG, USER, AgentType::Profiling)
                .unwrap();
        }
        let store = Store::open(&path).unwrap();
        assert_eq!(store.list_conversations(ORG, USER).unwrap().len(), 1);
    }

    #[test]
    fn cross_org_lookup_is_not_found() {
        let store = Store::open_in_memory().unwrap();
        let created = store
            .create_conversation(ORG, USER, AgentType::StrategyCoach)
            .unwrap();
        let err = store.get_conversation("org-other", created.id).unwrap_err();
        assert!(matches!(err, FronteraError::ConversationNotFound(_)));
        assert!(store.list_conversations("org-other", USER).unwrap().is_empty());
    }

    #[test]
    fn stale_write_rejected() {
        let store = Store::open_in_memory().unwrap();
        let conversation = store
            .create_conversation(ORG, USER, AgentType::StrategyCoach)
            .unwrap();

        let advanced =
            advance_phase(&conversation.framework_state, PhaseEvent::AssessmentCompleted).unwrap();
        let v2 = store
            .update_framework_state(ORG, conversation.id, 1, &advanced)
            .unwrap();
        assert_eq!(v2, 2);

        // A writer holding the old version loses.
        let err = store
            .update_framework_state(ORG, conversation.id, 1, &advanced)
            .unwrap_err();
        assert!(matches!(err, FronteraError::StaleWrite { .. }));

        let loaded = store.get_conversation(ORG, conversation.id).unwrap();
        assert_eq!(loaded.version, 2);
        assert_eq!(loaded.framework_state.current_phase, Phase::Research);
    }

    #[test]
    fn insight_upsert_appends_and_keeps_mapped() {
        let store = Store::open_in_memory().unwrap();
        let conversation = store
            .create_conversation(ORG, USER, AgentType::StrategyCoach)
            .unwrap();

        let first = store
            .upsert_insight(
                ORG,
                conversation.id,
                Territory::Company,
                "finance",
                &["$2M ARR".to_string()],
                InsightStatus::InProgress,
            )
            .unwrap();
        assert_eq!(first.responses.len(), 1);
        assert_eq!(first.status, InsightStatus::InProgress);

        let second = store
            .upsert_insight(
                ORG,
                conversation.id,
                Territory::Company,
                "finance",
                &["18 month runway".to_string()],
                InsightStatus::Mapped,
            )
            .unwrap();
        assert_eq!(second.responses.len(), 2);
        assert_eq!(second.status, InsightStatus::Mapped);

        // Later in_progress writes do not downgrade mapped.
        let third = store
            .upsert_insight(
                ORG,
                conversation.id,
                Territory::Company,
                "finance",
                &[],
                InsightStatus::InProgress,
            )
            .unwrap();
        assert_eq!(third.status, InsightStatus::Mapped);

        // Still a single row.
        assert_eq!(store.list_insights(ORG, conversation.id).unwrap().len(), 1);
        assert_eq!(store.count_mapped(ORG, conversation.id).unwrap(), 1);
    }

    #[test]
    fn mapped_count_across_territories() {
        let store = Store::open_in_memory().unwrap();
        let conversation = store
            .create_conversation(ORG, USER, AgentType::StrategyCoach)
            .unwrap();
        for (territory, area) in [
            (Territory::Company, "finance"),
            (Territory::Customer, "personas"),
            (Territory::Competitor, "pricing"),
        ] {
            store
                .upsert_insight(ORG, conversation.id, territory, area, &[], InsightStatus::Mapped)
                .unwrap();
        }
        assert_eq!(store.count_mapped(ORG, conversation.id).unwrap(), 3);
    }

    #[test]
    fn assessment_overwritten_on_resubmit() {
        let store = Store::open_in_memory().unwrap();
        let submission = AssessmentSubmission::default();
        let result = AssessmentResult {
            scores: crate::assessment::DimensionScores {
                vision: 80,
                customer_empathy: 50,
                experimentation: 50,
                evidence: 50,
                execution: 50,
            },
            overall: 56,
            archetype: crate::assessment::Archetype::Visionary,
        };
        store
            .upsert_assessment(ORG, USER, &submission, &result)
            .unwrap();

        let mut second = result.clone();
        second.overall = 70;
        store
            .upsert_assessment(ORG, USER, &submission, &second)
            .unwrap();

        let loaded = store.get_assessment(ORG, USER).unwrap().unwrap();
        assert_eq!(loaded.result.overall, 70);
        assert!(store.get_assessment("org-other", USER).unwrap().is_none());
    }

    #[test]
    fn gamification_record_lifecycle() {
        let store = Store::open_in_memory().unwrap();
        let mut record = store.get_or_create_gamification(ORG, USER).unwrap();
        assert_eq!(record.total_xp, 0);
        assert_eq!(record.level, 1);

        record.total_xp = 150;
        record.level = 2;
        record.streak = 3;
        record.last_active = NaiveDate::from_ymd_opt(2026, 3, 10);
        store.save_gamification(&record).unwrap();

        let loaded = store.get_or_create_gamification(ORG, USER).unwrap();
        assert_eq!(loaded.total_xp, 150);
        assert_eq!(loaded.streak, 3);
        assert_eq!(loaded.last_active, NaiveDate::from_ymd_opt(2026, 3, 10));
    }

    #[test]
    fn achievements_append_only() {
        let store = Store::open_in_memory().unwrap();
        store.add_achievement(ORG, USER, "territory_explorer").unwrap();
        store.add_achievement(ORG, USER, "territory_explorer").unwrap();
        let earned = store.earned_achievements(ORG, USER).unwrap();
        assert_eq!(earned.len(), 1);
        assert!(earned.contains("territory_explorer"));
    }

    #[test]
    fn xp_award_idempotency() {
        let store = Store::open_in_memory().unwrap();
        let fresh = store
            .record_xp_award(ORG, USER, "key-1", XpEvent::AreaMapped, 25)
            .unwrap();
        assert!(fresh.is_none());

        let replay = store
            .record_xp_award(ORG, USER, "key-1", XpEvent::AreaMapped, 25)
            .unwrap()
            .unwrap();
        assert_eq!(replay.event, XpEvent::AreaMapped);
        assert_eq!(replay.amount, 25);

        // A different key records fresh.
        assert!(store
            .record_xp_award(ORG, USER, "key-2", XpEvent::DailyLogin, 5)
            .unwrap()
            .is_none());
    }

    #[test]
    fn bets_scoped_by_org() {
        let store = Store::open_in_memory().unwrap();
        let bet = store
            .create_bet(ORG, USER, "land EU", None, None, Some("no EU deal by Q3"))
            .unwrap();
        assert_eq!(bet.status, BetStatus::Proposed);
        assert_eq!(store.list_bets(ORG).unwrap().len(), 1);
        assert!(store.list_bets("org-other").unwrap().is_empty());

        let err = store
            .set_bet_status("org-other", bet.id, BetStatus::Killed)
            .unwrap_err();
        assert!(matches!(err, FronteraError::BetNotFound(_)));

        let updated = store.set_bet_status(ORG, bet.id, BetStatus::Validated).unwrap();
        assert_eq!(updated.status, BetStatus::Validated);
    }

    #[test]
    fn assumption_status_updates() {
        let store = Store::open_in_memory().unwrap();
        let assumption = store
            .create_assumption(ORG, USER, "SMBs will self-serve")
            .unwrap();
        assert_eq!(assumption.status, AssumptionStatus::Open);
        let updated = store
            .set_assumption_status(ORG, assumption.id, AssumptionStatus::Invalidated)
            .unwrap();
        assert_eq!(updated.status, AssumptionStatus::Invalidated);
    }

    #[test]
    fn strategy_meta_defaults_and_updates() {
        let store = Store::open_in_memory().unwrap();
        let meta = store.strategy_meta(ORG, USER).unwrap();
        assert!(meta.last_review.is_none());
        assert!(meta.strategy_set.is_none());

        let first = Utc::now();
        store.mark_strategy_set(ORG, USER, first).unwrap();
        store.mark_strategy_set(ORG, USER, first + chrono::Duration::days(5)).unwrap();
        store.set_last_review(ORG, USER, first + chrono::Duration::days(30)).unwrap();

        let meta = store.strategy_meta(ORG, USER).unwrap();
        // First strategy-set date sticks.
        assert_eq!(meta.strategy_set.unwrap().timestamp(), first.timestamp());
        assert!(meta.last_review.is_some());
    }

    #[test]
    fn insight_upsert_checks_conversation_ownership() {
        let store = Store::open_in_memory().unwrap();
        let conversation = store
            .create_conversation(ORG, USER, AgentType::StrategyCoach)
            .unwrap();
        let err = store
            .upsert_insight(
                "org-other",
                conversation.id,
                Territory::Customer,
                "personas",
                &[],
                InsightStatus::InProgress,
            )
            .unwrap_err();
        assert!(matches!(err, FronteraError::ConversationNotFound(_)));
    }
}
