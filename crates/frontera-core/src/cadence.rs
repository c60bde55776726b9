//! Strategy review cadence calculator.
//!
//! Pure over the supplied clock and records: given bets, assumptions, and
//! review/strategy dates, compute which review reminders are due. No I/O.

use crate::store::{Assumption, Bet};
use crate::types::{AssumptionStatus, Urgency};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

pub const KILL_DATE_WARNING_DAYS: i64 = 7;
pub const INVALIDATION_WINDOW_DAYS: i64 = 7;
pub const MONTHLY_REVIEW_DAYS: i64 = 30;
pub const MONTHLY_ESCALATION_DAYS: i64 = 45;
pub const QUARTERLY_CYCLE_DAYS: i64 = 90;
pub const QUARTERLY_WINDOW_DAYS: i64 = 14;

// ---------------------------------------------------------------------------
// ReviewTrigger
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TriggerKind {
    KillDate,
    AssumptionInvalidated,
    Monthly,
    Quarterly,
}

impl TriggerKind {
    pub fn as_str(self) -> &'static str {
        match self {
            TriggerKind::KillDate => "kill_date",
            TriggerKind::AssumptionInvalidated => "assumption_invalidated",
            TriggerKind::Monthly => "monthly",
            TriggerKind::Quarterly => "quarterly",
        }
    }
}

impl fmt::Display for TriggerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewTrigger {
    pub kind: TriggerKind,
    pub urgency: Urgency,
    pub due: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject_id: Option<Uuid>,
    pub message: String,
}

// ---------------------------------------------------------------------------
// Calculator
// ---------------------------------------------------------------------------

/// Compute all due review triggers, sorted by urgency (high first) then due
/// date. Ties beyond that keep input order (stable sort).
pub fn review_triggers(
    now: DateTime<Utc>,
    bets: &[Bet],
    assumptions: &[Assumption],
    last_review: Option<DateTime<Utc>>,
    strategy_set: Option<DateTime<Utc>>,
) -> Vec<ReviewTrigger> {
    let mut triggers = Vec::new();

    for bet in bets {
        let Some(kill_date) = bet.kill_date else {
            continue;
        };
        if bet.status.is_settled() {
            continue;
        }
        if kill_date <= now {
            triggers.push(ReviewTrigger {
                kind: TriggerKind::KillDate,
                urgency: Urgency::High,
                due: kill_date,
                subject_id: Some(bet.id),
                message: format!("Kill date passed for bet '{}'", bet.title),
            });
        } else if kill_date - now <= Duration::days(KILL_DATE_WARNING_DAYS) {
            triggers.push(ReviewTrigger {
                kind: TriggerKind::KillDate,
                urgency: Urgency::Medium,
                due: kill_date,
                subject_id: Some(bet.id),
                message: format!("Kill date approaching for bet '{}'", bet.title),
            });
        }
    }

    for assumption in assumptions {
        if assumption.status != AssumptionStatus::Invalidated {
            continue;
        }
        let age = now - assumption.updated_at;
        if age >= Duration::zero() && age <= Duration::days(INVALIDATION_WINDOW_DAYS) {
            triggers.push(ReviewTrigger {
                kind: TriggerKind::AssumptionInvalidated,
                urgency: Urgency::High,
                due: assumption.updated_at,
                subject_id: Some(assumption.id),
                message: format!("Assumption invalidated: {}", assumption.statement),
            });
        }
    }

    // Monthly: measured from the last review, or from when the strategy was
    // set if no review was ever recorded.
    if let Some(anchor) = last_review.or(strategy_set) {
        let elapsed = (now - anchor).num_days();
        if elapsed >= MONTHLY_REVIEW_DAYS {
            let urgency = if elapsed >= MONTHLY_ESCALATION_DAYS {
                Urgency::Medium
            } else {
                Urgency::Low
            };
            triggers.push(ReviewTrigger {
                kind: TriggerKind::Monthly,
                urgency,
                due: anchor + Duration::days(MONTHLY_REVIEW_DAYS),
                subject_id: None,
                message: format!("{elapsed} days since last strategy review"),
            });
        }
    }

    // Quarterly: a 14-day window after each 90-day anniversary of the
    // strategy-set date.
    if let Some(set) = strategy_set {
        let days = (now - set).num_days();
        if days >= QUARTERLY_CYCLE_DAYS && days % QUARTERLY_CYCLE_DAYS <= QUARTERLY_WINDOW_DAYS {
            let quarters = days / QUARTERLY_CYCLE_DAYS;
            triggers.push(ReviewTrigger {
                kind: TriggerKind::Quarterly,
                urgency: Urgency::Low,
                due: set + Duration::days(quarters * QUARTERLY_CYCLE_DAYS),
                subject_id: None,
                message: format!("Quarterly strategy review (quarter {quarters})"),
            });
        }
    }

    triggers.sort_by(|a, b| a.urgency.cmp(&b.urgency).then(a.due.cmp(&b.due)));
    triggers
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
