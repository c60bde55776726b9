use crate::error::{FronteraError, Result};
use crate::types::Phase;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Mapped research areas needed before the research phase can advance to
/// synthesis (4 of 9).
pub const SYNTHESIS_READY_AREAS: usize = 4;

/// Total research areas across the three territories (3 each).
pub const TOTAL_RESEARCH_AREAS: usize = 9;

// ---------------------------------------------------------------------------
// ResearchPillar
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResearchPillar {
    pub started: bool,
    pub completed: bool,
    pub insights: Vec<String>,
}

/// The three fixed pillar keys. Field names are part of the persisted JSON
/// contract and must not change.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResearchPillars {
    #[serde(rename = "macroMarket")]
    pub macro_market: ResearchPillar,
    pub customer: ResearchPillar,
    pub colleague: ResearchPillar,
}

// ---------------------------------------------------------------------------
// FrameworkState
// ---------------------------------------------------------------------------

/// The single JSON document tracking a conversation's phase and accumulated
/// research data. Serialized camelCase for compatibility with existing rows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FrameworkState {
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    pub current_phase: Phase,
    pub session_count: u32,
    pub total_message_count: u32,
    pub strategic_bets: Vec<String>,
    pub key_insights: Vec<String>,
    pub research_pillars: ResearchPillars,
}

fn default_schema_version() -> u32 {
    1
}

impl Default for FrameworkState {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameworkState {
    /// Fresh state: discovery phase, zeroed counters, three unstarted pillars.
    pub fn new() -> Self {
        Self {
            schema_version: 1,
            current_phase: Phase::Discovery,
            session_count: 0,
            total_message_count: 0,
            strategic_bets: Vec::new(),
            key_insights: Vec::new(),
            research_pillars: ResearchPillars::default(),
        }
    }

    pub fn record_message(&mut self) {
        self.total_message_count += 1;
    }

    pub fn record_session(&mut self) {
        self.session_count += 1;
    }

    pub fn add_key_insight(&mut self, insight: impl Into<String>) {
        self.key_insights.push(insight.into());
    }

    pub fn add_strategic_bet(&mut self, bet: impl Into<String>) {
        self.strategic_bets.push(bet.into());
    }
}

// ---------------------------------------------------------------------------
// PhaseEvent
// ---------------------------------------------------------------------------

/// Events that can advance a conversation's phase. These are the only
/// sanctioned way to change `currentPhase`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum PhaseEvent {
    AssessmentCompleted,
    ResearchProgress {
        #[serde(default)]
        mapped: usize,
    },
    SynthesisGenerated,
    BetCreated,
}

impl PhaseEvent {
    pub fn as_str(self) -> &'static str {
        match self {
            PhaseEvent::AssessmentCompleted => "assessment_completed",
            PhaseEvent::ResearchProgress { .. } => "research_progress",
            PhaseEvent::SynthesisGenerated => "synthesis_generated",
            PhaseEvent::BetCreated => "bet_created",
        }
    }
}

impl fmt::Display for PhaseEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// advance_phase
// ---------------------------------------------------------------------------

/// The authoritative phase reducer. Applies `event` to `state` and returns
/// the updated state, or `InvalidPhaseTransition` when the event is not
/// applicable in the current phase.
///
/// Transition table:
///   discovery + assessment_completed        -> research
///   research  + research_progress (>= 4)    -> synthesis
///   research  + research_progress (< 4)     -> research (no-op)
///   synthesis + synthesis_generated         -> bets
///   bets      + bet_created                 -> planning
///
/// Planning is terminal. `ResearchProgress` below the threshold succeeds
/// without advancing because mapped-count events fire on every insight
/// upsert.
pub fn advance_phase(state: &FrameworkState, event: PhaseEvent) -> Result<FrameworkState> {
    let next = match (state.current_phase, event) {
        (Phase::Discovery, PhaseEvent::AssessmentCompleted) => Phase::Research,
        (Phase::Research, PhaseEvent::ResearchProgress { mapped }) => {
            if mapped >= SYNTHESIS_READY_AREAS {
                Phase::Synthesis
            } else {
                Phase::Research
            }
        }
        (Phase::Synthesis, PhaseEvent::SynthesisGenerated) => Phase::Bets,
        (Phase::Bets, PhaseEvent::BetCreated) => Phase::Planning,
        (phase, event) => {
            return Err(FronteraError::InvalidPhaseTransition {
                phase: phase.to_string(),
                event: event.to_string(),
            })
        }
    };

    let mut out = state.clone();
    out.current_phase = next;
    Ok(out)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_state_is_discovery_with_zeroed_counters() {
        let s = FrameworkState::new();
        assert_eq!(s.current_phase, Phase::Discovery);
        assert_eq!(s.session_count, 0);
        assert_eq!(s.total_message_count, 0);
        assert!(s.strategic_bets.is_empty());
        assert!(s.key_insights.is_empty());
        assert!(!s.research_pillars.macro_market.started);
        assert!(!s.research_pillars.customer.started);
        assert!(!s.research_pillars.colleague.started);
    }

    #[test]
    fn json_shape_is_camel_case() {
        let s = FrameworkState::new();
        let json = serde_json::to_value(&s).unwrap();
        assert_eq!(json["currentPhase"], "discovery");
        assert_eq!(json["sessionCount"], 0);
        assert_eq!(json["totalMessageCount"], 0);
        assert!(json["researchPillars"]["macroMarket"].is_object());
        assert!(json["researchPillars"]["customer"].is_object());
        assert!(json["researchPillars"]["colleague"].is_object());
        assert_eq!(json["researchPillars"]["macroMarket"]["started"], false);
    }

    #[test]
    fn rows_without_schema_version_migrate_on_read() {
        // Pre-versioning rows lack schemaVersion entirely.
        let json = r#"{
            "currentPhase": "research",
            "sessionCount": 3,
            "totalMessageCount": 41,
            "strategicBets": [],
            "keyInsights": ["pricing is the wedge"],
            "researchPillars": {
                "macroMarket": {"started": true, "completed": false, "insights": []},
                "customer": {"started": false, "completed": false, "insights": []},
                "colleague": {"started": false, "completed": false, "insights": []}
            }
        }"#;
        let s: FrameworkState = serde_json::from_str(json).unwrap();
        assert_eq!(s.schema_version, 1);
        assert_eq!(s.current_phase, Phase::Research);
        assert_eq!(s.key_insights.len(), 1);
    }

    #[test]
    fn research_progress_count_is_optional_on_the_wire() {
        let event: PhaseEvent = serde_json::from_str(r#"{"event": "research_progress"}"#).unwrap();
        assert_eq!(event, PhaseEvent::ResearchProgress { mapped: 0 });
    }

    #[test]
    fn assessment_advances_discovery_to_research() {
        let s = FrameworkState::new();
        let next = advance_phase(&s, PhaseEvent::AssessmentCompleted).unwrap();
        assert_eq!(next.current_phase, Phase::Research);
    }

    #[test]
    fn research_progress_below_threshold_is_noop() {
        let mut s = FrameworkState::new();
        s.current_phase = Phase::Research;
        let next = advance_phase(&s, PhaseEvent::ResearchProgress { mapped: 3 }).unwrap();
        assert_eq!(next.current_phase, Phase::Research);
    }

    #[test]
    fn research_progress_at_threshold_advances() {
        let mut s = FrameworkState::new();
        s.current_phase = Phase::Research;
        let next = advance_phase(
            &s,
            PhaseEvent::ResearchProgress {
                mapped: SYNTHESIS_READY_AREAS,
            },
        )
        .unwrap();
        assert_eq!(next.current_phase, Phase::Synthesis);
    }

    #[test]
    fn full_progression() {
        let mut s = FrameworkState::new();
        s = advance_phase(&s, PhaseEvent::AssessmentCompleted).unwrap();
        s = advance_phase(&s, PhaseEvent::ResearchProgress { mapped: 9 }).unwrap();
        s = advance_phase(&s, PhaseEvent::SynthesisGenerated).unwrap();
        s = advance_phase(&s, PhaseEvent::BetCreated).unwrap();
        assert_eq!(s.current_phase, Phase::Planning);
    }

    #[test]
    fn illegal_transitions_rejected() {
        let s = FrameworkState::new();
        // synthesis_generated is not valid in discovery
        let err = advance_phase(&s, PhaseEvent::SynthesisGenerated).unwrap_err();
        assert!(matches!(err, FronteraError::InvalidPhaseTransition { .. }));

        // planning is terminal
        let mut done = FrameworkState::new();
        done.current_phase = Phase::Planning;
        for event in [
            PhaseEvent::AssessmentCompleted,
            PhaseEvent::ResearchProgress { mapped: 9 },
            PhaseEvent::SynthesisGenerated,
            PhaseEvent::BetCreated,
        ] {
            assert!(advance_phase(&done, event).is_err());
        }
    }

    #[test]
    fn reducer_does_not_mutate_input() {
        let s = FrameworkState::new();
        let _ = advance_phase(&s, PhaseEvent::AssessmentCompleted).unwrap();
        assert_eq!(s.current_phase, Phase::Discovery);
    }
}
