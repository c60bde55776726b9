use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// Phase
// ---------------------------------------------------------------------------

/// Coaching phases, in order. The progression is linear and forward-only;
/// transitions are owned by [`crate::framework::advance_phase`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Discovery,
    Research,
    Synthesis,
    Bets,
    Planning,
}

impl Phase {
    pub fn all() -> &'static [Phase] {
        &[
            Phase::Discovery,
            Phase::Research,
            Phase::Synthesis,
            Phase::Bets,
            Phase::Planning,
        ]
    }

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn next(self) -> Option<Phase> {
        Phase::all().get(self.index() + 1).copied()
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Phase::Discovery => "discovery",
            Phase::Research => "research",
            Phase::Synthesis => "synthesis",
            Phase::Bets => "bets",
            Phase::Planning => "planning",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Phase {
    type Err = crate::error::FronteraError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "discovery" => Ok(Phase::Discovery),
            "research" => Ok(Phase::Research),
            "synthesis" => Ok(Phase::Synthesis),
            "bets" => Ok(Phase::Bets),
            "planning" => Ok(Phase::Planning),
            _ => Err(crate::error::FronteraError::InvalidPhase(s.to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// Territory
// ---------------------------------------------------------------------------

/// The three fixed research domains a user investigates during the research
/// phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Territory {
    Company,
    Customer,
    Competitor,
}

impl Territory {
    pub fn all() -> &'static [Territory] {
        &[Territory::Company, Territory::Customer, Territory::Competitor]
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Territory::Company => "company",
            Territory::Customer => "customer",
            Territory::Competitor => "competitor",
        }
    }
}

impl fmt::Display for Territory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Territory {
    type Err = crate::error::FronteraError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "company" => Ok(Territory::Company),
            "customer" => Ok(Territory::Customer),
            "competitor" => Ok(Territory::Competitor),
            _ => Err(crate::error::FronteraError::UnknownTerritory(s.to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// AgentType
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentType {
    StrategyCoach,
    Profiling,
}

impl AgentType {
    pub fn as_str(self) -> &'static str {
        match self {
            AgentType::StrategyCoach => "strategy_coach",
            AgentType::Profiling => "profiling",
        }
    }
}

impl fmt::Display for AgentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for AgentType {
    type Err = crate::error::FronteraError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "strategy_coach" => Ok(AgentType::StrategyCoach),
            "profiling" => Ok(AgentType::Profiling),
            _ => Err(crate::error::FronteraError::UnknownAgentType(s.to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// ConversationStatus
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConversationStatus {
    Active,
    Archived,
    Completed,
}

impl ConversationStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            ConversationStatus::Active => "active",
            ConversationStatus::Archived => "archived",
            ConversationStatus::Completed => "completed",
        }
    }
}

impl std::str::FromStr for ConversationStatus {
    type Err = crate::error::FronteraError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(ConversationStatus::Active),
            "archived" => Ok(ConversationStatus::Archived),
            "completed" => Ok(ConversationStatus::Completed),
            _ => Err(crate::error::FronteraError::InvalidStatus(s.to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// InsightStatus
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InsightStatus {
    Unexplored,
    InProgress,
    Mapped,
}

impl InsightStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            InsightStatus::Unexplored => "unexplored",
            InsightStatus::InProgress => "in_progress",
            InsightStatus::Mapped => "mapped",
        }
    }
}

impl std::str::FromStr for InsightStatus {
    type Err = crate::error::FronteraError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "unexplored" => Ok(InsightStatus::Unexplored),
            "in_progress" => Ok(InsightStatus::InProgress),
            "mapped" => Ok(InsightStatus::Mapped),
            _ => Err(crate::error::FronteraError::InvalidStatus(s.to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// BetStatus / AssumptionStatus
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BetStatus {
    Proposed,
    Active,
    Validated,
    Killed,
}

impl BetStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            BetStatus::Proposed => "proposed",
            BetStatus::Active => "active",
            BetStatus::Validated => "validated",
            BetStatus::Killed => "killed",
        }
    }

    /// A bet that has reached a terminal outcome no longer needs kill-date
    /// reminders.
    pub fn is_settled(self) -> bool {
        matches!(self, BetStatus::Validated | BetStatus::Killed)
    }
}

impl std::str::FromStr for BetStatus {
    type Err = crate::error::FronteraError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "proposed" => Ok(BetStatus::Proposed),
            "active" => Ok(BetStatus::Active),
            "validated" => Ok(BetStatus::Validated),
            "killed" => Ok(BetStatus::Killed),
            _ => Err(crate::error::FronteraError::InvalidStatus(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssumptionStatus {
    Open,
    Validated,
    Invalidated,
}

impl AssumptionStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            AssumptionStatus::Open => "open",
            AssumptionStatus::Validated => "validated",
            AssumptionStatus::Invalidated => "invalidated",
        }
    }
}

impl std::str::FromStr for AssumptionStatus {
    type Err = crate::error::FronteraError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "open" => Ok(AssumptionStatus::Open),
            "validated" => Ok(AssumptionStatus::Validated),
            "invalidated" => Ok(AssumptionStatus::Invalidated),
            _ => Err(crate::error::FronteraError::InvalidStatus(s.to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// Urgency
// ---------------------------------------------------------------------------

/// Review-trigger urgency. Ordered so that sorting ascending puts high
/// urgency first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Urgency {
    High,
    Medium,
    Low,
}

impl Urgency {
    pub fn as_str(self) -> &'static str {
        match self {
            Urgency::High => "high",
            Urgency::Medium => "medium",
            Urgency::Low => "low",
        }
    }
}

impl fmt::Display for Urgency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
