use thiserror::Error;

#[derive(Debug, Error)]
pub enum FronteraError {
    #[error("conversation not found: {0}")]
    ConversationNotFound(uuid::Uuid),

    #[error("bet not found: {0}")]
    BetNotFound(uuid::Uuid),

    #[error("assumption not found: {0}")]
    AssumptionNotFound(uuid::Uuid),

    #[error("stale write on conversation {conversation}: expected version {expected}")]
    StaleWrite {
        conversation: uuid::Uuid,
        expected: i64,
    },

    #[error("invalid transition from {phase} on event {event}")]
    InvalidPhaseTransition { phase: String, event: String },

    #[error("invalid phase: {0}")]
    InvalidPhase(String),

    #[error("unknown xp event: {0}")]
    UnknownXpEvent(String),

    #[error("unknown territory: {0}")]
    UnknownTerritory(String),

    #[error("unknown agent type: {0}")]
    UnknownAgentType(String),

    #[error("invalid status: {0}")]
    InvalidStatus(String),

    #[error("missing answer for question: {0}")]
    MissingAnswer(String),

    #[error("unknown question: {0}")]
    UnknownQuestion(String),

    #[error("likert score out of range for {id}: {score} (must be 1-5)")]
    InvalidLikertScore { id: String, score: u8 },

    #[error("unknown choice '{choice}' for scenario {scenario}")]
    UnknownChoice { scenario: String, choice: String },

    #[error(transparent)]
    Sqlite(#[from] rusqlite::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, FronteraError>;
