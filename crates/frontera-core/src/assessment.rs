//! Rule-based maturity assessment scoring.
//!
//! Maps a fixed questionnaire (Likert items plus situational choices) to
//! five dimension scores on a 0-100 scale, an overall maturity scalar, and
//! a behavioral archetype chosen by nearest match against fixed reference
//! profiles. Pure functions; persistence happens in the caller.
//!
//! Scoring rules (fixed, documented here rather than left implicit):
//! - Reverse-scored Likert items use `6 - raw` before normalizing.
//! - Item score = `(adjusted - 1) / 4 * 100`.
//! - Dimension score = `0.7 * likert_mean + 0.3 * situational_mean` when any
//!   situational choice touched the dimension, Likert mean alone otherwise.
//! - Overall = unweighted mean of the five dimension scores.
//! - Archetype = smallest Euclidean distance; ties keep the archetype listed
//!   first in [`Archetype::all`].

use crate::error::{FronteraError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

const LIKERT_WEIGHT: f64 = 0.7;
const SITUATIONAL_WEIGHT: f64 = 0.3;

// ---------------------------------------------------------------------------
// Dimension
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Dimension {
    Vision,
    CustomerEmpathy,
    Experimentation,
    Evidence,
    Execution,
}

impl Dimension {
    pub fn all() -> &'static [Dimension] {
        &[
            Dimension::Vision,
            Dimension::CustomerEmpathy,
            Dimension::Experimentation,
            Dimension::Evidence,
            Dimension::Execution,
        ]
    }

    fn index(self) -> usize {
        self as usize
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Dimension::Vision => "vision",
            Dimension::CustomerEmpathy => "customer_empathy",
            Dimension::Experimentation => "experimentation",
            Dimension::Evidence => "evidence",
            Dimension::Execution => "execution",
        }
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Question banks
// ---------------------------------------------------------------------------

struct LikertItem {
    id: &'static str,
    dimension: Dimension,
    reverse: bool,
}

const LIKERT_ITEMS: &[LikertItem] = &[
    LikertItem { id: "v1", dimension: Dimension::Vision, reverse: false },
    LikertItem { id: "v2", dimension: Dimension::Vision, reverse: true },
    LikertItem { id: "c1", dimension: Dimension::CustomerEmpathy, reverse: false },
    LikertItem { id: "c2", dimension: Dimension::CustomerEmpathy, reverse: true },
    LikertItem { id: "x1", dimension: Dimension::Experimentation, reverse: false },
    LikertItem { id: "x2", dimension: Dimension::Experimentation, reverse: true },
    LikertItem { id: "e1", dimension: Dimension::Evidence, reverse: false },
    LikertItem { id: "e2", dimension: Dimension::Evidence, reverse: true },
    LikertItem { id: "o1", dimension: Dimension::Execution, reverse: false },
    LikertItem { id: "o2", dimension: Dimension::Execution, reverse: false },
];

struct SituationalChoice {
    id: &'static str,
    dimension: Dimension,
    value: u32,
}

struct Scenario {
    id: &'static str,
    choices: &'static [SituationalChoice],
}

const SCENARIOS: &[Scenario] = &[
    Scenario {
        id: "s1",
        choices: &[
            SituationalChoice { id: "a", dimension: Dimension::Vision, value: 90 },
            SituationalChoice { id: "b", dimension: Dimension::CustomerEmpathy, value: 80 },
            SituationalChoice { id: "c", dimension: Dimension::Evidence, value: 70 },
            SituationalChoice { id: "d", dimension: Dimension::Execution, value: 75 },
        ],
    },
    Scenario {
        id: "s2",
        choices: &[
            SituationalChoice { id: "a", dimension: Dimension::Experimentation, value: 85 },
            SituationalChoice { id: "b", dimension: Dimension::Vision, value: 80 },
            SituationalChoice { id: "c", dimension: Dimension::Execution, value: 70 },
            SituationalChoice { id: "d", dimension: Dimension::Evidence, value: 80 },
        ],
    },
    Scenario {
        id: "s3",
        choices: &[
            SituationalChoice { id: "a", dimension: Dimension::CustomerEmpathy, value: 90 },
            SituationalChoice { id: "b", dimension: Dimension::Experimentation, value: 75 },
            SituationalChoice { id: "c", dimension: Dimension::Vision, value: 85 },
            SituationalChoice { id: "d", dimension: Dimension::Execution, value: 65 },
        ],
    },
    Scenario {
        id: "s4",
        choices: &[
            SituationalChoice { id: "a", dimension: Dimension::Evidence, value: 90 },
            SituationalChoice { id: "b", dimension: Dimension::CustomerEmpathy, value: 70 },
            SituationalChoice { id: "c", dimension: Dimension::Vision, value: 95 },
            SituationalChoice { id: "d", dimension: Dimension::Experimentation, value: 80 },
        ],
    },
];

// ---------------------------------------------------------------------------
// Archetype
// ---------------------------------------------------------------------------

/// Reference profiles over the five dimensions, in tie-break order: when two
/// profiles are equidistant, the one listed first wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Archetype {
    Visionary,
    Researcher,
    Operator,
    Experimenter,
    Analyst,
}

impl Archetype {
    pub fn all() -> &'static [Archetype] {
        &[
            Archetype::Visionary,
            Archetype::Researcher,
            Archetype::Operator,
            Archetype::Experimenter,
            Archetype::Analyst,
        ]
    }

    /// Target vector in [`Dimension::all`] order.
    fn profile(self) -> [f64; 5] {
        match self {
            Archetype::Visionary => [90.0, 70.0, 75.0, 55.0, 60.0],
            Archetype::Researcher => [55.0, 90.0, 65.0, 85.0, 55.0],
            Archetype::Operator => [50.0, 60.0, 55.0, 70.0, 90.0],
            Archetype::Experimenter => [65.0, 70.0, 90.0, 75.0, 60.0],
            Archetype::Analyst => [50.0, 65.0, 55.0, 90.0, 70.0],
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Archetype::Visionary => "visionary",
            Archetype::Researcher => "researcher",
            Archetype::Operator => "operator",
            Archetype::Experimenter => "experimenter",
            Archetype::Analyst => "analyst",
        }
    }
}

impl fmt::Display for Archetype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Submission / result
// ---------------------------------------------------------------------------

/// Raw questionnaire answers. BTreeMaps keep serialization deterministic.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AssessmentSubmission {
    /// Likert question id -> raw score (1-5).
    pub likert: BTreeMap<String, u8>,
    /// Scenario id -> chosen choice id.
    pub situational: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DimensionScores {
    pub vision: u32,
    pub customer_empathy: u32,
    pub experimentation: u32,
    pub evidence: u32,
    pub execution: u32,
}

impl DimensionScores {
    pub fn get(&self, dim: Dimension) -> u32 {
        match dim {
            Dimension::Vision => self.vision,
            Dimension::CustomerEmpathy => self.customer_empathy,
            Dimension::Experimentation => self.experimentation,
            Dimension::Evidence => self.evidence,
            Dimension::Execution => self.execution,
        }
    }

    fn as_vector(&self) -> [f64; 5] {
        [
            self.vision as f64,
            self.customer_empathy as f64,
            self.experimentation as f64,
            self.evidence as f64,
            self.execution as f64,
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssessmentResult {
    pub scores: DimensionScores,
    pub overall: u32,
    pub archetype: Archetype,
}

// ---------------------------------------------------------------------------
// Scoring
// ---------------------------------------------------------------------------

/// Score a submission. Rejects malformed input before any computation:
/// missing answers are an error, never defaulted.
pub fn score(submission: &AssessmentSubmission) -> Result<AssessmentResult> {
    validate(submission)?;

    let mut likert_sum = [0.0f64; 5];
    let mut likert_count = [0u32; 5];
    for item in LIKERT_ITEMS {
        let raw = submission.likert[item.id];
        let adjusted = if item.reverse { 6 - raw } else { raw };
        let pct = (adjusted as f64 - 1.0) / 4.0 * 100.0;
        likert_sum[item.dimension.index()] += pct;
        likert_count[item.dimension.index()] += 1;
    }

    let mut situ_sum = [0.0f64; 5];
    let mut situ_count = [0u32; 5];
    for scenario in SCENARIOS {
        let choice_id = &submission.situational[scenario.id];
        if let Some(choice) = scenario.choices.iter().find(|c| c.id == choice_id) {
            situ_sum[choice.dimension.index()] += choice.value as f64;
            situ_count[choice.dimension.index()] += 1;
        }
    }

    let mut blended = [0u32; 5];
    for dim in Dimension::all() {
        let i = dim.index();
        let likert_mean = likert_sum[i] / likert_count[i] as f64;
        let value = if situ_count[i] > 0 {
            let situ_mean = situ_sum[i] / situ_count[i] as f64;
            LIKERT_WEIGHT * likert_mean + SITUATIONAL_WEIGHT * situ_mean
        } else {
            likert_mean
        };
        blended[i] = value.round() as u32;
    }

    let scores = DimensionScores {
        vision: blended[0],
        customer_empathy: blended[1],
        experimentation: blended[2],
        evidence: blended[3],
        execution: blended[4],
    };
    let overall = (blended.iter().sum::<u32>() as f64 / 5.0).round() as u32;
    let archetype = nearest_archetype(&scores);

    Ok(AssessmentResult {
        scores,
        overall,
        archetype,
    })
}

fn validate(submission: &AssessmentSubmission) -> Result<()> {
    for item in LIKERT_ITEMS {
        match submission.likert.get(item.id) {
            None => return Err(FronteraError::MissingAnswer(item.id.to_string())),
            Some(&raw) if !(1..=5).contains(&raw) => {
                return Err(FronteraError::InvalidLikertScore {
                    id: item.id.to_string(),
                    score: raw,
                })
            }
            Some(_) => {}
        }
    }
    for id in submission.likert.keys() {
        if !LIKERT_ITEMS.iter().any(|item| item.id == id) {
            return Err(FronteraError::UnknownQuestion(id.clone()));
        }
    }

    for scenario in SCENARIOS {
        match submission.situational.get(scenario.id) {
            None => return Err(FronteraError::MissingAnswer(scenario.id.to_string())),
            Some(choice) if !scenario.choices.iter().any(|c| c.id == choice) => {
                return Err(FronteraError::UnknownChoice {
                    scenario: scenario.id.to_string(),
                    choice: choice.clone(),
                })
            }
            Some(_) => {}
        }
    }
    for id in submission.situational.keys() {
        if !SCENARIOS.iter().any(|s| s.id == id) {
            return Err(FronteraError::UnknownQuestion(id.clone()));
        }
    }
    Ok(())
}

/// Nearest reference profile by Euclidean distance. Strict `<` while
/// scanning in declaration order makes equal distances keep the earlier
/// archetype.
fn nearest_archetype(scores: &DimensionScores) -> Archetype {
    let v = scores.as_vector();
    let mut best = Archetype::all()[0];
    let mut best_dist = f64::INFINITY;
    for &archetype in Archetype::all() {
        let p = archetype.profile();
        let dist: f64 = v.iter().zip(p.iter()).map(|(a, b)| (a - b).powi(2)).sum();
        if dist < best_dist {
            best_dist = dist;
            best = archetype;
        }
    }
    best
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
