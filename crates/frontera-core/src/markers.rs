//! Marker-based post-processing of coach (LLM) output.
//!
//! The coach is instructed to embed two marker grammars in its replies:
//!
//! ```text
//! [ResearchCapture:<territory>:<areaId>:<questionIndex>:<answer text>]
//! [AreaComplete:<territory>:<areaId>]
//! ```
//!
//! Extraction is strict about the grammar but lenient about everything else:
//! text that does not match a marker is ordinary prose and passes through
//! untouched. A well-formed marker carrying an unknown territory is stripped
//! from the display text and reported as a parse warning rather than
//! silently dropped. LLM output is not guaranteed well-formed, so nothing in
//! here returns an error.

use crate::types::Territory;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::sync::OnceLock;

static CAPTURE_RE: OnceLock<Regex> = OnceLock::new();
static AREA_COMPLETE_RE: OnceLock<Regex> = OnceLock::new();
static BLANK_LINES_RE: OnceLock<Regex> = OnceLock::new();

fn capture_re() -> &'static Regex {
    CAPTURE_RE.get_or_init(|| {
        Regex::new(r"\[ResearchCapture:([a-z_]+):([A-Za-z0-9_-]+):(\d+):([^\]]*)\]").unwrap()
    })
}

fn area_complete_re() -> &'static Regex {
    AREA_COMPLETE_RE
        .get_or_init(|| Regex::new(r"\[AreaComplete:([a-z_]+):([A-Za-z0-9_-]+)\]").unwrap())
}

fn blank_lines_re() -> &'static Regex {
    BLANK_LINES_RE.get_or_init(|| Regex::new(r"\n{3,}").unwrap())
}

// ---------------------------------------------------------------------------
// Extracted shapes
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResearchCapture {
    pub territory: Territory,
    pub area_id: String,
    pub question_index: u32,
    pub answer: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AreaCompletion {
    pub territory: Territory,
    pub area_id: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtractedMarkers {
    pub captures: Vec<ResearchCapture>,
    pub area_completions: Vec<AreaCompletion>,
    /// Grammar-valid markers that could not be accepted (unknown territory,
    /// unparseable index). Each entry is a human-readable description.
    pub warnings: Vec<String>,
    /// Input text with all recognized markers removed and runs of 3+
    /// newlines collapsed to 2.
    pub clean_content: String,
}

// ---------------------------------------------------------------------------
// Extraction
// ---------------------------------------------------------------------------

/// Extract all markers from `text`. Deterministic: a given input always
/// yields the same result, and each list preserves document order.
pub fn extract_markers(text: &str) -> ExtractedMarkers {
    let mut captures = Vec::new();
    let mut area_completions = Vec::new();
    let mut warnings = Vec::new();

    let after_captures = capture_re().replace_all(text, |m: &regex::Captures| {
        let raw_territory = &m[1];
        match (Territory::from_str(raw_territory), m[3].parse::<u32>()) {
            (Ok(territory), Ok(question_index)) => {
                captures.push(ResearchCapture {
                    territory,
                    area_id: m[2].to_string(),
                    question_index,
                    answer: m[4].trim().to_string(),
                });
            }
            (Err(_), _) => {
                warnings.push(format!(
                    "unknown territory '{raw_territory}' in marker {}",
                    &m[0]
                ));
            }
            (_, Err(_)) => {
                warnings.push(format!("unparseable question index in marker {}", &m[0]));
            }
        }
        // Recognized grammar is always stripped from display text.
        String::new()
    });

    let after_completions =
        area_complete_re().replace_all(&after_captures, |m: &regex::Captures| {
            let raw_territory = &m[1];
            match Territory::from_str(raw_territory) {
                Ok(territory) => {
                    area_completions.push(AreaCompletion {
                        territory,
                        area_id: m[2].to_string(),
                    });
                }
                Err(_) => {
                    warnings.push(format!(
                        "unknown territory '{raw_territory}' in marker {}",
                        &m[0]
                    ));
                }
            }
            String::new()
        });

    let collapsed = blank_lines_re().replace_all(&after_completions, "\n\n");
    let clean_content = collapsed.trim().to_string();

    ExtractedMarkers {
        captures,
        area_completions,
        warnings,
        clean_content,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
