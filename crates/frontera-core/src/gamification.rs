//! XP, levels, achievements, and login streaks.
//!
//! All functions here are pure table lookups over already-structured data;
//! persistence of the resulting records belongs to the caller.

use crate::error::FronteraError;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

// ---------------------------------------------------------------------------
// XpEvent
// ---------------------------------------------------------------------------

/// Recognized XP-awarding event types. Unknown event names are a hard error
/// at parse time; there is no silent zero-award path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum XpEvent {
    AreaMapped,
    InsightCaptured,
    ResearchCaptured,
    SynthesisGenerated,
    BetCreated,
    AssessmentCompleted,
    SessionCompleted,
    DailyLogin,
}

impl XpEvent {
    pub fn all() -> &'static [XpEvent] {
        &[
            XpEvent::AreaMapped,
            XpEvent::InsightCaptured,
            XpEvent::ResearchCaptured,
            XpEvent::SynthesisGenerated,
            XpEvent::BetCreated,
            XpEvent::AssessmentCompleted,
            XpEvent::SessionCompleted,
            XpEvent::DailyLogin,
        ]
    }

    pub fn as_str(self) -> &'static str {
        match self {
            XpEvent::AreaMapped => "area_mapped",
            XpEvent::InsightCaptured => "insight_captured",
            XpEvent::ResearchCaptured => "research_captured",
            XpEvent::SynthesisGenerated => "synthesis_generated",
            XpEvent::BetCreated => "bet_created",
            XpEvent::AssessmentCompleted => "assessment_completed",
            XpEvent::SessionCompleted => "session_completed",
            XpEvent::DailyLogin => "daily_login",
        }
    }

    /// Fixed XP amount for this event type.
    pub fn xp_amount(self) -> u32 {
        match self {
            XpEvent::AreaMapped => 25,
            XpEvent::InsightCaptured => 10,
            XpEvent::ResearchCaptured => 10,
            XpEvent::SynthesisGenerated => 50,
            XpEvent::BetCreated => 40,
            XpEvent::AssessmentCompleted => 30,
            XpEvent::SessionCompleted => 15,
            XpEvent::DailyLogin => 5,
        }
    }
}

impl fmt::Display for XpEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for XpEvent {
    type Err = FronteraError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        XpEvent::all()
            .iter()
            .find(|e| e.as_str() == s)
            .copied()
            .ok_or_else(|| FronteraError::UnknownXpEvent(s.to_string()))
    }
}

// ---------------------------------------------------------------------------
// Levels
// ---------------------------------------------------------------------------

pub struct LevelDef {
    pub level: u32,
    pub xp_threshold: u32,
    pub title: &'static str,
}

/// Ascending level table. Thresholds are cumulative XP.
pub const LEVELS: [LevelDef; 6] = [
    LevelDef { level: 1, xp_threshold: 0, title: "Strategist Apprentice" },
    LevelDef { level: 2, xp_threshold: 100, title: "Insight Seeker" },
    LevelDef { level: 3, xp_threshold: 250, title: "Territory Mapper" },
    LevelDef { level: 4, xp_threshold: 500, title: "Synthesis Strategist" },
    LevelDef { level: 5, xp_threshold: 1000, title: "Bet Maker" },
    LevelDef { level: 6, xp_threshold: 2000, title: "Strategy Master" },
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LevelInfo {
    pub level: u32,
    pub title: String,
    /// Threshold of the next level; `None` at max level.
    pub xp_for_next_level: Option<u32>,
    /// Percentage of the way from the current threshold to the next,
    /// rounded. 100 at max level.
    pub progress_in_level: u32,
}

/// Highest level whose threshold is <= `total_xp`, with progress toward the
/// next threshold.
pub fn level_info(total_xp: u32) -> LevelInfo {
    let idx = LEVELS
        .iter()
        .rposition(|l| l.xp_threshold <= total_xp)
        .unwrap_or(0);
    let current = &LEVELS[idx];
    let next = LEVELS.get(idx + 1);

    let progress_in_level = match next {
        None => 100,
        Some(n) => {
            let span = (n.xp_threshold - current.xp_threshold) as f64;
            let into = (total_xp - current.xp_threshold) as f64;
            (into / span * 100.0).round() as u32
        }
    };

    LevelInfo {
        level: current.level,
        title: current.title.to_string(),
        xp_for_next_level: next.map(|n| n.xp_threshold),
        progress_in_level,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LevelUp {
    pub leveled_up: bool,
    pub levels_gained: u32,
    pub new_level: u32,
}

/// Whether adding `delta` XP to `current_xp` crosses one or more level
/// thresholds, and by how many levels.
pub fn check_level_up(current_xp: u32, delta: u32) -> LevelUp {
    let before = level_info(current_xp).level;
    let after = level_info(current_xp + delta).level;
    LevelUp {
        leveled_up: after > before,
        levels_gained: after - before,
        new_level: after,
    }
}

// ---------------------------------------------------------------------------
// Achievements
// ---------------------------------------------------------------------------

pub struct AchievementDef {
    pub id: &'static str,
    pub title: &'static str,
    /// Event types that unlock this achievement.
    pub triggers: &'static [XpEvent],
}

pub const ACHIEVEMENTS: &[AchievementDef] = &[
    AchievementDef {
        id: "first_insight",
        title: "First Insight",
        triggers: &[XpEvent::InsightCaptured, XpEvent::ResearchCaptured],
    },
    AchievementDef {
        id: "territory_explorer",
        title: "Territory Explorer",
        triggers: &[XpEvent::AreaMapped],
    },
    AchievementDef {
        id: "pattern_weaver",
        title: "Pattern Weaver",
        triggers: &[XpEvent::SynthesisGenerated],
    },
    AchievementDef {
        id: "bet_maker",
        title: "Bet Maker",
        triggers: &[XpEvent::BetCreated],
    },
    AchievementDef {
        id: "know_thyself",
        title: "Know Thyself",
        triggers: &[XpEvent::AssessmentCompleted],
    },
    AchievementDef {
        id: "showing_up",
        title: "Showing Up",
        triggers: &[XpEvent::DailyLogin],
    },
];

/// Newly qualifying achievement ids for `event`. Never returns an id already
/// present in `already_earned`; re-invoking with the same arguments yields
/// the same result.
pub fn check_achievements(event: XpEvent, already_earned: &HashSet<String>) -> Vec<&'static str> {
    ACHIEVEMENTS
        .iter()
        .filter(|a| a.triggers.contains(&event) && !already_earned.contains(a.id))
        .map(|a| a.id)
        .collect()
}

// ---------------------------------------------------------------------------
// Login streak
// ---------------------------------------------------------------------------

/// Advance a login streak by calendar-date comparison: unchanged if already
/// active today, +1 if the last active day was yesterday, reset to 1
/// otherwise.
pub fn advance_streak(last_active: Option<NaiveDate>, streak: u32, today: NaiveDate) -> u32 {
    match last_active {
        Some(last) if last == today => streak.max(1),
        Some(last) if last.succ_opt() == Some(today) => streak + 1,
        _ => 1,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn level_one_at_zero_xp() {
        let info = level_info(0);
        assert_eq!(info.level, 1);
        assert_eq!(info.title, "Strategist Apprentice");
        assert_eq!(info.progress_in_level, 0);
        assert_eq!(info.xp_for_next_level, Some(100));
    }

    #[test]
    fn level_two_at_150_xp() {
        let info = level_info(150);
        assert_eq!(info.level, 2);
        assert_eq!(info.xp_for_next_level, Some(250));
        // round((150 - 100) / (250 - 100) * 100) = 33
        assert_eq!(info.progress_in_level, 33);
    }

    #[test]
    fn max_level_progress_is_100() {
        let info = level_info(2000);
        assert_eq!(info.level, 6);
        assert_eq!(info.title, "Strategy Master");
        assert_eq!(info.xp_for_next_level, None);
        assert_eq!(info.progress_in_level, 100);

        let beyond = level_info(50_000);
        assert_eq!(beyond.level, 6);
        assert_eq!(beyond.progress_in_level, 100);
    }

    #[test]
    fn level_is_monotonic_in_xp() {
        let mut prev = 0;
        for xp in (0..3000).step_by(7) {
            let level = level_info(xp).level;
            assert!(level >= prev, "level dropped at {xp} xp");
            prev = level;
        }
    }

    #[test]
    fn exact_threshold_lands_on_new_level() {
        assert_eq!(level_info(100).level, 2);
        assert_eq!(level_info(100).progress_in_level, 0);
        assert_eq!(level_info(99).level, 1);
    }

    #[test]
    fn check_level_up_crossing_one() {
        let up = check_level_up(90, 20);
        assert!(up.leveled_up);
        assert_eq!(up.levels_gained, 1);
        assert_eq!(up.new_level, 2);
    }

    #[test]
    fn check_level_up_crossing_several() {
        let up = check_level_up(0, 600);
        assert!(up.leveled_up);
        assert_eq!(up.levels_gained, 3);
        assert_eq!(up.new_level, 4);
    }

    #[test]
    fn check_level_up_no_crossing() {
        let up = check_level_up(10, 20);
        assert!(!up.leveled_up);
        assert_eq!(up.levels_gained, 0);
        assert_eq!(up.new_level, 1);
    }

    #[test]
    fn xp_amount_is_pure() {
        assert_eq!(XpEvent::AreaMapped.xp_amount(), XpEvent::AreaMapped.xp_amount());
        assert_eq!(XpEvent::SynthesisGenerated.xp_amount(), 50);
    }

    #[test]
    fn unknown_event_rejected() {
        assert!(matches!(
            XpEvent::from_str("levelled_up"),
            Err(FronteraError::UnknownXpEvent(_))
        ));
        assert!(XpEvent::from_str("").is_err());
        assert_eq!(XpEvent::from_str("area_mapped").unwrap(), XpEvent::AreaMapped);
    }

    #[test]
    fn area_mapped_unlocks_territory_explorer_once() {
        let earned = HashSet::new();
        let new = check_achievements(XpEvent::AreaMapped, &earned);
        assert_eq!(new, vec!["territory_explorer"]);

        let earned: HashSet<String> = ["territory_explorer".to_string()].into_iter().collect();
        let again = check_achievements(XpEvent::AreaMapped, &earned);
        assert!(again.is_empty());
    }

    #[test]
    fn first_insight_fires_on_either_trigger() {
        let earned = HashSet::new();
        assert_eq!(
            check_achievements(XpEvent::InsightCaptured, &earned),
            vec!["first_insight"]
        );
        assert_eq!(
            check_achievements(XpEvent::ResearchCaptured, &earned),
            vec!["first_insight"]
        );
    }

    #[test]
    fn achievements_never_re_award() {
        for event in XpEvent::all() {
            let all_earned: HashSet<String> =
                ACHIEVEMENTS.iter().map(|a| a.id.to_string()).collect();
            assert!(check_achievements(*event, &all_earned).is_empty());
        }
    }

    #[test]
    fn streak_advances_from_yesterday() {
        let yesterday = NaiveDate::from_ymd_opt(2026, 3, 9).unwrap();
        let today = NaiveDate::from_ymd_opt(2026, 3, 10).unwrap();
        assert_eq!(advance_streak(Some(yesterday), 4, today), 5);
    }

    #[test]
    fn streak_unchanged_same_day() {
        let today = NaiveDate::from_ymd_opt(2026, 3, 10).unwrap();
        assert_eq!(advance_streak(Some(today), 4, today), 4);
    }

    #[test]
    fn streak_resets_after_gap() {
        let last = NaiveDate::from_ymd_opt(2026, 3, 1).unwrap();
        let today = NaiveDate::from_ymd_opt(2026, 3, 10).unwrap();
        assert_eq!(advance_streak(Some(last), 12, today), 1);
        assert_eq!(advance_streak(None, 0, today), 1);
    }
}
