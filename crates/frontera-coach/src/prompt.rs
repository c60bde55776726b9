//! System prompts per agent type and framework phase.
//!
//! The research-phase prompt embeds the marker grammar verbatim; extraction
//! on the server side depends on the model reproducing it exactly.

use crate::client::ChatMessage;
use frontera_core::types::{AgentType, Phase};

const MARKER_INSTRUCTIONS: &str = "\
When the founder gives you a concrete answer about their business, record it \
with a marker on its own line, using exactly this format:\n\
[ResearchCapture:<territory>:<areaId>:<questionIndex>:<answer>]\n\
When every question in an area has been answered, emit:\n\
[AreaComplete:<territory>:<areaId>]\n\
Territory must be one of: company, customer, competitor. Never invent other \
territories. Markers are stripped before display, so keep your prose \
readable without them.";

/// Build the system prompt steering a conversation in the given phase.
pub fn system_prompt(agent_type: AgentType, phase: Phase) -> String {
    match agent_type {
        AgentType::Profiling => profiling_prompt(),
        AgentType::StrategyCoach => strategy_coach_prompt(phase),
    }
}

fn profiling_prompt() -> String {
    "You are a product-strategy profiler. Ask one question at a time to \
     understand how this founder thinks about vision, customers, \
     experimentation, evidence, and execution. Stay curious and neutral; \
     never score or judge out loud."
        .to_string()
}

fn strategy_coach_prompt(phase: Phase) -> String {
    let phase_guidance = match phase {
        Phase::Discovery => {
            "The founder is in discovery. Help them articulate their current \
             situation and what they hope to achieve. Do not push toward \
             research questions yet."
        }
        Phase::Research => {
            "The founder is mapping their strategic territories: company \
             (their own business), customer (who they serve), and competitor \
             (who else serves them). Work through one research area at a \
             time, asking pointed questions and capturing answers."
        }
        Phase::Synthesis => {
            "The founder has mapped enough territory to synthesize. Help them \
             find patterns across what they learned and name the strategic \
             insights that matter."
        }
        Phase::Bets => {
            "Insights are on the table. Help the founder turn them into \
             concrete strategic bets, each with a kill date and kill \
             criteria."
        }
        Phase::Planning => {
            "Bets are placed. Help the founder plan execution: sequencing, \
             owners, and the evidence that will validate or kill each bet."
        }
    };

    let mut prompt = format!(
        "You are a product-strategy coach guiding a startup founder through a \
         structured strategy framework. Be direct, concrete, and brief. \
         {phase_guidance}"
    );
    if phase == Phase::Research {
        prompt.push_str("\n\n");
        prompt.push_str(MARKER_INSTRUCTIONS);
    }
    prompt
}

/// Messages for the optional post-reply reflection: the exchange replayed as
/// chat turns, then the instruction. Failures here degrade to no reflection,
/// so keep it a single cheap call.
pub fn reflection_messages(user_message: &str, coach_reply: &str) -> [ChatMessage; 3] {
    [
        ChatMessage::user(user_message),
        ChatMessage::assistant(coach_reply),
        ChatMessage::user(
            "In one or two sentences, name the most strategically significant \
             thing in this exchange, or reply with exactly 'none' if nothing \
             stands out.",
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn research_prompt_carries_marker_grammar() {
        let prompt = system_prompt(AgentType::StrategyCoach, Phase::Research);
        assert!(prompt.contains("[ResearchCapture:<territory>:<areaId>:<questionIndex>:<answer>]"));
        assert!(prompt.contains("[AreaComplete:<territory>:<areaId>]"));
        assert!(prompt.contains("company, customer, competitor"));
    }

    #[test]
    fn non_research_phases_omit_markers() {
        for phase in [Phase::Discovery, Phase::Synthesis, Phase::Bets, Phase::Planning] {
            let prompt = system_prompt(AgentType::StrategyCoach, phase);
            assert!(!prompt.contains("ResearchCapture"), "phase {phase}");
        }
    }

    #[test]
    fn profiling_prompt_ignores_phase() {
        assert_eq!(
            system_prompt(AgentType::Profiling, Phase::Discovery),
            system_prompt(AgentType::Profiling, Phase::Bets)
        );
    }

    #[test]
    fn reflection_replays_exchange_as_turns() {
        let messages =
            reflection_messages("we only have 6 months of runway", "that changes the bet");
        assert_eq!(messages[0].role, "user");
        assert_eq!(messages[0].content, "we only have 6 months of runway");
        assert_eq!(messages[1].role, "assistant");
        assert_eq!(messages[1].content, "that changes the bet");
        assert_eq!(messages[2].role, "user");
        assert!(messages[2].content.contains("'none'"));
    }
}
