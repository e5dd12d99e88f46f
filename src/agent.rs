//! Multi-session agent configurator: builds the fixed-shape state-machine
//! description the conversational engine executes for deep-dive interviews.
//!
//! The engine contract is a template with exactly [`SLOT_COUNT`] named
//! states. Real session texts fill slots left to right; every remaining slot
//! carries the sentinel prompt that tells the engine the interview content is
//! exhausted. Completion of a session before advancing is requested of the
//! engine through the prompts, not verified mechanically.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Fixed number of session slots in the engine template.
pub const SLOT_COUNT: usize = 10;

/// Prompt placed in every slot past the last real session.
pub const EMPTY_SLOT_PROMPT: &str = "There is no further session content. All sessions are \
     complete: thank the participant for their time and end the call now.";

const EDGE_DESCRIPTION: &str =
    "Move on only after every aspect of the current session has been fully discussed.";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AgentConfigError {
    #[error("too many sessions: {count} (limit {SLOT_COUNT})")]
    TooManySessions { count: usize },
}

/// One engine state. At most one outgoing edge, pointing at the next slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentState {
    pub name: String,
    pub state_prompt: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub edges: Vec<StateEdge>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateEdge {
    pub destination_state_name: String,
    pub description: String,
}

/// Engine-wide capability, available from every state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneralTool {
    #[serde(rename = "type")]
    pub tool_type: String,
    pub name: String,
    pub description: String,
}

/// The full description consumed by the conversational engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentDescription {
    pub starting_state: String,
    pub states: Vec<AgentState>,
    pub general_tools: Vec<GeneralTool>,
}

fn slot_name(index: usize) -> String {
    format!("session_{index}")
}

/// Build the 10-slot description from 0..=10 ordered session texts.
///
/// Slots `1..=count` hold the real texts, slots `count+1..=10` hold the
/// sentinel. Edges run `session_i -> session_{i+1}` for `i` in `1..count`;
/// the last real slot has no outgoing edge, so sentinel slots are only ever
/// reachable if the engine is mid-slot when content runs out.
pub fn build_agent_description(sessions: &[String]) -> Result<AgentDescription, AgentConfigError> {
    if sessions.len() > SLOT_COUNT {
        return Err(AgentConfigError::TooManySessions {
            count: sessions.len(),
        });
    }

    let count = sessions.len();
    let mut states = Vec::with_capacity(SLOT_COUNT);

    for i in 1..=SLOT_COUNT {
        let state_prompt = if i <= count {
            sessions[i - 1].clone()
        } else {
            EMPTY_SLOT_PROMPT.to_string()
        };

        let edges = if i < count {
            vec![StateEdge {
                destination_state_name: slot_name(i + 1),
                description: EDGE_DESCRIPTION.to_string(),
            }]
        } else {
            Vec::new()
        };

        states.push(AgentState {
            name: slot_name(i),
            state_prompt,
            edges,
        });
    }

    Ok(AgentDescription {
        starting_state: slot_name(1),
        states,
        general_tools: vec![GeneralTool {
            tool_type: "end_call".to_string(),
            name: "end_call".to_string(),
            description: "End the call once the interview is complete or the participant asks \
                          to stop."
                .to_string(),
        }],
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sessions(texts: &[&str]) -> Vec<String> {
        texts.iter().map(|t| t.to_string()).collect()
    }

    #[test]
    fn always_ten_slots_with_sentinel_suffix() {
        for count in 0..=SLOT_COUNT {
            let texts: Vec<String> = (0..count).map(|i| format!("topic {i}")).collect();
            let desc = build_agent_description(&texts).unwrap();

            assert_eq!(desc.states.len(), SLOT_COUNT);
            assert_eq!(desc.starting_state, "session_1");

            for (idx, state) in desc.states.iter().enumerate() {
                let slot = idx + 1;
                assert_eq!(state.name, format!("session_{slot}"));
                if slot <= count {
                    assert_eq!(state.state_prompt, format!("topic {}", slot - 1));
                } else {
                    assert_eq!(state.state_prompt, EMPTY_SLOT_PROMPT);
                }
            }
        }
    }

    #[test]
    fn edge_count_is_count_minus_one_and_only_among_real_slots() {
        for count in 0..=SLOT_COUNT {
            let texts: Vec<String> = (0..count).map(|i| format!("topic {i}")).collect();
            let desc = build_agent_description(&texts).unwrap();

            let total_edges: usize = desc.states.iter().map(|s| s.edges.len()).sum();
            assert_eq!(total_edges, count.saturating_sub(1));

            for (idx, state) in desc.states.iter().enumerate() {
                let slot = idx + 1;
                if slot < count {
                    assert_eq!(state.edges.len(), 1);
                    assert_eq!(
                        state.edges[0].destination_state_name,
                        format!("session_{}", slot + 1)
                    );
                } else {
                    assert!(state.edges.is_empty());
                }
            }
        }
    }

    #[test]
    fn three_sessions_scenario() {
        let desc = build_agent_description(&sessions(&["A", "B", "C"])).unwrap();

        assert_eq!(desc.states[0].state_prompt, "A");
        assert_eq!(desc.states[1].state_prompt, "B");
        assert_eq!(desc.states[2].state_prompt, "C");
        for state in &desc.states[3..] {
            assert_eq!(state.state_prompt, EMPTY_SLOT_PROMPT);
        }

        assert_eq!(desc.states[0].edges[0].destination_state_name, "session_2");
        assert_eq!(desc.states[1].edges[0].destination_state_name, "session_3");
        assert!(desc.states[2].edges.is_empty());
    }

    #[test]
    fn eleven_sessions_rejected() {
        let texts: Vec<String> = (0..11).map(|i| format!("topic {i}")).collect();

        assert_eq!(
            build_agent_description(&texts),
            Err(AgentConfigError::TooManySessions { count: 11 })
        );
    }

    #[test]
    fn end_call_tool_is_always_present() {
        let desc = build_agent_description(&[]).unwrap();

        assert_eq!(desc.general_tools.len(), 1);
        assert_eq!(desc.general_tools[0].tool_type, "end_call");
    }
}
