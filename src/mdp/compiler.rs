//! Validates a [`RawMdpDoc`] and produces a [`CompiledMdp`].
//!
//! A schema-level pass over the raw YAML rejects unknown fields nested
//! inside a state/action/outcome before anything else runs. After that,
//! validation runs in a fixed order and short-circuits on the first
//! failure, per the compiler contract: start-state presence, id
//! uniqueness, outcome well-formedness, then terminal/action exclusivity.

use std::collections::HashMap;
use std::collections::HashSet;

use log::debug;

use crate::error::{EngineError, ValidationError};
use crate::keys::StateKey;
use crate::mdp::spec::{ActionSpec, CompiledMdp, Outcome, RawMdpDoc, StateSpec};

/// Parses `text` as YAML and compiles it into a [`CompiledMdp`], or returns
/// the first validation failure encountered.
///
/// Parsing happens in two passes: first into a permissive [`serde_yaml::Value`]
/// so unknown fields nested inside a state/action/outcome can be reported as
/// [`ValidationError::UnknownField`] rather than surfacing as a syntax-level
/// [`EngineError::Parse`] from `serde`'s own `deny_unknown_fields` machinery —
/// the two are different error kinds per the compiler's contract. Unknown
/// top-level fields are left alone; `RawMdpDoc` already ignores those.
pub fn compile_yaml_str(text: &str) -> Result<CompiledMdp, EngineError> {
    let value: serde_yaml::Value = serde_yaml::from_str(text)?;
    check_unknown_fields(&value)?;
    let raw: RawMdpDoc = serde_yaml::from_value(value)?;
    compile(raw)
}

/// Walks the document looking for fields nested inside a state, action or
/// outcome that aren't part of the declarative schema. Shapes that don't
/// match what's expected (e.g. `states` not being a sequence) are left for
/// the subsequent typed deserialization to reject as a parse error.
fn check_unknown_fields(value: &serde_yaml::Value) -> Result<(), EngineError> {
    let top = match value.as_mapping() {
        Some(m) => m,
        None => return Ok(()),
    };
    let states = match top.get("states").and_then(|v| v.as_sequence()) {
        Some(s) => s,
        None => return Ok(()),
    };
    for state in states {
        let state_map = match state.as_mapping() {
            Some(m) => m,
            None => continue,
        };
        let state_id = state_map
            .get("id")
            .and_then(|v| v.as_str())
            .unwrap_or("?")
            .to_owned();
        check_mapping_fields(
            state_map,
            &["id", "terminal", "actions"],
            format!("state `{state_id}`"),
        )?;

        let actions = match state_map.get("actions").and_then(|v| v.as_sequence()) {
            Some(a) => a,
            None => continue,
        };
        for action in actions {
            let action_map = match action.as_mapping() {
                Some(m) => m,
                None => continue,
            };
            let action_id = action_map
                .get("id")
                .and_then(|v| v.as_str())
                .unwrap_or("?")
                .to_owned();
            check_mapping_fields(
                action_map,
                &["id", "outcomes"],
                format!("action `{action_id}` in state `{state_id}`"),
            )?;

            let outcomes = match action_map.get("outcomes").and_then(|v| v.as_sequence()) {
                Some(o) => o,
                None => continue,
            };
            for outcome in outcomes {
                let outcome_map = match outcome.as_mapping() {
                    Some(m) => m,
                    None => continue,
                };
                check_mapping_fields(
                    outcome_map,
                    &["next", "prob", "reward"],
                    format!("outcome of action `{action_id}` in state `{state_id}`"),
                )?;
            }
        }
    }
    Ok(())
}

fn check_mapping_fields(
    map: &serde_yaml::Mapping,
    allowed: &[&str],
    context: String,
) -> Result<(), EngineError> {
    for key in map.keys() {
        if let Some(key) = key.as_str() {
            if !allowed.contains(&key) {
                return Err(ValidationError::UnknownField {
                    context,
                    field: key.to_owned(),
                }
                .into());
            }
        }
    }
    Ok(())
}

fn compile(raw: RawMdpDoc) -> Result<CompiledMdp, EngineError> {
    // 1. start is present and references a declared state.
    if !raw.states.iter().any(|s| s.id == raw.start) {
        return Err(ValidationError::UnknownStart { start: raw.start }.into());
    }

    // 2. all state ids unique; all action ids unique within their state.
    let mut seen_states: HashSet<&str> = HashSet::new();
    for state in &raw.states {
        if !seen_states.insert(state.id.as_str()) {
            return Err(ValidationError::DuplicateStateId {
                id: state.id.clone(),
            }
            .into());
        }
        let mut seen_actions: HashSet<&str> = HashSet::new();
        for action in &state.actions {
            if !seen_actions.insert(action.id.as_str()) {
                return Err(ValidationError::DuplicateActionId {
                    state: state.id.clone(),
                    action: action.id.clone(),
                }
                .into());
            }
        }
    }

    let index: HashMap<&str, StateKey> = raw
        .states
        .iter()
        .enumerate()
        .map(|(i, s)| (s.id.as_str(), StateKey(i as u32)))
        .collect();

    // 3. non-terminal, non-empty-action states: outcomes present, valid
    //    references, probabilities in range and summing to ~1.
    for state in &raw.states {
        if state.terminal || state.actions.is_empty() {
            continue;
        }
        for action in &state.actions {
            if action.outcomes.is_empty() {
                return Err(ValidationError::EmptyOutcomes {
                    state: state.id.clone(),
                    action: action.id.clone(),
                }
                .into());
            }
            let mut prob_sum = 0.0;
            for outcome in &action.outcomes {
                if !index.contains_key(outcome.next.as_str()) {
                    return Err(ValidationError::UnknownStateRef {
                        state: state.id.clone(),
                        action: action.id.clone(),
                        next: outcome.next.clone(),
                    }
                    .into());
                }
                if !(0.0..=1.0).contains(&outcome.prob) {
                    return Err(ValidationError::ProbOutOfRange {
                        state: state.id.clone(),
                        action: action.id.clone(),
                        prob: outcome.prob,
                    }
                    .into());
                }
                prob_sum += outcome.prob;
            }
            if (prob_sum - 1.0).abs() > 1e-6 {
                return Err(ValidationError::ProbabilitySum {
                    state: state.id.clone(),
                    action: action.id.clone(),
                    sum: prob_sum,
                }
                .into());
            }
        }
    }

    // 4. terminal states declare no actions.
    for state in &raw.states {
        if state.terminal && !state.actions.is_empty() {
            return Err(ValidationError::TerminalWithActions {
                state: state.id.clone(),
            }
            .into());
        }
    }

    let states: Vec<StateSpec> = raw
        .states
        .iter()
        .map(|state| {
            let actions = state
                .actions
                .iter()
                .map(|action| {
                    let outcomes = action
                        .outcomes
                        .iter()
                        .map(|outcome| Outcome {
                            next: index[outcome.next.as_str()],
                            prob: outcome.prob,
                            reward: outcome.reward,
                        })
                        .collect();
                    ActionSpec {
                        id: action.id.clone(),
                        outcomes,
                    }
                })
                .collect();
            StateSpec {
                id: state.id.clone(),
                terminal: state.terminal,
                actions,
            }
        })
        .collect();

    let start = index[raw.start.as_str()];

    debug!(
        "compiled MDP: {} states, start=`{}` (key {})",
        states.len(),
        raw.start,
        start
    );

    Ok(CompiledMdp { states, start })
}
