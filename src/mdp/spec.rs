//! The declarative MDP document shape, and its compiled, index-addressed
//! counterpart.

use serde::Deserialize;

use crate::keys::{ActionKey, StateKey};

/// The raw document read from YAML. Unknown top-level fields are ignored
/// (forward compatible); `version` is accepted but currently unused.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct RawMdpDoc {
    #[serde(default)]
    pub version: Option<i64>,
    pub start: String,
    #[serde(default)]
    pub states: Vec<RawState>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct RawState {
    pub id: String,
    #[serde(default)]
    pub terminal: bool,
    #[serde(default)]
    pub actions: Vec<RawAction>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct RawAction {
    pub id: String,
    #[serde(default)]
    pub outcomes: Vec<RawOutcome>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct RawOutcome {
    pub next: String,
    pub prob: f64,
    pub reward: f64,
}

/// A single `{next, prob, reward}` transition, with `next` already resolved
/// to a dense [`StateKey`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Outcome {
    pub next: StateKey,
    pub prob: f64,
    pub reward: f64,
}

/// One action of a compiled state: an id plus its possible outcomes.
#[derive(Debug, Clone)]
pub struct ActionSpec {
    pub id: String,
    pub outcomes: Vec<Outcome>,
}

/// One state of a compiled MDP.
#[derive(Debug, Clone)]
pub struct StateSpec {
    pub id: String,
    pub terminal: bool,
    pub actions: Vec<ActionSpec>,
}

/// A validated, index-addressed MDP produced by [`crate::mdp::compile_yaml_str`].
///
/// States are keyed in declaration order; actions are keyed in declaration
/// order within their state.
#[derive(Debug, Clone)]
pub struct CompiledMdp {
    pub(crate) states: Vec<StateSpec>,
    pub(crate) start: StateKey,
}

impl CompiledMdp {
    pub fn state_count(&self) -> usize {
        self.states.len()
    }

    pub fn start_state_key(&self) -> StateKey {
        self.start
    }

    pub fn state_id(&self, key: StateKey) -> &str {
        &self.states[key.index()].id
    }

    /// True if the state is declared terminal, *or* has no actions at all —
    /// a non-terminal dead end is treated as terminal for search purposes
    /// (no legal moves to expand).
    pub fn is_terminal(&self, key: StateKey) -> bool {
        let state = &self.states[key.index()];
        state.terminal || state.actions.is_empty()
    }

    pub fn num_actions(&self, key: StateKey) -> usize {
        if self.is_terminal(key) {
            0
        } else {
            self.states[key.index()].actions.len()
        }
    }

    pub fn action(&self, key: StateKey, action: ActionKey) -> &ActionSpec {
        &self.states[key.index()].actions[action.index()]
    }

    pub fn state(&self, key: StateKey) -> &StateSpec {
        &self.states[key.index()]
    }
}
