//! Dense integer identifiers used throughout the engine.
//!
//! `StateKey` and `ActionKey` are newtypes rather than bare `u32`/`usize` so
//! that a state index can never be passed where an action index is expected,
//! or vice versa.

use std::fmt;

/// A dense index into a [`crate::mdp::CompiledMdp`]'s state list, or into a
/// [`crate::interner::StateInterner`]'s key space. Stable within a single
/// compiled MDP or interner lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct StateKey(pub u32);

impl StateKey {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for StateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A dense index into the action list of *one particular* state. Two
/// different states may reuse the same `ActionKey` value to mean different
/// actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ActionKey(pub u32);

impl ActionKey {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for ActionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
