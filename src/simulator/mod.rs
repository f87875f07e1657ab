//! A polymorphic simulator capability, and the caller-facing `Domain` trait
//! that [`TypedSimulator`] adapts to it.
//!
//! Expressed as a trait bound rather than an inheritance hierarchy: the
//! search engine is generic over anything implementing [`Simulator`], so the
//! hot loop in [`crate::search`] never needs a `dyn` dispatch.

mod mdp_simulator;
mod typed_simulator;

pub use mdp_simulator::MdpSimulator;
pub use typed_simulator::{Domain, TypedSimulator};

use crate::error::EngineError;
use crate::keys::{ActionKey, StateKey};

/// The capability the search engine needs from any MDP-shaped source of
/// transitions, whether compiled ([`MdpSimulator`]) or caller-supplied
/// ([`TypedSimulator`]).
pub trait Simulator {
    /// The key of the state the simulator starts in.
    fn start_state_key(&self) -> StateKey;

    /// Whether `key` is a terminal state (or a dead end with no legal
    /// actions, which the search engine treats the same way).
    fn is_terminal_by_key(&self, key: StateKey) -> bool;

    /// The number of legal actions from `key`. Always 0 for a terminal key.
    fn num_actions_by_key(&self, key: StateKey) -> usize;

    /// Samples one transition from `key` under `action`, consuming exactly
    /// one RNG draw (plus whatever the domain itself draws, for
    /// `TypedSimulator`). Returns the next state key, the reward emitted,
    /// and whether the next state is terminal.
    fn step_by_key(
        &mut self,
        key: StateKey,
        action: ActionKey,
    ) -> Result<(StateKey, f64, bool), EngineError>;

    /// Draws an action uniformly at random from `[0, num_actions)`, using
    /// the simulator's own RNG. This is the fallback rollout policy when the
    /// caller supplies neither a rollout policy callback nor a fixed
    /// rollout action.
    fn sample_action_uniform(&mut self, num_actions: usize) -> ActionKey;
}
