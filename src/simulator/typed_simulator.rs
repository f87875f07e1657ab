//! Adapts a caller-supplied domain to the [`Simulator`] capability via
//! interning.

use crate::error::{DomainError, EngineError};
use crate::interner::{StateInterner, TokenValue};
use crate::keys::{ActionKey, StateKey};
use crate::rng::RngStream;
use crate::simulator::Simulator;

/// A caller-supplied MDP-shaped domain over opaque states.
///
/// `State` need not be hashable; only [`Domain::state_token`]'s return value
/// is used as the interner key, which sidesteps having to derive `Hash` for
/// arbitrary caller state types. `State` does need `PartialEq` so the
/// optional token-collision check in [`TypedSimulator`] can tell two
/// same-token states apart.
pub trait Domain {
    type State: Clone + PartialEq;

    fn start_state(&self) -> Self::State;
    fn state_token(&self, state: &Self::State) -> TokenValue;
    fn is_terminal(&self, state: &Self::State) -> bool;
    fn num_actions(&self, state: &Self::State) -> usize;

    /// Samples one transition. `sample` is a `[0, 1)` draw already taken
    /// from the simulator's owned RNG, handed in so a stochastic domain
    /// stays reproducible under the same seed without owning its own RNG.
    fn step(
        &self,
        state: &Self::State,
        action: ActionKey,
        sample: f64,
    ) -> Result<(Self::State, f64, bool), EngineError>;
}

/// Adapts a [`Domain`] to [`Simulator`], interning the domain's opaque
/// states into dense [`StateKey`]s as they are discovered.
pub struct TypedSimulator<D: Domain> {
    domain: D,
    rng: RngStream,
    interner: StateInterner<D::State>,
    check_token_collisions: bool,
}

impl<D: Domain> TypedSimulator<D> {
    pub fn new(domain: D, seed: u64, check_token_collisions: bool) -> Result<Self, EngineError> {
        let mut interner = StateInterner::new();
        let start = domain.start_state();
        let token = domain.state_token(&start);
        interner.intern(token, start, check_token_collisions)?;
        Ok(Self {
            domain,
            rng: RngStream::new(seed),
            interner,
            check_token_collisions,
        })
    }

    fn effective_terminal(&self, key: StateKey) -> bool {
        let state = self.interner.payload(key);
        self.domain.is_terminal(state) || self.domain.num_actions(state) == 0
    }
}

impl<D: Domain> Simulator for TypedSimulator<D> {
    fn start_state_key(&self) -> StateKey {
        // The constructor always interns `start_state()` first, so it is
        // always key 0.
        StateKey(0)
    }

    fn is_terminal_by_key(&self, key: StateKey) -> bool {
        self.effective_terminal(key)
    }

    fn num_actions_by_key(&self, key: StateKey) -> usize {
        if self.effective_terminal(key) {
            0
        } else {
            self.domain.num_actions(self.interner.payload(key))
        }
    }

    fn step_by_key(
        &mut self,
        key: StateKey,
        action: ActionKey,
    ) -> Result<(StateKey, f64, bool), EngineError> {
        if self.effective_terminal(key) {
            return Err(DomainError::TerminalStep.into());
        }
        let num_actions = self.domain.num_actions(self.interner.payload(key));
        if action.index() >= num_actions {
            return Err(DomainError::ActionOutOfRange {
                action: action.0,
                num_actions,
            }
            .into());
        }
        let sample = self.rng.uniform_f64();
        let state = self.interner.payload(key).clone();
        let (next_state, reward, terminal) = self.domain.step(&state, action, sample)?;
        let token = self.domain.state_token(&next_state);
        let next_key = self
            .interner
            .intern(token, next_state, self.check_token_collisions)?;
        Ok((next_key, reward, terminal))
    }

    fn sample_action_uniform(&mut self, num_actions: usize) -> ActionKey {
        let weights = vec![1.0; num_actions];
        ActionKey(self.rng.choice_by_weights(&weights) as u32)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Clone, PartialEq)]
    struct CounterState {
        count: u32,
        finished: bool,
    }

    struct CounterDomain;

    impl Domain for CounterDomain {
        type State = CounterState;

        fn start_state(&self) -> Self::State {
            CounterState {
                count: 0,
                finished: false,
            }
        }

        fn state_token(&self, state: &Self::State) -> TokenValue {
            TokenValue::Str(format!("{}:{}", state.count, state.finished))
        }

        fn is_terminal(&self, state: &Self::State) -> bool {
            state.finished
        }

        fn num_actions(&self, state: &Self::State) -> usize {
            if state.finished {
                0
            } else {
                2
            }
        }

        fn step(
            &self,
            state: &Self::State,
            action: ActionKey,
            _sample: f64,
        ) -> Result<(Self::State, f64, bool), EngineError> {
            let reward = if action.0 == 0 { 1.0 } else { 3.0 };
            let next = CounterState {
                count: state.count + 1,
                finished: true,
            };
            Ok((next, reward, true))
        }
    }

    #[test]
    fn s5_typed_domain_step_rewards() {
        let mut sim = TypedSimulator::new(CounterDomain, 11, false).unwrap();
        let start = sim.start_state_key();
        let (_, r0, term0) = sim.step_by_key(start, ActionKey(0)).unwrap();
        assert_eq!(r0, 1.0);
        assert!(term0);

        let mut sim2 = TypedSimulator::new(CounterDomain, 11, false).unwrap();
        let (_, r1, term1) = sim2.step_by_key(start, ActionKey(1)).unwrap();
        assert_eq!(r1, 3.0);
        assert!(term1);
    }

    #[derive(Clone, PartialEq)]
    struct CollisionState {
        value: u32,
    }

    struct CollisionDomain;

    impl Domain for CollisionDomain {
        type State = CollisionState;

        fn start_state(&self) -> Self::State {
            CollisionState { value: 0 }
        }

        fn state_token(&self, _state: &Self::State) -> TokenValue {
            TokenValue::Str("same-token".into())
        }

        fn is_terminal(&self, _state: &Self::State) -> bool {
            false
        }

        fn num_actions(&self, _state: &Self::State) -> usize {
            1
        }

        fn step(
            &self,
            state: &Self::State,
            _action: ActionKey,
            _sample: f64,
        ) -> Result<(Self::State, f64, bool), EngineError> {
            Ok((
                CollisionState {
                    value: state.value + 1,
                },
                0.0,
                false,
            ))
        }
    }

    #[test]
    fn invariant6_collision_check_fails_fast() {
        let mut sim = TypedSimulator::new(CollisionDomain, 3, true).unwrap();
        let start = sim.start_state_key();
        let err = sim.step_by_key(start, ActionKey(0)).unwrap_err();
        assert!(matches!(
            err,
            EngineError::Domain(DomainError::TokenCollision { .. })
        ));
    }

    #[test]
    fn collision_check_disabled_does_not_fail() {
        let mut sim = TypedSimulator::new(CollisionDomain, 3, false).unwrap();
        let start = sim.start_state_key();
        let result = sim.step_by_key(start, ActionKey(0));
        assert!(result.is_ok());
    }
}
