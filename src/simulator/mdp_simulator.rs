//! Adapts a [`CompiledMdp`] to the [`Simulator`] capability.

use crate::error::{DomainError, EngineError};
use crate::keys::{ActionKey, StateKey};
use crate::mdp::CompiledMdp;
use crate::rng::RngStream;
use crate::simulator::Simulator;

/// Samples transitions directly out of a compiled MDP's outcome tables.
pub struct MdpSimulator {
    mdp: CompiledMdp,
    rng: RngStream,
}

impl MdpSimulator {
    pub fn new(mdp: CompiledMdp, seed: u64) -> Self {
        Self {
            mdp,
            rng: RngStream::new(seed),
        }
    }

    pub fn compiled(&self) -> &CompiledMdp {
        &self.mdp
    }
}

impl Simulator for MdpSimulator {
    fn start_state_key(&self) -> StateKey {
        self.mdp.start_state_key()
    }

    fn is_terminal_by_key(&self, key: StateKey) -> bool {
        self.mdp.is_terminal(key)
    }

    fn num_actions_by_key(&self, key: StateKey) -> usize {
        self.mdp.num_actions(key)
    }

    fn step_by_key(
        &mut self,
        key: StateKey,
        action: ActionKey,
    ) -> Result<(StateKey, f64, bool), EngineError> {
        if self.mdp.is_terminal(key) {
            return Err(DomainError::TerminalStep.into());
        }
        let num_actions = self.mdp.num_actions(key);
        if action.index() >= num_actions {
            return Err(DomainError::ActionOutOfRange {
                action: action.0,
                num_actions,
            }
            .into());
        }
        let spec = self.mdp.action(key, action);
        let weights: Vec<f64> = spec.outcomes.iter().map(|o| o.prob).collect();
        let chosen = self.rng.choice_by_weights(&weights);
        let outcome = spec.outcomes[chosen];
        let terminal = self.mdp.is_terminal(outcome.next);
        Ok((outcome.next, outcome.reward, terminal))
    }

    fn sample_action_uniform(&mut self, num_actions: usize) -> ActionKey {
        let weights = vec![1.0; num_actions];
        ActionKey(self.rng.choice_by_weights(&weights) as u32)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mdp::compile_yaml_str;

    const LOOPY_YAML: &str = r#"
start: s0
states:
  - id: s0
    actions:
      - id: a0
        outcomes:
          - next: s0
            prob: 0.6
            reward: 0.0
          - next: s1
            prob: 0.4
            reward: 1.0
  - id: s1
    terminal: true
"#;

    #[test]
    fn s3_same_seed_same_trace() {
        let compiled = compile_yaml_str(LOOPY_YAML).unwrap();
        let mut sim_a = MdpSimulator::new(compiled.clone(), 42);
        let mut sim_b = MdpSimulator::new(compiled, 42);

        let trace_a: Vec<_> = (0..20)
            .map(|_| sim_a.step_by_key(StateKey(0), ActionKey(0)).unwrap())
            .collect();
        let trace_b: Vec<_> = (0..20)
            .map(|_| sim_b.step_by_key(StateKey(0), ActionKey(0)).unwrap())
            .collect();

        assert_eq!(trace_a, trace_b);
    }

    #[test]
    fn step_on_terminal_state_is_domain_error() {
        let compiled = compile_yaml_str(LOOPY_YAML).unwrap();
        let mut sim = MdpSimulator::new(compiled, 1);
        let err = sim.step_by_key(StateKey(1), ActionKey(0)).unwrap_err();
        assert!(matches!(
            err,
            EngineError::Domain(DomainError::TerminalStep)
        ));
    }

    #[test]
    fn out_of_range_action_is_domain_error() {
        let compiled = compile_yaml_str(LOOPY_YAML).unwrap();
        let mut sim = MdpSimulator::new(compiled, 1);
        let err = sim.step_by_key(StateKey(0), ActionKey(5)).unwrap_err();
        assert!(matches!(
            err,
            EngineError::Domain(DomainError::ActionOutOfRange { .. })
        ));
    }
}
