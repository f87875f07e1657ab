//! Crate-wide error types.
//!
//! Everything that can go wrong while compiling an MDP document, stepping a
//! simulator, or running a search ends up as an [`EngineError`]. Internally
//! it is just a thin `thiserror` wrapper around the four more specific error
//! enums below, so callers that want to match on a particular failure kind
//! can still do so.

/// Violations of the declarative MDP schema's invariants (see the compiler
/// validation order in the module docs of [`crate::mdp`]).
#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    #[error("start state `{start}` is not declared")]
    UnknownStart { start: String },

    #[error("duplicate state id `{id}`")]
    DuplicateStateId { id: String },

    #[error("duplicate action id `{action}` in state `{state}`")]
    DuplicateActionId { state: String, action: String },

    #[error("action `{action}` in state `{state}` has no outcomes")]
    EmptyOutcomes { state: String, action: String },

    #[error("action `{action}` in state `{state}` references unknown state `{next}`")]
    UnknownStateRef {
        state: String,
        action: String,
        next: String,
    },

    #[error("action `{action}` in state `{state}` has outcome probability {prob} out of range [0,1]")]
    ProbOutOfRange {
        state: String,
        action: String,
        prob: f64,
    },

    #[error("action `{action}` in state `{state}` outcome probabilities sum to {sum}, expected ~1.0")]
    ProbabilitySum {
        state: String,
        action: String,
        sum: f64,
    },

    #[error("terminal state `{state}` declares actions")]
    TerminalWithActions { state: String },

    #[error("unknown field `{field}` in {context}")]
    UnknownField { context: String, field: String },
}

/// Failures raised by a [`crate::simulator::Simulator`] or a caller-supplied
/// domain.
#[derive(Debug, thiserror::Error)]
pub enum DomainError {
    #[error("action {action} is out of range for a state with {num_actions} actions")]
    ActionOutOfRange { action: u32, num_actions: usize },

    #[error("step_by_key called on a terminal state")]
    TerminalStep,

    #[error("state token `{token}` collides with an existing key whose payload differs")]
    TokenCollision { token: String },
}

/// A [`crate::search::SearchConfig`] field out of its allowed range.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("gamma must lie within [0, 1], got {gamma}")]
    GammaOutOfRange { gamma: f64 },

    #[error("unrecognized return type `{value}`")]
    InvalidReturnType { value: String },
}

/// The single error type returned from every fallible operation in this
/// crate.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("failed to parse MDP document: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("rollout policy failed: {0}")]
    Policy(#[source] anyhow::Error),
}
