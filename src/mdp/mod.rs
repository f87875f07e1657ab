//! Compiles a declarative MDP document into a validated, index-addressed
//! [`CompiledMdp`].
//!
//! The document has the shape `{version?, start, states: [{id, terminal?,
//! actions?: [{id, outcomes: [{next, prob, reward}]}]}]}`. See
//! [`compiler::compile_yaml_str`] for the validation order.

mod compiler;
mod spec;

pub use compiler::compile_yaml_str;
pub use spec::{ActionSpec, CompiledMdp, Outcome, StateSpec};
