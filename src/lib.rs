//! A Monte Carlo Tree Search engine over declaratively compiled or
//! caller-supplied Markov decision processes.
//!
//! A document is compiled once with [`mdp::compile_yaml_str`] into a
//! [`mdp::CompiledMdp`], wrapped in a [`simulator::MdpSimulator`], and driven
//! by a [`search::SearchTree`]. Callers who already have a domain in Rust
//! types, rather than a YAML document, implement [`simulator::Domain`] and
//! wrap it in a [`simulator::TypedSimulator`] instead — both adapters satisfy
//! the same [`simulator::Simulator`] trait the search engine is generic over.

pub mod error;
pub mod interner;
pub mod keys;
pub mod mdp;
pub mod rng;
pub mod search;
pub mod simulator;

pub use error::EngineError;
pub use keys::{ActionKey, StateKey};
