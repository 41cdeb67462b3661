//! Inference procedures over a first-order knowledge base
//!
//! # Available Procedures
//!
//! - `ForwardChaining`: bottom-up, data-driven inference over definite clauses
//! - `BackwardChaining`: top-down, goal-directed search over definite clauses
//! - `OtterProver`: given-clause saturation with a set of support,
//!   demodulation and paramodulation (default)
//! - `ModelElimination`: connection-style refutation with iterative deepening
//! - `ResolutionClosure`: naive pairwise resolution to saturation
//!
//! # Usage
//!
//! ```
//! use folr::reasoning::{kb_library, BackwardChaining};
//!
//! let mut kb = kb_library::kings_knowledge_base();
//! kb.set_procedure(Box::new(BackwardChaining::default()));
//! let result = kb.ask_text("Evil(x)").unwrap();
//! assert_eq!(result.proofs()[0].answer_bindings().to_string(), "{x=John}");
//! ```
//!
//! # Architecture
//!
//! Each procedure implements the `InferenceProcedure` trait and only
//! borrows the knowledge base, so one knowledge base can be asked with
//! any of them.

mod strategy;
mod forward;
mod backward;
mod otter;
mod model_elimination;
mod closure;
pub mod kb_library;

pub use strategy::{
    answer_atom_of, is_answer_clause, is_answer_literal, InferenceProcedure, NegatedQuery,
    StrategyConfig, ANSWER_PREDICATE,
};
pub use forward::ForwardChaining;
pub use backward::BackwardChaining;
pub use otter::{OtterConfig, OtterProver};
pub use model_elimination::{ModelElimination, ModelEliminationConfig};
pub use closure::ResolutionClosure;
