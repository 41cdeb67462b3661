//! folr - First-Order Logic Resolution reasoner
//!
//! A knowledge base of first-order sentences with pluggable inference
//! procedures in the style of the AIMA textbook reasoners.
//!
//! # Architecture
//!
//! - [`prover`] - terms, sentences, unification, clausal form, resolution,
//!   equality reasoning and proofs
//! - [`store`] - the [`KnowledgeBase`] and its fact index
//! - [`reasoning`] - the [`InferenceProcedure`] trait and its implementations
//! - [`parser`] - the concrete sentence syntax
//! - [`config`] - TOML configuration with profiles
//! - [`error`] - structured errors with numeric codes
//!
//! # Features
//!
//! - Conversion to CNF with Skolemization and standardizing apart
//! - Forward and backward chaining over definite clauses
//! - OTTER-style given-clause saturation with a set of support,
//!   subsumption, demodulation and paramodulation
//! - Model elimination with iterative deepening
//! - Answer extraction for queries with free variables
//! - Proofs as numbered, justified steps
//!
//! # Example
//!
//! ```rust
//! use folr::KnowledgeBase;
//!
//! let mut kb = KnowledgeBase::new();
//! kb.tell_text("King(John)").unwrap();
//! kb.tell_text("Greedy(John)").unwrap();
//! kb.tell_text("FORALL x ((King(x) AND Greedy(x)) => Evil(x))").unwrap();
//!
//! let result = kb.ask_text("Evil(x)").unwrap();
//! assert!(result.is_true());
//! assert_eq!(result.proofs()[0].answer_bindings().to_string(), "{x=John}");
//! ```

pub mod config;
pub mod error;
pub mod parser;
pub mod prover;
pub mod reasoning;
pub mod store;

// Re-export the logic core
pub use prover::{
    Atom, Clause, Cnf, CnfConverter, InferenceResult, InferenceStats, Limit, Literal, Proof,
    ProofRule, ProofStep, Sentence, Substitution, Term, Termination, Variable,
};

// Re-export parser entry points
pub use parser::{parse_knowledge, parse_sentence, parse_term, ParseError};

// Re-export the knowledge base
pub use store::{FactIndex, KnowledgeBase};

// Re-export inference procedures
pub use reasoning::{
    BackwardChaining, ForwardChaining, InferenceProcedure, ModelElimination,
    ModelEliminationConfig, OtterConfig, OtterProver, ResolutionClosure, StrategyConfig,
};

// Re-export configuration types
pub use config::{
    BuiltinProfile, ConfigError, FolrConfig, GeneralConfig, LogLevel, OutputFormat,
    ProcedureKind, ProfileConfig, ReasoningConfig,
};

// Re-export error types
pub use error::{ErrorCode, ErrorContext, FolError, FolResult};

/// Crate version, as embedded by the build script
pub const VERSION: &str = env!("FOLR_VERSION");

/// Target triple the crate was built for
pub const TARGET: &str = env!("FOLR_TARGET");
