//! First-order logic core
//!
//! ## Representation
//! - [`term`] - variables, constants, functions and atoms
//! - [`sentence`] - the sentence syntax tree
//! - [`clause`] - literals and clauses with their derivations
//!
//! ## Algorithms
//! - [`unify`] - substitutions, unification and one-way matching
//! - [`standardize`] - renaming variables apart
//! - [`cnf`] - conversion to clausal form with Skolemization
//! - [`resolution`] - binary resolution and factoring
//! - [`equality`] - demodulation and paramodulation
//! - [`proof`] - proofs and inference results

pub mod term;
pub mod sentence;
pub mod unify;
pub mod clause;
pub mod standardize;
pub mod cnf;
pub mod resolution;
pub mod equality;
pub mod proof;

pub use term::{Atom, Function, Predicate, Term, Variable};
pub use sentence::{Connective, Quantifier, Sentence};
pub use clause::{Clause, ClauseBuilder, Derivation, Literal};
pub use unify::{match_atom, match_term, unify, unify_atoms, Substitution};
pub use standardize::StandardizeApart;
pub use cnf::{Cnf, CnfConverter};
pub use resolution::{factor, factor_all, resolve, resolve_all};
pub use equality::{Demodulation, Paramodulation};
pub use proof::{
    InferenceResult, InferenceStats, Limit, Proof, ProofBuilder, ProofRule, ProofStep, Termination,
};
