//! Inference procedure trait and shared query handling

use std::fmt;
use std::time::{Duration, Instant};

use crate::error::{FolError, FolResult};
use crate::prover::clause::{Clause, Derivation, Literal};
use crate::prover::cnf::CnfConverter;
use crate::prover::proof::InferenceResult;
use crate::prover::sentence::Sentence;
use crate::prover::standardize::StandardizeApart;
use crate::prover::term::{Atom, Term, Variable};
use crate::prover::unify::Substitution;
use crate::store::KnowledgeBase;

/// Predicate name of the answer literal attached to negated queries
pub const ANSWER_PREDICATE: &str = "$Answer";

/// Bounds shared by the chaining procedures and the resolution closure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StrategyConfig {
    /// Passes (FC, closure) or frame expansions (BC)
    pub max_steps: usize,
    /// Maximum backward chaining depth
    pub max_depth: usize,
    /// Stop after this many proofs (0 = all)
    pub max_proofs: usize,
    /// Maximum clause set size for the closure
    pub max_clauses: usize,
    /// Wall-clock limit for the closure (0 = none)
    pub max_seconds: u64,
}

impl Default for StrategyConfig {
    fn default() -> Self {
        Self {
            max_steps: 10000,
            max_depth: 64,
            max_proofs: 0,
            max_clauses: 20000,
            max_seconds: 30,
        }
    }
}

/// A procedure that decides whether a knowledge base entails a query
///
/// Procedures only read the knowledge base. Resource exhaustion is
/// reported through the result's termination, never as an error.
pub trait InferenceProcedure: fmt::Debug + Send + Sync {
    /// Short name used in logs and errors
    fn name(&self) -> &str;

    /// Answer a query whose variables are already standardized apart
    fn ask(&self, kb: &KnowledgeBase, query: &Sentence) -> FolResult<InferenceResult>;

    /// Whether the procedure only accepts definite clauses
    fn requires_definite_clauses(&self) -> bool {
        false
    }
}

/// Clauses of a negated query together with the answer variables
#[derive(Debug, Clone)]
pub struct NegatedQuery {
    pub clauses: Vec<Clause>,
    /// Free variables of the query, in the order of the answer literal
    pub answer_vars: Vec<Variable>,
}

impl NegatedQuery {
    /// Clausify `NOT query`, or `NOT query OR $Answer(x1..xn)` when the
    /// query has free variables
    pub fn new(query: &Sentence, ctx: &mut StandardizeApart) -> Self {
        let answer_vars: Vec<Variable> = query.free_variables().into_iter().collect();
        let negated = Sentence::not(query.clone());
        let sentence = if answer_vars.is_empty() {
            negated
        } else {
            Sentence::or(negated, Sentence::Atom(answer_atom(&answer_vars)))
        };
        let clauses = CnfConverter::convert_with(&sentence, ctx, &Derivation::Goal).into_clauses();
        NegatedQuery {
            clauses,
            answer_vars,
        }
    }

    pub fn is_ground(&self) -> bool {
        self.answer_vars.is_empty()
    }

    /// Bindings carried by a clause that proves the query
    ///
    /// The empty clause proves a ground query; a unit answer clause
    /// proves a query with free variables.
    pub fn answer(&self, clause: &Clause) -> Option<Substitution> {
        if clause.is_empty() {
            return Some(Substitution::new());
        }
        let atom = answer_atom_of(clause)?;
        Some(
            self.answer_vars
                .iter()
                .cloned()
                .zip(atom.args.iter().cloned())
                .collect(),
        )
    }
}

fn answer_atom(vars: &[Variable]) -> Atom {
    Atom::new(
        ANSWER_PREDICATE,
        vars.iter().map(|v| Term::Var(v.clone())).collect(),
    )
}

pub fn is_answer_literal(literal: &Literal) -> bool {
    literal.atom.symbolic_name() == ANSWER_PREDICATE
}

/// The answer atom of a unit positive answer clause
pub fn answer_atom_of(clause: &Clause) -> Option<&Atom> {
    match clause.literals() {
        [lit] if lit.is_positive() && is_answer_literal(lit) => Some(&lit.atom),
        _ => None,
    }
}

pub fn is_answer_clause(clause: &Clause) -> bool {
    answer_atom_of(clause).is_some()
}

/// Fail with `NonDefiniteClause` if the knowledge base is not Horn
pub fn check_definite(procedure: &str, kb: &KnowledgeBase) -> FolResult<()> {
    match kb.non_definite_clause() {
        Some(clause) => Err(FolError::non_definite(procedure, clause)),
        None => Ok(()),
    }
}

/// Split a conjunctive query into atoms, or fail with `UnsupportedQuery`
pub fn query_atoms(procedure: &str, query: &Sentence) -> FolResult<Vec<Atom>> {
    query
        .conjuncts()
        .into_iter()
        .map(|s| {
            s.as_atom()
                .cloned()
                .ok_or_else(|| FolError::unsupported_query(procedure, query))
        })
        .collect()
}

/// Wall-clock bound; zero seconds means none
#[derive(Debug, Clone, Copy)]
pub(crate) struct Deadline(Option<Instant>);

impl Deadline {
    pub(crate) fn after_seconds(seconds: u64) -> Self {
        if seconds == 0 {
            Deadline(None)
        } else {
            Deadline(Instant::now().checked_add(Duration::from_secs(seconds)))
        }
    }

    pub(crate) fn expired(&self) -> bool {
        self.0.map_or(false, |t| Instant::now() >= t)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_sentence;

    #[test]
    fn test_negated_ground_query() {
        let mut ctx = StandardizeApart::for_knowledge_base();
        let q = NegatedQuery::new(&parse_sentence("Evil(John)").unwrap(), &mut ctx);
        assert!(q.is_ground());
        assert_eq!(q.clauses.len(), 1);
        assert_eq!(q.clauses[0].to_string(), "[~Evil(John)]");
        assert!(matches!(q.clauses[0].derivation(), Derivation::Goal));
    }

    #[test]
    fn test_negated_query_with_answer_literal() {
        let mut ctx = StandardizeApart::for_knowledge_base();
        let q = NegatedQuery::new(&parse_sentence("Evil(q0)").unwrap(), &mut ctx);
        assert_eq!(q.answer_vars, vec![Variable::new("q0")]);
        // free variables are renamed into the derivation namespace
        assert_eq!(q.clauses[0].to_string(), "[~Evil(v0), $Answer(v0)]");

        let answer = Clause::new(vec![Literal::positive(Atom::new(
            ANSWER_PREDICATE,
            vec![Term::constant("John")],
        ))]);
        assert!(is_answer_clause(&answer));
        assert_eq!(q.answer(&answer).unwrap().to_string(), "{q0=John}");
        assert!(q.answer(&q.clauses[0]).is_none());
    }

    #[test]
    fn test_query_atoms() {
        let conj = parse_sentence("King(x) AND Greedy(x)").unwrap();
        assert_eq!(query_atoms("bc", &conj).unwrap().len(), 2);
        let disj = parse_sentence("King(x) OR Greedy(x)").unwrap();
        assert!(query_atoms("bc", &disj).is_err());
    }

    #[test]
    fn test_deadline() {
        assert!(!Deadline::after_seconds(0).expired());
        assert!(!Deadline::after_seconds(60).expired());
    }
}
