//! Literal and clause representation
//!
//! A literal is a possibly negated atom. A clause is an immutable set of
//! literals read as their disjunction; it is assembled once through
//! [`ClauseBuilder`] and never changes afterwards. Every clause carries a
//! [`Derivation`] recording where it came from, with parent clauses held
//! behind `Arc` so proofs can be rebuilt from the final clause alone.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use indexmap::IndexSet;

use super::sentence::Sentence;
use super::term::{Atom, Variable};
use super::unify::{match_atom, unify, Substitution};

/// A literal is a possibly negated atom
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Literal {
    pub atom: Atom,
    pub negated: bool,
}

impl Literal {
    pub fn new(atom: Atom, negated: bool) -> Self {
        Literal { atom, negated }
    }

    pub fn positive(atom: Atom) -> Self {
        Literal::new(atom, false)
    }

    pub fn negative(atom: Atom) -> Self {
        Literal::new(atom, true)
    }

    pub fn negate(&self) -> Literal {
        Literal::new(self.atom.clone(), !self.negated)
    }

    pub fn is_positive(&self) -> bool {
        !self.negated
    }

    pub fn is_negative(&self) -> bool {
        self.negated
    }

    pub fn is_ground(&self) -> bool {
        self.atom.is_ground()
    }

    pub fn is_equality(&self) -> bool {
        self.atom.is_equality()
    }

    pub fn variables(&self) -> IndexSet<Variable> {
        self.atom.variables()
    }

    /// Fact index key: polarity and predicate name
    pub fn index_key(&self) -> (bool, String) {
        (self.is_positive(), self.atom.symbolic_name().to_string())
    }

    pub fn apply_substitution(&self, subst: &Substitution) -> Literal {
        subst.apply_literal(self)
    }

    pub fn rename_variables(&self, suffix: &str) -> Literal {
        Literal::new(self.atom.rename_variables(suffix), self.negated)
    }

    /// Opposite polarity and unifiable atoms
    pub fn is_complementary(&self, other: &Literal) -> bool {
        self.negated != other.negated && unify(&self.atom, &other.atom, &Substitution::new()).is_some()
    }

    /// `~(t = t)` can never hold
    pub fn is_trivially_false(&self) -> bool {
        self.negated && self.is_equality() && self.atom.args[0] == self.atom.args[1]
    }

    pub fn weight(&self) -> usize {
        self.atom.weight()
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.negated, self.is_equality()) {
            (false, _) => write!(f, "{}", self.atom),
            (true, false) => write!(f, "~{}", self.atom),
            (true, true) => write!(f, "~({})", self.atom),
        }
    }
}

/// How a clause came to exist
#[derive(Debug, Clone, Default)]
pub enum Derivation {
    /// Supplied directly
    #[default]
    Premise,
    /// Produced by clausifying a told sentence
    Clausified(Arc<Sentence>),
    /// Part of a negated query
    Goal,
    /// Axiom added by a procedure, e.g. reflexivity of equality
    Axiom(String),
    Resolution {
        left: Arc<Clause>,
        right: Arc<Clause>,
        unifier: Substitution,
    },
    Factor {
        parent: Arc<Clause>,
        unifier: Substitution,
    },
    Paramodulation {
        equality: Arc<Clause>,
        target: Arc<Clause>,
        unifier: Substitution,
    },
    Demodulation {
        equality: Arc<Clause>,
        target: Arc<Clause>,
    },
}

impl Derivation {
    pub fn rule_name(&self) -> &'static str {
        match self {
            Derivation::Premise => "Premise",
            Derivation::Clausified(_) => "Clausified",
            Derivation::Goal => "Goal",
            Derivation::Axiom(_) => "Axiom",
            Derivation::Resolution { .. } => "Resolution",
            Derivation::Factor { .. } => "Factor",
            Derivation::Paramodulation { .. } => "Paramodulation",
            Derivation::Demodulation { .. } => "Demodulation",
        }
    }

    /// Parent clauses, in the order they are cited
    pub fn parents(&self) -> Vec<&Arc<Clause>> {
        match self {
            Derivation::Premise
            | Derivation::Clausified(_)
            | Derivation::Goal
            | Derivation::Axiom(_) => Vec::new(),
            Derivation::Resolution { left, right, .. } => vec![left, right],
            Derivation::Factor { parent, .. } => vec![parent],
            Derivation::Paramodulation { equality, target, .. } => vec![equality, target],
            Derivation::Demodulation { equality, target } => vec![equality, target],
        }
    }

    pub fn unifier(&self) -> Option<&Substitution> {
        match self {
            Derivation::Resolution { unifier, .. }
            | Derivation::Factor { unifier, .. }
            | Derivation::Paramodulation { unifier, .. } => Some(unifier),
            _ => None,
        }
    }
}

/// A clause is a disjunction of literals, held as a set
#[derive(Debug, Clone)]
pub struct Clause {
    literals: Vec<Literal>,
    positive_count: usize,
    derivation: Derivation,
}

/// Accumulates literals, then freezes them into a [`Clause`]
#[derive(Debug, Default)]
pub struct ClauseBuilder {
    literals: Vec<Literal>,
    derivation: Derivation,
}

impl ClauseBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn literal(mut self, literal: Literal) -> Self {
        self.literals.push(literal);
        self
    }

    pub fn literals(mut self, literals: impl IntoIterator<Item = Literal>) -> Self {
        self.literals.extend(literals);
        self
    }

    pub fn derivation(mut self, derivation: Derivation) -> Self {
        self.derivation = derivation;
        self
    }

    pub fn build(self) -> Clause {
        let mut literals: Vec<Literal> = Vec::with_capacity(self.literals.len());
        for lit in self.literals {
            if !literals.contains(&lit) {
                literals.push(lit);
            }
        }
        let positive_count = literals.iter().filter(|l| l.is_positive()).count();
        Clause {
            literals,
            positive_count,
            derivation: self.derivation,
        }
    }
}

impl Clause {
    pub fn builder() -> ClauseBuilder {
        ClauseBuilder::new()
    }

    /// Premise clause from literals
    pub fn new(literals: impl IntoIterator<Item = Literal>) -> Self {
        ClauseBuilder::new().literals(literals).build()
    }

    /// The empty clause
    pub fn empty() -> Self {
        ClauseBuilder::new().build()
    }

    pub fn literals(&self) -> &[Literal] {
        &self.literals
    }

    pub fn positive_literals(&self) -> impl Iterator<Item = &Literal> {
        self.literals.iter().filter(|l| l.is_positive())
    }

    pub fn negative_literals(&self) -> impl Iterator<Item = &Literal> {
        self.literals.iter().filter(|l| l.is_negative())
    }

    /// The single positive literal of a definite clause
    pub fn positive_literal(&self) -> Option<&Literal> {
        self.positive_literals().next()
    }

    pub fn derivation(&self) -> &Derivation {
        &self.derivation
    }

    pub fn len(&self) -> usize {
        self.literals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.literals.is_empty()
    }

    pub fn is_unit(&self) -> bool {
        self.literals.len() == 1
    }

    /// At most one positive literal
    pub fn is_definite(&self) -> bool {
        self.positive_count <= 1
    }

    /// Exactly one positive literal and at least one negative one
    pub fn is_implication_definite(&self) -> bool {
        self.positive_count == 1 && self.literals.len() > 1
    }

    pub fn is_horn(&self) -> bool {
        !self.is_empty() && self.positive_count <= 1
    }

    /// A positive unit clause
    pub fn is_fact(&self) -> bool {
        self.is_unit() && self.positive_count == 1
    }

    /// Non-empty with no positive literal
    pub fn is_goal(&self) -> bool {
        !self.is_empty() && self.positive_count == 0
    }

    pub fn is_ground(&self) -> bool {
        self.literals.iter().all(|l| l.is_ground())
    }

    /// Contains complementary literals, or a positive `t = t`
    pub fn is_tautology(&self) -> bool {
        self.literals.iter().enumerate().any(|(i, l)| {
            (l.is_positive() && l.is_equality() && l.atom.args[0] == l.atom.args[1])
                || self.literals[i + 1..]
                    .iter()
                    .any(|m| l.negated != m.negated && l.atom == m.atom)
        })
    }

    pub fn contains(&self, literal: &Literal) -> bool {
        self.literals.contains(literal)
    }

    pub fn variables(&self) -> IndexSet<Variable> {
        let mut vars = IndexSet::new();
        for lit in &self.literals {
            vars.extend(lit.variables());
        }
        vars
    }

    /// Sum of literal weights
    pub fn weight(&self) -> usize {
        self.literals.iter().map(|l| l.weight()).sum()
    }

    /// Instantiate the clause, keeping its derivation
    pub fn apply_substitution(&self, subst: &Substitution) -> Clause {
        ClauseBuilder::new()
            .literals(self.literals.iter().map(|l| l.apply_substitution(subst)))
            .derivation(self.derivation.clone())
            .build()
    }

    pub fn rename_variables(&self, suffix: &str) -> Clause {
        ClauseBuilder::new()
            .literals(self.literals.iter().map(|l| l.rename_variables(suffix)))
            .derivation(self.derivation.clone())
            .build()
    }

    /// Same literals under a different derivation
    pub fn with_derivation(&self, derivation: Derivation) -> Clause {
        Clause {
            literals: self.literals.clone(),
            positive_count: self.positive_count,
            derivation,
        }
    }

    /// Check if this clause subsumes another
    ///
    /// True when some substitution maps every literal of `self` onto a
    /// literal of `other`. Variables of `other` are held fixed.
    pub fn subsumes(&self, other: &Clause) -> bool {
        if self.literals.len() > other.literals.len() {
            return false;
        }
        subsumes_from(&self.literals, &other.literals, &Substitution::new())
    }
}

fn subsumes_from(remaining: &[Literal], targets: &[Literal], theta: &Substitution) -> bool {
    let Some((lit, rest)) = remaining.split_first() else {
        return true;
    };
    targets.iter().any(|target| {
        if lit.negated != target.negated || lit.atom.predicate != target.atom.predicate {
            return false;
        }
        let mut extended = theta.clone();
        match_atom(&lit.atom, &target.atom, &mut extended) && subsumes_from(rest, targets, &extended)
    })
}

impl PartialEq for Clause {
    fn eq(&self, other: &Self) -> bool {
        self.literals.len() == other.literals.len()
            && self.literals.iter().all(|l| other.literals.contains(l))
    }
}

impl Eq for Clause {}

impl Hash for Clause {
    fn hash<H: Hasher>(&self, state: &mut H) {
        let mut sorted: Vec<&Literal> = self.literals.iter().collect();
        sorted.sort();
        sorted.hash(state);
    }
}

impl fmt::Display for Clause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (i, lit) in self.literals.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", lit)?;
        }
        write!(f, "]")
    }
}
