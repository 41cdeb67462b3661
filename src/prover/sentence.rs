//! Sentence abstract syntax
//!
//! Sentences are built from atoms with negation, the binary connectives
//! and the two quantifiers. Consumers pattern match on [`Sentence`]
//! directly; there is no visitor layer.

use std::fmt;

use indexmap::IndexSet;
use serde::{Deserialize, Serialize};

use super::term::{Atom, Term, Variable};

/// Binary connectives
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Connective {
    And,
    Or,
    Implies,
    Biconditional,
}

impl Connective {
    pub fn symbol(&self) -> &'static str {
        match self {
            Connective::And => "AND",
            Connective::Or => "OR",
            Connective::Implies => "=>",
            Connective::Biconditional => "<=>",
        }
    }
}

/// Quantifier kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Quantifier {
    ForAll,
    Exists,
}

impl Quantifier {
    pub fn symbol(&self) -> &'static str {
        match self {
            Quantifier::ForAll => "FORALL",
            Quantifier::Exists => "EXISTS",
        }
    }

    /// The dual quantifier, used when pushing negation inward
    pub fn dual(&self) -> Quantifier {
        match self {
            Quantifier::ForAll => Quantifier::Exists,
            Quantifier::Exists => Quantifier::ForAll,
        }
    }
}

/// A first-order sentence
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Sentence {
    /// Predicate application or term equality
    Atom(Atom),
    Not(Box<Sentence>),
    Connected(Connective, Box<Sentence>, Box<Sentence>),
    Quantified(Quantifier, Vec<Variable>, Box<Sentence>),
}

impl Sentence {
    pub fn predicate(name: impl Into<String>, args: Vec<Term>) -> Self {
        Sentence::Atom(Atom::new(name, args))
    }

    pub fn equality(left: Term, right: Term) -> Self {
        Sentence::Atom(Atom::equality(left, right))
    }

    pub fn not(inner: Sentence) -> Self {
        Sentence::Not(Box::new(inner))
    }

    pub fn connected(connective: Connective, left: Sentence, right: Sentence) -> Self {
        Sentence::Connected(connective, Box::new(left), Box::new(right))
    }

    pub fn and(left: Sentence, right: Sentence) -> Self {
        Sentence::connected(Connective::And, left, right)
    }

    pub fn or(left: Sentence, right: Sentence) -> Self {
        Sentence::connected(Connective::Or, left, right)
    }

    pub fn implies(left: Sentence, right: Sentence) -> Self {
        Sentence::connected(Connective::Implies, left, right)
    }

    pub fn iff(left: Sentence, right: Sentence) -> Self {
        Sentence::connected(Connective::Biconditional, left, right)
    }

    pub fn forall(vars: Vec<Variable>, body: Sentence) -> Self {
        Sentence::Quantified(Quantifier::ForAll, vars, Box::new(body))
    }

    pub fn exists(vars: Vec<Variable>, body: Sentence) -> Self {
        Sentence::Quantified(Quantifier::Exists, vars, Box::new(body))
    }

    /// Left-nested conjunction of the given sentences
    pub fn conjunction(sentences: impl IntoIterator<Item = Sentence>) -> Option<Sentence> {
        sentences.into_iter().reduce(Sentence::and)
    }

    /// Left-nested disjunction of the given sentences
    pub fn disjunction(sentences: impl IntoIterator<Item = Sentence>) -> Option<Sentence> {
        sentences.into_iter().reduce(Sentence::or)
    }

    pub fn is_atomic(&self) -> bool {
        matches!(self, Sentence::Atom(_))
    }

    pub fn as_atom(&self) -> Option<&Atom> {
        match self {
            Sentence::Atom(atom) => Some(atom),
            _ => None,
        }
    }

    /// Flatten a tree of conjunctions into its conjuncts
    pub fn conjuncts(&self) -> Vec<&Sentence> {
        match self {
            Sentence::Connected(Connective::And, l, r) => {
                let mut out = l.conjuncts();
                out.extend(r.conjuncts());
                out
            }
            other => vec![other],
        }
    }

    /// Variables not bound by an enclosing quantifier, in order of occurrence
    pub fn free_variables(&self) -> IndexSet<Variable> {
        let mut free = IndexSet::new();
        self.collect_free(&mut Vec::new(), &mut free);
        free
    }

    fn collect_free(&self, bound: &mut Vec<Variable>, free: &mut IndexSet<Variable>) {
        match self {
            Sentence::Atom(atom) => {
                for v in atom.variables() {
                    if !bound.contains(&v) {
                        free.insert(v);
                    }
                }
            }
            Sentence::Not(inner) => inner.collect_free(bound, free),
            Sentence::Connected(_, l, r) => {
                l.collect_free(bound, free);
                r.collect_free(bound, free);
            }
            Sentence::Quantified(_, vars, body) => {
                let depth = bound.len();
                bound.extend(vars.iter().cloned());
                body.collect_free(bound, free);
                bound.truncate(depth);
            }
        }
    }

    /// Every variable occurring in the sentence, bound or free
    pub fn variables(&self) -> IndexSet<Variable> {
        let mut vars = IndexSet::new();
        self.collect_all(&mut vars);
        vars
    }

    fn collect_all(&self, vars: &mut IndexSet<Variable>) {
        match self {
            Sentence::Atom(atom) => vars.extend(atom.variables()),
            Sentence::Not(inner) => inner.collect_all(vars),
            Sentence::Connected(_, l, r) => {
                l.collect_all(vars);
                r.collect_all(vars);
            }
            Sentence::Quantified(_, qvars, body) => {
                vars.extend(qvars.iter().cloned());
                body.collect_all(vars);
            }
        }
    }

    fn needs_parens(&self) -> bool {
        matches!(self, Sentence::Connected(..))
    }
}

impl From<Atom> for Sentence {
    fn from(atom: Atom) -> Self {
        Sentence::Atom(atom)
    }
}

impl fmt::Display for Sentence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Sentence::Atom(atom) if atom.is_equality() => write!(f, "({})", atom),
            Sentence::Atom(atom) => write!(f, "{}", atom),
            Sentence::Not(inner) => {
                if inner.is_atomic() || inner.needs_parens() {
                    write!(f, "NOT {}", inner)
                } else {
                    write!(f, "NOT ({})", inner)
                }
            }
            Sentence::Connected(c, l, r) => write!(f, "({} {} {})", l, c.symbol(), r),
            Sentence::Quantified(q, vars, body) => {
                write!(f, "{} ", q.symbol())?;
                for (i, v) in vars.iter().enumerate() {
                    if i > 0 {
                        write!(f, ",")?;
                    }
                    write!(f, "{}", v)?;
                }
                if body.needs_parens() {
                    write!(f, " {}", body)
                } else {
                    write!(f, " ({})", body)
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn x() -> Term {
        Term::var("x")
    }

    #[test]
    fn test_display_rule() {
        let rule = Sentence::implies(
            Sentence::and(
                Sentence::predicate("King", vec![x()]),
                Sentence::predicate("Greedy", vec![x()]),
            ),
            Sentence::predicate("Evil", vec![x()]),
        );
        assert_eq!(rule.to_string(), "((King(x) AND Greedy(x)) => Evil(x))");
    }

    #[test]
    fn test_display_quantified_and_negation() {
        let s = Sentence::forall(
            vec![Variable::new("x")],
            Sentence::not(Sentence::predicate("Loves", vec![x(), Term::constant("Jack")])),
        );
        assert_eq!(s.to_string(), "FORALL x (NOT Loves(x,Jack))");

        let eq = Sentence::not(Sentence::equality(Term::constant("A"), Term::constant("B")));
        assert_eq!(eq.to_string(), "NOT (A = B)");
    }

    #[test]
    fn test_free_variables() {
        // FORALL y Loves(x, y)
        let s = Sentence::forall(
            vec![Variable::new("y")],
            Sentence::predicate("Loves", vec![x(), Term::var("y")]),
        );
        let free: Vec<_> = s.free_variables().into_iter().collect();
        assert_eq!(free, vec![Variable::new("x")]);
        assert_eq!(s.variables().len(), 2);
    }

    #[test]
    fn test_conjuncts() {
        let s = Sentence::conjunction(vec![
            Sentence::predicate("A", vec![]),
            Sentence::predicate("B", vec![]),
            Sentence::predicate("C", vec![]),
        ])
        .unwrap();
        assert_eq!(s.conjuncts().len(), 3);
    }
}
