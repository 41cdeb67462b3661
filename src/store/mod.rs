//! Fact storage and the knowledge base
//!
//! A [`FactIndex`] holds unit literals keyed by polarity and predicate
//! name and supports pattern matching and conjunctive joins. The
//! [`KnowledgeBase`] owns the told sentences, their clauses and a fact
//! index over the unit clauses.

mod kb;

pub use kb::KnowledgeBase;

use indexmap::IndexMap;

use crate::prover::clause::Literal;
use crate::prover::unify::{match_atom, unify, Substitution};

/// Unit literals indexed by `(polarity, predicate name)`
#[derive(Debug, Clone, Default)]
pub struct FactIndex {
    index: IndexMap<(bool, String), Vec<Literal>>,
    len: usize,
}

impl FactIndex {
    /// Create a new empty index
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a fact; returns false if it was already present
    pub fn insert(&mut self, fact: Literal) -> bool {
        let bucket = self.index.entry(fact.index_key()).or_default();
        if bucket.contains(&fact) {
            return false;
        }
        bucket.push(fact);
        self.len += 1;
        true
    }

    /// Facts with the given polarity and predicate name
    pub fn candidates(&self, positive: bool, name: &str) -> &[Literal] {
        self.index
            .get(&(positive, name.to_string()))
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    /// Get all facts
    pub fn iter(&self) -> impl Iterator<Item = &Literal> {
        self.index.values().flatten()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn clear(&mut self) {
        self.index.clear();
        self.len = 0;
    }

    /// Every substitution unifying `literal` with a fact
    pub fn fetch(&self, literal: &Literal) -> Vec<Substitution> {
        self.fetch_all(std::slice::from_ref(literal))
    }

    /// Query with multiple literals (conjunctive join)
    ///
    /// Substitutions are threaded left to right. A non-ground fact is
    /// renamed with the join depth before unification so that two
    /// conjuncts can use the same fact independently.
    pub fn fetch_all(&self, literals: &[Literal]) -> Vec<Substitution> {
        let mut results = Vec::new();
        self.join(literals, 0, &Substitution::new(), &mut results);
        results
    }

    fn join(&self, literals: &[Literal], depth: usize, theta: &Substitution, out: &mut Vec<Substitution>) {
        let Some((first, rest)) = literals.split_first() else {
            out.push(theta.clone());
            return;
        };
        let suffix = depth.to_string();
        for fact in self.candidates(first.is_positive(), first.atom.symbolic_name()) {
            let unified = if fact.is_ground() {
                unify(&first.atom, &fact.atom, theta)
            } else {
                unify(&first.atom, &fact.atom.rename_variables(&suffix), theta)
            };
            if let Some(extended) = unified {
                self.join(rest, depth + 1, &extended, out);
            }
        }
    }

    /// True when `literal` is an alpha-variant of some fact
    pub fn is_renaming(&self, literal: &Literal) -> bool {
        self.candidates(literal.is_positive(), literal.atom.symbolic_name())
            .iter()
            .any(|fact| {
                let mut forward = Substitution::new();
                let mut backward = Substitution::new();
                match_atom(&fact.atom, &literal.atom, &mut forward)
                    && match_atom(&literal.atom, &fact.atom, &mut backward)
                    && is_variable_bijection(&forward)
            })
    }
}

/// A matcher that only maps variables to distinct variables
fn is_variable_bijection(theta: &Substitution) -> bool {
    let mut targets = Vec::new();
    theta.iter().all(|(_, t)| {
        t.is_var() && {
            let fresh = !targets.contains(&t);
            targets.push(t);
            fresh
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prover::term::{Atom, Term, Variable};

    fn fact(name: &str, args: Vec<Term>) -> Literal {
        Literal::positive(Atom::new(name, args))
    }

    fn c(name: &str) -> Term {
        Term::constant(name)
    }

    fn index() -> FactIndex {
        let mut facts = FactIndex::new();
        facts.insert(fact("Parent", vec![c("Tom"), c("Bob")]));
        facts.insert(fact("Parent", vec![c("Bob"), c("Ann")]));
        facts.insert(fact("Parent", vec![c("Bob"), c("Pat")]));
        facts
    }

    #[test]
    fn test_insert_deduplicates() {
        let mut facts = index();
        assert_eq!(facts.len(), 3);
        assert!(!facts.insert(fact("Parent", vec![c("Tom"), c("Bob")])));
        assert_eq!(facts.len(), 3);
    }

    #[test]
    fn test_fetch_returns_every_match() {
        let facts = index();
        let results = facts.fetch(&fact("Parent", vec![c("Bob"), Term::var("x")]));
        assert_eq!(results.len(), 2);
        let x = Variable::new("x");
        assert_eq!(results[0].get(&x), Some(&c("Ann")));
        assert_eq!(results[1].get(&x), Some(&c("Pat")));
    }

    #[test]
    fn test_fetch_all_threads_bindings() {
        let facts = index();
        // Parent(x,y) AND Parent(y,z)
        let results = facts.fetch_all(&[
            fact("Parent", vec![Term::var("x"), Term::var("y")]),
            fact("Parent", vec![Term::var("y"), Term::var("z")]),
        ]);
        assert_eq!(results.len(), 2);
        for theta in &results {
            assert_eq!(theta.get(&Variable::new("x")), Some(&c("Tom")));
        }
    }

    #[test]
    fn test_fetch_all_renames_non_ground_facts() {
        let mut facts = FactIndex::new();
        facts.insert(fact("Likes", vec![Term::var("v0"), c("Pie")]));
        // Likes(A,x) AND Likes(B,y) both use the same open fact
        let results = facts.fetch_all(&[
            fact("Likes", vec![c("A"), Term::var("x")]),
            fact("Likes", vec![c("B"), Term::var("y")]),
        ]);
        assert_eq!(results.len(), 1);
    }

    #[test]
    fn test_polarity_is_part_of_key() {
        let mut facts = index();
        facts.insert(Literal::negative(Atom::new("Parent", vec![c("Ann"), c("Tom")])));
        let positive = facts.fetch(&fact("Parent", vec![c("Ann"), c("Tom")]));
        assert!(positive.is_empty());
        assert_eq!(facts.candidates(false, "Parent").len(), 1);
    }

    #[test]
    fn test_is_renaming() {
        let mut facts = FactIndex::new();
        facts.insert(fact("Knows", vec![Term::var("v1"), Term::var("v2")]));
        assert!(facts.is_renaming(&fact("Knows", vec![Term::var("a"), Term::var("b")])));
        assert!(!facts.is_renaming(&fact("Knows", vec![Term::var("a"), Term::var("a")])));
        assert!(!facts.is_renaming(&fact("Knows", vec![c("John"), Term::var("b")])));
    }
}
