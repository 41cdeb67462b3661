//! Standardizing variables apart
//!
//! Fresh names come from an explicit counter context rather than global
//! state. The knowledge base owns one context (prefix `v`) and every query
//! gets a new one (prefix `q`), so told clauses, queries and clauses built
//! during inference never share variable names.

use indexmap::IndexMap;

use super::clause::{Clause, ClauseBuilder, Literal};
use super::sentence::Sentence;
use super::term::{Atom, Term, Variable};
use super::unify::Substitution;

/// Prefix for variables of clauses stored in a knowledge base
pub const KB_PREFIX: char = 'v';

/// Prefix for variables of a standardized query
pub const QUERY_PREFIX: char = 'q';

/// A fresh-name counter with a one-character prefix
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StandardizeApart {
    prefix: char,
    counter: usize,
}

/// The result of standardizing a value apart
#[derive(Debug, Clone)]
pub struct StandardizedApart<T> {
    /// The renamed value
    pub renamed: T,
    /// Original variable to fresh variable
    pub forward: Substitution,
    /// Fresh variable to original variable
    pub reverse: IndexMap<Variable, Variable>,
}

impl StandardizeApart {
    pub fn new(prefix: char) -> Self {
        StandardizeApart { prefix, counter: 0 }
    }

    pub fn for_knowledge_base() -> Self {
        Self::new(KB_PREFIX)
    }

    pub fn for_query() -> Self {
        Self::new(QUERY_PREFIX)
    }

    pub fn prefix(&self) -> char {
        self.prefix
    }

    /// Next index to be handed out
    pub fn counter(&self) -> usize {
        self.counter
    }

    /// Claim the next index; also used to number Skolem symbols
    pub fn next_index(&mut self) -> usize {
        let index = self.counter;
        self.counter += 1;
        index
    }

    pub fn fresh_variable(&mut self) -> Variable {
        let index = self.next_index();
        Variable::new(format!("{}{}", self.prefix, index))
    }

    pub fn reset(&mut self) {
        self.counter = 0;
    }

    fn renaming<'a>(
        &mut self,
        vars: impl IntoIterator<Item = &'a Variable>,
    ) -> (IndexMap<Variable, Variable>, Substitution, IndexMap<Variable, Variable>) {
        let mut mapping = IndexMap::new();
        let mut forward = Substitution::new();
        let mut reverse = IndexMap::new();
        for var in vars {
            if mapping.contains_key(var) {
                continue;
            }
            let fresh = self.fresh_variable();
            forward.insert(var.clone(), Term::Var(fresh.clone()));
            reverse.insert(fresh.clone(), var.clone());
            mapping.insert(var.clone(), fresh);
        }
        (mapping, forward, reverse)
    }

    /// Rename every variable of a sentence, bound or free
    pub fn standardize_sentence(&mut self, sentence: &Sentence) -> StandardizedApart<Sentence> {
        let vars = sentence.variables();
        let (mapping, forward, reverse) = self.renaming(&vars);
        StandardizedApart {
            renamed: rename_sentence(sentence, &mapping),
            forward,
            reverse,
        }
    }

    pub fn standardize_literals(&mut self, literals: &[Literal]) -> StandardizedApart<Vec<Literal>> {
        let vars: Vec<Variable> = literals.iter().flat_map(|l| l.variables()).collect();
        let (_, forward, reverse) = self.renaming(&vars);
        StandardizedApart {
            renamed: literals.iter().map(|l| forward.apply_literal(l)).collect(),
            forward,
            reverse,
        }
    }

    /// Rename a clause apart, keeping its derivation
    pub fn standardize_clause(&mut self, clause: &Clause) -> StandardizedApart<Clause> {
        let std = self.standardize_literals(clause.literals());
        StandardizedApart {
            renamed: ClauseBuilder::new()
                .literals(std.renamed)
                .derivation(clause.derivation().clone())
                .build(),
            forward: std.forward,
            reverse: std.reverse,
        }
    }

    /// Shorthand for the renamed clause alone
    pub fn rename_clause(&mut self, clause: &Clause) -> Clause {
        self.standardize_clause(clause).renamed
    }
}

fn rename_term(term: &Term, mapping: &IndexMap<Variable, Variable>) -> Term {
    match term {
        Term::Var(v) => Term::Var(mapping.get(v).cloned().unwrap_or_else(|| v.clone())),
        Term::Const(_) => term.clone(),
        Term::Func(f, args) => Term::Func(
            f.clone(),
            args.iter().map(|a| rename_term(a, mapping)).collect(),
        ),
    }
}

pub(crate) fn rename_atom(atom: &Atom, mapping: &IndexMap<Variable, Variable>) -> Atom {
    Atom {
        predicate: atom.predicate.clone(),
        args: atom.args.iter().map(|a| rename_term(a, mapping)).collect(),
    }
}

/// Rename all occurrences, including quantifier variable lists
pub(crate) fn rename_sentence(sentence: &Sentence, mapping: &IndexMap<Variable, Variable>) -> Sentence {
    match sentence {
        Sentence::Atom(atom) => Sentence::Atom(rename_atom(atom, mapping)),
        Sentence::Not(inner) => Sentence::not(rename_sentence(inner, mapping)),
        Sentence::Connected(c, l, r) => {
            Sentence::connected(*c, rename_sentence(l, mapping), rename_sentence(r, mapping))
        }
        Sentence::Quantified(q, vars, body) => Sentence::Quantified(
            *q,
            vars.iter()
                .map(|v| mapping.get(v).cloned().unwrap_or_else(|| v.clone()))
                .collect(),
            Box::new(rename_sentence(body, mapping)),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use indexmap::IndexSet;

    fn rule() -> Clause {
        Clause::new(vec![
            Literal::negative(Atom::new("King", vec![Term::var("x")])),
            Literal::negative(Atom::new("Greedy", vec![Term::var("x")])),
            Literal::positive(Atom::new("Evil", vec![Term::var("x")])),
        ])
    }

    #[test]
    fn test_fresh_variables_count_up() {
        let mut ctx = StandardizeApart::for_knowledge_base();
        assert_eq!(ctx.fresh_variable().name, "v0");
        assert_eq!(ctx.fresh_variable().name, "v1");
        assert_eq!(ctx.next_index(), 2);
        ctx.reset();
        assert_eq!(ctx.fresh_variable().name, "v0");
    }

    #[test]
    fn test_standardize_clause_maps_both_ways() {
        let mut ctx = StandardizeApart::for_query();
        let std = ctx.standardize_clause(&rule());
        assert_eq!(std.renamed.to_string(), "[~King(q0), ~Greedy(q0), Evil(q0)]");
        assert_eq!(std.forward.get(&Variable::new("x")), Some(&Term::var("q0")));
        assert_eq!(std.reverse.get(&Variable::new("q0")), Some(&Variable::new("x")));
    }

    #[test]
    fn test_standardized_copies_are_disjoint() {
        let mut ctx = StandardizeApart::for_knowledge_base();
        let first = ctx.rename_clause(&rule());
        let second = ctx.rename_clause(&rule());
        let a: IndexSet<Variable> = first.variables();
        let b: IndexSet<Variable> = second.variables();
        assert!(a.is_disjoint(&b));
        assert!(!a.contains(&Variable::new("x")));
    }

    #[test]
    fn test_query_and_knowledge_base_namespaces_never_collide() {
        let s = Sentence::forall(
            vec![Variable::new("x")],
            Sentence::predicate("Knows", vec![Term::var("x"), Term::var("y")]),
        );
        let mut kb_ctx = StandardizeApart::for_knowledge_base();
        let mut query_ctx = StandardizeApart::for_query();
        for _ in 0..3 {
            let stored = kb_ctx.standardize_sentence(&s);
            let asked = query_ctx.standardize_sentence(&s);
            let a: IndexSet<Variable> = stored.reverse.keys().cloned().collect();
            let b: IndexSet<Variable> = asked.reverse.keys().cloned().collect();
            assert_eq!(a.len(), 2);
            assert!(a.is_disjoint(&b));
            assert!(a.iter().all(|v| v.name.starts_with(KB_PREFIX)));
            assert!(b.iter().all(|v| v.name.starts_with(QUERY_PREFIX)));
        }

        let stored = kb_ctx.rename_clause(&rule()).variables();
        let asked = query_ctx.rename_clause(&rule()).variables();
        assert!(stored.is_disjoint(&asked));
    }

    #[test]
    fn test_standardize_sentence_renames_quantifiers() {
        let s = Sentence::forall(
            vec![Variable::new("x")],
            Sentence::predicate("Loves", vec![Term::var("x"), Term::var("y")]),
        );
        let mut ctx = StandardizeApart::for_knowledge_base();
        let std = ctx.standardize_sentence(&s);
        assert_eq!(std.renamed.to_string(), "FORALL v0 (Loves(v0,v1))");
        assert_eq!(std.reverse.len(), 2);
    }
}
