//! Unification algorithm for first-order terms and sentences
//!
//! Implements the classical recursive `unify(x, y, θ)` that threads a
//! substitution through pairwise argument unification. No occurs check
//! is performed: binding `x` to `F(x)` succeeds. Substitutions are kept
//! in solved form by cascading each new binding into the existing ones,
//! so applying a substitution is a single pass.

use std::fmt;

use indexmap::{IndexMap, IndexSet};
use serde::{Deserialize, Serialize};

use super::clause::Literal;
use super::sentence::Sentence;
use super::term::{Atom, Term, Variable};

/// A substitution mapping variables to terms, in insertion order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Substitution {
    bindings: IndexMap<Variable, Term>,
}

impl Substitution {
    /// Create an empty substitution
    pub fn new() -> Self {
        Substitution {
            bindings: IndexMap::new(),
        }
    }

    /// Create a substitution with a single binding
    pub fn singleton(var: Variable, term: Term) -> Self {
        let mut s = Substitution::new();
        s.bindings.insert(var, term);
        s
    }

    /// Add a binding, keeping the substitution in solved form
    ///
    /// The current substitution is applied to `term` first, then the new
    /// binding is applied to every existing binding.
    pub fn bind(&mut self, var: Variable, term: Term) {
        let term = self.apply_term(&term);
        for existing in self.bindings.values_mut() {
            if existing.contains_var(&var) {
                *existing = replace_var(existing, &var, &term);
            }
        }
        self.bindings.insert(var, term);
    }

    /// Insert a binding verbatim, without cascading
    ///
    /// Used by one-way matching where pattern and target variables are
    /// kept apart.
    pub fn insert(&mut self, var: Variable, term: Term) {
        self.bindings.insert(var, term);
    }

    pub fn get(&self, var: &Variable) -> Option<&Term> {
        self.bindings.get(var)
    }

    pub fn contains(&self, var: &Variable) -> bool {
        self.bindings.contains_key(var)
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Variable, &Term)> {
        self.bindings.iter()
    }

    /// Get the domain (variables) of the substitution
    pub fn domain(&self) -> impl Iterator<Item = &Variable> {
        self.bindings.keys()
    }

    /// Apply this substitution to a term
    pub fn apply_term(&self, term: &Term) -> Term {
        match term {
            Term::Var(v) => match self.bindings.get(v) {
                Some(t) => t.clone(),
                None => term.clone(),
            },
            Term::Const(_) => term.clone(),
            Term::Func(f, args) => {
                Term::Func(f.clone(), args.iter().map(|a| self.apply_term(a)).collect())
            }
        }
    }

    /// Apply this substitution to an atom
    pub fn apply_atom(&self, atom: &Atom) -> Atom {
        Atom {
            predicate: atom.predicate.clone(),
            args: atom.args.iter().map(|a| self.apply_term(a)).collect(),
        }
    }

    /// Apply this substitution to a literal
    pub fn apply_literal(&self, lit: &Literal) -> Literal {
        Literal::new(self.apply_atom(&lit.atom), lit.negated)
    }

    /// Apply this substitution to the free occurrences in a sentence
    pub fn apply_sentence(&self, sentence: &Sentence) -> Sentence {
        match sentence {
            Sentence::Atom(atom) => Sentence::Atom(self.apply_atom(atom)),
            Sentence::Not(inner) => Sentence::not(self.apply_sentence(inner)),
            Sentence::Connected(c, l, r) => {
                Sentence::connected(*c, self.apply_sentence(l), self.apply_sentence(r))
            }
            Sentence::Quantified(q, vars, body) => {
                let inner = self.without(vars);
                Sentence::Quantified(*q, vars.clone(), Box::new(inner.apply_sentence(body)))
            }
        }
    }

    /// Compose two substitutions: self ∘ other
    /// (apply other first, then self)
    pub fn compose(&self, other: &Substitution) -> Substitution {
        let mut result = Substitution::new();

        for (var, term) in &other.bindings {
            result.bindings.insert(var.clone(), self.apply_term(term));
        }

        for (var, term) in &self.bindings {
            if !other.bindings.contains_key(var) {
                result.bindings.insert(var.clone(), term.clone());
            }
        }

        result
    }

    /// Restrict substitution to given variables
    pub fn restrict(&self, vars: &IndexSet<Variable>) -> Substitution {
        Substitution {
            bindings: self
                .bindings
                .iter()
                .filter(|(v, _)| vars.contains(*v))
                .map(|(v, t)| (v.clone(), t.clone()))
                .collect(),
        }
    }

    /// Copy without bindings for the given variables
    pub fn without(&self, vars: &[Variable]) -> Substitution {
        Substitution {
            bindings: self
                .bindings
                .iter()
                .filter(|(v, _)| !vars.contains(*v))
                .map(|(v, t)| (v.clone(), t.clone()))
                .collect(),
        }
    }
}

impl FromIterator<(Variable, Term)> for Substitution {
    fn from_iter<I: IntoIterator<Item = (Variable, Term)>>(iter: I) -> Self {
        Substitution {
            bindings: iter.into_iter().collect(),
        }
    }
}

impl fmt::Display for Substitution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (i, (v, t)) in self.bindings.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}={}", v, t)?;
        }
        write!(f, "}}")
    }
}

/// Replace every occurrence of a variable in a term
fn replace_var(term: &Term, var: &Variable, replacement: &Term) -> Term {
    match term {
        Term::Var(v) if v == var => replacement.clone(),
        Term::Var(_) | Term::Const(_) => term.clone(),
        Term::Func(f, args) => Term::Func(
            f.clone(),
            args.iter().map(|a| replace_var(a, var, replacement)).collect(),
        ),
    }
}

/// Structures the unifier can traverse
pub trait Unifiable {
    /// Extend `theta` so that `self` and `other` become identical.
    /// On failure `theta` may hold partial bindings and must be discarded.
    fn unify_into(&self, other: &Self, theta: &mut Substitution) -> bool;
}

impl Unifiable for Term {
    fn unify_into(&self, other: &Self, theta: &mut Substitution) -> bool {
        if self == other {
            return true;
        }
        match (self, other) {
            (Term::Var(v), _) => unify_var(v, other, theta),
            (_, Term::Var(v)) => unify_var(v, self, theta),
            (Term::Func(f, xs), Term::Func(g, ys)) => {
                f.name == g.name && xs.len() == ys.len() && xs.as_slice().unify_into(ys.as_slice(), theta)
            }
            _ => false,
        }
    }
}

impl Unifiable for [Term] {
    fn unify_into(&self, other: &Self, theta: &mut Substitution) -> bool {
        self.len() == other.len()
            && self.iter().zip(other).all(|(x, y)| x.unify_into(y, theta))
    }
}

impl Unifiable for Atom {
    fn unify_into(&self, other: &Self, theta: &mut Substitution) -> bool {
        self.predicate == other.predicate && self.args.as_slice().unify_into(other.args.as_slice(), theta)
    }
}

impl Unifiable for Literal {
    fn unify_into(&self, other: &Self, theta: &mut Substitution) -> bool {
        self.negated == other.negated && self.atom.unify_into(&other.atom, theta)
    }
}

impl Unifiable for Sentence {
    fn unify_into(&self, other: &Self, theta: &mut Substitution) -> bool {
        match (self, other) {
            (Sentence::Atom(a), Sentence::Atom(b)) => a.unify_into(b, theta),
            (Sentence::Not(a), Sentence::Not(b)) => a.unify_into(b, theta),
            (Sentence::Connected(c1, l1, r1), Sentence::Connected(c2, l2, r2)) => {
                c1 == c2 && l1.unify_into(l2, theta) && r1.unify_into(r2, theta)
            }
            (Sentence::Quantified(q1, v1, b1), Sentence::Quantified(q2, v2, b2)) => {
                if q1 != q2 || v1.len() != v2.len() {
                    return false;
                }
                let vars1: Vec<Term> = v1.iter().cloned().map(Term::Var).collect();
                let vars2: Vec<Term> = v2.iter().cloned().map(Term::Var).collect();
                vars1.as_slice().unify_into(vars2.as_slice(), theta) && b1.unify_into(b2, theta)
            }
            _ => false,
        }
    }
}

fn unify_var(var: &Variable, x: &Term, theta: &mut Substitution) -> bool {
    if let Some(value) = theta.get(var).cloned() {
        return value.unify_into(x, theta);
    }
    if let Term::Var(xv) = x {
        if let Some(value) = theta.get(xv).cloned() {
            return Term::Var(var.clone()).unify_into(&value, theta);
        }
    }
    theta.bind(var.clone(), x.clone());
    true
}

/// Unify `x` and `y` under `theta`, returning the extended substitution
///
/// `theta` itself is never modified.
pub fn unify<T: Unifiable + ?Sized>(x: &T, y: &T, theta: &Substitution) -> Option<Substitution> {
    let mut result = theta.clone();
    if x.unify_into(y, &mut result) {
        Some(result)
    } else {
        None
    }
}

/// Unify two atoms from the empty substitution
pub fn unify_atoms(a: &Atom, b: &Atom) -> Option<Substitution> {
    unify(a, b, &Substitution::new())
}

/// Match a pattern against a term (one-way unification)
///
/// Variables in the pattern can be bound, variables in the target are
/// treated as constants.
pub fn match_term(pattern: &Term, target: &Term, theta: &mut Substitution) -> bool {
    match pattern {
        Term::Var(v) => match theta.get(v) {
            Some(bound) => bound == target,
            None => {
                theta.insert(v.clone(), target.clone());
                true
            }
        },
        Term::Const(a) => matches!(target, Term::Const(b) if a == b),
        Term::Func(f, ps) => match target {
            Term::Func(g, ts) if f == g && ps.len() == ts.len() => {
                ps.iter().zip(ts).all(|(p, t)| match_term(p, t, theta))
            }
            _ => false,
        },
    }
}

/// One-way match of two atoms
pub fn match_atom(pattern: &Atom, target: &Atom, theta: &mut Substitution) -> bool {
    pattern.predicate == target.predicate
        && pattern.args.iter().zip(&target.args).all(|(p, t)| match_term(p, t, theta))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(name: &str) -> Term {
        Term::var(name)
    }

    fn c(name: &str) -> Term {
        Term::constant(name)
    }

    #[test]
    fn test_unify_identical() {
        let t = Term::func("F", vec![v("x"), c("A")]);
        let result = unify(&t, &t, &Substitution::new());
        assert_eq!(result, Some(Substitution::new()));
    }

    #[test]
    fn test_unify_idempotent_under_existing_bindings() {
        let theta = Substitution::singleton(Variable::new("x"), c("John"));
        let t = Atom::new("Knows", vec![c("John"), v("x")]);
        let result = unify(&t, &t, &theta).unwrap();
        assert_eq!(result, theta);
    }

    #[test]
    fn test_unify_var_const() {
        let x = v("x");
        let a = c("A");
        let subst = unify(&x, &a, &Substitution::new()).unwrap();
        assert_eq!(subst.apply_term(&x), a);
    }

    #[test]
    fn test_unify_clash() {
        assert!(unify(&c("A"), &c("B"), &Substitution::new()).is_none());
        assert!(unify(&c("A"), &Term::func("A", vec![c("B")]), &Substitution::new()).is_none());
    }

    #[test]
    fn test_no_occurs_check() {
        let x = v("x");
        let fx = Term::func("F", vec![x.clone()]);
        let subst = unify(&x, &fx, &Substitution::new()).unwrap();
        assert_eq!(subst.get(&Variable::new("x")), Some(&fx));
    }

    #[test]
    fn test_unify_knows_examples() {
        // Knows(John, x) and Knows(y, Mother(y)) => {y=John, x=Mother(John)}
        let a = Atom::new("Knows", vec![c("John"), v("x")]);
        let b = Atom::new("Knows", vec![v("y"), Term::func("Mother", vec![v("y")])]);
        let subst = unify_atoms(&a, &b).unwrap();
        assert_eq!(subst.to_string(), "{y=John, x=Mother(John)}");

        // Knows(John, x) and Knows(x, Elizabeth) fails without standardizing apart
        let d = Atom::new("Knows", vec![v("x"), c("Elizabeth")]);
        assert!(unify_atoms(&a, &d).is_none());
    }

    #[test]
    fn test_unify_threads_bound_variables() {
        let theta = Substitution::singleton(Variable::new("x"), c("A"));
        assert!(unify(&v("x"), &c("B"), &theta).is_none());
        assert!(unify(&v("y"), &v("x"), &theta).is_some());
        let s = unify(&v("y"), &v("x"), &theta).unwrap();
        assert_eq!(s.apply_term(&v("y")), c("A"));
    }

    #[test]
    fn test_unify_term_equality_positionally() {
        let a = Atom::equality(v("x"), c("B"));
        let b = Atom::equality(c("A"), v("y"));
        let s = unify_atoms(&a, &b).unwrap();
        assert_eq!(s.apply_term(&v("x")), c("A"));
        assert_eq!(s.apply_term(&v("y")), c("B"));

        let not_eq = Atom::new("P", vec![c("A"), v("y")]);
        assert!(unify_atoms(&a, &not_eq).is_none());
    }

    #[test]
    fn test_unify_sentences() {
        let s1 = Sentence::not(Sentence::predicate("P", vec![v("x")]));
        let s2 = Sentence::not(Sentence::predicate("P", vec![c("A")]));
        let s = unify(&s1, &s2, &Substitution::new()).unwrap();
        assert_eq!(s.apply_term(&v("x")), c("A"));

        let s3 = Sentence::predicate("P", vec![c("A")]);
        assert!(unify(&s1, &s3, &Substitution::new()).is_none());
    }

    #[test]
    fn test_bind_keeps_solved_form() {
        let mut s = Substitution::new();
        s.bind(Variable::new("x"), v("y"));
        s.bind(Variable::new("y"), c("A"));
        assert_eq!(s.get(&Variable::new("x")), Some(&c("A")));
        assert_eq!(s.to_string(), "{x=A, y=A}");
    }

    #[test]
    fn test_substitution_compose() {
        let x = v("x");

        let s1 = Substitution::singleton(Variable::new("x"), v("y"));
        let s2 = Substitution::singleton(Variable::new("y"), c("A"));

        let composed = s2.compose(&s1);
        assert_eq!(composed.apply_term(&x), c("A"));
        assert_eq!(composed.apply_term(&v("y")), c("A"));
    }

    #[test]
    fn test_match_is_one_way() {
        let mut theta = Substitution::new();
        assert!(match_term(&v("x"), &c("A"), &mut theta));

        let mut theta = Substitution::new();
        assert!(!match_term(&c("A"), &v("x"), &mut theta));

        let mut theta = Substitution::new();
        let pattern = Term::func("F", vec![v("x"), v("x")]);
        assert!(!match_term(&pattern, &Term::func("F", vec![c("A"), c("B")]), &mut theta));
    }

    #[test]
    fn test_apply_sentence_respects_quantifiers() {
        let s = Sentence::and(
            Sentence::predicate("P", vec![v("x")]),
            Sentence::forall(vec![Variable::new("x")], Sentence::predicate("Q", vec![v("x")])),
        );
        let theta = Substitution::singleton(Variable::new("x"), c("A"));
        assert_eq!(theta.apply_sentence(&s).to_string(), "(P(A) AND FORALL x (Q(x)))");
    }
}
