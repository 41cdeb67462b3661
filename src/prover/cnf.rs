//! Conversion of sentences to conjunctive normal form
//!
//! The conversion is a pipeline of small stages, each a public function
//! from sentence to sentence, so they can be inspected and tested one at
//! a time:
//!
//! 1. [`eliminate_biconditionals`]
//! 2. [`eliminate_implications`]
//! 3. [`move_negations_inward`]
//! 4. [`standardize_quantified_variables`]
//! 5. [`skolemize`]
//! 6. [`drop_quantifiers`]
//! 7. [`distribute_or_over_and`]
//! 8. [`collect_clauses`]
//!
//! Stages 4 and 5 draw fresh names and Skolem indices from the caller's
//! [`StandardizeApart`] context; the converter itself is stateless.

use std::fmt;
use std::sync::Arc;

use super::clause::{Clause, ClauseBuilder, Derivation, Literal};
use super::sentence::{Connective, Quantifier, Sentence};
use super::standardize::StandardizeApart;
use super::term::{Atom, Term, Variable};
use super::unify::Substitution;

/// Prefix of Skolem constants
pub const SKOLEM_CONSTANT_PREFIX: &str = "SC";

/// Prefix of Skolem functions
pub const SKOLEM_FUNCTION_PREFIX: &str = "SF";

/// The clauses obtained from one sentence, in order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Cnf {
    clauses: Vec<Clause>,
}

impl Cnf {
    pub fn new(clauses: Vec<Clause>) -> Self {
        Cnf { clauses }
    }

    pub fn clauses(&self) -> &[Clause] {
        &self.clauses
    }

    pub fn into_clauses(self) -> Vec<Clause> {
        self.clauses
    }

    pub fn len(&self) -> usize {
        self.clauses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }

    /// True if some clause is the empty clause, i.e. the sentence is unsatisfiable
    pub fn has_empty_clause(&self) -> bool {
        self.clauses.iter().any(|c| c.is_empty())
    }
}

impl fmt::Display for Cnf {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (i, clause) in self.clauses.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", clause)?;
        }
        write!(f, "}}")
    }
}

/// Runs the CNF pipeline
#[derive(Debug, Clone, Copy, Default)]
pub struct CnfConverter;

impl CnfConverter {
    /// Convert a told sentence; clauses record it as their source
    pub fn convert(sentence: &Sentence, ctx: &mut StandardizeApart) -> Cnf {
        let derivation = Derivation::Clausified(Arc::new(sentence.clone()));
        Self::convert_with(sentence, ctx, &derivation)
    }

    /// Convert with an explicit derivation for the produced clauses
    pub fn convert_with(sentence: &Sentence, ctx: &mut StandardizeApart, derivation: &Derivation) -> Cnf {
        let s = eliminate_biconditionals(sentence);
        let s = eliminate_implications(&s);
        let s = move_negations_inward(&s);
        let s = standardize_quantified_variables(&s, ctx);
        let s = skolemize(&s, ctx);
        let s = drop_quantifiers(&s);
        let s = distribute_or_over_and(&s);
        Cnf::new(collect_clauses(&s, derivation))
    }
}

/// `a <=> b` becomes `(a => b) AND (b => a)`
pub fn eliminate_biconditionals(sentence: &Sentence) -> Sentence {
    match sentence {
        Sentence::Atom(_) => sentence.clone(),
        Sentence::Not(inner) => Sentence::not(eliminate_biconditionals(inner)),
        Sentence::Connected(Connective::Biconditional, l, r) => {
            let l = eliminate_biconditionals(l);
            let r = eliminate_biconditionals(r);
            Sentence::and(Sentence::implies(l.clone(), r.clone()), Sentence::implies(r, l))
        }
        Sentence::Connected(c, l, r) => {
            Sentence::connected(*c, eliminate_biconditionals(l), eliminate_biconditionals(r))
        }
        Sentence::Quantified(q, vars, body) => {
            Sentence::Quantified(*q, vars.clone(), Box::new(eliminate_biconditionals(body)))
        }
    }
}

/// `a => b` becomes `NOT a OR b`
pub fn eliminate_implications(sentence: &Sentence) -> Sentence {
    match sentence {
        Sentence::Atom(_) => sentence.clone(),
        Sentence::Not(inner) => Sentence::not(eliminate_implications(inner)),
        Sentence::Connected(Connective::Implies, l, r) => Sentence::or(
            Sentence::not(eliminate_implications(l)),
            eliminate_implications(r),
        ),
        Sentence::Connected(Connective::Biconditional, ..) => {
            eliminate_implications(&eliminate_biconditionals(sentence))
        }
        Sentence::Connected(c, l, r) => {
            Sentence::connected(*c, eliminate_implications(l), eliminate_implications(r))
        }
        Sentence::Quantified(q, vars, body) => {
            Sentence::Quantified(*q, vars.clone(), Box::new(eliminate_implications(body)))
        }
    }
}

/// Push negation down to the atoms
///
/// Applies double-negation elimination, De Morgan's laws, and flips
/// quantifiers under negation.
pub fn move_negations_inward(sentence: &Sentence) -> Sentence {
    match sentence {
        Sentence::Atom(_) => sentence.clone(),
        Sentence::Not(inner) => match inner.as_ref() {
            Sentence::Atom(_) => sentence.clone(),
            Sentence::Not(a) => move_negations_inward(a),
            Sentence::Connected(Connective::And, l, r) => Sentence::or(
                move_negations_inward(&Sentence::not(l.as_ref().clone())),
                move_negations_inward(&Sentence::not(r.as_ref().clone())),
            ),
            Sentence::Connected(Connective::Or, l, r) => Sentence::and(
                move_negations_inward(&Sentence::not(l.as_ref().clone())),
                move_negations_inward(&Sentence::not(r.as_ref().clone())),
            ),
            Sentence::Connected(..) => {
                move_negations_inward(&Sentence::not(eliminate_implications(inner)))
            }
            Sentence::Quantified(q, vars, body) => Sentence::Quantified(
                q.dual(),
                vars.clone(),
                Box::new(move_negations_inward(&Sentence::not(body.as_ref().clone()))),
            ),
        },
        Sentence::Connected(c, l, r) => {
            Sentence::connected(*c, move_negations_inward(l), move_negations_inward(r))
        }
        Sentence::Quantified(q, vars, body) => {
            Sentence::Quantified(*q, vars.clone(), Box::new(move_negations_inward(body)))
        }
    }
}

/// Give every quantified variable a fresh name
///
/// Free variables are renamed too, consistently across the sentence.
pub fn standardize_quantified_variables(sentence: &Sentence, ctx: &mut StandardizeApart) -> Sentence {
    let free: Vec<(Variable, Variable)> = sentence
        .free_variables()
        .into_iter()
        .map(|v| (v, ctx.fresh_variable()))
        .collect();
    let mut scopes = free;
    rename_scoped(sentence, &mut scopes, ctx)
}

fn lookup<'a>(scopes: &'a [(Variable, Variable)], var: &Variable) -> Option<&'a Variable> {
    scopes.iter().rev().find(|(from, _)| from == var).map(|(_, to)| to)
}

fn rename_scoped_term(term: &Term, scopes: &[(Variable, Variable)]) -> Term {
    match term {
        Term::Var(v) => Term::Var(lookup(scopes, v).cloned().unwrap_or_else(|| v.clone())),
        Term::Const(_) => term.clone(),
        Term::Func(f, args) => Term::Func(
            f.clone(),
            args.iter().map(|a| rename_scoped_term(a, scopes)).collect(),
        ),
    }
}

fn rename_scoped(
    sentence: &Sentence,
    scopes: &mut Vec<(Variable, Variable)>,
    ctx: &mut StandardizeApart,
) -> Sentence {
    match sentence {
        Sentence::Atom(atom) => Sentence::Atom(Atom {
            predicate: atom.predicate.clone(),
            args: atom.args.iter().map(|a| rename_scoped_term(a, scopes)).collect(),
        }),
        Sentence::Not(inner) => Sentence::not(rename_scoped(inner, scopes, ctx)),
        Sentence::Connected(c, l, r) => {
            let l = rename_scoped(l, scopes, ctx);
            let r = rename_scoped(r, scopes, ctx);
            Sentence::connected(*c, l, r)
        }
        Sentence::Quantified(q, vars, body) => {
            let depth = scopes.len();
            let mut fresh = Vec::with_capacity(vars.len());
            for v in vars {
                let to = ctx.fresh_variable();
                scopes.push((v.clone(), to.clone()));
                fresh.push(to);
            }
            let body = rename_scoped(body, scopes, ctx);
            scopes.truncate(depth);
            Sentence::Quantified(*q, fresh, Box::new(body))
        }
    }
}

/// Replace existential variables with Skolem terms
///
/// An existential with no enclosing universal becomes a constant
/// `SC<n>`; otherwise a function `SF<n>` applied to the enclosing
/// universals. Free variables count as outermost universals. Expects
/// negation normal form with distinct quantified variables.
pub fn skolemize(sentence: &Sentence, ctx: &mut StandardizeApart) -> Sentence {
    let mut universals: Vec<Variable> = sentence.free_variables().into_iter().collect();
    let mut theta = Substitution::new();
    skolemize_inner(sentence, &mut universals, &mut theta, ctx)
}

fn skolemize_inner(
    sentence: &Sentence,
    universals: &mut Vec<Variable>,
    theta: &mut Substitution,
    ctx: &mut StandardizeApart,
) -> Sentence {
    match sentence {
        Sentence::Atom(atom) => Sentence::Atom(theta.apply_atom(atom)),
        Sentence::Not(inner) => Sentence::not(skolemize_inner(inner, universals, theta, ctx)),
        Sentence::Connected(c, l, r) => {
            let l = skolemize_inner(l, universals, theta, ctx);
            let r = skolemize_inner(r, universals, theta, ctx);
            Sentence::connected(*c, l, r)
        }
        Sentence::Quantified(Quantifier::ForAll, vars, body) => {
            let depth = universals.len();
            universals.extend(vars.iter().cloned());
            let body = skolemize_inner(body, universals, theta, ctx);
            universals.truncate(depth);
            Sentence::forall(vars.clone(), body)
        }
        Sentence::Quantified(Quantifier::Exists, vars, body) => {
            for v in vars {
                let index = ctx.next_index();
                let skolem = if universals.is_empty() {
                    Term::constant(format!("{}{}", SKOLEM_CONSTANT_PREFIX, index))
                } else {
                    Term::func(
                        format!("{}{}", SKOLEM_FUNCTION_PREFIX, index),
                        universals.iter().cloned().map(Term::Var).collect(),
                    )
                };
                theta.insert(v.clone(), skolem);
            }
            skolemize_inner(body, universals, theta, ctx)
        }
    }
}

/// Remove the remaining (universal) quantifiers
pub fn drop_quantifiers(sentence: &Sentence) -> Sentence {
    match sentence {
        Sentence::Atom(_) => sentence.clone(),
        Sentence::Not(inner) => Sentence::not(drop_quantifiers(inner)),
        Sentence::Connected(c, l, r) => {
            Sentence::connected(*c, drop_quantifiers(l), drop_quantifiers(r))
        }
        Sentence::Quantified(_, _, body) => drop_quantifiers(body),
    }
}

/// `a OR (b AND c)` becomes `(a OR b) AND (a OR c)`
pub fn distribute_or_over_and(sentence: &Sentence) -> Sentence {
    match sentence {
        Sentence::Connected(Connective::And, l, r) => {
            Sentence::and(distribute_or_over_and(l), distribute_or_over_and(r))
        }
        Sentence::Connected(Connective::Or, l, r) => {
            distribute_pair(distribute_or_over_and(l), distribute_or_over_and(r))
        }
        _ => sentence.clone(),
    }
}

fn distribute_pair(left: Sentence, right: Sentence) -> Sentence {
    match (left, right) {
        (Sentence::Connected(Connective::And, a, b), right) => {
            Sentence::and(distribute_pair(*a, right.clone()), distribute_pair(*b, right))
        }
        (left, Sentence::Connected(Connective::And, a, b)) => {
            Sentence::and(distribute_pair(left.clone(), *a), distribute_pair(left, *b))
        }
        (left, right) => Sentence::or(left, right),
    }
}

/// Turn each conjunct into a clause
///
/// Literals `~(t = t)` are false and are left out of their clause, so a
/// conjunct made only of them yields the empty clause.
///
/// # Panics
///
/// Panics if the sentence is not a quantifier-free conjunction of
/// disjunctions of literals, which the earlier stages guarantee.
pub fn collect_clauses(sentence: &Sentence, derivation: &Derivation) -> Vec<Clause> {
    sentence
        .conjuncts()
        .into_iter()
        .map(|conjunct| {
            let mut literals = Vec::new();
            collect_literals(conjunct, &mut literals);
            ClauseBuilder::new()
                .literals(literals.into_iter().filter(|l| !l.is_trivially_false()))
                .derivation(derivation.clone())
                .build()
        })
        .collect()
}

fn collect_literals(sentence: &Sentence, out: &mut Vec<Literal>) {
    match sentence {
        Sentence::Connected(Connective::Or, l, r) => {
            collect_literals(l, out);
            collect_literals(r, out);
        }
        Sentence::Atom(atom) => out.push(Literal::positive(atom.clone())),
        Sentence::Not(inner) => match inner.as_ref() {
            Sentence::Atom(atom) => out.push(Literal::negative(atom.clone())),
            other => panic!("negation of non-atomic sentence {} in clause form", other),
        },
        other => panic!("sentence {} is not in clause form", other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn x() -> Term {
        Term::var("x")
    }

    fn clausify(s: &Sentence) -> Vec<String> {
        let mut ctx = StandardizeApart::for_knowledge_base();
        CnfConverter::convert(s, &mut ctx)
            .clauses()
            .iter()
            .map(|c| c.to_string())
            .collect()
    }

    #[test]
    fn test_rule_becomes_definite_clause() {
        let rule = Sentence::forall(
            vec![Variable::new("x")],
            Sentence::implies(
                Sentence::and(
                    Sentence::predicate("King", vec![x()]),
                    Sentence::predicate("Greedy", vec![x()]),
                ),
                Sentence::predicate("Evil", vec![x()]),
            ),
        );
        assert_eq!(clausify(&rule), vec!["[~King(v0), ~Greedy(v0), Evil(v0)]"]);
    }

    #[test]
    fn test_biconditional() {
        let s = Sentence::iff(Sentence::predicate("P", vec![]), Sentence::predicate("Q", vec![]));
        assert_eq!(clausify(&s), vec!["[~P, Q]", "[~Q, P]"]);
    }

    #[test]
    fn test_negation_moves_through_quantifier() {
        // NOT FORALL x P(x)  ==  EXISTS x NOT P(x)
        let s = Sentence::not(Sentence::forall(
            vec![Variable::new("x")],
            Sentence::predicate("P", vec![x()]),
        ));
        let nnf = move_negations_inward(&s);
        assert_eq!(nnf.to_string(), "EXISTS x (NOT P(x))");
        assert_eq!(clausify(&s), vec!["[~P(SC1)]"]);
    }

    #[test]
    fn test_skolem_functions_over_universals() {
        // FORALL x (FORALL y (Animal(y) => Loves(x, y)) => EXISTS y Loves(y, x))
        let s = Sentence::forall(
            vec![Variable::new("x")],
            Sentence::implies(
                Sentence::forall(
                    vec![Variable::new("y")],
                    Sentence::implies(
                        Sentence::predicate("Animal", vec![Term::var("y")]),
                        Sentence::predicate("Loves", vec![x(), Term::var("y")]),
                    ),
                ),
                Sentence::exists(
                    vec![Variable::new("y")],
                    Sentence::predicate("Loves", vec![Term::var("y"), x()]),
                ),
            ),
        );
        assert_eq!(
            clausify(&s),
            vec![
                "[Animal(SF3(v0)), Loves(SF4(v0),v0)]",
                "[~Loves(v0,SF3(v0)), Loves(SF4(v0),v0)]",
            ]
        );
    }

    #[test]
    fn test_free_variables_are_universal() {
        // EXISTS y Parent(y, x) with x free
        let s = Sentence::exists(
            vec![Variable::new("y")],
            Sentence::predicate("Parent", vec![Term::var("y"), x()]),
        );
        assert_eq!(clausify(&s), vec!["[Parent(SF2(v0),v0)]"]);
    }

    #[test]
    fn test_distribution() {
        // A OR (B AND C)
        let s = Sentence::or(
            Sentence::predicate("A", vec![]),
            Sentence::and(Sentence::predicate("B", vec![]), Sentence::predicate("C", vec![])),
        );
        assert_eq!(clausify(&s), vec!["[A, B]", "[A, C]"]);
    }

    #[test]
    fn test_false_equality_literals_dropped() {
        let s = Sentence::not(Sentence::equality(Term::constant("A"), Term::constant("A")));
        let mut ctx = StandardizeApart::for_knowledge_base();
        let cnf = CnfConverter::convert(&s, &mut ctx);
        assert!(cnf.has_empty_clause());

        let s = Sentence::or(
            Sentence::not(Sentence::equality(x(), x())),
            Sentence::predicate("P", vec![x()]),
        );
        assert_eq!(clausify(&s), vec!["[P(v0)]"]);
    }

    #[test]
    fn test_skolemized_clauses_preserve_satisfiability() {
        use crate::reasoning::ResolutionClosure;
        use crate::store::KnowledgeBase;

        let refute = |sentences: &[&str]| {
            let mut kb = KnowledgeBase::new();
            for text in sentences {
                kb.tell_text(text).unwrap();
            }
            kb.set_procedure(Box::new(ResolutionClosure::default()));
            kb.ask_text("Happy(Bob)").unwrap()
        };

        // The witness for John cannot escape a universal denial
        let unsat = refute(&["FORALL x EXISTS y Loves(x, y)", "FORALL z NOT Loves(John, z)"]);
        assert!(unsat.is_true());

        // A Skolem function of x never unifies with a Skolem constant
        let sat = refute(&["FORALL x EXISTS y Loves(x, y)", "EXISTS w FORALL z NOT Loves(z, w)"]);
        assert!(sat.is_possibly_false());
        assert!(sat.stats().converged);
    }
}
