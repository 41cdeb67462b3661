//! Equality reasoning: demodulation and paramodulation
//!
//! Demodulation rewrites with a unit equality using one-way matching, so
//! the rewritten clause is an instance-preserving simplification.
//! Paramodulation is the full inference rule: it unifies one side of an
//! equality with a subterm of another clause and replaces it.

use std::sync::Arc;

use super::clause::{Clause, ClauseBuilder, Derivation, Literal};
use super::standardize::StandardizeApart;
use super::term::{Atom, Term};
use super::unify::{match_term, unify, Substitution};

/// Default bound on rewrites per clause
pub const DEFAULT_MAX_REWRITES: usize = 100;

/// The equality atom of a positive unit equality clause
pub fn unit_equality(clause: &Clause) -> Option<&Atom> {
    match clause.literals() {
        [lit] if lit.is_positive() && lit.is_equality() => Some(&lit.atom),
        _ => None,
    }
}

/// Rewriting with unit equalities
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Demodulation {
    pub max_rewrites: usize,
}

impl Default for Demodulation {
    fn default() -> Self {
        Demodulation {
            max_rewrites: DEFAULT_MAX_REWRITES,
        }
    }
}

impl Demodulation {
    pub fn new(max_rewrites: usize) -> Self {
        Demodulation { max_rewrites }
    }

    /// Rewrite one occurrence in `atom` using `l = r`
    ///
    /// Subterms are visited pre-order, left to right; the first one that
    /// `l` matches is replaced by the matching instance of `r`.
    pub fn apply(equality: &Atom, atom: &Atom) -> Option<Atom> {
        if !equality.is_equality() {
            return None;
        }
        let (lhs, rhs) = (&equality.args[0], &equality.args[1]);
        for (i, arg) in atom.args.iter().enumerate() {
            for path in arg.non_variable_positions() {
                let Some(sub) = arg.subterm(&path) else {
                    continue;
                };
                let mut theta = Substitution::new();
                if match_term(lhs, sub, &mut theta) {
                    let mut args = atom.args.clone();
                    args[i] = arg.replace_at(&path, &theta.apply_term(rhs));
                    return Some(Atom {
                        predicate: atom.predicate.clone(),
                        args,
                    });
                }
            }
        }
        None
    }

    /// Orient an equality so the larger side is rewritten into the smaller
    pub fn orient(equality: &Atom) -> Atom {
        let (l, r) = (&equality.args[0], &equality.args[1]);
        if r.size() > l.size() {
            Atom::equality(r.clone(), l.clone())
        } else {
            equality.clone()
        }
    }

    /// Rewrite every literal of `target` to a fixpoint
    ///
    /// Returns `None` when nothing was rewritten or `equality` is not a
    /// positive unit equality.
    pub fn apply_to_clause(&self, equality: &Arc<Clause>, target: &Arc<Clause>) -> Option<Clause> {
        let eq = unit_equality(equality)?;
        let mut rewrites = 0;
        let literals: Vec<Literal> = target
            .literals()
            .iter()
            .map(|lit| {
                let mut atom = lit.atom.clone();
                while rewrites < self.max_rewrites {
                    match Self::apply(eq, &atom) {
                        Some(next) => {
                            atom = next;
                            rewrites += 1;
                        }
                        None => break,
                    }
                }
                Literal::new(atom, lit.negated)
            })
            .collect();

        if rewrites == 0 {
            return None;
        }
        Some(
            ClauseBuilder::new()
                .literals(literals)
                .derivation(Derivation::Demodulation {
                    equality: Arc::clone(equality),
                    target: Arc::clone(target),
                })
                .build(),
        )
    }
}

/// The paramodulation inference rule
#[derive(Debug, Clone, Copy, Default)]
pub struct Paramodulation;

impl Paramodulation {
    /// All paramodulants between two clauses
    ///
    /// `c2` is renamed apart, then the positive equalities of each clause
    /// are used to rewrite the other.
    pub fn apply(c1: &Arc<Clause>, c2: &Arc<Clause>, ctx: &mut StandardizeApart) -> Vec<Clause> {
        let renamed = ctx.rename_clause(c2);
        let mut out = Vec::new();
        for clause in Self::directed(c1, c1, &renamed, c2) {
            if !out.contains(&clause) {
                out.push(clause);
            }
        }
        for clause in Self::directed(&renamed, c2, c1, c1) {
            if !out.contains(&clause) {
                out.push(clause);
            }
        }
        out
    }

    /// Paramodulate from the equalities of `from` into `into`
    ///
    /// The clauses must already be standardized apart; `from_parent` and
    /// `into_parent` are the clauses cited in the derivation.
    fn directed(
        from: &Clause,
        from_parent: &Arc<Clause>,
        into: &Clause,
        into_parent: &Arc<Clause>,
    ) -> Vec<Clause> {
        let mut out = Vec::new();
        for (ei, eq_lit) in from.literals().iter().enumerate() {
            if !eq_lit.is_positive() || !eq_lit.is_equality() {
                continue;
            }
            let (l, r) = (&eq_lit.atom.args[0], &eq_lit.atom.args[1]);
            for (source, replacement) in [(l, r), (r, l)] {
                if source.is_var() {
                    continue;
                }
                for (ti, target) in into.literals().iter().enumerate() {
                    for (ai, arg) in target.atom.args.iter().enumerate() {
                        for path in arg.non_variable_positions() {
                            let Some(sub) = arg.subterm(&path) else {
                                continue;
                            };
                            let Some(theta) = unify(source, sub, &Substitution::new()) else {
                                continue;
                            };
                            out.push(Self::paramodulant(
                                from,
                                ei,
                                into,
                                ti,
                                ai,
                                &path,
                                replacement,
                                theta,
                                from_parent,
                                into_parent,
                            ));
                        }
                    }
                }
            }
        }
        out
    }

    #[allow(clippy::too_many_arguments)]
    fn paramodulant(
        from: &Clause,
        eq_index: usize,
        into: &Clause,
        lit_index: usize,
        arg_index: usize,
        path: &[usize],
        replacement: &Term,
        theta: Substitution,
        from_parent: &Arc<Clause>,
        into_parent: &Arc<Clause>,
    ) -> Clause {
        let mut literals = Vec::with_capacity(from.len() + into.len());
        for (k, lit) in into.literals().iter().enumerate() {
            if k == lit_index {
                let mut args = lit.atom.args.clone();
                args[arg_index] = args[arg_index].replace_at(path, replacement);
                let atom = Atom {
                    predicate: lit.atom.predicate.clone(),
                    args,
                };
                literals.push(theta.apply_literal(&Literal::new(atom, lit.negated)));
            } else {
                literals.push(theta.apply_literal(lit));
            }
        }
        for (k, lit) in from.literals().iter().enumerate() {
            if k != eq_index {
                literals.push(theta.apply_literal(lit));
            }
        }
        ClauseBuilder::new()
            .literals(literals)
            .derivation(Derivation::Paramodulation {
                equality: Arc::clone(from_parent),
                target: Arc::clone(into_parent),
                unifier: theta,
            })
            .build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn c(name: &str) -> Term {
        Term::constant(name)
    }

    #[test]
    fn test_demodulation_rewrites_one_occurrence_per_call() {
        // B = E on P(A,F(B,G(A,H(B)),C),D)
        let eq = Atom::equality(c("B"), c("E"));
        let atom = Atom::new(
            "P",
            vec![
                c("A"),
                Term::func(
                    "F",
                    vec![
                        c("B"),
                        Term::func("G", vec![c("A"), Term::func("H", vec![c("B")])]),
                        c("C"),
                    ],
                ),
                c("D"),
            ],
        );

        let once = Demodulation::apply(&eq, &atom).unwrap();
        assert_eq!(once.to_string(), "P(A,F(E,G(A,H(B)),C),D)");

        let twice = Demodulation::apply(&eq, &once).unwrap();
        assert_eq!(twice.to_string(), "P(A,F(E,G(A,H(E)),C),D)");

        assert!(Demodulation::apply(&eq, &twice).is_none());
    }

    #[test]
    fn test_demodulation_matches_one_way() {
        // F(x) = x rewrites Q(F(A)) to Q(A) but leaves Q(y) alone
        let eq = Atom::equality(Term::func("F", vec![Term::var("x")]), Term::var("x"));
        let atom = Atom::new("Q", vec![Term::func("F", vec![c("A")])]);
        assert_eq!(Demodulation::apply(&eq, &atom).unwrap().to_string(), "Q(A)");

        let open = Atom::new("Q", vec![Term::var("y")]);
        assert!(Demodulation::apply(&eq, &open).is_none());
    }

    #[test]
    fn test_apply_to_clause_reaches_fixpoint() {
        let eq = Arc::new(Clause::new(vec![Literal::positive(Atom::equality(c("B"), c("A")))]));
        let target = Arc::new(Clause::new(vec![
            Literal::positive(Atom::new("P", vec![c("B"), c("B")])),
            Literal::negative(Atom::new("Q", vec![c("B")])),
        ]));
        let rewritten = Demodulation::default().apply_to_clause(&eq, &target).unwrap();
        assert_eq!(rewritten.to_string(), "[P(A,A), ~Q(A)]");
        assert_eq!(rewritten.derivation().rule_name(), "Demodulation");

        let bounded = Demodulation::new(1).apply_to_clause(&eq, &target).unwrap();
        assert_eq!(bounded.to_string(), "[P(A,B), ~Q(B)]");
    }

    #[test]
    fn test_orient_puts_larger_side_left() {
        let eq = Atom::equality(c("A"), Term::func("F", vec![c("B")]));
        assert_eq!(Demodulation::orient(&eq).to_string(), "F(B) = A");
    }

    #[test]
    fn test_paramodulation() {
        // P(F(x,B),x) | Q(x)  with  F(A,y) = y | R(y)
        let c1 = Arc::new(Clause::new(vec![
            Literal::positive(Atom::new(
                "P",
                vec![Term::func("F", vec![Term::var("x"), c("B")]), Term::var("x")],
            )),
            Literal::positive(Atom::new("Q", vec![Term::var("x")])),
        ]));
        let c2 = Arc::new(Clause::new(vec![
            Literal::positive(Atom::equality(
                Term::func("F", vec![c("A"), Term::var("y")]),
                Term::var("y"),
            )),
            Literal::positive(Atom::new("R", vec![Term::var("y")])),
        ]));
        let mut ctx = StandardizeApart::for_query();
        let results = Paramodulation::apply(&c1, &c2, &mut ctx);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].to_string(), "[P(B,A), Q(A), R(B)]");
        assert_eq!(results[0].derivation().rule_name(), "Paramodulation");
    }
}
