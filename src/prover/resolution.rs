//! Resolution inference rules
//!
//! Implements binary resolution and factoring over derivation-carrying
//! clauses. Parents are passed as `Arc<Clause>` so every conclusion keeps
//! a handle on the clauses it came from.

use std::sync::Arc;

use super::clause::{Clause, ClauseBuilder, Derivation, Literal};
use super::standardize::StandardizeApart;
use super::unify::{unify_atoms, Substitution};

fn resolve_literals(
    left: &[Literal],
    i: usize,
    right: &[Literal],
    j: usize,
) -> Option<(Vec<Literal>, Substitution)> {
    let lit1 = left.get(i)?;
    let lit2 = right.get(j)?;

    if lit1.negated == lit2.negated || lit1.atom.predicate != lit2.atom.predicate {
        return None;
    }

    let mgu = unify_atoms(&lit1.atom, &lit2.atom)?;

    let literals = left
        .iter()
        .enumerate()
        .filter(|(k, _)| *k != i)
        .map(|(_, l)| l.apply_substitution(&mgu))
        .chain(
            right
                .iter()
                .enumerate()
                .filter(|(k, _)| *k != j)
                .map(|(_, l)| l.apply_substitution(&mgu)),
        )
        .collect();
    Some((literals, mgu))
}

/// Perform binary resolution between two clauses
///
/// Given clauses C1 = {L1, ...} and C2 = {L2, ...} where L1 and ~L2 unify,
/// produces the resolvent σ(C1 - {L1}) ∪ σ(C2 - {L2}) where σ is the MGU.
/// The clauses must already be standardized apart.
pub fn resolve(left: &Arc<Clause>, i: usize, right: &Arc<Clause>, j: usize) -> Option<Clause> {
    let (literals, unifier) = resolve_literals(left.literals(), i, right.literals(), j)?;
    Some(
        ClauseBuilder::new()
            .literals(literals)
            .derivation(Derivation::Resolution {
                left: Arc::clone(left),
                right: Arc::clone(right),
                unifier,
            })
            .build(),
    )
}

/// Perform all possible resolutions between two clauses
///
/// The right clause is renamed apart first, so a clause may be resolved
/// with itself. Derivations cite the clauses as given.
pub fn resolve_all(left: &Arc<Clause>, right: &Arc<Clause>, ctx: &mut StandardizeApart) -> Vec<Clause> {
    let renamed = ctx.rename_clause(right);
    let mut resolvents = Vec::new();

    for i in 0..left.len() {
        for j in 0..renamed.len() {
            if let Some((literals, unifier)) =
                resolve_literals(left.literals(), i, renamed.literals(), j)
            {
                resolvents.push(
                    ClauseBuilder::new()
                        .literals(literals)
                        .derivation(Derivation::Resolution {
                            left: Arc::clone(left),
                            right: Arc::clone(right),
                            unifier,
                        })
                        .build(),
                );
            }
        }
    }

    resolvents
}

/// Perform factoring within a clause
///
/// Given clause C = {L1, L2, ...} where L1 and L2 unify with MGU σ,
/// produces σ(C - {L2})
pub fn factor(clause: &Arc<Clause>, i: usize, j: usize) -> Option<Clause> {
    if i == j {
        return None;
    }
    let literals = clause.literals();
    let lit1 = literals.get(i)?;
    let lit2 = literals.get(j)?;

    // Both literals must have the same sign
    if lit1.negated != lit2.negated {
        return None;
    }

    let unifier = unify_atoms(&lit1.atom, &lit2.atom)?;

    Some(
        ClauseBuilder::new()
            .literals(
                literals
                    .iter()
                    .enumerate()
                    .filter(|(k, _)| *k != j)
                    .map(|(_, l)| l.apply_substitution(&unifier)),
            )
            .derivation(Derivation::Factor {
                parent: Arc::clone(clause),
                unifier,
            })
            .build(),
    )
}

/// Find all factors of a clause
pub fn factor_all(clause: &Arc<Clause>) -> Vec<Clause> {
    let mut factors = Vec::new();

    for i in 0..clause.len() {
        for j in (i + 1)..clause.len() {
            if let Some(f) = factor(clause, i, j) {
                if !factors.contains(&f) {
                    factors.push(f);
                }
            }
        }
    }

    factors
}
