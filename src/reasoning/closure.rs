//! Naive resolution closure
//!
//! Every pass resolves each pair of clauses where at least one member
//! was added by the previous pass, then factors the new resolvents.
//! Tautologies and clauses subsumed by the current set are dropped. The
//! closure stops when a pass produces an answer, adds nothing, or a
//! bound (passes, clauses, seconds) is reached.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;

use log::{debug, info, warn};

use super::strategy::{Deadline, InferenceProcedure, NegatedQuery, StrategyConfig};
use crate::error::FolResult;
use crate::prover::clause::Clause;
use crate::prover::proof::{proof_from_clause, InferenceResult, InferenceStats, Limit, Proof};
use crate::prover::resolution::{factor_all, resolve_all};
use crate::prover::sentence::Sentence;
use crate::prover::unify::Substitution;
use crate::store::KnowledgeBase;

/// Resolution to saturation, without a set of support
#[derive(Debug, Clone, Default)]
pub struct ResolutionClosure {
    config: StrategyConfig,
}

impl ResolutionClosure {
    pub fn new(config: StrategyConfig) -> Self {
        ResolutionClosure { config }
    }

    pub fn config(&self) -> &StrategyConfig {
        &self.config
    }
}

fn is_redundant(clause: &Clause, existing: &[Arc<Clause>], seen: &HashSet<Clause>) -> bool {
    clause.is_tautology() || seen.contains(clause) || existing.iter().any(|c| c.subsumes(clause))
}

impl InferenceProcedure for ResolutionClosure {
    fn name(&self) -> &str {
        "resolution-closure"
    }

    fn ask(&self, kb: &KnowledgeBase, query: &Sentence) -> FolResult<InferenceResult> {
        let start = Instant::now();
        let deadline = Deadline::after_seconds(self.config.max_seconds);
        let mut ctx = kb.derivation_context();
        let negated = NegatedQuery::new(query, &mut ctx);
        let mut stats = InferenceStats::default();

        let mut clauses: Vec<Arc<Clause>> = Vec::new();
        let mut seen: HashSet<Clause> = HashSet::new();
        for clause in kb.clauses().iter().chain(negated.clauses.iter()) {
            if seen.insert(clause.clone()) {
                clauses.push(Arc::new(clause.clone()));
            }
        }

        let mut proofs: Vec<Proof> = Vec::new();
        let mut answers: Vec<Substitution> = Vec::new();
        let mut record = |clause: &Arc<Clause>, proofs: &mut Vec<Proof>| {
            if let Some(bindings) = negated.answer(clause) {
                if !answers.contains(&bindings) {
                    answers.push(bindings.clone());
                    proofs.push(proof_from_clause(clause, bindings));
                }
            }
        };
        // A ground query has a single answer, so its pass can stop early
        let ground = negated.is_ground();
        for clause in &clauses {
            record(clause, &mut proofs);
        }

        info!("resolution closure over {} clauses", clauses.len());
        // Clauses before `frontier` have already been paired with each other
        let mut frontier = 0;
        'passes: loop {
            if !proofs.is_empty() {
                break;
            }
            if stats.steps >= self.config.max_steps {
                return Ok(self.limited(Limit::Steps, proofs, stats, start));
            }
            stats.steps += 1;

            let mut added: Vec<Arc<Clause>> = Vec::new();
            for j in frontier..clauses.len() {
                for i in 0..=j {
                    if deadline.expired() {
                        stats.clauses_kept += added.len();
                        return Ok(self.limited(Limit::Seconds, proofs, stats, start));
                    }
                    let mut resolvents = resolve_all(&clauses[i], &clauses[j], &mut ctx);
                    stats.clauses_generated += resolvents.len();
                    let factors: Vec<Clause> = resolvents
                        .iter()
                        .flat_map(|r| factor_all(&Arc::new(r.clone())))
                        .collect();
                    resolvents.extend(factors);

                    for resolvent in resolvents {
                        if is_redundant(&resolvent, &clauses, &seen)
                            || is_redundant(&resolvent, &added, &seen)
                        {
                            stats.clauses_subsumed += 1;
                            continue;
                        }
                        seen.insert(resolvent.clone());
                        let resolvent = Arc::new(resolvent);
                        record(&resolvent, &mut proofs);
                        added.push(resolvent);
                        if ground && !proofs.is_empty() {
                            stats.clauses_kept += added.len();
                            break 'passes;
                        }
                        if clauses.len() + added.len() >= self.config.max_clauses {
                            stats.clauses_kept += added.len();
                            return Ok(self.limited(Limit::Clauses, proofs, stats, start));
                        }
                    }
                }
            }

            if added.is_empty() {
                debug!("resolution closure saturated after {} passes", stats.steps);
                stats.converged = true;
                break;
            }
            debug!("pass {} added {} clauses", stats.steps, added.len());
            stats.clauses_kept += added.len();
            frontier = clauses.len();
            clauses.extend(added);
        }

        stats.elapsed_ms = start.elapsed().as_millis();
        info!(
            "resolution closure found {} proof(s) after {} passes",
            proofs.len(),
            stats.steps
        );
        Ok(InferenceResult::completed(proofs, stats))
    }
}

impl ResolutionClosure {
    fn limited(
        &self,
        limit: Limit,
        proofs: Vec<Proof>,
        mut stats: InferenceStats,
        start: Instant,
    ) -> InferenceResult {
        warn!("resolution closure stopped at the {} bound", limit);
        stats.elapsed_ms = start.elapsed().as_millis();
        InferenceResult::limited(limit, proofs, stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prover::proof::{ProofRule, Termination};
    use crate::reasoning::kb_library::{
        abc_equality_knowledge_base, kings_knowledge_base, loves_animal_knowledge_base,
        weapons_knowledge_base,
    };

    fn ask(kb: &mut KnowledgeBase, config: StrategyConfig, query: &str) -> InferenceResult {
        kb.set_procedure(Box::new(ResolutionClosure::new(config)));
        kb.ask_text(query).unwrap()
    }

    #[test]
    fn test_kings() {
        let mut kb = kings_knowledge_base();
        let result = ask(&mut kb, StrategyConfig::default(), "Evil(x)");
        assert!(result.is_true());
        assert_eq!(result.proofs().len(), 1);
        assert_eq!(result.proofs()[0].answer_bindings().to_string(), "{x=John}");
        let last = result.proofs()[0].steps().last().unwrap();
        assert_eq!(last.rule, ProofRule::Resolution);
    }

    #[test]
    fn test_not_entailed_saturates() {
        let mut kb = kings_knowledge_base();
        let result = ask(&mut kb, StrategyConfig::default(), "Evil(Richard)");
        assert!(result.is_possibly_false());
        assert!(result.stats().converged);
    }

    #[test]
    fn test_weapons() {
        let mut kb = weapons_knowledge_base();
        let result = ask(&mut kb, StrategyConfig::default(), "Criminal(West)");
        assert!(result.is_true());
        assert_eq!(result.proofs()[0].steps().last().unwrap().statement, "[]");
    }

    #[test]
    fn test_equality_axioms() {
        let mut kb = abc_equality_knowledge_base(true);
        let result = ask(&mut kb, StrategyConfig::default(), "A = C");
        assert!(result.is_true());
    }

    #[test]
    fn test_pass_limit() {
        let mut kb = KnowledgeBase::new();
        kb.tell_text("Nat(Zero)").unwrap();
        kb.tell_text("FORALL n (Nat(n) => Nat(S(n)))").unwrap();
        let config = StrategyConfig {
            max_steps: 3,
            ..StrategyConfig::default()
        };
        let result = ask(&mut kb, config, "Nat(x) AND Even(x)");
        assert!(result.is_unknown_due_to_limit());
        assert_eq!(result.termination(), Termination::ResourceLimit(Limit::Steps));
    }

    #[test]
    fn test_time_limit_bounds_a_runaway_closure() {
        let mut kb = loves_animal_knowledge_base();
        let config = StrategyConfig {
            max_seconds: 1,
            max_clauses: usize::MAX,
            ..StrategyConfig::default()
        };
        let started = Instant::now();
        let result = ask(&mut kb, config, "Kills(Curiosity, Tuna)");
        assert_eq!(result.termination(), Termination::ResourceLimit(Limit::Seconds));
        assert!(started.elapsed().as_secs() < 20);
    }

    #[test]
    fn test_clause_limit() {
        let mut kb = KnowledgeBase::new();
        kb.tell_text("Nat(Zero)").unwrap();
        kb.tell_text("FORALL n (Nat(n) => Nat(S(n)))").unwrap();
        let config = StrategyConfig {
            max_clauses: 8,
            ..StrategyConfig::default()
        };
        let result = ask(&mut kb, config, "Nat(x) AND Even(x)");
        assert_eq!(result.termination(), Termination::ResourceLimit(Limit::Clauses));
    }
}
