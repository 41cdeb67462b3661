//! Forward chaining over definite clauses
//!
//! Implements bottom-up, data-driven inference:
//! 1. Collect answers from the known facts
//! 2. Join each rule's premises against the working fact index
//! 3. Add conclusions that are not renamings of known facts, collecting
//!    those that answer the query
//! 4. Stop at a fixpoint, after `max_steps` passes, or once `max_proofs`
//!    answers are found (when it is non-zero)

use std::collections::HashMap;
use std::time::Instant;

use indexmap::IndexMap;
use log::{debug, info, warn};

use super::strategy::{check_definite, InferenceProcedure, StrategyConfig};
use crate::error::{FolError, FolResult};
use crate::prover::clause::{Clause, Literal};
use crate::prover::proof::{InferenceResult, InferenceStats, Limit, Proof, ProofBuilder, ProofRule};
use crate::prover::sentence::Sentence;
use crate::prover::term::Atom;
use crate::prover::unify::{match_atom, unify, Substitution};
use crate::store::{FactIndex, KnowledgeBase};

/// How a derived fact was obtained
#[derive(Debug, Clone)]
struct Firing {
    rule: Clause,
    /// Rule premises under the unifier
    premises: Vec<Atom>,
    unifier: Substitution,
}

/// Forward chaining inference procedure
#[derive(Debug, Clone, Default)]
pub struct ForwardChaining {
    config: StrategyConfig,
}

impl ForwardChaining {
    pub fn new(config: StrategyConfig) -> Self {
        ForwardChaining { config }
    }

    pub fn config(&self) -> &StrategyConfig {
        &self.config
    }

    fn enough(&self, proofs: &[Proof]) -> bool {
        self.config.max_proofs > 0 && proofs.len() >= self.config.max_proofs
    }

    /// Record a proof for each candidate fact that answers the goal
    fn collect_answers(
        &self,
        goal: &Atom,
        candidates: impl IntoIterator<Item = Literal>,
        firings: &IndexMap<Atom, Firing>,
        seen: &mut Vec<Substitution>,
        proofs: &mut Vec<Proof>,
    ) {
        let goal_vars = goal.variables();
        for fact in candidates {
            if self.enough(proofs) {
                return;
            }
            let Some(theta) = unify(goal, &fact.atom, &Substitution::new()) else {
                continue;
            };
            let bindings = theta.restrict(&goal_vars);
            if seen.contains(&bindings) {
                continue;
            }
            seen.push(bindings.clone());
            proofs.push(build_proof(&fact.atom, firings, bindings));
        }
    }
}

impl InferenceProcedure for ForwardChaining {
    fn name(&self) -> &str {
        "forward-chaining"
    }

    fn requires_definite_clauses(&self) -> bool {
        true
    }

    fn ask(&self, kb: &KnowledgeBase, query: &Sentence) -> FolResult<InferenceResult> {
        check_definite(self.name(), kb)?;
        let goal = query
            .as_atom()
            .cloned()
            .ok_or_else(|| FolError::unsupported_query(self.name(), query))?;

        let start = Instant::now();
        let mut stats = InferenceStats::default();
        let mut facts = kb.facts().clone();
        let mut firings: IndexMap<Atom, Firing> = IndexMap::new();

        let mut seen: Vec<Substitution> = Vec::new();
        let mut proofs: Vec<Proof> = Vec::new();
        let known: Vec<Literal> = facts
            .candidates(true, goal.symbolic_name())
            .to_vec();
        self.collect_answers(&goal, known, &firings, &mut seen, &mut proofs);

        let mut ctx = kb.derivation_context();
        loop {
            if self.enough(&proofs) {
                debug!("forward chaining has {} answer(s), stopping", proofs.len());
                break;
            }
            if stats.steps >= self.config.max_steps {
                warn!("forward chaining stopped after {} passes", stats.steps);
                stats.elapsed_ms = start.elapsed().as_millis();
                return Ok(InferenceResult::limited(Limit::Steps, proofs, stats));
            }
            stats.steps += 1;

            let mut pass = FactIndex::new();
            let mut added: Vec<Literal> = Vec::new();
            for rule in kb.implication_clauses() {
                let rule = ctx.rename_clause(rule);
                let Some(conclusion) = rule.positive_literal().cloned() else {
                    continue;
                };
                let premises: Vec<Literal> = rule.negative_literals().map(|l| l.negate()).collect();

                for theta in facts.fetch_all(&premises) {
                    stats.clauses_generated += 1;
                    let derived = theta.apply_literal(&conclusion);
                    if facts.is_renaming(&derived) || pass.is_renaming(&derived) {
                        continue;
                    }
                    firings.insert(
                        derived.atom.clone(),
                        Firing {
                            rule: rule.clone(),
                            premises: premises.iter().map(|p| theta.apply_atom(&p.atom)).collect(),
                            unifier: theta.restrict(&rule.variables()),
                        },
                    );
                    pass.insert(derived.clone());
                    added.push(derived);
                }
            }

            if added.is_empty() {
                debug!("forward chaining reached a fixpoint after {} passes", stats.steps);
                stats.converged = true;
                break;
            }

            debug!("pass {} derived {} facts", stats.steps, added.len());
            stats.clauses_kept += added.len();
            for fact in &added {
                facts.insert(fact.clone());
            }
            self.collect_answers(&goal, added, &firings, &mut seen, &mut proofs);
        }

        info!("forward chaining found {} answer(s)", proofs.len());
        stats.elapsed_ms = start.elapsed().as_millis();
        Ok(InferenceResult::completed(proofs, stats))
    }
}

/// The derived fact a premise was matched against
///
/// Only facts derived before `before` are considered, so the proof graph
/// stays acyclic. Premises that match no derived fact are told facts.
fn source(firings: &IndexMap<Atom, Firing>, premise: &Atom, before: usize) -> Atom {
    if let Some(i) = firings.get_index_of(premise) {
        if i < before {
            return premise.clone();
        }
    }
    firings
        .keys()
        .take(before)
        .find(|key| match_atom(key, premise, &mut Substitution::new()))
        .cloned()
        .unwrap_or_else(|| premise.clone())
}

/// Emit premises before conclusions, each fact once
fn build_proof(target: &Atom, firings: &IndexMap<Atom, Firing>, bindings: Substitution) -> Proof {
    let mut builder = ProofBuilder::new();
    let mut numbers: HashMap<Atom, usize> = HashMap::new();
    let mut rules: HashMap<String, usize> = HashMap::new();
    let mut stack: Vec<(Atom, bool)> = vec![(target.clone(), false)];

    while let Some((atom, expanded)) = stack.pop() {
        if numbers.contains_key(&atom) {
            continue;
        }
        let Some((index, _, firing)) = firings.get_full(&atom) else {
            let n = builder.push(atom.to_string(), ProofRule::Premise, Vec::new(), None);
            numbers.insert(atom, n);
            continue;
        };
        let parents: Vec<Atom> = firing
            .premises
            .iter()
            .map(|p| source(firings, p, index))
            .collect();
        if !expanded {
            stack.push((atom, true));
            for parent in parents.into_iter().rev() {
                if !numbers.contains_key(&parent) {
                    stack.push((parent, false));
                }
            }
            continue;
        }

        let rule_text = firing.rule.to_string();
        let rule_step = match rules.get(&rule_text) {
            Some(&n) => n,
            None => {
                let n = builder.push(rule_text.clone(), ProofRule::Premise, Vec::new(), None);
                rules.insert(rule_text, n);
                n
            }
        };
        let mut justification = vec![rule_step];
        justification.extend(parents.iter().filter_map(|p| numbers.get(p).copied()));
        let detail = Some(firing.unifier.to_string()).filter(|_| !firing.unifier.is_empty());
        let n = builder.push(atom.to_string(), ProofRule::ModusPonens, justification, detail);
        numbers.insert(atom, n);
    }

    builder.build(bindings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prover::proof::Termination;
    use crate::reasoning::kb_library::{kings_knowledge_base, weapons_knowledge_base};

    fn ask(kb: &mut KnowledgeBase, query: &str) -> InferenceResult {
        kb.set_procedure(Box::new(ForwardChaining::default()));
        kb.ask_text(query).unwrap()
    }

    #[test]
    fn test_known_facts_are_answers() {
        let mut kb = kings_knowledge_base();
        let result = ask(&mut kb, "King(x)");
        assert!(result.is_true());
        assert_eq!(result.proofs().len(), 2);
        assert!(result.stats().converged);
        assert_eq!(result.proofs()[0].steps()[0].rule, ProofRule::Premise);
    }

    #[test]
    fn test_told_and_derived_answers_are_both_found() {
        let mut kb = kings_knowledge_base();
        kb.tell_text("Evil(Bob)").unwrap();
        let result = ask(&mut kb, "Evil(x)");
        let answers: Vec<String> = result
            .proofs()
            .iter()
            .map(|p| p.answer_bindings().to_string())
            .collect();
        assert_eq!(answers, vec!["{x=Bob}", "{x=John}"]);
        assert!(result.stats().converged);

        kb.set_procedure(Box::new(crate::reasoning::BackwardChaining::default()));
        let mut chained: Vec<String> = kb
            .ask_text("Evil(x)")
            .unwrap()
            .proofs()
            .iter()
            .map(|p| p.answer_bindings().to_string())
            .collect();
        chained.sort();
        assert_eq!(chained, answers);
    }

    #[test]
    fn test_proof_limit_stops_early() {
        let mut kb = kings_knowledge_base();
        kb.tell_text("Evil(Bob)").unwrap();
        kb.set_procedure(Box::new(ForwardChaining::new(StrategyConfig {
            max_proofs: 1,
            ..StrategyConfig::default()
        })));
        let result = kb.ask_text("Evil(x)").unwrap();
        assert_eq!(result.proofs().len(), 1);
        assert_eq!(result.proofs()[0].answer_bindings().to_string(), "{x=Bob}");
        assert_eq!(result.stats().steps, 0);
        assert_eq!(result.termination(), Termination::Completed);
    }

    #[test]
    fn test_kings_evil() {
        let mut kb = kings_knowledge_base();
        let result = ask(&mut kb, "Evil(x)");
        assert!(result.is_true());
        assert_eq!(result.proofs().len(), 1);
        let proof = &result.proofs()[0];
        assert_eq!(proof.answer_bindings().to_string(), "{x=John}");

        let last = proof.steps().last().unwrap();
        assert_eq!(last.statement, "Evil(John)");
        assert_eq!(last.rule, ProofRule::ModusPonens);
        assert_eq!(last.justification.len(), 3);
        assert!(last.justification.iter().all(|&j| j < last.number));
    }

    #[test]
    fn test_weapons_criminal() {
        let mut kb = weapons_knowledge_base();
        let result = ask(&mut kb, "Criminal(x)");
        assert!(result.is_true());
        assert_eq!(result.proofs()[0].answer_bindings().to_string(), "{x=West}");
        assert_eq!(
            result.proofs()[0].steps().last().unwrap().statement,
            "Criminal(West)"
        );
    }

    #[test]
    fn test_not_entailed_reaches_fixpoint() {
        let mut kb = kings_knowledge_base();
        let result = ask(&mut kb, "Evil(Richard)");
        assert!(!result.is_true());
        assert_eq!(result.termination(), Termination::Completed);
        assert!(result.stats().converged);
    }

    #[test]
    fn test_step_limit() {
        let mut kb = KnowledgeBase::new();
        kb.tell_text("Nat(Zero)").unwrap();
        kb.tell_text("FORALL n (Nat(n) => Nat(S(n)))").unwrap();
        kb.set_procedure(Box::new(ForwardChaining::new(StrategyConfig {
            max_steps: 3,
            ..StrategyConfig::default()
        })));
        let result = kb.ask_text("Nat(Q)").unwrap();
        assert!(result.is_unknown_due_to_limit());
        assert_eq!(result.termination(), Termination::ResourceLimit(Limit::Steps));
    }

    #[test]
    fn test_rejects_non_atomic_query() {
        let mut kb = kings_knowledge_base();
        kb.set_procedure(Box::new(ForwardChaining::default()));
        let err = kb.ask_text("King(x) AND Greedy(x)").unwrap_err();
        assert_eq!(err.code, crate::error::ErrorCode::UnsupportedQuery);
    }
}
