//! Backward chaining over definite clauses
//!
//! Implements top-down, goal-directed query answering:
//! 1. Start with the query atoms as goals
//! 2. Match the next goal against the told facts
//! 3. Otherwise reduce it with a rule whose conclusion unifies
//! 4. Continue depth-first until no goals remain
//!
//! This is SLD resolution on an explicit stack of frames. Facts are
//! tried before rules and every proof is enumerated.

use std::time::Instant;

use indexmap::IndexSet;
use log::{debug, info, warn};

use super::strategy::{check_definite, query_atoms, InferenceProcedure, StrategyConfig};
use crate::error::FolResult;
use crate::prover::clause::Clause;
use crate::prover::proof::{InferenceResult, InferenceStats, Limit, Proof, ProofBuilder, ProofRule};
use crate::prover::sentence::Sentence;
use crate::prover::standardize::StandardizeApart;
use crate::prover::term::{Atom, Variable};
use crate::prover::unify::{unify, Substitution};
use crate::store::KnowledgeBase;

/// A goal waiting to be solved
#[derive(Clone, Debug)]
struct Goal {
    atom: Atom,
    /// Trail entry of the rule that introduced this goal
    parent: Option<usize>,
    depth: usize,
}

#[derive(Clone, Debug)]
enum Support {
    Fact,
    Rule(Clause),
}

/// A solved goal, recorded in the order goals were solved
#[derive(Clone, Debug)]
struct TrailEntry {
    goal: Atom,
    support: Support,
    parent: Option<usize>,
}

#[derive(Clone, Debug)]
struct Frame {
    /// Remaining goals; the next goal is last
    goals: Vec<Goal>,
    theta: Substitution,
    trail: Vec<TrailEntry>,
}

impl Frame {
    fn solve(&self, goal: &Goal, support: Support, theta: Substitution) -> Frame {
        let mut trail = self.trail.clone();
        trail.push(TrailEntry {
            goal: goal.atom.clone(),
            support,
            parent: goal.parent,
        });
        Frame {
            goals: self.goals.clone(),
            theta,
            trail,
        }
    }
}

/// Backward chaining inference procedure
#[derive(Debug, Clone, Default)]
pub struct BackwardChaining {
    config: StrategyConfig,
}

impl BackwardChaining {
    pub fn new(config: StrategyConfig) -> Self {
        BackwardChaining { config }
    }

    pub fn config(&self) -> &StrategyConfig {
        &self.config
    }

    /// Alternatives for the next goal, facts first
    fn expand(
        &self,
        kb: &KnowledgeBase,
        frame: &Frame,
        goal: &Goal,
        ctx: &mut StandardizeApart,
    ) -> Vec<Frame> {
        let atom = frame.theta.apply_atom(&goal.atom);
        let mut alternatives = Vec::new();

        for fact in kb.facts().candidates(true, atom.symbolic_name()) {
            let fact = if fact.is_ground() {
                fact.clone()
            } else {
                ctx.standardize_literals(std::slice::from_ref(fact))
                    .renamed
                    .remove(0)
            };
            if let Some(theta) = unify(&atom, &fact.atom, &frame.theta) {
                alternatives.push(frame.solve(goal, Support::Fact, theta));
            }
        }

        let rules = kb.implication_clauses().iter().filter(|rule| {
            rule.positive_literal()
                .map_or(false, |head| head.atom.symbolic_name() == atom.symbolic_name())
        });
        for rule in rules {
            let rule = ctx.rename_clause(rule);
            let Some(head) = rule.positive_literal() else {
                continue;
            };
            let Some(theta) = unify(&atom, &head.atom, &frame.theta) else {
                continue;
            };
            let body: Vec<Atom> = rule.negative_literals().map(|l| l.atom.clone()).collect();
            let mut next = frame.solve(goal, Support::Rule(rule), theta);
            let index = next.trail.len() - 1;
            next.goals.extend(body.into_iter().rev().map(|atom| Goal {
                atom,
                parent: Some(index),
                depth: goal.depth + 1,
            }));
            alternatives.push(next);
        }

        alternatives
    }
}

impl InferenceProcedure for BackwardChaining {
    fn name(&self) -> &str {
        "backward-chaining"
    }

    fn requires_definite_clauses(&self) -> bool {
        true
    }

    fn ask(&self, kb: &KnowledgeBase, query: &Sentence) -> FolResult<InferenceResult> {
        check_definite(self.name(), kb)?;
        let atoms = query_atoms(self.name(), query)?;
        let answer_vars: IndexSet<Variable> = query.free_variables();

        let start = Instant::now();
        let mut stats = InferenceStats::default();
        let mut ctx = kb.derivation_context();
        let mut proofs: Vec<Proof> = Vec::new();
        let mut seen: Vec<Substitution> = Vec::new();
        let mut limit: Option<Limit> = None;
        let mut pruned = false;

        let mut stack = vec![Frame {
            goals: atoms
                .into_iter()
                .rev()
                .map(|atom| Goal {
                    atom,
                    parent: None,
                    depth: 0,
                })
                .collect(),
            theta: Substitution::new(),
            trail: Vec::new(),
        }];

        while let Some(mut frame) = stack.pop() {
            if stats.steps >= self.config.max_steps {
                warn!("backward chaining stopped after {} expansions", stats.steps);
                limit = Some(Limit::Steps);
                break;
            }
            stats.steps += 1;

            let Some(goal) = frame.goals.pop() else {
                let bindings = frame.theta.restrict(&answer_vars);
                if seen.contains(&bindings) {
                    continue;
                }
                debug!("backward chaining proved {}", bindings);
                seen.push(bindings.clone());
                proofs.push(build_proof(&frame, bindings));
                if self.config.max_proofs > 0 && proofs.len() >= self.config.max_proofs {
                    if !stack.is_empty() {
                        limit = Some(Limit::Proofs);
                    }
                    break;
                }
                continue;
            };

            if goal.depth > self.config.max_depth {
                pruned = true;
                continue;
            }
            stats.max_depth_reached = stats.max_depth_reached.max(goal.depth);

            let alternatives = self.expand(kb, &frame, &goal, &mut ctx);
            stats.clauses_generated += alternatives.len();
            stack.extend(alternatives.into_iter().rev());
        }

        stats.elapsed_ms = start.elapsed().as_millis();
        info!(
            "backward chaining found {} proof(s) in {} expansions",
            proofs.len(),
            stats.steps
        );
        let limit = limit.or(if pruned { Some(Limit::Depth) } else { None });
        Ok(match limit {
            Some(limit) => InferenceResult::limited(limit, proofs, stats),
            None => {
                stats.converged = true;
                InferenceResult::completed(proofs, stats)
            }
        })
    }
}

/// Children are solved after their parent, so walking the trail
/// backwards numbers every child first
fn build_proof(frame: &Frame, bindings: Substitution) -> Proof {
    let mut builder = ProofBuilder::new();
    let mut numbers: Vec<usize> = vec![0; frame.trail.len()];

    for (i, entry) in frame.trail.iter().enumerate().rev() {
        let statement = frame.theta.apply_atom(&entry.goal).to_string();
        numbers[i] = match &entry.support {
            Support::Fact => builder.push(statement, ProofRule::Premise, Vec::new(), None),
            Support::Rule(rule) => {
                let justification = frame
                    .trail
                    .iter()
                    .enumerate()
                    .filter(|(_, child)| child.parent == Some(i))
                    .map(|(j, _)| numbers[j])
                    .collect();
                builder.push(
                    statement,
                    ProofRule::BackChain,
                    justification,
                    Some(format!("by {}", rule)),
                )
            }
        };
    }

    builder.build(bindings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prover::proof::Termination;
    use crate::reasoning::kb_library::{kings_knowledge_base, weapons_knowledge_base};
    use crate::reasoning::ForwardChaining;

    fn ask(kb: &mut KnowledgeBase, query: &str) -> InferenceResult {
        kb.set_procedure(Box::new(BackwardChaining::default()));
        kb.ask_text(query).unwrap()
    }

    #[test]
    fn test_kings_ground_query() {
        let mut kb = kings_knowledge_base();
        let result = ask(&mut kb, "Evil(John)");
        assert!(result.is_true());
        assert_eq!(result.proofs().len(), 1);
        assert!(result.proofs()[0].answer_bindings().is_empty());
        assert_eq!(result.termination(), Termination::Completed);

        let steps = result.proofs()[0].steps();
        assert_eq!(steps.len(), 3);
        let last = steps.last().unwrap();
        assert_eq!(last.statement, "Evil(John)");
        assert_eq!(last.rule, ProofRule::BackChain);
        assert_eq!(last.justification, vec![2, 1]);
    }

    #[test]
    fn test_kings_not_entailed() {
        let mut kb = kings_knowledge_base();
        let result = ask(&mut kb, "Evil(Richard)");
        assert!(!result.is_true());
        assert!(result.is_possibly_false());
    }

    #[test]
    fn test_conjunctive_query_enumerates_answers() {
        let mut kb = kings_knowledge_base();
        let result = ask(&mut kb, "King(x) AND Greedy(x)");
        assert_eq!(result.proofs().len(), 1);
        assert_eq!(result.proofs()[0].answer_bindings().to_string(), "{x=John}");

        let result = ask(&mut kb, "King(x)");
        let answers: Vec<String> = result
            .proofs()
            .iter()
            .map(|p| p.answer_bindings().to_string())
            .collect();
        assert_eq!(answers, vec!["{x=John}", "{x=Richard}"]);
    }

    #[test]
    fn test_weapons_criminal() {
        let mut kb = weapons_knowledge_base();
        let result = ask(&mut kb, "Criminal(x)");
        assert!(result.is_true());
        assert_eq!(result.proofs().len(), 1);
        assert_eq!(result.proofs()[0].answer_bindings().to_string(), "{x=West}");
    }

    #[test]
    fn test_agrees_with_forward_chaining() {
        for query in ["Criminal(West)", "Hostile(Nono)", "Weapon(M1)", "Criminal(Nono)"] {
            let mut kb = weapons_knowledge_base();
            kb.set_procedure(Box::new(ForwardChaining::default()));
            let fc = kb.ask_text(query).unwrap().is_true();
            let bc = ask(&mut kb, query).is_true();
            assert_eq!(fc, bc, "disagreement on {}", query);
        }
    }

    #[test]
    fn test_depth_limit_marks_result() {
        let mut kb = KnowledgeBase::new();
        kb.tell_text("Nat(Zero)").unwrap();
        kb.tell_text("FORALL n (Nat(n) => Nat(S(n)))").unwrap();
        kb.set_procedure(Box::new(BackwardChaining::new(StrategyConfig {
            max_depth: 5,
            max_proofs: 0,
            ..StrategyConfig::default()
        })));
        let result = kb.ask_text("Nat(x)").unwrap();
        assert!(result.is_partial_result_due_to_limit());
        assert_eq!(result.termination(), Termination::ResourceLimit(Limit::Depth));
        assert_eq!(result.proofs().len(), 6);
    }

    #[test]
    fn test_proof_limit() {
        let mut kb = kings_knowledge_base();
        kb.set_procedure(Box::new(BackwardChaining::new(StrategyConfig {
            max_proofs: 1,
            ..StrategyConfig::default()
        })));
        let result = kb.ask_text("King(x)").unwrap();
        assert_eq!(result.proofs().len(), 1);
        assert_eq!(result.termination(), Termination::ResourceLimit(Limit::Proofs));
    }
}
