//! Model elimination
//!
//! A connection-style refutation procedure. A chain starts from a clause
//! of the negated query; its literals are open goals. Each goal is closed
//! either by reduction against a complementary ancestor or by extension
//! with a complementary literal of a (renamed) clause, whose remaining
//! literals become new goals below it.
//!
//! Search is depth-first on an explicit stack, with iterative deepening
//! on the number of extensions. Regularity prunes any goal that repeats
//! one of its ancestors.

use std::time::Instant;

use log::{debug, info, warn};

use super::strategy::{is_answer_literal, Deadline, InferenceProcedure, NegatedQuery};
use crate::error::FolResult;
use crate::prover::clause::{Clause, Literal};
use crate::prover::proof::{InferenceResult, InferenceStats, Limit, Proof, ProofBuilder, ProofRule};
use crate::prover::sentence::Sentence;
use crate::prover::standardize::StandardizeApart;
use crate::prover::term::{Atom, Variable};
use crate::prover::unify::{unify, Substitution};
use crate::store::KnowledgeBase;

/// Configuration for model elimination
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModelEliminationConfig {
    /// Maximum number of extension steps in one chain
    pub max_depth: usize,
    /// Maximum number of goal expansions over the whole search
    pub max_inferences: usize,
    /// Raise the extension bound one step at a time up to `max_depth`
    pub iterative_deepening: bool,
    /// Wall-clock limit (0 = none)
    pub max_seconds: u64,
}

impl Default for ModelEliminationConfig {
    fn default() -> Self {
        ModelEliminationConfig {
            max_depth: 32,
            max_inferences: 100000,
            iterative_deepening: true,
            max_seconds: 30,
        }
    }
}

#[derive(Debug, Clone)]
struct OpenGoal {
    literal: Literal,
    /// Goals this one descends from, outermost first
    ancestors: Vec<Literal>,
    /// Trail entry of the extension that introduced this goal
    parent: Option<usize>,
}

#[derive(Debug, Clone)]
enum Closing {
    Extension(Clause),
    Reduction(Literal),
}

#[derive(Debug, Clone)]
struct TrailEntry {
    goal: Literal,
    closing: Closing,
    parent: Option<usize>,
}

/// A partial refutation
#[derive(Debug, Clone)]
struct Chain {
    start: Clause,
    /// Open goals; the frontmost goal is last
    goals: Vec<OpenGoal>,
    theta: Substitution,
    extensions: usize,
    trail: Vec<TrailEntry>,
    /// Answer atoms of the query clauses used so far
    answers: Vec<Atom>,
}

impl Chain {
    fn start(clause: Clause) -> Chain {
        let (answers, goals) = split_answers(&clause);
        Chain {
            goals: goals
                .into_iter()
                .rev()
                .map(|literal| OpenGoal {
                    literal,
                    ancestors: Vec::new(),
                    parent: None,
                })
                .collect(),
            start: clause,
            theta: Substitution::new(),
            extensions: 0,
            trail: Vec::new(),
            answers,
        }
    }

    fn close(&self, goal: &OpenGoal, closing: Closing, theta: Substitution) -> Chain {
        let mut next = self.clone();
        next.theta = theta;
        next.trail.push(TrailEntry {
            goal: goal.literal.clone(),
            closing,
            parent: goal.parent,
        });
        next
    }
}

fn split_answers(clause: &Clause) -> (Vec<Atom>, Vec<Literal>) {
    let (answers, goals): (Vec<&Literal>, Vec<&Literal>) =
        clause.literals().iter().partition(|l| is_answer_literal(l));
    (
        answers.into_iter().map(|l| l.atom.clone()).collect(),
        goals.into_iter().cloned().collect(),
    )
}

fn complementary(goal: &Literal, other: &Literal) -> bool {
    goal.negated != other.negated && goal.atom.symbolic_name() == other.atom.symbolic_name()
}

/// How one bounded search ended
enum Outcome {
    Exhausted { pruned: bool },
    Stopped(Limit),
}

/// The model elimination inference procedure
#[derive(Debug, Clone, Default)]
pub struct ModelElimination {
    config: ModelEliminationConfig,
}

impl ModelElimination {
    pub fn new(config: ModelEliminationConfig) -> Self {
        ModelElimination { config }
    }

    pub fn config(&self) -> &ModelEliminationConfig {
        &self.config
    }

    /// Alternatives for the frontmost goal: reductions, then extensions
    fn expand(
        &self,
        matrix: &[Clause],
        chain: &Chain,
        goal: &OpenGoal,
        bound: usize,
        ctx: &mut StandardizeApart,
        pruned: &mut bool,
    ) -> Vec<Chain> {
        let theta = &chain.theta;
        let literal = theta.apply_literal(&goal.literal);
        if goal
            .ancestors
            .iter()
            .any(|a| theta.apply_literal(a) == literal)
        {
            return Vec::new();
        }

        let mut alternatives = Vec::new();
        for ancestor in goal.ancestors.iter().rev() {
            if !complementary(&goal.literal, ancestor) {
                continue;
            }
            if let Some(unifier) = unify(&goal.literal.atom, &ancestor.atom, theta) {
                alternatives.push(chain.close(goal, Closing::Reduction(ancestor.clone()), unifier));
            }
        }

        let candidates = matrix.iter().filter(|clause| {
            clause
                .literals()
                .iter()
                .any(|l| !is_answer_literal(l) && complementary(&goal.literal, l))
        });
        for clause in candidates {
            if chain.extensions >= bound {
                *pruned = true;
                break;
            }
            let renamed = ctx.rename_clause(clause);
            for (k, connection) in renamed.literals().iter().enumerate() {
                if is_answer_literal(connection) || !complementary(&goal.literal, connection) {
                    continue;
                }
                let Some(unifier) = unify(&goal.literal.atom, &connection.atom, theta) else {
                    continue;
                };
                let mut next = chain.close(goal, Closing::Extension(renamed.clone()), unifier);
                next.extensions += 1;
                let index = next.trail.len() - 1;
                let mut ancestors = goal.ancestors.clone();
                ancestors.push(goal.literal.clone());

                let rest: Vec<&Literal> = renamed
                    .literals()
                    .iter()
                    .enumerate()
                    .filter(|&(i, _)| i != k)
                    .map(|(_, l)| l)
                    .collect();
                for lit in rest.iter().rev() {
                    if is_answer_literal(lit) {
                        next.answers.push(lit.atom.clone());
                    } else {
                        next.goals.push(OpenGoal {
                            literal: (*lit).clone(),
                            ancestors: ancestors.clone(),
                            parent: Some(index),
                        });
                    }
                }
                alternatives.push(next);
            }
        }

        alternatives
    }

    /// Depth-first search with a fixed extension bound
    #[allow(clippy::too_many_arguments)]
    fn search(
        &self,
        matrix: &[Clause],
        starts: &[Clause],
        negated: &NegatedQuery,
        bound: usize,
        ctx: &mut StandardizeApart,
        deadline: &Deadline,
        stats: &mut InferenceStats,
        found: &mut Vec<(Substitution, Proof)>,
    ) -> Outcome {
        let mut pruned = false;
        let mut stack: Vec<Chain> = starts.iter().rev().cloned().map(Chain::start).collect();

        while let Some(mut chain) = stack.pop() {
            if deadline.expired() {
                return Outcome::Stopped(Limit::Seconds);
            }
            if stats.steps >= self.config.max_inferences {
                return Outcome::Stopped(Limit::Inferences);
            }
            stats.steps += 1;
            stats.max_depth_reached = stats.max_depth_reached.max(chain.extensions);

            let Some(goal) = chain.goals.pop() else {
                let Some(bindings) = answer_bindings(&chain, &negated.answer_vars) else {
                    continue;
                };
                if found.iter().any(|(b, _)| *b == bindings) {
                    continue;
                }
                debug!("model elimination closed a chain with {}", bindings);
                let proof = build_proof(&chain, bindings.clone());
                found.push((bindings, proof));
                if negated.is_ground() {
                    return Outcome::Exhausted { pruned };
                }
                continue;
            };

            let alternatives = self.expand(matrix, &chain, &goal, bound, ctx, &mut pruned);
            stats.clauses_generated += alternatives.len();
            stack.extend(alternatives.into_iter().rev());
        }

        Outcome::Exhausted { pruned }
    }
}

/// Bindings of a closed chain; `None` for a disjunctive answer
fn answer_bindings(chain: &Chain, vars: &[Variable]) -> Option<Substitution> {
    let mut atoms: Vec<Atom> = chain
        .answers
        .iter()
        .map(|a| chain.theta.apply_atom(a))
        .collect();
    atoms.sort();
    atoms.dedup();
    match atoms.as_slice() {
        [] => Some(Substitution::new()),
        [atom] => Some(vars.iter().cloned().zip(atom.args.iter().cloned()).collect()),
        _ => None,
    }
}

fn build_proof(chain: &Chain, bindings: Substitution) -> Proof {
    let theta = &chain.theta;
    let mut builder = ProofBuilder::new();
    let start = builder.push(
        chain.start.apply_substitution(theta).to_string(),
        ProofRule::Goal,
        Vec::new(),
        None,
    );
    let mut numbers = Vec::with_capacity(chain.trail.len());

    for entry in &chain.trail {
        let parent = entry.parent.map_or(start, |p| numbers[p]);
        let statement = theta.apply_literal(&entry.goal).to_string();
        let number = match &entry.closing {
            Closing::Extension(clause) => {
                let premise = builder.push(
                    clause.apply_substitution(theta).to_string(),
                    ProofRule::Premise,
                    Vec::new(),
                    None,
                );
                builder.push(statement, ProofRule::Extension, vec![parent, premise], None)
            }
            Closing::Reduction(ancestor) => builder.push(
                statement,
                ProofRule::Reduction,
                vec![parent],
                Some(format!("with ancestor {}", theta.apply_literal(ancestor))),
            ),
        };
        numbers.push(number);
    }

    builder.build(bindings)
}

impl InferenceProcedure for ModelElimination {
    fn name(&self) -> &str {
        "model-elimination"
    }

    fn ask(&self, kb: &KnowledgeBase, query: &Sentence) -> FolResult<InferenceResult> {
        let start = Instant::now();
        let deadline = Deadline::after_seconds(self.config.max_seconds);
        let mut ctx = kb.derivation_context();
        let negated = NegatedQuery::new(query, &mut ctx);

        let mut matrix: Vec<Clause> = kb.clauses().iter().cloned().collect();
        matrix.extend(negated.clauses.iter().cloned());
        matrix.sort_by_key(|c| c.len());

        let mut stats = InferenceStats::default();
        let mut found: Vec<(Substitution, Proof)> = Vec::new();
        let first = if self.config.iterative_deepening { 1 } else { self.config.max_depth };
        info!(
            "model elimination over {} clauses, extension bound up to {}",
            matrix.len(),
            self.config.max_depth
        );

        let mut limit = None;
        for bound in first..=self.config.max_depth {
            debug!("model elimination extension bound {}", bound);
            let outcome = self.search(
                &matrix,
                &negated.clauses,
                &negated,
                bound,
                &mut ctx,
                &deadline,
                &mut stats,
                &mut found,
            );
            match outcome {
                Outcome::Stopped(hit) => {
                    limit = Some(hit);
                    break;
                }
                Outcome::Exhausted { .. } if !found.is_empty() => break,
                Outcome::Exhausted { pruned: false } => {
                    stats.converged = true;
                    break;
                }
                Outcome::Exhausted { pruned: true } => {
                    if bound == self.config.max_depth {
                        limit = Some(Limit::Depth);
                    }
                }
            }
        }

        stats.elapsed_ms = start.elapsed().as_millis();
        let proofs: Vec<Proof> = found.into_iter().map(|(_, proof)| proof).collect();
        info!(
            "model elimination found {} proof(s) in {} inferences",
            proofs.len(),
            stats.steps
        );
        Ok(match limit {
            Some(limit) => {
                warn!("model elimination stopped at the {} bound", limit);
                InferenceResult::limited(limit, proofs, stats)
            }
            None => InferenceResult::completed(proofs, stats),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prover::proof::Termination;
    use crate::prover::term::Term;
    use crate::reasoning::kb_library::{
        abc_equality_knowledge_base, kings_knowledge_base, loves_animal_knowledge_base,
        weapons_knowledge_base,
    };

    fn ask(kb: &mut KnowledgeBase, config: ModelEliminationConfig, query: &str) -> InferenceResult {
        kb.set_procedure(Box::new(ModelElimination::new(config)));
        kb.ask_text(query).unwrap()
    }

    fn nat_knowledge_base() -> KnowledgeBase {
        let mut kb = KnowledgeBase::new();
        kb.tell_text("Nat(Zero)").unwrap();
        kb.tell_text("FORALL n (Nat(n) => Nat(S(n)))").unwrap();
        kb
    }

    #[test]
    fn test_kings() {
        let mut kb = kings_knowledge_base();
        let result = ask(&mut kb, ModelEliminationConfig::default(), "Evil(John)");
        assert!(result.is_true());
        let steps = result.proofs()[0].steps();
        assert_eq!(steps[0].rule, ProofRule::Goal);
        assert!(steps.iter().any(|s| s.rule == ProofRule::Extension));

        let result = ask(&mut kb, ModelEliminationConfig::default(), "Evil(x)");
        assert_eq!(result.proofs().len(), 1);
        assert_eq!(result.proofs()[0].answer_bindings().to_string(), "{x=John}");
    }

    #[test]
    fn test_not_entailed_exhausts_search() {
        let mut kb = kings_knowledge_base();
        let result = ask(&mut kb, ModelEliminationConfig::default(), "Evil(Richard)");
        assert!(result.is_possibly_false());
        assert!(result.stats().converged);
    }

    #[test]
    fn test_weapons() {
        let mut kb = weapons_knowledge_base();
        let result = ask(&mut kb, ModelEliminationConfig::default(), "Criminal(x)");
        assert!(result.is_true());
        assert_eq!(result.proofs()[0].answer_bindings().to_string(), "{x=West}");
    }

    #[test]
    fn test_loves_animal() {
        let mut kb = loves_animal_knowledge_base();
        let result = ask(&mut kb, ModelEliminationConfig::default(), "Kills(Curiosity, Tuna)");
        assert!(result.is_true());
        let proof = &result.proofs()[0];
        for step in proof.steps() {
            assert!(step.justification.iter().all(|&j| j < step.number));
        }
    }

    #[test]
    fn test_equality_axioms() {
        let mut kb = abc_equality_knowledge_base(true);
        let result = ask(&mut kb, ModelEliminationConfig::default(), "A = C");
        assert!(result.is_true());
    }

    #[test]
    fn test_depth_limit() {
        let mut kb = nat_knowledge_base();
        let config = ModelEliminationConfig {
            max_depth: 4,
            ..ModelEliminationConfig::default()
        };
        let result = ask(&mut kb, config, "Nat(x) AND Even(x)");
        assert!(result.is_unknown_due_to_limit());
        assert_eq!(result.termination(), Termination::ResourceLimit(Limit::Depth));
    }

    #[test]
    fn test_inference_limit() {
        let mut kb = nat_knowledge_base();
        let config = ModelEliminationConfig {
            max_inferences: 50,
            ..ModelEliminationConfig::default()
        };
        let result = ask(&mut kb, config, "Nat(x) AND Even(x)");
        assert_eq!(
            result.termination(),
            Termination::ResourceLimit(Limit::Inferences)
        );
    }

    #[test]
    fn test_disjunctive_answers_are_skipped() {
        let mut chain = Chain::start(Clause::empty());
        chain.answers = vec![
            Atom::new("$Answer", vec![Term::constant("A")]),
            Atom::new("$Answer", vec![Term::constant("B")]),
        ];
        assert!(answer_bindings(&chain, &[Variable::new("x")]).is_none());
        chain.answers.pop();
        assert_eq!(
            answer_bindings(&chain, &[Variable::new("x")]).unwrap().to_string(),
            "{x=A}"
        );
    }
}
