//! OTTER-style saturation prover
//!
//! Implements the "given clause" algorithm used by OTTER with a set of
//! support. The usable list starts with the knowledge base, the set of
//! support with the negated query. Each iteration picks the lightest
//! clause from the set of support, infers everything it can with the
//! usable list, simplifies the results and moves the given clause to
//! usable.

use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashSet};
use std::sync::Arc;
use std::time::Instant;

use log::{debug, info, warn};

use super::strategy::{Deadline, InferenceProcedure, NegatedQuery};
use crate::error::FolResult;
use crate::prover::clause::{Clause, Derivation, Literal};
use crate::prover::equality::{unit_equality, Demodulation, Paramodulation, DEFAULT_MAX_REWRITES};
use crate::prover::proof::{proof_from_clause, InferenceResult, InferenceStats, Limit, Proof};
use crate::prover::resolution::{factor_all, resolve_all};
use crate::prover::sentence::Sentence;
use crate::prover::standardize::StandardizeApart;
use crate::prover::term::{Atom, Term};
use crate::prover::unify::Substitution;
use crate::store::KnowledgeBase;

/// Resource bounds and inference switches for saturation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OtterConfig {
    /// Maximum number of usable plus set-of-support clauses
    pub max_clauses: usize,
    /// Maximum number of given clauses
    pub max_iterations: usize,
    /// Wall-clock limit (0 = none)
    pub max_seconds: u64,
    /// Derived clauses heavier than this are discarded
    pub max_weight: usize,
    pub demodulation: bool,
    pub paramodulation: bool,
    /// Stop after this many answers (0 = exhaust the set of support)
    pub max_answers: usize,
}

impl Default for OtterConfig {
    fn default() -> Self {
        Self {
            max_clauses: 20000,
            max_iterations: 10000,
            max_seconds: 30,
            max_weight: 100,
            demodulation: true,
            paramodulation: true,
            max_answers: 0,
        }
    }
}

/// A set-of-support entry ordered for a min-heap
#[derive(Debug, Clone)]
struct WeightedClause {
    clause: Arc<Clause>,
    age: usize,
}

impl WeightedClause {
    fn key(&self) -> (usize, usize, usize) {
        (self.clause.len(), self.clause.weight(), self.age)
    }
}

impl PartialEq for WeightedClause {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl Eq for WeightedClause {}

impl PartialOrd for WeightedClause {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for WeightedClause {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reversed: the shortest, lightest, oldest clause is popped first
        other.key().cmp(&self.key())
    }
}

/// The OTTER-like inference procedure
#[derive(Debug, Clone, Default)]
pub struct OtterProver {
    config: OtterConfig,
}

impl OtterProver {
    pub fn new(config: OtterConfig) -> Self {
        OtterProver { config }
    }

    pub fn config(&self) -> &OtterConfig {
        &self.config
    }
}

/// Working state of one saturation run
struct Saturation<'a> {
    config: &'a OtterConfig,
    /// Whether equality inferences are worth attempting
    equality: bool,
    usable: Vec<Arc<Clause>>,
    sos: BinaryHeap<WeightedClause>,
    demodulators: Vec<Arc<Clause>>,
    seen: HashSet<Clause>,
    age: usize,
    ctx: StandardizeApart,
    stats: InferenceStats,
}

impl<'a> Saturation<'a> {
    fn new(config: &'a OtterConfig, equality: bool, ctx: StandardizeApart) -> Self {
        Saturation {
            config,
            equality,
            usable: Vec::new(),
            sos: BinaryHeap::new(),
            demodulators: Vec::new(),
            seen: HashSet::new(),
            age: 0,
            ctx,
            stats: InferenceStats::default(),
        }
    }

    fn size(&self) -> usize {
        self.usable.len() + self.sos.len()
    }

    /// Knowledge base clauses and axioms go straight to usable
    fn add_usable(&mut self, clause: Arc<Clause>) {
        self.seen.insert((*clause).clone());
        self.register_demodulator(&clause);
        self.usable.push(clause);
    }

    fn add_support(&mut self, clause: Arc<Clause>) {
        self.seen.insert((*clause).clone());
        self.sos.push(WeightedClause {
            clause,
            age: self.age,
        });
        self.age += 1;
    }

    fn register_demodulator(&mut self, clause: &Arc<Clause>) {
        if self.config.demodulation && unit_equality(clause).map_or(false, is_oriented) {
            self.demodulators.push(Arc::clone(clause));
        }
    }

    /// Simplify a new clause; `None` if it should be discarded
    fn process(&mut self, clause: Clause) -> Option<Arc<Clause>> {
        if clause.is_tautology() || clause.weight() > self.config.max_weight {
            return None;
        }
        let clause = self.demodulate(clause);
        if clause.is_tautology() || self.seen.contains(&clause) {
            self.stats.clauses_subsumed += 1;
            return None;
        }
        let subsumed = self
            .usable
            .iter()
            .chain(self.sos.iter().map(|w| &w.clause))
            .any(|c| c.subsumes(&clause));
        if subsumed {
            self.stats.clauses_subsumed += 1;
            return None;
        }
        self.seen.insert(clause.clone());
        Some(Arc::new(clause))
    }

    fn demodulate(&mut self, clause: Clause) -> Clause {
        if !self.config.demodulation || self.demodulators.is_empty() {
            return clause;
        }
        let rewriter = Demodulation::new(DEFAULT_MAX_REWRITES);
        let mut current = Arc::new(clause);
        for demodulator in &self.demodulators {
            if let Some(rewritten) = rewriter.apply_to_clause(demodulator, &current) {
                self.stats.rewrites += 1;
                current = Arc::new(rewritten);
            }
        }
        Arc::try_unwrap(current).unwrap_or_else(|shared| (*shared).clone())
    }

    /// Keep a processed clause: back subsumption, then into the set of support
    fn keep(&mut self, clause: Arc<Clause>) {
        let before = self.usable.len() + self.sos.len();
        self.usable.retain(|c| !clause.subsumes(c));
        self.sos.retain(|w| !clause.subsumes(&w.clause));
        self.stats.clauses_subsumed += before - (self.usable.len() + self.sos.len());

        self.register_demodulator(&clause);
        self.stats.clauses_kept += 1;
        self.sos.push(WeightedClause {
            clause,
            age: self.age,
        });
        self.age += 1;
    }

    /// All inferences between the given clause and usable
    fn infer(&mut self, given: &Arc<Clause>) -> Vec<Clause> {
        let mut results = Vec::new();

        for usable in &self.usable {
            results.extend(resolve_all(given, usable, &mut self.ctx));
        }
        results.extend(resolve_all(given, given, &mut self.ctx));
        results.extend(factor_all(given));

        if self.config.paramodulation && self.equality {
            for usable in &self.usable {
                results.extend(Paramodulation::apply(given, usable, &mut self.ctx));
            }
            results.extend(Paramodulation::apply(given, given, &mut self.ctx));
        }

        self.stats.clauses_generated += results.len();
        results
    }
}

/// Usable as a left-to-right rewrite rule without looping
fn is_oriented(equality: &Atom) -> bool {
    let (l, r) = (&equality.args[0], &equality.args[1]);
    if l.size() != r.size() {
        return l.size() > r.size() && r.variables().is_subset(&l.variables());
    }
    l.is_ground() && r.is_ground() && l > r
}

fn reflexivity_axiom(ctx: &mut StandardizeApart) -> Clause {
    let x = Term::Var(ctx.fresh_variable());
    Clause::builder()
        .literal(Literal::positive(Atom::equality(x.clone(), x)))
        .derivation(Derivation::Axiom("reflexivity".to_string()))
        .build()
}

fn mentions_equality(clauses: &[Clause]) -> bool {
    clauses
        .iter()
        .any(|c| c.literals().iter().any(|l| l.is_equality()))
}

impl InferenceProcedure for OtterProver {
    fn name(&self) -> &str {
        "otter"
    }

    fn ask(&self, kb: &KnowledgeBase, query: &Sentence) -> FolResult<InferenceResult> {
        let start = Instant::now();
        let deadline = Deadline::after_seconds(self.config.max_seconds);
        let mut ctx = kb.derivation_context();
        let negated = NegatedQuery::new(query, &mut ctx);
        let equality = kb.uses_equality() || mentions_equality(&negated.clauses);

        let mut run = Saturation::new(&self.config, equality, ctx);
        for clause in kb.clauses() {
            run.add_usable(Arc::new(clause.clone()));
        }
        if self.config.paramodulation && equality {
            let axiom = reflexivity_axiom(&mut run.ctx);
            run.add_usable(Arc::new(axiom));
        }

        let mut proofs: Vec<Proof> = Vec::new();
        let mut answers: Vec<Substitution> = Vec::new();

        for clause in negated.clauses.iter().cloned() {
            let clause = Arc::new(clause);
            if let Some(bindings) = negated.answer(&clause) {
                answers.push(bindings.clone());
                proofs.push(proof_from_clause(&clause, bindings));
                continue;
            }
            run.add_support(clause);
        }
        if !proofs.is_empty() {
            run.stats.elapsed_ms = start.elapsed().as_millis();
            return Ok(InferenceResult::completed(proofs, run.stats));
        }

        info!(
            "otter starting with {} usable and {} set-of-support clauses",
            run.usable.len(),
            run.sos.len()
        );

        let mut limit: Option<Limit> = None;
        'given: while let Some(WeightedClause { clause: given, .. }) = run.sos.pop() {
            if deadline.expired() {
                limit = Some(Limit::Seconds);
                break;
            }
            if run.stats.steps >= self.config.max_iterations {
                limit = Some(Limit::Iterations);
                break;
            }
            if run.size() >= self.config.max_clauses {
                limit = Some(Limit::Clauses);
                break;
            }
            run.stats.steps += 1;
            debug!("given clause #{}: {}", run.stats.steps, given);

            let inferred = run.infer(&given);
            run.usable.push(given);

            for clause in inferred {
                let Some(kept) = run.process(clause) else {
                    continue;
                };
                match negated.answer(&kept) {
                    Some(bindings) => {
                        let refutation = kept.is_empty();
                        if !answers.contains(&bindings) {
                            debug!("otter found answer {}", bindings);
                            answers.push(bindings.clone());
                            proofs.push(proof_from_clause(&kept, bindings));
                        }
                        if refutation || negated.is_ground() {
                            break 'given;
                        }
                        if self.config.max_answers > 0 && proofs.len() >= self.config.max_answers {
                            limit = Some(Limit::Answers);
                            break 'given;
                        }
                    }
                    None => run.keep(kept),
                }
            }
        }

        let exhausted = run.sos.is_empty();
        let mut stats = run.stats;
        stats.elapsed_ms = start.elapsed().as_millis();
        info!(
            "otter finished after {} given clauses with {} proof(s)",
            stats.steps,
            proofs.len()
        );
        Ok(match limit {
            Some(limit) => {
                warn!("otter stopped at the {} bound", limit);
                InferenceResult::limited(limit, proofs, stats)
            }
            None => {
                stats.converged = exhausted;
                InferenceResult::completed(proofs, stats)
            }
        })
    }
}
