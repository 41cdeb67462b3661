//! Proofs and inference results
//!
//! A [`Proof`] is a numbered list of steps whose justifications refer back
//! to earlier step numbers, plus the answer bindings it establishes.
//! Saturation procedures rebuild proofs from the derivation DAG of the
//! final clause with [`proof_from_clause`].

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::clause::{Clause, Derivation};
use super::unify::Substitution;

/// The inference rule that produced a proof step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProofRule {
    Premise,
    Clausified,
    Goal,
    Axiom,
    Resolution,
    Factor,
    Paramodulation,
    Demodulation,
    /// Forward chaining: a rule fired on known facts
    ModusPonens,
    /// Backward chaining: a goal reduced by a rule
    BackChain,
    /// Model elimination: goal closed against an ancestor
    Reduction,
    /// Model elimination: goal extended with a clause
    Extension,
}

impl ProofRule {
    pub fn name(&self) -> &'static str {
        match self {
            ProofRule::Premise => "Premise",
            ProofRule::Clausified => "Clausified",
            ProofRule::Goal => "Goal",
            ProofRule::Axiom => "Axiom",
            ProofRule::Resolution => "Resolution",
            ProofRule::Factor => "Factor",
            ProofRule::Paramodulation => "Paramodulation",
            ProofRule::Demodulation => "Demodulation",
            ProofRule::ModusPonens => "ModusPonens",
            ProofRule::BackChain => "BackChain",
            ProofRule::Reduction => "Reduction",
            ProofRule::Extension => "Extension",
        }
    }

    fn of(derivation: &Derivation) -> ProofRule {
        match derivation {
            Derivation::Premise => ProofRule::Premise,
            Derivation::Clausified(_) => ProofRule::Clausified,
            Derivation::Goal => ProofRule::Goal,
            Derivation::Axiom(_) => ProofRule::Axiom,
            Derivation::Resolution { .. } => ProofRule::Resolution,
            Derivation::Factor { .. } => ProofRule::Factor,
            Derivation::Paramodulation { .. } => ProofRule::Paramodulation,
            Derivation::Demodulation { .. } => ProofRule::Demodulation,
        }
    }
}

impl fmt::Display for ProofRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// One line of a proof
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProofStep {
    /// 1-based step number
    pub number: usize,
    /// The clause or fact established by this step, rendered
    pub statement: String,
    pub rule: ProofRule,
    /// Numbers of the earlier steps this one depends on
    pub justification: Vec<usize>,
    /// Unifier, source sentence or rule text
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl fmt::Display for ProofStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:>3}. {:<40} {}", self.number, self.statement, self.rule)?;
        if !self.justification.is_empty() {
            let refs: Vec<String> = self.justification.iter().map(|n| n.to_string()).collect();
            write!(f, " {}", refs.join(", "))?;
        }
        if let Some(detail) = &self.detail {
            write!(f, " {}", detail)?;
        }
        Ok(())
    }
}

/// Accumulates numbered steps
#[derive(Debug, Default)]
pub struct ProofBuilder {
    steps: Vec<ProofStep>,
}

impl ProofBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a step and return its number
    pub fn push(
        &mut self,
        statement: impl Into<String>,
        rule: ProofRule,
        justification: Vec<usize>,
        detail: Option<String>,
    ) -> usize {
        let number = self.steps.len() + 1;
        self.steps.push(ProofStep {
            number,
            statement: statement.into(),
            rule,
            justification,
            detail,
        });
        number
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn build(self, answer_bindings: Substitution) -> Proof {
        Proof::new(self.steps, answer_bindings)
    }
}

/// A proof of a query
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Proof {
    steps: Vec<ProofStep>,
    answer_bindings: Substitution,
}

impl Proof {
    pub fn new(steps: Vec<ProofStep>, answer_bindings: Substitution) -> Self {
        Proof {
            steps,
            answer_bindings,
        }
    }

    pub fn steps(&self) -> &[ProofStep] {
        &self.steps
    }

    /// Bindings of the query's free variables
    pub fn answer_bindings(&self) -> &Substitution {
        &self.answer_bindings
    }

    pub fn replace_answer_bindings(&mut self, bindings: Substitution) {
        self.answer_bindings = bindings;
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

impl fmt::Display for Proof {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Proof, answer bindings: {}", self.answer_bindings)?;
        for step in &self.steps {
            writeln!(f, "{}", step)?;
        }
        Ok(())
    }
}

/// Rebuild a proof from the derivation DAG rooted at `clause`
///
/// Steps are emitted in post-order so every parent precedes its
/// conclusion; shared parents appear once.
pub fn proof_from_clause(clause: &Arc<Clause>, answer_bindings: Substitution) -> Proof {
    let mut builder = ProofBuilder::new();
    let mut numbers: HashMap<*const Clause, usize> = HashMap::new();
    let mut stack: Vec<(&Arc<Clause>, bool)> = vec![(clause, false)];

    while let Some((node, expanded)) = stack.pop() {
        let key = Arc::as_ptr(node);
        if numbers.contains_key(&key) {
            continue;
        }
        let parents = node.derivation().parents();
        if !expanded {
            stack.push((node, true));
            for parent in parents.into_iter().rev() {
                if !numbers.contains_key(&Arc::as_ptr(parent)) {
                    stack.push((parent, false));
                }
            }
            continue;
        }
        let justification = parents
            .iter()
            .filter_map(|p| numbers.get(&Arc::as_ptr(p)).copied())
            .collect();
        let detail = match node.derivation() {
            Derivation::Clausified(sentence) => Some(format!("from {}", sentence)),
            Derivation::Axiom(name) => Some(name.clone()),
            other => other
                .unifier()
                .filter(|u| !u.is_empty())
                .map(|u| u.to_string()),
        };
        let number = builder.push(
            node.to_string(),
            ProofRule::of(node.derivation()),
            justification,
            detail,
        );
        numbers.insert(key, number);
    }

    builder.build(answer_bindings)
}

/// How an inference run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Termination {
    /// The search finished on its own
    Completed,
    /// The search was cut off by the named bound
    ResourceLimit(Limit),
}

/// Resource bounds a procedure can hit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Limit {
    Steps,
    Depth,
    Proofs,
    Answers,
    Clauses,
    Iterations,
    Inferences,
    Seconds,
}

impl fmt::Display for Limit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Limit::Steps => "steps",
            Limit::Depth => "depth",
            Limit::Proofs => "proofs",
            Limit::Answers => "answers",
            Limit::Clauses => "clauses",
            Limit::Iterations => "iterations",
            Limit::Inferences => "inferences",
            Limit::Seconds => "seconds",
        };
        write!(f, "{}", name)
    }
}

/// Counters collected during inference
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InferenceStats {
    /// Iterations of the main loop (passes, frame expansions, given clauses)
    pub steps: usize,
    /// Clauses or facts produced by inference rules
    pub clauses_generated: usize,
    /// Generated clauses that survived simplification
    pub clauses_kept: usize,
    /// Clauses discarded by subsumption or as duplicates
    pub clauses_subsumed: usize,
    /// Demodulation rewrites
    pub rewrites: usize,
    /// Deepest search depth reached
    pub max_depth_reached: usize,
    /// Whether a fixpoint was reached
    pub converged: bool,
    pub elapsed_ms: u128,
}

/// The outcome of asking a query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InferenceResult {
    entailed: bool,
    proofs: Vec<Proof>,
    termination: Termination,
    stats: InferenceStats,
}

impl InferenceResult {
    /// The query is entailed iff at least one proof was found
    pub fn new(proofs: Vec<Proof>, termination: Termination, stats: InferenceStats) -> Self {
        InferenceResult {
            entailed: !proofs.is_empty(),
            proofs,
            termination,
            stats,
        }
    }

    pub fn completed(proofs: Vec<Proof>, stats: InferenceStats) -> Self {
        Self::new(proofs, Termination::Completed, stats)
    }

    pub fn limited(limit: Limit, proofs: Vec<Proof>, stats: InferenceStats) -> Self {
        Self::new(proofs, Termination::ResourceLimit(limit), stats)
    }

    /// At least one proof was found
    pub fn is_true(&self) -> bool {
        self.entailed
    }

    pub fn is_entailed(&self) -> bool {
        self.entailed
    }

    /// No proof was found and the search ran to completion
    pub fn is_possibly_false(&self) -> bool {
        !self.entailed && self.termination == Termination::Completed
    }

    /// No proof was found before a bound was hit
    pub fn is_unknown_due_to_limit(&self) -> bool {
        !self.entailed && self.termination != Termination::Completed
    }

    /// Some proofs were found, but a bound may have hidden others
    pub fn is_partial_result_due_to_limit(&self) -> bool {
        self.entailed && self.termination != Termination::Completed
    }

    pub fn proofs(&self) -> &[Proof] {
        &self.proofs
    }

    pub fn proofs_mut(&mut self) -> &mut [Proof] {
        &mut self.proofs
    }

    pub fn termination(&self) -> Termination {
        self.termination
    }

    pub fn stats(&self) -> &InferenceStats {
        &self.stats
    }
}

impl fmt::Display for InferenceResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let verdict = if self.is_partial_result_due_to_limit() {
            "entailed (partial)"
        } else if self.entailed {
            "entailed"
        } else if self.is_unknown_due_to_limit() {
            "unknown"
        } else {
            "not entailed"
        };
        write!(f, "{}", verdict)?;
        if let Termination::ResourceLimit(limit) = self.termination {
            write!(f, ", {} limit reached", limit)?;
        }
        writeln!(f, ", {} proof(s)", self.proofs.len())?;
        for (i, proof) in self.proofs.iter().enumerate() {
            writeln!(f)?;
            write!(f, "#{} {}", i + 1, proof)?;
        }
        Ok(())
    }
}
