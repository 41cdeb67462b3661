//! The first-order knowledge base
//!
//! Told sentences are clausified, standardized apart in the knowledge
//! base namespace and stored once. Unit clauses are also indexed as facts.
//! Queries are standardized in a fresh namespace and handed to the
//! configured inference procedure; answer bindings come back in the
//! caller's variable names.

use std::fmt;

use indexmap::{IndexMap, IndexSet};
use log::{debug, info};

use super::FactIndex;
use crate::error::{FolError, FolResult};
use crate::parser::parse_sentence;
use crate::prover::clause::{Clause, Literal};
use crate::prover::cnf::CnfConverter;
use crate::prover::proof::InferenceResult;
use crate::prover::sentence::Sentence;
use crate::prover::standardize::StandardizeApart;
use crate::prover::term::{Term, Variable};
use crate::prover::unify::Substitution;
use crate::reasoning::{InferenceProcedure, OtterProver};

/// A set of first-order clauses with an attached inference procedure
#[derive(Debug)]
pub struct KnowledgeBase {
    sentences: Vec<Sentence>,
    clauses: IndexSet<Clause>,
    definite: Vec<Clause>,
    implications: Vec<Clause>,
    facts: FactIndex,
    namespace: StandardizeApart,
    procedure: Box<dyn InferenceProcedure>,
}

impl Default for KnowledgeBase {
    fn default() -> Self {
        Self::new()
    }
}

impl KnowledgeBase {
    /// Create an empty knowledge base using OTTER-like saturation
    pub fn new() -> Self {
        Self::with_procedure(Box::new(OtterProver::default()))
    }

    pub fn with_procedure(procedure: Box<dyn InferenceProcedure>) -> Self {
        KnowledgeBase {
            sentences: Vec::new(),
            clauses: IndexSet::new(),
            definite: Vec::new(),
            implications: Vec::new(),
            facts: FactIndex::new(),
            namespace: StandardizeApart::for_knowledge_base(),
            procedure,
        }
    }

    // ========================================================================
    // Telling
    // ========================================================================

    /// Add a sentence
    ///
    /// Fails without changing the knowledge base if the sentence
    /// clausifies to the empty clause.
    pub fn tell(&mut self, sentence: Sentence) -> FolResult<()> {
        let mut namespace = self.namespace.clone();
        let cnf = CnfConverter::convert(&sentence, &mut namespace);
        if cnf.has_empty_clause() {
            return Err(FolError::unsatisfiable(&sentence, &cnf));
        }

        let mut added = 0;
        for clause in cnf.clauses() {
            let clause = namespace.rename_clause(clause);
            if self.insert_clause(clause) {
                added += 1;
            }
        }
        debug!("told {} ({} new clauses)", sentence, added);

        self.namespace = namespace;
        self.sentences.push(sentence);
        Ok(())
    }

    /// Add several sentences, stopping at the first failure
    pub fn tell_all(&mut self, sentences: impl IntoIterator<Item = Sentence>) -> FolResult<()> {
        for sentence in sentences {
            self.tell(sentence)?;
        }
        Ok(())
    }

    /// Parse and add a sentence in concrete syntax
    pub fn tell_text(&mut self, text: &str) -> FolResult<Sentence> {
        let sentence = parse_sentence(text)?;
        self.tell(sentence.clone())?;
        Ok(sentence)
    }

    fn insert_clause(&mut self, clause: Clause) -> bool {
        if self.clauses.contains(&clause) || self.clauses.iter().any(|c| is_variant(c, &clause)) {
            return false;
        }
        if clause.is_definite() {
            self.definite.push(clause.clone());
        }
        if clause.is_implication_definite() {
            self.implications.push(clause.clone());
        }
        if clause.is_unit() {
            if let Some(lit) = clause.literals().first() {
                self.facts.insert(lit.clone());
            }
        }
        self.clauses.insert(clause)
    }

    // ========================================================================
    // Asking
    // ========================================================================

    /// Ask a query with the configured procedure
    ///
    /// The answer bindings of each proof are restricted to the query's
    /// free variables and expressed in the query's own names.
    pub fn ask(&self, query: &Sentence) -> FolResult<InferenceResult> {
        let mut query_namespace = StandardizeApart::for_query();
        let standardized = query_namespace.standardize_sentence(query);
        info!("asking {} with {}", query, self.procedure.name());

        let mut result = self.procedure.ask(self, &standardized.renamed)?;

        let free = query.free_variables();
        for proof in result.proofs_mut() {
            let mapped = map_back(proof.answer_bindings(), &standardized.reverse, &free);
            proof.replace_answer_bindings(mapped);
        }
        info!(
            "{} answered {} with {} proof(s)",
            self.procedure.name(),
            query,
            result.proofs().len()
        );
        Ok(result)
    }

    /// Parse and ask a query in concrete syntax
    pub fn ask_text(&self, text: &str) -> FolResult<InferenceResult> {
        let query = parse_sentence(text)?;
        self.ask(&query)
    }

    // ========================================================================
    // Fact lookup
    // ========================================================================

    /// Every substitution unifying `literal` with a known fact
    pub fn fetch(&self, literal: &Literal) -> Vec<Substitution> {
        self.facts.fetch(literal)
    }

    /// Substitutions satisfying all literals against the known facts
    pub fn fetch_all(&self, literals: &[Literal]) -> Vec<Substitution> {
        self.facts.fetch_all(literals)
    }

    /// True when `literal` is an alpha-variant of a known fact
    pub fn is_renaming(&self, literal: &Literal) -> bool {
        self.facts.is_renaming(literal)
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    pub fn clauses(&self) -> &IndexSet<Clause> {
        &self.clauses
    }

    /// Clauses with at most one positive literal
    pub fn definite_clauses(&self) -> &[Clause] {
        &self.definite
    }

    /// Clauses with exactly one positive and at least one negative literal
    pub fn implication_clauses(&self) -> &[Clause] {
        &self.implications
    }

    pub fn facts(&self) -> &FactIndex {
        &self.facts
    }

    pub fn sentences(&self) -> &[Sentence] {
        &self.sentences
    }

    pub fn number_of_clauses(&self) -> usize {
        self.clauses.len()
    }

    pub fn number_of_facts(&self) -> usize {
        self.facts.len()
    }

    pub fn number_of_rules(&self) -> usize {
        self.implications.len()
    }

    /// The first clause with more than one positive literal
    pub fn non_definite_clause(&self) -> Option<&Clause> {
        self.clauses.iter().find(|c| !c.is_definite())
    }

    /// True if any clause mentions term equality
    pub fn uses_equality(&self) -> bool {
        self.clauses
            .iter()
            .any(|c| c.literals().iter().any(|l| l.is_equality()))
    }

    // ========================================================================
    // Management
    // ========================================================================

    pub fn procedure(&self) -> &dyn InferenceProcedure {
        self.procedure.as_ref()
    }

    pub fn set_procedure(&mut self, procedure: Box<dyn InferenceProcedure>) {
        self.procedure = procedure;
    }

    /// Copy of the namespace counter for clauses built during inference
    ///
    /// Continuing from this copy keeps fresh variables and Skolem symbols
    /// distinct from those already stored, without mutating the knowledge
    /// base.
    pub fn derivation_context(&self) -> StandardizeApart {
        self.namespace.clone()
    }

    /// Remove all sentences and clauses and restart the namespace
    pub fn clear(&mut self) {
        self.sentences.clear();
        self.clauses.clear();
        self.definite.clear();
        self.implications.clear();
        self.facts.clear();
        self.namespace.reset();
    }

    /// Restart the variable and Skolem counter
    ///
    /// Only safe on an empty knowledge base; later tells may otherwise
    /// reuse stored names.
    pub fn reset_indexical(&mut self) {
        self.namespace.reset();
    }
}

impl fmt::Display for KnowledgeBase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for sentence in &self.sentences {
            writeln!(f, "{}", sentence)?;
        }
        Ok(())
    }
}

fn is_variant(a: &Clause, b: &Clause) -> bool {
    a.len() == b.len() && a.subsumes(b) && b.subsumes(a)
}

/// Rewrite bindings from query-namespace variables to the caller's names
fn map_back(
    bindings: &Substitution,
    reverse: &IndexMap<Variable, Variable>,
    free: &IndexSet<Variable>,
) -> Substitution {
    let renaming: Substitution = reverse
        .iter()
        .map(|(fresh, original)| (fresh.clone(), Term::Var(original.clone())))
        .collect();
    let mut out = Substitution::new();
    for (var, value) in bindings.iter() {
        let Some(original) = reverse.get(var) else {
            continue;
        };
        if free.contains(original) {
            out.insert(original.clone(), renaming.apply_term(value));
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use crate::prover::term::Atom;
    use crate::reasoning::{BackwardChaining, ForwardChaining};

    fn kings() -> KnowledgeBase {
        let mut kb = KnowledgeBase::new();
        kb.tell_text("King(John)").unwrap();
        kb.tell_text("King(Richard)").unwrap();
        kb.tell_text("Greedy(John)").unwrap();
        kb.tell_text("FORALL x (King(x) AND Greedy(x) => Evil(x))").unwrap();
        kb
    }

    #[test]
    fn test_tell_clausifies_and_indexes() {
        let kb = kings();
        assert_eq!(kb.sentences().len(), 4);
        assert_eq!(kb.number_of_clauses(), 4);
        assert_eq!(kb.number_of_facts(), 3);
        assert_eq!(kb.number_of_rules(), 1);
        assert_eq!(kb.definite_clauses().len(), 4);
        assert!(kb.non_definite_clause().is_none());
        assert_eq!(
            kb.implication_clauses()[0].to_string(),
            "[~King(v1), ~Greedy(v1), Evil(v1)]"
        );
    }

    #[test]
    fn test_duplicate_clauses_stored_once() {
        let mut kb = kings();
        kb.tell_text("King(John)").unwrap();
        kb.tell_text("FORALL y (King(y) AND Greedy(y) => Evil(y))").unwrap();
        assert_eq!(kb.number_of_clauses(), 4);
        assert_eq!(kb.sentences().len(), 6);
    }

    #[test]
    fn test_unsatisfiable_tell_is_rejected() {
        let mut kb = kings();
        let err = kb.tell_text("NOT (A = A)").unwrap_err();
        assert_eq!(err.code, ErrorCode::UnsatisfiableSentence);
        assert!(err.message.contains("NOT (A = A)"));
        assert_eq!(kb.sentences().len(), 4);
        assert_eq!(kb.number_of_clauses(), 4);
    }

    #[test]
    fn test_fetch_and_renaming() {
        let kb = kings();
        let king = Literal::positive(Atom::new("King", vec![Term::var("x")]));
        assert_eq!(kb.fetch(&king).len(), 2);
        assert!(!kb.is_renaming(&king));
        let richard = Literal::positive(Atom::new("King", vec![Term::constant("Richard")]));
        assert!(kb.is_renaming(&richard));
    }

    #[test]
    fn test_ask_maps_bindings_back() {
        let mut kb = kings();
        kb.set_procedure(Box::new(BackwardChaining::default()));
        let result = kb.ask_text("Evil(x)").unwrap();
        assert!(result.is_true());
        assert_eq!(result.proofs().len(), 1);
        assert_eq!(result.proofs()[0].answer_bindings().to_string(), "{x=John}");
    }

    #[test]
    fn test_non_definite_rejected_by_horn_procedures() {
        let mut kb = kings();
        kb.tell_text("Kills(Jack, Tuna) OR Kills(Curiosity, Tuna)").unwrap();
        assert!(kb.non_definite_clause().is_some());
        kb.set_procedure(Box::new(ForwardChaining::default()));
        let err = kb.ask_text("Evil(x)").unwrap_err();
        assert_eq!(err.code, ErrorCode::NonDefiniteClause);
        assert!(err.message.contains("Kills"));
    }

    #[test]
    fn test_derivation_context_continues_namespace() {
        let kb = kings();
        let mut ctx = kb.derivation_context();
        let fresh = ctx.fresh_variable();
        assert!(kb.clauses().iter().all(|c| !c.variables().contains(&fresh)));
        assert!(fresh.name.starts_with('v'));
    }

    #[test]
    fn test_display_and_clear() {
        let mut kb = kings();
        let text = kb.to_string();
        assert!(text.starts_with("King(John)\n"));
        assert_eq!(text.lines().count(), 4);
        kb.clear();
        assert_eq!(kb.number_of_clauses(), 0);
        assert_eq!(kb.derivation_context().counter(), 0);
    }

    #[test]
    fn test_query_variable_named_like_stored_variable() {
        let mut kb = kings();
        let stored = kb
            .clauses()
            .iter()
            .flat_map(|c| c.variables())
            .next()
            .unwrap();
        let query = format!("Evil({})", stored.name);
        let expected = format!("{{{}=John}}", stored.name);

        let result = kb.ask_text(&query).unwrap();
        assert!(result.is_true());
        assert_eq!(result.proofs()[0].answer_bindings().to_string(), expected);

        kb.set_procedure(Box::new(BackwardChaining::default()));
        let result = kb.ask_text(&query).unwrap();
        assert_eq!(result.proofs()[0].answer_bindings().to_string(), expected);
    }

    #[test]
    fn test_reset_indexical() {
        let mut kb = KnowledgeBase::new();
        kb.tell_text("FORALL z (R(z))").unwrap();
        let first = kb.clauses()[0].to_string();
        assert!(kb.derivation_context().counter() > 0);

        kb.clear();
        kb.reset_indexical();
        assert_eq!(kb.derivation_context().counter(), 0);
        kb.tell_text("FORALL z (R(z))").unwrap();
        assert_eq!(kb.clauses()[0].to_string(), first);
    }
}
