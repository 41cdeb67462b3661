//! First-order logic term representation
//!
//! Terms are the basic building blocks of first-order logic sentences.
//! A term is either a variable, a constant, or a function application.
//! Atoms apply a predicate symbol to terms; term equality is the atom
//! whose predicate is the reserved `=` symbol.

use std::fmt;

use indexmap::IndexSet;
use serde::{Deserialize, Serialize};

/// Name of the reserved equality predicate
pub const EQUALITY: &str = "=";

/// A first-order logic variable, identified by name
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Variable {
    pub name: String,
}

impl Variable {
    pub fn new(name: impl Into<String>) -> Self {
        Variable { name: name.into() }
    }

    /// Append a suffix to the name, e.g. for per-depth renaming in joins
    pub fn with_suffix(&self, suffix: &str) -> Self {
        Variable::new(format!("{}_{}", self.name, suffix))
    }
}

impl fmt::Display for Variable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// A function symbol
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Function {
    pub name: String,
    pub arity: usize,
}

impl Function {
    pub fn new(name: impl Into<String>, arity: usize) -> Self {
        Function {
            name: name.into(),
            arity,
        }
    }
}

impl fmt::Display for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.name, self.arity)
    }
}

/// A first-order logic term
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Term {
    /// A variable
    Var(Variable),
    /// A constant symbol
    Const(String),
    /// A function application
    Func(Function, Vec<Term>),
}

impl Term {
    /// Create a variable term
    pub fn var(name: impl Into<String>) -> Self {
        Term::Var(Variable::new(name))
    }

    /// Create a constant term
    pub fn constant(name: impl Into<String>) -> Self {
        Term::Const(name.into())
    }

    /// Create a function application
    pub fn func(name: impl Into<String>, args: Vec<Term>) -> Self {
        Term::Func(Function::new(name, args.len()), args)
    }

    pub fn is_var(&self) -> bool {
        matches!(self, Term::Var(_))
    }

    pub fn is_constant(&self) -> bool {
        matches!(self, Term::Const(_))
    }

    /// Symbol name of a constant or function, variable name otherwise
    pub fn symbol(&self) -> &str {
        match self {
            Term::Var(v) => &v.name,
            Term::Const(name) => name,
            Term::Func(f, _) => &f.name,
        }
    }

    /// Check if this term is ground (contains no variables)
    pub fn is_ground(&self) -> bool {
        match self {
            Term::Var(_) => false,
            Term::Const(_) => true,
            Term::Func(_, args) => args.iter().all(|a| a.is_ground()),
        }
    }

    /// Variables in order of first occurrence
    pub fn variables(&self) -> IndexSet<Variable> {
        let mut vars = IndexSet::new();
        self.collect_variables(&mut vars);
        vars
    }

    pub(crate) fn collect_variables(&self, vars: &mut IndexSet<Variable>) {
        match self {
            Term::Var(v) => {
                vars.insert(v.clone());
            }
            Term::Const(_) => {}
            Term::Func(_, args) => {
                for arg in args {
                    arg.collect_variables(vars);
                }
            }
        }
    }

    /// Number of symbols in this term
    pub fn size(&self) -> usize {
        match self {
            Term::Var(_) | Term::Const(_) => 1,
            Term::Func(_, args) => 1 + args.iter().map(|a| a.size()).sum::<usize>(),
        }
    }

    /// Check if this term contains the given variable
    pub fn contains_var(&self, var: &Variable) -> bool {
        match self {
            Term::Var(v) => v == var,
            Term::Const(_) => false,
            Term::Func(_, args) => args.iter().any(|a| a.contains_var(var)),
        }
    }

    /// Rename variables by appending a suffix
    pub fn rename_variables(&self, suffix: &str) -> Term {
        match self {
            Term::Var(v) => Term::Var(v.with_suffix(suffix)),
            Term::Const(_) => self.clone(),
            Term::Func(f, args) => Term::Func(
                f.clone(),
                args.iter().map(|a| a.rename_variables(suffix)).collect(),
            ),
        }
    }

    /// Subterm at a position path (child indices from the root)
    pub fn subterm(&self, path: &[usize]) -> Option<&Term> {
        match path.split_first() {
            None => Some(self),
            Some((i, rest)) => match self {
                Term::Func(_, args) => args.get(*i)?.subterm(rest),
                _ => None,
            },
        }
    }

    /// Copy of this term with the subterm at `path` replaced
    pub fn replace_at(&self, path: &[usize], replacement: &Term) -> Term {
        match path.split_first() {
            None => replacement.clone(),
            Some((i, rest)) => match self {
                Term::Func(f, args) => {
                    let mut new_args = args.clone();
                    if let Some(arg) = new_args.get_mut(*i) {
                        *arg = arg.replace_at(rest, replacement);
                    }
                    Term::Func(f.clone(), new_args)
                }
                _ => self.clone(),
            },
        }
    }

    /// Paths of all non-variable subterms, pre-order, left to right
    pub fn non_variable_positions(&self) -> Vec<Vec<usize>> {
        let mut positions = Vec::new();
        self.collect_positions(&mut Vec::new(), &mut positions);
        positions
    }

    fn collect_positions(&self, prefix: &mut Vec<usize>, out: &mut Vec<Vec<usize>>) {
        match self {
            Term::Var(_) => {}
            Term::Const(_) => out.push(prefix.clone()),
            Term::Func(_, args) => {
                out.push(prefix.clone());
                for (i, arg) in args.iter().enumerate() {
                    prefix.push(i);
                    arg.collect_positions(prefix, out);
                    prefix.pop();
                }
            }
        }
    }
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Term::Var(v) => write!(f, "{}", v),
            Term::Const(name) => write!(f, "{}", name),
            Term::Func(func, args) => {
                write!(f, "{}(", func.name)?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        write!(f, ",")?;
                    }
                    write!(f, "{}", arg)?;
                }
                write!(f, ")")
            }
        }
    }
}

/// A predicate symbol
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Predicate {
    pub name: String,
    pub arity: usize,
}

impl Predicate {
    pub fn new(name: impl Into<String>, arity: usize) -> Self {
        Predicate {
            name: name.into(),
            arity,
        }
    }

    /// The reserved equality predicate
    pub fn equality() -> Self {
        Predicate::new(EQUALITY, 2)
    }

    pub fn is_equality(&self) -> bool {
        self.name == EQUALITY && self.arity == 2
    }
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.name, self.arity)
    }
}

/// An atomic sentence: a predicate applied to terms, or a term equality
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Atom {
    pub predicate: Predicate,
    pub args: Vec<Term>,
}

impl Atom {
    pub fn new(name: impl Into<String>, args: Vec<Term>) -> Self {
        Atom {
            predicate: Predicate::new(name, args.len()),
            args,
        }
    }

    /// Create a term equality atom
    pub fn equality(left: Term, right: Term) -> Self {
        Atom {
            predicate: Predicate::equality(),
            args: vec![left, right],
        }
    }

    pub fn is_equality(&self) -> bool {
        self.predicate.is_equality() && self.args.len() == 2
    }

    /// Symbolic name used for fact indexing
    pub fn symbolic_name(&self) -> &str {
        &self.predicate.name
    }

    /// Variables in order of first occurrence
    pub fn variables(&self) -> IndexSet<Variable> {
        let mut vars = IndexSet::new();
        for arg in &self.args {
            arg.collect_variables(&mut vars);
        }
        vars
    }

    pub fn is_ground(&self) -> bool {
        self.args.iter().all(|a| a.is_ground())
    }

    pub fn rename_variables(&self, suffix: &str) -> Atom {
        Atom {
            predicate: self.predicate.clone(),
            args: self.args.iter().map(|a| a.rename_variables(suffix)).collect(),
        }
    }

    /// Weight of this atom (for clause ordering)
    pub fn weight(&self) -> usize {
        1 + self.args.iter().map(|a| a.size()).sum::<usize>()
    }
}

impl fmt::Display for Atom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_equality() {
            write!(f, "{} = {}", self.args[0], self.args[1])
        } else if self.args.is_empty() {
            write!(f, "{}", self.predicate.name)
        } else {
            write!(f, "{}(", self.predicate.name)?;
            for (i, arg) in self.args.iter().enumerate() {
                if i > 0 {
                    write!(f, ",")?;
                }
                write!(f, "{}", arg)?;
            }
            write!(f, ")")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_term_creation() {
        let x = Term::var("x");
        assert!(x.is_var());

        let c = Term::constant("John");
        assert!(c.is_constant());
        assert!(c.is_ground());

        let f = Term::func("F", vec![x.clone(), c.clone()]);
        assert!(!f.is_var());
        assert!(!f.is_constant());
        assert!(!f.is_ground());
        assert_eq!(f.to_string(), "F(x,John)");
    }

    #[test]
    fn test_term_variables_in_order() {
        let f = Term::func("F", vec![Term::var("y"), Term::var("x"), Term::var("y")]);
        let vars: Vec<_> = f.variables().into_iter().map(|v| v.name).collect();
        assert_eq!(vars, vec!["y", "x"]);
    }

    #[test]
    fn test_positions_and_replace() {
        // F(x,G(A))
        let t = Term::func("F", vec![Term::var("x"), Term::func("G", vec![Term::constant("A")])]);
        let positions = t.non_variable_positions();
        assert_eq!(positions, vec![vec![], vec![1], vec![1, 0]]);

        assert_eq!(t.subterm(&[1, 0]), Some(&Term::constant("A")));
        let replaced = t.replace_at(&[1, 0], &Term::constant("B"));
        assert_eq!(replaced.to_string(), "F(x,G(B))");
    }

    #[test]
    fn test_atom_creation() {
        let atom = Atom::new("Knows", vec![Term::var("x"), Term::constant("John")]);
        assert_eq!(atom.predicate.name, "Knows");
        assert_eq!(atom.predicate.arity, 2);
        assert_eq!(atom.to_string(), "Knows(x,John)");
    }

    #[test]
    fn test_equality_atom() {
        let eq = Atom::equality(Term::var("x"), Term::constant("A"));
        assert!(eq.is_equality());
        assert_eq!(eq.symbolic_name(), "=");
        assert_eq!(format!("{}", eq), "x = A");
    }
}
