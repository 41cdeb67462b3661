//! First-order logic sentence parser
//!
//! Reads sentences written in the concrete syntax used by `Display`:
//!
//! ```text
//! FORALL x (King(x) AND Greedy(x) => Evil(x))
//! EXISTS y (Loves(y, Jack)) OR ~Cat(Tuna)
//! F(A) = B
//! ```
//!
//! Connectives from loosest to tightest binding: `<=>`, `=>` (right
//! associative), `OR`/`|`, `AND`/`&`, then `NOT`/`~` and the quantifiers.
//! In term position an identifier starting with a lowercase letter is a
//! variable; any other identifier is a constant. Quantifiers only bind
//! lowercase names.

use nom::{
    branch::alt,
    bytes::complete::{tag, take_while},
    character::complete::{char, multispace0, satisfy},
    combinator::{cut, not, opt, recognize, verify},
    multi::{fold_many0, separated_list0, separated_list1},
    error::ErrorKind,
    sequence::{delimited, pair, preceded, terminated},
    IResult,
};

use crate::prover::sentence::Sentence;
use crate::prover::term::{Atom, Term, Variable};

/// Parser error type
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("Empty input")]
    Empty,

    #[error("Syntax error at position {position}: {message}")]
    Syntax {
        line: Option<usize>,
        position: usize,
        message: String,
    },

    #[error("Unexpected end of input: {message}")]
    UnexpectedEnd { line: Option<usize>, message: String },

    #[error("Unexpected trailing input at position {position}: `{rest}`")]
    Trailing {
        line: Option<usize>,
        position: usize,
        rest: String,
    },
}

impl ParseError {
    /// 1-based line number, when parsing a multi-line document
    pub fn line(&self) -> Option<usize> {
        match self {
            ParseError::Empty => None,
            ParseError::Syntax { line, .. }
            | ParseError::UnexpectedEnd { line, .. }
            | ParseError::Trailing { line, .. } => *line,
        }
    }

    fn at_line(self, n: usize) -> Self {
        match self {
            ParseError::Empty => ParseError::Empty,
            ParseError::Syntax {
                position, message, ..
            } => ParseError::Syntax {
                line: Some(n),
                position,
                message,
            },
            ParseError::UnexpectedEnd { message, .. } => ParseError::UnexpectedEnd {
                line: Some(n),
                message,
            },
            ParseError::Trailing { position, rest, .. } => ParseError::Trailing {
                line: Some(n),
                position,
                rest,
            },
        }
    }
}

const KEYWORDS: &[&str] = &["NOT", "AND", "OR", "FORALL", "EXISTS"];

fn is_ident_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// Skip leading whitespace before `inner`
fn ws<'a, O, F>(inner: F) -> impl FnMut(&'a str) -> IResult<&'a str, O>
where
    F: FnMut(&'a str) -> IResult<&'a str, O>,
{
    preceded(multispace0, inner)
}

/// A keyword not followed by an identifier character
fn keyword<'a>(kw: &'static str) -> impl FnMut(&'a str) -> IResult<&'a str, &'a str> {
    terminated(tag(kw), not(satisfy(is_ident_char)))
}

fn identifier(input: &str) -> IResult<&str, &str> {
    verify(
        recognize(pair(satisfy(is_ident_char), take_while(is_ident_char))),
        |s: &str| !KEYWORDS.contains(&s),
    )(input)
}

fn is_variable_name(name: &str) -> bool {
    name.chars().next().map_or(false, |c| c.is_lowercase())
}

fn term_list(input: &str) -> IResult<&str, Vec<Term>> {
    delimited(
        ws(char('(')),
        separated_list0(ws(char(',')), term),
        ws(char(')')),
    )(input)
}

fn term(input: &str) -> IResult<&str, Term> {
    let (input, name) = ws(identifier)(input)?;
    let (input, args) = opt(term_list)(input)?;
    let term = match args {
        Some(args) => Term::func(name, args),
        None if is_variable_name(name) => Term::var(name),
        None => Term::constant(name),
    };
    Ok((input, term))
}

fn equality(input: &str) -> IResult<&str, Sentence> {
    let (input, left) = term(input)?;
    let (input, _) = ws(terminated(char('='), not(char('>'))))(input)?;
    let (input, right) = term(input)?;
    Ok((input, Sentence::Atom(Atom::equality(left, right))))
}

fn predicate(input: &str) -> IResult<&str, Sentence> {
    let (input, name) = ws(identifier)(input)?;
    let (input, args) = opt(term_list)(input)?;
    Ok((input, Sentence::Atom(Atom::new(name, args.unwrap_or_default()))))
}

fn atomic(input: &str) -> IResult<&str, Sentence> {
    alt((equality, predicate))(input)
}

fn negation(input: &str) -> IResult<&str, Sentence> {
    let (input, _) = ws(alt((keyword("NOT"), tag("~"))))(input)?;
    let (input, inner) = unary(input)?;
    Ok((input, Sentence::not(inner)))
}

fn quantified(input: &str) -> IResult<&str, Sentence> {
    let (input, q) = ws(alt((keyword("FORALL"), keyword("EXISTS"))))(input)?;
    let bound = verify(identifier, |name: &str| is_variable_name(name));
    let (input, names) = separated_list1(ws(char(',')), ws(cut(bound)))(input)?;
    let (input, body) = unary(input)?;
    let vars: Vec<Variable> = names.into_iter().map(Variable::new).collect();
    let sentence = if q == "FORALL" {
        Sentence::forall(vars, body)
    } else {
        Sentence::exists(vars, body)
    };
    Ok((input, sentence))
}

fn parenthesized(input: &str) -> IResult<&str, Sentence> {
    delimited(ws(char('(')), sentence, ws(char(')')))(input)
}

fn unary(input: &str) -> IResult<&str, Sentence> {
    alt((negation, quantified, parenthesized, atomic))(input)
}

fn conjunction(input: &str) -> IResult<&str, Sentence> {
    let (input, first) = unary(input)?;
    fold_many0(
        preceded(ws(alt((keyword("AND"), tag("&")))), unary),
        move || first.clone(),
        Sentence::and,
    )(input)
}

fn disjunction(input: &str) -> IResult<&str, Sentence> {
    let (input, first) = conjunction(input)?;
    fold_many0(
        preceded(ws(alt((keyword("OR"), tag("|")))), conjunction),
        move || first.clone(),
        Sentence::or,
    )(input)
}

fn implication(input: &str) -> IResult<&str, Sentence> {
    let (input, left) = disjunction(input)?;
    let (input, right) = opt(preceded(ws(tag("=>")), implication))(input)?;
    let sentence = match right {
        Some(right) => Sentence::implies(left, right),
        None => left,
    };
    Ok((input, sentence))
}

fn biconditional(input: &str) -> IResult<&str, Sentence> {
    let (input, first) = implication(input)?;
    fold_many0(
        preceded(ws(tag("<=>")), implication),
        move || first.clone(),
        Sentence::iff,
    )(input)
}

fn sentence(input: &str) -> IResult<&str, Sentence> {
    biconditional(input)
}

/// Run a parser over the whole input
fn complete<'a, O>(
    input: &'a str,
    mut parser: impl FnMut(&'a str) -> IResult<&'a str, O>,
) -> Result<O, ParseError> {
    if input.trim().is_empty() {
        return Err(ParseError::Empty);
    }
    match parser(input) {
        Ok((rest, value)) => {
            if rest.trim().is_empty() {
                Ok(value)
            } else {
                Err(ParseError::Trailing {
                    line: None,
                    position: input.len() - rest.len(),
                    rest: rest.trim().to_string(),
                })
            }
        }
        Err(nom::Err::Failure(e)) if e.code == ErrorKind::Verify => {
            let name: String = e.input.chars().take_while(|&c| is_ident_char(c)).collect();
            Err(ParseError::Syntax {
                line: None,
                position: input.len() - e.input.len(),
                message: format!("quantified variable `{}` must start with a lowercase letter", name),
            })
        }
        Err(nom::Err::Error(e)) | Err(nom::Err::Failure(e)) => {
            if e.input.trim().is_empty() {
                Err(ParseError::UnexpectedEnd {
                    line: None,
                    message: "sentence is incomplete".to_string(),
                })
            } else {
                let near: String = e.input.trim_start().chars().take(16).collect();
                Err(ParseError::Syntax {
                    line: None,
                    position: input.len() - e.input.len(),
                    message: format!("unexpected input near `{}`", near),
                })
            }
        }
        Err(nom::Err::Incomplete(_)) => Err(ParseError::UnexpectedEnd {
            line: None,
            message: "sentence is incomplete".to_string(),
        }),
    }
}

/// Parse a single sentence
pub fn parse_sentence(input: &str) -> Result<Sentence, ParseError> {
    complete(input, sentence)
}

/// Parse a single term
pub fn parse_term(input: &str) -> Result<Term, ParseError> {
    complete(input, term)
}

/// Parse a knowledge file: one sentence per line
///
/// Blank lines and lines whose first non-blank character is `#` are
/// skipped. Errors carry the 1-based line number.
pub fn parse_knowledge(input: &str) -> Result<Vec<Sentence>, ParseError> {
    let mut sentences = Vec::new();
    for (n, line) in input.lines().enumerate() {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        sentences.push(parse_sentence(trimmed).map_err(|e| e.at_line(n + 1))?);
    }
    Ok(sentences)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roundtrip(text: &str) -> String {
        parse_sentence(text).unwrap().to_string()
    }

    #[test]
    fn test_parse_atoms_and_terms() {
        let s = parse_sentence("Knows(John, x)").unwrap();
        let atom = s.as_atom().unwrap();
        assert_eq!(atom.args[0], Term::constant("John"));
        assert_eq!(atom.args[1], Term::var("x"));

        assert_eq!(parse_term("Mother(y)").unwrap(), Term::func("Mother", vec![Term::var("y")]));
        assert_eq!(roundtrip("Raining"), "Raining");
    }

    #[test]
    fn test_parse_rule() {
        assert_eq!(
            roundtrip("FORALL x (King(x) AND Greedy(x) => Evil(x))"),
            "FORALL x ((King(x) AND Greedy(x)) => Evil(x))"
        );
    }

    #[test]
    fn test_precedence() {
        assert_eq!(roundtrip("A OR B AND C"), "(A OR (B AND C))");
        assert_eq!(roundtrip("~A | B & C"), "(NOT A OR (B AND C))");
        assert_eq!(roundtrip("A => B => C"), "(A => (B => C))");
        assert_eq!(roundtrip("A <=> B => C"), "(A <=> (B => C))");
    }

    #[test]
    fn test_parse_quantifiers() {
        let s = parse_sentence("FORALL x,y (Loves(x, y) => EXISTS z Knows(z, x))").unwrap();
        assert_eq!(s.to_string(), "FORALL x,y ((Loves(x,y) => EXISTS z (Knows(z,x))))");
        assert!(s.free_variables().is_empty());
    }

    #[test]
    fn test_quantified_variables_must_be_lowercase() {
        match parse_sentence("FORALL X P(X)") {
            Err(ParseError::Syntax { position, message, .. }) => {
                assert_eq!(position, 7);
                assert!(message.contains("`X`"));
            }
            other => panic!("expected a syntax error, got {:?}", other),
        }
        assert!(parse_sentence("EXISTS x, Y Loves(x, Y)").is_err());
        assert!(parse_sentence("FORALL x1 P(x1)").is_ok());
    }

    #[test]
    fn test_parse_equality() {
        let s = parse_sentence("F(x) = B").unwrap();
        assert!(s.as_atom().unwrap().is_equality());
        assert_eq!(roundtrip("NOT (A = B)"), "NOT (A = B)");
        assert_eq!(roundtrip("(A = B) => P(A)"), "((A = B) => P(A))");
    }

    #[test]
    fn test_keywords_are_not_identifiers() {
        assert!(parse_sentence("NOTE(A)").is_ok());
        assert!(matches!(parse_sentence("AND"), Err(ParseError::Syntax { .. })));
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!(parse_sentence("   "), Err(ParseError::Empty));
        assert!(matches!(
            parse_sentence("P(A) Q(B)"),
            Err(ParseError::Trailing { .. })
        ));
        assert!(matches!(
            parse_sentence("P(A) AND"),
            Err(ParseError::Trailing { .. })
        ));
    }

    #[test]
    fn test_parse_knowledge() {
        let text = "# kings\nKing(John)\n\n  # rules\nFORALL x (King(x) => Evil(x))\n";
        let sentences = parse_knowledge(text).unwrap();
        assert_eq!(sentences.len(), 2);

        let err = parse_knowledge("King(John)\nKing(John) Greedy(John)\n").unwrap_err();
        assert_eq!(err.line(), Some(2));
    }
}
