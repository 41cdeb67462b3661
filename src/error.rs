//! Structured error handling for folr
//!
//! Provides a unified error type with:
//! - Error codes for programmatic handling
//! - Structured, JSON-friendly error output
//! - Context preservation through error chains
//! - Process exit status mapping for the CLI
//!
//! Running out of a resource bound during inference is not an error; it
//! is reported through the inference result. Errors cover malformed input,
//! unsatisfiable tells, procedures asked about clauses they cannot handle,
//! configuration and I/O.
//!
//! # Example
//!
//! ```rust
//! use folr::error::ErrorCode;
//! use folr::{BackwardChaining, KnowledgeBase};
//!
//! let mut kb = KnowledgeBase::with_procedure(Box::new(BackwardChaining::default()));
//! kb.tell_text("P(A) OR Q(A)").unwrap();
//! let err = kb.ask_text("P(A)").unwrap_err();
//! assert_eq!(err.code, ErrorCode::NonDefiniteClause);
//! assert_eq!(err.exit_code(), 70);
//! ```

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::config::ConfigError;
use crate::parser::ParseError;

// ============================================================================
// Error Codes
// ============================================================================

/// Unique error codes for programmatic error handling
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // Parse errors (1xxx)
    /// Generic parse error
    ParseError = 1000,
    /// Unexpected token in a sentence
    InvalidSyntax = 1001,
    /// Unexpected end of input
    UnexpectedEof = 1002,
    /// Input was empty
    EmptyInput = 1003,
    /// Malformed JSON
    InvalidFormat = 1004,

    // Knowledge base errors (2xxx)
    /// A told sentence clausifies to the empty clause
    UnsatisfiableSentence = 2001,

    // Inference errors (3xxx)
    /// A Horn-only procedure met a non-definite clause
    NonDefiniteClause = 3001,
    /// The procedure cannot answer this form of query
    UnsupportedQuery = 3002,

    // Config errors (7xxx)
    /// Generic config error
    ConfigError = 7000,
    /// Config file not found
    ConfigNotFound = 7001,
    /// Invalid config syntax
    InvalidConfigSyntax = 7002,
    /// Unknown profile
    UnknownProfile = 7003,
    /// Invalid config value
    InvalidConfigValue = 7004,

    // I/O errors (8xxx)
    /// Generic I/O error
    IoError = 8000,
    /// File not found
    FileNotFound = 8001,
    /// File access denied
    FileAccessDenied = 8002,

    // Internal errors (9xxx)
    /// Internal error
    InternalError = 9000,
}

impl ErrorCode {
    /// Get the numeric code value
    pub fn code(&self) -> u32 {
        *self as u32
    }

    /// Get a short description of the error code
    pub fn description(&self) -> &'static str {
        match self {
            ErrorCode::ParseError => "Parse error",
            ErrorCode::InvalidSyntax => "Invalid syntax",
            ErrorCode::UnexpectedEof => "Unexpected end of input",
            ErrorCode::EmptyInput => "Empty input",
            ErrorCode::InvalidFormat => "Invalid format",

            ErrorCode::UnsatisfiableSentence => "Unsatisfiable sentence",

            ErrorCode::NonDefiniteClause => "Non-definite clause",
            ErrorCode::UnsupportedQuery => "Unsupported query",

            ErrorCode::ConfigError => "Configuration error",
            ErrorCode::ConfigNotFound => "Configuration file not found",
            ErrorCode::InvalidConfigSyntax => "Invalid configuration syntax",
            ErrorCode::UnknownProfile => "Unknown profile",
            ErrorCode::InvalidConfigValue => "Invalid configuration value",

            ErrorCode::IoError => "I/O error",
            ErrorCode::FileNotFound => "File not found",
            ErrorCode::FileAccessDenied => "File access denied",

            ErrorCode::InternalError => "Internal error",
        }
    }

    /// Process exit status for this error
    ///
    /// Follows the BSD `sysexits` conventions.
    pub fn exit_code(&self) -> i32 {
        match self {
            // EX_DATAERR
            ErrorCode::ParseError
            | ErrorCode::InvalidSyntax
            | ErrorCode::UnexpectedEof
            | ErrorCode::EmptyInput
            | ErrorCode::InvalidFormat
            | ErrorCode::UnsatisfiableSentence => 65,

            // EX_SOFTWARE
            ErrorCode::NonDefiniteClause
            | ErrorCode::UnsupportedQuery
            | ErrorCode::InternalError => 70,

            // EX_NOINPUT
            ErrorCode::FileNotFound => 66,

            // EX_IOERR
            ErrorCode::IoError => 74,

            // EX_NOPERM
            ErrorCode::FileAccessDenied => 77,

            // EX_CONFIG
            ErrorCode::ConfigError
            | ErrorCode::ConfigNotFound
            | ErrorCode::InvalidConfigSyntax
            | ErrorCode::UnknownProfile
            | ErrorCode::InvalidConfigValue => 78,
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.description())
    }
}

// ============================================================================
// Error Context
// ============================================================================

/// Additional context information for an error
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ErrorContext {
    /// Key-value pairs of context information
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub fields: HashMap<String, String>,
    /// Source location (file:line)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    /// Stack of error causes
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub causes: Vec<String>,
}

impl ErrorContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn field(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }

    pub fn at(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    pub fn cause(mut self, cause: impl Into<String>) -> Self {
        self.causes.push(cause.into());
        self
    }
}

// ============================================================================
// Main Error Type
// ============================================================================

/// The main error type for folr
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FolError {
    /// Error code for programmatic handling
    pub code: ErrorCode,
    /// Human-readable error message
    pub message: String,
    /// Additional context
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<ErrorContext>,
    /// Hint for resolving the error
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
}

impl FolError {
    /// Create a new error with a code and message
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            context: None,
            hint: None,
        }
    }

    // ========================================================================
    // Factory methods for common error types
    // ========================================================================

    pub fn parse(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ParseError, message)
    }

    /// A told sentence whose CNF contains the empty clause
    pub fn unsatisfiable(sentence: impl fmt::Display, cnf: impl fmt::Display) -> Self {
        Self::new(
            ErrorCode::UnsatisfiableSentence,
            format!("sentence {} is unsatisfiable, its CNF is {}", sentence, cnf),
        )
        .with_context("sentence", sentence.to_string())
        .with_context("cnf", cnf.to_string())
    }

    /// A Horn-only procedure found a non-definite clause
    pub fn non_definite(procedure: &str, clause: impl fmt::Display) -> Self {
        Self::new(
            ErrorCode::NonDefiniteClause,
            format!("{} requires definite clauses, found {}", procedure, clause),
        )
        .with_context("procedure", procedure)
        .with_context("clause", clause.to_string())
        .with_hint("Use a resolution procedure such as otter or model-elimination")
    }

    pub fn unsupported_query(procedure: &str, query: impl fmt::Display) -> Self {
        Self::new(
            ErrorCode::UnsupportedQuery,
            format!("{} cannot answer query {}", procedure, query),
        )
        .with_context("procedure", procedure)
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ConfigError, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InternalError, message)
    }

    // ========================================================================
    // Builder methods
    // ========================================================================

    /// Set the error code
    pub fn with_code(mut self, code: ErrorCode) -> Self {
        self.code = code;
        self
    }

    /// Add context to the error
    pub fn with_context(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        let ctx = self.context.get_or_insert_with(ErrorContext::new);
        ctx.fields.insert(key.into(), value.into());
        self
    }

    /// Add a cause to the error chain
    pub fn with_cause(mut self, cause: impl Into<String>) -> Self {
        let ctx = self.context.get_or_insert_with(ErrorContext::new);
        ctx.causes.push(cause.into());
        self
    }

    /// Add source location
    pub fn at(mut self, location: impl Into<String>) -> Self {
        let ctx = self.context.get_or_insert_with(ErrorContext::new);
        ctx.location = Some(location.into());
        self
    }

    /// Add a hint for resolving the error
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    pub fn exit_code(&self) -> i32 {
        self.code.exit_code()
    }

    /// Convert to JSON string
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| {
            format!(r#"{{"code":"INTERNAL_ERROR","message":"{}"}}"#, self.message)
        })
    }
}

impl fmt::Display for FolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code.code(), self.message)?;

        if let Some(ref ctx) = self.context {
            if let Some(ref loc) = ctx.location {
                write!(f, " at {}", loc)?;
            }
            if !ctx.causes.is_empty() {
                write!(f, "\nCaused by:")?;
                for cause in &ctx.causes {
                    write!(f, "\n  - {}", cause)?;
                }
            }
        }

        if let Some(ref hint) = self.hint {
            write!(f, "\nHint: {}", hint)?;
        }

        Ok(())
    }
}

impl std::error::Error for FolError {}

// ============================================================================
// Conversions from other error types
// ============================================================================

impl From<std::io::Error> for FolError {
    fn from(err: std::io::Error) -> Self {
        use std::io::ErrorKind;
        let code = match err.kind() {
            ErrorKind::NotFound => ErrorCode::FileNotFound,
            ErrorKind::PermissionDenied => ErrorCode::FileAccessDenied,
            _ => ErrorCode::IoError,
        };
        FolError::new(code, err.to_string())
    }
}

impl From<serde_json::Error> for FolError {
    fn from(err: serde_json::Error) -> Self {
        FolError::parse(err.to_string())
            .with_code(ErrorCode::InvalidFormat)
            .with_context("format", "JSON")
    }
}

impl From<toml::de::Error> for FolError {
    fn from(err: toml::de::Error) -> Self {
        FolError::config(err.to_string()).with_code(ErrorCode::InvalidConfigSyntax)
    }
}

impl From<ParseError> for FolError {
    fn from(err: ParseError) -> Self {
        let code = match err {
            ParseError::Empty => ErrorCode::EmptyInput,
            ParseError::UnexpectedEnd { .. } => ErrorCode::UnexpectedEof,
            ParseError::Syntax { .. } | ParseError::Trailing { .. } => ErrorCode::InvalidSyntax,
        };
        let mut error = FolError::new(code, err.to_string());
        if let Some(line) = err.line() {
            error = error.with_context("line", line.to_string());
        }
        error
    }
}

impl From<ConfigError> for FolError {
    fn from(err: ConfigError) -> Self {
        let code = match &err {
            ConfigError::Io(_) => ErrorCode::ConfigNotFound,
            ConfigError::Parse(_) => ErrorCode::InvalidConfigSyntax,
            ConfigError::Serialize(_) => ErrorCode::InternalError,
            ConfigError::UnknownProfile(_) => ErrorCode::UnknownProfile,
            ConfigError::InvalidValue(_) => ErrorCode::InvalidConfigValue,
        };
        let error = FolError::new(code, err.to_string());
        match err {
            ConfigError::UnknownProfile(_) => error.with_hint(
                "Built-in profiles: horn, saturation, exhaustive, quick",
            ),
            _ => error,
        }
    }
}

// ============================================================================
// Result type alias
// ============================================================================

/// A Result type using FolError
pub type FolResult<T> = Result<T, FolError>;

// ============================================================================
// Macros for convenient error creation
// ============================================================================

/// Create a FolError with context from the current location
#[macro_export]
macro_rules! fol_error {
    ($code:expr, $msg:expr) => {
        $crate::error::FolError::new($code, $msg)
            .at(format!("{}:{}", file!(), line!()))
    };
    ($code:expr, $fmt:expr, $($arg:tt)*) => {
        $crate::error::FolError::new($code, format!($fmt, $($arg)*))
            .at(format!("{}:{}", file!(), line!()))
    };
}

/// Bail out early with an error
#[macro_export]
macro_rules! fol_bail {
    ($code:expr, $msg:expr) => {
        return Err($crate::fol_error!($code, $msg))
    };
    ($code:expr, $fmt:expr, $($arg:tt)*) => {
        return Err($crate::fol_error!($code, $fmt, $($arg)*))
    };
}

/// Ensure a condition holds, or return an error
#[macro_export]
macro_rules! fol_ensure {
    ($cond:expr, $code:expr, $msg:expr) => {
        if !$cond {
            $crate::fol_bail!($code, $msg);
        }
    };
    ($cond:expr, $code:expr, $fmt:expr, $($arg:tt)*) => {
        if !$cond {
            $crate::fol_bail!($code, $fmt, $($arg)*);
        }
    };
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_code_families() {
        let cases = [
            (ErrorCode::InvalidSyntax, 1001, 65),
            (ErrorCode::UnsatisfiableSentence, 2001, 65),
            (ErrorCode::NonDefiniteClause, 3001, 70),
            (ErrorCode::UnsupportedQuery, 3002, 70),
            (ErrorCode::InternalError, 9000, 70),
        ];
        for (code, number, exit) in cases {
            assert_eq!(code.code(), number);
            assert_eq!(code.exit_code(), exit);
        }
    }

    #[test]
    fn test_error_with_context() {
        let err = FolError::new(ErrorCode::UnsupportedQuery, "disjunctive query")
            .with_context("procedure", "otter")
            .with_context("query", "Evil(x)");

        let ctx = err.context.as_ref().unwrap();
        assert_eq!(ctx.fields.get("procedure").map(String::as_str), Some("otter"));
        assert_eq!(ctx.fields.get("query").map(String::as_str), Some("Evil(x)"));
    }

    #[test]
    fn test_unsatisfiable_names_sentence_and_cnf() {
        let err = FolError::unsatisfiable("NOT (A = A)", "{[]}");
        assert_eq!(err.code, ErrorCode::UnsatisfiableSentence);
        assert!(err.message.contains("NOT (A = A)"));
        assert!(err.message.contains("{[]}"));
        assert_eq!(err.exit_code(), 65);
    }

    #[test]
    fn test_non_definite_has_hint() {
        let err = FolError::non_definite("forward-chaining", "[P, Q]");
        assert_eq!(err.code, ErrorCode::NonDefiniteClause);
        assert!(err.message.contains("[P, Q]"));
        assert!(err.hint.is_some());
        assert_eq!(err.exit_code(), 70);
    }

    #[test]
    fn test_error_to_json() {
        let err = FolError::unsupported_query("backward-chaining", "(P OR Q)");
        let json = err.to_json();
        assert!(json.contains("UNSUPPORTED_QUERY"));
        assert!(json.contains("backward-chaining"));
    }

    #[test]
    fn test_error_display() {
        let err = FolError::parse("expected ')'")
            .at("kb.fol:3")
            .with_cause("input ended inside FORALL x (King(x)")
            .with_hint("balance the parentheses");

        let display = err.to_string();
        assert!(display.contains("[1000]"));
        assert!(display.contains("kb.fol:3"));
        assert!(display.contains("inside FORALL"));
        assert!(display.contains("balance the parentheses"));
    }

    #[test]
    fn test_io_error_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err: FolError = io.into();
        assert_eq!(err.code, ErrorCode::FileNotFound);
        assert_eq!(err.exit_code(), 66);
    }

    #[test]
    fn test_macros() {
        fn check(n: usize) -> FolResult<usize> {
            fol_ensure!(n > 0, ErrorCode::InternalError, "n must be positive, got {}", n);
            Ok(n)
        }
        assert!(check(1).is_ok());
        let err = check(0).unwrap_err();
        assert!(err.message.contains("got 0"));
        assert!(err.context.unwrap().location.is_some());
    }
}
