//! # cypher-front: Grammar-Driven Cypher Front End
//!
//! Turns Cypher text into a span-carrying AST. Nothing here plans or
//! executes a query; the crate stops at syntax.
//!
//! ## Design Principles
//!
//! 1. **Parser owns nothing**: Cypher → AST is a pure function over a token slice
//! 2. **Sum-type AST**: one enum per syntactic category, exhaustively matchable
//! 3. **Explicit lookahead**: every ambiguous prefix goes through a named decision
//! 4. **Structured errors**: offending token, accepted set, production stack
//!
//! ## Quick Start
//!
//! ```rust
//! use cypher_front::ast::{Clause, Query, Statement};
//!
//! let stmt = cypher_front::parse("MATCH (a:Person)-[:KNOWS*1..3]->(b) RETURN b")?;
//! let Statement::Query(Query::Single(q)) = stmt else { unreachable!() };
//! assert!(matches!(q.clauses[0], Clause::Match(_)));
//! # Ok::<(), cypher_front::Error>(())
//! ```
//!
//! Scripts with several `;`-separated statements go through
//! [`parse_script`], which can keep going past a malformed statement:
//!
//! ```rust
//! use cypher_front::{parse_script, ParserConfig};
//!
//! let outcome = parse_script("MATCH (n) RETURN n; CREATE (", &ParserConfig::default())?;
//! assert_eq!(outcome.statements.len(), 1);
//! assert_eq!(outcome.errors.len(), 1);
//! # Ok::<(), cypher_front::Error>(())
//! ```

// ============================================================================
// Modules
// ============================================================================

pub mod config;
pub mod cypher;

// ============================================================================
// Re-exports
// ============================================================================

pub use config::{ParserConfig, RecoveryPolicy};
pub use cypher::ast;
pub use cypher::diagnostics::{Expected, SyntaxError, SyntaxErrorKind};
pub use cypher::lexer::{Span, Token, TokenKind};
pub use cypher::walk::AstRef;
pub use cypher::{
    parse, parse_expression, parse_expression_at, parse_label_expression,
    parse_label_expression_at, parse_pattern, parse_pattern_at, parse_script, parse_with,
    ScriptOutcome,
};

// ============================================================================
// Error Types
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Cypher syntax error at position {position}: {message}")]
    Lexical { position: usize, message: String },

    #[error(transparent)]
    Syntax(Box<SyntaxError>),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Byte offset the error points at, when it has one.
    pub fn position(&self) -> Option<usize> {
        match self {
            Error::Lexical { position, .. } => Some(*position),
            Error::Syntax(e) => Some(e.position()),
            Error::Config(_) | Error::Json(_) => None,
        }
    }

    /// The structured syntax error, if this is one.
    pub fn as_syntax(&self) -> Option<&SyntaxError> {
        match self {
            Error::Syntax(e) => Some(e),
            _ => None,
        }
    }
}

impl From<SyntaxError> for Error {
    fn from(e: SyntaxError) -> Self {
        Error::Syntax(Box::new(e))
    }
}

pub type Result<T> = std::result::Result<T, Error>;
