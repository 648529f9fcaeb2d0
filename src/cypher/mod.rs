//! # Cypher Language
//!
//! Grammar-driven Cypher parser producing a span-carrying AST.
//! Pure functions over the input text: no I/O, no global mutable state.

pub mod ast;
pub mod diagnostics;
pub mod lexer;
pub mod parser;
pub mod precedence;
pub mod walk;

use crate::config::ParserConfig;
use crate::Result;
use ast::{Expr, LabelExpression, PatternPart, Statement};

pub use parser::ScriptOutcome;

/// Parse a Cypher query string into an AST.
pub fn parse(query: &str) -> Result<Statement> {
    parse_with(query, &ParserConfig::default())
}

/// Parse one statement under an explicit configuration.
pub fn parse_with(query: &str, config: &ParserConfig) -> Result<Statement> {
    config.validate()?;
    let tokens = lexer::tokenize(query)?;
    parser::parse_statement(&tokens, config)
}

/// Parse a `;`-separated script. Lexical errors fail the whole call;
/// syntax errors are collected per statement in the outcome.
pub fn parse_script(script: &str, config: &ParserConfig) -> Result<ScriptOutcome> {
    config.validate()?;
    let tokens = lexer::tokenize(script)?;
    Ok(parser::parse_script(&tokens, config))
}

/// Parse a standalone expression; the whole input must be consumed.
pub fn parse_expression(input: &str) -> Result<Expr> {
    parse_expression_at(input, 0)
}

/// Like [`parse_expression`], with spans offset by `base`.
pub fn parse_expression_at(input: &str, base: usize) -> Result<Expr> {
    let tokens = lexer::tokenize_at(input, base)?;
    parser::parse_expression(&tokens, &ParserConfig::default())
}

/// Parse a standalone pattern part: `p = (a)-[:R]->(b)`.
pub fn parse_pattern(input: &str) -> Result<PatternPart> {
    parse_pattern_at(input, 0)
}

pub fn parse_pattern_at(input: &str, base: usize) -> Result<PatternPart> {
    let tokens = lexer::tokenize_at(input, base)?;
    parser::parse_pattern(&tokens, &ParserConfig::default())
}

/// Parse a label expression including its leading `:` or `IS`.
pub fn parse_label_expression(input: &str) -> Result<LabelExpression> {
    parse_label_expression_at(input, 0)
}

pub fn parse_label_expression_at(input: &str, base: usize) -> Result<LabelExpression> {
    let tokens = lexer::tokenize_at(input, base)?;
    parser::parse_label_expression(&tokens, &ParserConfig::default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RecoveryPolicy;

    #[test]
    fn test_parse_rejects_invalid_config() {
        let config = ParserConfig::default().with_max_nesting_depth(0);
        assert!(matches!(parse_with("RETURN 1", &config), Err(crate::Error::Config(_))));
    }

    #[test]
    fn test_lexical_error_fails_script() {
        let err = parse_script("RETURN 'open", &ParserConfig::default()).unwrap_err();
        assert!(matches!(err, crate::Error::Lexical { .. }));
    }

    #[test]
    fn test_fragment_offsets() {
        let e = parse_expression_at("a + 1", 10).unwrap();
        assert_eq!(e.span(), ast::Span::new(10, 15));
        let l = parse_label_expression_at("IS A|B", 4).unwrap();
        assert_eq!(l.span, ast::Span::new(4, 10));
        let p = parse_pattern_at("(a)-->(b)", 2).unwrap();
        assert_eq!(p.span, ast::Span::new(2, 11));
    }

    #[test]
    fn test_script_policy_from_config() {
        let outcome = parse_script("RETURN ; RETURN 2", &ParserConfig::strict()).unwrap();
        assert_eq!(outcome.errors.len(), 1);
        assert!(outcome.statements.is_empty());

        let config = ParserConfig::default().with_recovery(RecoveryPolicy::SkipToTerminator);
        let outcome = parse_script("RETURN ; RETURN 2", &config).unwrap();
        assert_eq!(outcome.errors.len(), 1);
        assert_eq!(outcome.statements.len(), 1);
    }
}
