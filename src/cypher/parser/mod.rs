//! Cypher recursive descent parser.
//!
//! Parses token streams into AST nodes. The grammar is split by engine:
//! - [`clause`]: statement and clause dispatch, UNION, subqueries
//! - [`expr`]: the eleven-level expression grammar
//! - [`pattern`]: node / relationship / path patterns, quantifiers, selectors
//! - [`label`]: label expressions (`:` and `IS` forms) and type names
//! - [`command`]: index, constraint and SHOW commands
//! - [`lookahead`]: decision points, speculation and the memo cache
//!
//! All of them share the [`Parser`] cursor defined here. Every parse
//! function takes `&mut Parser` and returns `Result`; nothing recovers
//! below the statement level.

mod clause;
mod command;
mod expr;
mod label;
mod lookahead;
mod pattern;

use hashbrown::HashMap;
use smallvec::SmallVec;
use tracing::{debug, warn};

use super::ast::*;
use super::diagnostics::{Expected, SyntaxError};
use super::lexer::{Token, TokenKind};
use crate::config::{ParserConfig, RecoveryPolicy};
use crate::{Error, Result};

pub(crate) use lookahead::Decision;

/// Parser state: wraps a token slice with cursor.
///
/// The slice must end with a [`TokenKind::Eof`] token, as produced by the
/// lexer; the cursor never moves past it.
pub(crate) struct Parser<'t> {
    tokens: &'t [Token],
    pos: usize,
    depth: usize,
    max_depth: usize,
    memoize: bool,
    /// Productions in progress, outermost first.
    productions: SmallVec<[&'static str; 8]>,
    /// Decision outcomes keyed by (decision, token position); one statement only.
    memo: HashMap<(Decision, usize), bool>,
}

impl<'t> Parser<'t> {
    fn new(tokens: &'t [Token], config: &ParserConfig) -> Self {
        Self {
            tokens,
            pos: 0,
            depth: 0,
            max_depth: config.max_nesting_depth,
            memoize: config.memoize_decisions,
            productions: SmallVec::new(),
            memo: HashMap::new(),
        }
    }

    fn last_index(&self) -> usize {
        self.tokens.len().saturating_sub(1)
    }

    pub(super) fn peek(&self) -> &'t Token {
        &self.tokens[self.pos.min(self.last_index())]
    }

    pub(super) fn peek_kind(&self) -> TokenKind {
        self.peek().kind
    }

    /// Token `n` positions ahead of the cursor (`nth(0)` is `peek()`).
    pub(super) fn nth(&self, n: usize) -> &'t Token {
        &self.tokens[(self.pos + n).min(self.last_index())]
    }

    pub(super) fn nth_kind(&self, n: usize) -> TokenKind {
        self.nth(n).kind
    }

    pub(super) fn advance(&mut self) -> &'t Token {
        let tok = &self.tokens[self.pos.min(self.last_index())];
        if self.pos < self.last_index() {
            self.pos += 1;
        }
        tok
    }

    pub(super) fn at(&self, kind: TokenKind) -> bool {
        self.peek_kind() == kind
    }

    pub(super) fn at_any(&self, kinds: &[TokenKind]) -> bool {
        kinds.contains(&self.peek_kind())
    }

    pub(super) fn eat(&mut self, kind: TokenKind) -> bool {
        if self.at(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    pub(super) fn expect(&mut self, kind: TokenKind) -> Result<&'t Token> {
        if self.at(kind) {
            Ok(self.advance())
        } else {
            Err(self.unexpected([Expected::Token(kind)]))
        }
    }

    pub(super) fn expect_any(&mut self, kinds: &[TokenKind]) -> Result<&'t Token> {
        if self.at_any(kinds) {
            Ok(self.advance())
        } else {
            Err(self.unexpected(kinds.iter().map(|k| Expected::Token(*k))))
        }
    }

    // ------------------------------------------------------------------------
    // Errors
    // ------------------------------------------------------------------------

    /// Mismatch at the current token; end of input is reported as such.
    pub(super) fn unexpected(&self, expected: impl IntoIterator<Item = Expected>) -> Error {
        SyntaxError::mismatch(self.peek().clone())
            .with_expected(expected)
            .with_productions(&self.productions)
            .into()
    }

    pub(super) fn expected_rule(&self, rule: &'static str) -> Error {
        self.unexpected([Expected::Rule(rule)])
    }

    pub(super) fn no_viable(&self, decision: Decision, expected: impl IntoIterator<Item = Expected>) -> Error {
        SyntaxError::no_viable_alternative(self.peek().clone(), decision.name())
            .with_expected(expected)
            .with_productions(&self.productions)
            .into()
    }

    // ------------------------------------------------------------------------
    // Spans and cursor
    // ------------------------------------------------------------------------

    /// Start offset for a node beginning at the current token.
    pub(super) fn start(&self) -> usize {
        self.peek().span.start
    }

    /// Span from `start` to the end of the last consumed token.
    pub(super) fn span_from(&self, start: usize) -> Span {
        let end = match self.pos.checked_sub(1) {
            Some(prev) => self.tokens[prev.min(self.last_index())].span.end,
            None => start,
        };
        Span::new(start, end.max(start))
    }

    pub(super) fn mark(&self) -> usize {
        self.pos
    }

    pub(super) fn reset(&mut self, mark: usize) {
        self.pos = mark;
    }

    // ------------------------------------------------------------------------
    // Production stack and nesting
    // ------------------------------------------------------------------------

    /// Run `f` with `production` pushed on the production stack.
    pub(super) fn within<T>(
        &mut self,
        production: &'static str,
        f: impl FnOnce(&mut Self) -> Result<T>,
    ) -> Result<T> {
        self.productions.push(production);
        let result = f(self);
        self.productions.pop();
        result
    }

    /// Run `f` one nesting level deeper, failing once the configured limit is hit.
    pub(super) fn nested<T>(&mut self, f: impl FnOnce(&mut Self) -> Result<T>) -> Result<T> {
        if self.depth >= self.max_depth {
            return Err(SyntaxError::nesting_too_deep(self.peek().clone())
                .with_productions(&self.productions)
                .into());
        }
        self.depth += 1;
        let result = f(self);
        self.depth -= 1;
        result
    }

    // ------------------------------------------------------------------------
    // Names
    // ------------------------------------------------------------------------

    /// Identifiers, escaped identifiers and every keyword can act as a name.
    pub(super) fn at_name(&self) -> bool {
        self.peek_kind().is_name()
    }

    pub(super) fn symbolic_name(&mut self) -> Result<SymbolicName> {
        if !self.at_name() {
            return Err(self.expected_rule("name"));
        }
        let tok = self.advance();
        Ok(SymbolicName { name: tok.text.clone(), span: tok.span })
    }

    pub(super) fn variable(&mut self) -> Result<Variable> {
        if !self.at_name() {
            return Err(self.expected_rule("variable"));
        }
        let tok = self.advance();
        Ok(Variable { name: tok.text.clone(), span: tok.span })
    }

    /// `name (. name)*`
    pub(super) fn qualified_name(&mut self) -> Result<QualifiedName> {
        let start = self.start();
        let mut parts = vec![self.symbolic_name()?];
        while self.at(TokenKind::Dot) && self.nth_kind(1).is_name() {
            self.advance();
            parts.push(self.symbolic_name()?);
        }
        Ok(QualifiedName { parts, span: self.span_from(start) })
    }

    /// Unsigned decimal integer used for counts and bounds.
    pub(super) fn unsigned_integer(&mut self) -> Result<u64> {
        if !self.at(TokenKind::DecimalInteger) {
            return Err(self.unexpected([Expected::Token(TokenKind::DecimalInteger)]));
        }
        let digits: String = self.peek().text.chars().filter(|c| *c != '_').collect();
        match digits.parse::<u64>() {
            Ok(value) => {
                self.advance();
                Ok(value)
            }
            Err(_) => Err(self.expected_rule("integer that fits in 64 bits")),
        }
    }

    /// Reset per-statement state: memo cache, nesting, production stack.
    fn begin_statement(&mut self) {
        self.memo.clear();
        self.depth = 0;
        self.productions.clear();
    }

    /// After a statement: optional `;`, then end of input or the next statement.
    fn finish_statement(&mut self) -> Result<()> {
        if self.eat(TokenKind::Semicolon) || self.at(TokenKind::Eof) {
            Ok(())
        } else {
            Err(self.unexpected([Expected::Token(TokenKind::Semicolon), Expected::Token(TokenKind::Eof)]))
        }
    }

    fn skip_to_terminator(&mut self) {
        while !self.at(TokenKind::Eof) && !self.at(TokenKind::Semicolon) {
            self.advance();
        }
        self.eat(TokenKind::Semicolon);
    }

    fn expect_end(&self) -> Result<()> {
        if self.at(TokenKind::Eof) {
            Ok(())
        } else {
            Err(self.unexpected([Expected::Token(TokenKind::Eof)]))
        }
    }
}

// ============================================================================
// Entry points
// ============================================================================

/// Statements parsed from a script plus the errors recovered along the way.
#[derive(Debug, Clone, PartialEq, Default, serde::Serialize)]
pub struct ScriptOutcome {
    pub statements: Vec<Statement>,
    /// Failed statements, in source order.
    pub errors: Vec<SyntaxError>,
}

impl ScriptOutcome {
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Parse exactly one statement, optionally followed by `;`.
pub fn parse_statement(tokens: &[Token], config: &ParserConfig) -> Result<Statement> {
    let mut p = Parser::new(tokens, config);
    let stmt = clause::parse_statement(&mut p)?;
    p.eat(TokenKind::Semicolon);
    p.expect_end()?;
    Ok(stmt)
}

/// Parse every `;`-separated statement. Syntax errors are collected per
/// statement according to `config.recovery`.
pub fn parse_script(tokens: &[Token], config: &ParserConfig) -> ScriptOutcome {
    let mut p = Parser::new(tokens, config);
    let mut outcome = ScriptOutcome::default();

    loop {
        while p.eat(TokenKind::Semicolon) {}
        if p.at(TokenKind::Eof) {
            break;
        }

        p.begin_statement();
        let start = p.start();
        let result = clause::parse_statement(&mut p).and_then(|stmt| p.finish_statement().map(|()| stmt));
        match result {
            Ok(stmt) => {
                debug!(start, end = stmt.span().end, "parsed statement");
                outcome.statements.push(stmt);
            }
            Err(err) => {
                let err = match err {
                    Error::Syntax(e) => *e,
                    // Only the lexer produces other errors; tokens are already lexed.
                    other => {
                        warn!(error = %other, "unexpected non-syntax error");
                        break;
                    }
                };
                match config.recovery {
                    RecoveryPolicy::Abort => {
                        debug!(position = err.position(), "aborting script on syntax error");
                        outcome.errors.push(err);
                        break;
                    }
                    RecoveryPolicy::SkipToTerminator => {
                        warn!(position = err.position(), message = %err.message(), "skipping malformed statement");
                        outcome.errors.push(err);
                        p.skip_to_terminator();
                    }
                }
            }
        }
    }

    outcome
}

/// Parse a fragment with `f` and require that it consumes all tokens.
pub(crate) fn parse_fragment<T>(
    tokens: &[Token],
    config: &ParserConfig,
    f: impl FnOnce(&mut Parser<'_>) -> Result<T>,
) -> Result<T> {
    let mut p = Parser::new(tokens, config);
    let value = f(&mut p)?;
    p.expect_end()?;
    Ok(value)
}

pub(crate) fn parse_expression(tokens: &[Token], config: &ParserConfig) -> Result<Expr> {
    parse_fragment(tokens, config, expr::parse_expr)
}

pub(crate) fn parse_pattern(tokens: &[Token], config: &ParserConfig) -> Result<PatternPart> {
    parse_fragment(tokens, config, pattern::parse_pattern_part)
}

pub(crate) fn parse_label_expression(tokens: &[Token], config: &ParserConfig) -> Result<LabelExpression> {
    parse_fragment(tokens, config, |p| {
        let syntax = if p.at(TokenKind::Is) { LabelSyntax::Is } else { LabelSyntax::Colon };
        label::parse_label_expression(p, syntax, label::LabelContext::Pattern)
    })
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cypher::lexer::tokenize;

    #[test]
    fn test_cursor_never_passes_eof() {
        let tokens = tokenize("a").unwrap();
        let config = ParserConfig::default();
        let mut p = Parser::new(&tokens, &config);
        assert_eq!(p.advance().kind, TokenKind::Identifier);
        assert_eq!(p.advance().kind, TokenKind::Eof);
        assert_eq!(p.advance().kind, TokenKind::Eof);
        assert_eq!(p.nth_kind(5), TokenKind::Eof);
    }

    #[test]
    fn test_span_from_covers_consumed_tokens() {
        let tokens = tokenize("a . b").unwrap();
        let config = ParserConfig::default();
        let mut p = Parser::new(&tokens, &config);
        let start = p.start();
        p.advance();
        p.advance();
        p.advance();
        assert_eq!(p.span_from(start), Span::new(0, 5));
    }

    #[test]
    fn test_within_records_production_stack() {
        let tokens = tokenize("x").unwrap();
        let config = ParserConfig::default();
        let mut p = Parser::new(&tokens, &config);
        let err = p
            .within("outer", |p| p.within("inner", |p| p.expect(TokenKind::LParen).map(|_| ())))
            .unwrap_err();
        let syntax = err.as_syntax().unwrap();
        assert_eq!(syntax.productions.as_slice(), &["outer", "inner"]);
        assert!(p.productions.is_empty());
    }

    #[test]
    fn test_nested_limit() {
        let tokens = tokenize("x").unwrap();
        let config = ParserConfig::default().with_max_nesting_depth(2);
        let mut p = Parser::new(&tokens, &config);
        let err = p.nested(|p| p.nested(|p| p.nested(|_| Ok(())))).unwrap_err();
        assert_eq!(err.as_syntax().unwrap().kind, crate::SyntaxErrorKind::NestingTooDeep);
        assert_eq!(p.depth, 0);
    }

    #[test]
    fn test_qualified_name_accepts_keywords() {
        let tokens = tokenize("db.index.fulltext").unwrap();
        let config = ParserConfig::default();
        let mut p = Parser::new(&tokens, &config);
        let name = p.qualified_name().unwrap();
        assert_eq!(name.to_string(), "db.index.fulltext");
        assert_eq!(name.span, Span::new(0, 17));
    }

    #[test]
    fn test_script_recovers_after_bad_statement() {
        let tokens = tokenize("RETURN 1; RETURN (; RETURN 3").unwrap();
        let outcome = parse_script(&tokens, &ParserConfig::default());
        assert_eq!(outcome.statements.len(), 2);
        assert_eq!(outcome.errors.len(), 1);
    }

    #[test]
    fn test_script_abort_policy_stops() {
        let tokens = tokenize("RETURN 1; RETURN (; RETURN 3").unwrap();
        let outcome = parse_script(&tokens, &ParserConfig::strict());
        assert_eq!(outcome.statements.len(), 1);
        assert_eq!(outcome.errors.len(), 1);
    }

    #[test]
    fn test_empty_script() {
        let tokens = tokenize(" ;; ").unwrap();
        let outcome = parse_script(&tokens, &ParserConfig::default());
        assert!(outcome.statements.is_empty());
        assert!(outcome.is_ok());
    }
}
