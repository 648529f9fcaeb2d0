//! Structured syntax errors.
//!
//! A [`SyntaxError`] records where parsing stopped and why: the offending
//! token, what would have been accepted there, and the stack of productions
//! that were in progress. [`SyntaxError::render`] turns that into a
//! `line:column` message with a caret under the offending token.

use std::fmt;

use serde::Serialize;
use smallvec::SmallVec;

use super::lexer::{Token, TokenKind};

/// Failure taxonomy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SyntaxErrorKind {
    /// The next token is not in the accepted set of the current production.
    LexicalMismatch,
    /// No alternative at a decision point accepted the upcoming tokens.
    NoViableAlternative,
    /// The token stream ran out mid-production.
    UnexpectedEndOfInput,
    /// Input nests deeper than the configured limit.
    NestingTooDeep,
}

/// One member of an accepted set: a concrete token or a named sub-grammar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Expected {
    Token(TokenKind),
    Rule(&'static str),
}

impl fmt::Display for Expected {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expected::Token(kind) => f.write_str(kind.describe()),
            Expected::Rule(name) => f.write_str(name),
        }
    }
}

/// A syntax error with enough structure to render "expected X, found Y".
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SyntaxError {
    pub kind: SyntaxErrorKind,
    /// The token the parser stopped on.
    pub token: Token,
    pub expected: SmallVec<[Expected; 8]>,
    /// Productions in progress, outermost first.
    pub productions: SmallVec<[&'static str; 8]>,
    /// Decision point that failed, for [`SyntaxErrorKind::NoViableAlternative`].
    pub decision: Option<&'static str>,
}

impl SyntaxError {
    /// `LexicalMismatch`, or `UnexpectedEndOfInput` when `token` is the end marker.
    pub fn mismatch(token: Token) -> Self {
        let kind = if token.kind == TokenKind::Eof {
            SyntaxErrorKind::UnexpectedEndOfInput
        } else {
            SyntaxErrorKind::LexicalMismatch
        };
        Self {
            kind,
            token,
            expected: SmallVec::new(),
            productions: SmallVec::new(),
            decision: None,
        }
    }

    pub fn no_viable_alternative(token: Token, decision: &'static str) -> Self {
        Self {
            kind: SyntaxErrorKind::NoViableAlternative,
            decision: Some(decision),
            ..Self::mismatch(token)
        }
    }

    pub fn nesting_too_deep(token: Token) -> Self {
        Self { kind: SyntaxErrorKind::NestingTooDeep, ..Self::mismatch(token) }
    }

    pub fn with_expected(mut self, expected: impl IntoIterator<Item = Expected>) -> Self {
        for e in expected {
            if !self.expected.contains(&e) {
                self.expected.push(e);
            }
        }
        self
    }

    pub fn with_productions(mut self, productions: &[&'static str]) -> Self {
        self.productions = productions.iter().copied().collect();
        self
    }

    /// Byte offset of the offending token.
    pub fn position(&self) -> usize {
        self.token.span.start
    }

    /// Innermost production in progress.
    pub fn production(&self) -> Option<&'static str> {
        self.productions.last().copied()
    }

    pub fn expects(&self, kind: TokenKind) -> bool {
        self.expected.contains(&Expected::Token(kind))
    }

    /// One-line message without position.
    pub fn message(&self) -> String {
        let found = describe_found(&self.token);
        match self.kind {
            SyntaxErrorKind::NestingTooDeep => format!("input nested too deeply at {found}"),
            SyntaxErrorKind::NoViableAlternative => {
                let decision = self.decision.unwrap_or("decision");
                if self.expected.is_empty() {
                    format!("no viable alternative for {decision} at {found}")
                } else {
                    format!(
                        "no viable alternative for {decision}: expected {}, found {found}",
                        join_expected(&self.expected)
                    )
                }
            }
            SyntaxErrorKind::LexicalMismatch | SyntaxErrorKind::UnexpectedEndOfInput => {
                if self.expected.is_empty() {
                    format!("unexpected {found}")
                } else {
                    format!("expected {}, found {found}", join_expected(&self.expected))
                }
            }
        }
    }

    /// Render against the source the tokens came from (spans starting at 0).
    pub fn render(&self, source: &str) -> String {
        let position = self.position().min(source.len());
        let (line, column) = line_col(source, position);
        let line_text = source.lines().nth(line - 1).unwrap_or("");
        let width = self.token.span.len().max(1).min(line_text.len().saturating_sub(column - 1).max(1));
        let gutter = line.to_string().len();

        let mut out = format!("error: {}\n", self.message());
        out.push_str(&format!("{:gutter$}--> {line}:{column}\n", ""));
        out.push_str(&format!("{:gutter$} |\n", ""));
        out.push_str(&format!("{line} | {line_text}\n"));
        out.push_str(&format!("{:gutter$} | {:pad$}{}\n", "", "", "^".repeat(width), pad = column - 1));
        if !self.productions.is_empty() {
            out.push_str(&format!("{:gutter$} = while parsing {}\n", "", self.productions.join(" > ")));
        }
        out
    }
}

impl fmt::Display for SyntaxError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Cypher syntax error at position {}: {}", self.position(), self.message())
    }
}

impl std::error::Error for SyntaxError {}

fn describe_found(token: &Token) -> String {
    match token.kind {
        TokenKind::Eof => "end of input".to_string(),
        kind if kind.is_string() => format!("string \"{}\"", token.text),
        TokenKind::Parameter => format!("parameter '${}'", token.text),
        _ => format!("'{}'", token.text),
    }
}

fn join_expected(expected: &[Expected]) -> String {
    let names: Vec<String> = expected.iter().map(ToString::to_string).collect();
    match names.as_slice() {
        [] => String::new(),
        [only] => only.clone(),
        [init @ .., last] => format!("{} or {last}", init.join(", ")),
    }
}

/// 1-based line and column (in chars) of a byte offset.
pub fn line_col(source: &str, offset: usize) -> (usize, usize) {
    let mut line = 1;
    let mut col = 1;

    for (i, c) in source.char_indices() {
        if i >= offset {
            break;
        }
        if c == '\n' {
            line += 1;
            col = 1;
        } else {
            col += 1;
        }
    }

    (line, col)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cypher::lexer::Span;

    fn token(kind: TokenKind, text: &str, start: usize) -> Token {
        Token { kind, span: Span::new(start, start + text.len()), text: text.to_string() }
    }

    #[test]
    fn test_eof_is_unexpected_end() {
        let err = SyntaxError::mismatch(token(TokenKind::Eof, "", 8));
        assert_eq!(err.kind, SyntaxErrorKind::UnexpectedEndOfInput);
        assert_eq!(err.message(), "unexpected end of input");
    }

    #[test]
    fn test_expected_set_is_deduplicated() {
        let err = SyntaxError::mismatch(token(TokenKind::Return, "RETURN", 0)).with_expected([
            Expected::Token(TokenKind::RParen),
            Expected::Token(TokenKind::Comma),
            Expected::Token(TokenKind::RParen),
        ]);
        assert_eq!(err.expected.len(), 2);
        assert_eq!(err.message(), "expected ')' or ',', found 'RETURN'");
    }

    #[test]
    fn test_no_viable_alternative_names_decision() {
        let err = SyntaxError::no_viable_alternative(token(TokenKind::Comma, ",", 5), "CALL target")
            .with_expected([Expected::Token(TokenKind::LBrace), Expected::Rule("procedure name")]);
        assert_eq!(
            err.message(),
            "no viable alternative for CALL target: expected '{' or procedure name, found ','"
        );
    }

    #[test]
    fn test_line_col() {
        let src = "MATCH (n)\nRETURN n";
        assert_eq!(line_col(src, 0), (1, 1));
        assert_eq!(line_col(src, 10), (2, 1));
        assert_eq!(line_col(src, 17), (2, 8));
    }

    #[test]
    fn test_render_points_at_token() {
        let src = "MATCH (n)\nRETURN n +";
        let err = SyntaxError::mismatch(token(TokenKind::Eof, "", src.len()))
            .with_expected([Expected::Rule("expression")])
            .with_productions(&["statement", "RETURN", "expression"]);
        let rendered = err.render(src);
        assert!(rendered.starts_with("error: expected expression, found end of input\n"));
        assert!(rendered.contains("--> 2:11"));
        assert!(rendered.contains("2 | RETURN n +\n"));
        assert!(rendered.contains("= while parsing statement > RETURN > expression"));
    }
}
