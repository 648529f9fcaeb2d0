//! Graph patterns.
//!
//! ```text
//! pattern_part := (variable '=')? selector? (shortest_path | path)
//! path         := element (relationship node | element)*
//! element      := node | '(' pattern_part (WHERE expr)? ')' quantifier?
//! node         := '(' variable? labels? properties? (WHERE expr)? ')'
//! relationship := '<'? '-' ('[' variable? labels? length? properties? (WHERE expr)? ']')? '-' '>'? quantifier?
//! quantifier   := '+' | '*' | '{' m '}' | '{' m? ',' n? '}'
//! ```
//!
//! A relationship always sits between two nodes, so a path can never start
//! or end on one. Quantifier ranges are taken as written; `{3,1}` parses.

use super::expr;
use super::label::{self, LabelContext};
use super::lookahead::PathStart;
use super::Parser;
use crate::cypher::ast::*;
use crate::cypher::diagnostics::Expected;
use crate::cypher::lexer::TokenKind;
use crate::Result;

/// Comma-separated pattern parts.
pub(super) fn parse_pattern_list(p: &mut Parser) -> Result<Vec<PatternPart>> {
    let mut patterns = vec![parse_pattern_part(p)?];
    while p.eat(TokenKind::Comma) {
        patterns.push(parse_pattern_part(p)?);
    }
    Ok(patterns)
}

pub(crate) fn parse_pattern_part(p: &mut Parser) -> Result<PatternPart> {
    p.within("pattern", |p| {
        let start = p.start();

        let variable = if p.at_name() && p.nth_kind(1) == TokenKind::Eq {
            let v = p.variable()?;
            p.advance(); // =
            Some(v)
        } else {
            None
        };

        let selector = if p.at_path_selector() { Some(parse_selector(p)?) } else { None };

        let body = if p.at_any(&[TokenKind::ShortestPath, TokenKind::AllShortestPaths])
            && p.nth_kind(1) == TokenKind::LParen
        {
            PatternBody::ShortestPath(parse_shortest_path(p)?)
        } else {
            PatternBody::Path(parse_path_pattern(p)?)
        };

        Ok(PatternPart { variable, selector, body, span: p.span_from(start) })
    })
}

/// `ANY SHORTEST`, `ALL SHORTEST`, `ANY k`, `ALL` and `SHORTEST k`, each
/// optionally followed by `PATH` / `PATHS`, or `SHORTEST k [PATH|PATHS] GROUPS`.
fn parse_selector(p: &mut Parser) -> Result<PathSelector> {
    p.within("path selector", |p| {
        let start = p.start();
        let kind = match p.advance().kind {
            TokenKind::Any if p.eat(TokenKind::Shortest) => SelectorKind::AnyShortest,
            TokenKind::Any => SelectorKind::Any { count: optional_count(p)? },
            TokenKind::All if p.eat(TokenKind::Shortest) => SelectorKind::AllShortest,
            TokenKind::All => SelectorKind::All,
            _ => {
                let count = optional_count(p)?;
                eat_path_word(p);
                if p.eat(TokenKind::Group) || p.eat(TokenKind::Groups) {
                    SelectorKind::ShortestGroups { count }
                } else {
                    SelectorKind::Shortest { count }
                }
            }
        };
        if !matches!(kind, SelectorKind::Shortest { .. } | SelectorKind::ShortestGroups { .. }) {
            eat_path_word(p);
        }
        Ok(PathSelector { kind, span: p.span_from(start) })
    })
}

fn optional_count(p: &mut Parser) -> Result<Option<u64>> {
    if p.at(TokenKind::DecimalInteger) { p.unsigned_integer().map(Some) } else { Ok(None) }
}

fn eat_path_word(p: &mut Parser) {
    if !p.eat(TokenKind::Path) {
        p.eat(TokenKind::Paths);
    }
}

/// `shortestPath((a)-[*]-(b))` / `allShortestPaths(...)`
pub(super) fn parse_shortest_path(p: &mut Parser) -> Result<ShortestPathPattern> {
    p.within("shortest path", |p| {
        let start = p.start();
        let all = p.advance().kind == TokenKind::AllShortestPaths;
        p.expect(TokenKind::LParen)?;
        let path = p.nested(parse_path_pattern)?;
        p.expect(TokenKind::RParen)?;
        Ok(ShortestPathPattern { all, path, span: p.span_from(start) })
    })
}

/// A path: starts on a node or parenthesized sub-path and never ends on a
/// relationship.
pub(crate) fn parse_path_pattern(p: &mut Parser) -> Result<PathPattern> {
    p.within("path pattern", |p| {
        let start = p.start();
        if !p.at(TokenKind::LParen) {
            return Err(p.unexpected([Expected::Token(TokenKind::LParen), Expected::Rule("node pattern")]));
        }

        let mut elements = vec![parse_path_element(p)?];
        loop {
            if at_relationship_start(p) {
                elements.push(PathElement::Relationship(parse_relationship_pattern(p)?));
                if !p.at(TokenKind::LParen) {
                    return Err(p.unexpected([Expected::Token(TokenKind::LParen), Expected::Rule("node pattern")]));
                }
                elements.push(PathElement::Node(parse_node_pattern(p)?));
            } else if p.at(TokenKind::LParen) {
                elements.push(parse_path_element(p)?);
            } else {
                break;
            }
        }

        Ok(PathPattern { elements, span: p.span_from(start) })
    })
}

fn parse_path_element(p: &mut Parser) -> Result<PathElement> {
    match p.predict_path_element() {
        PathStart::Node => Ok(PathElement::Node(parse_node_pattern(p)?)),
        PathStart::Parenthesized => Ok(PathElement::Parenthesized(parse_parenthesized_path(p)?)),
    }
}

fn at_relationship_start(p: &Parser) -> bool {
    let dash = |k: TokenKind| matches!(k, TokenKind::Minus | TokenKind::ArrowLine);
    match p.peek_kind() {
        k if dash(k) => true,
        TokenKind::Lt | TokenKind::ArrowLeftHead => dash(p.nth_kind(1)),
        _ => false,
    }
}

fn expect_dash(p: &mut Parser) -> Result<()> {
    p.expect_any(&[TokenKind::Minus, TokenKind::ArrowLine]).map(|_| ())
}

/// `(n:Label {props} WHERE pred)`
pub(super) fn parse_node_pattern(p: &mut Parser) -> Result<NodePattern> {
    p.within("node pattern", |p| {
        let start = p.start();
        p.expect(TokenKind::LParen)?;
        let variable = if p.at_element_variable() { Some(p.variable()?) } else { None };
        let labels = parse_element_labels(p)?;
        let properties = parse_properties(p)?;
        let predicate = if p.eat(TokenKind::Where) { Some(expr::parse_expr(p)?) } else { None };
        p.expect(TokenKind::RParen)?;
        Ok(NodePattern { variable, labels, properties, predicate, span: p.span_from(start) })
    })
}

/// `<-[r:TYPE*1..3 {props} WHERE pred]->` plus an optional quantifier.
pub(super) fn parse_relationship_pattern(p: &mut Parser) -> Result<RelationshipPattern> {
    p.within("relationship pattern", |p| {
        let start = p.start();
        let left_arrow = p.eat(TokenKind::Lt) || p.eat(TokenKind::ArrowLeftHead);
        expect_dash(p)?;

        let mut variable = None;
        let mut types = None;
        let mut length = None;
        let mut properties = None;
        let mut predicate = None;

        if p.eat(TokenKind::LBracket) {
            if p.at_element_variable() {
                variable = Some(p.variable()?);
            }
            types = parse_element_labels(p)?;
            if p.at(TokenKind::Star) {
                length = Some(parse_var_length(p)?);
            }
            properties = parse_properties(p)?;
            if p.eat(TokenKind::Where) {
                predicate = Some(expr::parse_expr(p)?);
            }
            p.expect(TokenKind::RBracket)?;
        }

        expect_dash(p)?;
        let right_arrow = p.eat(TokenKind::Gt) || p.eat(TokenKind::ArrowRightHead);
        let quantifier = parse_quantifier(p)?;

        Ok(RelationshipPattern {
            left_arrow,
            right_arrow,
            variable,
            types,
            length,
            properties,
            predicate,
            quantifier,
            span: p.span_from(start),
        })
    })
}

/// `((a)-[:R]->(b) WHERE pred){1,3}`
fn parse_parenthesized_path(p: &mut Parser) -> Result<ParenthesizedPath> {
    p.within("parenthesized path", |p| {
        let start = p.start();
        p.expect(TokenKind::LParen)?;
        let pattern = p.nested(parse_pattern_part)?;
        let predicate = if p.eat(TokenKind::Where) { Some(expr::parse_expr(p)?) } else { None };
        p.expect(TokenKind::RParen)?;
        let quantifier = parse_quantifier(p)?;
        Ok(ParenthesizedPath { pattern: Box::new(pattern), predicate, quantifier, span: p.span_from(start) })
    })
}

fn parse_element_labels(p: &mut Parser) -> Result<Option<LabelExpression>> {
    let syntax = match p.peek_kind() {
        TokenKind::Colon => LabelSyntax::Colon,
        TokenKind::Is => LabelSyntax::Is,
        _ => return Ok(None),
    };
    label::parse_label_expression(p, syntax, LabelContext::Pattern).map(Some)
}

/// Inline property map or parameter.
fn parse_properties(p: &mut Parser) -> Result<Option<Expr>> {
    match p.peek_kind() {
        TokenKind::LBrace => expr::parse_map_literal(p).map(Some),
        TokenKind::Parameter => {
            let tok = p.advance();
            Ok(Some(Expr::Parameter { name: tok.text.clone(), span: tok.span }))
        }
        _ => Ok(None),
    }
}

/// `*`, `*n`, `*m..n`, `*..n`, `*m..`
fn parse_var_length(p: &mut Parser) -> Result<VarLength> {
    let start = p.start();
    p.expect(TokenKind::Star)?;
    let min = optional_count(p)?;
    if p.eat(TokenKind::DotDot) {
        let max = optional_count(p)?;
        return Ok(VarLength { min, max, span: p.span_from(start) });
    }
    // `*3` means exactly three hops
    Ok(VarLength { min, max: min, span: p.span_from(start) })
}

fn parse_quantifier(p: &mut Parser) -> Result<Option<Quantifier>> {
    let start = p.start();
    let kind = match p.peek_kind() {
        TokenKind::Plus => {
            p.advance();
            QuantifierKind::Plus
        }
        TokenKind::Star => {
            p.advance();
            QuantifierKind::Star
        }
        TokenKind::LBrace if p.at_brace_quantifier() => p.within("quantifier", |p| {
            p.advance(); // {
            let lower = optional_count(p)?;
            let kind = if p.eat(TokenKind::Comma) {
                QuantifierKind::Interval { lower, upper: optional_count(p)? }
            } else {
                match lower {
                    Some(n) => QuantifierKind::Fixed(n),
                    None => return Err(p.unexpected([Expected::Token(TokenKind::DecimalInteger)])),
                }
            };
            p.expect(TokenKind::RBrace)?;
            Ok(kind)
        })?,
        _ => return Ok(None),
    };
    Ok(Some(Quantifier { kind, span: p.span_from(start) }))
}
