//! Expressions, outermost level first.
//!
//! | level | form                                             |
//! |-------|--------------------------------------------------|
//! | 11-9  | `OR`, `XOR`, `AND` (table driven)                 |
//! | 8     | `NOT` prefix stack                               |
//! |       | comparison chain `a < b <= c`                    |
//! | 7     | one predicate suffix: `=~ STARTS ENDS CONTAINS IN IS ::` |
//! | 6-4   | `+ - \|\|`, `* / %`, `^` (table driven)          |
//! | 3     | unary `+` / `-`                                  |
//! | 2     | postfix `.key`, `[i]`, `[a..b]`, `:Label`, `IS Label` |
//! | 1     | atoms                                            |
//!
//! A node's span starts at the token where its level began, so a binary
//! node built over `(a + b) * c` starts at the opening parenthesis.

use super::clause;
use super::label::{self, LabelContext};
use super::lookahead::{BracketForm, IsPredicate};
use super::pattern;
use super::Parser;
use crate::cypher::ast::*;
use crate::cypher::diagnostics::Expected;
use crate::cypher::lexer::TokenKind;
use crate::cypher::precedence::{comparison_operator, Assoc, ADDITIVE_LEVEL, OR_LEVEL, PRECEDENCE};
use crate::Result;

/// Parse a full expression.
pub(crate) fn parse_expr(p: &mut Parser) -> Result<Expr> {
    p.nested(|p| p.within("expression", |p| parse_binary(p, OR_LEVEL)))
}

/// Comma-separated expressions (at least one).
pub(super) fn parse_expr_list(p: &mut Parser) -> Result<Vec<Expr>> {
    let mut items = vec![parse_expr(p)?];
    while p.eat(TokenKind::Comma) {
        items.push(parse_expr(p)?);
    }
    Ok(items)
}

// ============================================================================
// Binary levels
// ============================================================================

fn parse_binary(p: &mut Parser, index: usize) -> Result<Expr> {
    let Some(level) = PRECEDENCE.at(index) else {
        return parse_unary(p);
    };
    let start = p.start();
    let mut left = parse_operand(p, level.number, index)?;

    while let Some(op) = level.operator(p.peek_kind()) {
        p.advance();
        let right = match level.assoc {
            Assoc::Left => parse_operand(p, level.number, index)?,
            Assoc::Right => parse_binary(p, index)?,
        };
        left = Expr::BinaryOp { left: Box::new(left), op, right: Box::new(right), span: p.span_from(start) };
    }
    Ok(left)
}

/// Operand of a table level: the next table level, except that `AND`
/// operands go through the `NOT` stack and `^` operands are unary.
fn parse_operand(p: &mut Parser, number: u8, index: usize) -> Result<Expr> {
    match number {
        9 => parse_not(p),
        4 => parse_unary(p),
        _ => parse_binary(p, index + 1),
    }
}

fn parse_not(p: &mut Parser) -> Result<Expr> {
    if !p.at(TokenKind::Not) {
        return parse_comparison(p);
    }
    let start = p.start();
    p.advance();
    let expr = p.nested(parse_not)?;
    Ok(Expr::UnaryOp { op: UnaryOp::Not, expr: Box::new(expr), span: p.span_from(start) })
}

/// `a = b` stays binary; `a < b <= c` becomes a chain.
fn parse_comparison(p: &mut Parser) -> Result<Expr> {
    let start = p.start();
    let first = parse_predicate(p)?;
    let Some(op) = comparison_operator(p.peek_kind()) else {
        return Ok(first);
    };
    p.advance();
    let second = parse_predicate(p)?;

    if comparison_operator(p.peek_kind()).is_none() {
        return Ok(Expr::BinaryOp {
            left: Box::new(first),
            op,
            right: Box::new(second),
            span: p.span_from(start),
        });
    }

    let mut operands = vec![first, second];
    let mut ops = vec![op];
    while let Some(op) = comparison_operator(p.peek_kind()) {
        p.advance();
        ops.push(op);
        operands.push(parse_predicate(p)?);
    }
    Ok(Expr::ComparisonChain { operands, ops, span: p.span_from(start) })
}

// ============================================================================
// Level 7: predicate suffixes
// ============================================================================

/// A predicate suffix without its left-hand side. Shared with simple CASE,
/// where the case operand is the implied left-hand side.
enum Suffix {
    String(StringOp, Expr),
    In(Expr),
    IsNull { negated: bool },
    IsTyped { ty: TypeRef, negated: bool },
    IsNormalized { form: Option<NormalForm>, negated: bool },
}

impl Suffix {
    fn apply(self, left: Expr, span: Span) -> Expr {
        let expr = Box::new(left);
        match self {
            Suffix::String(op, right) => Expr::StringOp { left: expr, op, right: Box::new(right), span },
            Suffix::In(list) => Expr::In { expr, list: Box::new(list), span },
            Suffix::IsNull { negated } => Expr::IsNull { expr, negated, span },
            Suffix::IsTyped { ty, negated } => Expr::IsTyped { expr, ty, negated, span },
            Suffix::IsNormalized { form, negated } => Expr::IsNormalized { expr, form, negated, span },
        }
    }

    fn into_when(self, span: Span) -> WhenOperand {
        match self {
            Suffix::String(op, right) => WhenOperand::StringOp { op, right, span },
            Suffix::In(list) => WhenOperand::In { list, span },
            Suffix::IsNull { negated } => WhenOperand::IsNull { negated, span },
            Suffix::IsTyped { ty, negated } => WhenOperand::IsTyped { ty, negated, span },
            Suffix::IsNormalized { form, negated } => WhenOperand::IsNormalized { form, negated, span },
        }
    }
}

fn parse_predicate(p: &mut Parser) -> Result<Expr> {
    let start = p.start();
    let operand = parse_binary(p, ADDITIVE_LEVEL)?;
    match parse_suffix(p)? {
        Some(suffix) => Ok(suffix.apply(operand, p.span_from(start))),
        None => Ok(operand),
    }
}

fn parse_suffix(p: &mut Parser) -> Result<Option<Suffix>> {
    let suffix = match p.peek_kind() {
        TokenKind::RegexMatch => {
            p.advance();
            Suffix::String(StringOp::RegexMatch, parse_binary(p, ADDITIVE_LEVEL)?)
        }
        TokenKind::Starts | TokenKind::Ends => {
            let op = if p.advance().kind == TokenKind::Starts { StringOp::StartsWith } else { StringOp::EndsWith };
            p.expect(TokenKind::With)?;
            Suffix::String(op, parse_binary(p, ADDITIVE_LEVEL)?)
        }
        TokenKind::Contains => {
            p.advance();
            Suffix::String(StringOp::Contains, parse_binary(p, ADDITIVE_LEVEL)?)
        }
        TokenKind::In => {
            p.advance();
            Suffix::In(parse_binary(p, ADDITIVE_LEVEL)?)
        }
        TokenKind::DoubleColon => {
            p.advance();
            Suffix::IsTyped { ty: label::parse_type(p)?, negated: false }
        }
        TokenKind::Is => {
            let negated = p.nth_kind(1) == TokenKind::Not;
            let predicate = p.predict_is_predicate(if negated { 2 } else { 1 })?;
            p.advance(); // IS
            if negated {
                p.advance();
            }
            match predicate {
                IsPredicate::Null => {
                    p.expect(TokenKind::Null)?;
                    Suffix::IsNull { negated }
                }
                IsPredicate::Typed => {
                    p.expect_any(&[TokenKind::Typed, TokenKind::DoubleColon])?;
                    Suffix::IsTyped { ty: label::parse_type(p)?, negated }
                }
                IsPredicate::Normalized => {
                    let form = parse_normal_form(p);
                    p.expect(TokenKind::Normalized)?;
                    Suffix::IsNormalized { form, negated }
                }
            }
        }
        _ => return Ok(None),
    };
    Ok(Some(suffix))
}

fn parse_normal_form(p: &mut Parser) -> Option<NormalForm> {
    let form = match p.peek_kind() {
        TokenKind::Nfc => NormalForm::Nfc,
        TokenKind::Nfd => NormalForm::Nfd,
        TokenKind::Nfkc => NormalForm::Nfkc,
        TokenKind::Nfkd => NormalForm::Nfkd,
        _ => return None,
    };
    p.advance();
    Some(form)
}

// ============================================================================
// Levels 3 and 2: sign and postfix
// ============================================================================

fn parse_unary(p: &mut Parser) -> Result<Expr> {
    let start = p.start();
    match p.peek_kind() {
        // `-1` is a literal, not a negation
        TokenKind::Minus if p.nth_kind(1).is_number() => parse_postfix(p),
        TokenKind::Minus | TokenKind::Plus => {
            let op = if p.advance().kind == TokenKind::Minus { UnaryOp::Negate } else { UnaryOp::Plus };
            let expr = parse_postfix(p)?;
            Ok(Expr::UnaryOp { op, expr: Box::new(expr), span: p.span_from(start) })
        }
        _ => parse_postfix(p),
    }
}

fn parse_postfix(p: &mut Parser) -> Result<Expr> {
    let start = p.start();
    let mut expr = parse_atom(p)?;
    loop {
        expr = match p.peek_kind() {
            TokenKind::Dot if p.nth_kind(1).is_name() => {
                p.advance();
                let key = p.symbolic_name()?;
                Expr::Property { expr: Box::new(expr), key, span: p.span_from(start) }
            }
            TokenKind::LBracket => parse_subscript(p, expr, start)?,
            TokenKind::Colon => {
                let labels = label::parse_label_expression(p, LabelSyntax::Colon, LabelContext::Expression)?;
                Expr::LabelTest { expr: Box::new(expr), labels, span: p.span_from(start) }
            }
            TokenKind::Is if p.at_postfix_is_label() => {
                let labels = label::parse_label_expression(p, LabelSyntax::Is, LabelContext::Expression)?;
                Expr::LabelTest { expr: Box::new(expr), labels, span: p.span_from(start) }
            }
            _ => return Ok(expr),
        };
    }
}

/// `[i]`, `[a..b]`, `[..b]`, `[a..]`
fn parse_subscript(p: &mut Parser, expr: Expr, start: usize) -> Result<Expr> {
    p.expect(TokenKind::LBracket)?;
    let expr = Box::new(expr);

    let from = if p.at(TokenKind::DotDot) { None } else { Some(Box::new(parse_expr(p)?)) };
    if !p.eat(TokenKind::DotDot) {
        p.expect(TokenKind::RBracket)?;
        return match from {
            Some(index) => Ok(Expr::Index { expr, index, span: p.span_from(start) }),
            None => Err(p.expected_rule("expression")),
        };
    }
    let to = if p.at(TokenKind::RBracket) { None } else { Some(Box::new(parse_expr(p)?)) };
    p.expect(TokenKind::RBracket)?;
    Ok(Expr::Slice { expr, from, to, span: p.span_from(start) })
}

/// Property target of SET / REMOVE: a variable followed by one or more
/// `.key` or `[expr]` steps.
pub(super) fn parse_property_target(p: &mut Parser) -> Result<Expr> {
    let start = p.start();
    let mut expr = Expr::Variable(p.variable()?);
    loop {
        expr = match p.peek_kind() {
            TokenKind::Dot => {
                p.advance();
                let key = p.symbolic_name()?;
                Expr::Property { expr: Box::new(expr), key, span: p.span_from(start) }
            }
            TokenKind::LBracket => {
                p.advance();
                let index = parse_expr(p)?;
                p.expect(TokenKind::RBracket)?;
                Expr::Index { expr: Box::new(expr), index: Box::new(index), span: p.span_from(start) }
            }
            _ => break,
        };
    }
    match expr {
        Expr::Variable(_) => Err(p.unexpected([Expected::Token(TokenKind::Dot), Expected::Token(TokenKind::LBracket)])),
        expr => Ok(expr),
    }
}

// ============================================================================
// Level 1: atoms
// ============================================================================

fn number_literal(kind: TokenKind, text: String) -> Literal {
    match kind {
        TokenKind::HexInteger => Literal::Integer { text, radix: Radix::Hex },
        TokenKind::OctalInteger => Literal::Integer { text, radix: Radix::Octal },
        TokenKind::DecimalFloat => Literal::Float(text),
        _ => Literal::Integer { text, radix: Radix::Decimal },
    }
}

fn keyword_literal(p: &mut Parser, value: Literal) -> Result<Expr> {
    let tok = p.advance();
    Ok(Expr::Literal { value, span: tok.span })
}

fn parse_atom(p: &mut Parser) -> Result<Expr> {
    let start = p.start();
    let kind = p.peek_kind();

    match kind {
        k if k.is_number() => {
            let tok = p.advance();
            Ok(Expr::Literal { value: number_literal(k, tok.text.clone()), span: tok.span })
        }
        TokenKind::Minus if p.nth_kind(1).is_number() => {
            p.advance();
            let tok = p.advance();
            let value = number_literal(tok.kind, format!("-{}", tok.text));
            Ok(Expr::Literal { value, span: p.span_from(start) })
        }
        k if k.is_string() => {
            let tok = p.advance();
            Ok(Expr::Literal { value: Literal::String(tok.text.clone()), span: tok.span })
        }
        TokenKind::Parameter => {
            let tok = p.advance();
            Ok(Expr::Parameter { name: tok.text.clone(), span: tok.span })
        }
        TokenKind::True => keyword_literal(p, Literal::Bool(true)),
        TokenKind::False => keyword_literal(p, Literal::Bool(false)),
        TokenKind::Null => keyword_literal(p, Literal::Null),
        TokenKind::Inf | TokenKind::Infinity => keyword_literal(p, Literal::Infinity),
        TokenKind::NaN => keyword_literal(p, Literal::NaN),

        TokenKind::Case => parse_case(p),
        TokenKind::Count
            if p.nth_kind(1) == TokenKind::LParen
                && p.nth_kind(2) == TokenKind::Star
                && p.nth_kind(3) == TokenKind::RParen =>
        {
            for _ in 0..4 {
                p.advance();
            }
            Ok(Expr::CountStar { span: p.span_from(start) })
        }
        TokenKind::Count | TokenKind::Exists | TokenKind::Collect if p.nth_kind(1) == TokenKind::LBrace => {
            parse_subquery_expr(p)
        }
        TokenKind::All | TokenKind::Any | TokenKind::None | TokenKind::Single
            if p.nth_kind(1) == TokenKind::LParen && p.nth_kind(2).is_name() && p.nth_kind(3) == TokenKind::In =>
        {
            parse_quantified(p)
        }
        TokenKind::Reduce if p.nth_kind(1) == TokenKind::LParen => parse_reduce(p),
        TokenKind::Normalize if p.nth_kind(1) == TokenKind::LParen => parse_normalize(p),
        TokenKind::Trim if p.nth_kind(1) == TokenKind::LParen => parse_trim(p),
        TokenKind::ShortestPath | TokenKind::AllShortestPaths if p.nth_kind(1) == TokenKind::LParen => {
            Ok(Expr::ShortestPath(pattern::parse_shortest_path(p)?))
        }

        TokenKind::LBracket => match p.predict_bracket() {
            BracketForm::ListComprehension => parse_list_comprehension(p),
            BracketForm::PatternComprehension => parse_pattern_comprehension(p),
            BracketForm::ListLiteral => parse_list_literal(p),
        },
        TokenKind::LBrace => parse_map_literal(p),
        TokenKind::LParen => {
            if p.at_pattern_expression() {
                return Ok(Expr::Pattern(pattern::parse_path_pattern(p)?));
            }
            p.advance();
            let inner = parse_expr(p)?;
            p.expect(TokenKind::RParen)?;
            Ok(inner)
        }

        k if k.is_name() => {
            if p.at_function_call() {
                parse_function_call(p)
            } else if p.at_map_projection() {
                parse_map_projection(p)
            } else {
                Ok(Expr::Variable(p.variable()?))
            }
        }

        _ => Err(p.expected_rule("expression")),
    }
}

fn parse_function_call(p: &mut Parser) -> Result<Expr> {
    p.within("function call", |p| {
        let start = p.start();
        let name = p.qualified_name()?;
        p.expect(TokenKind::LParen)?;
        let distinct = p.eat(TokenKind::Distinct);
        let args = if p.at(TokenKind::RParen) { Vec::new() } else { parse_expr_list(p)? };
        p.expect(TokenKind::RParen)?;
        Ok(Expr::FunctionCall { name, args, distinct, span: p.span_from(start) })
    })
}

fn parse_list_literal(p: &mut Parser) -> Result<Expr> {
    let start = p.start();
    p.expect(TokenKind::LBracket)?;
    let items = if p.at(TokenKind::RBracket) { Vec::new() } else { parse_expr_list(p)? };
    p.expect(TokenKind::RBracket)?;
    Ok(Expr::List { items, span: p.span_from(start) })
}

/// `{key: value, ...}`; also used for inline pattern properties.
pub(super) fn parse_map_literal(p: &mut Parser) -> Result<Expr> {
    p.within("map literal", |p| {
        let start = p.start();
        p.expect(TokenKind::LBrace)?;
        let mut entries = Vec::new();
        if !p.at(TokenKind::RBrace) {
            loop {
                let key = p.symbolic_name()?;
                p.expect(TokenKind::Colon)?;
                entries.push((key, parse_expr(p)?));
                if !p.eat(TokenKind::Comma) {
                    break;
                }
            }
        }
        p.expect(TokenKind::RBrace)?;
        Ok(Expr::MapLiteral { entries, span: p.span_from(start) })
    })
}

/// `n {.name, .*, key: expr, other}`
fn parse_map_projection(p: &mut Parser) -> Result<Expr> {
    p.within("map projection", |p| {
        let start = p.start();
        let variable = p.variable()?;
        p.expect(TokenKind::LBrace)?;
        let mut items = Vec::new();
        if !p.at(TokenKind::RBrace) {
            loop {
                items.push(parse_projection_item(p)?);
                if !p.eat(TokenKind::Comma) {
                    break;
                }
            }
        }
        p.expect(TokenKind::RBrace)?;
        Ok(Expr::MapProjection { variable, items, span: p.span_from(start) })
    })
}

fn parse_projection_item(p: &mut Parser) -> Result<MapProjectionItem> {
    if p.at(TokenKind::Dot) {
        let start = p.start();
        p.advance();
        if p.eat(TokenKind::Star) {
            return Ok(MapProjectionItem::AllProperties(p.span_from(start)));
        }
        return Ok(MapProjectionItem::Property(p.symbolic_name()?));
    }
    if p.at_name() && p.nth_kind(1) == TokenKind::Colon {
        let key = p.symbolic_name()?;
        p.advance();
        return Ok(MapProjectionItem::Literal { key, value: parse_expr(p)? });
    }
    if p.at_name() {
        return Ok(MapProjectionItem::Variable(p.variable()?));
    }
    Err(p.unexpected([Expected::Token(TokenKind::Dot), Expected::Rule("map projection item")]))
}

/// `[x IN list WHERE pred | expr]`
fn parse_list_comprehension(p: &mut Parser) -> Result<Expr> {
    p.within("list comprehension", |p| {
        let start = p.start();
        p.expect(TokenKind::LBracket)?;
        let variable = p.variable()?;
        p.expect(TokenKind::In)?;
        let list = parse_expr(p)?;
        let predicate = if p.eat(TokenKind::Where) { Some(parse_expr(p)?) } else { None };
        let projection = if p.eat(TokenKind::Pipe) { Some(parse_expr(p)?) } else { None };
        p.expect(TokenKind::RBracket)?;
        Ok(Expr::ListComprehension(Box::new(ListComprehension {
            variable,
            list,
            predicate,
            projection,
            span: p.span_from(start),
        })))
    })
}

/// `[p = (a)-->(b) WHERE pred | expr]`
fn parse_pattern_comprehension(p: &mut Parser) -> Result<Expr> {
    p.within("pattern comprehension", |p| {
        let start = p.start();
        p.expect(TokenKind::LBracket)?;
        let variable = if p.at_name() && p.nth_kind(1) == TokenKind::Eq {
            let v = p.variable()?;
            p.advance();
            Some(v)
        } else {
            None
        };
        let pattern = pattern::parse_path_pattern(p)?;
        let predicate = if p.eat(TokenKind::Where) { Some(parse_expr(p)?) } else { None };
        p.expect(TokenKind::Pipe)?;
        let projection = parse_expr(p)?;
        p.expect(TokenKind::RBracket)?;
        Ok(Expr::PatternComprehension(Box::new(PatternComprehension {
            variable,
            pattern,
            predicate,
            projection,
            span: p.span_from(start),
        })))
    })
}

/// `all(x IN list WHERE pred)`, `any(...)`, `none(...)`, `single(...)`
fn parse_quantified(p: &mut Parser) -> Result<Expr> {
    p.within("list predicate", |p| {
        let start = p.start();
        let quantifier = match p.advance().kind {
            TokenKind::All => ListQuantifier::All,
            TokenKind::Any => ListQuantifier::Any,
            TokenKind::None => ListQuantifier::None,
            _ => ListQuantifier::Single,
        };
        p.expect(TokenKind::LParen)?;
        let variable = p.variable()?;
        p.expect(TokenKind::In)?;
        let list = parse_expr(p)?;
        let predicate = if p.eat(TokenKind::Where) { Some(parse_expr(p)?) } else { None };
        p.expect(TokenKind::RParen)?;
        Ok(Expr::Quantified(Box::new(QuantifiedExpr { quantifier, variable, list, predicate, span: p.span_from(start) })))
    })
}

/// `reduce(acc = init, x IN list | expr)`
fn parse_reduce(p: &mut Parser) -> Result<Expr> {
    p.within("reduce", |p| {
        let start = p.start();
        p.advance();
        p.expect(TokenKind::LParen)?;
        let accumulator = p.variable()?;
        p.expect(TokenKind::Eq)?;
        let init = parse_expr(p)?;
        p.expect(TokenKind::Comma)?;
        let variable = p.variable()?;
        p.expect(TokenKind::In)?;
        let list = parse_expr(p)?;
        p.expect(TokenKind::Pipe)?;
        let expr = parse_expr(p)?;
        p.expect(TokenKind::RParen)?;
        Ok(Expr::Reduce(Box::new(ReduceExpr { accumulator, init, variable, list, expr, span: p.span_from(start) })))
    })
}

/// `normalize(expr [, NFC])`
fn parse_normalize(p: &mut Parser) -> Result<Expr> {
    let start = p.start();
    p.advance();
    p.expect(TokenKind::LParen)?;
    let expr = parse_expr(p)?;
    let form = if p.eat(TokenKind::Comma) {
        match parse_normal_form(p) {
            Some(form) => Some(form),
            None => return Err(p.expected_rule("normal form")),
        }
    } else {
        None
    };
    p.expect(TokenKind::RParen)?;
    Ok(Expr::Normalize { expr: Box::new(expr), form, span: p.span_from(start) })
}

/// `trim([LEADING|TRAILING|BOTH] [chars] FROM source)` or `trim(source)`
fn parse_trim(p: &mut Parser) -> Result<Expr> {
    p.within("trim", |p| {
        let start = p.start();
        p.advance();
        p.expect(TokenKind::LParen)?;

        let side = match p.peek_kind() {
            TokenKind::Leading => Some(TrimSide::Leading),
            TokenKind::Trailing => Some(TrimSide::Trailing),
            TokenKind::Both => Some(TrimSide::Both),
            _ => None,
        };
        if side.is_some() {
            p.advance();
        }

        let (characters, source) = if side.is_some() && p.eat(TokenKind::From) {
            (None, parse_expr(p)?)
        } else {
            let first = parse_expr(p)?;
            if p.eat(TokenKind::From) {
                (Some(first), parse_expr(p)?)
            } else if side.is_some() {
                return Err(p.unexpected([Expected::Token(TokenKind::From)]));
            } else {
                (None, first)
            }
        };

        p.expect(TokenKind::RParen)?;
        Ok(Expr::Trim(Box::new(TrimExpr { side, characters, source, span: p.span_from(start) })))
    })
}

/// `EXISTS { ... }`, `COUNT { ... }`, `COLLECT { ... }`
fn parse_subquery_expr(p: &mut Parser) -> Result<Expr> {
    p.within("subquery expression", |p| {
        let start = p.start();
        let kind = match p.advance().kind {
            TokenKind::Exists => SubqueryKind::Exists,
            TokenKind::Count => SubqueryKind::Count,
            _ => SubqueryKind::Collect,
        };
        p.expect(TokenKind::LBrace)?;
        let body = p.nested(|p| {
            if p.predict_subquery_is_query() {
                Ok(SubqueryBody::Query(Box::new(clause::parse_query(p)?)))
            } else {
                let patterns = pattern::parse_pattern_list(p)?;
                let where_clause = if p.eat(TokenKind::Where) { Some(parse_expr(p)?) } else { None };
                Ok(SubqueryBody::Pattern { patterns, where_clause })
            }
        })?;
        p.expect(TokenKind::RBrace)?;
        Ok(Expr::Subquery(Box::new(SubqueryExpr { kind, body, span: p.span_from(start) })))
    })
}

// ============================================================================
// CASE
// ============================================================================

/// Simple (`CASE x WHEN 1, > 5 THEN ...`) and searched (`CASE WHEN p THEN ...`)
/// forms share this parser.
fn parse_case(p: &mut Parser) -> Result<Expr> {
    p.within("CASE expression", |p| {
        let start = p.start();
        p.expect(TokenKind::Case)?;
        let operand = if p.at(TokenKind::When) { None } else { Some(parse_expr(p)?) };

        let mut alternatives = Vec::new();
        while p.at(TokenKind::When) {
            let alt_start = p.start();
            p.advance();
            let when = if operand.is_some() {
                let mut operands = vec![parse_when_operand(p)?];
                while p.eat(TokenKind::Comma) {
                    operands.push(parse_when_operand(p)?);
                }
                operands
            } else {
                vec![WhenOperand::Value(parse_expr(p)?)]
            };
            p.expect(TokenKind::Then)?;
            let then = parse_expr(p)?;
            alternatives.push(CaseAlternative { when, then, span: p.span_from(alt_start) });
        }
        if alternatives.is_empty() {
            return Err(p.unexpected([Expected::Token(TokenKind::When)]));
        }

        let default = if p.eat(TokenKind::Else) { Some(parse_expr(p)?) } else { None };
        if !p.eat(TokenKind::End) {
            let mut expected = vec![Expected::Token(TokenKind::End), Expected::Token(TokenKind::When)];
            if default.is_none() {
                expected.push(Expected::Token(TokenKind::Else));
            }
            return Err(p.unexpected(expected));
        }
        Ok(Expr::Case(Box::new(CaseExpr { operand, alternatives, default, span: p.span_from(start) })))
    })
}

fn parse_when_operand(p: &mut Parser) -> Result<WhenOperand> {
    let start = p.start();
    if let Some(op) = comparison_operator(p.peek_kind()) {
        p.advance();
        let right = parse_predicate(p)?;
        return Ok(WhenOperand::Comparison { op, right, span: p.span_from(start) });
    }
    if let Some(suffix) = parse_suffix(p)? {
        return Ok(suffix.into_when(p.span_from(start)));
    }
    Ok(WhenOperand::Value(parse_expr(p)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ParserConfig;
    use crate::cypher::lexer::tokenize;
    use crate::cypher::parser::parse_fragment;
    use pretty_assertions::assert_eq;

    fn expr(input: &str) -> Expr {
        try_expr(input).unwrap_or_else(|e| panic!("{input}: {e}"))
    }

    fn try_expr(input: &str) -> Result<Expr> {
        let tokens = tokenize(input)?;
        parse_fragment(&tokens, &ParserConfig::default(), parse_expr)
    }

    fn binary(e: &Expr) -> (&Expr, BinaryOp, &Expr) {
        match e {
            Expr::BinaryOp { left, op, right, .. } => (left, *op, right),
            other => panic!("Expected binary op, got {other:?}"),
        }
    }

    #[test]
    fn test_or_binds_loosest() {
        let e = expr("a AND b OR c");
        let (left, op, _) = binary(&e);
        assert_eq!(op, BinaryOp::Or);
        assert_eq!(binary(left).1, BinaryOp::And);
    }

    #[test]
    fn test_xor_between_or_and_and() {
        let e = expr("a OR b XOR c AND d");
        let (_, op, right) = binary(&e);
        assert_eq!(op, BinaryOp::Or);
        let (_, op, right) = binary(right);
        assert_eq!(op, BinaryOp::Xor);
        assert_eq!(binary(right).1, BinaryOp::And);
    }

    #[test]
    fn test_not_stack() {
        match expr("NOT NOT a = 1") {
            Expr::UnaryOp { op: UnaryOp::Not, expr, .. } => match *expr {
                Expr::UnaryOp { op: UnaryOp::Not, expr, .. } => assert_eq!(binary(&expr).1, BinaryOp::Eq),
                other => panic!("Expected NOT, got {other:?}"),
            },
            other => panic!("Expected NOT, got {other:?}"),
        }
    }

    #[test]
    fn test_arithmetic_precedence() {
        let e = expr("1 + 2 * 3 ^ 2");
        let (_, op, right) = binary(&e);
        assert_eq!(op, BinaryOp::Add);
        let (_, op, right) = binary(right);
        assert_eq!(op, BinaryOp::Mul);
        assert_eq!(binary(right).1, BinaryOp::Pow);
    }

    #[test]
    fn test_power_is_left_associative() {
        let e = expr("2 ^ 3 ^ 2");
        let (left, op, right) = binary(&e);
        assert_eq!(op, BinaryOp::Pow);
        assert_eq!(binary(left).1, BinaryOp::Pow);
        assert!(matches!(right, Expr::Literal { .. }));
    }

    #[test]
    fn test_negative_number_is_literal() {
        match expr("-1") {
            Expr::Literal { value, span } => {
                assert_eq!(value.as_i64(), Some(-1));
                assert_eq!(span, Span::new(0, 2));
            }
            other => panic!("Expected literal, got {other:?}"),
        }
        assert!(matches!(expr("-x"), Expr::UnaryOp { op: UnaryOp::Negate, .. }));
        assert!(try_expr("- -x").is_err());
    }

    #[test]
    fn test_comparison_chain() {
        match expr("1 < x <= 10") {
            Expr::ComparisonChain { operands, ops, .. } => {
                assert_eq!(operands.len(), 3);
                assert_eq!(ops, vec![BinaryOp::Lt, BinaryOp::Lte]);
            }
            other => panic!("Expected chain, got {other:?}"),
        }
        assert_eq!(binary(&expr("a <> b")).1, BinaryOp::Neq);
    }

    #[test]
    fn test_string_predicates() {
        assert!(matches!(expr("n.name STARTS WITH 'A'"), Expr::StringOp { op: StringOp::StartsWith, .. }));
        assert!(matches!(expr("n.name ENDS WITH 'z'"), Expr::StringOp { op: StringOp::EndsWith, .. }));
        assert!(matches!(expr("n.name CONTAINS 'x'"), Expr::StringOp { op: StringOp::Contains, .. }));
        assert!(matches!(expr("n.name =~ 'A.*'"), Expr::StringOp { op: StringOp::RegexMatch, .. }));
        assert!(matches!(expr("x IN [1, 2]"), Expr::In { .. }));
    }

    #[test]
    fn test_is_predicates() {
        assert!(matches!(expr("x IS NULL"), Expr::IsNull { negated: false, .. }));
        assert!(matches!(expr("x IS NOT NULL"), Expr::IsNull { negated: true, .. }));
        assert!(matches!(expr("x IS TYPED INTEGER"), Expr::IsTyped { negated: false, .. }));
        assert!(matches!(expr("x IS NOT :: STRING"), Expr::IsTyped { negated: true, .. }));
        assert!(matches!(expr("x :: BOOLEAN"), Expr::IsTyped { negated: false, .. }));
        assert!(matches!(
            expr("x IS NOT NFKC NORMALIZED"),
            Expr::IsNormalized { form: Some(NormalForm::Nfkc), negated: true, .. }
        ));
        assert!(matches!(expr("x IS NORMALIZED"), Expr::IsNormalized { form: None, .. }));
    }

    #[test]
    fn test_is_label_versus_predicate() {
        assert!(matches!(expr("n IS Person"), Expr::LabelTest { .. }));
        assert!(matches!(expr("n:Person:Admin"), Expr::LabelTest { .. }));
        let err = try_expr("n IS NOT Person").unwrap_err();
        assert_eq!(err.as_syntax().unwrap().decision, Some("IS predicate"));
    }

    #[test]
    fn test_postfix_chain() {
        match expr("a.b[0][1..2].c") {
            Expr::Property { expr, key, .. } => {
                assert_eq!(key.name, "c");
                assert!(matches!(*expr, Expr::Slice { .. }));
            }
            other => panic!("Expected property, got {other:?}"),
        }
        assert!(matches!(expr("l[..2]"), Expr::Slice { from: None, to: Some(_), .. }));
        assert!(matches!(expr("l[2..]"), Expr::Slice { from: Some(_), to: None, .. }));
    }

    #[test]
    fn test_literals() {
        assert!(matches!(expr("0x1F"), Expr::Literal { value: Literal::Integer { radix: Radix::Hex, .. }, .. }));
        assert!(matches!(expr("0o17"), Expr::Literal { value: Literal::Integer { radix: Radix::Octal, .. }, .. }));
        assert!(matches!(expr("1.5e3"), Expr::Literal { value: Literal::Float(_), .. }));
        assert!(matches!(expr("'hi'"), Expr::Literal { value: Literal::String(_), .. }));
        assert!(matches!(expr("null"), Expr::Literal { value: Literal::Null, .. }));
        assert!(matches!(expr("Infinity"), Expr::Literal { value: Literal::Infinity, .. }));
        assert!(matches!(expr("NaN"), Expr::Literal { value: Literal::NaN, .. }));
        assert!(matches!(expr("$param"), Expr::Parameter { .. }));
    }

    #[test]
    fn test_function_calls() {
        match expr("count(DISTINCT n)") {
            Expr::FunctionCall { name, args, distinct, .. } => {
                assert_eq!(name.to_string(), "count");
                assert_eq!(args.len(), 1);
                assert!(distinct);
            }
            other => panic!("Expected function, got {other:?}"),
        }
        assert!(matches!(expr("count(*)"), Expr::CountStar { .. }));
        match expr("apoc.coll.sum([1, 2])") {
            Expr::FunctionCall { name, .. } => assert_eq!(name.to_string(), "apoc.coll.sum"),
            other => panic!("Expected function, got {other:?}"),
        }
    }

    #[test]
    fn test_list_and_pattern_comprehension() {
        match expr("[x IN range(1, 10) WHERE x % 2 = 0 | x * 2]") {
            Expr::ListComprehension(c) => {
                assert_eq!(c.variable.name, "x");
                assert!(c.predicate.is_some());
                assert!(c.projection.is_some());
            }
            other => panic!("Expected list comprehension, got {other:?}"),
        }
        match expr("[p = (a)-[:R]->(b) WHERE b.x > 1 | b.name]") {
            Expr::PatternComprehension(c) => {
                assert_eq!(c.variable.unwrap().name, "p");
                assert!(c.predicate.is_some());
            }
            other => panic!("Expected pattern comprehension, got {other:?}"),
        }
        assert!(matches!(expr("[1, 2, 3]"), Expr::List { items, .. } if items.len() == 3));
        assert!(matches!(expr("[]"), Expr::List { items, .. } if items.is_empty()));
    }

    #[test]
    fn test_label_in_comprehension_before_projection() {
        match expr("[x IN l WHERE x:A | x.name]") {
            Expr::ListComprehension(c) => {
                assert!(matches!(c.predicate, Some(Expr::LabelTest { .. })));
                assert!(matches!(c.projection, Some(Expr::Property { .. })));
            }
            other => panic!("Expected list comprehension, got {other:?}"),
        }
    }

    #[test]
    fn test_map_literal_and_projection() {
        match expr("{name: 'Ada', age: 36}") {
            Expr::MapLiteral { entries, .. } => {
                let keys: Vec<_> = entries.iter().map(|(k, _)| k.name.as_str()).collect();
                assert_eq!(keys, vec!["name", "age"]);
            }
            other => panic!("Expected map, got {other:?}"),
        }
        match expr("n {.name, .*, born: n.year, x}") {
            Expr::MapProjection { items, .. } => {
                assert_eq!(items.len(), 4);
                assert!(matches!(items[1], MapProjectionItem::AllProperties(_)));
                assert!(matches!(items[2], MapProjectionItem::Literal { .. }));
                assert!(matches!(items[3], MapProjectionItem::Variable(_)));
            }
            other => panic!("Expected map projection, got {other:?}"),
        }
    }

    #[test]
    fn test_case_forms() {
        match expr("CASE WHEN a > 1 THEN 'big' ELSE 'small' END") {
            Expr::Case(c) => {
                assert!(c.operand.is_none());
                assert_eq!(c.alternatives.len(), 1);
                assert!(c.default.is_some());
            }
            other => panic!("Expected CASE, got {other:?}"),
        }
        match expr("CASE x WHEN 1, 2 THEN 'low' WHEN > 10 THEN 'high' WHEN IS NULL THEN 'none' END") {
            Expr::Case(c) => {
                assert!(c.operand.is_some());
                assert_eq!(c.alternatives[0].when.len(), 2);
                assert!(matches!(c.alternatives[1].when[0], WhenOperand::Comparison { op: BinaryOp::Gt, .. }));
                assert!(matches!(c.alternatives[2].when[0], WhenOperand::IsNull { negated: false, .. }));
            }
            other => panic!("Expected CASE, got {other:?}"),
        }
        assert!(try_expr("CASE x END").is_err());
    }

    #[test]
    fn test_special_functions() {
        assert!(matches!(expr("all(x IN l WHERE x > 0)"), Expr::Quantified(q) if q.quantifier == ListQuantifier::All));
        assert!(matches!(expr("none(x IN l WHERE x > 0)"), Expr::Quantified(q) if q.quantifier == ListQuantifier::None));
        assert!(matches!(expr("any(l)"), Expr::FunctionCall { .. }));
        assert!(matches!(expr("reduce(s = 0, x IN l | s + x)"), Expr::Reduce(_)));
        assert!(matches!(expr("normalize(s, NFD)"), Expr::Normalize { form: Some(NormalForm::Nfd), .. }));
        match expr("trim(LEADING 'x' FROM s)") {
            Expr::Trim(t) => {
                assert_eq!(t.side, Some(TrimSide::Leading));
                assert!(t.characters.is_some());
            }
            other => panic!("Expected trim, got {other:?}"),
        }
        assert!(matches!(expr("trim(BOTH FROM s)"), Expr::Trim(t) if t.characters.is_none()));
        assert!(matches!(expr("trim(s)"), Expr::Trim(t) if t.side.is_none()));
    }

    #[test]
    fn test_subquery_expressions() {
        match expr("EXISTS { (n)-[:R]->(m) WHERE m.x > 1 }") {
            Expr::Subquery(s) => {
                assert_eq!(s.kind, SubqueryKind::Exists);
                assert!(matches!(s.body, SubqueryBody::Pattern { where_clause: Some(_), .. }));
            }
            other => panic!("Expected subquery, got {other:?}"),
        }
        match expr("COUNT { MATCH (n)-->(m) RETURN m }") {
            Expr::Subquery(s) => {
                assert_eq!(s.kind, SubqueryKind::Count);
                assert!(matches!(s.body, SubqueryBody::Query(_)));
            }
            other => panic!("Expected subquery, got {other:?}"),
        }
        assert!(matches!(expr("exists(n.prop)"), Expr::FunctionCall { .. }));
    }

    #[test]
    fn test_pattern_expression_versus_parentheses() {
        assert!(matches!(expr("(a)-[:KNOWS]->(b)"), Expr::Pattern(_)));
        assert!(matches!(expr("(a)"), Expr::Variable(_)));
        assert_eq!(binary(&expr("(a) - (b)")).1, BinaryOp::Sub);
    }

    #[test]
    fn test_parenthesized_span_covers_parentheses() {
        let e = expr("(1 + 2) * 3");
        assert_eq!(e.span(), Span::new(0, 11));
        let (left, _, _) = binary(&e);
        assert_eq!(left.span(), Span::new(1, 6));
    }

    #[test]
    fn test_missing_operand() {
        let err = try_expr("1 +").unwrap_err();
        let err = err.as_syntax().unwrap();
        assert_eq!(err.kind, crate::SyntaxErrorKind::UnexpectedEndOfInput);
        assert!(err.expected.contains(&Expected::Rule("expression")));
    }

    #[test]
    fn test_nesting_limit() {
        let input = format!("{}1{}", "(".repeat(40), ")".repeat(40));
        let tokens = tokenize(&input).unwrap();
        let config = ParserConfig::default().with_max_nesting_depth(16);
        let err = parse_fragment(&tokens, &config, parse_expr).unwrap_err();
        assert_eq!(err.as_syntax().unwrap().kind, crate::SyntaxErrorKind::NestingTooDeep);
    }
}
