//! Label expressions and type names.
//!
//! One grammar serves both label spellings. [`LabelSyntax`] picks the
//! leading token (`:` or `IS`), whether `:` works as a conjunction and
//! after `|`, and which keywords the atom level refuses as label names:
//!
//! ```text
//! disjunction := conjunction ('|' ':'? conjunction)*
//! conjunction := negation (('&' | ':') negation)*
//! negation    := '!'* atom
//! atom        := '(' disjunction ')' | '%' | name
//! ```

use super::Parser;
use crate::cypher::ast::*;
use crate::cypher::diagnostics::Expected;
use crate::cypher::lexer::TokenKind;
use crate::Result;

/// Where a label expression appears. In expression position a `|` can also
/// end the expression (list comprehension projections).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum LabelContext {
    Pattern,
    Expression,
}

/// Keywords the `IS` form never reads as a label name.
const IS_RESERVED: &[TokenKind] = &[
    TokenKind::Not,
    TokenKind::Null,
    TokenKind::Typed,
    TokenKind::Normalized,
    TokenKind::Nfc,
    TokenKind::Nfd,
    TokenKind::Nfkc,
    TokenKind::Nfkd,
    TokenKind::Where,
];

pub(crate) fn parse_label_expression(
    p: &mut Parser,
    syntax: LabelSyntax,
    context: LabelContext,
) -> Result<LabelExpression> {
    p.within("label expression", |p| {
        let start = p.start();
        match syntax {
            LabelSyntax::Colon => p.expect(TokenKind::Colon)?,
            LabelSyntax::Is => p.expect(TokenKind::Is)?,
        };
        let expr = parse_disjunction(p, syntax, context)?;
        Ok(LabelExpression { syntax, expr, span: p.span_from(start) })
    })
}

fn parse_disjunction(p: &mut Parser, syntax: LabelSyntax, context: LabelContext) -> Result<LabelExpr> {
    let start = p.start();
    let mut left = parse_conjunction(p, syntax, context)?;

    while p.at_label_disjunction(context == LabelContext::Expression) {
        p.advance(); // |
        let colon = syntax == LabelSyntax::Colon && p.eat(TokenKind::Colon);
        let right = parse_conjunction(p, syntax, context)?;
        left = LabelExpr::Disjunction {
            left: Box::new(left),
            right: Box::new(right),
            colon,
            span: p.span_from(start),
        };
    }

    Ok(left)
}

fn parse_conjunction(p: &mut Parser, syntax: LabelSyntax, context: LabelContext) -> Result<LabelExpr> {
    let start = p.start();
    let mut left = parse_negation(p, syntax, context)?;

    loop {
        let colon = if p.at(TokenKind::Ampersand) {
            false
        } else if syntax == LabelSyntax::Colon && p.at(TokenKind::Colon) {
            true
        } else {
            break;
        };
        p.advance();
        let right = parse_negation(p, syntax, context)?;
        left = LabelExpr::Conjunction {
            left: Box::new(left),
            right: Box::new(right),
            colon,
            span: p.span_from(start),
        };
    }

    Ok(left)
}

/// `!` stacks; `!!A` stays two negations.
fn parse_negation(p: &mut Parser, syntax: LabelSyntax, context: LabelContext) -> Result<LabelExpr> {
    if !p.at(TokenKind::Bang) {
        return parse_atom(p, syntax, context);
    }
    let start = p.start();
    p.advance();
    let expr = p.nested(|p| parse_negation(p, syntax, context))?;
    Ok(LabelExpr::Negation { expr: Box::new(expr), span: p.span_from(start) })
}

fn parse_atom(p: &mut Parser, syntax: LabelSyntax, context: LabelContext) -> Result<LabelExpr> {
    match p.peek_kind() {
        TokenKind::LParen => {
            p.advance();
            let inner = p.nested(|p| parse_disjunction(p, syntax, context))?;
            p.expect(TokenKind::RParen)?;
            Ok(inner)
        }
        TokenKind::Percent => {
            let tok = p.advance();
            Ok(LabelExpr::Wildcard(tok.span))
        }
        kind if kind.is_name() && !(syntax == LabelSyntax::Is && IS_RESERVED.contains(&kind)) => {
            Ok(LabelExpr::Leaf(p.symbolic_name()?))
        }
        _ => Err(p.unexpected([
            Expected::Rule("label name"),
            Expected::Token(TokenKind::LParen),
            Expected::Token(TokenKind::Percent),
            Expected::Token(TokenKind::Bang),
        ])),
    }
}

/// `:A:B` / `IS A` as a flat list of names, for SET and REMOVE.
pub(super) fn parse_label_list(p: &mut Parser) -> Result<(Vec<SymbolicName>, bool)> {
    if p.eat(TokenKind::Is) {
        let mut labels = vec![p.symbolic_name()?];
        while p.eat(TokenKind::Ampersand) {
            labels.push(p.symbolic_name()?);
        }
        return Ok((labels, true));
    }

    let mut labels = Vec::new();
    p.expect(TokenKind::Colon)?;
    labels.push(p.symbolic_name()?);
    while p.eat(TokenKind::Colon) {
        labels.push(p.symbolic_name()?);
    }
    Ok((labels, false))
}

// ============================================================================
// Types
// ============================================================================

/// A type, possibly a union: `INTEGER | STRING`, `LIST<INT NOT NULL>`.
pub(super) fn parse_type(p: &mut Parser) -> Result<TypeRef> {
    p.within("type", |p| {
        let start = p.start();
        let first = parse_type_part(p)?;
        if !p.at_type_union() {
            return Ok(first);
        }
        let mut members = vec![first];
        while p.at_type_union() {
            p.advance(); // |
            members.push(parse_type_part(p)?);
        }
        Ok(TypeRef { kind: CypherType::Union(members), not_null: false, span: p.span_from(start) })
    })
}

/// Base type with its `NOT NULL` suffix and any postfix `LIST` wrappers.
fn parse_type_part(p: &mut Parser) -> Result<TypeRef> {
    let start = p.start();
    let kind = p.nested(parse_base_type)?;
    let mut ty = TypeRef { kind, not_null: eat_not_null(p), span: p.span_from(start) };

    while p.at_any(&[TokenKind::List, TokenKind::Array]) && p.nth_kind(1) != TokenKind::Lt {
        p.advance();
        let not_null = eat_not_null(p);
        ty = TypeRef { kind: CypherType::List(Box::new(ty)), not_null, span: p.span_from(start) };
    }

    Ok(ty)
}

fn eat_not_null(p: &mut Parser) -> bool {
    if p.at(TokenKind::Not) && p.nth_kind(1) == TokenKind::Null {
        p.advance();
        p.advance();
        true
    } else {
        false
    }
}

fn parse_base_type(p: &mut Parser) -> Result<CypherType> {
    let kind = match p.peek_kind() {
        TokenKind::Nothing => simple(p, CypherType::Nothing),
        TokenKind::Null => simple(p, CypherType::Null),
        TokenKind::Bool | TokenKind::Boolean => simple(p, CypherType::Boolean),
        TokenKind::String | TokenKind::Varchar => simple(p, CypherType::String),
        TokenKind::Int | TokenKind::Integer => simple(p, CypherType::Integer),
        TokenKind::Signed => {
            p.advance();
            p.expect(TokenKind::Integer)?;
            CypherType::Integer
        }
        TokenKind::Float => simple(p, CypherType::Float),
        TokenKind::Date => simple(p, CypherType::Date),
        TokenKind::Duration => simple(p, CypherType::Duration),
        TokenKind::Point => simple(p, CypherType::Point),
        TokenKind::Node | TokenKind::Vertex => simple(p, CypherType::Node),
        TokenKind::Relationship | TokenKind::Edge => simple(p, CypherType::Relationship),
        TokenKind::Map => simple(p, CypherType::Map),
        TokenKind::Path => simple(p, CypherType::Path),
        TokenKind::Local | TokenKind::Zoned => {
            let local = p.advance().kind == TokenKind::Local;
            let tok = p.expect_any(&[TokenKind::Time, TokenKind::Datetime])?;
            match (local, tok.kind == TokenKind::Time) {
                (true, true) => CypherType::LocalTime,
                (true, false) => CypherType::LocalDateTime,
                (false, true) => CypherType::ZonedTime,
                (false, false) => CypherType::ZonedDateTime,
            }
        }
        TokenKind::Time | TokenKind::Timestamp => {
            let time = p.advance().kind == TokenKind::Time;
            let zoned = p.expect_any(&[TokenKind::With, TokenKind::Without])?.kind == TokenKind::With;
            p.expect(TokenKind::Timezone)?;
            match (time, zoned) {
                (true, true) => CypherType::ZonedTime,
                (true, false) => CypherType::LocalTime,
                (false, true) => CypherType::ZonedDateTime,
                (false, false) => CypherType::LocalDateTime,
            }
        }
        TokenKind::Property => {
            p.advance();
            p.expect(TokenKind::Value)?;
            CypherType::PropertyValue
        }
        TokenKind::List | TokenKind::Array => {
            p.advance();
            p.expect(TokenKind::Lt)?;
            let inner = parse_type(p)?;
            p.expect(TokenKind::Gt)?;
            CypherType::List(Box::new(inner))
        }
        TokenKind::Any => {
            p.advance();
            match p.peek_kind() {
                TokenKind::Node | TokenKind::Vertex => simple(p, CypherType::Node),
                TokenKind::Relationship | TokenKind::Edge => simple(p, CypherType::Relationship),
                TokenKind::Map => simple(p, CypherType::Map),
                TokenKind::Value => simple(p, CypherType::Any),
                TokenKind::Property => {
                    p.advance();
                    p.expect(TokenKind::Value)?;
                    CypherType::PropertyValue
                }
                TokenKind::Lt => {
                    p.advance();
                    let inner = parse_type(p)?;
                    p.expect(TokenKind::Gt)?;
                    if matches!(inner.kind, CypherType::Union(_)) {
                        inner.kind
                    } else {
                        CypherType::Union(vec![inner])
                    }
                }
                _ => CypherType::Any,
            }
        }
        _ => return Err(p.expected_rule("type")),
    };
    Ok(kind)
}

fn simple(p: &mut Parser, kind: CypherType) -> CypherType {
    p.advance();
    kind
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ParserConfig;
    use crate::cypher::lexer::tokenize;
    use crate::cypher::parser::parse_fragment;

    fn label(input: &str) -> Result<LabelExpression> {
        let tokens = tokenize(input)?;
        let syntax = if input.trim_start().starts_with(':') { LabelSyntax::Colon } else { LabelSyntax::Is };
        parse_fragment(&tokens, &ParserConfig::default(), |p| {
            parse_label_expression(p, syntax, LabelContext::Pattern)
        })
    }

    fn ty(input: &str) -> Result<TypeRef> {
        let tokens = tokenize(input)?;
        parse_fragment(&tokens, &ParserConfig::default(), parse_type)
    }

    fn leaf(expr: &LabelExpr) -> &str {
        match expr {
            LabelExpr::Leaf(name) => &name.name,
            other => panic!("Expected leaf, got {other:?}"),
        }
    }

    #[test]
    fn test_conjunction_binds_tighter_than_disjunction() {
        let expr = label(":A&B|C").unwrap().expr;
        match expr {
            LabelExpr::Disjunction { left, right, colon, .. } => {
                assert!(!colon);
                assert!(matches!(*left, LabelExpr::Conjunction { .. }));
                assert_eq!(leaf(&right), "C");
            }
            other => panic!("Expected disjunction, got {other:?}"),
        }
    }

    #[test]
    fn test_double_negation_is_kept() {
        let expr = label(":!!X").unwrap().expr;
        match expr {
            LabelExpr::Negation { expr: inner, .. } => match *inner {
                LabelExpr::Negation { expr: atom, .. } => assert_eq!(leaf(&atom), "X"),
                other => panic!("Expected second negation, got {other:?}"),
            },
            other => panic!("Expected negation, got {other:?}"),
        }
    }

    #[test]
    fn test_colon_conjunction_and_legacy_disjunction() {
        let expr = label(":A:B|:C").unwrap().expr;
        match expr {
            LabelExpr::Disjunction { left, colon: true, .. } => {
                assert!(matches!(*left, LabelExpr::Conjunction { colon: true, .. }));
            }
            other => panic!("Expected legacy disjunction, got {other:?}"),
        }
    }

    #[test]
    fn test_is_form_rejects_colon_conjunction() {
        assert!(label("IS A:B").is_err());
        assert!(label("IS A&B").is_ok());
    }

    #[test]
    fn test_is_form_reserves_null() {
        assert!(label("IS NULL").is_err());
        assert!(label(":NULL").is_ok());
    }

    #[test]
    fn test_wildcard_and_parentheses() {
        let expr = label(":(%|!A)&B").unwrap().expr;
        match expr {
            LabelExpr::Conjunction { left, .. } => match *left {
                LabelExpr::Disjunction { left, right, .. } => {
                    assert!(matches!(*left, LabelExpr::Wildcard(_)));
                    assert!(matches!(*right, LabelExpr::Negation { .. }));
                }
                other => panic!("Expected disjunction, got {other:?}"),
            },
            other => panic!("Expected conjunction, got {other:?}"),
        }
    }

    #[test]
    fn test_label_spans() {
        let parsed = label(":A&B").unwrap();
        assert_eq!(parsed.span, Span::new(0, 4));
        assert_eq!(parsed.expr.span(), Span::new(1, 4));
    }

    #[test]
    fn test_leaf_names() {
        assert_eq!(label(":A&(B|!C)").unwrap().expr.leaf_names(), vec!["A", "B", "C"]);
    }

    #[test]
    fn test_simple_types() {
        assert_eq!(ty("INTEGER").unwrap().kind, CypherType::Integer);
        assert_eq!(ty("SIGNED INTEGER").unwrap().kind, CypherType::Integer);
        assert_eq!(ty("BOOL").unwrap().kind, CypherType::Boolean);
        assert_eq!(ty("LOCAL DATETIME").unwrap().kind, CypherType::LocalDateTime);
        assert_eq!(ty("TIME WITH TIMEZONE").unwrap().kind, CypherType::ZonedTime);
        assert_eq!(ty("TIMESTAMP WITHOUT TIMEZONE").unwrap().kind, CypherType::LocalDateTime);
        assert_eq!(ty("ANY PROPERTY VALUE").unwrap().kind, CypherType::PropertyValue);
        assert_eq!(ty("ANY EDGE").unwrap().kind, CypherType::Relationship);
        assert_eq!(ty("ANY").unwrap().kind, CypherType::Any);
    }

    #[test]
    fn test_not_null_and_lists() {
        let t = ty("LIST<INTEGER NOT NULL> NOT NULL").unwrap();
        assert!(t.not_null);
        match t.kind {
            CypherType::List(inner) => {
                assert_eq!(inner.kind, CypherType::Integer);
                assert!(inner.not_null);
            }
            other => panic!("Expected list, got {other:?}"),
        }

        let nested = ty("ARRAY<LIST<STRING>>").unwrap();
        assert!(matches!(nested.kind, CypherType::List(_)));

        let postfix = ty("STRING LIST").unwrap();
        assert!(matches!(postfix.kind, CypherType::List(_)));
    }

    #[test]
    fn test_type_unions() {
        let t = ty("INTEGER | STRING | NULL").unwrap();
        match t.kind {
            CypherType::Union(members) => assert_eq!(members.len(), 3),
            other => panic!("Expected union, got {other:?}"),
        }
        let any = ty("ANY<FLOAT | BOOLEAN>").unwrap();
        assert!(matches!(any.kind, CypherType::Union(ref m) if m.len() == 2));

        let any = ty("ANY<INTEGER NOT NULL>").unwrap();
        match any.kind {
            CypherType::Union(members) => {
                assert_eq!(members.len(), 1);
                assert_eq!(members[0].kind, CypherType::Integer);
                assert!(members[0].not_null);
            }
            other => panic!("Expected union, got {other:?}"),
        }
        assert!(!any.not_null);
    }

    #[test]
    fn test_unknown_type() {
        assert!(ty("WIDGET").is_err());
    }
}
