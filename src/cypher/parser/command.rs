//! Administrative commands: index and constraint DDL plus SHOW.
//!
//! Every command is keyword dispatch followed by optional clauses; nothing
//! here needs more than two tokens of lookahead.

use super::clause;
use super::expr;
use super::label;
use super::lookahead::starts_expression;
use super::Parser;
use crate::cypher::ast::*;
use crate::cypher::diagnostics::Expected;
use crate::cypher::lexer::TokenKind;
use crate::Result;

pub(super) fn parse_command(p: &mut Parser) -> Result<Command> {
    match (p.peek_kind(), p.nth_kind(1)) {
        (TokenKind::Create, TokenKind::Constraint) => {
            p.within("CREATE CONSTRAINT", parse_create_constraint).map(Command::CreateConstraint)
        }
        (TokenKind::Create, _) => p.within("CREATE INDEX", parse_create_index).map(Command::CreateIndex),
        (TokenKind::Drop, _) => p.within("DROP", parse_drop),
        _ => p.within("SHOW", parse_show).map(Command::Show),
    }
}

// ============================================================================
// Schema
// ============================================================================

/// `CREATE [RANGE|TEXT|POINT] INDEX [name] [IF NOT EXISTS] FOR target ON (v.p, ...) [OPTIONS {...}]`
fn parse_create_index(p: &mut Parser) -> Result<CreateIndex> {
    let start = p.start();
    p.expect(TokenKind::Create)?;
    let kind = match p.peek_kind() {
        TokenKind::Range => IndexKind::Range,
        TokenKind::Text => IndexKind::Text,
        TokenKind::Point => IndexKind::Point,
        _ => IndexKind::Default,
    };
    if kind != IndexKind::Default {
        p.advance();
    }
    p.expect(TokenKind::Index)?;

    let name = parse_schema_name(p)?;
    let if_not_exists = parse_if_not_exists(p)?;
    p.expect(TokenKind::For)?;
    let target = parse_schema_target(p)?;

    p.expect(TokenKind::On)?;
    p.expect(TokenKind::LParen)?;
    let properties = parse_schema_properties(p)?;
    p.expect(TokenKind::RParen)?;
    let options = parse_options(p)?;

    Ok(CreateIndex { kind, name, if_not_exists, target, properties, options, span: p.span_from(start) })
}

/// `CREATE CONSTRAINT [name] [IF NOT EXISTS] FOR target REQUIRE props IS ... [OPTIONS {...}]`
fn parse_create_constraint(p: &mut Parser) -> Result<CreateConstraint> {
    let start = p.start();
    p.expect(TokenKind::Create)?;
    p.expect(TokenKind::Constraint)?;

    let name = parse_schema_name(p)?;
    let if_not_exists = parse_if_not_exists(p)?;
    p.expect(TokenKind::For)?;
    let target = parse_schema_target(p)?;
    p.expect(TokenKind::Require)?;

    let properties = if p.eat(TokenKind::LParen) {
        let properties = parse_schema_properties(p)?;
        p.expect(TokenKind::RParen)?;
        properties
    } else {
        vec![parse_schema_property(p)?]
    };

    p.expect(TokenKind::Is)?;
    let requirement = match p.peek_kind() {
        TokenKind::Not => {
            p.advance();
            p.expect(TokenKind::Null)?;
            ConstraintKind::NotNull
        }
        TokenKind::Typed | TokenKind::DoubleColon => {
            p.advance();
            ConstraintKind::Typed(label::parse_type(p)?)
        }
        _ => {
            // IS [NODE|RELATIONSHIP] UNIQUE|KEY
            if p.at_any(&[TokenKind::Node, TokenKind::Relationship])
                && matches!(p.nth_kind(1), TokenKind::Unique | TokenKind::Key)
            {
                p.advance();
            }
            match p.peek_kind() {
                TokenKind::Unique => ConstraintKind::Unique,
                TokenKind::Key => ConstraintKind::Key,
                _ => {
                    return Err(p.unexpected(
                        [
                            TokenKind::Unique,
                            TokenKind::Key,
                            TokenKind::Not,
                            TokenKind::Typed,
                            TokenKind::DoubleColon,
                            TokenKind::Node,
                            TokenKind::Relationship,
                        ]
                        .map(Expected::Token),
                    ));
                }
            }
        }
    };
    if matches!(requirement, ConstraintKind::Unique | ConstraintKind::Key) {
        p.advance();
    }
    let options = parse_options(p)?;

    Ok(CreateConstraint { name, if_not_exists, target, properties, requirement, options, span: p.span_from(start) })
}

/// `DROP INDEX name [IF EXISTS]` / `DROP CONSTRAINT name [IF EXISTS]`
fn parse_drop(p: &mut Parser) -> Result<Command> {
    let start = p.start();
    p.expect(TokenKind::Drop)?;
    let index = p.expect_any(&[TokenKind::Index, TokenKind::Constraint])?.kind == TokenKind::Index;
    let name = p.symbolic_name()?;
    let if_exists = if p.eat(TokenKind::If) {
        p.expect(TokenKind::Exists)?;
        true
    } else {
        false
    };
    let span = p.span_from(start);
    Ok(if index {
        Command::DropIndex { name, if_exists, span }
    } else {
        Command::DropConstraint { name, if_exists, span }
    })
}

/// Optional command name; `FOR` and `IF NOT EXISTS` are never names here.
fn parse_schema_name(p: &mut Parser) -> Result<Option<SymbolicName>> {
    if !p.at_name() || p.at(TokenKind::For) || at_if_not_exists(p) {
        return Ok(None);
    }
    p.symbolic_name().map(Some)
}

fn at_if_not_exists(p: &Parser) -> bool {
    p.at(TokenKind::If) && p.nth_kind(1) == TokenKind::Not && p.nth_kind(2) == TokenKind::Exists
}

fn parse_if_not_exists(p: &mut Parser) -> Result<bool> {
    if !p.at(TokenKind::If) {
        return Ok(false);
    }
    p.advance();
    p.expect(TokenKind::Not)?;
    p.expect(TokenKind::Exists)?;
    Ok(true)
}

/// `(n:Label)` or `()-[r:TYPE]-()` (either direction).
fn parse_schema_target(p: &mut Parser) -> Result<SchemaTarget> {
    p.within("schema target", |p| {
        let start = p.start();
        p.expect(TokenKind::LParen)?;

        if !p.eat(TokenKind::RParen) {
            let variable = p.variable()?;
            p.expect(TokenKind::Colon)?;
            let label = p.symbolic_name()?;
            p.expect(TokenKind::RParen)?;
            return Ok(SchemaTarget { variable, label, relationship: false, span: p.span_from(start) });
        }

        p.eat(TokenKind::Lt);
        p.expect(TokenKind::Minus)?;
        p.expect(TokenKind::LBracket)?;
        let variable = p.variable()?;
        p.expect(TokenKind::Colon)?;
        let label = p.symbolic_name()?;
        p.expect(TokenKind::RBracket)?;
        p.expect(TokenKind::Minus)?;
        p.eat(TokenKind::Gt);
        p.expect(TokenKind::LParen)?;
        p.expect(TokenKind::RParen)?;
        Ok(SchemaTarget { variable, label, relationship: true, span: p.span_from(start) })
    })
}

fn parse_schema_properties(p: &mut Parser) -> Result<Vec<Expr>> {
    let mut properties = vec![parse_schema_property(p)?];
    while p.eat(TokenKind::Comma) {
        properties.push(parse_schema_property(p)?);
    }
    Ok(properties)
}

/// `v.prop`
fn parse_schema_property(p: &mut Parser) -> Result<Expr> {
    let start = p.start();
    let variable = p.variable()?;
    p.expect(TokenKind::Dot)?;
    let key = p.symbolic_name()?;
    Ok(Expr::Property { expr: Box::new(Expr::Variable(variable)), key, span: p.span_from(start) })
}

fn parse_options(p: &mut Parser) -> Result<Option<Expr>> {
    if p.eat(TokenKind::Options) { expr::parse_map_literal(p).map(Some) } else { Ok(None) }
}

// ============================================================================
// SHOW
// ============================================================================

/// `SHOW target [filter] [YIELD ...] [WHERE ...] [RETURN ...]`
fn parse_show(p: &mut Parser) -> Result<ShowCommand> {
    let start = p.start();
    p.expect(TokenKind::Show)?;

    let target = match p.peek_kind() {
        TokenKind::Range | TokenKind::Text | TokenKind::Point => {
            let kind = match p.advance().kind {
                TokenKind::Range => IndexKind::Range,
                TokenKind::Text => IndexKind::Text,
                _ => IndexKind::Point,
            };
            p.expect_any(&[TokenKind::Indexes, TokenKind::Index])?;
            ShowTarget::Indexes(kind)
        }
        _ => {
            // SHOW ALL INDEXES is the same as SHOW INDEXES
            p.eat(TokenKind::All);
            parse_show_target(p)?
        }
    };

    let filter = match target {
        ShowTarget::Transactions | ShowTarget::Settings if at_show_filter(p) => Some(expr::parse_expr(p)?),
        ShowTarget::Databases if p.at_name() && !at_show_tail(p) => Some(Expr::Variable(p.variable()?)),
        _ => None,
    };

    let yield_clause = if p.at(TokenKind::Yield) { Some(clause::parse_yield(p, true)?) } else { None };
    let where_clause = if yield_clause.is_none() { clause::parse_where(p)? } else { None };
    let return_clause = if p.at(TokenKind::Return) { Some(clause::parse_return(p)?) } else { None };

    Ok(ShowCommand { target, filter, yield_clause, where_clause, return_clause, span: p.span_from(start) })
}

fn parse_show_target(p: &mut Parser) -> Result<ShowTarget> {
    let target = match p.peek_kind() {
        TokenKind::Index | TokenKind::Indexes => ShowTarget::Indexes(IndexKind::Default),
        TokenKind::Constraint | TokenKind::Constraints => ShowTarget::Constraints,
        TokenKind::Procedure | TokenKind::Procedures => ShowTarget::Procedures,
        TokenKind::Function | TokenKind::Functions => ShowTarget::Functions,
        TokenKind::Transaction | TokenKind::Transactions => ShowTarget::Transactions,
        TokenKind::Setting | TokenKind::Settings => ShowTarget::Settings,
        TokenKind::Database | TokenKind::Databases => ShowTarget::Databases,
        _ => {
            return Err(p.unexpected(
                [
                    TokenKind::Indexes,
                    TokenKind::Constraints,
                    TokenKind::Procedures,
                    TokenKind::Functions,
                    TokenKind::Transactions,
                    TokenKind::Settings,
                    TokenKind::Databases,
                    TokenKind::Database,
                ]
                .map(Expected::Token),
            ));
        }
    };
    p.advance();
    Ok(target)
}

fn at_show_tail(p: &Parser) -> bool {
    p.at_any(&[TokenKind::Yield, TokenKind::Where, TokenKind::Return, TokenKind::Semicolon, TokenKind::Eof])
}

fn at_show_filter(p: &Parser) -> bool {
    !at_show_tail(p) && starts_expression(p.peek_kind())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ParserConfig;
    use crate::cypher::lexer::tokenize;
    use crate::cypher::parser::parse_statement;

    fn command(input: &str) -> Command {
        let tokens = tokenize(input).unwrap();
        match parse_statement(&tokens, &ParserConfig::default()) {
            Ok(Statement::Command(c)) => c,
            other => panic!("{input}: expected command, got {other:?}"),
        }
    }

    fn command_err(input: &str) -> crate::Error {
        let tokens = tokenize(input).unwrap();
        parse_statement(&tokens, &ParserConfig::default()).unwrap_err()
    }

    #[test]
    fn test_create_index() {
        match command("CREATE TEXT INDEX person_name IF NOT EXISTS FOR (n:Person) ON (n.name, n.age) OPTIONS {provider: 'x'}") {
            Command::CreateIndex(idx) => {
                assert_eq!(idx.kind, IndexKind::Text);
                assert_eq!(idx.name.unwrap().name, "person_name");
                assert!(idx.if_not_exists);
                assert_eq!(idx.target.label.name, "Person");
                assert!(!idx.target.relationship);
                assert_eq!(idx.properties.len(), 2);
                assert!(idx.options.is_some());
            }
            other => panic!("Expected CREATE INDEX, got {other:?}"),
        }
    }

    #[test]
    fn test_create_relationship_index_without_name() {
        match command("CREATE INDEX FOR ()-[r:KNOWS]-() ON (r.since)") {
            Command::CreateIndex(idx) => {
                assert!(idx.name.is_none());
                assert!(idx.target.relationship);
                assert_eq!(idx.target.label.name, "KNOWS");
            }
            other => panic!("Expected CREATE INDEX, got {other:?}"),
        }
    }

    #[test]
    fn test_create_constraints() {
        let requirement = |q: &str| match command(q) {
            Command::CreateConstraint(c) => c.requirement,
            other => panic!("Expected constraint, got {other:?}"),
        };
        assert_eq!(requirement("CREATE CONSTRAINT FOR (n:P) REQUIRE n.id IS UNIQUE"), ConstraintKind::Unique);
        assert_eq!(requirement("CREATE CONSTRAINT c FOR (n:P) REQUIRE (n.a, n.b) IS NODE KEY"), ConstraintKind::Key);
        assert_eq!(requirement("CREATE CONSTRAINT FOR (n:P) REQUIRE n.id IS NOT NULL"), ConstraintKind::NotNull);
        assert!(matches!(
            requirement("CREATE CONSTRAINT FOR ()-[r:R]-() REQUIRE r.w IS :: INTEGER"),
            ConstraintKind::Typed(_)
        ));
    }

    #[test]
    fn test_constraint_requirement_error() {
        let err = command_err("CREATE CONSTRAINT FOR (n:P) REQUIRE n.id IS FAST");
        let err = err.as_syntax().unwrap();
        assert!(err.expects(TokenKind::Unique));
        assert_eq!(err.production(), Some("CREATE CONSTRAINT"));
    }

    #[test]
    fn test_drop() {
        assert!(matches!(command("DROP INDEX idx IF EXISTS"), Command::DropIndex { if_exists: true, .. }));
        assert!(matches!(command("DROP CONSTRAINT c"), Command::DropConstraint { if_exists: false, .. }));
    }

    #[test]
    fn test_show_commands() {
        let target = |q: &str| match command(q) {
            Command::Show(s) => s.target,
            other => panic!("Expected SHOW, got {other:?}"),
        };
        assert_eq!(target("SHOW INDEXES"), ShowTarget::Indexes(IndexKind::Default));
        assert_eq!(target("SHOW RANGE INDEXES"), ShowTarget::Indexes(IndexKind::Range));
        assert_eq!(target("SHOW ALL CONSTRAINTS"), ShowTarget::Constraints);
        assert_eq!(target("SHOW PROCEDURES"), ShowTarget::Procedures);
        assert_eq!(target("SHOW FUNCTIONS"), ShowTarget::Functions);
        assert_eq!(target("SHOW DATABASES"), ShowTarget::Databases);
    }

    #[test]
    fn test_show_yield_where_return() {
        match command("SHOW TRANSACTIONS 'tx-1' YIELD transactionId AS id, currentQuery ORDER BY id LIMIT 10 WHERE id <> 'x' RETURN id") {
            Command::Show(s) => {
                assert!(s.filter.is_some());
                let y = s.yield_clause.unwrap();
                assert_eq!(y.items.len(), 2);
                assert!(y.order_by.is_some());
                assert!(y.limit.is_some());
                assert!(y.where_clause.is_some());
                assert!(s.return_clause.is_some());
            }
            other => panic!("Expected SHOW, got {other:?}"),
        }
        match command("SHOW INDEXES WHERE name = 'x'") {
            Command::Show(s) => {
                assert!(s.filter.is_none());
                assert!(s.where_clause.is_some());
            }
            other => panic!("Expected SHOW, got {other:?}"),
        }
    }

    #[test]
    fn test_show_database_by_name() {
        match command("SHOW DATABASE neo4j YIELD *") {
            Command::Show(s) => {
                assert!(matches!(s.filter, Some(Expr::Variable(_))));
                assert!(s.yield_clause.unwrap().star);
            }
            other => panic!("Expected SHOW, got {other:?}"),
        }
    }

    #[test]
    fn test_show_unknown_target() {
        let err = command_err("SHOW USERS");
        assert!(err.as_syntax().unwrap().expects(TokenKind::Indexes));
    }
}
