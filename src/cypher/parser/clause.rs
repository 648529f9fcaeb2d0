//! Statements, queries and clauses.
//!
//! A statement is a command or a query; a query is single queries joined by
//! `UNION`; a single query is one or more clauses picked by their leading
//! keyword. Only `OPTIONAL`, `CALL`, `YIELD`, `SET` and `REMOVE` need a
//! decision beyond the first token.

use super::command;
use super::expr::{self, parse_expr, parse_expr_list};
use super::label;
use super::lookahead::{CallTarget, SetTarget, StatementKind};
use super::pattern;
use super::Parser;
use crate::cypher::ast::*;
use crate::cypher::diagnostics::Expected;
use crate::cypher::lexer::TokenKind;
use crate::Result;

/// Keywords that start a clause.
const CLAUSE_START: &[TokenKind] = &[
    TokenKind::Match,
    TokenKind::Optional,
    TokenKind::Merge,
    TokenKind::Create,
    TokenKind::Insert,
    TokenKind::Delete,
    TokenKind::Detach,
    TokenKind::Nodetach,
    TokenKind::Set,
    TokenKind::Remove,
    TokenKind::With,
    TokenKind::Return,
    TokenKind::Unwind,
    TokenKind::Call,
    TokenKind::Foreach,
    TokenKind::Load,
    TokenKind::Use,
    TokenKind::Finish,
    TokenKind::Order,
    TokenKind::Skip,
    TokenKind::Offset,
    TokenKind::Limit,
];

pub(super) fn parse_statement(p: &mut Parser) -> Result<Statement> {
    p.within("statement", |p| match p.predict_statement() {
        StatementKind::Command => Ok(Statement::Command(command::parse_command(p)?)),
        StatementKind::Query => Ok(Statement::Query(parse_query(p)?)),
    })
}

/// `single (UNION [ALL|DISTINCT] single)*`, left-associative.
pub(super) fn parse_query(p: &mut Parser) -> Result<Query> {
    let start = p.start();
    let mut query = Query::Single(parse_single_query(p)?);
    while p.eat(TokenKind::Union) {
        let kind = if p.eat(TokenKind::All) {
            UnionKind::All
        } else if p.eat(TokenKind::Distinct) {
            UnionKind::Distinct
        } else {
            UnionKind::Plain
        };
        let right = parse_single_query(p)?;
        query = Query::Union(Box::new(UnionQuery { left: query, kind, right, span: p.span_from(start) }));
    }
    Ok(query)
}

fn parse_single_query(p: &mut Parser) -> Result<SingleQuery> {
    p.within("single query", |p| {
        let start = p.start();
        let mut clauses = vec![parse_clause(p)?];
        while p.at_any(CLAUSE_START) {
            clauses.push(parse_clause(p)?);
        }
        Ok(SingleQuery { clauses, span: p.span_from(start) })
    })
}

fn parse_clause(p: &mut Parser) -> Result<Clause> {
    let start = p.start();
    let clause = match p.peek_kind() {
        TokenKind::Use => Clause::Use(p.within("USE", parse_use)?),
        TokenKind::Match => Clause::Match(parse_match(p, false, start)?),
        TokenKind::Optional => match p.expect_optional_target()? {
            TokenKind::Match => {
                p.advance();
                Clause::Match(parse_match(p, true, start)?)
            }
            _ => {
                p.advance();
                parse_call(p, true, start)?
            }
        },
        TokenKind::Merge => Clause::Merge(p.within("MERGE", parse_merge)?),
        TokenKind::Create => {
            let patterns = p.within("CREATE", |p| {
                p.advance();
                pattern::parse_pattern_list(p)
            })?;
            Clause::Create(CreateClause { patterns, span: p.span_from(start) })
        }
        TokenKind::Insert => {
            let patterns = p.within("INSERT", |p| {
                p.advance();
                pattern::parse_pattern_list(p)
            })?;
            Clause::Insert(InsertClause { patterns, span: p.span_from(start) })
        }
        TokenKind::Delete | TokenKind::Detach | TokenKind::Nodetach => {
            Clause::Delete(p.within("DELETE", parse_delete)?)
        }
        TokenKind::Set => {
            let items = p.within("SET", |p| {
                p.advance();
                parse_set_items(p)
            })?;
            Clause::Set(SetClause { items, span: p.span_from(start) })
        }
        TokenKind::Remove => Clause::Remove(p.within("REMOVE", parse_remove)?),
        TokenKind::With => Clause::With(p.within("WITH", parse_with)?),
        TokenKind::Return => Clause::Return(parse_return(p)?),
        TokenKind::Unwind => Clause::Unwind(p.within("UNWIND", parse_unwind)?),
        TokenKind::Call => parse_call(p, false, start)?,
        TokenKind::Foreach => Clause::Foreach(p.within("FOREACH", parse_foreach)?),
        TokenKind::Load => Clause::LoadCsv(p.within("LOAD CSV", parse_load_csv)?),
        TokenKind::Finish => {
            p.advance();
            Clause::Finish(FinishClause { span: p.span_from(start) })
        }
        TokenKind::Order | TokenKind::Skip | TokenKind::Offset | TokenKind::Limit => {
            let (order_by, skip, limit) = p.within("ORDER BY", parse_order_skip_limit)?;
            Clause::OrderBySkipLimit(OrderBySkipLimitClause { order_by, skip, limit, span: p.span_from(start) })
        }
        _ => {
            return Err(p.unexpected(
                std::iter::once(Expected::Rule("clause")).chain(CLAUSE_START.iter().map(|k| Expected::Token(*k))),
            ));
        }
    };
    Ok(clause)
}

// ============================================================================
// Reading clauses
// ============================================================================

/// `USE name` or `USE fn(args)`
fn parse_use(p: &mut Parser) -> Result<UseClause> {
    let start = p.start();
    p.expect(TokenKind::Use)?;
    let graph = if p.at_function_call() {
        GraphReference::Function(Box::new(parse_expr(p)?))
    } else {
        GraphReference::Name(p.qualified_name()?)
    };
    Ok(UseClause { graph, span: p.span_from(start) })
}

/// `[OPTIONAL] MATCH [mode] patterns hints* [WHERE expr]`; `OPTIONAL` is
/// already consumed when `optional` is set.
fn parse_match(p: &mut Parser, optional: bool, start: usize) -> Result<MatchClause> {
    p.within(if optional { "OPTIONAL MATCH" } else { "MATCH" }, |p| {
        p.expect(TokenKind::Match)?;

        let mode = match (p.peek_kind(), p.nth_kind(1)) {
            (TokenKind::Repeatable, TokenKind::Elements) => Some(MatchMode::RepeatableElements),
            (TokenKind::Different, TokenKind::Relationships) => Some(MatchMode::DifferentRelationships),
            _ => None,
        };
        if mode.is_some() {
            p.advance();
            p.advance();
        }

        let patterns = pattern::parse_pattern_list(p)?;
        let mut hints = Vec::new();
        while p.at(TokenKind::Using) {
            hints.push(parse_hint(p)?);
        }
        let where_clause = parse_where(p)?;

        Ok(MatchClause { optional, mode, patterns, hints, where_clause, span: p.span_from(start) })
    })
}

fn parse_hint(p: &mut Parser) -> Result<Hint> {
    p.within("hint", |p| {
        let start = p.start();
        p.expect(TokenKind::Using)?;

        match p.peek_kind() {
            TokenKind::Join => {
                p.advance();
                p.expect(TokenKind::On)?;
                let mut variables = vec![p.variable()?];
                while p.eat(TokenKind::Comma) {
                    variables.push(p.variable()?);
                }
                Ok(Hint::Join { variables, span: p.span_from(start) })
            }
            TokenKind::Scan => {
                p.advance();
                let variable = p.variable()?;
                p.expect(TokenKind::Colon)?;
                let label = p.symbolic_name()?;
                Ok(Hint::Scan { variable, label, span: p.span_from(start) })
            }
            _ => {
                let kind = match p.peek_kind() {
                    TokenKind::Text => IndexKind::Text,
                    TokenKind::Range => IndexKind::Range,
                    TokenKind::Point => IndexKind::Point,
                    _ => IndexKind::Default,
                };
                if kind != IndexKind::Default {
                    p.advance();
                } else if !p.at(TokenKind::Index) {
                    return Err(p.unexpected(
                        [
                            TokenKind::Index,
                            TokenKind::Text,
                            TokenKind::Range,
                            TokenKind::Point,
                            TokenKind::Scan,
                            TokenKind::Join,
                        ]
                        .map(Expected::Token),
                    ));
                }
                p.expect(TokenKind::Index)?;
                let seek = p.eat(TokenKind::Seek);
                let variable = p.variable()?;
                p.expect(TokenKind::Colon)?;
                let label = p.symbolic_name()?;
                p.expect(TokenKind::LParen)?;
                let mut properties = vec![p.symbolic_name()?];
                while p.eat(TokenKind::Comma) {
                    properties.push(p.symbolic_name()?);
                }
                p.expect(TokenKind::RParen)?;
                Ok(Hint::Index { kind, seek, variable, label, properties, span: p.span_from(start) })
            }
        }
    })
}

pub(super) fn parse_where(p: &mut Parser) -> Result<Option<Expr>> {
    if p.eat(TokenKind::Where) { parse_expr(p).map(Some) } else { Ok(None) }
}

/// `UNWIND expr AS var`
fn parse_unwind(p: &mut Parser) -> Result<UnwindClause> {
    let start = p.start();
    p.expect(TokenKind::Unwind)?;
    let expr = parse_expr(p)?;
    p.expect(TokenKind::As)?;
    let variable = p.variable()?;
    Ok(UnwindClause { expr, variable, span: p.span_from(start) })
}

/// `LOAD CSV [WITH HEADERS] FROM expr AS var [FIELDTERMINATOR 'c']`
fn parse_load_csv(p: &mut Parser) -> Result<LoadCsvClause> {
    let start = p.start();
    p.expect(TokenKind::Load)?;
    p.expect(TokenKind::Csv)?;
    let with_headers = if p.eat(TokenKind::With) {
        p.expect(TokenKind::Headers)?;
        true
    } else {
        false
    };
    p.expect(TokenKind::From)?;
    let source = parse_expr(p)?;
    p.expect(TokenKind::As)?;
    let variable = p.variable()?;
    let field_terminator = if p.eat(TokenKind::FieldTerminator) {
        let tok = p.expect_any(&[TokenKind::SingleQuotedString, TokenKind::DoubleQuotedString])?;
        Some(tok.text.clone())
    } else {
        None
    };
    Ok(LoadCsvClause { with_headers, source, variable, field_terminator, span: p.span_from(start) })
}

// ============================================================================
// Writing clauses
// ============================================================================

/// `MERGE pattern (ON CREATE SET ... | ON MATCH SET ...)*`
fn parse_merge(p: &mut Parser) -> Result<MergeClause> {
    let start = p.start();
    p.expect(TokenKind::Merge)?;
    let pattern = pattern::parse_pattern_part(p)?;

    let mut actions = Vec::new();
    while p.at(TokenKind::On) && matches!(p.nth_kind(1), TokenKind::Create | TokenKind::Match) {
        let action_start = p.start();
        p.advance();
        let on = if p.advance().kind == TokenKind::Create { MergeTrigger::Create } else { MergeTrigger::Match };
        p.expect(TokenKind::Set)?;
        let items = parse_set_items(p)?;
        actions.push(MergeAction { on, items, span: p.span_from(action_start) });
    }

    Ok(MergeClause { pattern, actions, span: p.span_from(start) })
}

/// `[DETACH|NODETACH] DELETE expr, ...`
fn parse_delete(p: &mut Parser) -> Result<DeleteClause> {
    let start = p.start();
    let mode = match p.peek_kind() {
        TokenKind::Detach => DeleteMode::Detach,
        TokenKind::Nodetach => DeleteMode::NoDetach,
        _ => DeleteMode::Plain,
    };
    if mode != DeleteMode::Plain {
        p.advance();
    }
    p.expect(TokenKind::Delete)?;
    let expressions = parse_expr_list(p)?;
    Ok(DeleteClause { mode, expressions, span: p.span_from(start) })
}

fn parse_set_items(p: &mut Parser) -> Result<Vec<SetItem>> {
    let mut items = vec![parse_set_item(p)?];
    while p.eat(TokenKind::Comma) {
        items.push(parse_set_item(p)?);
    }
    Ok(items)
}

fn parse_set_item(p: &mut Parser) -> Result<SetItem> {
    let start = p.start();
    match p.predict_set_item()? {
        SetTarget::Property => {
            let target = expr::parse_property_target(p)?;
            p.expect(TokenKind::Eq)?;
            let value = parse_expr(p)?;
            let span = p.span_from(start);
            Ok(match target {
                target @ Expr::Index { .. } => SetItem::DynamicProperty { target, value, span },
                property => SetItem::Property { property, value, span },
            })
        }
        SetTarget::AllProperties => {
            let variable = p.variable()?;
            p.advance(); // =
            let value = parse_expr(p)?;
            Ok(SetItem::AllProperties { variable, value, span: p.span_from(start) })
        }
        SetTarget::MergeProperties => {
            let variable = p.variable()?;
            p.advance(); // +=
            let value = parse_expr(p)?;
            Ok(SetItem::MergeProperties { variable, value, span: p.span_from(start) })
        }
        SetTarget::Labels => {
            let variable = p.variable()?;
            let (labels, is_syntax) = label::parse_label_list(p)?;
            Ok(SetItem::Labels { variable, labels, is_syntax, span: p.span_from(start) })
        }
    }
}

/// `REMOVE n.p, n[k], n:A:B, n IS A`
fn parse_remove(p: &mut Parser) -> Result<RemoveClause> {
    let start = p.start();
    p.expect(TokenKind::Remove)?;
    let mut items = vec![parse_remove_item(p)?];
    while p.eat(TokenKind::Comma) {
        items.push(parse_remove_item(p)?);
    }
    Ok(RemoveClause { items, span: p.span_from(start) })
}

fn parse_remove_item(p: &mut Parser) -> Result<RemoveItem> {
    let start = p.start();
    if p.predict_remove_property()? {
        let target = expr::parse_property_target(p)?;
        let span = p.span_from(start);
        return Ok(match target {
            target @ Expr::Index { .. } => RemoveItem::DynamicProperty { target, span },
            property => RemoveItem::Property { property, span },
        });
    }
    let variable = p.variable()?;
    let (labels, is_syntax) = label::parse_label_list(p)?;
    Ok(RemoveItem::Labels { variable, labels, is_syntax, span: p.span_from(start) })
}

/// `FOREACH (var IN list | clause+)`
fn parse_foreach(p: &mut Parser) -> Result<ForeachClause> {
    let start = p.start();
    p.expect(TokenKind::Foreach)?;
    p.expect(TokenKind::LParen)?;
    let variable = p.variable()?;
    p.expect(TokenKind::In)?;
    let list = parse_expr(p)?;
    p.expect(TokenKind::Pipe)?;
    let clauses = p.nested(|p| {
        let mut clauses = vec![parse_clause(p)?];
        while p.at_any(CLAUSE_START) {
            clauses.push(parse_clause(p)?);
        }
        Ok(clauses)
    })?;
    p.expect(TokenKind::RParen)?;
    Ok(ForeachClause { variable, list, clauses, span: p.span_from(start) })
}

// ============================================================================
// Projections
// ============================================================================

/// `WITH [DISTINCT] items [ORDER BY ...] [SKIP n] [LIMIT n] [WHERE expr]`
fn parse_with(p: &mut Parser) -> Result<WithClause> {
    let start = p.start();
    p.expect(TokenKind::With)?;
    let distinct = p.eat(TokenKind::Distinct);
    let items = parse_return_items(p)?;
    let (order_by, skip, limit) = parse_order_skip_limit(p)?;
    let where_clause = parse_where(p)?;
    Ok(WithClause { distinct, items, order_by, skip, limit, where_clause, span: p.span_from(start) })
}

/// `RETURN [DISTINCT] items [ORDER BY ...] [SKIP n] [LIMIT n]`
pub(super) fn parse_return(p: &mut Parser) -> Result<ReturnClause> {
    p.within("RETURN", |p| {
        let start = p.start();
        p.expect(TokenKind::Return)?;
        let distinct = p.eat(TokenKind::Distinct);
        let items = parse_return_items(p)?;
        let (order_by, skip, limit) = parse_order_skip_limit(p)?;
        Ok(ReturnClause { distinct, items, order_by, skip, limit, span: p.span_from(start) })
    })
}

/// `*`, `*, item, ...` or `item, ...`
fn parse_return_items(p: &mut Parser) -> Result<ReturnItems> {
    let start = p.start();
    let star = p.eat(TokenKind::Star);
    let mut items = Vec::new();
    if !star || p.eat(TokenKind::Comma) {
        items.push(parse_return_item(p)?);
        while p.eat(TokenKind::Comma) {
            items.push(parse_return_item(p)?);
        }
    }
    Ok(ReturnItems { star, items, span: p.span_from(start) })
}

fn parse_return_item(p: &mut Parser) -> Result<ReturnItem> {
    let start = p.start();
    let expr = parse_expr(p)?;
    let alias = if p.eat(TokenKind::As) { Some(p.variable()?) } else { None };
    Ok(ReturnItem { expr, alias, span: p.span_from(start) })
}

pub(super) type OrderSkipLimit = (Option<Vec<OrderExpr>>, Option<Expr>, Option<Expr>);

/// Optional `ORDER BY`, `SKIP`/`OFFSET` and `LIMIT`, in that order.
pub(super) fn parse_order_skip_limit(p: &mut Parser) -> Result<OrderSkipLimit> {
    let order_by = if p.eat(TokenKind::Order) {
        p.expect(TokenKind::By)?;
        let mut items = vec![parse_order_item(p)?];
        while p.eat(TokenKind::Comma) {
            items.push(parse_order_item(p)?);
        }
        Some(items)
    } else {
        None
    };
    let skip = if p.eat(TokenKind::Skip) || p.eat(TokenKind::Offset) { Some(parse_expr(p)?) } else { None };
    let limit = if p.eat(TokenKind::Limit) { Some(parse_expr(p)?) } else { None };
    Ok((order_by, skip, limit))
}

fn parse_order_item(p: &mut Parser) -> Result<OrderExpr> {
    let start = p.start();
    let expr = parse_expr(p)?;
    let ascending = match p.peek_kind() {
        TokenKind::Desc | TokenKind::Descending => {
            p.advance();
            false
        }
        TokenKind::Asc | TokenKind::Ascending => {
            p.advance();
            true
        }
        _ => true,
    };
    Ok(OrderExpr { expr, ascending, span: p.span_from(start) })
}

// ============================================================================
// CALL
// ============================================================================

/// Procedure call or subquery; `OPTIONAL` is already consumed when set.
fn parse_call(p: &mut Parser, optional: bool, start: usize) -> Result<Clause> {
    p.within("CALL", |p| {
        p.expect(TokenKind::Call)?;
        match p.predict_call_target()? {
            CallTarget::Procedure => Ok(Clause::Call(parse_procedure_call(p, optional, start)?)),
            CallTarget::Subquery => Ok(Clause::Subquery(parse_subquery_call(p, optional, None, start)?)),
            CallTarget::ScopedSubquery => {
                let scope = parse_subquery_scope(p)?;
                Ok(Clause::Subquery(parse_subquery_call(p, optional, Some(scope), start)?))
            }
        }
    })
}

fn parse_procedure_call(p: &mut Parser, optional: bool, start: usize) -> Result<CallClause> {
    let procedure = p.qualified_name()?;
    let args = if p.eat(TokenKind::LParen) {
        let args = if p.at(TokenKind::RParen) { Vec::new() } else { parse_expr_list(p)? };
        p.expect(TokenKind::RParen)?;
        Some(args)
    } else {
        None
    };
    let yield_clause = if p.at(TokenKind::Yield) { Some(parse_yield(p, false)?) } else { None };
    Ok(CallClause { optional, procedure, args, yield_clause, span: p.span_from(start) })
}

/// `YIELD * | field [AS alias], ...` then, for SHOW commands only,
/// `ORDER BY` / `SKIP` / `LIMIT`, then `WHERE`.
pub(super) fn parse_yield(p: &mut Parser, paging: bool) -> Result<YieldClause> {
    p.within("YIELD", |p| {
        let start = p.start();
        p.expect(TokenKind::Yield)?;
        let star = p.predict_yield_star()?;
        let mut items = Vec::new();
        if star {
            p.advance();
        } else {
            loop {
                let item_start = p.start();
                let field = p.symbolic_name()?;
                let alias = if p.eat(TokenKind::As) { Some(p.variable()?) } else { None };
                items.push(YieldItem { field, alias, span: p.span_from(item_start) });
                if !p.eat(TokenKind::Comma) {
                    break;
                }
            }
        }
        let (order_by, skip, limit) = if paging { parse_order_skip_limit(p)? } else { (None, None, None) };
        let where_clause = parse_where(p)?;
        Ok(YieldClause { star, items, order_by, skip, limit, where_clause, span: p.span_from(start) })
    })
}

/// `(*)`, `()` or `(a, b)`
fn parse_subquery_scope(p: &mut Parser) -> Result<SubqueryScope> {
    let start = p.start();
    p.expect(TokenKind::LParen)?;
    let star = p.eat(TokenKind::Star);
    let mut variables = Vec::new();
    if !star && !p.at(TokenKind::RParen) {
        variables.push(p.variable()?);
        while p.eat(TokenKind::Comma) {
            variables.push(p.variable()?);
        }
    }
    p.expect(TokenKind::RParen)?;
    Ok(SubqueryScope { star, variables, span: p.span_from(start) })
}

fn parse_subquery_call(
    p: &mut Parser,
    optional: bool,
    scope: Option<SubqueryScope>,
    start: usize,
) -> Result<SubqueryClause> {
    p.expect(TokenKind::LBrace)?;
    let query = p.nested(parse_query)?;
    p.expect(TokenKind::RBrace)?;
    let transactions = if p.at(TokenKind::In) { Some(parse_in_transactions(p)?) } else { None };
    Ok(SubqueryClause { optional, scope, query: Box::new(query), transactions, span: p.span_from(start) })
}

/// `IN [n] [CONCURRENT] TRANSACTIONS` followed by `OF n ROWS`,
/// `ON ERROR ...` and `REPORT STATUS AS v` in any order, each at most once.
fn parse_in_transactions(p: &mut Parser) -> Result<InTransactions> {
    p.within("IN TRANSACTIONS", |p| {
        let start = p.start();
        p.expect(TokenKind::In)?;
        let concurrency = if p.at_any(&[TokenKind::Concurrent, TokenKind::Transactions]) {
            None
        } else {
            Some(parse_expr(p)?)
        };
        let concurrent = p.eat(TokenKind::Concurrent);
        if concurrency.is_some() && !concurrent {
            return Err(p.unexpected([Expected::Token(TokenKind::Concurrent)]));
        }
        p.expect(TokenKind::Transactions)?;

        let mut batch_size = None;
        let mut on_error = None;
        let mut report_status = None;
        loop {
            match p.peek_kind() {
                TokenKind::Of if batch_size.is_none() => {
                    p.advance();
                    batch_size = Some(parse_expr(p)?);
                    p.expect(TokenKind::Rows)?;
                }
                TokenKind::On if on_error.is_none() && p.nth_kind(1) == TokenKind::Error => {
                    p.advance();
                    p.advance();
                    let behaviour = match p.expect_any(&[TokenKind::Continue, TokenKind::Break, TokenKind::Fail])?.kind {
                        TokenKind::Continue => OnErrorBehaviour::Continue,
                        TokenKind::Break => OnErrorBehaviour::Break,
                        _ => OnErrorBehaviour::Fail,
                    };
                    on_error = Some(behaviour);
                }
                TokenKind::Report if report_status.is_none() => {
                    p.advance();
                    p.expect(TokenKind::Status)?;
                    p.expect(TokenKind::As)?;
                    report_status = Some(p.variable()?);
                }
                _ => break,
            }
        }

        Ok(InTransactions { concurrent, concurrency, batch_size, on_error, report_status, span: p.span_from(start) })
    })
}
