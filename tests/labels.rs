//! Label and relationship-type expressions in both `:` and `IS` spellings.

use cypher_front::ast::*;
use cypher_front::{parse, parse_label_expression};
use pretty_assertions::assert_eq;

fn labels(input: &str) -> LabelExpression {
    parse_label_expression(input).unwrap_or_else(|e| panic!("{input}: {e}"))
}

/// Compact prefix rendering: `|(&(A,B),C)`.
fn shape(e: &LabelExpr) -> String {
    match e {
        LabelExpr::Leaf(name) => name.name.clone(),
        LabelExpr::Wildcard(_) => "%".into(),
        LabelExpr::Negation { expr, .. } => format!("!{}", shape(expr)),
        LabelExpr::Conjunction { left, right, .. } => format!("&({},{})", shape(left), shape(right)),
        LabelExpr::Disjunction { left, right, .. } => format!("|({},{})", shape(left), shape(right)),
    }
}

#[test]
fn test_where_label_test_precedence() {
    let stmt = parse("MATCH (n) WHERE n:A&B|C RETURN n").unwrap();
    let Statement::Query(Query::Single(q)) = stmt else { panic!("expected single query") };
    let Clause::Match(m) = &q.clauses[0] else { panic!("expected MATCH") };
    let Some(Expr::LabelTest { labels, .. }) = &m.where_clause else { panic!("expected label test") };
    assert_eq!(shape(&labels.expr), "|(&(A,B),C)");
}

#[test]
fn test_double_negation_is_kept() {
    let l = labels(":!!X");
    assert_eq!(shape(&l.expr), "!!X");
    let LabelExpr::Negation { expr, .. } = &l.expr else { panic!("expected negation") };
    assert!(matches!(&**expr, LabelExpr::Negation { expr, .. } if matches!(&**expr, LabelExpr::Leaf(_))));
}

#[test]
fn test_precedence_levels() {
    assert_eq!(shape(&labels(":A|B&C").expr), "|(A,&(B,C))");
    assert_eq!(shape(&labels(":!A&B").expr), "&(!A,B)");
    assert_eq!(shape(&labels(":(A|B)&C").expr), "&(|(A,B),C)");
    assert_eq!(shape(&labels(":A|B|C").expr), "|(|(A,B),C)");
    assert_eq!(shape(&labels(":%&!%").expr), "&(%,!%)");
}

#[test]
fn test_legacy_colon_spellings() {
    let l = labels(":A:B");
    assert!(matches!(l.expr, LabelExpr::Conjunction { colon: true, .. }));
    let l = labels(":A|:B");
    assert!(matches!(l.expr, LabelExpr::Disjunction { colon: true, .. }));
}

#[test]
fn test_is_spelling_matches_colon_spelling() {
    let colon = labels(":A&(B|!C)");
    let is = labels("IS A&(B|!C)");
    assert_eq!(colon.syntax, LabelSyntax::Colon);
    assert_eq!(is.syntax, LabelSyntax::Is);
    assert_eq!(shape(&colon.expr), shape(&is.expr));
}

#[test]
fn test_is_label_in_node_pattern() {
    let stmt = parse("MATCH (n IS Person|Robot WHERE n.x = 1) RETURN n").unwrap();
    let Statement::Query(Query::Single(q)) = stmt else { panic!("expected single query") };
    let Clause::Match(m) = &q.clauses[0] else { panic!("expected MATCH") };
    let node = m.patterns[0].body.path().nodes().next().unwrap();
    let l = node.labels.as_ref().unwrap();
    assert_eq!(l.syntax, LabelSyntax::Is);
    assert_eq!(shape(&l.expr), "|(Person,Robot)");
    assert!(node.predicate.is_some());
}

#[test]
fn test_label_spans() {
    let l = labels(":A&B");
    assert_eq!(l.span, Span::new(0, 4));
    assert_eq!(l.expr.span(), Span::new(1, 4));
}

#[test]
fn test_dangling_operator_is_an_error() {
    assert!(parse_label_expression(":A&").is_err());
    assert!(parse_label_expression(":(A").is_err());
    assert!(parse_label_expression("A").is_err());
}
