//! Whole-statement parsing through the public entry points.

use cypher_front::ast::*;
use cypher_front::parse;
use pretty_assertions::assert_eq;

fn single(query: &str) -> SingleQuery {
    match parse(query).unwrap_or_else(|e| panic!("{query}: {e}")) {
        Statement::Query(Query::Single(q)) => q,
        other => panic!("Expected single query, got {other:?}"),
    }
}

fn clause_names(query: &str) -> Vec<&'static str> {
    single(query).clauses.iter().map(Clause::name).collect()
}

// ============================================================================
// End-to-end cases
// ============================================================================

#[test]
fn test_match_var_length_where_return() {
    let q = single("MATCH (a:Person)-[:KNOWS*1..3]->(b) WHERE a.name = 'Alice' RETURN b");
    assert_eq!(q.clauses.len(), 2);

    let Clause::Match(m) = &q.clauses[0] else { panic!("expected MATCH") };
    assert_eq!(m.patterns.len(), 1);
    let path = m.patterns[0].body.path();
    let rels: Vec<_> = path.relationships().collect();
    assert_eq!(rels.len(), 1);
    assert_eq!(rels[0].direction(), PatternDirection::Right);
    let length = rels[0].length.as_ref().unwrap();
    assert_eq!((length.min, length.max), (Some(1), Some(3)));
    assert!(matches!(
        m.where_clause,
        Some(Expr::BinaryOp { op: BinaryOp::Eq, .. })
    ));

    let Clause::Return(r) = &q.clauses[1] else { panic!("expected RETURN") };
    assert_eq!(r.items.items.len(), 1);
    assert!(matches!(&r.items.items[0].expr, Expr::Variable(v) if v.name == "b"));
}

#[test]
fn test_procedure_call_with_yield() {
    let q = single("CALL db.labels() YIELD label RETURN label");
    let Clause::Call(call) = &q.clauses[0] else { panic!("expected CALL") };
    assert_eq!(call.procedure.to_string(), "db.labels");
    assert_eq!(call.args.as_deref(), Some(&[][..]));
    let y = call.yield_clause.as_ref().unwrap();
    assert!(!y.star);
    assert_eq!(y.items.len(), 1);
    assert_eq!(y.items[0].field.name, "label");
    assert!(matches!(q.clauses[1], Clause::Return(_)));
}

#[test]
fn test_searched_case() {
    let q = single("RETURN CASE WHEN true THEN 1 ELSE 2 END");
    let Clause::Return(r) = &q.clauses[0] else { panic!("expected RETURN") };
    let Expr::Case(case) = &r.items.items[0].expr else { panic!("expected CASE") };
    assert!(case.operand.is_none());
    assert_eq!(case.alternatives.len(), 1);
    assert!(case.default.is_some());
}

// ============================================================================
// Clause dispatch
// ============================================================================

#[test]
fn test_write_pipeline() {
    assert_eq!(
        clause_names(
            "MATCH (a {id: 1}) OPTIONAL MATCH (a)-[r]->() MERGE (b:B {id: 2}) \
             CREATE (a)-[:T]->(b) SET b.x = 1 REMOVE a.y DETACH DELETE r"
        ),
        vec!["MATCH", "OPTIONAL MATCH", "MERGE", "CREATE", "SET", "REMOVE", "DELETE"],
    );
}

#[test]
fn test_read_pipeline() {
    assert_eq!(
        clause_names(
            "USE movies UNWIND $ids AS id MATCH (m:Movie {id: id}) WITH m ORDER BY m.year \
             CALL { WITH m RETURN m.title AS t } RETURN t SKIP 1 LIMIT 2"
        ),
        vec!["USE", "UNWIND", "MATCH", "WITH", "CALL {}", "RETURN"],
    );
}

#[test]
fn test_insert_foreach_load_finish() {
    assert_eq!(
        clause_names(
            "LOAD CSV WITH HEADERS FROM 'file:///p.csv' AS row INSERT (:P {name: row.name}) \
             FOREACH (x IN [1] | CREATE (:Q)) FINISH"
        ),
        vec!["LOAD CSV", "INSERT", "FOREACH", "FINISH"],
    );
}

#[test]
fn test_trailing_order_by_clause() {
    let q = single("MATCH (n) ORDER BY n.x SKIP 2");
    let Clause::OrderBySkipLimit(o) = &q.clauses[1] else { panic!("expected ORDER BY") };
    assert_eq!(o.order_by.as_ref().map(Vec::len), Some(1));
    assert!(o.skip.is_some());
    assert!(o.limit.is_none());
}

#[test]
fn test_union_is_left_associative() {
    let stmt = parse("RETURN 1 AS x UNION RETURN 2 AS x UNION ALL RETURN 3 AS x").unwrap();
    let Statement::Query(Query::Union(outer)) = stmt else { panic!("expected UNION") };
    assert_eq!(outer.kind, UnionKind::All);
    let Query::Union(inner) = &outer.left else { panic!("expected nested UNION on the left") };
    assert_eq!(inner.kind, UnionKind::Plain);
}

#[test]
fn test_call_forms() {
    let q = single("CALL apoc.help");
    let Clause::Call(call) = &q.clauses[0] else { panic!("expected CALL") };
    assert!(call.args.is_none());

    let q = single("MATCH (n) CALL (n) { RETURN n.x AS x } IN TRANSACTIONS OF 10 ROWS RETURN x");
    let Clause::Subquery(sub) = &q.clauses[1] else { panic!("expected subquery") };
    assert_eq!(sub.scope.as_ref().unwrap().variables.len(), 1);
    assert!(sub.transactions.as_ref().unwrap().batch_size.is_some());
}

#[test]
fn test_schema_command_statement() {
    let stmt = parse("CREATE INDEX FOR (p:Person) ON (p.name)").unwrap();
    assert!(matches!(stmt, Statement::Command(Command::CreateIndex(_))));
    let stmt = parse("SHOW PROCEDURES YIELD name RETURN name").unwrap();
    assert!(matches!(stmt, Statement::Command(Command::Show(_))));
}

#[test]
fn test_trailing_semicolon_is_accepted() {
    assert_eq!(clause_names("RETURN 1;"), vec!["RETURN"]);
}

#[test]
fn test_keywords_are_case_insensitive() {
    assert_eq!(clause_names("match (n) return n"), vec!["MATCH", "RETURN"]);
}
