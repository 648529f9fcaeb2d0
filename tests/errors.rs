//! Structured syntax errors and script-level recovery.

use cypher_front::{
    parse, parse_script, parse_with, Error, Expected, ParserConfig, RecoveryPolicy, SyntaxErrorKind, TokenKind,
};
use pretty_assertions::assert_eq;

#[test]
fn test_script_recovers_after_unterminated_node() {
    let outcome = parse_script("MATCH (n) RETURN n; CREATE (", &ParserConfig::default()).unwrap();
    assert_eq!(outcome.statements.len(), 1);
    assert_eq!(outcome.errors.len(), 1);

    let err = &outcome.errors[0];
    assert_eq!(err.kind, SyntaxErrorKind::UnexpectedEndOfInput);
    assert_eq!(err.production(), Some("node pattern"));
    assert_eq!(err.token.kind, TokenKind::Eof);
    assert!(err.expects(TokenKind::RParen));
}

#[test]
fn test_recovery_keeps_later_statements() {
    let script = "RETURN 1; MATCH (n RETURN n; RETURN 3";
    let outcome = parse_script(script, &ParserConfig::default()).unwrap();
    assert_eq!(outcome.statements.len(), 2);
    assert_eq!(outcome.errors.len(), 1);
    assert_eq!(outcome.errors[0].position(), 19);
    assert!(!outcome.is_ok());

    let strict = ParserConfig::default().with_recovery(RecoveryPolicy::Abort);
    let outcome = parse_script(script, &strict).unwrap();
    assert_eq!(outcome.statements.len(), 1);
    assert_eq!(outcome.errors.len(), 1);
}

#[test]
fn test_errors_reported_in_source_order() {
    let outcome = parse_script("RETURN ; WITH ; RETURN 1", &ParserConfig::default()).unwrap();
    let positions: Vec<_> = outcome.errors.iter().map(|e| e.position()).collect();
    assert_eq!(positions, vec![7, 14]);
    assert_eq!(outcome.statements.len(), 1);
}

#[test]
fn test_unknown_leading_keyword() {
    let err = parse("FROM x RETURN x").unwrap_err();
    let err = err.as_syntax().unwrap();
    assert_eq!(err.kind, SyntaxErrorKind::LexicalMismatch);
    assert_eq!(err.position(), 0);
    assert!(err.expects(TokenKind::Match));
    assert!(err.expected.contains(&Expected::Rule("clause")));
}

#[test]
fn test_no_viable_alternative_names_decision() {
    let err = parse("MATCH (n) SET n RETURN n").unwrap_err();
    let err = err.as_syntax().unwrap();
    assert_eq!(err.kind, SyntaxErrorKind::NoViableAlternative);
    assert!(err.decision.is_some());
    assert!(err.message().starts_with("no viable alternative"));
}

#[test]
fn test_optional_must_precede_match_or_call() {
    let err = parse("OPTIONAL RETURN 1").unwrap_err();
    let err = err.as_syntax().unwrap();
    assert_eq!(err.kind, SyntaxErrorKind::NoViableAlternative);
    assert!(err.expects(TokenKind::Match));
    assert!(err.expects(TokenKind::Call));
}

#[test]
fn test_nesting_limit_is_an_error_not_an_overflow() {
    let depth = 64;
    let query = format!("RETURN {}1{}", "(".repeat(depth), ")".repeat(depth));
    let config = ParserConfig::default().with_max_nesting_depth(16);
    let err = parse_with(&query, &config).unwrap_err();
    assert_eq!(err.as_syntax().unwrap().kind, SyntaxErrorKind::NestingTooDeep);

    assert!(parse(&query).is_ok());
}

#[test]
fn test_render_points_at_offending_token() {
    let source = "MATCH (n)\nRETURN n +";
    let err = parse(source).unwrap_err();
    let rendered = err.as_syntax().unwrap().render(source);
    assert!(rendered.contains("--> 2:11"), "{rendered}");
    assert!(rendered.contains("found end of input"), "{rendered}");
    assert!(rendered.contains("2 | RETURN n +"), "{rendered}");
    assert!(rendered.contains("while parsing"), "{rendered}");
}

#[test]
fn test_lexical_error_position() {
    match parse("RETURN 'abc") {
        Err(Error::Lexical { position, .. }) => assert_eq!(position, 7),
        other => panic!("Expected lexical error, got {other:?}"),
    }
}

#[test]
fn test_trailing_tokens_rejected() {
    let err = parse("RETURN 1 )").unwrap_err();
    assert_eq!(err.position(), Some(9));
}

#[test]
fn test_display_includes_position() {
    let err = parse("MATCH (n").unwrap_err();
    assert!(err.to_string().starts_with("Cypher syntax error at position 8"), "{err}");
}
