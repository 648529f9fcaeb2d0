//! Decision points.
//!
//! Wherever two productions share a prefix the parser asks one of the
//! predictors below which alternative to take. Most look at the next one
//! to three tokens; a few speculate, i.e. run the real sub-parser on a saved
//! cursor and report whether it succeeded. Speculation never keeps AST
//! nodes, and its outcome is memoized per (decision, position) for the
//! duration of one statement.

use tracing::trace;

use super::Parser;
use super::pattern;
use crate::cypher::diagnostics::{Expected, SyntaxError};
use crate::cypher::lexer::TokenKind;
use crate::Result;

/// Named decision points, used in diagnostics and as memo keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) enum Decision {
    StatementKind,
    OptionalClause,
    CallTarget,
    YieldItems,
    SetItem,
    RemoveItem,
    PatternStart,
    PathElement,
    ElementVariable,
    Quantifier,
    IsPredicate,
    PostfixIs,
    SubqueryBody,
    ParenthesizedAtom,
    ListBracket,
    PatternComprehension,
    FunctionCall,
    MapProjection,
    TypeUnion,
    LabelDisjunction,
}

impl Decision {
    pub fn name(self) -> &'static str {
        match self {
            Decision::StatementKind => "statement",
            Decision::OptionalClause => "OPTIONAL clause",
            Decision::CallTarget => "CALL target",
            Decision::YieldItems => "YIELD items",
            Decision::SetItem => "SET item",
            Decision::RemoveItem => "REMOVE item",
            Decision::PatternStart => "pattern start",
            Decision::PathElement => "path element",
            Decision::ElementVariable => "element variable",
            Decision::Quantifier => "quantifier or map",
            Decision::IsPredicate => "IS predicate",
            Decision::PostfixIs => "IS label or predicate",
            Decision::SubqueryBody => "subquery body",
            Decision::ParenthesizedAtom => "parenthesized expression or pattern",
            Decision::ListBracket => "list literal or comprehension",
            Decision::PatternComprehension => "pattern comprehension",
            Decision::FunctionCall => "function call",
            Decision::MapProjection => "map projection",
            Decision::TypeUnion => "type union",
            Decision::LabelDisjunction => "label disjunction",
        }
    }
}

// ============================================================================
// Alternatives
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum StatementKind {
    Command,
    Query,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum CallTarget {
    /// `CALL { ... }`
    Subquery,
    /// `CALL (a, b) { ... }`
    ScopedSubquery,
    /// `CALL ns.proc(...)`
    Procedure,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum SetTarget {
    /// `n.p = v`, `n[k] = v`
    Property,
    /// `n = map`
    AllProperties,
    /// `n += map`
    MergeProperties,
    /// `n:A`, `n IS A`
    Labels,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum PathStart {
    Node,
    Parenthesized,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum IsPredicate {
    Null,
    Typed,
    Normalized,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum BracketForm {
    ListComprehension,
    PatternComprehension,
    ListLiteral,
}

/// Keywords that begin a clause inside a subquery body.
const CLAUSE_KEYWORDS: &[TokenKind] = &[
    TokenKind::Match,
    TokenKind::Optional,
    TokenKind::With,
    TokenKind::Return,
    TokenKind::Unwind,
    TokenKind::Call,
    TokenKind::Use,
    TokenKind::Create,
    TokenKind::Insert,
    TokenKind::Merge,
    TokenKind::Set,
    TokenKind::Remove,
    TokenKind::Delete,
    TokenKind::Detach,
    TokenKind::Nodetach,
    TokenKind::Foreach,
    TokenKind::Load,
    TokenKind::Finish,
];

/// Tokens that end a bare element variable: `(n)`, `(n:A)`, `[r*2]`, ...
const AFTER_ELEMENT_VARIABLE: &[TokenKind] = &[
    TokenKind::RParen,
    TokenKind::RBracket,
    TokenKind::Colon,
    TokenKind::LBrace,
    TokenKind::Parameter,
    TokenKind::Is,
    TokenKind::Where,
    TokenKind::Star,
];

/// Tokens after ANY / ALL / SHORTEST that make it a path selector rather
/// than a node variable.
const SELECTOR_CONTINUATION: &[TokenKind] = &[
    TokenKind::Shortest,
    TokenKind::DecimalInteger,
    TokenKind::LParen,
    TokenKind::Path,
    TokenKind::Paths,
    TokenKind::Group,
    TokenKind::Groups,
];

/// Tokens that can only continue a value expression, never a label expression.
const VALUE_CONTINUATION: &[TokenKind] = &[
    TokenKind::Dot,
    TokenKind::LBracket,
    TokenKind::LParen,
    TokenKind::Plus,
    TokenKind::Minus,
    TokenKind::Slash,
    TokenKind::Percent,
    TokenKind::Caret,
    TokenKind::DoublePipe,
    TokenKind::RegexMatch,
    TokenKind::Eq,
    TokenKind::Neq,
    TokenKind::Lt,
    TokenKind::Lte,
    TokenKind::Gt,
    TokenKind::Gte,
];

/// Keywords that begin a type name.
pub(super) const TYPE_KEYWORDS: &[TokenKind] = &[
    TokenKind::Nothing,
    TokenKind::Null,
    TokenKind::Bool,
    TokenKind::Boolean,
    TokenKind::String,
    TokenKind::Varchar,
    TokenKind::Int,
    TokenKind::Integer,
    TokenKind::Signed,
    TokenKind::Float,
    TokenKind::Date,
    TokenKind::Local,
    TokenKind::Zoned,
    TokenKind::Time,
    TokenKind::Timestamp,
    TokenKind::Duration,
    TokenKind::Point,
    TokenKind::Node,
    TokenKind::Vertex,
    TokenKind::Relationship,
    TokenKind::Edge,
    TokenKind::Map,
    TokenKind::List,
    TokenKind::Array,
    TokenKind::Path,
    TokenKind::Property,
    TokenKind::Any,
];

const NORMAL_FORMS: &[TokenKind] = &[TokenKind::Nfc, TokenKind::Nfd, TokenKind::Nfkc, TokenKind::Nfkd];

// ============================================================================
// Predictors
// ============================================================================

impl<'t> Parser<'t> {
    fn record<T: std::fmt::Debug>(&self, decision: Decision, choice: T) -> T {
        trace!(decision = decision.name(), position = self.start(), ?choice, "decision");
        choice
    }

    /// Run `f` on a saved cursor and report whether it succeeded. The cursor,
    /// nesting depth and production stack are restored either way.
    pub(super) fn speculate<T>(&mut self, decision: Decision, f: impl FnOnce(&mut Self) -> Result<T>) -> bool {
        let key = (decision, self.pos);
        if self.memoize {
            if let Some(&hit) = self.memo.get(&key) {
                trace!(decision = decision.name(), position = self.start(), accepted = hit, "memoized speculation");
                return hit;
            }
        }

        let mark = self.mark();
        let depth = self.depth;
        let productions = self.productions.len();
        let accepted = f(self).is_ok();
        self.reset(mark);
        self.depth = depth;
        self.productions.truncate(productions);

        if self.memoize {
            self.memo.insert(key, accepted);
        }
        trace!(decision = decision.name(), position = self.start(), accepted, "speculation");
        accepted
    }

    /// CREATE INDEX / CREATE CONSTRAINT / DROP / SHOW are commands; the rest
    /// is a query.
    pub(super) fn predict_statement(&self) -> StatementKind {
        let kind = match (self.peek_kind(), self.nth_kind(1), self.nth_kind(2)) {
            (TokenKind::Create, TokenKind::Index | TokenKind::Constraint, _) => StatementKind::Command,
            (TokenKind::Create, TokenKind::Range | TokenKind::Text | TokenKind::Point, TokenKind::Index) => {
                StatementKind::Command
            }
            (TokenKind::Drop, TokenKind::Index | TokenKind::Constraint, _) => StatementKind::Command,
            (TokenKind::Show, _, _) => StatementKind::Command,
            _ => StatementKind::Query,
        };
        self.record(Decision::StatementKind, kind)
    }

    /// After `CALL` (and an optional `OPTIONAL`).
    pub(super) fn predict_call_target(&self) -> Result<CallTarget> {
        let target = match self.peek_kind() {
            TokenKind::LBrace => CallTarget::Subquery,
            TokenKind::LParen => CallTarget::ScopedSubquery,
            kind if kind.is_name() => CallTarget::Procedure,
            _ => {
                return Err(self.no_viable(
                    Decision::CallTarget,
                    [Expected::Token(TokenKind::LBrace), Expected::Token(TokenKind::LParen), Expected::Rule("procedure name")],
                ));
            }
        };
        Ok(self.record(Decision::CallTarget, target))
    }

    /// `YIELD *` vs `YIELD a, b`. True for the star form.
    pub(super) fn predict_yield_star(&self) -> Result<bool> {
        match self.peek_kind() {
            TokenKind::Star => Ok(self.record(Decision::YieldItems, true)),
            kind if kind.is_name() => Ok(self.record(Decision::YieldItems, false)),
            _ => Err(self.no_viable(Decision::YieldItems, [Expected::Token(TokenKind::Star), Expected::Rule("field name")])),
        }
    }

    /// SET item: looks at the token after the variable.
    pub(super) fn predict_set_item(&self) -> Result<SetTarget> {
        if !self.at_name() {
            return Err(self.expected_rule("variable"));
        }
        let target = match self.nth_kind(1) {
            TokenKind::Dot | TokenKind::LBracket => SetTarget::Property,
            TokenKind::Eq => SetTarget::AllProperties,
            TokenKind::PlusEq => SetTarget::MergeProperties,
            TokenKind::Colon | TokenKind::Is => SetTarget::Labels,
            _ => {
                return Err(self.no_viable_after_variable(
                    Decision::SetItem,
                    &[TokenKind::Dot, TokenKind::LBracket, TokenKind::Eq, TokenKind::PlusEq, TokenKind::Colon, TokenKind::Is],
                ));
            }
        };
        Ok(self.record(Decision::SetItem, target))
    }

    /// REMOVE item: property (true) or labels (false).
    pub(super) fn predict_remove_property(&self) -> Result<bool> {
        if !self.at_name() {
            return Err(self.expected_rule("variable"));
        }
        match self.nth_kind(1) {
            TokenKind::Dot | TokenKind::LBracket => Ok(self.record(Decision::RemoveItem, true)),
            TokenKind::Colon | TokenKind::Is => Ok(self.record(Decision::RemoveItem, false)),
            _ => Err(self.no_viable_after_variable(
                Decision::RemoveItem,
                &[TokenKind::Dot, TokenKind::LBracket, TokenKind::Colon, TokenKind::Is],
            )),
        }
    }

    fn no_viable_after_variable(&self, decision: Decision, expected: &[TokenKind]) -> crate::Error {
        let tok = self.nth(1).clone();
        SyntaxError::no_viable_alternative(tok, decision.name())
            .with_expected(expected.iter().map(|k| Expected::Token(*k)))
            .with_productions(&self.productions)
            .into()
    }

    /// At ANY / ALL / SHORTEST at the start of a pattern part: a path selector
    /// unless the keyword is a path variable (`all = (a)-->(b)`).
    pub(super) fn at_path_selector(&self) -> bool {
        let selector = matches!(self.peek_kind(), TokenKind::Any | TokenKind::All | TokenKind::Shortest)
            && self.nth_kind(1) != TokenKind::Eq;
        if selector {
            self.record(Decision::PatternStart, selector)
        } else {
            selector
        }
    }

    /// At `(` inside a path: a node pattern, or a parenthesized sub-path
    /// `((a)-->(b))`, `(p = (a)-->(b))` or `(ANY SHORTEST (a)-->(b))`.
    pub(super) fn predict_path_element(&self) -> PathStart {
        let parenthesized = match self.nth_kind(1) {
            TokenKind::LParen => true,
            TokenKind::Any | TokenKind::All | TokenKind::Shortest
                if SELECTOR_CONTINUATION.contains(&self.nth_kind(2)) =>
            {
                true
            }
            kind if kind.is_name() => self.nth_kind(2) == TokenKind::Eq,
            _ => false,
        };
        let start = if parenthesized { PathStart::Parenthesized } else { PathStart::Node };
        self.record(Decision::PathElement, start)
    }

    /// Whether the name at the cursor is an element variable. Matters for
    /// keywords that can also start what follows: `(IS A)`, `(WHERE x)`.
    pub(super) fn at_element_variable(&self) -> bool {
        if !self.at_name() {
            return false;
        }
        match self.peek_kind() {
            TokenKind::Is | TokenKind::Where => {
                self.record(Decision::ElementVariable, AFTER_ELEMENT_VARIABLE.contains(&self.nth_kind(1)))
            }
            _ => true,
        }
    }

    /// At `{` after a relationship or parenthesized path: `{m}`, `{m,n}`,
    /// `{,n}`, `{m,}` are quantifiers; anything else is left for a map.
    pub(super) fn at_brace_quantifier(&self) -> bool {
        if !self.at(TokenKind::LBrace) {
            return false;
        }
        let quantifier = match (self.nth_kind(1), self.nth_kind(2)) {
            (TokenKind::DecimalInteger, TokenKind::RBrace | TokenKind::Comma) => true,
            (TokenKind::Comma, TokenKind::DecimalInteger | TokenKind::RBrace) => true,
            _ => false,
        };
        self.record(Decision::Quantifier, quantifier)
    }

    /// After `IS [NOT]`: which predicate follows. `offset` skips the
    /// `IS` / `IS NOT` prefix.
    pub(super) fn predict_is_predicate(&self, offset: usize) -> Result<IsPredicate> {
        let kind = self.nth_kind(offset);
        let predicate = match kind {
            TokenKind::Null => IsPredicate::Null,
            TokenKind::Typed | TokenKind::DoubleColon => IsPredicate::Typed,
            TokenKind::Normalized => IsPredicate::Normalized,
            k if NORMAL_FORMS.contains(&k) && self.nth_kind(offset + 1) == TokenKind::Normalized => {
                IsPredicate::Normalized
            }
            _ => {
                let tok = self.nth(offset).clone();
                return Err(SyntaxError::no_viable_alternative(
                    tok,
                    Decision::IsPredicate.name(),
                )
                .with_expected([
                    Expected::Token(TokenKind::Null),
                    Expected::Token(TokenKind::Typed),
                    Expected::Token(TokenKind::DoubleColon),
                    Expected::Token(TokenKind::Normalized),
                    Expected::Rule("normal form"),
                ])
                .with_productions(&self.productions)
                .into());
            }
        };
        Ok(self.record(Decision::IsPredicate, predicate))
    }

    /// At `IS` in postfix position: a label test (`n IS Person`) unless a
    /// predicate keyword follows (`n IS NULL`, `n IS NOT TYPED INT`, ...).
    pub(super) fn at_postfix_is_label(&self) -> bool {
        if !self.at(TokenKind::Is) {
            return false;
        }
        let next = self.nth_kind(1);
        let label = match next {
            TokenKind::Not
            | TokenKind::Null
            | TokenKind::Typed
            | TokenKind::Normalized
            | TokenKind::DoubleColon => false,
            k if NORMAL_FORMS.contains(&k) => self.nth_kind(2) != TokenKind::Normalized,
            TokenKind::Bang | TokenKind::Percent | TokenKind::LParen => true,
            k => k.is_name(),
        };
        self.record(Decision::PostfixIs, label)
    }

    /// After `EXISTS {`, `COUNT {`, `COLLECT {`: a full query (true) or a
    /// pattern list with optional WHERE (false).
    pub(super) fn predict_subquery_is_query(&self) -> bool {
        let kind = self.peek_kind();
        let query = CLAUSE_KEYWORDS.contains(&kind) && self.nth_kind(1) != TokenKind::Eq;
        self.record(Decision::SubqueryBody, query)
    }

    /// At `(` in atom position: a pattern expression needs at least one
    /// relationship, which only a speculative parse can tell.
    pub(super) fn at_pattern_expression(&mut self) -> bool {
        if !self.at(TokenKind::LParen) {
            return false;
        }
        self.speculate(Decision::ParenthesizedAtom, |p| {
            let path = pattern::parse_path_pattern(p)?;
            if path.relationships().next().is_some() {
                Ok(())
            } else {
                Err(p.expected_rule("relationship pattern"))
            }
        })
    }

    /// At `[` in atom position.
    pub(super) fn predict_bracket(&mut self) -> BracketForm {
        let form = if self.nth_kind(1).is_name() && self.nth_kind(2) == TokenKind::In {
            BracketForm::ListComprehension
        } else if self.nth_kind(1) == TokenKind::LParen
            || (self.nth_kind(1).is_name() && self.nth_kind(2) == TokenKind::Eq)
        {
            let comprehension = self.speculate(Decision::PatternComprehension, |p| {
                p.expect(TokenKind::LBracket)?;
                if p.at_name() && p.nth_kind(1) == TokenKind::Eq {
                    p.advance();
                    p.advance();
                }
                let path = pattern::parse_path_pattern(p)?;
                if path.relationships().next().is_none() {
                    return Err(p.expected_rule("relationship pattern"));
                }
                p.expect_any(&[TokenKind::Where, TokenKind::Pipe])
            });
            if comprehension { BracketForm::PatternComprehension } else { BracketForm::ListLiteral }
        } else {
            BracketForm::ListLiteral
        };
        self.record(Decision::ListBracket, form)
    }

    /// `name (. name)* (` starts a function call.
    pub(super) fn at_function_call(&self) -> bool {
        if !self.at_name() {
            return false;
        }
        let mut n = 1;
        while self.nth_kind(n) == TokenKind::Dot && self.nth_kind(n + 1).is_name() {
            n += 2;
        }
        let call = self.nth_kind(n) == TokenKind::LParen;
        if call {
            self.record(Decision::FunctionCall, call)
        } else {
            call
        }
    }

    /// `n {` starts a map projection.
    pub(super) fn at_map_projection(&self) -> bool {
        let projection = self.at_name() && self.nth_kind(1) == TokenKind::LBrace;
        if projection {
            self.record(Decision::MapProjection, projection)
        } else {
            projection
        }
    }

    /// At `|` after a type: another member of a type union follows.
    pub(super) fn at_type_union(&self) -> bool {
        self.at(TokenKind::Pipe) && self.record(Decision::TypeUnion, TYPE_KEYWORDS.contains(&self.nth_kind(1)))
    }

    /// At `|` inside an expression-position label expression: continue the
    /// disjunction unless the next name is clearly the start of a value
    /// (`[x IN l WHERE x:A | x.name]`).
    pub(super) fn at_label_disjunction(&self, in_expression: bool) -> bool {
        if !self.at(TokenKind::Pipe) {
            return false;
        }
        let next = self.nth_kind(1);
        let continues = match next {
            TokenKind::Colon | TokenKind::Bang | TokenKind::Percent | TokenKind::LParen => true,
            k if k.is_name() => !in_expression || !VALUE_CONTINUATION.contains(&self.nth_kind(2)),
            _ => false,
        };
        self.record(Decision::LabelDisjunction, continues)
    }

    /// `OPTIONAL` must be followed by MATCH or CALL.
    pub(super) fn expect_optional_target(&self) -> Result<TokenKind> {
        match self.nth_kind(1) {
            kind @ (TokenKind::Match | TokenKind::Call) => Ok(self.record(Decision::OptionalClause, kind)),
            _ => {
                let tok = self.nth(1).clone();
                Err(SyntaxError::no_viable_alternative(tok, Decision::OptionalClause.name())
                    .with_expected([Expected::Token(TokenKind::Match), Expected::Token(TokenKind::Call)])
                    .with_productions(&self.productions)
                    .into())
            }
        }
    }
}

/// Whether `kind` can begin an expression; used to decide whether an
/// optional expression is present.
pub(super) fn starts_expression(kind: TokenKind) -> bool {
    kind.is_name()
        || kind.is_number()
        || kind.is_string()
        || matches!(
            kind,
            TokenKind::Parameter
                | TokenKind::LParen
                | TokenKind::LBracket
                | TokenKind::LBrace
                | TokenKind::Plus
                | TokenKind::Minus
        )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ParserConfig;
    use crate::cypher::lexer::tokenize;

    fn with_parser<R>(input: &str, f: impl FnOnce(&mut Parser<'_>) -> R) -> R {
        let tokens = tokenize(input).unwrap();
        let config = ParserConfig::default();
        let mut p = Parser::new(&tokens, &config);
        f(&mut p)
    }

    #[test]
    fn test_statement_kind() {
        assert_eq!(with_parser("CREATE INDEX FOR (n:L) ON (n.p)", |p| p.predict_statement()), StatementKind::Command);
        assert_eq!(with_parser("CREATE TEXT INDEX i FOR", |p| p.predict_statement()), StatementKind::Command);
        assert_eq!(with_parser("CREATE (n)", |p| p.predict_statement()), StatementKind::Query);
        assert_eq!(with_parser("SHOW INDEXES", |p| p.predict_statement()), StatementKind::Command);
    }

    #[test]
    fn test_call_target() {
        assert_eq!(with_parser("{ RETURN 1 }", |p| p.predict_call_target().unwrap()), CallTarget::Subquery);
        assert_eq!(with_parser("(a) { RETURN 1 }", |p| p.predict_call_target().unwrap()), CallTarget::ScopedSubquery);
        assert_eq!(with_parser("db.labels()", |p| p.predict_call_target().unwrap()), CallTarget::Procedure);
        let err = with_parser(", x", |p| p.predict_call_target().unwrap_err());
        assert_eq!(err.as_syntax().unwrap().decision, Some("CALL target"));
    }

    #[test]
    fn test_set_item_prediction() {
        assert_eq!(with_parser("n.p = 1", |p| p.predict_set_item().unwrap()), SetTarget::Property);
        assert_eq!(with_parser("n[k] = 1", |p| p.predict_set_item().unwrap()), SetTarget::Property);
        assert_eq!(with_parser("n = {}", |p| p.predict_set_item().unwrap()), SetTarget::AllProperties);
        assert_eq!(with_parser("n += {}", |p| p.predict_set_item().unwrap()), SetTarget::MergeProperties);
        assert_eq!(with_parser("n:A", |p| p.predict_set_item().unwrap()), SetTarget::Labels);
        assert_eq!(with_parser("n IS A", |p| p.predict_set_item().unwrap()), SetTarget::Labels);
    }

    #[test]
    fn test_brace_quantifier() {
        assert!(with_parser("{2}", |p| p.at_brace_quantifier()));
        assert!(with_parser("{1,3}", |p| p.at_brace_quantifier()));
        assert!(with_parser("{,3}", |p| p.at_brace_quantifier()));
        assert!(with_parser("{2,}", |p| p.at_brace_quantifier()));
        assert!(!with_parser("{a: 1}", |p| p.at_brace_quantifier()));
    }

    #[test]
    fn test_postfix_is() {
        assert!(with_parser("IS Person", |p| p.at_postfix_is_label()));
        assert!(with_parser("IS !Person", |p| p.at_postfix_is_label()));
        assert!(!with_parser("IS NULL", |p| p.at_postfix_is_label()));
        assert!(!with_parser("IS NOT NULL", |p| p.at_postfix_is_label()));
        assert!(!with_parser("IS NFC NORMALIZED", |p| p.at_postfix_is_label()));
        assert!(!with_parser("IS :: INTEGER", |p| p.at_postfix_is_label()));
    }

    #[test]
    fn test_is_predicate_looks_past_not() {
        assert_eq!(with_parser("IS NOT TYPED INT", |p| p.predict_is_predicate(2).unwrap()), IsPredicate::Typed);
        assert_eq!(with_parser("IS NOT NFKD NORMALIZED", |p| p.predict_is_predicate(2).unwrap()), IsPredicate::Normalized);
        assert_eq!(with_parser("IS NULL", |p| p.predict_is_predicate(1).unwrap()), IsPredicate::Null);
    }

    #[test]
    fn test_path_element() {
        assert_eq!(with_parser("(a)", |p| p.predict_path_element()), PathStart::Node);
        assert_eq!(with_parser("((a)-->(b))", |p| p.predict_path_element()), PathStart::Parenthesized);
        assert_eq!(with_parser("(p = (a)-->(b))", |p| p.predict_path_element()), PathStart::Parenthesized);
        assert_eq!(with_parser("(ANY SHORTEST (a)-->(b))", |p| p.predict_path_element()), PathStart::Parenthesized);
        assert_eq!(with_parser("(SHORTEST 2 (a)-->(b))", |p| p.predict_path_element()), PathStart::Parenthesized);
        assert_eq!(with_parser("(any:Label)", |p| p.predict_path_element()), PathStart::Node);
        assert_eq!(with_parser("(all)", |p| p.predict_path_element()), PathStart::Node);
    }

    #[test]
    fn test_pattern_expression_speculation_restores_cursor() {
        with_parser("(a)-->(b)", |p| {
            assert!(p.at_pattern_expression());
            assert_eq!(p.mark(), 0);
        });
        with_parser("(a) - (b)", |p| {
            assert!(!p.at_pattern_expression());
            assert_eq!(p.mark(), 0);
        });
    }

    #[test]
    fn test_speculation_is_memoized() {
        with_parser("(a)-->(b)", |p| {
            assert!(p.at_pattern_expression());
            assert!(p.memo.contains_key(&(Decision::ParenthesizedAtom, 0)));
        });
    }

    #[test]
    fn test_bracket_forms() {
        assert_eq!(with_parser("[x IN l | x]", |p| p.predict_bracket()), BracketForm::ListComprehension);
        assert_eq!(with_parser("[(a)-->(b) | b]", |p| p.predict_bracket()), BracketForm::PatternComprehension);
        assert_eq!(with_parser("[p = (a)-->(b) WHERE a.x | p]", |p| p.predict_bracket()), BracketForm::PatternComprehension);
        assert_eq!(with_parser("[(1), 2]", |p| p.predict_bracket()), BracketForm::ListLiteral);
        assert_eq!(with_parser("[(a) | 1]", |p| p.predict_bracket()), BracketForm::ListLiteral);
    }

    #[test]
    fn test_subquery_body() {
        assert!(with_parser("MATCH (n) RETURN n", |p| p.predict_subquery_is_query()));
        assert!(!with_parser("(n)-->()", |p| p.predict_subquery_is_query()));
    }
}
