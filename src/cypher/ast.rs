//! Cypher AST (Abstract Syntax Tree)
//!
//! These types represent parsed Cypher statements. They are pure data;
//! no behavior beyond span access, no storage references, no semantic
//! validation. Every node owns its children and the source span it covers;
//! child order mirrors the order of the grammar production.

use std::fmt;

use serde::Serialize;

pub use super::lexer::Span;

// ============================================================================
// Names
// ============================================================================

/// A variable binding or reference: `n`, `` `my var` ``.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Variable {
    pub name: String,
    pub span: Span,
}

/// Any other symbolic name: labels, relationship types, property keys,
/// function and procedure name parts, YIELD fields.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SymbolicName {
    pub name: String,
    pub span: Span,
}

/// Dotted name: `db.labels`, `apoc.coll.sum`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QualifiedName {
    pub parts: Vec<SymbolicName>,
    pub span: Span,
}

impl fmt::Display for QualifiedName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, part) in self.parts.iter().enumerate() {
            if i > 0 {
                f.write_str(".")?;
            }
            f.write_str(&part.name)?;
        }
        Ok(())
    }
}

// ============================================================================
// Statements
// ============================================================================

/// A complete Cypher statement.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Statement {
    /// Regular query: one or more single queries joined by UNION.
    Query(Query),
    /// Administrative command (schema, SHOW).
    Command(Command),
}

impl Statement {
    pub fn span(&self) -> Span {
        match self {
            Statement::Query(q) => q.span(),
            Statement::Command(c) => c.span(),
        }
    }

    /// Pretty-printed JSON dump, for debugging and golden files.
    pub fn to_json(&self) -> crate::Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// A regular query.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Query {
    Single(SingleQuery),
    Union(Box<UnionQuery>),
}

impl Query {
    pub fn span(&self) -> Span {
        match self {
            Query::Single(q) => q.span,
            Query::Union(u) => u.span,
        }
    }

    /// Single queries in source order.
    pub fn parts(&self) -> Vec<&SingleQuery> {
        match self {
            Query::Single(q) => vec![q],
            Query::Union(u) => {
                let mut parts = u.left.parts();
                parts.push(&u.right);
                parts
            }
        }
    }
}

/// `left UNION [ALL|DISTINCT] right`: left-associative.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UnionQuery {
    pub left: Query,
    pub kind: UnionKind,
    pub right: SingleQuery,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum UnionKind {
    /// `UNION`
    Plain,
    /// `UNION ALL`
    All,
    /// `UNION DISTINCT`
    Distinct,
}

/// One or more clauses.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SingleQuery {
    pub clauses: Vec<Clause>,
    pub span: Span,
}

// ============================================================================
// Clauses
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Clause {
    Use(UseClause),
    Match(MatchClause),
    Merge(MergeClause),
    Create(CreateClause),
    Insert(InsertClause),
    Delete(DeleteClause),
    Set(SetClause),
    Remove(RemoveClause),
    With(WithClause),
    Return(ReturnClause),
    Unwind(UnwindClause),
    /// Procedure call: `CALL db.labels() YIELD label`
    Call(CallClause),
    /// Subquery call: `CALL { ... }`
    Subquery(SubqueryClause),
    Foreach(ForeachClause),
    LoadCsv(LoadCsvClause),
    Finish(FinishClause),
    /// Standalone `ORDER BY ... SKIP ... LIMIT ...`
    OrderBySkipLimit(OrderBySkipLimitClause),
}

impl Clause {
    pub fn span(&self) -> Span {
        match self {
            Clause::Use(c) => c.span,
            Clause::Match(c) => c.span,
            Clause::Merge(c) => c.span,
            Clause::Create(c) => c.span,
            Clause::Insert(c) => c.span,
            Clause::Delete(c) => c.span,
            Clause::Set(c) => c.span,
            Clause::Remove(c) => c.span,
            Clause::With(c) => c.span,
            Clause::Return(c) => c.span,
            Clause::Unwind(c) => c.span,
            Clause::Call(c) => c.span,
            Clause::Subquery(c) => c.span,
            Clause::Foreach(c) => c.span,
            Clause::LoadCsv(c) => c.span,
            Clause::Finish(c) => c.span,
            Clause::OrderBySkipLimit(c) => c.span,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Clause::Use(_) => "USE",
            Clause::Match(c) if c.optional => "OPTIONAL MATCH",
            Clause::Match(_) => "MATCH",
            Clause::Merge(_) => "MERGE",
            Clause::Create(_) => "CREATE",
            Clause::Insert(_) => "INSERT",
            Clause::Delete(_) => "DELETE",
            Clause::Set(_) => "SET",
            Clause::Remove(_) => "REMOVE",
            Clause::With(_) => "WITH",
            Clause::Return(_) => "RETURN",
            Clause::Unwind(_) => "UNWIND",
            Clause::Call(_) => "CALL",
            Clause::Subquery(_) => "CALL {}",
            Clause::Foreach(_) => "FOREACH",
            Clause::LoadCsv(_) => "LOAD CSV",
            Clause::Finish(_) => "FINISH",
            Clause::OrderBySkipLimit(_) => "ORDER BY",
        }
    }
}

/// `USE graph`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UseClause {
    pub graph: GraphReference,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum GraphReference {
    /// `USE neo4j`, `USE composite.shard`
    Name(QualifiedName),
    /// `USE graph.byName('x')`: always an [`Expr::FunctionCall`]
    Function(Box<Expr>),
}

/// MATCH clause with patterns, hints and optional WHERE.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchClause {
    pub optional: bool,
    pub mode: Option<MatchMode>,
    pub patterns: Vec<PatternPart>,
    pub hints: Vec<Hint>,
    pub where_clause: Option<Expr>,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum MatchMode {
    /// `REPEATABLE ELEMENTS`
    RepeatableElements,
    /// `DIFFERENT RELATIONSHIPS`
    DifferentRelationships,
}

/// Planner hint following a MATCH pattern.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Hint {
    /// `USING [TEXT|RANGE|POINT] INDEX [SEEK] n:Label(prop, ...)`
    Index {
        kind: IndexKind,
        seek: bool,
        variable: Variable,
        label: SymbolicName,
        properties: Vec<SymbolicName>,
        span: Span,
    },
    /// `USING SCAN n:Label`
    Scan { variable: Variable, label: SymbolicName, span: Span },
    /// `USING JOIN ON a, b`
    Join { variables: Vec<Variable>, span: Span },
}

/// MERGE clause.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MergeClause {
    pub pattern: PatternPart,
    pub actions: Vec<MergeAction>,
    pub span: Span,
}

/// `ON CREATE SET ...` / `ON MATCH SET ...`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MergeAction {
    pub on: MergeTrigger,
    pub items: Vec<SetItem>,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum MergeTrigger {
    Create,
    Match,
}

/// CREATE clause.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CreateClause {
    pub patterns: Vec<PatternPart>,
    pub span: Span,
}

/// INSERT clause (GQL spelling of CREATE).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InsertClause {
    pub patterns: Vec<PatternPart>,
    pub span: Span,
}

/// DELETE clause.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeleteClause {
    pub mode: DeleteMode,
    pub expressions: Vec<Expr>,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DeleteMode {
    /// `DELETE`
    Plain,
    /// `DETACH DELETE`
    Detach,
    /// `NODETACH DELETE`
    NoDetach,
}

/// SET clause.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SetClause {
    pub items: Vec<SetItem>,
    pub span: Span,
}

/// Single SET item.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum SetItem {
    /// SET n.prop = expr: `property` is an [`Expr::Property`]
    Property { property: Expr, value: Expr, span: Span },
    /// SET n[key] = expr: `target` is an [`Expr::Index`]
    DynamicProperty { target: Expr, value: Expr, span: Span },
    /// SET n = {map}
    AllProperties { variable: Variable, value: Expr, span: Span },
    /// SET n += {map}
    MergeProperties { variable: Variable, value: Expr, span: Span },
    /// SET n:Label1:Label2 / SET n IS Label
    Labels { variable: Variable, labels: Vec<SymbolicName>, is_syntax: bool, span: Span },
}

impl SetItem {
    pub fn span(&self) -> Span {
        match self {
            SetItem::Property { span, .. }
            | SetItem::DynamicProperty { span, .. }
            | SetItem::AllProperties { span, .. }
            | SetItem::MergeProperties { span, .. }
            | SetItem::Labels { span, .. } => *span,
        }
    }
}

/// REMOVE clause.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RemoveClause {
    pub items: Vec<RemoveItem>,
    pub span: Span,
}

/// Single REMOVE item.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum RemoveItem {
    /// REMOVE n.prop: `property` is an [`Expr::Property`]
    Property { property: Expr, span: Span },
    /// REMOVE n[key]: `target` is an [`Expr::Index`]
    DynamicProperty { target: Expr, span: Span },
    /// REMOVE n:Label / REMOVE n IS Label
    Labels { variable: Variable, labels: Vec<SymbolicName>, is_syntax: bool, span: Span },
}

impl RemoveItem {
    pub fn span(&self) -> Span {
        match self {
            RemoveItem::Property { span, .. }
            | RemoveItem::DynamicProperty { span, .. }
            | RemoveItem::Labels { span, .. } => *span,
        }
    }
}

/// WITH clause (pipeline / sub-query boundary).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WithClause {
    pub distinct: bool,
    pub items: ReturnItems,
    pub order_by: Option<Vec<OrderExpr>>,
    pub skip: Option<Expr>,
    pub limit: Option<Expr>,
    pub where_clause: Option<Expr>,
    pub span: Span,
}

/// RETURN clause.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReturnClause {
    pub distinct: bool,
    pub items: ReturnItems,
    pub order_by: Option<Vec<OrderExpr>>,
    pub skip: Option<Expr>,
    pub limit: Option<Expr>,
    pub span: Span,
}

/// Projection list: `*`, `a, b AS c`, or `*, a`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReturnItems {
    pub star: bool,
    pub items: Vec<ReturnItem>,
    pub span: Span,
}

/// Single item in RETURN / WITH.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReturnItem {
    pub expr: Expr,
    pub alias: Option<Variable>,
    pub span: Span,
}

/// ORDER BY expression.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrderExpr {
    pub expr: Expr,
    pub ascending: bool,
    pub span: Span,
}

/// `UNWIND expr AS var`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UnwindClause {
    pub expr: Expr,
    pub variable: Variable,
    pub span: Span,
}

/// `[OPTIONAL] CALL ns.proc(args) [YIELD ...]`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CallClause {
    pub optional: bool,
    pub procedure: QualifiedName,
    /// `None` when the argument list is omitted (implicit arguments).
    pub args: Option<Vec<Expr>>,
    pub yield_clause: Option<YieldClause>,
    pub span: Span,
}

/// `YIELD *` or `YIELD a, b AS c [WHERE ...]`.
///
/// ORDER BY / SKIP / LIMIT are only accepted after SHOW commands.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct YieldClause {
    pub star: bool,
    pub items: Vec<YieldItem>,
    pub order_by: Option<Vec<OrderExpr>>,
    pub skip: Option<Expr>,
    pub limit: Option<Expr>,
    pub where_clause: Option<Expr>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct YieldItem {
    pub field: SymbolicName,
    pub alias: Option<Variable>,
    pub span: Span,
}

/// `[OPTIONAL] CALL [(scope)] { query } [IN TRANSACTIONS ...]`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubqueryClause {
    pub optional: bool,
    pub scope: Option<SubqueryScope>,
    pub query: Box<Query>,
    pub transactions: Option<InTransactions>,
    pub span: Span,
}

/// `(*)`, `()` or `(a, b)` importing variables into a subquery.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubqueryScope {
    pub star: bool,
    pub variables: Vec<Variable>,
    pub span: Span,
}

/// `IN [n CONCURRENT] TRANSACTIONS [OF n ROWS] [ON ERROR ...] [REPORT STATUS AS v]`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InTransactions {
    pub concurrent: bool,
    pub concurrency: Option<Expr>,
    pub batch_size: Option<Expr>,
    pub on_error: Option<OnErrorBehaviour>,
    pub report_status: Option<Variable>,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum OnErrorBehaviour {
    Continue,
    Break,
    Fail,
}

/// `FOREACH (x IN list | clauses)`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ForeachClause {
    pub variable: Variable,
    pub list: Expr,
    pub clauses: Vec<Clause>,
    pub span: Span,
}

/// `LOAD CSV [WITH HEADERS] FROM url AS row [FIELDTERMINATOR ';']`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LoadCsvClause {
    pub with_headers: bool,
    pub source: Expr,
    pub variable: Variable,
    pub field_terminator: Option<String>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FinishClause {
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrderBySkipLimitClause {
    pub order_by: Option<Vec<OrderExpr>>,
    pub skip: Option<Expr>,
    pub limit: Option<Expr>,
    pub span: Span,
}

// ============================================================================
// Patterns
// ============================================================================

/// A pattern part: `p = SHORTEST 1 (a)-[:R]->+(b)`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PatternPart {
    pub variable: Option<Variable>,
    pub selector: Option<PathSelector>,
    pub body: PatternBody,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum PatternBody {
    Path(PathPattern),
    /// `shortestPath(...)` / `allShortestPaths(...)`
    ShortestPath(ShortestPathPattern),
}

impl PatternBody {
    pub fn path(&self) -> &PathPattern {
        match self {
            PatternBody::Path(p) => p,
            PatternBody::ShortestPath(s) => &s.path,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ShortestPathPattern {
    pub all: bool,
    pub path: PathPattern,
    pub span: Span,
}

/// A path: `(a:Person)-[:KNOWS]->(b:Person)`.
///
/// Always starts and ends on a node or a parenthesized sub-path;
/// relationships only ever appear between two of those.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PathPattern {
    pub elements: Vec<PathElement>,
    pub span: Span,
}

impl PathPattern {
    pub fn nodes(&self) -> impl Iterator<Item = &NodePattern> {
        self.elements.iter().filter_map(|e| match e {
            PathElement::Node(n) => Some(n),
            _ => None,
        })
    }

    pub fn relationships(&self) -> impl Iterator<Item = &RelationshipPattern> {
        self.elements.iter().filter_map(|e| match e {
            PathElement::Relationship(r) => Some(r),
            _ => None,
        })
    }
}

/// Element of a path: a node, a relationship, or a parenthesized sub-path.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum PathElement {
    Node(NodePattern),
    Relationship(RelationshipPattern),
    Parenthesized(ParenthesizedPath),
}

impl PathElement {
    pub fn span(&self) -> Span {
        match self {
            PathElement::Node(n) => n.span,
            PathElement::Relationship(r) => r.span,
            PathElement::Parenthesized(p) => p.span,
        }
    }
}

/// Node pattern: `(alias:Label1&Label2 {prop: value} WHERE pred)`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NodePattern {
    pub variable: Option<Variable>,
    pub labels: Option<LabelExpression>,
    /// Map literal or parameter.
    pub properties: Option<Expr>,
    pub predicate: Option<Expr>,
    pub span: Span,
}

/// Relationship pattern: `<-[alias:TYPE *min..max {props} WHERE pred]-`,
/// optionally followed by a quantifier.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RelationshipPattern {
    pub left_arrow: bool,
    pub right_arrow: bool,
    pub variable: Option<Variable>,
    pub types: Option<LabelExpression>,
    pub length: Option<VarLength>,
    pub properties: Option<Expr>,
    pub predicate: Option<Expr>,
    pub quantifier: Option<Quantifier>,
    pub span: Span,
}

impl RelationshipPattern {
    /// Arrows on both ends are accepted here and read as undirected;
    /// rejecting them is a semantic concern.
    pub fn direction(&self) -> PatternDirection {
        match (self.left_arrow, self.right_arrow) {
            (false, true) => PatternDirection::Right,
            (true, false) => PatternDirection::Left,
            _ => PatternDirection::Both,
        }
    }
}

/// Pattern direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PatternDirection {
    /// ->
    Right,
    /// <-
    Left,
    /// - (undirected)
    Both,
}

/// Variable-length relationship range: `*`, `*3`, `*1..3`, `*..5`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VarLength {
    pub min: Option<u64>,
    pub max: Option<u64>,
    pub span: Span,
}

/// Path quantifier: `{m}`, `{m,n}`, `{,n}`, `{m,}`, `+`, `*`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Quantifier {
    pub kind: QuantifierKind,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum QuantifierKind {
    Fixed(u64),
    Interval { lower: Option<u64>, upper: Option<u64> },
    Plus,
    Star,
}

/// `((a)-[:R]->(b) WHERE pred){1,3}`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParenthesizedPath {
    pub pattern: Box<PatternPart>,
    pub predicate: Option<Expr>,
    pub quantifier: Option<Quantifier>,
    pub span: Span,
}

/// Path selector prefixing a pattern.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PathSelector {
    pub kind: SelectorKind,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SelectorKind {
    /// `ANY [k] [PATH|PATHS]`
    Any { count: Option<u64> },
    /// `ALL [PATH|PATHS]`
    All,
    /// `ANY SHORTEST [PATH|PATHS]`
    AnyShortest,
    /// `ALL SHORTEST [PATH|PATHS]`
    AllShortest,
    /// `SHORTEST [k] [PATH|PATHS]`
    Shortest { count: Option<u64> },
    /// `SHORTEST [k] [PATH|PATHS] GROUP[S]`
    ShortestGroups { count: Option<u64> },
}

// ============================================================================
// Label / type expressions
// ============================================================================

/// A label expression together with its leading `:` or `IS`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LabelExpression {
    pub syntax: LabelSyntax,
    pub expr: LabelExpr,
    pub span: Span,
}

/// Which label grammar introduced the expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum LabelSyntax {
    /// `:A&B`, `:A:B`, `:A|:B`
    Colon,
    /// `IS A&B`
    Is,
}

/// Boolean formula over label / relationship-type names.
///
/// Negations are kept as written: `!!A` is two nested [`LabelExpr::Negation`]s.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum LabelExpr {
    Leaf(SymbolicName),
    /// `%`: any label
    Wildcard(Span),
    Negation { expr: Box<LabelExpr>, span: Span },
    /// `A & B`, or `A:B` when `colon` is set
    Conjunction { left: Box<LabelExpr>, right: Box<LabelExpr>, colon: bool, span: Span },
    /// `A | B`, or `A |:B` when `colon` is set
    Disjunction { left: Box<LabelExpr>, right: Box<LabelExpr>, colon: bool, span: Span },
}

impl LabelExpr {
    pub fn span(&self) -> Span {
        match self {
            LabelExpr::Leaf(name) => name.span,
            LabelExpr::Wildcard(span)
            | LabelExpr::Negation { span, .. }
            | LabelExpr::Conjunction { span, .. }
            | LabelExpr::Disjunction { span, .. } => *span,
        }
    }

    /// Names of all leaves, left to right.
    pub fn leaf_names(&self) -> Vec<&str> {
        let mut out = Vec::new();
        self.collect_leaves(&mut out);
        out
    }

    fn collect_leaves<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            LabelExpr::Leaf(name) => out.push(&name.name),
            LabelExpr::Wildcard(_) => {}
            LabelExpr::Negation { expr, .. } => expr.collect_leaves(out),
            LabelExpr::Conjunction { left, right, .. }
            | LabelExpr::Disjunction { left, right, .. } => {
                left.collect_leaves(out);
                right.collect_leaves(out);
            }
        }
    }
}

/// Cypher type used by `IS TYPED` and `::`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TypeRef {
    pub kind: CypherType,
    pub not_null: bool,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum CypherType {
    Nothing,
    Null,
    Boolean,
    String,
    Integer,
    Float,
    Date,
    LocalTime,
    ZonedTime,
    LocalDateTime,
    ZonedDateTime,
    Duration,
    Point,
    Node,
    Relationship,
    Map,
    List(Box<TypeRef>),
    Path,
    PropertyValue,
    Any,
    /// `INTEGER | STRING` or `ANY<INTEGER | STRING>`; `ANY<T>` is a
    /// one-member union so `T` keeps its `NOT NULL`.
    Union(Vec<TypeRef>),
}

// ============================================================================
// Expressions
// ============================================================================

/// Expression in Cypher.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Expr {
    /// Literal value
    Literal { value: Literal, span: Span },
    /// Parameter: `$name`
    Parameter { name: String, span: Span },
    /// Variable reference: `n`, `r`, `p`
    Variable(Variable),
    /// `count(*)`
    CountStar { span: Span },
    /// Property access: `n.name`
    Property { expr: Box<Expr>, key: SymbolicName, span: Span },
    /// List / map lookup: `list[0]`, `n['key']`
    Index { expr: Box<Expr>, index: Box<Expr>, span: Span },
    /// Range slice: `list[1..3]`, `list[..2]`
    Slice { expr: Box<Expr>, from: Option<Box<Expr>>, to: Option<Box<Expr>>, span: Span },
    /// Label check: `n:Person`, `n IS Person&Admin`
    LabelTest { expr: Box<Expr>, labels: LabelExpression, span: Span },
    /// Binary operation: `a + b`, `a = b`, `a AND b`
    BinaryOp { left: Box<Expr>, op: BinaryOp, right: Box<Expr>, span: Span },
    /// Two or more chained comparisons: `a < b <= c`
    ComparisonChain { operands: Vec<Expr>, ops: Vec<BinaryOp>, span: Span },
    /// Unary operation: `NOT a`, `-a`, `+a`
    UnaryOp { op: UnaryOp, expr: Box<Expr>, span: Span },
    /// String predicates and regex: `STARTS WITH`, `ENDS WITH`, `CONTAINS`, `=~`
    StringOp { left: Box<Expr>, op: StringOp, right: Box<Expr>, span: Span },
    /// IN predicate: `x IN [1, 2, 3]`
    In { expr: Box<Expr>, list: Box<Expr>, span: Span },
    /// IS NULL / IS NOT NULL
    IsNull { expr: Box<Expr>, negated: bool, span: Span },
    /// `IS [NOT] TYPED t` / `:: t`
    IsTyped { expr: Box<Expr>, ty: TypeRef, negated: bool, span: Span },
    /// `IS [NOT] [NFC|NFD|NFKC|NFKD] NORMALIZED`
    IsNormalized { expr: Box<Expr>, form: Option<NormalForm>, negated: bool, span: Span },
    /// Function call: `count(n)`, `db.labels()`, `count(DISTINCT n)`
    FunctionCall { name: QualifiedName, args: Vec<Expr>, distinct: bool, span: Span },
    /// CASE expression (simple or extended)
    Case(Box<CaseExpr>),
    /// List: `[1, 2, 3]`
    List { items: Vec<Expr>, span: Span },
    /// Map: `{name: 'Ada', age: 3}`: entries in source order
    MapLiteral { entries: Vec<(SymbolicName, Expr)>, span: Span },
    /// Map projection: `n {.name, .*, age: 3, x}`
    MapProjection { variable: Variable, items: Vec<MapProjectionItem>, span: Span },
    /// `[x IN list WHERE pred | expr]`
    ListComprehension(Box<ListComprehension>),
    /// `[p = (a)-->(b) WHERE pred | expr]`
    PatternComprehension(Box<PatternComprehension>),
    /// `reduce(acc = init, x IN list | expr)`
    Reduce(Box<ReduceExpr>),
    /// `all(x IN list WHERE pred)` and friends
    Quantified(Box<QuantifiedExpr>),
    /// `normalize(expr [, NFC])`
    Normalize { expr: Box<Expr>, form: Option<NormalForm>, span: Span },
    /// `trim([LEADING|TRAILING|BOTH] [chars] FROM source)`
    Trim(Box<TrimExpr>),
    /// `EXISTS { ... }`, `COUNT { ... }`, `COLLECT { ... }`
    Subquery(Box<SubqueryExpr>),
    /// Pattern expression: `(a)-[:KNOWS]->(b)` used as a predicate
    Pattern(PathPattern),
    /// `shortestPath(...)` / `allShortestPaths(...)` in expression position
    ShortestPath(ShortestPathPattern),
}

impl Expr {
    pub fn to_json(&self) -> crate::Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn span(&self) -> Span {
        match self {
            Expr::Variable(v) => v.span,
            Expr::Case(c) => c.span,
            Expr::ListComprehension(c) => c.span,
            Expr::PatternComprehension(c) => c.span,
            Expr::Reduce(r) => r.span,
            Expr::Quantified(q) => q.span,
            Expr::Trim(t) => t.span,
            Expr::Subquery(s) => s.span,
            Expr::Pattern(p) => p.span,
            Expr::ShortestPath(s) => s.span,
            Expr::Literal { span, .. }
            | Expr::Parameter { span, .. }
            | Expr::CountStar { span }
            | Expr::Property { span, .. }
            | Expr::Index { span, .. }
            | Expr::Slice { span, .. }
            | Expr::LabelTest { span, .. }
            | Expr::BinaryOp { span, .. }
            | Expr::ComparisonChain { span, .. }
            | Expr::UnaryOp { span, .. }
            | Expr::StringOp { span, .. }
            | Expr::In { span, .. }
            | Expr::IsNull { span, .. }
            | Expr::IsTyped { span, .. }
            | Expr::IsNormalized { span, .. }
            | Expr::FunctionCall { span, .. }
            | Expr::List { span, .. }
            | Expr::MapLiteral { span, .. }
            | Expr::MapProjection { span, .. }
            | Expr::Normalize { span, .. } => *span,
        }
    }
}

/// Literal values. Numbers keep their lexeme (sign included).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Literal {
    Null,
    Bool(bool),
    Integer { text: String, radix: Radix },
    Float(String),
    String(String),
    Infinity,
    NaN,
}

impl Literal {
    /// Integer value, if this is an integer literal that fits in `i64`.
    pub fn as_i64(&self) -> Option<i64> {
        let Literal::Integer { text, radix } = self else {
            return None;
        };
        let (negative, body) = match text.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, text.as_str()),
        };
        let digits: String = body.chars().filter(|c| *c != '_').collect();
        let magnitude = match radix {
            Radix::Decimal => i128::from_str_radix(&digits, 10).ok()?,
            Radix::Hex => i128::from_str_radix(&digits[2..], 16).ok()?,
            Radix::Octal => {
                let digits = digits.strip_prefix("0o").or_else(|| digits.strip_prefix("0O")).unwrap_or(&digits);
                i128::from_str_radix(digits, 8).ok()?
            }
        };
        i64::try_from(if negative { -magnitude } else { magnitude }).ok()
    }

    /// Float value, if this is a float literal.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Literal::Float(text) => text.parse().ok(),
            Literal::Infinity => Some(f64::INFINITY),
            Literal::NaN => Some(f64::NAN),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Radix {
    Decimal,
    Hex,
    Octal,
}

/// Binary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum BinaryOp {
    // Arithmetic
    Add, Sub, Mul, Div, Mod, Pow,
    // String / list concatenation
    Concat,
    // Comparison
    Eq, Neq, Lt, Lte, Gt, Gte,
    // Logical
    And, Or, Xor,
}

impl BinaryOp {
    pub fn is_comparison(self) -> bool {
        matches!(self, BinaryOp::Eq | BinaryOp::Neq | BinaryOp::Lt | BinaryOp::Lte | BinaryOp::Gt | BinaryOp::Gte)
    }

    pub fn symbol(self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Mod => "%",
            BinaryOp::Pow => "^",
            BinaryOp::Concat => "||",
            BinaryOp::Eq => "=",
            BinaryOp::Neq => "<>",
            BinaryOp::Lt => "<",
            BinaryOp::Lte => "<=",
            BinaryOp::Gt => ">",
            BinaryOp::Gte => ">=",
            BinaryOp::And => "AND",
            BinaryOp::Or => "OR",
            BinaryOp::Xor => "XOR",
        }
    }
}

/// Unary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum UnaryOp {
    Not,
    Negate,
    Plus,
}

/// String-specific operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum StringOp {
    StartsWith,
    EndsWith,
    Contains,
    RegexMatch,
}

/// Unicode normal forms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum NormalForm {
    Nfc,
    Nfd,
    Nfkc,
    Nfkd,
}

/// `CASE [operand] WHEN ... THEN ... [ELSE ...] END`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CaseExpr {
    pub operand: Option<Expr>,
    pub alternatives: Vec<CaseAlternative>,
    pub default: Option<Expr>,
    pub span: Span,
}

/// One `WHEN ... THEN ...` branch. Without a case operand `when` holds a
/// single [`WhenOperand::Value`] predicate.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CaseAlternative {
    pub when: Vec<WhenOperand>,
    pub then: Expr,
    pub span: Span,
}

/// Operand of an extended `WHEN`: a value to compare for equality, or a
/// comparison with the case operand as its implicit left-hand side.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum WhenOperand {
    Value(Expr),
    Comparison { op: BinaryOp, right: Expr, span: Span },
    StringOp { op: StringOp, right: Expr, span: Span },
    In { list: Expr, span: Span },
    IsNull { negated: bool, span: Span },
    IsTyped { ty: TypeRef, negated: bool, span: Span },
    IsNormalized { form: Option<NormalForm>, negated: bool, span: Span },
}

impl WhenOperand {
    pub fn span(&self) -> Span {
        match self {
            WhenOperand::Value(e) => e.span(),
            WhenOperand::Comparison { span, .. }
            | WhenOperand::StringOp { span, .. }
            | WhenOperand::In { span, .. }
            | WhenOperand::IsNull { span, .. }
            | WhenOperand::IsTyped { span, .. }
            | WhenOperand::IsNormalized { span, .. } => *span,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum MapProjectionItem {
    /// `.name`
    Property(SymbolicName),
    /// `.*`
    AllProperties(Span),
    /// `key: expr`
    Literal { key: SymbolicName, value: Expr },
    /// `x`
    Variable(Variable),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ListComprehension {
    pub variable: Variable,
    pub list: Expr,
    pub predicate: Option<Expr>,
    pub projection: Option<Expr>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PatternComprehension {
    pub variable: Option<Variable>,
    pub pattern: PathPattern,
    pub predicate: Option<Expr>,
    pub projection: Expr,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReduceExpr {
    pub accumulator: Variable,
    pub init: Expr,
    pub variable: Variable,
    pub list: Expr,
    pub expr: Expr,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuantifiedExpr {
    pub quantifier: ListQuantifier,
    pub variable: Variable,
    pub list: Expr,
    pub predicate: Option<Expr>,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ListQuantifier {
    All,
    Any,
    None,
    Single,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrimExpr {
    pub side: Option<TrimSide>,
    pub characters: Option<Expr>,
    pub source: Expr,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TrimSide {
    Leading,
    Trailing,
    Both,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubqueryExpr {
    pub kind: SubqueryKind,
    pub body: SubqueryBody,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SubqueryKind {
    Exists,
    Count,
    Collect,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum SubqueryBody {
    /// `{ (a)-->(b) WHERE pred }`
    Pattern { patterns: Vec<PatternPart>, where_clause: Option<Expr> },
    /// `{ MATCH ... RETURN ... }`
    Query(Box<Query>),
}

// ============================================================================
// Administrative commands
// ============================================================================

/// Schema and SHOW commands.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Command {
    CreateIndex(CreateIndex),
    DropIndex { name: SymbolicName, if_exists: bool, span: Span },
    CreateConstraint(CreateConstraint),
    DropConstraint { name: SymbolicName, if_exists: bool, span: Span },
    Show(ShowCommand),
}

impl Command {
    pub fn span(&self) -> Span {
        match self {
            Command::CreateIndex(c) => c.span,
            Command::CreateConstraint(c) => c.span,
            Command::Show(c) => c.span,
            Command::DropIndex { span, .. } | Command::DropConstraint { span, .. } => *span,
        }
    }
}

/// `CREATE [RANGE|TEXT|POINT] INDEX [name] [IF NOT EXISTS] FOR (n:L) ON (n.p, ...) [OPTIONS {...}]`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CreateIndex {
    pub kind: IndexKind,
    pub name: Option<SymbolicName>,
    pub if_not_exists: bool,
    pub target: SchemaTarget,
    /// Property accesses, each an [`Expr::Property`].
    pub properties: Vec<Expr>,
    pub options: Option<Expr>,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum IndexKind {
    Default,
    Range,
    Text,
    Point,
}

/// The entity a schema command applies to: `(n:Label)` or `()-[r:TYPE]-()`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SchemaTarget {
    pub variable: Variable,
    pub label: SymbolicName,
    pub relationship: bool,
    pub span: Span,
}

/// `CREATE CONSTRAINT [name] [IF NOT EXISTS] FOR (n:L) REQUIRE n.p IS ...`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CreateConstraint {
    pub name: Option<SymbolicName>,
    pub if_not_exists: bool,
    pub target: SchemaTarget,
    pub properties: Vec<Expr>,
    pub requirement: ConstraintKind,
    pub options: Option<Expr>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum ConstraintKind {
    Unique,
    Key,
    NotNull,
    Typed(TypeRef),
}

/// `SHOW ... [YIELD ...] [WHERE ...] [RETURN ...]`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ShowCommand {
    pub target: ShowTarget,
    /// Transaction ids, setting names or database name following the keyword.
    pub filter: Option<Expr>,
    pub yield_clause: Option<YieldClause>,
    pub where_clause: Option<Expr>,
    pub return_clause: Option<ReturnClause>,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ShowTarget {
    Indexes(IndexKind),
    Constraints,
    Procedures,
    Functions,
    Transactions,
    Settings,
    Databases,
}
