//! Uniform read-only view over AST nodes.
//!
//! [`AstRef`] wraps a reference to any production and exposes its kind,
//! its span and its direct children in source order. Tooling that does
//! not care about the concrete node types (span checks, highlighting,
//! golden dumps) walks the tree through this view.

use super::ast::*;

/// A borrowed AST node of any kind.
#[derive(Debug, Clone, Copy)]
pub enum AstRef<'a> {
    Statement(&'a Statement),
    Query(&'a Query),
    SingleQuery(&'a SingleQuery),
    Clause(&'a Clause),
    Command(&'a Command),
    ReturnItem(&'a ReturnItem),
    OrderItem(&'a OrderExpr),
    SetItem(&'a SetItem),
    RemoveItem(&'a RemoveItem),
    MergeAction(&'a MergeAction),
    YieldItem(&'a YieldItem),
    Hint(&'a Hint),
    Pattern(&'a PatternPart),
    PathPattern(&'a PathPattern),
    PathElement(&'a PathElement),
    LabelExpression(&'a LabelExpression),
    Label(&'a LabelExpr),
    Type(&'a TypeRef),
    Expr(&'a Expr),
    CaseAlternative(&'a CaseAlternative),
    WhenOperand(&'a WhenOperand),
    Variable(&'a Variable),
    Name(&'a SymbolicName),
}

impl<'a> AstRef<'a> {
    /// Production name, e.g. `"MATCH"`, `"node pattern"`, `"property"`.
    pub fn kind(self) -> &'static str {
        match self {
            AstRef::Statement(_) => "statement",
            AstRef::Query(Query::Single(_)) => "query",
            AstRef::Query(Query::Union(_)) => "union",
            AstRef::SingleQuery(_) => "single query",
            AstRef::Clause(c) => c.name(),
            AstRef::Command(c) => match c {
                Command::CreateIndex(_) => "CREATE INDEX",
                Command::DropIndex { .. } => "DROP INDEX",
                Command::CreateConstraint(_) => "CREATE CONSTRAINT",
                Command::DropConstraint { .. } => "DROP CONSTRAINT",
                Command::Show(_) => "SHOW",
            },
            AstRef::ReturnItem(_) => "return item",
            AstRef::OrderItem(_) => "order item",
            AstRef::SetItem(_) => "set item",
            AstRef::RemoveItem(_) => "remove item",
            AstRef::MergeAction(_) => "merge action",
            AstRef::YieldItem(_) => "yield item",
            AstRef::Hint(_) => "hint",
            AstRef::Pattern(_) => "pattern",
            AstRef::PathPattern(_) => "path pattern",
            AstRef::PathElement(PathElement::Node(_)) => "node pattern",
            AstRef::PathElement(PathElement::Relationship(_)) => "relationship pattern",
            AstRef::PathElement(PathElement::Parenthesized(_)) => "parenthesized path",
            AstRef::LabelExpression(_) => "label expression",
            AstRef::Label(l) => match l {
                LabelExpr::Leaf(_) => "label",
                LabelExpr::Wildcard(_) => "label wildcard",
                LabelExpr::Negation { .. } => "label negation",
                LabelExpr::Conjunction { .. } => "label conjunction",
                LabelExpr::Disjunction { .. } => "label disjunction",
            },
            AstRef::Type(_) => "type",
            AstRef::Expr(e) => expr_kind(e),
            AstRef::CaseAlternative(_) => "case alternative",
            AstRef::WhenOperand(_) => "when operand",
            AstRef::Variable(_) => "variable",
            AstRef::Name(_) => "name",
        }
    }

    pub fn span(self) -> Span {
        match self {
            AstRef::Statement(s) => s.span(),
            AstRef::Query(q) => q.span(),
            AstRef::SingleQuery(q) => q.span,
            AstRef::Clause(c) => c.span(),
            AstRef::Command(c) => c.span(),
            AstRef::ReturnItem(i) => i.span,
            AstRef::OrderItem(o) => o.span,
            AstRef::SetItem(i) => i.span(),
            AstRef::RemoveItem(i) => i.span(),
            AstRef::MergeAction(a) => a.span,
            AstRef::YieldItem(i) => i.span,
            AstRef::Hint(h) => match h {
                Hint::Index { span, .. } | Hint::Scan { span, .. } | Hint::Join { span, .. } => *span,
            },
            AstRef::Pattern(p) => p.span,
            AstRef::PathPattern(p) => p.span,
            AstRef::PathElement(e) => e.span(),
            AstRef::LabelExpression(l) => l.span,
            AstRef::Label(l) => l.span(),
            AstRef::Type(t) => t.span,
            AstRef::Expr(e) => e.span(),
            AstRef::CaseAlternative(a) => a.span,
            AstRef::WhenOperand(w) => w.span(),
            AstRef::Variable(v) => v.span,
            AstRef::Name(n) => n.span,
        }
    }

    /// Direct children in source order.
    pub fn children(self) -> Vec<AstRef<'a>> {
        let mut out = Children::default();
        match self {
            AstRef::Statement(Statement::Query(q)) => out.push(AstRef::Query(q)),
            AstRef::Statement(Statement::Command(c)) => out.push(AstRef::Command(c)),
            AstRef::Query(Query::Single(q)) => out.push(AstRef::SingleQuery(q)),
            AstRef::Query(Query::Union(u)) => {
                out.push(AstRef::Query(&u.left));
                out.push(AstRef::SingleQuery(&u.right));
            }
            AstRef::SingleQuery(q) => out.extend(q.clauses.iter().map(AstRef::Clause)),
            AstRef::Clause(c) => out.clause(c),
            AstRef::Command(c) => out.command(c),
            AstRef::ReturnItem(i) => {
                out.expr(&i.expr);
                out.opt_var(i.alias.as_ref());
            }
            AstRef::OrderItem(o) => out.expr(&o.expr),
            AstRef::SetItem(i) => match i {
                SetItem::Property { property: target, value, .. }
                | SetItem::DynamicProperty { target, value, .. } => {
                    out.expr(target);
                    out.expr(value);
                }
                SetItem::AllProperties { variable, value, .. } | SetItem::MergeProperties { variable, value, .. } => {
                    out.var(variable);
                    out.expr(value);
                }
                SetItem::Labels { variable, labels, .. } => {
                    out.var(variable);
                    out.names(labels);
                }
            },
            AstRef::RemoveItem(i) => match i {
                RemoveItem::Property { property: target, .. } | RemoveItem::DynamicProperty { target, .. } => {
                    out.expr(target)
                }
                RemoveItem::Labels { variable, labels, .. } => {
                    out.var(variable);
                    out.names(labels);
                }
            },
            AstRef::MergeAction(a) => out.extend(a.items.iter().map(AstRef::SetItem)),
            AstRef::YieldItem(i) => {
                out.name(&i.field);
                out.opt_var(i.alias.as_ref());
            }
            AstRef::Hint(h) => match h {
                Hint::Index { variable, label, properties, .. } => {
                    out.var(variable);
                    out.name(label);
                    out.names(properties);
                }
                Hint::Scan { variable, label, .. } => {
                    out.var(variable);
                    out.name(label);
                }
                Hint::Join { variables, .. } => out.extend(variables.iter().map(AstRef::Variable)),
            },
            AstRef::Pattern(p) => {
                out.opt_var(p.variable.as_ref());
                out.push(AstRef::PathPattern(p.body.path()));
            }
            AstRef::PathPattern(p) => out.extend(p.elements.iter().map(AstRef::PathElement)),
            AstRef::PathElement(PathElement::Node(n)) => {
                out.opt_var(n.variable.as_ref());
                out.labels(n.labels.as_ref());
                out.opt_expr(n.properties.as_ref());
                out.opt_expr(n.predicate.as_ref());
            }
            AstRef::PathElement(PathElement::Relationship(r)) => {
                out.opt_var(r.variable.as_ref());
                out.labels(r.types.as_ref());
                out.opt_expr(r.properties.as_ref());
                out.opt_expr(r.predicate.as_ref());
            }
            AstRef::PathElement(PathElement::Parenthesized(p)) => {
                out.push(AstRef::Pattern(&p.pattern));
                out.opt_expr(p.predicate.as_ref());
            }
            AstRef::LabelExpression(l) => out.push(AstRef::Label(&l.expr)),
            AstRef::Label(l) => match l {
                LabelExpr::Leaf(name) => out.name(name),
                LabelExpr::Wildcard(_) => {}
                LabelExpr::Negation { expr, .. } => out.push(AstRef::Label(expr)),
                LabelExpr::Conjunction { left, right, .. } | LabelExpr::Disjunction { left, right, .. } => {
                    out.push(AstRef::Label(left));
                    out.push(AstRef::Label(right));
                }
            },
            AstRef::Type(t) => match &t.kind {
                CypherType::List(inner) => out.push(AstRef::Type(inner)),
                CypherType::Union(members) => out.extend(members.iter().map(AstRef::Type)),
                _ => {}
            },
            AstRef::Expr(e) => out.expr_children(e),
            AstRef::CaseAlternative(a) => {
                out.extend(a.when.iter().map(AstRef::WhenOperand));
                out.expr(&a.then);
            }
            AstRef::WhenOperand(w) => match w {
                WhenOperand::Value(e) => out.expr(e),
                WhenOperand::Comparison { right, .. } | WhenOperand::StringOp { right, .. } => out.expr(right),
                WhenOperand::In { list, .. } => out.expr(list),
                WhenOperand::IsTyped { ty, .. } => out.push(AstRef::Type(ty)),
                WhenOperand::IsNull { .. } | WhenOperand::IsNormalized { .. } => {}
            },
            AstRef::Variable(_) | AstRef::Name(_) => {}
        }
        out.0
    }

    /// This node and everything below it, pre-order.
    pub fn descendants(self) -> Descendants<'a> {
        Descendants { stack: vec![self] }
    }
}

fn expr_kind(e: &Expr) -> &'static str {
    match e {
        Expr::Literal { .. } => "literal",
        Expr::Parameter { .. } => "parameter",
        Expr::Variable(_) => "variable",
        Expr::CountStar { .. } => "count star",
        Expr::Property { .. } => "property",
        Expr::Index { .. } => "index",
        Expr::Slice { .. } => "slice",
        Expr::LabelTest { .. } => "label test",
        Expr::BinaryOp { .. } => "binary",
        Expr::ComparisonChain { .. } => "comparison chain",
        Expr::UnaryOp { .. } => "unary",
        Expr::StringOp { .. } => "string predicate",
        Expr::In { .. } => "in",
        Expr::IsNull { .. } => "is null",
        Expr::IsTyped { .. } => "is typed",
        Expr::IsNormalized { .. } => "is normalized",
        Expr::FunctionCall { .. } => "function call",
        Expr::Case(_) => "case",
        Expr::List { .. } => "list",
        Expr::MapLiteral { .. } => "map",
        Expr::MapProjection { .. } => "map projection",
        Expr::ListComprehension(_) => "list comprehension",
        Expr::PatternComprehension(_) => "pattern comprehension",
        Expr::Reduce(_) => "reduce",
        Expr::Quantified(_) => "quantified",
        Expr::Normalize { .. } => "normalize",
        Expr::Trim(_) => "trim",
        Expr::Subquery(_) => "subquery",
        Expr::Pattern(_) => "pattern expression",
        Expr::ShortestPath(_) => "shortest path",
    }
}

/// Pre-order iterator returned by [`AstRef::descendants`].
pub struct Descendants<'a> {
    stack: Vec<AstRef<'a>>,
}

impl<'a> Iterator for Descendants<'a> {
    type Item = AstRef<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;
        self.stack.extend(node.children().into_iter().rev());
        Some(node)
    }
}

#[derive(Default)]
struct Children<'a>(Vec<AstRef<'a>>);

impl<'a> Children<'a> {
    fn push(&mut self, node: AstRef<'a>) {
        self.0.push(node);
    }

    fn extend(&mut self, nodes: impl IntoIterator<Item = AstRef<'a>>) {
        self.0.extend(nodes);
    }

    fn expr(&mut self, e: &'a Expr) {
        self.push(AstRef::Expr(e));
    }

    fn opt_expr(&mut self, e: Option<&'a Expr>) {
        self.extend(e.map(AstRef::Expr));
    }

    fn exprs(&mut self, es: &'a [Expr]) {
        self.extend(es.iter().map(AstRef::Expr));
    }

    fn var(&mut self, v: &'a Variable) {
        self.push(AstRef::Variable(v));
    }

    fn opt_var(&mut self, v: Option<&'a Variable>) {
        self.extend(v.map(AstRef::Variable));
    }

    fn name(&mut self, n: &'a SymbolicName) {
        self.push(AstRef::Name(n));
    }

    fn names(&mut self, ns: &'a [SymbolicName]) {
        self.extend(ns.iter().map(AstRef::Name));
    }

    fn labels(&mut self, l: Option<&'a LabelExpression>) {
        self.extend(l.map(AstRef::LabelExpression));
    }

    fn patterns(&mut self, ps: &'a [PatternPart]) {
        self.extend(ps.iter().map(AstRef::Pattern));
    }

    fn paging(&mut self, order_by: &'a Option<Vec<OrderExpr>>, skip: &'a Option<Expr>, limit: &'a Option<Expr>) {
        if let Some(order_by) = order_by {
            self.extend(order_by.iter().map(AstRef::OrderItem));
        }
        self.opt_expr(skip.as_ref());
        self.opt_expr(limit.as_ref());
    }

    fn return_clause(&mut self, r: &'a ReturnClause) {
        self.extend(r.items.items.iter().map(AstRef::ReturnItem));
        self.paging(&r.order_by, &r.skip, &r.limit);
    }

    fn yield_clause(&mut self, y: &'a YieldClause) {
        self.extend(y.items.iter().map(AstRef::YieldItem));
        self.paging(&y.order_by, &y.skip, &y.limit);
        self.opt_expr(y.where_clause.as_ref());
    }

    fn clause(&mut self, c: &'a Clause) {
        match c {
            Clause::Use(u) => match &u.graph {
                GraphReference::Name(name) => self.names(&name.parts),
                GraphReference::Function(f) => self.expr(f),
            },
            Clause::Match(m) => {
                self.patterns(&m.patterns);
                self.extend(m.hints.iter().map(AstRef::Hint));
                self.opt_expr(m.where_clause.as_ref());
            }
            Clause::Merge(m) => {
                self.push(AstRef::Pattern(&m.pattern));
                self.extend(m.actions.iter().map(AstRef::MergeAction));
            }
            Clause::Create(c) => self.patterns(&c.patterns),
            Clause::Insert(c) => self.patterns(&c.patterns),
            Clause::Delete(d) => self.exprs(&d.expressions),
            Clause::Set(s) => self.extend(s.items.iter().map(AstRef::SetItem)),
            Clause::Remove(r) => self.extend(r.items.iter().map(AstRef::RemoveItem)),
            Clause::With(w) => {
                self.extend(w.items.items.iter().map(AstRef::ReturnItem));
                self.paging(&w.order_by, &w.skip, &w.limit);
                self.opt_expr(w.where_clause.as_ref());
            }
            Clause::Return(r) => self.return_clause(r),
            Clause::Unwind(u) => {
                self.expr(&u.expr);
                self.var(&u.variable);
            }
            Clause::Call(c) => {
                self.names(&c.procedure.parts);
                if let Some(args) = &c.args {
                    self.exprs(args);
                }
                if let Some(y) = &c.yield_clause {
                    self.yield_clause(y);
                }
            }
            Clause::Subquery(s) => {
                if let Some(scope) = &s.scope {
                    self.extend(scope.variables.iter().map(AstRef::Variable));
                }
                self.push(AstRef::Query(&s.query));
                if let Some(tx) = &s.transactions {
                    self.opt_expr(tx.concurrency.as_ref());
                    self.opt_expr(tx.batch_size.as_ref());
                    self.opt_var(tx.report_status.as_ref());
                }
            }
            Clause::Foreach(f) => {
                self.var(&f.variable);
                self.expr(&f.list);
                self.extend(f.clauses.iter().map(AstRef::Clause));
            }
            Clause::LoadCsv(l) => {
                self.expr(&l.source);
                self.var(&l.variable);
            }
            Clause::Finish(_) => {}
            Clause::OrderBySkipLimit(o) => self.paging(&o.order_by, &o.skip, &o.limit),
        }
    }

    fn command(&mut self, c: &'a Command) {
        match c {
            Command::CreateIndex(i) => {
                self.extend(i.name.as_ref().map(AstRef::Name));
                self.var(&i.target.variable);
                self.name(&i.target.label);
                self.exprs(&i.properties);
                self.opt_expr(i.options.as_ref());
            }
            Command::CreateConstraint(c) => {
                self.extend(c.name.as_ref().map(AstRef::Name));
                self.var(&c.target.variable);
                self.name(&c.target.label);
                self.exprs(&c.properties);
                if let ConstraintKind::Typed(ty) = &c.requirement {
                    self.push(AstRef::Type(ty));
                }
                self.opt_expr(c.options.as_ref());
            }
            Command::DropIndex { name, .. } | Command::DropConstraint { name, .. } => self.name(name),
            Command::Show(s) => {
                self.opt_expr(s.filter.as_ref());
                if let Some(y) = &s.yield_clause {
                    self.yield_clause(y);
                }
                self.opt_expr(s.where_clause.as_ref());
                if let Some(r) = &s.return_clause {
                    self.return_clause(r);
                }
            }
        }
    }

    fn expr_children(&mut self, e: &'a Expr) {
        match e {
            Expr::Literal { .. } | Expr::Parameter { .. } | Expr::CountStar { .. } => {}
            Expr::Variable(v) => self.var(v),
            Expr::Property { expr, key, .. } => {
                self.expr(expr);
                self.name(key);
            }
            Expr::Index { expr, index, .. } => {
                self.expr(expr);
                self.expr(index);
            }
            Expr::Slice { expr, from, to, .. } => {
                self.expr(expr);
                self.opt_expr(from.as_deref());
                self.opt_expr(to.as_deref());
            }
            Expr::LabelTest { expr, labels, .. } => {
                self.expr(expr);
                self.push(AstRef::LabelExpression(labels));
            }
            Expr::BinaryOp { left, right, .. } | Expr::StringOp { left, right, .. } => {
                self.expr(left);
                self.expr(right);
            }
            Expr::ComparisonChain { operands, .. } => self.exprs(operands),
            Expr::UnaryOp { expr, .. }
            | Expr::IsNull { expr, .. }
            | Expr::IsNormalized { expr, .. }
            | Expr::Normalize { expr, .. } => self.expr(expr),
            Expr::In { expr, list, .. } => {
                self.expr(expr);
                self.expr(list);
            }
            Expr::IsTyped { expr, ty, .. } => {
                self.expr(expr);
                self.push(AstRef::Type(ty));
            }
            Expr::FunctionCall { name, args, .. } => {
                self.names(&name.parts);
                self.exprs(args);
            }
            Expr::Case(c) => {
                self.opt_expr(c.operand.as_ref());
                self.extend(c.alternatives.iter().map(AstRef::CaseAlternative));
                self.opt_expr(c.default.as_ref());
            }
            Expr::List { items, .. } => self.exprs(items),
            Expr::MapLiteral { entries, .. } => {
                for (key, value) in entries {
                    self.name(key);
                    self.expr(value);
                }
            }
            Expr::MapProjection { variable, items, .. } => {
                self.var(variable);
                for item in items {
                    match item {
                        MapProjectionItem::Property(name) => self.name(name),
                        MapProjectionItem::AllProperties(_) => {}
                        MapProjectionItem::Literal { key, value } => {
                            self.name(key);
                            self.expr(value);
                        }
                        MapProjectionItem::Variable(v) => self.var(v),
                    }
                }
            }
            Expr::ListComprehension(c) => {
                self.var(&c.variable);
                self.expr(&c.list);
                self.opt_expr(c.predicate.as_ref());
                self.opt_expr(c.projection.as_ref());
            }
            Expr::PatternComprehension(c) => {
                self.opt_var(c.variable.as_ref());
                self.push(AstRef::PathPattern(&c.pattern));
                self.opt_expr(c.predicate.as_ref());
                self.expr(&c.projection);
            }
            Expr::Reduce(r) => {
                self.var(&r.accumulator);
                self.expr(&r.init);
                self.var(&r.variable);
                self.expr(&r.list);
                self.expr(&r.expr);
            }
            Expr::Quantified(q) => {
                self.var(&q.variable);
                self.expr(&q.list);
                self.opt_expr(q.predicate.as_ref());
            }
            Expr::Trim(t) => {
                self.opt_expr(t.characters.as_ref());
                self.expr(&t.source);
            }
            Expr::Subquery(s) => match &s.body {
                SubqueryBody::Pattern { patterns, where_clause } => {
                    self.patterns(patterns);
                    self.opt_expr(where_clause.as_ref());
                }
                SubqueryBody::Query(q) => self.push(AstRef::Query(q)),
            },
            Expr::Pattern(p) => self.push(AstRef::PathPattern(p)),
            Expr::ShortestPath(s) => self.push(AstRef::PathPattern(&s.path)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cypher::parse;
    use pretty_assertions::assert_eq;

    fn kinds(query: &str) -> Vec<&'static str> {
        let stmt = parse(query).unwrap();
        AstRef::Statement(&stmt).descendants().map(AstRef::kind).collect()
    }

    #[test]
    fn test_preorder_kinds() {
        assert_eq!(
            kinds("MATCH (n:A) RETURN n.x"),
            vec![
                "statement",
                "query",
                "single query",
                "MATCH",
                "pattern",
                "path pattern",
                "node pattern",
                "variable",
                "label expression",
                "label",
                "name",
                "RETURN",
                "return item",
                "property",
                "variable",
                "variable",
                "name",
            ]
        );
    }

    #[test]
    fn test_children_nest_inside_parent() {
        let queries = [
            "MATCH p = (a:Person {name: $n})-[r:KNOWS*1..3]->(b) WHERE a.age > 3 RETURN count(*) AS c ORDER BY c DESC",
            "UNWIND [1, 2, 3] AS x WITH x WHERE x % 2 = 0 RETURN CASE x WHEN 2 THEN 'two' ELSE 'many' END",
            "MATCH (n) WHERE EXISTS { (n)-->(:B) } SET n.seen = true, n:Seen RETURN [x IN range(1, 3) WHERE x > 1 | x * 2]",
            "CALL db.labels() YIELD label RETURN label UNION ALL RETURN 'x' AS label",
            "SHOW INDEXES YIELD name WHERE name STARTS WITH 'a' RETURN name",
        ];
        for query in queries {
            let stmt = parse(query).unwrap();
            for node in AstRef::Statement(&stmt).descendants() {
                let outer = node.span();
                for child in node.children() {
                    let inner = child.span();
                    assert!(
                        outer.start <= inner.start && inner.end <= outer.end,
                        "{query}: {} {inner:?} escapes {} {outer:?}",
                        child.kind(),
                        node.kind(),
                    );
                }
            }
        }
    }

    #[test]
    fn test_leaves_have_no_children() {
        let stmt = parse("RETURN 1, $p, count(*)").unwrap();
        let leaves: Vec<_> = AstRef::Statement(&stmt)
            .descendants()
            .filter(|n| matches!(n, AstRef::Expr(_)))
            .map(|n| n.children().len())
            .collect();
        assert_eq!(leaves, vec![0, 0, 0]);
    }
}
