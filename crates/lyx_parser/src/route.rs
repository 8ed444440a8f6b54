//! Facts about a statement needed to decide where to send it.
//!
//! Nothing here picks a destination. The facts are the relations a statement
//! touches, the columns it pins to a single value, and what kind of access it
//! performs. Anything that can't be attributed with certainty is either left
//! unattributed or reported as an error so that callers fail closed.

use std::fmt;

use tracing::debug;

use crate::ast::expr::fmt_leaf_value;
use crate::ast::{
    AExpr, AExprLeaf, AExprOp, ColumnRef, Copy, CreateTable, Delete, Execute, Explain,
    FromClauseNode, Insert, JoinExpr, LeafKind, Prepare, RangeVar, Select, Update, VarSet,
};
use crate::errors::{ParseError, Result};
use crate::statement::Statement;
use crate::visit::{AExprVisitor, FromClauseVisitor, StatementVisitor};

/// What a statement does with the relations it touches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Access {
    Read,
    Write,
    /// Changes session state (SET, RESET, PREPARE).
    Session,
    /// Transaction control.
    Transaction,
    /// DDL and maintenance commands.
    Utility,
    /// Nothing to route.
    Empty,
    /// Depends on state held outside the statement, e.g. a prepared plan.
    Unknown,
}

impl Access {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Read => "read",
            Self::Write => "write",
            Self::Session => "session",
            Self::Transaction => "transaction",
            Self::Utility => "utility",
            Self::Empty => "empty",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for Access {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A `column = value` constraint found in a predicate or INSERT.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EqualityPredicate {
    /// Qualified name of the relation the column belongs to. None if it
    /// couldn't be attributed to a single relation.
    pub relation: Option<String>,
    pub column: String,
    pub value: String,
    /// `Literal`, `String` or `Parameter`.
    pub value_kind: LeafKind,
}

impl fmt::Display for EqualityPredicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.relation {
            Some(relation) => write!(f, "{relation}.{} = ", self.column)?,
            None => write!(f, "{} = ", self.column)?,
        }
        fmt_leaf_value(f, &self.value, self.value_kind)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteFacts {
    pub access: Access,
    /// Base relations in the order they're written.
    pub relations: Vec<RangeVar>,
    pub predicates: Vec<EqualityPredicate>,
    /// Plan name for PREPARE and EXECUTE.
    pub plan_id: Option<String>,
    /// Variable set or reset by the statement.
    pub variable: Option<VarSet>,
}

impl RouteFacts {
    fn new(access: Access) -> Self {
        RouteFacts {
            access,
            relations: Vec::new(),
            predicates: Vec::new(),
            plan_id: None,
            variable: None,
        }
    }

    /// Collect routing facts for a statement.
    pub fn from_statement(stmt: &Statement) -> Result<Self> {
        let facts = stmt.accept(&mut FactCollector)?;
        debug!(
            kind = stmt.kind(),
            access = %facts.access,
            relations = facts.relations.len(),
            predicates = facts.predicates.len(),
            "collected route facts"
        );
        Ok(facts)
    }

    /// Values the statement constrains `key` to.
    ///
    /// `key` is either a bare column name, matching the column in any
    /// relation, or `relation.column`.
    pub fn shard_key_values(&self, key: &str) -> Vec<&str> {
        let (relation, column) = match key.rsplit_once('.') {
            Some((relation, column)) => (Some(relation), column),
            None => (None, key),
        };

        self.predicates
            .iter()
            .filter(|p| p.column == column)
            .filter(|p| match relation {
                None => true,
                Some(want) => p.relation.as_deref().is_some_and(|have| {
                    have == want || have.rsplit('.').next() == Some(want)
                }),
            })
            .map(|p| p.value.as_str())
            .collect()
    }

    /// Names of the touched relations, schema qualified where written so.
    pub fn relation_names(&self) -> Vec<String> {
        self.relations.iter().map(|r| r.qualified_name()).collect()
    }
}

impl fmt::Display for RouteFacts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "access: {}", self.access)?;

        let relations: Vec<_> = self.relations.iter().map(|r| r.to_string()).collect();
        writeln!(f, "relations: [{}]", relations.join(", "))?;

        let predicates: Vec<_> = self.predicates.iter().map(|p| p.to_string()).collect();
        write!(f, "predicates: [{}]", predicates.join(", "))?;

        if let Some(id) = &self.plan_id {
            write!(f, "\nplan: {id}")?;
        }
        if let Some(var) = &self.variable {
            write!(f, "\nvariable: {} {}", var.var_type, var.name)?;
            if !var.value.is_empty() {
                write!(f, " = {}", var.value)?;
            }
        }
        Ok(())
    }
}

struct FactCollector;

impl FactCollector {
    fn with_from(
        access: Access,
        from: &[FromClauseNode],
        where_clause: &AExpr,
    ) -> Result<RouteFacts> {
        let mut facts = RouteFacts::new(access);
        let scope = Scope::from_nodes(from);
        facts.relations = from
            .iter()
            .flat_map(|node| node.base_relations())
            .cloned()
            .collect();
        facts.predicates = scope.collect_equalities(where_clause)?;
        Ok(facts)
    }
}

impl StatementVisitor for FactCollector {
    type Output = Result<RouteFacts>;

    fn visit_select(&mut self, select: &Select) -> Self::Output {
        Self::with_from(Access::Read, &select.from_clause, &select.where_clause)
    }

    fn visit_insert(&mut self, insert: &Insert) -> Self::Output {
        let mut facts = Self::with_from(
            Access::Write,
            std::slice::from_ref(insert.table_ref()),
            &AExpr::Empty,
        )?;
        let target = insert
            .table_ref()
            .base_relations()
            .first()
            .map(|r| r.qualified_name());

        if let Some(select) = insert.sub_select() {
            // Source relations are touched too, but their predicates don't
            // constrain the rows being written.
            facts.relations.extend(
                select
                    .from_clause
                    .iter()
                    .flat_map(|node| node.base_relations())
                    .cloned(),
            );
        }

        // Without a column list values can't be matched up to columns.
        let columns = insert.columns();
        let values = insert.values().unwrap_or_default();
        if columns.is_empty() || values.is_empty() {
            return Ok(facts);
        }

        if values.len() % columns.len() != 0 {
            return Err(ParseError::Unrouteable(format!(
                "INSERT has {} values for {} columns",
                values.len(),
                columns.len()
            )));
        }

        for (idx, value) in values.iter().enumerate() {
            match value {
                AExpr::Leaf(leaf) if leaf.kind != LeafKind::Column => {
                    facts.predicates.push(EqualityPredicate {
                        relation: target.clone(),
                        column: columns[idx % columns.len()].clone(),
                        value: leaf.value.clone(),
                        value_kind: leaf.kind,
                    });
                }
                _ => (),
            }
        }

        Ok(facts)
    }

    fn visit_update(&mut self, update: &Update) -> Self::Output {
        Self::with_from(
            Access::Write,
            std::slice::from_ref(&update.table_ref),
            &update.where_clause,
        )
    }

    fn visit_delete(&mut self, delete: &Delete) -> Self::Output {
        Self::with_from(
            Access::Write,
            std::slice::from_ref(&delete.table_ref),
            &delete.where_clause,
        )
    }

    fn visit_copy(&mut self, copy: &Copy) -> Self::Output {
        let access = if copy.is_from {
            Access::Write
        } else {
            Access::Read
        };
        Self::with_from(access, std::slice::from_ref(&copy.table_ref), &copy.where_clause)
    }

    fn visit_explain(&mut self, explain: &Explain) -> Self::Output {
        // EXPLAIN ANALYZE executes the statement, so the inner access is
        // kept as is.
        explain.stmt.accept(self)
    }

    fn visit_execute(&mut self, execute: &Execute) -> Self::Output {
        let mut facts = RouteFacts::new(Access::Unknown);
        facts.plan_id = Some(execute.id.clone());
        Ok(facts)
    }

    fn visit_prepare(&mut self, prepare: &Prepare) -> Self::Output {
        let mut facts = RouteFacts::new(Access::Session);
        facts.plan_id = Some(prepare.id.clone());
        Ok(facts)
    }

    fn visit_var_set(&mut self, var_set: &VarSet) -> Self::Output {
        let mut facts = RouteFacts::new(Access::Session);
        facts.variable = Some(var_set.clone());
        Ok(facts)
    }

    fn visit_create_table(&mut self, create: &CreateTable) -> Self::Output {
        let mut facts = RouteFacts::new(Access::Utility);
        let relation = match create.table_name.rsplit_once('.') {
            Some((schema, relation)) => RangeVar::new(schema, relation),
            None => RangeVar::relation(create.table_name.clone()),
        };
        facts.relations.push(relation);
        Ok(facts)
    }

    fn visit_alter(&mut self) -> Self::Output {
        Ok(RouteFacts::new(Access::Utility))
    }

    fn visit_analyze(&mut self) -> Self::Output {
        Ok(RouteFacts::new(Access::Utility))
    }

    fn visit_cluster(&mut self) -> Self::Output {
        Ok(RouteFacts::new(Access::Utility))
    }

    fn visit_vacuum(&mut self) -> Self::Output {
        Ok(RouteFacts::new(Access::Utility))
    }

    fn visit_truncate(&mut self) -> Self::Output {
        Ok(RouteFacts::new(Access::Utility))
    }

    fn visit_drop(&mut self) -> Self::Output {
        Ok(RouteFacts::new(Access::Utility))
    }

    fn visit_index(&mut self) -> Self::Output {
        Ok(RouteFacts::new(Access::Utility))
    }

    fn visit_create_role(&mut self) -> Self::Output {
        Ok(RouteFacts::new(Access::Utility))
    }

    fn visit_create_database(&mut self) -> Self::Output {
        Ok(RouteFacts::new(Access::Utility))
    }

    fn visit_begin(&mut self) -> Self::Output {
        Ok(RouteFacts::new(Access::Transaction))
    }

    fn visit_commit(&mut self) -> Self::Output {
        Ok(RouteFacts::new(Access::Transaction))
    }

    fn visit_rollback(&mut self) -> Self::Output {
        Ok(RouteFacts::new(Access::Transaction))
    }

    fn visit_empty_query(&mut self) -> Self::Output {
        Ok(RouteFacts::new(Access::Empty))
    }
}

/// A name columns can be qualified with.
#[derive(Debug)]
enum ScopeEntry<'a> {
    Relation(&'a RangeVar),
    /// Aliased join. The relations inside are only reachable through the
    /// alias.
    Join {
        alias: &'a str,
        relations: Vec<&'a RangeVar>,
    },
}

impl ScopeEntry<'_> {
    fn matches(&self, name: &str) -> bool {
        match self {
            Self::Relation(r) if !r.alias().is_empty() => r.alias() == name,
            Self::Relation(r) => r.relation_name() == name || r.qualified_name() == name,
            Self::Join { alias, .. } => *alias == name,
        }
    }
}

#[derive(Debug, Default)]
struct Scope<'a> {
    entries: Vec<ScopeEntry<'a>>,
}

impl<'a> Scope<'a> {
    fn from_nodes(nodes: &'a [FromClauseNode]) -> Self {
        let mut scope = Scope::default();
        for node in nodes {
            node.accept(&mut ScopeBuilder { scope: &mut scope });
        }
        scope
    }

    /// Resolve a column to the relation it belongs to.
    ///
    /// Unqualified columns resolve only when a single relation is in scope.
    /// Qualified columns must name exactly one thing in scope.
    fn resolve(&self, col: &ColumnRef) -> Result<Option<&'a RangeVar>> {
        if !col.is_qualified() {
            let mut relations = self.entries.iter().flat_map(|entry| match entry {
                ScopeEntry::Relation(r) => vec![*r],
                ScopeEntry::Join { relations, .. } => relations.clone(),
            });
            return Ok(match (relations.next(), relations.next()) {
                (Some(r), None) => Some(r),
                _ => None,
            });
        }

        let mut matches = self.entries.iter().filter(|e| e.matches(&col.table_alias));
        let entry = match (matches.next(), matches.next()) {
            (Some(entry), None) => entry,
            (Some(_), Some(_)) => {
                return Err(ParseError::Unrouteable(format!(
                    "column {col} references '{}' which is ambiguous",
                    col.table_alias
                )));
            }
            (None, _) => {
                return Err(ParseError::Unrouteable(format!(
                    "column {col} references '{}' which is not in scope",
                    col.table_alias
                )));
            }
        };

        match entry {
            ScopeEntry::Relation(r) => Ok(Some(*r)),
            ScopeEntry::Join { relations, .. } if relations.len() == 1 => Ok(Some(relations[0])),
            ScopeEntry::Join { .. } => Ok(None),
        }
    }

    fn collect_equalities(&self, expr: &AExpr) -> Result<Vec<EqualityPredicate>> {
        let mut collector = EqualityCollector {
            scope: self,
            predicates: Vec::new(),
        };
        expr.accept(&mut collector)?;
        Ok(collector.predicates)
    }
}

struct ScopeBuilder<'s, 'a> {
    scope: &'s mut Scope<'a>,
}

impl<'a> FromClauseVisitor<'a> for ScopeBuilder<'_, 'a> {
    type Output = ();

    fn visit_range_var(&mut self, range_var: &'a RangeVar) {
        self.scope.entries.push(ScopeEntry::Relation(range_var));
    }

    fn visit_join_expr(&mut self, join: &'a JoinExpr) {
        if join.alias().is_empty() {
            join.larg().accept(self);
            join.rarg().accept(self);
        } else {
            let mut relations = join.larg().base_relations();
            relations.extend(join.rarg().base_relations());
            self.scope.entries.push(ScopeEntry::Join {
                alias: join.alias(),
                relations,
            });
        }
    }
}

/// Collects `column = value` predicates from the AND-connected top of a
/// predicate tree.
///
/// Anything under OR or NOT doesn't pin a column to a value and is only
/// checked for columns that don't resolve. Chains of any length are walked
/// without recursion.
struct EqualityCollector<'s, 'a> {
    scope: &'s Scope<'a>,
    predicates: Vec<EqualityPredicate>,
}

impl EqualityCollector<'_, '_> {
    fn check_columns(&self, expr: &AExpr) -> Result<()> {
        expr.accept(&mut ColumnCheck { scope: self.scope })
    }

    fn push_equality(&mut self, left: &AExpr, right: &AExpr) -> Result<()> {
        let (col, value) = match (left, right) {
            (AExpr::Leaf(l), AExpr::Leaf(r)) => match (l.column_ref(), r.column_ref()) {
                (Some(col), None) => (col, r),
                (None, Some(col)) => (col, l),
                _ => {
                    // Column to column, or two values.
                    self.check_columns(left)?;
                    return self.check_columns(right);
                }
            },
            _ => {
                self.check_columns(left)?;
                return self.check_columns(right);
            }
        };

        let relation = self.scope.resolve(&col)?.map(|r| r.qualified_name());
        self.predicates.push(EqualityPredicate {
            relation,
            column: col.col_name,
            value: value.value.clone(),
            value_kind: value.kind,
        });
        Ok(())
    }
}

impl AExprVisitor for EqualityCollector<'_, '_> {
    type Output = Result<()>;

    fn visit_empty(&mut self) -> Self::Output {
        Ok(())
    }

    fn visit_leaf(&mut self, leaf: &AExprLeaf) -> Self::Output {
        ColumnCheck { scope: self.scope }.visit_leaf(leaf)
    }

    fn visit_op(&mut self, op: &AExprOp) -> Self::Output {
        match op.op.as_str() {
            "AND" => {
                // Right pushed first so terms come out in written order.
                let mut stack = vec![op.right.as_ref(), op.left.as_ref()];
                while let Some(expr) = stack.pop() {
                    match expr {
                        AExpr::Op(inner) if inner.op == "AND" => {
                            stack.push(&inner.right);
                            stack.push(&inner.left);
                        }
                        other => other.accept(self)?,
                    }
                }
                Ok(())
            }
            "=" => self.push_equality(&op.left, &op.right),
            _ => {
                self.check_columns(&op.left)?;
                self.check_columns(&op.right)
            }
        }
    }
}

/// Errors on the first qualified column that doesn't resolve.
struct ColumnCheck<'s, 'a> {
    scope: &'s Scope<'a>,
}

impl AExprVisitor for ColumnCheck<'_, '_> {
    type Output = Result<()>;

    fn visit_empty(&mut self) -> Self::Output {
        Ok(())
    }

    fn visit_leaf(&mut self, leaf: &AExprLeaf) -> Self::Output {
        if let Some(col) = leaf.column_ref() {
            self.scope.resolve(&col)?;
        }
        Ok(())
    }

    fn visit_op(&mut self, op: &AExprOp) -> Self::Output {
        let mut stack = vec![op.right.as_ref(), op.left.as_ref()];
        while let Some(expr) = stack.pop() {
            match expr {
                AExpr::Empty => (),
                AExpr::Leaf(leaf) => self.visit_leaf(leaf)?,
                AExpr::Op(op) => {
                    stack.push(&op.right);
                    stack.push(&op.left);
                }
            }
        }
        Ok(())
    }
}
