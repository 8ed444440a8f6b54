//! Exhaustive dispatch over the statement, expression and FROM clause trees.
//!
//! Every trait has exactly one required method per case with no default
//! bodies. Adding a case to one of the enums breaks every implementation until
//! it's handled.

use crate::ast::{
    AExpr, AExprLeaf, AExprOp, Copy, CreateTable, Delete, Execute, Explain, FromClauseNode,
    Insert, JoinExpr, Prepare, RangeVar, Select, Update, VarSet,
};
use crate::statement::Statement;

pub trait StatementVisitor {
    type Output;

    fn visit_select(&mut self, select: &Select) -> Self::Output;
    fn visit_insert(&mut self, insert: &Insert) -> Self::Output;
    fn visit_update(&mut self, update: &Update) -> Self::Output;
    fn visit_delete(&mut self, delete: &Delete) -> Self::Output;
    fn visit_copy(&mut self, copy: &Copy) -> Self::Output;
    fn visit_explain(&mut self, explain: &Explain) -> Self::Output;
    fn visit_execute(&mut self, execute: &Execute) -> Self::Output;
    fn visit_prepare(&mut self, prepare: &Prepare) -> Self::Output;
    fn visit_var_set(&mut self, var_set: &VarSet) -> Self::Output;
    fn visit_create_table(&mut self, create: &CreateTable) -> Self::Output;

    fn visit_alter(&mut self) -> Self::Output;
    fn visit_analyze(&mut self) -> Self::Output;
    fn visit_cluster(&mut self) -> Self::Output;
    fn visit_vacuum(&mut self) -> Self::Output;
    fn visit_truncate(&mut self) -> Self::Output;
    fn visit_drop(&mut self) -> Self::Output;
    fn visit_index(&mut self) -> Self::Output;
    fn visit_create_role(&mut self) -> Self::Output;
    fn visit_create_database(&mut self) -> Self::Output;

    fn visit_begin(&mut self) -> Self::Output;
    fn visit_commit(&mut self) -> Self::Output;
    fn visit_rollback(&mut self) -> Self::Output;

    fn visit_empty_query(&mut self) -> Self::Output;
}

impl Statement {
    pub fn accept<V: StatementVisitor>(&self, visitor: &mut V) -> V::Output {
        match self {
            Self::Select(s) => visitor.visit_select(s),
            Self::Insert(s) => visitor.visit_insert(s),
            Self::Update(s) => visitor.visit_update(s),
            Self::Delete(s) => visitor.visit_delete(s),
            Self::Copy(s) => visitor.visit_copy(s),
            Self::Explain(s) => visitor.visit_explain(s),
            Self::Execute(s) => visitor.visit_execute(s),
            Self::Prepare(s) => visitor.visit_prepare(s),
            Self::VarSet(s) => visitor.visit_var_set(s),
            Self::CreateTable(s) => visitor.visit_create_table(s),
            Self::Alter => visitor.visit_alter(),
            Self::Analyze => visitor.visit_analyze(),
            Self::Cluster => visitor.visit_cluster(),
            Self::Vacuum => visitor.visit_vacuum(),
            Self::Truncate => visitor.visit_truncate(),
            Self::Drop => visitor.visit_drop(),
            Self::Index => visitor.visit_index(),
            Self::CreateRole => visitor.visit_create_role(),
            Self::CreateDatabase => visitor.visit_create_database(),
            Self::Begin => visitor.visit_begin(),
            Self::Commit => visitor.visit_commit(),
            Self::Rollback => visitor.visit_rollback(),
            Self::EmptyQuery => visitor.visit_empty_query(),
        }
    }
}

pub trait AExprVisitor {
    type Output;

    fn visit_empty(&mut self) -> Self::Output;
    fn visit_leaf(&mut self, leaf: &AExprLeaf) -> Self::Output;
    fn visit_op(&mut self, op: &AExprOp) -> Self::Output;
}

impl AExpr {
    pub fn accept<V: AExprVisitor>(&self, visitor: &mut V) -> V::Output {
        match self {
            Self::Empty => visitor.visit_empty(),
            Self::Leaf(leaf) => visitor.visit_leaf(leaf),
            Self::Op(op) => visitor.visit_op(op),
        }
    }
}

/// Visitor over a FROM clause tree.
///
/// Nodes are borrowed for `'ast` so visitors can hold on to what they're
/// given.
pub trait FromClauseVisitor<'ast> {
    type Output;

    fn visit_range_var(&mut self, range_var: &'ast RangeVar) -> Self::Output;
    fn visit_join_expr(&mut self, join: &'ast JoinExpr) -> Self::Output;
}

impl FromClauseNode {
    pub fn accept<'ast, V: FromClauseVisitor<'ast>>(&'ast self, visitor: &mut V) -> V::Output {
        match self {
            Self::RangeVar(r) => visitor.visit_range_var(r),
            Self::JoinExpr(j) => visitor.visit_join_expr(j),
        }
    }
}
