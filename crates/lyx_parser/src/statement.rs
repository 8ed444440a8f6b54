use crate::ast::{
    Copy, CreateTable, Delete, Execute, Explain, Insert, Prepare, Select, Update, VarSet,
};

/// A single parsed statement.
///
/// Every case carries only what's needed to decide where the statement
/// should go. DDL cases without fields are placeholders, their contents are
/// consumed by the parser and not kept.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Statement {
    Select(Select),
    Insert(Insert),
    Update(Update),
    Delete(Delete),
    Copy(Copy),
    Explain(Explain),
    Execute(Execute),
    Prepare(Prepare),
    /// SET or RESET of a session variable.
    VarSet(VarSet),
    CreateTable(CreateTable),

    Alter,
    Analyze,
    Cluster,
    Vacuum,
    Truncate,
    Drop,
    /// CREATE [UNIQUE] INDEX
    Index,
    /// CREATE ROLE or CREATE USER
    CreateRole,
    CreateDatabase,

    Begin,
    Commit,
    Rollback,

    /// Input with no statement in it. Not an error.
    EmptyQuery,
}

impl Statement {
    /// Short uppercase tag for the statement kind, used in logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Select(_) => "SELECT",
            Self::Insert(_) => "INSERT",
            Self::Update(_) => "UPDATE",
            Self::Delete(_) => "DELETE",
            Self::Copy(_) => "COPY",
            Self::Explain(_) => "EXPLAIN",
            Self::Execute(_) => "EXECUTE",
            Self::Prepare(_) => "PREPARE",
            Self::VarSet(_) => "SET",
            Self::CreateTable(_) => "CREATE TABLE",
            Self::Alter => "ALTER",
            Self::Analyze => "ANALYZE",
            Self::Cluster => "CLUSTER",
            Self::Vacuum => "VACUUM",
            Self::Truncate => "TRUNCATE",
            Self::Drop => "DROP",
            Self::Index => "CREATE INDEX",
            Self::CreateRole => "CREATE ROLE",
            Self::CreateDatabase => "CREATE DATABASE",
            Self::Begin => "BEGIN",
            Self::Commit => "COMMIT",
            Self::Rollback => "ROLLBACK",
            Self::EmptyQuery => "EMPTY",
        }
    }
}
