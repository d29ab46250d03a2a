use crate::statement::SimpleTableSegment;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DdlKind {
    CreateTable,
    AlterTable,
    DropTable,
    TruncateTable,
    CreateIndex,
    DropIndex,
    CreateFunction,
    CreateProcedure,
}

impl DdlKind {
    /// Routine definitions live per database, not per table.
    pub fn is_routine(&self) -> bool {
        matches!(self, DdlKind::CreateFunction | DdlKind::CreateProcedure)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DdlStatement {
    pub kind: DdlKind,
    pub tables: Vec<SimpleTableSegment>,
}

/// Database administration statements.
#[derive(Debug, Clone, PartialEq)]
pub enum DalStatement {
    Use { schema: String },
    ShowDatabases,
    ShowTables,
    Describe { table: SimpleTableSegment },
    Set { variable: String },
    ShowVariables,
}

impl DalStatement {
    pub fn tables(&self) -> Vec<&SimpleTableSegment> {
        match self {
            DalStatement::Describe { table } => vec![table],
            _ => Vec::new(),
        }
    }
}

/// GRANT / REVOKE and friends.
#[derive(Debug, Clone, PartialEq)]
pub struct DclStatement {
    pub tables: Vec<SimpleTableSegment>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TclStatement {
    Begin,
    Commit,
    Rollback,
    SetAutoCommit(bool),
}
