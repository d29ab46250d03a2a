use crate::statement::{
    DalStatement, DclStatement, DdlStatement, DeleteStatement, InsertStatement, SelectStatement, SimpleTableSegment,
    TclStatement, UpdateStatement,
};

/// The abstract statement tree produced by the SQL parser.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlStatement {
    Select(SelectStatement),
    Insert(InsertStatement),
    Update(UpdateStatement),
    Delete(DeleteStatement),
    Ddl(DdlStatement),
    Dal(DalStatement),
    Dcl(DclStatement),
    Tcl(TclStatement),
}

impl SqlStatement {
    pub fn is_query(&self) -> bool {
        matches!(self, SqlStatement::Select(_))
    }

    /// Statements that must reach the primary of a read/write split group.
    pub fn is_write(&self) -> bool {
        matches!(
            self,
            SqlStatement::Insert(_) | SqlStatement::Update(_) | SqlStatement::Delete(_) | SqlStatement::Ddl(_)
        )
    }

    /// Every simple table referenced anywhere in the statement.
    pub fn all_simple_tables(&self) -> Vec<&SimpleTableSegment> {
        match self {
            SqlStatement::Select(select) => select.all_simple_tables(),
            SqlStatement::Insert(insert) => vec![&insert.table],
            SqlStatement::Update(update) => {
                let mut out = update.table.all_simple_tables();
                if let Some(segment) = &update.where_clause {
                    out.extend(segment.expr.subquery_tables());
                }
                out
            }
            SqlStatement::Delete(delete) => {
                let mut out = delete.table.all_simple_tables();
                if let Some(segment) = &delete.where_clause {
                    out.extend(segment.expr.subquery_tables());
                }
                out
            }
            SqlStatement::Ddl(ddl) => ddl.tables.iter().collect(),
            SqlStatement::Dal(dal) => dal.tables(),
            SqlStatement::Dcl(dcl) => dcl.tables.iter().collect(),
            SqlStatement::Tcl(_) => Vec::new(),
        }
    }
}
