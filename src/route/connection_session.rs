use crate::statement::{SqlStatement, TclStatement};

/// Per-connection state read/write splitting depends on.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConnectionSession {
    /// Caller asked for every statement to go to primaries.
    pub force_primary: bool,
    /// A write already went to a primary in the current transaction.
    pub primary_visited: bool,
}

impl ConnectionSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_force_primary(mut self, force_primary: bool) -> Self {
        self.force_primary = force_primary;
        self
    }

    pub fn routes_to_primary(&self) -> bool {
        self.force_primary || self.primary_visited
    }

    /// Records the effect of a statement about to run on this connection.
    pub fn observe(&mut self, statement: &SqlStatement) {
        match statement {
            SqlStatement::Tcl(TclStatement::Commit | TclStatement::Rollback) => self.primary_visited = false,
            statement if statement.is_write() => self.primary_visited = true,
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::statement::{DeleteStatement, SimpleTableSegment, TableSegment};

    #[test]
    fn write_sticks_until_transaction_ends() {
        let mut session = ConnectionSession::new();
        assert!(!session.routes_to_primary());
        session.observe(&SqlStatement::Delete(DeleteStatement {
            table: TableSegment::Simple(SimpleTableSegment::new(12, 18, "t_order")),
            where_clause: None,
        }));
        assert!(session.routes_to_primary());
        session.observe(&SqlStatement::Tcl(TclStatement::Commit));
        assert!(!session.routes_to_primary());
        assert!(ConnectionSession::new().with_force_primary(true).routes_to_primary());
    }
}
