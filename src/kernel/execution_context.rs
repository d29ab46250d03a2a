use crate::{binder::SqlStatementContext, executor::ExecutionUnit, route::RouteContext, statement::SqlValue};

/// A statement ready to run: how it was bound and routed, and what each data source executes.
#[derive(Debug)]
pub struct ExecutionContext {
    pub sql: String,
    pub statement_context: SqlStatementContext,
    pub route: RouteContext,
    pub units: Vec<ExecutionUnit>,
}

impl ExecutionContext {
    pub fn is_query(&self) -> bool {
        self.statement_context.is_query()
    }

    /// Keys allocated for an INSERT that omitted its key column, one per row.
    pub fn generated_keys(&self) -> Vec<SqlValue> {
        match &self.route.generated_key {
            Some(key) if key.generated => key.values.clone(),
            _ => Vec::new(),
        }
    }
}
