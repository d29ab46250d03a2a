use std::{collections::HashMap, sync::RwLock};

use crate::{
    binder::BindingError,
    metadata::SchemaMetaData,
    statement::{ColumnSegment, SimpleTableSegment},
};

/// A FROM item visible to column resolution.
#[derive(Debug, Clone, PartialEq)]
pub enum ScopeTable {
    Simple(SimpleTableSegment),
    /// Derived table, exposing the labels of its own projections.
    Derived { alias: Option<String>, columns: Vec<String> },
}

/// Tables referenced by one statement scope.
#[derive(Debug)]
pub struct TablesContext {
    scope: Vec<ScopeTable>,
    all_tables: Vec<SimpleTableSegment>,
    table_names: Vec<String>,
    database_name: Option<String>,
    column_cache: RwLock<HashMap<String, String>>,
}

impl Default for TablesContext {
    fn default() -> Self {
        Self {
            scope: Vec::new(),
            all_tables: Vec::new(),
            table_names: Vec::new(),
            database_name: None,
            column_cache: RwLock::new(HashMap::new()),
        }
    }
}

impl TablesContext {
    /// `scope` are the FROM items of this level, `all_tables` every simple
    /// table of the statement including those nested in subqueries.
    pub fn new(scope: Vec<ScopeTable>, all_tables: Vec<SimpleTableSegment>) -> Result<Self, BindingError> {
        let mut databases: Vec<String> = Vec::new();
        for owner in all_tables.iter().filter_map(|t| t.owner.as_ref()) {
            if !databases.iter().any(|d| d.eq_ignore_ascii_case(&owner.name)) {
                databases.push(owner.name.clone());
            }
        }
        if databases.len() > 1 {
            return Err(BindingError::AmbiguousDatabase { databases });
        }

        let mut table_names: Vec<String> = Vec::new();
        for table in &all_tables {
            if !table_names.iter().any(|n| n.eq_ignore_ascii_case(&table.name)) {
                table_names.push(table.name.clone());
            }
        }

        Ok(Self {
            scope,
            all_tables,
            table_names,
            database_name: databases.pop(),
            column_cache: RwLock::new(HashMap::new()),
        })
    }

    pub fn from_simple_tables(tables: Vec<SimpleTableSegment>) -> Result<Self, BindingError> {
        let scope = tables.iter().cloned().map(ScopeTable::Simple).collect();
        Self::new(scope, tables)
    }

    /// Distinct logical table names, in order of appearance.
    pub fn table_names(&self) -> &[String] {
        &self.table_names
    }

    pub fn simple_tables(&self) -> &[SimpleTableSegment] {
        &self.all_tables
    }

    pub fn scope(&self) -> &[ScopeTable] {
        &self.scope
    }

    pub fn database_name(&self) -> Option<&str> {
        self.database_name.as_deref()
    }

    pub fn is_empty(&self) -> bool {
        self.table_names.is_empty()
    }

    /// Table name (or derived table alias) an owner qualifier points to.
    pub fn find_table_name_by_owner(&self, owner: &str) -> Option<String> {
        let simple = self.scope.iter().filter_map(|t| match t {
            ScopeTable::Simple(table) => Some(table),
            ScopeTable::Derived { .. } => None,
        });
        for table in simple.clone() {
            if table.alias.as_deref().is_some_and(|a| a.eq_ignore_ascii_case(owner)) {
                return Some(table.name.clone());
            }
        }
        for table in simple {
            if table.name.eq_ignore_ascii_case(owner) {
                return Some(table.name.clone());
            }
        }
        self.scope.iter().find_map(|t| match t {
            ScopeTable::Derived { alias: Some(alias), .. } if alias.eq_ignore_ascii_case(owner) => Some(alias.clone()),
            _ => None,
        })
    }

    /// Maps each column's expression (`owner.name` or `name`) to the table it
    /// belongs to. Columns that resolve nowhere are left out.
    pub fn find_table_names_by_column(
        &self,
        columns: &[&ColumnSegment],
        schema: &dyn SchemaMetaData,
    ) -> HashMap<String, String> {
        let mut result = HashMap::new();
        if columns.is_empty() {
            return result;
        }

        let mut pending = Vec::new();
        if let Ok(cache) = self.column_cache.read() {
            for column in columns {
                match cache.get(&column.expression()) {
                    Some(table) => {
                        result.insert(column.expression(), table.clone());
                    }
                    None => pending.push(*column),
                }
            }
        } else {
            pending.extend_from_slice(columns);
        }
        if pending.is_empty() {
            return result;
        }

        let resolved: HashMap<String, String> = match self.single_simple_table() {
            Some(table) => pending.iter().map(|c| (c.expression(), table.name.clone())).collect(),
            None => self.find_table_names_general(&pending, schema),
        };

        if let Ok(mut cache) = self.column_cache.write() {
            cache.extend(resolved.iter().map(|(k, v)| (k.clone(), v.clone())));
        }
        result.extend(resolved);
        result
    }

    /// Owner pass, then metadata pass, then derived-table pass; earlier passes win.
    pub(crate) fn find_table_names_general(
        &self,
        columns: &[&ColumnSegment],
        schema: &dyn SchemaMetaData,
    ) -> HashMap<String, String> {
        let mut result = self.find_by_owner(columns);
        for (column, table) in self.find_by_metadata(columns, schema) {
            result.entry(column).or_insert(table);
        }
        let unresolved: Vec<&ColumnSegment> =
            columns.iter().copied().filter(|c| !result.contains_key(&c.expression())).collect();
        for (column, table) in self.find_by_derived_tables(&unresolved) {
            result.entry(column).or_insert(table);
        }
        result
    }

    fn single_simple_table(&self) -> Option<&SimpleTableSegment> {
        match self.scope.as_slice() {
            [ScopeTable::Simple(table)] => Some(table),
            _ => None,
        }
    }

    fn find_by_owner(&self, columns: &[&ColumnSegment]) -> HashMap<String, String> {
        let mut result = HashMap::new();
        for column in columns {
            let Some(owner) = &column.owner else { continue };
            let table = self.scope.iter().find_map(|t| match t {
                ScopeTable::Simple(table)
                    if table.alias_or_name().eq_ignore_ascii_case(&owner.name)
                        || table.name.eq_ignore_ascii_case(&owner.name) =>
                {
                    Some(table.name.clone())
                }
                _ => None,
            });
            if let Some(table) = table {
                result.insert(column.expression(), table);
            }
        }
        result
    }

    fn find_by_metadata(&self, columns: &[&ColumnSegment], schema: &dyn SchemaMetaData) -> HashMap<String, String> {
        let mut result = HashMap::new();
        for column in columns.iter().filter(|c| c.owner.is_none()) {
            let declaring = self.scope.iter().find_map(|t| match t {
                ScopeTable::Simple(table) if schema.contains_column(&table.name, &column.name) => Some(table.name.clone()),
                _ => None,
            });
            if let Some(table) = declaring {
                result.insert(column.expression(), table);
            }
        }
        result
    }

    fn find_by_derived_tables(&self, columns: &[&ColumnSegment]) -> HashMap<String, String> {
        let mut result = HashMap::new();
        for column in columns {
            let found = self.scope.iter().find_map(|t| match t {
                ScopeTable::Derived { alias: Some(alias), columns: exposed } => {
                    let owner_matches = column.owner.as_ref().is_none_or(|o| o.name.eq_ignore_ascii_case(alias));
                    let exposes = exposed.iter().any(|c| c.eq_ignore_ascii_case(&column.name));
                    (owner_matches && exposes).then(|| alias.clone())
                }
                _ => None,
            });
            if let Some(alias) = found {
                result.insert(column.expression(), alias);
            }
        }
        result
    }
}
