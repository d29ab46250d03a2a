use crate::{
    route::{RouteContext, RouteUnit},
    statement::QuoteCharacter,
};

/// One VALUES group of an INSERT, ready to be written out.
#[derive(Debug, Clone, PartialEq)]
pub struct InsertValueText {
    pub row_index: usize,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    /// Logic table name replaced by the unit's actual table.
    Table { logic_table: String, quote: QuoteCharacter },
    /// Text dropped from the statement (schema qualifiers).
    Remove,
    /// Column owner naming a sharded table.
    ColumnOwner { logic_table: String, quote: QuoteCharacter },
    /// `, expr AS alias` items appended to the select list.
    Projections { items: Vec<(String, String)> },
    /// Distinct aggregation replaced by the expression it is distinct over.
    AggregationDistinct { expression: String, alias: Option<String> },
    /// `DISTINCT ` in front of the select list.
    Distinct,
    /// Items appended to GROUP BY, or a whole new GROUP BY clause.
    GroupByItems { items: Vec<String>, new_clause: bool },
    /// ORDER BY appended so shard results arrive sorted.
    OrderBy { items: Vec<String> },
    Offset { revised: u64 },
    RowCount { revised: u64 },
    GeneratedKeyInsertColumn { column: String },
    /// VALUES groups kept per unit.
    InsertValues { rows: Vec<InsertValueText> },
    EncryptColumn { cipher_column: String },
    EncryptValue { literal: String },
}

/// Splice instruction over the original SQL: `[start, end)` is replaced by
/// the text of `kind`. Insertions have `start == end`.
#[derive(Debug, Clone, PartialEq)]
pub struct SqlToken {
    pub start: usize,
    pub end: usize,
    pub kind: TokenKind,
}

impl SqlToken {
    pub fn replace(start: usize, end: usize, kind: TokenKind) -> Self {
        Self { start, end, kind }
    }

    pub fn insert(position: usize, kind: TokenKind) -> Self {
        Self { start: position, end: position, kind }
    }

    /// Replacement text for `unit`.
    pub fn text(&self, unit: &RouteUnit, route: &RouteContext) -> String {
        match &self.kind {
            TokenKind::Table { logic_table, quote } | TokenKind::ColumnOwner { logic_table, quote } => {
                quote.wrap(unit.actual_table(logic_table).unwrap_or(logic_table))
            }
            TokenKind::Remove => String::new(),
            TokenKind::Projections { items } => {
                items.iter().map(|(expression, alias)| format!(", {expression} AS {alias}")).collect()
            }
            TokenKind::AggregationDistinct { expression, alias } => match alias {
                Some(alias) => format!("{expression} AS {alias}"),
                None => expression.clone(),
            },
            TokenKind::Distinct => "DISTINCT ".to_string(),
            TokenKind::GroupByItems { items, new_clause: true } => format!(" GROUP BY {}", items.join(", ")),
            TokenKind::GroupByItems { items, new_clause: false } => format!(", {}", items.join(", ")),
            TokenKind::OrderBy { items } => format!(" ORDER BY {}", items.join(", ")),
            TokenKind::Offset { revised } | TokenKind::RowCount { revised } => revised.to_string(),
            TokenKind::GeneratedKeyInsertColumn { column } => format!(", {column}"),
            TokenKind::InsertValues { rows } => rows
                .iter()
                .filter(|row| route.row_belongs_to(row.row_index, unit))
                .map(|row| row.text.as_str())
                .collect::<Vec<_>>()
                .join(", "),
            TokenKind::EncryptColumn { cipher_column } => cipher_column.clone(),
            TokenKind::EncryptValue { literal } => literal.clone(),
        }
    }
}
