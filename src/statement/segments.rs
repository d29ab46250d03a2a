use crate::statement::{Expression, SelectStatement};

/// Identifier delimiters kept from the original text so rewritten names keep them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum QuoteCharacter {
    #[default]
    None,
    BackQuote,
    DoubleQuote,
    Brackets,
}

impl QuoteCharacter {
    pub fn wrap(&self, value: &str) -> String {
        match self {
            QuoteCharacter::None => value.to_string(),
            QuoteCharacter::BackQuote => format!("`{value}`"),
            QuoteCharacter::DoubleQuote => format!("\"{value}\""),
            QuoteCharacter::Brackets => format!("[{value}]"),
        }
    }
}

/// Qualifier in front of a table or column (`db.` / `o.`).
/// `start..=stop` covers the name only, not the trailing dot.
#[derive(Debug, Clone, PartialEq)]
pub struct OwnerSegment {
    pub start: usize,
    pub stop: usize,
    pub name: String,
}

impl OwnerSegment {
    pub fn new(start: usize, stop: usize, name: &str) -> Self {
        Self { start, stop, name: name.to_string() }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SimpleTableSegment {
    pub start: usize,
    pub stop: usize,
    pub name: String,
    pub quote: QuoteCharacter,
    pub owner: Option<OwnerSegment>,
    pub alias: Option<String>,
}

impl SimpleTableSegment {
    pub fn new(start: usize, stop: usize, name: &str) -> Self {
        Self {
            start,
            stop,
            name: name.to_string(),
            quote: QuoteCharacter::None,
            owner: None,
            alias: None,
        }
    }

    pub fn with_alias(mut self, alias: &str) -> Self {
        self.alias = Some(alias.to_string());
        self
    }

    pub fn with_owner(mut self, owner: OwnerSegment) -> Self {
        self.owner = Some(owner);
        self
    }

    pub fn with_quote(mut self, quote: QuoteCharacter) -> Self {
        self.quote = quote;
        self
    }

    pub fn alias_or_name(&self) -> &str {
        self.alias.as_deref().unwrap_or(&self.name)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SubqueryTableSegment {
    pub start: usize,
    pub stop: usize,
    pub select: Box<SelectStatement>,
    pub alias: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinType {
    Inner,
    Left,
    Right,
    Full,
    Cross,
}

#[derive(Debug, Clone, PartialEq)]
pub struct JoinTableSegment {
    pub left: Box<TableSegment>,
    pub right: Box<TableSegment>,
    pub join_type: JoinType,
    pub condition: Option<Expression>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TableSegment {
    Simple(SimpleTableSegment),
    Subquery(SubqueryTableSegment),
    Join(JoinTableSegment),
}

impl TableSegment {
    pub fn join(left: TableSegment, right: TableSegment, join_type: JoinType, condition: Option<Expression>) -> Self {
        TableSegment::Join(JoinTableSegment {
            left: Box::new(left),
            right: Box::new(right),
            join_type,
            condition,
        })
    }

    /// Simple tables and subqueries of this FROM item, in declaration order.
    /// Joins are flattened; subqueries are not descended into.
    pub fn scope_tables(&self) -> Vec<&TableSegment> {
        match self {
            TableSegment::Join(join) => {
                let mut out = join.left.scope_tables();
                out.extend(join.right.scope_tables());
                out
            }
            other => vec![other],
        }
    }

    /// Every simple table reachable from this item, including those inside
    /// derived tables and join conditions.
    pub fn all_simple_tables(&self) -> Vec<&SimpleTableSegment> {
        match self {
            TableSegment::Simple(table) => vec![table],
            TableSegment::Subquery(subquery) => subquery.select.all_simple_tables(),
            TableSegment::Join(join) => {
                let mut out = join.left.all_simple_tables();
                out.extend(join.right.all_simple_tables());
                if let Some(condition) = &join.condition {
                    out.extend(condition.subquery_tables());
                }
                out
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ColumnSegment {
    pub start: usize,
    pub stop: usize,
    pub name: String,
    pub owner: Option<OwnerSegment>,
}

impl ColumnSegment {
    pub fn new(start: usize, stop: usize, name: &str) -> Self {
        Self { start, stop, name: name.to_string(), owner: None }
    }

    pub fn with_owner(mut self, owner: OwnerSegment) -> Self {
        self.owner = Some(owner);
        self
    }

    /// `owner.name` or `name`, the key used for table resolution.
    pub fn expression(&self) -> String {
        match &self.owner {
            Some(owner) => format!("{}.{}", owner.name, self.name),
            None => self.name.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum OrderDirection {
    #[default]
    Asc,
    Desc,
}

impl OrderDirection {
    pub fn as_sql(&self) -> &'static str {
        match self {
            OrderDirection::Asc => "ASC",
            OrderDirection::Desc => "DESC",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NullsOrder {
    First,
    Last,
}

impl NullsOrder {
    /// NULL sorts as the smallest value unless stated otherwise.
    pub fn default_for(direction: OrderDirection) -> Self {
        match direction {
            OrderDirection::Asc => NullsOrder::First,
            OrderDirection::Desc => NullsOrder::Last,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum OrderByItemSegment {
    Column { column: ColumnSegment, direction: OrderDirection, nulls: Option<NullsOrder> },
    Index { start: usize, stop: usize, index: usize, direction: OrderDirection, nulls: Option<NullsOrder> },
    Expression { start: usize, stop: usize, text: String, direction: OrderDirection, nulls: Option<NullsOrder> },
}

impl OrderByItemSegment {
    pub fn column(column: ColumnSegment, direction: OrderDirection) -> Self {
        OrderByItemSegment::Column { column, direction, nulls: None }
    }

    pub fn direction(&self) -> OrderDirection {
        match self {
            OrderByItemSegment::Column { direction, .. }
            | OrderByItemSegment::Index { direction, .. }
            | OrderByItemSegment::Expression { direction, .. } => *direction,
        }
    }

    pub fn nulls(&self) -> NullsOrder {
        let explicit = match self {
            OrderByItemSegment::Column { nulls, .. }
            | OrderByItemSegment::Index { nulls, .. }
            | OrderByItemSegment::Expression { nulls, .. } => *nulls,
        };
        explicit.unwrap_or_else(|| NullsOrder::default_for(self.direction()))
    }

    /// Text used when the item has to be written back into SQL.
    pub fn text(&self) -> String {
        match self {
            OrderByItemSegment::Column { column, .. } => column.expression(),
            OrderByItemSegment::Index { index, .. } => index.to_string(),
            OrderByItemSegment::Expression { text, .. } => text.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct OrderBySegment {
    pub start: usize,
    pub stop: usize,
    pub items: Vec<OrderByItemSegment>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GroupBySegment {
    pub start: usize,
    pub stop: usize,
    pub items: Vec<OrderByItemSegment>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct WhereSegment {
    pub start: usize,
    pub stop: usize,
    pub expr: Expression,
}

#[derive(Debug, Clone, PartialEq)]
pub struct HavingSegment {
    pub start: usize,
    pub stop: usize,
    pub expr: Expression,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PaginationValueSegment {
    Literal { start: usize, stop: usize, value: u64 },
    Parameter { start: usize, stop: usize, index: usize },
}

impl PaginationValueSegment {
    pub fn start(&self) -> usize {
        match self {
            PaginationValueSegment::Literal { start, .. } | PaginationValueSegment::Parameter { start, .. } => *start,
        }
    }

    pub fn stop(&self) -> usize {
        match self {
            PaginationValueSegment::Literal { stop, .. } | PaginationValueSegment::Parameter { stop, .. } => *stop,
        }
    }
}

/// `LIMIT [offset,] row_count` / `LIMIT row_count OFFSET offset`.
#[derive(Debug, Clone, PartialEq)]
pub struct LimitSegment {
    pub start: usize,
    pub stop: usize,
    pub offset: Option<PaginationValueSegment>,
    pub row_count: Option<PaginationValueSegment>,
}

/// One side of a row-number predicate such as `ROWNUM > 2` or `rn <= 4`.
#[derive(Debug, Clone, PartialEq)]
pub struct RowNumberBound {
    pub value: PaginationValueSegment,
    pub inclusive: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RowNumberSegment {
    pub offset: Option<RowNumberBound>,
    pub row_count: Option<RowNumberBound>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PaginationSegment {
    Limit(LimitSegment),
    RowNumber(RowNumberSegment),
}
