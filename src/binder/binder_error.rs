use std::fmt::Display;

#[derive(Debug, Clone, PartialEq)]
pub enum BindingError {
    /// Tables of one statement are qualified by more than one database.
    AmbiguousDatabase { databases: Vec<String> },
    /// `owner.*` or `owner.column` where no FROM item is named `owner`.
    UnresolvableTable { owner: String },
    PaginationParameter { index: usize },
    InvalidOrderByIndex { index: usize, projections: usize },
}

impl Display for BindingError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BindingError::AmbiguousDatabase { databases } => {
                write!(f, "statement references more than one database: {}", databases.join(", "))
            }
            BindingError::UnresolvableTable { owner } => write!(f, "unknown table or alias '{owner}'"),
            BindingError::PaginationParameter { index } => {
                write!(f, "pagination parameter #{index} is missing or not a non-negative integer")
            }
            BindingError::InvalidOrderByIndex { index, projections } => {
                write!(f, "ORDER BY position {index} is out of range, statement selects {projections} columns")
            }
        }
    }
}

impl std::error::Error for BindingError {}
