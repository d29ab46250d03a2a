use std::{cmp::Ordering, fmt::Display};

use ordered_float::OrderedFloat;

/// A scalar carried in statements, parameter lists and shard result rows.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum SqlValue {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Float(OrderedFloat<f64>),
    Text(String),
}

impl SqlValue {
    pub fn float(value: f64) -> Self {
        SqlValue::Float(OrderedFloat(value))
    }

    pub fn text(value: &str) -> Self {
        SqlValue::Text(value.to_string())
    }

    pub fn is_null(&self) -> bool {
        matches!(self, SqlValue::Null)
    }

    /// Integer view of the value. Floats must be integral, text must parse.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            SqlValue::Int(v) => Some(*v),
            SqlValue::Float(v) if v.0.fract() == 0.0 => Some(v.0 as i64),
            SqlValue::Text(s) => s.trim().parse::<i64>().ok(),
            SqlValue::Bool(b) => Some(*b as i64),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            SqlValue::Int(v) => Some(*v as f64),
            SqlValue::Float(v) => Some(v.0),
            SqlValue::Text(s) => s.trim().parse::<f64>().ok(),
            _ => None,
        }
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, SqlValue::Int(_) | SqlValue::Float(_))
    }

    /// Total order used for sorting and range checks. Integers and floats
    /// compare numerically; otherwise values of different kinds order by kind.
    pub fn compare(&self, other: &SqlValue) -> Ordering {
        match (self, other) {
            (SqlValue::Int(a), SqlValue::Int(b)) => a.cmp(b),
            (SqlValue::Float(a), SqlValue::Float(b)) => a.cmp(b),
            (SqlValue::Int(a), SqlValue::Float(b)) => OrderedFloat(*a as f64).cmp(b),
            (SqlValue::Float(a), SqlValue::Int(b)) => a.cmp(&OrderedFloat(*b as f64)),
            (SqlValue::Text(a), SqlValue::Text(b)) => a.cmp(b),
            (SqlValue::Bool(a), SqlValue::Bool(b)) => a.cmp(b),
            (lhs, rhs) => lhs.kind_rank().cmp(&rhs.kind_rank()),
        }
    }

    fn kind_rank(&self) -> u8 {
        match self {
            SqlValue::Null => 0,
            SqlValue::Bool(_) => 1,
            SqlValue::Int(_) | SqlValue::Float(_) => 2,
            SqlValue::Text(_) => 3,
        }
    }

    /// Renders the value as a SQL literal, quoting and escaping text.
    pub fn to_sql_literal(&self) -> String {
        match self {
            SqlValue::Null => "NULL".to_string(),
            SqlValue::Bool(true) => "TRUE".to_string(),
            SqlValue::Bool(false) => "FALSE".to_string(),
            SqlValue::Int(v) => v.to_string(),
            SqlValue::Float(v) => v.0.to_string(),
            SqlValue::Text(s) => format!("'{}'", s.replace('\'', "''")),
        }
    }
}

impl Display for SqlValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SqlValue::Null => f.write_str("NULL"),
            SqlValue::Bool(b) => write!(f, "{b}"),
            SqlValue::Int(v) => write!(f, "{v}"),
            SqlValue::Float(v) => write!(f, "{}", v.0),
            SqlValue::Text(s) => f.write_str(s),
        }
    }
}

impl From<i64> for SqlValue {
    fn from(value: i64) -> Self {
        SqlValue::Int(value)
    }
}

impl From<i32> for SqlValue {
    fn from(value: i32) -> Self {
        SqlValue::Int(value as i64)
    }
}

impl From<f64> for SqlValue {
    fn from(value: f64) -> Self {
        SqlValue::float(value)
    }
}

impl From<bool> for SqlValue {
    fn from(value: bool) -> Self {
        SqlValue::Bool(value)
    }
}

impl From<&str> for SqlValue {
    fn from(value: &str) -> Self {
        SqlValue::Text(value.to_string())
    }
}

impl From<String> for SqlValue {
    fn from(value: String) -> Self {
        SqlValue::Text(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn literal_rendering_escapes_quotes() {
        assert_eq!(SqlValue::text("o'neil").to_sql_literal(), "'o''neil'");
        assert_eq!(SqlValue::Null.to_sql_literal(), "NULL");
        assert_eq!(SqlValue::Int(7).to_sql_literal(), "7");
    }

    #[test]
    fn numbers_compare_across_representations() {
        assert_eq!(SqlValue::Int(2).compare(&SqlValue::float(2.5)), Ordering::Less);
        assert_eq!(SqlValue::float(3.0).compare(&SqlValue::Int(3)), Ordering::Equal);
        assert_eq!(SqlValue::Null.compare(&SqlValue::Int(0)), Ordering::Less);
        assert_eq!(SqlValue::text("b").compare(&SqlValue::text("a")), Ordering::Greater);
    }

    #[test]
    fn integer_view_accepts_integral_floats_and_numeric_text() {
        assert_eq!(SqlValue::float(4.0).as_i64(), Some(4));
        assert_eq!(SqlValue::float(4.5).as_i64(), None);
        assert_eq!(SqlValue::text(" 12 ").as_i64(), Some(12));
        assert_eq!(SqlValue::Null.as_i64(), None);
    }
}
