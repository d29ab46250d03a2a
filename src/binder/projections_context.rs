use crate::{
    binder::{BindingError, ColumnProjection, Projection, TablesContext},
    statement::OrderByItemSegment,
};

/// Output items of one SELECT, shorthand and AVG expansion included.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ProjectionsContext {
    pub start: usize,
    pub stop: usize,
    pub distinct_row: bool,
    /// Declared items followed by ORDER BY / GROUP BY helpers.
    pub projections: Vec<Projection>,
}

pub(crate) fn normalize(text: &str) -> String {
    text.chars().filter(|c| !c.is_whitespace()).flat_map(char::to_lowercase).collect()
}

impl ProjectionsContext {
    /// `SELECT *` with nothing else.
    pub fn is_unqualified_shorthand(&self) -> bool {
        matches!(self.projections.as_slice(), [Projection::Shorthand(shorthand)] if shorthand.owner.is_none())
    }

    /// Every output column in index order: shorthands replaced by their
    /// columns, AVG children appended last.
    pub fn expand_projections(&self) -> Vec<Projection> {
        let mut out = Vec::new();
        for projection in &self.projections {
            match projection {
                Projection::Shorthand(shorthand) => {
                    out.extend(shorthand.columns.iter().cloned().map(Projection::Column));
                }
                other => out.push(other.clone()),
            }
        }
        for projection in &self.projections {
            out.extend(projection.derived_aggregations().iter().cloned().map(Projection::Aggregation));
        }
        out.sort_by_key(|p| p.index().unwrap_or(0));
        out
    }

    /// Number of columns the client asked for, helpers excluded.
    pub fn visible_column_count(&self) -> usize {
        self.projections
            .iter()
            .map(|p| match p {
                Projection::Shorthand(shorthand) => shorthand.columns.len(),
                Projection::Derived(_) => 0,
                _ => 1,
            })
            .sum()
    }

    pub fn visible_projections(&self) -> Vec<Projection> {
        let mut expanded = self.expand_projections();
        expanded.truncate(self.visible_column_count());
        expanded
    }

    /// Index of the output column whose expression or alias is `text`.
    pub fn find_projection_index(&self, text: &str) -> Option<usize> {
        let wanted = normalize(text);
        self.expand_projections().iter().find_map(|p| {
            let by_expression = normalize(&p.expression()) == wanted;
            let by_alias = p.alias().is_some_and(|a| normalize(a) == wanted);
            (by_expression || by_alias).then(|| p.index()).flatten()
        })
    }

    pub fn find_alias(&self, expression: &str) -> Option<String> {
        let wanted = normalize(expression);
        self.expand_projections()
            .iter()
            .find(|p| normalize(&p.expression()) == wanted)
            .and_then(|p| p.alias().map(str::to_string))
    }

    /// Index of the output column an ORDER BY / GROUP BY item sorts on.
    pub fn find_item_index(&self, item: &OrderByItemSegment, tables: &TablesContext) -> Result<Option<usize>, BindingError> {
        match item {
            OrderByItemSegment::Index { index, .. } => {
                let projections = self.visible_column_count();
                if *index == 0 || *index > projections {
                    return Err(BindingError::InvalidOrderByIndex { index: *index, projections });
                }
                Ok(Some(*index))
            }
            OrderByItemSegment::Column { column, .. } => {
                let expanded = self.expand_projections();
                let by_alias = column.owner.is_none().then(|| {
                    expanded.iter().find(|p| p.alias().is_some_and(|a| a.eq_ignore_ascii_case(&column.name)))
                });
                if let Some(found) = by_alias.flatten() {
                    return Ok(found.index());
                }
                let owner = column.owner.as_ref().map(|o| o.name.as_str());
                let by_column = expanded.iter().find(|p| match p {
                    Projection::Column(projection) => Self::is_same_column(projection, &column.name, owner, tables),
                    _ => false,
                });
                if let Some(found) = by_column {
                    return Ok(found.index());
                }
                Ok(self.find_projection_index(&column.expression()))
            }
            OrderByItemSegment::Expression { text, .. } => Ok(self.find_projection_index(text)),
        }
    }

    fn is_same_column(projection: &ColumnProjection, name: &str, owner: Option<&str>, tables: &TablesContext) -> bool {
        if !projection.name.eq_ignore_ascii_case(name) {
            return false;
        }
        match (owner, projection.owner.as_deref()) {
            (Some(left), Some(right)) => {
                left.eq_ignore_ascii_case(right)
                    || matches!(
                        (tables.find_table_name_by_owner(left), tables.find_table_name_by_owner(right)),
                        (Some(a), Some(b)) if a.eq_ignore_ascii_case(&b)
                    )
            }
            _ => true,
        }
    }

    /// True for top-level aggregations and for AVG nested in an expression.
    pub fn contains_aggregation(&self) -> bool {
        self.projections.iter().any(|p| {
            matches!(p, Projection::Aggregation(_) | Projection::AggregationDistinct(_)) || !p.derived_aggregations().is_empty()
        })
    }

    /// `COUNT(DISTINCT x)` and alike, which shards answer with the values of `x`.
    pub fn contains_distinct_aggregation(&self) -> bool {
        self.projections.iter().any(|p| matches!(p, Projection::AggregationDistinct(_)))
    }

    /// `(expression, alias)` of every synthesized column, in index order.
    pub fn derived_items(&self) -> Vec<(String, String)> {
        let mut items: Vec<(usize, String, String)> = Vec::new();
        for projection in &self.projections {
            if let Projection::Derived(derived) = projection {
                items.push((derived.index, derived.expression.clone(), derived.alias.clone()));
            }
            for child in projection.derived_aggregations() {
                items.push((child.index, child.expression(), child.alias.clone().unwrap_or_default()));
            }
        }
        items.sort_by_key(|(index, _, _)| *index);
        items.into_iter().map(|(_, expression, alias)| (expression, alias)).collect()
    }
}
