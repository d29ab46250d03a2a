use tracing::{debug, warn};

use crate::{
    binder::{
        AggregationProjection, BindingError, ColumnProjection, DerivedKind, DerivedProjection, ExpressionProjection,
        GroupByContext, OrderByContext, Projection, ProjectionsContext, ScopeTable, ShorthandProjection, TablesContext,
    },
    metadata::SchemaMetaData,
    statement::{AggregationType, Expression, OrderByItemSegment, ProjectionSegment, ProjectionsSegment},
};

/// Builds the [`ProjectionsContext`] of a SELECT.
///
/// Indices are handed out left to right: declared items (shorthands expanded
/// against the catalog), then ORDER BY helpers, then GROUP BY helpers, then
/// the COUNT/SUM pairs of every AVG in the order the AVGs were found.
pub struct ProjectionsContextEngine<'a> {
    schema: &'a dyn SchemaMetaData,
}

impl<'a> ProjectionsContextEngine<'a> {
    pub fn new(schema: &'a dyn SchemaMetaData) -> Self {
        Self { schema }
    }

    pub fn create(
        &self,
        segment: &ProjectionsSegment,
        tables: &TablesContext,
        group_by: &GroupByContext,
        order_by: &OrderByContext,
    ) -> Result<ProjectionsContext, BindingError> {
        let mut next_index = 0usize;
        let mut projections = Vec::with_capacity(segment.items.len());
        let mut nested_averages: Vec<(usize, Vec<AggregationProjection>)> = Vec::new();
        for item in &segment.items {
            if let ProjectionSegment::Expression { expr, .. } = item {
                let found = Self::nested_averages(expr);
                if !found.is_empty() {
                    nested_averages.push((projections.len(), found));
                }
            }
            projections.push(self.create_projection(item, tables, &mut next_index)?);
        }

        let mut context = ProjectionsContext {
            start: segment.start,
            stop: segment.stop,
            distinct_row: segment.distinct_row,
            projections,
        };

        if !order_by.generated {
            Self::append_derived(&mut context, &order_by.items, DerivedKind::OrderBy, tables, &mut next_index)?;
        }
        Self::append_derived(&mut context, &group_by.items, DerivedKind::GroupBy, tables, &mut next_index)?;
        Self::expand_averages(&mut context, nested_averages, &mut next_index);

        debug!(
            projections = context.projections.len(),
            columns = next_index,
            derived = context.derived_items().len(),
            "bound projections"
        );
        Ok(context)
    }

    fn create_projection(
        &self,
        item: &ProjectionSegment,
        tables: &TablesContext,
        next_index: &mut usize,
    ) -> Result<Projection, BindingError> {
        let projection = match item {
            ProjectionSegment::Shorthand { owner, .. } => {
                let owner = owner.as_ref().map(|o| o.name.clone());
                let mut columns = Vec::new();
                for (table_owner, name) in self.shorthand_columns(owner.as_deref(), tables)? {
                    *next_index += 1;
                    columns.push(ColumnProjection { owner: Some(table_owner), name, alias: None, index: *next_index });
                }
                Projection::Shorthand(ShorthandProjection { owner, columns })
            }
            ProjectionSegment::Column { column, alias } => {
                *next_index += 1;
                Projection::Column(ColumnProjection {
                    owner: column.owner.as_ref().map(|o| o.name.clone()),
                    name: column.name.clone(),
                    alias: alias.clone(),
                    index: *next_index,
                })
            }
            ProjectionSegment::Expression { text, alias, expr, .. } => {
                *next_index += 1;
                Projection::Expression(ExpressionProjection {
                    text: text.clone(),
                    alias: alias.clone(),
                    index: *next_index,
                    derived: Vec::new(),
                    coalesced_average: Self::is_coalesced_average(expr),
                })
            }
            ProjectionSegment::Aggregation { kind, inner_expression, alias, .. } => {
                *next_index += 1;
                let mut aggregation = AggregationProjection::new(*kind, inner_expression);
                aggregation.alias = alias.clone();
                aggregation.index = *next_index;
                Projection::Aggregation(aggregation)
            }
            ProjectionSegment::AggregationDistinct { kind, inner_expression, distinct_expression, alias, .. } => {
                *next_index += 1;
                let mut aggregation = AggregationProjection::new(*kind, inner_expression);
                aggregation.alias = alias.clone();
                aggregation.index = *next_index;
                aggregation.distinct_expression = Some(distinct_expression.clone());
                Projection::AggregationDistinct(aggregation)
            }
        };
        Ok(projection)
    }

    /// `(owner, column)` pairs a shorthand stands for.
    fn shorthand_columns(&self, owner: Option<&str>, tables: &TablesContext) -> Result<Vec<(String, String)>, BindingError> {
        let matches_owner = |table: &ScopeTable| match (owner, table) {
            (None, _) => true,
            (Some(owner), ScopeTable::Simple(simple)) => {
                simple.alias_or_name().eq_ignore_ascii_case(owner) || simple.name.eq_ignore_ascii_case(owner)
            }
            (Some(owner), ScopeTable::Derived { alias, .. }) => alias.as_deref().is_some_and(|a| a.eq_ignore_ascii_case(owner)),
        };

        let selected: Vec<&ScopeTable> = tables.scope().iter().filter(|t| matches_owner(*t)).collect();
        if let (Some(owner), true) = (owner, selected.is_empty()) {
            return Err(BindingError::UnresolvableTable { owner: owner.to_string() });
        }

        let mut out = Vec::new();
        for table in selected {
            match table {
                ScopeTable::Simple(simple) => {
                    if !self.schema.contains_table(&simple.name) {
                        warn!(table = %simple.name, "no metadata to expand shorthand projection");
                    }
                    let label = simple.alias_or_name().to_string();
                    out.extend(self.schema.visible_column_names(&simple.name).into_iter().map(|c| (label.clone(), c)));
                }
                ScopeTable::Derived { alias, columns } => {
                    let label = alias.clone().unwrap_or_default();
                    out.extend(columns.iter().map(|c| (label.clone(), c.clone())));
                }
            }
        }
        Ok(out)
    }

    fn append_derived(
        context: &mut ProjectionsContext,
        items: &[crate::binder::OrderByItem],
        kind: DerivedKind,
        tables: &TablesContext,
        next_index: &mut usize,
    ) -> Result<(), BindingError> {
        let prefix = match kind {
            DerivedKind::OrderBy => "ORDER_BY_DERIVED",
            DerivedKind::GroupBy => "GROUP_BY_DERIVED",
        };
        let mut count = 0;
        for item in items {
            if matches!(item.segment, OrderByItemSegment::Index { .. }) {
                continue;
            }
            if context.find_item_index(&item.segment, tables)?.is_some() {
                continue;
            }
            *next_index += 1;
            context.projections.push(Projection::Derived(DerivedProjection {
                expression: item.segment.text(),
                alias: format!("{prefix}_{count}"),
                kind,
                index: *next_index,
            }));
            count += 1;
        }
        Ok(())
    }

    fn nested_averages(expr: &Expression) -> Vec<AggregationProjection> {
        expr.find_functions("AVG")
            .into_iter()
            .filter_map(|function| match function {
                Expression::Function { text, .. } => text.find('(').map(|p| &text[p..]),
                _ => None,
            })
            .map(|inner| AggregationProjection::new(AggregationType::Avg, inner))
            .collect()
    }

    fn is_coalesced_average(expr: &Expression) -> bool {
        let Expression::Function { name, args, .. } = expr else { return false };
        let is_avg = |e: &Expression| matches!(e, Expression::Function { name, .. } if name.eq_ignore_ascii_case("AVG"));
        let coalescing = ["IFNULL", "COALESCE", "NVL"].iter().any(|f| name.eq_ignore_ascii_case(f));
        coalescing && args.first().is_some_and(is_avg) && expr.find_functions("AVG").len() == 1
    }

    fn expand_averages(
        context: &mut ProjectionsContext,
        nested: Vec<(usize, Vec<AggregationProjection>)>,
        next_index: &mut usize,
    ) {
        let mut nested = nested.into_iter().peekable();
        let mut occurrence = 0usize;
        let mut label = |children: &mut Vec<AggregationProjection>| {
            for child in children.iter_mut() {
                *next_index += 1;
                child.index = *next_index;
                let kind = if child.kind == AggregationType::Count { "COUNT" } else { "SUM" };
                child.alias = Some(format!("AVG_DERIVED_{kind}_{occurrence}"));
            }
            occurrence += 1;
        };

        for (position, projection) in context.projections.iter_mut().enumerate() {
            match projection {
                Projection::Aggregation(aggregation) | Projection::AggregationDistinct(aggregation)
                    if aggregation.kind == AggregationType::Avg =>
                {
                    let mut children = aggregation.average_children();
                    label(&mut children);
                    aggregation.derived = children;
                }
                Projection::Expression(expression) => {
                    while let Some((_, averages)) = nested.next_if(|(p, _)| *p == position) {
                        for average in averages {
                            let mut children = average.average_children();
                            label(&mut children);
                            expression.derived.extend(children);
                        }
                    }
                }
                _ => {}
            }
        }
    }
}
