use std::collections::BTreeMap;

use crate::{
    binder::{InsertStatementContext, InsertValueContext},
    route::{GeneratedKeyContext, RouteContext, RouteUnit},
    statement::SqlValue,
};

/// Parameters of one VALUES group.
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterGroup {
    pub row_index: usize,
    /// Position of the group's first parameter in the original list.
    pub offset: usize,
    pub parameters: Vec<SqlValue>,
    /// Generated key bound as an extra trailing `?` of the group.
    pub generated_value: Option<SqlValue>,
}

/// Produces the parameter list of each unit from the original one.
#[derive(Debug, Clone, PartialEq)]
pub enum ParameterBuilder {
    /// Same list for every unit, with replacements applied.
    Standard { parameters: Vec<SqlValue>, replaced: BTreeMap<usize, SqlValue> },
    /// INSERT parameters split per VALUES group, plus those after the last group.
    Grouped { groups: Vec<ParameterGroup>, trailing: Vec<SqlValue>, trailing_offset: usize, replaced: BTreeMap<usize, SqlValue> },
}

/// A generated key is written as `?` into rows that already bind parameters
/// and as a literal otherwise.
pub fn generated_key_is_parameter(row: &InsertValueContext) -> bool {
    row.parameter_count > 0
}

impl ParameterBuilder {
    pub fn standard(parameters: &[SqlValue]) -> Self {
        ParameterBuilder::Standard { parameters: parameters.to_vec(), replaced: BTreeMap::new() }
    }

    pub fn grouped(insert: &InsertStatementContext, parameters: &[SqlValue], generated_key: Option<&GeneratedKeyContext>) -> Self {
        let generated = generated_key.filter(|k| k.generated);
        let groups = insert
            .values
            .iter()
            .enumerate()
            .map(|(row_index, row)| ParameterGroup {
                row_index,
                offset: row.parameters_offset,
                parameters: row.parameters(parameters).to_vec(),
                generated_value: generated
                    .filter(|_| generated_key_is_parameter(row))
                    .and_then(|k| k.values.get(row_index).cloned()),
            })
            .collect();
        let trailing_offset = insert.trailing_parameters_offset().min(parameters.len());
        ParameterBuilder::Grouped {
            groups,
            trailing: parameters[trailing_offset..].to_vec(),
            trailing_offset,
            replaced: BTreeMap::new(),
        }
    }

    /// Replaces the original parameter at `index` for every unit.
    pub fn replace(&mut self, index: usize, value: SqlValue) {
        match self {
            ParameterBuilder::Standard { replaced, .. } | ParameterBuilder::Grouped { replaced, .. } => {
                replaced.insert(index, value);
            }
        }
    }

    pub fn parameters_for(&self, unit: &RouteUnit, route: &RouteContext) -> Vec<SqlValue> {
        match self {
            ParameterBuilder::Standard { parameters, replaced } => apply(parameters, 0, replaced),
            ParameterBuilder::Grouped { groups, trailing, trailing_offset, replaced } => {
                let mut out = Vec::new();
                for group in groups.iter().filter(|g| route.row_belongs_to(g.row_index, unit)) {
                    out.extend(apply(&group.parameters, group.offset, replaced));
                    out.extend(group.generated_value.iter().cloned());
                }
                out.extend(apply(trailing, *trailing_offset, replaced));
                out
            }
        }
    }
}

fn apply(parameters: &[SqlValue], offset: usize, replaced: &BTreeMap<usize, SqlValue>) -> Vec<SqlValue> {
    parameters
        .iter()
        .enumerate()
        .map(|(i, value)| replaced.get(&(offset + i)).unwrap_or(value).clone())
        .collect()
}
