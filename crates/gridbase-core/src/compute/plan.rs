//! Field classification, done once per batch.

use std::collections::HashMap;

use uuid::Uuid;

use gridbase_engine::engine::extract_field_refs;
use gridbase_engine::{FieldResolver, Formula, FormulaError, ResultType, Value, compile};

use super::aggregate::Aggregation;
use crate::error::Result;
use crate::model::{Field, FieldKind, LookupOptions, RollupOptions, ValueMap};

pub(crate) struct PlannedFormula<'a> {
    pub field: &'a Field,
    pub result_type: Option<ResultType>,
    /// Compile errors are kept so every record reports them as a null value.
    pub formula: std::result::Result<Formula, FormulaError>,
}

pub(crate) struct PlannedRollup<'a> {
    pub field: &'a Field,
    pub options: &'a RollupOptions,
    pub aggregation: Result<Aggregation>,
}

/// The computed fields of a catalog, in evaluation order, plus the lookups
/// formulas need to resolve `{Name}` and `{id}` references.
pub(crate) struct ComputePlan<'a> {
    fields_by_id: HashMap<Uuid, &'a Field>,
    ids_by_name: HashMap<&'a str, Uuid>,
    pub formulas: Vec<PlannedFormula<'a>>,
    pub lookups: Vec<(&'a Field, &'a LookupOptions)>,
    pub rollups: Vec<PlannedRollup<'a>>,
}

impl<'a> ComputePlan<'a> {
    pub fn new(fields: &'a [Field]) -> Self {
        let mut plan = ComputePlan {
            fields_by_id: HashMap::with_capacity(fields.len()),
            ids_by_name: HashMap::with_capacity(fields.len()),
            formulas: Vec::new(),
            lookups: Vec::new(),
            rollups: Vec::new(),
        };

        for field in fields {
            plan.fields_by_id.entry(field.id).or_insert(field);
            plan.ids_by_name.entry(field.name.as_str()).or_insert(field.id);

            match &field.kind {
                FieldKind::Formula(options) => {
                    log::debug!(
                        "formula field {} ({}) reads {:?}",
                        field.name,
                        field.id,
                        extract_field_refs(&options.expression)
                    );
                    plan.formulas.push(PlannedFormula {
                        field,
                        result_type: options.result_type,
                        formula: compile(&options.expression),
                    });
                }
                FieldKind::Lookup(options) => plan.lookups.push((field, options)),
                FieldKind::Rollup(options) => plan.rollups.push(PlannedRollup {
                    field,
                    options,
                    aggregation: options.aggregation_function.parse(),
                }),
                _ => {}
            }
        }

        log::debug!(
            "classified {} fields: {} formula, {} lookup, {} rollup",
            fields.len(),
            plan.formulas.len(),
            plan.lookups.len(),
            plan.rollups.len()
        );
        plan
    }

    pub fn has_computed_fields(&self) -> bool {
        !(self.formulas.is_empty() && self.lookups.is_empty() && self.rollups.is_empty())
    }

    pub fn field(&self, id: Uuid) -> Option<&'a Field> {
        self.fields_by_id.get(&id).copied()
    }

    pub fn resolver<'p>(&'p self, values: &'p ValueMap) -> RowResolver<'p, 'a> {
        RowResolver { plan: self, values }
    }
}

/// Resolves formula references against one record's stored values.
///
/// A reference is tried as a stored key first, then as a field name, then as
/// the id of a catalog field with no stored value.
pub(crate) struct RowResolver<'p, 'a> {
    plan: &'p ComputePlan<'a>,
    values: &'p ValueMap,
}

impl FieldResolver for RowResolver<'_, '_> {
    fn resolve(&self, reference: &str) -> gridbase_engine::Result<Value> {
        if let Some(value) = self.values.get(reference) {
            return Ok(value.clone());
        }
        if let Some(id) = self.plan.ids_by_name.get(reference) {
            return Ok(self.values.get(&id.to_string()).cloned().unwrap_or_default());
        }
        if let Ok(id) = Uuid::parse_str(reference)
            && let Some(field) = self.plan.field(id)
        {
            return Ok(self
                .values
                .get(&field.id.to_string())
                .cloned()
                .unwrap_or_default());
        }
        Err(FormulaError::FieldNotFound(reference.to_string()))
    }
}
