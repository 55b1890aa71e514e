use uuid::Uuid;

use gridbase_engine::engine::coerce_result_type;
use gridbase_engine::Value;

use super::aggregate::Aggregation;
use super::links::extract_record_ids;
use super::plan::{ComputePlan, PlannedFormula, PlannedRollup};
use crate::error::{CoreError, Result};
use crate::model::{Field, LookupOptions, Record, ValueMap};
use crate::storage::LinkedValueSource;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Tuning for a batch computation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ComputeOptions {
    /// Process records on the rayon pool. Ignored without the `parallel`
    /// feature.
    pub parallel: bool,
}

impl Default for ComputeOptions {
    fn default() -> Self {
        ComputeOptions { parallel: true }
    }
}

/// Computes Formula, Lookup and Rollup values for batches of records of one
/// table.
///
/// Per record, formulas run first against the stored values, then lookups,
/// then rollups. Lookups and rollups read the working values so a rollup can
/// aggregate through a lookup computed moments earlier. A field that fails to
/// compute is set to null and the rest of the record carries on.
pub struct FieldComputer<'a, S: LinkedValueSource + ?Sized> {
    plan: ComputePlan<'a>,
    source: &'a S,
    #[cfg_attr(not(feature = "parallel"), allow(dead_code))]
    options: ComputeOptions,
}

impl<'a, S: LinkedValueSource + ?Sized> FieldComputer<'a, S> {
    pub fn new(fields: &'a [Field], source: &'a S) -> Self {
        FieldComputer {
            plan: ComputePlan::new(fields),
            source,
            options: ComputeOptions::default(),
        }
    }

    pub fn with_options(mut self, options: ComputeOptions) -> Self {
        self.options = options;
        self
    }

    pub fn has_computed_fields(&self) -> bool {
        self.plan.has_computed_fields()
    }

    /// Compute every record of the batch, preserving order. The inputs are
    /// left untouched.
    pub fn compute(&self, records: &[Record]) -> Result<Vec<Record>> {
        if records.is_empty() || !self.has_computed_fields() {
            return Ok(records.to_vec());
        }

        #[cfg(feature = "parallel")]
        {
            if self.options.parallel {
                return Ok(records
                    .par_iter()
                    .map(|record| self.compute_record(record))
                    .collect());
            }
        }

        Ok(records
            .iter()
            .map(|record| self.compute_record(record))
            .collect())
    }

    /// A copy of `record` with its computed fields filled in.
    pub fn compute_record(&self, record: &Record) -> Record {
        let stored = record.value_map();
        let mut working = stored.clone();
        let mut updates = ValueMap::new();

        for planned in &self.plan.formulas {
            let value = self.compute_formula(planned, &stored);
            let value = self.or_null(record, planned.field, value);
            working.insert(planned.field.id.to_string(), value.clone());
            updates.insert(planned.field.id.to_string(), value);
        }

        for (field, options) in &self.plan.lookups {
            let value = self.compute_lookup(field, options, &working);
            let value = self.or_null(record, field, value);
            working.insert(field.id.to_string(), value.clone());
            updates.insert(field.id.to_string(), value);
        }

        for planned in &self.plan.rollups {
            let value = self.compute_rollup(planned, &working);
            let value = self.or_null(record, planned.field, value);
            working.insert(planned.field.id.to_string(), value.clone());
            updates.insert(planned.field.id.to_string(), value);
        }

        record.with_updates(updates)
    }

    fn or_null(&self, record: &Record, field: &Field, value: Result<Value>) -> Value {
        value.unwrap_or_else(|e| {
            log::warn!(
                "record {}: field {} ({}) computed as null: {e}",
                record.id,
                field.name,
                field.id
            );
            Value::Null
        })
    }

    fn compute_formula(&self, planned: &PlannedFormula<'_>, stored: &ValueMap) -> Result<Value> {
        let formula = planned.formula.as_ref().map_err(|e| e.clone())?;
        let value = formula.evaluate(&self.plan.resolver(stored))?;
        Ok(coerce_result_type(value, planned.result_type))
    }

    fn compute_lookup(
        &self,
        field: &Field,
        options: &LookupOptions,
        values: &ValueMap,
    ) -> Result<Value> {
        let linked = options
            .lookup_linked_field_id
            .ok_or(CoreError::MissingOption {
                field: field.id,
                option: "lookupLinkedFieldId",
            })?;
        let target = options.lookup_field_id.ok_or(CoreError::MissingOption {
            field: field.id,
            option: "lookupFieldId",
        })?;

        let ids = self.linked_ids(field, linked, values)?;
        if ids.is_empty() {
            return Ok(Value::Null);
        }

        let mut fetched = self.source.fetch_field_values(&ids, target)?;
        // One linked value is returned bare; callers expecting a list must
        // handle that case.
        if fetched.len() == 1 {
            Ok(fetched.remove(0))
        } else {
            Ok(Value::Array(fetched))
        }
    }

    fn compute_rollup(&self, planned: &PlannedRollup<'_>, values: &ValueMap) -> Result<Value> {
        let field = planned.field;
        let options = planned.options;
        let aggregation = planned.aggregation.clone()?;
        let linked = options
            .rollup_linked_field_id
            .ok_or(CoreError::MissingOption {
                field: field.id,
                option: "rollupLinkedFieldId",
            })?;

        let ids = self.linked_ids(field, linked, values)?;
        if aggregation == Aggregation::Count {
            return Ok(Value::Number(ids.len() as f64));
        }

        let target = options.rollup_field_id.ok_or(CoreError::MissingOption {
            field: field.id,
            option: "rollupFieldId",
        })?;
        if ids.is_empty() {
            return Ok(Value::Null);
        }

        let fetched = self.source.fetch_field_values(&ids, target)?;
        Ok(aggregation.apply(&fetched))
    }

    /// Record ids held by `linked` on this record. The linked field must be
    /// in the catalog and hold record ids.
    fn linked_ids(&self, field: &Field, linked: Uuid, values: &ValueMap) -> Result<Vec<Uuid>> {
        let linked_field = self.plan.field(linked).ok_or(CoreError::UnknownField(linked))?;
        if !linked_field.holds_record_ids() {
            return Err(CoreError::NotLinkField {
                field: field.id,
                linked,
            });
        }
        Ok(values
            .get(&linked.to_string())
            .map(extract_record_ids)
            .unwrap_or_default())
    }
}

/// Compute all Formula, Lookup and Rollup fields of `records` with default
/// options.
///
/// Returns a clone of `records` when the batch is empty or `fields` has no
/// computed field.
pub fn compute_fields_for_records<S: LinkedValueSource + ?Sized>(
    records: &[Record],
    fields: &[Field],
    source: &S,
) -> Result<Vec<Record>> {
    FieldComputer::new(fields, source).compute(records)
}
