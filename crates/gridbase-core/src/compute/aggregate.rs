//! Rollup aggregation functions.

use std::str::FromStr;

use gridbase_engine::Value;

use crate::error::{CoreError, Result};

/// An aggregation a Rollup field applies to its linked values.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Aggregation {
    Count,
    CountA,
    Sum,
    Average,
    Min,
    Max,
}

impl FromStr for Aggregation {
    type Err = CoreError;

    fn from_str(name: &str) -> Result<Self> {
        match name.trim().to_ascii_uppercase().as_str() {
            "COUNT" => Ok(Aggregation::Count),
            "COUNTA" => Ok(Aggregation::CountA),
            "SUM" => Ok(Aggregation::Sum),
            "AVG" | "AVERAGE" => Ok(Aggregation::Average),
            "MIN" => Ok(Aggregation::Min),
            "MAX" => Ok(Aggregation::Max),
            _ => Err(CoreError::UnknownAggregation(name.to_string())),
        }
    }
}

impl Aggregation {
    pub fn apply(self, values: &[Value]) -> Value {
        match self {
            Aggregation::Count => Value::Number(values.len() as f64),
            Aggregation::CountA => {
                let filled = values
                    .iter()
                    .filter(|v| !v.is_null() && v.as_str() != Some(""))
                    .count();
                Value::Number(filled as f64)
            }
            Aggregation::Sum => Value::Number(values.iter().map(Value::to_number).sum()),
            Aggregation::Average => {
                if values.is_empty() {
                    return Value::Null;
                }
                let total: f64 = values.iter().map(Value::to_number).sum();
                Value::Number(total / values.len() as f64)
            }
            Aggregation::Min => fold_numbers(values, f64::min),
            Aggregation::Max => fold_numbers(values, f64::max),
        }
    }
}

fn fold_numbers(values: &[Value], pick: fn(f64, f64) -> f64) -> Value {
    values
        .iter()
        .map(Value::to_number)
        .reduce(pick)
        .map(Value::Number)
        .unwrap_or(Value::Null)
}

/// Aggregate `values` with the named function. Names are case-insensitive.
pub fn aggregate(function: &str, values: &[Value]) -> Result<Value> {
    Ok(function.parse::<Aggregation>()?.apply(values))
}
