//! Field definitions and their kind-specific options.
//!
//! Fields are stored as `{"id", "tableId", "name", "type", "options"}`.
//! Option documents are parsed leniently: a malformed options document
//! becomes the default options for its kind, which then fails that one field
//! at compute time instead of rejecting the whole catalog.

use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

use gridbase_engine::ResultType;

/// A typed column definition on a table.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawField", into = "RawField")]
pub struct Field {
    pub id: Uuid,
    pub table_id: Uuid,
    pub name: String,
    pub kind: FieldKind,
}

impl Field {
    pub fn new(table_id: Uuid, name: &str, kind: FieldKind) -> Field {
        Field {
            id: Uuid::new_v4(),
            table_id,
            name: name.to_string(),
            kind,
        }
    }

    pub fn is_computed(&self) -> bool {
        matches!(
            self.kind,
            FieldKind::Formula(_) | FieldKind::Lookup(_) | FieldKind::Rollup(_)
        )
    }

    /// Whether this field's value is a list of record ids that lookups and
    /// rollups can follow.
    pub fn holds_record_ids(&self) -> bool {
        matches!(self.kind, FieldKind::LinkedRecord(_) | FieldKind::Lookup(_))
    }
}

/// The kind of a field, carrying options for the kinds that have them.
#[derive(Clone, Debug, PartialEq)]
pub enum FieldKind {
    Text,
    LongText,
    Number,
    Currency,
    Percent,
    Checkbox,
    Date,
    DateTime,
    SingleSelect,
    MultiSelect,
    Email,
    Url,
    Phone,
    Attachment,
    LinkedRecord(LinkedRecordOptions),
    Formula(FormulaOptions),
    Lookup(LookupOptions),
    Rollup(RollupOptions),
    /// A kind this engine does not know about. Treated as a plain field.
    Other,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LinkedRecordOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub linked_table_id: Option<Uuid>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FormulaOptions {
    pub expression: String,
    #[serde(
        deserialize_with = "lenient_result_type",
        skip_serializing_if = "Option::is_none"
    )]
    pub result_type: Option<ResultType>,
}

impl FormulaOptions {
    pub fn new(expression: &str) -> Self {
        FormulaOptions {
            expression: expression.to_string(),
            result_type: None,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LookupOptions {
    pub lookup_linked_field_id: Option<Uuid>,
    pub lookup_field_id: Option<Uuid>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RollupOptions {
    pub rollup_linked_field_id: Option<Uuid>,
    pub rollup_field_id: Option<Uuid>,
    pub aggregation_function: String,
}

/// Unknown result type names mean "no coercion" rather than a parse error.
fn lenient_result_type<'de, D>(deserializer: D) -> Result<Option<ResultType>, D::Error>
where
    D: Deserializer<'de>,
{
    let name = Option::<String>::deserialize(deserializer)?;
    Ok(name.as_deref().and_then(ResultType::from_name))
}

/// Field type names as stored.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
enum FieldType {
    Text,
    LongText,
    Number,
    Currency,
    Percent,
    Checkbox,
    Date,
    DateTime,
    SingleSelect,
    MultiSelect,
    Email,
    Url,
    Phone,
    Attachment,
    LinkedRecord,
    Formula,
    Lookup,
    Rollup,
    #[serde(other)]
    Other,
}

/// Stored shape of a field.
#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawField {
    id: Uuid,
    table_id: Uuid,
    name: String,
    #[serde(rename = "type")]
    field_type: FieldType,
    #[serde(default, skip_serializing_if = "serde_json::Value::is_null")]
    options: serde_json::Value,
}

fn parse_options<T>(field_id: Uuid, options: serde_json::Value) -> T
where
    T: Default + for<'de> Deserialize<'de>,
{
    if options.is_null() {
        return T::default();
    }
    serde_json::from_value(options).unwrap_or_else(|e| {
        log::warn!("field {field_id}: ignoring malformed options: {e}");
        T::default()
    })
}

impl From<RawField> for Field {
    fn from(raw: RawField) -> Self {
        let id = raw.id;
        let options = raw.options;
        let kind = match raw.field_type {
            FieldType::Text => FieldKind::Text,
            FieldType::LongText => FieldKind::LongText,
            FieldType::Number => FieldKind::Number,
            FieldType::Currency => FieldKind::Currency,
            FieldType::Percent => FieldKind::Percent,
            FieldType::Checkbox => FieldKind::Checkbox,
            FieldType::Date => FieldKind::Date,
            FieldType::DateTime => FieldKind::DateTime,
            FieldType::SingleSelect => FieldKind::SingleSelect,
            FieldType::MultiSelect => FieldKind::MultiSelect,
            FieldType::Email => FieldKind::Email,
            FieldType::Url => FieldKind::Url,
            FieldType::Phone => FieldKind::Phone,
            FieldType::Attachment => FieldKind::Attachment,
            FieldType::LinkedRecord => FieldKind::LinkedRecord(parse_options(id, options)),
            FieldType::Formula => FieldKind::Formula(parse_options(id, options)),
            FieldType::Lookup => FieldKind::Lookup(parse_options(id, options)),
            FieldType::Rollup => FieldKind::Rollup(parse_options(id, options)),
            FieldType::Other => FieldKind::Other,
        };
        Field {
            id,
            table_id: raw.table_id,
            name: raw.name,
            kind,
        }
    }
}

impl From<Field> for RawField {
    fn from(field: Field) -> Self {
        fn options_json<T: Serialize>(options: &T) -> serde_json::Value {
            serde_json::to_value(options).unwrap_or(serde_json::Value::Null)
        }

        let (field_type, options) = match &field.kind {
            FieldKind::Text => (FieldType::Text, serde_json::Value::Null),
            FieldKind::LongText => (FieldType::LongText, serde_json::Value::Null),
            FieldKind::Number => (FieldType::Number, serde_json::Value::Null),
            FieldKind::Currency => (FieldType::Currency, serde_json::Value::Null),
            FieldKind::Percent => (FieldType::Percent, serde_json::Value::Null),
            FieldKind::Checkbox => (FieldType::Checkbox, serde_json::Value::Null),
            FieldKind::Date => (FieldType::Date, serde_json::Value::Null),
            FieldKind::DateTime => (FieldType::DateTime, serde_json::Value::Null),
            FieldKind::SingleSelect => (FieldType::SingleSelect, serde_json::Value::Null),
            FieldKind::MultiSelect => (FieldType::MultiSelect, serde_json::Value::Null),
            FieldKind::Email => (FieldType::Email, serde_json::Value::Null),
            FieldKind::Url => (FieldType::Url, serde_json::Value::Null),
            FieldKind::Phone => (FieldType::Phone, serde_json::Value::Null),
            FieldKind::Attachment => (FieldType::Attachment, serde_json::Value::Null),
            FieldKind::LinkedRecord(o) => (FieldType::LinkedRecord, options_json(o)),
            FieldKind::Formula(o) => (FieldType::Formula, options_json(o)),
            FieldKind::Lookup(o) => (FieldType::Lookup, options_json(o)),
            FieldKind::Rollup(o) => (FieldType::Rollup, options_json(o)),
            FieldKind::Other => (FieldType::Other, serde_json::Value::Null),
        };
        RawField {
            id: field.id,
            table_id: field.table_id,
            name: field.name,
            field_type,
            options,
        }
    }
}
