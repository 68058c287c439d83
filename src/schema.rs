//! Arrow schema of the post store: whatever the records carry, plus the
//! three core fields every query relies on.

use crate::error::{AnalyticsError, Result};
use arrow::datatypes::{DataType, Field, Fields, Schema, SchemaRef};
use std::sync::Arc;

pub const DATE_FIELD: &str = "date";
pub const CONTENT_FIELD: &str = "content";
pub const USER_FIELD: &str = "user";
pub const USERNAME_FIELD: &str = "username";

fn core_fields() -> Vec<Field> {
    vec![
        Field::new(DATE_FIELD, DataType::Utf8, true),
        Field::new(CONTENT_FIELD, DataType::Utf8, true),
        Field::new(
            USER_FIELD,
            DataType::Struct(Fields::from(vec![Field::new(USERNAME_FIELD, DataType::Utf8, true)])),
            true,
        ),
    ]
}

/// Schema holding only the core fields (what an empty source normalizes to).
pub fn create_post_schema() -> SchemaRef {
    Arc::new(Schema::new(core_fields()))
}

/// Make an inferred record schema queryable and writable:
/// - core fields are added when absent, and all-null ones get their core type;
/// - a core field inferred with an incompatible type is a `SchemaConflict`;
/// - other fields that were null in every record are stored as nullable `Utf8`;
/// - struct fields with no children are dropped (Parquet cannot store them).
pub fn reconcile_post_schema(inferred: &Schema) -> Result<SchemaRef> {
    let mut fields: Vec<Field> = inferred.fields().iter().map(|f| f.as_ref().clone()).collect();
    for core in core_fields() {
        match fields.iter_mut().find(|f| f.name() == core.name()) {
            Some(existing) => *existing = merge_core(existing, &core, core.name())?,
            None => fields.push(core),
        }
    }
    let fields: Vec<Field> = fields.iter().filter_map(storable).collect();
    Ok(Arc::new(Schema::new_with_metadata(fields, inferred.metadata().clone())))
}

fn merge_core(existing: &Field, core: &Field, path: &str) -> Result<Field> {
    match (existing.data_type(), core.data_type()) {
        (DataType::Null, _) => Ok(core.clone()),
        (have, want) if have == want => Ok(existing.clone().with_nullable(true)),
        (DataType::Struct(have), DataType::Struct(want)) => {
            let mut children: Vec<Field> = have.iter().map(|c| c.as_ref().clone()).collect();
            for w in want.iter() {
                match children.iter_mut().find(|c| c.name() == w.name()) {
                    Some(c) => *c = merge_core(c, w, &format!("{path}.{}", w.name()))?,
                    None => children.push(w.as_ref().clone()),
                }
            }
            Ok(Field::new(existing.name(), DataType::Struct(Fields::from(children)), true))
        }
        (found, _) => Err(AnalyticsError::SchemaConflict { field: path.to_string(), found: found.to_string() }),
    }
}

fn storable(field: &Field) -> Option<Field> {
    match field.data_type() {
        DataType::Null => Some(Field::new(field.name(), DataType::Utf8, true)),
        DataType::Struct(children) => {
            let kept: Vec<Field> = children.iter().filter_map(|c| storable(c)).collect();
            if kept.is_empty() {
                tracing::debug!(field = %field.name(), "dropping empty struct field");
                return None;
            }
            Some(Field::new(field.name(), DataType::Struct(Fields::from(kept)), field.is_nullable()))
        }
        DataType::List(item) => {
            let item = storable(item)?;
            Some(Field::new(field.name(), DataType::List(Arc::new(item)), field.is_nullable()))
        }
        _ => Some(field.clone()),
    }
}
