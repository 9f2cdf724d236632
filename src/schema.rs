use crate::models::{CollectionValue, SchemaProperty};
use serde_json::{Map, Value};
use std::collections::HashMap;

/// Maps property display names to their opaque codes. Codes are visited in
/// schema order and a later code silently replaces an earlier one with the
/// same name.
pub fn property_codes(schema: &Map<String, Value>) -> HashMap<String, String> {
    let mut codes = HashMap::with_capacity(schema.len());
    for (code, raw) in schema {
        let property: SchemaProperty = match serde_json::from_value(raw.clone()) {
            Ok(property) => property,
            Err(error) => {
                tracing::warn!(code = %code, error = %error, "skipping malformed schema property");
                continue;
            }
        };
        if let Some(previous) = codes.insert(property.name.clone(), code.clone()) {
            tracing::debug!(name = %property.name, previous = %previous, code = %code, "schema name collision");
        }
    }
    codes
}

/// Name lookup for the first collection of a query response, or an empty map
/// when the response carried no collection.
pub fn resolve_schema(collections: &[CollectionValue]) -> HashMap<String, String> {
    match collections.first() {
        Some(collection) => property_codes(&collection.schema),
        None => {
            tracing::warn!("query response carried no collection schema");
            HashMap::new()
        }
    }
}
