//! JSON Schema generation for the capsule configuration file.

use crate::config::CapsuleConfig;

/// Generates a JSON Schema for the capsule configuration.
#[must_use]
pub fn generate_schema() -> schemars::Schema {
    let mut schema = schemars::schema_for!(CapsuleConfig);

    if let Some(obj) = schema.as_object_mut() {
        obj.insert("$id".to_string(), serde_json::json!("notch-capsule.schema.json"));
    }

    schema
}

/// Pretty-printed JSON Schema for the capsule configuration.
#[must_use]
pub fn print_schema() -> String {
    serde_json::to_string_pretty(&generate_schema()).unwrap_or_default()
}
