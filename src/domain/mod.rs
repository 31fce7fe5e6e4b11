//! Storefront domain: themes, value objects, page aggregates and events

pub mod aggregates;
pub mod events;
pub mod theme;
pub mod value_objects;

use std::collections::BTreeMap;
use validator::ValidationErrors;

/// Inline form errors keyed by field name, rendered next to each input.
pub type FieldErrors = BTreeMap<String, String>;

/// Flattens validator output to one message per field, keeping the first
/// failing rule. `prefix` namespaces fields of secondary forms (billing).
pub fn collect_field_errors(errors: &ValidationErrors, prefix: &str) -> FieldErrors {
    errors
        .field_errors()
        .into_iter()
        .filter_map(|(field, failures)| {
            let first = failures.first()?;
            let message = first
                .message
                .as_ref()
                .map(|m| m.to_string())
                .unwrap_or_else(|| format!("{} is invalid", field.replace('_', " ")));
            Some((format!("{prefix}{field}"), message))
        })
        .collect()
}
