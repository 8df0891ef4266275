//! Dotted `key=value` overrides applied to a parsed configuration document

use crate::error::{Error, Result};
use serde_yaml::{Mapping, Value};

/// Parse an override value as a YAML scalar, falling back to a plain string.
fn parse_value(raw: &str) -> Value {
    serde_yaml::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
}

/// Apply one `a.b.c=value` override, creating intermediate mappings.
pub fn apply_override(document: &mut Value, assignment: &str) -> Result<()> {
    let Some((key, raw)) = assignment.split_once('=') else {
        return Err(Error::config_value(
            assignment,
            "override is not of the form key=value",
            "Write overrides as dotted.key=value, e.g. model.init_args.evaluator=false",
        ));
    };
    let key = key.trim();
    if key.is_empty() || key.split('.').any(str::is_empty) {
        return Err(Error::config_value(
            key,
            "empty key segment",
            "Remove stray dots from the key",
        ));
    }

    if document.is_null() {
        *document = Value::Mapping(Mapping::new());
    }

    let segments: Vec<&str> = key.split('.').collect();
    let (last, parents) = segments.split_last().ok_or_else(|| {
        Error::config_value(key, "empty key", "Write overrides as dotted.key=value")
    })?;

    let mut node = document;
    for (depth, segment) in parents.iter().enumerate() {
        let mapping = node.as_mapping_mut().ok_or_else(|| {
            Error::config_value(
                key,
                format!("'{}' is not a mapping", segments[..depth].join(".")),
                "Override a leaf value or replace the parent entirely",
            )
        })?;
        node = mapping
            .entry(Value::String((*segment).to_string()))
            .or_insert_with(|| Value::Mapping(Mapping::new()));
        if node.is_null() {
            *node = Value::Mapping(Mapping::new());
        }
    }

    let mapping = node.as_mapping_mut().ok_or_else(|| {
        Error::config_value(
            key,
            format!("'{}' is not a mapping", parents.join(".")),
            "Override a leaf value or replace the parent entirely",
        )
    })?;
    tracing::debug!(key, value = raw, "applying config override");
    mapping.insert(Value::String((*last).to_string()), parse_value(raw));
    Ok(())
}

/// Apply overrides in order; later assignments win.
pub fn apply_overrides<S: AsRef<str>>(document: &mut Value, overrides: &[S]) -> Result<()> {
    overrides
        .iter()
        .try_for_each(|o| apply_override(document, o.as_ref()))
}
