//! Schema validation for csvchat JSON5 configuration layers.

use crate::ConfigError;
use serde_json::{Map, Value};

/// Shape expected for a single leaf value.
#[derive(Debug, Clone, Copy)]
enum Kind {
    Str,
    Bool,
    UInt,
    OneOf(&'static [&'static str]),
}

type Section = (&'static str, &'static [(&'static str, Kind)]);

const SECTIONS: &[Section] = &[
    (
        "api",
        &[("endpoint", Kind::Str), ("send_session_id", Kind::Bool)],
    ),
    ("files", &[("payers", Kind::Str), ("transactions", Kind::Str)]),
    (
        "reply",
        &[
            ("mode", Kind::OneOf(&["api", "simulated"])),
            ("simulated_delay_ms", Kind::UInt),
            ("simulated_text", Kind::Str),
        ],
    ),
    (
        "ui",
        &[
            ("mobile_breakpoint", Kind::UInt),
            ("theme", Kind::OneOf(&["dark", "light"])),
            ("seed_demo", Kind::Bool),
            ("user_name", Kind::Str),
        ],
    ),
];

/// Validate a single config layer against the schema.
pub(super) fn validate_layer_schema(value: &Value, layer: &str) -> Result<(), ConfigError> {
    let root = expect_object(value, layer, "")?;
    for (key, value) in root {
        if key == "$schema" {
            check_kind(value, Kind::Str, layer, key)?;
            continue;
        }
        let Some((_, fields)) = SECTIONS.iter().find(|(name, _)| name == key) else {
            return Err(invalid_field(layer, key, "unknown key"));
        };
        let section = expect_object(value, layer, key)?;
        for (field, value) in section {
            let path = format!("{key}.{field}");
            let Some((_, kind)) = fields.iter().find(|(name, _)| name == field) else {
                return Err(invalid_field(layer, &path, "unknown key"));
            };
            // Explicit nulls reset optional values to their defaults.
            if value.is_null() {
                continue;
            }
            check_kind(value, *kind, layer, &path)?;
        }
    }
    Ok(())
}

fn check_kind(value: &Value, kind: Kind, layer: &str, path: &str) -> Result<(), ConfigError> {
    let ok = match kind {
        Kind::Str => value.is_string(),
        Kind::Bool => value.is_boolean(),
        Kind::UInt => value.is_u64(),
        Kind::OneOf(choices) => {
            let Some(text) = value.as_str() else {
                return Err(invalid_field(layer, path, "expected string"));
            };
            if !choices.contains(&text) {
                let message = format!("expected one of {}", choices.join(", "));
                return Err(invalid_field(layer, path, &message));
            }
            true
        }
    };
    if ok {
        return Ok(());
    }
    let expected = match kind {
        Kind::Str | Kind::OneOf(_) => "expected string",
        Kind::Bool => "expected bool",
        Kind::UInt => "expected non-negative integer",
    };
    Err(invalid_field(layer, path, expected))
}

fn expect_object<'a>(
    value: &'a Value,
    layer: &str,
    path: &str,
) -> Result<&'a Map<String, Value>, ConfigError> {
    value
        .as_object()
        .ok_or_else(|| invalid_field(layer, path, "expected object"))
}

/// Build a structured invalid-field error.
fn invalid_field(layer: &str, path: &str, message: &str) -> ConfigError {
    let path = if path.is_empty() { "root" } else { path };
    ConfigError::InvalidField {
        path: format!("{layer}:{path}"),
        message: message.to_string(),
    }
}
