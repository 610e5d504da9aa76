//! Value serialisation (spec §4.2 "Parameter binding") and field->SQLite
//! type mapping (spec §6).

use crate::catalog::model::{DefaultValue, FieldType};
use crate::render::escape_string;
use crate::value::Scalar;
use chrono::SecondsFormat;

pub fn sqlite_type(field_type: FieldType) -> &'static str {
    match field_type {
        FieldType::String => "TEXT",
        FieldType::Number => "REAL",
        FieldType::Boolean => "INTEGER",
        FieldType::Date => "DATETIME",
        FieldType::Json => "TEXT",
        FieldType::Blob => "BLOB",
        FieldType::Link => "TEXT",
    }
}

/// Serialise a scalar for inline (non-parameterised) statement rendering
/// (spec §4.2): strings single-quoted with SQL escaping, booleans as 0/1,
/// dates as ISO-8601 milliseconds, JSON via `json(...)`, null as `NULL`.
pub fn render_scalar_inline(scalar: &Scalar) -> String {
    match scalar {
        Scalar::String(s) => escape_string(s),
        Scalar::Number(n) => format_number(*n),
        Scalar::Bool(b) => if *b { "1" } else { "0" }.to_string(),
        Scalar::Date(d) => {
            escape_string(&d.to_rfc3339_opts(SecondsFormat::Millis, true))
        }
        Scalar::Json(v) => format!("json({})", escape_string(&v.to_string())),
    }
}

fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{n}")
    }
}

/// Render a field's DDL `DEFAULT (...)` clause, with the `id` field's
/// prefix-dependent random-id default special-cased (spec §6).
pub fn render_default_clause(field_slug: &str, id_prefix: &str, default: &DefaultValue) -> String {
    if field_slug == "id" {
        return format!(
            "('{id_prefix}_' || lower(substr(hex(randomblob(12)),1,16)))"
        );
    }
    match default {
        DefaultValue::Expression(expr) => format!("({expr})"),
        DefaultValue::Literal(value) => render_literal_default(value),
    }
}

fn render_literal_default(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::Null => "NULL".to_string(),
        serde_json::Value::Bool(b) => if *b { "1" } else { "0" }.to_string(),
        serde_json::Value::Number(n) => n.to_string(),
        serde_json::Value::String(s) => escape_string(s),
        other => format!("json({})", escape_string(&other.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inline_bool_renders_as_bit() {
        assert_eq!(render_scalar_inline(&Scalar::Bool(true)), "1");
        assert_eq!(render_scalar_inline(&Scalar::Bool(false)), "0");
    }

    #[test]
    fn inline_string_escapes_quotes() {
        assert_eq!(render_scalar_inline(&Scalar::String("o'clock".into())), "'o''clock'");
    }

    #[test]
    fn id_default_uses_prefix() {
        let clause = render_default_clause("id", "acc", &DefaultValue::Literal(serde_json::Value::Null));
        assert!(clause.contains("'acc_'"));
    }
}
