//! The IR's symbolic value algebra (spec §9: "implement as a tagged
//! variant, not as string-sniffed maps").

use crate::ir::Query;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A scalar literal carried by the IR.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Scalar {
    String(String),
    Number(f64),
    Bool(bool),
    Json(serde_json::Value),
    Date(DateTime<Utc>),
}

/// A single IR value leaf. Distinguishes literals from the three kinds of
/// symbolic placeholder the IR carries in-band: raw SQL expressions,
/// sub-queries, and the two substitution holes used by presets and joins.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    Literal(Scalar),
    Null,
    /// `{__EXPR: "..."}` — inlined verbatim; may reference `__FIELD_PARENT_<name>`.
    Expression(String),
    /// `{__QUERY: ...}` — compiled recursively and inlined as `(... LIMIT 1)`.
    Sub(Box<Query>),
    /// `{__VALUE}` inside a preset's instructions — replaced by the
    /// argument passed to the preset via `using`.
    ValueHole,
    /// `{__FIELD_PARENT_<name>}` — rewritten to the parent scope's column
    /// selector during join composition.
    ParentField(String),
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Literal(Scalar::String(s.to_string()))
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Literal(Scalar::String(s))
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Literal(Scalar::Number(n))
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Literal(Scalar::Bool(b))
    }
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }
}
