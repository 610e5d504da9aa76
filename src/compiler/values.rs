//! Leaf value rendering: literals go through the [`ParamSink`]; the
//! symbolic markers (`Expression`, `Sub`, `ParentField`) are resolved here
//! (spec §4.2, §9).

use crate::catalog::Catalogue;
use crate::compiler::scope::Scope;
use crate::error::{Error, Result};
use crate::params::ParamSink;
use crate::value::Value;

pub fn render_value(
    catalogue: &Catalogue,
    scope: &Scope,
    sink: &mut ParamSink,
    value: &Value,
) -> Result<String> {
    match value {
        Value::Literal(scalar) => Ok(sink.bind_scalar(Some(scalar))),
        Value::Null => Ok(sink.bind_scalar(None)),
        Value::Expression(text) => rewrite_parent_fields(catalogue, scope, text),
        Value::Sub(query) => {
            let sql = crate::compiler::compile_subquery_text(catalogue, sink, query)?;
            Ok(format!("({sql})"))
        }
        Value::ParentField(field) => {
            let parent = scope.parent.ok_or_else(|| Error::FieldNotFound {
                model: scope.model.slug.clone(),
                slug: field.clone(),
            })?;
            let (_, selector) = catalogue.field(parent.model, field)?;
            Ok(parent.qualify(&selector.render()))
        }
        Value::ValueHole => Err(Error::InvalidFieldValue {
            field: String::new(),
            reason: "unresolved preset value hole".to_string(),
        }),
    }
}

/// Textually replace `__FIELD_PARENT_<name>` markers with the parent
/// scope's column selector. The expression itself is raw SQL the caller
/// wrote, so this is a plain string scan rather than structured parsing
/// (spec §9: only the `Expression` *value* is string-based; everything
/// else is a tagged variant).
fn rewrite_parent_fields(catalogue: &Catalogue, scope: &Scope, text: &str) -> Result<String> {
    const MARKER: &str = "__FIELD_PARENT_";
    if !text.contains(MARKER) {
        return Ok(text.to_string());
    }

    let parent = scope.parent.ok_or_else(|| Error::InvalidFieldValue {
        field: String::new(),
        reason: "__FIELD_PARENT_ reference with no enclosing scope".to_string(),
    })?;

    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(pos) = rest.find(MARKER) {
        out.push_str(&rest[..pos]);
        let after = &rest[pos + MARKER.len()..];
        let end = after
            .find(|c: char| !(c.is_alphanumeric() || c == '_'))
            .unwrap_or(after.len());
        let field_name = &after[..end];
        let (_, selector) = catalogue.field(parent.model, field_name)?;
        out.push_str(&parent.qualify(&selector.render()));
        rest = &after[end..];
    }
    out.push_str(rest);
    Ok(out)
}
