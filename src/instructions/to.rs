//! `to` → the `VALUES`/`SET` payload of `add`/`set` (spec §4.3 "to"). Columns
//! the caller didn't mention are left out of the statement entirely so the
//! column's own `DEFAULT` clause (random id, `CURRENT_TIMESTAMP`, ...)
//! applies; `ronin.updatedAt` is touched on every `set` unless the caller
//! already named it.

use crate::catalog::Catalogue;
use crate::catalog::model::Model;
use crate::compiler::scope::Scope;
use crate::compiler::values::render_value;
use crate::error::{Error, Result};
use crate::params::ParamSink;
use crate::value::Value;
use std::collections::BTreeMap;

pub struct Assignment {
    pub column: String,
    pub rendered: String,
}

pub fn render_insert(
    catalogue: &Catalogue,
    scope: &Scope,
    sink: &mut ParamSink,
    to: Option<&BTreeMap<String, Value>>,
) -> Result<Vec<Assignment>> {
    let to = to.cloned().unwrap_or_default();
    check_required(scope.model, &to)?;

    let mut assignments = Vec::with_capacity(to.len());
    for (field, value) in &to {
        let (_, selector) = catalogue.field(scope.model, field)?;
        let rendered = render_value(catalogue, scope, sink, value)?;
        assignments.push(Assignment {
            column: selector.render(),
            rendered,
        });
    }
    Ok(assignments)
}

pub fn render_update(
    catalogue: &Catalogue,
    scope: &Scope,
    sink: &mut ParamSink,
    to: Option<&BTreeMap<String, Value>>,
) -> Result<Vec<Assignment>> {
    let mut to = to.cloned().unwrap_or_default();
    to.entry("ronin.updatedAt".to_string())
        .or_insert_with(|| Value::Expression("CURRENT_TIMESTAMP".to_string()));

    let mut assignments = Vec::with_capacity(to.len());
    for (field, value) in &to {
        let (_, selector) = catalogue.field(scope.model, field)?;
        let rendered = render_value(catalogue, scope, sink, value)?;
        assignments.push(Assignment {
            column: selector.render(),
            rendered,
        });
    }
    Ok(assignments)
}

/// Every required user field (no default, not a link with `setNull`) must
/// be present on an `add`.
fn check_required(model: &Model, to: &BTreeMap<String, Value>) -> Result<()> {
    for field in model.user_fields() {
        if field.required && field.default_value.is_none() && !to.contains_key(&field.slug) {
            return Err(Error::InvalidFieldValue {
                field: field.slug.clone(),
                reason: "required field was not provided to `to`".to_string(),
            });
        }
    }
    Ok(())
}
