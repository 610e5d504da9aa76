//! `with` → `WHERE <composeConditions>` (spec §4.2, §4.3).

use crate::catalog::Catalogue;
use crate::compiler::scope::Scope;
use crate::compiler::values::render_value;
use crate::error::Result;
use crate::ir::{CompareOp, Condition};
use crate::params::ParamSink;
use crate::value::{Scalar, Value};

/// Produce a parenthesised boolean expression from a `with`-shaped
/// condition tree. Leaves resolve their field through the catalogue;
/// `And`/`Or` compose their children with the matching SQL operator.
pub fn compose_conditions(
    catalogue: &Catalogue,
    scope: &Scope,
    sink: &mut ParamSink,
    condition: &Condition,
) -> Result<String> {
    match condition {
        Condition::Equals { field, value } => render_equals(catalogue, scope, sink, field, value),
        Condition::Compare { field, op, value } => {
            render_compare(catalogue, scope, sink, field, *op, value)
        }
        Condition::And(children) => compose_join(catalogue, scope, sink, children, " AND "),
        Condition::Or(children) => compose_join(catalogue, scope, sink, children, " OR "),
    }
}

fn compose_join(
    catalogue: &Catalogue,
    scope: &Scope,
    sink: &mut ParamSink,
    children: &[Condition],
    joiner: &str,
) -> Result<String> {
    let mut parts = Vec::with_capacity(children.len());
    for child in children {
        parts.push(compose_conditions(catalogue, scope, sink, child)?);
    }
    Ok(format!("({})", parts.join(joiner)))
}

/// Bare at the root scope (there's only ever one table in play there); a
/// joined scope - an `including` entry's `JOIN ON` condition - qualifies
/// with its alias, since the outer query also has the root table in scope
/// and an unqualified name would silently resolve against the wrong one.
fn selector_sql(catalogue: &Catalogue, scope: &Scope, field: &str) -> Result<String> {
    let (_, selector) = catalogue.field(scope.model, field)?;
    let rendered = selector.render();
    Ok(match scope.alias {
        Some(_) => scope.qualify(&rendered),
        None => rendered,
    })
}

fn render_equals(
    catalogue: &Catalogue,
    scope: &Scope,
    sink: &mut ParamSink,
    field: &str,
    value: &Value,
) -> Result<String> {
    let selector = selector_sql(catalogue, scope, field)?;
    if value.is_null() {
        return Ok(format!("{selector} IS NULL"));
    }
    if let Value::Sub(_) = value {
        let rendered = render_value(catalogue, scope, sink, value)?;
        return Ok(format!("{selector} = {rendered}"));
    }
    let rendered = render_value(catalogue, scope, sink, value)?;
    Ok(format!("{selector} = {rendered}"))
}

fn render_compare(
    catalogue: &Catalogue,
    scope: &Scope,
    sink: &mut ParamSink,
    field: &str,
    op: CompareOp,
    value: &Value,
) -> Result<String> {
    let selector = selector_sql(catalogue, scope, field)?;

    if value.is_null() {
        return Ok(match op {
            CompareOp::Being => format!("{selector} IS NULL"),
            CompareOp::NotBeing => format!("{selector} IS NOT NULL"),
            _ => format!("{selector} IS NULL"),
        });
    }

    match op {
        CompareOp::Being => {
            let rendered = render_value(catalogue, scope, sink, value)?;
            Ok(format!("{selector} = {rendered}"))
        }
        CompareOp::NotBeing => {
            let rendered = render_value(catalogue, scope, sink, value)?;
            Ok(format!("{selector} != {rendered}"))
        }
        CompareOp::GreaterThan => {
            let rendered = render_value(catalogue, scope, sink, value)?;
            Ok(format!("{selector} > {rendered}"))
        }
        CompareOp::GreaterOrEqual => {
            let rendered = render_value(catalogue, scope, sink, value)?;
            Ok(format!("{selector} >= {rendered}"))
        }
        CompareOp::LessThan => {
            let rendered = render_value(catalogue, scope, sink, value)?;
            Ok(format!("{selector} < {rendered}"))
        }
        CompareOp::LessOrEqual => {
            let rendered = render_value(catalogue, scope, sink, value)?;
            Ok(format!("{selector} <= {rendered}"))
        }
        CompareOp::StartingWith | CompareOp::NotStartingWith => {
            let rendered = bind_like(sink, value, |s| format!("{s}%"))?;
            let op_sql = if op == CompareOp::StartingWith {
                "LIKE"
            } else {
                "NOT LIKE"
            };
            Ok(format!("{selector} {op_sql} {rendered}"))
        }
        CompareOp::EndingWith | CompareOp::NotEndingWith => {
            let rendered = bind_like(sink, value, |s| format!("%{s}"))?;
            let op_sql = if op == CompareOp::EndingWith {
                "LIKE"
            } else {
                "NOT LIKE"
            };
            Ok(format!("{selector} {op_sql} {rendered}"))
        }
        CompareOp::Containing | CompareOp::NotContaining => {
            let rendered = bind_like(sink, value, |s| format!("%{s}%"))?;
            let op_sql = if op == CompareOp::Containing {
                "LIKE"
            } else {
                "NOT LIKE"
            };
            Ok(format!("{selector} {op_sql} {rendered}"))
        }
    }
}

/// Pad a literal string value with `%` wildcards before binding (the
/// padding is part of the bound parameter's content, so it behaves
/// identically in parameterised and inline modes).
fn bind_like(sink: &mut ParamSink, value: &Value, pad: impl Fn(&str) -> String) -> Result<String> {
    match value {
        Value::Literal(Scalar::String(s)) => Ok(sink.bind_scalar(Some(&Scalar::String(pad(s))))),
        Value::Literal(other) => Ok(sink.bind_scalar(Some(other))),
        _ => Ok(sink.bind_scalar(None)),
    }
}
