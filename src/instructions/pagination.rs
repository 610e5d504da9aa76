//! `before`/`after` pagination (spec §4.3). Decodes the cursor into one
//! scalar per ordering key and emits a lexicographic comparison: equal on
//! every earlier column, strictly ordered on the first column that
//! differs.

use crate::catalog::Catalogue;
use crate::catalog::model::FieldType;
use crate::compiler::scope::Scope;
use crate::cursor;
use crate::error::{Error, Result};
use crate::ir::{Direction, LimitedTo, OrderItem, OrderKey};
use crate::params::ParamSink;
use crate::value::Scalar;

/// Non-nullable date columns. NULLs on every other column coalesce to a
/// value before `-1e999` so that `<` comparisons still order them last.
const NON_NULLABLE_DATE_FIELDS: &[&str] = &["ronin.createdAt", "ronin.updatedAt"];

pub fn render_pagination(
    catalogue: &Catalogue,
    scope: &Scope,
    sink: &mut ParamSink,
    before: Option<&str>,
    after: Option<&str>,
    ordered_by: &[OrderItem],
    limited_to: Option<&LimitedTo>,
) -> Result<Option<String>> {
    let cursor = match (before, after) {
        (Some(_), Some(_)) => {
            return Err(Error::MutuallyExclusiveInstructions {
                a: "before",
                b: "after",
            });
        }
        (Some(c), None) => c,
        (None, Some(c)) => c,
        (None, None) => return Ok(None),
    };

    if limited_to.is_none() {
        return Err(Error::MissingInstruction {
            instruction: "limitedTo",
        });
    }
    if ordered_by.is_empty() {
        return Err(Error::MissingInstruction {
            instruction: "orderedBy",
        });
    }

    let reversed = before.is_some();
    let segments = cursor::decode(cursor);

    // Pre-parse every segment into a typed scalar, one per ordering key.
    let mut scalars = Vec::with_capacity(ordered_by.len());
    for (item, segment) in ordered_by.iter().zip(segments.iter()) {
        scalars.push(match segment {
            Some(raw) => Some(parse_cursor_scalar(catalogue, scope, item, raw)?),
            None => None,
        });
    }

    let mut disjuncts = Vec::with_capacity(scalars.len());
    for i in 0..scalars.len() {
        let Some(strict) = render_strict(catalogue, scope, sink, &ordered_by[i], &scalars[i], reversed)?
        else {
            continue;
        };
        let mut equalities = Vec::with_capacity(i + 1);
        for j in 0..i {
            equalities.push(render_equal(catalogue, scope, sink, &ordered_by[j], &scalars[j])?);
        }
        equalities.push(strict);
        disjuncts.push(format!("({})", equalities.join(" AND ")));
    }

    if disjuncts.is_empty() {
        return Ok(None);
    }
    Ok(Some(format!("({})", disjuncts.join(" OR "))))
}

fn render_equal(
    catalogue: &Catalogue,
    scope: &Scope,
    sink: &mut ParamSink,
    item: &OrderItem,
    scalar: &Option<Scalar>,
) -> Result<String> {
    let (selector, _) = selector_for(catalogue, scope, item)?;
    match scalar {
        None => Ok(format!("{selector} IS NULL")),
        Some(s) => {
            let rendered = sink.bind_scalar(Some(s));
            Ok(format!("{selector} = {rendered}"))
        }
    }
}

/// Render the strict comparison for one ordering key, or `None` if it is a
/// `< NULL` disjunct (undefined per spec, so skipped entirely).
fn render_strict(
    catalogue: &Catalogue,
    scope: &Scope,
    sink: &mut ParamSink,
    item: &OrderItem,
    scalar: &Option<Scalar>,
    reversed: bool,
) -> Result<Option<String>> {
    let Some(scalar) = scalar else {
        return Ok(None);
    };

    let (selector, field_name) = selector_for(catalogue, scope, item)?;
    let effective_dir = effective_direction(item.direction, reversed);
    let non_nullable = NON_NULLABLE_DATE_FIELDS.contains(&field_name.as_str());
    let rendered = sink.bind_scalar(Some(scalar));

    Ok(Some(match effective_dir {
        Direction::Asc => format!("{selector} > {rendered}"),
        Direction::Desc if non_nullable => format!("{selector} < {rendered}"),
        Direction::Desc => format!("COALESCE({selector}, -1e999) < {rendered}"),
    }))
}

fn effective_direction(direction: Direction, reversed: bool) -> Direction {
    if !reversed {
        return direction;
    }
    match direction {
        Direction::Asc => Direction::Desc,
        Direction::Desc => Direction::Asc,
    }
}

fn selector_for(catalogue: &Catalogue, scope: &Scope, item: &OrderItem) -> Result<(String, String)> {
    match &item.key {
        OrderKey::Field(field) => {
            let (_, selector) = catalogue.field(scope.model, field)?;
            Ok((selector.render(), field.clone()))
        }
        OrderKey::Expression(expr) => Ok((format!("({expr})"), String::new())),
    }
}

/// Coerce a decoded cursor segment into a scalar typed for comparison. Date
/// fields decode as epoch-millisecond integers; everything else parses as a
/// number when the field type calls for it, falling back to text.
fn parse_cursor_scalar(catalogue: &Catalogue, scope: &Scope, item: &OrderItem, raw: &str) -> Result<Scalar> {
    let OrderKey::Field(field) = &item.key else {
        return Ok(Scalar::String(raw.to_string()));
    };
    let Ok((f, _)) = catalogue.field(scope.model, field) else {
        return Ok(Scalar::String(raw.to_string()));
    };

    match f.r#type {
        FieldType::Date => {
            let millis: i64 = raw.parse().map_err(|_| Error::InvalidFieldValue {
                field: field.clone(),
                reason: format!("cursor segment `{raw}` is not a valid epoch-ms timestamp"),
            })?;
            let date = chrono::DateTime::from_timestamp_millis(millis).ok_or_else(|| Error::InvalidFieldValue {
                field: field.clone(),
                reason: format!("cursor segment `{raw}` is out of range for a timestamp"),
            })?;
            Ok(Scalar::Date(date))
        }
        FieldType::Number => raw
            .parse::<f64>()
            .map(Scalar::Number)
            .map_err(|_| Error::InvalidFieldValue {
                field: field.clone(),
                reason: format!("cursor segment `{raw}` is not numeric"),
            }),
        FieldType::Boolean => Ok(Scalar::Bool(raw == "1")),
        _ => Ok(Scalar::String(raw.to_string())),
    }
}
