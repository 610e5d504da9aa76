//! `using` → preset splicing (spec §4.3 "using", §9 "preset merging"). Each
//! entry names a preset (or the synthetic `links` preset, which expands to
//! every link field's own preset), whose instructions are deep-cloned,
//! have any `{__VALUE}` holes substituted with the caller's argument, and
//! are merged into the query's instruction bundle.

use crate::catalog::Catalogue;
use crate::catalog::model::Model;
use crate::error::{Error, Result};
use crate::ir::{Condition, Instructions, UsingEntry};
use crate::value::Value;
use std::collections::BTreeMap;

const LINKS_PRESET: &str = "links";

pub fn apply_using(catalogue: &Catalogue, model: &Model, target: &mut Instructions, entries: &[UsingEntry]) -> Result<()> {
    for entry in entries {
        if entry.preset == LINKS_PRESET {
            for field in model.user_fields() {
                if field.link.is_some() {
                    splice_preset(catalogue, model, target, &field.slug, &entry.argument)?;
                }
            }
            continue;
        }
        splice_preset(catalogue, model, target, &entry.preset, &entry.argument)?;
    }
    Ok(())
}

fn splice_preset(
    catalogue: &Catalogue,
    model: &Model,
    target: &mut Instructions,
    preset_slug: &str,
    argument: &Option<Value>,
) -> Result<()> {
    let preset = model.presets.get(preset_slug).ok_or_else(|| Error::PresetNotFound {
        model: model.slug.clone(),
        slug: preset_slug.to_string(),
    })?;
    let _ = catalogue;

    let mut resolved = preset.instructions.clone();
    if let Some(arg) = argument {
        substitute_holes(&mut resolved, arg);
    }
    merge_instructions(target, resolved);
    Ok(())
}

/// Replace every [`Value::ValueHole`] reachable from `instructions` with
/// `argument`, recursing through condition trees and the `to` payload.
fn substitute_holes(instructions: &mut Instructions, argument: &Value) {
    if let Some(with) = instructions.with.as_mut() {
        substitute_in_condition(with, argument);
    }
    if let Some(to) = instructions.to.as_mut() {
        for value in to.values_mut() {
            substitute_in_value(value, argument);
        }
    }
}

fn substitute_in_condition(condition: &mut Condition, argument: &Value) {
    match condition {
        Condition::Equals { value, .. } => substitute_in_value(value, argument),
        Condition::Compare { value, .. } => substitute_in_value(value, argument),
        Condition::And(children) | Condition::Or(children) => {
            for child in children {
                substitute_in_condition(child, argument);
            }
        }
    }
}

fn substitute_in_value(value: &mut Value, argument: &Value) {
    if matches!(value, Value::ValueHole) {
        *value = argument.clone();
    }
}

/// Merge a spliced preset's instructions into the target bundle. `with`
/// conditions AND together; ordering and selection lists concatenate and
/// dedup; `limitedTo` and the pagination cursors only apply if the target
/// hasn't already set them; `to` is an object merge where the target's own
/// keys win over the preset's.
fn merge_instructions(target: &mut Instructions, preset: Instructions) {
    target.with = match (target.with.take(), preset.with) {
        (Some(a), Some(b)) => Some(Condition::And(vec![a, b])),
        (Some(a), None) => Some(a),
        (None, b) => b,
    };

    if let Some(preset_order) = preset.ordered_by {
        let existing = target.ordered_by.get_or_insert_with(Vec::new);
        existing.extend(preset_order);
    }

    if target.limited_to.is_none() {
        target.limited_to = preset.limited_to;
    }
    if target.before.is_none() {
        target.before = preset.before;
    }
    if target.after.is_none() {
        target.after = preset.after;
    }

    if let Some(preset_includes) = preset.including {
        let existing = target.including.get_or_insert_with(Vec::new);
        existing.extend(preset_includes);
    }

    if let Some(preset_select) = preset.selecting {
        let existing = target.selecting.get_or_insert_with(Vec::new);
        existing.extend(preset_select);
    }

    if let Some(preset_to) = preset.to {
        let existing = target.to.get_or_insert_with(BTreeMap::new);
        for (k, v) in preset_to {
            existing.entry(k).or_insert(v);
        }
    }
}
