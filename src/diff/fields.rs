//! Field-level diff within one common model (spec §4.6 step 5): added,
//! dropped, slug-only renames, and "adjustable" attribute changes that
//! trigger the temp-table rewrite.

use crate::catalog::model::Field;

pub struct FieldDiff {
    pub added: Vec<Field>,
    pub dropped: Vec<Field>,
    pub renamed: Vec<(Field, Field)>,
    /// Same slug on both sides, but some other attribute (type,
    /// required-ness, uniqueness, default, link target) differs — SQLite
    /// cannot `ALTER COLUMN` these in place.
    pub adjusted: Vec<(Field, Field)>,
}

fn same_attributes(a: &Field, b: &Field) -> bool {
    a.r#type == b.r#type
        && a.required == b.required
        && a.unique == b.unique
        && a.increment == b.increment
        && a.default_value == b.default_value
        && a.link == b.link
}

pub fn diff_fields(old_fields: &[&Field], new_fields: &[&Field]) -> FieldDiff {
    let mut added = Vec::new();
    let mut dropped = Vec::new();
    let mut renamed = Vec::new();
    let mut adjusted = Vec::new();

    let mut old_only: Vec<&Field> = Vec::new();
    let mut matched_new_slugs = std::collections::HashSet::new();

    for old_field in old_fields {
        match new_fields.iter().find(|f| f.slug == old_field.slug) {
            Some(new_field) => {
                matched_new_slugs.insert(new_field.slug.clone());
                if !same_attributes(old_field, new_field) {
                    adjusted.push(((*old_field).clone(), (*new_field).clone()));
                }
            }
            None => old_only.push(old_field),
        }
    }

    let new_only: Vec<&Field> = new_fields
        .iter()
        .filter(|f| !matched_new_slugs.contains(&f.slug))
        .copied()
        .collect();
    let mut remaining_new = new_only;

    for old_field in old_only {
        let candidate = remaining_new
            .iter()
            .position(|candidate| same_attributes(old_field, candidate));
        match candidate {
            Some(index) => {
                let new_field = remaining_new.remove(index);
                renamed.push((old_field.clone(), new_field.clone()));
            }
            None => dropped.push(old_field.clone()),
        }
    }

    added.extend(remaining_new.into_iter().cloned());

    FieldDiff {
        added,
        dropped,
        renamed,
        adjusted,
    }
}
