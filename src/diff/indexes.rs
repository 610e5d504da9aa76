//! Index diff within one common model (spec §4.6 step 7). Indexes present
//! on both sides and JSON-equal are kept; anything else drops and
//! recreates. Emitted last by [`crate::diff::diff_all`] so index ops
//! always apply to the model's final shape.

use crate::catalog::model::Index;

pub struct IndexDiff {
    pub created: Vec<Index>,
    pub dropped: Vec<Index>,
}

pub fn diff_indexes(old: &[&Index], new: &[&Index]) -> IndexDiff {
    let mut created = Vec::new();
    let mut dropped = Vec::new();

    for new_index in new {
        match old.iter().find(|i| i.slug == new_index.slug) {
            Some(old_index) if *old_index == *new_index => {}
            Some(_) => {
                dropped.push((*new_index).clone());
                created.push((*new_index).clone());
            }
            None => created.push((*new_index).clone()),
        }
    }

    for old_index in old {
        if !new.iter().any(|i| i.slug == old_index.slug) {
            dropped.push((*old_index).clone());
        }
    }

    IndexDiff { created, dropped }
}
