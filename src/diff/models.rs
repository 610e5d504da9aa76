//! Model-level diff: rename detection, then add/drop by slug difference
//! (spec §4.6 steps 1-2). Mirrors the teacher's table-diff shape: compute
//! the three sets (renamed, added, dropped) before touching fields.

use crate::catalog::model::Model;
use std::collections::HashSet;

pub struct ModelDiff<'a> {
    pub renamed: Vec<(&'a Model, &'a Model)>,
    pub added: Vec<&'a Model>,
    pub dropped: Vec<&'a Model>,
    /// Present on both sides under the same slug; still needs a field/index
    /// diff pass.
    pub unchanged: Vec<(&'a Model, &'a Model)>,
}

fn user_field_signature(model: &Model) -> HashSet<&str> {
    model.user_fields().iter().map(|f| f.slug.as_str()).collect()
}

/// A model present only in `new` is considered a rename of a model present
/// only in `old` when their user-field-slug sets are identical (spec §4.6
/// "rename detection via matching field-slug sets"). Ties (more than one
/// candidate) are resolved by declaration order, first match wins — the
/// caller is expected to disambiguate with an explicit `alter.model.to`
/// when that's wrong.
pub fn diff_models<'a>(old: &'a [Model], new: &'a [Model]) -> ModelDiff<'a> {
    let mut unchanged = Vec::new();
    let mut old_only: Vec<&Model> = Vec::new();
    let mut new_only: Vec<&Model> = Vec::new();

    for old_model in old {
        match new.iter().find(|m| m.slug == old_model.slug) {
            Some(new_model) => unchanged.push((old_model, new_model)),
            None => old_only.push(old_model),
        }
    }
    for new_model in new {
        if !old.iter().any(|m| m.slug == new_model.slug) {
            new_only.push(new_model);
        }
    }

    let mut renamed = Vec::new();
    let mut dropped = Vec::new();
    let mut added: Vec<&Model> = new_only;

    for old_model in old_only {
        let signature = user_field_signature(old_model);
        let candidate_index = added
            .iter()
            .position(|candidate| user_field_signature(candidate) == signature);
        match candidate_index {
            Some(index) => {
                let new_model = added.remove(index);
                renamed.push((old_model, new_model));
            }
            None => dropped.push(old_model),
        }
    }

    ModelDiff {
        renamed,
        added,
        dropped,
        unchanged,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Catalogue;
    use crate::catalog::model::{Field, FieldType, ModelInput};

    fn model(slug: &str, extra_field: Option<&str>) -> ModelInput {
        let mut input = ModelInput {
            slug: slug.to_string(),
            ..Default::default()
        };
        if let Some(field) = extra_field {
            input.fields.insert(field.to_string(), Field::new(field, FieldType::String));
        }
        input
    }

    #[test]
    fn detects_rename_by_matching_field_set() {
        let old = Catalogue::new(vec![model("post", Some("title"))]).unwrap();
        let new = Catalogue::new(vec![model("article", Some("title"))]).unwrap();
        let diff = diff_models(old.models(), new.models());
        assert_eq!(diff.renamed.len(), 1);
        assert_eq!(diff.renamed[0].0.slug, "post");
        assert_eq!(diff.renamed[0].1.slug, "article");
        assert!(diff.added.is_empty());
        assert!(diff.dropped.is_empty());
    }

    #[test]
    fn unrelated_field_sets_are_add_and_drop() {
        let old = Catalogue::new(vec![model("post", Some("title"))]).unwrap();
        let new = Catalogue::new(vec![model("comment", Some("body"))]).unwrap();
        let diff = diff_models(old.models(), new.models());
        assert!(diff.renamed.is_empty());
        assert_eq!(diff.added.len(), 1);
        assert_eq!(diff.dropped.len(), 1);
    }
}
