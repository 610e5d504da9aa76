//! The migration diff engine (spec §4.6, component C6): compares two model
//! lists and produces a deterministic, ordered `Vec<Query>` that migrates
//! `existing` to `defined`. Mirrors the teacher's `diff::diff_all`
//! orchestration: per-kind comparisons, flattened and ordered, with index
//! ops always emitted last.

pub mod fields;
pub mod indexes;
pub mod models;
pub mod ordering;
pub mod temp_table;

use crate::catalog::Catalogue;
use crate::catalog::model::Model;
use crate::error::Result;
use crate::ir::{AlterOp, CreateOp, DropOp, FieldPatch, ModelPatch, Query};

/// A model rename the engine inferred by matching field-slug sets (spec
/// §4.6 step 1). The core only proposes candidates; applying one is a
/// caller decision via [`RenameResolver`].
#[derive(Debug, Clone)]
pub struct RenameCandidate {
    pub from: String,
    pub to: String,
}

pub trait RenameResolver {
    fn confirm(&self, candidate: &RenameCandidate) -> bool;
}

/// Always accepts inferred renames — the non-interactive/test path.
pub struct AutoRename;
impl RenameResolver for AutoRename {
    fn confirm(&self, _candidate: &RenameCandidate) -> bool {
        true
    }
}

/// Always rejects inferred renames, falling back to drop+create.
pub struct NoRename;
impl RenameResolver for NoRename {
    fn confirm(&self, _candidate: &RenameCandidate) -> bool {
        false
    }
}

/// Convenience entry point: diff with renames always auto-confirmed.
pub fn diff_all(existing: &Catalogue, defined: &Catalogue) -> Result<Vec<Query>> {
    diff_with_candidates(existing, defined, &AutoRename)
}

pub fn diff_with_candidates(
    existing: &Catalogue,
    defined: &Catalogue,
    resolver: &dyn RenameResolver,
) -> Result<Vec<Query>> {
    let model_diff = models::diff_models(existing.models(), defined.models());

    let mut renames = Vec::new();
    let mut fallback_adds = Vec::new();
    let mut fallback_drops = Vec::new();
    for (from, to) in model_diff.renamed {
        let candidate = RenameCandidate {
            from: from.slug.clone(),
            to: to.slug.clone(),
        };
        if resolver.confirm(&candidate) {
            renames.push((from, to));
        } else {
            fallback_drops.push(from);
            fallback_adds.push(to);
        }
    }

    let added: Vec<&Model> = model_diff.added.into_iter().chain(fallback_adds).collect();
    let dropped: Vec<&Model> = model_diff.dropped.into_iter().chain(fallback_drops).collect();

    let mut creates = Vec::new();
    for model in ordering::order_for_creation(defined, &added)? {
        creates.push(Query::Create(CreateOp::Model(model_to_input(model))));
        for index in model.indexes.values() {
            creates.push(Query::Create(CreateOp::Index {
                model: model.slug.clone(),
                index: index.clone(),
            }));
        }
    }

    let mut drops = Vec::new();
    for model in ordering::order_for_deletion(existing, &dropped)? {
        drops.push(Query::Drop(DropOp::Model(model.slug.clone())));
    }

    let mut rename_queries = Vec::new();
    for (from, to) in &renames {
        rename_queries.push(Query::Alter(AlterOp::ModelTo {
            model: from.slug.clone(),
            to: ModelPatch {
                slug: Some(to.slug.clone()),
                name: Some(to.name.clone()),
                plural_name: Some(to.plural_name.clone()),
                plural_slug: Some(to.plural_slug.clone()),
            },
        }));
    }

    let mut field_queries = Vec::new();
    let mut index_queries = Vec::new();
    let mut rewrite_queries = Vec::new();

    let common_pairs: Vec<(&Model, &Model)> = model_diff
        .unchanged
        .into_iter()
        .chain(renames.iter().map(|(from, to)| (*from, *to)))
        .collect();

    for (old, new) in common_pairs {
        let id_prefix_changed = old.id_prefix != new.id_prefix;

        let old_fields: Vec<&crate::catalog::model::Field> = old.user_fields();
        let new_fields: Vec<&crate::catalog::model::Field> = new.user_fields();
        let field_diff = fields::diff_fields(&old_fields, &new_fields);

        if temp_table::needs_rewrite(&field_diff.adjusted, id_prefix_changed) {
            let field_renames: Vec<(String, String)> = field_diff
                .renamed
                .iter()
                .map(|(f, t)| (f.slug.clone(), t.slug.clone()))
                .collect();
            rewrite_queries.extend(temp_table::rewrite_via_temp_table(old, new, &field_renames));
        } else {
            // `name`/`pluralName` are catalogue-level display labels with no
            // SQL representation (see `render::ddl`) - nothing to migrate.
            for field in &field_diff.added {
                field_queries.push(Query::Alter(AlterOp::CreateField {
                    model: new.slug.clone(),
                    field: field.clone(),
                }));
            }
            for field in &field_diff.dropped {
                field_queries.push(Query::Alter(AlterOp::DropField {
                    model: new.slug.clone(),
                    field: field.slug.clone(),
                }));
            }
            for (from, to) in &field_diff.renamed {
                field_queries.push(Query::Alter(AlterOp::FieldTo {
                    model: new.slug.clone(),
                    field: from.slug.clone(),
                    to: FieldPatch {
                        slug: Some(to.slug.clone()),
                    },
                }));
            }
        }

        let old_indexes: Vec<&crate::catalog::model::Index> = old.indexes.values().collect();
        let new_indexes: Vec<&crate::catalog::model::Index> = new.indexes.values().collect();
        let index_diff = indexes::diff_indexes(&old_indexes, &new_indexes);
        for index in index_diff.dropped {
            index_queries.push(Query::Alter(AlterOp::DropIndex {
                model: new.slug.clone(),
                index: index.slug,
            }));
        }
        for index in index_diff.created {
            index_queries.push(Query::Alter(AlterOp::CreateIndex {
                model: new.slug.clone(),
                index,
            }));
        }
    }

    let mut out = Vec::new();
    out.extend(rename_queries);
    out.extend(creates);
    out.extend(drops);
    out.extend(rewrite_queries);
    out.extend(field_queries);
    out.extend(index_queries);
    Ok(out)
}

fn model_to_input(model: &Model) -> crate::catalog::model::ModelInput {
    crate::catalog::model::ModelInput {
        id: Some(model.id.clone()),
        slug: model.slug.clone(),
        plural_slug: Some(model.plural_slug.clone()),
        name: Some(model.name.clone()),
        plural_name: Some(model.plural_name.clone()),
        id_prefix: Some(model.id_prefix.clone()),
        table: Some(model.table.clone()),
        identifiers: Some(model.identifiers.clone()),
        fields: model.fields.clone(),
        indexes: Default::default(),
        presets: model.presets.clone(),
        system: model.system.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::model::{Field, FieldType, ModelInput};

    #[test]
    fn adds_new_model() {
        let existing = Catalogue::new(vec![]).unwrap();
        let defined = Catalogue::new(vec![ModelInput {
            slug: "account".to_string(),
            ..Default::default()
        }])
        .unwrap();
        let queries = diff_all(&existing, &defined).unwrap();
        assert!(queries.iter().any(|q| matches!(q, Query::Create(CreateOp::Model(m)) if m.slug == "account")));
    }

    #[test]
    fn drops_removed_model() {
        let existing = Catalogue::new(vec![ModelInput {
            slug: "account".to_string(),
            ..Default::default()
        }])
        .unwrap();
        let defined = Catalogue::new(vec![]).unwrap();
        let queries = diff_all(&existing, &defined).unwrap();
        assert!(queries.iter().any(|q| matches!(q, Query::Drop(DropOp::Model(slug)) if slug == "account")));
    }

    #[test]
    fn adding_field_emits_create_field() {
        let existing = Catalogue::new(vec![ModelInput {
            slug: "account".to_string(),
            ..Default::default()
        }])
        .unwrap();
        let mut with_field = ModelInput {
            slug: "account".to_string(),
            ..Default::default()
        };
        with_field.fields.insert("email".to_string(), Field::new("email", FieldType::String));
        let defined = Catalogue::new(vec![with_field]).unwrap();

        let queries = diff_all(&existing, &defined).unwrap();
        assert!(queries.iter().any(|q| matches!(
            q,
            Query::Alter(AlterOp::CreateField { field, .. }) if field.slug == "email"
        )));
    }
}
