//! The temp-table rewrite (spec §4.6 step 6): used whenever a model-level
//! change SQLite cannot apply in place (an adjusted field attribute, or an
//! `idPrefix` change). Builds the full `create` → `copy` → `rename fields`
//! → `drop` → `rename model` sequence as IR queries.

use crate::catalog::model::{Field, Model, ModelInput};
use crate::ir::{AlterOp, CreateOp, DropOp, FieldPatch, ModelPatch, Query};

const TEMP_PREFIX: &str = "RONIN_TEMP_";

/// `field_renames` are `(old_slug, new_slug)` pairs to apply inside the
/// temp model once rows have been copied across.
pub fn rewrite_via_temp_table(old: &Model, new: &Model, field_renames: &[(String, String)]) -> Vec<Query> {
    let temp_slug = format!("{TEMP_PREFIX}{}", new.slug);
    let temp_plural_slug = format!("{TEMP_PREFIX}{}", new.plural_slug);
    let temp_table = crate::catalog::normalize::snake_case(&temp_plural_slug);

    let temp_input = ModelInput {
        id: None,
        slug: temp_slug.clone(),
        plural_slug: Some(temp_plural_slug),
        name: Some(temp_slug.clone()),
        plural_name: None,
        id_prefix: Some(new.id_prefix.clone()),
        table: None,
        identifiers: None,
        fields: new.fields.clone(),
        indexes: Default::default(),
        presets: Default::default(),
        system: new.system.clone(),
    };

    let mut queries = vec![Query::Create(CreateOp::Model(temp_input))];

    // Copy surviving rows verbatim; columns that only exist in the new
    // shape start out NULL/defaulted and are backfilled by the caller if
    // needed (spec §4.6 step 6.2 "copy rows, optionally projecting only
    // surviving fields").
    queries.push(Query::Sql {
        text: format!(
            "INSERT INTO {} SELECT * FROM {};",
            crate::render::quote_ident(&temp_table),
            crate::render::quote_ident(&old.table),
        ),
        params: Vec::new(),
    });

    for (old_slug, new_slug) in field_renames {
        queries.push(Query::Alter(AlterOp::FieldTo {
            model: temp_slug.clone(),
            field: old_slug.clone(),
            to: FieldPatch {
                slug: Some(new_slug.clone()),
            },
        }));
    }

    queries.push(Query::Drop(DropOp::Model(old.slug.clone())));

    queries.push(Query::Alter(AlterOp::ModelTo {
        model: temp_slug,
        to: ModelPatch {
            slug: Some(new.slug.clone()),
            name: Some(new.name.clone()),
            plural_name: Some(new.plural_name.clone()),
            plural_slug: Some(new.plural_slug.clone()),
        },
    }));

    queries
}

/// Whether an `adjusted` field diff (or an `idPrefix` change) forces the
/// full rewrite rather than plain `alter.field`/`alter.model` statements.
pub fn needs_rewrite(adjusted: &[(Field, Field)], id_prefix_changed: bool) -> bool {
    id_prefix_changed || !adjusted.is_empty()
}
