//! DDL rendering for `create`/`alter`/`drop` queries (spec §4.4, §6).
//!
//! One `render_*` function per statement shape, mirroring the teacher's
//! `render/sql/table.rs` layout.

use crate::catalog::model::{Field, Index, Model};
use crate::render::quote_ident;
use crate::render::value::{render_default_clause, sqlite_type};

pub fn render_column_def(model: &Model, field: &Field) -> String {
    let mut def = format!(
        "{} {}",
        quote_ident(&field.slug),
        sqlite_type(field.r#type)
    );

    if field.slug == "id" {
        def.push_str(" PRIMARY KEY");
    }

    if let Some(default) = &field.default_value {
        def.push_str(&format!(
            " DEFAULT {}",
            render_default_clause(&field.slug, &model.id_prefix, default)
        ));
    } else if field.slug == "id" {
        def.push_str(&format!(
            " DEFAULT {}",
            render_default_clause(
                "id",
                &model.id_prefix,
                &crate::catalog::model::DefaultValue::Literal(serde_json::Value::Null)
            )
        ));
    }

    if field.required && field.slug != "id" {
        def.push_str(" NOT NULL");
    }

    if field.unique && field.slug != "id" {
        def.push_str(" UNIQUE");
    }

    def
}

/// `CREATE TABLE "<table>" (...)`.
pub fn render_create_table(model: &Model) -> String {
    let mut sql = String::new();
    sql.push_str("CREATE TABLE ");
    sql.push_str(&quote_ident(&model.table));
    sql.push_str(" (\n");

    let defs: Vec<String> = model
        .ordered_fields()
        .into_iter()
        .map(|f| format!("    {}", render_column_def(model, f)))
        .collect();

    sql.push_str(&defs.join(",\n"));
    sql.push_str("\n);");
    sql
}

pub fn render_drop_table(model: &Model) -> String {
    format!("DROP TABLE {};", quote_ident(&model.table))
}

pub fn render_rename_table(old_table: &str, new_table: &str) -> String {
    format!(
        "ALTER TABLE {} RENAME TO {};",
        quote_ident(old_table),
        quote_ident(new_table)
    )
}

pub fn render_add_column(model: &Model, field: &Field) -> String {
    format!(
        "ALTER TABLE {} ADD COLUMN {};",
        quote_ident(&model.table),
        render_column_def(model, field)
    )
}

pub fn render_drop_column(table: &str, field_slug: &str) -> String {
    format!(
        "ALTER TABLE {} DROP COLUMN {};",
        quote_ident(table),
        quote_ident(field_slug)
    )
}

pub fn render_rename_column(table: &str, old_slug: &str, new_slug: &str) -> String {
    format!(
        "ALTER TABLE {} RENAME COLUMN {} TO {};",
        quote_ident(table),
        quote_ident(old_slug),
        quote_ident(new_slug)
    )
}

pub fn render_create_index(table: &str, index: &Index) -> String {
    let unique = if index.unique { "UNIQUE " } else { "" };
    let cols: Vec<String> = index
        .fields
        .iter()
        .map(|f| {
            let dir = match f.order {
                crate::catalog::model::IndexOrder::Asc => "ASC",
                crate::catalog::model::IndexOrder::Desc => "DESC",
            };
            format!("{} {}", quote_ident(&f.field), dir)
        })
        .collect();
    format!(
        "CREATE {unique}INDEX {} ON {} ({});",
        quote_ident(&index.slug),
        quote_ident(table),
        cols.join(", ")
    )
}

pub fn render_drop_index(index_slug: &str) -> String {
    format!("DROP INDEX {};", quote_ident(index_slug))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::model::ModelInput;
    use crate::catalog::normalize_model;

    #[test]
    fn renders_basic_table() {
        let model = normalize_model(&ModelInput {
            slug: "account".to_string(),
            ..Default::default()
        });
        let sql = render_create_table(&model);
        assert!(sql.starts_with("CREATE TABLE \"accounts\" (\n"));
        assert!(sql.contains("\"id\" TEXT PRIMARY KEY"));
        assert!(sql.ends_with("\n);"));
    }
}
