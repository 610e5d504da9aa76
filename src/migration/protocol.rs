//! Migration file persistence (spec §4.7): each migration is a `Vec<Query>`
//! serialised as `ron` text (version-control friendly, unlike a binary
//! blob), with an optional `.sql` sidecar rendered by compiling the same
//! queries against the model set they apply to.

use crate::catalog::Catalogue;
use crate::compiler::{self, Compiled};
use crate::error::{Error, Result};
use crate::ir::{CreateOp, Query};
use crate::params::BindOptions;
use ron::ser::PrettyConfig;
use std::borrow::Cow;
use std::path::Path;

pub fn persist(queries: &[Query], path: &Path) -> Result<()> {
    let pretty = PrettyConfig::default();
    let text = ron::ser::to_string_pretty(&queries, pretty).map_err(|e| Error::InvalidFieldValue {
        field: "migration".to_string(),
        reason: format!("failed to serialise migration: {e}"),
    })?;
    std::fs::write(path, text).map_err(|e| Error::InvalidFieldValue {
        field: "migration".to_string(),
        reason: format!("failed to write migration file {}: {e}", path.display()),
    })
}

pub fn load(path: &Path) -> Result<Vec<Query>> {
    let text = std::fs::read_to_string(path).map_err(|e| Error::InvalidFieldValue {
        field: "migration".to_string(),
        reason: format!("failed to read migration file {}: {e}", path.display()),
    })?;
    ron::from_str(&text).map_err(|e| Error::InvalidFieldValue {
        field: "migration".to_string(),
        reason: format!("failed to parse migration file {}: {e}", path.display()),
    })
}

/// Render a `.sql` sidecar by compiling each query against `catalogue`
/// (the model set the migration is meant to apply to) with inline
/// parameter binding, so the sidecar reads as plain, copy-pasteable SQL.
///
/// A temp-table rewrite (spec §4.6 step 6) creates a scratch model that
/// exists only for the lifetime of the migration's own queries, so a
/// `Create` for a slug `catalogue` doesn't already know about is folded in
/// before compiling the rest — mirroring how the migration would actually
/// apply, step by step.
pub fn render_sql_sidecar(catalogue: &Catalogue, queries: &[Query]) -> Result<String> {
    let opts = BindOptions { inline: true };
    let mut out = String::new();
    let mut working: Cow<Catalogue> = Cow::Borrowed(catalogue);
    for query in queries {
        if let Query::Create(CreateOp::Model(input)) = query
            && catalogue.get(&input.slug).is_err()
        {
            working = Cow::Owned(working.with_extra_model(input));
        }
        match compiler::compile(&working, query, opts)? {
            Compiled::Statement(stmt) => {
                out.push_str(&stmt.sql);
                if !stmt.sql.ends_with(';') {
                    out.push(';');
                }
                out.push('\n');
            }
            Compiled::Batch(items) => {
                for item in items {
                    if let Compiled::Statement(stmt) = item {
                        out.push_str(&stmt.sql);
                        out.push('\n');
                    }
                }
            }
            Compiled::Models(_) => {}
        }
    }
    Ok(out)
}

pub fn persist_with_sidecar(catalogue: &Catalogue, queries: &[Query], ron_path: &Path, sql_path: &Path) -> Result<()> {
    persist(queries, ron_path)?;
    let sql = render_sql_sidecar(catalogue, queries)?;
    std::fs::write(sql_path, sql).map_err(|e| Error::InvalidFieldValue {
        field: "migration".to_string(),
        reason: format!("failed to write sql sidecar {}: {e}", sql_path.display()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::model::ModelInput;
    use crate::ir::{CreateOp, DropOp};

    #[test]
    fn round_trips_through_ron() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("migration-0001.ron");
        let queries = vec![Query::Drop(DropOp::Model("account".to_string()))];
        persist(&queries, &path).unwrap();
        let loaded = load(&path).unwrap();
        assert_eq!(loaded, queries);
    }

    #[test]
    fn sidecar_renders_create_table() {
        let catalogue = Catalogue::new(vec![]).unwrap();
        let model = ModelInput {
            slug: "account".to_string(),
            ..Default::default()
        };
        let queries = vec![Query::Create(CreateOp::Model(model))];
        let sql = render_sql_sidecar(&catalogue, &queries).unwrap();
        assert!(sql.contains("CREATE TABLE"));
    }
}
