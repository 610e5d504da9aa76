//! Migration persistence and discovery (spec §4.7, component C7).

pub mod parsing;
pub mod protocol;

use crate::catalog::Catalogue;
use crate::error::Result;
use crate::ir::Query;
use std::path::Path;

/// A migration loaded from disk: its sequence number and the `Vec<Query>`
/// it carries.
#[derive(Debug, Clone)]
pub struct Migration {
    pub number: u32,
    pub queries: Vec<Query>,
}

/// Load every migration file in `dir`, in application order.
pub fn load_all(dir: &Path) -> Result<Vec<Migration>> {
    parsing::discover_migrations(dir)?
        .into_iter()
        .map(|file| {
            protocol::load(&file.path).map(|queries| Migration {
                number: file.number,
                queries,
            })
        })
        .collect()
}

/// Write the next migration file (and its `.sql` sidecar) in `dir`.
pub fn write_next(dir: &Path, catalogue: &Catalogue, queries: &[Query]) -> Result<Migration> {
    let existing = parsing::discover_migrations(dir)?;
    let number = parsing::next_migration_number(&existing);
    let ron_path = dir.join(parsing::migration_file_name(number));
    let sql_path = dir.join(parsing::sql_sidecar_name(number));
    protocol::persist_with_sidecar(catalogue, queries, &ron_path, &sql_path)?;
    Ok(Migration {
        number,
        queries: queries.to_vec(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::model::ModelInput;
    use crate::ir::{CreateOp, DropOp};

    #[test]
    fn writes_and_reloads_a_migration() {
        let dir = tempfile::tempdir().unwrap();
        let catalogue = Catalogue::new(vec![ModelInput {
            slug: "account".to_string(),
            ..Default::default()
        }])
        .unwrap();
        let queries = vec![Query::Drop(DropOp::Model("account".to_string()))];

        let written = write_next(dir.path(), &catalogue, &queries).unwrap();
        assert_eq!(written.number, 1);

        let loaded = load_all(dir.path()).unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].queries, queries);
        let _ = CreateOp::Model(ModelInput::default());
    }
}
