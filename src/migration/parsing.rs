//! Migration file discovery (spec §4.7): `migration-<NNNN>.ron` files in a
//! directory, sorted by their zero-padded number.

use crate::error::{Error, Result};
use std::path::{Path, PathBuf};

const PREFIX: &str = "migration-";
const EXTENSION: &str = "ron";

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct MigrationFile {
    pub number: u32,
    pub path: PathBuf,
}

/// List every migration file in `dir`, sorted ascending by number.
pub fn discover_migrations(dir: &Path) -> Result<Vec<MigrationFile>> {
    let mut found = Vec::new();
    let entries = std::fs::read_dir(dir).map_err(|e| Error::InvalidFieldValue {
        field: "migrations_dir".to_string(),
        reason: format!("failed to read {}: {e}", dir.display()),
    })?;

    for entry in entries {
        let entry = entry.map_err(|e| Error::InvalidFieldValue {
            field: "migrations_dir".to_string(),
            reason: e.to_string(),
        })?;
        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()) != Some(EXTENSION) {
            continue;
        }
        if let Some(number) = parse_migration_number(&path) {
            found.push(MigrationFile { number, path });
        }
    }

    found.sort();
    Ok(found)
}

fn parse_migration_number(path: &Path) -> Option<u32> {
    let stem = path.file_stem()?.to_str()?;
    let digits = stem.strip_prefix(PREFIX)?;
    digits.parse().ok()
}

/// `migration-<NNNN>.ron`, zero-padded to 4 digits (more digits are never
/// truncated, just not zero-padded further).
pub fn migration_file_name(number: u32) -> String {
    format!("{PREFIX}{number:04}.{EXTENSION}")
}

pub fn sql_sidecar_name(number: u32) -> String {
    format!("{PREFIX}{number:04}.sql")
}

pub fn next_migration_number(existing: &[MigrationFile]) -> u32 {
    existing.iter().map(|m| m.number).max().map_or(1, |n| n + 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_number_from_file_name() {
        let path = Path::new("/tmp/migrations/migration-0007.ron");
        assert_eq!(parse_migration_number(path), Some(7));
    }

    #[test]
    fn ignores_non_matching_files() {
        let path = Path::new("/tmp/migrations/notes.txt");
        assert_eq!(parse_migration_number(path), None);
    }

    #[test]
    fn discovers_and_sorts_migrations() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["migration-0002.ron", "migration-0001.ron", "migration-0010.ron"] {
            std::fs::write(dir.path().join(name), "[]").unwrap();
        }
        let found = discover_migrations(dir.path()).unwrap();
        let numbers: Vec<u32> = found.iter().map(|m| m.number).collect();
        assert_eq!(numbers, vec![1, 2, 10]);
    }

    #[test]
    fn next_number_continues_the_sequence() {
        let existing = vec![
            MigrationFile { number: 1, path: PathBuf::new() },
            MigrationFile { number: 3, path: PathBuf::new() },
        ];
        assert_eq!(next_migration_number(&existing), 4);
    }

    #[test]
    fn next_number_starts_at_one() {
        assert_eq!(next_migration_number(&[]), 1);
    }
}
