//! Shared SQL-text rendering helpers (spec §6 "SQL dialect: SQLite").
//!
//! Mirrors the teacher's `render::quote_ident`/`escape_string` plus one
//! `render_*` function per statement shape, composed by the compiler and
//! the migration-protocol SQL sidecar.

pub mod ddl;
pub mod value;

pub fn quote_ident(ident: &str) -> String {
    format!("\"{}\"", ident.replace('"', "\"\""))
}

pub fn escape_string(s: &str) -> String {
    format!("'{}'", s.replace('\'', "''"))
}
