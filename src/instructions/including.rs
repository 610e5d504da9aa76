//! `including` → one `LEFT JOIN`/`CROSS JOIN` per mounted sub-query (spec
//! §4.3 "including"). The sub-query itself is compiled recursively through
//! [`crate::compiler::compile_include`]; this module only shapes the join.

use crate::catalog::Catalogue;
use crate::compiler::scope::Scope;
use crate::error::Result;
use crate::ir::{IncludeEntry, JoinKind};
use crate::params::ParamSink;

/// One compiled `including` entry: the join clause to splice after `FROM`,
/// and the metadata the transaction needs to mount its rows back onto the
/// parent record at `mounting_path`.
pub struct CompiledInclude {
    pub mounting_path: String,
    pub alias: String,
    pub singular: bool,
    pub join_sql: String,
    /// The bare column labels the subselect's own `SELECT` list projects,
    /// so the outer query can pull them back out of the joined derived
    /// table and re-mount them under `"{mounting_path}.{label}"`.
    pub projected_labels: Vec<String>,
}

pub fn render_includes(
    catalogue: &Catalogue,
    scope: &Scope,
    sink: &mut ParamSink,
    entries: &[IncludeEntry],
) -> Result<Vec<CompiledInclude>> {
    let mut compiled = Vec::with_capacity(entries.len());
    for (i, entry) in entries.iter().enumerate() {
        compiled.push(render_one(catalogue, scope, sink, entry, i)?);
    }
    Ok(compiled)
}

fn render_one(
    catalogue: &Catalogue,
    scope: &Scope,
    sink: &mut ParamSink,
    entry: &IncludeEntry,
    index: usize,
) -> Result<CompiledInclude> {
    let alias = format!("including_{}", sanitize_alias(&entry.mounting_path, index));

    let (join_model, join_kind, subselect, projected_labels) =
        crate::compiler::compile_include(catalogue, scope, sink, entry, &alias)?;

    let join_sql = match join_kind {
        JoinKind::Cross => format!(
            "CROSS JOIN ({subselect}) AS {alias_quoted}",
            alias_quoted = crate::render::quote_ident(&alias),
        ),
        JoinKind::Left(condition) => {
            let child_scope = Scope {
                model: &join_model,
                alias: Some(&alias),
                parent: Some(scope),
            };
            let on_clause = crate::instructions::with::compose_conditions(catalogue, &child_scope, sink, &condition)?;
            format!(
                "LEFT JOIN ({subselect}) AS {alias_quoted} ON {on_clause}",
                alias_quoted = crate::render::quote_ident(&alias),
            )
        }
    };

    Ok(CompiledInclude {
        mounting_path: entry.mounting_path.clone(),
        alias,
        singular: entry.singular,
        join_sql,
        projected_labels,
    })
}

/// `including_<mounting-path>` with the path's dots folded to underscores,
/// de-duplicated by position when two mounts share a path prefix.
fn sanitize_alias(mounting_path: &str, index: usize) -> String {
    let base: String = mounting_path
        .chars()
        .map(|c| if c == '.' { '_' } else { c })
        .collect();
    format!("{base}_{index}")
}
