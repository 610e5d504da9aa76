//! The query compiler (spec §4.4, component C4): dispatches each IR
//! [`Query`] variant to the instruction handlers under [`crate::instructions`]
//! and renders a parameterised SQL statement, or for `create`/`alter`/`drop`,
//! a direct DDL statement.

pub mod scope;
pub mod values;

use crate::catalog::Catalogue;
use crate::catalog::model::{Field, Index, Model};
use crate::error::{Error, Result};
use crate::instructions::{including, limited_to, ordered_by, pagination, selecting, to, with};
use crate::ir::{AlterOp, CreateOp, DropOp, IncludeEntry, JoinKind, LimitedTo, Query, QueryPayload, Target};
use crate::params::{BindOptions, ParamSink};
use crate::render::quote_ident;
use crate::value::Value;
use itertools::Itertools;
use scope::Scope;
use std::borrow::Cow;

/// Splice any `using` presets into `payload.instructions` before rendering
/// (spec §4.3 "using"). Borrows the payload unchanged when there's nothing
/// to splice.
fn resolve_using<'a>(catalogue: &Catalogue, model: &Model, payload: &'a QueryPayload) -> Result<Cow<'a, QueryPayload>> {
    match &payload.instructions.using {
        None => Ok(Cow::Borrowed(payload)),
        Some(entries) => {
            let entries = entries.clone();
            let mut instructions = payload.instructions.clone();
            instructions.using = None;
            crate::instructions::using::apply_using(catalogue, model, &mut instructions, &entries)?;
            Ok(Cow::Owned(QueryPayload {
                target: payload.target.clone(),
                instructions,
            }))
        }
    }
}

/// How the transaction layer should turn the driver's rows back into a
/// `ronin` result shape (spec §5, component C5).
#[derive(Debug, Clone)]
pub enum Inflation {
    Amount,
    Singular {
        model: String,
        includes: Vec<IncludeMeta>,
    },
    Plural {
        model: String,
        page_size: u32,
        includes: Vec<IncludeMeta>,
    },
    Raw,
}

#[derive(Debug, Clone)]
pub struct IncludeMeta {
    pub mounting_path: String,
    pub alias: String,
    pub singular: bool,
}

#[derive(Debug, Clone)]
pub struct CompiledStatement {
    pub sql: String,
    pub params: Vec<Value>,
    pub inflation: Inflation,
}

/// The result of compiling one IR query: either one statement, the
/// in-memory model list for `list.models`, or a sequence for `batch`.
#[derive(Debug, Clone)]
pub enum Compiled {
    Statement(CompiledStatement),
    Models(Vec<Model>),
    Batch(Vec<Compiled>),
}

pub fn compile(catalogue: &Catalogue, query: &Query, opts: BindOptions) -> Result<Compiled> {
    match query {
        Query::Get(payload) if payload.target == Target::All => compile_all(catalogue, payload, opts, compile_get),
        Query::Count(payload) if payload.target == Target::All => compile_all(catalogue, payload, opts, compile_count),
        Query::Get(payload) => compile_get(catalogue, payload, opts).map(Compiled::Statement),
        Query::Count(payload) => compile_count(catalogue, payload, opts).map(Compiled::Statement),
        Query::Add(payload) => compile_add(catalogue, payload, opts).map(Compiled::Statement),
        Query::Set(payload) => compile_set(catalogue, payload, opts).map(Compiled::Statement),
        Query::Remove(payload) => compile_remove(catalogue, payload, opts).map(Compiled::Statement),
        Query::ListModels => Ok(Compiled::Models(catalogue.models().to_vec())),
        Query::Create(op) => compile_create(catalogue, op).map(Compiled::Statement),
        Query::Alter(op) => compile_alter(catalogue, op).map(Compiled::Statement),
        Query::Drop(op) => compile_drop(catalogue, op).map(Compiled::Statement),
        Query::Batch(queries) => queries
            .iter()
            .map(|q| compile(catalogue, q, opts))
            .collect::<Result<Vec<_>>>()
            .map(Compiled::Batch),
        Query::Sql { text, params } => Ok(Compiled::Statement(CompiledStatement {
            sql: text.clone(),
            params: params.clone(),
            inflation: Inflation::Raw,
        })),
    }
}

fn target_model<'a>(catalogue: &'a Catalogue, target: &Target) -> Result<&'a Model> {
    match target {
        Target::Singular(slug) | Target::Plural(slug) => catalogue.get(slug),
        Target::All => Err(Error::ModelNotFound {
            slug: "*".to_string(),
        }),
    }
}

/// Expand a `get all`/`count all` into one statement per model, in
/// catalogue order (spec §4.4, §5 ordering guarantees). Associative models
/// are internal join tables, not things a caller queries directly, so they
/// sit out of the expansion.
fn compile_all(
    catalogue: &Catalogue,
    payload: &QueryPayload,
    opts: BindOptions,
    compile_one: fn(&Catalogue, &QueryPayload, BindOptions) -> Result<CompiledStatement>,
) -> Result<Compiled> {
    let mut items = Vec::new();
    for model in catalogue.models().iter().filter(|m| !m.is_associative()) {
        let per_model = QueryPayload {
            target: Target::Plural(model.slug.clone()),
            instructions: payload.instructions.clone(),
        };
        items.push(Compiled::Statement(compile_one(catalogue, &per_model, opts)?));
    }
    Ok(Compiled::Batch(items))
}

/// Render the shared `SELECT ... FROM ... [joins]` body. `is_root`
/// controls whether `with`/pagination apply as `WHERE` (a nested
/// `including` subquery's `with` is consumed separately as its `JOIN ON`).
/// Returns the SQL text, the compiled joins, and the bare (unprefixed)
/// column labels this body's own `SELECT` list projects - the labels a
/// *parent* query re-mounts under `{mountingPath}.{label}` once this body
/// is itself wrapped as an `including` subquery.
fn render_select_body(
    catalogue: &Catalogue,
    scope: &Scope,
    sink: &mut ParamSink,
    payload: &QueryPayload,
    is_root: bool,
) -> Result<(String, Vec<including::CompiledInclude>, Vec<String>)> {
    let projections = selecting::render_selection(catalogue, scope, payload.instructions.selecting.as_deref())?;
    let own_labels: Vec<String> = projections.iter().map(|p| p.slug.clone()).collect();
    let mut proj_parts: Vec<String> = projections
        .iter()
        .map(|p| format!("{} AS {}", p.selector_sql, quote_ident(&p.slug)))
        .collect();

    let mut from_sql = format!("FROM {}", quote_ident(&scope.model.table));
    let includes = match &payload.instructions.including {
        Some(list) => including::render_includes(catalogue, scope, sink, list)?,
        None => Vec::new(),
    };
    for include in &includes {
        from_sql.push(' ');
        from_sql.push_str(&include.join_sql);
        for label in &include.projected_labels {
            let mounted = format!("{}.{label}", include.mounting_path);
            proj_parts.push(format!(
                "{}.{} AS {}",
                quote_ident(&include.alias),
                quote_ident(label),
                quote_ident(&mounted)
            ));
        }
    }
    let proj_sql = proj_parts.join(", ");

    let mut where_parts = Vec::new();
    if is_root {
        if let Some(cond) = &payload.instructions.with {
            where_parts.push(with::compose_conditions(catalogue, scope, sink, cond)?);
        }
    }

    let ordered_by = payload
        .instructions
        .ordered_by
        .clone()
        .unwrap_or_else(ordered_by::default_order);

    if is_root {
        if let Some(page_clause) = pagination::render_pagination(
            catalogue,
            scope,
            sink,
            payload.instructions.before.as_deref(),
            payload.instructions.after.as_deref(),
            &ordered_by,
            payload.instructions.limited_to.as_ref(),
        )? {
            where_parts.push(page_clause);
        }
    }

    let mut sql = format!("SELECT {proj_sql} {from_sql}");
    if !where_parts.is_empty() {
        sql.push_str(" WHERE ");
        sql.push_str(&where_parts.join(" AND "));
    }

    if payload.target.is_plural() {
        sql.push(' ');
        sql.push_str(&ordered_by::render_order_by(catalogue, scope, &ordered_by)?);
    }

    let limit = payload.instructions.limited_to.unwrap_or(LimitedTo {
        single: !payload.target.is_plural(),
        count: None,
    });
    sql.push(' ');
    sql.push_str(&limited_to::render_limit(&limit));

    Ok((sql, includes, own_labels))
}

fn compile_get(catalogue: &Catalogue, payload: &QueryPayload, opts: BindOptions) -> Result<CompiledStatement> {
    let model = target_model(catalogue, &payload.target)?;
    let payload = resolve_using(catalogue, model, payload)?;
    let payload = payload.as_ref();
    let scope = Scope::root(model);
    let mut sink = ParamSink::new(opts);
    let (sql, includes, _) = render_select_body(catalogue, &scope, &mut sink, payload, true)?;

    let inflation = if payload.target.is_plural() {
        let limit = payload.instructions.limited_to.unwrap_or(LimitedTo {
            single: false,
            count: None,
        });
        Inflation::Plural {
            model: model.slug.clone(),
            page_size: limited_to::page_size(&limit),
            includes: includes.into_iter().map(into_meta).collect(),
        }
    } else {
        Inflation::Singular {
            model: model.slug.clone(),
            includes: includes.into_iter().map(into_meta).collect(),
        }
    };

    Ok(CompiledStatement {
        sql,
        params: sink.into_params(),
        inflation,
    })
}

fn into_meta(include: including::CompiledInclude) -> IncludeMeta {
    IncludeMeta {
        mounting_path: include.mounting_path,
        alias: include.alias,
        singular: include.singular,
    }
}

fn compile_count(catalogue: &Catalogue, payload: &QueryPayload, opts: BindOptions) -> Result<CompiledStatement> {
    let model = target_model(catalogue, &payload.target)?;
    let payload = resolve_using(catalogue, model, payload)?;
    let payload = payload.as_ref();
    let scope = Scope::root(model);
    let mut sink = ParamSink::new(opts);

    let mut from_sql = format!("FROM {}", quote_ident(&model.table));
    if let Some(list) = &payload.instructions.including {
        for include in including::render_includes(catalogue, &scope, &mut sink, list)? {
            from_sql.push(' ');
            from_sql.push_str(&include.join_sql);
        }
    }

    let mut sql = format!("SELECT COUNT(*) AS amount {from_sql}");
    if let Some(cond) = &payload.instructions.with {
        let where_sql = with::compose_conditions(catalogue, &scope, &mut sink, cond)?;
        sql.push_str(&format!(" WHERE {where_sql}"));
    }

    Ok(CompiledStatement {
        sql,
        params: sink.into_params(),
        inflation: Inflation::Amount,
    })
}

fn compile_add(catalogue: &Catalogue, payload: &QueryPayload, opts: BindOptions) -> Result<CompiledStatement> {
    let model = target_model(catalogue, &payload.target)?;
    let payload = resolve_using(catalogue, model, payload)?;
    let payload = payload.as_ref();
    let scope = Scope::root(model);
    let mut sink = ParamSink::new(opts);

    let assignments = to::render_insert(catalogue, &scope, &mut sink, payload.instructions.to.as_ref())?;
    let projections = selecting::render_selection(catalogue, &scope, payload.instructions.selecting.as_deref())?;
    let returning = projections
        .iter()
        .map(|p| format!("{} AS {}", p.selector_sql, quote_ident(&p.slug)))
        .join(", ");

    let sql = if assignments.is_empty() {
        format!(
            "INSERT INTO {} DEFAULT VALUES RETURNING {returning};",
            quote_ident(&model.table)
        )
    } else {
        let columns = assignments.iter().map(|a| a.column.clone()).join(", ");
        let values = assignments.iter().map(|a| a.rendered.clone()).join(", ");
        format!(
            "INSERT INTO {} ({columns}) VALUES ({values}) RETURNING {returning};",
            quote_ident(&model.table)
        )
    };

    Ok(CompiledStatement {
        sql,
        params: sink.into_params(),
        inflation: Inflation::Singular {
            model: model.slug.clone(),
            includes: Vec::new(),
        },
    })
}

fn compile_set(catalogue: &Catalogue, payload: &QueryPayload, opts: BindOptions) -> Result<CompiledStatement> {
    let model = target_model(catalogue, &payload.target)?;
    let payload = resolve_using(catalogue, model, payload)?;
    let payload = payload.as_ref();
    let scope = Scope::root(model);
    let mut sink = ParamSink::new(opts);

    let assignments = to::render_update(catalogue, &scope, &mut sink, payload.instructions.to.as_ref())?;
    let set_clause = assignments
        .iter()
        .map(|a| format!("{} = {}", a.column, a.rendered))
        .join(", ");

    let mut sql = format!("UPDATE {} SET {set_clause}", quote_ident(&model.table));
    if let Some(cond) = &payload.instructions.with {
        let where_sql = with::compose_conditions(catalogue, &scope, &mut sink, cond)?;
        sql.push_str(&format!(" WHERE {where_sql}"));
    }

    let projections = selecting::render_selection(catalogue, &scope, payload.instructions.selecting.as_deref())?;
    let returning = projections
        .iter()
        .map(|p| format!("{} AS {}", p.selector_sql, quote_ident(&p.slug)))
        .join(", ");
    sql.push_str(&format!(" RETURNING {returning};"));

    let inflation = if payload.target.is_plural() {
        Inflation::Plural {
            model: model.slug.clone(),
            page_size: limited_to::DEFAULT_PAGE_SIZE,
            includes: Vec::new(),
        }
    } else {
        Inflation::Singular {
            model: model.slug.clone(),
            includes: Vec::new(),
        }
    };

    Ok(CompiledStatement {
        sql,
        params: sink.into_params(),
        inflation,
    })
}

fn compile_remove(catalogue: &Catalogue, payload: &QueryPayload, opts: BindOptions) -> Result<CompiledStatement> {
    let model = target_model(catalogue, &payload.target)?;
    let payload = resolve_using(catalogue, model, payload)?;
    let payload = payload.as_ref();
    let scope = Scope::root(model);
    let mut sink = ParamSink::new(opts);

    let mut sql = format!("DELETE FROM {}", quote_ident(&model.table));
    if let Some(cond) = &payload.instructions.with {
        let where_sql = with::compose_conditions(catalogue, &scope, &mut sink, cond)?;
        sql.push_str(&format!(" WHERE {where_sql}"));
    }

    let projections = selecting::render_selection(catalogue, &scope, payload.instructions.selecting.as_deref())?;
    let returning = projections
        .iter()
        .map(|p| format!("{} AS {}", p.selector_sql, quote_ident(&p.slug)))
        .join(", ");
    sql.push_str(&format!(" RETURNING {returning};"));

    let inflation = if payload.target.is_plural() {
        Inflation::Plural {
            model: model.slug.clone(),
            page_size: limited_to::DEFAULT_PAGE_SIZE,
            includes: Vec::new(),
        }
    } else {
        Inflation::Singular {
            model: model.slug.clone(),
            includes: Vec::new(),
        }
    };

    Ok(CompiledStatement {
        sql,
        params: sink.into_params(),
        inflation,
    })
}

fn compile_create(catalogue: &Catalogue, op: &CreateOp) -> Result<CompiledStatement> {
    let sql = match op {
        CreateOp::Model(def) => {
            let model = crate::catalog::normalize_model(def);
            let mut statements = vec![crate::render::ddl::render_create_table(&model)];
            for index in model.indexes.values() {
                statements.push(crate::render::ddl::render_create_index(&model.table, index));
            }
            statements.join("\n")
        }
        CreateOp::Field { model, field } => {
            let model = catalogue.get(model)?;
            crate::render::ddl::render_add_column(model, field)
        }
        CreateOp::Index { model, index } => {
            let model = catalogue.get(model)?;
            crate::render::ddl::render_create_index(&model.table, index)
        }
    };

    Ok(CompiledStatement {
        sql,
        params: Vec::new(),
        inflation: Inflation::Raw,
    })
}

fn compile_alter(catalogue: &Catalogue, op: &AlterOp) -> Result<CompiledStatement> {
    let sql = match op {
        AlterOp::ModelTo { model, to } => {
            let model = catalogue.get(model)?;
            let new_plural_slug = to.plural_slug.as_deref().ok_or_else(|| Error::InvalidFieldValue {
                field: "table".to_string(),
                reason: "alter.model.to did not change anything renderable".to_string(),
            })?;
            let new_table = crate::catalog::normalize::snake_case(new_plural_slug);
            crate::render::ddl::render_rename_table(&model.table, &new_table)
        }
        AlterOp::FieldTo { model, field, to } => {
            let model = catalogue.get(model)?;
            let new_slug = to.slug.as_deref().ok_or_else(|| Error::InvalidFieldValue {
                field: field.clone(),
                reason: "alter.field.to did not change anything renderable".to_string(),
            })?;
            crate::render::ddl::render_rename_column(&model.table, field, new_slug)
        }
        AlterOp::CreateField { model, field } => {
            let model = catalogue.get(model)?;
            crate::render::ddl::render_add_column(model, field)
        }
        AlterOp::DropField { model, field } => {
            let model = catalogue.get(model)?;
            crate::render::ddl::render_drop_column(&model.table, field)
        }
        AlterOp::CreateIndex { model, index } => {
            let model = catalogue.get(model)?;
            crate::render::ddl::render_create_index(&model.table, index)
        }
        AlterOp::DropIndex { index, .. } => crate::render::ddl::render_drop_index(index),
    };

    Ok(CompiledStatement {
        sql,
        params: Vec::new(),
        inflation: Inflation::Raw,
    })
}

fn compile_drop(catalogue: &Catalogue, op: &DropOp) -> Result<CompiledStatement> {
    let sql = match op {
        DropOp::Model(slug) => {
            let model = catalogue.get(slug)?;
            crate::render::ddl::render_drop_table(model)
        }
    };

    Ok(CompiledStatement {
        sql,
        params: Vec::new(),
        inflation: Inflation::Raw,
    })
}

/// Compile a value-typed sub-query to inline SQL text for splicing as
/// `(...)` (spec §9 `Value::Sub`).
pub fn compile_subquery_text(catalogue: &Catalogue, sink: &mut ParamSink, query: &Query) -> Result<String> {
    let Query::Get(payload) = query else {
        return Err(Error::InvalidFieldValue {
            field: String::new(),
            reason: "only `get` queries may be used as a value sub-query".to_string(),
        });
    };
    let model = target_model(catalogue, &payload.target)?;
    let payload = resolve_using(catalogue, model, payload)?;
    let payload = payload.as_ref();
    let scope = Scope::root(model);
    let (sql, _, _) = render_select_body(catalogue, &scope, sink, payload, true)?;
    Ok(sql)
}

/// Compile one `including` entry into its joined model, join kind, and
/// subselect text (spec §4.3 "including"). The entry's own `with` becomes
/// the `JOIN ON` condition rather than a subselect `WHERE`.
pub fn compile_include(
    catalogue: &Catalogue,
    scope: &Scope,
    sink: &mut ParamSink,
    entry: &IncludeEntry,
    _alias: &str,
) -> Result<(Model, JoinKind, String, Vec<String>)> {
    let Query::Get(payload) = entry.query.as_ref() else {
        return Err(Error::InvalidFieldValue {
            field: entry.mounting_path.clone(),
            reason: "`including` entries must be `get` queries".to_string(),
        });
    };
    let model = target_model(catalogue, &payload.target)?.clone();
    let payload = resolve_using(catalogue, &model, payload)?;
    let payload = payload.as_ref();
    let inner_scope = Scope {
        model: &model,
        alias: None,
        parent: Some(scope),
    };
    let (sql, _, labels) =
        render_select_body(catalogue, &inner_scope, sink, payload, false)?;

    let join_kind = match &payload.instructions.with {
        Some(cond) => JoinKind::Left(cond.clone()),
        None => JoinKind::Cross,
    };

    Ok((model, join_kind, sql, labels))
}
