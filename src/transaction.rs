//! Transaction execution and result inflation (spec §5, component C5):
//! hands compiled statements to a [`Driver`], then folds the returned rows
//! back into the shape a `ronin` result is documented to have — `amount`
//! for `count`, a record-or-null for singular `get`/`add`/`set`/`remove`, a
//! `{records, moreBefore, moreAfter}` page for plural queries, and a
//! `{models: {...}}` object for `list.models`.

use crate::catalog::Catalogue;
use crate::catalog::model::{FieldType, Model};
use crate::compiler::{self, Compiled, CompiledStatement, IncludeMeta, Inflation};
use crate::config::{CompilerConfig, TransactionOptions};
use crate::cursor;
use crate::driver::{Cell, Driver, Row, Statement};
use crate::error::{Error, Result};
use crate::ir::{OrderItem, OrderKey, Query, Target};
use serde_json::{Map, Value as Json};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq)]
pub enum QueryResult {
    Amount(i64),
    Record(Option<Json>),
    Records {
        records: Vec<Json>,
        more_before: bool,
        more_after: bool,
        ending_before: Option<String>,
        starting_after: Option<String>,
    },
    Models(Vec<Model>),
    /// `get all`/`count all`, grouped by plural slug (spec §4.5 "for `all`,
    /// results are grouped under `{models: {<pluralSlug>: …}}`").
    Grouped(BTreeMap<String, QueryResult>),
    Raw(Vec<Json>),
    Batch(Vec<QueryResult>),
}

pub struct Transaction<'a, D: Driver> {
    catalogue: &'a Catalogue,
    driver: &'a D,
    config: CompilerConfig,
}

impl<'a, D: Driver> Transaction<'a, D> {
    pub fn new(catalogue: &'a Catalogue, driver: &'a D, config: CompilerConfig) -> Self {
        Self {
            catalogue,
            driver,
            config,
        }
    }

    pub fn run(&self, query: &Query, options: Option<TransactionOptions>) -> Result<QueryResult> {
        let bind_opts = self.config.merge(options).into();
        let compiled = compiler::compile(self.catalogue, query, bind_opts)?;
        self.inflate(compiled, query)
    }

    fn inflate(&self, compiled: Compiled, query: &Query) -> Result<QueryResult> {
        match compiled {
            Compiled::Models(models) => Ok(QueryResult::Models(models)),
            Compiled::Batch(items) => {
                let all_target = match query {
                    Query::Get(p) | Query::Count(p) => p.target == Target::All,
                    _ => false,
                };
                if all_target {
                    let plural_slugs = self
                        .catalogue
                        .models()
                        .iter()
                        .filter(|m| !m.is_associative())
                        .map(|m| m.plural_slug.clone());
                    let mut grouped = BTreeMap::new();
                    for (slug, item) in plural_slugs.zip(items) {
                        grouped.insert(slug, self.inflate(item, query)?);
                    }
                    return Ok(QueryResult::Grouped(grouped));
                }

                let inner_queries = match query {
                    Query::Batch(qs) => qs.clone(),
                    _ => Vec::new(),
                };
                let mut results = Vec::with_capacity(items.len());
                for (i, item) in items.into_iter().enumerate() {
                    let sub_query = inner_queries.get(i).cloned().unwrap_or(Query::ListModels);
                    results.push(self.inflate(item, &sub_query)?);
                }
                Ok(QueryResult::Batch(results))
            }
            Compiled::Statement(stmt) => self.inflate_statement(stmt, query),
        }
    }

    fn inflate_statement(&self, stmt: CompiledStatement, query: &Query) -> Result<QueryResult> {
        let statement = Statement {
            sql: stmt.sql,
            params: stmt.params,
        };
        let mut batches = self
            .driver
            .query(std::slice::from_ref(&statement))
            .map_err(|e| Error::DriverAborted { reason: e.to_string() })?;
        let rows = batches.pop().unwrap_or_default();

        match stmt.inflation {
            Inflation::Amount => {
                let amount = rows
                    .first()
                    .and_then(|row| row.get("amount"))
                    .map(cell_as_i64)
                    .unwrap_or(0);
                Ok(QueryResult::Amount(amount))
            }
            Inflation::Raw => Ok(QueryResult::Raw(rows.iter().map(row_to_plain_json).collect())),
            Inflation::Singular { model, includes } => {
                let model = self.catalogue.get(&model)?;
                let record = rows.first().map(|row| fold_row(model, row, &includes));
                Ok(QueryResult::Record(record))
            }
            Inflation::Plural {
                model,
                page_size,
                includes,
            } => {
                let model = self.catalogue.get(&model)?;
                let ordered_by = query_ordering(query).unwrap_or_else(crate::instructions::ordered_by::default_order);
                self.inflate_plural(model, rows, &includes, page_size, &ordered_by)
            }
        }
    }

    fn inflate_plural(
        &self,
        model: &Model,
        mut rows: Vec<Row>,
        includes: &[IncludeMeta],
        page_size: u32,
        ordered_by: &[OrderItem],
    ) -> Result<QueryResult> {
        let has_more = rows.len() as u32 > page_size;
        if has_more {
            rows.truncate(page_size as usize);
        }

        let cursor_of = |row: &Row| -> String {
            let segments: Vec<Option<String>> = ordered_by
                .iter()
                .map(|item| match &item.key {
                    OrderKey::Field(field) => row.get(field.as_str()).and_then(cell_to_cursor_segment),
                    OrderKey::Expression(_) => None,
                })
                .collect();
            cursor::encode(&segments)
        };

        let starting_after = rows.last().map(cursor_of);
        let ending_before = rows.first().map(cursor_of);

        let records = rows.iter().map(|row| fold_row(model, row, includes)).collect();

        Ok(QueryResult::Records {
            records,
            more_before: false,
            more_after: has_more,
            ending_before,
            starting_after,
        })
    }
}

fn query_ordering(query: &Query) -> Option<Vec<OrderItem>> {
    match query {
        Query::Get(payload) | Query::Set(payload) | Query::Remove(payload) => payload.instructions.ordered_by.clone(),
        _ => None,
    }
}

fn cell_as_i64(cell: &Cell) -> i64 {
    match cell {
        Cell::Number(n) => *n as i64,
        _ => 0,
    }
}

fn cell_to_cursor_segment(cell: &Cell) -> Option<String> {
    match cell {
        Cell::Null => None,
        Cell::Text(s) => Some(s.clone()),
        Cell::Number(n) => Some(format_cursor_number(*n)),
        Cell::Bool(b) => Some(if *b { "1".to_string() } else { "0".to_string() }),
        Cell::Blob(_) => None,
    }
}

fn format_cursor_number(n: f64) -> String {
    if n.fract() == 0.0 {
        format!("{}", n as i64)
    } else {
        format!("{n}")
    }
}

/// Fold one flat driver row into a nested JSON record: `ronin.x` columns
/// collapse into a `ronin` object, and any column whose label starts with
/// a known include's mounting path (spec §4.3 "including") mounts as a
/// nested object/array at that path instead of a flat column.
fn fold_row(model: &Model, row: &Row, includes: &[IncludeMeta]) -> Json {
    let mut root = Map::new();
    let mut ronin = Map::new();
    let mut mounted: BTreeMap<&str, Map<String, Json>> = BTreeMap::new();

    for (key, cell) in row {
        if let Some(include) = includes.iter().find(|inc| key.starts_with(&format!("{}.", inc.mounting_path))) {
            let rest = key[include.mounting_path.len() + 1..].to_string();
            mounted.entry(include.mounting_path.as_str()).or_default().insert(rest, cell_to_json(None, cell));
            continue;
        }
        if let Some(stripped) = key.strip_prefix("ronin.") {
            ronin.insert(stripped.to_string(), cell_to_json(model.fields.get(key.as_str()), cell));
        } else {
            root.insert(key.clone(), cell_to_json(model.fields.get(key.as_str()), cell));
        }
    }

    if !ronin.is_empty() {
        root.insert("ronin".to_string(), Json::Object(ronin));
    }

    for include in includes {
        if let Some(obj) = mounted.remove(include.mounting_path.as_str()) {
            let is_empty_record = obj.values().all(|v| v.is_null());
            let value = if is_empty_record { Json::Null } else { Json::Object(obj) };
            root.insert(include.mounting_path.clone(), value);
        }
    }

    Json::Object(root)
}

fn cell_to_json(field: Option<&crate::catalog::model::Field>, cell: &Cell) -> Json {
    match (field.map(|f| f.r#type), cell) {
        (_, Cell::Null) => Json::Null,
        (Some(FieldType::Boolean), Cell::Number(n)) => Json::Bool(*n != 0.0),
        (Some(FieldType::Json), Cell::Text(s)) => serde_json::from_str(s).unwrap_or(Json::String(s.clone())),
        (Some(FieldType::Date), Cell::Text(s)) => Json::String(s.clone()),
        (_, Cell::Text(s)) => Json::String(s.clone()),
        (_, Cell::Number(n)) => serde_json::Number::from_f64(*n).map(Json::Number).unwrap_or(Json::Null),
        (_, Cell::Bool(b)) => Json::Bool(*b),
        (_, Cell::Blob(b)) => Json::Array(b.iter().map(|byte| Json::Number((*byte).into())).collect()),
    }
}

fn row_to_plain_json(row: &Row) -> Json {
    let mut map = Map::new();
    for (key, cell) in row {
        map.insert(key.clone(), cell_to_json(None, cell));
    }
    Json::Object(map)
}
