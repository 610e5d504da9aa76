//! The query intermediate representation (spec §3 "Query (IR)", §4.3).

use crate::value::Value;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// What a query's instructions apply to: a single record (singular slug),
/// a set of records (plural slug), or every model in the catalogue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Target {
    Singular(String),
    Plural(String),
    All,
}

impl Target {
    pub fn is_plural(&self) -> bool {
        matches!(self, Target::Plural(_) | Target::All)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CompareOp {
    Being,
    NotBeing,
    StartingWith,
    NotStartingWith,
    EndingWith,
    NotEndingWith,
    Containing,
    NotContaining,
    GreaterThan,
    GreaterOrEqual,
    LessThan,
    LessOrEqual,
}

/// The boolean expression tree produced/consumed by `with` (spec §4.2
/// `composeConditions`). Arrays of conditions OR together; objects AND.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Condition {
    /// `{field: scalar}` / `{field: null}` — plain equality.
    Equals { field: String, value: Value },
    /// `{field: {op: value}}`.
    Compare {
        field: String,
        op: CompareOp,
        value: Value,
    },
    And(Vec<Condition>),
    Or(Vec<Condition>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    Asc,
    Desc,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum OrderKey {
    Field(String),
    Expression(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderItem {
    pub key: OrderKey,
    pub direction: Direction,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LimitedTo {
    pub single: bool,
    pub count: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum JoinKind {
    /// `LEFT JOIN ... ON <with>`.
    Left(Condition),
    /// No `with` supplied: `CROSS JOIN` (singular entries also get an
    /// injected `limitedTo = 1`).
    Cross,
}

/// One entry of the `including` symbol-map: a sub-query mounted at a
/// dotted field path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IncludeEntry {
    pub mounting_path: String,
    pub singular: bool,
    pub query: Box<Query>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UsingEntry {
    pub preset: String,
    pub argument: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SelectItem {
    /// `**` — all non-system fields.
    AllUser,
    Field(String),
    /// `!field` — exclude.
    Exclude(String),
}

/// The full instruction set a query (or preset) can carry. Every field is
/// optional so presets can hold a partial bundle that gets merged into the
/// target query (spec §4.3 "using", §9 "preset merging").
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Instructions {
    pub with: Option<Condition>,
    pub ordered_by: Option<Vec<OrderItem>>,
    pub limited_to: Option<LimitedTo>,
    pub before: Option<String>,
    pub after: Option<String>,
    pub including: Option<Vec<IncludeEntry>>,
    pub using: Option<Vec<UsingEntry>>,
    pub selecting: Option<Vec<SelectItem>>,
    pub to: Option<BTreeMap<String, Value>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryPayload {
    pub target: Target,
    pub instructions: Instructions,
}

impl QueryPayload {
    pub fn new(target: Target) -> Self {
        Self {
            target,
            instructions: Instructions::default(),
        }
    }
}

/// A model as described inline in a `create.model` payload — intentionally
/// the same shape as [`crate::catalog::model::ModelInput`] so the compiler
/// can run it straight through catalogue normalisation.
pub type ModelDefinition = crate::catalog::model::ModelInput;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelPatch {
    pub slug: Option<String>,
    pub name: Option<String>,
    pub plural_name: Option<String>,
    pub plural_slug: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldPatch {
    pub slug: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum CreateOp {
    Model(ModelDefinition),
    Field {
        model: String,
        field: crate::catalog::model::Field,
    },
    Index {
        model: String,
        index: crate::catalog::model::Index,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AlterOp {
    ModelTo {
        model: String,
        to: ModelPatch,
    },
    FieldTo {
        model: String,
        field: String,
        to: FieldPatch,
    },
    CreateField {
        model: String,
        field: crate::catalog::model::Field,
    },
    DropField {
        model: String,
        field: String,
    },
    CreateIndex {
        model: String,
        index: crate::catalog::model::Index,
    },
    DropIndex {
        model: String,
        index: String,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum DropOp {
    Model(String),
}

/// A single-key `{kind: payload}` IR query (spec §3 "Query (IR)").
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Query {
    Get(QueryPayload),
    Count(QueryPayload),
    Add(QueryPayload),
    Set(QueryPayload),
    Remove(QueryPayload),
    /// `list.models` — list the catalogue's own schema rows.
    ListModels,
    Create(CreateOp),
    Alter(AlterOp),
    Drop(DropOp),
    Batch(Vec<Query>),
    Sql { text: String, params: Vec<Value> },
}
