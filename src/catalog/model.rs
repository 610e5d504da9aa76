//! The typed model definitions a caller supplies, and the normalised shape
//! the catalogue stores them in (spec §3 "Model", "Field", "Preset").

use crate::ir::Instructions;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// The six fields every normalised model carries (spec §3 invariants).
pub const SYSTEM_FIELD_SLUGS: [&str; 6] = [
    "id",
    "ronin.createdAt",
    "ronin.createdBy",
    "ronin.updatedAt",
    "ronin.updatedBy",
    "ronin.locked",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FieldType {
    String,
    Number,
    Boolean,
    Date,
    Json,
    Blob,
    Link,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LinkKind {
    One,
    Many,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LinkAction {
    Cascade,
    Restrict,
    SetNull,
    SetDefault,
    NoAction,
}

impl LinkAction {
    pub fn as_sql(&self) -> &'static str {
        match self {
            LinkAction::Cascade => "CASCADE",
            LinkAction::Restrict => "RESTRICT",
            LinkAction::SetNull => "SET NULL",
            LinkAction::SetDefault => "SET DEFAULT",
            LinkAction::NoAction => "NO ACTION",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LinkActions {
    pub on_delete: Option<LinkAction>,
    pub on_update: Option<LinkAction>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinkInfo {
    pub target: String,
    pub kind: LinkKind,
    #[serde(default)]
    pub actions: LinkActions,
}

/// A default value: either a literal JSON scalar or an expression marker
/// (spec §9 "Expression defaults").
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum DefaultValue {
    Literal(serde_json::Value),
    Expression(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Field {
    /// May contain `.` to denote a nested JSON path, or a literal grouped
    /// column name that itself contains a dot (resolved by catalogue
    /// lookup, never by runtime string splitting — spec §9).
    pub slug: String,
    pub r#type: FieldType,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub unique: bool,
    #[serde(default)]
    pub increment: bool,
    #[serde(default)]
    pub default_value: Option<DefaultValue>,
    #[serde(default)]
    pub link: Option<LinkInfo>,
}

impl Field {
    pub fn new(slug: impl Into<String>, r#type: FieldType) -> Self {
        Self {
            slug: slug.into(),
            r#type,
            required: false,
            unique: false,
            increment: false,
            default_value: None,
            link: None,
        }
    }

    pub fn is_system(&self) -> bool {
        SYSTEM_FIELD_SLUGS.contains(&self.slug.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IndexOrder {
    Asc,
    Desc,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexField {
    pub field: String,
    pub order: IndexOrder,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Index {
    pub slug: String,
    pub fields: Vec<IndexField>,
    #[serde(default)]
    pub unique: bool,
}

/// A named, parameterised bundle of instructions spliced into a query via
/// `using` (spec §3 "Preset", §4.3 "using").
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Preset {
    pub slug: String,
    pub instructions: Instructions,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Identifiers {
    pub name: Option<String>,
    pub slug: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SystemInfo {
    pub model: String,
    pub association_slug: Option<String>,
}

/// A model as the caller supplies it, before catalogue normalisation.
/// Every field besides `slug` is optional; the catalogue fills in the rest
/// per spec §4.1's normalisation table.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModelInput {
    /// Carried forward across re-normalisation (e.g. during an `alter`); a
    /// fresh id is minted when absent.
    pub id: Option<String>,
    pub slug: String,
    pub plural_slug: Option<String>,
    pub name: Option<String>,
    pub plural_name: Option<String>,
    pub id_prefix: Option<String>,
    pub table: Option<String>,
    pub identifiers: Option<Identifiers>,
    /// Declaration order is significant (spec §3, §4.1 step 3) - an
    /// `IndexMap` keeps it, unlike a `BTreeMap` which would silently
    /// re-sort fields alphabetically.
    #[serde(default)]
    pub fields: IndexMap<String, Field>,
    #[serde(default)]
    pub indexes: BTreeMap<String, Index>,
    #[serde(default)]
    pub presets: BTreeMap<String, Preset>,
    pub system: Option<SystemInfo>,
}

/// A fully normalised model, as stored in the [`crate::catalog::Catalogue`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Model {
    pub id: String,
    pub slug: String,
    pub plural_slug: String,
    pub name: String,
    pub plural_name: String,
    pub id_prefix: String,
    pub table: String,
    pub identifiers: Identifiers,
    pub fields: IndexMap<String, Field>,
    pub indexes: BTreeMap<String, Index>,
    pub presets: BTreeMap<String, Preset>,
    pub system: Option<SystemInfo>,
}

impl Model {
    /// Fields in declaration order, system fields first (spec §3, §4.1
    /// step 3: "system fields always come first in the column list").
    /// `partition` is stable, so the user half keeps the `IndexMap`'s
    /// insertion order - whatever order the caller declared them in.
    pub fn ordered_fields(&self) -> Vec<&Field> {
        let (mut system, mut user): (Vec<&Field>, Vec<&Field>) =
            self.fields.values().partition(|f| f.is_system());
        system.sort_by_key(|f| SYSTEM_FIELD_SLUGS.iter().position(|s| *s == f.slug));
        system.append(&mut user);
        system
    }

    pub fn user_fields(&self) -> Vec<&Field> {
        self.fields.values().filter(|f| !f.is_system()).collect()
    }

    pub fn is_associative(&self) -> bool {
        self.system.is_some()
    }
}
