//! The model catalogue (spec §4.1, component C1).
//!
//! Mirrors the teacher's `Catalog::load` + `find_*` shape, but the source
//! of truth is an in-memory list of [`model::ModelInput`] rather than a
//! live `pg_catalog` introspection: there is no I/O here, normalisation is
//! synchronous and total.

pub mod id;
pub mod model;
pub mod normalize;

use crate::error::{Error, Result};
use id::{DependsOn, ModelId};
use indexmap::IndexMap;
use model::{
    DefaultValue, Field, FieldType, Identifiers, Index, LinkInfo, LinkKind, Model, ModelInput,
    Preset, SYSTEM_FIELD_SLUGS, SystemInfo,
};
use std::collections::BTreeMap;

/// Column selector for a resolved field (spec §4.1 "Column selector").
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selector {
    /// A plain top-level column, or a literal grouped column name.
    Column(String),
    /// `json_extract("a", '$.b')`.
    JsonPath { column: String, path: String },
}

impl Selector {
    pub fn render(&self) -> String {
        match self {
            Selector::Column(name) => crate::render::quote_ident(name),
            Selector::JsonPath { column, path } => {
                format!(
                    "json_extract({}, '$.{}')",
                    crate::render::quote_ident(column),
                    path
                )
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct Catalogue {
    models: Vec<Model>,
    forward_deps: BTreeMap<ModelId, Vec<ModelId>>,
    reverse_deps: BTreeMap<ModelId, Vec<ModelId>>,
}

fn system_fields() -> IndexMap<String, Field> {
    let timestamp_default = Some(DefaultValue::Expression(
        "strftime('%Y-%m-%dT%H:%M:%f', 'now') || 'Z'".to_string(),
    ));

    let mut fields = IndexMap::new();
    fields.insert(
        "id".to_string(),
        Field {
            required: true,
            unique: true,
            ..Field::new("id", FieldType::String)
        },
    );
    fields.insert(
        "ronin.createdAt".to_string(),
        Field {
            required: true,
            default_value: timestamp_default.clone(),
            ..Field::new("ronin.createdAt", FieldType::Date)
        },
    );
    fields.insert(
        "ronin.createdBy".to_string(),
        Field::new("ronin.createdBy", FieldType::String),
    );
    fields.insert(
        "ronin.updatedAt".to_string(),
        Field {
            required: true,
            default_value: timestamp_default,
            ..Field::new("ronin.updatedAt", FieldType::Date)
        },
    );
    fields.insert(
        "ronin.updatedBy".to_string(),
        Field::new("ronin.updatedBy", FieldType::String),
    );
    fields.insert(
        "ronin.locked".to_string(),
        Field {
            required: true,
            default_value: Some(DefaultValue::Literal(serde_json::Value::Bool(false))),
            ..Field::new("ronin.locked", FieldType::Boolean)
        },
    );
    fields
}

/// Default presets installed for link fields (spec §4.1 step 5).
fn install_link_presets(model: &mut Model) {
    let link_fields: Vec<(String, LinkInfo)> = model
        .fields
        .values()
        .filter_map(|f| f.link.as_ref().map(|l| (f.slug.clone(), l.clone())))
        .collect();

    for (field_slug, link) in link_fields {
        if link.kind == LinkKind::One {
            if !model.presets.contains_key(&field_slug) {
                let instructions = crate::ir::Instructions {
                    with: Some(crate::ir::Condition::Equals {
                        field: "id".to_string(),
                        value: crate::value::Value::ParentField(field_slug.clone()),
                    }),
                    ..Default::default()
                };
                model.presets.insert(
                    field_slug.clone(),
                    Preset {
                        slug: field_slug.clone(),
                        instructions,
                    },
                );
            }
        } else {
            // Many-link: join through the associative model.
            let assoc_slug = associative_model_slug(&model.slug, &field_slug);
            if !model.presets.contains_key(&field_slug) {
                let instructions = crate::ir::Instructions {
                    with: Some(crate::ir::Condition::Equals {
                        field: format!("{assoc_slug}.source"),
                        value: crate::value::Value::ParentField("id".to_string()),
                    }),
                    ..Default::default()
                };
                model.presets.insert(
                    field_slug.clone(),
                    Preset {
                        slug: field_slug,
                        instructions,
                    },
                );
            }
        }
    }
}

pub fn associative_model_slug(source: &str, field: &str) -> String {
    format!("{source}_{field}")
}

impl Catalogue {
    /// Normalise every model per spec §4.1 and build the catalogue.
    pub fn new(inputs: Vec<ModelInput>) -> Result<Self> {
        tracing::info!(count = inputs.len(), "normalising model catalogue");

        let mut models: Vec<Model> = inputs.iter().map(normalize_model).collect();

        // Synthesize associative models for `kind: many` links.
        let mut associative = Vec::new();
        for model in &models {
            for field in model.fields.values() {
                if let Some(link) = &field.link
                    && link.kind == LinkKind::Many
                {
                    associative.push(build_associative_model(model, field, &link.target));
                }
            }
        }
        models.extend(associative);

        for model in &mut models {
            install_link_presets(model);
        }

        let mut forward = BTreeMap::new();
        let mut reverse = BTreeMap::new();
        for model in &models {
            let id = model.dep_id();
            let deps = model.dep_targets(&models);
            forward.insert(id.clone(), deps.clone());
            for dep in deps {
                reverse.entry(dep).or_insert_with(Vec::new).push(id.clone());
            }
        }

        Ok(Self {
            models,
            forward_deps: forward,
            reverse_deps: reverse,
        })
    }

    pub fn models(&self) -> &[Model] {
        &self.models
    }

    pub fn forward_deps(&self) -> &BTreeMap<ModelId, Vec<ModelId>> {
        &self.forward_deps
    }

    /// A new catalogue with `extra` normalised and merged in, without
    /// re-normalising any existing model. Lets a caller resolve a
    /// transient model — a temp-table rewrite's scratch model, say — that
    /// never belongs in its own catalogue (spec §4.6 step 6).
    pub fn with_extra_model(&self, extra: &ModelInput) -> Self {
        let mut models = self.models.clone();
        let mut forward = self.forward_deps.clone();
        let mut reverse = self.reverse_deps.clone();

        let mut added = vec![normalize_model(extra)];
        let mut idx = 0;
        while idx < added.len() {
            let source_slug = added[idx].slug.clone();
            let links: Vec<(Field, String)> = added[idx]
                .fields
                .values()
                .filter_map(|f| {
                    f.link
                        .as_ref()
                        .filter(|l| l.kind == LinkKind::Many)
                        .map(|l| (f.clone(), l.target.clone()))
                })
                .collect();
            for (field, target) in links {
                let source = added.iter().find(|m| m.slug == source_slug).expect("just inserted");
                added.push(build_associative_model(source, &field, &target));
            }
            idx += 1;
        }

        for model in &mut added {
            install_link_presets(model);
        }

        for model in &added {
            let id = model.dep_id();
            let deps = model.dep_targets(&models);
            forward.insert(id.clone(), deps.clone());
            for dep in deps {
                reverse.entry(dep).or_insert_with(Vec::new).push(id.clone());
            }
        }

        models.extend(added);
        Self {
            models,
            forward_deps: forward,
            reverse_deps: reverse,
        }
    }

    pub fn reverse_deps(&self) -> &BTreeMap<ModelId, Vec<ModelId>> {
        &self.reverse_deps
    }

    /// Resolve a model by slug or plural slug. Ambiguity is resolved to
    /// singular first (spec §4.1).
    pub fn get(&self, name: &str) -> Result<&Model> {
        self.models
            .iter()
            .find(|m| m.slug == name)
            .or_else(|| self.models.iter().find(|m| m.plural_slug == name))
            .ok_or_else(|| Error::ModelNotFound {
                slug: name.to_string(),
            })
    }

    /// Resolve a possibly-nested dotted field path to its [`Field`] and
    /// [`Selector`] (spec §4.1 "Column selector").
    pub fn field(&self, model: &Model, path: &str) -> Result<(Field, Selector)> {
        if let Some(field) = model.fields.get(path) {
            return Ok((field.clone(), Selector::Column(path.to_string())));
        }

        if let Some((head, rest)) = path.split_once('.') {
            if let Some(field) = model.fields.get(head) {
                if field.r#type == FieldType::Json {
                    return Ok((
                        field.clone(),
                        Selector::JsonPath {
                            column: head.to_string(),
                            path: rest.to_string(),
                        },
                    ));
                }
            }
        }

        Err(Error::FieldNotFound {
            model: model.slug.clone(),
            slug: path.to_string(),
        })
    }
}

impl Model {
    fn dep_id(&self) -> ModelId {
        ModelId::new(self.slug.clone())
    }

    /// Link targets this model depends on, excluding self-links: a model
    /// linking to its own kind (spec §4.7 allows self-edges in the
    /// dependency graph) needs no creation-order edge, since it can always
    /// be created before any row references it.
    fn dep_targets(&self, _all: &[Model]) -> Vec<ModelId> {
        let mut out = Vec::new();
        for field in self.fields.values() {
            if let Some(link) = &field.link
                && link.target != self.slug
                && !out.iter().any(|id: &ModelId| id.slug == link.target)
            {
                out.push(ModelId::new(link.target.clone()));
            }
        }
        out
    }
}

impl DependsOn for Model {
    fn id(&self) -> ModelId {
        self.dep_id()
    }

    fn depends_on(&self) -> &[ModelId] {
        // Computed eagerly in Catalogue::new; exposed via forward_deps map
        // instead of stored per-model, since targets may not exist yet at
        // construction time for forward references.
        &[]
    }
}

fn pick_identifier_name(fields: &IndexMap<String, Field>) -> String {
    fields
        .values()
        .find(|f| f.slug == "name" && f.required && f.r#type == FieldType::String)
        .map(|f| f.slug.clone())
        .unwrap_or_else(|| "id".to_string())
}

fn pick_identifier_slug(fields: &IndexMap<String, Field>) -> String {
    fields
        .values()
        .find(|f| {
            (f.slug == "slug" || f.slug == "handle")
                && f.required
                && f.unique
                && f.r#type == FieldType::String
        })
        .map(|f| f.slug.clone())
        .unwrap_or_else(|| "id".to_string())
}

/// Normalise a single [`ModelInput`] per spec §4.1. Pure function of its
/// argument — does not need sibling models except to resolve many-link
/// associative models, handled separately by the caller.
pub fn normalize_model(input: &ModelInput) -> Model {
    let plural_slug = input
        .plural_slug
        .clone()
        .unwrap_or_else(|| normalize::pluralize(&input.slug));
    let name = input
        .name
        .clone()
        .unwrap_or_else(|| normalize::title_case(&input.slug));
    let plural_name = input
        .plural_name
        .clone()
        .unwrap_or_else(|| normalize::title_case(&plural_slug));
    let id_prefix = input
        .id_prefix
        .clone()
        .unwrap_or_else(|| normalize::id_prefix(&input.slug));
    let table = input
        .table
        .clone()
        .unwrap_or_else(|| normalize::snake_case(&plural_slug));

    let mut fields = input.fields.clone();
    for (slug, field) in system_fields() {
        fields.entry(slug).or_insert(field);
    }

    let identifiers = Identifiers {
        name: Some(
            input
                .identifiers
                .as_ref()
                .and_then(|i| i.name.clone())
                .unwrap_or_else(|| pick_identifier_name(&fields)),
        ),
        slug: Some(
            input
                .identifiers
                .as_ref()
                .and_then(|i| i.slug.clone())
                .unwrap_or_else(|| pick_identifier_slug(&fields)),
        ),
    };

    Model {
        id: input
            .id
            .clone()
            .unwrap_or_else(normalize::generate_model_id),
        slug: input.slug.clone(),
        plural_slug,
        name,
        plural_name,
        id_prefix,
        table,
        identifiers,
        fields,
        indexes: input.indexes.clone(),
        presets: input.presets.clone(),
        system: input.system.clone(),
    }
}

fn build_associative_model(source: &Model, field: &Field, target_slug: &str) -> Model {
    let assoc_slug = associative_model_slug(&source.slug, &field.slug);
    let mut fields: IndexMap<String, Field> = IndexMap::new();
    fields.insert(
        "source".to_string(),
        Field {
            link: Some(LinkInfo {
                target: source.slug.clone(),
                kind: LinkKind::One,
                actions: Default::default(),
            }),
            ..Field::new("source", FieldType::Link)
        },
    );
    fields.insert(
        "target".to_string(),
        Field {
            link: Some(LinkInfo {
                target: target_slug.to_string(),
                kind: LinkKind::One,
                actions: Default::default(),
            }),
            ..Field::new("target", FieldType::Link)
        },
    );

    let input = ModelInput {
        id: None,
        slug: assoc_slug.clone(),
        plural_slug: None,
        name: None,
        plural_name: None,
        id_prefix: None,
        table: None,
        identifiers: None,
        fields,
        indexes: BTreeMap::new(),
        presets: BTreeMap::new(),
        system: Some(SystemInfo {
            model: source.slug.clone(),
            association_slug: Some(field.slug.clone()),
        }),
    };
    normalize_model(&input)
}

/// Every normalised model carries the six system field slugs, in the
/// order declared by spec §3.
pub fn system_field_slugs() -> &'static [&'static str] {
    &SYSTEM_FIELD_SLUGS
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::model::{FieldType, Index, IndexField, IndexOrder};

    fn account_input() -> ModelInput {
        ModelInput {
            slug: "account".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn derives_table_from_slug() {
        let model = normalize_model(&account_input());
        assert_eq!(model.plural_slug, "accounts");
        assert_eq!(model.table, "accounts");
        assert_eq!(model.id_prefix, "acc");
    }

    #[test]
    fn installs_system_fields() {
        let model = normalize_model(&account_input());
        for slug in SYSTEM_FIELD_SLUGS {
            assert!(model.fields.contains_key(*slug), "missing {slug}");
        }
    }

    #[test]
    fn does_not_overwrite_user_defined_field() {
        let mut input = account_input();
        input
            .fields
            .insert("id".to_string(), Field::new("id", FieldType::Number));
        let model = normalize_model(&input);
        assert_eq!(model.fields["id"].r#type, FieldType::Number);
    }

    #[test]
    fn catalogue_resolves_by_plural_slug() {
        let catalogue = Catalogue::new(vec![account_input()]).unwrap();
        let model = catalogue.get("accounts").unwrap();
        assert_eq!(model.slug, "account");
    }

    #[test]
    fn many_link_induces_associative_model() {
        let mut blog = ModelInput {
            slug: "blog".to_string(),
            ..Default::default()
        };
        blog.fields.insert(
            "authors".to_string(),
            Field {
                link: Some(LinkInfo {
                    target: "account".to_string(),
                    kind: LinkKind::Many,
                    actions: Default::default(),
                }),
                ..Field::new("authors", FieldType::Link)
            },
        );
        let catalogue = Catalogue::new(vec![blog, account_input()]).unwrap();
        let assoc = catalogue.get("blog_authors").unwrap();
        assert!(assoc.is_associative());
        assert_eq!(assoc.system.as_ref().unwrap().model, "blog");
    }

    #[test]
    fn column_selector_resolves_json_path() {
        let mut input = account_input();
        input
            .fields
            .insert("meta".to_string(), Field::new("meta", FieldType::Json));
        let catalogue = Catalogue::new(vec![input]).unwrap();
        let model = catalogue.get("account").unwrap();
        let (_, selector) = catalogue.field(model, "meta.nested").unwrap();
        assert_eq!(selector.render(), "json_extract(\"meta\", '$.nested')");
    }

    #[test]
    fn field_not_found_errors() {
        let catalogue = Catalogue::new(vec![account_input()]).unwrap();
        let model = catalogue.get("account").unwrap();
        let err = catalogue.field(model, "nope").unwrap_err();
        assert!(matches!(err, Error::FieldNotFound { .. }));
    }

    #[test]
    fn unused_index_type_compiles() {
        let _ = Index {
            slug: "by_name".to_string(),
            fields: vec![IndexField {
                field: "name".to_string(),
                order: IndexOrder::Asc,
            }],
            unique: false,
        };
    }
}
