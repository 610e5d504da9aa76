//! End-to-end query compilation + inflation against a real in-memory
//! SQLite database, exercising `add`/`get`/`set`/`remove`/`count`,
//! `using` preset splicing, and `including` joins together.

use ronin_core::catalog::model::{
    Field, FieldType, LinkInfo, LinkKind, ModelInput, Preset,
};
use ronin_core::catalog::Catalogue;
use ronin_core::config::CompilerConfig;
use ronin_core::driver::FakeDriver;
use ronin_core::ir::{
    Condition, CreateOp, IncludeEntry, Instructions, Query, QueryPayload, Target, UsingEntry,
};
use ronin_core::value::Value;
use ronin_core::{QueryResult, Transaction};
use indexmap::IndexMap;
use std::collections::BTreeMap;

fn author_input() -> ModelInput {
    let mut fields = IndexMap::new();
    fields.insert("name".to_string(), Field::new("name", FieldType::String));

    let mut presets = BTreeMap::new();
    presets.insert(
        "named".to_string(),
        Preset {
            slug: "named".to_string(),
            instructions: Instructions {
                with: Some(Condition::Equals {
                    field: "name".to_string(),
                    value: Value::ValueHole,
                }),
                ..Default::default()
            },
        },
    );

    ModelInput {
        slug: "author".to_string(),
        fields,
        presets,
        ..Default::default()
    }
}

fn post_input() -> ModelInput {
    let mut fields = IndexMap::new();
    fields.insert("title".to_string(), Field::new("title", FieldType::String));
    fields.insert(
        "author".to_string(),
        Field {
            link: Some(LinkInfo {
                target: "author".to_string(),
                kind: LinkKind::One,
                actions: Default::default(),
            }),
            ..Field::new("author", FieldType::String)
        },
    );
    ModelInput {
        slug: "post".to_string(),
        fields,
        ..Default::default()
    }
}

fn setup() -> (Catalogue, FakeDriver) {
    let catalogue = Catalogue::new(vec![author_input(), post_input()]).unwrap();
    let driver = FakeDriver::open_in_memory().unwrap();
    let txn = Transaction::new(&catalogue, &driver, CompilerConfig::default());

    for model in catalogue.models() {
        if model.is_associative() {
            continue;
        }
        let input = ronin_core::ir::ModelDefinition {
            id: Some(model.id.clone()),
            slug: model.slug.clone(),
            plural_slug: Some(model.plural_slug.clone()),
            name: Some(model.name.clone()),
            plural_name: Some(model.plural_name.clone()),
            id_prefix: Some(model.id_prefix.clone()),
            table: Some(model.table.clone()),
            identifiers: Some(model.identifiers.clone()),
            fields: model.fields.clone(),
            indexes: Default::default(),
            presets: model.presets.clone(),
            system: model.system.clone(),
        };
        txn.run(&Query::Create(CreateOp::Model(input)), None).unwrap();
    }

    (catalogue, driver)
}

fn add(txn: &Transaction<FakeDriver>, model: &str, to: BTreeMap<String, Value>) -> serde_json::Value {
    let payload = QueryPayload {
        target: Target::Singular(model.to_string()),
        instructions: Instructions {
            to: Some(to),
            ..Default::default()
        },
    };
    match txn.run(&Query::Add(payload), None).unwrap() {
        QueryResult::Record(Some(record)) => record,
        other => panic!("expected a record, got {other:?}"),
    }
}

#[test]
fn add_then_get_round_trips_a_record() {
    let (catalogue, driver) = setup();
    let txn = Transaction::new(&catalogue, &driver, CompilerConfig::default());

    let mut to = BTreeMap::new();
    to.insert("name".to_string(), Value::from("Ada"));
    let created = add(&txn, "author", to);
    let id = created["id"].as_str().unwrap().to_string();

    let payload = QueryPayload {
        target: Target::Singular("author".to_string()),
        instructions: Instructions {
            with: Some(Condition::Equals {
                field: "id".to_string(),
                value: Value::from(id.clone()),
            }),
            ..Default::default()
        },
    };
    let fetched = match txn.run(&Query::Get(payload), None).unwrap() {
        QueryResult::Record(record) => record,
        other => panic!("expected a record, got {other:?}"),
    };
    assert_eq!(fetched.unwrap()["name"], "Ada");
}

#[test]
fn including_mounts_the_joined_record() {
    let (catalogue, driver) = setup();
    let txn = Transaction::new(&catalogue, &driver, CompilerConfig::default());

    let mut author_fields = BTreeMap::new();
    author_fields.insert("name".to_string(), Value::from("Grace"));
    let author = add(&txn, "author", author_fields);
    let author_id = author["id"].as_str().unwrap().to_string();

    let mut post_fields = BTreeMap::new();
    post_fields.insert("title".to_string(), Value::from("Compilers 101"));
    post_fields.insert("author".to_string(), Value::from(author_id.clone()));
    let post = add(&txn, "post", post_fields);
    let post_id = post["id"].as_str().unwrap().to_string();

    let include_query = Query::Get(QueryPayload {
        target: Target::Singular("author".to_string()),
        instructions: Instructions {
            with: Some(Condition::Equals {
                field: "id".to_string(),
                value: Value::ParentField("author".to_string()),
            }),
            ..Default::default()
        },
    });
    let payload = QueryPayload {
        target: Target::Singular("post".to_string()),
        instructions: Instructions {
            with: Some(Condition::Equals {
                field: "id".to_string(),
                value: Value::from(post_id),
            }),
            including: Some(vec![IncludeEntry {
                mounting_path: "author".to_string(),
                singular: true,
                query: Box::new(include_query),
            }]),
            ..Default::default()
        },
    };

    let record = match txn.run(&Query::Get(payload), None).unwrap() {
        QueryResult::Record(record) => record.unwrap(),
        other => panic!("expected a record, got {other:?}"),
    };
    assert_eq!(record["title"], "Compilers 101");
    assert_eq!(record["author"]["name"], "Grace");
}

#[test]
fn using_splices_a_named_preset() {
    let (catalogue, driver) = setup();
    let txn = Transaction::new(&catalogue, &driver, CompilerConfig::default());

    let mut to = BTreeMap::new();
    to.insert("name".to_string(), Value::from("Margaret"));
    add(&txn, "author", to);
    let mut to = BTreeMap::new();
    to.insert("name".to_string(), Value::from("Katherine"));
    add(&txn, "author", to);

    let payload = QueryPayload {
        target: Target::Plural("authors".to_string()),
        instructions: Instructions {
            using: Some(vec![UsingEntry {
                preset: "named".to_string(),
                argument: Some(Value::from("Margaret")),
            }]),
            ..Default::default()
        },
    };
    let authors = match txn.run(&Query::Get(payload), None).unwrap() {
        QueryResult::Records { records, .. } => records,
        other => panic!("expected records, got {other:?}"),
    };
    assert_eq!(authors.len(), 1);
    assert_eq!(authors[0]["name"], "Margaret");
}

#[test]
fn get_all_and_count_all_expand_per_model_and_group_by_plural_slug() {
    let (catalogue, driver) = setup();
    let txn = Transaction::new(&catalogue, &driver, CompilerConfig::default());

    let mut to = BTreeMap::new();
    to.insert("name".to_string(), Value::from("Ada"));
    add(&txn, "author", to);

    let get_payload = QueryPayload::new(Target::All);
    let grouped = match txn.run(&Query::Get(get_payload), None).unwrap() {
        QueryResult::Grouped(grouped) => grouped,
        other => panic!("expected a grouped result, got {other:?}"),
    };
    assert!(grouped.contains_key("authors"));
    assert!(grouped.contains_key("posts"));
    match &grouped["authors"] {
        QueryResult::Records { records, .. } => assert_eq!(records.len(), 1),
        other => panic!("expected records, got {other:?}"),
    }
    match &grouped["posts"] {
        QueryResult::Records { records, .. } => assert_eq!(records.len(), 0),
        other => panic!("expected records, got {other:?}"),
    }

    let count_payload = QueryPayload::new(Target::All);
    let counted = match txn.run(&Query::Count(count_payload), None).unwrap() {
        QueryResult::Grouped(grouped) => grouped,
        other => panic!("expected a grouped result, got {other:?}"),
    };
    assert_eq!(counted["authors"], QueryResult::Amount(1));
    assert_eq!(counted["posts"], QueryResult::Amount(0));
}

#[test]
fn count_and_remove_operate_on_the_real_table() {
    let (catalogue, driver) = setup();
    let txn = Transaction::new(&catalogue, &driver, CompilerConfig::default());

    let mut to = BTreeMap::new();
    to.insert("name".to_string(), Value::from("Alan"));
    let created = add(&txn, "author", to);
    let id = created["id"].as_str().unwrap().to_string();

    let count_payload = QueryPayload::new(Target::Plural("authors".to_string()));
    let count = match txn.run(&Query::Count(count_payload), None).unwrap() {
        QueryResult::Amount(n) => n,
        other => panic!("expected an amount, got {other:?}"),
    };
    assert_eq!(count, 1);

    let remove_payload = QueryPayload {
        target: Target::Singular("author".to_string()),
        instructions: Instructions {
            with: Some(Condition::Equals {
                field: "id".to_string(),
                value: Value::from(id),
            }),
            ..Default::default()
        },
    };
    txn.run(&Query::Remove(remove_payload), None).unwrap();

    let count_payload = QueryPayload::new(Target::Plural("authors".to_string()));
    let count = match txn.run(&Query::Count(count_payload), None).unwrap() {
        QueryResult::Amount(n) => n,
        other => panic!("expected an amount, got {other:?}"),
    };
    assert_eq!(count, 0);
}
