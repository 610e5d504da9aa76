//! End-to-end schema evolution: diff two catalogues, execute the resulting
//! queries against a real in-memory SQLite database via `FakeDriver`, and
//! confirm the data and shape that come out the other side.

use ronin_core::catalog::model::{Field, FieldType, ModelInput};
use ronin_core::catalog::Catalogue;
use ronin_core::config::CompilerConfig;
use ronin_core::diff;
use ronin_core::diff::{diff_all, diff_with_candidates, AutoRename, NoRename};
use ronin_core::driver::FakeDriver;
use ronin_core::ir::{AlterOp, CreateOp, DropOp, Instructions, Query, QueryPayload, Target};
use ronin_core::value::Value;
use ronin_core::{migration, QueryResult, Transaction};
use indexmap::IndexMap;
use std::collections::BTreeMap;

fn widget_input(count_required: bool) -> ModelInput {
    let mut fields = IndexMap::new();
    fields.insert(
        "count".to_string(),
        Field {
            required: count_required,
            ..Field::new("count", FieldType::Number)
        },
    );
    ModelInput {
        slug: "widget".to_string(),
        fields,
        ..Default::default()
    }
}

fn apply_all(txn: &Transaction<FakeDriver>, queries: &[Query]) {
    for query in queries {
        txn.run(query, None).unwrap();
    }
}

#[test]
fn adjusted_field_attribute_triggers_temp_table_rewrite_and_preserves_rows() {
    let existing = Catalogue::new(vec![widget_input(false)]).unwrap();
    let defined = Catalogue::new(vec![widget_input(true)]).unwrap();
    let old_model = existing.get("widget").unwrap();
    let new_model = defined.get("widget").unwrap();

    let queries = diff::temp_table::rewrite_via_temp_table(old_model, new_model, &[]);
    let Query::Create(CreateOp::Model(temp_input)) = &queries[0] else {
        panic!("expected the rewrite to start with a temp model create");
    };
    assert!(temp_input.slug != old_model.slug);
    assert!(
        queries.iter().any(|q| matches!(q, Query::Drop(DropOp::Model(slug)) if slug == "widget")),
        "expected the temp-table rewrite to drop the original table"
    );
    assert!(queries.iter().any(|q| matches!(
        q,
        Query::Alter(AlterOp::ModelTo { model, to }) if model == &temp_input.slug && to.slug.as_deref() == Some("widget")
    )));

    // A catalogue spanning both the original and the synthetic temp model
    // lets every step of the rewrite compile, mirroring how a caller would
    // track catalogue state across a migration it applies incrementally.
    let driver = FakeDriver::open_in_memory().unwrap();
    let step_catalogue = Catalogue::new(vec![widget_input(false), temp_input.clone()]).unwrap();
    let txn = Transaction::new(&step_catalogue, &driver, CompilerConfig::default());

    txn.run(&Query::Create(CreateOp::Model(widget_input(false))), None)
        .unwrap();

    let mut to = BTreeMap::new();
    to.insert("count".to_string(), Value::from(5.0));
    let payload = QueryPayload {
        target: Target::Singular("widget".to_string()),
        instructions: Instructions {
            to: Some(to),
            ..Default::default()
        },
    };
    txn.run(&Query::Add(payload), None).unwrap();

    apply_all(&txn, &queries);

    let new_txn = Transaction::new(&defined, &driver, CompilerConfig::default());
    let get_payload = QueryPayload::new(Target::Plural("widgets".to_string()));
    let records = match new_txn.run(&Query::Get(get_payload), None).unwrap() {
        QueryResult::Records { records, .. } => records,
        other => panic!("expected records, got {other:?}"),
    };
    assert_eq!(records.len(), 1);
    assert_eq!(records[0]["count"], 5.0);
}

#[test]
fn renamed_model_is_detected_and_migrated_in_place() {
    let mut post_fields = IndexMap::new();
    post_fields.insert("title".to_string(), Field::new("title", FieldType::String));
    let post = ModelInput {
        slug: "post".to_string(),
        fields: post_fields.clone(),
        ..Default::default()
    };
    let article = ModelInput {
        slug: "article".to_string(),
        fields: post_fields,
        ..Default::default()
    };

    let existing = Catalogue::new(vec![post]).unwrap();
    let defined = Catalogue::new(vec![article]).unwrap();

    let driver = FakeDriver::open_in_memory().unwrap();
    let txn = Transaction::new(&existing, &driver, CompilerConfig::default());
    txn.run(&Query::Create(CreateOp::Model(titled_model_input("post"))), None)
        .unwrap();

    let mut to = BTreeMap::new();
    to.insert("title".to_string(), Value::from("Hello"));
    let add_payload = QueryPayload {
        target: Target::Singular("post".to_string()),
        instructions: Instructions {
            to: Some(to),
            ..Default::default()
        },
    };
    txn.run(&Query::Add(add_payload), None).unwrap();

    let queries = diff_with_candidates(&existing, &defined, &AutoRename).unwrap();
    assert!(queries
        .iter()
        .any(|q| matches!(q, Query::Alter(AlterOp::ModelTo { model, to }) if model == "post" && to.slug.as_deref() == Some("article"))));

    apply_all(&txn, &queries);

    let new_txn = Transaction::new(&defined, &driver, CompilerConfig::default());
    let get_payload = QueryPayload::new(Target::Singular("article".to_string()));
    let record = match new_txn.run(&Query::Get(get_payload), None).unwrap() {
        QueryResult::Record(record) => record,
        other => panic!("expected a record, got {other:?}"),
    };
    assert_eq!(record.unwrap()["title"], "Hello");
}

fn titled_model_input(slug: &str) -> ModelInput {
    let mut fields = IndexMap::new();
    fields.insert("title".to_string(), Field::new("title", FieldType::String));
    ModelInput {
        slug: slug.to_string(),
        fields,
        ..Default::default()
    }
}

#[test]
fn rejecting_a_rename_candidate_falls_back_to_drop_and_create() {
    let mut post_fields = IndexMap::new();
    post_fields.insert("title".to_string(), Field::new("title", FieldType::String));
    let post = ModelInput {
        slug: "post".to_string(),
        fields: post_fields.clone(),
        ..Default::default()
    };
    let article = ModelInput {
        slug: "article".to_string(),
        fields: post_fields,
        ..Default::default()
    };

    let existing = Catalogue::new(vec![post]).unwrap();
    let defined = Catalogue::new(vec![article]).unwrap();

    let queries = diff_with_candidates(&existing, &defined, &NoRename).unwrap();
    assert!(queries
        .iter()
        .any(|q| matches!(q, Query::Drop(DropOp::Model(slug)) if slug == "post")));
    assert!(queries
        .iter()
        .any(|q| matches!(q, Query::Create(CreateOp::Model(m)) if m.slug == "article")));
    assert!(!queries
        .iter()
        .any(|q| matches!(q, Query::Alter(AlterOp::ModelTo { .. }))));
}

#[test]
fn a_written_migration_carrying_a_temp_table_rewrite_compiles_its_sql_sidecar() {
    let dir = tempfile::tempdir().unwrap();
    let existing = Catalogue::new(vec![widget_input(false)]).unwrap();
    let defined = Catalogue::new(vec![widget_input(true)]).unwrap();

    let queries = diff_all(&existing, &defined).unwrap();
    assert!(queries
        .iter()
        .any(|q| matches!(q, Query::Create(CreateOp::Model(m)) if m.slug.starts_with("RONIN_TEMP_"))));

    let written = migration::write_next(dir.path(), &defined, &queries).unwrap();
    assert_eq!(written.number, 1);

    let sql_sidecar_path = dir.path().join("migration-0001.sql");
    let sidecar = std::fs::read_to_string(sql_sidecar_path).unwrap();
    assert!(sidecar.contains("CREATE TABLE"));
    assert!(sidecar.contains("widgets"));
}

#[test]
fn a_written_migration_reloads_and_replays_against_a_fresh_database() {
    let dir = tempfile::tempdir().unwrap();
    let existing = Catalogue::new(vec![]).unwrap();
    let defined = Catalogue::new(vec![widget_input(false)]).unwrap();

    let queries = diff_all(&existing, &defined).unwrap();
    let written = migration::write_next(dir.path(), &defined, &queries).unwrap();
    assert_eq!(written.number, 1);

    let loaded = migration::load_all(dir.path()).unwrap();
    assert_eq!(loaded.len(), 1);

    let driver = FakeDriver::open_in_memory().unwrap();
    let txn = Transaction::new(&defined, &driver, CompilerConfig::default());
    apply_all(&txn, &loaded[0].queries);

    let mut to = BTreeMap::new();
    to.insert("count".to_string(), Value::from(1.0));
    let add_payload = QueryPayload {
        target: Target::Singular("widget".to_string()),
        instructions: Instructions {
            to: Some(to),
            ..Default::default()
        },
    };
    let created = match txn.run(&Query::Add(add_payload), None).unwrap() {
        QueryResult::Record(Some(record)) => record,
        other => panic!("expected a record, got {other:?}"),
    };
    assert_eq!(created["count"], 1.0);

    let sql_sidecar_path = dir.path().join("migration-0001.sql");
    let sidecar = std::fs::read_to_string(sql_sidecar_path).unwrap();
    assert!(sidecar.contains("CREATE TABLE"));
}
