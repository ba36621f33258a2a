// SPDX-License-Identifier: PMPL-1.0-or-later

//! File-driven setup: config files, rule catalogs, row imports

use serde_json::json;
use std::fs;
use tempfile::TempDir;
use triplog::kanren::{parse_query, RuleCatalog, SearchMode};
use triplog::{Config, Database, PullKey, Term};

fn create_test_file(dir: &TempDir, name: &str, content: &str) -> std::path::PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, content).unwrap();
    path
}

const RULES: &str = r#"[
    {
        "name": "adult",
        "head": ["?p", "adult", true],
        "body": [["?p", "age", "?n"], {"compare": "ge", "args": ["?n", 18]}]
    },
    {
        "name": "sibling",
        "head": ["?a", "sibling", "?b"],
        "body": [
            ["?f", "father_of", "?a"],
            ["?f", "father_of", "?b"],
            {"neq": ["?a", "?b"]}
        ]
    }
]"#;

const CONFIG: &str = "\
schema:
  father_of:
    many: true
    reference: true
  sibling:
    many: true
limit: 5
";

fn family(dir: &TempDir) -> Database {
    let config = Config::from_file(&create_test_file(dir, "triplog.yaml", CONFIG))
        .expect("yaml config loads");
    let catalog = RuleCatalog::from_file(&create_test_file(dir, "rules.json", RULES))
        .expect("catalog loads");
    assert_eq!(catalog.len(), 2);

    let mut db = config.build_database();
    db.load_entities(&json!({
        "adam": {"name": "Adam", "age": 130, "father_of": ["cain", "abel"]},
        "cain": {"name": "Cain", "age": 100},
        "abel": {"name": "Abel", "age": 12}
    }))
    .unwrap();
    catalog.apply_to(&mut db);
    db
}

#[test]
fn test_catalog_rules_answer_queries() {
    let dir = TempDir::new().unwrap();
    let db = family(&dir);

    let query = parse_query(r#"[["?p", "adult", true], ["?p", "name", "?name"]]"#).unwrap();
    let names: Vec<Term> = db
        .run(query)
        .map(|row| row.unwrap().get("name").cloned().unwrap())
        .collect();
    assert_eq!(names, vec![Term::str("Adam"), Term::str("Cain")]);
}

#[test]
fn test_pull_through_derived_relation() {
    let dir = TempDir::new().unwrap();
    let db = family(&dir);

    let keys: Vec<PullKey> =
        serde_json::from_str(r#"["name", {"sibling": ["name", "age"]}]"#).unwrap();
    assert_eq!(
        db.pull(&Term::str("cain"), &keys).unwrap(),
        json!({"name": "Cain", "sibling": [{"name": "Abel", "age": 12}]})
    );
    assert_eq!(
        db.pull(&Term::str("adam"), &[PullKey::attr("sibling")]).unwrap(),
        json!({"sibling": []})
    );
}

#[test]
fn test_config_formats() {
    let dir = TempDir::new().unwrap();

    let yaml = Config::from_file(&create_test_file(&dir, "a.yml", CONFIG)).unwrap();
    assert_eq!(yaml.limit, Some(5));
    assert!(yaml.schema.is_many("sibling"));
    assert!(!yaml.schema.get("sibling").reference);

    let json = Config::from_file(&create_test_file(
        &dir,
        "b.json",
        r#"{"search": "full_scan", "trace": false}"#,
    ))
    .unwrap();
    assert_eq!(json.search, SearchMode::FullScan);

    assert!(Config::from_file(&create_test_file(&dir, "c.toml", "limit = 1")).is_err());
    assert!(Config::from_file(&dir.path().join("missing.yaml")).is_err());
}

#[test]
fn test_broken_catalog_names_the_rule() {
    let dir = TempDir::new().unwrap();
    let path = create_test_file(
        &dir,
        "broken.json",
        r#"[{"name": "broken", "head": ["?x", "r", "?"], "body": []}]"#,
    );
    let err = RuleCatalog::from_file(&path).unwrap_err();
    assert!(format!("{:#}", err).contains("broken"));
}

#[test]
fn test_load_rows_is_all_or_nothing() {
    let mut db = Database::new();
    let added = db
        .load_rows(
            &[
                json!({"id": "x", "kind": "a", "tags": ["t1", "t2"]}),
                json!({"id": 7, "kind": "b"}),
            ],
            "id",
        )
        .unwrap();
    assert_eq!(added, 4);
    assert_eq!(db.find(7, "kind").unwrap(), Some(Term::str("b")));

    let err = db
        .load_rows(&[json!({"id": "z", "kind": "c"}), json!({"kind": "d"})], "id")
        .unwrap_err();
    assert!(err.to_string().contains("row 1 has no `id` identifier"));
    assert_eq!(db.store().fact_count(), 4);
    assert!(!db.store().has_entity(&Term::str("z")));
}
