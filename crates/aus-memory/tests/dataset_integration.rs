use aus_backend::{ReleaseResolver, RuleStore, ShutoffRegistry, UpdateQuery};
use aus_memory::{DataSet, DataSetError};
use serde_json::json;
use tempfile::tempdir;

fn sample() -> serde_json::Value {
    json!({
        "rules": [
            {
                "rule_id": 1,
                "priority": 100,
                "product": "Firefox",
                "channel": "release",
                "mapping": "Firefox-60.0-build1",
                "background_rate": 50,
                "fallback_mapping": "Firefox-59.0-build3",
                "update_type": "minor"
            },
            {
                "rule_id": 2,
                "priority": 90,
                "product": "Firefox",
                "channel": "beta*",
                "mapping": "Firefox-61.0b1-build1"
            }
        ],
        "releases": [
            {
                "name": "Firefox-60.0-build1",
                "product": "Firefox",
                "blob": {
                    "schema_version": 1,
                    "name": "Firefox-60.0-build1",
                    "app_version": "60.0",
                    "build_id": "20180501000000"
                }
            }
        ],
        "legacy_releases": [
            {
                "name": "Firefox-59.0-build3",
                "blob": {
                    "schema_version": 1,
                    "name": "Firefox-59.0-build3",
                    "app_version": "59.0",
                    "build_id": "20180301000000"
                }
            }
        ],
        "shutoffs": [
            { "product": "Firefox", "channel": "nightly" }
        ]
    })
}

#[tokio::test]
async fn load_from_disk_populates_every_store() {
    let temp_dir = tempdir().expect("create temp dir");
    let path = temp_dir.path().join("data.json");
    std::fs::write(&path, sample().to_string()).expect("write data set");

    let data_set = DataSet::load(&path).expect("load data set");

    let rules = data_set
        .rule_store()
        .matching_rules(&UpdateQuery::new("Firefox", "release-cck-acme"), "release", None)
        .await
        .expect("match rules");
    assert_eq!(rules.len(), 1);
    assert_eq!(rules[0].background_rate.get(), 50);

    let beta = data_set
        .rule_store()
        .matching_rules(&UpdateQuery::new("Firefox", "beta"), "beta", None)
        .await
        .expect("match rules");
    assert_eq!(beta.iter().map(|r| r.rule_id).collect::<Vec<_>>(), vec![2]);

    assert!(
        data_set
            .release_store()
            .resolve("Firefox-60.0-build1", None)
            .await
            .expect("resolve")
            .is_some()
    );
    assert!(
        data_set
            .legacy_release_store()
            .resolve("Firefox-59.0-build3", None)
            .await
            .expect("resolve")
            .is_some()
    );
    assert_eq!(
        data_set
            .shutoff_registry()
            .shutoffs("Firefox", "nightly", None)
            .await
            .expect("shutoffs")
            .len(),
        1
    );
}

#[test]
fn missing_file_reports_path() {
    let temp_dir = tempdir().expect("create temp dir");
    let path = temp_dir.path().join("absent.json");

    let error = DataSet::load(&path).expect_err("missing file should fail");

    assert!(matches!(error, DataSetError::Read { .. }));
    assert!(error.to_string().contains("absent.json"));
}

#[test]
fn malformed_file_is_a_parse_error() {
    let temp_dir = tempdir().expect("create temp dir");
    let path = temp_dir.path().join("data.json");
    std::fs::write(&path, "{not-valid-json").expect("write data set");

    assert!(matches!(
        DataSet::load(&path),
        Err(DataSetError::Parse(_))
    ));
}
