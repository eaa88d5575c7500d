//! Configuration loading against real files on disk.

use std::sync::Arc;

use aquae_codec::metadata::{
    ImplementingNodeRecord, LocationRecord, NodeRecord, QuerySpecRecord,
};
use aquae_codec::FederationRecord;
use aquae_config::{ConfigError, DaemonConfig};

fn sample_metadata() -> FederationRecord {
    FederationRecord {
        nodes: vec![NodeRecord {
            name: Some("school".into()),
            location: Some(LocationRecord {
                hostname: Some("school.example.org".into()),
                port: Some(7411),
            }),
            certificate: Some(vec![1, 2, 3]),
        }],
        queries: vec![QuerySpecRecord {
            name: Some("bb?".into()),
            implementors: vec![ImplementingNodeRecord {
                node_id: Some("school".into()),
                matching: None,
            }],
            choices: vec![],
        }],
        ..FederationRecord::default()
    }
}

fn write_metadata(dir: &std::path::Path) -> std::path::PathBuf {
    let path = dir.join("federation.meta");
    std::fs::write(&path, sample_metadata().encode().unwrap()).unwrap();
    path
}

#[test]
fn loads_and_resolves_a_listener() {
    let dir = tempfile::tempdir().unwrap();
    let metadata_path = write_metadata(dir.path());

    let config_path = dir.path().join("aquaed.toml");
    std::fs::write(
        &config_path,
        format!(
            r#"
[[listener]]
node_name = "school"
port = 7411
metadata_file = {metadata_path:?}
query = ["bb?"]
"#
        ),
    )
    .unwrap();

    let config = DaemonConfig::load(&config_path).unwrap();
    let bindings = config.resolve().unwrap();

    assert_eq!(bindings.len(), 1);
    let binding = &bindings[0];
    assert_eq!(binding.node_name, "school");
    assert_eq!(binding.port, 7411);
    assert_eq!(binding.queries, vec!["bb?"]);
    assert!(binding.federation.find_query("bb?").is_some());
}

#[test]
fn identical_metadata_paths_share_one_snapshot() {
    let dir = tempfile::tempdir().unwrap();
    let metadata_path = write_metadata(dir.path());

    let config_path = dir.path().join("aquaed.toml");
    std::fs::write(
        &config_path,
        format!(
            r#"
[[listener]]
node_name = "school"
port = 7411
metadata_file = {metadata_path:?}

[[listener]]
node_name = "school"
port = 7412
metadata_file = {metadata_path:?}
"#
        ),
    )
    .unwrap();

    let bindings = DaemonConfig::load(&config_path).unwrap().resolve().unwrap();
    assert_eq!(bindings.len(), 2);
    assert!(Arc::ptr_eq(
        &bindings[0].federation,
        &bindings[1].federation
    ));
}

#[test]
fn missing_required_field_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let config_path = dir.path().join("aquaed.toml");
    std::fs::write(
        &config_path,
        r#"
[[listener]]
node_name = "school"
metadata_file = "federation.meta"
"#,
    )
    .unwrap();

    assert!(matches!(
        DaemonConfig::load(&config_path).unwrap_err(),
        ConfigError::Parse { .. }
    ));
}

#[test]
fn port_zero_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let config_path = dir.path().join("aquaed.toml");
    std::fs::write(
        &config_path,
        r#"
[[listener]]
node_name = "school"
port = 0
metadata_file = "federation.meta"
"#,
    )
    .unwrap();

    assert!(matches!(
        DaemonConfig::load(&config_path).unwrap_err(),
        ConfigError::InvalidPort { index: 0, .. }
    ));
}

#[test]
fn out_of_range_port_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let config_path = dir.path().join("aquaed.toml");
    std::fs::write(
        &config_path,
        r#"
[[listener]]
node_name = "school"
port = 70000
metadata_file = "federation.meta"
"#,
    )
    .unwrap();

    assert!(matches!(
        DaemonConfig::load(&config_path).unwrap_err(),
        ConfigError::Parse { .. }
    ));
}

#[test]
fn missing_metadata_file_fails_resolution() {
    let dir = tempfile::tempdir().unwrap();
    let config_path = dir.path().join("aquaed.toml");
    std::fs::write(
        &config_path,
        r#"
[[listener]]
node_name = "school"
port = 7411
metadata_file = "/nonexistent/federation.meta"
"#,
    )
    .unwrap();

    let config = DaemonConfig::load(&config_path).unwrap();
    assert!(matches!(
        config.resolve().unwrap_err(),
        ConfigError::BadMetadataPath { .. }
    ));
}

#[test]
fn broken_metadata_fails_resolution() {
    let dir = tempfile::tempdir().unwrap();
    // Duplicate node: the loader must reject this file.
    let record = FederationRecord {
        nodes: vec![
            NodeRecord {
                name: Some("A".into()),
                location: Some(LocationRecord {
                    hostname: Some("a.example.org".into()),
                    port: Some(7411),
                }),
                certificate: Some(vec![1]),
            },
            NodeRecord {
                name: Some("A".into()),
                location: Some(LocationRecord {
                    hostname: Some("a.example.org".into()),
                    port: Some(7411),
                }),
                certificate: Some(vec![2]),
            },
        ],
        ..FederationRecord::default()
    };
    let metadata_path = dir.path().join("broken.meta");
    std::fs::write(&metadata_path, record.encode().unwrap()).unwrap();

    let config_path = dir.path().join("aquaed.toml");
    std::fs::write(
        &config_path,
        format!(
            r#"
[[listener]]
node_name = "A"
port = 7411
metadata_file = {metadata_path:?}
"#
        ),
    )
    .unwrap();

    let config = DaemonConfig::load(&config_path).unwrap();
    assert!(matches!(
        config.resolve().unwrap_err(),
        ConfigError::Metadata(_)
    ));
}

#[test]
fn unknown_node_name_and_queries_warn_but_resolve() {
    let dir = tempfile::tempdir().unwrap();
    let metadata_path = write_metadata(dir.path());

    let config_path = dir.path().join("aquaed.toml");
    // Node name and offered query that the metadata does not declare, and a
    // port differing from the node's declared one: all warnings only.
    std::fs::write(
        &config_path,
        format!(
            r#"
[[listener]]
node_name = "unknown-node"
port = 9999
metadata_file = {metadata_path:?}
query = ["nonexistent?"]
"#
        ),
    )
    .unwrap();

    let bindings = DaemonConfig::load(&config_path).unwrap().resolve().unwrap();
    assert_eq!(bindings.len(), 1);
}
