//! Loader integration tests: metadata files are built through the codec's
//! record writer, so every scenario exercises the real on-disk encoding.

use aquae_codec::metadata::{
    AgreementRecord, ChoiceRecord, ConfidenceAttributeRecord, ImplementingNodeRecord,
    LocationRecord, MatchingSpecRecord, NodeRecord, QuerySpecRecord,
};
use aquae_codec::FederationRecord;
use aquae_metadata::{from_bytes, load, MetadataError};
use aquae_types::IdentityAttribute;

fn node(name: &str, hostname: &str, port: u32, key: &[u8]) -> NodeRecord {
    NodeRecord {
        name: Some(name.into()),
        location: Some(LocationRecord {
            hostname: Some(hostname.into()),
            port: Some(port),
        }),
        certificate: Some(key.to_vec()),
    }
}

fn implementor(node_id: &str, matching: Option<MatchingSpecRecord>) -> ImplementingNodeRecord {
    ImplementingNodeRecord {
        node_id: Some(node_id.into()),
        matching,
    }
}

fn query(name: &str, implementors: Vec<ImplementingNodeRecord>) -> QuerySpecRecord {
    QuerySpecRecord {
        name: Some(name.into()),
        implementors,
        choices: vec![],
    }
}

#[test]
fn load_and_look_up() {
    let federation = FederationRecord {
        nodes: vec![
            node("A", "a.example.org", 7411, &[1]),
            node("B", "b.example.org", 7412, &[2]),
        ],
        agreements: vec![AgreementRecord {
            justification: Some("bus pass eligibility".into()),
        }],
        confidence_attributes: vec![ConfidenceAttributeRecord {
            name: Some("confA".into()),
            description: Some("a supplementary identifier".into()),
        }],
        queries: vec![QuerySpecRecord {
            name: Some("bb?".into()),
            implementors: vec![
                implementor(
                    "A",
                    Some(MatchingSpecRecord {
                        required: vec![IdentityAttribute::Surname, IdentityAttribute::Postcode],
                        ..MatchingSpecRecord::default()
                    }),
                ),
                implementor(
                    "B",
                    Some(MatchingSpecRecord {
                        required: vec![IdentityAttribute::Surname, IdentityAttribute::Postcode],
                        ..MatchingSpecRecord::default()
                    }),
                ),
            ],
            choices: vec![],
        }],
    };

    let snapshot = from_bytes(&federation.encode().unwrap(), "test.meta").unwrap();

    let query = snapshot.find_query("bb?").expect("query must resolve");
    let mut names: Vec<_> = query
        .implementors()
        .map(|i| i.node().name().to_string())
        .collect();
    names.sort();
    assert_eq!(names, vec!["A", "B"]);

    // Both implementors declared identical requirements, so the
    // by-matching-requirements index groups them together.
    let implementor = query.implementors().next().unwrap();
    let matching = implementor.matching_requirements().cloned();
    assert_eq!(
        query.implementors_for_matching(&matching).unwrap().len(),
        2
    );

    // Every reference resolves inside the snapshot.
    assert!(snapshot.find_node("A").is_some());
    assert!(snapshot.find_node("B").is_some());
    assert!(snapshot.find_node_by_key(&[1]).is_some());
    assert!(snapshot.find_confidence_attribute("confA").is_some());
    assert!(snapshot.find_agreement("bus pass eligibility").is_some());
    assert_eq!(snapshot.agreement_count(), 1);
}

#[test]
fn duplicate_node_name_is_fatal() {
    let federation = FederationRecord {
        nodes: vec![
            node("A", "a.example.org", 7411, &[1]),
            node("A", "a2.example.org", 7412, &[2]),
        ],
        ..FederationRecord::default()
    };

    let err = from_bytes(&federation.encode().unwrap(), "dup.meta").unwrap_err();
    match err {
        MetadataError::DuplicateNode { name, file } => {
            assert_eq!(name, "A");
            assert_eq!(file, "dup.meta");
        }
        other => panic!("expected DuplicateNode, got {other:?}"),
    }
}

#[test]
fn duplicate_tls_key_is_fatal() {
    let federation = FederationRecord {
        nodes: vec![
            node("A", "a.example.org", 7411, &[9, 9]),
            node("B", "b.example.org", 7412, &[9, 9]),
        ],
        ..FederationRecord::default()
    };

    let err = from_bytes(&federation.encode().unwrap(), "key.meta").unwrap_err();
    match err {
        MetadataError::DuplicateTlsKey { name, other, .. } => {
            assert_eq!(name, "B");
            assert_eq!(other, "A");
        }
        other => panic!("expected DuplicateTlsKey, got {other:?}"),
    }
}

#[test]
fn forward_reference_in_choice_is_fatal() {
    // Q1 depends on Q2, but Q2 is declared after Q1.
    let federation = FederationRecord {
        nodes: vec![node("A", "a.example.org", 7411, &[1])],
        queries: vec![
            QuerySpecRecord {
                name: Some("Q1".into()),
                implementors: vec![implementor("A", None)],
                choices: vec![ChoiceRecord {
                    required_queries: vec!["Q2".into()],
                }],
            },
            query("Q2", vec![implementor("A", None)]),
        ],
        ..FederationRecord::default()
    };

    let err = from_bytes(&federation.encode().unwrap(), "fwd.meta").unwrap_err();
    match err {
        MetadataError::UnresolvedRequiredQuery {
            query, required, ..
        } => {
            assert_eq!(query, "Q1");
            assert_eq!(required, "Q2");
        }
        other => panic!("expected UnresolvedRequiredQuery, got {other:?}"),
    }
}

#[test]
fn backward_reference_in_choice_resolves() {
    let federation = FederationRecord {
        nodes: vec![node("A", "a.example.org", 7411, &[1])],
        queries: vec![
            query("base", vec![implementor("A", None)]),
            QuerySpecRecord {
                name: Some("derived".into()),
                implementors: vec![implementor("A", None)],
                choices: vec![ChoiceRecord {
                    required_queries: vec!["base".into()],
                }],
            },
        ],
        ..FederationRecord::default()
    };

    let snapshot = from_bytes(&federation.encode().unwrap(), "dag.meta").unwrap();
    let derived = snapshot.find_query("derived").unwrap();
    assert_eq!(derived.choice_count(), 1);
    let choice = derived.choices().next().unwrap();
    assert_eq!(choice.query_names().collect::<Vec<_>>(), vec!["base"]);
}

#[test]
fn self_reference_in_choice_is_fatal() {
    let federation = FederationRecord {
        nodes: vec![node("A", "a.example.org", 7411, &[1])],
        queries: vec![QuerySpecRecord {
            name: Some("loop?".into()),
            implementors: vec![implementor("A", None)],
            choices: vec![ChoiceRecord {
                required_queries: vec!["loop?".into()],
            }],
        }],
        ..FederationRecord::default()
    };

    assert!(matches!(
        from_bytes(&federation.encode().unwrap(), "cycle.meta").unwrap_err(),
        MetadataError::UnresolvedRequiredQuery { .. }
    ));
}

#[test]
fn equivalent_choices_are_fatal_after_canonicalisation() {
    let federation = FederationRecord {
        nodes: vec![node("A", "a.example.org", 7411, &[1])],
        queries: vec![
            query("q1", vec![implementor("A", None)]),
            query("q2", vec![implementor("A", None)]),
            QuerySpecRecord {
                name: Some("top".into()),
                implementors: vec![implementor("A", None)],
                choices: vec![
                    ChoiceRecord {
                        required_queries: vec!["q1".into(), "q2".into()],
                    },
                    ChoiceRecord {
                        required_queries: vec!["q2".into(), "q1".into()],
                    },
                ],
            },
        ],
        ..FederationRecord::default()
    };

    assert!(matches!(
        from_bytes(&federation.encode().unwrap(), "choice.meta").unwrap_err(),
        MetadataError::Graph { .. }
    ));
}

#[test]
fn query_without_implementors_is_fatal() {
    let federation = FederationRecord {
        nodes: vec![node("A", "a.example.org", 7411, &[1])],
        queries: vec![query("empty?", vec![])],
        ..FederationRecord::default()
    };

    assert!(matches!(
        from_bytes(&federation.encode().unwrap(), "none.meta").unwrap_err(),
        MetadataError::NoImplementors { .. }
    ));
}

#[test]
fn undeclared_implementing_node_is_fatal() {
    let federation = FederationRecord {
        queries: vec![query("bb?", vec![implementor("ghost", None)])],
        ..FederationRecord::default()
    };

    let err = from_bytes(&federation.encode().unwrap(), "ghost.meta").unwrap_err();
    match err {
        MetadataError::UnresolvedNode { query, node, .. } => {
            assert_eq!(query, "bb?");
            assert_eq!(node, "ghost");
        }
        other => panic!("expected UnresolvedNode, got {other:?}"),
    }
}

#[test]
fn duplicate_required_attribute_is_fatal() {
    let federation = FederationRecord {
        nodes: vec![node("A", "a.example.org", 7411, &[1])],
        queries: vec![query(
            "bb?",
            vec![implementor(
                "A",
                Some(MatchingSpecRecord {
                    required: vec![IdentityAttribute::Surname, IdentityAttribute::Surname],
                    ..MatchingSpecRecord::default()
                }),
            )],
        )],
        ..FederationRecord::default()
    };

    assert!(matches!(
        from_bytes(&federation.encode().unwrap(), "dup-attr.meta").unwrap_err(),
        MetadataError::DuplicateMatchingEntry {
            list: "required field",
            ..
        }
    ));
}

#[test]
fn undeclared_confidence_builder_is_fatal() {
    let federation = FederationRecord {
        nodes: vec![node("A", "a.example.org", 7411, &[1])],
        queries: vec![query(
            "bb?",
            vec![implementor(
                "A",
                Some(MatchingSpecRecord {
                    confidence_builders: vec!["ghost-attribute".into()],
                    ..MatchingSpecRecord::default()
                }),
            )],
        )],
        ..FederationRecord::default()
    };

    let err = from_bytes(&federation.encode().unwrap(), "conf.meta").unwrap_err();
    match err {
        MetadataError::UnresolvedConfidenceAttribute { attribute, .. } => {
            assert_eq!(attribute, "ghost-attribute");
        }
        other => panic!("expected UnresolvedConfidenceAttribute, got {other:?}"),
    }
}

#[test]
fn missing_node_hostname_names_the_node() {
    let federation = FederationRecord {
        nodes: vec![NodeRecord {
            name: Some("A".into()),
            location: Some(LocationRecord {
                hostname: None,
                port: Some(7411),
            }),
            certificate: Some(vec![1]),
        }],
        ..FederationRecord::default()
    };

    let err = from_bytes(&federation.encode().unwrap(), "host.meta").unwrap_err();
    match err {
        MetadataError::MissingField {
            record,
            name,
            field,
            ..
        } => {
            assert_eq!(record, "node");
            assert_eq!(name, "A");
            assert_eq!(field, "hostname");
        }
        other => panic!("expected MissingField, got {other:?}"),
    }
}

#[test]
fn loads_from_a_file_on_disk() {
    let federation = FederationRecord {
        nodes: vec![node("A", "a.example.org", 7411, &[1])],
        queries: vec![query("bb?", vec![implementor("A", None)])],
        ..FederationRecord::default()
    };

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("federation.meta");
    std::fs::write(&path, federation.encode().unwrap()).unwrap();

    let snapshot = load(&path).unwrap();
    assert_eq!(snapshot.node_count(), 1);
    assert!(snapshot.find_query("bb?").is_some());
    assert!(snapshot.origin().ends_with("federation.meta"));
}

#[test]
fn missing_file_is_an_io_error() {
    assert!(matches!(
        load("/nonexistent/federation.meta").unwrap_err(),
        MetadataError::Io { .. }
    ));
}
