use serde_json::json;
use tracegraph::document::{EventKind, GraphDocument, SchemaVersion};
use tracegraph::recorder::Recorder;

fn sample_document() -> GraphDocument {
    let mut rec = Recorder::new("01_hello_chain");
    rec.add_tag("lesson");
    rec.register_node("prompt", "PromptTemplate", "prompt").unwrap();
    rec.register_node("llm", "Groq:mixtral-8x7b", "llm").unwrap();
    rec.register_edge_labeled("prompt", "llm", Some("formatted"));
    rec.add_group(
        "hello_chain",
        "Hello Chain",
        vec!["prompt".to_string(), "llm".to_string()],
        "chain",
    );

    let step = rec.begin_step_with_input("llm", "Explain X");
    rec.end_step_with_output(step, "X is...");
    rec.attach_artifact(
        "llm",
        json!({"output": "X is...", "model": "mixtral-8x7b"})
            .as_object()
            .cloned()
            .unwrap(),
    );
    rec.add_token_usage(12, 48);
    rec.set_cost(0.0003);
    rec.record_error(Some("llm".to_string()), "rate limited once");
    rec.export()
}

#[test]
fn round_trip_is_field_equal() {
    let doc = sample_document();
    let encoded = doc.to_json_string().unwrap();
    let decoded = GraphDocument::from_json_str(&encoded).unwrap();
    assert_eq!(doc, decoded);

    // Pretty form decodes to the same document too.
    let pretty = doc.to_json_pretty().unwrap();
    assert_eq!(GraphDocument::from_json_str(&pretty).unwrap(), doc);
}

#[test]
fn absent_version_defaults_to_oldest_supported() {
    let body = json!({
        "metadata": {
            "run_id": "r1",
            "created_at": "2025-06-01T12:00:00Z",
            "lesson_id": "01_hello_chain",
        },
        "nodes": [],
        "edges": [],
        "events": [],
        "artifacts": {},
        "run": {"latency_ms": 0, "tokens_in": 0, "tokens_out": 0},
    });
    let doc = GraphDocument::from_json_value(body).unwrap();
    assert_eq!(doc.metadata.version, "1.1");
    assert_eq!(doc.schema_version().unwrap(), SchemaVersion::V1_1);
}

#[test]
fn camel_case_spellings_are_accepted_on_input() {
    let body = json!({
        "metadata": {
            "schemaVersion": "1.2",
            "runId": "r2",
            "createdAt": "2025-06-01T12:00:00Z",
            "subjectId": "02_prompt_patterns",
        },
        "nodes": [{"id": "llm", "label": "LLM", "type": "llm", "data": {}}],
        "edges": [],
        "events": [
            {"timestampMs": 5, "kind": "invoke_start", "nodeId": "llm", "payload": {}}
        ],
        "artifacts": {},
        "run": {"latency_ms": 9, "tokens_in": 0, "tokens_out": 0},
    });
    let doc = GraphDocument::from_json_value(body).unwrap();
    assert_eq!(doc.schema_version().unwrap(), SchemaVersion::V1_2);
    assert_eq!(doc.metadata.subject_id, "02_prompt_patterns");
    assert_eq!(doc.events[0].ts_ms, 5);
}

#[test]
fn unsupported_version_is_refused() {
    let mut doc = sample_document();
    doc.metadata.version = "9.9".to_string();
    let err = doc.schema_version().unwrap_err();
    assert_eq!(err.version, "9.9");
}

#[test]
fn unknown_event_kind_survives_round_trip() {
    let mut doc = sample_document();
    doc.events.push(tracegraph::document::EventRecord {
        ts_ms: doc.events.last().map(|e| e.ts_ms).unwrap_or(0),
        kind: EventKind::from("speculative_decode"),
        node_id: Some("llm".to_string()),
        edge_id: None,
        payload: json!({"chunks": 3}),
    });

    let encoded = doc.to_json_string().unwrap();
    assert!(encoded.contains("\"speculative_decode\""));
    let decoded = GraphDocument::from_json_str(&encoded).unwrap();
    assert_eq!(decoded, doc);
    assert_eq!(
        decoded.events.last().unwrap().kind,
        EventKind::Other("speculative_decode".to_string())
    );
}

#[test]
fn audit_flags_unmatched_invoke_end() {
    let mut doc = sample_document();
    doc.events.push(tracegraph::document::EventRecord {
        ts_ms: 999,
        kind: EventKind::InvokeEnd,
        node_id: Some("prompt".to_string()),
        edge_id: None,
        payload: serde_json::Value::Null,
    });

    let anomalies = doc.audit_events();
    assert_eq!(anomalies.len(), 1);
    assert_eq!(anomalies[0].node_id.as_deref(), Some("prompt"));
    assert!(anomalies[0].message.contains("invoke_end"));
}

#[test]
fn audit_flags_events_claiming_both_node_and_edge() {
    let mut doc = sample_document();
    doc.events.push(tracegraph::document::EventRecord {
        ts_ms: 999,
        kind: EventKind::Parse,
        node_id: Some("llm".to_string()),
        edge_id: Some("prompt->llm".to_string()),
        payload: serde_json::Value::Null,
    });

    let anomalies = doc.audit_events();
    assert_eq!(anomalies.len(), 1);
    assert_eq!(anomalies[0].node_id.as_deref(), Some("llm"));
    assert!(anomalies[0].message.contains("both node"));
    assert!(anomalies[0].message.contains("prompt->llm"));
}

#[test]
fn audit_flags_decreasing_timestamps() {
    let mut doc = sample_document();
    doc.events.push(tracegraph::document::EventRecord {
        ts_ms: 0,
        kind: EventKind::Parse,
        node_id: None,
        edge_id: None,
        payload: serde_json::Value::Null,
    });
    doc.events.insert(
        0,
        tracegraph::document::EventRecord {
            ts_ms: 50_000,
            kind: EventKind::Parse,
            node_id: None,
            edge_id: None,
            payload: serde_json::Value::Null,
        },
    );

    let anomalies = doc.audit_events();
    assert!(anomalies
        .iter()
        .any(|a| a.message.contains("timestamp decreased")));
}

#[test]
fn matched_steps_produce_no_anomalies() {
    let doc = sample_document();
    assert!(doc.audit_events().is_empty());
}
