use std::collections::BTreeMap;

use serde_json::json;
use tracegraph::document::{
    ArtifactRecord, EventKind, EventRecord, GraphDocument, Metadata, NodeRecord, RunSummary,
};
use tracegraph::normalize::CanonicalCategory;
use tracegraph::project::{ArtifactLayout, ArtifactView, Projector};
use tracegraph::recorder::Recorder;

fn record(value: serde_json::Value) -> ArtifactRecord {
    value.as_object().cloned().unwrap()
}

fn document(version: &str) -> GraphDocument {
    GraphDocument {
        metadata: Metadata {
            version: version.to_string(),
            run_id: "r1".to_string(),
            created_at: "2025-06-01T12:00:00Z".parse().unwrap(),
            subject_id: "demo".to_string(),
            tags: Vec::new(),
        },
        nodes: vec![
            NodeRecord {
                id: "prompt".to_string(),
                label: "PromptTemplate".to_string(),
                ty: "prompt".to_string(),
                ..NodeRecord::default()
            },
            NodeRecord {
                id: "llm".to_string(),
                label: "Groq:mixtral".to_string(),
                ty: "llm".to_string(),
                ..NodeRecord::default()
            },
        ],
        ports: Vec::new(),
        edges: Vec::new(),
        groups: Vec::new(),
        events: Vec::new(),
        artifacts: BTreeMap::new(),
        run: RunSummary::default(),
    }
}

#[test]
fn node_keyed_layout_reads_flat_bags() {
    let mut doc = document("1.1");
    doc.artifacts.insert(
        "prompt".to_string(),
        record(json!({
            "prompt": "Explain {topic}",
            "resolved_prompt": "Explain X",
            "input_variables": ["topic"],
        })),
    );

    let projector = Projector::for_document(&doc).unwrap();
    assert_eq!(projector.layout(), ArtifactLayout::NodeKeyed);

    match projector.view(CanonicalCategory::PromptTemplate, "prompt") {
        ArtifactView::PromptTemplate(view) => {
            assert_eq!(view.template.as_deref(), Some("Explain {topic}"));
            assert_eq!(view.resolved_prompt.as_deref(), Some("Explain X"));
            assert_eq!(view.input_variables, vec!["topic"]);
        }
        other => panic!("unexpected view: {other:?}"),
    }
}

#[test]
fn event_previews_fill_missing_artifact_fields() {
    // No artifacts recorded at all; input/output come from the step events.
    let mut doc = document("1.1");
    doc.events = vec![
        EventRecord {
            ts_ms: 1,
            kind: EventKind::InvokeStart,
            node_id: Some("llm".to_string()),
            edge_id: None,
            payload: json!({"input": "Explain X"}),
        },
        EventRecord {
            ts_ms: 9,
            kind: EventKind::InvokeEnd,
            node_id: Some("llm".to_string()),
            edge_id: None,
            payload: json!({"output": "X is...", "elapsed_ms": 8}),
        },
    ];

    let projector = Projector::for_document(&doc).unwrap();
    match projector.view(CanonicalCategory::LanguageModel, "llm") {
        ArtifactView::LanguageModel(view) => {
            assert_eq!(view.input.as_deref(), Some("Explain X"));
            assert_eq!(view.output.as_deref(), Some("X is..."));
        }
        other => panic!("unexpected view: {other:?}"),
    }
}

#[test]
fn artifact_fields_win_over_event_previews() {
    let mut doc = document("1.1");
    doc.events = vec![EventRecord {
        ts_ms: 9,
        kind: EventKind::InvokeEnd,
        node_id: Some("llm".to_string()),
        edge_id: None,
        payload: json!({"output": "preview, possibly truncated"}),
    }];
    doc.artifacts.insert(
        "llm".to_string(),
        record(json!({"output": "full output", "model": "mixtral"})),
    );

    let projector = Projector::for_document(&doc).unwrap();
    match projector.view(CanonicalCategory::LanguageModel, "llm") {
        ArtifactView::LanguageModel(view) => {
            assert_eq!(view.output.as_deref(), Some("full output"));
            assert_eq!(view.model.as_deref(), Some("mixtral"));
        }
        other => panic!("unexpected view: {other:?}"),
    }
}

#[test]
fn role_keyed_layout_resolves_prefixed_and_role_keys() {
    let mut doc = document("1.2");
    // "llm_response" associates by node-id prefix; "final_prompt" carries
    // no node id and attaches through its implied category.
    doc.artifacts.insert(
        "llm_response".to_string(),
        record(json!({"type": "output", "content": "X is...", "size_bytes": 7})),
    );
    doc.artifacts.insert(
        "final_prompt".to_string(),
        record(json!({"type": "prompt", "content": "Explain X"})),
    );

    let projector = Projector::for_document(&doc).unwrap();
    assert_eq!(projector.layout(), ArtifactLayout::RoleKeyed);

    match projector.view(CanonicalCategory::LanguageModel, "llm") {
        ArtifactView::LanguageModel(view) => {
            assert_eq!(view.output.as_deref(), Some("X is..."));
        }
        other => panic!("unexpected view: {other:?}"),
    }
    match projector.view(CanonicalCategory::PromptTemplate, "prompt") {
        ArtifactView::PromptTemplate(view) => {
            assert_eq!(view.resolved_prompt.as_deref(), Some("Explain X"));
        }
        other => panic!("unexpected view: {other:?}"),
    }
}

#[test]
fn role_keyed_exact_node_id_key_is_a_direct_bag() {
    let mut doc = document("1.2");
    doc.artifacts.insert(
        "llm".to_string(),
        record(json!({"output": "direct", "model": "mixtral"})),
    );

    let projector = Projector::for_document(&doc).unwrap();
    match projector.view(CanonicalCategory::LanguageModel, "llm") {
        ArtifactView::LanguageModel(view) => {
            assert_eq!(view.output.as_deref(), Some("direct"));
            assert_eq!(view.model.as_deref(), Some("mixtral"));
        }
        other => panic!("unexpected view: {other:?}"),
    }
}

#[test]
fn tool_views_read_bundled_io_and_tool_events() {
    let mut doc = document("1.1");
    doc.nodes.push(NodeRecord {
        id: "calc".to_string(),
        label: "Calculator".to_string(),
        ty: "tool".to_string(),
        ..NodeRecord::default()
    });
    doc.artifacts.insert(
        "calc".to_string(),
        record(json!({"tool": "calculator", "tool_io": {"input": "2+2", "output": "4"}})),
    );

    let projector = Projector::for_document(&doc).unwrap();
    match projector.view(CanonicalCategory::Tool, "calc") {
        ArtifactView::Tool(view) => {
            assert_eq!(view.name.as_deref(), Some("calculator"));
            assert_eq!(view.input.as_deref(), Some("2+2"));
            assert_eq!(view.output.as_deref(), Some("4"));
        }
        other => panic!("unexpected view: {other:?}"),
    }
}

#[test]
fn retriever_views_fall_back_to_retrieval_events() {
    let mut doc = document("1.1");
    doc.nodes.push(NodeRecord {
        id: "retriever".to_string(),
        label: "Retriever".to_string(),
        ty: "retriever".to_string(),
        ..NodeRecord::default()
    });
    doc.events = vec![
        EventRecord {
            ts_ms: 1,
            kind: EventKind::RetrievalQuery,
            node_id: Some("retriever".to_string()),
            edge_id: None,
            payload: json!({"query": "what is X"}),
        },
        EventRecord {
            ts_ms: 4,
            kind: EventKind::RetrievalResult,
            node_id: Some("retriever".to_string()),
            edge_id: None,
            payload: json!({"docs": [{"title": "X, explained"}]}),
        },
    ];

    let projector = Projector::for_document(&doc).unwrap();
    match projector.view(CanonicalCategory::Retriever, "retriever") {
        ArtifactView::Retriever(view) => {
            assert_eq!(view.query.as_deref(), Some("what is X"));
            assert_eq!(view.documents, vec![json!({"title": "X, explained"})]);
        }
        other => panic!("unexpected view: {other:?}"),
    }
}

#[test]
fn unknown_category_yields_an_empty_view_not_an_error() {
    let doc = document("1.1");
    let projector = Projector::for_document(&doc).unwrap();
    let view = projector.view(CanonicalCategory::Unknown, "llm");
    assert!(view.is_empty());
    // Same for nodes that simply recorded nothing.
    assert!(projector
        .view(CanonicalCategory::Chain, "prompt")
        .is_empty());
}

#[test]
fn unsupported_version_refuses_projection() {
    let doc = document("0.9");
    assert!(Projector::for_document(&doc).is_err());
}

#[test]
fn projection_is_pure() {
    let mut rec = Recorder::new("demo");
    rec.register_node("llm", "LLM", "llm").unwrap();
    let step = rec.begin_step_with_input("llm", "Explain X");
    rec.end_step_with_output(step, "X is...");
    let doc = rec.export();

    let projector = Projector::for_document(&doc).unwrap();
    let first = projector.view(CanonicalCategory::LanguageModel, "llm");
    let second = projector.view(CanonicalCategory::LanguageModel, "llm");
    assert_eq!(first, second);

    // A fresh projector over the same document agrees as well.
    let again = Projector::for_document(&doc).unwrap();
    assert_eq!(first, again.view(CanonicalCategory::LanguageModel, "llm"));
}
