use rustc_hash::FxHashMap;
use serde_json::json;
use tracegraph::document::NodeRecord;
use tracegraph::normalize::{normalize, CanonicalCategory};

fn node(id: &str, label: &str, ty: &str) -> NodeRecord {
    NodeRecord {
        id: id.to_string(),
        label: label.to_string(),
        ty: ty.to_string(),
        ..NodeRecord::default()
    }
}

#[test]
fn alias_table_covers_both_producer_generations() {
    let cases = [
        ("prompt", CanonicalCategory::PromptTemplate),
        ("promptTemplate", CanonicalCategory::PromptTemplate),
        ("PromptTemplate", CanonicalCategory::PromptTemplate),
        ("llm", CanonicalCategory::LanguageModel),
        ("ChatOpenAI", CanonicalCategory::LanguageModel),
        ("parser", CanonicalCategory::OutputParser),
        ("StrOutputParser", CanonicalCategory::OutputParser),
        ("PydanticOutputParser", CanonicalCategory::OutputParser),
        ("retriever", CanonicalCategory::Retriever),
        ("FAISS", CanonicalCategory::VectorStore),
        ("ConversationBufferMemory", CanonicalCategory::Memory),
        ("StructuredTool", CanonicalCategory::Tool),
        ("AgentExecutor", CanonicalCategory::Agent),
        ("LLMChain", CanonicalCategory::Chain),
    ];
    for (raw, expected) in cases {
        assert_eq!(
            normalize(&node("n", "Node", raw)),
            expected,
            "raw type {raw:?}"
        );
    }
}

#[test]
fn alias_lookup_is_case_sensitive() {
    // "chatopenai" is not an alias; with no other hints the node stays
    // unknown rather than being fuzzily matched.
    assert_eq!(
        normalize(&node("n", "Node", "chatopenai")),
        CanonicalCategory::Unknown
    );
}

#[test]
fn provider_label_prefix_falls_back_to_language_model() {
    // Raw type "Groq" has no alias entry; the label prefix heuristic
    // must classify it, not leave it unknown.
    let n = node("n", "Groq:llama2-70b-4096", "Groq");
    assert_eq!(normalize(&n), CanonicalCategory::LanguageModel);
}

#[test]
fn conventional_ids_win_before_label_heuristics() {
    let n = node("parser", "Groq something", "mystery");
    assert_eq!(normalize(&n), CanonicalCategory::OutputParser);
}

#[test]
fn data_fields_indicate_a_category() {
    let mut data = FxHashMap::default();
    data.insert("provider".to_string(), json!("groq"));
    let n = NodeRecord {
        id: "step_3".to_string(),
        label: "third step".to_string(),
        ty: "mystery".to_string(),
        data,
        ..NodeRecord::default()
    };
    assert_eq!(normalize(&n), CanonicalCategory::LanguageModel);

    let mut data = FxHashMap::default();
    data.insert("template".to_string(), json!("Explain {x}"));
    let n = NodeRecord {
        id: "step_1".to_string(),
        label: "first step".to_string(),
        ty: "mystery".to_string(),
        data,
        ..NodeRecord::default()
    };
    assert_eq!(normalize(&n), CanonicalCategory::PromptTemplate);
}

#[test]
fn sub_type_hint_is_consulted_after_raw_type() {
    let n = NodeRecord {
        sub_type: Some("StrOutputParser".to_string()),
        ..node("step_9", "ninth", "mystery")
    };
    assert_eq!(normalize(&n), CanonicalCategory::OutputParser);
}

#[test]
fn unmatched_nodes_stay_unknown() {
    let n = node("step_7", "seventh step", "mystery");
    assert_eq!(normalize(&n), CanonicalCategory::Unknown);
}

#[test]
fn normalization_is_deterministic() {
    let n = node("llm", "Groq:mixtral", "Groq");
    let first = normalize(&n);
    for _ in 0..10 {
        assert_eq!(normalize(&n), first);
    }
}

#[test]
fn category_wire_spellings_are_kebab_case() {
    assert_eq!(
        serde_json::to_value(CanonicalCategory::PromptTemplate).unwrap(),
        json!("prompt-template")
    );
    assert_eq!(
        serde_json::to_value(CanonicalCategory::LanguageModel).unwrap(),
        json!("language-model")
    );
    assert_eq!(CanonicalCategory::VectorStore.to_string(), "vector-store");
}
