//! Maps raw producer type strings to canonical render categories.
//!
//! Producers are loosely typed: the same kind of step arrives as `"llm"`,
//! `"ChatOpenAI"`, or a bare provider name depending on the producer
//! generation. Normalization is a two-step, fully deterministic mapping:
//!
//! 1. exact, case-sensitive lookup of the raw `type` (and the `subType`
//!    hint) in a static alias table;
//! 2. only when that misses, an ordered list of independent heuristic rules
//!    over the node's id, label, and data bag, first match wins.
//!
//! Rules are data, not branches: new producers extend the tables without
//! touching the lookup logic.

use std::fmt;
use std::sync::OnceLock;

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::document::NodeRecord;

/// The closed set of render-meaningful node categories.
///
/// `Unknown` is a valid outcome, not an error; renderers show it with the
/// fallback style and an empty artifact view.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CanonicalCategory {
    PromptTemplate,
    LanguageModel,
    OutputParser,
    Retriever,
    VectorStore,
    Memory,
    Tool,
    Agent,
    Chain,
    #[default]
    Unknown,
}

impl CanonicalCategory {
    /// The wire spelling used in the render contract.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            CanonicalCategory::PromptTemplate => "prompt-template",
            CanonicalCategory::LanguageModel => "language-model",
            CanonicalCategory::OutputParser => "output-parser",
            CanonicalCategory::Retriever => "retriever",
            CanonicalCategory::VectorStore => "vector-store",
            CanonicalCategory::Memory => "memory",
            CanonicalCategory::Tool => "tool",
            CanonicalCategory::Agent => "agent",
            CanonicalCategory::Chain => "chain",
            CanonicalCategory::Unknown => "unknown",
        }
    }
}

impl fmt::Display for CanonicalCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Raw type spellings observed across producer generations.
///
/// Several raw strings map to one category; schema evolution keeps adding
/// new spellings for old categories.
const ALIASES: &[(&str, CanonicalCategory)] = &[
    ("prompt", CanonicalCategory::PromptTemplate),
    ("promptTemplate", CanonicalCategory::PromptTemplate),
    ("PromptTemplate", CanonicalCategory::PromptTemplate),
    ("ChatPromptTemplate", CanonicalCategory::PromptTemplate),
    ("FewShotPromptTemplate", CanonicalCategory::PromptTemplate),
    ("llm", CanonicalCategory::LanguageModel),
    ("LLM", CanonicalCategory::LanguageModel),
    ("chat_model", CanonicalCategory::LanguageModel),
    ("ChatOpenAI", CanonicalCategory::LanguageModel),
    ("ChatGroq", CanonicalCategory::LanguageModel),
    ("ChatGoogleGenerativeAI", CanonicalCategory::LanguageModel),
    ("HuggingFaceEndpoint", CanonicalCategory::LanguageModel),
    ("parser", CanonicalCategory::OutputParser),
    ("output_parser", CanonicalCategory::OutputParser),
    ("StrOutputParser", CanonicalCategory::OutputParser),
    ("PydanticOutputParser", CanonicalCategory::OutputParser),
    ("JsonOutputParser", CanonicalCategory::OutputParser),
    ("retriever", CanonicalCategory::Retriever),
    ("Retriever", CanonicalCategory::Retriever),
    ("VectorStoreRetriever", CanonicalCategory::Retriever),
    ("vectorstore", CanonicalCategory::VectorStore),
    ("vector_store", CanonicalCategory::VectorStore),
    ("FAISS", CanonicalCategory::VectorStore),
    ("Chroma", CanonicalCategory::VectorStore),
    ("memory", CanonicalCategory::Memory),
    ("ConversationBufferMemory", CanonicalCategory::Memory),
    ("tool", CanonicalCategory::Tool),
    ("Tool", CanonicalCategory::Tool),
    ("StructuredTool", CanonicalCategory::Tool),
    ("agent", CanonicalCategory::Agent),
    ("AgentExecutor", CanonicalCategory::Agent),
    ("chain", CanonicalCategory::Chain),
    ("LLMChain", CanonicalCategory::Chain),
    ("RunnableSequence", CanonicalCategory::Chain),
];

fn alias_table() -> &'static FxHashMap<&'static str, CanonicalCategory> {
    static TABLE: OnceLock<FxHashMap<&'static str, CanonicalCategory>> = OnceLock::new();
    TABLE.get_or_init(|| ALIASES.iter().copied().collect())
}

/// One independent predicate→category rule for heuristic fallback.
pub struct HeuristicRule {
    /// Short name used in trace logs when the rule fires.
    pub name: &'static str,
    matcher: fn(&NodeRecord) -> Option<CanonicalCategory>,
}

/// Conventional node ids used by example runs and lesson scripts.
const ID_CONVENTIONS: &[(&str, CanonicalCategory)] = &[
    ("prompt", CanonicalCategory::PromptTemplate),
    ("llm", CanonicalCategory::LanguageModel),
    ("model", CanonicalCategory::LanguageModel),
    ("parser", CanonicalCategory::OutputParser),
    ("output_parser", CanonicalCategory::OutputParser),
    ("retriever", CanonicalCategory::Retriever),
    ("vectorstore", CanonicalCategory::VectorStore),
    ("memory", CanonicalCategory::Memory),
    ("tool", CanonicalCategory::Tool),
    ("agent", CanonicalCategory::Agent),
    ("chain", CanonicalCategory::Chain),
];

/// Known model provider names appearing as label prefixes (`"Groq:mixtral"`).
const PROVIDER_PREFIXES: &[&str] = &[
    "Groq",
    "OpenAI",
    "Gemini",
    "Google Gemini",
    "Hugging Face",
    "HuggingFace",
    "Ollama",
    "Anthropic",
];

/// Data-bag fields that indicate a category, checked in order.
const DATA_FIELD_HINTS: &[(&str, CanonicalCategory)] = &[
    ("provider", CanonicalCategory::LanguageModel),
    ("model", CanonicalCategory::LanguageModel),
    ("template", CanonicalCategory::PromptTemplate),
    ("input_variables", CanonicalCategory::PromptTemplate),
    ("top_k", CanonicalCategory::Retriever),
    ("embedding_model", CanonicalCategory::VectorStore),
    ("collection", CanonicalCategory::VectorStore),
    ("memory_key", CanonicalCategory::Memory),
    ("tool_name", CanonicalCategory::Tool),
];

fn match_id_convention(node: &NodeRecord) -> Option<CanonicalCategory> {
    ID_CONVENTIONS
        .iter()
        .find(|(id, _)| *id == node.id)
        .map(|(_, category)| *category)
}

fn match_label_provider(node: &NodeRecord) -> Option<CanonicalCategory> {
    PROVIDER_PREFIXES
        .iter()
        .any(|prefix| node.label.starts_with(prefix))
        .then_some(CanonicalCategory::LanguageModel)
}

fn match_data_fields(node: &NodeRecord) -> Option<CanonicalCategory> {
    DATA_FIELD_HINTS
        .iter()
        .find(|(field, _)| node.data.contains_key(*field))
        .map(|(_, category)| *category)
}

/// Heuristic rules in priority order; the first match wins.
pub const HEURISTICS: &[HeuristicRule] = &[
    HeuristicRule {
        name: "id-convention",
        matcher: match_id_convention,
    },
    HeuristicRule {
        name: "label-provider-prefix",
        matcher: match_label_provider,
    },
    HeuristicRule {
        name: "data-field-hint",
        matcher: match_data_fields,
    },
];

/// Maps a node record to exactly one canonical category.
///
/// Pure and deterministic: repeated calls over the same record always yield
/// the same category, independent of any other node.
///
/// # Examples
///
/// ```
/// use tracegraph::document::NodeRecord;
/// use tracegraph::normalize::{normalize, CanonicalCategory};
///
/// let node = NodeRecord {
///     id: "llm".into(),
///     label: "Groq:mixtral-8x7b".into(),
///     ty: "llm".into(),
///     ..NodeRecord::default()
/// };
/// assert_eq!(normalize(&node), CanonicalCategory::LanguageModel);
/// ```
#[must_use]
pub fn normalize(node: &NodeRecord) -> CanonicalCategory {
    if let Some(category) = lookup_alias(&node.ty) {
        return category;
    }
    if let Some(hint) = node.sub_type.as_deref() {
        if let Some(category) = lookup_alias(hint) {
            return category;
        }
    }
    for rule in HEURISTICS {
        if let Some(category) = (rule.matcher)(node) {
            tracing::debug!(node = %node.id, rule = rule.name, %category, "heuristic fallback");
            return category;
        }
    }
    CanonicalCategory::Unknown
}

fn lookup_alias(raw: &str) -> Option<CanonicalCategory> {
    alias_table()
        .get(raw)
        .copied()
        .filter(|c| *c != CanonicalCategory::Unknown)
}
