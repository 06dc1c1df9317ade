//! Flat, category-specific artifact views consumed by renderers.

use serde::Serialize;
use serde_json::Value;

/// Prompt-template node view: the raw template, the fully resolved prompt,
/// and the declared input variables.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct PromptView {
    pub template: Option<String>,
    pub resolved_prompt: Option<String>,
    pub input_variables: Vec<String>,
}

/// Language-model node view: what went in, what came out, and which model
/// produced it.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct LanguageModelView {
    pub input: Option<String>,
    pub output: Option<String>,
    pub model: Option<String>,
    pub provider: Option<String>,
}

/// Output-parser node view.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct ParserView {
    pub input: Option<String>,
    pub output: Option<String>,
}

/// Tool node view.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct ToolView {
    pub name: Option<String>,
    pub input: Option<String>,
    pub output: Option<String>,
}

/// Retriever node view.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct RetrieverView {
    pub query: Option<String>,
    pub documents: Vec<Value>,
}

/// Vector-store node view.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct VectorStoreView {
    pub collection: Option<String>,
    pub documents: Vec<Value>,
}

/// Memory node view: the captured state blob, whatever its shape.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct MemoryView {
    pub state: Option<Value>,
}

/// The per-node projection handed to renderers.
///
/// `Empty` is the valid result for categories without artifact semantics
/// (agents, chains, unknown) and for nodes that recorded nothing.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(tag = "category", rename_all = "kebab-case")]
pub enum ArtifactView {
    PromptTemplate(PromptView),
    LanguageModel(LanguageModelView),
    OutputParser(ParserView),
    Retriever(RetrieverView),
    VectorStore(VectorStoreView),
    Memory(MemoryView),
    Tool(ToolView),
    #[default]
    Empty,
}

impl ArtifactView {
    /// True when the view carries no fields for the renderer.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        matches!(self, ArtifactView::Empty)
    }
}
