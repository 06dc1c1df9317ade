//! Version- and category-aware projection of node artifacts.
//!
//! Given a normalized node and the document's schema version, the
//! [`Projector`] produces the flat [`ArtifactView`] a renderer consumes.
//! Dispatch is two-dimensional: the version picks an [`ArtifactLayout`]
//! once per document, then the category decides which fields are read and
//! in what fallback order. Fields missing from the artifact bag fall back
//! to the matching start/end event payloads for the node.
//!
//! Projection is pure: no mutation, no side effects, identical inputs give
//! identical output, so results are safe to memoize.

mod layout;
mod views;

use miette::Diagnostic;
use serde_json::Value;
use thiserror::Error;

use crate::document::{EventKind, GraphDocument, SchemaVersionError};
use crate::normalize::CanonicalCategory;
use crate::utils::json_merge::{first_text_field, value_to_text};

pub use layout::ArtifactLayout;
pub use views::{
    ArtifactView, LanguageModelView, MemoryView, ParserView, PromptView, RetrieverView, ToolView,
    VectorStoreView,
};

/// Errors raised when a document cannot be projected at all.
///
/// Unknown categories and missing artifacts are not errors; they project to
/// [`ArtifactView::Empty`].
#[derive(Debug, Error, Diagnostic)]
pub enum ProjectError {
    /// The document declares a schema version outside the supported set;
    /// projection refuses to guess at unknown artifact layouts.
    #[error(transparent)]
    #[diagnostic(transparent)]
    UnsupportedSchemaVersion(#[from] SchemaVersionError),
}

/// Projects artifact views for the nodes of one document.
pub struct Projector<'a> {
    doc: &'a GraphDocument,
    layout: ArtifactLayout,
}

impl<'a> Projector<'a> {
    /// Binds a projector to a document, selecting the version strategy once.
    pub fn for_document(doc: &'a GraphDocument) -> Result<Self, ProjectError> {
        let version = doc.schema_version()?;
        Ok(Self {
            doc,
            layout: ArtifactLayout::for_version(version),
        })
    }

    /// The layout chosen for this document's version.
    #[must_use]
    pub fn layout(&self) -> ArtifactLayout {
        self.layout
    }

    /// Builds the artifact view for one node under the given category.
    #[must_use]
    pub fn view(&self, category: CanonicalCategory, node_id: &str) -> ArtifactView {
        let bag = self.layout.bag_for(self.doc, node_id, category);
        match category {
            CanonicalCategory::PromptTemplate => ArtifactView::PromptTemplate(PromptView {
                template: first_text_field(&bag, &["prompt", "template"]),
                resolved_prompt: first_text_field(&bag, &["resolved_prompt", "final_prompt"]),
                input_variables: string_list(bag.get("input_variables")),
            }),
            CanonicalCategory::LanguageModel => ArtifactView::LanguageModel(LanguageModelView {
                input: first_text_field(&bag, &["input", "prompt"])
                    .or_else(|| self.start_field(node_id, &["input", "prompt"])),
                output: first_text_field(&bag, &["output", "response", "completion"])
                    .or_else(|| self.end_field(node_id, &["output"])),
                model: first_text_field(&bag, &["model"])
                    .or_else(|| self.node_data_field(node_id, "model")),
                provider: first_text_field(&bag, &["provider"])
                    .or_else(|| self.node_data_field(node_id, "provider")),
            }),
            CanonicalCategory::OutputParser => ArtifactView::OutputParser(ParserView {
                input: first_text_field(&bag, &["input"])
                    .or_else(|| self.start_field(node_id, &["input"])),
                output: first_text_field(&bag, &["output", "parsed"])
                    .or_else(|| self.end_field(node_id, &["output"])),
            }),
            CanonicalCategory::Tool => self.tool_view(node_id, &bag),
            CanonicalCategory::Retriever => ArtifactView::Retriever(RetrieverView {
                query: first_text_field(&bag, &["query"]).or_else(|| {
                    self.event_field(node_id, &EventKind::RetrievalQuery, &["query"], true)
                }),
                documents: value_list(bag.get("docs").or_else(|| bag.get("documents")))
                    .or_else(|| self.retrieval_docs(node_id))
                    .unwrap_or_default(),
            }),
            CanonicalCategory::VectorStore => ArtifactView::VectorStore(VectorStoreView {
                collection: first_text_field(&bag, &["collection"]),
                documents: value_list(bag.get("docs").or_else(|| bag.get("documents")))
                    .unwrap_or_default(),
            }),
            CanonicalCategory::Memory => ArtifactView::Memory(MemoryView {
                state: bag.get("state").or_else(|| bag.get("memory_state")).cloned(),
            }),
            CanonicalCategory::Agent | CanonicalCategory::Chain | CanonicalCategory::Unknown => {
                ArtifactView::Empty
            }
        }
    }

    fn tool_view(&self, node_id: &str, bag: &crate::document::ArtifactRecord) -> ArtifactView {
        // tool_io bundles {input, output} when the producer recorded both
        // sides at once.
        let tool_io = bag.get("tool_io").and_then(Value::as_object);
        let from_io = |key: &str| tool_io.and_then(|io| io.get(key)).map(value_to_text);
        ArtifactView::Tool(ToolView {
            name: first_text_field(bag, &["tool", "name"])
                .or_else(|| self.node_data_field(node_id, "tool_name")),
            input: first_text_field(bag, &["input"])
                .or_else(|| from_io("input"))
                .or_else(|| self.event_field(node_id, &EventKind::ToolCall, &["input", "args"], true)),
            output: first_text_field(bag, &["output"])
                .or_else(|| from_io("output"))
                .or_else(|| {
                    self.event_field(node_id, &EventKind::ToolResult, &["output", "result"], false)
                }),
        })
    }

    /// Preview captured by the node's first `invoke_start` event.
    fn start_field(&self, node_id: &str, keys: &[&str]) -> Option<String> {
        self.event_field(node_id, &EventKind::InvokeStart, keys, true)
    }

    /// Preview captured by the node's last `invoke_end` event.
    fn end_field(&self, node_id: &str, keys: &[&str]) -> Option<String> {
        self.event_field(node_id, &EventKind::InvokeEnd, keys, false)
    }

    fn event_field(
        &self,
        node_id: &str,
        kind: &EventKind,
        keys: &[&str],
        first: bool,
    ) -> Option<String> {
        let mut matches = self
            .doc
            .events_for(node_id)
            .filter(|e| &e.kind == kind)
            .filter_map(|e| e.payload.as_object())
            .filter_map(|payload| keys.iter().find_map(|key| payload.get(*key)));
        let value = if first { matches.next() } else { matches.last() };
        value.map(value_to_text)
    }

    fn retrieval_docs(&self, node_id: &str) -> Option<Vec<Value>> {
        self.doc
            .events_for(node_id)
            .filter(|e| e.kind == EventKind::RetrievalResult)
            .filter_map(|e| e.payload.as_object())
            .filter_map(|payload| payload.get("docs").or_else(|| payload.get("documents")))
            .last()
            .and_then(Value::as_array)
            .cloned()
    }

    fn node_data_field(&self, node_id: &str, field: &str) -> Option<String> {
        self.doc
            .node(node_id)
            .and_then(|n| n.data.get(field))
            .map(value_to_text)
    }
}

fn string_list(value: Option<&Value>) -> Vec<String> {
    value
        .and_then(Value::as_array)
        .map(|items| items.iter().map(value_to_text).collect())
        .unwrap_or_default()
}

fn value_list(value: Option<&Value>) -> Option<Vec<Value>> {
    value.and_then(Value::as_array).cloned()
}
