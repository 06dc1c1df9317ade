//! The consumption contract between this crate and a renderer.
//!
//! [`RenderGraph::from_document`] runs the whole consumer pipeline over an
//! immutable document: event audit, type normalization, artifact
//! projection, and edge endpoint resolution. The result is exactly what a
//! renderer relies on, per node `{id, category, label, raw record, view}`
//! and per edge `{id, source node, target node, label}`.
//!
//! [`to_mermaid`] renders the normalized graph as a Mermaid flowchart for
//! text-based surfaces.

use serde::Serialize;

use crate::document::{GraphDocument, NodeRecord, RunError};
use crate::normalize::{normalize, CanonicalCategory};
use crate::project::{ArtifactView, ProjectError, Projector};

/// A normalized node with its projected artifact view.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RenderNode {
    pub id: String,
    pub category: CanonicalCategory,
    pub label: String,
    /// The raw record as the producer wrote it.
    pub node: NodeRecord,
    pub view: ArtifactView,
}

/// An edge with both endpoints resolved to bare node ids.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RenderEdge {
    pub id: String,
    pub source_node_id: String,
    pub target_node_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

/// The fully normalized form of one run, ready for display.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RenderGraph {
    pub nodes: Vec<RenderNode>,
    pub edges: Vec<RenderEdge>,
    /// Producer-recorded anomalies plus those found during ingestion.
    pub anomalies: Vec<RunError>,
}

impl RenderGraph {
    /// Normalizes a document into its renderable form.
    ///
    /// Fails only for unsupported schema versions. Edges referencing nodes
    /// absent from the document are dropped and reported as anomalies;
    /// unknown node types normalize to [`CanonicalCategory::Unknown`] with
    /// an empty view.
    pub fn from_document(doc: &GraphDocument) -> Result<Self, ProjectError> {
        let projector = Projector::for_document(doc)?;

        let mut anomalies = doc.run.errors.clone().unwrap_or_default();
        anomalies.extend(doc.audit_events());

        let nodes = doc
            .nodes
            .iter()
            .map(|node| {
                let category = normalize(node);
                RenderNode {
                    id: node.id.clone(),
                    category,
                    label: node.label.clone(),
                    node: node.clone(),
                    view: projector.view(category, &node.id),
                }
            })
            .collect();

        let mut edges = Vec::with_capacity(doc.edges.len());
        for edge in &doc.edges {
            let source = edge.source.node_id();
            let target = edge.target.node_id();
            let missing = [source, target]
                .into_iter()
                .find(|id| doc.node(id).is_none());
            if let Some(id) = missing {
                tracing::warn!(edge = %edge.id, node = id, "dropping edge with unresolved endpoint");
                // The producer may have stamped this one at export already.
                let reported = anomalies.iter().any(|a| {
                    a.node_id.as_deref() == Some(id)
                        && a.message.contains(&format!("'{}'", edge.id))
                });
                if !reported {
                    anomalies.push(RunError::new(
                        Some(id.to_string()),
                        format!("edge '{}' references unknown node '{id}'", edge.id),
                        0,
                    ));
                }
                continue;
            }
            edges.push(RenderEdge {
                id: edge.id.clone(),
                source_node_id: source.to_string(),
                target_node_id: target.to_string(),
                label: edge.label.clone(),
            });
        }

        Ok(Self {
            nodes,
            edges,
            anomalies,
        })
    }

    /// Looks up a rendered node by id.
    #[must_use]
    pub fn node(&self, id: &str) -> Option<&RenderNode> {
        self.nodes.iter().find(|n| n.id == id)
    }
}

/// Renders the graph as a Mermaid `flowchart LR`.
///
/// # Examples
///
/// ```
/// use tracegraph::recorder::Recorder;
/// use tracegraph::render::{to_mermaid, RenderGraph};
///
/// let mut rec = Recorder::new("demo");
/// rec.register_node("prompt", "PromptTemplate", "prompt").unwrap();
/// rec.register_node("llm", "ChatOpenAI", "llm").unwrap();
/// rec.register_edge("prompt", "llm");
///
/// let graph = RenderGraph::from_document(&rec.export()).unwrap();
/// let mermaid = to_mermaid(&graph);
/// assert!(mermaid.starts_with("flowchart LR"));
/// assert!(mermaid.contains("prompt --> llm"));
/// ```
#[must_use]
pub fn to_mermaid(graph: &RenderGraph) -> String {
    let mut lines = vec!["flowchart LR".to_string()];
    for node in &graph.nodes {
        lines.push(format!("  {}[{}]", node.id, node.label));
    }
    for edge in &graph.edges {
        match &edge.label {
            Some(label) => lines.push(format!(
                "  {} -->|{label}| {}",
                edge.source_node_id, edge.target_node_id
            )),
            None => lines.push(format!(
                "  {} --> {}",
                edge.source_node_id, edge.target_node_id
            )),
        }
    }
    lines.join("\n")
}
