//! Record types that make up a [`GraphDocument`](super::GraphDocument).
//!
//! These are pure data carriers shared by the producer (the
//! [`Recorder`](crate::recorder::Recorder)) and every consumer. Wire
//! spellings follow the original producer format; the camelCase variants
//! used by some older exporters are accepted through serde aliases.

use std::fmt;

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Free-form per-node artifact bag. Its meaning is version- and
/// category-dependent and is only interpreted by the projector.
pub type ArtifactRecord = serde_json::Map<String, Value>;

/// A single processing step registered for the run.
///
/// `ty` is the producer's raw type string and is deliberately not validated
/// against any enum at write time; the consumer-side normalizer maps it to a
/// canonical category.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct NodeRecord {
    pub id: String,
    pub label: String,
    #[serde(rename = "type")]
    pub ty: String,
    #[serde(rename = "subType", default, skip_serializing_if = "Option::is_none")]
    pub sub_type: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    /// Producer-owned key/value bag; never interpreted by the recorder.
    #[serde(default)]
    pub data: FxHashMap<String, Value>,
}

/// An edge endpoint: either a bare node id or a node/port pair.
///
/// Both forms appear on the wire, so this is an untagged union. Port
/// presence never changes which node the endpoint resolves to.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EdgeEnd {
    Ref {
        #[serde(rename = "nodeId")]
        node_id: String,
        #[serde(rename = "portId", default, skip_serializing_if = "Option::is_none")]
        port_id: Option<String>,
    },
    Bare(String),
}

impl EdgeEnd {
    /// Endpoint referencing a node without a port.
    pub fn node(id: impl Into<String>) -> Self {
        EdgeEnd::Bare(id.into())
    }

    /// Endpoint referencing a named port on a node.
    pub fn port(node_id: impl Into<String>, port_id: impl Into<String>) -> Self {
        EdgeEnd::Ref {
            node_id: node_id.into(),
            port_id: Some(port_id.into()),
        }
    }

    /// The node this endpoint resolves to, regardless of port presence.
    #[must_use]
    pub fn node_id(&self) -> &str {
        match self {
            EdgeEnd::Ref { node_id, .. } => node_id,
            EdgeEnd::Bare(id) => id,
        }
    }

    /// The port, when the endpoint names one.
    #[must_use]
    pub fn port_id(&self) -> Option<&str> {
        match self {
            EdgeEnd::Ref { port_id, .. } => port_id.as_deref(),
            EdgeEnd::Bare(_) => None,
        }
    }
}

impl From<&str> for EdgeEnd {
    fn from(id: &str) -> Self {
        EdgeEnd::Bare(id.to_string())
    }
}

impl From<String> for EdgeEnd {
    fn from(id: String) -> Self {
        EdgeEnd::Bare(id)
    }
}

impl From<(&str, &str)> for EdgeEnd {
    fn from((node_id, port_id): (&str, &str)) -> Self {
        EdgeEnd::port(node_id, port_id)
    }
}

/// A directed connection between two registered (or to-be-registered) nodes.
///
/// Edge order in the document is declaration order, not execution order.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EdgeRecord {
    pub id: String,
    pub source: EdgeEnd,
    pub target: EdgeEnd,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<String>,
}

/// Direction of a named connection point on a node.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PortDirection {
    In,
    Out,
}

/// A named connection point declared for a node.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PortRecord {
    #[serde(rename = "nodeId")]
    pub node_id: String,
    #[serde(rename = "portId")]
    pub port_id: String,
    pub direction: PortDirection,
    pub label: String,
}

/// A named cluster of nodes, used by renderers for collapse/expand.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GroupRecord {
    pub id: String,
    pub label: String,
    #[serde(rename = "nodeIds")]
    pub node_ids: Vec<String>,
    #[serde(rename = "type")]
    pub ty: String,
    #[serde(default)]
    pub collapsed: bool,
}

/// Fixed event vocabulary, with a forward-compatible escape hatch.
///
/// Unknown kinds produced by newer or foreign producers decode as
/// [`EventKind::Other`] so ingestion never fails on vocabulary growth.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum EventKind {
    /// Start of a bracketed step on a node.
    InvokeStart,
    /// End of a bracketed step on a node.
    InvokeEnd,
    ToolCall,
    ToolResult,
    RetrievalQuery,
    RetrievalResult,
    Parse,
    Error,
    /// Any kind outside the fixed vocabulary, preserved verbatim.
    Other(String),
}

impl EventKind {
    /// The wire spelling of this kind.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            EventKind::InvokeStart => "invoke_start",
            EventKind::InvokeEnd => "invoke_end",
            EventKind::ToolCall => "tool_call",
            EventKind::ToolResult => "tool_result",
            EventKind::RetrievalQuery => "retrieval_query",
            EventKind::RetrievalResult => "retrieval_result",
            EventKind::Parse => "parse",
            EventKind::Error => "error",
            EventKind::Other(s) => s,
        }
    }
}

impl From<&str> for EventKind {
    fn from(s: &str) -> Self {
        match s {
            "invoke_start" => EventKind::InvokeStart,
            "invoke_end" => EventKind::InvokeEnd,
            "tool_call" => EventKind::ToolCall,
            "tool_result" => EventKind::ToolResult,
            "retrieval_query" => EventKind::RetrievalQuery,
            "retrieval_result" => EventKind::RetrievalResult,
            "parse" => EventKind::Parse,
            "error" => EventKind::Error,
            other => EventKind::Other(other.to_string()),
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for EventKind {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for EventKind {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(EventKind::from(s.as_str()))
    }
}

/// One timestamped lifecycle event, associated with at most one node or edge.
///
/// `ts_ms` is milliseconds since run start; the sequence in a document is
/// append-only and non-decreasing.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EventRecord {
    #[serde(rename = "ts_ms", alias = "timestampMs")]
    pub ts_ms: u64,
    pub kind: EventKind,
    #[serde(rename = "nodeId", default, skip_serializing_if = "Option::is_none")]
    pub node_id: Option<String>,
    #[serde(rename = "edgeId", default, skip_serializing_if = "Option::is_none")]
    pub edge_id: Option<String>,
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub payload: Value,
}

/// A non-fatal anomaly recorded against the run.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RunError {
    #[serde(rename = "nodeId", default, skip_serializing_if = "Option::is_none")]
    pub node_id: Option<String>,
    pub message: String,
    pub at_ms: u64,
}

impl RunError {
    pub fn new(node_id: Option<String>, message: impl Into<String>, at_ms: u64) -> Self {
        Self {
            node_id,
            message: message.into(),
            at_ms,
        }
    }
}

/// Aggregate metrics for the run.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    #[serde(default)]
    pub latency_ms: u64,
    #[serde(default)]
    pub tokens_in: u64,
    #[serde(default)]
    pub tokens_out: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cost: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<RunError>>,
}
