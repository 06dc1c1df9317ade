//! Single-writer run capture.
//!
//! A [`Recorder`] is owned by exactly one producer for the duration of one
//! run. It registers topology (nodes, edges, ports, groups), brackets traced
//! work with [`Recorder::begin_step`]/[`Recorder::end_step`], attaches
//! per-node artifacts, and snapshots the whole run as an immutable
//! [`GraphDocument`] via [`Recorder::export`]. The recorder performs no I/O;
//! persisting or serving the exported document belongs to the transport
//! layer.
//!
//! # Examples
//!
//! ```
//! use serde_json::json;
//! use tracegraph::recorder::Recorder;
//!
//! let mut rec = Recorder::new("01_hello_chain");
//! rec.register_node("prompt", "PromptTemplate", "prompt")?;
//! rec.register_node("llm", "Groq:mixtral", "llm")?;
//! rec.register_edge("prompt", "llm");
//!
//! let step = rec.begin_step_with_input("llm", "Explain X");
//! // ... run the model ...
//! rec.end_step_with_output(step, "X is...");
//! rec.attach_artifact("llm", json!({"output": "X is..."}).as_object().cloned().unwrap());
//!
//! let doc = rec.export();
//! assert_eq!(doc.nodes.len(), 2);
//! # Ok::<(), tracegraph::recorder::RecorderError>(())
//! ```

use std::collections::BTreeMap;
use std::time::Instant;

use chrono::{DateTime, Utc};
use miette::Diagnostic;
use rustc_hash::FxHashSet;
use serde_json::{json, Value};
use thiserror::Error;
use uuid::Uuid;

use crate::document::{
    ArtifactRecord, EdgeEnd, EdgeRecord, EventKind, EventRecord, GraphDocument, GroupRecord,
    Metadata, NodeRecord, PortDirection, PortRecord, RunError, RunSummary, SchemaVersion,
};
use crate::utils::json_merge::merge_fields;
use crate::utils::preview::{truncate_preview, DEFAULT_PREVIEW_LEN};

/// Errors surfaced by recorder calls.
///
/// Recorder-local anomalies (unmatched steps, dangling edge references)
/// never abort the run; they are collected into the exported run summary so
/// a partial trace stays useful. Only contract violations that the caller
/// must fix, like duplicate node ids, fail the offending call.
#[derive(Debug, Error, Diagnostic)]
pub enum RecorderError {
    /// A node id was registered twice in the same run.
    #[error("duplicate node id: {id}")]
    #[diagnostic(
        code(tracegraph::recorder::duplicate_node),
        help("node ids must be unique for the run; pick a distinct id or reuse the existing node")
    )]
    DuplicateNode { id: String },
}

/// Opaque handle pairing an `invoke_end` with its `invoke_start`.
///
/// The handle is consumed by [`Recorder::end_step`], so a step cannot be
/// closed twice from this producer. Documents arriving from producers
/// without that guarantee are checked by
/// [`GraphDocument::audit_events`](crate::document::GraphDocument::audit_events).
#[derive(Debug)]
pub struct StepHandle {
    node_id: String,
    started: Instant,
}

impl StepHandle {
    /// The node this step is running on.
    #[must_use]
    pub fn node_id(&self) -> &str {
        &self.node_id
    }
}

/// Builds the graph document for one run. See the module docs for usage.
#[derive(Debug)]
pub struct Recorder {
    run_id: String,
    created_at: DateTime<Utc>,
    subject_id: String,
    tags: Vec<String>,
    nodes: Vec<NodeRecord>,
    node_ids: FxHashSet<String>,
    edges: Vec<EdgeRecord>,
    ports: Vec<PortRecord>,
    groups: Vec<GroupRecord>,
    events: Vec<EventRecord>,
    artifacts: BTreeMap<String, ArtifactRecord>,
    errors: Vec<RunError>,
    tokens_in: u64,
    tokens_out: u64,
    cost: Option<f64>,
    started: Instant,
}

impl Recorder {
    /// Starts a new run for the given subject; the run clock starts now.
    #[must_use]
    pub fn new(subject_id: impl Into<String>) -> Self {
        Self {
            run_id: Uuid::new_v4().to_string(),
            created_at: Utc::now(),
            subject_id: subject_id.into(),
            tags: Vec::new(),
            nodes: Vec::new(),
            node_ids: FxHashSet::default(),
            edges: Vec::new(),
            ports: Vec::new(),
            groups: Vec::new(),
            events: Vec::new(),
            artifacts: BTreeMap::new(),
            errors: Vec::new(),
            tokens_in: 0,
            tokens_out: 0,
            cost: None,
            started: Instant::now(),
        }
    }

    /// The run id assigned at construction.
    #[must_use]
    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    /// Adds a run-level tag.
    pub fn add_tag(&mut self, tag: impl Into<String>) {
        self.tags.push(tag.into());
    }

    /// Registers a node with an empty data bag.
    pub fn register_node(
        &mut self,
        id: impl Into<String>,
        label: impl Into<String>,
        ty: impl Into<String>,
    ) -> Result<(), RecorderError> {
        self.register_node_record(NodeRecord {
            id: id.into(),
            label: label.into(),
            ty: ty.into(),
            ..NodeRecord::default()
        })
    }

    /// Registers a node with producer-owned data; the bag is stored verbatim
    /// and never interpreted here.
    pub fn register_node_with_data(
        &mut self,
        id: impl Into<String>,
        label: impl Into<String>,
        ty: impl Into<String>,
        data: rustc_hash::FxHashMap<String, Value>,
    ) -> Result<(), RecorderError> {
        self.register_node_record(NodeRecord {
            id: id.into(),
            label: label.into(),
            ty: ty.into(),
            data,
            ..NodeRecord::default()
        })
    }

    /// Registers a fully specified node record.
    pub fn register_node_record(&mut self, node: NodeRecord) -> Result<(), RecorderError> {
        if !self.node_ids.insert(node.id.clone()) {
            return Err(RecorderError::DuplicateNode { id: node.id });
        }
        self.nodes.push(node);
        Ok(())
    }

    /// Registers an edge between two endpoints and returns its synthesized
    /// id.
    ///
    /// Endpoints may reference nodes that have not been registered yet;
    /// validity is checked at export time, where a dangling reference
    /// becomes a run anomaly rather than a failure.
    pub fn register_edge(
        &mut self,
        source: impl Into<EdgeEnd>,
        target: impl Into<EdgeEnd>,
    ) -> String {
        self.register_edge_labeled(source, target, None::<String>)
    }

    /// Registers an edge with a display label.
    pub fn register_edge_labeled(
        &mut self,
        source: impl Into<EdgeEnd>,
        target: impl Into<EdgeEnd>,
        label: Option<impl Into<String>>,
    ) -> String {
        let source = source.into();
        let target = target.into();
        let id = edge_id(&source, &target);
        self.edges.push(EdgeRecord {
            id: id.clone(),
            source,
            target,
            label: label.map(Into::into),
            condition: None,
        });
        id
    }

    /// Registers a fully specified edge record, keeping the caller's id.
    pub fn register_edge_record(&mut self, edge: EdgeRecord) {
        self.edges.push(edge);
    }

    /// Declares a named connection point on a node.
    pub fn add_port(
        &mut self,
        node_id: impl Into<String>,
        port_id: impl Into<String>,
        direction: PortDirection,
        label: impl Into<String>,
    ) {
        self.ports.push(PortRecord {
            node_id: node_id.into(),
            port_id: port_id.into(),
            direction,
            label: label.into(),
        });
    }

    /// Declares a collapsible cluster of nodes.
    pub fn add_group(
        &mut self,
        id: impl Into<String>,
        label: impl Into<String>,
        node_ids: Vec<String>,
        ty: impl Into<String>,
    ) {
        self.groups.push(GroupRecord {
            id: id.into(),
            label: label.into(),
            node_ids,
            ty: ty.into(),
            collapsed: false,
        });
    }

    /// Opens a step on a node and emits its `invoke_start` event.
    #[must_use]
    pub fn begin_step(&mut self, node_id: impl Into<String>) -> StepHandle {
        self.begin_step_inner(node_id.into(), None)
    }

    /// Opens a step carrying a bounded input preview in the start event.
    #[must_use]
    pub fn begin_step_with_input(
        &mut self,
        node_id: impl Into<String>,
        input_preview: &str,
    ) -> StepHandle {
        self.begin_step_inner(node_id.into(), Some(input_preview))
    }

    fn begin_step_inner(&mut self, node_id: String, input_preview: Option<&str>) -> StepHandle {
        let payload = match input_preview {
            Some(input) => json!({ "input": truncate_preview(input, DEFAULT_PREVIEW_LEN) }),
            None => Value::Null,
        };
        self.push_event(EventKind::InvokeStart, Some(node_id.clone()), None, payload);
        StepHandle {
            node_id,
            started: Instant::now(),
        }
    }

    /// Closes a step, emitting its `invoke_end` event with elapsed time.
    pub fn end_step(&mut self, handle: StepHandle) {
        self.end_step_inner(handle, None);
    }

    /// Closes a step carrying a bounded output preview in the end event.
    pub fn end_step_with_output(&mut self, handle: StepHandle, output_preview: &str) {
        self.end_step_inner(handle, Some(output_preview));
    }

    fn end_step_inner(&mut self, handle: StepHandle, output_preview: Option<&str>) {
        let elapsed_ms = handle.started.elapsed().as_millis() as u64;
        let mut payload = serde_json::Map::new();
        payload.insert("elapsed_ms".to_string(), json!(elapsed_ms));
        if let Some(output) = output_preview {
            payload.insert(
                "output".to_string(),
                json!(truncate_preview(output, DEFAULT_PREVIEW_LEN)),
            );
        }
        self.push_event(
            EventKind::InvokeEnd,
            Some(handle.node_id),
            None,
            Value::Object(payload),
        );
    }

    /// Appends a general event (tool calls, retrieval, parsing, ...).
    pub fn record_event(
        &mut self,
        kind: EventKind,
        node_id: Option<String>,
        edge_id: Option<String>,
        payload: Value,
    ) {
        self.push_event(kind, node_id, edge_id, payload);
    }

    /// Merges fields into a node's artifact record, last write wins per
    /// field. The node does not need to have completed (or started) a step.
    pub fn attach_artifact(&mut self, node_id: impl Into<String>, fields: ArtifactRecord) {
        let record = self.artifacts.entry(node_id.into()).or_default();
        merge_fields(record, fields);
    }

    /// Records a non-fatal anomaly against the run.
    pub fn record_error(&mut self, node_id: Option<String>, message: impl Into<String>) {
        let at_ms = self.elapsed_ms();
        self.errors.push(RunError::new(node_id, message, at_ms));
    }

    /// Accumulates token usage into the run summary.
    pub fn add_token_usage(&mut self, tokens_in: u64, tokens_out: u64) {
        self.tokens_in += tokens_in;
        self.tokens_out += tokens_out;
    }

    /// Sets the estimated run cost.
    pub fn set_cost(&mut self, cost: f64) {
        self.cost = Some(cost);
    }

    /// Snapshots the current state as an immutable document.
    ///
    /// Callable any number of times; later mutation never affects a prior
    /// snapshot. Edges referencing unregistered nodes are reported here as
    /// run anomalies, since producers may declare edges before nodes.
    #[must_use]
    pub fn export(&self) -> GraphDocument {
        let latency_ms = self.elapsed_ms();
        let mut errors = self.errors.clone();
        for edge in &self.edges {
            for end in [&edge.source, &edge.target] {
                if !self.node_ids.contains(end.node_id()) {
                    tracing::warn!(edge = %edge.id, node = end.node_id(), "edge references unregistered node");
                    errors.push(RunError::new(
                        Some(end.node_id().to_string()),
                        format!("edge '{}' references unregistered node '{}'", edge.id, end.node_id()),
                        latency_ms,
                    ));
                }
            }
        }

        GraphDocument {
            metadata: Metadata {
                version: SchemaVersion::V1_1.as_str().to_string(),
                run_id: self.run_id.clone(),
                created_at: self.created_at,
                subject_id: self.subject_id.clone(),
                tags: self.tags.clone(),
            },
            nodes: self.nodes.clone(),
            ports: self.ports.clone(),
            edges: self.edges.clone(),
            groups: self.groups.clone(),
            events: self.events.clone(),
            artifacts: self.artifacts.clone(),
            run: RunSummary {
                latency_ms,
                tokens_in: self.tokens_in,
                tokens_out: self.tokens_out,
                cost: self.cost,
                errors: if errors.is_empty() {
                    None
                } else {
                    Some(errors)
                },
            },
        }
    }

    fn push_event(
        &mut self,
        kind: EventKind,
        node_id: Option<String>,
        edge_id: Option<String>,
        payload: Value,
    ) {
        let ts_ms = self.elapsed_ms();
        self.events.push(EventRecord {
            ts_ms,
            kind,
            node_id,
            edge_id,
            payload,
        });
    }

    fn elapsed_ms(&self) -> u64 {
        self.started.elapsed().as_millis() as u64
    }
}

/// Synthesizes a stable edge id from its endpoints, including ports when
/// present: `a->b`, `a:out->b`, `a:out->b:in`.
fn edge_id(source: &EdgeEnd, target: &EdgeEnd) -> String {
    let mut id = String::new();
    id.push_str(source.node_id());
    if let Some(port) = source.port_id() {
        id.push(':');
        id.push_str(port);
    }
    id.push_str("->");
    id.push_str(target.node_id());
    if let Some(port) = target.port_id() {
        id.push(':');
        id.push_str(port);
    }
    id
}
