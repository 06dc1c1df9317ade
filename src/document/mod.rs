//! The versioned graph document model.
//!
//! A [`GraphDocument`] is the root artifact of one run of a traced
//! computation: the registered nodes and edges, the timestamped event log,
//! per-node artifacts, and aggregate run metrics. The
//! [`Recorder`](crate::recorder::Recorder) is the only writer during a run;
//! once exported the document is immutable and any number of consumers may
//! derive views from it.
//!
//! The model itself carries no behavior beyond serialization and the
//! consumption-time checks ([`GraphDocument::audit_events`]) that the
//! producer cannot enforce for documents arriving from foreign tooling.

mod records;
mod schema;

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub use records::{
    ArtifactRecord, EdgeEnd, EdgeRecord, EventKind, EventRecord, GroupRecord, NodeRecord,
    PortDirection, PortRecord, RunError, RunSummary,
};
pub use schema::{SchemaVersion, SchemaVersionError};

fn default_version() -> String {
    SchemaVersion::V1_1.as_str().to_string()
}

/// Run-level metadata stamped by the producer.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Metadata {
    /// Schema version string. Absent on the wire means the oldest
    /// supported version, 1.1.
    #[serde(default = "default_version", alias = "schemaVersion")]
    pub version: String,
    #[serde(rename = "run_id", alias = "runId")]
    pub run_id: String,
    #[serde(rename = "created_at", alias = "createdAt")]
    pub created_at: DateTime<Utc>,
    /// Identifies which lesson/workflow was run.
    #[serde(rename = "lesson_id", alias = "subjectId")]
    pub subject_id: String,
    #[serde(default)]
    pub tags: Vec<String>,
}

/// The complete, self-contained record of one run.
///
/// Round-trips through JSON field-for-field; see the integration tests for
/// the property. Collections that are optional on the wire (`ports`,
/// `groups`) are omitted when empty.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GraphDocument {
    pub metadata: Metadata,
    #[serde(default)]
    pub nodes: Vec<NodeRecord>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ports: Vec<PortRecord>,
    #[serde(default)]
    pub edges: Vec<EdgeRecord>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub groups: Vec<GroupRecord>,
    #[serde(default)]
    pub events: Vec<EventRecord>,
    /// Keyed by node id (schema 1.1) or role name (schema 1.2); the
    /// projector resolves the difference.
    #[serde(default)]
    pub artifacts: BTreeMap<String, ArtifactRecord>,
    pub run: RunSummary,
}

impl GraphDocument {
    /// Parses the declared schema version, failing on versions outside the
    /// supported set.
    pub fn schema_version(&self) -> Result<SchemaVersion, SchemaVersionError> {
        self.metadata.version.parse()
    }

    /// Looks up a node by id.
    #[must_use]
    pub fn node(&self, id: &str) -> Option<&NodeRecord> {
        self.nodes.iter().find(|n| n.id == id)
    }

    /// Checks the event-log invariants a foreign producer may have violated.
    ///
    /// Returns, never drops, one anomaly per violation:
    /// - an `invoke_end` for a node with no open `invoke_start`,
    /// - a timestamp that decreases relative to its predecessor,
    /// - an event associated with both a node and an edge.
    ///
    /// Anomalies are reportable, not fatal; a partial trace stays usable.
    #[must_use]
    pub fn audit_events(&self) -> Vec<RunError> {
        let mut anomalies = Vec::new();
        let mut open: rustc_hash::FxHashMap<&str, u32> = rustc_hash::FxHashMap::default();
        let mut last_ts = 0u64;

        for event in &self.events {
            if let (Some(node_id), Some(edge_id)) = (&event.node_id, &event.edge_id) {
                anomalies.push(RunError::new(
                    Some(node_id.clone()),
                    format!(
                        "event '{}' is associated with both node '{node_id}' and edge '{edge_id}'",
                        event.kind
                    ),
                    event.ts_ms,
                ));
            }
            if event.ts_ms < last_ts {
                anomalies.push(RunError::new(
                    event.node_id.clone(),
                    format!(
                        "event timestamp decreased: {} ms after {} ms",
                        event.ts_ms, last_ts
                    ),
                    event.ts_ms,
                ));
            }
            last_ts = last_ts.max(event.ts_ms);

            let Some(node_id) = event.node_id.as_deref() else {
                continue;
            };
            match event.kind {
                EventKind::InvokeStart => {
                    *open.entry(node_id).or_default() += 1;
                }
                EventKind::InvokeEnd => {
                    let count = open.entry(node_id).or_default();
                    if *count == 0 {
                        anomalies.push(RunError::new(
                            Some(node_id.to_string()),
                            format!("invoke_end without a matching invoke_start for '{node_id}'"),
                            event.ts_ms,
                        ));
                    } else {
                        *count -= 1;
                    }
                }
                _ => {}
            }
        }
        anomalies
    }

    /// Events associated with the given node, in log order.
    pub fn events_for(&self, node_id: &str) -> impl Iterator<Item = &EventRecord> {
        self.events
            .iter()
            .filter(move |e| e.node_id.as_deref() == Some(node_id))
    }

    /// Serializes to a compact JSON string.
    pub fn to_json_string(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Serializes to pretty-printed JSON, the form written to snapshot files.
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Decodes a document from its JSON wire form.
    pub fn from_json_str(s: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }

    /// Decodes a document from an already-parsed JSON value.
    pub fn from_json_value(value: Value) -> Result<Self, serde_json::Error> {
        serde_json::from_value(value)
    }
}
