//! Per-version artifact layout strategies.
//!
//! The two supported schema generations key the document's `artifacts` map
//! incompatibly: 1.1 keys a flat role bag per node id, 1.2 keys wrapped
//! records per semantic role name. There is no general migration rule, so
//! each version gets its own explicit resolution branch, selected once per
//! document.

use serde_json::Value;

use crate::document::{ArtifactRecord, GraphDocument, SchemaVersion};
use crate::normalize::CanonicalCategory;

/// How `document.artifacts` is keyed for a given schema version.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ArtifactLayout {
    /// Schema 1.1: `artifacts[node_id]` is a flat bag of role fields.
    NodeKeyed,
    /// Schema 1.2: `artifacts[role]` is a wrapped record with a `content`
    /// field; node association goes through key naming conventions.
    RoleKeyed,
}

/// Role-key spellings mapped to the flat field names views read.
const ROLE_FIELDS: &[(&str, &str)] = &[
    ("prompt", "prompt"),
    ("template", "prompt"),
    ("final_prompt", "resolved_prompt"),
    ("resolved_prompt", "resolved_prompt"),
    ("response", "output"),
    ("llm_response", "output"),
    ("completion", "output"),
    ("output", "output"),
    ("input", "input"),
    ("model_input", "input"),
    ("parsed", "parsed"),
    ("parsed_output", "parsed"),
    ("tool_io", "tool_io"),
    ("docs", "docs"),
    ("documents", "docs"),
    ("query", "query"),
    ("memory_state", "state"),
];

/// Role keys that imply a category, used to attach role-keyed records that
/// carry no node id in their key.
const ROLE_CATEGORIES: &[(&str, CanonicalCategory)] = &[
    ("prompt", CanonicalCategory::PromptTemplate),
    ("template", CanonicalCategory::PromptTemplate),
    ("final_prompt", CanonicalCategory::PromptTemplate),
    ("resolved_prompt", CanonicalCategory::PromptTemplate),
    ("response", CanonicalCategory::LanguageModel),
    ("llm_response", CanonicalCategory::LanguageModel),
    ("completion", CanonicalCategory::LanguageModel),
    ("model_input", CanonicalCategory::LanguageModel),
    ("parsed", CanonicalCategory::OutputParser),
    ("parsed_output", CanonicalCategory::OutputParser),
    ("tool_io", CanonicalCategory::Tool),
    ("docs", CanonicalCategory::Retriever),
    ("documents", CanonicalCategory::Retriever),
    ("query", CanonicalCategory::Retriever),
    ("memory_state", CanonicalCategory::Memory),
];

impl ArtifactLayout {
    /// Selects the layout for a parsed schema version.
    #[must_use]
    pub fn for_version(version: SchemaVersion) -> Self {
        match version {
            SchemaVersion::V1_1 => ArtifactLayout::NodeKeyed,
            SchemaVersion::V1_2 => ArtifactLayout::RoleKeyed,
        }
    }

    /// Resolves the flat field bag for one node under this layout.
    ///
    /// Role-keyed association order: exact node-id key, then
    /// `{node_id}_`-prefixed keys, then role keys whose implied category
    /// matches the node's. Iteration over the sorted artifact map keeps the
    /// result deterministic.
    #[must_use]
    pub fn bag_for(
        &self,
        doc: &GraphDocument,
        node_id: &str,
        category: CanonicalCategory,
    ) -> ArtifactRecord {
        match self {
            ArtifactLayout::NodeKeyed => {
                doc.artifacts.get(node_id).cloned().unwrap_or_default()
            }
            ArtifactLayout::RoleKeyed => {
                let prefix = format!("{node_id}_");
                let mut bag = ArtifactRecord::new();
                for (key, record) in &doc.artifacts {
                    if key == node_id {
                        // Direct hit: treat the record as the node's bag.
                        for (field, value) in record {
                            bag.insert(field.clone(), value.clone());
                        }
                        continue;
                    }
                    let role = if let Some(stripped) = key.strip_prefix(&prefix) {
                        stripped
                    } else if role_category(key) == Some(category) {
                        key.as_str()
                    } else {
                        continue;
                    };
                    bag.insert(field_for_role(role).to_string(), unwrap_record(record));
                }
                bag
            }
        }
    }
}

fn field_for_role(role: &str) -> &str {
    ROLE_FIELDS
        .iter()
        .find(|(known, _)| *known == role)
        .map(|(_, field)| *field)
        .unwrap_or(role)
}

fn role_category(role: &str) -> Option<CanonicalCategory> {
    ROLE_CATEGORIES
        .iter()
        .find(|(known, _)| *known == role)
        .map(|(_, category)| *category)
}

/// Role-keyed records wrap their payload under `content`; older writers
/// sometimes store the value bare.
fn unwrap_record(record: &ArtifactRecord) -> Value {
    record
        .get("content")
        .cloned()
        .unwrap_or_else(|| Value::Object(record.clone()))
}
