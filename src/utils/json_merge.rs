//! Shallow JSON object merging with last-write-wins semantics.
//!
//! Artifact attachment merges field bags repeatedly over a run; the newest
//! write for a field replaces any earlier value. There is a single writer,
//! so no conflict resolution beyond replacement is needed.

use serde_json::{Map, Value};

/// Merges `fields` into `target`, replacing existing keys.
///
/// # Examples
///
/// ```
/// use serde_json::{json, Map, Value};
/// use tracegraph::utils::json_merge::merge_fields;
///
/// let mut target: Map<String, Value> = Map::new();
/// target.insert("output".into(), json!("draft"));
/// let mut update: Map<String, Value> = Map::new();
/// update.insert("output".into(), json!("final"));
/// update.insert("model".into(), json!("mixtral"));
///
/// merge_fields(&mut target, update);
/// assert_eq!(target["output"], json!("final"));
/// assert_eq!(target["model"], json!("mixtral"));
/// ```
pub fn merge_fields(target: &mut Map<String, Value>, fields: Map<String, Value>) {
    for (key, value) in fields {
        target.insert(key, value);
    }
}

/// Returns the first present key from `keys` as text, if any.
///
/// String values are returned as-is; other values are rendered as compact
/// JSON so callers always get displayable text.
#[must_use]
pub fn first_text_field(bag: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter()
        .find_map(|key| bag.get(*key))
        .map(value_to_text)
}

/// Renders a JSON value as display text without quoting plain strings.
#[must_use]
pub fn value_to_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
