//! Length-bounded previews of step inputs and outputs.
//!
//! Events carry previews rather than full payloads so documents stay small
//! enough to serve and render. Truncation is marked explicitly so renderers
//! can tell a short value from a clipped one.

/// Marker appended to clipped previews.
pub const TRUNCATION_MARKER: &str = "... [truncated]";

/// Default preview length for step inputs and outputs.
pub const DEFAULT_PREVIEW_LEN: usize = 500;

/// Clips `text` to at most `max` characters, appending the truncation marker
/// when anything was removed.
#[must_use]
pub fn truncate_preview(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let clipped: String = text.chars().take(max).collect();
    format!("{clipped}{TRUNCATION_MARKER}")
}
