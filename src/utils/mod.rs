//! Small JSON and text helpers shared across the crate.

pub mod json_merge;
pub mod preview;
