//! Schema version handling for graph documents.
//!
//! Producers stamp each document with a version string under
//! `metadata.version`. Consumers parse it into [`SchemaVersion`] before
//! projecting artifacts; unrecognized versions are refused rather than
//! guessed at.

use std::fmt;

use miette::Diagnostic;
use thiserror::Error;

/// Versions of the graph document wire format this crate understands.
///
/// The two generations differ in how `artifacts` is keyed: 1.1 keys records
/// by node id, 1.2 keys them by semantic role name. See
/// [`crate::project::ArtifactLayout`].
///
/// # Examples
///
/// ```
/// use tracegraph::document::SchemaVersion;
///
/// assert_eq!("1.1".parse::<SchemaVersion>().unwrap(), SchemaVersion::V1_1);
/// assert_eq!(SchemaVersion::V1_2.as_str(), "1.2");
/// assert!("2.0".parse::<SchemaVersion>().is_err());
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum SchemaVersion {
    /// Original format: artifacts keyed by node id, flat role bags.
    #[default]
    V1_1,
    /// Enhanced format: artifacts keyed by role name, wrapped records.
    V1_2,
}

impl SchemaVersion {
    /// The wire spelling of this version.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            SchemaVersion::V1_1 => "1.1",
            SchemaVersion::V1_2 => "1.2",
        }
    }

    /// All versions this crate can project.
    pub const SUPPORTED: &'static [SchemaVersion] = &[SchemaVersion::V1_1, SchemaVersion::V1_2];
}

impl fmt::Display for SchemaVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for SchemaVersion {
    type Err = SchemaVersionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "1.1" => Ok(SchemaVersion::V1_1),
            "1.2" => Ok(SchemaVersion::V1_2),
            other => Err(SchemaVersionError {
                version: other.to_string(),
            }),
        }
    }
}

/// A document declared a schema version outside the supported set.
#[derive(Debug, Error, Diagnostic)]
#[error("unsupported graph document schema version: {version}")]
#[diagnostic(
    code(tracegraph::document::unsupported_schema_version),
    help("supported versions are 1.1 and 1.2; re-export the run with a current producer")
)]
pub struct SchemaVersionError {
    /// The version string as it appeared on the wire.
    pub version: String,
}
