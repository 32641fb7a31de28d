//! Artifact references: opaque ids of tool-produced tables.
//!
//! The session keeps at most one "last artifact". Whether a tool result is a
//! new artifact is decided by [`detect_artifact`], a name/prefix heuristic.
//! It is not a type check: a tool returning
//! an id in another shape (e.g. `detect_anomalies_iqr`'s tuple) is not
//! recognised.

use serde::{Deserialize, Serialize};

/// Tool name prefix whose successful result is always an artifact id
pub const LOAD_TOOL_PREFIX: &str = "load_dataframe";

/// Result prefixes recognised as artifact ids
pub const ARTIFACT_RESULT_PREFIXES: [&str; 2] = ["dataframe_", "uuid"];

/// Opaque identifier of an in-memory table
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ArtifactRef(String);

impl ArtifactRef {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ArtifactRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Decide whether a successful tool result names a new artifact.
///
/// Two independent checks, either one suffices:
/// - the tool name starts with [`LOAD_TOOL_PREFIX`];
/// - the result text starts with one of [`ARTIFACT_RESULT_PREFIXES`].
pub fn detect_artifact(tool_name: &str, result: &str) -> Option<ArtifactRef> {
    let by_tool = tool_name.starts_with(LOAD_TOOL_PREFIX);
    let by_prefix = ARTIFACT_RESULT_PREFIXES
        .iter()
        .any(|prefix| result.starts_with(prefix));
    (by_tool || by_prefix).then(|| ArtifactRef::new(result))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_tool_result_is_artifact() {
        assert_eq!(
            detect_artifact("load_dataframe", "abc"),
            Some(ArtifactRef::new("abc"))
        );
        // prefix match on the name, not equality
        assert!(detect_artifact("load_dataframe_v2", "anything").is_some());
    }

    #[test]
    fn test_prefixed_result_is_artifact() {
        assert!(detect_artifact("describe_dataframe", "dataframe_42").is_some());
        assert!(detect_artifact("custom", "uuid-1234").is_some());
    }

    #[test]
    fn test_other_results_are_not_artifacts() {
        assert!(detect_artifact("plot_time_series", "outputs/ts_1a2b3c4d.svg").is_none());
        assert!(detect_artifact("detect_anomalies_iqr", "(dataframe_1, 3)").is_none());
        assert!(detect_artifact("save_dataframe", "saved: out.csv").is_none());
    }
}
