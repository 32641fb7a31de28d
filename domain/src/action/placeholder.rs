//! Placeholder resolution: filling artifact references before dispatch.
//!
//! Models cannot know the opaque id a previous tool call produced, so they
//! either write the sentinel [`LAST_ARTIFACT_PLACEHOLDER`] or omit
//! `dataframe_id` entirely. Two independent triggers start resolution:
//!
//! 1. a string literal anywhere in the arguments contains the sentinel;
//! 2. the `dataframe_id` argument is absent.
//!
//! When either fires and the session has a last artifact, the sentinel is
//! replaced inside every string literal, and a missing `dataframe_id` is
//! inserted for tools that declare that parameter. Without a last artifact
//! the action is left as written; the dispatcher reports the failure.

use super::entities::Action;
use crate::artifact::ArtifactRef;
use crate::tool::entities::ToolSpec;
use serde_json::Value;

/// Sentinel the model writes to mean "the most recent artifact"
pub const LAST_ARTIFACT_PLACEHOLDER: &str = "<last_df_id>";

/// Parameter name carrying an artifact id
pub const DATAFRAME_ID_PARAM: &str = "dataframe_id";

/// What a resolution pass did to an action
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    /// Neither trigger fired
    NotNeeded,
    /// A trigger fired but the session has no artifact yet
    NoArtifact,
    /// Placeholders were substituted
    Resolved {
        /// Number of sentinel occurrences replaced
        replaced: usize,
        /// Whether `dataframe_id` was inserted
        inserted: bool,
    },
}

/// Resolve artifact placeholders in `action` in place.
///
/// Must run exactly once per turn, after extraction and before dispatch.
pub fn resolve_placeholders(
    action: &mut Action,
    spec: &ToolSpec,
    last_artifact: Option<&ArtifactRef>,
) -> Resolution {
    let has_token = action.arguments.values().any(contains_placeholder);
    let missing_id = !action.arguments.contains_key(DATAFRAME_ID_PARAM);
    if !has_token && !missing_id {
        return Resolution::NotNeeded;
    }

    let Some(artifact) = last_artifact else {
        return Resolution::NoArtifact;
    };

    let mut replaced = 0;
    for value in action.arguments.values_mut() {
        replaced += substitute(value, artifact.as_str());
    }

    let declares_id = spec
        .get(&action.name)
        .is_some_and(|tool| tool.has_parameter(DATAFRAME_ID_PARAM));
    let inserted = missing_id && declares_id;
    if inserted {
        action.arguments.insert(
            DATAFRAME_ID_PARAM.to_string(),
            Value::String(artifact.as_str().to_string()),
        );
    }

    Resolution::Resolved { replaced, inserted }
}

/// Whether a literal (at any nesting depth) still holds the sentinel
pub fn contains_placeholder(value: &Value) -> bool {
    match value {
        Value::String(s) => s.contains(LAST_ARTIFACT_PLACEHOLDER),
        Value::Array(items) => items.iter().any(contains_placeholder),
        Value::Object(map) => map.values().any(contains_placeholder),
        _ => false,
    }
}

fn substitute(value: &mut Value, artifact: &str) -> usize {
    match value {
        Value::String(s) => {
            let count = s.matches(LAST_ARTIFACT_PLACEHOLDER).count();
            if count > 0 {
                *s = s.replace(LAST_ARTIFACT_PLACEHOLDER, artifact);
            }
            count
        }
        Value::Array(items) => items.iter_mut().map(|v| substitute(v, artifact)).sum(),
        Value::Object(map) => map.values_mut().map(|v| substitute(v, artifact)).sum(),
        _ => 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::parser::parse_action;
    use crate::tool::entities::{ToolDefinition, ToolParameter};
    use serde_json::json;

    fn spec() -> ToolSpec {
        ToolSpec::new()
            .register(
                ToolDefinition::new("load_dataframe", "Load")
                    .with_parameter(ToolParameter::new("file_path", "Path", true)),
            )
            .register(
                ToolDefinition::new("describe_dataframe", "Describe")
                    .with_parameter(ToolParameter::new(DATAFRAME_ID_PARAM, "Id", true)),
            )
    }

    fn artifact() -> ArtifactRef {
        ArtifactRef::new("abc")
    }

    #[test]
    fn test_missing_dataframe_id_is_inserted() {
        let mut action = parse_action("describe_dataframe()").unwrap();
        let resolution = resolve_placeholders(&mut action, &spec(), Some(&artifact()));

        assert_eq!(
            resolution,
            Resolution::Resolved {
                replaced: 0,
                inserted: true
            }
        );
        assert_eq!(action.to_string(), r#"describe_dataframe(dataframe_id="abc")"#);
    }

    #[test]
    fn test_placeholder_token_is_replaced() {
        let mut action =
            parse_action("describe_dataframe(dataframe_id='<last_df_id>')").unwrap();
        let resolution = resolve_placeholders(&mut action, &spec(), Some(&artifact()));

        assert_eq!(
            resolution,
            Resolution::Resolved {
                replaced: 1,
                inserted: false
            }
        );
        assert_eq!(action.get_string("dataframe_id"), Some("abc"));
    }

    #[test]
    fn test_nested_and_embedded_tokens_are_replaced() {
        let mut action = Action::new("describe_dataframe")
            .with_arg(DATAFRAME_ID_PARAM, "dataframe_9")
            .with_arg("note", "from <last_df_id>")
            .with_arg("extra", json!({"ids": ["<last_df_id>", "x"]}));
        let resolution = resolve_placeholders(&mut action, &spec(), Some(&artifact()));

        assert_eq!(
            resolution,
            Resolution::Resolved {
                replaced: 2,
                inserted: false
            }
        );
        assert_eq!(action.get_string("note"), Some("from abc"));
        assert_eq!(action.arguments["extra"], json!({"ids": ["abc", "x"]}));
        assert_eq!(action.get_string(DATAFRAME_ID_PARAM), Some("dataframe_9"));
    }

    #[test]
    fn test_explicit_id_without_token_is_untouched() {
        let mut action = parse_action("describe_dataframe(dataframe_id='dataframe_7')").unwrap();
        let before = action.clone();
        assert_eq!(
            resolve_placeholders(&mut action, &spec(), Some(&artifact())),
            Resolution::NotNeeded
        );
        assert_eq!(action, before);
    }

    #[test]
    fn test_no_artifact_leaves_action_unresolved() {
        let mut action = parse_action("describe_dataframe(dataframe_id='<last_df_id>')").unwrap();
        assert_eq!(
            resolve_placeholders(&mut action, &spec(), None),
            Resolution::NoArtifact
        );
        assert_eq!(action.get_string("dataframe_id"), Some(LAST_ARTIFACT_PLACEHOLDER));

        let mut action = parse_action("describe_dataframe()").unwrap();
        assert_eq!(
            resolve_placeholders(&mut action, &spec(), None),
            Resolution::NoArtifact
        );
        assert!(action.arguments.is_empty());
    }

    #[test]
    fn test_tools_without_dataframe_id_get_no_insertion() {
        let mut action = parse_action("load_dataframe(file_path='x.csv')").unwrap();
        let resolution = resolve_placeholders(&mut action, &spec(), Some(&artifact()));

        assert_eq!(
            resolution,
            Resolution::Resolved {
                replaced: 0,
                inserted: false
            }
        );
        assert!(!action.arguments.contains_key(DATAFRAME_ID_PARAM));
    }

    #[test]
    fn test_unknown_tool_gets_no_insertion() {
        let mut action = parse_action("unknown_tool()").unwrap();
        resolve_placeholders(&mut action, &spec(), Some(&artifact()));
        assert!(action.arguments.is_empty());
    }

    #[test]
    fn test_contains_placeholder() {
        assert!(contains_placeholder(&json!("<last_df_id>")));
        assert!(contains_placeholder(&json!([1, {"a": "x<last_df_id>"}])));
        assert!(!contains_placeholder(&json!({"<last_df_id>": 1})));
        assert!(!contains_placeholder(&json!(42)));
    }
}
