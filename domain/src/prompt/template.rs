//! Prompt template for the first turn of a conversation

use crate::action::{ACTION_MARKER, LAST_ARTIFACT_PLACEHOLDER};
use crate::tool::ToolSpec;

/// Templates for generating the conversation preamble
pub struct PromptTemplate;

impl PromptTemplate {
    /// Role and working rules for the analysis agent
    pub fn system() -> &'static str {
        r#"You are an expert in engineering time-series data analysis, working as a tool-using agent.
Your task is to fulfil the user's natural-language instruction over the available data by calling the provided tools.

Workflow:
1. Understand the user's instruction and the current data state.
2. Think about the problem and break it into steps.
3. Choose the tool that fits the next step.
4. Call the tool and read its output.
5. Continue thinking and calling tools until the task is complete.
6. Finally, present the results and insights clearly and concisely.

Rules:
- Before every action, write a "Thought:" explaining your decision.
- Prefer the provided tools over generating code or data yourself.
- If a tool call fails, analyse the error and try to correct it."#
    }

    /// Format expected for tool calls, appended after the tool list
    pub fn action_format() -> String {
        format!(
            r#"To call a tool, end your reply with a single line:
{marker} tool_name(param="value", other=1.5)
Only keyword arguments with literal values (strings, numbers, True/False, None, lists, dicts) are accepted.
Use "{placeholder}" or omit dataframe_id to refer to the most recently loaded dataframe."#,
            marker = ACTION_MARKER,
            placeholder = LAST_ARTIFACT_PLACEHOLDER,
        )
    }

    /// Describe every registered tool in registration order
    pub fn tools_description(spec: &ToolSpec) -> String {
        spec.all()
            .map(|tool| {
                let mut block = format!("Tool: {}\nDescription: {}\n", tool.name, tool.description);
                if tool.parameters.is_empty() {
                    block.push_str("Parameters: none\n");
                } else {
                    block.push_str("Parameters:\n");
                    for param in &tool.parameters {
                        let optional = if param.required { "" } else { ", optional" };
                        block.push_str(&format!(
                            "  {} ({}{}): {}\n",
                            param.name, param.param_type, optional, param.description
                        ));
                    }
                }
                if !tool.returns.is_empty() {
                    block.push_str(&format!("Returns: {}\n", tool.returns));
                }
                block
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Build the system preamble injected before the first user message
    pub fn build_full_prompt(spec: &ToolSpec, user_instruction: &str, data_summary: &str) -> String {
        format!(
            "--- System Message ---\n{system}\n\n\
             --- Tools ---\n{tools}\n{format}\n\n\
             --- Current Data Context ---\n{summary}\n\n\
             --- User Instruction ---\n{instruction}\n\n\
             --- Begin Task ---\nThought:",
            system = Self::system(),
            tools = Self::tools_description(spec).trim_end(),
            format = Self::action_format(),
            summary = data_summary,
            instruction = user_instruction,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tool::{ToolDefinition, ToolParameter};

    fn spec() -> ToolSpec {
        ToolSpec::new()
            .register(
                ToolDefinition::new("load_dataframe", "Load a data file into memory")
                    .with_parameter(ToolParameter::new("file_path", "Path to the file", true))
                    .with_parameter(ToolParameter::new("file_type", "csv", false))
                    .with_returns("dataframe_id (str)"),
            )
            .register(ToolDefinition::new("noop", "Does nothing"))
    }

    #[test]
    fn test_tools_description_lists_parameters() {
        let text = PromptTemplate::tools_description(&spec());
        assert!(text.contains("Tool: load_dataframe"));
        assert!(text.contains("  file_path (str): Path to the file"));
        assert!(text.contains("  file_type (str, optional): csv"));
        assert!(text.contains("Returns: dataframe_id (str)"));
        assert!(text.contains("Tool: noop\nDescription: Does nothing\nParameters: none"));
        assert!(text.find("load_dataframe") < text.find("noop"));
    }

    #[test]
    fn test_full_prompt_sections_in_order() {
        let prompt = PromptTemplate::build_full_prompt(&spec(), "plot the data", "Directory: data");
        let sections = [
            "--- System Message ---",
            "--- Tools ---",
            "--- Current Data Context ---\nDirectory: data",
            "--- User Instruction ---\nplot the data",
            "--- Begin Task ---",
        ];
        let mut cursor = 0;
        for section in sections {
            let found = prompt[cursor..].find(section).unwrap();
            cursor += found + section.len();
        }
        assert!(prompt.ends_with("Thought:"));
        assert!(prompt.contains(LAST_ARTIFACT_PLACEHOLDER));
    }
}
