//! System prompt templates for the agent.

use crate::tools::ToolRegistry;

/// Build the system prompt with tool definitions.
///
/// The sandbox path is deliberately not disclosed to the model; paths in
/// function calls are relative and the root is injected at dispatch time.
pub fn build_system_prompt(tools: &ToolRegistry) -> String {
    let tool_descriptions = tools
        .declarations()
        .iter()
        .map(|d| format!("- **{}**: {}", d.name, d.description))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        r#"You are a helpful AI coding agent.

When a user asks a question or makes a request, make a function call plan. You can perform the following operations:

{tool_descriptions}

All paths you provide should be relative to the working directory. You do not need to specify the working directory in your function calls as it is automatically injected for security reasons.

When you have gathered enough information to answer, reply with plain text instead of a function call."#
    )
}
