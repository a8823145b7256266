//! Python script execution inside the sandbox.

use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};
use tokio::process::Command;

use super::{Tool, ToolError};
use crate::sandbox::SandboxRoot;

const SCRIPT_TIMEOUT: Duration = Duration::from_secs(30);

/// Run a Python file with `python3`, capturing stdout and stderr.
pub struct RunScript {
    timeout: Duration,
}

impl Default for RunScript {
    fn default() -> Self {
        Self {
            timeout: SCRIPT_TIMEOUT,
        }
    }
}

#[async_trait]
impl Tool for RunScript {
    fn name(&self) -> &str {
        "run_python_file"
    }

    fn description(&self) -> &str {
        "Executes a Python file within the working directory with optional arguments and returns its output."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "file_path": {
                    "type": "string",
                    "description": "The path to the Python file to execute, relative to the working directory."
                },
                "args": {
                    "type": "array",
                    "items": { "type": "string" },
                    "description": "Optional list of arguments to pass to the Python script."
                }
            },
            "required": ["file_path"]
        })
    }

    async fn execute(&self, args: Value, root: &SandboxRoot) -> Result<String, ToolError> {
        let file_path = args["file_path"]
            .as_str()
            .ok_or(ToolError::BadArgs("file_path"))?;
        let extra_args: Vec<String> = args["args"]
            .as_array()
            .map(|a| {
                a.iter()
                    .filter_map(Value::as_str)
                    .map(String::from)
                    .collect()
            })
            .unwrap_or_default();

        let resolved = root.resolve(file_path).map_err(|_| ToolError::OutsideSandbox {
            verb: "execute",
            path: file_path.to_string(),
        })?;

        let is_file = tokio::fs::metadata(&resolved)
            .await
            .map(|m| m.is_file())
            .unwrap_or(false);
        if !is_file {
            return Err(ToolError::NotFound(format!(
                "File \"{}\" not found.",
                file_path
            )));
        }
        if !file_path.ends_with(".py") {
            return Err(ToolError::NotFound(format!(
                "\"{}\" is not a Python file.",
                file_path
            )));
        }

        // kill_on_drop reaps the child if the timeout abandons the future.
        let output = tokio::time::timeout(
            self.timeout,
            Command::new("python3")
                .arg(&resolved)
                .args(&extra_args)
                .current_dir(root.as_path())
                .stdout(Stdio::piped())
                .stderr(Stdio::piped())
                .kill_on_drop(true)
                .output(),
        )
        .await
        .map_err(|_| {
            ToolError::Failed(format!(
                "Execution of \"{}\" timed out after {} seconds",
                file_path,
                self.timeout.as_secs()
            ))
        })?
        .map_err(|e| ToolError::Failed(format!("Failed to execute \"{}\": {}", file_path, e)))?;

        let stdout = String::from_utf8_lossy(&output.stdout);
        let stdout = stdout.trim();
        let stderr = String::from_utf8_lossy(&output.stderr);
        let stderr = stderr.trim();

        let mut sections = Vec::new();
        if !stdout.is_empty() {
            sections.push(format!("STDOUT:\n{}", stdout));
        }
        if !stderr.is_empty() {
            sections.push(format!("STDERR:\n{}", stderr));
        }
        // A non-zero exit is still a tool result, not a dispatch error.
        let code = output.status.code().unwrap_or(-1);
        if code != 0 {
            sections.push(format!("Process exited with code {}", code));
        }

        if sections.is_empty() {
            Ok("No output produced.".to_string())
        } else {
            Ok(sections.join("\n"))
        }
    }
}
