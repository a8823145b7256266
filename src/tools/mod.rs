//! Tool registry and dispatch.
//!
//! Each tool implements the [`Tool`] trait: a name, a description, a JSON
//! parameter schema advertised to the model, and an async `execute`. The
//! [`ToolRegistry`] owns the sandbox root and the registered tools; the
//! catalog sent to the model is derived from the registrations, so every
//! advertised name is dispatchable by construction.
//!
//! Dispatch never fails. Unknown names and tool-level errors become
//! `{"error": ...}` payloads inside the returned [`FunctionResponse`], so the
//! model sees failures as conversation content and can react to them.

mod fs;
mod script;

pub use fs::{ListFiles, ReadFile, WriteFile, MAX_CHARS};
pub use script::RunScript;

use async_trait::async_trait;
use serde_json::{json, Value};
use thiserror::Error;

use crate::llm::{FunctionCall, FunctionDeclaration, FunctionResponse};
use crate::sandbox::SandboxRoot;

/// A recoverable tool failure, surfaced to the model as an error payload.
#[derive(Debug, Error)]
pub enum ToolError {
    /// The supplied path resolves outside the sandbox root.
    #[error("Cannot {verb} \"{path}\" as it is outside the permitted working directory")]
    OutsideSandbox { verb: &'static str, path: String },

    /// Target missing, or not the kind of entry the operation needs.
    #[error("{0}")]
    NotFound(String),

    /// Filesystem or child-process failure while running the operation.
    #[error("{0}")]
    Failed(String),

    /// Malformed tool-call arguments.
    #[error("Missing or invalid argument: {0}")]
    BadArgs(&'static str),
}

/// A single operation the model can invoke.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Tool name as advertised to the model.
    fn name(&self) -> &str;

    /// Human-readable description for the catalog.
    fn description(&self) -> &str;

    /// JSON schema of the parameters.
    fn parameters_schema(&self) -> Value;

    /// Execute the tool with the given arguments inside the sandbox.
    async fn execute(&self, args: Value, root: &SandboxRoot) -> Result<String, ToolError>;
}

/// The closed set of tools, bound to one sandbox root.
pub struct ToolRegistry {
    root: SandboxRoot,
    tools: Vec<Box<dyn Tool>>,
}

impl ToolRegistry {
    /// Register the built-in tools against the given sandbox root.
    pub fn new(root: SandboxRoot) -> Self {
        let tools: Vec<Box<dyn Tool>> = vec![
            Box::new(ListFiles),
            Box::new(ReadFile),
            Box::new(RunScript::default()),
            Box::new(WriteFile),
        ];

        Self { root, tools }
    }

    /// The catalog advertised to the model, derived from the registrations.
    pub fn declarations(&self) -> Vec<FunctionDeclaration> {
        self.tools
            .iter()
            .map(|tool| FunctionDeclaration {
                name: tool.name().to_string(),
                description: tool.description().to_string(),
                parameters: tool.parameters_schema(),
            })
            .collect()
    }

    fn find(&self, name: &str) -> Option<&dyn Tool> {
        self.tools
            .iter()
            .find(|tool| tool.name() == name)
            .map(Box::as_ref)
    }

    /// Execute one model-issued call and wrap the outcome.
    ///
    /// The sandbox root is always the one this registry was built with; a
    /// `working_directory` argument supplied by the model is ignored.
    pub async fn dispatch(&self, call: &FunctionCall) -> FunctionResponse {
        tracing::info!("Calling function: {}", call.name);
        tracing::debug!("Arguments: {}", call.args);

        let Some(tool) = self.find(&call.name) else {
            return FunctionResponse {
                name: call.name.clone(),
                response: json!({ "error": format!("Unknown function: {}", call.name) }),
            };
        };

        if call.args.get("working_directory").is_some() {
            tracing::debug!(
                "Ignoring model-supplied working_directory for {}",
                call.name
            );
        }

        let response = match tool.execute(call.args.clone(), &self.root).await {
            Ok(result) => json!({ "result": result }),
            Err(e) => json!({ "error": e.to_string() }),
        };

        FunctionResponse {
            name: call.name.clone(),
            response,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn registry() -> (tempfile::TempDir, ToolRegistry) {
        let dir = tempfile::tempdir().unwrap();
        let root = SandboxRoot::new(dir.path()).unwrap();
        (dir, ToolRegistry::new(root))
    }

    // ── catalog tests ─────────────────────────────────────────────────

    #[test]
    fn catalog_lists_the_four_operations() {
        let (_dir, registry) = registry();
        let names: Vec<String> = registry
            .declarations()
            .into_iter()
            .map(|d| d.name)
            .collect();

        assert_eq!(
            names,
            vec![
                "get_files_info",
                "get_file_content",
                "run_python_file",
                "write_file"
            ]
        );
    }

    #[test]
    fn every_declared_tool_is_dispatchable() {
        let (_dir, registry) = registry();
        for declaration in registry.declarations() {
            assert!(
                registry.find(&declaration.name).is_some(),
                "catalog advertises {} but no tool dispatches it",
                declaration.name
            );
        }
    }

    #[test]
    fn every_schema_is_an_object_with_properties() {
        let (_dir, registry) = registry();
        for declaration in registry.declarations() {
            assert_eq!(declaration.parameters["type"], "object");
            assert!(declaration.parameters["properties"].is_object());
        }
    }

    // ── dispatch tests ────────────────────────────────────────────────

    #[tokio::test]
    async fn unknown_function_becomes_an_error_value() {
        let (_dir, registry) = registry();
        let call = FunctionCall {
            name: "red_button".to_string(),
            args: json!({}),
        };

        let response = registry.dispatch(&call).await;
        assert_eq!(response.name, "red_button");
        assert_eq!(
            response.response,
            json!({"error": "Unknown function: red_button"})
        );
    }

    #[tokio::test]
    async fn success_is_wrapped_under_the_result_key() {
        let (dir, registry) = registry();
        std::fs::write(dir.path().join("a.txt"), "0123456789").unwrap();

        let call = FunctionCall {
            name: "get_files_info".to_string(),
            args: json!({}),
        };

        let response = registry.dispatch(&call).await;
        let result = response.response["result"].as_str().unwrap();
        assert!(result.contains("a.txt: file_size=10 bytes, is_dir=False"));
    }

    #[tokio::test]
    async fn empty_result_is_still_a_success() {
        let (_dir, registry) = registry();
        let call = FunctionCall {
            name: "get_files_info".to_string(),
            args: json!({}),
        };

        // Listing an empty sandbox produces an empty string, not an error.
        let response = registry.dispatch(&call).await;
        assert_eq!(response.response, json!({"result": ""}));
    }

    #[tokio::test]
    async fn tool_failure_is_wrapped_under_the_error_key() {
        let (_dir, registry) = registry();
        let call = FunctionCall {
            name: "get_file_content".to_string(),
            args: json!({"file_path": "missing.txt"}),
        };

        let response = registry.dispatch(&call).await;
        let error = response.response["error"].as_str().unwrap();
        assert!(error.contains("File not found or is not a regular file"));
    }

    #[test]
    fn model_supplied_working_directory_is_ignored() {
        let (dir, registry) = registry();
        std::fs::write(dir.path().join("a.txt"), "0123456789").unwrap();

        // The call asks for a different root; the registry's root wins.
        let call = FunctionCall {
            name: "get_files_info".to_string(),
            args: json!({"working_directory": "/etc"}),
        };

        let response = tokio_test::block_on(registry.dispatch(&call));
        let result = response.response["result"].as_str().unwrap();
        assert!(result.contains("a.txt"));
        assert!(!result.contains("passwd"));
    }

    #[tokio::test]
    async fn containment_error_never_leaks_file_content() {
        let base = tempfile::tempdir().unwrap();
        let inside = base.path().join("inside");
        std::fs::create_dir(&inside).unwrap();
        std::fs::write(base.path().join("secret.txt"), "s3cr3t").unwrap();

        let registry = ToolRegistry::new(SandboxRoot::new(&inside).unwrap());
        let call = FunctionCall {
            name: "get_file_content".to_string(),
            args: json!({"file_path": "../secret.txt"}),
        };

        let response = registry.dispatch(&call).await;
        assert!(response.response.get("result").is_none());
        let error = response.response["error"].as_str().unwrap();
        assert!(error.contains("outside the permitted working directory"));
        assert!(!error.contains("s3cr3t"));
    }
}
