//! Filesystem tools: directory listing, bounded file read, file write.

use async_trait::async_trait;
use serde_json::{json, Value};
use tokio::io::AsyncReadExt;

use super::{Tool, ToolError};
use crate::sandbox::SandboxRoot;

/// Character budget for a single file read.
pub const MAX_CHARS: usize = 10_000;

/// List the immediate entries of a directory inside the sandbox.
pub struct ListFiles;

#[async_trait]
impl Tool for ListFiles {
    fn name(&self) -> &str {
        "get_files_info"
    }

    fn description(&self) -> &str {
        "Lists files in the specified directory along with their sizes, constrained to the working directory."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "directory": {
                    "type": "string",
                    "description": "The directory to list files from, relative to the working directory. If not provided, lists files in the working directory itself."
                }
            }
        })
    }

    async fn execute(&self, args: Value, root: &SandboxRoot) -> Result<String, ToolError> {
        let directory = args["directory"].as_str().unwrap_or(".");

        let resolved = root.resolve(directory).map_err(|_| ToolError::OutsideSandbox {
            verb: "list",
            path: directory.to_string(),
        })?;

        let not_a_directory =
            || ToolError::NotFound(format!("\"{}\" is not a directory", directory));
        let metadata = tokio::fs::metadata(&resolved)
            .await
            .map_err(|_| not_a_directory())?;
        if !metadata.is_dir() {
            return Err(not_a_directory());
        }

        let mut reader = tokio::fs::read_dir(&resolved).await.map_err(|e| {
            ToolError::Failed(format!("Could not list \"{}\": {}", directory, e))
        })?;

        let mut entries = Vec::new();
        while let Some(entry) = reader.next_entry().await.map_err(|e| {
            ToolError::Failed(format!("Could not list \"{}\": {}", directory, e))
        })? {
            let name = entry.file_name().to_string_lossy().into_owned();
            // Symlinks are followed; an entry reports its target's kind and
            // size, and a broken link aborts the listing.
            let metadata = tokio::fs::metadata(entry.path()).await.map_err(|e| {
                ToolError::Failed(format!("Could not get size for \"{}\": {}", name, e))
            })?;
            entries.push((name, metadata.len(), metadata.is_dir()));
        }

        // Directory-read order is filesystem-dependent; sort for stable output.
        entries.sort_by(|a, b| a.0.cmp(&b.0));

        let lines: Vec<String> = entries
            .iter()
            .map(|(name, size, is_dir)| {
                format!(
                    "- {}: file_size={} bytes, is_dir={}",
                    name,
                    size,
                    if *is_dir { "True" } else { "False" }
                )
            })
            .collect();

        Ok(lines.join("\n"))
    }
}

/// Read a file inside the sandbox, truncated to [`MAX_CHARS`] characters.
pub struct ReadFile;

#[async_trait]
impl Tool for ReadFile {
    fn name(&self) -> &str {
        "get_file_content"
    }

    fn description(&self) -> &str {
        "Reads the content of a specified file within the working directory, truncating if it exceeds the maximum allowed characters."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "file_path": {
                    "type": "string",
                    "description": "The path to the file to read, relative to the working directory."
                }
            },
            "required": ["file_path"]
        })
    }

    async fn execute(&self, args: Value, root: &SandboxRoot) -> Result<String, ToolError> {
        let file_path = args["file_path"]
            .as_str()
            .ok_or(ToolError::BadArgs("file_path"))?;

        let resolved = root.resolve(file_path).map_err(|_| ToolError::OutsideSandbox {
            verb: "read",
            path: file_path.to_string(),
        })?;

        let is_file = tokio::fs::metadata(&resolved)
            .await
            .map(|m| m.is_file())
            .unwrap_or(false);
        if !is_file {
            return Err(ToolError::NotFound(format!(
                "File not found or is not a regular file: \"{}\"",
                file_path
            )));
        }

        let file = tokio::fs::File::open(&resolved).await.map_err(|e| {
            ToolError::Failed(format!("Failed to read \"{}\": {}", file_path, e))
        })?;

        // Longest UTF-8 sequence is 4 bytes; read one character past the
        // budget so truncation is detectable without slurping the whole file.
        let byte_cap = ((MAX_CHARS + 1) * 4) as u64;
        let mut buf = Vec::new();
        file.take(byte_cap).read_to_end(&mut buf).await.map_err(|e| {
            ToolError::Failed(format!("Failed to read \"{}\": {}", file_path, e))
        })?;

        let text = String::from_utf8_lossy(&buf);
        let mut chars = text.chars();
        let head: String = chars.by_ref().take(MAX_CHARS).collect();

        if chars.next().is_some() {
            Ok(format!(
                "{} [...File \"{}\" truncated at {} characters]",
                head,
                resolved.display(),
                MAX_CHARS
            ))
        } else {
            Ok(head)
        }
    }
}

/// Create or overwrite a file inside the sandbox.
pub struct WriteFile;

#[async_trait]
impl Tool for WriteFile {
    fn name(&self) -> &str {
        "write_file"
    }

    fn description(&self) -> &str {
        "Writes content to a specified file within the working directory, creating directories as needed."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "file_path": {
                    "type": "string",
                    "description": "The path to the file to write, relative to the working directory."
                },
                "content": {
                    "type": "string",
                    "description": "The content to write to the file."
                }
            },
            "required": ["file_path", "content"]
        })
    }

    async fn execute(&self, args: Value, root: &SandboxRoot) -> Result<String, ToolError> {
        let file_path = args["file_path"]
            .as_str()
            .ok_or(ToolError::BadArgs("file_path"))?;
        let content = args["content"]
            .as_str()
            .ok_or(ToolError::BadArgs("content"))?;

        let resolved = root.resolve(file_path).map_err(|_| ToolError::OutsideSandbox {
            verb: "write to",
            path: file_path.to_string(),
        })?;

        if let Some(parent) = resolved.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(|e| {
                ToolError::Failed(format!(
                    "Failed to create parent directories for \"{}\": {}",
                    file_path, e
                ))
            })?;
        }

        tokio::fs::write(&resolved, content).await.map_err(|e| {
            ToolError::Failed(format!("Failed to write \"{}\": {}", file_path, e))
        })?;

        Ok(format!(
            "Successfully wrote to \"{}\" ({} characters written)",
            file_path,
            content.chars().count()
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sandbox() -> (tempfile::TempDir, SandboxRoot) {
        let dir = tempfile::tempdir().unwrap();
        let root = SandboxRoot::new(dir.path()).unwrap();
        (dir, root)
    }

    // ── get_files_info tests ──────────────────────────────────────────

    #[tokio::test]
    async fn lists_entries_with_sizes_and_directory_flags() {
        let (_dir, root) = sandbox();
        std::fs::write(root.as_path().join("a.txt"), "0123456789").unwrap();
        std::fs::create_dir(root.as_path().join("b")).unwrap();
        let dir_size = std::fs::metadata(root.as_path().join("b")).unwrap().len();

        let result = ListFiles.execute(json!({}), &root).await.unwrap();
        assert_eq!(
            result,
            format!(
                "- a.txt: file_size=10 bytes, is_dir=False\n- b: file_size={} bytes, is_dir=True",
                dir_size
            )
        );
    }

    #[tokio::test]
    async fn lists_a_subdirectory() {
        let (_dir, root) = sandbox();
        std::fs::create_dir(root.as_path().join("pkg")).unwrap();
        std::fs::write(root.as_path().join("pkg/mod.py"), "x = 1").unwrap();

        let result = ListFiles
            .execute(json!({"directory": "pkg"}), &root)
            .await
            .unwrap();
        assert_eq!(result, "- mod.py: file_size=5 bytes, is_dir=False");
    }

    #[tokio::test]
    async fn empty_directory_lists_nothing() {
        let (_dir, root) = sandbox();
        let result = ListFiles.execute(json!({}), &root).await.unwrap();
        assert_eq!(result, "");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn symlinked_directory_lists_as_a_directory() {
        let (_dir, root) = sandbox();
        std::fs::create_dir(root.as_path().join("real")).unwrap();
        std::os::unix::fs::symlink(root.as_path().join("real"), root.as_path().join("portal"))
            .unwrap();

        let result = ListFiles.execute(json!({}), &root).await.unwrap();
        let portal_line = result
            .lines()
            .find(|l| l.starts_with("- portal:"))
            .unwrap();
        assert!(portal_line.ends_with("is_dir=True"));
    }

    #[tokio::test]
    async fn listing_a_file_is_not_a_directory() {
        let (_dir, root) = sandbox();
        std::fs::write(root.as_path().join("a.txt"), "x").unwrap();

        let err = ListFiles
            .execute(json!({"directory": "a.txt"}), &root)
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "\"a.txt\" is not a directory");
    }

    #[tokio::test]
    async fn listing_a_missing_directory_is_not_a_directory() {
        let (_dir, root) = sandbox();

        let err = ListFiles
            .execute(json!({"directory": "ghost"}), &root)
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "\"ghost\" is not a directory");
    }

    #[tokio::test]
    async fn listing_outside_the_sandbox_is_rejected() {
        let (_dir, root) = sandbox();

        let err = ListFiles
            .execute(json!({"directory": "../"}), &root)
            .await
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Cannot list \"../\" as it is outside the permitted working directory"
        );
    }

    // ── get_file_content tests ────────────────────────────────────────

    #[tokio::test]
    async fn reads_exact_content() {
        let (_dir, root) = sandbox();
        std::fs::write(root.as_path().join("main.py"), "print(\"hi\")\n").unwrap();

        let result = ReadFile
            .execute(json!({"file_path": "main.py"}), &root)
            .await
            .unwrap();
        assert_eq!(result, "print(\"hi\")\n");
    }

    #[tokio::test]
    async fn content_at_exactly_the_budget_is_untouched() {
        let (_dir, root) = sandbox();
        let content = "a".repeat(MAX_CHARS);
        std::fs::write(root.as_path().join("exact.txt"), &content).unwrap();

        let result = ReadFile
            .execute(json!({"file_path": "exact.txt"}), &root)
            .await
            .unwrap();
        assert_eq!(result, content);
    }

    #[tokio::test]
    async fn long_content_is_truncated_with_a_marker() {
        let (_dir, root) = sandbox();
        let content = "a".repeat(MAX_CHARS + 50);
        std::fs::write(root.as_path().join("big.txt"), &content).unwrap();

        let result = ReadFile
            .execute(json!({"file_path": "big.txt"}), &root)
            .await
            .unwrap();

        let marker = format!(
            " [...File \"{}\" truncated at {} characters]",
            root.as_path().join("big.txt").display(),
            MAX_CHARS
        );
        assert!(result.ends_with(&marker));
        assert_eq!(result.len(), MAX_CHARS + marker.len());
        assert!(result.starts_with("aaa"));
    }

    #[tokio::test]
    async fn missing_file_is_not_found() {
        let (_dir, root) = sandbox();

        let err = ReadFile
            .execute(json!({"file_path": "missing.txt"}), &root)
            .await
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "File not found or is not a regular file: \"missing.txt\""
        );
    }

    #[tokio::test]
    async fn reading_a_directory_is_not_found() {
        let (_dir, root) = sandbox();
        std::fs::create_dir(root.as_path().join("sub")).unwrap();

        let err = ReadFile
            .execute(json!({"file_path": "sub"}), &root)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("not a regular file"));
    }

    #[tokio::test]
    async fn reading_outside_the_sandbox_is_rejected() {
        let base = tempfile::tempdir().unwrap();
        let inside = base.path().join("inside");
        std::fs::create_dir(&inside).unwrap();
        std::fs::write(base.path().join("secret.txt"), "s3cr3t").unwrap();
        let root = SandboxRoot::new(&inside).unwrap();

        let err = ReadFile
            .execute(json!({"file_path": "../secret.txt"}), &root)
            .await
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Cannot read \"../secret.txt\" as it is outside the permitted working directory"
        );
    }

    #[tokio::test]
    async fn missing_file_path_argument_is_rejected() {
        let (_dir, root) = sandbox();

        let err = ReadFile.execute(json!({}), &root).await.unwrap_err();
        assert!(matches!(err, ToolError::BadArgs("file_path")));
    }

    // ── write_file tests ──────────────────────────────────────────────

    #[tokio::test]
    async fn writes_and_reports_character_count() {
        let (_dir, root) = sandbox();

        let result = WriteFile
            .execute(
                json!({"file_path": "lorem.txt", "content": "wait, this isn't lorem ipsum"}),
                &root,
            )
            .await
            .unwrap();
        assert_eq!(
            result,
            "Successfully wrote to \"lorem.txt\" (28 characters written)"
        );
        assert_eq!(
            std::fs::read_to_string(root.as_path().join("lorem.txt")).unwrap(),
            "wait, this isn't lorem ipsum"
        );
    }

    #[tokio::test]
    async fn creates_missing_parent_directories() {
        let (_dir, root) = sandbox();

        let result = WriteFile
            .execute(
                json!({"file_path": "sub/dir/new.txt", "content": "hi"}),
                &root,
            )
            .await
            .unwrap();
        assert_eq!(
            result,
            "Successfully wrote to \"sub/dir/new.txt\" (2 characters written)"
        );
        assert_eq!(
            std::fs::read_to_string(root.as_path().join("sub/dir/new.txt")).unwrap(),
            "hi"
        );
    }

    #[tokio::test]
    async fn overwrites_existing_content() {
        let (_dir, root) = sandbox();
        std::fs::write(root.as_path().join("f.txt"), "old").unwrap();

        WriteFile
            .execute(json!({"file_path": "f.txt", "content": "new"}), &root)
            .await
            .unwrap();
        assert_eq!(
            std::fs::read_to_string(root.as_path().join("f.txt")).unwrap(),
            "new"
        );
    }

    #[tokio::test]
    async fn empty_content_is_a_success() {
        let (_dir, root) = sandbox();

        let result = WriteFile
            .execute(json!({"file_path": "empty.txt", "content": ""}), &root)
            .await
            .unwrap();
        assert_eq!(
            result,
            "Successfully wrote to \"empty.txt\" (0 characters written)"
        );
        assert!(root.as_path().join("empty.txt").exists());
    }

    #[tokio::test]
    async fn character_count_is_characters_not_bytes() {
        let (_dir, root) = sandbox();

        let result = WriteFile
            .execute(json!({"file_path": "u.txt", "content": "héllo ☂"}), &root)
            .await
            .unwrap();
        assert_eq!(result, "Successfully wrote to \"u.txt\" (7 characters written)");
    }

    #[tokio::test]
    async fn writing_outside_the_sandbox_mutates_nothing() {
        let base = tempfile::tempdir().unwrap();
        let inside = base.path().join("inside");
        std::fs::create_dir(&inside).unwrap();
        let root = SandboxRoot::new(&inside).unwrap();

        let err = WriteFile
            .execute(
                json!({"file_path": "../escape.txt", "content": "boom"}),
                &root,
            )
            .await
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Cannot write to \"../escape.txt\" as it is outside the permitted working directory"
        );
        assert!(!base.path().join("escape.txt").exists());
    }

    #[tokio::test]
    async fn write_then_read_round_trips() {
        let (_dir, root) = sandbox();
        let content = "line one\nline two\n";

        WriteFile
            .execute(
                json!({"file_path": "notes.txt", "content": content}),
                &root,
            )
            .await
            .unwrap();
        let read_back = ReadFile
            .execute(json!({"file_path": "notes.txt"}), &root)
            .await
            .unwrap();
        assert_eq!(read_back, content);
    }
}
