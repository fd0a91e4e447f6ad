use async_trait::async_trait;
use agentdesk_toolcore::{param, ParameterDefinition, Tool, ToolContext, ToolParameters, ToolResult};

/// Tool for reading a whole file
pub struct ReadFileTool;

#[async_trait]
impl Tool for ReadFileTool {
    fn name(&self) -> &str {
        "read_file"
    }

    fn description(&self) -> &str {
        "Read the contents of a file in the base directory and return them"
    }

    fn parameters(&self) -> Vec<ParameterDefinition> {
        vec![param!("file_name", String, "Name of the file relative to the base directory", required)]
    }

    async fn execute(&self, params: ToolParameters, context: &ToolContext) -> ToolResult {
        let file_name = match params.get_required::<String>("file_name") {
            Ok(name) => name,
            Err(e) => return ToolResult::error(e.to_string()),
        };
        let path = match context.resolve_path(&file_name) {
            Ok(path) => path,
            Err(e) => return ToolResult::error(e.to_string()),
        };

        if path.is_dir() {
            return ToolResult::error(format!(
                "Path '{}' is a directory, not a file. Use list_files to see its contents.",
                file_name
            ));
        }

        match tokio::fs::read_to_string(&path).await {
            Ok(content) => ToolResult::success(content),
            Err(e) => ToolResult::error(format!("Error reading file {}: {}", file_name, e)),
        }
    }
}

/// Tool for writing a file, creating parent directories
pub struct SaveFileTool;

#[async_trait]
impl Tool for SaveFileTool {
    fn name(&self) -> &str {
        "save_file"
    }

    fn description(&self) -> &str {
        "Save contents to a file in the base directory and return the file name"
    }

    fn parameters(&self) -> Vec<ParameterDefinition> {
        vec![
            param!("contents", String, "Contents to write", required),
            param!("file_name", String, "Name of the file relative to the base directory", required),
            param!("overwrite", Boolean, "Replace the file when it already exists", default = true),
        ]
    }

    async fn execute(&self, params: ToolParameters, context: &ToolContext) -> ToolResult {
        let contents = match params.get_required::<String>("contents") {
            Ok(contents) => contents,
            Err(e) => return ToolResult::error(e.to_string()),
        };
        let file_name = match params.get_required::<String>("file_name") {
            Ok(name) => name,
            Err(e) => return ToolResult::error(e.to_string()),
        };
        let overwrite = params.get_optional::<bool>("overwrite").unwrap_or(None).unwrap_or(true);

        let path = match context.resolve_path(&file_name) {
            Ok(path) => path,
            Err(e) => return ToolResult::error(e.to_string()),
        };
        if path.exists() && !overwrite {
            return ToolResult::error(format!("File {} already exists", file_name));
        }
        if let Some(parent) = path.parent() {
            if let Err(e) = tokio::fs::create_dir_all(parent).await {
                return ToolResult::error(format!("Failed to create directories: {}", e));
            }
        }

        match tokio::fs::write(&path, contents).await {
            Ok(()) => ToolResult::success(file_name),
            Err(e) => ToolResult::error(format!("Error saving to file: {}", e)),
        }
    }
}

/// Tool listing the entries of a directory as a JSON array
pub struct ListFilesTool;

#[async_trait]
impl Tool for ListFilesTool {
    fn name(&self) -> &str {
        "list_files"
    }

    fn description(&self) -> &str {
        "List the files in the base directory, or in a sub-directory of it"
    }

    fn parameters(&self) -> Vec<ParameterDefinition> {
        vec![param!("directory", String, "Sub-directory relative to the base directory", optional)]
    }

    async fn execute(&self, params: ToolParameters, context: &ToolContext) -> ToolResult {
        let directory = params
            .get_optional::<String>("directory")
            .unwrap_or(None)
            .unwrap_or_else(|| ".".to_string());
        let dir = match context.resolve_path(&directory) {
            Ok(dir) => dir,
            Err(e) => return ToolResult::error(e.to_string()),
        };

        let mut entries = match tokio::fs::read_dir(&dir).await {
            Ok(entries) => entries,
            Err(e) => return ToolResult::error(format!("Error listing {}: {}", directory, e)),
        };

        let mut names = Vec::new();
        loop {
            match entries.next_entry().await {
                Ok(Some(entry)) => {
                    let path = entry.path();
                    let relative = path.strip_prefix(&context.work_dir).unwrap_or(&path);
                    let mut name = relative.display().to_string();
                    if path.is_dir() {
                        name.push('/');
                    }
                    names.push(name);
                }
                Ok(None) => break,
                Err(e) => return ToolResult::error(format!("Error listing {}: {}", directory, e)),
            }
        }
        names.sort();

        match serde_json::to_string_pretty(&names) {
            Ok(json) => ToolResult::success(json),
            Err(e) => ToolResult::error(e.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn params(value: serde_json::Value) -> ToolParameters {
        ToolParameters::from_json(&value.to_string()).unwrap()
    }

    fn context(dir: &std::path::Path) -> ToolContext {
        ToolContext::new(dir.to_path_buf(), "test".to_string())
    }

    #[tokio::test]
    async fn test_save_then_read() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = context(dir.path());

        let saved = SaveFileTool
            .execute(params(json!({"contents": "# Plan", "file_name": "docs/plan.md"})), &ctx)
            .await;
        assert!(saved.is_success());
        assert_eq!(saved.content, "docs/plan.md");

        let read = ReadFileTool
            .execute(params(json!({"file_name": "docs/plan.md"})), &ctx)
            .await;
        assert_eq!(read.content, "# Plan");
    }

    #[tokio::test]
    async fn test_save_respects_overwrite_flag() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = context(dir.path());
        std::fs::write(dir.path().join("a.txt"), "old").unwrap();

        let result = SaveFileTool
            .execute(
                params(json!({"contents": "new", "file_name": "a.txt", "overwrite": false})),
                &ctx,
            )
            .await;
        assert!(!result.is_success());
        assert_eq!(std::fs::read_to_string(dir.path().join("a.txt")).unwrap(), "old");
    }

    #[tokio::test]
    async fn test_paths_cannot_escape_base_dir() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = context(dir.path());

        let result = ReadFileTool
            .execute(params(json!({"file_name": "../secret.txt"})), &ctx)
            .await;
        assert!(!result.is_success());

        let result = SaveFileTool
            .execute(params(json!({"contents": "x", "file_name": "/tmp/x.txt"})), &ctx)
            .await;
        assert!(!result.is_success());
    }

    #[tokio::test]
    async fn test_list_files_sorted() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("b.md"), "").unwrap();
        std::fs::write(dir.path().join("a.md"), "").unwrap();
        std::fs::create_dir(dir.path().join("tasks")).unwrap();

        let result = ListFilesTool.execute(ToolParameters::default(), &context(dir.path())).await;
        let names: Vec<String> = serde_json::from_str(&result.content).unwrap();
        assert_eq!(names, vec!["a.md", "b.md", "tasks/"]);
    }

    #[tokio::test]
    async fn test_read_missing_file_reports_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = ReadFileTool
            .execute(params(json!({"file_name": "nope.txt"})), &context(dir.path()))
            .await;
        assert!(result.error.unwrap().starts_with("Error reading file nope.txt"));
    }
}
