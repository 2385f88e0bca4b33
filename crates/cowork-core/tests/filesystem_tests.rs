use cowork_core::tools::filesystem::{FilesystemToolSet, Sandbox};
use cowork_core::{ToolCall, ToolCallFunction, ToolRuntime};
use std::fs;
use std::sync::Arc;
use tempfile::TempDir;

fn setup_test_dir() -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    fs::create_dir_all(dir.path().join("src")).unwrap();
    fs::write(dir.path().join("src/main.rs"), "fn main() {}\n").unwrap();
    fs::write(dir.path().join("README.md"), "# demo\n").unwrap();
    dir
}

fn runtime_for(dir: &TempDir) -> ToolRuntime {
    let sandbox = Sandbox::new(vec![dir.path().to_path_buf()]);
    ToolRuntime::new(vec![Arc::new(FilesystemToolSet::with_sandbox(sandbox, vec![]))])
}

fn call(name: &str, arguments: serde_json::Value) -> ToolCall {
    ToolCall {
        function: ToolCallFunction {
            name: name.to_string(),
            arguments: arguments.to_string(),
        },
    }
}

mod read_file_tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn reads_existing_file() {
        let dir = setup_test_dir();
        let runtime = runtime_for(&dir);
        let path = dir.path().join("src/main.rs").to_string_lossy().to_string();
        let result = runtime.dispatch(call("read_file", json!({"path": path}))).await;
        assert!(!result.is_error, "{}", result.output);
        assert_eq!(result.meta.unwrap()["content"], "fn main() {}\n");
    }

    #[tokio::test]
    async fn rejects_path_outside_sandbox() {
        let dir = setup_test_dir();
        let outside = tempfile::tempdir().unwrap();
        let runtime = runtime_for(&dir);
        let path = outside.path().join("secret.txt").to_string_lossy().to_string();
        let result = runtime.dispatch(call("read_file", json!({"path": path}))).await;
        assert!(result.is_error);
    }

    #[tokio::test]
    async fn missing_path_argument_is_rejected() {
        let dir = setup_test_dir();
        let runtime = runtime_for(&dir);
        let result = runtime.dispatch(call("read_file", json!({}))).await;
        assert!(result.is_error);
    }
}

mod write_and_edit_tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn write_then_edit_roundtrip() {
        let dir = setup_test_dir();
        let runtime = runtime_for(&dir);
        let target = dir.path().join("notes.txt");
        let target_str = target.to_string_lossy().to_string();

        let result = runtime
            .dispatch(call(
                "write_file",
                json!({"path": target_str, "content": "hello world"}),
            ))
            .await;
        assert!(!result.is_error, "{}", result.output);
        assert_eq!(fs::read_to_string(&target).unwrap(), "hello world");

        let result = runtime
            .dispatch(call(
                "edit_file",
                json!({
                    "path": target_str,
                    "edits": [{"old_string": "world", "new_string": "rust"}],
                }),
            ))
            .await;
        assert!(!result.is_error, "{}", result.output);
        assert_eq!(fs::read_to_string(&target).unwrap(), "hello rust");
    }

    #[tokio::test]
    async fn edit_fails_when_old_string_not_found() {
        let dir = setup_test_dir();
        let runtime = runtime_for(&dir);
        let target = dir.path().join("src/main.rs").to_string_lossy().to_string();

        let result = runtime
            .dispatch(call(
                "edit_file",
                json!({
                    "path": target,
                    "edits": [{"old_string": "does not exist", "new_string": "x"}],
                }),
            ))
            .await;
        assert!(result.is_error);
    }
}

mod search_tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn search_files_finds_by_name() {
        let dir = setup_test_dir();
        let runtime = runtime_for(&dir);
        let result = runtime
            .dispatch(call(
                "search_files",
                json!({"path": dir.path().to_string_lossy(), "pattern": "main"}),
            ))
            .await;
        assert!(!result.is_error, "{}", result.output);
        let matches = result.meta.unwrap()["matches"].as_array().unwrap().clone();
        assert!(matches.iter().any(|m| m.as_str().unwrap().contains("main.rs")));
    }

    #[tokio::test]
    async fn search_files_content_finds_by_regex() {
        let dir = setup_test_dir();
        let runtime = runtime_for(&dir);
        let result = runtime
            .dispatch(call(
                "search_files_content",
                json!({"path": dir.path().to_string_lossy(), "pattern": "fn main"}),
            ))
            .await;
        assert!(!result.is_error, "{}", result.output);
        let matches = result.meta.unwrap()["matches"].as_array().unwrap().clone();
        assert!(!matches.is_empty());
    }
}
