use cowork_core::config::ShellConfig;
use cowork_core::tools::shell::ShellToolSet;
use cowork_core::{ToolCall, ToolCallFunction, ToolRuntime};
use serde_json::json;
use std::sync::Arc;

fn runtime_for(cwd: &std::path::Path) -> ToolRuntime {
    ToolRuntime::new(vec![Arc::new(ShellToolSet::new(ShellConfig::default(), cwd.to_path_buf()))])
}

fn call(arguments: serde_json::Value) -> ToolCall {
    ToolCall {
        function: ToolCallFunction {
            name: "shell".to_string(),
            arguments: arguments.to_string(),
        },
    }
}

mod execute_tests {
    use super::*;

    #[tokio::test]
    async fn runs_command_and_captures_output() {
        let dir = tempfile::tempdir().unwrap();
        let runtime = runtime_for(dir.path());
        let result = runtime.dispatch(call(json!({"command": "echo hello"}))).await;
        assert!(!result.is_error, "{}", result.output);
        let meta = result.meta.unwrap();
        assert_eq!(meta["success"], true);
        assert!(meta["output"].as_str().unwrap().contains("hello"));
    }

    #[tokio::test]
    async fn reports_nonzero_exit_as_unsuccessful() {
        let dir = tempfile::tempdir().unwrap();
        let runtime = runtime_for(dir.path());
        let result = runtime.dispatch(call(json!({"command": "exit 3"}))).await;
        assert!(!result.is_error);
        let meta = result.meta.unwrap();
        assert_eq!(meta["success"], false);
        assert_eq!(meta["exit_code"], 3);
    }

    #[tokio::test]
    async fn blocked_command_is_denied() {
        let dir = tempfile::tempdir().unwrap();
        let runtime = runtime_for(dir.path());
        let result = runtime.dispatch(call(json!({"command": "mkfs /dev/sda"}))).await;
        assert!(result.is_error);
    }

    #[tokio::test]
    async fn missing_command_argument_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let runtime = runtime_for(dir.path());
        let result = runtime.dispatch(call(json!({}))).await;
        assert!(result.is_error);
    }
}

mod runtime_tests {
    use super::*;

    #[tokio::test]
    async fn dispatch_reports_not_found_for_unknown_tool() {
        let dir = tempfile::tempdir().unwrap();
        let runtime = runtime_for(dir.path());
        let result = runtime
            .dispatch(ToolCall {
                function: ToolCallFunction {
                    name: "does_not_exist".to_string(),
                    arguments: "{}".to_string(),
                },
            })
            .await;
        assert!(result.is_error);
        assert_eq!(result.meta.unwrap()["kind"], "not_found");
    }

    #[tokio::test]
    async fn start_and_stop_tear_down_live_processes() {
        let dir = tempfile::tempdir().unwrap();
        let runtime = runtime_for(dir.path());
        runtime.start().await;
        assert_eq!(runtime.tools().len(), 1);
        runtime.stop().await;
    }
}
