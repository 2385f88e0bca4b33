//! Near-stateless interaction tools: `think` logs a thought, `handoff`
//! and `transfer` are declarative (the agent runtime, not this crate,
//! performs the routing — their handlers only acknowledge the call so
//! it round-trips through the same `Tool` contract), and `user_prompt`
//! bridges to a host-provided elicitation handler.

use std::sync::Arc;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::error::ToolError;
use crate::tool::{BoxFuture, Tool, ToolAnnotations, ToolCategory, ToolSet};

/// A question/option pair, matching the shape the host's elicitation
/// UI renders.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestionOption {
    pub label: String,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Question {
    pub question: String,
    #[serde(default)]
    pub header: Option<String>,
    pub options: Vec<QuestionOption>,
    #[serde(default)]
    pub multi_select: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ElicitationAction {
    Accept,
    Decline,
    Cancel,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ElicitationResponse {
    pub action: ElicitationAction,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<Value>,
}

/// Host-provided bridge the `user_prompt` tool elicits through. The
/// host owns the actual UI (CLI prompt, chat widget, ...); this crate
/// only defines the contract and the tool wrapper.
pub trait ElicitationHandler: Send + Sync {
    fn elicit(&self, questions: Vec<Question>) -> BoxFuture<'_, Result<ElicitationResponse, ToolError>>;
}

pub struct InteractionToolSet {
    thoughts: Arc<Mutex<Vec<String>>>,
    elicitation: Option<Arc<dyn ElicitationHandler>>,
}

impl InteractionToolSet {
    pub fn new(elicitation: Option<Arc<dyn ElicitationHandler>>) -> Self {
        Self {
            thoughts: Arc::new(Mutex::new(Vec::new())),
            elicitation,
        }
    }
}

impl ToolSet for InteractionToolSet {
    fn id(&self) -> &str {
        "interaction"
    }

    fn tools(&self) -> Vec<Arc<dyn Tool>> {
        let mut tools: Vec<Arc<dyn Tool>> = vec![
            Arc::new(Think { thoughts: self.thoughts.clone() }),
            Arc::new(Handoff),
            Arc::new(Transfer),
        ];
        if let Some(handler) = &self.elicitation {
            tools.push(Arc::new(UserPrompt { handler: handler.clone() }));
        }
        tools
    }
}

struct Think {
    thoughts: Arc<Mutex<Vec<String>>>,
}

impl Tool for Think {
    fn name(&self) -> &str {
        "think"
    }
    fn category(&self) -> ToolCategory {
        ToolCategory::Misc
    }
    fn description(&self) -> &str {
        "Record a thought in an advisory scratchpad and get back the full \
         list recorded so far. Has no effect beyond the current session."
    }
    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": { "thought": { "type": "string" } },
            "required": ["thought"]
        })
    }
    fn call(&self, arguments: Value) -> BoxFuture<'_, Result<Value, ToolError>> {
        Box::pin(async move {
            let thought = arguments["thought"]
                .as_str()
                .ok_or_else(|| ToolError::ArgumentDecode("thought is required".into()))?
                .to_string();
            let mut thoughts = self.thoughts.lock();
            thoughts.push(thought);
            Ok(json!({ "thoughts": *thoughts }))
        })
    }
}

struct Handoff;

impl Tool for Handoff {
    fn name(&self) -> &str {
        "handoff"
    }
    fn category(&self) -> ToolCategory {
        ToolCategory::Misc
    }
    fn description(&self) -> &str {
        "Hand the conversation off to another agent. Declarative: this \
         handler only acknowledges the call, the agent runtime performs \
         the actual routing when it observes it."
    }
    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "agent": { "type": "string", "description": "Target agent" },
                "task_description": { "type": "string" },
                "expected_output": { "type": "string" }
            },
            "required": ["agent", "task_description"]
        })
    }
    fn call(&self, arguments: Value) -> BoxFuture<'_, Result<Value, ToolError>> {
        Box::pin(async move { Ok(json!({ "acknowledged": true, "handoff": arguments })) })
    }
}

struct Transfer;

impl Tool for Transfer {
    fn name(&self) -> &str {
        "transfer"
    }
    fn category(&self) -> ToolCategory {
        ToolCategory::Misc
    }
    fn description(&self) -> &str {
        "Transfer a task to another agent. Declarative, like `handoff`: \
         the agent runtime performs the routing."
    }
    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "agent": { "type": "string", "description": "Target agent" },
                "task_description": { "type": "string" },
                "expected_output": { "type": "string" }
            },
            "required": ["agent", "task_description"]
        })
    }
    fn call(&self, arguments: Value) -> BoxFuture<'_, Result<Value, ToolError>> {
        Box::pin(async move { Ok(json!({ "acknowledged": true, "transfer": arguments })) })
    }
}

struct UserPrompt {
    handler: Arc<dyn ElicitationHandler>,
}

impl Tool for UserPrompt {
    fn name(&self) -> &str {
        "user_prompt"
    }
    fn category(&self) -> ToolCategory {
        ToolCategory::Misc
    }
    fn description(&self) -> &str {
        "Ask the user 1-4 clarifying questions with 2-4 options each, and \
         return their response: {action: accept|decline|cancel, content?}."
    }
    fn annotations(&self) -> ToolAnnotations {
        ToolAnnotations { title: Some("Ask user".into()), read_only_hint: false }
    }
    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "questions": {
                    "type": "array",
                    "minItems": 1,
                    "maxItems": 4,
                    "items": {
                        "type": "object",
                        "properties": {
                            "question": { "type": "string" },
                            "header": { "type": "string" },
                            "options": {
                                "type": "array",
                                "minItems": 2,
                                "maxItems": 4,
                                "items": {
                                    "type": "object",
                                    "properties": {
                                        "label": { "type": "string" },
                                        "description": { "type": "string" }
                                    },
                                    "required": ["label"]
                                }
                            },
                            "multi_select": { "type": "boolean", "default": false }
                        },
                        "required": ["question", "options"]
                    }
                }
            },
            "required": ["questions"]
        })
    }
    fn call(&self, arguments: Value) -> BoxFuture<'_, Result<Value, ToolError>> {
        Box::pin(async move {
            let questions: Vec<Question> = serde_json::from_value(arguments["questions"].clone())
                .map_err(|e| ToolError::ArgumentDecode(e.to_string()))?;
            if questions.is_empty() || questions.len() > 4 {
                return Err(ToolError::ArgumentDecode("must have 1-4 questions".into()));
            }
            for q in &questions {
                if q.options.len() < 2 || q.options.len() > 4 {
                    return Err(ToolError::ArgumentDecode("each question must have 2-4 options".into()));
                }
            }
            let response = self.handler.elicit(questions).await?;
            serde_json::to_value(response).map_err(|e| ToolError::Fatal(e.to_string()))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct AlwaysAccept;
    impl ElicitationHandler for AlwaysAccept {
        fn elicit(&self, _questions: Vec<Question>) -> BoxFuture<'_, Result<ElicitationResponse, ToolError>> {
            Box::pin(async { Ok(ElicitationResponse { action: ElicitationAction::Accept, content: Some(json!({"ok": true})) }) })
        }
    }

    #[tokio::test]
    async fn think_accumulates_thoughts() {
        let set = InteractionToolSet::new(None);
        let think = &set.tools()[0];
        think.call(json!({ "thought": "one" })).await.unwrap();
        let result = think.call(json!({ "thought": "two" })).await.unwrap();
        assert_eq!(result["thoughts"], json!(["one", "two"]));
    }

    #[tokio::test]
    async fn user_prompt_bridges_to_handler() {
        let set = InteractionToolSet::new(Some(Arc::new(AlwaysAccept)));
        let prompt = set.tools().into_iter().find(|t| t.name() == "user_prompt").unwrap();
        let result = prompt
            .call(json!({ "questions": [{ "question": "q", "options": [{"label":"a"},{"label":"b"}] }] }))
            .await
            .unwrap();
        assert_eq!(result["action"], json!("accept"));
    }
}
