//! API ToolSet: generic templated HTTP calls, each one configured
//! rather than code-generated (contrast with the OpenAPI ToolSet,
//! which synthesizes tools from a spec).

use std::collections::HashMap;
use std::sync::Arc;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use crate::error::ToolError;
use crate::tool::{BoxFuture, Tool, ToolAnnotations, ToolCategory, ToolSet};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiArgSpec {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

/// One configured API tool: `endpoint` is a template with `${name}`
/// placeholders resolved from decoded arguments; args not consumed by
/// the template become query parameters (GET/HEAD) or JSON body
/// fields (everything else).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiToolConfig {
    pub name: String,
    pub description: String,
    pub method: String,
    pub endpoint: String,
    #[serde(default)]
    pub headers: HashMap<String, String>,
    #[serde(default)]
    pub args: Vec<ApiArgSpec>,
    #[serde(default)]
    pub required: Vec<String>,
    #[serde(default)]
    pub output_schema: Option<Value>,
}

pub struct ApiToolSet {
    configs: Vec<ApiToolConfig>,
    client: Client,
}

impl ApiToolSet {
    pub fn new(configs: Vec<ApiToolConfig>) -> Self {
        Self { configs, client: Client::new() }
    }
}

impl ToolSet for ApiToolSet {
    fn id(&self) -> &str {
        "api"
    }

    fn tools(&self) -> Vec<Arc<dyn Tool>> {
        self.configs
            .iter()
            .cloned()
            .map(|config| Arc::new(ConfiguredApiTool { config, client: self.client.clone() }) as Arc<dyn Tool>)
            .collect()
    }
}

struct ConfiguredApiTool {
    config: ApiToolConfig,
    client: Client,
}

impl Tool for ConfiguredApiTool {
    fn name(&self) -> &str {
        &self.config.name
    }

    fn category(&self) -> ToolCategory {
        ToolCategory::Misc
    }

    fn description(&self) -> &str {
        &self.config.description
    }

    fn output_schema(&self) -> Option<Value> {
        self.config.output_schema.clone()
    }

    fn annotations(&self) -> ToolAnnotations {
        ToolAnnotations {
            title: Some(self.config.name.clone()),
            read_only_hint: self.config.method.eq_ignore_ascii_case("get"),
        }
    }

    fn parameters_schema(&self) -> Value {
        let mut properties = Map::new();
        for arg in &self.config.args {
            properties.insert(
                arg.name.clone(),
                json!({ "type": "string", "description": arg.description.clone().unwrap_or_default() }),
            );
        }
        json!({
            "type": "object",
            "properties": Value::Object(properties),
            "required": self.config.required,
        })
    }

    fn call(&self, arguments: Value) -> BoxFuture<'_, Result<Value, ToolError>> {
        Box::pin(async move {
            for name in &self.config.required {
                if arguments.get(name).is_none() {
                    return Err(ToolError::ArgumentDecode(format!("{name} is required")));
                }
            }

            let mut remaining: HashMap<String, Value> = arguments
                .as_object()
                .map(|m| m.iter().map(|(k, v)| (k.clone(), v.clone())).collect())
                .unwrap_or_default();

            let mut endpoint = self.config.endpoint.clone();
            for arg in &self.config.args {
                let placeholder = format!("${{{}}}", arg.name);
                if endpoint.contains(&placeholder) {
                    if let Some(value) = remaining.remove(&arg.name) {
                        let rendered = match &value {
                            Value::String(s) => s.clone(),
                            other => other.to_string(),
                        };
                        endpoint = endpoint.replace(&placeholder, &url::form_urlencoded::byte_serialize(rendered.as_bytes()).collect::<String>());
                    }
                }
            }

            let method = reqwest::Method::from_bytes(self.config.method.as_bytes())
                .map_err(|_| ToolError::ArgumentDecode(format!("invalid HTTP method: {}", self.config.method)))?;

            let mut request = self.client.request(method.clone(), &endpoint);
            for (key, value) in &self.config.headers {
                request = request.header(key, value);
            }

            if !(method == reqwest::Method::GET || method == reqwest::Method::HEAD) && !remaining.is_empty() {
                request = request.json(&remaining);
            } else if !remaining.is_empty() {
                let query: Vec<(String, String)> = remaining
                    .into_iter()
                    .map(|(k, v)| (k, match v { Value::String(s) => s, other => other.to_string() }))
                    .collect();
                request = request.query(&query);
            }

            let response = request
                .send()
                .await
                .map_err(|e| ToolError::RemoteFailure(format!("request failed: {e}")))?;

            let status = response.status();
            let body = response
                .text()
                .await
                .map_err(|e| ToolError::RemoteFailure(format!("failed to read response: {e}")))?;

            if status.as_u16() >= 400 {
                return Err(ToolError::RemoteFailure(format!("HTTP {}: {body}", status.as_u16())));
            }

            let parsed: Value = serde_json::from_str(&body).unwrap_or(Value::String(body));
            Ok(json!({ "status_code": status.as_u16(), "body": parsed }))
        })
    }
}
