//! OpenAPI ToolSet: fetches and parses configured OpenAPI documents,
//! synthesizing one Tool per `(path, method)` operation.

mod spec;

use std::collections::HashMap;
use std::sync::Arc;

use reqwest::Client;
use serde_json::{json, Map, Value};
use tracing::{info, warn};

use crate::config::OpenApiSourceConfig;
use crate::error::ToolError;
use crate::tool::{BoxFuture, Tool, ToolAnnotations, ToolCategory, ToolSet};

use spec::{resolve_base_url, sanitize, tool_name, OpenApiDocument, Parameter};

const MAX_SPEC_BYTES: usize = 10 * 1024 * 1024;
const MAX_RESPONSE_BYTES: usize = 1024 * 1024;

/// Resolves `${headers.NAME}` placeholders in a configured header value
/// against a per-request upstream-header map supplied by the caller.
pub trait UpstreamHeaders: Send + Sync {
    fn get(&self, name: &str) -> Option<String>;
}

#[derive(Default)]
pub struct NoUpstreamHeaders;
impl UpstreamHeaders for NoUpstreamHeaders {
    fn get(&self, _name: &str) -> Option<String> {
        None
    }
}

struct SynthesizedOperation {
    name: String,
    method: String,
    path: String,
    summary: String,
    path_params: Vec<Parameter>,
    query_params: Vec<Parameter>,
    body_properties: Map<String, Value>,
    required: Vec<String>,
}

pub struct OpenApiToolSet {
    sources: Vec<OpenApiSourceConfig>,
    client: Client,
    upstream_headers: Arc<dyn UpstreamHeaders>,
    base_urls: parking_lot::RwLock<HashMap<String, String>>,
    operations: parking_lot::RwLock<Vec<(String, SynthesizedOperation)>>,
}

impl OpenApiToolSet {
    pub fn new(sources: Vec<OpenApiSourceConfig>, client: Client) -> Self {
        Self::with_upstream_headers(sources, client, Arc::new(NoUpstreamHeaders))
    }

    pub fn with_upstream_headers(
        sources: Vec<OpenApiSourceConfig>,
        client: Client,
        upstream_headers: Arc<dyn UpstreamHeaders>,
    ) -> Self {
        Self {
            sources,
            client,
            upstream_headers,
            base_urls: parking_lot::RwLock::new(HashMap::new()),
            operations: parking_lot::RwLock::new(Vec::new()),
        }
    }

    async fn fetch_one(&self, source: &OpenApiSourceConfig) -> Result<(), ToolError> {
        let mut request = self.client.get(&source.spec_url);
        for (key, value) in &source.headers {
            request = request.header(key, value);
        }
        let response = request
            .send()
            .await
            .map_err(|e| ToolError::RemoteFailure(format!("fetching {}: {e}", source.spec_url)))?;

        let bytes = response
            .bytes()
            .await
            .map_err(|e| ToolError::RemoteFailure(format!("reading {}: {e}", source.spec_url)))?;
        if bytes.len() > MAX_SPEC_BYTES {
            return Err(ToolError::RemoteFailure(format!(
                "spec {} exceeds {MAX_SPEC_BYTES} byte cap",
                source.spec_url
            )));
        }

        let doc: OpenApiDocument = serde_json::from_slice(&bytes)
            .map_err(|e| ToolError::RemoteFailure(format!("parsing {}: {e}", source.spec_url)))?;

        let base_url = resolve_base_url(&doc, &source.spec_url).map_err(ToolError::RemoteFailure)?;
        self.base_urls.write().insert(source.name.clone(), base_url);

        let mut synthesized = Vec::new();
        for (path, item) in &doc.paths {
            for (method, operation) in item.operations() {
                let name = tool_name(method, path, operation);
                let mut path_params = Vec::new();
                let mut query_params = Vec::new();
                for param in &operation.parameters {
                    match param.location.as_str() {
                        "path" => path_params.push(clone_param(param)),
                        _ => query_params.push(clone_param(param)),
                    }
                }

                let mut body_properties = Map::new();
                let mut required = Vec::new();
                for param in &path_params {
                    if param.required {
                        required.push(param.name.clone());
                    }
                }
                for param in &query_params {
                    if param.required {
                        required.push(param.name.clone());
                    }
                }
                if let Some(request_body) = &operation.request_body {
                    if let Some(media) = request_body.content.get("application/json") {
                        if let Some(Value::Object(props)) =
                            media.schema.as_ref().and_then(|s| s.get("properties")).cloned()
                        {
                            let body_required: Vec<String> = media
                                .schema
                                .as_ref()
                                .and_then(|s| s.get("required"))
                                .and_then(|r| r.as_array())
                                .map(|arr| arr.iter().filter_map(|v| v.as_str()).map(String::from).collect())
                                .unwrap_or_default();
                            for (key, schema) in props {
                                let prefixed = format!("body_{key}");
                                if body_required.contains(&key) {
                                    required.push(prefixed.clone());
                                }
                                body_properties.insert(prefixed, schema);
                            }
                        }
                    }
                }

                synthesized.push((
                    source.name.clone(),
                    SynthesizedOperation {
                        name,
                        method: method.to_string(),
                        path: path.clone(),
                        summary: operation
                            .summary
                            .clone()
                            .or_else(|| operation.description.clone())
                            .unwrap_or_else(|| format!("{} {}", method.to_uppercase(), path)),
                        path_params,
                        query_params,
                        body_properties,
                        required,
                    },
                ));
            }
        }

        info!(source = %source.name, operations = synthesized.len(), "synthesized OpenAPI tools");
        self.operations.write().extend(synthesized);
        Ok(())
    }
}

fn clone_param(param: &Parameter) -> Parameter {
    Parameter {
        name: param.name.clone(),
        location: param.location.clone(),
        required: param.required,
        description: param.description.clone(),
        schema: param.schema.clone(),
    }
}

impl ToolSet for OpenApiToolSet {
    fn id(&self) -> &str {
        "openapi"
    }

    fn tools(&self) -> Vec<Arc<dyn Tool>> {
        let base_urls = self.base_urls.read();
        self.operations
            .read()
            .iter()
            .filter_map(|(source_name, op)| {
                let base_url = base_urls.get(source_name)?.clone();
                Some(Arc::new(OpenApiTool {
                    source_name: source_name.clone(),
                    base_url,
                    name: op.name.clone(),
                    method: op.method.clone(),
                    path: op.path.clone(),
                    summary: op.summary.clone(),
                    path_params: op.path_params.iter().map(|p| p.name.clone()).collect(),
                    query_params: op.query_params.iter().map(|p| p.name.clone()).collect(),
                    body_properties: op.body_properties.clone(),
                    required: op.required.clone(),
                    client: self.client.clone(),
                    headers: self
                        .sources
                        .iter()
                        .find(|s| &s.name == source_name)
                        .map(|s| s.headers.clone())
                        .unwrap_or_default(),
                    upstream_headers: self.upstream_headers.clone(),
                }) as Arc<dyn Tool>)
            })
            .collect()
    }

    fn start(&self) -> BoxFuture<'_, Result<(), ToolError>> {
        Box::pin(async move {
            for source in &self.sources {
                if let Err(e) = self.fetch_one(source).await {
                    warn!(source = %source.name, error = %e, "failed to synthesize OpenAPI tools");
                }
            }
            Ok(())
        })
    }
}

struct OpenApiTool {
    source_name: String,
    base_url: String,
    name: String,
    method: String,
    path: String,
    summary: String,
    path_params: Vec<String>,
    query_params: Vec<String>,
    body_properties: Map<String, Value>,
    required: Vec<String>,
    client: Client,
    headers: HashMap<String, String>,
    upstream_headers: Arc<dyn UpstreamHeaders>,
}

impl Tool for OpenApiTool {
    fn name(&self) -> &str {
        &self.name
    }

    fn category(&self) -> ToolCategory {
        ToolCategory::OpenApi
    }

    fn description(&self) -> &str {
        &self.summary
    }

    fn annotations(&self) -> ToolAnnotations {
        let method = self.method.to_lowercase();
        ToolAnnotations {
            title: Some(format!("{} ({})", self.name, self.source_name)),
            read_only_hint: matches!(method.as_str(), "get" | "head" | "options"),
        }
    }

    fn parameters_schema(&self) -> Value {
        let mut properties = Map::new();
        for name in self.path_params.iter().chain(self.query_params.iter()) {
            properties.insert(name.clone(), json!({ "type": "string" }));
        }
        for (key, schema) in &self.body_properties {
            properties.insert(key.clone(), schema.clone());
        }
        json!({
            "type": "object",
            "properties": Value::Object(properties),
            "required": self.required,
        })
    }

    fn call(&self, arguments: Value) -> BoxFuture<'_, Result<Value, ToolError>> {
        Box::pin(async move {
            for name in &self.required {
                if arguments.get(name).is_none() {
                    return Err(ToolError::ArgumentDecode(format!("{name} is required")));
                }
            }

            let mut path = self.path.clone();
            for param in &self.path_params {
                if let Some(value) = arguments.get(param) {
                    let rendered = value_to_string(value);
                    let encoded = url::form_urlencoded::byte_serialize(rendered.as_bytes()).collect::<String>();
                    path = path.replace(&format!("{{{param}}}"), &encoded);
                }
            }

            let mut url = format!("{}{}", self.base_url.trim_end_matches('/'), path);
            let query: Vec<(String, String)> = self
                .query_params
                .iter()
                .filter_map(|name| arguments.get(name).map(|v| (name.clone(), value_to_string(v))))
                .collect();
            if !query.is_empty() {
                let encoded = url::form_urlencoded::Serializer::new(String::new())
                    .extend_pairs(&query)
                    .finish();
                url = format!("{url}?{encoded}");
            }

            let method = reqwest::Method::from_bytes(self.method.to_uppercase().as_bytes())
                .map_err(|_| ToolError::Fatal(format!("invalid HTTP method: {}", self.method)))?;
            let mut request = self.client.request(method.clone(), &url);

            for (key, value) in &self.headers {
                let resolved = resolve_header_placeholder(value, self.upstream_headers.as_ref());
                request = request.header(key, resolved);
            }

            if !self.body_properties.is_empty() {
                let mut body = Map::new();
                for key in self.body_properties.keys() {
                    let field = key.strip_prefix("body_").unwrap_or(key);
                    if let Some(value) = arguments.get(key) {
                        body.insert(field.to_string(), value.clone());
                    }
                }
                if !body.is_empty() {
                    request = request.json(&Value::Object(body));
                }
            }

            let response = request
                .send()
                .await
                .map_err(|e| ToolError::RemoteFailure(format!("request failed: {e}")))?;
            let status = response.status();

            let bytes = response
                .bytes()
                .await
                .map_err(|e| ToolError::RemoteFailure(format!("reading response: {e}")))?;
            let truncated = &bytes[..bytes.len().min(MAX_RESPONSE_BYTES)];
            let body_text = String::from_utf8_lossy(truncated).to_string();

            if status.as_u16() >= 400 {
                return Err(ToolError::RemoteFailure(format!("HTTP {}: {body_text}", status.as_u16())));
            }

            let parsed: Value = serde_json::from_str(&body_text).unwrap_or(Value::String(body_text));
            Ok(json!({ "status_code": status.as_u16(), "body": parsed }))
        })
    }
}

fn value_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn resolve_header_placeholder(template: &str, upstream: &dyn UpstreamHeaders) -> String {
    if let Some(name) = template.strip_prefix("${headers.").and_then(|s| s.strip_suffix('}')) {
        return upstream.get(name).unwrap_or_default();
    }
    template.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_placeholder_resolves_from_upstream() {
        struct Fixed;
        impl UpstreamHeaders for Fixed {
            fn get(&self, name: &str) -> Option<String> {
                (name == "Authorization").then(|| "Bearer xyz".to_string())
            }
        }
        assert_eq!(resolve_header_placeholder("${headers.Authorization}", &Fixed), "Bearer xyz");
        assert_eq!(resolve_header_placeholder("application/json", &Fixed), "application/json");
    }

    #[test]
    fn sanitize_used_for_operation_naming() {
        assert_eq!(sanitize("list_pets"), "list_pets");
    }
}
