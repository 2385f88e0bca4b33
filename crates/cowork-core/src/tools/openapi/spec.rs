//! Minimal OpenAPI 3.x document model: only the shapes the tool
//! synthesizer needs, not a full spec parser.

use std::collections::HashMap;

use serde::Deserialize;
use serde_json::Value;

#[derive(Debug, Deserialize)]
pub struct OpenApiDocument {
    #[serde(default)]
    pub servers: Vec<Server>,
    #[serde(default)]
    pub paths: HashMap<String, PathItem>,
}

#[derive(Debug, Deserialize)]
pub struct Server {
    pub url: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct PathItem {
    #[serde(default)]
    pub get: Option<Operation>,
    #[serde(default)]
    pub put: Option<Operation>,
    #[serde(default)]
    pub post: Option<Operation>,
    #[serde(default)]
    pub delete: Option<Operation>,
    #[serde(default)]
    pub patch: Option<Operation>,
    #[serde(default)]
    pub options: Option<Operation>,
    #[serde(default)]
    pub head: Option<Operation>,
}

impl PathItem {
    pub fn operations(&self) -> Vec<(&'static str, &Operation)> {
        let mut out = Vec::new();
        macro_rules! push {
            ($method:expr, $field:expr) => {
                if let Some(op) = &$field {
                    out.push(($method, op));
                }
            };
        }
        push!("get", self.get);
        push!("put", self.put);
        push!("post", self.post);
        push!("delete", self.delete);
        push!("patch", self.patch);
        push!("options", self.options);
        push!("head", self.head);
        out
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct Operation {
    #[serde(default)]
    pub operation_id: Option<String>,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub parameters: Vec<Parameter>,
    #[serde(default)]
    pub request_body: Option<RequestBody>,
}

#[derive(Debug, Deserialize)]
pub struct Parameter {
    pub name: String,
    #[serde(default, rename = "in")]
    pub location: String,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub schema: Option<Value>,
}

#[derive(Debug, Deserialize)]
pub struct RequestBody {
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub content: HashMap<String, MediaType>,
}

#[derive(Debug, Deserialize)]
pub struct MediaType {
    #[serde(default)]
    pub schema: Option<Value>,
}

/// `sanitize(operationId)` or `sanitize(method + '_' + path)`: replace
/// `/`, `-`, `.` with `_`, strip `{}`, trim and collapse `_` runs.
pub fn sanitize(raw: &str) -> String {
    let mut cleaned = String::with_capacity(raw.len());
    for ch in raw.chars() {
        match ch {
            '/' | '-' | '.' => cleaned.push('_'),
            '{' | '}' => {}
            c => cleaned.push(c),
        }
    }
    let mut collapsed = String::with_capacity(cleaned.len());
    let mut last_was_underscore = false;
    for ch in cleaned.chars() {
        if ch == '_' {
            if !last_was_underscore {
                collapsed.push('_');
            }
            last_was_underscore = true;
        } else {
            collapsed.push(ch);
            last_was_underscore = false;
        }
    }
    collapsed.trim_matches('_').to_string()
}

pub fn tool_name(method: &str, path: &str, operation: &Operation) -> String {
    match &operation.operation_id {
        Some(id) if !id.is_empty() => sanitize(id),
        _ => sanitize(&format!("{method}_{path}")),
    }
}

/// Resolve the base URL an operation's path is joined against:
/// `servers[0].url`, resolved relative to the spec URL if it's not
/// already absolute, else the spec URL's origin.
pub fn resolve_base_url(doc: &OpenApiDocument, spec_url: &str) -> Result<String, String> {
    let spec = url::Url::parse(spec_url).map_err(|e| format!("invalid spec URL: {e}"))?;
    match doc.servers.first() {
        Some(server) => match url::Url::parse(&server.url) {
            Ok(absolute) => Ok(absolute.to_string()),
            Err(_) => spec
                .join(&server.url)
                .map(|u| u.to_string())
                .map_err(|e| format!("could not resolve server url: {e}")),
        },
        None => Ok(format!(
            "{}://{}",
            spec.scheme(),
            spec.host_str().ok_or_else(|| "spec URL has no host".to_string())?
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_strips_braces_and_collapses_underscores() {
        assert_eq!(sanitize("getUserById"), "getUserById");
        assert_eq!(sanitize("/users/{id}/orders"), "users_id_orders");
        assert_eq!(sanitize("get_/foo--bar."), "get_foo_bar");
    }

    #[test]
    fn resolve_base_url_falls_back_to_spec_origin() {
        let doc = OpenApiDocument { servers: vec![], paths: HashMap::new() };
        let base = resolve_base_url(&doc, "https://api.example.com/v1/openapi.json").unwrap();
        assert_eq!(base, "https://api.example.com");
    }

    #[test]
    fn resolve_base_url_joins_relative_server() {
        let doc = OpenApiDocument {
            servers: vec![Server { url: "/v2".into() }],
            paths: HashMap::new(),
        };
        let base = resolve_base_url(&doc, "https://api.example.com/v1/openapi.json").unwrap();
        assert_eq!(base, "https://api.example.com/v2");
    }
}
