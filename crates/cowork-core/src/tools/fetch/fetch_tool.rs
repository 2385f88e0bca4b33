//! fetch: HTTP(S) GET one or more URLs, honoring robots.txt and a body
//! size cap, with optional HTML to text/Markdown conversion.

use std::time::Duration;

use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::config::FetchConfig;
use crate::error::ToolError;
use crate::tool::{BoxFuture, Tool, ToolAnnotations, ToolCategory};

use super::html::{html_to_markdown, html_to_text};
use super::robots::RobotsCache;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Format {
    Markdown,
    Text,
    Html,
}

impl Format {
    fn parse(s: Option<&str>) -> Self {
        match s {
            Some("text") => Format::Text,
            Some("html") => Format::Html,
            _ => Format::Markdown,
        }
    }

    fn accept_header(&self) -> &'static str {
        match self {
            Format::Markdown | Format::Text => "text/html,text/plain,text/markdown",
            Format::Html => "text/html",
        }
    }
}

struct FetchedItem {
    status_code: u16,
    status: String,
    content_type: String,
    content_length: usize,
    body: String,
}

pub struct FetchUrls {
    config: FetchConfig,
    client: Client,
}

impl FetchUrls {
    pub fn new(config: FetchConfig, client: Client) -> Self {
        Self { config, client }
    }

    fn resolve_timeout(&self, requested: Option<u64>) -> Duration {
        let secs = requested
            .unwrap_or(self.config.default_timeout_secs)
            .min(self.config.max_timeout_secs);
        Duration::from_secs(secs.max(1))
    }

    async fn fetch_one(
        &self,
        robots: &mut RobotsCache<'_>,
        raw_url: &str,
        format: Format,
        timeout: Duration,
    ) -> Result<FetchedItem, String> {
        let parsed = url::Url::parse(raw_url).map_err(|e| format!("invalid URL: {e}"))?;
        if parsed.scheme() != "http" && parsed.scheme() != "https" {
            return Err("only HTTP and HTTPS URLs are supported".to_string());
        }
        if parsed.host_str().unwrap_or_default().is_empty() {
            return Err("URL is missing a host".to_string());
        }

        if !robots.is_allowed(&parsed).await {
            return Err(format!("URL blocked by robots.txt: {raw_url}"));
        }

        let response = self
            .client
            .get(parsed.clone())
            .header("Accept", format.accept_header())
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| format!("request failed: {e}"))?;

        let status_code = response.status().as_u16();
        let status = response
            .status()
            .canonical_reason()
            .unwrap_or("Unknown")
            .to_string();
        let content_type = response
            .headers()
            .get("content-type")
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_string();

        if let Some(len) = response.content_length() {
            if len as usize > self.config.max_body_bytes {
                return Err(format!(
                    "response body ({len} bytes) exceeds the {}-byte cap",
                    self.config.max_body_bytes
                ));
            }
        }

        let body = response
            .text()
            .await
            .map_err(|e| format!("failed to read response body: {e}"))?;

        let body = if body.len() > self.config.max_body_bytes {
            truncate_at_char_boundary(&body, self.config.max_body_bytes)
        } else {
            body
        };

        let is_html = content_type.contains("text/html");
        let converted = match (format, is_html) {
            (Format::Markdown, true) => html_to_markdown(&body),
            (Format::Text, true) => html_to_text(&body),
            _ => body,
        };

        Ok(FetchedItem {
            status_code,
            status,
            content_type,
            content_length: converted.len(),
            body: converted,
        })
    }
}

#[derive(Debug, Deserialize)]
struct FetchArgs {
    #[serde(default)]
    urls: Vec<String>,
    #[serde(default)]
    url: Option<String>,
    format: Option<String>,
    timeout_secs: Option<u64>,
}

impl Tool for FetchUrls {
    fn name(&self) -> &str {
        "fetch"
    }

    fn category(&self) -> ToolCategory {
        ToolCategory::Fetch
    }

    fn description(&self) -> &str {
        "Fetch one or more HTTP/HTTPS URLs. Honors each host's robots.txt, \
         caps response bodies (default 1 MiB), and can convert HTML \
         responses to plain text or Markdown. A single URL returns a text \
         summary; multiple URLs return a JSON array with one entry per URL, \
         each carrying its own status and error so one bad URL never \
         drops the rest of the batch."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "urls": {
                    "type": "array",
                    "items": { "type": "string" },
                    "description": "One or more URLs to fetch"
                },
                "url": {
                    "type": "string",
                    "description": "Shorthand for urls=[url] when fetching a single URL"
                },
                "format": {
                    "type": "string",
                    "enum": ["markdown", "text", "html"],
                    "default": "markdown"
                },
                "timeout_secs": { "type": "integer" }
            }
        })
    }

    fn annotations(&self) -> ToolAnnotations {
        ToolAnnotations {
            title: Some("Fetch".into()),
            read_only_hint: true,
        }
    }

    fn call(&self, arguments: Value) -> BoxFuture<'_, Result<Value, ToolError>> {
        Box::pin(async move {
            let args: FetchArgs = serde_json::from_value(arguments)
                .map_err(|e| ToolError::ArgumentDecode(e.to_string()))?;

            let mut urls = args.urls;
            if let Some(single) = args.url {
                urls.push(single);
            }
            if urls.is_empty() {
                return Err(ToolError::ArgumentDecode(
                    "at least one URL is required".to_string(),
                ));
            }

            let format = Format::parse(args.format.as_deref());
            let timeout = self.resolve_timeout(args.timeout_secs);
            let mut robots = RobotsCache::new(&self.client, &self.config.user_agent);

            let mut results = Vec::with_capacity(urls.len());
            for url in &urls {
                let outcome = self.fetch_one(&mut robots, url, format, timeout).await;
                results.push((url.clone(), outcome));
            }

            if results.len() == 1 {
                let (url, outcome) = results.into_iter().next().unwrap();
                return match outcome {
                    Ok(item) => Ok(Value::String(format!(
                        "Successfully fetched {url} (Status: {}, Length: {} bytes):\n\n{}",
                        item.status_code, item.content_length, item.body
                    ))),
                    Err(message) => Err(classify_error(&message)),
                };
            }

            let array: Vec<Value> = results
                .into_iter()
                .map(|(url, outcome)| match outcome {
                    Ok(item) => json!({
                        "url": url,
                        "status_code": item.status_code,
                        "status": item.status,
                        "content_type": item.content_type,
                        "content_length": item.content_length,
                        "body": item.body,
                        "error": null,
                    }),
                    Err(message) => json!({
                        "url": url,
                        "status_code": null,
                        "status": null,
                        "content_type": null,
                        "content_length": null,
                        "body": null,
                        "error": message,
                    }),
                })
                .collect();

            Ok(Value::Array(array))
        })
    }
}

fn classify_error(message: &str) -> ToolError {
    if message.contains("robots.txt") {
        ToolError::PolicyDenied(message.to_string())
    } else if message.contains("only HTTP and HTTPS") || message.contains("invalid URL") || message.contains("missing a host") {
        ToolError::ArgumentDecode(message.to_string())
    } else {
        ToolError::RemoteFailure(message.to_string())
    }
}

fn truncate_at_char_boundary(s: &str, max_bytes: usize) -> String {
    let mut end = max_bytes.min(s.len());
    while end > 0 && !s.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...[truncated]", &s[..end])
}
