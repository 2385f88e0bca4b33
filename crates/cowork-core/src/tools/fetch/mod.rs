//! Fetch ToolSet: a single `fetch` tool for HTTP(S) GET with robots.txt
//! enforcement, a body size cap, and HTML conversion.

mod fetch_tool;
mod html;
mod robots;

pub use fetch_tool::FetchUrls;

use std::sync::Arc;
use std::time::Duration;

use crate::config::FetchConfig;
use crate::error::ToolError;
use crate::tool::{Tool, ToolSet};

pub struct FetchToolSet {
    config: FetchConfig,
    client: reqwest::Client,
}

impl FetchToolSet {
    pub fn new(config: FetchConfig) -> Result<Self, ToolError> {
        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(Duration::from_secs(config.max_timeout_secs))
            .build()
            .map_err(|e| ToolError::Fatal(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { config, client })
    }
}

impl ToolSet for FetchToolSet {
    fn id(&self) -> &str {
        "fetch"
    }

    fn tools(&self) -> Vec<Arc<dyn Tool>> {
        vec![Arc::new(FetchUrls::new(self.config.clone(), self.client.clone()))]
    }

    fn instructions(&self) -> Option<String> {
        Some(
            "Use `fetch` to read the contents of a URL. Prefer format=markdown for \
             articles and documentation, format=text when only the words matter, \
             and format=html only when the raw markup itself is needed."
                .to_string(),
        )
    }
}
