//! RAG ToolSet: a single `query` tool delegating to an external
//! retrieval manager, sorting and truncating its results.

use std::cmp::Ordering;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::error::ToolError;
use crate::tool::{BoxFuture, Tool, ToolAnnotations, ToolCategory, ToolSet};

const TOP_K: usize = 10;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievedDocument {
    pub source_path: String,
    pub content: String,
    pub chunk_index: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalMatch {
    pub document: RetrievedDocument,
    pub similarity: f64,
}

/// The external retrieval backend (embedding model + vector store);
/// this crate only consumes it through this narrow interface.
pub trait RetrievalManager: Send + Sync {
    fn search(&self, query: String) -> BoxFuture<'_, Result<Vec<RetrievalMatch>, ToolError>>;
}

pub struct RagToolSet {
    manager: Arc<dyn RetrievalManager>,
}

impl RagToolSet {
    pub fn new(manager: Arc<dyn RetrievalManager>) -> Self {
        Self { manager }
    }
}

impl ToolSet for RagToolSet {
    fn id(&self) -> &str {
        "rag"
    }

    fn tools(&self) -> Vec<Arc<dyn Tool>> {
        vec![Arc::new(Query { manager: self.manager.clone() })]
    }
}

struct Query {
    manager: Arc<dyn RetrievalManager>,
}

impl Tool for Query {
    fn name(&self) -> &str {
        "query"
    }

    fn category(&self) -> ToolCategory {
        ToolCategory::Rag
    }

    fn description(&self) -> &str {
        "Search the configured knowledge base and return the top matching \
         chunks, most similar first."
    }

    fn annotations(&self) -> ToolAnnotations {
        ToolAnnotations { title: Some("Query knowledge base".into()), read_only_hint: true }
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": { "query": { "type": "string" } },
            "required": ["query"]
        })
    }

    fn call(&self, arguments: Value) -> BoxFuture<'_, Result<Value, ToolError>> {
        Box::pin(async move {
            let query = arguments["query"]
                .as_str()
                .ok_or_else(|| ToolError::ArgumentDecode("query is required".into()))?
                .to_string();

            let mut matches = self.manager.search(query).await?;
            matches.sort_by(|a, b| b.similarity.partial_cmp(&a.similarity).unwrap_or(Ordering::Equal));
            matches.truncate(TOP_K);
            Ok(json!({ "results": matches }))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedManager(Vec<RetrievalMatch>);
    impl RetrievalManager for FixedManager {
        fn search(&self, _query: String) -> BoxFuture<'_, Result<Vec<RetrievalMatch>, ToolError>> {
            let matches = self.0.clone();
            Box::pin(async move { Ok(matches) })
        }
    }

    fn doc(path: &str, sim: f64) -> RetrievalMatch {
        RetrievalMatch {
            document: RetrievedDocument { source_path: path.into(), content: "x".into(), chunk_index: 0 },
            similarity: sim,
        }
    }

    #[tokio::test]
    async fn sorts_descending_and_truncates_to_ten() {
        let docs: Vec<_> = (0..15).map(|i| doc(&format!("d{i}"), i as f64)).collect();
        let tool = Query { manager: Arc::new(FixedManager(docs)) };
        let result = tool.call(json!({ "query": "q" })).await.unwrap();
        let results = result["results"].as_array().unwrap();
        assert_eq!(results.len(), 10);
        assert_eq!(results[0]["document"]["source_path"], "d14");
    }
}
