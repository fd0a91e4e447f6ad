use async_trait::async_trait;
use serde_json::json;
use std::sync::Arc;

use agentdesk_knowledge::KnowledgeBase;
use agentdesk_toolcore::{param, ParameterDefinition, Tool, ToolContext, ToolParameters, ToolResult};

/// Lets the model query a knowledge base on its own
pub struct SearchKnowledgeBaseTool {
    knowledge: Arc<KnowledgeBase>,
}

impl SearchKnowledgeBaseTool {
    pub fn new(knowledge: Arc<KnowledgeBase>) -> Self {
        Self { knowledge }
    }
}

#[async_trait]
impl Tool for SearchKnowledgeBaseTool {
    fn name(&self) -> &str {
        "search_knowledge_base"
    }

    fn description(&self) -> &str {
        "Search the knowledge base for information relevant to a query"
    }

    fn parameters(&self) -> Vec<ParameterDefinition> {
        vec![param!("query", String, "The text to search for", required)]
    }

    async fn execute(&self, params: ToolParameters, _context: &ToolContext) -> ToolResult {
        let query = match params.get_required::<String>("query") {
            Ok(query) => query,
            Err(e) => return ToolResult::error(e.to_string()),
        };

        match self.knowledge.search(&query).await {
            Ok(results) if results.is_empty() => ToolResult::success("No documents found"),
            Ok(results) => {
                let documents: Vec<_> = results
                    .iter()
                    .map(|r| {
                        json!({
                            "name": r.document.name,
                            "content": r.document.content,
                            "meta_data": r.document.meta_data,
                            "relevance": r.relevance,
                        })
                    })
                    .collect();
                match serde_json::to_string_pretty(&documents) {
                    Ok(json) => ToolResult::success(json),
                    Err(e) => ToolResult::error(e.to_string()),
                }
            }
            Err(e) => ToolResult::error(format!("Knowledge base search failed: {}", e)),
        }
    }
}
