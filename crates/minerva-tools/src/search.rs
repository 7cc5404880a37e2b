//! Web search via the DuckDuckGo Instant Answer API.

use async_trait::async_trait;
use serde_json::{json, Value as JsonValue};
use tracing::debug;

use minerva_ai::{Tool, ToolContext, ToolDeclaration, ToolError};

const DDG_BASE: &str = "https://api.duckduckgo.com/";

/// Maximum related results forwarded to the model.
const MAX_RESULTS: usize = 5;

/// Performs a web search and returns the abstract plus top results.
pub struct SearchTool {
    http: reqwest::Client,
}

impl SearchTool {
    pub fn new() -> Self {
        Self {
            http: reqwest::Client::builder()
                .connect_timeout(std::time::Duration::from_secs(5))
                .timeout(std::time::Duration::from_secs(15))
                .build()
                .expect("failed to build HTTP client"),
        }
    }

    fn condense(query: &str, payload: &JsonValue) -> JsonValue {
        let mut results = Vec::new();
        if let Some(topics) = payload["RelatedTopics"].as_array() {
            for topic in topics {
                // Category groupings nest their topics one level down;
                // only leaf entries carry Text + FirstURL.
                let (text, url) = (topic["Text"].as_str(), topic["FirstURL"].as_str());
                if let (Some(text), Some(url)) = (text, url) {
                    results.push(json!({ "text": text, "url": url }));
                    if results.len() >= MAX_RESULTS {
                        break;
                    }
                }
            }
        }

        json!({
            "query": query,
            "heading": payload["Heading"].as_str().unwrap_or(""),
            "abstract": payload["AbstractText"].as_str().unwrap_or(""),
            "source_url": payload["AbstractURL"].as_str().unwrap_or(""),
            "results": results,
        })
    }
}

impl Default for SearchTool {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Tool for SearchTool {
    fn declaration(&self) -> ToolDeclaration {
        ToolDeclaration {
            name: "perform_web_search".to_string(),
            description: "Search the web for up-to-date information on a topic.".to_string(),
            parameters: json!({
                "type": "object",
                "properties": {
                    "query": {
                        "type": "string",
                        "description": "The search query"
                    }
                },
                "required": ["query"]
            }),
        }
    }

    async fn invoke(&self, args: &JsonValue, _ctx: &ToolContext<'_>) -> Result<JsonValue, ToolError> {
        let query = args["query"]
            .as_str()
            .filter(|q| !q.trim().is_empty())
            .ok_or_else(|| ToolError::InvalidArgs("missing required argument 'query'".into()))?;

        debug!(%query, "Performing web search");

        let response = self
            .http
            .get(DDG_BASE)
            .query(&[
                ("q", query),
                ("format", "json"),
                ("no_html", "1"),
                ("skip_disambig", "1"),
            ])
            .send()
            .await
            .map_err(|e| ToolError::Request(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ToolError::Request(format!(
                "search provider returned HTTP {status}"
            )));
        }

        let payload: JsonValue = response
            .json()
            .await
            .map_err(|e| ToolError::InvalidResponse(e.to_string()))?;

        Ok(Self::condense(query, &payload))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn declaration_requires_query() {
        let decl = SearchTool::new().declaration();
        assert_eq!(decl.name, "perform_web_search");
        assert_eq!(decl.parameters["required"][0], "query");
    }

    #[test]
    fn condense_collects_leaf_topics() {
        let payload = json!({
            "Heading": "Rust (programming language)",
            "AbstractText": "Rust is a systems programming language.",
            "AbstractURL": "https://en.wikipedia.org/wiki/Rust",
            "RelatedTopics": [
                { "Text": "Cargo - package manager", "FirstURL": "https://a.example" },
                { "Name": "Category", "Topics": [] },
                { "Text": "rustc - compiler", "FirstURL": "https://b.example" }
            ]
        });

        let condensed = SearchTool::condense("rust language", &payload);
        assert_eq!(condensed["heading"], "Rust (programming language)");
        assert_eq!(condensed["results"].as_array().unwrap().len(), 2);
        assert_eq!(condensed["results"][1]["url"], "https://b.example");
    }

    #[test]
    fn condense_caps_result_count() {
        let topics: Vec<_> = (0..10)
            .map(|i| json!({ "Text": format!("t{i}"), "FirstURL": format!("https://{i}.example") }))
            .collect();
        let condensed = SearchTool::condense("q", &json!({ "RelatedTopics": topics }));
        assert_eq!(condensed["results"].as_array().unwrap().len(), MAX_RESULTS);
    }

    #[tokio::test]
    async fn missing_query_is_invalid_args() {
        let tool = SearchTool::new();
        let err = tool
            .invoke(&json!({}), &ToolContext::default())
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::InvalidArgs(_)));
    }
}
