//! Web search tool
//!
//! Queries the DuckDuckGo HTML endpoint and returns the result snippets as a
//! single block of text, which is what the agent reads as its observation.

use async_trait::async_trait;
use scraper::{Html, Selector};
use std::time::Duration;
use tracing::debug;

use crate::config::SearchConfig;
use crate::error::{CabError, Result};

use super::{Tool, ToolContext};

/// Returned when the search produced no snippets.
pub const NO_RESULTS: &str = "No good DuckDuckGo Search Result was found";

const USER_AGENT: &str = concat!("cabchat/", env!("CARGO_PKG_VERSION"));

/// Tool for searching the web.
///
/// The action input is used verbatim as the query. Up to `max_results`
/// snippets are joined with a space.
///
/// # Example
/// ```no_run
/// use cabchat::tools::{Tool, ToolContext, WebSearchTool};
///
/// # tokio_test::block_on(async {
/// let tool = WebSearchTool::new().unwrap();
/// let text = tool.execute("rust async book", &ToolContext::new()).await.unwrap();
/// println!("{}", text);
/// # });
/// ```
pub struct WebSearchTool {
    client: reqwest::Client,
    endpoint: String,
    max_results: usize,
}

impl WebSearchTool {
    /// Create a search tool with the default endpoint and limits.
    pub fn new() -> Result<Self> {
        Self::from_config(&SearchConfig::default())
    }

    pub fn from_config(config: &SearchConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
            max_results: config.max_results,
        })
    }
}

/// Pull result snippets out of a DuckDuckGo HTML results page.
fn extract_snippets(html: &str, max_results: usize) -> Result<Vec<String>> {
    let selector = Selector::parse(".result__snippet")
        .map_err(|e| CabError::Tool(format!("invalid snippet selector: {}", e)))?;

    let document = Html::parse_document(html);
    let snippets = document
        .select(&selector)
        .map(|node| {
            node.text()
                .collect::<String>()
                .split_whitespace()
                .collect::<Vec<_>>()
                .join(" ")
        })
        .filter(|text| !text.is_empty())
        .take(max_results)
        .collect();
    Ok(snippets)
}

#[async_trait]
impl Tool for WebSearchTool {
    fn name(&self) -> &str {
        "web_search"
    }

    fn description(&self) -> &str {
        "Search the web for current information. Input should be a search query."
    }

    async fn execute(&self, input: &str, _ctx: &ToolContext) -> Result<String> {
        let query = input.trim();
        if query.is_empty() {
            return Err(CabError::Tool("search query is empty".into()));
        }

        debug!(query, "searching the web");

        let response = self
            .client
            .get(&self.endpoint)
            .query(&[("q", query)])
            .send()
            .await
            .map_err(|e| CabError::Tool(format!("search request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(CabError::Tool(format!(
                "search returned HTTP {}",
                status.as_u16()
            )));
        }

        let html = response
            .text()
            .await
            .map_err(|e| CabError::Tool(format!("failed to read search results: {}", e)))?;

        let snippets = extract_snippets(&html, self.max_results)?;
        if snippets.is_empty() {
            return Ok(NO_RESULTS.to_string());
        }
        Ok(snippets.join(" "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const RESULTS_PAGE: &str = r#"
        <html><body>
          <div class="result">
            <a class="result__a" href="https://example.com/fares">Airport fares</a>
            <a class="result__snippet" href="https://example.com/fares">
              Cab fares from <b>downtown</b> to the airport
              average $35.
            </a>
          </div>
          <div class="result">
            <a class="result__snippet">Flat rates apply after 10pm.</a>
          </div>
          <div class="result">
            <a class="result__snippet">Tolls are extra.</a>
          </div>
        </body></html>
    "#;

    fn tool_for(server: &MockServer, max_results: usize) -> WebSearchTool {
        WebSearchTool::from_config(&SearchConfig {
            endpoint: format!("{}/html/", server.uri()),
            max_results,
            timeout_secs: 5,
        })
        .unwrap()
    }

    #[test]
    fn test_extract_snippets_normalizes_whitespace() {
        let snippets = extract_snippets(RESULTS_PAGE, 10).unwrap();
        assert_eq!(
            snippets,
            vec![
                "Cab fares from downtown to the airport average $35.",
                "Flat rates apply after 10pm.",
                "Tolls are extra.",
            ]
        );
    }

    #[test]
    fn test_extract_snippets_respects_limit() {
        let snippets = extract_snippets(RESULTS_PAGE, 2).unwrap();
        assert_eq!(snippets.len(), 2);
    }

    #[tokio::test]
    async fn test_search_joins_snippets() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/html/"))
            .and(query_param("q", "fare downtown to airport"))
            .respond_with(ResponseTemplate::new(200).set_body_string(RESULTS_PAGE))
            .expect(1)
            .mount(&server)
            .await;

        let out = tool_for(&server, 2)
            .execute("  fare downtown to airport ", &ToolContext::new())
            .await
            .unwrap();
        assert_eq!(
            out,
            "Cab fares from downtown to the airport average $35. Flat rates apply after 10pm."
        );
    }

    #[tokio::test]
    async fn test_search_without_results() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html></html>"))
            .mount(&server)
            .await;

        let out = tool_for(&server, 5)
            .execute("zzzz", &ToolContext::new())
            .await
            .unwrap();
        assert_eq!(out, NO_RESULTS);
    }

    #[tokio::test]
    async fn test_search_http_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let err = tool_for(&server, 5)
            .execute("anything", &ToolContext::new())
            .await
            .unwrap_err();
        assert!(err.to_string().contains("HTTP 503"));
    }

    #[tokio::test]
    async fn test_empty_query_is_rejected() {
        let tool = WebSearchTool::new().unwrap();
        let err = tool.execute("   ", &ToolContext::new()).await.unwrap_err();
        assert!(err.to_string().contains("empty"));
    }

    #[test]
    fn test_web_search_tool_metadata() {
        let tool = WebSearchTool::new().unwrap();
        assert_eq!(tool.name(), "web_search");
        assert!(tool.description().contains("Search the web"));
    }
}
