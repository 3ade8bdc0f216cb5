// Explanation endpoint client
// One JSON POST per request, no retries, no explicit timeout

use serde::{Deserialize, Serialize};

use crate::error::{ExtensionError, Result};
use crate::settings::ExplanationStyle;

/// Shown when the endpoint answers 2xx without an `explanation` field.
pub const NO_EXPLANATION: &str = "No explanation available.";

/// Context sent with the popup's manual connection test.
pub const SAMPLE_CONTEXT: &str = "Artificial intelligence (AI) is a branch of computer science that aims to create intelligent machines that work and react like humans.";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExplainRequest {
    pub text: String,
    pub context: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub style: Option<ExplanationStyle>,
}

impl ExplainRequest {
    pub fn new(text: impl Into<String>, context: impl Into<String>, style: ExplanationStyle) -> Self {
        Self {
            text: text.into(),
            context: context.into(),
            style: Some(style),
        }
    }

    /// Fixed connectivity probe payload
    pub fn probe() -> Self {
        Self {
            text: "test".to_string(),
            context: "test context".to_string(),
            style: None,
        }
    }

    /// Realistic payload used by the popup's "Test connection" button
    pub fn sample(style: ExplanationStyle) -> Self {
        Self::new("artificial intelligence", SAMPLE_CONTEXT, style)
    }
}

#[derive(Debug, Deserialize)]
struct ExplainResponse {
    explanation: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    detail: Option<String>,
}

/// Result of a connectivity probe
#[derive(Debug, Clone, PartialEq)]
pub enum ProbeOutcome {
    /// Endpoint answered 2xx
    Connected,
    /// Endpoint answered with a non-2xx status
    Rejected(u16),
    /// Request never got an HTTP answer
    Unreachable(String),
}

/// What the content script ends up displaying
#[derive(Debug, Clone, PartialEq)]
pub struct Explanation {
    pub text: String,
    /// True when `text` was synthesized locally after a failed request
    pub fallback: bool,
}

/// Canned text shown when the endpoint cannot produce an explanation.
/// Always contains the selected text verbatim.
pub fn fallback_explanation(text: &str, api_url: &str) -> String {
    let origin = reqwest::Url::parse(api_url)
        .map(|url| url.origin().ascii_serialization())
        .unwrap_or_else(|_| api_url.to_string());

    format!(
        "**Explaina AI Response:** \"{}\" appears to be a term or concept that could benefit from further explanation. Based on the context provided, this seems to be related to the topic being discussed. Please ensure the backend API is running at {}.",
        text, origin
    )
}

#[derive(Clone, Default)]
pub struct ExplainClient {
    http: reqwest::Client,
}

impl ExplainClient {
    pub fn new() -> Self {
        Self {
            http: reqwest::Client::new(),
        }
    }

    async fn post(&self, api_url: &str, request: &ExplainRequest) -> Result<reqwest::Response> {
        Ok(self
            .http
            .post(api_url)
            .header("Content-Type", "application/json")
            .json(request)
            .send()
            .await?)
    }

    /// Ask the endpoint for an explanation
    pub async fn explain(&self, api_url: &str, request: &ExplainRequest) -> Result<String> {
        log::info!("Calling explanation API for: {}", request.text);

        let response = self.post(api_url, request).await?;
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let detail = serde_json::from_str::<ErrorBody>(&body)
                .unwrap_or_default()
                .detail
                .unwrap_or_else(|| "Unknown error".to_string());
            return Err(ExtensionError::Http {
                status: status.as_u16(),
                detail,
            });
        }

        let body = response.text().await?;
        let data: ExplainResponse = serde_json::from_str(&body)
            .map_err(|e| ExtensionError::InvalidResponse(e.to_string()))?;

        Ok(data
            .explanation
            .unwrap_or_else(|| NO_EXPLANATION.to_string()))
    }

    /// Like `explain`, but any failure turns into the canned fallback text
    pub async fn explain_or_fallback(&self, api_url: &str, request: &ExplainRequest) -> Explanation {
        match self.explain(api_url, request).await {
            Ok(text) => Explanation {
                text,
                fallback: false,
            },
            Err(e) => {
                log::error!("Explanation API call failed: {}", e);
                Explanation {
                    text: fallback_explanation(&request.text, api_url),
                    fallback: true,
                }
            }
        }
    }

    /// One POST with `request`; only the status matters
    pub async fn probe(&self, api_url: &str, request: &ExplainRequest) -> ProbeOutcome {
        match self.post(api_url, request).await {
            Ok(response) if response.status().is_success() => ProbeOutcome::Connected,
            Ok(response) => ProbeOutcome::Rejected(response.status().as_u16()),
            Err(e) => {
                log::error!("API connection test failed: {}", e);
                ProbeOutcome::Unreachable(e.to_string())
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::{matchers, Mock, MockServer, ResponseTemplate};

    /// Address nothing listens on
    pub(crate) const DEAD_URL: &str = "http://127.0.0.1:1/explain";

    #[test]
    fn test_probe_payload() {
        let body = serde_json::to_value(ExplainRequest::probe()).unwrap();
        assert_eq!(body, json!({ "text": "test", "context": "test context" }));
    }

    #[test]
    fn test_sample_payload_carries_style() {
        let body = serde_json::to_value(ExplainRequest::sample(ExplanationStyle::Detailed)).unwrap();
        assert_eq!(body["text"], "artificial intelligence");
        assert_eq!(body["context"], SAMPLE_CONTEXT);
        assert_eq!(body["style"], "detailed");
    }

    #[test]
    fn test_fallback_contains_text_and_origin() {
        let text = fallback_explanation("photosynthesis", "http://localhost:8000/explain");
        assert!(text.contains("\"photosynthesis\""));
        assert!(text.contains("http://localhost:8000."));

        // Unparseable URL is embedded as-is
        let text = fallback_explanation("x", "not a url");
        assert!(text.contains("not a url"));
    }

    #[tokio::test]
    async fn test_explain_success() {
        let mock_server = MockServer::start().await;

        Mock::given(matchers::method("POST"))
            .and(matchers::path("/explain"))
            .and(matchers::body_json(json!({
                "text": "photosynthesis",
                "context": "Plants use photosynthesis to make food.",
                "style": "simple"
            })))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({ "explanation": "Photosynthesis is..." })),
            )
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = ExplainClient::new();
        let request = ExplainRequest::new(
            "photosynthesis",
            "Plants use photosynthesis to make food.",
            ExplanationStyle::Simple,
        );
        let url = format!("{}/explain", mock_server.uri());

        let explanation = client.explain_or_fallback(&url, &request).await;
        assert_eq!(explanation.text, "Photosynthesis is...");
        assert!(!explanation.fallback);
    }

    #[tokio::test]
    async fn test_explain_missing_field_uses_placeholder() {
        let mock_server = MockServer::start().await;

        Mock::given(matchers::method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
            .mount(&mock_server)
            .await;

        let client = ExplainClient::new();
        let request = ExplainRequest::new("x", "", ExplanationStyle::Simple);
        let text = client.explain(&mock_server.uri(), &request).await.unwrap();
        assert_eq!(text, NO_EXPLANATION);
    }

    #[tokio::test]
    async fn test_explain_http_error_carries_detail() {
        let mock_server = MockServer::start().await;

        Mock::given(matchers::method("POST"))
            .respond_with(
                ResponseTemplate::new(500)
                    .set_body_json(json!({ "detail": "Failed to generate explanation" })),
            )
            .mount(&mock_server)
            .await;

        let client = ExplainClient::new();
        let request = ExplainRequest::new("photosynthesis", "", ExplanationStyle::Simple);

        match client.explain(&mock_server.uri(), &request).await {
            Err(ExtensionError::Http { status, detail }) => {
                assert_eq!(status, 500);
                assert_eq!(detail, "Failed to generate explanation");
            }
            other => panic!("Expected Http error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_http_500_falls_back_with_selected_text() {
        let mock_server = MockServer::start().await;

        Mock::given(matchers::method("POST"))
            .respond_with(ResponseTemplate::new(500).set_body_string("Internal Server Error"))
            .mount(&mock_server)
            .await;

        let client = ExplainClient::new();
        let request = ExplainRequest::new("photosynthesis", "", ExplanationStyle::Simple);
        let explanation = client.explain_or_fallback(&mock_server.uri(), &request).await;

        assert!(explanation.fallback);
        assert!(explanation.text.contains("photosynthesis"));
    }

    #[tokio::test]
    async fn test_malformed_body_falls_back() {
        let mock_server = MockServer::start().await;

        Mock::given(matchers::method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
            .mount(&mock_server)
            .await;

        let client = ExplainClient::new();
        let request = ExplainRequest::new("mitochondria", "", ExplanationStyle::Simple);
        let explanation = client.explain_or_fallback(&mock_server.uri(), &request).await;

        assert!(explanation.fallback);
        assert!(explanation.text.contains("mitochondria"));
    }

    #[tokio::test]
    async fn test_network_failure_falls_back() {
        let client = ExplainClient::new();
        let request = ExplainRequest::new("photosynthesis", "", ExplanationStyle::Simple);
        let explanation = client.explain_or_fallback(DEAD_URL, &request).await;

        assert!(explanation.fallback);
        assert!(!explanation.text.is_empty());
        assert!(explanation.text.contains("photosynthesis"));
    }

    #[tokio::test]
    async fn test_probe_outcomes() {
        let mock_server = MockServer::start().await;

        Mock::given(matchers::method("POST"))
            .and(matchers::path("/ok"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "explanation": "t" })))
            .mount(&mock_server)
            .await;
        Mock::given(matchers::method("POST"))
            .and(matchers::path("/broken"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&mock_server)
            .await;

        let client = ExplainClient::new();
        let probe = ExplainRequest::probe();

        assert_eq!(
            client.probe(&format!("{}/ok", mock_server.uri()), &probe).await,
            ProbeOutcome::Connected
        );
        assert_eq!(
            client.probe(&format!("{}/broken", mock_server.uri()), &probe).await,
            ProbeOutcome::Rejected(503)
        );
        assert!(matches!(
            client.probe(DEAD_URL, &probe).await,
            ProbeOutcome::Unreachable(_)
        ));
    }
}
