// HTTP surface of the explanation backend

use poem::{middleware::Cors, Endpoint, EndpointExt, Route};
use poem_openapi::payload::Json;
use poem_openapi::{ApiResponse, Object, OpenApi, OpenApiService};
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::explainer::{Explainer, Style, APOLOGY};

pub const SERVICE_NAME: &str = "explaina-api";
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Debug, Object)]
pub struct ServiceInfo {
    pub message: String,
    pub version: String,
    pub endpoints: BTreeMap<String, String>,
}

#[derive(Debug, Object)]
pub struct HealthResponse {
    pub status: String,
    pub service: String,
    pub openai_configured: bool,
    pub current_explainer: String,
}

#[derive(Debug, Object)]
pub struct ExplanationRequest {
    /// The selected text to explain
    #[oai(validator(min_length = 1, max_length = 500))]
    pub text: String,
    /// Surrounding context to help with the explanation
    #[oai(default, validator(max_length = 2000))]
    pub context: String,
    pub style: Option<Style>,
}

#[derive(Debug, Object)]
pub struct ExplanationResponse {
    pub explanation: String,
}

#[derive(Debug, Object)]
pub struct ErrorResponse {
    pub detail: String,
}

#[derive(ApiResponse)]
pub enum ExplainResponse {
    #[oai(status = 200)]
    Ok(Json<ExplanationResponse>),
    #[oai(status = 400)]
    BadRequest(Json<ErrorResponse>),
    #[oai(status = 500)]
    InternalError(Json<ErrorResponse>),
}

pub struct ExplainApi {
    pub explainer: Arc<dyn Explainer>,
}

#[OpenApi]
impl ExplainApi {
    /// Service banner
    #[oai(path = "/", method = "get")]
    async fn root(&self) -> Json<ServiceInfo> {
        let endpoints = BTreeMap::from([
            ("explain".to_string(), "/explain".to_string()),
            ("health".to_string(), "/health".to_string()),
        ]);
        Json(ServiceInfo {
            message: "Explaina API is running! 🤖".to_string(),
            version: VERSION.to_string(),
            endpoints,
        })
    }

    #[oai(path = "/health", method = "get")]
    async fn health(&self) -> Json<HealthResponse> {
        Json(HealthResponse {
            status: "healthy".to_string(),
            service: SERVICE_NAME.to_string(),
            openai_configured: self.explainer.is_configured(),
            current_explainer: self.explainer.name().to_string(),
        })
    }

    /// Explain a selected term, optionally using its surrounding text
    #[oai(path = "/explain", method = "post")]
    async fn explain(&self, req: Json<ExplanationRequest>) -> ExplainResponse {
        let req = req.0;
        tracing::info!("Received explanation request for: '{}'", req.text);

        if req.text.trim().is_empty() {
            return ExplainResponse::BadRequest(Json(ErrorResponse {
                detail: "Selected text cannot be empty".to_string(),
            }));
        }

        let style = req.style.unwrap_or_default();
        match self.explainer.explain(&req.text, &req.context, style).await {
            Ok(explanation) => {
                tracing::info!("Generated explanation for: '{}'", req.text);
                ExplainResponse::Ok(Json(ExplanationResponse { explanation }))
            }
            Err(e) if e.is_upstream() => {
                tracing::error!("Upstream model failed for '{}': {}", req.text, e);
                ExplainResponse::Ok(Json(ExplanationResponse {
                    explanation: APOLOGY.to_string(),
                }))
            }
            Err(e) => {
                tracing::error!("Failed to generate explanation for '{}': {}", req.text, e);
                ExplainResponse::InternalError(Json(ErrorResponse {
                    detail: "Failed to generate explanation".to_string(),
                }))
            }
        }
    }
}

/// Full application: API, docs under `/docs`, spec JSON under `/spec`, open CORS
pub fn build_app(explainer: Arc<dyn Explainer>, server_url: &str) -> impl Endpoint {
    let api_service = OpenApiService::new(ExplainApi { explainer }, "Explaina API", VERSION)
        .description("AI-powered explanations for selected text")
        .server(server_url);

    let ui = api_service.scalar();
    let spec = api_service.spec_endpoint();

    Route::new()
        .nest("/", api_service)
        .nest("/docs", ui)
        .nest("/spec", spec)
        .with(Cors::new())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::OpenAiConfig;
    use crate::explainer::{ExplainerError, MockExplainer, OpenAiExplainer};
    use async_trait::async_trait;
    use poem::http::StatusCode;
    use poem::test::TestClient;
    use serde_json::json;
    use std::sync::Mutex;

    #[derive(Default, Clone, Copy, PartialEq)]
    enum Failure {
        #[default]
        Healthy,
        Unconfigured,
        RateLimited,
    }

    #[derive(Default)]
    struct StubExplainer {
        failure: Failure,
        calls: Mutex<Vec<(String, String, Style)>>,
    }

    impl StubExplainer {
        fn failing(failure: Failure) -> Self {
            Self {
                failure,
                ..Default::default()
            }
        }
    }

    #[async_trait]
    impl Explainer for StubExplainer {
        fn name(&self) -> &'static str {
            "openai"
        }

        fn is_configured(&self) -> bool {
            self.failure != Failure::Unconfigured
        }

        async fn explain(
            &self,
            text: &str,
            context: &str,
            style: Style,
        ) -> Result<String, ExplainerError> {
            self.calls
                .lock()
                .unwrap()
                .push((text.to_string(), context.to_string(), style));
            match self.failure {
                Failure::Healthy => Ok(format!("{} is explained.", text)),
                Failure::Unconfigured => Err(ExplainerError::NotConfigured),
                Failure::RateLimited => Err(ExplainerError::Api {
                    status: 429,
                    message: "rate limited".to_string(),
                }),
            }
        }
    }

    fn client(explainer: Arc<dyn Explainer>) -> TestClient<impl Endpoint> {
        TestClient::new(build_app(explainer, "http://localhost:8000"))
    }

    #[tokio::test]
    async fn test_root_banner() {
        let cli = client(Arc::new(StubExplainer::default()));
        let resp = cli.get("/").send().await;
        resp.assert_status_is_ok();
        resp.assert_json(json!({
            "message": "Explaina API is running! 🤖",
            "version": VERSION,
            "endpoints": {"explain": "/explain", "health": "/health"}
        }))
        .await;
    }

    #[tokio::test]
    async fn test_health_reports_configuration() {
        let stub = Arc::new(StubExplainer::failing(Failure::Unconfigured));
        let resp = client(stub).get("/health").send().await;
        resp.assert_status_is_ok();
        resp.assert_json(json!({
            "status": "healthy",
            "service": "explaina-api",
            "openai_configured": false,
            "current_explainer": "openai"
        }))
        .await;
    }

    #[tokio::test]
    async fn test_explain_success_defaults_style() {
        let stub = Arc::new(StubExplainer::default());
        let resp = client(stub.clone())
            .post("/explain")
            .body_json(&json!({"text": "photosynthesis"}))
            .send()
            .await;
        resp.assert_status_is_ok();
        resp.assert_json(json!({"explanation": "photosynthesis is explained."}))
            .await;

        let calls = stub.calls.lock().unwrap();
        assert_eq!(
            calls.as_slice(),
            &[("photosynthesis".to_string(), String::new(), Style::Simple)]
        );
    }

    #[tokio::test]
    async fn test_explain_passes_context_and_style() {
        let stub = Arc::new(StubExplainer::default());
        let resp = client(stub.clone())
            .post("/explain")
            .body_json(&json!({
                "text": "API",
                "context": "REST API design",
                "style": "technical"
            }))
            .send()
            .await;
        resp.assert_status_is_ok();

        let calls = stub.calls.lock().unwrap();
        assert_eq!(calls[0].1, "REST API design");
        assert_eq!(calls[0].2, Style::Technical);
    }

    #[tokio::test]
    async fn test_whitespace_text_is_rejected() {
        let stub = Arc::new(StubExplainer::default());
        let resp = client(stub.clone())
            .post("/explain")
            .body_json(&json!({"text": "   "}))
            .send()
            .await;
        resp.assert_status(StatusCode::BAD_REQUEST);
        resp.assert_json(json!({"detail": "Selected text cannot be empty"}))
            .await;
        assert!(stub.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_schema_violations_are_rejected() {
        let cli = client(Arc::new(StubExplainer::default()));

        let resp = cli
            .post("/explain")
            .body_json(&json!({"text": ""}))
            .send()
            .await;
        resp.assert_status(StatusCode::BAD_REQUEST);

        let resp = cli
            .post("/explain")
            .body_json(&json!({"text": "x".repeat(501)}))
            .send()
            .await;
        resp.assert_status(StatusCode::BAD_REQUEST);

        let resp = cli
            .post("/explain")
            .body_json(&json!({"text": "API", "style": "poetic"}))
            .send()
            .await;
        resp.assert_status(StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_explainer_failure_maps_to_500() {
        let stub = Arc::new(StubExplainer::failing(Failure::Unconfigured));
        let resp = client(stub)
            .post("/explain")
            .body_json(&json!({"text": "photosynthesis"}))
            .send()
            .await;
        resp.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
        resp.assert_json(json!({"detail": "Failed to generate explanation"}))
            .await;
    }

    #[tokio::test]
    async fn test_upstream_failure_answers_with_apology() {
        let stub = Arc::new(StubExplainer::failing(Failure::RateLimited));
        let resp = client(stub)
            .post("/explain")
            .body_json(&json!({"text": "photosynthesis"}))
            .send()
            .await;
        resp.assert_status_is_ok();
        resp.assert_json(json!({"explanation": APOLOGY})).await;
    }

    #[tokio::test]
    async fn test_keyless_server_serves_mock_explanations() {
        let cli = client(Arc::new(MockExplainer));

        let resp = cli.get("/health").send().await;
        resp.assert_status_is_ok();
        resp.assert_json(json!({
            "status": "healthy",
            "service": "explaina-api",
            "openai_configured": false,
            "current_explainer": "mock"
        }))
        .await;

        let resp = cli
            .post("/explain")
            .body_json(&json!({"text": "API", "style": "technical"}))
            .send()
            .await;
        resp.assert_status_is_ok();
        let body = resp.json().await;
        let explanation = body.value().object().get("explanation").string().to_string();
        assert!(explanation.starts_with("**Technical Analysis:** The term 'API'"));
    }

    #[tokio::test]
    async fn test_openai_rate_limit_through_the_app() {
        use wiremock::{matchers, Mock, MockServer, ResponseTemplate};

        let server = MockServer::start().await;
        Mock::given(matchers::method("POST"))
            .respond_with(ResponseTemplate::new(429).set_body_string("rate limited"))
            .mount(&server)
            .await;

        let explainer = OpenAiExplainer::new(OpenAiConfig {
            api_key: Some("sk-test".to_string()),
            api_url: format!("{}/v1/chat/completions", server.uri()),
            ..OpenAiConfig::default()
        })
        .unwrap();

        let resp = client(Arc::new(explainer))
            .post("/explain")
            .body_json(&json!({"text": "photosynthesis"}))
            .send()
            .await;
        resp.assert_status_is_ok();
        resp.assert_json(json!({"explanation": APOLOGY})).await;
    }
}
