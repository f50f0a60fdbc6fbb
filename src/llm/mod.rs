mod api_client;
pub mod error;
pub mod prompts;

use crate::config::LlmSettings;
use anyhow::Result;
use async_trait::async_trait;
use log::debug;

pub use error::GatewayError;

/// The three quiz intents answered by a language model.
#[async_trait]
pub trait QuizGateway: Send + Sync {
    async fn generate_question(&self, tool_name: &str) -> Result<String, GatewayError>;

    async fn evaluate_answer(
        &self,
        tool_name: &str,
        question: &str,
        user_answer: &str,
    ) -> Result<String, GatewayError>;

    async fn explain_command(&self, tool_name: &str, command: &str)
        -> Result<String, GatewayError>;
}

#[derive(Clone)]
pub struct LLMClient {
    pub(crate) api_client: api_client::APIClient,
}

impl LLMClient {
    pub fn new(settings: LlmSettings) -> Result<Self> {
        Ok(LLMClient {
            api_client: api_client::APIClient::new(settings)?,
        })
    }
}

#[async_trait]
impl QuizGateway for LLMClient {
    async fn generate_question(&self, tool_name: &str) -> Result<String, GatewayError> {
        // ThreadRng is not Send, so it must be dropped before the await.
        let request = {
            let mut rng = rand::thread_rng();
            prompts::question_request(self.api_client.model(), tool_name, &mut rng)
        };
        debug!(
            "Generating {} question (temperature={:.2}, top_p={:.2?})",
            tool_name, request.temperature, request.top_p
        );
        self.api_client.complete(&request).await
    }

    async fn evaluate_answer(
        &self,
        tool_name: &str,
        question: &str,
        user_answer: &str,
    ) -> Result<String, GatewayError> {
        debug!("Evaluating {} answer", tool_name);
        let request =
            prompts::evaluation_request(self.api_client.model(), tool_name, question, user_answer);
        self.api_client.complete(&request).await
    }

    async fn explain_command(
        &self,
        tool_name: &str,
        command: &str,
    ) -> Result<String, GatewayError> {
        debug!("Explaining {} command", tool_name);
        let request = prompts::explanation_request(self.api_client.model(), tool_name, command);
        self.api_client.complete(&request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{extract::State, http::StatusCode, routing::post, Json, Router};
    use serde_json::{json, Value};
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    #[derive(Clone)]
    struct FakeUpstream {
        status: StatusCode,
        body: String,
        seen: Arc<Mutex<Vec<Value>>>,
        auth: Arc<Mutex<Vec<Option<String>>>>,
    }

    async fn fake_completion(
        State(fake): State<FakeUpstream>,
        headers: axum::http::HeaderMap,
        Json(body): Json<Value>,
    ) -> (StatusCode, String) {
        fake.seen.lock().unwrap().push(body);
        fake.auth.lock().unwrap().push(
            headers
                .get("authorization")
                .and_then(|v| v.to_str().ok())
                .map(str::to_string),
        );
        (fake.status, fake.body.clone())
    }

    async fn spawn_upstream(status: StatusCode, body: impl Into<String>) -> (String, FakeUpstream) {
        let fake = FakeUpstream {
            status,
            body: body.into(),
            seen: Arc::new(Mutex::new(Vec::new())),
            auth: Arc::new(Mutex::new(Vec::new())),
        };
        let app = Router::new()
            .route("/v1/chat/completions", post(fake_completion))
            .with_state(fake.clone());
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        (format!("http://{}/v1/chat/completions", addr), fake)
    }

    fn settings(url: &str, key: &str) -> LlmSettings {
        LlmSettings {
            api_key: key.to_string(),
            api_url: url.to_string(),
            model: "test-model".to_string(),
            api_name: "Groq".to_string(),
            timeout: Duration::from_secs(5),
        }
    }

    async fn slow_completion() -> String {
        tokio::time::sleep(Duration::from_secs(3)).await;
        completion("too late")
    }

    fn completion(text: &str) -> String {
        json!({
            "id": "chatcmpl-1",
            "choices": [
                {"index": 0, "message": {"role": "assistant", "content": text}},
                {"index": 1, "message": {"role": "assistant", "content": "ignored"}}
            ]
        })
        .to_string()
    }

    #[tokio::test]
    async fn test_generate_question_returns_first_choice() {
        let (url, fake) = spawn_upstream(StatusCode::OK, completion("How do you stash changes?")).await;
        let client = LLMClient::new(settings(&url, "secret")).unwrap();

        let question = client.generate_question("git").await.unwrap();
        assert_eq!(question, "How do you stash changes?");

        let seen = fake.seen.lock().unwrap();
        assert_eq!(seen[0]["model"], "test-model");
        let temperature = seen[0]["temperature"].as_f64().unwrap();
        assert!((0.8..=1.0).contains(&temperature));
        assert!(seen[0]["top_p"].is_number());
        assert!(seen[0]["frequency_penalty"].is_number());
        assert!(seen[0]["presence_penalty"].is_number());
        assert_eq!(
            fake.auth.lock().unwrap()[0].as_deref(),
            Some("Bearer secret")
        );
    }

    #[tokio::test]
    async fn test_two_questions_send_different_prompts() {
        let (url, fake) = spawn_upstream(StatusCode::OK, completion("q")).await;
        let client = LLMClient::new(settings(&url, "")).unwrap();

        client.generate_question("docker").await.unwrap();
        client.generate_question("docker").await.unwrap();

        let seen = fake.seen.lock().unwrap();
        assert_eq!(seen.len(), 2);
        assert_ne!(seen[0]["messages"], seen[1]["messages"]);
        assert_eq!(fake.auth.lock().unwrap()[0], None);
    }

    #[tokio::test]
    async fn test_review_calls_use_fixed_temperature() {
        let (url, fake) = spawn_upstream(StatusCode::OK, completion("CORRECT")).await;
        let client = LLMClient::new(settings(&url, "k")).unwrap();

        for _ in 0..3 {
            client
                .evaluate_answer("git", "List branches", "git branch")
                .await
                .unwrap();
            client.explain_command("git", "git branch -a").await.unwrap();
        }

        let seen = fake.seen.lock().unwrap();
        assert_eq!(seen.len(), 6);
        for body in seen.iter() {
            assert_eq!(body["temperature"].as_f64(), Some(0.3));
            assert!(body.get("top_p").is_none());
        }
    }

    #[tokio::test]
    async fn test_non_success_status_becomes_error_text() {
        let (url, _) = spawn_upstream(
            StatusCode::UNAUTHORIZED,
            r#"{"error":{"message":"Invalid API Key","type":"invalid_request_error"}}"#,
        )
        .await;
        let client = LLMClient::new(settings(&url, "bad")).unwrap();

        let err = client.explain_command("git", "git log").await.unwrap_err();
        assert!(matches!(err, GatewayError::Status { status: 401, .. }));
        let text = err.to_string();
        assert!(text.starts_with("Error calling Groq API:"), "{}", text);
        assert!(text.contains("Invalid API Key"));
    }

    #[tokio::test]
    async fn test_raw_error_page_is_truncated() {
        let page = format!("<html><body>{}</body></html>", "Bad Gateway ".repeat(8_000));
        let (url, _) = spawn_upstream(StatusCode::BAD_GATEWAY, page).await;
        let client = LLMClient::new(settings(&url, "k")).unwrap();

        let err = client.generate_question("git").await.unwrap_err();
        assert!(matches!(err, GatewayError::Status { status: 502, .. }));
        let text = err.to_string();
        assert!(text.chars().count() < 300, "{} chars", text.chars().count());
        assert!(text.ends_with('…'));
    }

    #[tokio::test]
    async fn test_slow_upstream_times_out() {
        let app = Router::new().route("/v1/chat/completions", post(slow_completion));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        let url = format!("http://{}/v1/chat/completions", addr);
        let mut settings = settings(&url, "k");
        settings.timeout = Duration::from_secs(1);
        let client = LLMClient::new(settings).unwrap();

        let err = client.explain_command("git", "git log").await.unwrap_err();
        assert!(err.is_timeout(), "{:?}", err);
        assert_eq!(
            err.to_string(),
            "Error calling Groq API: request timed out after 1s"
        );
    }

    #[tokio::test]
    async fn test_missing_content_is_unexpected_response() {
        let (url, _) = spawn_upstream(StatusCode::OK, r#"{"choices": []}"#).await;
        let client = LLMClient::new(settings(&url, "k")).unwrap();

        let err = client.generate_question("npm").await.unwrap_err();
        assert!(matches!(err, GatewayError::UnexpectedResponse { .. }));
        assert_eq!(
            err.to_string(),
            "Error: Unable to process response from Groq API."
        );
    }

    #[tokio::test]
    async fn test_non_json_body_is_unexpected_response() {
        let (url, _) = spawn_upstream(StatusCode::OK, "<html>gateway</html>").await;
        let client = LLMClient::new(settings(&url, "k")).unwrap();

        let err = client.explain_command("git", "git log").await.unwrap_err();
        assert!(matches!(err, GatewayError::UnexpectedResponse { .. }));
    }

    #[tokio::test]
    async fn test_transport_failure_is_reported_not_raised() {
        // Bind then drop a listener so the port is known to be closed.
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let url = format!("http://{}/v1/chat/completions", addr);
        let client = LLMClient::new(settings(&url, "k")).unwrap();

        let err = client
            .evaluate_answer("git", "List branches", "git branch")
            .await
            .unwrap_err();
        assert!(matches!(err, GatewayError::Transport { .. }));
        assert!(err.to_string().starts_with("Error calling Groq API:"));
    }
}
