//! HTTP client for the hosted assistant service (Assistants v2 wire format).
//!
//! Implements [`AssistantsApi`] over JSON-over-HTTPS. All conversation state
//! lives on the remote side; this client only moves requests and responses.

use reqwest::{Client, Method};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use types::{
    AssistantsApi, AssistantsError, CreateMessageRequest, CreateRunRequest, CreateThreadRequest,
    Run, ServiceConfig, Thread, ThreadMessage, ToolOutput,
};

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com";
const THREADS_PATH: &str = "/v1/threads";
const BETA_HEADER: &str = "OpenAI-Beta";
const BETA_HEADER_VALUE: &str = "assistants=v2";
const PROJECT_HEADER: &str = "OpenAI-Project";
const ORGANIZATION_HEADER: &str = "OpenAI-Organization";

#[derive(Debug, Clone)]
pub struct HttpAssistantsClient {
    client: Client,
    base_url: String,
    api_key: String,
    project_id: Option<String>,
    org_id: Option<String>,
}

impl HttpAssistantsClient {
    pub fn new(config: &ServiceConfig) -> Self {
        Self::with_base_url(config, DEFAULT_BASE_URL.to_owned())
    }

    /// Construct a client against a custom base URL (for testing).
    pub fn with_base_url(config: &ServiceConfig, base_url: String) -> Self {
        Self {
            client: Client::new(),
            base_url: normalize_base_url_or_default(&base_url, DEFAULT_BASE_URL),
            api_key: config.api_key.clone(),
            project_id: config.project_id.clone(),
            org_id: config.org_id.clone(),
        }
    }

    fn threads_url(&self, suffix: &str) -> String {
        format!("{}{}{}", self.base_url, THREADS_PATH, suffix)
    }

    fn authenticated_request(&self, method: Method, url: &str) -> reqwest::RequestBuilder {
        let mut builder = self
            .client
            .request(method, url)
            .bearer_auth(&self.api_key)
            .header(BETA_HEADER, BETA_HEADER_VALUE);
        if let Some(project_id) = &self.project_id {
            builder = builder.header(PROJECT_HEADER, project_id);
        }
        if let Some(org_id) = &self.org_id {
            builder = builder.header(ORGANIZATION_HEADER, org_id);
        }
        builder
    }

    async fn execute<T: DeserializeOwned>(
        &self,
        builder: reqwest::RequestBuilder,
    ) -> Result<T, AssistantsError> {
        let response = builder
            .send()
            .await
            .map_err(|error| AssistantsError::Transport {
                message: error.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = match response.text().await {
                Ok(text) => text,
                Err(error) => format!("unable to read error body: {error}"),
            };
            return Err(AssistantsError::HttpStatus {
                status: status.as_u16(),
                message: extract_http_error_message(&body),
            });
        }

        response
            .json()
            .await
            .map_err(|error| AssistantsError::ResponseParse {
                message: error.to_string(),
            })
    }
}

#[async_trait::async_trait]
impl AssistantsApi for HttpAssistantsClient {
    async fn create_thread(
        &self,
        request: CreateThreadRequest,
    ) -> Result<Thread, AssistantsError> {
        tracing::debug!("creating thread");
        self.execute(
            self.authenticated_request(Method::POST, &self.threads_url(""))
                .json(&request),
        )
        .await
    }

    async fn add_message(
        &self,
        thread_id: &str,
        request: CreateMessageRequest,
    ) -> Result<ThreadMessage, AssistantsError> {
        tracing::debug!(thread_id, "adding message to thread");
        let url = self.threads_url(&format!("/{thread_id}/messages"));
        self.execute(self.authenticated_request(Method::POST, &url).json(&request))
            .await
    }

    async fn create_run(
        &self,
        thread_id: &str,
        request: CreateRunRequest,
    ) -> Result<Run, AssistantsError> {
        tracing::debug!(thread_id, assistant_id = %request.assistant_id, "creating run");
        let url = self.threads_url(&format!("/{thread_id}/runs"));
        self.execute(self.authenticated_request(Method::POST, &url).json(&request))
            .await
    }

    async fn get_run(&self, thread_id: &str, run_id: &str) -> Result<Run, AssistantsError> {
        let url = self.threads_url(&format!("/{thread_id}/runs/{run_id}"));
        self.execute(self.authenticated_request(Method::GET, &url))
            .await
    }

    async fn submit_tool_outputs(
        &self,
        thread_id: &str,
        run_id: &str,
        outputs: Vec<ToolOutput>,
    ) -> Result<Run, AssistantsError> {
        tracing::debug!(thread_id, run_id, outputs = outputs.len(), "submitting tool outputs");
        let url = self.threads_url(&format!("/{thread_id}/runs/{run_id}/submit_tool_outputs"));
        let body = serde_json::json!({ "tool_outputs": outputs });
        self.execute(self.authenticated_request(Method::POST, &url).json(&body))
            .await
    }

    async fn list_messages(
        &self,
        thread_id: &str,
        limit: u32,
    ) -> Result<Vec<ThreadMessage>, AssistantsError> {
        let url = self.threads_url(&format!("/{thread_id}/messages"));
        let response: MessageListResponse = self
            .execute(
                self.authenticated_request(Method::GET, &url)
                    .query(&[("limit", limit.to_string()), ("order", "desc".to_owned())]),
            )
            .await?;
        Ok(response.data)
    }
}

#[derive(Debug, Deserialize)]
struct MessageListResponse {
    data: Vec<ThreadMessage>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

/// Pull the human-readable message out of the service's error envelope,
/// falling back to the raw body when it does not match.
fn extract_http_error_message(body: &str) -> String {
    match serde_json::from_str::<ErrorEnvelope>(body) {
        Ok(envelope) => envelope.error.message,
        Err(_) => body.trim().to_owned(),
    }
}

fn normalize_base_url_or_default(base_url: &str, default: &str) -> String {
    let trimmed = base_url.trim();
    if trimmed.is_empty() {
        default.to_owned()
    } else {
        trimmed.trim_end_matches('/').to_owned()
    }
}
