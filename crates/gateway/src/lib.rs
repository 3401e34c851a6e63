//! HTTP surface: the chat endpoint, the WhatsApp webhook, and health.

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use driver::{RunDriver, RunOutcome, extract_reply};
use serde_json::{Value, json};
use types::{
    AssistantsApi, AssistantsError, ConfigError, CreateMessageRequest, CreateRunRequest,
    CreateThreadRequest, MessageRole, ServiceConfig,
};


/// How many recent messages to fetch when extracting the reply.
const RECENT_MESSAGES_LIMIT: u32 = 10;

pub struct GatewayServer {
    config: ServiceConfig,
    api: Arc<dyn AssistantsApi>,
    driver: RunDriver,
}

impl GatewayServer {
    pub fn new(config: ServiceConfig, api: Arc<dyn AssistantsApi>, driver: RunDriver) -> Self {
        Self {
            config,
            api,
            driver,
        }
    }

    pub fn router(self) -> Router {
        Router::new()
            .route("/api/chat", post(chat))
            .route("/api/wati", post(wati))
            .route("/healthz", get(healthz))
            .method_not_allowed_fallback(method_not_allowed)
            .with_state(Arc::new(self))
    }

    async fn relay_chat(&self, body: &[u8]) -> Result<Response, GatewayError> {
        self.config.validate()?;
        let payload = parse_body(body);

        let message = payload
            .get("message")
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|message| !message.is_empty())
            .ok_or(GatewayError::MissingMessage)?;

        let thread_id = match payload
            .get("threadId")
            .and_then(Value::as_str)
            .filter(|id| !id.is_empty())
        {
            Some(id) => id.to_owned(),
            None => {
                self.api
                    .create_thread(CreateThreadRequest::default())
                    .await?
                    .id
            }
        };

        self.api
            .add_message(
                &thread_id,
                CreateMessageRequest {
                    role: MessageRole::User,
                    content: message.to_owned(),
                    metadata: None,
                },
            )
            .await?;

        let run = self
            .api
            .create_run(
                &thread_id,
                CreateRunRequest {
                    assistant_id: self.config.assistant_id.clone(),
                    model: Some(self.config.model.clone()),
                    metadata: None,
                },
            )
            .await?;

        match self.driver.drive(&thread_id, &run.id).await? {
            RunOutcome::Completed => {
                let messages = self
                    .api
                    .list_messages(&thread_id, RECENT_MESSAGES_LIMIT)
                    .await?;
                let reply = extract_reply(&messages);
                Ok(Json(json!({"reply": reply, "threadId": thread_id})).into_response())
            }
            RunOutcome::Failed(status) => Err(GatewayError::RunFailed { status, thread_id }),
            RunOutcome::TimedOut => Err(GatewayError::RunTimedOut { thread_id }),
        }
    }

    async fn relay_wati(&self, body: &[u8]) -> Result<Response, GatewayError> {
        let payload = parse_body(body);

        let wa_id = string_at(&payload, &["waId"]).or_else(|| string_at(&payload, &["data", "waId"]));
        let text = string_at(&payload, &["text"])
            .or_else(|| string_at(&payload, &["data", "text", "body"]))
            .or_else(|| string_at(&payload, &["message"]));
        let ticket_id =
            string_at(&payload, &["ticketId"]).or_else(|| string_at(&payload, &["data", "ticketId"]));

        let (Some(wa_id), Some(text)) = (wa_id, text) else {
            // Ack so the platform does not retry; nothing useful arrived.
            tracing::info!("webhook payload missing waId or text, skipping");
            return Ok(Json(json!({"ok": true, "skipped": true})).into_response());
        };

        self.config.validate()?;

        let thread = self
            .api
            .create_thread(CreateThreadRequest {
                metadata: Some(json!({
                    "waId": wa_id,
                    "ticketId": ticket_id,
                    "source": "wati"
                })),
            })
            .await?;

        self.api
            .add_message(
                &thread.id,
                CreateMessageRequest {
                    role: MessageRole::User,
                    content: text,
                    metadata: Some(json!({"waId": wa_id, "ticketId": ticket_id})),
                },
            )
            .await?;

        if let Err(error) = self
            .api
            .create_run(
                &thread.id,
                CreateRunRequest {
                    assistant_id: self.config.assistant_id.clone(),
                    model: None,
                    metadata: Some(json!({
                        "waId": wa_id,
                        "ticketId": ticket_id,
                        "mode": "mirror_only"
                    })),
                },
            )
            .await
        {
            // The thread already holds the mirrored message; hand its id
            // back so the failure can be traced to it.
            return Err(GatewayError::RunCreation {
                error,
                thread_id: thread.id,
            });
        }

        // Mirror-only: the reply is never relayed back to the sender. The
        // run finishes (or not) on the remote side; going live means
        // driving it and calling the platform's send API with the reply.
        Ok(Json(json!({"ok": true, "threadId": thread.id})).into_response())
    }
}

async fn chat(
    State(server): State<Arc<GatewayServer>>,
    body: Bytes,
) -> Result<Response, GatewayError> {
    server.relay_chat(&body).await
}

async fn wati(
    State(server): State<Arc<GatewayServer>>,
    body: Bytes,
) -> Result<Response, GatewayError> {
    server.relay_wati(&body).await
}

async fn healthz() -> Response {
    Json(json!({"status": "ok"})).into_response()
}

async fn method_not_allowed() -> Response {
    (
        StatusCode::METHOD_NOT_ALLOWED,
        Json(json!({"error": "method not allowed"})),
    )
        .into_response()
}

/// Lenient body parse: anything that is not valid JSON becomes an empty
/// object, so field checks decide the response rather than a 422.
fn parse_body(body: &[u8]) -> Value {
    serde_json::from_slice(body).unwrap_or_else(|_| json!({}))
}

fn string_at(payload: &Value, path: &[&str]) -> Option<String> {
    let mut current = payload;
    for segment in path {
        current = current.get(segment)?;
    }
    current
        .as_str()
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_owned)
}

#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error("message is required")]
    MissingMessage,
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Assistants(#[from] AssistantsError),
    #[error("{error}")]
    RunCreation {
        error: AssistantsError,
        thread_id: String,
    },
    #[error("run ended with status `{status}`")]
    RunFailed { status: String, thread_id: String },
    #[error("run timed out before completing")]
    RunTimedOut { thread_id: String },
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            Self::MissingMessage => (
                StatusCode::BAD_REQUEST,
                json!({"error": self.to_string()}),
            ),
            Self::Config(error) => {
                tracing::error!(%error, "request rejected by configuration check");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({"error": error.to_string()}),
                )
            }
            Self::Assistants(AssistantsError::HttpStatus { status, message }) => {
                tracing::warn!(status, %message, "mirroring upstream error");
                (
                    StatusCode::from_u16(status).unwrap_or(StatusCode::BAD_GATEWAY),
                    json!({"error": message}),
                )
            }
            Self::Assistants(error) => {
                tracing::error!(%error, "assistant call failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({"error": error.to_string()}),
                )
            }
            Self::RunCreation { error, thread_id } => {
                tracing::warn!(%error, %thread_id, "run creation failed");
                let (status, message) = match error {
                    AssistantsError::HttpStatus { status, message } => (
                        StatusCode::from_u16(status).unwrap_or(StatusCode::BAD_GATEWAY),
                        message,
                    ),
                    other => (StatusCode::INTERNAL_SERVER_ERROR, other.to_string()),
                };
                (status, json!({"error": message, "threadId": thread_id}))
            }
            Self::RunFailed {
                ref status,
                ref thread_id,
            } => {
                tracing::warn!(%status, %thread_id, "run failed");
                (
                    StatusCode::BAD_GATEWAY,
                    json!({"error": self.to_string(), "threadId": thread_id}),
                )
            }
            Self::RunTimedOut { ref thread_id } => {
                tracing::warn!(%thread_id, "run timed out");
                (
                    StatusCode::BAD_GATEWAY,
                    json!({"error": self.to_string(), "threadId": thread_id}),
                )
            }
        };
        (status, Json(body)).into_response()
    }
}
