use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;

use crate::{AssistantsError, MessageRole, Run, Thread, ThreadMessage, ToolOutput};

#[derive(Debug, Clone, Default, Serialize)]
pub struct CreateThreadRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Value>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CreateMessageRequest {
    pub role: MessageRole,
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Value>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CreateRunRequest {
    pub assistant_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Value>,
}

/// The outbound surface of the remote assistant service.
///
/// Implemented over HTTP in the `assistants` crate; the driver and gateway
/// depend only on this trait so tests can script the remote side.
#[async_trait]
pub trait AssistantsApi: Send + Sync {
    async fn create_thread(&self, request: CreateThreadRequest)
    -> Result<Thread, AssistantsError>;

    async fn add_message(
        &self,
        thread_id: &str,
        request: CreateMessageRequest,
    ) -> Result<ThreadMessage, AssistantsError>;

    async fn create_run(
        &self,
        thread_id: &str,
        request: CreateRunRequest,
    ) -> Result<Run, AssistantsError>;

    async fn get_run(&self, thread_id: &str, run_id: &str) -> Result<Run, AssistantsError>;

    async fn submit_tool_outputs(
        &self,
        thread_id: &str,
        run_id: &str,
        outputs: Vec<ToolOutput>,
    ) -> Result<Run, AssistantsError>;

    /// Fetch the most recent messages in a thread, newest first.
    async fn list_messages(
        &self,
        thread_id: &str,
        limit: u32,
    ) -> Result<Vec<ThreadMessage>, AssistantsError>;
}
