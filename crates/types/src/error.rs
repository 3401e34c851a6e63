use thiserror::Error;

#[derive(Debug, Error)]
pub enum AssistantsError {
    #[error("assistant service transport failed: {message}")]
    Transport { message: String },
    #[error("assistant service returned HTTP {status}: {message}")]
    HttpStatus { status: u16, message: String },
    #[error("assistant service response parsing failed: {message}")]
    ResponseParse { message: String },
    #[error("assistant request serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum ToolError {
    #[error("invalid arguments for tool {tool}: {message}")]
    InvalidArguments { tool: String, message: String },
    #[error("tool execution failed for {tool}: {message}")]
    ExecutionFailed { tool: String, message: String },
    #[error("tool serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("OPENAI_API_KEY is not set")]
    MissingApiKey,
    #[error("ASSISTANT_ID is not set")]
    MissingAssistantId,
    #[error("project-scoped API key requires OPENAI_PROJECT_ID")]
    MissingProjectScope,
}
