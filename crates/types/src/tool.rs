use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::ToolError;

/// A tool parameter schema expressed as a raw JSON Schema value.
///
/// Using `serde_json::Value` gives full JSON Schema coverage without
/// maintaining a typed struct that must be extended for every new keyword.
pub type ToolParameterSchema = Value;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionDecl {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub parameters: ToolParameterSchema,
}

impl FunctionDecl {
    pub fn new(
        name: impl Into<String>,
        description: Option<String>,
        parameters: ToolParameterSchema,
    ) -> Self {
        Self {
            name: name.into(),
            description,
            parameters,
        }
    }
}

/// A named operation a paused run can request.
///
/// Arguments arrive pre-parsed; callers substitute an empty object when the
/// service sends an unparseable payload, so implementations must tolerate
/// missing fields rather than assume the schema was honored.
#[async_trait]
pub trait Tool: Send + Sync {
    fn schema(&self) -> FunctionDecl;

    async fn execute(&self, arguments: &Value) -> Result<String, ToolError>;

    fn timeout(&self) -> Duration;
}
