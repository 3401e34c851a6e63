use std::env;

use crate::ConfigError;

/// Assistant used when `ASSISTANT_ID` is not set.
pub const DEFAULT_ASSISTANT_ID: &str = "asst_h3J9kQxWm2nZb8TfUvRyE5dP";
/// Model used when `OPENAI_MODEL` is not set.
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";

const PROJECT_KEY_PREFIX: &str = "sk-proj-";

/// Environment-derived settings, loaded once at startup and passed into the
/// HTTP layer explicitly. Handlers validate per request and surface config
/// problems as 500s, since these are operator-fixable rather than transient.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceConfig {
    pub api_key: String,
    pub project_id: Option<String>,
    pub org_id: Option<String>,
    pub assistant_id: String,
    pub model: String,
}

impl ServiceConfig {
    /// Read configuration from the recognized environment variables.
    ///
    /// Values are trimmed; blank values count as unset. This never fails —
    /// validation is a separate step so the error paths stay testable
    /// without mutating the process environment.
    pub fn from_env() -> Self {
        Self {
            api_key: trimmed_var("OPENAI_API_KEY").unwrap_or_default(),
            project_id: trimmed_var("OPENAI_PROJECT_ID"),
            org_id: trimmed_var("OPENAI_ORG_ID"),
            assistant_id: trimmed_var("ASSISTANT_ID")
                .unwrap_or_else(|| DEFAULT_ASSISTANT_ID.to_owned()),
            model: trimmed_var("OPENAI_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_owned()),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.api_key.is_empty() {
            return Err(ConfigError::MissingApiKey);
        }
        if self.assistant_id.is_empty() {
            return Err(ConfigError::MissingAssistantId);
        }
        if self.api_key.starts_with(PROJECT_KEY_PREFIX) && self.project_id.is_none() {
            return Err(ConfigError::MissingProjectScope);
        }
        Ok(())
    }
}

fn trimmed_var(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|value| value.trim().to_owned())
        .filter(|value| !value.is_empty())
}
