use std::time::Duration;

use async_trait::async_trait;
use serde_json::{Value, json};
use types::{FunctionDecl, Tool, ToolError};

const STUB_TIMEOUT: Duration = Duration::from_secs(5);

/// Fee lookup for a subject in a given country. The real knowledge base is
/// not wired up yet; this returns a canned record so runs that request the
/// tool can still finish.
pub struct FeesTool;

#[async_trait]
impl Tool for FeesTool {
    fn schema(&self) -> FunctionDecl {
        FunctionDecl::new(
            "get_fees",
            Some("Look up tuition fees for a subject in a country.".to_owned()),
            json!({
                "type": "object",
                "properties": {
                    "subject": {"type": "string"},
                    "country": {"type": "string"}
                },
                "required": ["subject", "country"]
            }),
        )
    }

    async fn execute(&self, arguments: &Value) -> Result<String, ToolError> {
        let subject = arguments
            .get("subject")
            .and_then(Value::as_str)
            .unwrap_or("unknown");
        let country = arguments
            .get("country")
            .and_then(Value::as_str)
            .unwrap_or("unknown");
        tracing::debug!(subject, country, "serving stubbed fee record");
        let record = json!({
            "success": true,
            "subject": subject,
            "country": country,
            "currency": "USD",
            "fee_per_term": 120,
            "note": "indicative figure, confirm with the admissions team"
        });
        Ok(record.to_string())
    }

    fn timeout(&self) -> Duration {
        STUB_TIMEOUT
    }
}

/// Lists the subjects currently on offer.
pub struct SubjectsTool;

#[async_trait]
impl Tool for SubjectsTool {
    fn schema(&self) -> FunctionDecl {
        FunctionDecl::new(
            "get_subjects",
            Some("List the subjects currently offered.".to_owned()),
            json!({"type": "object", "properties": {}}),
        )
    }

    async fn execute(&self, _arguments: &Value) -> Result<String, ToolError> {
        let record = json!({
            "success": true,
            "subjects": ["Mathematics", "Physics", "Chemistry", "English", "Computer Science"]
        });
        Ok(record.to_string())
    }

    fn timeout(&self) -> Duration {
        STUB_TIMEOUT
    }
}
