use std::collections::BTreeMap;

use serde_json::Value;
use types::{FunctionDecl, Tool, ToolError};

/// Name-indexed collection of tools available to a run.
#[derive(Default)]
pub struct ToolRegistry {
    tools: BTreeMap<String, Box<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, tool: Box<dyn Tool>) {
        let name = tool.schema().name;
        if self.tools.insert(name.clone(), tool).is_some() {
            tracing::warn!(tool = %name, "tool registered twice, keeping latest");
        }
    }

    pub fn get(&self, name: &str) -> Option<&dyn Tool> {
        self.tools.get(name).map(|tool| tool.as_ref())
    }

    pub fn schemas(&self) -> Vec<FunctionDecl> {
        self.tools.values().map(|tool| tool.schema()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Execute a tool by name, enforcing its per-call timeout.
    pub async fn execute(&self, name: &str, arguments: &Value) -> Result<String, ToolError> {
        let Some(tool) = self.get(name) else {
            return Err(ToolError::ExecutionFailed {
                tool: name.to_owned(),
                message: format!("unknown tool `{name}`"),
            });
        };
        match tokio::time::timeout(tool.timeout(), tool.execute(arguments)).await {
            Ok(result) => result,
            Err(_) => Err(ToolError::ExecutionFailed {
                tool: name.to_owned(),
                message: format!("tool timed out after {:?}", tool.timeout()),
            }),
        }
    }
}
