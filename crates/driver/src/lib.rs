//! Job completion driver: polls a run to a terminal state within a wall-clock
//! deadline, dispatching any tool calls the run pauses on along the way.

use std::cmp::Reverse;
use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use serde_json::{Value, json};
use tokio::time::Instant;
use tools::ToolRegistry;
use types::{
    AssistantsApi, AssistantsError, MessageContent, MessageRole, RunStatus, RunToolCall,
    SUBMIT_TOOL_OUTPUTS_ACTION, ThreadMessage, ToolOutput,
};

#[cfg(test)]
mod tests;

/// Reply returned when a completed run produced no assistant text.
pub const NO_REPLY_PLACEHOLDER: &str = "(no reply)";

/// Pseudo-status reported when a tool-output submission is rejected.
pub const SUBMIT_ERROR_STATUS: &str = "submit_error";

const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(750);
const DEFAULT_DEADLINE: Duration = Duration::from_secs(20);

/// How a drive attempt ended. `Failed` carries the status name the run
/// stopped on (or [`SUBMIT_ERROR_STATUS`]); transport and parse problems
/// surface as `Err` from [`RunDriver::drive`] instead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    Completed,
    Failed(String),
    TimedOut,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DriverLimits {
    pub poll_interval: Duration,
    pub deadline: Duration,
}

impl Default for DriverLimits {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
            deadline: DEFAULT_DEADLINE,
        }
    }
}

impl DriverLimits {
    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = deadline;
        self
    }
}

pub struct RunDriver {
    api: Arc<dyn AssistantsApi>,
    tools: ToolRegistry,
    limits: DriverLimits,
}

impl RunDriver {
    pub fn new(api: Arc<dyn AssistantsApi>, tools: ToolRegistry) -> Self {
        Self {
            api,
            tools,
            limits: DriverLimits::default(),
        }
    }

    pub fn with_limits(mut self, limits: DriverLimits) -> Self {
        self.limits = limits;
        self
    }

    /// Poll `run_id` until it reaches a terminal state or the deadline lapses.
    ///
    /// The deadline is checked before every poll, including the first; once
    /// it has lapsed no further request is issued. Requires-action episodes
    /// are unbounded in count, limited only by the deadline.
    pub async fn drive(
        &self,
        thread_id: &str,
        run_id: &str,
    ) -> Result<RunOutcome, AssistantsError> {
        let started = Instant::now();
        loop {
            if started.elapsed() >= self.limits.deadline {
                tracing::warn!(thread_id, run_id, "run did not finish before the deadline");
                return Ok(RunOutcome::TimedOut);
            }

            let run = self.api.get_run(thread_id, run_id).await?;
            match run.status {
                RunStatus::Completed => {
                    tracing::debug!(thread_id, run_id, "run completed");
                    return Ok(RunOutcome::Completed);
                }
                status if status.is_terminal_failure() => {
                    tracing::warn!(thread_id, run_id, %status, "run ended in failure");
                    return Ok(RunOutcome::Failed(status.to_string()));
                }
                RunStatus::RequiresAction => {
                    let calls = run.required_action.and_then(|action| {
                        (action.kind == SUBMIT_TOOL_OUTPUTS_ACTION)
                            .then_some(action.submit_tool_outputs)
                            .flatten()
                    });
                    match calls {
                        Some(action) if !action.tool_calls.is_empty() => {
                            let outputs = self.resolve_tool_calls(action.tool_calls).await;
                            if let Err(error) = self
                                .api
                                .submit_tool_outputs(thread_id, run_id, outputs)
                                .await
                            {
                                tracing::warn!(thread_id, run_id, %error, "tool output submission rejected");
                                return Ok(RunOutcome::Failed(SUBMIT_ERROR_STATUS.to_owned()));
                            }
                        }
                        _ => {
                            tracing::warn!(
                                thread_id,
                                run_id,
                                "requires_action without a tool-output payload"
                            );
                        }
                    }
                }
                _ => {}
            }

            tokio::time::sleep(self.limits.poll_interval).await;
        }
    }

    /// Resolve one requires-action batch. Every call gets an output entry:
    /// handler faults and unknown tools become structured failure payloads
    /// so the batch submission always matches the requested call ids.
    async fn resolve_tool_calls(&self, calls: Vec<RunToolCall>) -> Vec<ToolOutput> {
        join_all(calls.into_iter().map(|call| self.resolve_tool_call(call))).await
    }

    async fn resolve_tool_call(&self, call: RunToolCall) -> ToolOutput {
        let name = call.function.name;
        let arguments = parse_arguments(&name, &call.function.arguments);
        let output = match self.tools.execute(&name, &arguments).await {
            Ok(output) => output,
            Err(error) => {
                tracing::warn!(tool = %name, %error, "tool call failed");
                failure_output(&error.to_string())
            }
        };
        ToolOutput {
            tool_call_id: call.id,
            output,
        }
    }
}

fn parse_arguments(tool: &str, raw: &str) -> Value {
    match serde_json::from_str(raw) {
        Ok(value) => value,
        Err(error) => {
            tracing::warn!(tool, %error, "unparseable tool arguments, substituting empty object");
            json!({})
        }
    }
}

fn failure_output(message: &str) -> String {
    json!({"success": false, "error": message}).to_string()
}

/// Pick the user-facing reply out of a thread's recent messages.
///
/// Takes the newest assistant message, joins its text segments with
/// newlines, and falls back to [`NO_REPLY_PLACEHOLDER`] when there is no
/// assistant text at all.
pub fn extract_reply(messages: &[ThreadMessage]) -> String {
    let mut assistant: Vec<&ThreadMessage> = messages
        .iter()
        .filter(|message| message.role == MessageRole::Assistant)
        .collect();
    // Stable sort: service order breaks created_at ties (second resolution).
    assistant.sort_by_key(|message| Reverse(message.created_at));

    let Some(newest) = assistant.first() else {
        return NO_REPLY_PLACEHOLDER.to_owned();
    };

    let segments: Vec<&str> = newest
        .content
        .iter()
        .filter_map(|segment| match segment {
            MessageContent::Text { text } if !text.value.is_empty() => Some(text.value.as_str()),
            _ => None,
        })
        .collect();

    if segments.is_empty() {
        NO_REPLY_PLACEHOLDER.to_owned()
    } else {
        segments.join("\n")
    }
}
