use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use serde_json::json;
use types::{
    CreateMessageRequest, CreateRunRequest, CreateThreadRequest, FunctionCall, RequiredAction, Run,
    SubmitToolOutputsAction, Thread,
};

use super::*;

/// Scripted remote side: each `get_run` pops the next scripted result.
struct FakeAssistantsApi {
    polls: Mutex<VecDeque<Result<Run, AssistantsError>>>,
    submit_results: Mutex<VecDeque<Result<Run, AssistantsError>>>,
    submissions: Mutex<Vec<Vec<ToolOutput>>>,
    poll_count: AtomicUsize,
}

impl FakeAssistantsApi {
    fn scripted(polls: Vec<Result<Run, AssistantsError>>) -> Self {
        Self {
            polls: Mutex::new(polls.into()),
            submit_results: Mutex::new(VecDeque::new()),
            submissions: Mutex::new(Vec::new()),
            poll_count: AtomicUsize::new(0),
        }
    }

    fn with_submit_result(self, result: Result<Run, AssistantsError>) -> Self {
        self.submit_results.lock().expect("lock").push_back(result);
        self
    }

    fn polls_made(&self) -> usize {
        self.poll_count.load(Ordering::SeqCst)
    }

    fn recorded_submissions(&self) -> Vec<Vec<ToolOutput>> {
        self.submissions.lock().expect("lock").clone()
    }
}

#[async_trait]
impl AssistantsApi for FakeAssistantsApi {
    async fn create_thread(&self, _: CreateThreadRequest) -> Result<Thread, AssistantsError> {
        panic!("create_thread is not exercised by driver tests");
    }

    async fn add_message(
        &self,
        _: &str,
        _: CreateMessageRequest,
    ) -> Result<ThreadMessage, AssistantsError> {
        panic!("add_message is not exercised by driver tests");
    }

    async fn create_run(&self, _: &str, _: CreateRunRequest) -> Result<Run, AssistantsError> {
        panic!("create_run is not exercised by driver tests");
    }

    async fn get_run(&self, _: &str, _: &str) -> Result<Run, AssistantsError> {
        self.poll_count.fetch_add(1, Ordering::SeqCst);
        self.polls
            .lock()
            .expect("lock")
            .pop_front()
            .expect("test script ran out of poll results")
    }

    async fn submit_tool_outputs(
        &self,
        _: &str,
        _: &str,
        outputs: Vec<ToolOutput>,
    ) -> Result<Run, AssistantsError> {
        self.submissions.lock().expect("lock").push(outputs);
        self.submit_results
            .lock()
            .expect("lock")
            .pop_front()
            .unwrap_or_else(|| Ok(run(RunStatus::InProgress)))
    }

    async fn list_messages(&self, _: &str, _: u32) -> Result<Vec<ThreadMessage>, AssistantsError> {
        panic!("list_messages is not exercised by driver tests");
    }
}

fn run(status: RunStatus) -> Run {
    Run {
        id: "run_1".to_owned(),
        thread_id: Some("thread_1".to_owned()),
        status,
        required_action: None,
    }
}

fn requires_action(calls: Vec<(&str, &str, &str)>) -> Run {
    Run {
        required_action: Some(RequiredAction {
            kind: SUBMIT_TOOL_OUTPUTS_ACTION.to_owned(),
            submit_tool_outputs: Some(SubmitToolOutputsAction {
                tool_calls: calls
                    .into_iter()
                    .map(|(id, name, arguments)| RunToolCall {
                        id: id.to_owned(),
                        kind: "function".to_owned(),
                        function: FunctionCall {
                            name: name.to_owned(),
                            arguments: arguments.to_owned(),
                        },
                    })
                    .collect(),
            }),
        }),
        ..run(RunStatus::RequiresAction)
    }
}

fn driver(api: Arc<FakeAssistantsApi>) -> RunDriver {
    RunDriver::new(api, tools::knowledge_registry())
}

fn message(id: &str, role: MessageRole, created_at: i64, texts: &[&str]) -> ThreadMessage {
    ThreadMessage {
        id: id.to_owned(),
        role,
        created_at,
        content: texts
            .iter()
            .map(|value| MessageContent::Text {
                text: types::TextContent {
                    value: (*value).to_owned(),
                },
            })
            .collect(),
    }
}

#[tokio::test]
async fn completed_run_finishes_on_first_poll() {
    let api = Arc::new(FakeAssistantsApi::scripted(vec![Ok(run(
        RunStatus::Completed,
    ))]));
    let outcome = driver(Arc::clone(&api))
        .drive("thread_1", "run_1")
        .await
        .expect("drive should not error");

    assert_eq!(outcome, RunOutcome::Completed);
    assert_eq!(api.polls_made(), 1);
    assert!(api.recorded_submissions().is_empty());
}

#[tokio::test]
async fn redriving_a_completed_run_is_idempotent() {
    let api = Arc::new(FakeAssistantsApi::scripted(vec![
        Ok(run(RunStatus::Completed)),
        Ok(run(RunStatus::Completed)),
    ]));
    let driver = driver(Arc::clone(&api));

    for _ in 0..2 {
        let outcome = driver
            .drive("thread_1", "run_1")
            .await
            .expect("drive should not error");
        assert_eq!(outcome, RunOutcome::Completed);
    }
    assert_eq!(api.polls_made(), 2);
    assert!(api.recorded_submissions().is_empty());
}

#[tokio::test]
async fn terminal_failures_name_their_status() {
    for status in [
        RunStatus::Failed,
        RunStatus::Cancelled,
        RunStatus::Cancelling,
        RunStatus::Expired,
        RunStatus::Incomplete,
    ] {
        let api = Arc::new(FakeAssistantsApi::scripted(vec![Ok(run(status))]));
        let outcome = driver(api)
            .drive("thread_1", "run_1")
            .await
            .expect("drive should not error");
        assert_eq!(outcome, RunOutcome::Failed(status.to_string()));
    }
}

#[tokio::test(start_paused = true)]
async fn deadline_stops_polling_without_an_extra_request() {
    let api = Arc::new(FakeAssistantsApi::scripted(vec![
        Ok(run(RunStatus::InProgress)),
        Ok(run(RunStatus::Queued)),
        Ok(run(RunStatus::InProgress)),
    ]));
    let limits = DriverLimits::default()
        .with_poll_interval(Duration::from_millis(750))
        .with_deadline(Duration::from_secs(2));
    let outcome = driver(Arc::clone(&api))
        .with_limits(limits)
        .drive("thread_1", "run_1")
        .await
        .expect("drive should not error");

    assert_eq!(outcome, RunOutcome::TimedOut);
    // Polls at t=0, 750ms, 1500ms; the t=2250ms check fails before a fourth.
    assert_eq!(api.polls_made(), 3);
}

#[tokio::test(start_paused = true)]
async fn tool_batch_matches_requested_call_ids() {
    let api = Arc::new(
        FakeAssistantsApi::scripted(vec![
            Ok(requires_action(vec![
                (
                    "call_1",
                    "get_fees",
                    r#"{"subject":"Math","country":"Pakistan"}"#,
                ),
                ("call_2", "lookup_visa", "{}"),
            ])),
            Ok(run(RunStatus::Completed)),
        ])
        .with_submit_result(Ok(run(RunStatus::InProgress))),
    );

    let outcome = driver(Arc::clone(&api))
        .drive("thread_1", "run_1")
        .await
        .expect("drive should not error");
    assert_eq!(outcome, RunOutcome::Completed);

    let submissions = api.recorded_submissions();
    assert_eq!(submissions.len(), 1);
    let batch = &submissions[0];
    assert_eq!(batch.len(), 2);

    assert_eq!(batch[0].tool_call_id, "call_1");
    let fees: serde_json::Value = serde_json::from_str(&batch[0].output).expect("fee JSON");
    assert_eq!(fees["success"], json!(true));
    assert_eq!(fees["subject"], json!("Math"));

    assert_eq!(batch[1].tool_call_id, "call_2");
    let failure: serde_json::Value = serde_json::from_str(&batch[1].output).expect("failure JSON");
    assert_eq!(failure["success"], json!(false));
    assert!(
        failure["error"]
            .as_str()
            .expect("error string")
            .contains("unknown tool")
    );
}

#[tokio::test(start_paused = true)]
async fn each_requires_action_episode_gets_its_own_submission() {
    let api = Arc::new(FakeAssistantsApi::scripted(vec![
        Ok(requires_action(vec![("call_1", "get_subjects", "{}")])),
        Ok(requires_action(vec![(
            "call_2",
            "get_fees",
            r#"{"subject":"Physics","country":"UAE"}"#,
        )])),
        Ok(run(RunStatus::Completed)),
    ]));

    let outcome = driver(Arc::clone(&api))
        .drive("thread_1", "run_1")
        .await
        .expect("drive should not error");
    assert_eq!(outcome, RunOutcome::Completed);

    let submissions = api.recorded_submissions();
    assert_eq!(submissions.len(), 2);
    assert_eq!(submissions[0][0].tool_call_id, "call_1");
    assert_eq!(submissions[1][0].tool_call_id, "call_2");
}

#[tokio::test(start_paused = true)]
async fn unparseable_arguments_run_the_tool_with_an_empty_object() {
    let api = Arc::new(FakeAssistantsApi::scripted(vec![
        Ok(requires_action(vec![(
            "call_1",
            "get_fees",
            "this is not json",
        )])),
        Ok(run(RunStatus::Completed)),
    ]));

    driver(Arc::clone(&api))
        .drive("thread_1", "run_1")
        .await
        .expect("drive should not error");

    let submissions = api.recorded_submissions();
    let fees: serde_json::Value =
        serde_json::from_str(&submissions[0][0].output).expect("fee JSON");
    assert_eq!(fees["subject"], json!("unknown"));
    assert_eq!(fees["country"], json!("unknown"));
}

#[tokio::test(start_paused = true)]
async fn requires_action_without_payload_keeps_polling() {
    let api = Arc::new(FakeAssistantsApi::scripted(vec![
        Ok(run(RunStatus::RequiresAction)),
        Ok(run(RunStatus::Completed)),
    ]));

    let outcome = driver(Arc::clone(&api))
        .drive("thread_1", "run_1")
        .await
        .expect("drive should not error");
    assert_eq!(outcome, RunOutcome::Completed);
    assert!(api.recorded_submissions().is_empty());
}

#[tokio::test]
async fn rejected_submission_ends_the_run() {
    let api = Arc::new(
        FakeAssistantsApi::scripted(vec![Ok(requires_action(vec![(
            "call_1",
            "get_subjects",
            "{}",
        )]))])
        .with_submit_result(Err(AssistantsError::HttpStatus {
            status: 400,
            message: "run is not in requires_action state".to_owned(),
        })),
    );

    let outcome = driver(Arc::clone(&api))
        .drive("thread_1", "run_1")
        .await
        .expect("drive should not error");

    assert_eq!(outcome, RunOutcome::Failed(SUBMIT_ERROR_STATUS.to_owned()));
    assert_eq!(api.polls_made(), 1);
}

#[tokio::test]
async fn status_fetch_errors_propagate() {
    let api = Arc::new(FakeAssistantsApi::scripted(vec![Err(
        AssistantsError::Transport {
            message: "connection reset".to_owned(),
        },
    )]));

    let error = driver(api)
        .drive("thread_1", "run_1")
        .await
        .expect_err("transport failure must surface");
    assert!(matches!(error, AssistantsError::Transport { .. }));
}

#[test]
fn reply_comes_from_the_newest_assistant_message() {
    let messages = vec![
        message("msg_3", MessageRole::Assistant, 300, &["newest"]),
        message("msg_2", MessageRole::Assistant, 200, &["older"]),
        message("msg_1", MessageRole::User, 100, &["question"]),
    ];
    assert_eq!(extract_reply(&messages), "newest");
}

#[test]
fn reply_joins_text_segments_with_newlines() {
    let messages = vec![message(
        "msg_1",
        MessageRole::Assistant,
        100,
        &["first paragraph", "second paragraph"],
    )];
    assert_eq!(extract_reply(&messages), "first paragraph\nsecond paragraph");
}

#[test]
fn missing_assistant_text_yields_placeholder() {
    assert_eq!(
        extract_reply(&[message("msg_1", MessageRole::User, 100, &["hi"])]),
        NO_REPLY_PLACEHOLDER
    );
    assert_eq!(extract_reply(&[]), NO_REPLY_PLACEHOLDER);
    assert_eq!(
        extract_reply(&[message("msg_1", MessageRole::Assistant, 100, &[""])]),
        NO_REPLY_PLACEHOLDER
    );
}

#[test]
fn non_text_segments_are_skipped() {
    let mut with_other = message("msg_1", MessageRole::Assistant, 100, &["visible"]);
    with_other.content.insert(0, MessageContent::Other);
    assert_eq!(extract_reply(&[with_other]), "visible");
}
