//! Conversation session use case.
//!
//! One turn walks a fixed state machine:
//!
//! ```text
//! AwaitingModel → ActionExtraction ─┬─ NoAction ───────────────────────────┐
//!                                   └─ PlaceholderResolution → Dispatch ───┤
//!                                                        (Success|Failure) │
//!                                                          HistoryAppend ◀─┘
//! ```
//!
//! Every turn appends exactly one user message and one assistant message
//! (plus the system preamble on the first turn) and returns a
//! [`TurnOutcome`]. Failures are turn-scoped; the session stays usable.

use crate::ports::conversation_logger::{
    ConversationEvent, ConversationLogger, NoConversationLogger,
};
use crate::ports::model_backend::{GenerationParams, ModelBackend};
use crate::ports::progress::TurnProgressNotifier;
use crate::ports::tool_executor::ToolExecutorPort;
use crate::use_cases::dispatch::ToolDispatcher;
use serde_json::json;
use std::sync::Arc;
use tracing::{debug, info, warn};
use tsagent_domain::util::{preview, truncate_str};
use tsagent_domain::{
    ArtifactRef, History, Message, PromptTemplate, Resolution, TurnError, TurnOutcome,
    detect_artifact, extract_action, resolve_placeholders,
};

/// A single conversation with a model over the data tools.
///
/// The session exclusively owns its history and last artifact; `chat_turn`
/// takes `&mut self`, so turns never overlap.
pub struct ConversationSession {
    backend: Arc<dyn ModelBackend>,
    dispatcher: ToolDispatcher,
    params: GenerationParams,
    data_summary: String,
    history: History,
    last_artifact: Option<ArtifactRef>,
    turns: usize,
    conversation_logger: Arc<dyn ConversationLogger>,
}

impl ConversationSession {
    pub fn new(
        backend: Arc<dyn ModelBackend>,
        tool_executor: Arc<dyn ToolExecutorPort>,
        data_summary: impl Into<String>,
    ) -> Self {
        Self {
            backend,
            dispatcher: ToolDispatcher::new(tool_executor),
            params: GenerationParams::default(),
            data_summary: data_summary.into(),
            history: History::new(),
            last_artifact: None,
            turns: 0,
            conversation_logger: Arc::new(NoConversationLogger),
        }
    }

    pub fn with_params(mut self, params: GenerationParams) -> Self {
        self.params = params;
        self
    }

    /// Create with a conversation logger.
    pub fn with_conversation_logger(mut self, logger: Arc<dyn ConversationLogger>) -> Self {
        self.conversation_logger = logger;
        self
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn last_artifact(&self) -> Option<&ArtifactRef> {
        self.last_artifact.as_ref()
    }

    pub fn turn_count(&self) -> usize {
        self.turns
    }

    pub fn data_summary(&self) -> &str {
        &self.data_summary
    }

    /// Run one turn: user input → model → optional tool call → history.
    pub async fn chat_turn(
        &mut self,
        user_input: &str,
        progress: &dyn TurnProgressNotifier,
    ) -> TurnOutcome {
        let turn = self.turns + 1;
        info!("Turn {}: {}", turn, truncate_str(user_input, 100));

        if self.history.is_empty() {
            let preamble = PromptTemplate::build_full_prompt(
                self.dispatcher.executor().tool_spec(),
                user_input,
                &self.data_summary,
            );
            self.history.push(Message::system(preamble));
        }
        self.history.push(Message::user(user_input));
        self.log(
            "user_message",
            json!({ "turn": turn, "content": user_input }),
        );

        let outcome = self.run_turn(turn, progress).await;

        if let Some(error) = &outcome.error {
            self.log(
                "turn_error",
                json!({
                    "turn": turn,
                    "kind": error.kind(),
                    "dispatch": error.is_dispatch_error(),
                    "message": error.to_string(),
                }),
            );
        }
        self.history
            .push(Message::assistant(outcome.assistant_message()));
        self.turns = turn;
        outcome
    }

    async fn run_turn(&mut self, turn: usize, progress: &dyn TurnProgressNotifier) -> TurnOutcome {
        progress.on_model_start(self.backend.name());
        let response = self
            .backend
            .chat(self.history.messages(), &self.params)
            .await;
        progress.on_model_end(response.is_ok());

        let response = match response {
            Ok(response) => response,
            Err(e) => {
                warn!("Model backend '{}' failed: {}", self.backend.name(), e);
                return TurnOutcome::failure("", None, TurnError::ModelInvocation(e.to_string()));
            }
        };
        debug!(
            finish_reason = response.finish_reason.as_deref().unwrap_or("-"),
            "Model response: {}",
            preview(&response.text, 200)
        );
        self.log(
            "model_response",
            json!({
                "turn": turn,
                "backend": self.backend.name(),
                "text": response.text,
                "finish_reason": response.finish_reason,
                "metadata": response.metadata,
            }),
        );
        let model_text = response.text;

        let mut action = match extract_action(&model_text) {
            Ok(Some(action)) => action,
            Ok(None) => {
                debug!("No action in model response");
                return TurnOutcome::reply(model_text);
            }
            Err(e) => {
                warn!("Failed to parse action: {}", e);
                return TurnOutcome::failure(model_text, None, e.into());
            }
        };

        let resolution = resolve_placeholders(
            &mut action,
            self.dispatcher.executor().tool_spec(),
            self.last_artifact.as_ref(),
        );
        match resolution {
            Resolution::Resolved { replaced, inserted } => debug!(
                tool = %action.name,
                replaced,
                inserted,
                "Resolved artifact placeholders"
            ),
            Resolution::NoArtifact => debug!(tool = %action.name, "No artifact to resolve placeholders with"),
            Resolution::NotNeeded => {}
        }

        info!(tool = %action.name, "Calling {}", action);
        self.log(
            "tool_call",
            json!({
                "turn": turn,
                "tool": action.name,
                "arguments": action.arguments,
                "source": action.source,
            }),
        );

        progress.on_tool_start(&action);
        let result = self.dispatcher.dispatch(&action).await;
        progress.on_tool_end(&action.name, result.is_ok());

        match result {
            Ok(output) => {
                self.log(
                    "tool_result",
                    json!({ "turn": turn, "tool": action.name, "output": output }),
                );
                if let Some(artifact) = detect_artifact(&action.name, &output) {
                    info!("Last artifact is now {}", artifact);
                    self.last_artifact = Some(artifact);
                }
                TurnOutcome::success(model_text, action, output)
            }
            Err(error) => TurnOutcome::failure(model_text, Some(action), error),
        }
    }

    fn log(&self, event_type: &'static str, payload: serde_json::Value) {
        self.conversation_logger
            .log(ConversationEvent::new(event_type, payload));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::model_backend::{BackendError, ModelResponse};
    use crate::ports::progress::NoTurnProgress;
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use tsagent_domain::{
        Action, Role, ToolDefinition, ToolError, ToolParameter, ToolResult, ToolSpec,
    };

    /// Replays canned replies; `Err` entries simulate backend failures
    struct ScriptedBackend {
        replies: Mutex<VecDeque<Result<String, String>>>,
        seen_lengths: Mutex<Vec<usize>>,
    }

    impl ScriptedBackend {
        fn new(replies: Vec<Result<&str, &str>>) -> Arc<Self> {
            Arc::new(Self {
                replies: Mutex::new(
                    replies
                        .into_iter()
                        .map(|r| r.map(String::from).map_err(String::from))
                        .collect(),
                ),
                seen_lengths: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl ModelBackend for ScriptedBackend {
        fn name(&self) -> &str {
            "scripted"
        }

        async fn chat(
            &self,
            history: &[Message],
            _params: &GenerationParams,
        ) -> Result<ModelResponse, BackendError> {
            self.seen_lengths.lock().unwrap().push(history.len());
            match self.replies.lock().unwrap().pop_front() {
                Some(Ok(text)) => Ok(ModelResponse::new(text)),
                Some(Err(e)) => Err(BackendError::ConnectionError(e)),
                None => Ok(ModelResponse::new("I have nothing more to say.")),
            }
        }
    }

    struct RecordingExecutor {
        spec: ToolSpec,
        calls: Mutex<Vec<Action>>,
    }

    impl RecordingExecutor {
        fn new() -> Arc<Self> {
            let spec = ToolSpec::new()
                .register(
                    ToolDefinition::new("load_dataframe", "Load")
                        .with_parameter(ToolParameter::new("file_path", "Path", true)),
                )
                .register(
                    ToolDefinition::new("describe_dataframe", "Describe")
                        .with_parameter(ToolParameter::new("dataframe_id", "Id", true)),
                )
                .register(
                    ToolDefinition::new("detect_anomalies_iqr", "IQR")
                        .with_parameter(ToolParameter::new("dataframe_id", "Id", true))
                        .with_parameter(ToolParameter::new("value_column", "Col", true)),
                );
            Arc::new(Self {
                spec,
                calls: Mutex::new(Vec::new()),
            })
        }

        fn calls(&self) -> Vec<Action> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl ToolExecutorPort for RecordingExecutor {
        fn tool_spec(&self) -> &ToolSpec {
            &self.spec
        }

        async fn execute(&self, action: &Action) -> ToolResult {
            self.calls.lock().unwrap().push(action.clone());
            match action.name.as_str() {
                "load_dataframe" => ToolResult::success("load_dataframe", "abc"),
                "describe_dataframe" => {
                    let id = action.get_string("dataframe_id").unwrap_or_default();
                    if id == "abc" {
                        ToolResult::success("describe_dataframe", "shape: (3, 2)")
                    } else {
                        ToolResult::failure(
                            "describe_dataframe",
                            ToolError::not_found(format!("DataFrame ID {}", id)),
                        )
                    }
                }
                "detect_anomalies_iqr" => {
                    ToolResult::success("detect_anomalies_iqr", "(dataframe_new, 2)")
                }
                other => ToolResult::failure(other, ToolError::execution_failed("unexpected")),
            }
        }
    }

    fn session(
        replies: Vec<Result<&str, &str>>,
    ) -> (ConversationSession, Arc<ScriptedBackend>, Arc<RecordingExecutor>) {
        let backend = ScriptedBackend::new(replies);
        let executor = RecordingExecutor::new();
        let session =
            ConversationSession::new(backend.clone(), executor.clone(), "Directory: data");
        (session, backend, executor)
    }

    #[tokio::test]
    async fn test_first_turn_injects_preamble() {
        let (mut session, backend, _) = session(vec![Ok("Hello!")]);

        let outcome = session.chat_turn("hi", &NoTurnProgress).await;

        assert_eq!(outcome, TurnOutcome::reply("Hello!"));
        let messages = session.history().messages();
        assert_eq!(messages.len(), 3);
        assert_eq!(messages[0].role, Role::System);
        assert!(messages[0].content.contains("Directory: data"));
        assert!(messages[0].content.contains("--- User Instruction ---\nhi"));
        assert_eq!(messages[1], Message::user("hi"));
        assert_eq!(messages[2], Message::assistant("Hello!"));
        // the model saw the preamble and the user message
        assert_eq!(*backend.seen_lengths.lock().unwrap(), vec![2]);
    }

    #[tokio::test]
    async fn test_load_then_describe_resolves_artifact() {
        let (mut session, _, executor) = session(vec![
            Ok("Thought: load it\nAction: load_dataframe(file_path='data.csv')"),
            Ok("Thought: summarise\nAction: describe_dataframe()"),
        ]);

        let first = session.chat_turn("load the data", &NoTurnProgress).await;
        assert_eq!(first.tool_result.as_deref(), Some("abc"));
        assert_eq!(session.last_artifact(), Some(&ArtifactRef::new("abc")));

        let second = session.chat_turn("describe it", &NoTurnProgress).await;
        assert_eq!(second.tool_result.as_deref(), Some("shape: (3, 2)"));
        let described = &executor.calls()[1];
        assert_eq!(
            described.to_string(),
            r#"describe_dataframe(dataframe_id="abc")"#
        );
        assert_eq!(
            session.history().last().map(|m| m.content.as_str()),
            Some("Thought: summarise\nAction: describe_dataframe()\n\nTool Result: shape: (3, 2)")
        );
    }

    #[tokio::test]
    async fn test_placeholder_token_resolves_artifact() {
        let (mut session, _, executor) = session(vec![
            Ok("Action: load_dataframe(file_path='data.csv')"),
            Ok("Action: describe_dataframe(dataframe_id='<last_df_id>')"),
        ]);

        session.chat_turn("load", &NoTurnProgress).await;
        let outcome = session.chat_turn("describe", &NoTurnProgress).await;

        assert!(!outcome.is_error());
        assert_eq!(executor.calls()[1].get_string("dataframe_id"), Some("abc"));
    }

    #[tokio::test]
    async fn test_unknown_tool_keeps_artifact() {
        let (mut session, _, executor) = session(vec![
            Ok("Action: load_dataframe(file_path='data.csv')"),
            Ok("Action: unknown_tool()"),
        ]);

        session.chat_turn("load", &NoTurnProgress).await;
        let outcome = session.chat_turn("do magic", &NoTurnProgress).await;

        assert_eq!(
            outcome.error,
            Some(TurnError::UnknownTool("unknown_tool".to_string()))
        );
        assert_eq!(session.last_artifact(), Some(&ArtifactRef::new("abc")));
        assert_eq!(executor.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_missing_artifact_is_dispatch_error() {
        let (mut session, _, executor) = session(vec![Ok("Action: describe_dataframe()")]);

        let outcome = session.chat_turn("describe", &NoTurnProgress).await;

        assert!(matches!(
            outcome.error,
            Some(TurnError::MissingArtifactReference { .. })
        ));
        assert!(outcome.tool_result.is_none());
        assert!(executor.calls().is_empty());
        assert!(session.last_artifact().is_none());
    }

    #[tokio::test]
    async fn test_failing_tool_appends_single_error_message() {
        let (mut session, _, _) = session(vec![Ok(
            "Action: describe_dataframe(dataframe_id='dataframe_zzz')",
        )]);

        let outcome = session.chat_turn("describe", &NoTurnProgress).await;

        assert!(outcome.tool_result.is_none());
        let error = outcome.error.clone().unwrap();
        assert_eq!(error.kind(), "tool_execution");
        assert_eq!(session.history().count_role(Role::Assistant), 1);
        assert_eq!(
            session.history().last().map(|m| m.content.clone()),
            Some(format!(
                "Action: describe_dataframe(dataframe_id='dataframe_zzz')\n\nError: {}",
                error
            ))
        );
    }

    #[tokio::test]
    async fn test_marker_without_call_is_a_reply() {
        let (mut session, _, executor) =
            session(vec![Ok("Thought: the summary answers it.\nAction: None")]);

        let outcome = session.chat_turn("anything else?", &NoTurnProgress).await;

        assert_eq!(
            outcome,
            TurnOutcome::reply("Thought: the summary answers it.\nAction: None")
        );
        assert!(executor.calls().is_empty());
        assert_eq!(session.history().len(), 3);
    }

    #[tokio::test]
    async fn test_call_with_trailing_marker_prose_is_dispatched() {
        let (mut session, _, executor) = session(vec![Ok(
            "Action: load_dataframe(file_path='data.csv')\nI will pick the next Action: after this.",
        )]);

        let outcome = session.chat_turn("load", &NoTurnProgress).await;

        assert!(outcome.error.is_none());
        assert_eq!(outcome.tool_result.as_deref(), Some("abc"));
        assert_eq!(executor.calls().len(), 1);
    }

    struct RecordingLogger {
        events: Mutex<Vec<(&'static str, serde_json::Value)>>,
    }

    impl ConversationLogger for RecordingLogger {
        fn log(&self, event: ConversationEvent) {
            self.events
                .lock()
                .unwrap()
                .push((event.event_type, event.payload));
        }
    }

    #[tokio::test]
    async fn test_turn_errors_are_logged_with_stage() {
        let logger = Arc::new(RecordingLogger {
            events: Mutex::new(Vec::new()),
        });
        let (session, _, _) = session(vec![Ok("Action: bad("), Ok("Action: no_such_tool()")]);
        let mut session = session.with_conversation_logger(logger.clone());

        session.chat_turn("one", &NoTurnProgress).await;
        session.chat_turn("two", &NoTurnProgress).await;

        let events = logger.events.lock().unwrap();
        let errors: Vec<_> = events
            .iter()
            .filter(|(kind, _)| *kind == "turn_error")
            .map(|(_, payload)| payload)
            .collect();
        assert_eq!(errors.len(), 2);
        assert_eq!(errors[0]["kind"], "action_parse");
        assert_eq!(errors[0]["dispatch"], false);
        assert_eq!(errors[1]["kind"], "unknown_tool");
        assert_eq!(errors[1]["dispatch"], true);
        assert_eq!(errors[1]["turn"], 2);
    }

    #[tokio::test]
    async fn test_parse_error_is_recorded() {
        let (mut session, _, executor) = session(vec![Ok("Action: bad(")]);

        let outcome = session.chat_turn("go", &NoTurnProgress).await;

        assert!(matches!(outcome.error, Some(TurnError::ActionParse(_))));
        assert!(outcome.action.is_none());
        assert!(executor.calls().is_empty());
        assert_eq!(session.history().len(), 3);
    }

    #[tokio::test]
    async fn test_model_failure_still_appends_message() {
        let (mut session, _, _) = session(vec![Err("connection refused"), Ok("Back online")]);

        let outcome = session.chat_turn("hello", &NoTurnProgress).await;
        assert_eq!(
            outcome.error,
            Some(TurnError::ModelInvocation(
                "Connection error: connection refused".to_string()
            ))
        );
        assert_eq!(
            session.history().last().map(|m| m.content.as_str()),
            Some("Error: Model invocation failed: Connection error: connection refused")
        );

        // the session stays usable
        let outcome = session.chat_turn("again", &NoTurnProgress).await;
        assert_eq!(outcome.model_text, "Back online");
    }

    #[tokio::test]
    async fn test_history_length_is_two_per_turn_plus_preamble() {
        let (mut session, _, _) = session(vec![
            Ok("Action: load_dataframe(file_path='a.csv')"),
            Ok("Just thinking"),
            Ok("Action: nope()"),
            Err("down"),
        ]);

        for (n, input) in ["one", "two", "three", "four"].into_iter().enumerate() {
            session.chat_turn(input, &NoTurnProgress).await;
            assert_eq!(session.history().len(), 2 * (n + 1) + 1);
            assert_eq!(session.turn_count(), n + 1);
        }
        assert_eq!(session.history().count_role(Role::System), 1);
    }

    #[tokio::test]
    async fn test_anomaly_result_does_not_replace_artifact() {
        let (mut session, _, _) = session(vec![
            Ok("Action: load_dataframe(file_path='a.csv')"),
            Ok("Action: detect_anomalies_iqr(value_column='value')"),
        ]);

        session.chat_turn("load", &NoTurnProgress).await;
        let outcome = session.chat_turn("find anomalies", &NoTurnProgress).await;

        assert_eq!(outcome.tool_result.as_deref(), Some("(dataframe_new, 2)"));
        assert_eq!(session.last_artifact(), Some(&ArtifactRef::new("abc")));
    }

    #[tokio::test]
    async fn test_last_action_marker_wins() {
        let (mut session, _, executor) = session(vec![Ok(
            "Action: describe_dataframe(dataframe_id='x')\nOn second thought:\nAction: load_dataframe(file_path='b.csv')",
        )]);

        session.chat_turn("load b", &NoTurnProgress).await;

        let calls = executor.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].name, "load_dataframe");
    }
}
