//! Tests for the streaming, immediate and multi-part response contracts.

mod common;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use pretty_assertions::assert_eq;
use tokio::sync::oneshot;

use common::{registry, Script, ScriptedProvider, FORM_ARGS, FORM_SUMMARY};
use robochat::config::RobotSettings;
use robochat::error::{ErrorCategory, RobotError};
use robochat::orchestrator::{Chunk, Orchestrator};
use robochat::robot::{ChatRobot, Robot, StreamHandler};
use robochat::types::{ConversationTurn, ModelMessage, ResponseEnvelope, Role};

#[derive(Default)]
struct RecordingHandler {
    log: Mutex<Vec<String>>,
}

impl RecordingHandler {
    fn log(&self) -> Vec<String> {
        self.log.lock().unwrap().clone()
    }

    fn push(&self, entry: String) {
        self.log.lock().unwrap().push(entry);
    }
}

impl StreamHandler for RecordingHandler {
    fn on_start(&self) {
        self.push("start".into());
    }

    fn on_chunk(&self, chunk: &Chunk) {
        self.push(format!("chunk:{}", chunk.text));
    }

    fn on_full_message(&self, tool_name: &str, _message: &serde_json::Value) {
        self.push(format!("full:{tool_name}"));
    }

    fn on_error(&self, error: &RobotError) {
        self.push(format!("error:{}", error.category()));
    }

    fn on_finish(&self, full_text: &str) {
        self.push(format!("finish:{full_text}"));
    }
}

fn robot(provider: Arc<ScriptedProvider>, settings: RobotSettings) -> Robot {
    let orchestrator = Orchestrator::new(provider, registry());
    Robot::new(orchestrator, settings)
}

fn form_script() -> Script {
    Script::new()
        .text(0, "Sure, creating it now. ")
        .tool(1, "formCreate", FORM_ARGS, 4)
        .end()
}

#[tokio::test]
async fn streaming_delivers_callbacks_in_order() {
    let robot = robot(ScriptedProvider::single(form_script()), RobotSettings::default());
    let handler = Arc::new(RecordingHandler::default());

    let envelope = robot
        .respond_streaming(ConversationTurn::user("Create a contact form"), handler.clone())
        .await;

    let expected_text = format!("Sure, creating it now. \n\n{FORM_SUMMARY}");
    assert_eq!(envelope.text, expected_text);
    assert!(!envelope.is_error());
    assert_eq!(
        handler.log(),
        vec![
            "start".to_string(),
            "chunk:Sure, creating it now. ".to_string(),
            format!("chunk:\n\n{FORM_SUMMARY}"),
            "full:formCreate".to_string(),
            format!("finish:{expected_text}"),
        ]
    );
}

#[tokio::test]
async fn closure_handler_receives_chunks() {
    let robot = robot(
        ScriptedProvider::single(Script::new().text(0, "Hello").text(1, " there").end()),
        RobotSettings::default(),
    );
    let seen = Arc::new(Mutex::new(String::new()));
    let sink = Arc::clone(&seen);

    robot
        .respond_streaming(
            ConversationTurn::user("hi"),
            Arc::new(move |chunk: &Chunk| sink.lock().unwrap().push_str(&chunk.text)),
        )
        .await;

    assert_eq!(*seen.lock().unwrap(), "Hello there");
}

#[tokio::test]
async fn immediate_matches_concatenated_stream() {
    let streamed = robot(ScriptedProvider::single(form_script()), RobotSettings::default());
    let handler = Arc::new(RecordingHandler::default());
    streamed
        .respond_streaming(ConversationTurn::user("go"), handler.clone())
        .await;
    let concatenated: String = handler
        .log()
        .iter()
        .filter_map(|entry| entry.strip_prefix("chunk:"))
        .collect();

    let immediate = robot(ScriptedProvider::single(form_script()), RobotSettings::default())
        .respond_immediate(ConversationTurn::user("go"))
        .await;

    assert_eq!(immediate.text, concatenated);
    assert_eq!(immediate.role, Role::Assistant);
    assert_eq!(immediate.estimated_tokens, immediate.text.chars().count().div_ceil(4));
}

#[tokio::test]
async fn immediate_returns_tool_only_diagnostics() {
    let robot = robot(
        ScriptedProvider::single(
            Script::new()
                .tool_start(0, "formCreate")
                .fragment(0, "{not json")
                .stop(0)
                .end(),
        ),
        RobotSettings::default(),
    );

    let envelope = robot.respond_immediate(ConversationTurn::user("go")).await;

    assert!(!envelope.is_error());
    assert!(envelope.text.contains("Error executing formCreate"));
}

#[tokio::test]
async fn streaming_failure_keeps_partial_text() {
    let robot = robot(
        ScriptedProvider::single(
            Script::new()
                .text(0, "Partial answer")
                .provider_error("api_error", "Internal"),
        ),
        RobotSettings::default(),
    );
    let handler = Arc::new(RecordingHandler::default());

    let envelope = robot
        .respond_streaming(ConversationTurn::user("go"), handler.clone())
        .await;

    assert!(envelope.is_error());
    assert!(envelope.text.starts_with("Partial answer\n\nThe provider connection failed"));
    assert_eq!(
        envelope.error.as_ref().map(|e| e.category),
        Some(ErrorCategory::Transport)
    );
    assert_eq!(
        handler.log(),
        vec![
            "start".to_string(),
            "chunk:Partial answer".to_string(),
            "error:transport".to_string(),
            "finish:Partial answer".to_string(),
        ]
    );
}

#[tokio::test]
async fn failure_before_any_text_skips_chunk_callback() {
    let robot = robot(
        ScriptedProvider::single(Script::new().provider_error("api_error", "Internal")),
        RobotSettings::default(),
    );
    let handler = Arc::new(RecordingHandler::default());

    let envelope = robot
        .respond_streaming(ConversationTurn::user("go"), handler.clone())
        .await;

    assert!(envelope.is_error());
    assert_eq!(
        handler.log(),
        vec![
            "start".to_string(),
            "error:transport".to_string(),
            "finish:".to_string(),
        ]
    );
}

#[tokio::test]
async fn immediate_failure_is_an_error_envelope() {
    let robot = robot(
        ScriptedProvider::single(Script::new().refuse("connection refused")),
        RobotSettings::default(),
    );

    let envelope = robot.respond_immediate(ConversationTurn::user("go")).await;

    assert!(envelope.is_error());
    assert_eq!(
        envelope.text,
        "The provider connection failed: Transport failure: connection refused"
    );
}

#[tokio::test(start_paused = true)]
async fn slow_provider_times_out() {
    let settings = RobotSettings::builder().response_timeout_ms(1_000).build();
    let robot = robot(
        ScriptedProvider::single(
            Script::new()
                .text(0, "never")
                .end()
                .paced(Duration::from_secs(30)),
        ),
        settings,
    );
    let handler = Arc::new(RecordingHandler::default());

    let envelope = robot
        .respond_streaming(ConversationTurn::user("go"), handler.clone())
        .await;

    assert!(envelope.is_error());
    assert_eq!(envelope.text, "The response timed out after 1000ms.");
    assert_eq!(
        handler.log(),
        vec![
            "start".to_string(),
            "error:timeout".to_string(),
            "finish:".to_string(),
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn zero_timeout_waits_for_slow_provider() {
    let settings = RobotSettings::builder().response_timeout_ms(0).build();
    let robot = robot(
        ScriptedProvider::single(
            Script::new()
                .text(0, "eventually")
                .end()
                .paced(Duration::from_secs(600)),
        ),
        settings,
    );

    let envelope = robot.respond_immediate(ConversationTurn::user("go")).await;
    assert_eq!(envelope.text, "eventually");
}

#[tokio::test]
async fn multi_part_resolves_immediate_then_follow_up() {
    let provider = ScriptedProvider::new(vec![
        form_script(),
        Script::new().text(0, "You can now share the form link.").end(),
    ]);
    let settings = RobotSettings::builder()
        .follow_up_prompt("Anything else?")
        .build();
    let robot = robot(Arc::clone(&provider), settings);

    let response = robot
        .respond_multi_part(ConversationTurn::user("Create a contact form"))
        .await;
    assert_eq!(
        response.immediate.text,
        format!("Sure, creating it now. \n\n{FORM_SUMMARY}")
    );

    let delayed = response.delayed.wait().await;
    assert_eq!(delayed.text, "You can now share the form link.");
    assert_eq!(provider.opened(), 2);

    let follow_up = &provider.requests()[1];
    let last = follow_up.messages.last().unwrap();
    assert_eq!(last.text, "Anything else?");
    assert_eq!(last.role, Role::User);
    let history: Vec<_> = follow_up.messages.iter().map(|m| m.role).collect();
    assert_eq!(history, vec![Role::User, Role::Assistant, Role::User]);
    assert_eq!(follow_up.messages[1].text, response.immediate.text);
}

#[tokio::test(start_paused = true)]
async fn multi_part_callback_fires_once_after_delay() {
    let provider = ScriptedProvider::new(vec![
        Script::new().text(0, "First.").end(),
        Script::new().text(0, "Second.").end(),
    ]);
    let settings = RobotSettings::builder().follow_up_delay_ms(5_000).build();
    let robot = robot(Arc::clone(&provider), settings);

    let calls = Arc::new(Mutex::new(Vec::new()));
    let (done_tx, done_rx) = oneshot::channel();
    let first = Arc::clone(&calls);
    let recorded = Arc::clone(&calls);
    let immediate = robot
        .respond_multi_part_with(
            ConversationTurn::user("go"),
            Box::new(move |envelope: &ResponseEnvelope| {
                first.lock().unwrap().push(format!("immediate:{}", envelope.text));
            }),
            Box::new(move |envelope| {
                recorded.lock().unwrap().push(envelope.text);
                let _ = done_tx.send(());
            }),
        )
        .await;

    assert_eq!(immediate.text, "First.");
    assert_eq!(*calls.lock().unwrap(), vec!["immediate:First.".to_string()]);
    calls.lock().unwrap().clear();
    assert!(calls.lock().unwrap().is_empty());
    assert_eq!(provider.opened(), 1);

    done_rx.await.unwrap();
    assert_eq!(*calls.lock().unwrap(), vec!["Second.".to_string()]);
    assert_eq!(provider.opened(), 2);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn delayed_callback_never_precedes_immediate_without_delay() {
    let robot = robot(
        ScriptedProvider::single(Script::new().text(0, "Reply.").end()),
        RobotSettings::default(),
    );

    for _ in 0..100 {
        let immediate_seen = Arc::new(AtomicBool::new(false));
        let mark = Arc::clone(&immediate_seen);
        let check = Arc::clone(&immediate_seen);
        let (done_tx, done_rx) = oneshot::channel();

        let immediate = robot
            .respond_multi_part_with(
                ConversationTurn::user("go"),
                Box::new(move |_: &ResponseEnvelope| mark.store(true, Ordering::SeqCst)),
                Box::new(move |envelope| {
                    let _ = done_tx.send((check.load(Ordering::SeqCst), envelope.text));
                }),
            )
            .await;

        let (ordered, delayed_text) = done_rx.await.unwrap();
        assert!(ordered, "follow-up delivered before the immediate response");
        assert_eq!(immediate.text, "Reply.");
        assert_eq!(delayed_text, "Reply.");
    }
}

#[tokio::test]
async fn follow_up_after_failure_omits_error_text_from_history() {
    let provider = ScriptedProvider::new(vec![
        Script::new()
            .text(0, "Partial answer")
            .provider_error("api_error", "Internal"),
        Script::new().text(0, "Recovered.").end(),
    ]);
    let robot = robot(Arc::clone(&provider), RobotSettings::default());

    let response = robot.respond_multi_part(ConversationTurn::user("go")).await;
    assert!(response.immediate.is_error());
    let delayed = response.delayed.wait().await;
    assert_eq!(delayed.text, "Recovered.");

    let follow_up = &provider.requests()[1];
    let texts: Vec<_> = follow_up.messages.iter().map(|m| m.text.as_str()).collect();
    assert_eq!(texts[..2].to_vec(), vec!["go", "Partial answer"]);
    assert!(!follow_up.messages[1].text.contains("provider connection failed"));
}

#[tokio::test]
async fn follow_up_failure_does_not_touch_immediate() {
    let provider = ScriptedProvider::new(vec![
        Script::new().text(0, "All good.").end(),
        Script::new().refuse("connection reset"),
    ]);
    let robot = robot(provider, RobotSettings::default());

    let response = robot.respond_multi_part(ConversationTurn::user("go")).await;
    let delayed = response.delayed.wait().await;

    assert!(!response.immediate.is_error());
    assert_eq!(response.immediate.text, "All good.");
    assert!(delayed.is_error());
}

#[tokio::test]
async fn history_is_forwarded_verbatim() {
    let provider = ScriptedProvider::single(Script::new().text(0, "ok").end());
    let robot = robot(Arc::clone(&provider), RobotSettings::default());
    let history = vec![
        ModelMessage::user("Make a survey"),
        ModelMessage::assistant("Done."),
    ];

    robot
        .respond_immediate(ConversationTurn::user("Rename it").with_history(history.clone()))
        .await;

    let messages = &provider.requests()[0].messages;
    assert_eq!(&messages[..2], &history[..]);
    assert_eq!(messages[2].text, "Rename it");
}

#[test]
fn estimate_tokens_uses_four_chars_per_token() {
    let robot = robot(
        ScriptedProvider::single(Script::new()),
        RobotSettings::default(),
    );
    assert_eq!(robot.estimate_tokens(""), 0);
    assert_eq!(robot.estimate_tokens("abcd"), 1);
    assert_eq!(robot.estimate_tokens("abcde"), 2);
}
