use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use sop_critic::agent::{
    ChannelSink, ControlLoop, NextRole, RoleId, RoutingDecision, RunState, TerminationPolicy,
    TransitionUpdate,
};
use sop_critic::error::{LoopError, RoutingError};
use sop_critic::llm::ContentBlock;
use sop_critic::tools::{ShellTool, ToolRegistry};
use sop_critic::transcript::{MessageRole, Transcript};
use tokio::sync::mpsc::UnboundedReceiver;

use crate::support::{
    FakeRole, Scripted, ScriptedProvider, acting_role, acting_settings, critic_settings,
    end_turn_text, registry, reviewing_role, sop, stub_acting, tool_call,
};

fn drain(rx: &mut UnboundedReceiver<TransitionUpdate>) -> Vec<TransitionUpdate> {
    let mut updates = Vec::new();
    while let Ok(update) = rx.try_recv() {
        updates.push(update);
    }
    updates
}

fn control_for(provider: &Arc<ScriptedProvider>) -> ControlLoop {
    ControlLoop::new(
        acting_role(provider, registry(), acting_settings()),
        reviewing_role(provider, critic_settings()),
    )
}

fn start() -> RunState {
    RunState::new("Start SOP execution.", sop())
}

#[tokio::test]
async fn approval_terminates_after_one_review() {
    let provider = Arc::new(
        ScriptedProvider::new()
            .turn(end_turn_text("Main agent performed a step according to SOP."))
            .judgment("OK"),
    );

    let outcome = control_for(&provider).run(start()).await.unwrap();

    let messages = outcome.transcript.messages();
    assert_eq!(messages.len(), 3);
    assert_eq!(messages[0].role, MessageRole::User);
    assert_eq!(messages[1].role, MessageRole::Assistant);
    assert_eq!(
        messages[1].content,
        "Main agent performed a step according to SOP."
    );
    assert_eq!(messages[2].content, "Critic feedback: OK");
    assert_eq!(messages[2].name.as_deref(), Some("critic_agent"));
    assert_eq!(outcome.steps, 2);
    assert_eq!(outcome.revisions, 0);

    let judgments = provider.seen_judgments();
    assert_eq!(judgments.len(), 1);
    assert!(
        judgments[0]
            .contains("The main agent performed this action: Main agent performed a step according to SOP.")
    );
}

#[tokio::test]
async fn revision_returns_to_acting_with_feedback() {
    let provider = Arc::new(
        ScriptedProvider::new()
            .turn(end_turn_text("Opened the home page."))
            .turn(end_turn_text("Clicked search."))
            .judgment("Try clicking the search button instead.")
            .judgment("OK"),
    );

    let outcome = control_for(&provider).run(start()).await.unwrap();

    let contents: Vec<&str> = outcome
        .transcript
        .messages()
        .iter()
        .map(|m| m.content.as_str())
        .collect();
    assert_eq!(
        contents,
        vec![
            "Start SOP execution.",
            "Opened the home page.",
            "Critic feedback: Try clicking the search button instead.",
            "Clicked search.",
            "Critic feedback: OK",
        ]
    );
    assert_eq!(outcome.revisions, 1);

    // The second acting turn saw the feedback as its latest input.
    let turns = provider.seen_turns();
    assert_eq!(turns.len(), 2);
    let last = turns[1].last().unwrap();
    assert!(matches!(
        &last.content[0],
        ContentBlock::Text { text } if text == "Critic feedback: Try clicking the search button instead."
    ));
}

#[tokio::test]
async fn failed_shell_command_is_still_reviewed() {
    let workspace = tempfile::tempdir().unwrap();
    let mut tools = ToolRegistry::new(Duration::from_secs(10));
    tools.register(Arc::new(ShellTool::new(
        workspace.path(),
        Duration::from_secs(10),
    )));

    let provider = Arc::new(
        ScriptedProvider::new()
            .turn(tool_call("call_1", "shell", json!({"command": "exit 3"})))
            .turn(end_turn_text("The shell command failed."))
            .judgment("OK"),
    );
    let control = ControlLoop::new(
        acting_role(&provider, Arc::new(tools), acting_settings()),
        reviewing_role(&provider, critic_settings()),
    );

    let outcome = control.run(start()).await.unwrap();
    let messages = outcome.transcript.messages();
    assert_eq!(messages.len(), 4);
    assert_eq!(messages[1].role, MessageRole::Tool);
    assert_eq!(messages[1].call_id.as_deref(), Some("call_1"));
    assert!(messages[1].content.contains("[ERROR]"));
    assert_eq!(messages[2].content, "The shell command failed.");
    assert_eq!(messages[3].content, "Critic feedback: OK");
    assert!(
        provider.seen_judgments()[0].contains("performed this action: The shell command failed.")
    );
}

#[tokio::test]
async fn only_reviewing_transitions_terminate() {
    let provider = Arc::new(
        ScriptedProvider::new()
            .judgment("Not yet.")
            .judgment("Still wrong.")
            .judgment("ok"),
    );
    let (sink, mut rx) = ChannelSink::new();

    let outcome = control_for(&provider)
        .with_sink(Arc::new(sink))
        .run(start())
        .await
        .unwrap();

    let updates = drain(&mut rx);
    assert_eq!(updates.len(), 6);
    assert_eq!(u32::try_from(updates.len()).unwrap(), outcome.steps);
    for (index, update) in updates.iter().enumerate() {
        let expected = if index % 2 == 0 {
            RoleId::MainAgent
        } else {
            RoleId::CriticAgent
        };
        assert_eq!(update.role, expected);
        assert_eq!(update.step, u32::try_from(index + 1).unwrap());
        assert_eq!(update.run_id, outcome.run_id);
    }
    let terminal: Vec<_> = updates
        .iter()
        .filter(|u| u.next == NextRole::Terminate)
        .collect();
    assert_eq!(terminal.len(), 1);
    assert_eq!(terminal[0].role, RoleId::CriticAgent);
    assert_eq!(terminal[0].step, 6);
}

#[tokio::test]
async fn updates_carry_exactly_the_appended_messages() {
    let provider = Arc::new(
        ScriptedProvider::new()
            .turn(tool_call("call_1", "echo", json!({"text": "hi"})))
            .turn(end_turn_text("Echoed hi.")),
    );
    let (sink, mut rx) = ChannelSink::new();

    let outcome = control_for(&provider)
        .with_sink(Arc::new(sink))
        .run(start())
        .await
        .unwrap();

    let updates = drain(&mut rx);
    let rebuilt: Vec<_> = std::iter::once(outcome.transcript.messages()[0].clone())
        .chain(updates.iter().flat_map(|u| u.appended.clone()))
        .collect();
    assert_eq!(rebuilt, outcome.transcript.messages());
    assert_eq!(updates[0].appended.len(), 2);
    assert_eq!(updates[1].appended.len(), 1);
}

#[tokio::test]
async fn endless_revisions_fail_as_not_converged() {
    let mut scripted = ScriptedProvider::new();
    for _ in 0..10 {
        scripted = scripted.judgment("Retry the lookup.");
    }
    let provider = Arc::new(scripted);
    let (sink, mut rx) = ChannelSink::new();

    let err = control_for(&provider)
        .with_policy(TerminationPolicy {
            max_revisions: 2,
            deadline: None,
        })
        .with_sink(Arc::new(sink))
        .run(start())
        .await
        .unwrap_err();

    assert!(matches!(err, LoopError::NotConverged { revisions: 2 }));
    assert_eq!(
        err.to_string(),
        "SOP execution did not converge after 2 revisions"
    );
    // Three acting turns, three reviews; the last rejection is still reported.
    let updates = drain(&mut rx);
    assert_eq!(updates.len(), 6);
    assert_eq!(updates[5].next, NextRole::Acting);
    assert_eq!(provider.seen_turns().len(), 3);
}

#[tokio::test]
async fn judgment_failure_becomes_no_critique() {
    let provider = Arc::new(
        ScriptedProvider::new()
            .push_judgment(Scripted::Fail("503 Service Unavailable"))
            .judgment("OK"),
    );

    let outcome = control_for(&provider).run(start()).await.unwrap();
    let contents: Vec<&str> = outcome
        .transcript
        .messages()
        .iter()
        .map(|m| m.content.as_str())
        .collect();
    assert!(contents.contains(&"Critic feedback: No critique."));
    assert_eq!(outcome.revisions, 1);
}

#[tokio::test]
async fn judgment_timeout_records_unavailable_critique() {
    let provider = Arc::new(
        ScriptedProvider::new()
            .push_judgment(Scripted::Hang)
            .judgment("OK"),
    );
    let mut settings = critic_settings();
    settings.timeout = Duration::from_millis(100);
    let control = ControlLoop::new(
        acting_role(&provider, registry(), acting_settings()),
        reviewing_role(&provider, settings),
    );

    let outcome = control.run(start()).await.unwrap();
    let critique = &outcome.transcript.messages()[2].content;
    assert!(critique.starts_with("Critic feedback: Critique unavailable"));
    assert_eq!(outcome.revisions, 1);
}

#[tokio::test]
async fn acting_model_timeout_still_routes_to_review() {
    let provider = Arc::new(
        ScriptedProvider::new()
            .push_turn(Scripted::Hang)
            .judgment("OK"),
    );
    let mut settings = acting_settings();
    settings.request_timeout = Duration::from_millis(100);
    let control = ControlLoop::new(
        acting_role(&provider, registry(), settings),
        reviewing_role(&provider, critic_settings()),
    );

    let outcome = control.run(start()).await.unwrap();
    let messages = outcome.transcript.messages();
    assert_eq!(messages.len(), 3);
    assert!(messages[1].content.contains("could not complete the step"));
}

#[tokio::test]
async fn acting_role_may_not_terminate() {
    let provider = Arc::new(ScriptedProvider::new());
    let acting = Arc::new(FakeRole::new(RoleId::MainAgent, |mut transcript: Transcript| {
        transcript.push(sop_critic::Message::assistant("Done."));
        Ok(RoutingDecision::new(NextRole::Terminate, transcript))
    }));
    let control = ControlLoop::new(acting, reviewing_role(&provider, critic_settings()));

    let err = control.run(start()).await.unwrap_err();
    assert!(matches!(
        err,
        LoopError::Routing(RoutingError::ActingCannotTerminate {
            role: RoleId::MainAgent
        })
    ));
    assert!(provider.seen_judgments().is_empty());
}

#[tokio::test]
async fn rewriting_history_is_fatal() {
    let provider = Arc::new(ScriptedProvider::new());
    let acting = Arc::new(FakeRole::new(RoleId::MainAgent, |_transcript: Transcript| {
        Ok(RoutingDecision::new(NextRole::Reviewing, Transcript::new()))
    }));
    let control = ControlLoop::new(acting, reviewing_role(&provider, critic_settings()));

    let err = control.run(start()).await.unwrap_err();
    assert!(matches!(
        err,
        LoopError::Routing(RoutingError::TranscriptRewritten {
            role: RoleId::MainAgent
        })
    ));
}

#[tokio::test]
async fn unknown_transfer_target_aborts_with_role_and_value() {
    let mut tools = ToolRegistry::new(Duration::from_secs(10));
    tools.register(Arc::new(sop_critic::tools::TransferTool::new("planner_agent")));
    let provider = Arc::new(
        ScriptedProvider::new().turn(tool_call("call_1", "transfer_to_planner_agent", json!({}))),
    );
    let control = ControlLoop::new(
        acting_role(&provider, Arc::new(tools), acting_settings()),
        reviewing_role(&provider, critic_settings()),
    );

    let err = control.run(start()).await.unwrap_err();
    let text = err.to_string();
    assert!(text.contains("main_agent"), "{text}");
    assert!(text.contains("planner_agent"), "{text}");
    assert!(matches!(
        err,
        LoopError::Routing(RoutingError::UnknownRole { .. })
    ));
}

#[tokio::test]
async fn role_failure_names_the_role() {
    let provider = Arc::new(ScriptedProvider::new());
    let acting = Arc::new(FakeRole::new(RoleId::MainAgent, |_transcript: Transcript| {
        Err(anyhow::anyhow!("workspace vanished"))
    }));
    let control = ControlLoop::new(acting, reviewing_role(&provider, critic_settings()));

    let err = control.run(start()).await.unwrap_err();
    assert!(matches!(
        err,
        LoopError::Role {
            role: RoleId::MainAgent,
            ..
        }
    ));
    assert!(err.to_string().contains("workspace vanished"));
}

#[tokio::test]
async fn deadline_bounds_the_whole_run() {
    let provider = Arc::new(ScriptedProvider::new().push_judgment(Scripted::Hang));
    let control = ControlLoop::new(
        stub_acting("Opened the page."),
        reviewing_role(&provider, critic_settings()),
    )
    .with_policy(TerminationPolicy {
        max_revisions: 8,
        deadline: Some(Duration::from_millis(200)),
    });

    let err = control.run(start()).await.unwrap_err();
    assert!(matches!(err, LoopError::DeadlineExceeded { .. }));
}

#[tokio::test]
async fn stub_roles_converge_without_a_model_turn() {
    let provider = Arc::new(ScriptedProvider::new().judgment("  OK \n"));
    let control = ControlLoop::new(
        stub_acting("Main agent performed a step according to SOP."),
        reviewing_role(&provider, critic_settings()),
    );

    let outcome = control.run(start()).await.unwrap();
    assert_eq!(outcome.transcript.len(), 3);
    assert!(provider.seen_turns().is_empty());
}
