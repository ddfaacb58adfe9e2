use std::sync::Arc;

use serde_json::json;
use sop_critic::agent::{NextRole, Role};
use sop_critic::transcript::{MessageRole, Transcript};

use crate::support::{
    Scripted, ScriptedProvider, acting_role, acting_settings, end_turn_text, registry, sop,
    tool_call, tool_calls,
};

fn seeded() -> Transcript {
    Transcript::seeded("Start SOP execution.")
}

#[tokio::test]
async fn tool_results_are_recorded_in_call_order() {
    let provider = Arc::new(
        ScriptedProvider::new()
            .turn(tool_calls(&[
                ("call_a", "echo", json!({"text": "first"})),
                ("call_b", "echo", json!({"text": "second"})),
            ]))
            .turn(end_turn_text("Echoed twice.")),
    );
    let role = acting_role(&provider, registry(), acting_settings());

    let decision = role.run(seeded(), &sop()).await.unwrap();

    assert_eq!(decision.next, NextRole::Reviewing);
    let appended = decision.transcript.since(1);
    assert_eq!(appended.len(), 3);
    assert_eq!(appended[0].call_id.as_deref(), Some("call_a"));
    assert_eq!(appended[0].content, "first");
    assert_eq!(appended[1].call_id.as_deref(), Some("call_b"));
    assert_eq!(appended[1].content, "second");
    assert_eq!(appended[2].content, "Echoed twice.");
    assert_eq!(appended[2].name.as_deref(), Some("main_agent"));
}

#[tokio::test]
async fn transfer_to_critic_skips_remaining_calls() {
    let provider = Arc::new(ScriptedProvider::new().turn(tool_calls(&[
        ("call_1", "transfer_to_critic_agent", json!({})),
        ("call_2", "echo", json!({"text": "never"})),
    ])));
    let role = acting_role(&provider, registry(), acting_settings());

    let decision = role.run(seeded(), &sop()).await.unwrap();

    assert_eq!(decision.next, NextRole::Reviewing);
    let appended = decision.transcript.since(1);
    assert_eq!(appended.len(), 2);
    assert_eq!(appended[0].role, MessageRole::Tool);
    assert_eq!(appended[0].content, "Successfully transferred to critic_agent");
    assert_eq!(
        appended[1].content,
        "Main agent handed control to critic_agent."
    );
    assert_eq!(provider.seen_turns().len(), 1);
}

#[tokio::test]
async fn transfer_to_self_keeps_working() {
    let provider = Arc::new(
        ScriptedProvider::new()
            .turn(tool_call("call_1", "transfer_to_main_agent", json!({})))
            .turn(end_turn_text("Kept going.")),
    );
    let role = acting_role(&provider, registry(), acting_settings());

    let decision = role.run(seeded(), &sop()).await.unwrap();

    assert_eq!(decision.next, NextRole::Reviewing);
    assert_eq!(decision.transcript.messages().last().unwrap().content, "Kept going.");
    assert_eq!(provider.seen_turns().len(), 2);
}

#[tokio::test]
async fn model_failure_is_summarized_for_review() {
    let provider = Arc::new(
        ScriptedProvider::new().push_turn(Scripted::Fail("quota exhausted")),
    );
    let role = acting_role(&provider, registry(), acting_settings());

    let decision = role.run(seeded(), &sop()).await.unwrap();

    assert_eq!(decision.next, NextRole::Reviewing);
    assert_eq!(decision.transcript.len(), 2);
    assert_eq!(
        decision.transcript.messages().last().unwrap().content,
        "Main agent could not complete the step: model request failed (quota exhausted)."
    );
}

#[tokio::test]
async fn exhausted_rounds_still_hand_over_a_summary() {
    let mut scripted = ScriptedProvider::new();
    for index in 0..5 {
        let id = format!("call_{index}");
        scripted = scripted.turn(tool_call(&id, "echo", json!({"text": "again"})));
    }
    let provider = Arc::new(scripted);
    let mut settings = acting_settings();
    settings.max_tool_rounds = 2;
    let role = acting_role(&provider, registry(), settings);

    let decision = role.run(seeded(), &sop()).await.unwrap();

    assert_eq!(decision.next, NextRole::Reviewing);
    assert_eq!(provider.seen_turns().len(), 2);
    assert_eq!(decision.transcript.len(), 4);
    assert_eq!(
        decision.transcript.messages().last().unwrap().content,
        "Main agent stopped after 2 tool rounds without finishing the step."
    );
}

#[tokio::test]
async fn unknown_tool_is_recorded_as_an_error() {
    let provider = Arc::new(
        ScriptedProvider::new()
            .turn(tool_call("call_1", "browser", json!({"url": "https://example.com"})))
            .turn(end_turn_text("No browser available.")),
    );
    let role = acting_role(&provider, registry(), acting_settings());

    let decision = role.run(seeded(), &sop()).await.unwrap();

    let tool_message = &decision.transcript.messages()[1];
    assert_eq!(tool_message.role, MessageRole::Tool);
    assert_eq!(tool_message.content, "[ERROR] tool browser not found");
    assert_eq!(decision.next, NextRole::Reviewing);
}

#[tokio::test]
async fn system_prompt_carries_sop_and_tools() {
    let provider = Arc::new(ScriptedProvider::new().turn(end_turn_text("Read the SOP.")));
    let role = acting_role(&provider, registry(), acting_settings());

    role.run(seeded(), &sop()).await.unwrap();

    let prompts = provider.seen_system_prompts();
    let prompt = prompts[0].as_deref().unwrap();
    assert!(prompt.contains("1. Open the forecast page."));
    assert!(prompt.contains(
        "Available tools: echo, transfer_to_critic_agent, transfer_to_main_agent."
    ));
}

#[tokio::test]
async fn empty_transcript_gets_default_instruction() {
    let provider = Arc::new(ScriptedProvider::new().turn(end_turn_text("")));
    let role = acting_role(&provider, registry(), acting_settings());

    let decision = role.run(Transcript::new(), &sop()).await.unwrap();

    assert_eq!(provider.seen_turns()[0].len(), 1);
    assert_eq!(decision.transcript.len(), 1);
    assert_eq!(
        decision.transcript.messages()[0].content,
        "Main agent performed a step according to SOP."
    );
}
