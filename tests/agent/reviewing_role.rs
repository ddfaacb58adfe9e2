use std::sync::Arc;

use sop_critic::agent::{NextRole, Role};
use sop_critic::transcript::{Message, Transcript};

use crate::support::{ScriptedProvider, critic_settings, reviewing_role, sop};

fn after_action(action: &str) -> Transcript {
    let mut transcript = Transcript::seeded("Start SOP execution.");
    transcript.push(Message::assistant(action).with_name("main_agent"));
    transcript
}

#[tokio::test]
async fn review_only_appends() {
    let provider = Arc::new(ScriptedProvider::new().judgment("Scroll down first."));
    let role = reviewing_role(&provider, critic_settings());
    let before = after_action("Opened the forecast page.");

    let decision = role.run(before.clone(), &sop()).await.unwrap();

    assert_eq!(decision.next, NextRole::Acting);
    assert!(decision.transcript.extends(&before));
    assert_eq!(decision.transcript.len(), before.len() + 1);
    assert_eq!(
        decision.transcript.messages().last().unwrap().content,
        "Critic feedback: Scroll down first."
    );
}

#[tokio::test]
async fn same_judgment_gives_same_routing() {
    let provider = Arc::new(
        ScriptedProvider::new()
            .judgment("Wrong page.")
            .judgment("Wrong page."),
    );
    let role = reviewing_role(&provider, critic_settings());
    let transcript = after_action("Opened the news page.");

    let first = role.run(transcript.clone(), &sop()).await.unwrap();
    let second = role.run(transcript, &sop()).await.unwrap();

    assert_eq!(first.next, second.next);
    assert_eq!(first.transcript.messages(), second.transcript.messages());
    let judgments = provider.seen_judgments();
    assert_eq!(judgments[0], judgments[1]);
}

#[tokio::test]
async fn empty_transcript_is_judged_with_blank_action() {
    let provider = Arc::new(ScriptedProvider::new().judgment("OK"));
    let role = reviewing_role(&provider, critic_settings());

    let decision = role.run(Transcript::new(), &sop()).await.unwrap();

    assert!(provider.seen_judgments()[0].contains("The main agent performed this action: \n"));
    assert_eq!(decision.next, NextRole::Terminate);
    assert_eq!(decision.transcript.len(), 1);
    assert_eq!(decision.transcript.messages()[0].content, "Critic feedback: OK");
}

#[tokio::test]
async fn critic_judges_latest_non_critic_message() {
    let provider = Arc::new(ScriptedProvider::new().judgment("OK"));
    let role = reviewing_role(&provider, critic_settings());
    let mut transcript = after_action("Opened the forecast page.");
    transcript.push(Message::assistant("Critic feedback: Earlier note.").with_name("critic_agent"));

    role.run(transcript, &sop()).await.unwrap();

    assert!(
        provider.seen_judgments()[0]
            .contains("performed this action: Opened the forecast page.")
    );
}

#[tokio::test]
async fn only_a_bare_ok_approves() {
    let cases = [
        ("OK", NextRole::Terminate),
        ("ok", NextRole::Terminate),
        ("  Ok\n", NextRole::Terminate),
        ("OK.", NextRole::Acting),
        ("OK, but scroll down", NextRole::Acting),
        ("Looks fine", NextRole::Acting),
    ];

    for (reply, expected) in cases {
        let provider = Arc::new(ScriptedProvider::new().judgment(reply));
        let role = reviewing_role(&provider, critic_settings());
        let decision = role
            .run(after_action("Reported the weather."), &sop())
            .await
            .unwrap();
        assert_eq!(decision.next, expected, "reply {reply:?}");
    }
}
