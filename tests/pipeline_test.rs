//! Trigger to notification, with the completion endpoint mocked

use clipmind::config::Config;
use clipmind::content::ContentOrigin;
use clipmind::core::protocol::ActionKind;
use clipmind::pipeline::{Notification, RunEvent, Trigger};
use mockito::{Matcher, Server, ServerGuard};
use std::time::Duration;
use tokio::sync::broadcast;

mod common;
use common::{completion_body, test_config, TestRig};

const PATH: &str = "/v1/chat/completions";

/// Collect notifications up to and including the first terminal one
async fn run_notifications(rx: &mut broadcast::Receiver<RunEvent>) -> Vec<Notification> {
    let mut seen = Vec::new();
    loop {
        let event = tokio::time::timeout(Duration::from_secs(5), rx.recv())
            .await
            .expect("timed out waiting for notification")
            .expect("notification channel closed");
        let terminal = event.notification.is_terminal();
        seen.push(event.notification);
        if terminal {
            return seen;
        }
    }
}

fn config_for(server: &ServerGuard) -> Config {
    test_config(&format!("{}{}", server.url(), PATH), "sk-test")
}

#[tokio::test]
async fn test_clipboard_changes_are_deduplicated() {
    let config = Config {
        auto_analyze: false,
        ..Config::default()
    };
    let rig = TestRig::new(&config);

    rig.clipboard.set("A");
    assert!(rig.pipeline.poll_clipboard().unwrap());
    assert!(!rig.pipeline.poll_clipboard().unwrap());

    rig.clipboard.set("B");
    assert!(rig.pipeline.poll_clipboard().unwrap());
    assert!(!rig.pipeline.poll_clipboard().unwrap());

    rig.clipboard.set("   ");
    assert!(!rig.pipeline.poll_clipboard().unwrap());
}

#[tokio::test]
async fn test_clipboard_change_is_summarized() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", PATH)
        .match_body(Matcher::Regex("The quick brown fox".to_string()))
        .with_status(200)
        .with_body(completion_body("**A fox jumps.**"))
        .create_async()
        .await;

    let rig = TestRig::new(&config_for(&server));
    let mut rx = rig.pipeline.subscribe();

    rig.clipboard.set("The quick brown fox");
    assert!(rig.pipeline.poll_clipboard().unwrap());

    let seen = run_notifications(&mut rx).await;
    assert_eq!(
        seen,
        vec![
            Notification::Analyzing {
                source: ContentOrigin::Clipboard
            },
            Notification::AnalysisComplete {
                text: "**A fox jumps.**".to_string(),
                is_error: false
            },
        ]
    );
    mock.assert_async().await;
}

#[tokio::test]
async fn test_manual_analyze_on_empty_clipboard() {
    let rig = TestRig::new(&test_config("http://127.0.0.1:9", "sk-test"));
    let mut rx = rig.pipeline.subscribe();

    rig.pipeline.trigger_manual_analyze().await.unwrap();

    let seen = run_notifications(&mut rx).await;
    match &seen[..] {
        [Notification::AnalysisComplete { text, is_error }] => {
            assert!(*is_error);
            assert!(text.contains("Clipboard is empty"));
        }
        other => panic!("unexpected notifications: {other:?}"),
    }
}

#[tokio::test]
async fn test_voice_query_without_api_key() {
    let rig = TestRig::new(&test_config("http://127.0.0.1:9", ""));
    let mut rx = rig.pipeline.subscribe();

    rig.pipeline.submit_voice_query("open firefox").await.unwrap();

    let seen = run_notifications(&mut rx).await;
    assert_eq!(
        seen.first(),
        Some(&Notification::Analyzing {
            source: ContentOrigin::Voice
        })
    );
    match seen.last() {
        Some(Notification::AskComplete { text, is_error }) => {
            assert!(*is_error);
            assert!(text.contains("No API key"));
        }
        other => panic!("unexpected terminal: {other:?}"),
    }
    assert!(rig.launcher.opened_apps().is_empty());
}

#[tokio::test]
async fn test_voice_query_runs_action() {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("POST", PATH)
        .with_status(200)
        .with_body(completion_body(
            r#"{"action":"open_app","params":{"appName":"Firefox"}}"#,
        ))
        .create_async()
        .await;

    let rig = TestRig::new(&config_for(&server));
    let mut rx = rig.pipeline.subscribe();

    rig.pipeline.submit_voice_query("open firefox").await.unwrap();

    let seen = run_notifications(&mut rx).await;
    assert_eq!(
        seen.last(),
        Some(&Notification::ActionCompleted {
            action: Some(ActionKind::OpenApp),
            message: "Opened: Firefox".to_string(),
            success: true,
        })
    );
    assert_eq!(rig.launcher.opened_apps(), vec!["Firefox"]);
}

#[tokio::test]
async fn test_prose_answer_to_action_query() {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("POST", PATH)
        .with_status(200)
        .with_body(completion_body("It is 42."))
        .create_async()
        .await;

    let rig = TestRig::new(&config_for(&server));
    let mut rx = rig.pipeline.subscribe();

    rig.pipeline
        .submit_action_query("what is the answer?")
        .await
        .unwrap();

    let seen = run_notifications(&mut rx).await;
    assert_eq!(
        seen.last(),
        Some(&Notification::AskComplete {
            text: "It is 42.".to_string(),
            is_error: false
        })
    );
}

#[tokio::test]
async fn test_copied_text_does_not_retrigger_summary() {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("POST", PATH)
        .with_status(200)
        .with_body(completion_body(
            r#"{"action":"copy_text","params":{"text":"generated snippet"}}"#,
        ))
        .create_async()
        .await;

    let rig = TestRig::new(&config_for(&server));
    let mut rx = rig.pipeline.subscribe();

    rig.pipeline
        .submit_voice_query("write me a snippet")
        .await
        .unwrap();
    run_notifications(&mut rx).await;

    assert_eq!(rig.clipboard.current().as_deref(), Some("generated snippet"));
    assert!(!rig.pipeline.poll_clipboard().unwrap());
}

#[tokio::test]
async fn test_replacement_round_trip() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", PATH)
        .match_body(Matcher::Regex("helo wrld".to_string()))
        .with_status(200)
        .with_body(completion_body(
            r#"{"action":"replace_text","params":{"newText":"Hello, world."}}"#,
        ))
        .create_async()
        .await;

    let config = Config {
        auto_analyze: false,
        ..config_for(&server)
    };
    let rig = TestRig::new(&config);
    let mut rx = rig.pipeline.subscribe();

    // The user highlighted and copied the text first
    rig.clipboard.set("helo wrld");
    assert!(rig.pipeline.poll_clipboard().unwrap());

    rig.pipeline
        .submit_voice_query("fix the spelling")
        .await
        .unwrap();
    let seen = run_notifications(&mut rx).await;
    assert_eq!(
        seen.last(),
        Some(&Notification::TextReplacement {
            old_text: "helo wrld".to_string(),
            new_text: "Hello, world.".to_string(),
        })
    );
    assert!(rig.events().is_empty());
    mock.assert_async().await;

    rig.pipeline
        .confirm_replacement("Hello, world.")
        .await
        .unwrap();
    let seen = run_notifications(&mut rx).await;
    assert!(matches!(
        seen.last(),
        Some(Notification::ActionCompleted {
            action: Some(ActionKind::ReplaceText),
            success: true,
            ..
        })
    ));
    assert_eq!(rig.events(), vec!["cut", "write:Hello, world.", "paste"]);
    assert!(!rig.pipeline.poll_clipboard().unwrap());
}

#[tokio::test]
async fn test_spawned_runs_are_told_apart() {
    let rig = TestRig::new(&test_config("http://127.0.0.1:9", ""));
    let mut rx = rig.pipeline.subscribe();

    let first = rig.pipeline.spawn(Trigger::ActionQuery("one".to_string()));
    let second = rig.pipeline.spawn(Trigger::ManualAnalyze);
    assert_ne!(first, second);

    let mut terminal = Vec::new();
    while terminal.len() < 2 {
        let event = tokio::time::timeout(Duration::from_secs(5), rx.recv())
            .await
            .expect("timed out waiting for notification")
            .expect("notification channel closed");
        if event.notification.is_terminal() {
            terminal.push(event);
        }
    }

    let by_run = |id| {
        terminal
            .iter()
            .find(|e| e.run_id == id)
            .map(|e| e.notification.clone())
            .expect("every run ends with a terminal notification")
    };
    assert!(matches!(
        by_run(first),
        Notification::AskComplete { is_error: true, .. }
    ));
    assert!(matches!(
        by_run(second),
        Notification::AnalysisComplete { is_error: true, .. }
    ));
}
