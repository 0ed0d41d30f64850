use std::time::Duration;

use courtside::artifact::Artifact;
use courtside::commands::CommandName;
use courtside::dispatcher::ChannelEvent;
use courtside::state::{AppState, Author, MessageBody, apply_event};

#[test]
fn input_becomes_a_user_message() {
    let mut state = AppState::new();
    state.input = "  !search LeBron James ".to_string();
    assert_eq!(state.take_input().as_deref(), Some("!search LeBron James"));
    assert!(state.input.is_empty());
    state.mark_submitted(1, "!search LeBron James");

    let last = state.messages.back().unwrap();
    assert_eq!(last.author, Author::User);
    assert_eq!(last.invocation, Some(1));
    assert!(state.pending.contains_key(&1));
}

#[test]
fn blank_input_is_ignored() {
    let mut state = AppState::new();
    state.input = "   ".to_string();
    assert!(state.take_input().is_none());
    assert!(state.messages.is_empty());
}

#[test]
fn replies_and_finish_update_state() {
    let mut state = AppState::new();
    state.pending.insert(7, "!games".to_string());

    apply_event(
        &mut state,
        ChannelEvent::Reply {
            invocation: 7,
            artifact: Artifact::image(vec![1, 2, 3], "games_today.png"),
        },
    );
    apply_event(
        &mut state,
        ChannelEvent::Finished {
            invocation: 7,
            command: CommandName::Games,
            elapsed: Duration::from_millis(42),
            ok: true,
        },
    );

    assert_eq!(state.replies, 1);
    assert_eq!(state.attachments, 1);
    assert!(state.pending.is_empty());
    let last = state.messages.back().unwrap();
    assert_eq!(last.author, Author::Bot);
    assert!(matches!(
        &last.body,
        MessageBody::Attachment { filename, .. } if filename == "games_today.png"
    ));
    assert!(state.logs.back().unwrap().contains("#7 games in 42 ms"));
}

#[test]
fn multi_line_replies_span_several_transcript_lines() {
    let mut state = AppState::new();
    apply_event(
        &mut state,
        ChannelEvent::Reply {
            invocation: 1,
            artifact: Artifact::text("```\nGP\n71\n```"),
        },
    );
    let lines = state.transcript_lines();
    assert_eq!(lines.len(), 4);
    assert!(lines[0].ends_with("bot: ```"));
    assert!(lines[2].ends_with("71"));
}

#[test]
fn scrolling_is_clamped_to_the_transcript() {
    let mut state = AppState::new();
    state.scroll_up(100);
    assert_eq!(state.visible_window(30, 10), (0, 10));
    state.scroll_down(95);
    assert_eq!(state.visible_window(30, 10), (15, 25));
    state.scroll_down(50);
    assert_eq!(state.visible_window(30, 10), (20, 30));
    assert_eq!(state.visible_window(4, 10), (0, 4));
}

#[test]
fn logs_are_capped() {
    let mut state = AppState::new();
    for i in 0..250 {
        state.push_log(format!("line {i}"));
    }
    assert_eq!(state.logs.len(), 200);
    assert_eq!(state.logs.front().unwrap(), "line 50");
}
