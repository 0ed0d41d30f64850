use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::mpsc;
use std::time::Duration;

use chrono::NaiveDate;

use courtside::artifact::Artifact;
use courtside::catalog::Catalog;
use courtside::commands::{CommandContext, CommandName};
use courtside::demo_feed::DemoProvider;
use courtside::dispatcher::{ChannelEvent, Dispatcher};

fn demo_dispatcher(tx: mpsc::Sender<ChannelEvent>) -> Dispatcher {
    let catalog: &'static Catalog = Box::leak(Box::new(Catalog::embedded()));
    let ctx = CommandContext {
        prefix: "!".to_string(),
        catalog,
        provider: Box::new(DemoProvider::new(NaiveDate::from_ymd_opt(2025, 1, 15).unwrap())),
        font_path: PathBuf::from("/nonexistent/arial.ttf"),
        schedule_offset: None,
    };
    Dispatcher::new(ctx, 2, tx)
}

#[test]
fn chatter_is_not_dispatched() {
    let (tx, rx) = mpsc::channel();
    let mut dispatcher = demo_dispatcher(tx);
    assert!(dispatcher.submit("good game last night").is_none());
    assert!(dispatcher.submit("   ").is_none());
    assert!(rx.recv_timeout(Duration::from_millis(200)).is_err());
}

#[test]
fn replies_stay_in_order_per_invocation() {
    let (tx, rx) = mpsc::channel();
    let mut dispatcher = demo_dispatcher(tx);
    let team = dispatcher.submit("!team Boston Celtics").unwrap();
    let search = dispatcher.submit("!search").unwrap();
    assert_ne!(team, search);

    let mut replies: HashMap<u64, Vec<Artifact>> = HashMap::new();
    let mut finished: HashMap<u64, (CommandName, bool)> = HashMap::new();
    while finished.len() < 2 {
        match rx
            .recv_timeout(Duration::from_secs(30))
            .expect("dispatcher should finish both invocations")
        {
            ChannelEvent::Reply {
                invocation,
                artifact,
            } => {
                assert!(!finished.contains_key(&invocation), "reply after finish");
                replies.entry(invocation).or_default().push(artifact);
            }
            ChannelEvent::Finished {
                invocation,
                command,
                ok,
                ..
            } => {
                finished.insert(invocation, (command, ok));
            }
        }
    }

    assert_eq!(finished[&team], (CommandName::Team, true));
    assert_eq!(finished[&search], (CommandName::Search, false));

    let team_replies = &replies[&team];
    assert_eq!(team_replies.len(), 3);
    assert_eq!(team_replies[0].as_text(), Some("fetching data..."));
    assert!(team_replies[1].as_text().unwrap().starts_with("```"));
    assert!(team_replies[2].is_image());

    assert_eq!(
        replies[&search],
        vec![Artifact::text("type some player name")]
    );
}
