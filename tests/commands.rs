use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use courtside::artifact::{Artifact, CHART_FILENAME, SCHEDULE_FILENAME, png_dimensions};
use courtside::catalog::{Catalog, Entity, embedded_teams};
use courtside::commands::{CommandContext, CommandError, Invocation, help_text, run};
use courtside::stats_fetch::{
    PLAYER_SEASONS_SET, ProviderError, RawDataset, ScheduleLine, StatsProvider, TEAM_GAMES_SET,
    parse_result_set_json, parse_scoreboard_json,
};

fn read_fixture(name: &str) -> String {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push("tests");
    path.push("fixtures");
    path.push(name);
    fs::read_to_string(path).expect("fixture file should be readable")
}

#[derive(Default)]
struct Calls {
    career: AtomicUsize,
    games: AtomicUsize,
    schedule: AtomicUsize,
}

impl Calls {
    fn total(&self) -> usize {
        self.career.load(Ordering::SeqCst)
            + self.games.load(Ordering::SeqCst)
            + self.schedule.load(Ordering::SeqCst)
    }
}

/// Serves fixture payloads and counts how often it was asked.
struct StubProvider {
    calls: Arc<Calls>,
    schedule_fixture: &'static str,
    career_fixture: &'static str,
    fail: bool,
}

impl StubProvider {
    fn outage(&self, endpoint: &'static str) -> Result<(), ProviderError> {
        if self.fail {
            return Err(ProviderError::Status { endpoint, status: 500 });
        }
        Ok(())
    }
}

impl StatsProvider for StubProvider {
    fn player_career(&self, _: u32) -> Result<RawDataset, ProviderError> {
        self.calls.career.fetch_add(1, Ordering::SeqCst);
        self.outage("playercareerstats")?;
        parse_result_set_json(
            "playercareerstats",
            &read_fixture(self.career_fixture),
            PLAYER_SEASONS_SET,
        )
    }

    fn team_games(&self, _: u32) -> Result<RawDataset, ProviderError> {
        self.calls.games.fetch_add(1, Ordering::SeqCst);
        self.outage("leaguegamefinder")?;
        parse_result_set_json(
            "leaguegamefinder",
            &read_fixture("league_game_finder.json"),
            TEAM_GAMES_SET,
        )
    }

    fn todays_games(&self) -> Result<Vec<ScheduleLine>, ProviderError> {
        self.calls.schedule.fetch_add(1, Ordering::SeqCst);
        self.outage("scoreboard")?;
        parse_scoreboard_json(&read_fixture(self.schedule_fixture))
    }

    fn player_index(&self) -> Result<Vec<Entity>, ProviderError> {
        Ok(Vec::new())
    }
}

fn context(schedule_fixture: &'static str, fail: bool) -> (CommandContext, Arc<Calls>) {
    let catalog: &'static Catalog = Box::leak(Box::new(Catalog::new(
        vec![Entity::player(2544, "LeBron James", Some(2024))],
        embedded_teams(),
    )));
    let calls = Arc::new(Calls::default());
    let provider = StubProvider {
        calls: Arc::clone(&calls),
        schedule_fixture,
        career_fixture: "player_career.json",
        fail,
    };
    let ctx = CommandContext {
        prefix: "!".to_string(),
        catalog,
        provider: Box::new(provider),
        font_path: PathBuf::from("/nonexistent/arial.ttf"),
        schedule_offset: None,
    };
    (ctx, calls)
}

fn ask(ctx: &CommandContext, line: &str) -> (Vec<Artifact>, Result<(), CommandError>) {
    let invocation = Invocation::parse(line, &ctx.prefix).expect("line should parse");
    let mut replies = Vec::new();
    let result = run(ctx, &invocation, &mut replies);
    (replies, result)
}

fn texts(replies: &[Artifact]) -> Vec<&str> {
    replies.iter().filter_map(Artifact::as_text).collect()
}

#[test]
fn search_replies_with_season_table() {
    let (ctx, calls) = context("scoreboard.json", false);
    let (replies, result) = ask(&ctx, "!search LeBron James");
    assert!(result.is_ok());
    assert_eq!(
        texts(&replies),
        vec!["fetching data...", "```\nGP  GS   PTS\n71  71  1820\n55  55  1200\n```"]
    );
    assert_eq!(calls.career.load(Ordering::SeqCst), 1);
}

#[test]
fn search_shows_traded_season_once() {
    let (mut ctx, calls) = context("scoreboard.json", false);
    ctx.provider = Box::new(StubProvider {
        calls: Arc::clone(&calls),
        schedule_fixture: "scoreboard.json",
        career_fixture: "player_career_traded.json",
        fail: false,
    });
    let (replies, result) = ask(&ctx, "!search LeBron James");
    assert!(result.is_ok());
    assert_eq!(
        texts(&replies),
        vec![
            "fetching data...",
            "```\nGP  GS   PTS\n82  82  1904\n64   3   700\n60  60  1300\n```"
        ]
    );
}

#[test]
fn search_without_name_prompts() {
    let (ctx, calls) = context("scoreboard.json", false);
    let (replies, result) = ask(&ctx, "!search");
    assert!(matches!(result, Err(CommandError::MissingArgument(_))));
    assert_eq!(texts(&replies), vec!["type some player name"]);
    assert_eq!(calls.total(), 0);
}

#[test]
fn search_unknown_player_skips_provider() {
    let (ctx, calls) = context("scoreboard.json", false);
    let (replies, result) = ask(&ctx, "!search Lebron James");
    assert!(matches!(result, Err(CommandError::Resolution(_))));
    assert_eq!(texts(&replies), vec!["spelled wrong player name, try again"]);
    assert_eq!(calls.total(), 0);
}

#[test]
fn search_provider_failure_reads_as_misspelling() {
    let (ctx, calls) = context("scoreboard.json", true);
    let (replies, result) = ask(&ctx, "!search LeBron James");
    assert!(matches!(result, Err(CommandError::Provider(_))));
    assert_eq!(
        texts(&replies),
        vec!["fetching data...", "spelled wrong player name, try again"]
    );
    assert_eq!(calls.career.load(Ordering::SeqCst), 1);
}

#[test]
fn games_with_empty_schedule_says_so() {
    let (ctx, _) = context("scoreboard_empty.json", false);
    let (replies, result) = ask(&ctx, "!games");
    assert!(result.is_ok());
    assert_eq!(replies, vec![Artifact::text("no games today")]);
}

#[test]
fn games_replies_with_one_image() {
    let (ctx, calls) = context("scoreboard.json", false);
    let (replies, result) = ask(&ctx, "!games tonight please");
    assert!(result.is_ok());
    assert_eq!(replies.len(), 1);
    let Artifact::Image { bytes, filename } = &replies[0] else {
        panic!("expected an image, got {:?}", replies[0]);
    };
    assert_eq!(filename, SCHEDULE_FILENAME);
    assert_eq!(png_dimensions(bytes), Some((800, 160)));
    assert_eq!(calls.schedule.load(Ordering::SeqCst), 1);
}

#[test]
fn games_provider_failure() {
    let (ctx, _) = context("scoreboard.json", true);
    let (replies, _) = ask(&ctx, "!games");
    assert_eq!(texts(&replies), vec!["couldn't load today's games, try again"]);
}

#[test]
fn team_unknown_name_replies_once() {
    let (ctx, calls) = context("scoreboard.json", false);
    let (replies, result) = ask(&ctx, "!team Nonexistent Team");
    assert!(result.is_err());
    assert_eq!(replies, vec![Artifact::text("spelled wrong team name, try again")]);
    assert_eq!(calls.total(), 0);
}

#[test]
fn team_without_name_prompts() {
    let (ctx, _) = context("scoreboard.json", false);
    let (replies, _) = ask(&ctx, "!team");
    assert_eq!(texts(&replies), vec!["type some team"]);
}

#[test]
fn team_replies_with_table_then_chart() {
    let (ctx, calls) = context("scoreboard.json", false);
    let (replies, result) = ask(&ctx, "!team Boston Celtics");
    assert!(result.is_ok());
    assert_eq!(replies.len(), 3);
    assert_eq!(replies[0].as_text(), Some("fetching data..."));

    let table = replies[1].as_text().expect("table reply");
    let lines: Vec<&str> = table.lines().collect();
    // Fence, header, five games, fence.
    assert_eq!(lines.len(), 8);
    assert!(lines[1].trim_start().starts_with("GAME_DATE"));
    assert!(lines[1].trim_end().ends_with("PF"));
    assert!(lines[2].contains("2024-11-19"));
    assert!(lines[6].contains("2024-11-10"));
    assert!(!table.contains("2024-11-08"));

    let Artifact::Image { bytes, filename } = &replies[2] else {
        panic!("expected chart image");
    };
    assert_eq!(filename, CHART_FILENAME);
    assert_eq!(png_dimensions(bytes), Some((600, 400)));
    assert_eq!(calls.games.load(Ordering::SeqCst), 1);
}

#[test]
fn help_lists_commands() {
    let (ctx, _) = context("scoreboard.json", false);
    let (replies, result) = ask(&ctx, "!help");
    assert!(result.is_ok());
    assert_eq!(replies, vec![Artifact::text(help_text("!"))]);
}

#[test]
fn unknown_command_points_at_help() {
    let (ctx, calls) = context("scoreboard.json", false);
    let (replies, result) = ask(&ctx, "!player LeBron James");
    assert!(matches!(result, Err(CommandError::Unknown(word)) if word == "player"));
    assert_eq!(texts(&replies), vec!["unknown command, try !help"]);
    assert_eq!(calls.total(), 0);
}
