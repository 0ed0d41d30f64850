use std::fmt;
use std::path::PathBuf;

use chrono::FixedOffset;
use thiserror::Error;

use crate::artifact::{Artifact, CHART_FILENAME, SCHEDULE_FILENAME};
use crate::catalog::{Catalog, EntityKind, ResolveError};
use crate::config::BotConfig;
use crate::fonts::load_font;
use crate::projection::{
    ChartSeries, PLAYER_CAREER_COLUMNS, ProjectionError, RECENT_GAMES, TEAM_RECENT_COLUMNS,
    project,
};
use crate::schedule_image::render_schedule_png;
use crate::stats_fetch::{ProviderError, StatsProvider};
use crate::trend_chart::{chart_title, render_chart};

pub const FETCHING: &str = "fetching data...";
pub const NO_GAMES_TODAY: &str = "no games today";
pub const GAMES_UNAVAILABLE: &str = "couldn't load today's games, try again";
pub const RENDER_FAILED: &str = "couldn't draw the image, try again";

/// Mentioning the bot works as well as the configured prefix.
pub const BOT_MENTION: &str = "@courtside";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandName {
    Search,
    Games,
    Team,
    Help,
    Unknown,
}

impl CommandName {
    pub fn from_word(word: &str) -> Self {
        match word {
            "search" => CommandName::Search,
            "games" => CommandName::Games,
            "team" => CommandName::Team,
            "help" => CommandName::Help,
            _ => CommandName::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CommandName::Search => "search",
            CommandName::Games => "games",
            CommandName::Team => "team",
            CommandName::Help => "help",
            CommandName::Unknown => "unknown",
        }
    }
}

impl fmt::Display for CommandName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One parsed chat line: `"<prefix><word> <args...>"`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub command: CommandName,
    pub word: String,
    pub args: Vec<String>,
}

impl Invocation {
    /// `None` when the line is not addressed to the bot.
    pub fn parse(line: &str, prefix: &str) -> Option<Self> {
        let line = line.trim();
        let mention = line
            .strip_prefix(BOT_MENTION)
            .filter(|rest| rest.is_empty() || rest.starts_with(char::is_whitespace));
        let body = if let Some(rest) = mention {
            rest.trim_start()
        } else if !prefix.is_empty() {
            line.strip_prefix(prefix)?
        } else {
            line
        };

        let mut tokens = body.split_whitespace();
        let word = tokens.next()?.to_string();
        Some(Self {
            command: CommandName::from_word(&word),
            word,
            args: tokens.map(str::to_string).collect(),
        })
    }

    /// Arguments joined by single spaces.
    pub fn argument_text(&self) -> String {
        self.args.join(" ")
    }
}

pub trait ReplySink {
    fn send(&mut self, artifact: Artifact);
}

impl ReplySink for Vec<Artifact> {
    fn send(&mut self, artifact: Artifact) {
        self.push(artifact);
    }
}

#[derive(Debug, Error)]
pub enum CommandError {
    #[error("no {0} name given")]
    MissingArgument(EntityKind),
    #[error(transparent)]
    Resolution(#[from] ResolveError),
    #[error(transparent)]
    Provider(#[from] ProviderError),
    #[error(transparent)]
    Projection(#[from] ProjectionError),
    #[error("rendering failed: {0:#}")]
    Render(anyhow::Error),
    #[error("unknown command {0:?}")]
    Unknown(String),
}

impl CommandError {
    /// What the channel sees. Provider and schema detail stays in the logs.
    pub fn user_message(&self, command: CommandName, prefix: &str) -> String {
        match self {
            CommandError::MissingArgument(EntityKind::Player) => "type some player name".into(),
            CommandError::MissingArgument(EntityKind::Team) => "type some team".into(),
            CommandError::Resolution(ResolveError::NotFound { kind, .. }) => {
                misspelled(*kind)
            }
            CommandError::Resolution(ResolveError::Ambiguous { kind, name, .. }) => {
                format!("more than one {kind} named {name}, try again")
            }
            CommandError::Provider(_) | CommandError::Projection(_) => match command {
                CommandName::Games => GAMES_UNAVAILABLE.into(),
                CommandName::Team => misspelled(EntityKind::Team),
                _ => misspelled(EntityKind::Player),
            },
            CommandError::Render(_) => RENDER_FAILED.into(),
            CommandError::Unknown(_) => format!("unknown command, try {prefix}help"),
        }
    }
}

fn misspelled(kind: EntityKind) -> String {
    format!("spelled wrong {kind} name, try again")
}

/// Everything a handler needs, shared read-only across invocations.
pub struct CommandContext {
    pub prefix: String,
    pub catalog: &'static Catalog,
    pub provider: Box<dyn StatsProvider>,
    pub font_path: PathBuf,
    pub schedule_offset: Option<FixedOffset>,
}

impl CommandContext {
    pub fn new(
        config: &BotConfig,
        catalog: &'static Catalog,
        provider: Box<dyn StatsProvider>,
    ) -> Self {
        Self {
            prefix: config.prefix.clone(),
            catalog,
            provider,
            font_path: config.font_path.clone(),
            schedule_offset: config.schedule_utc_offset,
        }
    }
}

/// Runs one invocation to completion. On failure the user-facing message is
/// sent to `sink` before the error is returned.
pub fn run(
    ctx: &CommandContext,
    invocation: &Invocation,
    sink: &mut dyn ReplySink,
) -> Result<(), CommandError> {
    let result = match invocation.command {
        CommandName::Search => search(ctx, &invocation.argument_text(), sink),
        CommandName::Games => games(ctx, sink),
        CommandName::Team => team(ctx, &invocation.argument_text(), sink),
        CommandName::Help => {
            sink.send(Artifact::text(help_text(&ctx.prefix)));
            Ok(())
        }
        CommandName::Unknown => Err(CommandError::Unknown(invocation.word.clone())),
    };
    if let Err(err) = &result {
        sink.send(Artifact::text(err.user_message(invocation.command, &ctx.prefix)));
    }
    result
}

fn search(ctx: &CommandContext, name: &str, sink: &mut dyn ReplySink) -> Result<(), CommandError> {
    if name.is_empty() {
        return Err(CommandError::MissingArgument(EntityKind::Player));
    }
    let player = ctx.catalog.resolve(EntityKind::Player, name)?;
    tracing::info!(player = %player.display_name, id = player.id, "search");
    sink.send(Artifact::text(FETCHING));

    let seasons = ctx.provider.player_career(player.id)?.season_totals();
    if seasons.is_empty() {
        sink.send(Artifact::text(format!("no stats for {}", player.display_name)));
        return Ok(());
    }
    let table = project(&seasons, PLAYER_CAREER_COLUMNS)?;
    sink.send(Artifact::text(table.to_code_block()));
    Ok(())
}

fn games(ctx: &CommandContext, sink: &mut dyn ReplySink) -> Result<(), CommandError> {
    let lines = ctx.provider.todays_games()?;
    if lines.is_empty() {
        sink.send(Artifact::text(NO_GAMES_TODAY));
        return Ok(());
    }
    tracing::info!(games = lines.len(), "rendering schedule");

    let font = load_font(&ctx.font_path);
    let png = render_schedule_png(&lines, ctx.schedule_offset, &font)
        .map_err(CommandError::Render)?;
    sink.send(Artifact::image(png, SCHEDULE_FILENAME));
    Ok(())
}

fn team(ctx: &CommandContext, name: &str, sink: &mut dyn ReplySink) -> Result<(), CommandError> {
    if name.is_empty() {
        return Err(CommandError::MissingArgument(EntityKind::Team));
    }
    let team = ctx.catalog.resolve(EntityKind::Team, name)?;
    tracing::info!(team = %team.display_name, id = team.id, "team");
    sink.send(Artifact::text(FETCHING));

    let games = ctx.provider.team_games(team.id)?;
    if games.is_empty() {
        sink.send(Artifact::text(format!(
            "no recent games for {}",
            team.display_name
        )));
        return Ok(());
    }
    let table = project(&games.head(RECENT_GAMES), TEAM_RECENT_COLUMNS)?;
    sink.send(Artifact::text(table.to_code_block()));

    // The table is already out; anything failing from here on is a drawing problem.
    let series = ChartSeries::from_table(&table, "GAME_DATE", "PTS")
        .map_err(|err| CommandError::Render(err.into()))?;
    let font = load_font(&ctx.font_path);
    let chart = render_chart(&series, &chart_title(&team.display_name), &font)
        .map_err(CommandError::Render)?;
    sink.send(Artifact::image(chart.png, CHART_FILENAME));
    Ok(())
}

pub fn help_text(prefix: &str) -> String {
    [
        format!("{prefix}search <player name>   season totals (GP, GS, PTS)"),
        format!("{prefix}games                  today's schedule as an image"),
        format!("{prefix}team <team name>       last 5 games plus a points chart"),
        format!("{prefix}help                   this list"),
    ]
    .join("\n")
}
