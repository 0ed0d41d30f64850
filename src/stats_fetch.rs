use std::collections::HashSet;
use std::time::Duration;

use reqwest::blocking::Client;
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

use crate::catalog::Entity;
use crate::config::{BotConfig, ProviderKind};
use crate::demo_feed::DemoProvider;
use crate::http_client::build_http_client;

pub const PLAYER_SEASONS_SET: &str = "SeasonTotalsRegularSeason";
pub const TEAM_GAMES_SET: &str = "LeagueGameFinderResults";
pub const PLAYER_INDEX_SET: &str = "CommonAllPlayers";

const TRADED_TOTAL: &str = "TOT";

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("{endpoint} request failed: {source}")]
    Transport {
        endpoint: &'static str,
        #[source]
        source: reqwest::Error,
    },
    #[error("{endpoint} returned http {status}")]
    Status {
        endpoint: &'static str,
        status: u16,
    },
    #[error("invalid {endpoint} json: {source}")]
    Decode {
        endpoint: &'static str,
        #[source]
        source: serde_json::Error,
    },
    #[error("result set {0} missing from payload")]
    MissingResultSet(String),
    #[error("unexpected payload shape: {0}")]
    Schema(String),
}

/// One result set as the stats endpoints return it: a header row plus rows
/// of loosely typed cells.
#[derive(Debug, Clone, PartialEq)]
pub struct RawDataset {
    pub name: String,
    pub headers: Vec<String>,
    pub rows: Vec<Vec<Value>>,
}

impl RawDataset {
    pub fn column_index(&self, field: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == field)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// First `n` rows, keeping the provider's order.
    pub fn head(&self, n: usize) -> RawDataset {
        RawDataset {
            name: self.name.clone(),
            headers: self.headers.clone(),
            rows: self.rows.iter().take(n).cloned().collect(),
        }
    }

    /// Season totals list a player traded mid-season once per team plus a
    /// `TOT` row. Keeps only the `TOT` row for those seasons; datasets without
    /// season or team columns come back unchanged.
    pub fn season_totals(&self) -> RawDataset {
        let (Some(season_idx), Some(team_idx)) = (
            self.column_index("SEASON_ID"),
            self.column_index("TEAM_ABBREVIATION"),
        ) else {
            return self.clone();
        };
        let is_total = |row: &Vec<Value>| row[team_idx].as_str() == Some(TRADED_TOTAL);
        let traded: HashSet<String> = self
            .rows
            .iter()
            .filter(|row| is_total(row))
            .map(|row| row[season_idx].to_string())
            .collect();

        RawDataset {
            name: self.name.clone(),
            headers: self.headers.clone(),
            rows: self
                .rows
                .iter()
                .filter(|row| is_total(row) || !traded.contains(&row[season_idx].to_string()))
                .cloned()
                .collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduleLine {
    pub time_utc: String,
    pub home_team: String,
    pub away_team: String,
}

pub trait StatsProvider: Send + Sync {
    fn player_career(&self, player_id: u32) -> Result<RawDataset, ProviderError>;
    fn team_games(&self, team_id: u32) -> Result<RawDataset, ProviderError>;
    fn todays_games(&self) -> Result<Vec<ScheduleLine>, ProviderError>;
    fn player_index(&self) -> Result<Vec<Entity>, ProviderError>;
}

pub fn provider_from_config(config: &BotConfig) -> anyhow::Result<Box<dyn StatsProvider>> {
    Ok(match config.provider {
        ProviderKind::Nba => Box::new(NbaStatsProvider::new(config)?),
        ProviderKind::Demo => Box::new(DemoProvider::default()),
    })
}

pub struct NbaStatsProvider {
    client: Client,
    stats_base_url: String,
    live_base_url: String,
    season: String,
}

impl NbaStatsProvider {
    pub fn new(config: &BotConfig) -> anyhow::Result<Self> {
        Self::with_urls(
            &config.stats_base_url,
            &config.live_base_url,
            &config.season,
            config.request_timeout,
        )
    }

    pub fn with_urls(
        stats_base_url: &str,
        live_base_url: &str,
        season: &str,
        timeout: Duration,
    ) -> anyhow::Result<Self> {
        Ok(Self {
            client: build_http_client(timeout)?,
            stats_base_url: stats_base_url.trim_end_matches('/').to_string(),
            live_base_url: live_base_url.trim_end_matches('/').to_string(),
            season: season.to_string(),
        })
    }

    fn get(&self, endpoint: &'static str, url: &str) -> Result<String, ProviderError> {
        tracing::debug!(endpoint, url, "provider request");
        let resp = self
            .client
            .get(url)
            .send()
            .map_err(|source| ProviderError::Transport { endpoint, source })?;
        let status = resp.status();
        if !status.is_success() {
            return Err(ProviderError::Status {
                endpoint,
                status: status.as_u16(),
            });
        }
        resp.text()
            .map_err(|source| ProviderError::Transport { endpoint, source })
    }
}

impl StatsProvider for NbaStatsProvider {
    fn player_career(&self, player_id: u32) -> Result<RawDataset, ProviderError> {
        let url = format!(
            "{}/playercareerstats?PlayerID={player_id}&PerMode=Totals&LeagueID=00",
            self.stats_base_url
        );
        let body = self.get("playercareerstats", &url)?;
        parse_result_set_json("playercareerstats", &body, PLAYER_SEASONS_SET)
    }

    fn team_games(&self, team_id: u32) -> Result<RawDataset, ProviderError> {
        let url = format!(
            "{}/leaguegamefinder?PlayerOrTeam=T&TeamID={team_id}&LeagueID=00",
            self.stats_base_url
        );
        let body = self.get("leaguegamefinder", &url)?;
        parse_result_set_json("leaguegamefinder", &body, TEAM_GAMES_SET)
    }

    fn todays_games(&self) -> Result<Vec<ScheduleLine>, ProviderError> {
        let url = format!(
            "{}/scoreboard/todaysScoreboard_00.json",
            self.live_base_url
        );
        let body = self.get("scoreboard", &url)?;
        parse_scoreboard_json(&body)
    }

    fn player_index(&self) -> Result<Vec<Entity>, ProviderError> {
        let url = format!(
            "{}/commonallplayers?LeagueID=00&Season={}&IsOnlyCurrentSeason=0",
            self.stats_base_url, self.season
        );
        let body = self.get("commonallplayers", &url)?;
        let set = parse_result_set_json("commonallplayers", &body, PLAYER_INDEX_SET)?;
        players_from_index(&set)
    }
}

#[derive(Debug, Deserialize)]
struct StatsResponse {
    #[serde(rename = "resultSets", alias = "resultSet", default)]
    result_sets: ResultSets,
}

// Most endpoints return a list, a few return a single object.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ResultSets {
    Many(Vec<ResultSetPayload>),
    One(ResultSetPayload),
}

impl Default for ResultSets {
    fn default() -> Self {
        ResultSets::Many(Vec::new())
    }
}

#[derive(Debug, Deserialize)]
struct ResultSetPayload {
    name: String,
    #[serde(default)]
    headers: Vec<String>,
    #[serde(rename = "rowSet", default)]
    row_set: Vec<Vec<Value>>,
}

/// Pulls the named result set out of a stats.nba.com response body.
pub fn parse_result_set_json(
    endpoint: &'static str,
    raw: &str,
    set_name: &str,
) -> Result<RawDataset, ProviderError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed == "null" {
        return Err(ProviderError::MissingResultSet(set_name.to_string()));
    }
    let parsed: StatsResponse = serde_json::from_str(trimmed)
        .map_err(|source| ProviderError::Decode { endpoint, source })?;
    let sets = match parsed.result_sets {
        ResultSets::Many(sets) => sets,
        ResultSets::One(set) => vec![set],
    };
    let set = sets
        .into_iter()
        .find(|s| s.name == set_name)
        .ok_or_else(|| ProviderError::MissingResultSet(set_name.to_string()))?;

    let width = set.headers.len();
    if let Some(bad) = set.row_set.iter().position(|row| row.len() != width) {
        return Err(ProviderError::Schema(format!(
            "{set_name} row {bad} has {} cells, expected {width}",
            set.row_set[bad].len()
        )));
    }

    Ok(RawDataset {
        name: set.name,
        headers: set.headers,
        rows: set.row_set,
    })
}

#[derive(Debug, Deserialize)]
struct ScoreboardResponse {
    scoreboard: Option<Scoreboard>,
}

#[derive(Debug, Deserialize)]
struct Scoreboard {
    #[serde(default)]
    games: Vec<ScoreboardGame>,
}

#[derive(Debug, Deserialize)]
struct ScoreboardGame {
    #[serde(rename = "gameTimeUTC")]
    game_time_utc: String,
    #[serde(rename = "homeTeam")]
    home_team: ScoreboardTeam,
    #[serde(rename = "awayTeam")]
    away_team: ScoreboardTeam,
}

#[derive(Debug, Deserialize)]
struct ScoreboardTeam {
    #[serde(rename = "teamName")]
    team_name: String,
}

/// Today's games in listing order. No games is an empty list, not an error.
pub fn parse_scoreboard_json(raw: &str) -> Result<Vec<ScheduleLine>, ProviderError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed == "null" {
        return Ok(Vec::new());
    }
    let parsed: ScoreboardResponse =
        serde_json::from_str(trimmed).map_err(|source| ProviderError::Decode {
            endpoint: "scoreboard",
            source,
        })?;
    let Some(board) = parsed.scoreboard else {
        return Err(ProviderError::Schema("scoreboard object missing".to_string()));
    };
    Ok(board
        .games
        .into_iter()
        .map(|g| ScheduleLine {
            time_utc: g.game_time_utc,
            home_team: g.home_team.team_name,
            away_team: g.away_team.team_name,
        })
        .collect())
}

pub fn players_from_index(set: &RawDataset) -> Result<Vec<Entity>, ProviderError> {
    let field = |name: &str| {
        set.column_index(name)
            .ok_or_else(|| ProviderError::Schema(format!("{} lacks {name}", set.name)))
    };
    let id_idx = field("PERSON_ID")?;
    let name_idx = field("DISPLAY_FIRST_LAST")?;
    let to_year_idx = set.column_index("TO_YEAR");

    let mut players = Vec::with_capacity(set.rows.len());
    for row in &set.rows {
        let Some(id) = value_as_u32(&row[id_idx]) else {
            continue;
        };
        let Some(name) = row[name_idx].as_str().map(str::trim).filter(|n| !n.is_empty()) else {
            continue;
        };
        let last_active = to_year_idx
            .and_then(|i| value_as_u32(&row[i]))
            .and_then(|y| u16::try_from(y).ok());
        players.push(Entity::player(id, name, last_active));
    }
    Ok(players)
}

// Ids and years arrive as numbers or numeric strings depending on endpoint.
fn value_as_u32(value: &Value) -> Option<u32> {
    match value {
        Value::Number(n) => n.as_u64().and_then(|v| u32::try_from(v).ok()),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}
