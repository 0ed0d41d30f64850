use std::env;
use std::path::PathBuf;
use std::time::Duration;

use chrono::{Datelike, FixedOffset, Utc};

const DEFAULT_STATS_BASE_URL: &str = "https://stats.nba.com/stats";
const DEFAULT_LIVE_BASE_URL: &str = "https://cdn.nba.com/static/json/liveData";
const DEFAULT_FONT_PATH: &str = "arial.ttf";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderKind {
    Nba,
    Demo,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CatalogSource {
    Embedded,
    Provider,
}

impl CatalogSource {
    /// The live provider serves the full player index; the demo feed only
    /// knows the seed list anyway.
    pub fn default_for(provider: ProviderKind) -> Self {
        match provider {
            ProviderKind::Nba => CatalogSource::Provider,
            ProviderKind::Demo => CatalogSource::Embedded,
        }
    }
}

#[derive(Debug, Clone)]
pub struct BotConfig {
    pub prefix: String,
    pub provider: ProviderKind,
    pub catalog_source: CatalogSource,
    pub stats_base_url: String,
    pub live_base_url: String,
    pub request_timeout: Duration,
    pub font_path: PathBuf,
    pub schedule_utc_offset: Option<FixedOffset>,
    pub workers: usize,
    pub season: String,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            prefix: "!".to_string(),
            provider: ProviderKind::Nba,
            catalog_source: CatalogSource::default_for(ProviderKind::Nba),
            stats_base_url: DEFAULT_STATS_BASE_URL.to_string(),
            live_base_url: DEFAULT_LIVE_BASE_URL.to_string(),
            request_timeout: Duration::from_secs(30),
            font_path: PathBuf::from(DEFAULT_FONT_PATH),
            schedule_utc_offset: None,
            workers: 4,
            season: current_season(),
        }
    }
}

impl BotConfig {
    /// Reads settings from the process environment. Call `dotenvy` first if
    /// `.env` files should be honoured.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let prefix = env_string("COMMAND_PREFIX").unwrap_or(defaults.prefix);
        let provider = match env_string("STATS_PROVIDER")
            .map(|v| v.to_lowercase())
            .as_deref()
        {
            Some("demo") | Some("fake") => ProviderKind::Demo,
            _ => ProviderKind::Nba,
        };
        let catalog_source = match env_string("CATALOG_SOURCE")
            .map(|v| v.to_lowercase())
            .as_deref()
        {
            Some("provider") | Some("remote") => CatalogSource::Provider,
            Some("embedded") | Some("seed") => CatalogSource::Embedded,
            _ => CatalogSource::default_for(provider),
        };
        let request_timeout = Duration::from_secs(
            env::var("REQUEST_TIMEOUT_SECS")
                .ok()
                .and_then(|val| val.parse::<u64>().ok())
                .unwrap_or(30)
                .clamp(5, 120),
        );
        let workers = env::var("DISPATCH_WORKERS")
            .ok()
            .and_then(|val| val.parse::<usize>().ok())
            .unwrap_or(defaults.workers)
            .clamp(1, 32);

        Self {
            prefix,
            provider,
            catalog_source,
            stats_base_url: env_string("NBA_STATS_BASE_URL")
                .map(|v| v.trim_end_matches('/').to_string())
                .unwrap_or(defaults.stats_base_url),
            live_base_url: env_string("NBA_LIVE_BASE_URL")
                .map(|v| v.trim_end_matches('/').to_string())
                .unwrap_or(defaults.live_base_url),
            request_timeout,
            font_path: env_string("FONT_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.font_path),
            schedule_utc_offset: env_string("SCHEDULE_UTC_OFFSET")
                .and_then(|v| parse_utc_offset(&v)),
            workers,
            season: env_string("NBA_SEASON").unwrap_or(defaults.season),
        }
    }
}

fn env_string(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Parses `+08:00`, `-0530` or `UTC`.
pub fn parse_utc_offset(raw: &str) -> Option<FixedOffset> {
    let raw = raw.trim();
    if raw.eq_ignore_ascii_case("utc") || raw.eq_ignore_ascii_case("z") {
        return FixedOffset::east_opt(0);
    }
    let (sign, rest) = match raw.as_bytes().first()? {
        b'+' => (1, &raw[1..]),
        b'-' => (-1, &raw[1..]),
        _ => return None,
    };
    let digits: String = rest.chars().filter(|c| *c != ':').collect();
    if digits.len() != 4 || !digits.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    let hours: i32 = digits[..2].parse().ok()?;
    let minutes: i32 = digits[2..].parse().ok()?;
    if hours > 14 || minutes > 59 {
        return None;
    }
    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60))
}

/// NBA seasons start in October, so January 2025 belongs to "2024-25".
pub fn current_season() -> String {
    let today = Utc::now().date_naive();
    let start = if today.month() >= 10 {
        today.year()
    } else {
        today.year() - 1
    };
    season_label(start)
}

pub fn season_label(start_year: i32) -> String {
    format!("{}-{:02}", start_year, (start_year + 1).rem_euclid(100))
}
