use chrono::{Datelike, Duration as ChronoDuration, NaiveDate, Utc};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde_json::{Value, json};

use crate::catalog::{Entity, embedded_players, embedded_teams};
use crate::stats_fetch::{
    PLAYER_SEASONS_SET, ProviderError, RawDataset, ScheduleLine, StatsProvider, TEAM_GAMES_SET,
};

const CAREER_HEADERS: &[&str] = &[
    "PLAYER_ID",
    "SEASON_ID",
    "LEAGUE_ID",
    "TEAM_ID",
    "TEAM_ABBREVIATION",
    "PLAYER_AGE",
    "GP",
    "GS",
    "MIN",
    "FGM",
    "FGA",
    "FG_PCT",
    "FG3M",
    "FG3A",
    "FG3_PCT",
    "FTM",
    "FTA",
    "FT_PCT",
    "OREB",
    "DREB",
    "REB",
    "AST",
    "STL",
    "BLK",
    "TOV",
    "PF",
    "PTS",
];

const GAME_HEADERS: &[&str] = &[
    "SEASON_ID",
    "TEAM_ID",
    "TEAM_ABBREVIATION",
    "TEAM_NAME",
    "GAME_ID",
    "GAME_DATE",
    "MATCHUP",
    "WL",
    "MIN",
    "PTS",
    "FGM",
    "FGA",
    "FG_PCT",
    "FG3M",
    "FG3A",
    "FG3_PCT",
    "FTM",
    "FTA",
    "FT_PCT",
    "OREB",
    "DREB",
    "REB",
    "AST",
    "STL",
    "BLK",
    "TOV",
    "PF",
    "PLUS_MINUS",
];

/// Offline provider with deterministic synthetic numbers. The same id always
/// yields the same dataset; the schedule changes once per day.
pub struct DemoProvider {
    teams: Vec<Entity>,
    players: Vec<Entity>,
    today: NaiveDate,
}

impl Default for DemoProvider {
    fn default() -> Self {
        Self::new(Utc::now().date_naive())
    }
}

impl DemoProvider {
    pub fn new(today: NaiveDate) -> Self {
        Self {
            teams: embedded_teams(),
            players: embedded_players(),
            today,
        }
    }

    fn team(&self, team_id: u32) -> Option<&Entity> {
        self.teams.iter().find(|t| t.id == team_id)
    }
}

impl StatsProvider for DemoProvider {
    fn player_career(&self, player_id: u32) -> Result<RawDataset, ProviderError> {
        let mut rng = StdRng::seed_from_u64(u64::from(player_id));
        let last_season = self
            .players
            .iter()
            .find(|p| p.id == player_id)
            .and_then(|p| p.last_active)
            .map(i32::from)
            .unwrap_or(self.today.year() - 1);
        let seasons = rng.gen_range(2..=8);
        let team = self
            .teams
            .choose(&mut rng)
            .ok_or_else(|| ProviderError::Schema("demo team table is empty".to_string()))?;
        let abbrev = tricode(&team.display_name);
        let mut age = rng.gen_range(19..=24) as f64;

        let mut rows = Vec::with_capacity(seasons);
        for offset in (0..seasons).rev() {
            let start = last_season - offset as i32;
            let gp: u32 = rng.gen_range(40..=82);
            let gs: u32 = rng.gen_range(gp / 2..=gp);
            let min = gp * rng.gen_range(24..=38);
            let fga = gp * rng.gen_range(8..=22);
            let fgm = (fga as f64 * rng.gen_range(0.42..0.56)).round() as u32;
            let fg3a = fga * rng.gen_range(15..=45) / 100;
            let fg3m = ((fg3a as f64 * rng.gen_range(0.30..0.42)).round() as u32).min(fgm);
            let fta = gp * rng.gen_range(2..=9);
            let ftm = (fta as f64 * rng.gen_range(0.68..0.90)).round() as u32;
            let oreb = gp * rng.gen_range(0..=3);
            let dreb = gp * rng.gen_range(2..=8);
            let pts = 2 * fgm + fg3m + ftm;
            rows.push(vec![
                json!(player_id),
                json!(crate::config::season_label(start)),
                json!("00"),
                json!(team.id),
                json!(abbrev),
                json!(age),
                json!(gp),
                json!(gs),
                json!(min),
                json!(fgm),
                json!(fga),
                json!(ratio(fgm, fga)),
                json!(fg3m),
                json!(fg3a),
                json!(ratio(fg3m, fg3a)),
                json!(ftm),
                json!(fta),
                json!(ratio(ftm, fta)),
                json!(oreb),
                json!(dreb),
                json!(oreb + dreb),
                json!(gp * rng.gen_range(1..=9)),
                json!(gp * rng.gen_range(0..=2)),
                json!(gp * rng.gen_range(0..=2)),
                json!(gp * rng.gen_range(1..=4)),
                json!(gp * rng.gen_range(1..=3)),
                json!(pts),
            ]);
            age += 1.0;
        }

        Ok(dataset(PLAYER_SEASONS_SET, CAREER_HEADERS, rows))
    }

    fn team_games(&self, team_id: u32) -> Result<RawDataset, ProviderError> {
        let team = self
            .team(team_id)
            .ok_or_else(|| ProviderError::Schema(format!("unknown team id {team_id}")))?;
        let mut rng = StdRng::seed_from_u64(u64::from(team_id) ^ day_seed(self.today));
        let abbrev = tricode(&team.display_name);
        let season_start = if self.today.month() >= 10 {
            self.today.year()
        } else {
            self.today.year() - 1
        };

        let mut rows = Vec::new();
        let mut date = self.today - ChronoDuration::days(1);
        for game in 0..10u32 {
            let opponent = loop {
                let pick = self
                    .teams
                    .choose(&mut rng)
                    .ok_or_else(|| ProviderError::Schema("demo team table is empty".to_string()))?;
                if pick.id != team_id {
                    break pick;
                }
            };
            let home = rng.gen_bool(0.5);
            let matchup = if home {
                format!("{abbrev} vs. {}", tricode(&opponent.display_name))
            } else {
                format!("{abbrev} @ {}", tricode(&opponent.display_name))
            };
            let fga: u32 = rng.gen_range(78..=95);
            let fgm = (fga as f64 * rng.gen_range(0.40..0.55)).round() as u32;
            let fg3a: u32 = rng.gen_range(28..=45);
            let fg3m = ((fg3a as f64 * rng.gen_range(0.28..0.42)).round() as u32).min(fgm);
            let fta: u32 = rng.gen_range(12..=30);
            let ftm = (fta as f64 * rng.gen_range(0.65..0.88)).round() as u32;
            let oreb: u32 = rng.gen_range(6..=15);
            let dreb: u32 = rng.gen_range(28..=40);
            let pts = 2 * fgm + fg3m + ftm;
            let margin: i32 = rng.gen_range(-18..=18);
            let margin = if margin == 0 { 1 } else { margin };
            rows.push(vec![
                json!(format!("2{season_start}")),
                json!(team_id),
                json!(abbrev),
                json!(team.display_name),
                json!(format!("00{}{:05}", season_start % 100 + 200, 900 - game)),
                json!(date.format("%Y-%m-%d").to_string()),
                json!(matchup),
                json!(if margin > 0 { "W" } else { "L" }),
                json!(240),
                json!(pts),
                json!(fgm),
                json!(fga),
                json!(ratio(fgm, fga)),
                json!(fg3m),
                json!(fg3a),
                json!(ratio(fg3m, fg3a)),
                json!(ftm),
                json!(fta),
                json!(ratio(ftm, fta)),
                json!(oreb),
                json!(dreb),
                json!(oreb + dreb),
                json!(rng.gen_range(18..=34)),
                json!(rng.gen_range(4..=12)),
                json!(rng.gen_range(2..=9)),
                json!(rng.gen_range(8..=19)),
                json!(rng.gen_range(14..=24)),
                json!(margin as f64),
            ]);
            date -= ChronoDuration::days(rng.gen_range(1..=3));
        }

        Ok(dataset(TEAM_GAMES_SET, GAME_HEADERS, rows))
    }

    fn todays_games(&self) -> Result<Vec<ScheduleLine>, ProviderError> {
        let mut rng = StdRng::seed_from_u64(day_seed(self.today));
        let count = rng.gen_range(0..=7usize);
        let mut pool: Vec<&Entity> = self.teams.iter().collect();
        pool.shuffle(&mut rng);

        let tip_off = self
            .today
            .and_hms_opt(23, 0, 0)
            .ok_or_else(|| ProviderError::Schema("invalid demo tip-off".to_string()))?;
        Ok(pool
            .chunks_exact(2)
            .take(count)
            .enumerate()
            .map(|(i, pair)| ScheduleLine {
                time_utc: (tip_off + ChronoDuration::minutes(30 * i as i64))
                    .format("%Y-%m-%dT%H:%M:%SZ")
                    .to_string(),
                home_team: nickname(&pair[0].display_name).to_string(),
                away_team: nickname(&pair[1].display_name).to_string(),
            })
            .collect())
    }

    fn player_index(&self) -> Result<Vec<Entity>, ProviderError> {
        Ok(self.players.clone())
    }
}

fn dataset(name: &str, headers: &[&str], rows: Vec<Vec<Value>>) -> RawDataset {
    RawDataset {
        name: name.to_string(),
        headers: headers.iter().map(|h| (*h).to_string()).collect(),
        rows,
    }
}

fn ratio(made: u32, attempted: u32) -> f64 {
    if attempted == 0 {
        return 0.0;
    }
    ((made as f64 / attempted as f64) * 1000.0).round() / 1000.0
}

fn day_seed(day: NaiveDate) -> u64 {
    day.num_days_from_ce() as u64
}

/// "Portland Trail Blazers" -> "Trail Blazers", "Boston Celtics" -> "Celtics".
pub fn nickname(full_name: &str) -> &str {
    if let Some(idx) = full_name.find("Trail Blazers") {
        return &full_name[idx..];
    }
    full_name.rsplit(' ').next().unwrap_or(full_name)
}

fn tricode(full_name: &str) -> String {
    nickname(full_name)
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .take(3)
        .collect::<String>()
        .to_uppercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nickname_keeps_two_word_names() {
        assert_eq!(nickname("Portland Trail Blazers"), "Trail Blazers");
        assert_eq!(nickname("Philadelphia 76ers"), "76ers");
        assert_eq!(nickname("Boston Celtics"), "Celtics");
    }

    #[test]
    fn team_games_are_newest_first() {
        let provider = DemoProvider::new(NaiveDate::from_ymd_opt(2025, 1, 15).unwrap());
        let set = provider.team_games(1610612738).unwrap();
        let date_idx = set.column_index("GAME_DATE").unwrap();
        let dates: Vec<&str> = set.rows.iter().map(|r| r[date_idx].as_str().unwrap()).collect();
        let mut sorted = dates.clone();
        sorted.sort_unstable_by(|a, b| b.cmp(a));
        assert_eq!(dates, sorted);
    }

    #[test]
    fn same_player_same_numbers() {
        let provider = DemoProvider::new(NaiveDate::from_ymd_opt(2025, 1, 15).unwrap());
        assert_eq!(
            provider.player_career(2544).unwrap(),
            provider.player_career(2544).unwrap()
        );
    }
}
