use std::fmt;

use once_cell::sync::OnceCell;
use thiserror::Error;

use crate::config::CatalogSource;
use crate::stats_fetch::StatsProvider;

static CATALOG: OnceCell<Catalog> = OnceCell::new();

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Player,
    Team,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityKind::Player => f.write_str("player"),
            EntityKind::Team => f.write_str("team"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entity {
    pub kind: EntityKind,
    pub id: u32,
    pub display_name: String,
    /// Last season (start year) the entity was active in, when known.
    pub last_active: Option<u16>,
}

impl Entity {
    pub fn player(id: u32, name: impl Into<String>, last_active: Option<u16>) -> Self {
        Self {
            kind: EntityKind::Player,
            id,
            display_name: name.into(),
            last_active,
        }
    }

    pub fn team(id: u32, name: impl Into<String>) -> Self {
        Self {
            kind: EntityKind::Team,
            id,
            display_name: name.into(),
            last_active: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    #[error("no {kind} named {name:?}")]
    NotFound { kind: EntityKind, name: String },
    #[error("{} {kind}s named {name:?}", candidates.len())]
    Ambiguous {
        kind: EntityKind,
        name: String,
        candidates: Vec<u32>,
    },
}

#[derive(Debug, Clone, Default)]
pub struct Catalog {
    players: Vec<Entity>,
    teams: Vec<Entity>,
}

impl Catalog {
    pub fn new(players: Vec<Entity>, teams: Vec<Entity>) -> Self {
        Self { players, teams }
    }

    pub fn embedded() -> Self {
        Self::new(embedded_players(), embedded_teams())
    }

    pub fn players(&self) -> &[Entity] {
        &self.players
    }

    pub fn teams(&self) -> &[Entity] {
        &self.teams
    }

    fn entries(&self, kind: EntityKind) -> &[Entity] {
        match kind {
            EntityKind::Player => &self.players,
            EntityKind::Team => &self.teams,
        }
    }

    /// Exact, case-sensitive lookup on the full display name.
    ///
    /// Duplicate names resolve to the most recently active entity. When that
    /// does not single one out the lookup fails with `Ambiguous` instead of
    /// guessing.
    pub fn resolve(&self, kind: EntityKind, raw_name: &str) -> Result<&Entity, ResolveError> {
        let matches: Vec<&Entity> = self
            .entries(kind)
            .iter()
            .filter(|e| e.display_name == raw_name)
            .collect();

        match matches.as_slice() {
            [] => Err(ResolveError::NotFound {
                kind,
                name: raw_name.to_string(),
            }),
            [only] => Ok(only),
            many => {
                let newest = many.iter().filter_map(|e| e.last_active).max();
                let leaders: Vec<&Entity> = match newest {
                    Some(year) => many
                        .iter()
                        .copied()
                        .filter(|e| e.last_active == Some(year))
                        .collect(),
                    None => many.to_vec(),
                };
                if let [winner] = leaders.as_slice() {
                    tracing::debug!(
                        name = raw_name,
                        id = winner.id,
                        duplicates = many.len(),
                        "duplicate catalog name resolved to most recently active"
                    );
                    return Ok(winner);
                }
                Err(ResolveError::Ambiguous {
                    kind,
                    name: raw_name.to_string(),
                    candidates: leaders.iter().map(|e| e.id).collect(),
                })
            }
        }
    }
}

/// Installs the process-wide catalog. The first call wins; later calls return
/// the already installed instance.
pub fn install(catalog: Catalog) -> &'static Catalog {
    let mut fresh = Some(catalog);
    let installed = CATALOG.get_or_init(|| fresh.take().unwrap_or_default());
    if fresh.is_some() {
        tracing::warn!("catalog already installed; ignoring replacement");
    }
    installed
}

pub fn global() -> Option<&'static Catalog> {
    CATALOG.get()
}

/// Builds the startup catalog. Teams always come from the franchise table;
/// players come from the provider index when asked, falling back to the seed
/// list if that fails or comes back empty.
pub fn build_catalog(source: CatalogSource, provider: &dyn StatsProvider) -> Catalog {
    let players = match source {
        CatalogSource::Embedded => embedded_players(),
        CatalogSource::Provider => match provider.player_index() {
            Ok(players) if !players.is_empty() => {
                tracing::info!(players = players.len(), "player catalog loaded from provider");
                players
            }
            Ok(_) => {
                tracing::warn!("provider player index is empty; using seed list");
                embedded_players()
            }
            Err(err) => {
                tracing::warn!(error = %err, "player index fetch failed; using seed list");
                embedded_players()
            }
        },
    };
    Catalog::new(players, embedded_teams())
}

pub fn embedded_teams() -> Vec<Entity> {
    NBA_TEAMS
        .iter()
        .map(|(id, name)| Entity::team(*id, *name))
        .collect()
}

pub fn embedded_players() -> Vec<Entity> {
    SEED_PLAYERS
        .iter()
        .map(|(id, name, last)| Entity::player(*id, *name, Some(*last)))
        .collect()
}

const NBA_TEAMS: &[(u32, &str)] = &[
    (1610612737, "Atlanta Hawks"),
    (1610612738, "Boston Celtics"),
    (1610612739, "Cleveland Cavaliers"),
    (1610612740, "New Orleans Pelicans"),
    (1610612741, "Chicago Bulls"),
    (1610612742, "Dallas Mavericks"),
    (1610612743, "Denver Nuggets"),
    (1610612744, "Golden State Warriors"),
    (1610612745, "Houston Rockets"),
    (1610612746, "Los Angeles Clippers"),
    (1610612747, "Los Angeles Lakers"),
    (1610612748, "Miami Heat"),
    (1610612749, "Milwaukee Bucks"),
    (1610612750, "Minnesota Timberwolves"),
    (1610612751, "Brooklyn Nets"),
    (1610612752, "New York Knicks"),
    (1610612753, "Orlando Magic"),
    (1610612754, "Indiana Pacers"),
    (1610612755, "Philadelphia 76ers"),
    (1610612756, "Phoenix Suns"),
    (1610612757, "Portland Trail Blazers"),
    (1610612758, "Sacramento Kings"),
    (1610612759, "San Antonio Spurs"),
    (1610612760, "Oklahoma City Thunder"),
    (1610612761, "Toronto Raptors"),
    (1610612762, "Utah Jazz"),
    (1610612763, "Memphis Grizzlies"),
    (1610612764, "Washington Wizards"),
    (1610612765, "Detroit Pistons"),
    (1610612766, "Charlotte Hornets"),
];

// Used when the provider's player index is not loaded.
const SEED_PLAYERS: &[(u32, &str, u16)] = &[
    (2544, "LeBron James", 2024),
    (201939, "Stephen Curry", 2024),
    (201142, "Kevin Durant", 2024),
    (203507, "Giannis Antetokounmpo", 2024),
    (203999, "Nikola Jokić", 2024),
    (1629029, "Luka Dončić", 2024),
    (203954, "Joel Embiid", 2024),
    (1628369, "Jayson Tatum", 2024),
    (1627759, "Jaylen Brown", 2024),
    (202695, "Kawhi Leonard", 2024),
    (201935, "James Harden", 2024),
    (203076, "Anthony Davis", 2024),
    (203081, "Damian Lillard", 2024),
    (1626164, "Devin Booker", 2024),
    (202710, "Jimmy Butler", 2024),
    (202681, "Kyrie Irving", 2024),
    (1628983, "Shai Gilgeous-Alexander", 2024),
    (1641705, "Victor Wembanyama", 2024),
    (1630162, "Anthony Edwards", 2024),
    (1629630, "Ja Morant", 2024),
    (1629027, "Trae Young", 2024),
    (1629627, "Zion Williamson", 2024),
    (101108, "Chris Paul", 2024),
    (201566, "Russell Westbrook", 2024),
    (202331, "Paul George", 2024),
    (202691, "Klay Thompson", 2024),
    (203110, "Draymond Green", 2024),
    (1626157, "Karl-Anthony Towns", 2024),
    (1628378, "Donovan Mitchell", 2024),
    (1628389, "Bam Adebayo", 2024),
    (1627734, "Domantas Sabonis", 2024),
    (1630169, "Tyrese Haliburton", 2024),
    (1628368, "De'Aaron Fox", 2024),
    (1631094, "Paolo Banchero", 2024),
    (893, "Michael Jordan", 2002),
    (977, "Kobe Bryant", 2015),
    (1495, "Tim Duncan", 2015),
    (1717, "Dirk Nowitzki", 2018),
    (406, "Shaquille O'Neal", 2010),
    (708, "Kevin Garnett", 2015),
    (2548, "Dwyane Wade", 2018),
    (2546, "Carmelo Anthony", 2021),
    (2547, "Chris Bosh", 2016),
];
