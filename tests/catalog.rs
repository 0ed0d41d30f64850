use courtside::catalog::{Catalog, Entity, EntityKind, ResolveError, build_catalog};
use courtside::config::{BotConfig, CatalogSource};
use courtside::stats_fetch::{ProviderError, RawDataset, ScheduleLine, StatsProvider};

struct IndexOnly(Result<Vec<Entity>, ()>);

impl StatsProvider for IndexOnly {
    fn player_career(&self, _: u32) -> Result<RawDataset, ProviderError> {
        Err(ProviderError::Schema("unused".into()))
    }

    fn team_games(&self, _: u32) -> Result<RawDataset, ProviderError> {
        Err(ProviderError::Schema("unused".into()))
    }

    fn todays_games(&self) -> Result<Vec<ScheduleLine>, ProviderError> {
        Ok(Vec::new())
    }

    fn player_index(&self) -> Result<Vec<Entity>, ProviderError> {
        self.0
            .clone()
            .map_err(|_| ProviderError::Status { endpoint: "commonallplayers", status: 503 })
    }
}

#[test]
fn every_embedded_name_resolves_to_itself() {
    let catalog = Catalog::embedded();
    for kind in [EntityKind::Player, EntityKind::Team] {
        let entries = match kind {
            EntityKind::Player => catalog.players(),
            EntityKind::Team => catalog.teams(),
        };
        for entity in entries {
            let hit = catalog
                .resolve(kind, &entity.display_name)
                .expect("catalog names should resolve");
            assert_eq!(hit.id, entity.id);
            assert_eq!(hit.kind, kind);
        }
    }
}

#[test]
fn lookup_is_exact_and_case_sensitive() {
    let catalog = Catalog::embedded();
    for name in ["Boston", "boston celtics", "Boston Celtics ", "Celtics"] {
        assert!(matches!(
            catalog.resolve(EntityKind::Team, name),
            Err(ResolveError::NotFound { kind: EntityKind::Team, .. })
        ));
    }
    assert!(catalog.resolve(EntityKind::Team, "Boston Celtics").is_ok());
}

#[test]
fn players_and_teams_do_not_mix() {
    let catalog = Catalog::embedded();
    assert!(catalog.resolve(EntityKind::Player, "Boston Celtics").is_err());
    assert!(catalog.resolve(EntityKind::Team, "LeBron James").is_err());
}

#[test]
fn provider_catalog_uses_the_index() {
    let provider = IndexOnly(Ok(vec![Entity::player(42, "Test Player", Some(2024))]));
    let catalog = build_catalog(CatalogSource::Provider, &provider);
    assert_eq!(catalog.players().len(), 1);
    assert_eq!(catalog.teams().len(), 30);
}

#[test]
fn provider_catalog_falls_back_to_seed_list() {
    let seed = Catalog::embedded().players().len();

    let failing = IndexOnly(Err(()));
    assert_eq!(build_catalog(CatalogSource::Provider, &failing).players().len(), seed);

    let empty = IndexOnly(Ok(Vec::new()));
    assert_eq!(build_catalog(CatalogSource::Provider, &empty).players().len(), seed);
}

#[test]
fn embedded_source_never_asks_the_provider() {
    let provider = IndexOnly(Ok(vec![Entity::player(42, "Test Player", Some(2024))]));
    let catalog = build_catalog(CatalogSource::Embedded, &provider);
    assert!(catalog.resolve(EntityKind::Player, "Test Player").is_err());
}

#[test]
fn default_config_resolves_players_beyond_the_seed_list() {
    let provider = IndexOnly(Ok(vec![
        Entity::player(1630178, "Tyrese Maxey", Some(2024)),
        Entity::player(78049, "Bill Russell", Some(1968)),
    ]));
    let catalog = build_catalog(BotConfig::default().catalog_source, &provider);
    for name in ["Tyrese Maxey", "Bill Russell"] {
        assert!(
            Catalog::embedded().resolve(EntityKind::Player, name).is_err(),
            "{name} should not be in the seed list"
        );
        assert!(catalog.resolve(EntityKind::Player, name).is_ok(), "{name} should resolve");
    }
}
