//! Long-running world tests with the consistency suite armed.

use orbis_core::{
    EducationLevel, Occupation, PollutionLevels, Position, ProductionFacility, Resource,
    ResourcePhase, StorageLoad, World, create_population,
};

const FOOD: &str = "Agricultural Product";
const LAND: &str = "Arable Land";
const GOODS: &str = "Consumer Goods";

fn economy_world() -> (World, orbis_core::AgentId, orbis_core::AgentId, orbis_core::PlanetId) {
    let mut world = World::new();
    world.set_debug_checks(true);

    world
        .register_resource(
            Resource::storable(FOOD, ResourcePhase::FrozenGoods, 1.0, 1.0).unwrap(),
        )
        .unwrap();
    world
        .register_resource(Resource::land_bound(LAND))
        .unwrap();
    world
        .register_resource(Resource::storable(GOODS, ResourcePhase::Pieces, 1.0, 1.0).unwrap())
        .unwrap();

    let government = world.add_agent("Civic Authority");
    let planet = world
        .add_planet(
            "Meridian",
            Position::new(0.0, 0.0, 0.0),
            government,
            create_population(50_000),
        )
        .unwrap();
    world
        .ensure_assets(government, planet, StorageLoad::new(1e9, 1e9), 1.0)
        .unwrap();

    let corp = world.add_agent("Meridian Goods Co");
    world
        .ensure_assets(corp, planet, StorageLoad::new(1e7, 1e7), 1.0)
        .unwrap();
    world
        .add_facility(
            corp,
            planet,
            ProductionFacility::new("Goods Works", 2.0)
                .unwrap()
                .with_workers(EducationLevel::None, 30)
                .with_workers(EducationLevel::Primary, 10)
                .with_need(LAND, 5.0)
                .with_output(GOODS, 8.0)
                .with_pollution(PollutionLevels::new(0.1, 0.0, 0.02)),
        )
        .unwrap();

    let claim = world.add_claim(planet, LAND, 1_000.0, 10.0, 2_000.0).unwrap();
    world.claim_mut(planet, LAND, claim).unwrap().tenant = Some(corp);

    (world, government, corp, planet)
}

/// A fed two-agent economy runs a hundred ticks (three month boundaries)
/// with the invariant suite checking every stage of every tick.
#[test]
fn economy_holds_invariants_over_hundred_ticks() {
    let (mut world, government, corp, planet) = economy_world();
    let food = Resource::storable(FOOD, ResourcePhase::FrozenGoods, 1.0, 1.0).unwrap();

    for _ in 0..100 {
        world
            .agent_assets_mut(government, planet)
            .unwrap()
            .storage
            .put(&food, 200.0);
        world.run_tick().expect("invariant violated");
    }

    // The corporation actually staffed its facility and produced.
    let assets = world.agent_assets(corp, planet).unwrap();
    let active: u64 = EducationLevel::ALL
        .into_iter()
        .map(|edu| assets.workforce.active_total(edu))
        .sum();
    assert!(active > 0, "nobody was hired");
    assert!(assets.storage.stored(GOODS) > 0.0, "nothing was produced");
    let results = assets.production_facilities[0]
        .last_tick_results
        .as_ref()
        .unwrap();
    assert!(results.overall_efficiency > 0.0);

    // Fed population: no starvation built up.
    assert_eq!(world.planets[planet].population.starvation_level, 0.0);

    // Pollution accumulated from production and nothing else.
    assert!(world.planets[planet].environment.pollution.air > 0.0);

    // Land claim stayed within its bounds under extraction plus regrowth.
    let claims = &world.planets[planet].resources[LAND];
    assert!(claims[0].quantity >= 0.0);
    assert!(claims[0].quantity <= claims[0].maximum_capacity);
}

/// The workforce books never claim more people than the population book
/// holds, education level by education level.
#[test]
fn workforce_never_exceeds_population() {
    let (mut world, government, _corp, planet) = economy_world();
    let food = Resource::storable(FOOD, ResourcePhase::FrozenGoods, 1.0, 1.0).unwrap();

    for _ in 0..50 {
        world
            .agent_assets_mut(government, planet)
            .unwrap()
            .storage
            .put(&food, 200.0);
        world.run_tick().unwrap();

        for edu in EducationLevel::ALL {
            let booked: u64 = world
                .agents
                .values()
                .filter_map(|a| a.assets.get(&planet))
                .map(|a| a.workforce.booked_total(edu))
                .sum();
            let population = &world.planets[planet].population;
            let employed = population.employable_total(edu, Occupation::Company)
                + population.employable_total(edu, Occupation::Government);
            assert!(
                booked <= employed,
                "booked {booked} exceeds employed {employed} at {edu:?}"
            );
        }
    }
}

/// Storage parity is exact after sustained mixed traffic.
#[test]
fn storage_totals_match_contents_exactly() {
    let (mut world, government, corp, planet) = economy_world();
    let food = Resource::storable(FOOD, ResourcePhase::FrozenGoods, 1.0, 1.0).unwrap();

    for _ in 0..60 {
        world
            .agent_assets_mut(government, planet)
            .unwrap()
            .storage
            .put(&food, 150.0);
        world.run_tick().unwrap();
    }

    for agent in [government, corp] {
        let storage = &world.agent_assets(agent, planet).unwrap().storage;
        let content = storage.content_load();
        assert_eq!(storage.current.volume, content.volume);
        assert_eq!(storage.current.mass, content.mass);
    }
}
