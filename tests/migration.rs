use empire_sim::{
    components::{Planet, Pop, PopClass, Region},
    config::RulesConfig,
    economy::BasicPlanetEconomy,
    engine::TurnContext,
    events::UnrestEventGenerator,
    rng::ScriptedRng,
    systems::migration::{migrate_pops_between_planets, resolve_migration, MigrationOutcome},
    world::{Calendar, CivId, Civilization, PlanetId, PopId, World},
};

struct Frontier {
    world: World,
    civ: CivId,
    origin: PlanetId,
    haven: PlanetId,
    migrant: PopId,
}

/// Two planets 40 units apart; `haven` scores 2460 + `bonus` for a farmer.
fn frontier(bonus: f64) -> Frontier {
    let mut world = World::new(Calendar::default());
    let province = world.add_province("Frontier");
    let near = world.add_system("Near", province, [0.0, 0.0, 0.0]);
    let far = world.add_system("Far", province, [0.0, 40.0, 0.0]);

    let mut home = Planet::new("Dustbowl", near);
    let mut fields = Region::new("Fields", true);
    let mut leaving = Pop::new(PopClass::Farmer);
    leaving.migrating_off_planet = true;
    fields.pops.push(leaving);
    fields.pops.push(Pop::new(PopClass::Farmer));
    home.regions.push(fields);
    let origin = world.add_planet(home);

    let mut target = Planet::new("Greenreach", far);
    target.base_value = bonus;
    target.regions.push(Region::new("Meadow", true));
    let haven = world.add_planet(target);

    let civ = world.add_civilization(Civilization::new("Frontier League"));
    world.assign_planet(civ, origin);
    world.assign_planet(civ, haven);
    let migrant = world.planet(origin).unwrap().regions[0].pops[0].id;
    Frontier {
        world,
        civ,
        origin,
        haven,
        migrant,
    }
}

fn with_ctx<R>(run: impl FnOnce(&TurnContext<'_>) -> R) -> R {
    let rules = RulesConfig::default();
    let economy = BasicPlanetEconomy::new();
    let events = UnrestEventGenerator::default();
    let ctx = TurnContext {
        turn: 1,
        calendar: Calendar::default(),
        rules: &rules,
        economy: &economy,
        events: &events,
    };
    run(&ctx)
}

#[test]
fn value_at_threshold_plus_roll_fails_with_penalty() {
    // best value 2800 + 40 = threshold + roll exactly
    let mut f = frontier(380.0);
    let mut rng = ScriptedRng::new([40]);
    let outcome = with_ctx(|ctx| {
        resolve_migration(&mut f.world, ctx, &mut rng, f.civ, f.origin, f.migrant)
    });

    assert_eq!(
        outcome,
        MigrationOutcome::BelowThreshold {
            best: 2840.0,
            roll: 40
        }
    );
    let home = f.world.planet(f.origin).unwrap();
    let pop = home.pops().find(|pop| pop.id == f.migrant).unwrap();
    assert!((pop.unrest - 0.05).abs() < 1e-12);
    assert!((pop.support - 0.45).abs() < 1e-12);
    assert!(pop.migrating_off_planet);
    assert_eq!(pop.planet, f.origin);
    assert_eq!(home.population(), 2);
    assert_eq!(f.world.planet(f.haven).unwrap().population(), 0);
}

#[test]
fn value_above_threshold_plus_roll_relocates() {
    let mut f = frontier(381.0);
    let mut rng = ScriptedRng::new([40, 0]);
    let outcome = with_ctx(|ctx| {
        resolve_migration(&mut f.world, ctx, &mut rng, f.civ, f.origin, f.migrant)
    });

    assert!(matches!(outcome, MigrationOutcome::Relocated { to, .. } if to == f.haven));
    let haven = f.world.planet(f.haven).unwrap();
    let pop = haven.pops().find(|pop| pop.id == f.migrant).unwrap();
    assert_eq!(pop.planet, f.haven);
    assert_eq!(pop.happiness, 50.0);
    assert!(!pop.migrating_off_planet);
    assert_eq!(f.world.total_pops(), 2);
}

#[test]
fn failed_pops_are_retried_next_pass() {
    let mut f = frontier(0.0);
    let mut rng = ScriptedRng::default();
    with_ctx(|ctx| {
        migrate_pops_between_planets(&mut f.world, ctx, &mut rng, f.civ);
        migrate_pops_between_planets(&mut f.world, ctx, &mut rng, f.civ);
    });

    let pop = f
        .world
        .planet(f.origin)
        .unwrap()
        .pops()
        .find(|pop| pop.id == f.migrant)
        .unwrap();
    assert!((pop.unrest - 0.10).abs() < 1e-12);
    assert!(pop.migrating_off_planet);
    assert_eq!(f.world.stats().migrations_failed, 2);
}
