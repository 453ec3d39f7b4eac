use std::path::Path;

use empire_sim::{
    actions::{give_praising_speech, CharacterAction},
    components::{Character, Role},
    dialogue::{ConversationEngine, NO_DIALOGUE},
    rng::SimRng,
    scenario::ScenarioLoader,
};

fn dialogue_dir() -> std::path::PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("dialogue")
}

#[test]
fn bundled_templates_produce_greetings() {
    let scenario = ScenarioLoader::new(env!("CARGO_MANIFEST_DIR"))
        .load("scenarios/twin_suns.yaml")
        .unwrap();
    let world = scenario.build_world().unwrap();
    let engine = ConversationEngine::load(dialogue_dir());
    assert_eq!(engine.greetings().len(), 3);
    assert_eq!(engine.generic().len(), 4);

    let mut governor = Character::new("Tamsin Hale", Role::SystemGovernor);
    governor.planet = world.planet_named("Helion Prime");
    governor.house = Some("Hale".into());

    let mut rng = SimRng::seeded(17);
    for _ in 0..20 {
        let text = engine.initial_dialogue(&governor, &world, &mut rng);
        assert_ne!(text, NO_DIALOGUE);
        assert!(!text.contains('['), "unfilled placeholder in {text:?}");
    }
}

#[test]
fn praising_speech_reply_matches_effectiveness() {
    let scenario = ScenarioLoader::new(env!("CARGO_MANIFEST_DIR"))
        .load("scenarios/twin_suns.yaml")
        .unwrap();
    let world = scenario.build_world().unwrap();
    let civ = world.player().unwrap();
    let emperor = civ.leader.clone().unwrap();

    let mut viceroy = Character::new("Ilse Marrow", Role::Viceroy);
    viceroy.planet = emperor.planet;
    let speech = CharacterAction::praising_speech();
    assert!(speech.is_valid_for(&viceroy, civ));

    let engine = ConversationEngine::load(dialogue_dir());
    let mut rng = SimRng::seeded(3);
    for _ in 0..10 {
        let outcome = give_praising_speech(&emperor, &viceroy, &speech, &engine, &mut rng);
        assert!((30..65 + 40).contains(&outcome.effectiveness));
        assert_eq!(outcome.successful, outcome.effectiveness > 80);
        let expected = if outcome.effectiveness > 65 {
            "That sounds great, Your Excellence."
        } else if outcome.effectiveness > 35 {
            "I guess that sounds OK, Your Excellence."
        } else {
            "That is outrageous, Your Excellence!"
        };
        assert_eq!(outcome.response, expected);
    }
}
