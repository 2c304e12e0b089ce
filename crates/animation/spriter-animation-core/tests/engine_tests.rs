use spriter_animation_core::{Config, Engine, EntityId, SpriterError};

fn fixture(name: &str) -> String {
    spriter_test_fixtures::entities::json(name).expect("load fixture")
}

#[test]
fn players_tick_in_creation_order_with_their_own_entity() {
    let mut eng = Engine::new(Config {
        speed: 100,
        ..Config::default()
    });
    let arm = eng.load_entity_json(&fixture("arm")).expect("arm");
    let walker = eng.load_entity_json(&fixture("walker")).expect("walker");
    assert_eq!(eng.entity_by_name("walker"), Some(walker));

    let p1 = eng.create_player(arm).expect("p1");
    let p2 = eng.create_player(walker).expect("p2");
    for _ in 0..9 {
        eng.update().expect("update");
    }
    // 900 within swing (1000) and 900 wrapped within walk (800).
    assert_eq!(eng.player(p1).expect("p1").time(), 900);
    assert_eq!(eng.player(p2).expect("p2").time(), 100);
    assert_eq!(eng.players().map(|(id, _)| id).collect::<Vec<_>>(), vec![p1, p2]);
}

#[test]
fn blend_players_are_built_from_animation_names() {
    let mut eng = Engine::default();
    let arm = eng.load_entity_json(&fixture("arm")).expect("arm");
    let id = eng.create_blend_player(arm, "swing", "raise").expect("blend");
    let player = eng.player(id).expect("player");
    let blend = player.blend().expect("blended");
    assert_eq!(blend.first().animation().name(), "swing");
    assert_eq!(blend.second().animation().name(), "raise");

    assert!(matches!(
        eng.create_blend_player(arm, "swing", "wave"),
        Err(SpriterError::AnimationNotFound { .. })
    ));
}

#[test]
fn disposing_an_entity_drops_its_players() {
    let mut eng = Engine::default();
    let arm = eng.load_entity_json(&fixture("arm")).expect("arm");
    let walker = eng.load_entity_json(&fixture("walker")).expect("walker");
    let a = eng.create_player(arm).expect("a");
    let w = eng.create_player(walker).expect("w");

    eng.dispose_entity(arm).expect("dispose");
    assert!(eng.entity(arm).is_none());
    assert!(eng.player(a).is_none());
    assert!(eng.player(w).is_some());

    assert!(matches!(
        eng.dispose_entity(arm),
        Err(SpriterError::EntityNotFound(_))
    ));
    assert!(matches!(
        eng.create_player(arm),
        Err(SpriterError::EntityNotFound(_))
    ));
}

#[test]
fn players_can_be_removed_and_engine_cleared() {
    let mut eng = Engine::default();
    let arm = eng.load_entity_json(&fixture("arm")).expect("arm");
    let a = eng.create_player(arm).expect("a");
    eng.player_mut(a).expect("a").set_speed(0);

    let removed = eng.remove_player(a).expect("removed");
    assert_eq!(removed.speed(), 0);
    assert!(matches!(
        eng.remove_player(a),
        Err(SpriterError::PlayerNotFound(id)) if id == a
    ));

    eng.clear();
    assert!(eng.entity(arm).is_none());
    // Ids restart after a clear.
    let again = eng.load_entity_json(&fixture("walker")).expect("walker");
    assert_eq!(again, arm);
    assert_eq!(again, EntityId(0));
}

#[test]
fn malformed_documents_are_rejected() {
    let mut eng = Engine::default();
    assert!(matches!(
        eng.load_entity_json("{ \"name\": "),
        Err(SpriterError::Parse(_))
    ));
    let dangling = r#"{
        "name": "broken",
        "animations": [{
            "name": "a", "length": 10,
            "mainline": { "keys": [{ "bone_refs": [{ "timeline": 4, "key": 0 }] }] },
            "timelines": []
        }]
    }"#;
    assert!(matches!(
        eng.load_entity_json(dangling),
        Err(SpriterError::InvalidData { .. })
    ));
    assert_eq!(eng.entity_by_name("broken"), None);
}
