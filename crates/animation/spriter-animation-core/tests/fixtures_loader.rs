use spriter_animation_core::{parse_entity_json, ObjectType};

#[test]
fn every_fixture_parses_and_validates() {
    for key in spriter_test_fixtures::entities::keys() {
        let json = spriter_test_fixtures::entities::json(&key).expect("load fixture");
        let entity = parse_entity_json(&json).unwrap_or_else(|e| panic!("{key}: {e}"));
        assert!(!entity.animations().is_empty(), "{key} has no animations");
    }
}

#[test]
fn timelines_inherit_declared_object_infos() {
    let json = spriter_test_fixtures::entities::json("walker").expect("walker");
    let entity = parse_entity_json(&json).expect("parse");
    let walk = entity.animation_by_name("walk").expect("walk");

    let marker = walk.timeline_by_name("marker").expect("marker");
    let info = marker.object_info.as_ref().expect("linked info");
    assert_eq!(info.kind, ObjectType::Point);
    assert_eq!(walk.timeline_index("thigh_r"), Some(2));
    assert_eq!(walk.timelines()[2].id(), 2);

    // Draw order follows z-index, not document order.
    let key = &walk.mainline().keys[0];
    let order: Vec<usize> = key.object_refs.iter().map(|r| r.timeline).collect();
    assert_eq!(order, vec![4, 3]);

    assert_eq!(entity.max_timelines(), 5);
    assert_eq!(
        entity.animation_with_most_timelines().map(|a| a.name()),
        Some("walk")
    );
}

#[test]
fn character_maps_and_frames_survive_parsing() {
    let json = spriter_test_fixtures::entities::json("arm").expect("arm");
    let entity = parse_entity_json(&json).expect("parse");
    assert_eq!(entity.character_maps().len(), 2);
    let gloved = entity.character_map("gloved").expect("gloved");
    assert_eq!(gloved.entries.len(), 1);
    assert_eq!(entity.object_info("hand").expect("hand").frames.len(), 2);

    let raise = entity.animation_by_name("raise").expect("raise");
    assert!(!raise.looping());
    assert_eq!(raise.length(), 500);
    let path = spriter_test_fixtures::entities::path("arm").expect("path");
    assert!(path.ends_with("entities/arm.json"));
}
