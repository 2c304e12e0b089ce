use std::sync::Arc;

use spriter_animation_core::{
    parse_entity_json, BlendSide, Entity, FileReference, Player, SpriterError,
};

fn approx(a: f32, b: f32, eps: f32) {
    assert!((a - b).abs() <= eps, "left={a} right={b} eps={eps}");
}

fn approx_angle(a: f32, b: f32, eps: f32) {
    let d = (a - b).rem_euclid(360.0);
    assert!(d.min(360.0 - d) <= eps, "left={a} right={b} eps={eps}");
}

fn arm() -> Arc<Entity> {
    let json = spriter_test_fixtures::entities::json("arm").expect("load arm fixture");
    Arc::new(parse_entity_json(&json).expect("parse arm fixture"))
}

/// Blend of `swing` (first) and `raise` (second), both at time 0.
fn swing_raise() -> Player {
    let entity = arm();
    let first = Player::new(Arc::clone(&entity)).expect("first");
    let mut second = Player::new(entity).expect("second");
    second.set_animation_by_name("raise").expect("raise");
    Player::blended(first, second).expect("blend")
}

fn set_weight(player: &mut Player, weight: f32) {
    player.blend_mut().expect("blended").weight = weight;
    player.refresh().expect("refresh");
}

#[test]
fn weight_extremes_reproduce_sources() {
    let mut player = swing_raise();

    set_weight(&mut player, 0.0);
    assert_eq!(player.animation().name(), "swing");
    approx_angle(player.bone_by_name("upper").expect("upper").angle, 0.0, 1e-3);

    set_weight(&mut player, 1.0);
    assert_eq!(player.animation().name(), "raise");
    approx_angle(player.bone_by_name("upper").expect("upper").angle, 180.0, 1e-3);
    let lower = player.bone_by_name("lower").expect("lower");
    approx(lower.position.x, -100.0, 1e-3);
}

#[test]
fn intermediate_weight_interpolates_globals_through_hierarchy() {
    let mut player = swing_raise();
    set_weight(&mut player, 0.25);

    let upper = *player.bone_by_name("upper").expect("upper");
    approx(upper.angle, 45.0, 1e-3);
    let lower = player.bone_by_name("lower").expect("lower");
    approx(lower.angle, 45.0, 1e-3);
    approx(lower.position.x, 70.7107, 1e-3);
    approx(lower.position.y, 70.7107, 1e-3);
}

#[test]
fn structural_side_decides_files_unless_sprites_tween() {
    let mut player = swing_raise();
    {
        let blend = player.blend_mut().expect("blended");
        blend.sprite_threshold = 0.9;
    }
    set_weight(&mut player, 0.75);
    assert!(player.blend().expect("blended").on_first_side());
    assert_eq!(
        player.object_by_name("hand").expect("hand").file,
        FileReference::new(0, 0)
    );

    player.blend_mut().expect("blended").tween_sprites = true;
    player.refresh().expect("refresh");
    assert_eq!(
        player.object_by_name("hand").expect("hand").file,
        FileReference::new(0, 1)
    );
}

#[test]
fn base_bone_pins_its_subtree_to_one_source() {
    let mut player = swing_raise();
    {
        let blend = player.blend_mut().expect("blended");
        blend.weight = 0.0;
        blend.base_bone = Some("upper".to_string());
        blend.base_side = Some(BlendSide::Second);
    }
    player.refresh().expect("refresh");

    approx_angle(player.bone_by_name("upper").expect("upper").angle, 180.0, 1e-3);
    let hand = player.object_by_name("hand").expect("hand");
    approx(hand.bone.position.x, -180.0, 1e-3);

    player.blend_mut().expect("blended").base_bone = Some("tail".to_string());
    assert!(matches!(
        player.refresh(),
        Err(SpriterError::BoneNotFound { .. })
    ));
}

#[test]
fn missing_base_bone_leaves_the_last_frame_untouched() {
    let mut player = swing_raise();
    assert_eq!(player.current_key().time, 0);
    let before = *player.bone_by_name("upper").expect("upper");
    {
        let first = player.blend_mut().expect("blended").first_mut();
        first.set_time(600);
        first.refresh().expect("first refresh");
        assert_eq!(first.current_key().time, 500);
    }
    {
        let blend = player.blend_mut().expect("blended");
        blend.weight = 0.0;
        blend.base_bone = Some("tail".to_string());
    }
    assert!(matches!(
        player.refresh(),
        Err(SpriterError::BoneNotFound { .. })
    ));
    assert_eq!(player.current_key().time, 0);
    assert_eq!(*player.bone_by_name("upper").expect("upper"), before);

    player.blend_mut().expect("blended").base_bone = None;
    player.refresh().expect("refresh");
    assert_eq!(player.current_key().time, 500);
}

#[test]
fn sources_must_share_the_entity() {
    let a = Player::new(arm()).expect("a");
    let b = Player::new(arm()).expect("b");
    assert!(matches!(
        Player::blended(a, b),
        Err(SpriterError::EntityMismatch)
    ));
}

#[test]
fn blended_player_ticks_its_sources() {
    let mut player = swing_raise();
    assert_eq!(player.animation_index(), None);
    assert!(matches!(
        player.set_animation(0),
        Err(SpriterError::Unsupported { .. })
    ));
    // Default weight sits on the second source's side.
    assert_eq!(player.length(), 500);

    player.tick().expect("tick");
    let blend = player.blend().expect("blended");
    assert_eq!(blend.first().time(), 15);
    assert_eq!(blend.second().time(), 15);
    assert_eq!(player.time(), 15);

    player.blend_mut().expect("blended").update_players = false;
    player.tick().expect("tick");
    assert_eq!(player.blend().expect("blended").first().time(), 15);
}

#[test]
fn blends_nest() {
    let inner = swing_raise();
    let mut outer_second = Player::new(Arc::clone(inner.entity())).expect("second");
    outer_second.set_animation_by_name("raise").expect("raise");
    let mut outer = Player::blended(inner, outer_second).expect("nested");
    outer.blend_mut().expect("blended").weight = 0.0;
    outer.refresh().expect("refresh");
    // Inner blend sits at 0.5 on the raise side: halfway between 0 and 180.
    approx_angle(outer.bone_by_name("upper").expect("upper").angle, 90.0, 1e-3);
    assert_eq!(outer.animation().name(), "raise");
}
