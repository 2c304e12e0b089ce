use crate::data::{Entity, EntityRepr};
use crate::error::{Result, SpriterError};

/// Public API: parse canonical entity JSON into a validated [`Entity`].
///
/// Notes:
/// - Field names are snake_case and mirror the types in `data.rs` / `value.rs`.
/// - Timeline keys carry their pose under `"value"` as `{ "bone": {..} }` or
///   `{ "object": {..} }`; missing transform fields take the bone/object defaults.
/// - Curves default to linear, spins to +1, animations to looping.
/// - The same validation as [`crate::data::Animation::new`] runs on every animation, then
///   timelines without object info inherit the entity's declaration of the same name.
pub fn parse_entity_json(s: &str) -> Result<Entity> {
    let repr: EntityRepr =
        serde_json::from_str(s).map_err(|e| SpriterError::Parse(e.to_string()))?;
    let entity = Entity::try_from(repr)?;
    log::debug!(
        "parsed entity '{}' with {} animations",
        entity.name(),
        entity.animations().len()
    );
    Ok(entity)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_malformed_json() {
        let err = parse_entity_json("{ not json").unwrap_err();
        assert!(matches!(err, SpriterError::Parse(_)));
    }

    #[test]
    fn rejects_dangling_key_index() {
        let json = r#"{
            "name": "broken",
            "animations": [{
                "name": "idle",
                "length": 100,
                "mainline": { "keys": [{ "bone_refs": [{ "timeline": 0, "key": 4 }] }] },
                "timelines": [{ "name": "root", "type": "bone", "keys": [{ "value": { "bone": {} } }] }]
            }]
        }"#;
        let err = parse_entity_json(json).unwrap_err();
        assert!(matches!(err, SpriterError::InvalidData { .. }), "{err}");
    }

    #[test]
    fn plain_serde_validates_and_indexes_too() {
        let json = r#"{
            "name": "pair",
            "animations": [
                {
                    "name": "a", "length": 10,
                    "mainline": { "keys": [{ "bone_refs": [{ "timeline": 0, "key": 0 }] }] },
                    "timelines": [{ "name": "root", "type": "bone", "keys": [{ "value": { "bone": {} } }] }]
                },
                {
                    "name": "b", "length": 10,
                    "mainline": { "keys": [{ "bone_refs": [{ "timeline": 1, "key": 0 }] }] },
                    "timelines": [
                        { "name": "root", "type": "bone", "keys": [{ "value": { "bone": {} } }] },
                        { "name": "tip", "type": "bone", "keys": [{ "value": { "bone": {} } }] }
                    ]
                }
            ]
        }"#;
        let entity: Entity = serde_json::from_str(json).expect("entity deserializes");
        assert_eq!(entity, parse_entity_json(json).expect("entity parses"));
        let b = entity.animation_by_name("b").expect("b is indexed");
        assert_eq!(b.timeline_index("tip"), Some(1));
        assert_eq!(b.timelines()[1].id(), 1);

        let dangling = json.replace(r#""timeline": 1"#, r#""timeline": 5"#);
        let err = serde_json::from_str::<Entity>(&dangling).unwrap_err();
        assert!(err.to_string().contains("timeline 5 does not exist"), "{err}");
        assert!(matches!(
            parse_entity_json(&dangling),
            Err(SpriterError::InvalidData { .. })
        ));
    }

    #[test]
    fn minimal_entity_parses() {
        let json = r#"{
            "name": "dot",
            "object_infos": [{ "name": "root", "type": "bone", "size": { "width": 50, "height": 10 } }],
            "animations": [{
                "name": "idle",
                "length": 100,
                "mainline": { "keys": [{ "bone_refs": [{ "timeline": 0, "key": 0 }] }] },
                "timelines": [{ "name": "root", "type": "bone", "keys": [{ "value": { "bone": {} } }] }]
            }]
        }"#;
        let entity = parse_entity_json(json).expect("entity parses");
        let anim = entity.animation_by_name("idle").expect("idle exists");
        assert!(anim.looping());
        let info = anim.timelines()[0].object_info.as_ref().expect("linked info");
        assert_eq!(info.size.width, 50.0);
    }
}
