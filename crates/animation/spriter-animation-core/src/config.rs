//! Core configuration for spriter-animation-core.

use serde::{Deserialize, Serialize};

/// Runtime defaults for players, blends and IK resolvers.
/// Keep this minimal; expand as needed without breaking API.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Time units added to a player's time per tick.
    pub speed: i32,
    /// Whether players expose a copy of the evaluator buffers (stable snapshot)
    /// instead of the evaluator's own buffers.
    pub copy_objects: bool,

    /// Distance under which an IK effector counts as having reached its target.
    pub ik_tolerance: f32,
    /// Effector length used by IK when the timeline carries no object info size.
    pub default_bone_length: f32,

    /// Initial blend weight of a blended player (0 = first source, 1 = second).
    pub blend_weight: f32,
    /// Weight below which the first source supplies hierarchy and draw order.
    pub sprite_threshold: f32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            speed: 15,
            copy_objects: true,
            ik_tolerance: 5.0,
            default_bone_length: 200.0,
            blend_weight: 0.5,
            sprite_threshold: 0.5,
        }
    }
}
