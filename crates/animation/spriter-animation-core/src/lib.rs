//! Spriter Animation Core (engine-agnostic)
//!
//! Playback runtime for 2D skeletal animations authored as keyframed bones and objects.
//! This crate defines the data model, curve interpolation, the time-to-pose evaluator,
//! two-animation blending, the player state machine, CCD inverse kinematics and the
//! host-facing boundaries for resources and drawing. It performs no I/O and never
//! installs a logger.

pub mod attachment;
pub mod blend;
pub mod config;
pub mod data;
pub mod engine;
pub mod error;
pub mod geometry;
pub mod ids;
pub mod ik;
pub mod interp;
pub mod listener;
pub mod math;
pub mod player;
pub mod resources;
pub mod sampling;
pub mod scratch;
pub mod stored_entity;
pub mod value;

// Re-exports for hosts
pub use attachment::Attachment;
pub use blend::{Blend, BlendSide};
pub use config::Config;
pub use data::{
    Animation, BoneRef, CharacterMap, Entity, FileReference, Mainline, MainlineKey, MapEntry,
    ObjectInfo, ObjectRef, ObjectType, Timeline, TimelineKey,
};
pub use engine::Engine;
pub use error::{Result, SpriterError};
pub use geometry::{BoundingBox, Dimension, Point, Rectangle};
pub use ids::{AttachmentId, EntityId, IkId, ListenerId, PlayerId};
pub use ik::{CcdSolver, IkObject, IkOutcome, IkResolver, IkSolver};
pub use interp::{Constraints, Curve, CurveType};
pub use listener::PlayerListener;
pub use player::Player;
pub use resources::{Drawer, ResourceLoader};
pub use sampling::{sample_timeline, unmap_hierarchy, AnimationEvaluator};
pub use scratch::{PoseSlot, Scratch};
pub use stored_entity::parse_entity_json;
pub use value::{Bone, Object, Spatial};
