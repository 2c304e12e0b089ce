//! Error types for the playback core.
//!
//! Every variant is a usage fault: the call that returns it violated its contract and
//! nothing was mutated. Numeric degeneracies (NaN time fractions, Bezier curves without a
//! root in range) and unreachable IK targets are handled in place and never surface here.

use crate::ids::{EntityId, PlayerId};

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum SpriterError {
    /// An evaluator was asked to evaluate before `prepare()`.
    #[error("animation evaluator is not prepared; call prepare() first")]
    NotPrepared,

    /// Pose buffers cannot hold every timeline of the animation.
    #[error("pose buffers hold {available} timelines but animation '{animation}' needs {needed}")]
    PoseBufferTooSmall {
        animation: String,
        needed: usize,
        available: usize,
    },

    #[error("entity '{entity}' has no animations")]
    NoAnimations { entity: String },

    #[error("animation not found: {name}")]
    AnimationNotFound { name: String },

    #[error("animation index {index} is out of range (entity has {count})")]
    AnimationIndexOutOfRange { index: usize, count: usize },

    #[error("no bone found named \"{name}\"")]
    BoneNotFound { name: String },

    #[error("no object found named \"{name}\"")]
    ObjectNotFound { name: String },

    #[error("bone index {index} is out of range (current key has {count})")]
    BoneIndexOutOfRange { index: usize, count: usize },

    #[error("object index {index} is out of range (current key has {count})")]
    ObjectIndexOutOfRange { index: usize, count: usize },

    #[error("character map not found: {name}")]
    CharacterMapNotFound { name: String },

    #[error("no object info for \"{name}\"")]
    ObjectInfoMissing { name: String },

    /// Two players (or animations) that should share an entity do not.
    #[error("both players have to hold the same entity")]
    EntityMismatch,

    #[error("unsupported operation: {reason}")]
    Unsupported { reason: String },

    /// Authored data violates a structural invariant.
    #[error("invalid animation data: {reason}")]
    InvalidData { reason: String },

    #[error("parse error: {0}")]
    Parse(String),

    #[error("entity not found: {0:?}")]
    EntityNotFound(EntityId),

    #[error("player not found: {0:?}")]
    PlayerNotFound(PlayerId),
}

impl SpriterError {
    pub(crate) fn invalid_data(reason: impl Into<String>) -> Self {
        Self::InvalidData {
            reason: reason.into(),
        }
    }

    pub(crate) fn unsupported(reason: impl Into<String>) -> Self {
        Self::Unsupported {
            reason: reason.into(),
        }
    }
}

pub type Result<T, E = SpriterError> = std::result::Result<T, E>;
