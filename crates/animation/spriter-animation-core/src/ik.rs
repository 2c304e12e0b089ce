//! Inverse kinematics on a player's current pose.
//!
//! An [`IkResolver`] keeps a set of constraints, each pulling a named effector bone's tip
//! towards a target point. Resolution works on the pose a player exposes after its tick:
//! tweened local angles are adjusted and the hierarchy is unmapped again.

use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::error::{Result, SpriterError};
use crate::geometry::Point;
use crate::ids::{IdAllocator, IkId};
use crate::math::{angle_difference, flip_sign};
use crate::player::Player;
use crate::sampling::unmap_hierarchy;
use crate::scratch::Scratch;
use crate::value::Bone;

/// Target and effort of one constraint.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct IkObject {
    pub target: Point,
    /// Ancestors of the effector that may rotate.
    pub chain_length: usize,
    /// Solver passes per resolve.
    pub iterations: usize,
}

impl IkObject {
    pub fn new(x: f32, y: f32, chain_length: usize, iterations: usize) -> Self {
        Self {
            target: Point::new(x, y),
            chain_length,
            iterations,
        }
    }
}

/// What a single solver pass changed.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct IkOutcome {
    /// The effector was turned towards the target.
    pub rotated: bool,
    /// Ancestors adjusted after the effector.
    pub adjustments: usize,
}

/// One solver pass for a chain ending in bone ref `effector` of the current mainline key.
pub trait IkSolver {
    fn resolve(
        &self,
        player: &mut Player,
        target: Point,
        chain_length: usize,
        effector: usize,
        tolerance: f32,
    ) -> Result<IkOutcome>;
}

/// Cyclic coordinate descent.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct CcdSolver {
    /// Effector length when its timeline has no object info.
    pub default_length: f32,
}

impl Default for CcdSolver {
    fn default() -> Self {
        Self {
            default_length: Config::default().default_bone_length,
        }
    }
}

struct ChainLink {
    timeline: usize,
    parent: Option<usize>,
}

impl IkSolver for CcdSolver {
    fn resolve(
        &self,
        player: &mut Player,
        target: Point,
        chain_length: usize,
        effector: usize,
        tolerance: f32,
    ) -> Result<IkOutcome> {
        let key = player.current_key();
        let count = key.bone_refs.len();
        let mut chain = Vec::with_capacity(chain_length + 1);
        let mut cursor = Some(effector);
        while let Some(index) = cursor {
            let r = key
                .bone_refs
                .get(index)
                .ok_or(SpriterError::BoneIndexOutOfRange { index, count })?;
            chain.push(ChainLink {
                timeline: r.timeline,
                parent: key.parent_timeline(r.parent),
            });
            if chain.len() > chain_length {
                break;
            }
            cursor = r.parent;
        }
        let effector_tl = chain[0].timeline;
        let width = player.timelines()[effector_tl]
            .object_info
            .as_ref()
            .map_or(self.default_length, |info| info.size.width);

        let root = *player.root();
        let (key, pose) = player.key_and_pose_mut();
        let global = |pose: &Scratch, timeline: Option<usize>| -> Bone {
            timeline.map_or(root, |t| *pose.unmapped[t].value.bone())
        };
        let tip_of = |pose: &Scratch| pose.unmapped[effector_tl].value.bone().tip(width);

        if tip_of(&*pose).distance(target) <= tolerance {
            return Ok(IkOutcome::default());
        }

        let effector_global = global(&*pose, Some(effector_tl));
        let mut angle = effector_global.position.angle_to(target);
        if effector_global.scale.x < 0.0 {
            angle += 180.0;
        }
        let parent = global(&*pose, chain[0].parent);
        pose.tweened[effector_tl].value.bone_mut().angle =
            (angle - parent.angle) * flip_sign(parent.scale.x, parent.scale.y);
        unmap_hierarchy(key, pose, &root, None);

        let mut outcome = IkOutcome {
            rotated: true,
            adjustments: 0,
        };
        for link in &chain[1..] {
            let tip = tip_of(&*pose);
            if tip.distance(target) <= tolerance {
                break;
            }
            let joint = global(&*pose, Some(link.timeline));
            let delta = angle_difference(
                joint.position.angle_to(target),
                joint.position.angle_to(tip),
            );
            let parent = global(&*pose, link.parent);
            pose.tweened[link.timeline].value.bone_mut().angle +=
                delta * flip_sign(parent.scale.x, parent.scale.y);
            unmap_hierarchy(key, pose, &root, None);
            outcome.adjustments += 1;
        }
        Ok(outcome)
    }
}

/// Constraint set applied to a player after each tick.
#[derive(Debug)]
pub struct IkResolver<S = CcdSolver> {
    solver: S,
    tolerance: f32,
    constraints: Vec<(IkId, IkObject, String)>,
    ids: IdAllocator,
}

impl IkResolver<CcdSolver> {
    pub fn new() -> Self {
        Self::with_config(&Config::default())
    }

    pub fn with_config(cfg: &Config) -> Self {
        Self::with_solver(
            CcdSolver {
                default_length: cfg.default_bone_length,
            },
            cfg.ik_tolerance,
        )
    }
}

impl Default for IkResolver<CcdSolver> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: IkSolver> IkResolver<S> {
    pub fn with_solver(solver: S, tolerance: f32) -> Self {
        Self {
            solver,
            tolerance,
            constraints: Vec::new(),
            ids: IdAllocator::new(),
        }
    }

    #[inline]
    pub fn solver(&self) -> &S {
        &self.solver
    }

    #[inline]
    pub fn tolerance(&self) -> f32 {
        self.tolerance
    }

    pub fn set_tolerance(&mut self, tolerance: f32) {
        self.tolerance = tolerance;
    }

    /// Constrains the bone named `effector`.
    pub fn map(&mut self, object: IkObject, effector: impl Into<String>) -> IkId {
        let id = self.ids.alloc_ik();
        self.constraints.push((id, object, effector.into()));
        id
    }

    pub fn unmap(&mut self, id: IkId) -> Option<IkObject> {
        let pos = self.constraints.iter().position(|(cid, _, _)| *cid == id)?;
        Some(self.constraints.remove(pos).1)
    }

    pub fn get(&self, id: IkId) -> Option<&IkObject> {
        self.constraints
            .iter()
            .find(|(cid, _, _)| *cid == id)
            .map(|(_, object, _)| object)
    }

    pub fn get_mut(&mut self, id: IkId) -> Option<&mut IkObject> {
        self.constraints
            .iter_mut()
            .find(|(cid, _, _)| *cid == id)
            .map(|(_, object, _)| object)
    }

    pub fn len(&self) -> usize {
        self.constraints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.constraints.is_empty()
    }

    /// Runs every constraint for its configured number of iterations, in mapping order.
    ///
    /// Unreachable targets are not an error; the chain is left in its best pose. An
    /// effector missing from the player's current mainline key is.
    pub fn resolve_all(&self, player: &mut Player) -> Result<()> {
        for (_, object, effector) in &self.constraints {
            let index = player
                .bone_index(effector)
                .ok_or_else(|| SpriterError::BoneNotFound {
                    name: effector.clone(),
                })?;
            for _ in 0..object.iterations {
                self.solver.resolve(
                    player,
                    object.target,
                    object.chain_length,
                    index,
                    self.tolerance,
                )?;
            }
        }
        Ok(())
    }
}
