//! Playback observers.

use crate::data::{Animation, MainlineKey};
use crate::player::Player;

/// Hooks a [`Player`] calls during a tick, in registration order. Every method defaults
/// to doing nothing.
pub trait PlayerListener {
    /// Before anything in the tick is computed.
    fn pre_process(&mut self, _player: &Player) {}

    /// After the pose, attachments and key-change notification, before time advances.
    fn post_process(&mut self, _player: &Player) {}

    /// Time wrapped past either end of the animation. Fires once per tick at most.
    fn animation_finished(&mut self, _animation: &Animation) {}

    fn animation_changed(&mut self, _old: &Animation, _new: &Animation) {}

    fn mainline_key_changed(&mut self, _prev: Option<&MainlineKey>, _new: &MainlineKey) {}
}
