//! Engine: explicit host context owning loaded entities and their players.
//!
//! Methods:
//! - new, load_entity / load_entity_json, create_player / create_blend_player,
//!   remove_player, dispose_entity, clear, update (ticks every player in creation order)

use std::sync::Arc;

use crate::config::Config;
use crate::data::Entity;
use crate::error::{Result, SpriterError};
use crate::ids::{EntityId, IdAllocator, PlayerId};
use crate::player::Player;
use crate::stored_entity::parse_entity_json;

#[derive(Debug, Default)]
pub struct Engine {
    cfg: Config,
    ids: IdAllocator,
    entities: Vec<(EntityId, Arc<Entity>)>,
    /// Creation order is update order.
    players: Vec<(PlayerId, EntityId, Player)>,
}

impl Engine {
    pub fn new(cfg: Config) -> Self {
        Self {
            cfg,
            ..Self::default()
        }
    }

    #[inline]
    pub fn config(&self) -> &Config {
        &self.cfg
    }

    pub fn load_entity(&mut self, entity: Entity) -> EntityId {
        let id = self.ids.alloc_entity();
        log::debug!("loaded entity '{}' as {id:?}", entity.name());
        self.entities.push((id, Arc::new(entity)));
        id
    }

    pub fn load_entity_json(&mut self, json: &str) -> Result<EntityId> {
        let entity = parse_entity_json(json)?;
        Ok(self.load_entity(entity))
    }

    pub fn entity(&self, id: EntityId) -> Option<&Arc<Entity>> {
        self.entities
            .iter()
            .find(|(eid, _)| *eid == id)
            .map(|(_, e)| e)
    }

    pub fn entity_by_name(&self, name: &str) -> Option<EntityId> {
        self.entities
            .iter()
            .find(|(_, e)| e.name() == name)
            .map(|(id, _)| *id)
    }

    fn require_entity(&self, id: EntityId) -> Result<Arc<Entity>> {
        self.entity(id)
            .cloned()
            .ok_or(SpriterError::EntityNotFound(id))
    }

    fn insert_player(&mut self, entity: EntityId, player: Player) -> PlayerId {
        let id = self.ids.alloc_player();
        self.players.push((id, entity, player));
        id
    }

    /// Creates a player on the entity's first animation.
    pub fn create_player(&mut self, entity: EntityId) -> Result<PlayerId> {
        let player = Player::with_config(self.require_entity(entity)?, &self.cfg)?;
        Ok(self.insert_player(entity, player))
    }

    /// Creates a blended player over two named animations of the same entity.
    pub fn create_blend_player(
        &mut self,
        entity: EntityId,
        first: &str,
        second: &str,
    ) -> Result<PlayerId> {
        let data = self.require_entity(entity)?;
        let mut a = Player::with_config(Arc::clone(&data), &self.cfg)?;
        a.set_animation_by_name(first)?;
        let mut b = Player::with_config(data, &self.cfg)?;
        b.set_animation_by_name(second)?;
        let player = Player::blended_with_config(a, b, &self.cfg)?;
        Ok(self.insert_player(entity, player))
    }

    pub fn player(&self, id: PlayerId) -> Option<&Player> {
        self.players
            .iter()
            .find(|(pid, _, _)| *pid == id)
            .map(|(_, _, p)| p)
    }

    pub fn player_mut(&mut self, id: PlayerId) -> Option<&mut Player> {
        self.players
            .iter_mut()
            .find(|(pid, _, _)| *pid == id)
            .map(|(_, _, p)| p)
    }

    pub fn players(&self) -> impl Iterator<Item = (PlayerId, &Player)> + '_ {
        self.players.iter().map(|(id, _, p)| (*id, p))
    }

    pub fn remove_player(&mut self, id: PlayerId) -> Result<Player> {
        let pos = self
            .players
            .iter()
            .position(|(pid, _, _)| *pid == id)
            .ok_or(SpriterError::PlayerNotFound(id))?;
        Ok(self.players.remove(pos).2)
    }

    /// Drops the entity and every player created for it.
    pub fn dispose_entity(&mut self, id: EntityId) -> Result<()> {
        let pos = self
            .entities
            .iter()
            .position(|(eid, _)| *eid == id)
            .ok_or(SpriterError::EntityNotFound(id))?;
        self.entities.remove(pos);
        let before = self.players.len();
        self.players.retain(|(_, eid, _)| *eid != id);
        log::debug!(
            "disposed entity {id:?} and {} players",
            before - self.players.len()
        );
        Ok(())
    }

    /// Drops everything and restarts id allocation.
    pub fn clear(&mut self) {
        self.players.clear();
        self.entities.clear();
        self.ids.reset();
    }

    /// Ticks every player in creation order, stopping at the first failure.
    pub fn update(&mut self) -> Result<()> {
        for (_, _, player) in &mut self.players {
            player.tick()?;
        }
        Ok(())
    }
}
