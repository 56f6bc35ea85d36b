use crate::api::types::ActorId;
use crate::components::actor::Actor;

/// Flat actor storage.
/// Designed for small-to-medium counts (hundreds, not millions).
pub struct Scene {
    actors: Vec<Actor>,
}

impl Scene {
    pub fn new() -> Self {
        Self {
            actors: Vec::with_capacity(256),
        }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            actors: Vec::with_capacity(capacity),
        }
    }

    /// Add an actor to the scene.
    pub fn spawn(&mut self, actor: Actor) {
        self.actors.push(actor);
    }

    /// Remove an actor by ID. Returns the removed actor if found.
    pub fn despawn(&mut self, id: ActorId) -> Option<Actor> {
        self.actors
            .iter()
            .position(|a| a.id == id)
            .map(|idx| self.actors.swap_remove(idx))
    }

    pub fn get(&self, id: ActorId) -> Option<&Actor> {
        self.actors.iter().find(|a| a.id == id)
    }

    pub fn get_mut(&mut self, id: ActorId) -> Option<&mut Actor> {
        self.actors.iter_mut().find(|a| a.id == id)
    }

    /// Mutable access to two distinct actors at once, for pairwise
    /// collision handling. Returns None if either is missing or both ids
    /// are the same.
    pub fn pair_mut(&mut self, a: ActorId, b: ActorId) -> Option<(&mut Actor, &mut Actor)> {
        let ia = self.actors.iter().position(|x| x.id == a)?;
        let ib = self.actors.iter().position(|x| x.id == b)?;
        if ia == ib {
            return None;
        }
        if ia < ib {
            let (left, right) = self.actors.split_at_mut(ib);
            Some((&mut left[ia], &mut right[0]))
        } else {
            let (left, right) = self.actors.split_at_mut(ia);
            Some((&mut right[0], &mut left[ib]))
        }
    }

    /// Actor at a storage index; valid for `0..len()`.
    pub fn at(&self, index: usize) -> &Actor {
        &self.actors[index]
    }

    pub fn at_mut(&mut self, index: usize) -> &mut Actor {
        &mut self.actors[index]
    }

    pub fn iter(&self) -> impl Iterator<Item = &Actor> {
        self.actors.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Actor> {
        self.actors.iter_mut()
    }

    /// Find the first actor with the given tag.
    pub fn find_by_tag(&self, tag: &str) -> Option<&Actor> {
        self.actors.iter().find(|a| a.tag == tag)
    }

    pub fn find_by_tag_mut(&mut self, tag: &str) -> Option<&mut Actor> {
        self.actors.iter_mut().find(|a| a.tag == tag)
    }

    pub fn len(&self) -> usize {
        self.actors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actors.is_empty()
    }

    pub fn clear(&mut self) {
        self.actors.clear();
    }
}

impl Default for Scene {
    fn default() -> Self {
        Self::new()
    }
}
