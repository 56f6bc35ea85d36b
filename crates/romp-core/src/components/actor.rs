use std::any::Any;
use std::collections::HashMap;

use glam::Vec2;

use crate::api::types::{ActorId, SoundHandle};
use crate::components::appearance::AppearanceComponent;
use crate::components::movement::Movement;
use crate::components::role::{CollisionRules, Role, RoleTags};
use crate::components::state::{StateEvent, StateManager};
use crate::core::physics::PhysicsBody;

/// Sounds an actor contributes to gameplay moments. All optional; a missing
/// handle is silence, never an error.
#[derive(Debug, Clone, Copy, Default)]
pub struct SoundSet {
    /// Played (throttled) while something is touching this actor.
    pub collide: Option<SoundHandle>,
    /// Played when this actor is defeated.
    pub defeat: Option<SoundHandle>,
    /// Played when this destination admits a hero.
    pub arrive: Option<SoundHandle>,
    /// Played when this actor tosses a projectile.
    pub toss: Option<SoundHandle>,
    /// Played when this actor jumps.
    pub jump: Option<SoundHandle>,
    /// Played when this actor is removed.
    pub disappear: Option<SoundHandle>,
}

/// Fat actor: a single aggregate with one of each facet.
///
/// The role defaults to `Passive` and movement to `Inert`, so an actor is
/// inoffensive scenery until told otherwise. The rule descriptor is owned
/// here, per actor, never shared; roles seed it and gameplay retags it.
pub struct Actor {
    /// Unique identifier.
    pub id: ActorId,
    /// String tag for finding actors by name.
    pub tag: String,
    /// Disabled actors are skipped by every system; removal clears this.
    pub enabled: bool,
    /// Reusable actors (pooled projectiles) are parked when removed,
    /// never destroyed.
    pub reusable: bool,
    /// Position in world space, synced from the physics body each tick.
    pub pos: Vec2,
    /// Rotation in radians.
    pub rotation: f32,
    /// Rendered size in world units.
    pub scale: Vec2,
    /// Physics body facet, present once spawned with a body.
    pub body: Option<PhysicsBody>,
    /// This actor's own collision-rule descriptor.
    pub rules: CollisionRules,
    /// Behavioral variant.
    pub role: Role,
    /// Motion policy.
    pub movement: Movement,
    /// Discrete state record plus observers.
    pub state: StateManager,
    /// Animation cue selection.
    pub appearance: AppearanceComponent,
    /// Gameplay sounds.
    pub sounds: SoundSet,
    /// Free-form extension bag for game-author data.
    pub extra: HashMap<String, Box<dyn Any>>,
}

impl Actor {
    /// Create a passive, inert actor at the origin.
    pub fn new(id: ActorId) -> Self {
        let role = Role::Passive;
        Self {
            id,
            tag: String::new(),
            enabled: true,
            reusable: false,
            pos: Vec2::ZERO,
            rotation: 0.0,
            scale: Vec2::ONE,
            body: None,
            rules: role.collision_rules(),
            role,
            movement: Movement::Inert,
            state: StateManager::new(),
            appearance: AppearanceComponent::new(),
            sounds: SoundSet::default(),
            extra: HashMap::new(),
        }
    }

    // -- Builder pattern --

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = tag.into();
        self
    }

    pub fn with_pos(mut self, pos: Vec2) -> Self {
        self.pos = pos;
        self
    }

    pub fn with_rotation(mut self, rotation: f32) -> Self {
        self.rotation = rotation;
        self
    }

    pub fn with_scale(mut self, scale: Vec2) -> Self {
        self.scale = scale;
        self
    }

    /// Attach a role and seed the rule descriptor from it.
    pub fn with_role(mut self, role: Role) -> Self {
        self.rules = role.collision_rules();
        self.role = role;
        self
    }

    pub fn with_movement(mut self, movement: Movement) -> Self {
        self.movement = movement;
        self
    }

    pub fn with_appearance(mut self, appearance: AppearanceComponent) -> Self {
        self.appearance = appearance;
        self
    }

    pub fn with_sounds(mut self, sounds: SoundSet) -> Self {
        self.sounds = sounds;
        self
    }

    pub fn with_body(mut self, body: PhysicsBody) -> Self {
        self.body = Some(body);
        self
    }

    pub fn with_reusable(mut self, reusable: bool) -> Self {
        self.reusable = reusable;
        self
    }

    /// Run a state transition through this actor's state machine.
    pub fn apply_state(&mut self, event: StateEvent) -> bool {
        self.state.change_state(self.id, event)
    }

    /// Recompute the rule descriptor after changing role flags at runtime.
    /// Transient mid-jump/mid-crawl tags survive; author-added exemptions
    /// must be re-applied afterwards. Actors with a body should go through
    /// `Stage::refresh_rules` so the physics filter sees the change too.
    pub fn refresh_rules(&mut self) {
        let transient = self.rules.properties & (RoleTags::MID_JUMP | RoleTags::MID_CRAWL);
        self.rules = self.role.collision_rules();
        self.rules.properties |= transient;
    }
}
