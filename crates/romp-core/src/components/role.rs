//! Role variants and the collision-rule algebra.
//!
//! A role is what an actor *is* for gameplay purposes. Each role starts from
//! a rule descriptor built over a small closed tag vocabulary; the collision
//! resolver consults those descriptors before any pairwise semantics run.

use std::fmt;

use bitflags::bitflags;
use glam::Vec2;

use crate::api::types::ActorId;
use crate::components::actor::Actor;
use crate::core::physics::JointHandle;

bitflags! {
    /// Closed tag vocabulary for collision-rule descriptors.
    ///
    /// The first eight tags mirror the role variants; `MID_JUMP` and
    /// `MID_CRAWL` are transient tags an actor carries only while jumping
    /// or crawling.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
    pub struct RoleTags: u16 {
        const HERO        = 1 << 0;
        const ENEMY       = 1 << 1;
        const GOODIE      = 1 << 2;
        const DESTINATION = 1 << 3;
        const OBSTACLE    = 1 << 4;
        const SENSOR      = 1 << 5;
        const PROJECTILE  = 1 << 6;
        const PASSIVE     = 1 << 7;
        const MID_JUMP    = 1 << 8;
        const MID_CRAWL   = 1 << 9;
    }
}

bitflags! {
    /// Rectangle sides, used by obstacles to declare which faces re-enable
    /// jumping and which faces are sticky.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
    pub struct Sides: u8 {
        const TOP    = 1 << 0;
        const BOTTOM = 1 << 1;
        const LEFT   = 1 << 2;
        const RIGHT  = 1 << 3;
    }
}

/// What an actor is, what it refuses to touch, and what it phases through.
///
/// `ignores` is the hard exemption set: an intersecting pair produces no
/// contact and no dispatch. `pass_through` only suppresses the solver
/// response; contact events still reach the resolver, which is how a stomp
/// can defeat an enemy without also bouncing the hero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CollisionRules {
    pub properties: RoleTags,
    pub ignores: RoleTags,
    pub pass_through: RoleTags,
}

impl CollisionRules {
    /// Symmetric hard-exemption test: true when either side refuses the
    /// other's properties.
    pub fn exempts(&self, other: &CollisionRules) -> bool {
        self.ignores.intersects(other.properties) || other.ignores.intersects(self.properties)
    }

    /// Solver-level test: exempt pairs and pass-through pairs both skip
    /// contact impulses.
    pub fn phases_through(&self, other: &CollisionRules) -> bool {
        self.exempts(other)
            || self.pass_through.intersects(other.properties)
            || other.pass_through.intersects(self.properties)
    }
}

// ---------------------------------------------------------------------------
// Hook signatures
// ---------------------------------------------------------------------------

/// Side-effect hook invoked with the owning actor and the other party.
pub type PairHook = Box<dyn FnMut(&mut Actor, &mut Actor)>;
/// Goodie collection hook `(goodie, hero)`; return false to leave the goodie
/// in place for a later attempt.
pub type CollectHook = Box<dyn FnMut(&mut Actor, &mut Actor) -> bool>;
/// Admission predicate a destination may use to turn heroes away.
pub type ArrivalPredicate = Box<dyn Fn(&Actor) -> bool>;
/// Enemy defeat hook `(enemy, defeater if known)`.
pub type DefeatHook = Box<dyn FnMut(&mut Actor, Option<ActorId>)>;
/// Pool-return callback run when a projectile is reclaimed.
pub type ReclaimHook = Box<dyn FnMut(ActorId)>;
/// Obstacle decision for incoming projectiles `(obstacle, projectile)`;
/// return true to consume the projectile.
pub type ProjectilePredicate = Box<dyn Fn(&Actor, &Actor) -> bool>;

// ---------------------------------------------------------------------------
// Role sub-state
// ---------------------------------------------------------------------------

/// The player-controlled role. Survives enemies by spending strength.
pub struct Hero {
    /// Remaining strength; enemy damage subtracts from it, goodies may add.
    pub strength: i32,
    /// When true, losing this hero loses the level.
    pub must_survive: bool,
    /// Seconds of invincibility left; counted down each tick.
    pub invincible_remaining: f32,
    /// Jumps taken since the hero last left the ground.
    pub jumps_taken: u32,
    /// Maximum jumps per airborne stretch when multi-jump is off.
    pub allowed_jumps: u32,
    /// When true, jumps are never refused by the counter.
    pub multi_jump: bool,
    pub(crate) sticky_grace: f32,
    pub(crate) sticky_joint: Option<JointHandle>,
}

impl Hero {
    pub fn new() -> Self {
        Self {
            strength: 1,
            must_survive: false,
            invincible_remaining: 0.0,
            jumps_taken: 0,
            allowed_jumps: 1,
            multi_jump: false,
            sticky_grace: 0.0,
            sticky_joint: None,
        }
    }

    pub fn with_strength(mut self, strength: i32) -> Self {
        if strength < 0 {
            log::warn!("hero strength {} is negative; clamping to 0", strength);
        }
        self.strength = strength.max(0);
        self
    }

    pub fn with_must_survive(mut self, must_survive: bool) -> Self {
        self.must_survive = must_survive;
        self
    }

    pub fn with_allowed_jumps(mut self, allowed_jumps: u32) -> Self {
        self.allowed_jumps = allowed_jumps;
        self
    }

    pub fn with_multi_jump(mut self, multi_jump: bool) -> Self {
        self.multi_jump = multi_jump;
        self
    }

    pub fn is_invincible(&self) -> bool {
        self.invincible_remaining > 0.0
    }
}

impl Default for Hero {
    fn default() -> Self {
        Self::new()
    }
}

/// The antagonist role. Defeating one credits the score; touching one costs
/// hero strength.
pub struct Enemy {
    /// Strength cost inflicted on heroes; projectiles chip away at this.
    pub damage: i32,
    /// A crawling hero defeats this enemy instead of taking damage.
    pub defeat_by_crawl: bool,
    /// A jumping hero above this enemy defeats it instead of taking damage.
    pub defeat_by_jump: bool,
    /// Invincible heroes pass by without defeating this enemy.
    pub immune_to_invincibility: bool,
    /// Touching this enemy removes the hero outright, strength regardless.
    pub instant_defeat: bool,
    /// Runs after this enemy removes a hero.
    pub on_defeat_hero: Option<PairHook>,
    /// Runs when this enemy is defeated.
    pub on_defeated: Option<DefeatHook>,
}

impl Enemy {
    pub fn new() -> Self {
        Self {
            damage: 2,
            defeat_by_crawl: false,
            defeat_by_jump: false,
            immune_to_invincibility: false,
            instant_defeat: false,
            on_defeat_hero: None,
            on_defeated: None,
        }
    }

    pub fn with_damage(mut self, damage: i32) -> Self {
        self.damage = damage;
        self
    }

    pub fn with_defeat_by_crawl(mut self, value: bool) -> Self {
        self.defeat_by_crawl = value;
        self
    }

    pub fn with_defeat_by_jump(mut self, value: bool) -> Self {
        self.defeat_by_jump = value;
        self
    }

    pub fn with_immune_to_invincibility(mut self, value: bool) -> Self {
        self.immune_to_invincibility = value;
        self
    }

    pub fn with_instant_defeat(mut self, value: bool) -> Self {
        self.instant_defeat = value;
        self
    }

    pub fn with_on_defeat_hero(mut self, hook: PairHook) -> Self {
        self.on_defeat_hero = Some(hook);
        self
    }

    pub fn with_on_defeated(mut self, hook: DefeatHook) -> Self {
        self.on_defeated = Some(hook);
        self
    }
}

impl Default for Enemy {
    fn default() -> Self {
        Self::new()
    }
}

/// A collectible. Without a hook every touch collects; with one, the hook
/// decides (conditional pickups).
#[derive(Default)]
pub struct Goodie {
    pub on_collect: Option<CollectHook>,
}

impl Goodie {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_on_collect(mut self, hook: CollectHook) -> Self {
        self.on_collect = Some(hook);
        self
    }
}

/// A place heroes try to reach. Holds up to `capacity` of them.
pub struct Destination {
    pub capacity: u32,
    pub holding: u32,
    pub on_attempt_arrival: Option<ArrivalPredicate>,
}

impl Destination {
    pub fn new(capacity: u32) -> Self {
        if capacity == 0 {
            log::warn!("destination with capacity 0 will never accept a hero");
        }
        Self {
            capacity,
            holding: 0,
            on_attempt_arrival: None,
        }
    }

    pub fn with_on_attempt_arrival(mut self, predicate: ArrivalPredicate) -> Self {
        self.on_attempt_arrival = Some(predicate);
        self
    }

    /// Try to admit a hero. Full destinations and declined admissions leave
    /// `holding` untouched and return false; otherwise `holding` goes up by
    /// exactly one.
    pub fn receive(&mut self, hero: &Actor) -> bool {
        if self.holding >= self.capacity {
            return false;
        }
        if let Some(predicate) = &self.on_attempt_arrival {
            if !predicate(hero) {
                return false;
            }
        }
        self.holding += 1;
        true
    }
}

/// Terrain and props: walls, floors, platforms, bumpers.
#[derive(Default)]
pub struct Obstacle {
    /// Runs when a hero touches this obstacle.
    pub hero_collision: Option<PairHook>,
    /// Runs when an enemy touches this obstacle.
    pub enemy_collision: Option<PairHook>,
    /// Decides whether an incoming projectile is consumed; absent means
    /// always consumed.
    pub projectile_collision: Option<ProjectilePredicate>,
    /// Faces that restore a hero's jump on touch.
    pub jump_reenable_sides: Sides,
    /// Faces that weld a touching hero in place.
    pub sticky_sides: Sides,
}

impl Obstacle {
    pub fn new() -> Self {
        Self {
            jump_reenable_sides: Sides::TOP,
            ..Self::default()
        }
    }

    pub fn with_hero_collision(mut self, hook: PairHook) -> Self {
        self.hero_collision = Some(hook);
        self
    }

    pub fn with_enemy_collision(mut self, hook: PairHook) -> Self {
        self.enemy_collision = Some(hook);
        self
    }

    pub fn with_projectile_collision(mut self, predicate: ProjectilePredicate) -> Self {
        self.projectile_collision = Some(predicate);
        self
    }

    pub fn with_jump_reenable_sides(mut self, sides: Sides) -> Self {
        self.jump_reenable_sides = sides;
        self
    }

    pub fn with_sticky_sides(mut self, sides: Sides) -> Self {
        self.sticky_sides = sides;
        self
    }
}

/// An invisible trigger region; fires a hook, never blocks or harms.
#[derive(Default)]
pub struct Sensor {
    pub hero_collision: Option<PairHook>,
}

impl Sensor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_hero_collision(mut self, hook: PairHook) -> Self {
        self.hero_collision = Some(hook);
        self
    }
}

/// A tossed thing that damages enemies and is reclaimed to a pool.
pub struct Projectile {
    pub damage: i32,
    /// Where this projectile was tossed from; range is measured from here.
    pub origin: Vec2,
    /// Flight distance after which the projectile is silently reclaimed.
    pub range: f32,
    /// Whether colliding with another solid projectile removes this one.
    pub disappear_on_collide: bool,
    /// The tossing actor, credited as defeater for kills.
    pub owner: Option<ActorId>,
    /// Runs whenever this projectile is reclaimed.
    pub reclaimer: Option<ReclaimHook>,
}

impl Projectile {
    pub fn new() -> Self {
        Self {
            damage: 1,
            origin: Vec2::ZERO,
            range: f32::INFINITY,
            disappear_on_collide: true,
            owner: None,
            reclaimer: None,
        }
    }

    pub fn with_damage(mut self, damage: i32) -> Self {
        self.damage = damage;
        self
    }

    pub fn with_range(mut self, range: f32) -> Self {
        self.range = range;
        self
    }

    pub fn with_disappear_on_collide(mut self, value: bool) -> Self {
        self.disappear_on_collide = value;
        self
    }

    pub fn with_reclaimer(mut self, hook: ReclaimHook) -> Self {
        self.reclaimer = Some(hook);
        self
    }
}

impl Default for Projectile {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// The role variant itself
// ---------------------------------------------------------------------------

/// The behavioral variant attached to an actor. Dispatch over colliding
/// pairs matches exhaustively on these, so an unhandled pairing is a visible
/// decision, not an accident.
pub enum Role {
    Hero(Hero),
    Enemy(Enemy),
    Goodie(Goodie),
    Destination(Destination),
    Obstacle(Obstacle),
    Sensor(Sensor),
    Projectile(Projectile),
    Passive,
}

impl Role {
    /// The property tag this role contributes to its rule descriptor.
    pub fn tag(&self) -> RoleTags {
        match self {
            Role::Hero(_) => RoleTags::HERO,
            Role::Enemy(_) => RoleTags::ENEMY,
            Role::Goodie(_) => RoleTags::GOODIE,
            Role::Destination(_) => RoleTags::DESTINATION,
            Role::Obstacle(_) => RoleTags::OBSTACLE,
            Role::Sensor(_) => RoleTags::SENSOR,
            Role::Projectile(_) => RoleTags::PROJECTILE,
            Role::Passive => RoleTags::PASSIVE,
        }
    }

    /// Build the actor-local rule descriptor this role starts with.
    ///
    /// Enemies that are defeated by crawling or jumping phase through the
    /// matching transient hero tag, so the defeat lands without a bounce.
    pub fn collision_rules(&self) -> CollisionRules {
        let mut rules = CollisionRules {
            properties: self.tag(),
            ..CollisionRules::default()
        };
        if let Role::Enemy(enemy) = self {
            if enemy.defeat_by_crawl {
                rules.pass_through |= RoleTags::MID_CRAWL;
            }
            if enemy.defeat_by_jump {
                rules.pass_through |= RoleTags::MID_JUMP;
            }
        }
        rules
    }

    pub fn as_hero(&self) -> Option<&Hero> {
        match self {
            Role::Hero(h) => Some(h),
            _ => None,
        }
    }

    pub fn as_hero_mut(&mut self) -> Option<&mut Hero> {
        match self {
            Role::Hero(h) => Some(h),
            _ => None,
        }
    }

    pub fn as_enemy_mut(&mut self) -> Option<&mut Enemy> {
        match self {
            Role::Enemy(e) => Some(e),
            _ => None,
        }
    }

    pub fn as_destination_mut(&mut self) -> Option<&mut Destination> {
        match self {
            Role::Destination(d) => Some(d),
            _ => None,
        }
    }

    pub fn as_projectile_mut(&mut self) -> Option<&mut Projectile> {
        match self {
            Role::Projectile(p) => Some(p),
            _ => None,
        }
    }
}

impl Default for Role {
    fn default() -> Self {
        Role::Passive
    }
}

impl fmt::Debug for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Role::Hero(_) => "Hero",
            Role::Enemy(_) => "Enemy",
            Role::Goodie(_) => "Goodie",
            Role::Destination(_) => "Destination",
            Role::Obstacle(_) => "Obstacle",
            Role::Sensor(_) => "Sensor",
            Role::Projectile(_) => "Projectile",
            Role::Passive => "Passive",
        };
        f.write_str(name)
    }
}
