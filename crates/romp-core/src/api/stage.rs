//! The stage: the per-tick aggregate gluing scene, physics, queues, and
//! timers together, plus the hero operations (jump, crawl, toss) that cut
//! across roles, rules, and the physics body at once.

use std::collections::HashSet;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::api::types::{ActorId, SoundHandle, StageEvent};
use crate::components::actor::Actor;
use crate::components::role::{Role, RoleTags};
use crate::components::state::StateEvent;
use crate::core::physics::{BodyDesc, ColliderMaterial, CollisionPair, PhysicsWorld};
use crate::core::scene::Scene;
use crate::core::time::TimerQueue;
use crate::input::queue::{InputEvent, InputQueue};
use crate::systems::collisions::{self, CollisionCtx};
use crate::systems::motion;

/// Seconds after a jump during which sticky obstacles are ignored.
const STICKY_GRACE: f32 = 0.1;
/// Seconds the toss pose is held before toss-stopped fires.
const TOSS_WINDOW: f32 = 0.45;

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Stage configuration, loadable from JSON.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageConfig {
    /// Fixed timestep in seconds (default: 1/60).
    #[serde(default = "default_fixed_dt")]
    pub fixed_dt: f32,
    /// World width in game units.
    #[serde(default = "default_world_width")]
    pub world_width: f32,
    /// World height in game units.
    #[serde(default = "default_world_height")]
    pub world_height: f32,
    /// Gravity vector. Y-down worlds use positive Y for downward gravity.
    #[serde(default)]
    pub gravity: [f32; 2],
    /// Undrained-event threshold before a warning is logged.
    #[serde(default = "default_max_events")]
    pub max_events: usize,
}

fn default_fixed_dt() -> f32 {
    1.0 / 60.0
}

fn default_world_width() -> f32 {
    800.0
}

fn default_world_height() -> f32 {
    600.0
}

fn default_max_events() -> usize {
    64
}

impl Default for StageConfig {
    fn default() -> Self {
        Self {
            fixed_dt: default_fixed_dt(),
            world_width: default_world_width(),
            world_height: default_world_height(),
            gravity: [0.0, 0.0],
            max_events: default_max_events(),
        }
    }
}

impl StageConfig {
    /// Parse a configuration from a JSON string.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    fn gravity_vec(&self) -> Vec2 {
        Vec2::new(self.gravity[0], self.gravity[1])
    }

    /// Author mistakes are warnings with best-effort defaults, never errors.
    fn validated(mut self) -> Self {
        if self.fixed_dt <= 0.0 {
            log::warn!("fixed_dt {} is not positive; using 1/60", self.fixed_dt);
            self.fixed_dt = default_fixed_dt();
        }
        if self.world_width <= 0.0 || self.world_height <= 0.0 {
            log::warn!(
                "world {}x{} is degenerate; using 800x600",
                self.world_width,
                self.world_height
            );
            self.world_width = default_world_width();
            self.world_height = default_world_height();
        }
        if self.max_events == 0 {
            log::warn!("max_events 0 would warn every tick; using 64");
            self.max_events = default_max_events();
        }
        self
    }
}

// ---------------------------------------------------------------------------
// Audio
// ---------------------------------------------------------------------------

/// Playback queue with repeat throttling.
///
/// Contacts repeat at high frequency, so a handle still marked playing is
/// skipped. The host drains the queue each frame and reports completions
/// back with `mark_finished`.
pub struct AudioQueue {
    playing: HashSet<SoundHandle>,
    queued: Vec<SoundHandle>,
}

impl AudioQueue {
    pub fn new() -> Self {
        Self {
            playing: HashSet::new(),
            queued: Vec::new(),
        }
    }

    /// Request playback; skipped while the same handle is still playing.
    pub fn play(&mut self, handle: SoundHandle) {
        if self.playing.insert(handle) {
            self.queued.push(handle);
        }
    }

    /// The host reports a sound finished so it can be played again.
    pub fn mark_finished(&mut self, handle: SoundHandle) {
        self.playing.remove(&handle);
    }

    pub fn is_playing(&self, handle: SoundHandle) -> bool {
        self.playing.contains(&handle)
    }

    /// Drain all queued playback requests.
    pub fn drain(&mut self) -> Vec<SoundHandle> {
        std::mem::take(&mut self.queued)
    }
}

impl Default for AudioQueue {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Stage
// ---------------------------------------------------------------------------

/// Everything a running level owns. One `advance` call is one fixed tick:
/// movement intent, physics, collision dispatch, state sampling, timers,
/// deferred destruction, in that order, single-threaded.
pub struct Stage {
    pub config: StageConfig,
    pub scene: Scene,
    pub physics: PhysicsWorld,
    pub audio: AudioQueue,
    pub input: InputQueue,
    events: Vec<StageEvent>,
    timers: TimerQueue,
    contacts: Vec<CollisionPair>,
    defunct: Vec<ActorId>,
    tilt: Vec2,
    tick: u64,
    next_id: u32,
}

impl Stage {
    pub fn new(config: StageConfig) -> Self {
        let config = config.validated();
        let mut physics = PhysicsWorld::new(config.gravity_vec());
        physics.set_dt(config.fixed_dt);
        Self {
            config,
            scene: Scene::new(),
            physics,
            audio: AudioQueue::new(),
            input: InputQueue::new(),
            events: Vec::new(),
            timers: TimerQueue::new(),
            contacts: Vec::new(),
            defunct: Vec::new(),
            tilt: Vec2::ZERO,
            tick: 0,
            next_id: 1,
        }
    }

    /// Generate the next unique actor ID.
    pub fn next_id(&mut self) -> ActorId {
        let id = ActorId(self.next_id);
        self.next_id += 1;
        id
    }

    /// Add a bodiless actor to the scene.
    pub fn spawn(&mut self, actor: Actor) -> ActorId {
        let id = actor.id;
        self.scene.spawn(actor);
        id
    }

    /// Spawn an actor with a physics body, wiring id and rule tags into the
    /// simulation. The actor's position is taken from the body description.
    pub fn spawn_with_body(
        &mut self,
        actor: Actor,
        desc: BodyDesc,
        material: ColliderMaterial,
    ) -> ActorId {
        let id = actor.id;
        let body = self.physics.create_body(id, &desc, material);
        self.physics.set_rules(&body, id, &actor.rules);
        let mut actor = actor.with_body(body);
        actor.pos = desc.position;
        actor.rotation = desc.rotation;
        self.scene.spawn(actor);
        id
    }

    /// Scoring signals accumulated since the last drain.
    pub fn events(&self) -> &[StageEvent] {
        &self.events
    }

    /// Hand the accumulated signals to the host.
    pub fn drain_events(&mut self) -> Vec<StageEvent> {
        std::mem::take(&mut self.events)
    }

    /// Completed ticks since the stage was created.
    pub fn tick_count(&self) -> u64 {
        self.tick
    }

    /// Arm a deferred action for `seconds` from now, fired at a tick
    /// boundary. A guarded action is dropped if its actor is disabled by
    /// fire time.
    pub fn after(
        &mut self,
        seconds: f32,
        guard: Option<ActorId>,
        action: Box<dyn FnOnce(&mut Stage)>,
    ) {
        let fires_at = self.tick + self.ticks_in(seconds);
        self.timers.schedule(fires_at, guard, action);
    }

    fn ticks_in(&self, seconds: f32) -> u64 {
        ((seconds / self.config.fixed_dt).ceil() as u64).max(1)
    }

    // -- The tick --

    /// Run one fixed tick.
    pub fn advance(&mut self) {
        self.read_tilt();
        motion::drive_movement(&mut self.scene, &mut self.physics, self.tilt, self.config.fixed_dt);

        let mut contacts = std::mem::take(&mut self.contacts);
        contacts.clear();
        self.physics.step_into(&mut contacts);
        self.sync_bodies();
        for pair in contacts.iter().filter(|p| p.started) {
            self.dispatch_contact(pair.actor_a, pair.actor_b);
        }
        self.contacts = contacts;

        motion::sample_motion_states(&mut self.scene, &self.physics);
        self.tick_role_clocks();
        if self.events.len() > self.config.max_events {
            log::warn!(
                "{} stage events queued; the host is not draining them",
                self.events.len()
            );
        }
        self.run_due_timers();
        self.reap_defunct();
        self.tick += 1;
    }

    /// Run the collision resolver for one contact pair. `advance` calls
    /// this for every reported begin-contact; it is public so hosts and
    /// tests can feed synthetic contacts.
    pub fn dispatch_contact(&mut self, a: ActorId, b: ActorId) -> bool {
        let mut ctx = CollisionCtx {
            scene: &mut self.scene,
            physics: &mut self.physics,
            events: &mut self.events,
            audio: &mut self.audio,
            defunct: &mut self.defunct,
        };
        collisions::resolve_contact(&mut ctx, a, b)
    }

    /// Advance per-tick appearance: select each enabled actor's cue from
    /// its current state and move frame timers along. The host calls this
    /// once per rendered frame.
    pub fn prerender(&mut self, elapsed_ms: f32) {
        let dt = elapsed_ms / 1000.0;
        for actor in self.scene.iter_mut() {
            if !actor.enabled {
                continue;
            }
            let state = *actor.state.current();
            actor.appearance.select_for_state(&state);
            actor.appearance.tick(dt);
        }
    }

    fn read_tilt(&mut self) {
        // pointer/key events are for game authors, who read the queue
        // before handing the tick over; the stage only keeps the latest
        // tilt reading
        for event in self.input.drain() {
            if let InputEvent::Tilt { x, y } = event {
                self.tilt = Vec2::new(x, y);
            }
        }
    }

    fn sync_bodies(&mut self) {
        for actor in self.scene.iter_mut() {
            if let Some(body) = &actor.body {
                let (pos, rotation) = self.physics.body_position(body);
                actor.pos = pos;
                actor.rotation = rotation;
            }
        }
    }

    /// Hero countdowns and projectile range expiry.
    fn tick_role_clocks(&mut self) {
        let dt = self.config.fixed_dt;
        for actor in self.scene.iter_mut() {
            if !actor.enabled {
                continue;
            }
            let mut invincibility_ended = false;
            if let Role::Hero(hero) = &mut actor.role {
                if hero.sticky_grace > 0.0 {
                    hero.sticky_grace -= dt;
                }
                if hero.invincible_remaining > 0.0 {
                    hero.invincible_remaining -= dt;
                    if hero.invincible_remaining <= 0.0 {
                        hero.invincible_remaining = 0.0;
                        invincibility_ended = true;
                    }
                }
            }
            if invincibility_ended {
                actor.apply_state(StateEvent::InvincibleStop);
            }
        }

        let mut expired = Vec::new();
        for actor in self.scene.iter() {
            if !actor.enabled {
                continue;
            }
            if let Role::Projectile(projectile) = &actor.role {
                if projectile.range.is_finite()
                    && (actor.pos - projectile.origin).length() > projectile.range
                {
                    expired.push(actor.id);
                }
            }
        }
        if !expired.is_empty() {
            let mut ctx = CollisionCtx {
                scene: &mut self.scene,
                physics: &mut self.physics,
                events: &mut self.events,
                audio: &mut self.audio,
                defunct: &mut self.defunct,
            };
            for id in expired {
                collisions::reclaim_projectile(&mut ctx, id);
            }
        }
    }

    fn run_due_timers(&mut self) {
        let due = self.timers.take_due(self.tick);
        for scheduled in due {
            if let Some(guard) = scheduled.guard {
                let alive = self.scene.get(guard).map(|a| a.enabled).unwrap_or(false);
                // cancellation is this check, never preemption
                if !alive {
                    continue;
                }
            }
            (scheduled.action)(self);
        }
    }

    fn reap_defunct(&mut self) {
        let defunct = std::mem::take(&mut self.defunct);
        for id in defunct {
            let reusable = self.scene.get(id).map(|a| a.reusable).unwrap_or(true);
            if reusable {
                // parked for reuse; the body stays, disabled
                continue;
            }
            if let Some(actor) = self.scene.despawn(id) {
                if let Some(body) = actor.body {
                    self.physics.remove_body(&body);
                }
            }
        }
    }

    // -- Removal & reuse --

    /// Soft-remove an actor: disabled immediately, body destruction
    /// deferred to the tick boundary (reusable actors are only parked).
    pub fn remove(&mut self, id: ActorId) {
        let mut ctx = CollisionCtx {
            scene: &mut self.scene,
            physics: &mut self.physics,
            events: &mut self.events,
            audio: &mut self.audio,
            defunct: &mut self.defunct,
        };
        collisions::soft_remove(&mut ctx, id);
    }

    /// Defeat an enemy outside of a collision, e.g. clearing a wave.
    /// Crediting is the caller's choice.
    pub fn defeat_enemy(&mut self, enemy_id: ActorId, credit_score: bool, defeater: Option<ActorId>) {
        let mut ctx = CollisionCtx {
            scene: &mut self.scene,
            physics: &mut self.physics,
            events: &mut self.events,
            audio: &mut self.audio,
            defunct: &mut self.defunct,
        };
        collisions::defeat_enemy(&mut ctx, enemy_id, credit_score, defeater);
    }

    /// Recompute an actor's rule descriptor from its role (after toggling
    /// role flags at runtime) and push the result to the physics filter.
    pub fn refresh_rules(&mut self, id: ActorId) {
        let synced = {
            let Some(actor) = self.scene.get_mut(id) else {
                return;
            };
            actor.refresh_rules();
            actor.body.map(|body| (body, actor.id, actor.rules))
        };
        if let Some((body, id, rules)) = synced {
            self.physics.set_rules(&body, id, &rules);
        }
    }

    /// Bring a parked reusable actor back into play at a position.
    pub fn reactivate(&mut self, id: ActorId, pos: Vec2) {
        let body = {
            let Some(actor) = self.scene.get_mut(id) else {
                return;
            };
            actor.enabled = true;
            actor.pos = pos;
            actor.state.reset();
            actor.body
        };
        if let Some(body) = body {
            self.physics.set_enabled(&body, true);
            self.physics.set_transform(&body, pos, 0.0);
            self.physics.set_velocity(&body, Vec2::ZERO);
        }
    }

    // -- Hero operations --

    /// Jump: refuse when the counter is spent, otherwise add the mid-jump
    /// tag, add the impulse to current velocity, fire jump-started, break
    /// any sticky weld, and suspend sticky formation for a grace window.
    pub fn hero_jump(&mut self, hero_id: ActorId, impulse: Vec2) -> bool {
        let broken_joint = {
            let Some(actor) = self.scene.get_mut(hero_id) else {
                return false;
            };
            if !actor.enabled {
                return false;
            }
            let jumping = actor.state.current().jumping;
            let Some(hero) = actor.role.as_hero_mut() else {
                return false;
            };
            if !jumping {
                hero.jumps_taken = 0;
            }
            if !hero.multi_jump && hero.jumps_taken >= hero.allowed_jumps {
                // refused: no velocity change, no state event
                return false;
            }
            hero.jumps_taken += 1;
            hero.sticky_grace = STICKY_GRACE;
            hero.sticky_joint.take()
        };
        if let Some(joint) = broken_joint {
            self.physics.remove_joint(joint);
        }

        let (synced, jump_sound) = {
            let Some(actor) = self.scene.get_mut(hero_id) else {
                return false;
            };
            actor.rules.properties.insert(RoleTags::MID_JUMP);
            actor.apply_state(StateEvent::JumpStart);
            (
                actor.body.map(|body| (body, actor.id, actor.rules)),
                actor.sounds.jump,
            )
        };
        if let Some(sound) = jump_sound {
            self.audio.play(sound);
        }
        if let Some((body, id, rules)) = synced {
            self.physics.set_rules(&body, id, &rules);
            let velocity = self.physics.velocity(&body);
            self.physics.set_velocity(&body, velocity + impulse);
        }
        true
    }

    /// Start crawling: add the mid-crawl tag, rotate the body by the given
    /// delta, fire crawl-started. No-op when already crawling.
    pub fn hero_crawl_on(&mut self, hero_id: ActorId, rotation: f32) -> bool {
        let synced = {
            let Some(actor) = self.scene.get_mut(hero_id) else {
                return false;
            };
            if !actor.enabled || actor.state.current().crawling {
                return false;
            }
            if actor.role.as_hero().is_none() {
                return false;
            }
            actor.rules.properties.insert(RoleTags::MID_CRAWL);
            actor.apply_state(StateEvent::CrawlStart);
            actor.rotation += rotation;
            actor
                .body
                .map(|body| (body, actor.id, actor.rules, actor.pos, actor.rotation))
        };
        if let Some((body, id, rules, pos, rotation)) = synced {
            self.physics.set_rules(&body, id, &rules);
            self.physics.set_transform(&body, pos, rotation);
        }
        true
    }

    /// Stop crawling: the mirror of `hero_crawl_on`, rotating back by the
    /// given delta. No-op when not crawling.
    pub fn hero_crawl_off(&mut self, hero_id: ActorId, rotation: f32) -> bool {
        let synced = {
            let Some(actor) = self.scene.get_mut(hero_id) else {
                return false;
            };
            if !actor.enabled || !actor.state.current().crawling {
                return false;
            }
            if actor.role.as_hero().is_none() {
                return false;
            }
            actor.rules.properties.remove(RoleTags::MID_CRAWL);
            actor.apply_state(StateEvent::CrawlStop);
            actor.rotation -= rotation;
            actor
                .body
                .map(|body| (body, actor.id, actor.rules, actor.pos, actor.rotation))
        };
        if let Some((body, id, rules, pos, rotation)) = synced {
            self.physics.set_rules(&body, id, &rules);
            self.physics.set_transform(&body, pos, rotation);
        }
        true
    }

    /// Grant invincibility seconds, stacking with any remaining.
    pub fn hero_invincible_for(&mut self, hero_id: ActorId, seconds: f32) {
        let Some(actor) = self.scene.get_mut(hero_id) else {
            return;
        };
        let mut started = false;
        if let Some(hero) = actor.role.as_hero_mut() {
            let was_invincible = hero.invincible_remaining > 0.0;
            hero.invincible_remaining += seconds.max(0.0);
            started = !was_invincible && hero.invincible_remaining > 0.0;
        }
        if started {
            actor.apply_state(StateEvent::InvincibleStart);
        }
    }

    // -- Tossing --

    /// Launch a pooled projectile from an owner: reactivate it at the
    /// owner's position plus `offset`, stamp origin and owner for range and
    /// defeat attribution, and hold the owner's toss pose for a short
    /// window ended by a guarded timer.
    pub fn toss(
        &mut self,
        projectile_id: ActorId,
        owner_id: ActorId,
        offset: Vec2,
        velocity: Vec2,
    ) -> bool {
        let owner_pos = match self.scene.get(owner_id) {
            Some(owner) if owner.enabled => owner.pos,
            _ => return false,
        };
        let start = owner_pos + offset;

        let body = {
            let Some(actor) = self.scene.get_mut(projectile_id) else {
                return false;
            };
            let Some(projectile) = actor.role.as_projectile_mut() else {
                return false;
            };
            projectile.origin = start;
            projectile.owner = Some(owner_id);
            actor.enabled = true;
            actor.pos = start;
            actor.state.reset();
            actor.body
        };
        if let Some(body) = body {
            self.physics.set_enabled(&body, true);
            self.physics.set_transform(&body, start, 0.0);
            self.physics.set_velocity(&body, velocity);
        }

        if let Some(sound) = self.scene.get(owner_id).and_then(|o| o.sounds.toss) {
            self.audio.play(sound);
        }
        if let Some(owner) = self.scene.get_mut(owner_id) {
            owner.apply_state(StateEvent::TossStart);
        }
        let fires_at = self.tick + self.ticks_in(TOSS_WINDOW);
        self.timers.schedule(
            fires_at,
            Some(owner_id),
            Box::new(move |stage| {
                if let Some(owner) = stage.scene.get_mut(owner_id) {
                    owner.apply_state(StateEvent::TossStop);
                }
            }),
        );
        true
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    use crate::components::movement::Movement;
    use crate::components::role::{Goodie, Hero, Projectile};
    use crate::core::physics::{ColliderDesc, ColliderMaterial};

    fn stage() -> Stage {
        Stage::new(StageConfig::default())
    }

    #[test]
    fn config_from_json_fills_defaults() {
        let config = StageConfig::from_json(r#"{ "gravity": [0.0, 981.0] }"#).unwrap();
        assert_eq!(config.gravity, [0.0, 981.0]);
        assert!((config.fixed_dt - 1.0 / 60.0).abs() < 1e-6);
        assert_eq!(config.world_width, 800.0);
    }

    #[test]
    fn bad_config_is_repaired_not_fatal() {
        let stage = Stage::new(StageConfig {
            fixed_dt: -1.0,
            world_width: 0.0,
            world_height: 0.0,
            gravity: [0.0, 0.0],
            max_events: 0,
        });
        assert!((stage.config.fixed_dt - 1.0 / 60.0).abs() < 1e-6);
        assert_eq!(stage.config.world_width, 800.0);
        assert_eq!(stage.config.max_events, 64);
    }

    #[test]
    fn audio_queue_throttles_repeats() {
        let mut audio = AudioQueue::new();
        audio.play(SoundHandle(5));
        audio.play(SoundHandle(5));
        assert_eq!(audio.drain(), vec![SoundHandle(5)]);

        // still playing: further requests stay skipped
        audio.play(SoundHandle(5));
        assert!(audio.drain().is_empty());

        audio.mark_finished(SoundHandle(5));
        audio.play(SoundHandle(5));
        assert_eq!(audio.drain(), vec![SoundHandle(5)]);
    }

    #[test]
    fn full_tick_collects_goodie_on_contact() {
        let mut stage = stage();
        let hero_id = stage.next_id();
        let hero = stage.spawn_with_body(
            Actor::new(hero_id).with_role(Role::Hero(Hero::new())).with_movement(
                Movement::Manual { velocity: Vec2::new(120.0, 0.0) },
            ),
            BodyDesc::dynamic(ColliderDesc::Ball { radius: 5.0 })
                .with_position(Vec2::ZERO)
                .with_gravity_scale(0.0),
            ColliderMaterial::default(),
        );
        let goodie_id = stage.next_id();
        let goodie = stage.spawn_with_body(
            Actor::new(goodie_id).with_role(Role::Goodie(Goodie::new())),
            BodyDesc::fixed(ColliderDesc::Ball { radius: 5.0 })
                .with_position(Vec2::new(50.0, 0.0))
                .with_sensor(true),
            ColliderMaterial::default(),
        );

        for _ in 0..60 {
            stage.advance();
        }

        assert!(!stage.scene.get(goodie).unwrap().enabled);
        assert!(stage
            .drain_events()
            .contains(&StageEvent::GoodieCollected { goodie, hero }));
    }

    #[test]
    fn removed_actor_is_reaped_at_tick_boundary() {
        let mut stage = stage();
        let id = stage.next_id();
        stage.spawn_with_body(
            Actor::new(id),
            BodyDesc::dynamic(ColliderDesc::Ball { radius: 5.0 }),
            ColliderMaterial::default(),
        );
        assert_eq!(stage.physics.body_count(), 1);

        stage.remove(id);
        // still present mid-tick, only disabled
        assert_eq!(stage.scene.len(), 1);
        assert!(!stage.scene.get(id).unwrap().enabled);

        stage.advance();
        assert_eq!(stage.scene.len(), 0);
        assert_eq!(stage.physics.body_count(), 0);
    }

    #[test]
    fn guarded_timer_dies_with_its_actor() {
        let mut stage = stage();
        let id = stage.spawn(Actor::new(ActorId(1)));
        let fired = Rc::new(RefCell::new(false));
        let sink = fired.clone();
        stage.after(
            0.05,
            Some(id),
            Box::new(move |_| {
                *sink.borrow_mut() = true;
            }),
        );

        stage.remove(id);
        for _ in 0..10 {
            stage.advance();
        }
        assert!(!*fired.borrow(), "guard must drop the action");
    }

    #[test]
    fn unguarded_timer_fires_once() {
        let mut stage = stage();
        let count = Rc::new(RefCell::new(0));
        let sink = count.clone();
        stage.after(
            0.05,
            None,
            Box::new(move |_| {
                *sink.borrow_mut() += 1;
            }),
        );
        for _ in 0..10 {
            stage.advance();
        }
        assert_eq!(*count.borrow(), 1);
    }

    #[test]
    fn toss_window_opens_and_closes() {
        let mut stage = stage();
        let owner_id = stage.next_id();
        let owner = stage.spawn(Actor::new(owner_id).with_role(Role::Hero(Hero::new())));
        let shot_id = stage.next_id();
        let shot = stage.spawn_with_body(
            Actor::new(shot_id)
                .with_role(Role::Projectile(Projectile::new()))
                .with_reusable(true),
            BodyDesc::dynamic(ColliderDesc::Ball { radius: 2.0 }).with_gravity_scale(0.0),
            ColliderMaterial::default(),
        );
        stage.remove(shot); // parked in the pool
        stage.advance();
        assert_eq!(stage.scene.len(), 2, "reusable actors are never reaped");

        assert!(stage.toss(shot, owner, Vec2::new(6.0, 0.0), Vec2::new(80.0, 0.0)));
        assert!(stage.scene.get(shot).unwrap().enabled);
        assert!(stage.scene.get(owner).unwrap().state.current().tossing);

        for _ in 0..30 {
            stage.advance();
        }
        assert!(!stage.scene.get(owner).unwrap().state.current().tossing);
    }

    #[test]
    fn projectile_expires_beyond_range() {
        let mut stage = stage();
        let owner_id = stage.next_id();
        let owner = stage.spawn(Actor::new(owner_id).with_role(Role::Hero(Hero::new())));
        let reclaimed = Rc::new(RefCell::new(0));
        let sink = reclaimed.clone();
        let shot_id = stage.next_id();
        let shot = stage.spawn_with_body(
            Actor::new(shot_id)
                .with_role(Role::Projectile(
                    Projectile::new().with_range(40.0).with_reclaimer(Box::new(move |_| {
                        *sink.borrow_mut() += 1;
                    })),
                ))
                .with_reusable(true),
            BodyDesc::dynamic(ColliderDesc::Ball { radius: 2.0 }).with_gravity_scale(0.0),
            ColliderMaterial::default(),
        );

        stage.toss(shot, owner, Vec2::ZERO, Vec2::new(300.0, 0.0));
        for _ in 0..30 {
            stage.advance();
        }

        assert!(!stage.scene.get(shot).unwrap().enabled);
        assert_eq!(*reclaimed.borrow(), 1);
        assert!(stage.events().is_empty(), "range expiry signals nothing");
    }

    #[test]
    fn invincibility_counts_down_to_a_stop_event() {
        let mut stage = stage();
        let hero = stage.spawn(Actor::new(ActorId(1)).with_role(Role::Hero(Hero::new())));
        stage.hero_invincible_for(hero, 0.05);
        assert!(stage.scene.get(hero).unwrap().state.current().invincible);

        for _ in 0..10 {
            stage.advance();
        }
        let actor = stage.scene.get(hero).unwrap();
        assert!(!actor.state.current().invincible);
        assert_eq!(actor.role.as_hero().unwrap().invincible_remaining, 0.0);
    }

    #[test]
    fn crawl_round_trip_restores_rotation() {
        let mut stage = stage();
        let hero_id = stage.next_id();
        let hero = stage.spawn_with_body(
            Actor::new(hero_id).with_role(Role::Hero(Hero::new())),
            BodyDesc::dynamic(ColliderDesc::Ball { radius: 5.0 }).with_gravity_scale(0.0),
            ColliderMaterial::default(),
        );

        assert!(stage.hero_crawl_on(hero, 1.5));
        assert!(!stage.hero_crawl_on(hero, 1.5), "already crawling");
        let actor = stage.scene.get(hero).unwrap();
        assert!(actor.state.current().crawling);
        assert!(actor.rules.properties.contains(RoleTags::MID_CRAWL));
        assert!((actor.rotation - 1.5).abs() < 1e-6);

        assert!(stage.hero_crawl_off(hero, 1.5));
        let actor = stage.scene.get(hero).unwrap();
        assert!(!actor.state.current().crawling);
        assert!(!actor.rules.properties.contains(RoleTags::MID_CRAWL));
        assert!(actor.rotation.abs() < 1e-6);
    }

    #[test]
    fn multi_jump_ignores_the_counter() {
        let mut stage = stage();
        let hero_id = stage.next_id();
        let hero = stage.spawn_with_body(
            Actor::new(hero_id).with_role(Role::Hero(Hero::new().with_multi_jump(true))),
            BodyDesc::dynamic(ColliderDesc::Ball { radius: 5.0 }).with_gravity_scale(0.0),
            ColliderMaterial::default(),
        );
        for _ in 0..5 {
            assert!(stage.hero_jump(hero, Vec2::new(0.0, -10.0)));
        }
    }
}
