//! The collision resolver.
//!
//! Consumes contact-begin pairs from the physics step, applies the
//! exemption algebra over both actors' rule descriptors, and runs the
//! dominant role's pairwise semantics. Handlers may disable actors or
//! retag rule sets mid-batch; later pairs in the same batch see those
//! mutations, which is why every entry point re-checks `enabled`.

use glam::Vec2;

use crate::api::stage::AudioQueue;
use crate::api::types::{ActorId, StageEvent};
use crate::components::role::{Role, RoleTags, Sides};
use crate::components::state::StateEvent;
use crate::core::physics::{JointDesc, PhysicsWorld};
use crate::core::scene::Scene;

/// Split-borrowed view of the stage that collision handlers may touch.
pub struct CollisionCtx<'a> {
    pub scene: &'a mut Scene,
    pub physics: &'a mut PhysicsWorld,
    pub events: &'a mut Vec<StageEvent>,
    pub audio: &'a mut AudioQueue,
    pub defunct: &'a mut Vec<ActorId>,
}

/// Role discriminant, for dominance selection and branch dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RoleKind {
    Hero,
    Enemy,
    Goodie,
    Destination,
    Obstacle,
    Sensor,
    Projectile,
    Passive,
}

fn kind_of(role: &Role) -> RoleKind {
    match role {
        Role::Hero(_) => RoleKind::Hero,
        Role::Enemy(_) => RoleKind::Enemy,
        Role::Goodie(_) => RoleKind::Goodie,
        Role::Destination(_) => RoleKind::Destination,
        Role::Obstacle(_) => RoleKind::Obstacle,
        Role::Sensor(_) => RoleKind::Sensor,
        Role::Projectile(_) => RoleKind::Projectile,
        Role::Passive => RoleKind::Passive,
    }
}

/// Handle one reported contact. Returns whether any handler ran.
///
/// Dominance: a hero side dispatches first, then a projectile side;
/// obstacles only dispatch against enemies. Everything else is a
/// deliberate no-op.
pub fn resolve_contact(ctx: &mut CollisionCtx, a: ActorId, b: ActorId) -> bool {
    let (rules_a, rules_b, kind_a, kind_b) = {
        let (Some(x), Some(y)) = (ctx.scene.get(a), ctx.scene.get(b)) else {
            return false;
        };
        if !x.enabled || !y.enabled {
            return false;
        }
        (x.rules, y.rules, kind_of(&x.role), kind_of(&y.role))
    };
    // the physics filter already drops exempt pairs, but handlers earlier
    // in this batch may have retagged either side
    if rules_a.exempts(&rules_b) {
        return false;
    }
    match (kind_a, kind_b) {
        (RoleKind::Hero, _) => hero_collide(ctx, a, b, kind_b),
        (_, RoleKind::Hero) => hero_collide(ctx, b, a, kind_a),
        (RoleKind::Projectile, _) => projectile_collide(ctx, a, b, kind_b),
        (_, RoleKind::Projectile) => projectile_collide(ctx, b, a, kind_a),
        (RoleKind::Obstacle, RoleKind::Enemy) => obstacle_enemy(ctx, a, b),
        (RoleKind::Enemy, RoleKind::Obstacle) => obstacle_enemy(ctx, b, a),
        _ => false,
    }
}

// ---------------------------------------------------------------------------
// Hero dispatch
// ---------------------------------------------------------------------------

fn hero_collide(ctx: &mut CollisionCtx, hero_id: ActorId, other_id: ActorId, other: RoleKind) -> bool {
    match other {
        RoleKind::Enemy => hero_enemy(ctx, hero_id, other_id),
        RoleKind::Obstacle => hero_obstacle(ctx, hero_id, other_id),
        RoleKind::Destination => hero_destination(ctx, hero_id, other_id),
        RoleKind::Sensor => hero_sensor(ctx, hero_id, other_id),
        RoleKind::Goodie => hero_goodie(ctx, hero_id, other_id),
        // hero-hero and hero-projectile pairs are a documented scope limit
        // of this dispatch layer; passive bodies are plain scenery
        RoleKind::Hero | RoleKind::Projectile | RoleKind::Passive => false,
    }
}

fn hero_enemy(ctx: &mut CollisionCtx, hero_id: ActorId, enemy_id: ActorId) -> bool {
    enum Outcome {
        HeroRemoved,
        EnemyDefeated,
        Shrugged,
    }

    let outcome = {
        let Some((hero_actor, enemy_actor)) = ctx.scene.pair_mut(hero_id, enemy_id) else {
            return false;
        };
        let hero_state = *hero_actor.state.current();
        // Y-down: smaller y means the hero is above the enemy
        let hero_above = hero_actor.pos.y <= enemy_actor.pos.y;
        let Role::Enemy(enemy) = &enemy_actor.role else {
            return false;
        };
        let Role::Hero(hero) = &mut hero_actor.role else {
            return false;
        };

        if enemy.instant_defeat {
            Outcome::HeroRemoved
        } else if hero.is_invincible() {
            if enemy.immune_to_invincibility {
                Outcome::Shrugged
            } else {
                Outcome::EnemyDefeated
            }
        } else if hero_state.crawling && enemy.defeat_by_crawl {
            Outcome::EnemyDefeated
        } else if hero_state.jumping && enemy.defeat_by_jump && hero_above {
            Outcome::EnemyDefeated
        } else if enemy.damage >= hero.strength {
            Outcome::HeroRemoved
        } else {
            hero.strength -= enemy.damage;
            Outcome::EnemyDefeated
        }
    };

    match outcome {
        Outcome::HeroRemoved => remove_hero_by_enemy(ctx, hero_id, enemy_id),
        Outcome::EnemyDefeated => defeat_enemy(ctx, enemy_id, true, Some(hero_id)),
        Outcome::Shrugged => {}
    }
    true
}

/// Remove a hero downed by an enemy: removal first, then the enemy's hook,
/// then the session signal (level loss when the hero had to survive).
fn remove_hero_by_enemy(ctx: &mut CollisionCtx, hero_id: ActorId, enemy_id: ActorId) {
    let must_survive = ctx
        .scene
        .get(hero_id)
        .and_then(|h| h.role.as_hero())
        .map(|h| h.must_survive)
        .unwrap_or(false);

    soft_remove(ctx, hero_id);

    let hook = ctx
        .scene
        .get_mut(enemy_id)
        .and_then(|e| e.role.as_enemy_mut())
        .and_then(|e| e.on_defeat_hero.take());
    if let Some(mut hook) = hook {
        if let Some((enemy_actor, hero_actor)) = ctx.scene.pair_mut(enemy_id, hero_id) {
            hook(enemy_actor, hero_actor);
        }
        if let Some(enemy) = ctx.scene.get_mut(enemy_id).and_then(|e| e.role.as_enemy_mut()) {
            enemy.on_defeat_hero = Some(hook);
        }
    }

    if must_survive {
        ctx.events.push(StageEvent::LevelLost);
    } else {
        ctx.events.push(StageEvent::HeroDefeated { hero: hero_id, enemy: enemy_id });
    }
}

fn hero_obstacle(ctx: &mut CollisionCtx, hero_id: ActorId, obstacle_id: ActorId) -> bool {
    // contacts repeat at high frequency; the audio queue throttles replays
    if let Some(sound) = ctx.scene.get(obstacle_id).and_then(|o| o.sounds.collide) {
        ctx.audio.play(sound);
    }

    let hook = ctx.scene.get_mut(obstacle_id).and_then(|o| match &mut o.role {
        Role::Obstacle(obstacle) => obstacle.hero_collision.take(),
        _ => None,
    });
    if let Some(mut hook) = hook {
        if let Some((obstacle_actor, hero_actor)) = ctx.scene.pair_mut(obstacle_id, hero_id) {
            hook(obstacle_actor, hero_actor);
        }
        if let Some(o) = ctx.scene.get_mut(obstacle_id) {
            if let Role::Obstacle(obstacle) = &mut o.role {
                obstacle.hero_collision = Some(hook);
            }
        }
    }

    let (reenable_sides, sticky_sides) = match ctx.scene.get(obstacle_id).map(|o| &o.role) {
        Some(Role::Obstacle(o)) => (o.jump_reenable_sides, o.sticky_sides),
        _ => return true,
    };
    let Some(geometry) = side_geometry(ctx, hero_id, obstacle_id) else {
        return true;
    };
    let (jumping, multi_jump, grace_active, stuck) = {
        let Some(hero_actor) = ctx.scene.get(hero_id) else {
            return true;
        };
        let jumping = hero_actor.state.current().jumping;
        match hero_actor.role.as_hero() {
            Some(hero) => (
                jumping,
                hero.multi_jump,
                hero.sticky_grace > 0.0,
                hero.sticky_joint.is_some(),
            ),
            None => return true,
        }
    };

    if (jumping || multi_jump) && touches_any(&geometry, reenable_sides) {
        land_hero(ctx, hero_id);
    }
    if !sticky_sides.is_empty() && !grace_active && !stuck && touches_any(&geometry, sticky_sides) {
        stick_hero(ctx, hero_id, obstacle_id);
    }
    true
}

fn hero_destination(ctx: &mut CollisionCtx, hero_id: ActorId, destination_id: ActorId) -> bool {
    let accepted = {
        let Some((destination_actor, hero_actor)) = ctx.scene.pair_mut(destination_id, hero_id)
        else {
            return false;
        };
        match &mut destination_actor.role {
            Role::Destination(destination) => destination.receive(hero_actor),
            _ => return false,
        }
    };
    if accepted {
        if let Some(sound) = ctx.scene.get(destination_id).and_then(|d| d.sounds.arrive) {
            ctx.audio.play(sound);
        }
        ctx.events.push(StageEvent::Arrived { destination: destination_id, hero: hero_id });
        soft_remove(ctx, hero_id);
    }
    true
}

fn hero_sensor(ctx: &mut CollisionCtx, hero_id: ActorId, sensor_id: ActorId) -> bool {
    let hook = ctx.scene.get_mut(sensor_id).and_then(|s| match &mut s.role {
        Role::Sensor(sensor) => sensor.hero_collision.take(),
        _ => None,
    });
    if let Some(mut hook) = hook {
        if let Some((sensor_actor, hero_actor)) = ctx.scene.pair_mut(sensor_id, hero_id) {
            hook(sensor_actor, hero_actor);
        }
        if let Some(s) = ctx.scene.get_mut(sensor_id) {
            if let Role::Sensor(sensor) = &mut s.role {
                sensor.hero_collision = Some(hook);
            }
        }
    }
    true
}

fn hero_goodie(ctx: &mut CollisionCtx, hero_id: ActorId, goodie_id: ActorId) -> bool {
    let hook = ctx.scene.get_mut(goodie_id).and_then(|g| match &mut g.role {
        Role::Goodie(goodie) => goodie.on_collect.take(),
        _ => None,
    });
    let collected = match hook {
        Some(mut hook) => {
            let collected = ctx
                .scene
                .pair_mut(goodie_id, hero_id)
                .map(|(goodie_actor, hero_actor)| hook(goodie_actor, hero_actor))
                .unwrap_or(false);
            if let Some(g) = ctx.scene.get_mut(goodie_id) {
                if let Role::Goodie(goodie) = &mut g.role {
                    goodie.on_collect = Some(hook);
                }
            }
            collected
        }
        // no hook means a plain pickup
        None => true,
    };
    if collected {
        soft_remove(ctx, goodie_id);
        ctx.events.push(StageEvent::GoodieCollected { goodie: goodie_id, hero: hero_id });
    }
    true
}

// ---------------------------------------------------------------------------
// Projectile dispatch
// ---------------------------------------------------------------------------

fn projectile_collide(
    ctx: &mut CollisionCtx,
    projectile_id: ActorId,
    other_id: ActorId,
    other: RoleKind,
) -> bool {
    match other {
        RoleKind::Obstacle => projectile_obstacle(ctx, projectile_id, other_id),
        RoleKind::Projectile => projectile_projectile(ctx, projectile_id, other_id),
        RoleKind::Enemy => projectile_enemy(ctx, projectile_id, other_id),
        // projectiles only care about what they can break or hurt
        RoleKind::Hero
        | RoleKind::Goodie
        | RoleKind::Destination
        | RoleKind::Sensor
        | RoleKind::Passive => false,
    }
}

fn projectile_obstacle(ctx: &mut CollisionCtx, projectile_id: ActorId, obstacle_id: ActorId) -> bool {
    let consumed = {
        let (Some(obstacle_actor), Some(projectile_actor)) =
            (ctx.scene.get(obstacle_id), ctx.scene.get(projectile_id))
        else {
            return false;
        };
        match &obstacle_actor.role {
            Role::Obstacle(obstacle) => match &obstacle.projectile_collision {
                Some(predicate) => predicate(obstacle_actor, projectile_actor),
                // no predicate: walls stop projectiles
                None => true,
            },
            _ => return false,
        }
    };
    if consumed {
        reclaim_projectile(ctx, projectile_id);
    }
    true
}

fn projectile_projectile(ctx: &mut CollisionCtx, projectile_id: ActorId, other_id: ActorId) -> bool {
    let disappear = match ctx.scene.get(projectile_id).map(|p| &p.role) {
        Some(Role::Projectile(p)) => p.disappear_on_collide,
        _ => return false,
    };
    if !disappear {
        return true;
    }
    // solid projectiles cancel each other; sensor-marked ones pass through
    let other_solid = ctx
        .scene
        .get(other_id)
        .and_then(|o| o.body)
        .map(|b| !ctx.physics.is_sensor(&b))
        .unwrap_or(false);
    if other_solid {
        reclaim_projectile(ctx, projectile_id);
    }
    true
}

fn projectile_enemy(ctx: &mut CollisionCtx, projectile_id: ActorId, enemy_id: ActorId) -> bool {
    let (damage, owner) = match ctx.scene.get(projectile_id).map(|p| &p.role) {
        Some(Role::Projectile(p)) => (p.damage, p.owner),
        _ => return false,
    };
    let remaining = {
        let Some(enemy_actor) = ctx.scene.get_mut(enemy_id) else {
            return false;
        };
        match &mut enemy_actor.role {
            Role::Enemy(enemy) => {
                enemy.damage -= damage;
                Some(enemy.damage)
            }
            _ => None,
        }
    };
    if let Some(remaining) = remaining {
        if remaining <= 0 {
            // the kill goes to whoever tossed this projectile
            defeat_enemy(ctx, enemy_id, true, owner);
        }
    }
    // spent either way
    reclaim_projectile(ctx, projectile_id);
    true
}

// ---------------------------------------------------------------------------
// Obstacle dispatch
// ---------------------------------------------------------------------------

fn obstacle_enemy(ctx: &mut CollisionCtx, obstacle_id: ActorId, enemy_id: ActorId) -> bool {
    let hook = ctx.scene.get_mut(obstacle_id).and_then(|o| match &mut o.role {
        Role::Obstacle(obstacle) => obstacle.enemy_collision.take(),
        _ => None,
    });
    let ran = hook.is_some();
    if let Some(mut hook) = hook {
        if let Some((obstacle_actor, enemy_actor)) = ctx.scene.pair_mut(obstacle_id, enemy_id) {
            hook(obstacle_actor, enemy_actor);
        }
        if let Some(o) = ctx.scene.get_mut(obstacle_id) {
            if let Role::Obstacle(obstacle) = &mut o.role {
                obstacle.enemy_collision = Some(hook);
            }
        }
    }
    ran
}

// ---------------------------------------------------------------------------
// Shared helpers
// ---------------------------------------------------------------------------

/// Defeat an enemy: optional `on_defeated` hook, defeat sound, removal, and
/// an `EnemyDefeated` signal when crediting. Idempotent: a second call
/// against an already-removed enemy is a no-op and never double-counts.
pub fn defeat_enemy(
    ctx: &mut CollisionCtx,
    enemy_id: ActorId,
    credit_score: bool,
    defeater: Option<ActorId>,
) {
    let defeat_sound = {
        let Some(enemy_actor) = ctx.scene.get_mut(enemy_id) else {
            return;
        };
        if !enemy_actor.enabled || !matches!(enemy_actor.role, Role::Enemy(_)) {
            return;
        }
        let sound = enemy_actor.sounds.defeat;
        let hook = enemy_actor.role.as_enemy_mut().and_then(|e| e.on_defeated.take());
        if let Some(mut hook) = hook {
            hook(enemy_actor, defeater);
            if let Some(enemy) = enemy_actor.role.as_enemy_mut() {
                enemy.on_defeated = Some(hook);
            }
        }
        sound
    };
    if let Some(sound) = defeat_sound {
        ctx.audio.play(sound);
    }
    soft_remove(ctx, enemy_id);
    if credit_score {
        ctx.events.push(StageEvent::EnemyDefeated { enemy: enemy_id, defeater });
    }
}

/// Soft removal: clear `enabled`, disable the physics body, raise the
/// disappear state event and sound. The rigid body itself is destroyed at
/// the tick boundary, never mid-batch; reusable actors stay parked.
pub fn soft_remove(ctx: &mut CollisionCtx, id: ActorId) {
    let (body, sound) = {
        let Some(actor) = ctx.scene.get_mut(id) else {
            return;
        };
        if !actor.enabled {
            return;
        }
        actor.enabled = false;
        actor.apply_state(StateEvent::Disappear);
        (actor.body, actor.sounds.disappear)
    };
    if let Some(body) = body {
        ctx.physics.set_enabled(&body, false);
    }
    if let Some(sound) = sound {
        ctx.audio.play(sound);
    }
    ctx.defunct.push(id);
}

/// Park a projectile and hand it back to its pool. The body is disabled,
/// never destroyed, so the pool can toss it again.
pub fn reclaim_projectile(ctx: &mut CollisionCtx, id: ActorId) {
    let (body, reclaimer) = {
        let Some(actor) = ctx.scene.get_mut(id) else {
            return;
        };
        if !actor.enabled {
            return;
        }
        actor.enabled = false;
        actor.apply_state(StateEvent::Disappear);
        let reclaimer = match &mut actor.role {
            Role::Projectile(p) => p.reclaimer.take(),
            _ => None,
        };
        (actor.body, reclaimer)
    };
    if let Some(body) = body {
        ctx.physics.set_enabled(&body, false);
    }
    if let Some(mut reclaimer) = reclaimer {
        reclaimer(id);
        if let Some(actor) = ctx.scene.get_mut(id) {
            if let Role::Projectile(p) = &mut actor.role {
                p.reclaimer = Some(reclaimer);
            }
        }
    }
}

/// Landing: drop the mid-jump exemption and free the jump counter.
fn land_hero(ctx: &mut CollisionCtx, hero_id: ActorId) {
    let synced = {
        let Some(hero_actor) = ctx.scene.get_mut(hero_id) else {
            return;
        };
        hero_actor.rules.properties.remove(RoleTags::MID_JUMP);
        hero_actor.apply_state(StateEvent::JumpStop);
        hero_actor.body.map(|body| (body, hero_actor.id, hero_actor.rules))
    };
    if let Some((body, id, rules)) = synced {
        ctx.physics.set_rules(&body, id, &rules);
    }
}

/// Weld a hero to a sticky obstacle, preserving their current offset.
fn stick_hero(ctx: &mut CollisionCtx, hero_id: ActorId, obstacle_id: ActorId) {
    let pieces = {
        let Some((hero_actor, obstacle_actor)) = ctx.scene.pair_mut(hero_id, obstacle_id) else {
            return;
        };
        let (Some(hero_body), Some(obstacle_body)) = (hero_actor.body, obstacle_actor.body) else {
            return;
        };
        (hero_body, obstacle_body, hero_actor.pos - obstacle_actor.pos)
    };
    let (hero_body, obstacle_body, anchor) = pieces;
    let handle = ctx.physics.create_joint(
        &obstacle_body,
        &hero_body,
        &JointDesc::Fixed { anchor_a: anchor, anchor_b: Vec2::ZERO },
    );
    if let Some(hero) = ctx.scene.get_mut(hero_id).and_then(|a| a.role.as_hero_mut()) {
        hero.sticky_joint = Some(handle);
    }
}

// ---------------------------------------------------------------------------
// Side geometry
// ---------------------------------------------------------------------------

struct SideGeometry {
    hero_pos: Vec2,
    hero_half: Vec2,
    obstacle_pos: Vec2,
    obstacle_half: Vec2,
}

fn side_geometry(ctx: &CollisionCtx, hero_id: ActorId, obstacle_id: ActorId) -> Option<SideGeometry> {
    let hero = ctx.scene.get(hero_id)?;
    let obstacle = ctx.scene.get(obstacle_id)?;
    let hero_body = hero.body?;
    let obstacle_body = obstacle.body?;
    Some(SideGeometry {
        hero_pos: hero.pos,
        hero_half: ctx.physics.half_extents(&hero_body)?,
        obstacle_pos: obstacle.pos,
        obstacle_half: ctx.physics.half_extents(&obstacle_body)?,
    })
}

/// Whether the hero's trailing edge is at the obstacle's edge for the given
/// side. Solver overlap makes exact edge contact fuzzy, so each test allows
/// a quarter of the hero's half extent as slop.
fn touches_side(g: &SideGeometry, side: Sides) -> bool {
    if side == Sides::TOP {
        let slop = 0.25 * g.hero_half.y;
        g.hero_pos.y + g.hero_half.y <= g.obstacle_pos.y - g.obstacle_half.y + slop
    } else if side == Sides::BOTTOM {
        let slop = 0.25 * g.hero_half.y;
        g.hero_pos.y - g.hero_half.y >= g.obstacle_pos.y + g.obstacle_half.y - slop
    } else if side == Sides::LEFT {
        let slop = 0.25 * g.hero_half.x;
        g.hero_pos.x + g.hero_half.x <= g.obstacle_pos.x - g.obstacle_half.x + slop
    } else if side == Sides::RIGHT {
        let slop = 0.25 * g.hero_half.x;
        g.hero_pos.x - g.hero_half.x >= g.obstacle_pos.x + g.obstacle_half.x - slop
    } else {
        false
    }
}

fn touches_any(g: &SideGeometry, sides: Sides) -> bool {
    sides.iter().any(|side| touches_side(g, side))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
