use glam::Vec2;
use rapier2d::prelude::*;
use std::sync::Mutex;

use crate::api::types::ActorId;
use crate::components::role::{CollisionRules, RoleTags};

// ---------------------------------------------------------------------------
// Conversion helpers (private) — glam ↔ nalgebra
// ---------------------------------------------------------------------------

fn vec2_to_na(v: Vec2) -> nalgebra::Vector2<f32> {
    nalgebra::Vector2::new(v.x, v.y)
}

fn na_to_vec2(v: &nalgebra::Vector2<f32>) -> Vec2 {
    Vec2::new(v.x, v.y)
}

fn na_iso_to_pos_rot(iso: &nalgebra::Isometry2<f32>) -> (Vec2, f32) {
    let pos = Vec2::new(iso.translation.x, iso.translation.y);
    let rot = iso.rotation.angle();
    (pos, rot)
}

// ---------------------------------------------------------------------------
// Rule packing
// ---------------------------------------------------------------------------
// Collider user_data layout: actor id in the low 32 bits, then the three
// 16-bit tag sets. The contact filter reads both sides from user_data alone,
// so retagging an actor is a single u128 store with no shared state.

fn pack_rules(id: ActorId, rules: &CollisionRules) -> u128 {
    (id.0 as u128)
        | (rules.properties.bits() as u128) << 32
        | (rules.ignores.bits() as u128) << 48
        | (rules.pass_through.bits() as u128) << 64
}

fn unpack_rules(data: u128) -> CollisionRules {
    CollisionRules {
        properties: RoleTags::from_bits_truncate((data >> 32) as u16),
        ignores: RoleTags::from_bits_truncate((data >> 48) as u16),
        pass_through: RoleTags::from_bits_truncate((data >> 64) as u16),
    }
}

/// Contact filter applying the collision-rule algebra inside the pipeline.
///
/// Hard-exempt pairs produce no contact at all; pass-through pairs keep
/// their contact events but compute no impulses, so gameplay still
/// dispatches while the bodies overlap freely.
struct RuleFilter;

impl PhysicsHooks for RuleFilter {
    fn filter_contact_pair(&self, context: &PairFilterContext) -> Option<SolverFlags> {
        let a = unpack_rules(context.colliders[context.collider1].user_data);
        let b = unpack_rules(context.colliders[context.collider2].user_data);
        if a.exempts(&b) {
            return None;
        }
        if a.phases_through(&b) {
            return Some(SolverFlags::empty());
        }
        Some(SolverFlags::COMPUTE_IMPULSES)
    }

    fn filter_intersection_pair(&self, context: &PairFilterContext) -> bool {
        let a = unpack_rules(context.colliders[context.collider1].user_data);
        let b = unpack_rules(context.colliders[context.collider2].user_data);
        !a.exempts(&b)
    }
}

// ---------------------------------------------------------------------------
// Public types
// ---------------------------------------------------------------------------

/// The kind of rigid body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyType {
    Dynamic,
    Fixed,
    KinematicPositionBased,
    KinematicVelocityBased,
}

impl BodyType {
    fn to_rapier(self) -> RigidBodyType {
        match self {
            BodyType::Dynamic => RigidBodyType::Dynamic,
            BodyType::Fixed => RigidBodyType::Fixed,
            BodyType::KinematicPositionBased => RigidBodyType::KinematicPositionBased,
            BodyType::KinematicVelocityBased => RigidBodyType::KinematicVelocityBased,
        }
    }
}

/// Shape description for a collider.
#[derive(Debug, Clone, Copy)]
pub enum ColliderDesc {
    Ball { radius: f32 },
    Cuboid { half_width: f32, half_height: f32 },
    CapsuleY { half_height: f32, radius: f32 },
}

impl ColliderDesc {
    fn build_collider(&self) -> ColliderBuilder {
        match *self {
            ColliderDesc::Ball { radius } => ColliderBuilder::ball(radius),
            ColliderDesc::Cuboid { half_width, half_height } => {
                ColliderBuilder::cuboid(half_width, half_height)
            }
            ColliderDesc::CapsuleY { half_height, radius } => {
                ColliderBuilder::capsule_y(half_height, radius)
            }
        }
    }

    /// Axis-aligned half extents of the shape at rest.
    pub fn half_extents(&self) -> Vec2 {
        match *self {
            ColliderDesc::Ball { radius } => Vec2::splat(radius),
            ColliderDesc::Cuboid { half_width, half_height } => {
                Vec2::new(half_width, half_height)
            }
            ColliderDesc::CapsuleY { half_height, radius } => {
                Vec2::new(radius, half_height + radius)
            }
        }
    }
}

/// Physical material properties for a collider.
#[derive(Debug, Clone, Copy)]
pub struct ColliderMaterial {
    pub restitution: f32,
    pub friction: f32,
    pub density: f32,
}

impl Default for ColliderMaterial {
    fn default() -> Self {
        Self {
            restitution: 0.3,
            friction: 0.5,
            density: 1.0,
        }
    }
}

/// Builder for describing a rigid body before creation.
#[derive(Debug, Clone)]
pub struct BodyDesc {
    pub body_type: BodyType,
    pub position: Vec2,
    pub rotation: f32,
    pub velocity: Vec2,
    pub gravity_scale: f32,
    pub fixed_rotation: bool,
    pub ccd: bool,
    pub collider: ColliderDesc,
    pub linear_damping: f32,
    pub angular_damping: f32,
    /// Sensor fixtures report contacts but never block anything.
    pub sensor: bool,
}

impl BodyDesc {
    /// Create a dynamic body description with the given collider shape.
    pub fn dynamic(collider: ColliderDesc) -> Self {
        Self {
            body_type: BodyType::Dynamic,
            position: Vec2::ZERO,
            rotation: 0.0,
            velocity: Vec2::ZERO,
            gravity_scale: 1.0,
            fixed_rotation: false,
            ccd: false,
            collider,
            linear_damping: 0.0,
            angular_damping: 0.0,
            sensor: false,
        }
    }

    /// Create a fixed (static) body description with the given collider shape.
    pub fn fixed(collider: ColliderDesc) -> Self {
        Self {
            body_type: BodyType::Fixed,
            position: Vec2::ZERO,
            rotation: 0.0,
            velocity: Vec2::ZERO,
            gravity_scale: 0.0,
            fixed_rotation: true,
            ccd: false,
            collider,
            linear_damping: 0.0,
            angular_damping: 0.0,
            sensor: false,
        }
    }

    pub fn with_position(mut self, pos: Vec2) -> Self {
        self.position = pos;
        self
    }

    pub fn with_rotation(mut self, rotation: f32) -> Self {
        self.rotation = rotation;
        self
    }

    pub fn with_velocity(mut self, vel: Vec2) -> Self {
        self.velocity = vel;
        self
    }

    pub fn with_gravity_scale(mut self, scale: f32) -> Self {
        self.gravity_scale = scale;
        self
    }

    pub fn with_fixed_rotation(mut self, fixed: bool) -> Self {
        self.fixed_rotation = fixed;
        self
    }

    pub fn with_ccd(mut self, enabled: bool) -> Self {
        self.ccd = enabled;
        self
    }

    /// Set the linear damping (velocity decay). Higher values slow the body
    /// faster.
    pub fn with_linear_damping(mut self, damping: f32) -> Self {
        self.linear_damping = damping;
        self
    }

    /// Set the angular damping (rotation decay).
    pub fn with_angular_damping(mut self, damping: f32) -> Self {
        self.angular_damping = damping;
        self
    }

    /// Make the collider a sensor: contacts are reported, nothing bounces.
    pub fn with_sensor(mut self, sensor: bool) -> Self {
        self.sensor = sensor;
        self
    }
}

/// Handle pair stored on an Actor, referencing Rapier internals.
#[derive(Debug, Clone, Copy)]
pub struct PhysicsBody {
    pub body_handle: RigidBodyHandle,
    pub collider_handle: ColliderHandle,
}

/// Handle to a joint in the physics simulation.
#[derive(Debug, Clone, Copy)]
pub struct JointHandle(pub(crate) ImpulseJointHandle);

/// Description of a joint to create between two bodies.
#[derive(Debug, Clone, Copy)]
pub enum JointDesc {
    /// Rigidly welds two bodies together at the given local anchors.
    Fixed { anchor_a: Vec2, anchor_b: Vec2 },
    /// Spring/distance joint that applies forces to maintain rest length.
    Spring {
        anchor_a: Vec2,
        anchor_b: Vec2,
        rest_length: f32,
        stiffness: f32,
        damping: f32,
    },
    /// Allows free rotation around the anchor points (hinge joint in 2D).
    Revolute { anchor_a: Vec2, anchor_b: Vec2 },
}

/// A collision event between two actors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CollisionPair {
    pub actor_a: ActorId,
    pub actor_b: ActorId,
    /// `true` when the collision just started, `false` when it ended.
    pub started: bool,
}

// ---------------------------------------------------------------------------
// WASM-safe event collector (no crossbeam)
// ---------------------------------------------------------------------------

struct DirectEventCollector {
    collisions: Mutex<Vec<CollisionEvent>>,
}

impl DirectEventCollector {
    fn new() -> Self {
        Self {
            collisions: Mutex::new(Vec::new()),
        }
    }

    fn drain_collisions(&self) -> Vec<CollisionEvent> {
        std::mem::take(&mut *self.collisions.lock().unwrap())
    }
}

impl EventHandler for DirectEventCollector {
    fn handle_collision_event(
        &self,
        _bodies: &RigidBodySet,
        _colliders: &ColliderSet,
        event: CollisionEvent,
        _contact_pair: Option<&ContactPair>,
    ) {
        self.collisions.lock().unwrap().push(event);
    }

    fn handle_contact_force_event(
        &self,
        _dt: f32,
        _bodies: &RigidBodySet,
        _colliders: &ColliderSet,
        _contact_pair: &ContactPair,
        _total_force_magnitude: f32,
    ) {
        // We don't use contact force events but the trait requires this.
    }
}

// ---------------------------------------------------------------------------
// PhysicsWorld
// ---------------------------------------------------------------------------

/// Wraps all Rapier2D boilerplate into a single, easy-to-use struct.
pub struct PhysicsWorld {
    gravity: nalgebra::Vector2<f32>,
    integration_parameters: IntegrationParameters,
    physics_pipeline: PhysicsPipeline,
    island_manager: IslandManager,
    broad_phase: DefaultBroadPhase,
    narrow_phase: NarrowPhase,
    pub(crate) bodies: RigidBodySet,
    pub(crate) colliders: ColliderSet,
    impulse_joints: ImpulseJointSet,
    multibody_joints: MultibodyJointSet,
    ccd_solver: CCDSolver,
    query_pipeline: QueryPipeline,
    event_collector: DirectEventCollector,
    rule_filter: RuleFilter,
}

impl PhysicsWorld {
    /// Create a new physics world with the given gravity vector.
    /// For Y-down coordinate systems, use positive Y for downward gravity.
    pub fn new(gravity: Vec2) -> Self {
        Self {
            gravity: vec2_to_na(gravity),
            integration_parameters: IntegrationParameters::default(),
            physics_pipeline: PhysicsPipeline::new(),
            island_manager: IslandManager::new(),
            broad_phase: DefaultBroadPhase::new(),
            narrow_phase: NarrowPhase::new(),
            bodies: RigidBodySet::new(),
            colliders: ColliderSet::new(),
            impulse_joints: ImpulseJointSet::new(),
            multibody_joints: MultibodyJointSet::new(),
            ccd_solver: CCDSolver::new(),
            query_pipeline: QueryPipeline::new(),
            event_collector: DirectEventCollector::new(),
            rule_filter: RuleFilter,
        }
    }

    /// Set the integration timestep.
    pub fn set_dt(&mut self, dt: f32) {
        self.integration_parameters.dt = dt;
    }

    /// Create a rigid body + collider and return handles.
    /// The ActorId lands in both user_data slots for collision lookups;
    /// `set_rules` refreshes the collider side with the actor's tag sets.
    pub fn create_body(
        &mut self,
        actor_id: ActorId,
        desc: &BodyDesc,
        material: ColliderMaterial,
    ) -> PhysicsBody {
        let rb = RigidBodyBuilder::new(desc.body_type.to_rapier())
            .translation(nalgebra::Vector2::new(desc.position.x, desc.position.y))
            .rotation(desc.rotation)
            .linvel(nalgebra::Vector2::new(desc.velocity.x, desc.velocity.y))
            .gravity_scale(desc.gravity_scale)
            .locked_axes(if desc.fixed_rotation {
                LockedAxes::ROTATION_LOCKED
            } else {
                LockedAxes::empty()
            })
            .ccd_enabled(desc.ccd)
            .linear_damping(desc.linear_damping)
            .angular_damping(desc.angular_damping)
            .user_data(actor_id.0 as u128)
            .build();

        let body_handle = self.bodies.insert(rb);

        let collider = desc
            .collider
            .build_collider()
            .restitution(material.restitution)
            .friction(material.friction)
            .density(material.density)
            .sensor(desc.sensor)
            .active_events(ActiveEvents::COLLISION_EVENTS)
            .active_hooks(ActiveHooks::FILTER_CONTACT_PAIRS | ActiveHooks::FILTER_INTERSECTION_PAIR)
            .user_data(pack_rules(actor_id, &CollisionRules::default()))
            .build();

        let collider_handle =
            self.colliders
                .insert_with_parent(collider, body_handle, &mut self.bodies);

        PhysicsBody {
            body_handle,
            collider_handle,
        }
    }

    /// Remove a body and all its colliders from the simulation.
    pub fn remove_body(&mut self, body: &PhysicsBody) {
        self.bodies.remove(
            body.body_handle,
            &mut self.island_manager,
            &mut self.colliders,
            &mut self.impulse_joints,
            &mut self.multibody_joints,
            true,
        );
    }

    /// Write an actor's current rule descriptor where the contact filter
    /// can see it. Call after any retagging.
    pub fn set_rules(&mut self, body: &PhysicsBody, actor_id: ActorId, rules: &CollisionRules) {
        if let Some(collider) = self.colliders.get_mut(body.collider_handle) {
            collider.user_data = pack_rules(actor_id, rules);
        }
    }

    /// Enable or disable a body and its colliders. Disabled bodies neither
    /// move nor report contacts.
    pub fn set_enabled(&mut self, body: &PhysicsBody, enabled: bool) {
        if let Some(rb) = self.bodies.get_mut(body.body_handle) {
            rb.set_enabled(enabled);
        }
    }

    /// Switch a body between dynamic/fixed/kinematic.
    pub fn set_body_type(&mut self, body: &PhysicsBody, body_type: BodyType) {
        if let Some(rb) = self.bodies.get_mut(body.body_handle) {
            rb.set_body_type(body_type.to_rapier(), true);
        }
    }

    /// Toggle the sensor flag on a body's collider.
    pub fn set_sensor(&mut self, body: &PhysicsBody, sensor: bool) {
        if let Some(collider) = self.colliders.get_mut(body.collider_handle) {
            collider.set_sensor(sensor);
        }
    }

    /// Whether a body's collider is sensor-only.
    pub fn is_sensor(&self, body: &PhysicsBody) -> bool {
        self.colliders
            .get(body.collider_handle)
            .map(|c| c.is_sensor())
            .unwrap_or(false)
    }

    pub fn set_friction(&mut self, body: &PhysicsBody, friction: f32) {
        if let Some(collider) = self.colliders.get_mut(body.collider_handle) {
            collider.set_friction(friction);
        }
    }

    pub fn set_restitution(&mut self, body: &PhysicsBody, restitution: f32) {
        if let Some(collider) = self.colliders.get_mut(body.collider_handle) {
            collider.set_restitution(restitution);
        }
    }

    pub fn set_density(&mut self, body: &PhysicsBody, density: f32) {
        if let Some(collider) = self.colliders.get_mut(body.collider_handle) {
            collider.set_density(density);
        }
    }

    /// Step the simulation and collect collision events into the provided Vec.
    pub fn step_into(&mut self, collision_events: &mut Vec<CollisionPair>) {
        self.physics_pipeline.step(
            &self.gravity,
            &self.integration_parameters,
            &mut self.island_manager,
            &mut self.broad_phase,
            &mut self.narrow_phase,
            &mut self.bodies,
            &mut self.colliders,
            &mut self.impulse_joints,
            &mut self.multibody_joints,
            &mut self.ccd_solver,
            Some(&mut self.query_pipeline),
            &self.rule_filter,
            &self.event_collector,
        );

        // Drain collision events and resolve actor IDs from user_data
        for event in self.event_collector.drain_collisions() {
            let (h1, h2, started) = match event {
                CollisionEvent::Started(h1, h2, _) => (h1, h2, true),
                CollisionEvent::Stopped(h1, h2, _) => (h1, h2, false),
            };

            let actor_a = self.collider_to_actor(h1);
            let actor_b = self.collider_to_actor(h2);

            if let (Some(a), Some(b)) = (actor_a, actor_b) {
                collision_events.push(CollisionPair {
                    actor_a: a,
                    actor_b: b,
                    started,
                });
            }
        }
    }

    /// Apply a force to a body (continuous — call every frame).
    pub fn apply_force(&mut self, body: &PhysicsBody, force: Vec2) {
        if let Some(rb) = self.bodies.get_mut(body.body_handle) {
            rb.add_force(vec2_to_na(force), true);
        }
    }

    /// Apply an instantaneous impulse to a body.
    pub fn apply_impulse(&mut self, body: &PhysicsBody, impulse: Vec2) {
        if let Some(rb) = self.bodies.get_mut(body.body_handle) {
            rb.apply_impulse(vec2_to_na(impulse), true);
        }
    }

    /// Set the linear velocity of a body directly.
    pub fn set_velocity(&mut self, body: &PhysicsBody, vel: Vec2) {
        if let Some(rb) = self.bodies.get_mut(body.body_handle) {
            rb.set_linvel(vec2_to_na(vel), true);
        }
    }

    /// Get the current linear velocity of a body.
    pub fn velocity(&self, body: &PhysicsBody) -> Vec2 {
        self.bodies
            .get(body.body_handle)
            .map(|rb| na_to_vec2(rb.linvel()))
            .unwrap_or(Vec2::ZERO)
    }

    /// Teleport a body to a position and rotation.
    pub fn set_transform(&mut self, body: &PhysicsBody, pos: Vec2, rotation: f32) {
        if let Some(rb) = self.bodies.get_mut(body.body_handle) {
            rb.set_position(
                nalgebra::Isometry2::new(nalgebra::Vector2::new(pos.x, pos.y), rotation),
                true,
            );
        }
    }

    /// Set position and rotation for a kinematic body.
    pub fn set_kinematic_position(&mut self, body: &PhysicsBody, pos: Vec2, rotation: f32) {
        if let Some(rb) = self.bodies.get_mut(body.body_handle) {
            rb.set_next_kinematic_position(nalgebra::Isometry2::new(
                nalgebra::Vector2::new(pos.x, pos.y),
                rotation,
            ));
        }
    }

    /// Get the current position and rotation of a body.
    pub fn body_position(&self, body: &PhysicsBody) -> (Vec2, f32) {
        self.bodies
            .get(body.body_handle)
            .map(|rb| na_iso_to_pos_rot(rb.position()))
            .unwrap_or((Vec2::ZERO, 0.0))
    }

    /// Number of rigid bodies in the simulation.
    pub fn body_count(&self) -> usize {
        self.bodies.len()
    }

    /// Query the collider shape of a physics body.
    /// Returns `None` if the collider no longer exists or has an unsupported
    /// shape.
    pub fn collider_shape(&self, body: &PhysicsBody) -> Option<ColliderDesc> {
        let collider = self.colliders.get(body.collider_handle)?;
        let shape = collider.shape();
        if let Some(ball) = shape.as_ball() {
            Some(ColliderDesc::Ball { radius: ball.radius })
        } else if let Some(cuboid) = shape.as_cuboid() {
            Some(ColliderDesc::Cuboid {
                half_width: cuboid.half_extents.x,
                half_height: cuboid.half_extents.y,
            })
        } else if let Some(capsule) = shape.as_capsule() {
            Some(ColliderDesc::CapsuleY {
                half_height: capsule.half_height(),
                radius: capsule.radius,
            })
        } else {
            None
        }
    }

    /// Axis-aligned half extents of a body's collider, for edge tests.
    pub fn half_extents(&self, body: &PhysicsBody) -> Option<Vec2> {
        self.collider_shape(body).map(|shape| shape.half_extents())
    }

    // -- Joint methods --

    /// Create a joint between two bodies. Returns a handle for later removal.
    pub fn create_joint(
        &mut self,
        body_a: &PhysicsBody,
        body_b: &PhysicsBody,
        desc: &JointDesc,
    ) -> JointHandle {
        let handle = match desc {
            JointDesc::Fixed { anchor_a, anchor_b } => {
                let joint = FixedJointBuilder::new()
                    .local_anchor1(nalgebra::Point2::new(anchor_a.x, anchor_a.y))
                    .local_anchor2(nalgebra::Point2::new(anchor_b.x, anchor_b.y))
                    .build();
                self.impulse_joints.insert(body_a.body_handle, body_b.body_handle, joint, true)
            }
            JointDesc::Spring { anchor_a, anchor_b, rest_length, stiffness, damping } => {
                let joint = SpringJointBuilder::new(*rest_length, *stiffness, *damping)
                    .local_anchor1(nalgebra::Point2::new(anchor_a.x, anchor_a.y))
                    .local_anchor2(nalgebra::Point2::new(anchor_b.x, anchor_b.y))
                    .build();
                self.impulse_joints.insert(body_a.body_handle, body_b.body_handle, joint, true)
            }
            JointDesc::Revolute { anchor_a, anchor_b } => {
                let joint = RevoluteJointBuilder::new()
                    .local_anchor1(nalgebra::Point2::new(anchor_a.x, anchor_a.y))
                    .local_anchor2(nalgebra::Point2::new(anchor_b.x, anchor_b.y))
                    .build();
                self.impulse_joints.insert(body_a.body_handle, body_b.body_handle, joint, true)
            }
        };
        JointHandle(handle)
    }

    /// Remove a joint from the simulation.
    pub fn remove_joint(&mut self, handle: JointHandle) {
        self.impulse_joints.remove(handle.0, true);
    }

    /// Number of joints in the simulation.
    pub fn joint_count(&self) -> usize {
        self.impulse_joints.len()
    }

    // -- private helpers --

    fn collider_to_actor(&self, collider_handle: ColliderHandle) -> Option<ActorId> {
        let collider = self.colliders.get(collider_handle)?;
        let body_handle = collider.parent()?;
        let body = self.bodies.get(body_handle)?;
        Some(ActorId(body.user_data as u32))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn rules(properties: RoleTags, ignores: RoleTags, pass_through: RoleTags) -> CollisionRules {
        CollisionRules { properties, ignores, pass_through }
    }

    #[test]
    fn rules_pack_round_trip() {
        let original = rules(
            RoleTags::HERO | RoleTags::MID_JUMP,
            RoleTags::SENSOR,
            RoleTags::MID_CRAWL,
        );
        let packed = pack_rules(ActorId(77), &original);
        assert_eq!(packed as u32, 77);
        assert_eq!(unpack_rules(packed), original);
    }

    #[test]
    fn create_and_remove_body() {
        let mut world = PhysicsWorld::new(Vec2::ZERO);
        let body = world.create_body(
            ActorId(1),
            &BodyDesc::dynamic(ColliderDesc::Ball { radius: 10.0 }),
            ColliderMaterial::default(),
        );
        assert_eq!(world.body_count(), 1);
        world.remove_body(&body);
        assert_eq!(world.body_count(), 0);
    }

    #[test]
    fn gravity_affects_dynamic_body() {
        let mut world = PhysicsWorld::new(Vec2::new(0.0, 100.0));
        world.set_dt(1.0 / 60.0);

        let body = world.create_body(
            ActorId(1),
            &BodyDesc::dynamic(ColliderDesc::Ball { radius: 5.0 }),
            ColliderMaterial::default(),
        );

        let (initial_pos, _) = world.body_position(&body);
        let mut events = Vec::new();
        for _ in 0..10 {
            world.step_into(&mut events);
        }
        let (new_pos, _) = world.body_position(&body);

        assert!(
            new_pos.y > initial_pos.y,
            "Body should fall: start={}, end={}",
            initial_pos.y,
            new_pos.y
        );
    }

    #[test]
    fn disabled_body_does_not_fall() {
        let mut world = PhysicsWorld::new(Vec2::new(0.0, 100.0));
        world.set_dt(1.0 / 60.0);
        let body = world.create_body(
            ActorId(1),
            &BodyDesc::dynamic(ColliderDesc::Ball { radius: 5.0 }),
            ColliderMaterial::default(),
        );
        world.set_enabled(&body, false);

        let mut events = Vec::new();
        for _ in 0..10 {
            world.step_into(&mut events);
        }
        let (pos, _) = world.body_position(&body);
        assert!(pos.y.abs() < 0.001, "Disabled body moved: y={}", pos.y);
    }

    #[test]
    fn collision_events_between_converging_bodies() {
        let mut world = PhysicsWorld::new(Vec2::ZERO);
        world.set_dt(1.0 / 60.0);

        let _a = world.create_body(
            ActorId(1),
            &BodyDesc::dynamic(ColliderDesc::Ball { radius: 10.0 })
                .with_position(Vec2::new(0.0, 0.0))
                .with_velocity(Vec2::new(200.0, 0.0)),
            ColliderMaterial::default(),
        );
        let _b = world.create_body(
            ActorId(2),
            &BodyDesc::dynamic(ColliderDesc::Ball { radius: 10.0 })
                .with_position(Vec2::new(30.0, 0.0))
                .with_velocity(Vec2::new(-200.0, 0.0)),
            ColliderMaterial::default(),
        );

        let mut all_events = Vec::new();
        for _ in 0..60 {
            world.step_into(&mut all_events);
        }

        let started: Vec<_> = all_events.iter().filter(|e| e.started).collect();
        assert!(!started.is_empty(), "Should report a collision start");
        let ids = [started[0].actor_a, started[0].actor_b];
        assert!(ids.contains(&ActorId(1)));
        assert!(ids.contains(&ActorId(2)));
    }

    #[test]
    fn exempt_pair_reports_nothing() {
        let mut world = PhysicsWorld::new(Vec2::ZERO);
        world.set_dt(1.0 / 60.0);

        let a = world.create_body(
            ActorId(1),
            &BodyDesc::dynamic(ColliderDesc::Ball { radius: 10.0 })
                .with_position(Vec2::new(0.0, 0.0))
                .with_velocity(Vec2::new(200.0, 0.0)),
            ColliderMaterial::default(),
        );
        let b = world.create_body(
            ActorId(2),
            &BodyDesc::dynamic(ColliderDesc::Ball { radius: 10.0 })
                .with_position(Vec2::new(30.0, 0.0))
                .with_velocity(Vec2::new(-200.0, 0.0)),
            ColliderMaterial::default(),
        );
        // a refuses to collide with anything carrying ENEMY
        world.set_rules(
            &a,
            ActorId(1),
            &rules(RoleTags::HERO, RoleTags::ENEMY, RoleTags::empty()),
        );
        world.set_rules(
            &b,
            ActorId(2),
            &rules(RoleTags::ENEMY, RoleTags::empty(), RoleTags::empty()),
        );

        let mut events = Vec::new();
        for _ in 0..60 {
            world.step_into(&mut events);
        }
        assert!(events.is_empty(), "Exempt pair raised events: {:?}", events);
    }

    #[test]
    fn pass_through_pair_reports_but_does_not_bounce() {
        let mut world = PhysicsWorld::new(Vec2::ZERO);
        world.set_dt(1.0 / 60.0);

        let a = world.create_body(
            ActorId(1),
            &BodyDesc::dynamic(ColliderDesc::Ball { radius: 10.0 })
                .with_position(Vec2::new(0.0, 0.0))
                .with_velocity(Vec2::new(200.0, 0.0)),
            ColliderMaterial::default(),
        );
        let b = world.create_body(
            ActorId(2),
            &BodyDesc::dynamic(ColliderDesc::Ball { radius: 10.0 })
                .with_position(Vec2::new(60.0, 0.0))
                .with_velocity(Vec2::ZERO),
            ColliderMaterial::default(),
        );
        world.set_rules(
            &a,
            ActorId(1),
            &rules(RoleTags::HERO | RoleTags::MID_JUMP, RoleTags::empty(), RoleTags::empty()),
        );
        world.set_rules(
            &b,
            ActorId(2),
            &rules(RoleTags::ENEMY, RoleTags::empty(), RoleTags::MID_JUMP),
        );

        let mut events = Vec::new();
        for _ in 0..60 {
            world.step_into(&mut events);
        }

        assert!(
            events.iter().any(|e| e.started),
            "Pass-through pair must still report contact"
        );
        // the moving ball sailed through instead of knocking b away
        let (pos_a, _) = world.body_position(&a);
        let (pos_b, _) = world.body_position(&b);
        assert!(
            pos_a.x > pos_b.x,
            "Ball should pass through: a.x={}, b.x={}",
            pos_a.x,
            pos_b.x
        );
        assert!(
            (pos_b.x - 60.0).abs() < 1.0,
            "Untouched ball should not be shoved: b.x={}",
            pos_b.x
        );
    }

    #[test]
    fn sensor_reports_without_blocking() {
        let mut world = PhysicsWorld::new(Vec2::ZERO);
        world.set_dt(1.0 / 60.0);

        let mover = world.create_body(
            ActorId(1),
            &BodyDesc::dynamic(ColliderDesc::Ball { radius: 5.0 })
                .with_position(Vec2::new(0.0, 0.0))
                .with_velocity(Vec2::new(100.0, 0.0)),
            ColliderMaterial::default(),
        );
        let _zone = world.create_body(
            ActorId(2),
            &BodyDesc::fixed(ColliderDesc::Cuboid { half_width: 5.0, half_height: 50.0 })
                .with_position(Vec2::new(40.0, 0.0))
                .with_sensor(true),
            ColliderMaterial::default(),
        );

        let mut events = Vec::new();
        for _ in 0..60 {
            world.step_into(&mut events);
        }
        assert!(events.iter().any(|e| e.started), "Sensor overlap not reported");
        let (pos, _) = world.body_position(&mover);
        assert!(pos.x > 50.0, "Sensor blocked the mover: x={}", pos.x);
    }

    #[test]
    fn set_body_type_freezes_motion() {
        let mut world = PhysicsWorld::new(Vec2::new(0.0, 100.0));
        world.set_dt(1.0 / 60.0);
        let body = world.create_body(
            ActorId(1),
            &BodyDesc::dynamic(ColliderDesc::Ball { radius: 5.0 }),
            ColliderMaterial::default(),
        );
        world.set_body_type(&body, BodyType::Fixed);

        let mut events = Vec::new();
        for _ in 0..10 {
            world.step_into(&mut events);
        }
        let (pos, _) = world.body_position(&body);
        assert!(pos.y.abs() < 0.001, "Fixed body fell: y={}", pos.y);
    }

    #[test]
    fn half_extents_per_shape() {
        assert_eq!(
            ColliderDesc::Ball { radius: 15.0 }.half_extents(),
            Vec2::splat(15.0)
        );
        assert_eq!(
            ColliderDesc::Cuboid { half_width: 50.0, half_height: 10.0 }.half_extents(),
            Vec2::new(50.0, 10.0)
        );
        assert_eq!(
            ColliderDesc::CapsuleY { half_height: 10.0, radius: 4.0 }.half_extents(),
            Vec2::new(4.0, 14.0)
        );
    }

    #[test]
    fn create_and_remove_joint() {
        let mut world = PhysicsWorld::new(Vec2::ZERO);
        let body_a = world.create_body(
            ActorId(1),
            &BodyDesc::dynamic(ColliderDesc::Ball { radius: 5.0 })
                .with_position(Vec2::new(0.0, 0.0)),
            ColliderMaterial::default(),
        );
        let body_b = world.create_body(
            ActorId(2),
            &BodyDesc::dynamic(ColliderDesc::Ball { radius: 5.0 })
                .with_position(Vec2::new(50.0, 0.0)),
            ColliderMaterial::default(),
        );

        assert_eq!(world.joint_count(), 0);
        let handle = world.create_joint(&body_a, &body_b, &JointDesc::Fixed {
            anchor_a: Vec2::ZERO,
            anchor_b: Vec2::ZERO,
        });
        assert_eq!(world.joint_count(), 1);
        world.remove_joint(handle);
        assert_eq!(world.joint_count(), 0);
    }

    #[test]
    fn fixed_joint_constrains_bodies() {
        let mut world = PhysicsWorld::new(Vec2::ZERO);
        world.set_dt(1.0 / 60.0);

        let body_a = world.create_body(
            ActorId(1),
            &BodyDesc::dynamic(ColliderDesc::Ball { radius: 5.0 })
                .with_position(Vec2::new(0.0, 0.0)),
            ColliderMaterial::default(),
        );
        let body_b = world.create_body(
            ActorId(2),
            &BodyDesc::dynamic(ColliderDesc::Ball { radius: 5.0 })
                .with_position(Vec2::new(0.0, 0.0)),
            ColliderMaterial::default(),
        );

        world.create_joint(&body_a, &body_b, &JointDesc::Fixed {
            anchor_a: Vec2::ZERO,
            anchor_b: Vec2::ZERO,
        });
        world.apply_impulse(&body_a, Vec2::new(5000.0, 0.0));

        let mut events = Vec::new();
        for _ in 0..60 {
            world.step_into(&mut events);
        }

        let (pos_a, _) = world.body_position(&body_a);
        let (pos_b, _) = world.body_position(&body_b);
        assert!(pos_a.x > 1.0, "Body A should have moved right: x={}", pos_a.x);
        assert!(pos_b.x > 1.0, "Body B should be dragged along: x={}", pos_b.x);
        assert!(
            (pos_a.x - pos_b.x).abs() < 5.0,
            "Bodies should stay together: A.x={}, B.x={}",
            pos_a.x,
            pos_b.x
        );
    }
}
