//! Per-tick motion: movement policies request velocities before the physics
//! step, and body velocities are sampled afterwards to raise directional
//! state events.

use glam::Vec2;

use crate::components::movement::Movement;
use crate::components::state::{CompassDirection, StateEvent};
use crate::core::physics::PhysicsWorld;
use crate::core::scene::Scene;

/// Speeds below this count as standing still.
const REST_SPEED: f32 = 0.05;

/// Run every enabled actor's movement policy. Policies only request
/// velocities; positions move when the physics step runs.
pub fn drive_movement(scene: &mut Scene, physics: &mut PhysicsWorld, tilt: Vec2, dt: f32) {
    for i in 0..scene.len() {
        // chase goals come from an immutable read before the policy borrow
        let chase_goal = match &scene.at(i).movement {
            Movement::Chase { target, .. } => {
                scene.get(*target).filter(|t| t.enabled).map(|t| t.pos)
            }
            _ => None,
        };

        let actor = scene.at_mut(i);
        if !actor.enabled {
            continue;
        }
        let Some(body) = actor.body else {
            continue;
        };
        let pos = actor.pos;
        let rotation = actor.rotation;

        match &mut actor.movement {
            Movement::Inert | Movement::Ballistic => {}
            Movement::Manual { velocity } => {
                let v = *velocity;
                physics.set_velocity(&body, v);
            }
            Movement::Tilt { scale } => {
                let v = tilt * *scale;
                physics.set_velocity(&body, v);
            }
            Movement::Path(path) => match path.advance(pos, dt) {
                Some(v) => physics.set_velocity(&body, v),
                None => physics.set_velocity(&body, Vec2::ZERO),
            },
            Movement::Chase { speed, chase_x, chase_y, .. } => {
                if let Some(goal) = chase_goal {
                    let delta = goal - pos;
                    if delta.length_squared() > 1e-6 {
                        let full = delta.normalize() * *speed;
                        let current = physics.velocity(&body);
                        let v = Vec2::new(
                            if *chase_x { full.x } else { current.x },
                            if *chase_y { full.y } else { current.y },
                        );
                        physics.set_velocity(&body, v);
                    }
                }
            }
            Movement::Hover { point } => {
                let p = *point;
                physics.set_kinematic_position(&body, p, rotation);
            }
        }
    }
}

/// Sample each body's velocity and raise Move/Stop state events. The state
/// machine dedups, so a body cruising in one direction notifies once.
pub fn sample_motion_states(scene: &mut Scene, physics: &PhysicsWorld) {
    for actor in scene.iter_mut() {
        if !actor.enabled {
            continue;
        }
        let Some(body) = actor.body else {
            continue;
        };
        let velocity = physics.velocity(&body);
        if velocity.length() < REST_SPEED {
            actor.apply_state(StateEvent::Stop);
        } else {
            actor.apply_state(StateEvent::Move(CompassDirection::from_vector(velocity)));
        }
    }
}
