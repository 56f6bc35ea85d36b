//! Pluggable per-actor motion policies.
//!
//! Policies only *request* velocities; the physics step applies them. They
//! are independent of roles and are consulted once per tick before
//! integration.

use glam::Vec2;

use crate::api::types::ActorId;

/// How close to a waypoint counts as having reached it, in addition to the
/// distance covered this tick.
const WAYPOINT_SLOP: f32 = 0.5;

/// The motion strategy attached to an actor.
pub enum Movement {
    /// No motion requests; the body is at the mercy of physics alone.
    Inert,
    /// Velocity requested directly by game code; reapplied every tick.
    Manual { velocity: Vec2 },
    /// Velocity proportional to the latest tilt reading.
    Tilt { scale: Vec2 },
    /// Follow a fixed waypoint path at constant speed.
    Path(PathProgress),
    /// Pursue another actor at constant speed, per axis.
    Chase {
        target: ActorId,
        speed: f32,
        chase_x: bool,
        chase_y: bool,
    },
    /// Pin a kinematic body to a fixed world point.
    Hover { point: Vec2 },
    /// Ballistic flight for tossed projectiles; gravity does the work.
    Ballistic,
}

impl Default for Movement {
    fn default() -> Self {
        Movement::Inert
    }
}

/// Waypoint-following state for `Movement::Path`.
pub struct PathProgress {
    points: Vec<Vec2>,
    speed: f32,
    looping: bool,
    next: usize,
    done: bool,
}

impl PathProgress {
    pub fn new(points: Vec<Vec2>, speed: f32, looping: bool) -> Self {
        if points.len() < 2 {
            log::warn!(
                "path with {} waypoint(s) never moves; treating as inert",
                points.len()
            );
        }
        Self {
            points,
            speed,
            looping,
            next: 1,
            done: false,
        }
    }

    pub fn is_done(&self) -> bool {
        self.done
    }

    /// Velocity toward the next waypoint, advancing it when the actor is
    /// within this tick's reach. Returns None once a non-looping path ends.
    pub fn advance(&mut self, pos: Vec2, dt: f32) -> Option<Vec2> {
        if self.done || self.points.len() < 2 {
            return None;
        }
        let target = self.points[self.next];
        let delta = target - pos;
        let reach = self.speed * dt + WAYPOINT_SLOP;
        if delta.length() <= reach {
            self.next += 1;
            if self.next >= self.points.len() {
                if self.looping {
                    self.next = 0;
                } else {
                    self.done = true;
                    return None;
                }
            }
            let delta = self.points[self.next] - pos;
            if delta.length_squared() < f32::EPSILON {
                return None;
            }
            return Some(delta.normalize() * self.speed);
        }
        Some(delta.normalize() * self.speed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn path_heads_for_next_waypoint() {
        let mut path = PathProgress::new(
            vec![Vec2::ZERO, Vec2::new(100.0, 0.0)],
            10.0,
            false,
        );
        let v = path.advance(Vec2::ZERO, 1.0 / 60.0).unwrap();
        assert!(v.x > 9.9 && v.y.abs() < 0.001, "velocity was {:?}", v);
    }

    #[test]
    fn path_ends_when_not_looping() {
        let mut path = PathProgress::new(
            vec![Vec2::ZERO, Vec2::new(10.0, 0.0)],
            10.0,
            false,
        );
        // standing right on the final waypoint
        assert!(path.advance(Vec2::new(10.0, 0.0), 1.0 / 60.0).is_none());
        assert!(path.is_done());
        assert!(path.advance(Vec2::new(10.0, 0.0), 1.0 / 60.0).is_none());
    }

    #[test]
    fn looping_path_wraps_to_start() {
        let mut path = PathProgress::new(
            vec![Vec2::ZERO, Vec2::new(10.0, 0.0)],
            10.0,
            true,
        );
        let v = path.advance(Vec2::new(10.0, 0.0), 1.0 / 60.0).unwrap();
        // back toward the first point
        assert!(v.x < 0.0, "velocity was {:?}", v);
        assert!(!path.is_done());
    }

    #[test]
    fn degenerate_path_is_inert() {
        let mut path = PathProgress::new(vec![Vec2::ZERO], 10.0, true);
        assert!(path.advance(Vec2::ZERO, 1.0 / 60.0).is_none());
    }
}
