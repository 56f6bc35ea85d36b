use crate::api::stage::Stage;
use crate::api::types::ActorId;

/// Fixed timestep accumulator.
/// Ensures game logic runs at a consistent rate regardless of frame time.
pub struct FixedTimestep {
    /// The fixed delta time per tick.
    dt: f32,
    /// Accumulated time from variable frame deltas.
    accumulator: f32,
}

impl FixedTimestep {
    pub fn new(dt: f32) -> Self {
        Self {
            dt,
            accumulator: 0.0,
        }
    }

    /// Add frame time to the accumulator. Returns the number of fixed steps
    /// to run. Capped at 10 steps per frame to prevent spiral of death.
    pub fn accumulate(&mut self, frame_dt: f32) -> u32 {
        self.accumulator += frame_dt;
        self.accumulator = self.accumulator.min(self.dt * 10.0);
        let steps = (self.accumulator / self.dt) as u32;
        self.accumulator -= steps as f32 * self.dt;
        steps
    }

    /// Interpolation alpha for rendering between ticks (0.0 to 1.0).
    pub fn alpha(&self) -> f32 {
        self.accumulator / self.dt
    }

    /// The fixed delta time.
    pub fn dt(&self) -> f32 {
        self.dt
    }
}

// ---------------------------------------------------------------------------
// Deferred actions
// ---------------------------------------------------------------------------

/// One deferred effect, armed for a future tick boundary.
///
/// When `guard` is set, the action is dropped if that actor is disabled by
/// fire time. That is the whole cancellation mechanism: an enabled check,
/// never preemption.
pub struct Scheduled {
    pub fires_at: u64,
    pub guard: Option<ActorId>,
    pub action: Box<dyn FnOnce(&mut Stage)>,
}

/// Tick-boundary scheduler for the single-threaded loop.
#[derive(Default)]
pub struct TimerQueue {
    pending: Vec<Scheduled>,
}

impl TimerQueue {
    pub fn new() -> Self {
        Self {
            pending: Vec::new(),
        }
    }

    /// Arm an action for the given tick.
    pub fn schedule(
        &mut self,
        fires_at: u64,
        guard: Option<ActorId>,
        action: Box<dyn FnOnce(&mut Stage)>,
    ) {
        self.pending.push(Scheduled {
            fires_at,
            guard,
            action,
        });
    }

    /// Remove and return everything due at `now`, in schedule order. The
    /// caller runs the actions after this borrow ends, so actions may
    /// schedule further timers.
    pub fn take_due(&mut self, now: u64) -> Vec<Scheduled> {
        let mut due = Vec::new();
        let mut rest = Vec::with_capacity(self.pending.len());
        for entry in self.pending.drain(..) {
            if entry.fires_at <= now {
                due.push(entry);
            } else {
                rest.push(entry);
            }
        }
        self.pending = rest;
        due
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn one_step_exact() {
        let mut ts = FixedTimestep::new(1.0 / 60.0);
        let steps = ts.accumulate(1.0 / 60.0);
        assert_eq!(steps, 1);
    }

    #[test]
    fn accumulates_partial() {
        let mut ts = FixedTimestep::new(1.0 / 60.0);
        let steps = ts.accumulate(0.008); // half a frame
        assert_eq!(steps, 0);
        let steps = ts.accumulate(0.010); // over one frame total
        assert_eq!(steps, 1);
    }

    #[test]
    fn caps_at_ten_steps() {
        let mut ts = FixedTimestep::new(1.0 / 60.0);
        let steps = ts.accumulate(1.0); // 60 frames worth, but capped at 10
        assert_eq!(steps, 10);
    }

    #[test]
    fn alpha_is_between_zero_and_one() {
        let mut ts = FixedTimestep::new(1.0 / 60.0);
        ts.accumulate(0.008);
        let a = ts.alpha();
        assert!(a >= 0.0 && a <= 1.0, "alpha was {}", a);
    }

    #[test]
    fn take_due_splits_by_tick() {
        let mut timers = TimerQueue::new();
        timers.schedule(5, None, Box::new(|_| {}));
        timers.schedule(10, None, Box::new(|_| {}));
        timers.schedule(3, None, Box::new(|_| {}));

        let due = timers.take_due(5);
        assert_eq!(due.len(), 2);
        assert_eq!(due[0].fires_at, 5);
        assert_eq!(due[1].fires_at, 3);
        assert_eq!(timers.len(), 1);
    }

    #[test]
    fn take_due_on_empty_queue() {
        let mut timers = TimerQueue::new();
        assert!(timers.take_due(100).is_empty());
        assert!(timers.is_empty());
    }
}
