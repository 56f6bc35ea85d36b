//! Per-actor discrete behavioral state.
//!
//! Presentation layers subscribe to transitions instead of polling: the
//! state machine applies events, drops no-op transitions, and notifies
//! observers synchronously in registration order.

use glam::Vec2;

use crate::api::types::ActorId;

/// 8-way compass direction, Y-down (south is positive Y).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CompassDirection {
    N,
    NE,
    E,
    SE,
    S,
    SW,
    W,
    NW,
}

impl CompassDirection {
    /// Classify a velocity vector into one of the eight 45-degree sectors.
    pub fn from_vector(v: Vec2) -> Self {
        let deg = v.y.atan2(v.x).to_degrees();
        if (-22.5..22.5).contains(&deg) {
            Self::E
        } else if (22.5..67.5).contains(&deg) {
            Self::SE
        } else if (67.5..112.5).contains(&deg) {
            Self::S
        } else if (112.5..157.5).contains(&deg) {
            Self::SW
        } else if (-67.5..-22.5).contains(&deg) {
            Self::NE
        } else if (-112.5..-67.5).contains(&deg) {
            Self::N
        } else if (-157.5..-112.5).contains(&deg) {
            Self::NW
        } else {
            Self::W
        }
    }

    /// Whether this direction has an eastward component.
    pub fn is_eastward(self) -> bool {
        matches!(self, Self::E | Self::NE | Self::SE)
    }

    /// Whether this direction has a westward component.
    pub fn is_westward(self) -> bool {
        matches!(self, Self::W | Self::NW | Self::SW)
    }
}

/// The discrete-mode record for one actor.
///
/// `facing_east` remembers the last east/west facing so that pure
/// north/south motion does not reset animation facing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActorState {
    pub direction: CompassDirection,
    pub moving: bool,
    pub tossing: bool,
    pub invincible: bool,
    pub jumping: bool,
    pub crawling: bool,
    pub disappearing: bool,
    pub facing_east: bool,
}

impl Default for ActorState {
    fn default() -> Self {
        Self {
            direction: CompassDirection::E,
            moving: false,
            tossing: false,
            invincible: false,
            jumping: false,
            crawling: false,
            disappearing: false,
            facing_east: true,
        }
    }
}

/// Transition triggers. Each maps deterministically to one field mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateEvent {
    Move(CompassDirection),
    Stop,
    TossStart,
    TossStop,
    InvincibleStart,
    InvincibleStop,
    JumpStart,
    JumpStop,
    CrawlStart,
    CrawlStop,
    Disappear,
}

fn apply(state: &mut ActorState, event: StateEvent) {
    match event {
        StateEvent::Move(dir) => {
            state.moving = true;
            state.direction = dir;
            if dir.is_eastward() {
                state.facing_east = true;
            } else if dir.is_westward() {
                state.facing_east = false;
            }
            // pure N/S keeps the previous facing
        }
        StateEvent::Stop => state.moving = false,
        StateEvent::TossStart => state.tossing = true,
        StateEvent::TossStop => state.tossing = false,
        StateEvent::InvincibleStart => state.invincible = true,
        StateEvent::InvincibleStop => state.invincible = false,
        StateEvent::JumpStart => state.jumping = true,
        StateEvent::JumpStop => state.jumping = false,
        StateEvent::CrawlStart => state.crawling = true,
        StateEvent::CrawlStop => state.crawling = false,
        StateEvent::Disappear => state.disappearing = true,
    }
}

/// Callback invoked after a transition actually changed something.
/// Receives the actor, the triggering event, the new state, and the old.
pub type StateObserver = Box<dyn FnMut(ActorId, StateEvent, &ActorState, &ActorState)>;

/// One actor's state record plus its append-only observer list.
pub struct StateManager {
    current: ActorState,
    observers: Vec<StateObserver>,
}

impl StateManager {
    pub fn new() -> Self {
        Self {
            current: ActorState::default(),
            observers: Vec::new(),
        }
    }

    pub fn current(&self) -> &ActorState {
        &self.current
    }

    /// Append an observer. There is no removal API; observers live as long
    /// as the actor does.
    pub fn register_observer(&mut self, observer: StateObserver) {
        self.observers.push(observer);
    }

    /// Apply an event. No-op transitions return `false` without notifying;
    /// real transitions mutate the record in place, then notify every
    /// observer in registration order.
    pub fn change_state(&mut self, actor: ActorId, event: StateEvent) -> bool {
        let old = self.current;
        let mut next = old;
        apply(&mut next, event);
        if next == old {
            return false;
        }
        self.current = next;
        for observer in &mut self.observers {
            observer(actor, event, &self.current, &old);
        }
        true
    }

    /// Reset the record without notifying, for pooled actors coming back
    /// into play.
    pub fn reset(&mut self) {
        self.current = ActorState::default();
    }
}

impl Default for StateManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn counting_manager() -> (StateManager, Rc<RefCell<Vec<StateEvent>>>) {
        let mut sm = StateManager::new();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = seen.clone();
        sm.register_observer(Box::new(move |_, event, _, _| {
            sink.borrow_mut().push(event);
        }));
        (sm, seen)
    }

    #[test]
    fn duplicate_move_notifies_once() {
        let (mut sm, seen) = counting_manager();
        sm.change_state(ActorId(1), StateEvent::Move(CompassDirection::E));
        sm.change_state(ActorId(1), StateEvent::Move(CompassDirection::E));
        assert_eq!(seen.borrow().len(), 1);
        assert_eq!(sm.current().direction, CompassDirection::E);
        assert!(sm.current().moving);
    }

    #[test]
    fn vertical_motion_keeps_facing() {
        let mut sm = StateManager::new();
        sm.change_state(ActorId(1), StateEvent::Move(CompassDirection::W));
        assert!(!sm.current().facing_east);
        sm.change_state(ActorId(1), StateEvent::Move(CompassDirection::N));
        assert!(!sm.current().facing_east, "N move must not reset facing");
        sm.change_state(ActorId(1), StateEvent::Move(CompassDirection::SE));
        assert!(sm.current().facing_east);
        sm.change_state(ActorId(1), StateEvent::Move(CompassDirection::S));
        assert!(sm.current().facing_east);
    }

    #[test]
    fn observers_run_in_registration_order() {
        let mut sm = StateManager::new();
        let order = Rc::new(RefCell::new(Vec::new()));
        for label in ["first", "second", "third"] {
            let sink = order.clone();
            sm.register_observer(Box::new(move |_, _, _, _| {
                sink.borrow_mut().push(label);
            }));
        }
        sm.change_state(ActorId(7), StateEvent::JumpStart);
        assert_eq!(*order.borrow(), vec!["first", "second", "third"]);
    }

    #[test]
    fn observer_sees_old_and_new() {
        let mut sm = StateManager::new();
        let snapshots = Rc::new(RefCell::new(Vec::new()));
        let sink = snapshots.clone();
        sm.register_observer(Box::new(move |_, _, new, old| {
            sink.borrow_mut().push((old.jumping, new.jumping));
        }));
        sm.change_state(ActorId(1), StateEvent::JumpStart);
        sm.change_state(ActorId(1), StateEvent::JumpStop);
        assert_eq!(*snapshots.borrow(), vec![(false, true), (true, false)]);
    }

    #[test]
    fn stop_without_motion_is_a_noop() {
        let (mut sm, seen) = counting_manager();
        sm.change_state(ActorId(1), StateEvent::Stop);
        assert!(seen.borrow().is_empty());
    }

    #[test]
    fn direction_sectors() {
        assert_eq!(CompassDirection::from_vector(Vec2::new(1.0, 0.0)), CompassDirection::E);
        assert_eq!(CompassDirection::from_vector(Vec2::new(-1.0, 0.0)), CompassDirection::W);
        // Y-down: positive y is south
        assert_eq!(CompassDirection::from_vector(Vec2::new(0.0, 1.0)), CompassDirection::S);
        assert_eq!(CompassDirection::from_vector(Vec2::new(0.0, -1.0)), CompassDirection::N);
        assert_eq!(CompassDirection::from_vector(Vec2::new(1.0, 1.0)), CompassDirection::SE);
        assert_eq!(CompassDirection::from_vector(Vec2::new(-1.0, -1.0)), CompassDirection::NW);
    }
}
