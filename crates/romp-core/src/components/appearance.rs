//! State-driven animation cue selection.
//!
//! Rendering is out of scope here; this component only decides *which* cue
//! an actor should be showing, based on its current discrete state, and
//! advances frame timing. The renderer reads `current_frame` each frame.

use std::collections::HashMap;

use crate::components::state::ActorState;

/// A single animation sequence: atlas cells plus timing.
#[derive(Debug, Clone)]
pub struct Cue {
    /// Frame cells as (col, row) pairs in the host's atlas.
    pub frames: Vec<(f32, f32)>,
    /// Seconds per frame.
    pub frame_duration: f32,
    /// Whether to loop when reaching the end.
    pub looping: bool,
}

impl Cue {
    /// A horizontal strip of consecutive columns in one row.
    pub fn strip(row: f32, start_col: f32, frame_count: u32, fps: f32) -> Self {
        let frames = (0..frame_count)
            .map(|i| (start_col + i as f32, row))
            .collect();
        Self {
            frames,
            frame_duration: 1.0 / fps,
            looping: true,
        }
    }

    /// An explicit frame list.
    pub fn from_frames(frames: Vec<(f32, f32)>, fps: f32, looping: bool) -> Self {
        Self {
            frames,
            frame_duration: 1.0 / fps,
            looping,
        }
    }
}

/// Map a state record to the cue name it wants, without the facing suffix.
fn mode_name(state: &ActorState) -> &'static str {
    if state.disappearing {
        "disappear"
    } else if state.tossing {
        "toss"
    } else if state.crawling {
        "crawl"
    } else if state.jumping {
        "jump"
    } else if state.invincible {
        "invincible"
    } else if state.moving {
        "walk"
    } else {
        "idle"
    }
}

/// Per-actor appearance: named cues and the playback position.
///
/// Cue names follow the `mode` or `mode_e` / `mode_w` convention, e.g.
/// "walk_e", "jump_w", "idle". Selection prefers the faced variant and
/// falls back to the bare mode name, then stays on the current cue.
#[derive(Debug, Clone, Default)]
pub struct AppearanceComponent {
    cues: HashMap<String, Cue>,
    current: String,
    frame_index: usize,
    frame_timer: f32,
    playing: bool,
}

impl AppearanceComponent {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a cue under a name.
    pub fn add_cue(&mut self, name: impl Into<String>, cue: Cue) {
        self.cues.insert(name.into(), cue);
    }

    pub fn with_cue(mut self, name: impl Into<String>, cue: Cue) -> Self {
        self.add_cue(name, cue);
        self
    }

    /// The cue currently playing, if any.
    pub fn current_cue(&self) -> Option<&str> {
        if self.current.is_empty() {
            None
        } else {
            Some(&self.current)
        }
    }

    /// Current frame (col, row) for the renderer.
    pub fn current_frame(&self) -> Option<(f32, f32)> {
        self.cues
            .get(&self.current)
            .and_then(|cue| cue.frames.get(self.frame_index).copied())
    }

    /// Pick the cue matching the actor's state, restarting playback only on
    /// an actual change. Missing cues fall back rather than erroring.
    pub fn select_for_state(&mut self, state: &ActorState) {
        if self.cues.is_empty() {
            return;
        }
        let mode = mode_name(state);
        let suffix = if state.facing_east { "e" } else { "w" };
        let faced = format!("{mode}_{suffix}");
        if self.cues.contains_key(&faced) {
            self.play_if_different(&faced);
        } else if self.cues.contains_key(mode) {
            self.play_if_different(mode);
        }
        // neither variant registered: keep whatever is playing
    }

    fn play_if_different(&mut self, name: &str) {
        if self.current != name {
            self.current = name.to_string();
            self.frame_index = 0;
            self.frame_timer = 0.0;
            self.playing = true;
        }
    }

    /// Advance playback by dt seconds. Returns true if the frame changed.
    pub fn tick(&mut self, dt: f32) -> bool {
        if !self.playing {
            return false;
        }
        let Some(cue) = self.cues.get(&self.current) else {
            return false;
        };
        if cue.frames.is_empty() {
            return false;
        }

        self.frame_timer += dt;
        let mut frame_changed = false;
        while self.frame_timer >= cue.frame_duration {
            self.frame_timer -= cue.frame_duration;
            self.frame_index += 1;
            frame_changed = true;
            if self.frame_index >= cue.frames.len() {
                if cue.looping {
                    self.frame_index = 0;
                } else {
                    self.frame_index = cue.frames.len() - 1;
                    self.playing = false;
                    break;
                }
            }
        }
        frame_changed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::state::{ActorState, CompassDirection};

    fn walker() -> AppearanceComponent {
        AppearanceComponent::new()
            .with_cue("idle", Cue::strip(0.0, 0.0, 2, 5.0))
            .with_cue("walk_e", Cue::strip(1.0, 0.0, 4, 10.0))
            .with_cue("walk_w", Cue::strip(2.0, 0.0, 4, 10.0))
    }

    #[test]
    fn selects_faced_walk_cue() {
        let mut appearance = walker();
        let state = ActorState {
            moving: true,
            facing_east: false,
            ..ActorState::default()
        };
        appearance.select_for_state(&state);
        assert_eq!(appearance.current_cue(), Some("walk_w"));
    }

    #[test]
    fn falls_back_to_bare_mode_name() {
        let mut appearance = walker();
        let state = ActorState::default(); // idle, facing east; no "idle_e"
        appearance.select_for_state(&state);
        assert_eq!(appearance.current_cue(), Some("idle"));
    }

    #[test]
    fn reselecting_same_cue_keeps_frame() {
        let mut appearance = walker();
        let state = ActorState {
            moving: true,
            direction: CompassDirection::E,
            ..ActorState::default()
        };
        appearance.select_for_state(&state);
        appearance.tick(0.15);
        let frame = appearance.current_frame();
        appearance.select_for_state(&state);
        assert_eq!(appearance.current_frame(), frame);
    }

    #[test]
    fn non_looping_cue_parks_on_last_frame() {
        let mut appearance = AppearanceComponent::new()
            .with_cue("disappear", Cue::from_frames(vec![(0.0, 0.0), (1.0, 0.0)], 10.0, false));
        let state = ActorState {
            disappearing: true,
            ..ActorState::default()
        };
        appearance.select_for_state(&state);
        appearance.tick(0.5);
        assert_eq!(appearance.current_frame(), Some((1.0, 0.0)));
        assert!(!appearance.tick(0.5));
    }

    #[test]
    fn ticks_through_frames() {
        let mut appearance = walker();
        let state = ActorState {
            moving: true,
            ..ActorState::default()
        };
        appearance.select_for_state(&state);
        assert_eq!(appearance.current_frame(), Some((0.0, 1.0)));
        appearance.tick(0.15);
        assert_eq!(appearance.current_frame(), Some((1.0, 1.0)));
    }
}
