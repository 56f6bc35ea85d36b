/// Unique identifier for an actor in the scene.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ActorId(pub u32);

/// Pre-resolved handle to a sound owned by the host audio layer.
/// The numeric value maps to a game-defined sound asset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SoundHandle(pub u32);

/// A scoring/session notification emitted by the gameplay core.
///
/// The host owns counters and win/lose policy; this crate only reports what
/// happened and to whom.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageEvent {
    /// A goodie was collected and removed.
    GoodieCollected { goodie: ActorId, hero: ActorId },
    /// An enemy was defeated with scoring credit.
    EnemyDefeated { enemy: ActorId, defeater: Option<ActorId> },
    /// A destination accepted a hero.
    Arrived { destination: ActorId, hero: ActorId },
    /// A hero was removed by an enemy it could not survive.
    HeroDefeated { hero: ActorId, enemy: ActorId },
    /// A must-survive hero went down; the session is over.
    LevelLost,
}
