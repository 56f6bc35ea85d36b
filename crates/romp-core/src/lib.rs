pub mod api;
pub mod components;
pub mod core;
pub mod input;
pub mod systems;

// Re-export key types at crate root for convenience
pub use crate::api::stage::{AudioQueue, Stage, StageConfig};
pub use crate::api::types::{ActorId, SoundHandle, StageEvent};
pub use crate::components::actor::{Actor, SoundSet};
pub use crate::components::appearance::{AppearanceComponent, Cue};
pub use crate::components::movement::{Movement, PathProgress};
pub use crate::components::role::{
    CollisionRules, Destination, Enemy, Goodie, Hero, Obstacle, Projectile, Role, RoleTags,
    Sensor, Sides,
};
pub use crate::components::state::{
    ActorState, CompassDirection, StateEvent as ActorStateEvent, StateManager, StateObserver,
};
pub use crate::core::physics::{
    BodyDesc, BodyType, ColliderDesc, ColliderMaterial, CollisionPair, JointDesc, JointHandle,
    PhysicsBody, PhysicsWorld,
};
pub use crate::core::scene::Scene;
pub use crate::core::time::{FixedTimestep, TimerQueue};
pub use crate::input::queue::{InputEvent, InputQueue};
pub use crate::systems::collisions::{
    defeat_enemy, reclaim_projectile, resolve_contact, soft_remove, CollisionCtx,
};
pub use crate::systems::motion::{drive_movement, sample_motion_states};
