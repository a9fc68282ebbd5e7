//! ECS Components для боевых entity
//!
//! Организация по доменам:
//! - tags: закрытые enum'ы (attack type, strength, stance, impact, combat stance...)
//! - actor: персонаж (Character, ControlRotation, NetRole, LocomotionAction, MovementLock)
//! - capabilities: lockable target, collision reactor, attack physics, highlight, bones, strike sockets

pub mod actor;
pub mod capabilities;
pub mod tags;

// Re-exports для удобного импорта
pub use actor::*;
pub use capabilities::*;
pub use tags::*;
