//! Combat systems (thin ECS adapters над логикой из combat/*)

pub mod attack;
pub mod collision;
pub mod history;

// Re-export all systems
pub use attack::*;
pub use collision::*;
pub use history::*;
