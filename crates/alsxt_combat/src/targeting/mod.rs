//! Targeting module (target lock: scan, acquire, cycle, maintain)
//!
//! ECS ответственность:
//! - Box sweep перед view origin → кандидаты (дистанция + signed угол)
//! - Единственная текущая цель на актора + подсветка её материалов
//! - Периодический maintain: дистанция удержания, obstruction, доворот control yaw
//!
//! Host ответственность:
//! - Input → TargetingRequest (engage / acquire / cycle / disengage)
//! - Рендер подсветки по MeshHighlight

use bevy::prelude::*;

pub mod entry;
pub mod events;
pub mod lock;
pub mod systems;


pub use entry::{signed_angle, trace_for_targets, TargetHitResultEntry, TargetingView, ANGLE_SENTINEL};
pub use events::*;
pub use lock::{CycleDirection, MaintainContext, MaintainOutcome, TargetHighlighter, TargetLock, TargetLockState};
pub use systems::{handle_targeting_requests, update_target_locks, MeshHighlighter, TargetingWorld};

use crate::config::CombatSettings;

/// Targeting Plugin
///
/// Порядок выполнения (FixedUpdate):
/// 1. handle_targeting_requests: запросы от input/AI
/// 2. update_target_locks: периодический scan/maintain (до решения атаки, чтобы yaw был свежим)
pub struct TargetingPlugin;

impl Plugin for TargetingPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<CombatSettings>();

        app.add_event::<TargetingRequest>()
            .add_event::<TargetLocked>()
            .add_event::<TargetUnlocked>()
            .add_event::<TargetObstructed>();

        app.add_systems(
            FixedUpdate,
            (handle_targeting_requests, update_target_locks)
                .chain()
                .before(crate::combat::systems::handle_primary_action_input),
        );
    }
}
