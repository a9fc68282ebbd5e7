//! ALSXT Combat Core
//!
//! ECS-логика ближнего боя и target lock на Bevy 0.16 (headless).
//!
//! Разделение ответственности:
//! - ECS = решения (метод атаки, выбор монтажа, state machine, репликация, target lock)
//! - Host = анимации, рендер подсветки, физика мира, доставка сетевых сообщений

use bevy::prelude::*;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

// Публичные модули
pub mod combat;
pub mod components;
pub mod config;
pub mod logger;
pub mod net;
pub mod physics;
pub mod schedule;
pub mod targeting;

// Re-export базовых типов для удобства
pub use combat::{
    AttackDataError, AttackDataIndex, AttackHit, AttackIntent, AttackReaction, AttackStarted, CombatHistory,
    CombatPhase, CombatPlugin, CombatState, MontageId, PrimaryActionInput,
};
pub use components::*;
pub use config::{CombatSettings, ConfigError};
pub use logger::{init_logger, log, log_error, log_info, log_warning};
pub use net::{CombatProperties, CombatProperty, Replication, ReplicationTransport, SetDesiredCombatProperty};
pub use physics::{TraceBody, TraceChannel, TraceWorld};
pub use targeting::{TargetLock, TargetLockState, TargetingPlugin, TargetingRequest, TargetingRequestKind};

/// Главный plugin симуляции (объединяет все подсистемы)
pub struct SimulationPlugin;

impl Plugin for SimulationPlugin {
    fn build(&self, app: &mut App) {
        app
            // Fixed timestep 60Hz для simulation tick
            .insert_resource(Time::<Fixed>::from_hz(60.0))
            // Подсистемы (DeterministicRng(42) вставляет CombatPlugin, если хост не задал свой)
            .add_plugins((CombatPlugin, TargetingPlugin));
    }
}

/// Детерминистичный RNG resource (seeded), используется выбором монтажей
#[derive(Resource)]
pub struct DeterministicRng {
    pub rng: ChaCha8Rng,
    pub seed: u64,
}

impl DeterministicRng {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
            seed,
        }
    }
}

/// Создаёт minimal Bevy App для headless симуляции
pub fn create_headless_app(seed: u64) -> App {
    let mut app = App::new();
    init_logger();
    app.add_plugins(MinimalPlugins)
        .insert_resource(DeterministicRng::new(seed))
        .insert_resource(Time::<Fixed>::from_hz(60.0)); // 60Hz FixedUpdate

    app
}
