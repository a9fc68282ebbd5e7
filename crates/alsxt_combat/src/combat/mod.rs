//! Combat module (replicated attack lifecycle + collision resolution)
//!
//! ECS ответственность:
//! - Attack data: immutable index монтажей (RON, валидируется на загрузке)
//! - Decision logic: attack method по истории цели, выбор монтажа
//! - State machine: start / play / interrupt / stop, movement lock, репликация
//! - Collision trace: периодический sweep в окне удара, impact energy/side/form
//!
//! Host ответственность (collaborators):
//! - Animation blending, VFX, звук (слушают AttackStarted / AttackHit / AttackReaction)
//! - Доставка ReplicationIntent / ReplicationFact (ReplicationTransport)

use bevy::prelude::*;

pub mod attack_data;
pub mod events;
pub mod hit;
pub mod method;
pub mod montage;
pub mod state;
pub mod systems;
pub mod trace;

// Tests (separate files with _tests suffix)
#[cfg(test)]
mod attack_data_tests;
#[cfg(test)]
mod state_tests;

// Re-export основных типов
pub use attack_data::{AttackDataError, AttackDataIndex, DamageInfoEntry, BUNDLED_ATTACK_DATA};
pub use events::*;
pub use hit::{strength_from_hit, AttackDoubleHitResult, DoubleHitResult, ExtendedHitResult};
pub use method::{determine_attack_method, CombatHistory, LastTargetEntry};
pub use montage::{MontageId, MontageInfo, MontagePlayer};
pub use state::{is_attack_allowed_to_start, AttackStartParams, CombatPhase, CombatState, StartRejection};
pub use trace::{AttackTraceSession, AttackTraceSettings};

use crate::config::CombatSettings;
use crate::net::{
    apply_combat_property_requests, receive_replication_facts, receive_replication_intents, CombatPropertyChanged,
    Replication, ReplicationFactReceived, ReplicationIntentReceived, SetDesiredCombatProperty,
};
use crate::DeterministicRng;

/// Combat Plugin
///
/// Регистрирует combat системы в FixedUpdate (60Hz), строго последовательно.
///
/// Порядок выполнения:
/// 1. age_combat_history: счётчики истории стареют на dt
/// 2. apply_combat_property_requests: stance / ready position / defensive mode
/// 3. receive_replication_intents: authority принимает StartAttack / SetCombatProperty
/// 4. receive_replication_facts: реплики зеркалят старт / resync / свойства
/// 5. handle_primary_action_input: PrimaryActionInput → AttackIntent
/// 6. process_attack_intents: method → montage → StartAttack
/// 7. advance_montages: trace окно → Begin/EndAttackCollisionTrace, конец → снять action
/// 8. refresh_attacks: polling stop + доворот yaw
/// 9. handle_trace_windows: begin/end trace сессий
/// 10. tick_attack_traces: sweep → AttackCollision / AttackHit
/// 11. resolve_attack_collisions: blocked/landed, история, reaction
pub struct CombatPlugin;

impl Plugin for CombatPlugin {
    fn build(&self, app: &mut App) {
        // Resources (не перетираем вставленные заранее)
        app.init_resource::<CombatSettings>().init_resource::<Replication>();

        if !app.world().contains_resource::<DeterministicRng>() {
            app.insert_resource(DeterministicRng::new(42));
        }
        if !app.world().contains_resource::<AttackDataIndex>() {
            let index = match AttackDataIndex::bundled() {
                Ok(index) => index,
                Err(error) => {
                    crate::logger::log_error(&format!("❌ ECS: Bundled attack data rejected: {}", error));
                    AttackDataIndex::default()
                }
            };
            app.insert_resource(index);
        }

        // Регистрация событий
        app.add_event::<AttackIntent>()
            .add_event::<PrimaryActionInput>()
            .add_event::<AttackStarted>()
            .add_event::<AttackEnded>()
            .add_event::<SyncedAttackStarted>()
            .add_event::<BeginAttackCollisionTrace>()
            .add_event::<EndAttackCollisionTrace>()
            .add_event::<AttackCollision>()
            .add_event::<AttackHit>()
            .add_event::<AttackBlocked>()
            .add_event::<AttackLanded>()
            .add_event::<AttackReaction>()
            .add_event::<SetDesiredCombatProperty>()
            .add_event::<CombatPropertyChanged>()
            .add_event::<ReplicationIntentReceived>()
            .add_event::<ReplicationFactReceived>();

        // Регистрация систем в FixedUpdate
        app.add_systems(
            FixedUpdate,
            (
                // Фаза 1: История + свойства + входящая репликация
                systems::age_combat_history,
                apply_combat_property_requests,
                receive_replication_intents,
                receive_replication_facts,

                // Фаза 2: Решение и старт атаки
                systems::handle_primary_action_input,
                systems::process_attack_intents,

                // Фаза 3: Playback + polling stop
                systems::advance_montages,
                systems::refresh_attacks,

                // Фаза 4: Collision trace → resolution
                systems::handle_trace_windows,
                systems::tick_attack_traces,
                systems::resolve_attack_collisions,
            )
                .chain(),
        );
    }
}
