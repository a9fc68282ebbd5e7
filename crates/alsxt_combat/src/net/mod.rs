//! Replication module (transport-agnostic)
//!
//! Локальная мутация → intent на authority; authoritative изменение → fact
//! всем наблюдателям. Доставка: injected `ReplicationTransport`.
//!
//! Системы регистрирует `CombatPlugin` (единый порядок в FixedUpdate).

pub mod properties;
pub mod systems;
pub mod transport;

// Re-export основных типов
pub use properties::{
    apply_property, expand_property, CombatProperties, CombatProperty, CombatPropertyChanged, ReplicatedTag,
    SetDesiredCombatProperty,
};
pub use systems::{apply_combat_property_requests, receive_replication_facts, receive_replication_intents};
pub use transport::{
    OfflineTransport, RecordingTransport, Replication, ReplicationFact, ReplicationFactReceived, ReplicationIntent,
    ReplicationIntentReceived, ReplicationTransport,
};
