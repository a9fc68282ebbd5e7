//! Replication transport: intent → authority, fact → observers.
//!
//! Core ничего не знает про сеть: локальная мутация порождает intent,
//! authoritative изменение порождает fact. Доставку делает injected transport.

use bevy::prelude::*;
use std::sync::{Arc, Mutex};

use super::properties::CombatProperty;
use crate::combat::state::AttackStartParams;

/// Запрос от не-authority реплики к authority
#[derive(Debug, Clone, PartialEq)]
pub enum ReplicationIntent {
    StartAttack { actor: Entity, params: AttackStartParams },
    SetCombatProperty { actor: Entity, property: CombatProperty },
}

/// Authoritative изменение для всех наблюдателей
#[derive(Debug, Clone, PartialEq)]
pub enum ReplicationFact {
    AttackStarted { actor: Entity, params: AttackStartParams },
    /// Authority остановила атаку: реплики пересинхронизируют state
    StateResync { actor: Entity },
    CombatPropertyChanged {
        actor: Entity,
        previous: CombatProperty,
        current: CombatProperty,
    },
}

/// Collaborator: доставка сообщений
pub trait ReplicationTransport {
    fn send_to_authority(&mut self, intent: ReplicationIntent);
    fn broadcast(&mut self, fact: ReplicationFact);
}

/// Transport resource (boxed, подменяется в тестах)
#[derive(Resource)]
pub struct Replication {
    transport: Box<dyn ReplicationTransport + Send + Sync>,
}

impl Replication {
    pub fn new(transport: impl ReplicationTransport + Send + Sync + 'static) -> Self {
        Self {
            transport: Box::new(transport),
        }
    }

    pub fn offline() -> Self {
        Self::new(OfflineTransport)
    }
}

impl Default for Replication {
    fn default() -> Self {
        Self::offline()
    }
}

impl ReplicationTransport for Replication {
    fn send_to_authority(&mut self, intent: ReplicationIntent) {
        self.transport.send_to_authority(intent);
    }

    fn broadcast(&mut self, fact: ReplicationFact) {
        self.transport.broadcast(fact);
    }
}

/// Offline / listen-server без клиентов: сообщения никуда не уходят
#[derive(Debug, Clone, Copy, Default)]
pub struct OfflineTransport;

impl ReplicationTransport for OfflineTransport {
    fn send_to_authority(&mut self, _intent: ReplicationIntent) {}

    fn broadcast(&mut self, _fact: ReplicationFact) {}
}

#[derive(Debug, Default)]
struct RecordedTraffic {
    intents: Vec<ReplicationIntent>,
    facts: Vec<ReplicationFact>,
}

/// Записывает весь outbound трафик (clone = handle на тот же лог)
#[derive(Debug, Clone, Default)]
pub struct RecordingTransport {
    traffic: Arc<Mutex<RecordedTraffic>>,
}

impl RecordingTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn intents(&self) -> Vec<ReplicationIntent> {
        self.traffic
            .lock()
            .map(|traffic| traffic.intents.clone())
            .unwrap_or_default()
    }

    pub fn facts(&self) -> Vec<ReplicationFact> {
        self.traffic
            .lock()
            .map(|traffic| traffic.facts.clone())
            .unwrap_or_default()
    }

    pub fn clear(&self) {
        if let Ok(mut traffic) = self.traffic.lock() {
            traffic.intents.clear();
            traffic.facts.clear();
        }
    }
}

impl ReplicationTransport for RecordingTransport {
    fn send_to_authority(&mut self, intent: ReplicationIntent) {
        if let Ok(mut traffic) = self.traffic.lock() {
            traffic.intents.push(intent);
        }
    }

    fn broadcast(&mut self, fact: ReplicationFact) {
        if let Ok(mut traffic) = self.traffic.lock() {
            traffic.facts.push(fact);
        }
    }
}

/// Входящий intent (на authority)
#[derive(Event, Debug, Clone)]
pub struct ReplicationIntentReceived(pub ReplicationIntent);

/// Входящий fact (на любой реплике)
#[derive(Event, Debug, Clone)]
pub struct ReplicationFactReceived(pub ReplicationFact);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recording_handles_share_log() {
        let recorder = RecordingTransport::new();
        let mut replication = Replication::new(recorder.clone());
        let actor = Entity::from_raw(7);

        replication.broadcast(ReplicationFact::StateResync { actor });
        assert_eq!(recorder.facts(), vec![ReplicationFact::StateResync { actor }]);
        assert!(recorder.intents().is_empty());

        recorder.clear();
        assert!(recorder.facts().is_empty());
    }
}
