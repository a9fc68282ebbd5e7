//! Attack Method Resolver + per-opponent interaction history.

use bevy::prelude::*;
use std::collections::HashMap;

use crate::components::AttackMethod;
use crate::config::AttackSettings;

/// "Давно": значение счётчиков до первого события
pub const NEVER: f32 = 99.0;

/// Память о взаимодействии с одним оппонентом (секунды с момента события)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LastTargetEntry {
    pub target: Entity,
    pub last_interaction: f32,
    pub last_hit_to: f32,
    pub consecutive_hits: u32,
    pub last_blocked_attack: f32,
}

impl LastTargetEntry {
    pub fn new(target: Entity) -> Self {
        Self {
            target,
            last_interaction: NEVER,
            last_hit_to: NEVER,
            consecutive_hits: 0,
            last_blocked_attack: NEVER,
        }
    }

    fn age(&mut self, delta: f32) {
        self.last_interaction += delta;
        self.last_hit_to += delta;
        self.last_blocked_attack += delta;
    }
}

/// История атакующего по оппонентам.
///
/// Entry появляется только после реального взаимодействия.
#[derive(Component, Debug, Clone, Default)]
pub struct CombatHistory {
    entries: HashMap<Entity, LastTargetEntry>,
}

impl CombatHistory {
    pub fn get(&self, target: Entity) -> Option<&LastTargetEntry> {
        self.entries.get(&target)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn touch(&mut self, target: Entity) -> &mut LastTargetEntry {
        let entry = self
            .entries
            .entry(target)
            .or_insert_with(|| LastTargetEntry::new(target));
        entry.last_interaction = 0.0;
        entry
    }

    /// Удар дошёл до цели
    pub fn record_hit(&mut self, target: Entity) {
        let entry = self.touch(target);
        entry.last_hit_to = 0.0;
        entry.consecutive_hits += 1;
    }

    /// Цель заблокировала удар: серия обнуляется
    pub fn record_blocked(&mut self, target: Entity) {
        let entry = self.touch(target);
        entry.last_blocked_attack = 0.0;
        entry.consecutive_hits = 0;
    }

    pub fn age(&mut self, delta: f32) {
        for entry in self.entries.values_mut() {
            entry.age(delta);
        }
    }

    pub fn forget(&mut self, target: Entity) {
        self.entries.remove(&target);
    }
}

/// Классификация атаки по истории цели (первое совпадение):
/// 1. нет истории → Regular
/// 2. цель блокировала < riposte_window назад → Riposte
/// 3. consecutive hits > special_consecutive_hits → Special
/// 4. иначе Regular
///
/// TakeDown ни одно правило не производит.
pub fn determine_attack_method(entry: Option<&LastTargetEntry>, settings: &AttackSettings) -> AttackMethod {
    let Some(entry) = entry else {
        return AttackMethod::Regular;
    };

    if entry.last_blocked_attack < settings.riposte_window {
        AttackMethod::Riposte
    } else if entry.consecutive_hits > settings.special_consecutive_hits {
        AttackMethod::Special
    } else {
        AttackMethod::Regular
    }
}
