//! Replicated combat properties (combat stance, weapon ready position, defensive mode).
//!
//! Каждое свойство: local set → dirty → (не authority) intent на authority →
//! (authority) fact с previous + current значением.

use bevy::prelude::*;

use super::transport::{ReplicationFact, ReplicationIntent, ReplicationTransport};
use crate::components::{CombatStance, DefensiveMode, NetRole, WeaponReadyPosition};

/// Значение с dirty флагом (ждёт репликации)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReplicatedTag<T> {
    value: T,
    dirty: bool,
}

impl<T: Copy + PartialEq> ReplicatedTag<T> {
    pub fn get(&self) -> T {
        self.value
    }

    /// Новое значение → Some(previous); то же самое → None
    pub fn set(&mut self, value: T) -> Option<T> {
        if self.value == value {
            return None;
        }
        let previous = self.value;
        self.value = value;
        self.dirty = true;
        Some(previous)
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn take_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }
}

/// Одно replicated свойство с его значением
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CombatProperty {
    CombatStance(CombatStance),
    WeaponReadyPosition(WeaponReadyPosition),
    DefensiveMode(DefensiveMode),
}

/// Replicated combat properties персонажа
#[derive(Component, Debug, Clone, Default)]
pub struct CombatProperties {
    pub combat_stance: ReplicatedTag<CombatStance>,
    pub weapon_ready_position: ReplicatedTag<WeaponReadyPosition>,
    pub defensive_mode: ReplicatedTag<DefensiveMode>,
}

impl CombatProperties {
    pub fn combat_stance(&self) -> CombatStance {
        self.combat_stance.get()
    }

    pub fn weapon_ready_position(&self) -> WeaponReadyPosition {
        self.weapon_ready_position.get()
    }

    pub fn defensive_mode(&self) -> DefensiveMode {
        self.defensive_mode.get()
    }

    pub fn is_blocking(&self) -> bool {
        self.defensive_mode() == DefensiveMode::Blocking
    }

    pub fn is_in_defensive_mode(&self) -> bool {
        self.defensive_mode() != DefensiveMode::None
    }

    /// Ставит свойство, возвращает previous если значение изменилось
    pub fn set(&mut self, property: CombatProperty) -> Option<CombatProperty> {
        match property {
            CombatProperty::CombatStance(value) => self.combat_stance.set(value).map(CombatProperty::CombatStance),
            CombatProperty::WeaponReadyPosition(value) => self
                .weapon_ready_position
                .set(value)
                .map(CombatProperty::WeaponReadyPosition),
            CombatProperty::DefensiveMode(value) => self.defensive_mode.set(value).map(CombatProperty::DefensiveMode),
        }
    }
}

/// Запрос на смену свойства (input, AI, host)
#[derive(Event, Debug, Clone, Copy)]
pub struct SetDesiredCombatProperty {
    pub actor: Entity,
    pub property: CombatProperty,
}

/// Change notification: previous + current
#[derive(Event, Debug, Clone, Copy, PartialEq)]
pub struct CombatPropertyChanged {
    pub actor: Entity,
    pub previous: CombatProperty,
    pub current: CombatProperty,
}

/// Изменения, которые вызвала смена свойства (stance тянет за собой ready position)
pub fn expand_property(property: CombatProperty, holds_aimable_item: bool) -> Vec<CombatProperty> {
    let mut properties = vec![property];
    if let CombatProperty::CombatStance(stance) = property {
        if stance != CombatStance::Neutral {
            let position = if holds_aimable_item {
                WeaponReadyPosition::LowReady
            } else {
                WeaponReadyPosition::Ready
            };
            properties.push(CombatProperty::WeaponReadyPosition(position));
        }
    }
    properties
}

/// Local set + репликация одного свойства.
///
/// Возвращает change notification, если значение реально поменялось.
pub fn apply_property(
    actor: Entity,
    role: NetRole,
    properties: &mut CombatProperties,
    property: CombatProperty,
    transport: &mut impl ReplicationTransport,
) -> Option<CombatPropertyChanged> {
    let previous = properties.set(property)?;

    if role.is_authority() {
        transport.broadcast(ReplicationFact::CombatPropertyChanged {
            actor,
            previous,
            current: property,
        });
    } else {
        transport.send_to_authority(ReplicationIntent::SetCombatProperty { actor, property });
    }
    clear_dirty(properties, property);

    Some(CombatPropertyChanged {
        actor,
        previous,
        current: property,
    })
}

fn clear_dirty(properties: &mut CombatProperties, property: CombatProperty) {
    match property {
        CombatProperty::CombatStance(_) => properties.combat_stance.take_dirty(),
        CombatProperty::WeaponReadyPosition(_) => properties.weapon_ready_position.take_dirty(),
        CombatProperty::DefensiveMode(_) => properties.defensive_mode.take_dirty(),
    };
}
