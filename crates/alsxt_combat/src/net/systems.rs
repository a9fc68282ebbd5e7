//! Replication systems: входящие intents/facts + combat property requests.

use bevy::prelude::*;

use super::properties::{apply_property, expand_property, CombatProperties, CombatPropertyChanged, SetDesiredCombatProperty};
use super::transport::{Replication, ReplicationFact, ReplicationFactReceived, ReplicationIntent, ReplicationIntentReceived};
use crate::combat::attack_data::AttackDataIndex;
use crate::combat::state::{server_start_attack, start_attack_implementation, AttackerQuery};
use crate::components::{HeldItem, LocomotionActionKind, NetRole};

/// System: Desired combat property → local set + репликация.
///
/// Combat stance (не Neutral) тянет за собой weapon ready position.
pub fn apply_combat_property_requests(
    mut requests: EventReader<SetDesiredCombatProperty>,
    mut actors: Query<(&NetRole, &mut CombatProperties, Option<&HeldItem>)>,
    mut replication: ResMut<Replication>,
    mut changed: EventWriter<CombatPropertyChanged>,
) {
    for request in requests.read() {
        let Ok((role, mut properties, held_item)) = actors.get_mut(request.actor) else {
            continue;
        };
        if matches!(role, NetRole::SimulatedProxy) {
            continue;
        }

        let aimable = held_item.is_some_and(|item| item.aimable);
        for property in expand_property(request.property, aimable) {
            if let Some(change) = apply_property(request.actor, *role, &mut properties, property, &mut *replication) {
                crate::logger::log(&format!(
                    "🎚️ ECS: Combat property changed (actor: {:?}, {:?} → {:?})",
                    request.actor, change.previous, change.current
                ));
                changed.write(change);
            }
        }
    }
}

/// System: Входящие intents (honoured только на authority)
pub fn receive_replication_intents(
    mut intents: EventReader<ReplicationIntentReceived>,
    mut attackers: Query<AttackerQuery>,
    mut properties: Query<(&NetRole, &mut CombatProperties)>,
    index: Res<AttackDataIndex>,
    mut replication: ResMut<Replication>,
    mut changed: EventWriter<CombatPropertyChanged>,
) {
    for ReplicationIntentReceived(intent) in intents.read() {
        match intent {
            ReplicationIntent::StartAttack { actor, params } => {
                let Ok(mut item) = attackers.get_mut(*actor) else {
                    continue;
                };
                match server_start_attack(&mut item.attacker(), params, &index, &mut *replication) {
                    Ok(()) => crate::logger::log(&format!(
                        "📡 ECS: Attack intent accepted (actor: {:?}, montage: {})",
                        actor, params.montage
                    )),
                    Err(rejection) => crate::logger::log(&format!(
                        "📡 ECS: Attack intent dropped (actor: {:?}): {}",
                        actor, rejection
                    )),
                }
            }
            ReplicationIntent::SetCombatProperty { actor, property } => {
                let Ok((role, mut current)) = properties.get_mut(*actor) else {
                    continue;
                };
                if !role.is_authority() {
                    continue;
                }
                if let Some(change) = apply_property(*actor, *role, &mut current, *property, &mut *replication) {
                    changed.write(change);
                }
            }
        }
    }
}

/// System: Входящие facts (любая реплика).
///
/// AttackStarted проходит через тот же allowed predicate: эхо инициатора отбрасывается.
pub fn receive_replication_facts(
    mut facts: EventReader<ReplicationFactReceived>,
    mut attackers: Query<AttackerQuery>,
    mut properties: Query<(&NetRole, &mut CombatProperties)>,
    index: Res<AttackDataIndex>,
    mut changed: EventWriter<CombatPropertyChanged>,
) {
    for ReplicationFactReceived(fact) in facts.read() {
        match fact {
            ReplicationFact::AttackStarted { actor, params } => {
                let Ok(mut item) = attackers.get_mut(*actor) else {
                    continue;
                };
                if start_attack_implementation(&mut item.attacker(), params, &index).is_ok() {
                    item.movement.lock();
                    crate::logger::log(&format!(
                        "📡 ECS: Mirrored attack start (actor: {:?}, montage: {})",
                        actor, params.montage
                    ));
                }
            }
            ReplicationFact::StateResync { actor } => {
                let Ok(mut item) = attackers.get_mut(*actor) else {
                    continue;
                };
                // Снимаем действие: polling refresh погасит атаку на этом шаге
                if !item.role.is_authority() && item.action.is(LocomotionActionKind::PrimaryAction) {
                    item.action.0 = None;
                }
            }
            ReplicationFact::CombatPropertyChanged { actor, previous, current } => {
                let Ok((role, mut state)) = properties.get_mut(*actor) else {
                    continue;
                };
                if role.is_authority() {
                    continue;
                }
                state.set(*current);
                state.combat_stance.take_dirty();
                state.weapon_ready_position.take_dirty();
                state.defensive_mode.take_dirty();
                changed.write(CombatPropertyChanged {
                    actor: *actor,
                    previous: *previous,
                    current: *current,
                });
            }
        }
    }
}
