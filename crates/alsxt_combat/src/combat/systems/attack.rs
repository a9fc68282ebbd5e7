//! Attack lifecycle systems: input → intent → start → montage → refresh/stop.

use bevy::prelude::*;

use crate::combat::attack_data::AttackDataIndex;
use crate::combat::events::{
    AttackEnded, AttackIntent, AttackStarted, BeginAttackCollisionTrace, EndAttackCollisionTrace,
    PrimaryActionInput, SyncedAttackStarted,
};
use crate::combat::method::{determine_attack_method, CombatHistory};
use crate::combat::montage::{MontageEvent, MontageId, MontagePlayer};
use crate::combat::state::{refresh_attack, start_attack, AttackStartParams, AttackerQuery, RefreshOutcome};
use crate::components::{
    yaw_of, AttackMethod, AttackStance, Character, CollisionReactor, CombatStance, LocomotionAction,
    LocomotionActionKind, LocomotionMode, OverlayMode, Stance,
};
use crate::config::{AttackSettings, CombatSettings};
use crate::net::{CombatProperties, Replication};
use crate::physics::{QueryFilter, SpatialQuery, TraceBody, TraceWorld};
use crate::DeterministicRng;

/// System: Primary action input → AttackIntent с дефолтами из settings.
///
/// Только Default overlay, combat stance Ready/Aiming и без чужого locomotion action.
pub fn handle_primary_action_input(
    mut inputs: EventReader<PrimaryActionInput>,
    actors: Query<(&Character, &LocomotionAction, Option<&CombatProperties>)>,
    settings: Res<CombatSettings>,
    mut intents: EventWriter<AttackIntent>,
) {
    for input in inputs.read() {
        let Ok((character, action, properties)) = actors.get(input.actor) else {
            continue;
        };

        let stance = properties.map(CombatProperties::combat_stance).unwrap_or_default();
        let in_combat_stance = matches!(stance, CombatStance::Ready | CombatStance::Aiming);
        let action_free = action.is_free() || action.is(LocomotionActionKind::PrimaryAction);

        if character.overlay_mode != OverlayMode::Default || !in_combat_stance || !action_free {
            crate::logger::log(&format!(
                "🚫 ECS: Primary action ignored (actor: {:?}, overlay: {:?}, stance: {:?})",
                input.actor, character.overlay_mode, stance
            ));
            continue;
        }

        let defaults = &settings.attack.primary_action;
        intents.write(AttackIntent {
            attacker: input.actor,
            attack_type: defaults.attack_type,
            strength: defaults.strength,
            base_damage: defaults.base_damage,
            play_rate: defaults.play_rate,
        });
    }
}

/// Стойка атакующего на момент старта
pub fn attack_stance(character: &Character) -> AttackStance {
    match (character.locomotion_mode, character.desired_stance) {
        (LocomotionMode::InAir, _) => AttackStance::InAir,
        (LocomotionMode::Grounded, Stance::Crouching) => AttackStance::Crouched,
        (LocomotionMode::Grounded, Stance::Standing) => AttackStance::Standing,
    }
}

/// Yaw к которому доворачиваемся: input (если разрешено и есть), иначе текущий
pub fn resolve_target_yaw(character: &Character, current_yaw: f32, attack: &AttackSettings) -> f32 {
    match character.input_yaw {
        Some(input_yaw) if attack.rotate_to_input_on_start => input_yaw,
        _ => current_yaw,
    }
}

/// Короткий sphere sweep перед атакующим: первый не-self актор с CollisionReactor
pub fn find_potential_target(
    attacker: Entity,
    transform: &Transform,
    world: &impl SpatialQuery,
    reactors: &Query<(), With<CollisionReactor>>,
    attack: &AttackSettings,
) -> Option<Entity> {
    let origin = transform.translation + Vec3::Y * attack.unarmed_trace_height;
    let end = origin + *transform.forward() * attack.potential_target_distance;
    let ignore = [attacker];

    world
        .sphere_sweep(
            origin,
            end,
            attack.potential_target_radius,
            QueryFilter::new(&attack.attack_trace_channels, &ignore),
        )
        .into_iter()
        .map(|hit| hit.entity)
        .find(|entity| reactors.contains(*entity))
}

/// System: AttackIntent → method → montage → StartAttack.
///
/// Special/TakeDown берут synced монтаж (если есть в index), иначе regular атака.
#[allow(clippy::too_many_arguments)]
pub fn process_attack_intents(
    mut intents: EventReader<AttackIntent>,
    mut actors: ParamSet<(
        Query<(Entity, &Transform, &TraceBody)>,
        Query<(AttackerQuery, &Character, &CombatHistory)>,
    )>,
    reactors: Query<(), With<CollisionReactor>>,
    index: Res<AttackDataIndex>,
    settings: Res<CombatSettings>,
    mut rng: ResMut<DeterministicRng>,
    mut replication: ResMut<Replication>,
    mut started: EventWriter<AttackStarted>,
    mut synced_started: EventWriter<SyncedAttackStarted>,
) {
    if intents.is_empty() {
        return;
    }

    let world = TraceWorld::collect(actors.p0().iter());
    let attack = &settings.attack;

    for intent in intents.read() {
        let mut attackers = actors.p1();
        let Ok((mut item, character, history)) = attackers.get_mut(intent.attacker) else {
            continue;
        };

        let stance = attack_stance(character);
        let target = find_potential_target(intent.attacker, &item.transform, &world, &reactors, attack);
        let method = determine_attack_method(target.and_then(|target| history.get(target)), attack);

        let mut synced_pair: Option<(Entity, MontageId)> = None;
        let montage = match (method, target) {
            (AttackMethod::Special | AttackMethod::TakeDown, Some(target)) => {
                match index.select_synced(intent.attack_type, intent.strength, stance, &mut rng.rng) {
                    Some(synced) => {
                        synced_pair = Some((target, synced.target.clone()));
                        index.montage(&synced.attacker)
                    }
                    None => None,
                }
            }
            _ => None,
        };
        let montage = montage.or_else(|| {
            index.select_montage(
                intent.attack_type,
                intent.strength,
                stance,
                item.state.last_montage.as_ref(),
                &mut rng.rng,
            )
        });

        let current_yaw = yaw_of(item.transform.rotation);
        let params = montage.map(|info| AttackStartParams {
            montage: info.id.clone(),
            play_rate: intent.play_rate * info.play_rate_for_height(character.reference_height),
            start_position: info.start_time_for_height(character.reference_height),
            start_yaw: current_yaw,
            target_yaw: resolve_target_yaw(character, current_yaw, attack),
            attack_type: intent.attack_type,
            strength: intent.strength,
            base_damage: intent.base_damage,
            method,
            target,
        });

        match start_attack(&mut item.attacker(), params, &index, &mut *replication) {
            Ok(params) => {
                crate::logger::log_info(&format!(
                    "⚔️ ECS: Attack started (attacker: {:?}, montage: {}, method: {:?}, target: {:?})",
                    intent.attacker, params.montage, method, target
                ));

                if let Some((victim, target_montage)) = synced_pair {
                    synced_started.write(SyncedAttackStarted {
                        attacker: intent.attacker,
                        target: victim,
                        method,
                        attacker_montage: params.montage.clone(),
                        target_montage,
                    });
                }
                started.write(AttackStarted {
                    attacker: intent.attacker,
                    montage: params.montage,
                    method,
                    target,
                });
            }
            Err(rejection) => {
                crate::logger::log(&format!(
                    "🚫 ECS: Attack rejected (attacker: {:?}, {:?} {:?} {:?}): {}",
                    intent.attacker, intent.attack_type, intent.strength, stance, rejection
                ));
            }
        }
    }
}

/// System: Advance attack montages.
///
/// Trace окно → Begin/EndAttackCollisionTrace; конец монтажа снимает PrimaryAction
/// (refresh на следующем шаге гасит атаку).
pub fn advance_montages(
    mut players: Query<(Entity, &mut MontagePlayer, &mut LocomotionAction)>,
    time: Res<Time<Fixed>>,
    mut begin_trace: EventWriter<BeginAttackCollisionTrace>,
    mut end_trace: EventWriter<EndAttackCollisionTrace>,
) {
    let delta = time.delta_secs();

    for (entity, mut player, mut action) in players.iter_mut() {
        if !player.is_playing_any() {
            continue;
        }

        for event in player.advance(delta) {
            match event {
                MontageEvent::TraceWindowOpened => {
                    begin_trace.write(BeginAttackCollisionTrace { attacker: entity });
                }
                MontageEvent::TraceWindowClosed => {
                    end_trace.write(EndAttackCollisionTrace { attacker: entity });
                }
                MontageEvent::Finished => {
                    if action.is(LocomotionActionKind::PrimaryAction) {
                        action.0 = None;
                    }
                    crate::logger::log(&format!("✅ ECS: Attack montage finished (entity: {:?})", entity));
                }
            }
        }
    }
}

/// System: Refresh attacks (polling stop + доворот yaw к target yaw).
pub fn refresh_attacks(
    mut attackers: Query<AttackerQuery>,
    time: Res<Time<Fixed>>,
    settings: Res<CombatSettings>,
    mut replication: ResMut<Replication>,
    mut ended: EventWriter<AttackEnded>,
    mut end_trace: EventWriter<EndAttackCollisionTrace>,
) {
    let delta = time.delta_secs();
    let speed = settings.attack.rotation_interpolation_speed;

    for mut item in attackers.iter_mut() {
        let entity = item.entity;
        let outcome = refresh_attack(&mut item.attacker(), delta, speed, &mut *replication);

        let RefreshOutcome::Stopped(stop) = outcome else {
            continue;
        };

        if stop.trace_was_open {
            end_trace.write(EndAttackCollisionTrace { attacker: entity });
        }
        if stop.hook_fired {
            ended.write(AttackEnded { attacker: entity });
        }
        crate::logger::log(&format!(
            "🛑 ECS: Attack stopped (entity: {:?}, interrupted trace: {})",
            entity, stop.trace_was_open
        ));
    }
}
