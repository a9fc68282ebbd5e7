//! Combat State Machine: Idle → Starting → Attacking → Idle.
//!
//! Authority (или autonomous proxy) инициирует атаку, реплики зеркалят
//! через intent/fact сообщения. Остановка через polling: если locomotion action
//! больше не PrimaryAction, следующий refresh гасит атаку.

use bevy::ecs::query::QueryData;
use bevy::prelude::*;
use thiserror::Error;

use super::attack_data::AttackDataIndex;
use super::method::CombatHistory;
use super::montage::{MontageId, MontagePlayer};
use super::trace::AttackTraceSession;
use crate::components::{
    delta_angle, normalize_axis, rotation_from_yaw, yaw_of, AttackMethod, AttackStrength, AttackType,
    LocomotionAction, LocomotionActionKind, MovementLock, MovementMode, NetRole,
};
use crate::net::{ReplicationFact, ReplicationIntent, ReplicationTransport};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Reflect)]
pub enum CombatPhase {
    #[default]
    Idle,
    /// Movement залочен, монтаж ещё не играет
    Starting,
    /// Монтаж играет, yaw доворачивается к target_yaw
    Attacking,
}

/// Параметры старта, которые реплицируются всем наблюдателям
#[derive(Debug, Clone, PartialEq)]
pub struct AttackStartParams {
    pub montage: MontageId,
    pub play_rate: f32,
    pub start_position: f32,
    pub start_yaw: f32,
    pub target_yaw: f32,
    pub attack_type: AttackType,
    pub strength: AttackStrength,
    pub base_damage: f32,
    pub method: AttackMethod,
    pub target: Option<Entity>,
}

/// Replicated combat state атакующего
///
/// Автоматически добавляет MontagePlayer, AttackTraceSession, CombatHistory.
#[derive(Component, Debug, Clone, Default)]
#[require(MontagePlayer, AttackTraceSession, CombatHistory)]
pub struct CombatState {
    pub phase: CombatPhase,
    /// Yaw (−180..180), к которому доворачивается атакующий
    pub target_yaw: f32,
    pub last_montage: Option<MontageId>,
    pub current_attack: Option<AttackStartParams>,
}

impl CombatState {
    pub fn set_target_yaw(&mut self, yaw: f32) {
        self.target_yaw = normalize_axis(yaw);
    }

    pub fn is_attacking(&self) -> bool {
        self.phase != CombatPhase::Idle
    }
}

/// Причина отказа в старте (только для логов)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum StartRejection {
    #[error("role cannot initiate attacks")]
    NoAuthority,
    #[error("no montage resolved for this attack")]
    NoMontage,
    #[error("attack is not allowed to start")]
    NotAllowed,
    #[error("montage playback failed")]
    PlaybackFailed,
}

/// Mutable view на компоненты атакующего
pub struct AttackerMut<'a> {
    pub entity: Entity,
    pub role: NetRole,
    pub action: &'a mut LocomotionAction,
    pub movement: &'a mut MovementLock,
    pub player: &'a mut MontagePlayer,
    pub state: &'a mut CombatState,
    pub transform: &'a mut Transform,
}

/// ECS query для `AttackerMut`
#[derive(QueryData)]
#[query_data(mutable)]
pub struct AttackerQuery {
    pub entity: Entity,
    pub role: &'static NetRole,
    pub action: &'static mut LocomotionAction,
    pub movement: &'static mut MovementLock,
    pub player: &'static mut MontagePlayer,
    pub state: &'static mut CombatState,
    pub transform: &'static mut Transform,
}

impl AttackerQueryItem<'_> {
    pub fn attacker(&mut self) -> AttackerMut<'_> {
        AttackerMut {
            entity: self.entity,
            role: *self.role,
            action: &mut *self.action,
            movement: &mut *self.movement,
            player: &mut *self.player,
            state: &mut *self.state,
            transform: &mut *self.transform,
        }
    }
}

/// Нет действия, либо это та же атака, но её монтаж уже не играет.
///
/// Дедуплицирует повторные старты и эхо собственного broadcast'а.
pub fn is_attack_allowed_to_start(action: &LocomotionAction, player: &MontagePlayer) -> bool {
    action.is_free() || (action.is(LocomotionActionKind::PrimaryAction) && !player.is_playing_any())
}

/// Монтаж найден и проигрываем с этим play rate
fn check_playable(params: &AttackStartParams, index: &AttackDataIndex) -> Result<(), StartRejection> {
    let Some(montage) = index.montage(&params.montage) else {
        return Err(StartRejection::NoMontage);
    };
    if params.play_rate.is_nan() || params.play_rate <= 0.0 || montage.duration <= 0.0 {
        return Err(StartRejection::PlaybackFailed);
    }
    Ok(())
}

/// StartAttack на инициирующей стороне.
///
/// Authority: локальный старт + broadcast fact. Autonomous proxy: локальный
/// старт (prediction) + intent на authority. Simulated proxy: отказ.
/// Отказ не оставляет следов: ни lock, ни сообщений.
pub fn start_attack(
    attacker: &mut AttackerMut,
    params: Option<AttackStartParams>,
    index: &AttackDataIndex,
    transport: &mut impl ReplicationTransport,
) -> Result<AttackStartParams, StartRejection> {
    if !attacker.role.can_initiate() {
        return Err(StartRejection::NoAuthority);
    }
    let Some(params) = params else {
        return Err(StartRejection::NoMontage);
    };
    if !is_attack_allowed_to_start(attacker.action, attacker.player) {
        return Err(StartRejection::NotAllowed);
    }
    check_playable(&params, index)?;

    let previous_movement = *attacker.movement;
    let previous_phase = attacker.state.phase;
    attacker.movement.lock();
    attacker.state.phase = CombatPhase::Starting;

    if let Err(rejection) = start_attack_implementation(attacker, &params, index) {
        *attacker.movement = previous_movement;
        attacker.state.phase = previous_phase;
        return Err(rejection);
    }

    if attacker.role.is_authority() {
        transport.broadcast(ReplicationFact::AttackStarted {
            actor: attacker.entity,
            params: params.clone(),
        });
    } else {
        transport.send_to_authority(ReplicationIntent::StartAttack {
            actor: attacker.entity,
            params: params.clone(),
        });
    }

    Ok(params)
}

/// Authority принимает intent от autonomous proxy: перепроверка + broadcast
pub fn server_start_attack(
    attacker: &mut AttackerMut,
    params: &AttackStartParams,
    index: &AttackDataIndex,
    transport: &mut impl ReplicationTransport,
) -> Result<(), StartRejection> {
    if !attacker.role.is_authority() {
        return Err(StartRejection::NoAuthority);
    }
    if !is_attack_allowed_to_start(attacker.action, attacker.player) {
        return Err(StartRejection::NotAllowed);
    }
    check_playable(params, index)?;

    start_attack_implementation(attacker, params, index)?;
    transport.broadcast(ReplicationFact::AttackStarted {
        actor: attacker.entity,
        params: params.clone(),
    });
    Ok(())
}

/// Локальный старт на реплике: монтаж, locomotion action, yaw
pub fn start_attack_implementation(
    attacker: &mut AttackerMut,
    params: &AttackStartParams,
    index: &AttackDataIndex,
) -> Result<(), StartRejection> {
    if !is_attack_allowed_to_start(attacker.action, attacker.player) {
        return Err(StartRejection::NotAllowed);
    }
    let Some(montage) = index.montage(&params.montage) else {
        return Err(StartRejection::NoMontage);
    };
    if !attacker.player.play(montage, params.play_rate, params.start_position) {
        return Err(StartRejection::PlaybackFailed);
    }

    attacker.action.0 = Some(LocomotionActionKind::PrimaryAction);
    attacker.transform.rotation = rotation_from_yaw(params.start_yaw);

    let state = &mut *attacker.state;
    state.phase = CombatPhase::Attacking;
    state.set_target_yaw(params.target_yaw);
    state.last_montage = Some(params.montage.clone());
    state.current_attack = Some(params.clone());
    Ok(())
}

/// Что сделал StopAttack
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StopOutcome {
    /// Stop hook (AttackEnded): movement был в custom режиме
    pub hook_fired: bool,
    /// Монтаж прерван с открытым trace окном
    pub trace_was_open: bool,
}

/// StopAttack: unlock movement, прерывание монтажа
pub fn stop_attack(attacker: &mut AttackerMut) -> StopOutcome {
    let previous_mode = attacker.movement.unlock();
    let trace_was_open = attacker.player.stop();

    attacker.state.phase = CombatPhase::Idle;
    attacker.state.current_attack = None;

    StopOutcome {
        hook_fired: previous_mode == MovementMode::Custom,
        trace_was_open,
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RefreshOutcome {
    /// Нечего делать
    Idle,
    /// Action сменился → атака погашена
    Stopped(StopOutcome),
    /// Yaw доворачивается (новый yaw)
    Rotated(f32),
}

/// Per-tick refresh атаки
pub fn refresh_attack(
    attacker: &mut AttackerMut,
    delta: f32,
    interpolation_speed: f32,
    transport: &mut impl ReplicationTransport,
) -> RefreshOutcome {
    if !attacker.action.is(LocomotionActionKind::PrimaryAction) {
        let needs_stop = attacker.state.is_attacking() || attacker.movement.locked || attacker.player.is_playing_any();
        if !needs_stop {
            return RefreshOutcome::Idle;
        }

        let outcome = stop_attack(attacker);
        if attacker.role.is_authority() {
            transport.broadcast(ReplicationFact::StateResync { actor: attacker.entity });
        }
        return RefreshOutcome::Stopped(outcome);
    }

    if attacker.state.phase != CombatPhase::Attacking {
        return RefreshOutcome::Idle;
    }

    let current = yaw_of(attacker.transform.rotation);
    let yaw = interpolate_yaw(current, attacker.state.target_yaw, delta, interpolation_speed);
    attacker.transform.rotation = rotation_from_yaw(yaw);
    RefreshOutcome::Rotated(yaw)
}

/// Exponential-decay интерполяция yaw по кратчайшей дуге; speed ≤ 0 = snap
pub fn interpolate_yaw(current: f32, target: f32, delta: f32, speed: f32) -> f32 {
    if speed <= 0.0 {
        return normalize_axis(target);
    }

    let alpha = 1.0 - (-speed * delta).exp();
    normalize_axis(current + delta_angle(current, target) * alpha)
}
