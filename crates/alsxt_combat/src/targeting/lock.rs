//! Target lock state machine: Idle → Scanning → Locked → Idle.
//!
//! Одна текущая цель на компонент; подсветка принадлежит только ему.

use bevy::prelude::*;
use std::time::Duration;

use super::entry::TargetHitResultEntry;
use crate::components::{delta_angle, yaw_towards, ControlRotation};
use crate::config::TargetingSettings;
use crate::physics::{QueryFilter, SpatialQuery};
use crate::schedule::RepeatingSchedule;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Reflect)]
pub enum TargetLockState {
    /// Нет цели, нет периодического trace
    #[default]
    Idle,
    /// Периодический trace без lock'а
    Scanning,
    /// Rotation assist к текущей цели
    Locked,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleDirection {
    Left,
    Right,
}

/// Collaborator: подсветка материалов цели
pub trait TargetHighlighter {
    /// parameter = 1.0 на всех материалах (идемпотентно)
    fn highlight(&mut self, target: Entity, parameter: &str);
    /// parameter = 0.0 + открепить dynamic инстансы
    fn clear(&mut self, target: Entity);
}

/// Вход для MaintainLock
#[derive(Debug, Clone, Copy)]
pub struct MaintainContext {
    pub attacker: Entity,
    pub location: Vec3,
    /// Текущая позиция цели (None если цель пропала из мира)
    pub target_location: Option<Vec3>,
    /// Targetable overlay + desired aiming
    pub targetable: bool,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MaintainOutcome {
    /// Нет цели или loadout не targetable
    Inactive,
    /// Цель ушла дальше MaxInitialLockDistance (или пропала)
    Disengaged(Entity),
    /// Line of sight перекрыт → unlock
    Obstructed(Entity),
    Rotated(f32),
    /// Heading уже совпадает с control rotation
    Unchanged,
}

/// Target lock (Component)
#[derive(Component, Debug, Clone, Default)]
pub struct TargetLock {
    state: TargetLockState,
    current: TargetHitResultEntry,
    timer: RepeatingSchedule,
}

impl TargetLock {
    pub fn state(&self) -> TargetLockState {
        self.state
    }

    pub fn current(&self) -> &TargetHitResultEntry {
        &self.current
    }

    pub fn current_target(&self) -> Option<Entity> {
        if self.current.valid {
            self.current.actor
        } else {
            None
        }
    }

    pub fn is_scheduled(&self) -> bool {
        self.timer.is_scheduled()
    }

    /// Idle → Scanning, (пере)запуск периодического trace
    pub fn engage(&mut self, interval: Duration) {
        if self.state == TargetLockState::Idle {
            self.state = TargetLockState::Scanning;
        }
        self.timer.start(interval);
    }

    /// true если периодический trace сработал в этом тике
    pub fn tick(&mut self, delta: Duration) -> bool {
        self.timer.tick(delta) > 0
    }

    /// AcquireClosest: ближайший кандидат ближе текущей цели (не она сама),
    /// при равной дистанции меньший |angle|.
    pub fn acquire_closest(
        &mut self,
        candidates: &[TargetHitResultEntry],
        highlighter: &mut impl TargetHighlighter,
        parameter: &str,
        interval: Duration,
    ) -> Option<Entity> {
        let current_actor = self.current_target();
        let current_distance = self.current.distance_from_player;

        let found = candidates
            .iter()
            .filter(|entry| entry.is_candidate())
            .filter(|entry| !entry.is_actor(current_actor))
            .filter(|entry| entry.distance_from_player < current_distance)
            .min_by(|a, b| {
                a.distance_from_player
                    .total_cmp(&b.distance_from_player)
                    .then(a.angle_from_center.abs().total_cmp(&b.angle_from_center.abs()))
            })
            .copied()?;

        self.set_current(found, highlighter, parameter);
        self.timer.start(interval);
        found.actor
    }

    /// CycleLeft / CycleRight: ближайший по углу кандидат строго слева/справа
    /// от текущей цели. Нет такого → no-op.
    pub fn cycle(
        &mut self,
        direction: CycleDirection,
        candidates: &[TargetHitResultEntry],
        highlighter: &mut impl TargetHighlighter,
        parameter: &str,
        interval: Duration,
    ) -> Option<Entity> {
        let current_actor = self.current_target();
        // Свежий угол текущей цели, если она ещё в выборке
        let current_angle = candidates
            .iter()
            .find(|entry| entry.is_actor(current_actor))
            .map(|entry| entry.angle_from_center)
            .unwrap_or(self.current.angle_from_center);

        let others = candidates
            .iter()
            .filter(|entry| entry.is_candidate())
            .filter(|entry| !entry.is_actor(current_actor));

        let found = match direction {
            CycleDirection::Left => others
                .filter(|entry| entry.angle_from_center < current_angle)
                .max_by(|a, b| a.angle_from_center.total_cmp(&b.angle_from_center)),
            CycleDirection::Right => others
                .filter(|entry| entry.angle_from_center > current_angle)
                .min_by(|a, b| a.angle_from_center.total_cmp(&b.angle_from_center)),
        }
        .copied()?;

        self.set_current(found, highlighter, parameter);
        self.timer.start(interval);
        found.actor
    }

    /// Disengage: сброс цели (sentinels, подсветка) + отмена таймера
    pub fn disengage(&mut self, highlighter: &mut impl TargetHighlighter) -> Option<Entity> {
        let previous = self.clear_current(highlighter);
        self.timer.cancel();
        self.state = TargetLockState::Idle;
        previous
    }

    /// MaintainLock: дистанция → obstruction → доворот control yaw
    pub fn maintain(
        &mut self,
        context: &MaintainContext,
        control: &mut ControlRotation,
        world: &impl SpatialQuery,
        highlighter: &mut impl TargetHighlighter,
        settings: &TargetingSettings,
    ) -> MaintainOutcome {
        let Some(target) = self.current_target() else {
            return MaintainOutcome::Inactive;
        };
        if !context.targetable {
            return MaintainOutcome::Inactive;
        }
        let Some(target_location) = context.target_location else {
            self.disengage(highlighter);
            return MaintainOutcome::Disengaged(target);
        };

        let distance = context.location.distance(target_location);
        if distance >= settings.max_initial_lock_distance {
            self.disengage(highlighter);
            return MaintainOutcome::Disengaged(target);
        }

        if settings.unlock_when_target_is_obstructed {
            let eye = Vec3::Y * settings.view_height;
            let ignore = [context.attacker, target];
            let blocked = world.line_trace(
                context.location + eye,
                target_location + eye,
                QueryFilter::new(&settings.obstruction_channels, &ignore),
            );
            if blocked.is_some() {
                self.disengage(highlighter);
                return MaintainOutcome::Obstructed(target);
            }
        }

        self.current.distance_from_player = distance;
        self.current.location = target_location;

        let yaw = yaw_towards(target_location - context.location);
        if delta_angle(control.yaw, yaw).abs() <= f32::EPSILON {
            return MaintainOutcome::Unchanged;
        }
        control.yaw = yaw;
        MaintainOutcome::Rotated(yaw)
    }

    fn set_current(
        &mut self,
        entry: TargetHitResultEntry,
        highlighter: &mut impl TargetHighlighter,
        parameter: &str,
    ) {
        self.clear_current(highlighter);
        self.current = entry;
        self.state = TargetLockState::Locked;
        if let Some(actor) = entry.actor {
            highlighter.highlight(actor, parameter);
        }
    }

    fn clear_current(&mut self, highlighter: &mut impl TargetHighlighter) -> Option<Entity> {
        let previous = self.current_target();
        if let Some(actor) = previous {
            highlighter.clear(actor);
        }
        self.current = TargetHitResultEntry::default();
        if self.state == TargetLockState::Locked {
            self.state = TargetLockState::Scanning;
        }
        previous
    }
}
