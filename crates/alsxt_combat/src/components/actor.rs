//! Базовые компоненты персонажа: Character, ControlRotation, NetRole, LocomotionAction, MovementLock

use bevy::prelude::*;

use super::tags::{LocomotionActionKind, LocomotionMode, MovementMode, OverlayMode, Stance};
use crate::targeting::TargetLock;

/// Персонаж, участвующий в бою (игрок или AI).
///
/// Автоматически добавляет ControlRotation, NetRole, LocomotionAction, MovementLock, TargetLock через Required Components.
#[derive(Component, Debug, Clone, Reflect)]
#[reflect(Component)]
#[require(Transform, ControlRotation, NetRole, LocomotionAction, MovementLock, TargetLock)]
pub struct Character {
    pub overlay_mode: OverlayMode,
    pub locomotion_mode: LocomotionMode,
    pub desired_stance: Stance,
    /// Желаемый aiming (rotation mode): гейт для target lock
    pub desired_aiming: bool,
    /// Высота для MontageInfo mapping (start time / play rate)
    pub reference_height: f32,
    /// Yaw направления ввода (градусы), None = нет ввода
    pub input_yaw: Option<f32>,
}

impl Default for Character {
    fn default() -> Self {
        Self {
            overlay_mode: OverlayMode::Default,
            locomotion_mode: LocomotionMode::Grounded,
            desired_stance: Stance::Standing,
            desired_aiming: false,
            reference_height: 100.0,
            input_yaw: None,
        }
    }
}

/// Control rotation (камера/контроллер), градусы
///
/// Yaw вращает вокруг +Y, yaw = 0 смотрит в -Z (Bevy forward).
#[derive(Component, Debug, Clone, Copy, Default, PartialEq, Reflect)]
#[reflect(Component)]
pub struct ControlRotation {
    pub yaw: f32,
    pub pitch: f32,
    pub roll: f32,
}

impl ControlRotation {
    pub fn new(yaw: f32, pitch: f32, roll: f32) -> Self {
        Self { yaw, pitch, roll }
    }

    pub fn quat(&self) -> Quat {
        Quat::from_euler(
            EulerRot::YXZ,
            self.yaw.to_radians(),
            self.pitch.to_radians(),
            self.roll.to_radians(),
        )
    }

    pub fn forward(&self) -> Vec3 {
        self.quat() * Vec3::NEG_Z
    }
}

/// Локальная роль реплики этого актора
#[derive(Component, Debug, Clone, Copy, Default, PartialEq, Eq, Reflect)]
#[reflect(Component)]
pub enum NetRole {
    /// Сервер / offline: канонический state
    #[default]
    Authority,
    /// Локально управляемая копия на клиенте
    AutonomousProxy,
    /// Чужая копия на клиенте (только зеркалит)
    SimulatedProxy,
}

impl NetRole {
    pub fn is_authority(&self) -> bool {
        matches!(self, NetRole::Authority)
    }

    /// Может инициировать атаку (authority или autonomous proxy)
    pub fn can_initiate(&self) -> bool {
        !matches!(self, NetRole::SimulatedProxy)
    }
}

/// Текущее locomotion действие (None = свободен)
#[derive(Component, Debug, Clone, Copy, Default, PartialEq, Eq, Reflect)]
#[reflect(Component)]
pub struct LocomotionAction(pub Option<LocomotionActionKind>);

impl LocomotionAction {
    pub fn is(&self, kind: LocomotionActionKind) -> bool {
        self.0 == Some(kind)
    }

    pub fn is_free(&self) -> bool {
        self.0.is_none()
    }
}

/// Lock movement mode на время атаки
#[derive(Component, Debug, Clone, Copy, Default, PartialEq, Eq, Reflect)]
#[reflect(Component)]
pub struct MovementLock {
    pub locked: bool,
    pub mode: MovementMode,
}

impl MovementLock {
    pub fn lock(&mut self) {
        self.locked = true;
        self.mode = MovementMode::Custom;
    }

    /// Снимает lock, возвращает режим, который был до этого
    pub fn unlock(&mut self) -> MovementMode {
        let previous = self.mode;
        self.locked = false;
        if previous == MovementMode::Custom {
            self.mode = MovementMode::Walking;
        }
        previous
    }
}

/// Нормализует угол в (−180, 180]
pub fn normalize_axis(angle: f32) -> f32 {
    let mut wrapped = angle.rem_euclid(360.0);
    if wrapped > 180.0 {
        wrapped -= 360.0;
    }
    wrapped
}

/// Кратчайшая разница углов `to - from` в (−180, 180]
pub fn delta_angle(from: f32, to: f32) -> f32 {
    normalize_axis(to - from)
}

/// Yaw актора (градусы) из rotation
pub fn yaw_of(rotation: Quat) -> f32 {
    let (yaw, _, _) = rotation.to_euler(EulerRot::YXZ);
    normalize_axis(yaw.to_degrees())
}

pub fn rotation_from_yaw(yaw: f32) -> Quat {
    Quat::from_rotation_y(yaw.to_radians())
}

/// Look-at yaw для направления (в горизонтальной плоскости)
pub fn yaw_towards(direction: Vec3) -> f32 {
    normalize_axis((-direction.x).atan2(-direction.z).to_degrees())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_axis_range() {
        assert_eq!(normalize_axis(0.0), 0.0);
        assert_eq!(normalize_axis(180.0), 180.0);
        assert_eq!(normalize_axis(-180.0), 180.0);
        assert_eq!(normalize_axis(270.0), -90.0);
        assert_eq!(normalize_axis(-270.0), 90.0);
    }

    #[test]
    fn test_delta_angle_takes_short_way() {
        assert_eq!(delta_angle(170.0, -170.0), 20.0);
        assert_eq!(delta_angle(-170.0, 170.0), -20.0);
    }

    #[test]
    fn test_yaw_towards_matches_control_forward() {
        for yaw in [0.0_f32, 45.0, 90.0, -135.0] {
            let forward = ControlRotation::new(yaw, 0.0, 0.0).forward();
            assert!((delta_angle(yaw, yaw_towards(forward))).abs() < 1e-3, "yaw = {}", yaw);
        }
    }

    #[test]
    fn test_yaw_roundtrip_through_quat() {
        let rotation = rotation_from_yaw(30.0);
        assert!((yaw_of(rotation) - 30.0).abs() < 1e-3);
    }

    #[test]
    fn test_movement_unlock_reports_custom_mode() {
        let mut lock = MovementLock::default();
        lock.lock();
        assert_eq!(lock.unlock(), MovementMode::Custom);
        assert_eq!(lock.unlock(), MovementMode::Walking);
        assert!(!lock.locked);
    }
}
