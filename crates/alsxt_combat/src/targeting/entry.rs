//! TargetHitResultEntry + target trace (box sweep перед view origin).

use bevy::prelude::*;

use crate::components::ControlRotation;
use crate::config::TargetingSettings;
use crate::physics::{QueryFilter, SpatialQuery};

/// Sentinel угла: "кандидат ещё не найден"
pub const ANGLE_SENTINEL: f32 = 361.0;

/// Кандидат или текущая цель lock'а.
///
/// Невалидная запись всегда несёт sentinels (f32::MAX, 361°).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TargetHitResultEntry {
    pub valid: bool,
    pub distance_from_player: f32,
    /// Signed угол от центра взгляда, (−180, 180], плюс = справа
    pub angle_from_center: f32,
    pub actor: Option<Entity>,
    pub location: Vec3,
}

impl Default for TargetHitResultEntry {
    fn default() -> Self {
        Self {
            valid: false,
            distance_from_player: f32::MAX,
            angle_from_center: ANGLE_SENTINEL,
            actor: None,
            location: Vec3::ZERO,
        }
    }
}

impl TargetHitResultEntry {
    pub fn new(actor: Entity, location: Vec3, distance: f32, angle: f32) -> Self {
        Self {
            valid: true,
            distance_from_player: distance,
            angle_from_center: angle,
            actor: Some(actor),
            location,
        }
    }

    /// Валидная запись с реальным актором (sentinel никогда не "найден")
    pub fn is_candidate(&self) -> bool {
        self.valid && self.actor.is_some() && self.angle_from_center <= 180.0 && self.distance_from_player < f32::MAX
    }

    pub fn is_actor(&self, actor: Option<Entity>) -> bool {
        self.actor.is_some() && self.actor == actor
    }
}

/// Signed угол между forward и направлением на цель в горизонтальной плоскости.
///
/// Знак по вертикальной компоненте cross: цель слева → минус.
pub fn signed_angle(forward: Vec3, to_target: Vec3) -> f32 {
    let forward = Vec3::new(forward.x, 0.0, forward.z).normalize_or_zero();
    let to_target = Vec3::new(to_target.x, 0.0, to_target.z).normalize_or_zero();
    if forward == Vec3::ZERO || to_target == Vec3::ZERO {
        return 0.0;
    }

    let angle = forward.dot(to_target).clamp(-1.0, 1.0).acos().to_degrees();
    if forward.cross(to_target).y > 0.0 {
        -angle
    } else {
        angle
    }
}

/// Кто смотрит: позиция актора + control rotation
#[derive(Debug, Clone, Copy)]
pub struct TargetingView {
    pub entity: Entity,
    pub location: Vec3,
    pub rotation: ControlRotation,
}

impl TargetingView {
    pub fn origin(&self, settings: &TargetingSettings) -> Vec3 {
        self.location + Vec3::Y * settings.view_height
    }
}

/// TraceForTargets: box sweep вперёд от view origin.
///
/// `locate` отдаёт позицию актора только для lockable целей.
pub fn trace_for_targets(
    view: &TargetingView,
    settings: &TargetingSettings,
    world: &impl SpatialQuery,
    locate: impl Fn(Entity) -> Option<Vec3>,
) -> Vec<TargetHitResultEntry> {
    let forward = view.rotation.forward();
    let start = view.origin(settings) + forward * settings.trace_forward_offset;
    let end = start + forward * settings.trace_length;
    let ignore = [view.entity];

    world
        .box_sweep(
            start,
            end,
            settings.half_extents(),
            view.rotation.quat(),
            QueryFilter::new(&settings.target_channels, &ignore),
        )
        .into_iter()
        .filter(|hit| hit.entity != view.entity)
        .filter_map(|hit| {
            let location = locate(hit.entity)?;
            let distance = view.location.distance(location);
            if distance >= settings.max_lock_distance {
                return None;
            }
            let angle = signed_angle(forward, location - view.location);
            Some(TargetHitResultEntry::new(hit.entity, location, distance, angle))
        })
        .collect()
}
