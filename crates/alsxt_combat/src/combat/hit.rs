//! Hit records и расчёт физики импакта (energy, side, form).

use bevy::prelude::*;
use std::f32::consts::FRAC_1_SQRT_2;

use crate::components::{
    AttackPhysics, AttackStrength, AttackType, CollisionReactor, DamageType, ImpactForm, ImpactLocation,
    ImpactSide, OverlayMode,
};
use crate::config::ImpactFormThresholds;

/// Один hit record: точка удара либо traced-back origin
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExtendedHitResult {
    pub actor: Option<Entity>,
    /// Центр sweep формы в момент контакта
    pub location: Vec3,
    pub impact_point: Vec3,
    pub normal: Vec3,
    pub bone: Option<String>,
    pub mass: f32,
    pub velocity: f32,
    pub direction: Vec3,
    pub impulse: Vec3,
    pub damage_type: Option<DamageType>,
}

impl ExtendedHitResult {
    pub fn momentum(&self) -> f32 {
        self.mass * self.velocity
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DoubleHitResult {
    pub impact_location: ImpactLocation,
    pub impact_side: ImpactSide,
    pub impact_form: ImpactForm,
    pub energy: f32,
    pub hit: ExtendedHitResult,
    pub origin_hit: ExtendedHitResult,
}

/// Полностью разрешённое описание одного столкновения
#[derive(Debug, Clone, PartialEq)]
pub struct AttackDoubleHitResult {
    pub overlay: OverlayMode,
    pub attack_type: AttackType,
    pub strength: AttackStrength,
    pub base_damage: f32,
    pub double_hit: DoubleHitResult,
}

impl AttackDoubleHitResult {
    pub fn target(&self) -> Option<Entity> {
        self.double_hit.hit.actor
    }
}

/// Энергия удара: base + v*m цели + v*m её собственной атаки
///
/// Отсутствующие capabilities дают нули.
pub fn impact_energy(base: f32, reactor: Option<&CollisionReactor>, attack: Option<&AttackPhysics>) -> f32 {
    let body = reactor.map(|reactor| reactor.velocity * reactor.mass).unwrap_or(0.0);
    let counter = attack.map(AttackPhysics::momentum).unwrap_or(0.0);
    base + body + counter
}

/// С какой стороны цели пришёл удар.
///
/// Сравниваем forward цели с направлением на атакующего (горизонтальная плоскость):
/// dot ≈ 1 → Front, ≈ -1 → Back, иначе сторона по знаку cross.y.
pub fn impact_side(target_forward: Vec3, target_location: Vec3, attacker_location: Vec3) -> ImpactSide {
    let forward = Vec3::new(target_forward.x, 0.0, target_forward.z).normalize_or_zero();
    let to_attacker = attacker_location - target_location;
    let to_attacker = Vec3::new(to_attacker.x, 0.0, to_attacker.z).normalize_or_zero();

    if forward == Vec3::ZERO || to_attacker == Vec3::ZERO {
        return ImpactSide::Front;
    }

    let dot = forward.dot(to_attacker);
    if dot >= FRAC_1_SQRT_2 {
        ImpactSide::Front
    } else if dot <= -FRAC_1_SQRT_2 {
        ImpactSide::Back
    } else if forward.cross(to_attacker).y < 0.0 {
        ImpactSide::Right
    } else {
        ImpactSide::Left
    }
}

pub fn impact_form(energy: f32, thresholds: &ImpactFormThresholds) -> ImpactForm {
    if energy >= thresholds.blow {
        ImpactForm::Blow
    } else if energy >= thresholds.push {
        ImpactForm::Push
    } else {
        ImpactForm::Tap
    }
}

/// Сила для cosmetic feedback (camera shake): сумма momentum обоих records
pub fn strength_from_hit(result: &DoubleHitResult) -> f32 {
    result.hit.momentum() + result.origin_hit.momentum()
}
