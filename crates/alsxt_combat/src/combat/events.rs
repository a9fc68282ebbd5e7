//! Combat events (hooks для host'а + внутренний pipeline).

use bevy::prelude::*;

use super::hit::AttackDoubleHitResult;
use super::montage::MontageId;
use crate::components::{AttackMethod, AttackStrength, AttackType};

/// Intent: атаковать (от AI, input или host'а)
#[derive(Event, Debug, Clone, Copy)]
pub struct AttackIntent {
    pub attacker: Entity,
    pub attack_type: AttackType,
    pub strength: AttackStrength,
    pub base_damage: f32,
    pub play_rate: f32,
}

/// Primary action input (атака с дефолтами из settings)
#[derive(Event, Debug, Clone, Copy)]
pub struct PrimaryActionInput {
    pub actor: Entity,
}

/// Атака принята и монтаж запущен на инициаторе
#[derive(Event, Debug, Clone)]
pub struct AttackStarted {
    pub attacker: Entity,
    pub montage: MontageId,
    pub method: AttackMethod,
    pub target: Option<Entity>,
}

/// Stop hook: атака погашена (movement был в custom режиме)
#[derive(Event, Debug, Clone, Copy)]
pub struct AttackEnded {
    pub attacker: Entity,
}

/// Synced атака: host проигрывает парный монтаж на жертве
#[derive(Event, Debug, Clone)]
pub struct SyncedAttackStarted {
    pub attacker: Entity,
    pub target: Entity,
    pub method: AttackMethod,
    pub attacker_montage: MontageId,
    pub target_montage: MontageId,
}

/// Animation notify: окно удара открылось
#[derive(Event, Debug, Clone, Copy)]
pub struct BeginAttackCollisionTrace {
    pub attacker: Entity,
}

/// Animation notify: окно удара закрылось (или монтаж прерван)
#[derive(Event, Debug, Clone, Copy)]
pub struct EndAttackCollisionTrace {
    pub attacker: Entity,
}

/// Dispatch задетому актору (только с CollisionReactor)
#[derive(Event, Debug, Clone)]
pub struct AttackCollision {
    pub attacker: Entity,
    pub target: Entity,
    pub result: AttackDoubleHitResult,
}

/// Hook атакующего: удар попал (camera shake и прочий feedback)
#[derive(Event, Debug, Clone)]
pub struct AttackHit {
    pub attacker: Entity,
    pub result: AttackDoubleHitResult,
}

#[derive(Event, Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttackBlocked {
    pub attacker: Entity,
    pub defender: Entity,
}

#[derive(Event, Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttackLanded {
    pub attacker: Entity,
    pub defender: Entity,
}

/// Reaction защищающегося: response монтаж и/или fallen pose
#[derive(Event, Debug, Clone)]
pub struct AttackReaction {
    pub defender: Entity,
    pub attacker: Entity,
    pub blocked: bool,
    pub response: Option<MontageId>,
    pub fallen: Option<MontageId>,
}
