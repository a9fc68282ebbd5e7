//! Закрытые enum'ы вместо string-keyed gameplay tags.
//!
//! Все категории валидируются на этапе загрузки конфигов (serde отвергает
//! неизвестные варианты), в runtime строковых тегов нет.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

/// Категория удара (какая конечность/оружие бьёт)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Reflect, Serialize, Deserialize)]
pub enum AttackType {
    RightFist,
    LeftFist,
    RightKick,
    LeftKick,
    RightElbow,
    LeftElbow,
}

/// Сила удара
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Reflect, Serialize, Deserialize)]
pub enum AttackStrength {
    Light,
    Medium,
    Heavy,
}

/// Стойка атакующего на момент старта атаки
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Reflect, Serialize, Deserialize)]
pub enum AttackStance {
    Standing,
    Crouched,
    InAir,
}

/// Классификация атаки (см. `combat::method::determine_attack_method`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Reflect, Serialize, Deserialize)]
pub enum AttackMethod {
    Regular,
    Riposte,
    Special,
    /// Выходная категория без производящего правила
    TakeDown,
}

impl AttackMethod {
    /// Special/TakeDown играются парными (synced) монтажами
    pub fn is_synced(&self) -> bool {
        matches!(self, AttackMethod::Special | AttackMethod::TakeDown)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Reflect, Serialize, Deserialize)]
pub enum ImpactSide {
    #[default]
    Front,
    Back,
    Left,
    Right,
}

/// Форма импакта, выводится из энергии удара
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Reflect, Serialize, Deserialize)]
pub enum ImpactForm {
    #[default]
    Tap,
    Push,
    Blow,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Reflect, Serialize, Deserialize)]
pub enum ImpactLocation {
    Head,
    Torso,
    LeftArm,
    RightArm,
    LeftLeg,
    RightLeg,
    #[default]
    Unspecified,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Reflect, Serialize, Deserialize)]
pub enum DamageType {
    #[default]
    Blunt,
    Sharp,
    Pierce,
}

/// Грубая оценка здоровья для выбора reaction анимации
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Reflect, Serialize, Deserialize)]
#[reflect(Component)]
pub enum HealthBand {
    #[default]
    Healthy,
    Injured,
    Critical,
}

/// Overlay (loadout/posture контекст персонажа)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Reflect, Serialize, Deserialize)]
pub enum OverlayMode {
    /// Без оружия
    #[default]
    Default,
    Rifle,
    PistolOneHanded,
    PistolTwoHanded,
    Bow,
    Torch,
    Binoculars,
    Box,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Reflect, Serialize, Deserialize)]
pub enum CombatStance {
    #[default]
    Neutral,
    Ready,
    Aiming,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Reflect, Serialize, Deserialize)]
pub enum WeaponReadyPosition {
    LowReady,
    Ready,
    Aiming,
    #[default]
    PatrolReady,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Reflect, Serialize, Deserialize)]
pub enum DefensiveMode {
    #[default]
    None,
    Blocking,
    Avoiding,
}

/// Эксклюзивное non-interruptible действие персонажа
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Reflect, Serialize, Deserialize)]
pub enum LocomotionActionKind {
    /// Атака (единственное действие, которым владеет combat)
    PrimaryAction,
    Rolling,
    Mantling,
    GettingUp,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Reflect, Serialize, Deserialize)]
pub enum LocomotionMode {
    #[default]
    Grounded,
    InAir,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Reflect, Serialize, Deserialize)]
pub enum Stance {
    #[default]
    Standing,
    Crouching,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Reflect, Serialize, Deserialize)]
pub enum MovementMode {
    #[default]
    Walking,
    Falling,
    /// Атака держит movement в custom режиме
    Custom,
}
