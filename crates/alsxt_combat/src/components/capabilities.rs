//! Capability компоненты: то, что core спрашивает у произвольных акторов мира.
//!
//! Наличие компонента = актор поддерживает capability. Отсутствие трактуется
//! как нулевые дефолты, не как ошибка.

use bevy::prelude::*;

use super::tags::{AttackStrength, AttackType, ImpactLocation};
use crate::combat::attack_data::DamageInfoEntry;

/// Актор может быть выбран target acquisition
#[derive(Component, Debug, Clone, Copy, Default, Reflect)]
#[reflect(Component)]
pub struct LockableTarget;

/// Collision reactor: скорость/масса для расчёта импакта.
///
/// Только акторы с этим компонентом получают `AttackCollision`.
#[derive(Component, Debug, Clone, Copy, Default, PartialEq, Reflect)]
#[reflect(Component)]
pub struct CollisionReactor {
    pub velocity: f32,
    pub mass: f32,
}

/// Attack physics атакующей сущности (mass, velocity удара)
#[derive(Component, Debug, Clone, Copy, Default, PartialEq, Reflect)]
#[reflect(Component)]
pub struct AttackPhysics {
    pub mass: f32,
    pub velocity: f32,
}

impl AttackPhysics {
    pub fn momentum(&self) -> f32 {
        self.mass * self.velocity
    }
}

/// Dynamic highlight материалы skeletal mesh'а цели.
///
/// `values` = созданные dynamic material instances (по одному на слот).
/// Пустой вектор = динамические инстансы откреплены.
#[derive(Component, Debug, Clone, Default, PartialEq, Reflect)]
#[reflect(Component)]
pub struct MeshHighlight {
    pub material_slots: usize,
    pub parameter: Option<String>,
    pub values: Vec<f32>,
}

impl MeshHighlight {
    pub fn new(material_slots: usize) -> Self {
        Self {
            material_slots,
            parameter: None,
            values: Vec::new(),
        }
    }

    /// Создаёт dynamic инстансы и ставит parameter = 1.0 (идемпотентно)
    pub fn apply(&mut self, parameter: &str) {
        self.parameter = Some(parameter.to_string());
        self.values = vec![1.0; self.material_slots];
    }

    /// Открепляет dynamic инстансы: parameter читается как 0.0
    pub fn clear(&mut self) {
        self.values.clear();
        self.parameter = None;
    }

    pub fn is_highlighted(&self) -> bool {
        !self.values.is_empty() && self.values.iter().all(|value| *value >= 1.0)
    }

    /// Текущее значение параметра (0.0 когда не подсвечен)
    pub fn parameter_value(&self) -> f32 {
        self.values.first().copied().unwrap_or(0.0)
    }
}

#[derive(Debug, Clone, PartialEq, Reflect)]
pub struct BoneLocationEntry {
    pub bone: String,
    pub location: ImpactLocation,
    /// Позиция кости в local space актора
    pub offset: Vec3,
}

/// Bone name → ImpactLocation (resolver для импакта)
#[derive(Component, Debug, Clone, Default, Reflect)]
#[reflect(Component)]
pub struct BoneLocations(pub Vec<BoneLocationEntry>);

impl BoneLocations {
    /// Ближайшая к точке кость (точка в local space)
    pub fn resolve(&self, local_point: Vec3) -> Option<&BoneLocationEntry> {
        self.0.iter().min_by(|a, b| {
            a.offset
                .distance_squared(local_point)
                .total_cmp(&b.offset.distance_squared(local_point))
        })
    }
}

/// Trace сегмент конечности/оружия в local space атакующего
#[derive(Debug, Clone, Copy, PartialEq, Reflect)]
pub struct StrikeSocket {
    pub attack_type: AttackType,
    pub start: Vec3,
    pub end: Vec3,
    pub radius: f32,
}

impl StrikeSocket {
    /// World-space (start, end) из текущей позы
    pub fn world_segment(&self, transform: &Transform) -> (Vec3, Vec3) {
        (
            transform.transform_point(self.start),
            transform.transform_point(self.end),
        )
    }
}

/// Unarmed trace сокеты персонажа (кулаки, ноги, локти)
#[derive(Component, Debug, Clone, Default, Reflect)]
#[reflect(Component)]
pub struct StrikeSockets(pub Vec<StrikeSocket>);

impl StrikeSockets {
    pub fn socket(&self, attack_type: AttackType) -> Option<&StrikeSocket> {
        self.0.iter().find(|socket| socket.attack_type == attack_type)
    }
}

/// Предмет в руках: свои trace сокеты и своя damage таблица
#[derive(Component, Debug, Clone)]
pub struct HeldItem {
    pub name: String,
    /// Aimable предмет (оружие) → LowReady при входе в combat stance
    pub aimable: bool,
    pub trace: StrikeSocket,
    pub damage: Vec<DamageInfoEntry>,
}

impl HeldItem {
    pub fn damage_info(&self, attack_type: AttackType, strength: AttackStrength) -> Option<&DamageInfoEntry> {
        self.damage
            .iter()
            .find(|entry| entry.attack_type == attack_type && entry.strength == strength)
    }
}
