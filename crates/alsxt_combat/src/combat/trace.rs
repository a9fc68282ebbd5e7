//! Attack Collision Trace: периодический sweep во время активного окна удара.
//!
//! Inactive → Active (begin) → Inactive (end). Пока Active, каждые
//! `attack_trace_interval` секунд sweep пересчитывается от текущей позы;
//! каждый актор даёт не больше одного hit'а за сессию.

use bevy::prelude::*;
use std::time::Duration;

use super::attack_data::{AttackDataIndex, DamageInfoEntry};
use super::hit::{impact_energy, impact_form, impact_side, AttackDoubleHitResult, DoubleHitResult, ExtendedHitResult};
use crate::components::{
    AttackPhysics, AttackStrength, AttackType, CollisionReactor, HeldItem, ImpactLocation, OverlayMode, StrikeSockets,
};
use crate::config::AttackSettings;
use crate::physics::{QueryFilter, SpatialQuery};
use crate::schedule::RepeatingSchedule;

/// Геометрия + классификация текущей сессии
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AttackTraceSettings {
    pub attack_type: AttackType,
    pub strength: AttackStrength,
    pub base_damage: f32,
    pub start: Vec3,
    pub end: Vec3,
    pub radius: f32,
}

/// Trace сессия атакующего (Component).
///
/// `last_hit_actors` без дублей, очищается ровно при `end()`.
#[derive(Component, Debug, Clone, Default)]
pub struct AttackTraceSession {
    settings: Option<AttackTraceSettings>,
    last_hit_actors: Vec<Entity>,
    sweep: RepeatingSchedule,
}

impl AttackTraceSession {
    pub fn begin(&mut self, settings: AttackTraceSettings, interval: Duration) {
        self.settings = Some(settings);
        self.last_hit_actors.clear();
        self.sweep.start(interval);
    }

    pub fn end(&mut self) {
        self.sweep.cancel();
        self.settings = None;
        self.last_hit_actors.clear();
    }

    pub fn is_active(&self) -> bool {
        self.settings.is_some()
    }

    pub fn settings(&self) -> Option<&AttackTraceSettings> {
        self.settings.as_ref()
    }

    pub fn last_hit_actors(&self) -> &[Entity] {
        &self.last_hit_actors
    }

    /// true если пора делать sweep (несколько срабатываний за тик схлопываются)
    pub fn tick(&mut self, delta: Duration) -> bool {
        self.is_active() && self.sweep.tick(delta) > 0
    }

    /// Пересчёт геометрии от текущей позы
    pub fn update_geometry(&mut self, start: Vec3, end: Vec3, radius: f32) {
        if let Some(settings) = self.settings.as_mut() {
            settings.start = start;
            settings.end = end;
            settings.radius = radius;
        }
    }

    /// Один sweep: новые (ещё не задетые) акторы → полностью разрешённые hit'ы
    pub fn sweep(
        &mut self,
        attacker: &TraceAttacker,
        world: &impl SpatialQuery,
        lookup: &impl CapabilityLookup,
        attack: &AttackSettings,
    ) -> Vec<AttackDoubleHitResult> {
        let Some(settings) = self.settings else {
            return Vec::new();
        };

        let channels = attack.attack_trace_channels.as_slice();
        let ignore_self = [attacker.entity];
        let hits = world.sphere_sweep(
            settings.start,
            settings.end,
            settings.radius,
            QueryFilter::new(channels, &ignore_self),
        );

        let mut results = Vec::new();
        for hit in hits {
            if self.last_hit_actors.contains(&hit.entity) {
                continue;
            }
            self.last_hit_actors.push(hit.entity);

            let reactor = lookup.collision_reactor(hit.entity);
            let counter = lookup.attack_physics(hit.entity);
            let energy = impact_energy(attack.impact_base_energy, reactor.as_ref(), counter.as_ref());

            let (bone, impact_location) = match lookup.bone_at(hit.entity, hit.impact_point) {
                Some((bone, location)) => (Some(bone), location),
                None => (None, ImpactLocation::Unspecified),
            };
            let side = lookup
                .transform(hit.entity)
                .map(|transform| impact_side(*transform.forward(), transform.translation, attacker.location))
                .unwrap_or_default();
            let mut form = impact_form(energy, &attack.impact_form_thresholds);

            let mut hit_record = ExtendedHitResult {
                actor: Some(hit.entity),
                location: hit.location,
                impact_point: hit.impact_point,
                normal: hit.normal,
                bone,
                mass: reactor.map(|reactor| reactor.mass).unwrap_or(0.0),
                velocity: reactor.map(|reactor| reactor.velocity).unwrap_or(0.0),
                direction: (hit.impact_point - attacker.location).normalize_or_zero(),
                impulse: hit.normal * energy,
                damage_type: None,
            };

            // Origin back-trace: от точки удара к началу trace, задетый актор игнорируется
            let ignore_hit = [hit.entity];
            let origin = world
                .sphere_sweep(hit.location, settings.start, settings.radius, QueryFilter::new(channels, &ignore_hit))
                .into_iter()
                .next();

            let mut base_damage = settings.base_damage;
            let mut origin_record = ExtendedHitResult::default();
            if let Some(origin) = origin {
                let (mass, velocity) = lookup
                    .attack_physics(origin.entity)
                    .map(|physics| (physics.mass, physics.velocity))
                    .or_else(|| {
                        lookup
                            .collision_reactor(origin.entity)
                            .map(|reactor| (reactor.mass, reactor.velocity))
                    })
                    .unwrap_or((0.0, 0.0));

                origin_record = ExtendedHitResult {
                    actor: Some(origin.entity),
                    location: origin.location,
                    impact_point: origin.impact_point,
                    normal: origin.normal,
                    bone: None,
                    mass,
                    velocity,
                    direction: (origin.impact_point - hit.impact_point).normalize_or_zero(),
                    impulse: origin.normal * energy,
                    damage_type: None,
                };

                if let Some(info) = attacker.damage {
                    base_damage = info.base_damage;
                    hit_record.damage_type = Some(info.damage_type);
                    origin_record.damage_type = Some(info.damage_type);
                    if let Some(override_form) = info.impact_form {
                        form = override_form;
                    }
                }
            }

            results.push(AttackDoubleHitResult {
                overlay: attacker.overlay,
                attack_type: settings.attack_type,
                strength: settings.strength,
                base_damage,
                double_hit: DoubleHitResult {
                    impact_location,
                    impact_side: side,
                    impact_form: form,
                    energy,
                    hit: hit_record,
                    origin_hit: origin_record,
                },
            });
        }

        results
    }
}

/// Контекст атакующего для одного sweep'а
#[derive(Debug, Clone, Copy)]
pub struct TraceAttacker {
    pub entity: Entity,
    pub location: Vec3,
    pub overlay: OverlayMode,
    /// Damage info (held item или unarmed таблица)
    pub damage: Option<DamageInfoEntry>,
}

/// Collaborator: capabilities произвольных акторов
pub trait CapabilityLookup {
    fn collision_reactor(&self, entity: Entity) -> Option<CollisionReactor>;
    fn attack_physics(&self, entity: Entity) -> Option<AttackPhysics>;
    fn transform(&self, entity: Entity) -> Option<Transform>;
    /// Ближайшая к world точке кость: (bone name, location tag)
    fn bone_at(&self, entity: Entity, point: Vec3) -> Option<(String, ImpactLocation)>;
}

/// Trace сегмент из текущей позы: held item → strike socket → fallback перед грудью
pub fn trace_segment(
    transform: &Transform,
    attack_type: AttackType,
    sockets: Option<&StrikeSockets>,
    held_item: Option<&HeldItem>,
    attack: &AttackSettings,
) -> (Vec3, Vec3, f32) {
    if let Some(item) = held_item {
        let (start, end) = item.trace.world_segment(transform);
        return (start, end, item.trace.radius);
    }

    if let Some(socket) = sockets.and_then(|sockets| sockets.socket(attack_type)) {
        let (start, end) = socket.world_segment(transform);
        return (start, end, socket.radius);
    }

    let height = Vec3::Y * attack.unarmed_trace_height;
    (
        transform.transform_point(height),
        transform.transform_point(height + Vec3::NEG_Z * attack.unarmed_reach),
        attack.unarmed_trace_radius,
    )
}

/// Damage info: held item lookup, иначе unarmed таблица
pub fn resolve_damage_info(
    index: &AttackDataIndex,
    held_item: Option<&HeldItem>,
    attack_type: AttackType,
    strength: AttackStrength,
) -> Option<DamageInfoEntry> {
    match held_item {
        Some(item) => item.damage_info(attack_type, strength).copied(),
        None => index.unarmed_damage(attack_type, strength).copied(),
    }
}
