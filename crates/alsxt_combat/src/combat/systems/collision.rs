//! Attack collision trace systems (session begin/end + periodic sweeps).

use bevy::ecs::system::SystemParam;
use bevy::prelude::*;

use crate::combat::attack_data::AttackDataIndex;
use crate::combat::events::{AttackCollision, AttackHit, BeginAttackCollisionTrace, EndAttackCollisionTrace};
use crate::combat::state::CombatState;
use crate::combat::trace::{
    resolve_damage_info, trace_segment, AttackTraceSession, AttackTraceSettings, CapabilityLookup, TraceAttacker,
};
use crate::components::{AttackPhysics, BoneLocations, Character, CollisionReactor, HeldItem, ImpactLocation, StrikeSockets};
use crate::config::CombatSettings;
use crate::physics::{TraceBody, TraceWorld};

/// Capabilities произвольных акторов через ECS queries
#[derive(SystemParam)]
pub struct CapabilityQueries<'w, 's> {
    reactors: Query<'w, 's, &'static CollisionReactor>,
    physics: Query<'w, 's, &'static AttackPhysics>,
    transforms: Query<'w, 's, &'static Transform>,
    bones: Query<'w, 's, &'static BoneLocations>,
}

impl CapabilityLookup for CapabilityQueries<'_, '_> {
    fn collision_reactor(&self, entity: Entity) -> Option<CollisionReactor> {
        self.reactors.get(entity).ok().copied()
    }

    fn attack_physics(&self, entity: Entity) -> Option<AttackPhysics> {
        self.physics.get(entity).ok().copied()
    }

    fn transform(&self, entity: Entity) -> Option<Transform> {
        self.transforms.get(entity).ok().copied()
    }

    fn bone_at(&self, entity: Entity, point: Vec3) -> Option<(String, ImpactLocation)> {
        let transform = self.transforms.get(entity).ok()?;
        let local = transform.compute_affine().inverse().transform_point3(point);
        self.bones
            .get(entity)
            .ok()?
            .resolve(local)
            .map(|entry| (entry.bone.clone(), entry.location))
    }
}

/// System: Begin/End trace сессий по animation notify.
///
/// Begin берёт тип/силу/урон из текущей атаки и геометрию из текущей позы.
pub fn handle_trace_windows(
    mut begins: EventReader<BeginAttackCollisionTrace>,
    mut ends: EventReader<EndAttackCollisionTrace>,
    mut sessions: Query<(
        &Transform,
        &CombatState,
        &mut AttackTraceSession,
        Option<&StrikeSockets>,
        Option<&HeldItem>,
    )>,
    settings: Res<CombatSettings>,
) {
    let attack = &settings.attack;

    for begin in begins.read() {
        let Ok((transform, state, mut session, sockets, held_item)) = sessions.get_mut(begin.attacker) else {
            continue;
        };
        let Some(current) = state.current_attack.as_ref() else {
            continue;
        };

        let (start, end, radius) = trace_segment(transform, current.attack_type, sockets, held_item, attack);
        session.begin(
            AttackTraceSettings {
                attack_type: current.attack_type,
                strength: current.strength,
                base_damage: current.base_damage,
                start,
                end,
                radius,
            },
            attack.trace_interval(),
        );

        crate::logger::log(&format!(
            "🗡️ ECS: Attack trace begin (attacker: {:?}, {:?} {:?})",
            begin.attacker, current.attack_type, current.strength
        ));
    }

    for end in ends.read() {
        let Ok((_, _, mut session, _, _)) = sessions.get_mut(end.attacker) else {
            continue;
        };
        if !session.is_active() {
            continue;
        }

        let hits = session.last_hit_actors().len();
        session.end();
        crate::logger::log(&format!(
            "🗡️ ECS: Attack trace end (attacker: {:?}, actors hit: {})",
            end.attacker, hits
        ));
    }
}

/// System: Periodic attack sweeps.
///
/// Каждый новый hit: AttackCollision задетому (если есть CollisionReactor)
/// и AttackHit атакующему.
#[allow(clippy::too_many_arguments)]
pub fn tick_attack_traces(
    mut attackers: Query<(
        Entity,
        &Transform,
        &Character,
        &mut AttackTraceSession,
        Option<&StrikeSockets>,
        Option<&HeldItem>,
    )>,
    bodies: Query<(Entity, &Transform, &TraceBody)>,
    capabilities: CapabilityQueries,
    index: Res<AttackDataIndex>,
    settings: Res<CombatSettings>,
    time: Res<Time<Fixed>>,
    mut collisions: EventWriter<AttackCollision>,
    mut hits: EventWriter<AttackHit>,
) {
    let delta = time.delta();
    let attack = &settings.attack;
    let mut world: Option<TraceWorld> = None;

    for (entity, transform, character, mut session, sockets, held_item) in attackers.iter_mut() {
        if !session.tick(delta) {
            continue;
        }
        let Some(current) = session.settings().copied() else {
            continue;
        };

        let (start, end, radius) = trace_segment(transform, current.attack_type, sockets, held_item, attack);
        session.update_geometry(start, end, radius);

        let attacker = TraceAttacker {
            entity,
            location: transform.translation,
            overlay: character.overlay_mode,
            damage: resolve_damage_info(&index, held_item, current.attack_type, current.strength),
        };
        let world = world.get_or_insert_with(|| TraceWorld::collect(bodies.iter()));

        for result in session.sweep(&attacker, &*world, &capabilities, attack) {
            let Some(target) = result.target() else {
                continue;
            };

            crate::logger::log_info(&format!(
                "💥 ECS: Attack hit (attacker: {:?}, target: {:?}, side: {:?}, form: {:?}, energy: {:.1})",
                entity, target, result.double_hit.impact_side, result.double_hit.impact_form, result.double_hit.energy
            ));

            if capabilities.collision_reactor(target).is_some() {
                collisions.write(AttackCollision {
                    attacker: entity,
                    target,
                    result: result.clone(),
                });
            }
            hits.write(AttackHit { attacker: entity, result });
        }
    }
}
