//! Targeting systems: requests + периодический scan/maintain.

use bevy::ecs::system::SystemParam;
use bevy::prelude::*;

use super::entry::{trace_for_targets, TargetHitResultEntry, TargetingView};
use super::events::{TargetLocked, TargetObstructed, TargetUnlocked, TargetingRequest, TargetingRequestKind};
use super::lock::{CycleDirection, MaintainContext, MaintainOutcome, TargetHighlighter, TargetLock, TargetLockState};
use crate::components::{Character, ControlRotation, LockableTarget, MeshHighlight};
use crate::config::{CombatSettings, TargetingSettings};
use crate::physics::{TraceBody, TraceWorld};

/// Highlighter поверх MeshHighlight компонентов
pub struct MeshHighlighter<'a, 'w, 's> {
    meshes: &'a mut Query<'w, 's, &'static mut MeshHighlight>,
}

impl TargetHighlighter for MeshHighlighter<'_, '_, '_> {
    fn highlight(&mut self, target: Entity, parameter: &str) {
        if let Ok(mut mesh) = self.meshes.get_mut(target) {
            mesh.apply(parameter);
        }
    }

    fn clear(&mut self, target: Entity) {
        if let Ok(mut mesh) = self.meshes.get_mut(target) {
            mesh.clear();
        }
    }
}

/// Мир для target trace: коллизионные тела + lockable акторы
#[derive(SystemParam)]
pub struct TargetingWorld<'w, 's> {
    bodies: Query<'w, 's, (Entity, &'static Transform, &'static TraceBody)>,
    lockables: Query<'w, 's, &'static Transform, With<LockableTarget>>,
}

impl TargetingWorld<'_, '_> {
    pub fn snapshot(&self) -> TraceWorld {
        TraceWorld::collect(self.bodies.iter())
    }

    /// Позиция актора, если он поддерживает lock
    pub fn locate(&self, entity: Entity) -> Option<Vec3> {
        self.lockables.get(entity).ok().map(|transform| transform.translation)
    }

    pub fn candidates(&self, view: &TargetingView, settings: &TargetingSettings, world: &TraceWorld) -> Vec<TargetHitResultEntry> {
        trace_for_targets(view, settings, world, |entity| self.locate(entity))
    }
}

fn is_targetable(character: &Character, settings: &TargetingSettings) -> bool {
    settings.is_targetable(character.overlay_mode) && character.desired_aiming
}

fn report_switch(
    actor: Entity,
    previous: Option<Entity>,
    current: Entity,
    locked: &mut EventWriter<TargetLocked>,
    unlocked: &mut EventWriter<TargetUnlocked>,
) {
    if let Some(previous) = previous {
        unlocked.write(TargetUnlocked { actor, target: previous });
    }
    locked.write(TargetLocked { actor, target: current });
    crate::logger::log_info(&format!("🎯 ECS: Target locked (actor: {:?}, target: {:?})", actor, current));
}

/// System: Targeting requests (engage / acquire / cycle / disengage).
#[allow(clippy::too_many_arguments)]
pub fn handle_targeting_requests(
    mut requests: EventReader<TargetingRequest>,
    mut actors: Query<(Entity, &Transform, &Character, &ControlRotation, &mut TargetLock)>,
    targeting: TargetingWorld,
    mut meshes: Query<&'static mut MeshHighlight>,
    settings: Res<CombatSettings>,
    mut locked: EventWriter<TargetLocked>,
    mut unlocked: EventWriter<TargetUnlocked>,
) {
    let settings = &settings.targeting;
    let interval = settings.trace_interval();
    let mut world: Option<TraceWorld> = None;

    for request in requests.read() {
        let Ok((entity, transform, character, control, mut lock)) = actors.get_mut(request.actor) else {
            continue;
        };
        let mut highlighter = MeshHighlighter { meshes: &mut meshes };
        let previous = lock.current_target();

        let direction = match request.kind {
            TargetingRequestKind::Engage => {
                lock.engage(interval);
                crate::logger::log(&format!("🔍 ECS: Target scanning engaged (actor: {:?})", entity));
                continue;
            }
            TargetingRequestKind::Disengage => {
                if let Some(target) = lock.disengage(&mut highlighter) {
                    unlocked.write(TargetUnlocked { actor: entity, target });
                    crate::logger::log_info(&format!("🔓 ECS: Target disengaged (actor: {:?}, target: {:?})", entity, target));
                }
                continue;
            }
            TargetingRequestKind::AcquireClosest => None,
            TargetingRequestKind::CycleLeft => Some(CycleDirection::Left),
            TargetingRequestKind::CycleRight => Some(CycleDirection::Right),
        };

        if !is_targetable(character, settings) {
            continue;
        }

        let view = TargetingView {
            entity,
            location: transform.translation,
            rotation: *control,
        };
        let world = world.get_or_insert_with(|| targeting.snapshot());
        let candidates = targeting.candidates(&view, settings, world);

        let found = match direction {
            None => lock.acquire_closest(&candidates, &mut highlighter, &settings.highlight_parameter, interval),
            Some(direction) => lock.cycle(direction, &candidates, &mut highlighter, &settings.highlight_parameter, interval),
        };
        if let Some(target) = found {
            report_switch(entity, previous, target, &mut locked, &mut unlocked);
        }
    }
}

/// System: Periodic target re-evaluation.
///
/// Scanning → AcquireClosest; Locked → MaintainLock (дистанция, obstruction, rotation assist).
#[allow(clippy::too_many_arguments)]
pub fn update_target_locks(
    mut actors: Query<(Entity, &Transform, &Character, &mut ControlRotation, &mut TargetLock)>,
    targeting: TargetingWorld,
    mut meshes: Query<&'static mut MeshHighlight>,
    settings: Res<CombatSettings>,
    time: Res<Time<Fixed>>,
    mut locked: EventWriter<TargetLocked>,
    mut unlocked: EventWriter<TargetUnlocked>,
    mut obstructed: EventWriter<TargetObstructed>,
) {
    let settings = &settings.targeting;
    let interval = settings.trace_interval();
    let delta = time.delta();
    let mut world: Option<TraceWorld> = None;

    for (entity, transform, character, mut control, mut lock) in actors.iter_mut() {
        if lock.state() == TargetLockState::Idle || !lock.tick(delta) {
            continue;
        }

        let targetable = is_targetable(character, settings);
        let mut highlighter = MeshHighlighter { meshes: &mut meshes };
        let world = world.get_or_insert_with(|| targeting.snapshot());

        match lock.state() {
            TargetLockState::Idle => {}
            TargetLockState::Scanning => {
                if !targetable {
                    continue;
                }
                let view = TargetingView {
                    entity,
                    location: transform.translation,
                    rotation: *control,
                };
                let candidates = targeting.candidates(&view, settings, world);
                if let Some(target) =
                    lock.acquire_closest(&candidates, &mut highlighter, &settings.highlight_parameter, interval)
                {
                    report_switch(entity, None, target, &mut locked, &mut unlocked);
                }
            }
            TargetLockState::Locked => {
                let context = MaintainContext {
                    attacker: entity,
                    location: transform.translation,
                    target_location: lock.current_target().and_then(|target| targeting.locate(target)),
                    targetable,
                };

                match lock.maintain(&context, &mut control, &*world, &mut highlighter, settings) {
                    MaintainOutcome::Disengaged(target) => {
                        unlocked.write(TargetUnlocked { actor: entity, target });
                        crate::logger::log_info(&format!(
                            "🔓 ECS: Target lost (actor: {:?}, target: {:?})",
                            entity, target
                        ));
                    }
                    MaintainOutcome::Obstructed(target) => {
                        unlocked.write(TargetUnlocked { actor: entity, target });
                        obstructed.write(TargetObstructed { actor: entity, target });
                        crate::logger::log_info(&format!(
                            "🧱 ECS: Target obstructed (actor: {:?}, target: {:?})",
                            entity, target
                        ));
                    }
                    MaintainOutcome::Rotated(_) | MaintainOutcome::Unchanged | MaintainOutcome::Inactive => {}
                }
            }
        }
    }
}
