//! Headless дуэль ALSXT combat core
//!
//! Два бойца: игрок захватывает цель, входит в Ready stance и бьёт серию
//! ударов; защитник на третьем ударе ставит блок.

use alsxt_combat::combat::{AttackBlocked, AttackLanded};
use alsxt_combat::*;
use bevy::prelude::*;
use std::time::Duration;

const STEP: Duration = Duration::from_nanos(16_666_667);
const TICKS_PER_ATTACK: usize = 70;

fn spawn_fighter(app: &mut App, position: Vec3, yaw: f32, aiming: bool) -> Entity {
    app.world_mut()
        .spawn((
            Character {
                desired_aiming: aiming,
                ..default()
            },
            CombatState::default(),
            CombatProperties::default(),
            Transform::from_translation(position).with_rotation(rotation_from_yaw(yaw)),
            TraceBody {
                radius: 40.0,
                offset: Vec3::new(0.0, 100.0, 0.0),
                channel: TraceChannel::Pawn,
            },
            CollisionReactor { velocity: 0.0, mass: 80.0 },
            LockableTarget,
            MeshHighlight::new(2),
        ))
        .id()
}

fn run_ticks(app: &mut App, ticks: usize) {
    for _ in 0..ticks {
        app.world_mut().resource_mut::<Time<Fixed>>().advance_by(STEP);
        app.world_mut().run_schedule(FixedUpdate);
    }
}

fn main() {
    let seed = 42;
    let mut app = create_headless_app(seed);
    app.add_plugins(SimulationPlugin);
    log_info(&format!("🚀 Starting ALSXT headless duel (seed: {})", seed));

    let player = spawn_fighter(&mut app, Vec3::ZERO, 0.0, true);
    let opponent = spawn_fighter(&mut app, Vec3::new(0.0, 0.0, -100.0), 180.0, false);

    let world = app.world_mut();
    world.send_event(TargetingRequest::new(player, TargetingRequestKind::Engage));
    world.send_event(TargetingRequest::new(player, TargetingRequestKind::AcquireClosest));
    for actor in [player, opponent] {
        world.send_event(SetDesiredCombatProperty {
            actor,
            property: CombatProperty::CombatStance(CombatStance::Ready),
        });
    }
    run_ticks(&mut app, 1);

    for attack in 0..5 {
        if attack == 2 {
            app.world_mut().send_event(SetDesiredCombatProperty {
                actor: opponent,
                property: CombatProperty::DefensiveMode(DefensiveMode::Blocking),
            });
        }
        app.world_mut().send_event(PrimaryActionInput { actor: player });
        run_ticks(&mut app, TICKS_PER_ATTACK);
    }

    let world = app.world();
    let landed = world.resource::<Events<AttackLanded>>().iter_current_update_events().count();
    let blocked = world.resource::<Events<AttackBlocked>>().iter_current_update_events().count();
    let target = world.get::<TargetLock>(player).and_then(TargetLock::current_target);

    log_info(&format!(
        "✅ Duel complete: landed {}, blocked {}, locked target: {:?}",
        landed, blocked, target
    ));
}
