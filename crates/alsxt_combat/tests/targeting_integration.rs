//! Targeting integration test
//!
//! Target lock в headless App: acquire, удержание, потеря цели по дистанции,
//! obstruction, доворот control rotation.

use alsxt_combat::targeting::{TargetLocked, TargetObstructed, TargetUnlocked};
use alsxt_combat::*;
use bevy::prelude::*;
use std::time::Duration;

const STEP: Duration = Duration::from_nanos(16_666_667);

fn create_targeting_app() -> App {
    let mut app = App::new();
    app.add_plugins(MinimalPlugins).add_plugins(SimulationPlugin);
    app
}

fn step(app: &mut App, ticks: usize) {
    for _ in 0..ticks {
        app.world_mut().resource_mut::<Time<Fixed>>().advance_by(STEP);
        app.world_mut().run_schedule(FixedUpdate);
    }
}

fn collected<E: Event + Clone>(app: &App) -> Vec<E> {
    app.world()
        .resource::<Events<E>>()
        .iter_current_update_events()
        .cloned()
        .collect()
}

/// Актор в начале координат, aiming включён, смотрит в -Z
fn spawn_player(app: &mut App) -> Entity {
    app.world_mut()
        .spawn((
            Character {
                desired_aiming: true,
                ..default()
            },
            TraceBody::pawn(40.0),
        ))
        .id()
}

fn spawn_lockable(app: &mut App, position: Vec3) -> Entity {
    app.world_mut()
        .spawn((
            Transform::from_translation(position),
            TraceBody::pawn(40.0),
            LockableTarget,
            MeshHighlight::new(3),
        ))
        .id()
}

fn request(app: &mut App, actor: Entity, kind: TargetingRequestKind) {
    app.world_mut().send_event(TargetingRequest::new(actor, kind));
}

fn highlight_value(app: &App, entity: Entity) -> f32 {
    app.world()
        .get::<MeshHighlight>(entity)
        .map(MeshHighlight::parameter_value)
        .unwrap_or(0.0)
}

fn lock_of(app: &App, entity: Entity) -> &TargetLock {
    app.world().get::<TargetLock>(entity).expect("Character требует TargetLock")
}

/// Test: одна lockable цель в 500 прямо по курсу → acquire + подсветка 0 → 1
#[test]
fn test_acquire_closest_locks_target_ahead() {
    let mut app = create_targeting_app();
    let player = spawn_player(&mut app);
    let target = spawn_lockable(&mut app, Vec3::new(0.0, 0.0, -500.0));
    assert_eq!(highlight_value(&app, target), 0.0);

    request(&mut app, player, TargetingRequestKind::Engage);
    request(&mut app, player, TargetingRequestKind::AcquireClosest);
    step(&mut app, 1);

    let lock = lock_of(&app, player);
    assert_eq!(lock.state(), TargetLockState::Locked);
    assert_eq!(lock.current_target(), Some(target));
    assert!((lock.current().distance_from_player - 500.0).abs() < 1e-3);
    assert!(lock.current().angle_from_center.abs() < 1e-3);
    assert_eq!(highlight_value(&app, target), 1.0);
    assert_eq!(collected::<TargetLocked>(&app), vec![TargetLocked { actor: player, target }]);
}

/// Test: Engage без явного запроса: периодический scan сам находит цель
#[test]
fn test_scanning_acquires_on_timer() {
    let mut app = create_targeting_app();
    let player = spawn_player(&mut app);
    let target = spawn_lockable(&mut app, Vec3::new(0.0, 0.0, -400.0));

    request(&mut app, player, TargetingRequestKind::Engage);
    step(&mut app, 2);

    assert_eq!(lock_of(&app, player).current_target(), Some(target));
}

/// Test: не-lockable и дальние акторы не выбираются
#[test]
fn test_acquire_ignores_unlockable_and_far_actors() {
    let mut app = create_targeting_app();
    let player = spawn_player(&mut app);
    // Без LockableTarget
    app.world_mut()
        .spawn((Transform::from_xyz(0.0, 0.0, -300.0), TraceBody::pawn(40.0)));
    // Дальше MaxLockDistance (1000)
    spawn_lockable(&mut app, Vec3::new(0.0, 0.0, -1050.0));

    request(&mut app, player, TargetingRequestKind::Engage);
    request(&mut app, player, TargetingRequestKind::AcquireClosest);
    step(&mut app, 3);

    let lock = lock_of(&app, player);
    assert_eq!(lock.state(), TargetLockState::Scanning);
    assert!(!lock.current().valid);
    assert!(collected::<TargetLocked>(&app).is_empty());
}

/// Test: без desired aiming acquire игнорируется
#[test]
fn test_acquire_requires_aiming() {
    let mut app = create_targeting_app();
    let player = app.world_mut().spawn((Character::default(), TraceBody::pawn(40.0))).id();
    spawn_lockable(&mut app, Vec3::new(0.0, 0.0, -500.0));

    request(&mut app, player, TargetingRequestKind::AcquireClosest);
    step(&mut app, 1);

    assert_eq!(lock_of(&app, player).current_target(), None);
}

/// Test: цель ушла дальше MaxInitialLockDistance → disengage, sentinels, таймер отменён
#[test]
fn test_target_beyond_initial_lock_distance_disengages() {
    let mut app = create_targeting_app();
    let player = spawn_player(&mut app);
    let target = spawn_lockable(&mut app, Vec3::new(0.0, 0.0, -500.0));

    request(&mut app, player, TargetingRequestKind::Engage);
    request(&mut app, player, TargetingRequestKind::AcquireClosest);
    step(&mut app, 1);
    assert_eq!(lock_of(&app, player).current_target(), Some(target));

    if let Some(mut transform) = app.world_mut().get_mut::<Transform>(target) {
        transform.translation = Vec3::new(0.0, 0.0, -1300.0);
    }
    step(&mut app, 1);

    let lock = lock_of(&app, player);
    assert_eq!(lock.state(), TargetLockState::Idle);
    assert!(!lock.is_scheduled());
    assert!(!lock.current().valid);
    assert_eq!(lock.current().angle_from_center, 361.0);
    assert_eq!(lock.current().distance_from_player, f32::MAX);
    assert_eq!(highlight_value(&app, target), 0.0);
    assert_eq!(collected::<TargetUnlocked>(&app), vec![TargetUnlocked { actor: player, target }]);
}

/// Test: стена между актором и целью → unlock + TargetObstructed
#[test]
fn test_obstructed_target_unlocks() {
    let mut app = create_targeting_app();
    let player = spawn_player(&mut app);
    let target = spawn_lockable(&mut app, Vec3::new(0.0, 0.0, -500.0));

    request(&mut app, player, TargetingRequestKind::Engage);
    request(&mut app, player, TargetingRequestKind::AcquireClosest);
    step(&mut app, 1);

    let view_height = app.world().resource::<CombatSettings>().targeting.view_height;
    app.world_mut()
        .spawn((Transform::from_xyz(0.0, view_height, -250.0), TraceBody::world_static(60.0)));
    step(&mut app, 1);

    assert_eq!(collected::<TargetObstructed>(&app), vec![TargetObstructed { actor: player, target }]);
    assert_eq!(lock_of(&app, player).current_target(), None);
    assert_eq!(highlight_value(&app, target), 0.0);
}

/// Test: пока цель удерживается, control yaw следит за ней
#[test]
fn test_locked_target_drives_control_yaw() {
    let mut app = create_targeting_app();
    let player = spawn_player(&mut app);
    let target = spawn_lockable(&mut app, Vec3::new(0.0, 0.0, -500.0));

    request(&mut app, player, TargetingRequestKind::Engage);
    request(&mut app, player, TargetingRequestKind::AcquireClosest);
    step(&mut app, 1);

    // Цель обходит справа-спереди
    if let Some(mut transform) = app.world_mut().get_mut::<Transform>(target) {
        transform.translation = Vec3::new(300.0, 0.0, -300.0);
    }
    step(&mut app, 1);

    let control = app.world().get::<ControlRotation>(player).copied().expect("control rotation");
    assert!((control.yaw + 45.0).abs() < 1e-3, "yaw = {}", control.yaw);
    assert_eq!(lock_of(&app, player).current_target(), Some(target));
}

/// Test: cycle переключает подсветку, одна цель подсвечена в любой момент
#[test]
fn test_cycle_right_switches_highlight() {
    let mut app = create_targeting_app();
    let player = spawn_player(&mut app);
    let center = spawn_lockable(&mut app, Vec3::new(0.0, 0.0, -400.0));
    let right = spawn_lockable(&mut app, Vec3::new(150.0, 0.0, -500.0));

    request(&mut app, player, TargetingRequestKind::Engage);
    request(&mut app, player, TargetingRequestKind::AcquireClosest);
    step(&mut app, 1);
    assert_eq!(lock_of(&app, player).current_target(), Some(center));

    request(&mut app, player, TargetingRequestKind::CycleRight);
    step(&mut app, 1);

    assert_eq!(lock_of(&app, player).current_target(), Some(right));
    assert_eq!(highlight_value(&app, center), 0.0);
    assert_eq!(highlight_value(&app, right), 1.0);

    request(&mut app, player, TargetingRequestKind::Disengage);
    step(&mut app, 1);
    assert_eq!(lock_of(&app, player).state(), TargetLockState::Idle);
    assert_eq!(highlight_value(&app, right), 0.0);
}
