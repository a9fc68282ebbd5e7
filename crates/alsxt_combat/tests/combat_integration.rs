//! Combat integration test
//!
//! Полный цикл в headless App (SimulationPlugin, FixedUpdate вручную):
//! - Input → старт атаки → trace окно → hit → история → reaction
//! - Blocking защитник → AttackBlocked, следующая атака = Riposte
//! - Двойной старт в одном окне → один broadcast

use alsxt_combat::combat::{
    AttackBlocked, AttackCollision, AttackEnded, AttackLanded, BeginAttackCollisionTrace, EndAttackCollisionTrace,
};
use alsxt_combat::net::{RecordingTransport, ReplicationFact};
use alsxt_combat::*;
use bevy::prelude::*;
use std::time::Duration;

const STEP: Duration = Duration::from_nanos(16_666_667);

/// Helper: App с SimulationPlugin и записывающим transport'ом
fn create_combat_app(transport: &RecordingTransport) -> App {
    let mut app = App::new();
    app.add_plugins(MinimalPlugins)
        .insert_resource(Replication::new(transport.clone()))
        .add_plugins(SimulationPlugin);
    app
}

/// Helper: N фиксированных тиков симуляции
fn step(app: &mut App, ticks: usize) {
    for _ in 0..ticks {
        app.world_mut().resource_mut::<Time<Fixed>>().advance_by(STEP);
        app.world_mut().run_schedule(FixedUpdate);
    }
}

/// Helper: все события типа E с начала теста (без app.update буферы не ротируются)
fn collected<E: Event + Clone>(app: &App) -> Vec<E> {
    app.world()
        .resource::<Events<E>>()
        .iter_current_update_events()
        .cloned()
        .collect()
}

fn ready_properties(defensive: DefensiveMode) -> CombatProperties {
    let mut properties = CombatProperties::default();
    properties.set(CombatProperty::CombatStance(CombatStance::Ready));
    properties.set(CombatProperty::DefensiveMode(defensive));
    properties
}

/// Helper: атакующий в начале координат, смотрит в -Z
fn spawn_attacker(app: &mut App) -> Entity {
    app.world_mut()
        .spawn((
            Character::default(),
            CombatState::default(),
            ready_properties(DefensiveMode::None),
            Transform::from_translation(Vec3::ZERO),
            TraceBody {
                radius: 40.0,
                offset: Vec3::new(0.0, 100.0, 0.0),
                channel: TraceChannel::Pawn,
            },
        ))
        .id()
}

/// Helper: защитник в метре перед атакующим, лицом к нему
fn spawn_defender(app: &mut App, defensive: DefensiveMode) -> Entity {
    app.world_mut()
        .spawn((
            Character::default(),
            CombatState::default(),
            ready_properties(defensive),
            Transform::from_xyz(0.0, 0.0, -100.0).with_rotation(rotation_from_yaw(180.0)),
            TraceBody {
                radius: 40.0,
                offset: Vec3::new(0.0, 100.0, 0.0),
                channel: TraceChannel::Pawn,
            },
            CollisionReactor::default(),
            LockableTarget,
        ))
        .id()
}

fn press_attack(app: &mut App, actor: Entity) {
    app.world_mut().send_event(PrimaryActionInput { actor });
}

/// Test: удар доходит до защитника ровно один раз, история и reaction обновлены
#[test]
fn test_attack_lands_once_and_updates_history() {
    let transport = RecordingTransport::new();
    let mut app = create_combat_app(&transport);
    let attacker = spawn_attacker(&mut app);
    let defender = spawn_defender(&mut app, DefensiveMode::None);

    press_attack(&mut app, attacker);
    step(&mut app, 1);

    let started = collected::<AttackStarted>(&app);
    assert_eq!(started.len(), 1);
    assert_eq!(started[0].method, AttackMethod::Regular);
    assert_eq!(started[0].target, Some(defender));
    assert!(app.world().get::<MovementLock>(attacker).is_some_and(|lock| lock.locked));

    // Монтаж (0.9-1.0 сек при play rate 1.3) целиком
    step(&mut app, 60);

    let collisions = collected::<AttackCollision>(&app);
    assert_eq!(collisions.len(), 1, "trace окно даёт один hit на актора");
    assert_eq!(collisions[0].target, defender);
    assert_eq!(collisions[0].result.double_hit.impact_side, ImpactSide::Front);

    let landed = collected::<AttackLanded>(&app);
    assert_eq!(landed, vec![AttackLanded { attacker, defender }]);

    let reactions = collected::<AttackReaction>(&app);
    assert_eq!(reactions.len(), 1);
    assert!(!reactions[0].blocked);
    assert_eq!(reactions[0].response, Some(MontageId::new("react_front_tap")));

    let history = app.world().get::<CombatHistory>(attacker).expect("history");
    let entry = history.get(defender).expect("entry after hit");
    assert_eq!(entry.consecutive_hits, 1);
    assert!(entry.last_hit_to < 1.0);

    // Атака закончилась: phase Idle, movement свободен
    let state = app.world().get::<CombatState>(attacker).expect("state");
    assert_eq!(state.phase, CombatPhase::Idle);
    assert!(app.world().get::<MovementLock>(attacker).is_some_and(|lock| !lock.locked));
    assert_eq!(collected::<AttackEnded>(&app).len(), 1);
}

/// Test: blocking защитник → AttackBlocked, следующая атака становится Riposte
#[test]
fn test_blocked_attack_leads_to_riposte() {
    let transport = RecordingTransport::new();
    let mut app = create_combat_app(&transport);
    let attacker = spawn_attacker(&mut app);
    let defender = spawn_defender(&mut app, DefensiveMode::Blocking);

    press_attack(&mut app, attacker);
    step(&mut app, 61);

    assert_eq!(collected::<AttackBlocked>(&app), vec![AttackBlocked { attacker, defender }]);
    assert!(collected::<AttackLanded>(&app).is_empty());
    let reactions = collected::<AttackReaction>(&app);
    assert_eq!(reactions.len(), 1);
    assert!(reactions[0].blocked);
    assert_eq!(reactions[0].response, None);

    let history = app.world().get::<CombatHistory>(attacker).expect("history");
    assert_eq!(history.get(defender).map(|entry| entry.consecutive_hits), Some(0));

    press_attack(&mut app, attacker);
    step(&mut app, 1);

    let started = collected::<AttackStarted>(&app);
    assert_eq!(started.len(), 2);
    assert_eq!(started[1].method, AttackMethod::Riposte);
}

/// Test: два StartAttack в одном окне → второй отклонён, один broadcast
#[test]
fn test_double_start_broadcasts_once() {
    let transport = RecordingTransport::new();
    let mut app = create_combat_app(&transport);
    let attacker = spawn_attacker(&mut app);
    spawn_defender(&mut app, DefensiveMode::None);

    press_attack(&mut app, attacker);
    press_attack(&mut app, attacker);
    step(&mut app, 1);

    // Ещё одно нажатие, пока монтаж играет
    press_attack(&mut app, attacker);
    step(&mut app, 5);

    assert_eq!(collected::<AttackStarted>(&app).len(), 1);
    let broadcasts = transport
        .facts()
        .into_iter()
        .filter(|fact| matches!(fact, ReplicationFact::AttackStarted { .. }))
        .count();
    assert_eq!(broadcasts, 1);
    assert!(transport.intents().is_empty(), "authority не шлёт intents");
}

/// Test: primary action без combat stance игнорируется
#[test]
fn test_primary_action_requires_ready_stance() {
    let transport = RecordingTransport::new();
    let mut app = create_combat_app(&transport);
    let attacker = app
        .world_mut()
        .spawn((Character::default(), CombatState::default(), CombatProperties::default()))
        .id();

    press_attack(&mut app, attacker);
    step(&mut app, 1);

    assert!(collected::<AttackStarted>(&app).is_empty());
    assert!(transport.facts().is_empty());
}

/// Test: stance через SetDesiredCombatProperty реплицируется и открывает атаку
#[test]
fn test_stance_request_replicates_and_enables_attack() {
    let transport = RecordingTransport::new();
    let mut app = create_combat_app(&transport);
    let attacker = app
        .world_mut()
        .spawn((Character::default(), CombatState::default(), CombatProperties::default()))
        .id();

    app.world_mut().send_event(SetDesiredCombatProperty {
        actor: attacker,
        property: CombatProperty::CombatStance(CombatStance::Ready),
    });
    step(&mut app, 1);

    let properties = app.world().get::<CombatProperties>(attacker).expect("properties");
    assert_eq!(properties.combat_stance(), CombatStance::Ready);
    // Без aimable предмета stance тянет за собой Ready позицию
    assert_eq!(properties.weapon_ready_position(), WeaponReadyPosition::Ready);
    let changes = transport
        .facts()
        .into_iter()
        .filter(|fact| matches!(fact, ReplicationFact::CombatPropertyChanged { .. }))
        .count();
    assert_eq!(changes, 2);

    press_attack(&mut app, attacker);
    step(&mut app, 1);
    assert_eq!(collected::<AttackStarted>(&app).len(), 1);
}
