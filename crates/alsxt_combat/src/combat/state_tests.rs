//! Tests for combat state machine (start / refresh / stop).

#[cfg(test)]
mod tests {
    use super::super::attack_data::AttackDataIndex;
    use super::super::montage::{MontageId, MontagePlayer};
    use super::super::state::*;
    use crate::components::*;
    use crate::net::{RecordingTransport, ReplicationFact, ReplicationIntent};
    use bevy::prelude::*;

    const ACTOR: Entity = Entity::from_raw(1);

    fn index() -> AttackDataIndex {
        AttackDataIndex::bundled().expect("bundled attack data")
    }

    /// Владелец компонентов одного атакующего
    struct Rig {
        role: NetRole,
        action: LocomotionAction,
        movement: MovementLock,
        player: MontagePlayer,
        state: CombatState,
        transform: Transform,
    }

    impl Rig {
        fn new(role: NetRole) -> Self {
            Self {
                role,
                action: LocomotionAction::default(),
                movement: MovementLock::default(),
                player: MontagePlayer::default(),
                state: CombatState::default(),
                transform: Transform::default(),
            }
        }

        fn attacker(&mut self) -> AttackerMut<'_> {
            AttackerMut {
                entity: ACTOR,
                role: self.role,
                action: &mut self.action,
                movement: &mut self.movement,
                player: &mut self.player,
                state: &mut self.state,
                transform: &mut self.transform,
            }
        }
    }

    fn params(target_yaw: f32) -> AttackStartParams {
        AttackStartParams {
            montage: MontageId::new("rf_cross_medium_a"),
            play_rate: 1.0,
            start_position: 0.0,
            start_yaw: 0.0,
            target_yaw,
            attack_type: AttackType::RightFist,
            strength: AttackStrength::Medium,
            base_damage: 0.10,
            method: AttackMethod::Regular,
            target: None,
        }
    }

    #[test]
    fn test_simulated_proxy_cannot_start() {
        let index = index();
        let mut transport = RecordingTransport::new();
        let mut rig = Rig::new(NetRole::SimulatedProxy);

        let result = start_attack(&mut rig.attacker(), Some(params(0.0)), &index, &mut transport);
        assert_eq!(result, Err(StartRejection::NoAuthority));
        assert!(!rig.movement.locked);
        assert!(transport.facts().is_empty());
    }

    #[test]
    fn test_missing_montage_aborts_start() {
        let index = index();
        let mut transport = RecordingTransport::new();
        let mut rig = Rig::new(NetRole::Authority);

        let result = start_attack(&mut rig.attacker(), None, &index, &mut transport);
        assert_eq!(result, Err(StartRejection::NoMontage));
        assert_eq!(rig.state.phase, CombatPhase::Idle);
    }

    #[test]
    fn test_unplayable_start_leaves_no_trace() {
        let index = index();
        let mut transport = RecordingTransport::new();
        let mut rig = Rig::new(NetRole::Authority);
        let mut broken = params(0.0);
        broken.play_rate = 0.0;

        let result = start_attack(&mut rig.attacker(), Some(broken), &index, &mut transport);
        assert_eq!(result, Err(StartRejection::PlaybackFailed));
        assert!(transport.facts().is_empty());
        assert!(!rig.movement.locked);
        assert_eq!(rig.state.phase, CombatPhase::Idle);

        // Следующий refresh не видит "атаки", которой не было
        assert_eq!(refresh_attack(&mut rig.attacker(), 1.0 / 60.0, 10.0, &mut transport), RefreshOutcome::Idle);
        assert!(transport.facts().is_empty());
    }

    #[test]
    fn test_unknown_montage_rejected_before_broadcast() {
        let index = index();
        let mut transport = RecordingTransport::new();
        let mut rig = Rig::new(NetRole::AutonomousProxy);
        let mut unknown = params(0.0);
        unknown.montage = MontageId::new("no_such_montage");

        let result = start_attack(&mut rig.attacker(), Some(unknown.clone()), &index, &mut transport);
        assert_eq!(result, Err(StartRejection::NoMontage));
        assert!(transport.intents().is_empty());
        assert!(!rig.movement.locked);

        let mut server = Rig::new(NetRole::Authority);
        let result = server_start_attack(&mut server.attacker(), &unknown, &index, &mut transport);
        assert_eq!(result, Err(StartRejection::NoMontage));
        assert!(transport.facts().is_empty());
    }

    #[test]
    fn test_authority_start_broadcasts_and_plays() {
        let index = index();
        let mut transport = RecordingTransport::new();
        let mut rig = Rig::new(NetRole::Authority);

        let started = start_attack(&mut rig.attacker(), Some(params(45.0)), &index, &mut transport);
        assert!(started.is_ok());

        assert_eq!(
            transport.facts(),
            vec![ReplicationFact::AttackStarted { actor: ACTOR, params: params(45.0) }]
        );
        assert!(transport.intents().is_empty());
        assert!(rig.movement.locked);
        assert_eq!(rig.movement.mode, MovementMode::Custom);
        assert!(rig.action.is(LocomotionActionKind::PrimaryAction));
        assert!(rig.player.is_playing(&MontageId::new("rf_cross_medium_a")));
        assert_eq!(rig.state.phase, CombatPhase::Attacking);
        assert_eq!(rig.state.target_yaw, 45.0);
        assert_eq!(rig.state.last_montage, Some(MontageId::new("rf_cross_medium_a")));
    }

    #[test]
    fn test_second_start_while_playing_is_rejected() {
        let index = index();
        let mut transport = RecordingTransport::new();
        let mut rig = Rig::new(NetRole::Authority);

        assert!(start_attack(&mut rig.attacker(), Some(params(0.0)), &index, &mut transport).is_ok());
        // Другой монтаж, но тот же primary action ещё играет
        let mut other = params(0.0);
        other.montage = MontageId::new("rf_hook_medium");
        let second = start_attack(&mut rig.attacker(), Some(other), &index, &mut transport);

        assert_eq!(second, Err(StartRejection::NotAllowed));
        assert_eq!(transport.facts().len(), 1);
        assert!(rig.player.is_playing(&MontageId::new("rf_cross_medium_a")));
    }

    #[test]
    fn test_autonomous_proxy_predicts_and_sends_intent() {
        let index = index();
        let mut transport = RecordingTransport::new();
        let mut proxy = Rig::new(NetRole::AutonomousProxy);

        assert!(start_attack(&mut proxy.attacker(), Some(params(10.0)), &index, &mut transport).is_ok());
        assert!(proxy.player.is_playing_any());
        assert!(transport.facts().is_empty());
        assert_eq!(
            transport.intents(),
            vec![ReplicationIntent::StartAttack { actor: ACTOR, params: params(10.0) }]
        );

        // Authority принимает intent и рассылает fact
        let mut server = Rig::new(NetRole::Authority);
        assert!(server_start_attack(&mut server.attacker(), &params(10.0), &index, &mut transport).is_ok());
        assert_eq!(transport.facts().len(), 1);
        assert!(server.player.is_playing_any());

        // Эхо fact'а на инициаторе отбрасывается predicate'ом
        let echo = start_attack_implementation(&mut proxy.attacker(), &params(10.0), &index);
        assert_eq!(echo, Err(StartRejection::NotAllowed));
    }

    #[test]
    fn test_server_ignores_intent_on_proxy() {
        let index = index();
        let mut transport = RecordingTransport::new();
        let mut rig = Rig::new(NetRole::SimulatedProxy);

        let result = server_start_attack(&mut rig.attacker(), &params(0.0), &index, &mut transport);
        assert_eq!(result, Err(StartRejection::NoAuthority));
        assert!(transport.facts().is_empty());
    }

    #[test]
    fn test_allowed_after_montage_finished() {
        let mut action = LocomotionAction(Some(LocomotionActionKind::PrimaryAction));
        let player = MontagePlayer::default();
        assert!(is_attack_allowed_to_start(&action, &player));

        action.0 = Some(LocomotionActionKind::Rolling);
        assert!(!is_attack_allowed_to_start(&action, &player));
    }

    #[test]
    fn test_refresh_stops_when_action_changes() {
        let index = index();
        let mut transport = RecordingTransport::new();
        let mut rig = Rig::new(NetRole::Authority);
        assert!(start_attack(&mut rig.attacker(), Some(params(0.0)), &index, &mut transport).is_ok());
        transport.clear();

        rig.action.0 = None;
        let outcome = refresh_attack(&mut rig.attacker(), 1.0 / 60.0, 10.0, &mut transport);

        assert_eq!(
            outcome,
            RefreshOutcome::Stopped(StopOutcome { hook_fired: true, trace_was_open: false })
        );
        assert!(!rig.movement.locked);
        assert_eq!(rig.movement.mode, MovementMode::Walking);
        assert!(!rig.player.is_playing_any());
        assert_eq!(rig.state.phase, CombatPhase::Idle);
        assert_eq!(transport.facts(), vec![ReplicationFact::StateResync { actor: ACTOR }]);

        // Повторный refresh: no-op, без лишнего resync
        assert_eq!(refresh_attack(&mut rig.attacker(), 1.0 / 60.0, 10.0, &mut transport), RefreshOutcome::Idle);
        assert_eq!(transport.facts().len(), 1);
    }

    #[test]
    fn test_interrupt_inside_trace_window() {
        let index = index();
        let mut transport = RecordingTransport::new();
        let mut rig = Rig::new(NetRole::AutonomousProxy);
        assert!(start_attack(&mut rig.attacker(), Some(params(0.0)), &index, &mut transport).is_ok());
        rig.player.advance(0.3);

        rig.action.0 = Some(LocomotionActionKind::Rolling);
        let outcome = refresh_attack(&mut rig.attacker(), 1.0 / 60.0, 10.0, &mut transport);

        assert_eq!(
            outcome,
            RefreshOutcome::Stopped(StopOutcome { hook_fired: true, trace_was_open: true })
        );
        // Не authority → resync не шлём
        assert!(transport.facts().is_empty());
    }

    #[test]
    fn test_refresh_rotates_towards_target_yaw() {
        let index = index();
        let mut transport = RecordingTransport::new();
        let mut rig = Rig::new(NetRole::Authority);
        assert!(start_attack(&mut rig.attacker(), Some(params(90.0)), &index, &mut transport).is_ok());

        let mut previous = 0.0;
        for _ in 0..30 {
            match refresh_attack(&mut rig.attacker(), 1.0 / 60.0, 10.0, &mut transport) {
                RefreshOutcome::Rotated(yaw) => {
                    assert!(yaw > previous);
                    previous = yaw;
                }
                other => panic!("unexpected outcome {other:?}"),
            }
        }
        assert!(previous > 80.0 && previous < 90.0);
        assert!((yaw_of(rig.transform.rotation) - previous).abs() < 1e-3);
    }

    #[test]
    fn test_interpolate_yaw() {
        let step = interpolate_yaw(0.0, 90.0, 1.0 / 60.0, 10.0);
        let expected = 90.0 * (1.0 - (-10.0f32 / 60.0).exp());
        assert!((step - expected).abs() < 1e-4);

        // Кратчайшая дуга через ±180
        let wrapped = interpolate_yaw(170.0, -170.0, 1.0, 10.0);
        assert!(wrapped > 170.0 || wrapped < -170.0);

        // speed ≤ 0 → snap
        assert_eq!(interpolate_yaw(0.0, 270.0, 0.1, 0.0), -90.0);
    }
}
