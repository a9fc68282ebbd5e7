//! Tests for attack data index.

#[cfg(test)]
mod tests {
    use super::super::attack_data::*;
    use super::super::montage::MontageId;
    use crate::components::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;
    use std::collections::HashSet;

    const UNARMED: &str = include_str!("../../assets/unarmed_attacks.ron");

    fn index() -> AttackDataIndex {
        AttackDataIndex::from_ron_str(UNARMED).expect("bundled attack data is valid")
    }

    #[test]
    fn test_bundled_data_loads() {
        let index = index();
        assert_eq!(index.montage_count(), 17);
        assert_eq!(
            index
                .candidates(AttackType::RightFist, AttackStrength::Medium, AttackStance::Standing)
                .map(|set| set.len()),
            Some(3)
        );
    }

    #[test]
    fn test_singleton_set_always_selected() {
        let index = index();
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let only = MontageId::new("rf_uppercut_crouched");

        for _ in 0..50 {
            let montage = index
                .select_montage(AttackType::RightFist, AttackStrength::Medium, AttackStance::Crouched, Some(&only), &mut rng)
                .expect("singleton");
            // Даже если это последний сыгранный: он единственный
            assert_eq!(montage.id, only);
        }
    }

    #[test]
    fn test_last_played_is_excluded() {
        let index = index();
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        let last = MontageId::new("rf_cross_medium_a");

        for _ in 0..100 {
            let montage = index
                .select_montage(AttackType::RightFist, AttackStrength::Medium, AttackStance::Standing, Some(&last), &mut rng)
                .expect("candidates exist");
            assert_ne!(montage.id, last);
        }
    }

    #[test]
    fn test_selection_covers_all_remaining_candidates() {
        let index = index();
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let mut seen = HashSet::new();

        for _ in 0..200 {
            let montage = index
                .select_montage(AttackType::RightFist, AttackStrength::Medium, AttackStance::Standing, None, &mut rng)
                .expect("candidates exist");
            seen.insert(montage.id.clone());
        }
        assert_eq!(seen.len(), 3);
    }

    #[test]
    fn test_selection_is_deterministic_for_seed() {
        let index = index();
        let pick = |seed| {
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            (0..10)
                .map(|_| {
                    index
                        .select_montage(AttackType::LeftFist, AttackStrength::Medium, AttackStance::Standing, None, &mut rng)
                        .map(|montage| montage.id.clone())
                })
                .collect::<Vec<_>>()
        };
        assert_eq!(pick(99), pick(99));
    }

    #[test]
    fn test_missing_levels_return_none() {
        let index = index();
        let mut rng = ChaCha8Rng::seed_from_u64(0);

        assert!(index
            .select_montage(AttackType::RightKick, AttackStrength::Medium, AttackStance::Standing, None, &mut rng)
            .is_none());
        assert!(index
            .select_montage(AttackType::LeftFist, AttackStrength::Heavy, AttackStance::Standing, None, &mut rng)
            .is_none());
        assert!(index
            .select_montage(AttackType::LeftFist, AttackStrength::Medium, AttackStance::InAir, None, &mut rng)
            .is_none());
    }

    #[test]
    fn test_synced_response_and_fallen_lookups() {
        let index = index();
        let mut rng = ChaCha8Rng::seed_from_u64(3);

        let synced = index
            .select_synced(AttackType::RightFist, AttackStrength::Medium, AttackStance::Standing, &mut rng)
            .expect("synced pair");
        assert_eq!(synced.target, MontageId::new("rf_takedown_victim"));

        let response = index
            .select_response(
                AttackType::RightFist,
                AttackStrength::Medium,
                ImpactSide::Back,
                ImpactForm::Push,
                HealthBand::Healthy,
                &mut rng,
            )
            .expect("response");
        assert_eq!(response.id, MontageId::new("react_back_push"));

        let fallen = index
            .fallen_animation(AttackType::RightFist, AttackStrength::Heavy, ImpactSide::Front, ImpactForm::Blow)
            .expect("fallen");
        assert_eq!(fallen.get_up, vec![MontageId::new("get_up_front")]);

        let damage = index.unarmed_damage(AttackType::RightFist, AttackStrength::Heavy).expect("damage");
        assert_eq!(damage.impact_form, Some(ImpactForm::Blow));
    }

    #[test]
    fn test_unknown_montage_reference_rejected() {
        let source = r#"(
            montages: [(id: "a", duration: 1.0)],
            attack_types: [(attack_type: RightFist, strengths: [
                (strength: Light, stances: [(stance: Standing, montages: ["a", "ghost"])]),
            ])],
        )"#;

        let result = AttackDataIndex::from_ron_str(source);
        assert!(matches!(result, Err(AttackDataError::UnknownMontage { .. })));
    }

    #[test]
    fn test_empty_candidate_set_rejected() {
        let source = r#"(
            attack_types: [(attack_type: RightFist, strengths: [
                (strength: Light, stances: [(stance: Standing, montages: [])]),
            ])],
        )"#;

        let result = AttackDataIndex::from_ron_str(source);
        assert!(matches!(result, Err(AttackDataError::EmptyCandidates { .. })));
    }

    #[test]
    fn test_duplicate_montage_rejected() {
        let source = r#"(montages: [(id: "a", duration: 1.0), (id: "a", duration: 2.0)])"#;
        assert!(matches!(
            AttackDataIndex::from_ron_str(source),
            Err(AttackDataError::DuplicateMontage(_))
        ));
    }

    #[test]
    fn test_trace_window_outside_montage_rejected() {
        let source = r#"(montages: [(id: "a", duration: 0.5, trace_window: (begin: 0.2, end: 0.9))])"#;
        assert!(matches!(
            AttackDataIndex::from_ron_str(source),
            Err(AttackDataError::InvalidMontage { .. })
        ));
    }

    #[test]
    fn test_unknown_stance_tag_rejected_at_load() {
        let source = r#"(attack_types: [(attack_type: RightFist, strengths: [
            (strength: Light, stances: [(stance: Prone, montages: [])]),
        ])])"#;
        assert!(matches!(AttackDataIndex::from_ron_str(source), Err(AttackDataError::Parse(_))));
    }
}
