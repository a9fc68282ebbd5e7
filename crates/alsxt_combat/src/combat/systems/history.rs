//! Receiving side: blocked/landed классификация, reaction lookup, aging истории.

use bevy::prelude::*;

use crate::combat::attack_data::AttackDataIndex;
use crate::combat::events::{AttackBlocked, AttackCollision, AttackLanded, AttackReaction};
use crate::combat::method::CombatHistory;
use crate::components::HealthBand;
use crate::net::CombatProperties;
use crate::DeterministicRng;

/// System: Resolve AttackCollision на стороне защищающегося.
///
/// Blocking → AttackBlocked + record_blocked (серия обнуляется).
/// Иначе → AttackLanded + record_hit + response/fallen анимация из index.
#[allow(clippy::too_many_arguments)]
pub fn resolve_attack_collisions(
    mut collisions: EventReader<AttackCollision>,
    mut histories: Query<&mut CombatHistory>,
    defenders: Query<(Option<&CombatProperties>, Option<&HealthBand>)>,
    index: Res<AttackDataIndex>,
    mut rng: ResMut<DeterministicRng>,
    mut blocked_events: EventWriter<AttackBlocked>,
    mut landed_events: EventWriter<AttackLanded>,
    mut reactions: EventWriter<AttackReaction>,
) {
    for collision in collisions.read() {
        let (properties, health) = defenders.get(collision.target).unwrap_or((None, None));
        let blocked = properties.is_some_and(CombatProperties::is_blocking);

        if let Ok(mut history) = histories.get_mut(collision.attacker) {
            if blocked {
                history.record_blocked(collision.target);
            } else {
                history.record_hit(collision.target);
            }
        }

        if blocked {
            blocked_events.write(AttackBlocked {
                attacker: collision.attacker,
                defender: collision.target,
            });
            reactions.write(AttackReaction {
                defender: collision.target,
                attacker: collision.attacker,
                blocked: true,
                response: None,
                fallen: None,
            });
            crate::logger::log_info(&format!(
                "🛡️ ECS: Attack blocked (attacker: {:?}, defender: {:?})",
                collision.attacker, collision.target
            ));
            continue;
        }

        let result = &collision.result;
        let hit = &result.double_hit;
        let response = index
            .select_response(
                result.attack_type,
                result.strength,
                hit.impact_side,
                hit.impact_form,
                health.copied().unwrap_or_default(),
                &mut rng.rng,
            )
            .map(|montage| montage.id.clone());
        let fallen = index
            .fallen_animation(result.attack_type, result.strength, hit.impact_side, hit.impact_form)
            .map(|entry| entry.fallen_pose.clone());

        landed_events.write(AttackLanded {
            attacker: collision.attacker,
            defender: collision.target,
        });
        crate::logger::log_info(&format!(
            "🩸 ECS: Attack landed (attacker: {:?}, defender: {:?}, response: {:?}, fallen: {:?})",
            collision.attacker, collision.target, response, fallen
        ));
        reactions.write(AttackReaction {
            defender: collision.target,
            attacker: collision.attacker,
            blocked: false,
            response,
            fallen,
        });
    }
}

/// System: Aging счётчиков истории (секунды с последних событий)
pub fn age_combat_history(mut histories: Query<&mut CombatHistory>, time: Res<Time<Fixed>>) {
    let delta = time.delta_secs();
    for mut history in histories.iter_mut() {
        if !history.is_empty() {
            history.age(delta);
        }
    }
}
