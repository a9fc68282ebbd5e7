//! Attack Data Index: attack type → strength → stance → набор монтажей.
//!
//! Строится один раз из RON документа, валидируется целиком на загрузке,
//! дальше immutable. Все lookup'ы возвращают Option: "нет анимации": не ошибка,
//! вызывающий просто отменяет старт атаки.

use bevy::prelude::*;
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::path::Path;
use thiserror::Error;

use super::montage::{MontageId, MontageInfo};
use crate::components::{
    AttackStance, AttackStrength, AttackType, DamageType, HealthBand, ImpactForm, ImpactSide,
};

// ============================================================================
// RON schema
// ============================================================================

/// Корневой документ attack data
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AttackDataAsset {
    pub montages: Vec<MontageInfo>,
    pub attack_types: Vec<AttackTypeEntry>,
    pub unarmed_damage: Vec<DamageInfoEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttackTypeEntry {
    pub attack_type: AttackType,
    pub strengths: Vec<StrengthEntry>,
    #[serde(default)]
    pub synced: Vec<SyncedMontageEntry>,
    #[serde(default)]
    pub fallen_animations: Vec<FallenAnimationEntry>,
    #[serde(default)]
    pub response_animations: Vec<ResponseAnimationEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StrengthEntry {
    pub strength: AttackStrength,
    pub stances: Vec<StanceEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StanceEntry {
    pub stance: AttackStance,
    pub montages: Vec<MontageId>,
}

/// Парный монтаж: атакующий + жертва
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncedMontageEntry {
    pub strength: AttackStrength,
    pub stance: AttackStance,
    pub attacker: MontageId,
    pub target: MontageId,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FallenAnimationEntry {
    pub strength: AttackStrength,
    pub side: ImpactSide,
    pub form: ImpactForm,
    pub fallen_pose: MontageId,
    #[serde(default)]
    pub get_up: Vec<MontageId>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseAnimationEntry {
    pub strength: AttackStrength,
    pub side: ImpactSide,
    pub form: ImpactForm,
    pub health: HealthBand,
    pub montages: Vec<MontageId>,
}

/// Damage info по (attack type, strength)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DamageInfoEntry {
    pub attack_type: AttackType,
    pub strength: AttackStrength,
    pub base_damage: f32,
    pub damage_type: DamageType,
    /// Переопределяет ImpactForm, выведенный из энергии
    #[serde(default)]
    pub impact_form: Option<ImpactForm>,
}

// ============================================================================
// Errors
// ============================================================================

#[derive(Debug, Error)]
pub enum AttackDataError {
    #[error("failed to read attack data: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse attack data RON: {0}")]
    Parse(#[from] ron::error::SpannedError),
    #[error("montage `{0}` defined more than once")]
    DuplicateMontage(MontageId),
    #[error("montage `{montage}` is invalid: {reason}")]
    InvalidMontage { montage: MontageId, reason: &'static str },
    #[error("unknown montage `{montage}` referenced by {context}")]
    UnknownMontage { montage: MontageId, context: String },
    #[error("duplicate entry {0}")]
    DuplicateKey(String),
    #[error("empty montage set for {attack_type:?}/{strength:?}/{stance:?}")]
    EmptyCandidates {
        attack_type: AttackType,
        strength: AttackStrength,
        stance: AttackStance,
    },
}

// ============================================================================
// Index
// ============================================================================

type StanceTable = HashMap<AttackStance, Vec<MontageId>>;
type StrengthTable = HashMap<AttackStrength, StanceTable>;

/// Immutable validated attack data (Resource)
#[derive(Resource, Debug, Clone, Default)]
pub struct AttackDataIndex {
    montages: HashMap<MontageId, MontageInfo>,
    regular: HashMap<AttackType, StrengthTable>,
    synced: HashMap<(AttackType, AttackStrength, AttackStance), Vec<SyncedMontageEntry>>,
    fallen: HashMap<AttackType, Vec<FallenAnimationEntry>>,
    responses: HashMap<AttackType, Vec<ResponseAnimationEntry>>,
    unarmed_damage: HashMap<(AttackType, AttackStrength), DamageInfoEntry>,
}

/// Unarmed attack data, поставляется вместе с crate
pub const BUNDLED_ATTACK_DATA: &str = include_str!("../../assets/unarmed_attacks.ron");

impl AttackDataIndex {
    pub fn bundled() -> Result<Self, AttackDataError> {
        Self::from_ron_str(BUNDLED_ATTACK_DATA)
    }

    pub fn from_ron_str(source: &str) -> Result<Self, AttackDataError> {
        let asset: AttackDataAsset = crate::config::ron_options().from_str(source)?;
        Self::from_asset(asset)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, AttackDataError> {
        let source = std::fs::read_to_string(path)?;
        Self::from_ron_str(&source)
    }

    /// Валидирует документ и строит index
    pub fn from_asset(asset: AttackDataAsset) -> Result<Self, AttackDataError> {
        let mut index = AttackDataIndex::default();

        for montage in asset.montages {
            validate_montage(&montage)?;
            if index.montages.contains_key(&montage.id) {
                return Err(AttackDataError::DuplicateMontage(montage.id));
            }
            index.montages.insert(montage.id.clone(), montage);
        }

        for entry in asset.attack_types {
            let attack_type = entry.attack_type;
            if index.regular.contains_key(&attack_type) {
                return Err(AttackDataError::DuplicateKey(format!("attack type {:?}", attack_type)));
            }

            let mut strengths = StrengthTable::new();
            for strength_entry in entry.strengths {
                let strength = strength_entry.strength;
                if strengths.contains_key(&strength) {
                    return Err(AttackDataError::DuplicateKey(format!("{:?}/{:?}", attack_type, strength)));
                }

                let mut stances = StanceTable::new();
                for stance_entry in strength_entry.stances {
                    let stance = stance_entry.stance;
                    let context = format!("{:?}/{:?}/{:?}", attack_type, strength, stance);
                    if stances.contains_key(&stance) {
                        return Err(AttackDataError::DuplicateKey(context));
                    }
                    if stance_entry.montages.is_empty() {
                        return Err(AttackDataError::EmptyCandidates { attack_type, strength, stance });
                    }

                    {
                        let mut seen = HashSet::new();
                        for montage in &stance_entry.montages {
                            index.require_montage(montage, &context)?;
                            if !seen.insert(montage) {
                                return Err(AttackDataError::DuplicateKey(format!("{} montage `{}`", context, montage)));
                            }
                        }
                    }
                    stances.insert(stance, stance_entry.montages);
                }
                strengths.insert(strength, stances);
            }

            for synced in entry.synced {
                let context = format!("synced {:?}/{:?}/{:?}", attack_type, synced.strength, synced.stance);
                index.require_montage(&synced.attacker, &context)?;
                index.require_montage(&synced.target, &context)?;
                index
                    .synced
                    .entry((attack_type, synced.strength, synced.stance))
                    .or_default()
                    .push(synced);
            }

            for fallen in &entry.fallen_animations {
                let context = format!("fallen animation of {:?}", attack_type);
                index.require_montage(&fallen.fallen_pose, &context)?;
                for get_up in &fallen.get_up {
                    index.require_montage(get_up, &context)?;
                }
            }

            for response in &entry.response_animations {
                let context = format!("response animation of {:?}", attack_type);
                for montage in &response.montages {
                    index.require_montage(montage, &context)?;
                }
            }

            index.fallen.insert(attack_type, entry.fallen_animations);
            index.responses.insert(attack_type, entry.response_animations);
            index.regular.insert(attack_type, strengths);
        }

        for damage in asset.unarmed_damage {
            let key = (damage.attack_type, damage.strength);
            if index.unarmed_damage.insert(key, damage).is_some() {
                return Err(AttackDataError::DuplicateKey(format!("unarmed damage {:?}", key)));
            }
        }

        Ok(index)
    }

    fn require_montage(&self, montage: &MontageId, context: &str) -> Result<(), AttackDataError> {
        if self.montages.contains_key(montage) {
            Ok(())
        } else {
            Err(AttackDataError::UnknownMontage {
                montage: montage.clone(),
                context: context.to_string(),
            })
        }
    }

    pub fn montage(&self, id: &MontageId) -> Option<&MontageInfo> {
        self.montages.get(id)
    }

    /// Упорядоченный набор кандидатов (attack type → strength → stance)
    pub fn candidates(
        &self,
        attack_type: AttackType,
        strength: AttackStrength,
        stance: AttackStance,
    ) -> Option<&[MontageId]> {
        self.regular
            .get(&attack_type)?
            .get(&strength)?
            .get(&stance)
            .map(|montages| montages.as_slice())
    }

    /// Выбор монтажа для атаки.
    ///
    /// Больше одного кандидата: исключаем последний сыгранный этим атакующим,
    /// остаток перемешиваем (Fisher-Yates) и берём равновероятно один.
    /// None если на любом уровне lookup'а нет совпадения.
    pub fn select_montage(
        &self,
        attack_type: AttackType,
        strength: AttackStrength,
        stance: AttackStance,
        last_played: Option<&MontageId>,
        rng: &mut impl Rng,
    ) -> Option<&MontageInfo> {
        let candidates = self.candidates(attack_type, strength, stance)?;
        let chosen = pick_excluding(candidates, last_played, rng)?;
        self.montage(chosen)
    }

    pub fn select_synced(
        &self,
        attack_type: AttackType,
        strength: AttackStrength,
        stance: AttackStance,
        rng: &mut impl Rng,
    ) -> Option<&SyncedMontageEntry> {
        self.synced.get(&(attack_type, strength, stance))?.choose(rng)
    }

    pub fn select_response(
        &self,
        attack_type: AttackType,
        strength: AttackStrength,
        side: ImpactSide,
        form: ImpactForm,
        health: HealthBand,
        rng: &mut impl Rng,
    ) -> Option<&MontageInfo> {
        let entry = self.responses.get(&attack_type)?.iter().find(|entry| {
            entry.strength == strength && entry.side == side && entry.form == form && entry.health == health
        })?;
        let chosen = pick_excluding(&entry.montages, None, rng)?;
        self.montage(chosen)
    }

    pub fn fallen_animation(
        &self,
        attack_type: AttackType,
        strength: AttackStrength,
        side: ImpactSide,
        form: ImpactForm,
    ) -> Option<&FallenAnimationEntry> {
        self.fallen
            .get(&attack_type)?
            .iter()
            .find(|entry| entry.strength == strength && entry.side == side && entry.form == form)
    }

    pub fn unarmed_damage(&self, attack_type: AttackType, strength: AttackStrength) -> Option<&DamageInfoEntry> {
        self.unarmed_damage.get(&(attack_type, strength))
    }

    pub fn montage_count(&self) -> usize {
        self.montages.len()
    }
}

fn validate_montage(montage: &MontageInfo) -> Result<(), AttackDataError> {
    let invalid = |reason| AttackDataError::InvalidMontage {
        montage: montage.id.clone(),
        reason,
    };

    if montage.id.as_str().is_empty() {
        return Err(invalid("empty id"));
    }
    if !(montage.duration > 0.0) {
        return Err(invalid("duration must be positive"));
    }
    if let Some(window) = montage.trace_window {
        if window.begin < 0.0 || window.begin >= window.end || window.end > montage.duration {
            return Err(invalid("trace window must lie inside the montage"));
        }
    }
    if montage.play_rate.0 <= 0.0 || montage.play_rate.1 <= 0.0 {
        return Err(invalid("play rate mapping must be positive"));
    }
    Ok(())
}

/// Ядро выбора: singleton возвращается как есть, иначе exclude + shuffle + uniform pick
fn pick_excluding<'a>(
    candidates: &'a [MontageId],
    exclude: Option<&MontageId>,
    rng: &mut impl Rng,
) -> Option<&'a MontageId> {
    match candidates {
        [] => None,
        [only] => Some(only),
        _ => {
            let mut pool: Vec<&MontageId> = candidates
                .iter()
                .filter(|candidate| Some(*candidate) != exclude)
                .collect();
            pool.shuffle(rng);
            pool.choose(rng).copied()
        }
    }
}
