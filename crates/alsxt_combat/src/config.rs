//! Combat settings (targeting + attack tunables), загружаются из RON.
//!
//! Все поля имеют дефолты, RON может переопределять только часть.

use bevy::prelude::*;
use ron::Options;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

use crate::components::{AttackStrength, AttackType, OverlayMode};
use crate::physics::TraceChannel;

const DEFAULT_TARGET_TRACE_INTERVAL: f32 = 0.001;
const DEFAULT_ATTACK_TRACE_INTERVAL: f32 = 0.1;

/// Период таймера в секундах; отрицательный, NaN или нулевой → fallback
fn interval_or(seconds: f32, fallback: f32) -> Duration {
    Duration::try_from_secs_f32(seconds)
        .ok()
        .filter(|interval| !interval.is_zero())
        .unwrap_or_else(|| Duration::from_secs_f32(fallback))
}

/// Ошибки загрузки конфигов
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse RON: {0}")]
    Parse(#[from] ron::error::SpannedError),
    #[error("invalid setting `{field}`: {reason}")]
    InvalidSetting { field: &'static str, reason: &'static str },
}

/// RON options: IMPLICIT_SOME, чтобы Option поля писались без `Some(...)`
pub(crate) fn ron_options() -> Options {
    Options::default().with_default_extension(ron::extensions::Extensions::IMPLICIT_SOME)
}

/// Главный resource настроек боя
#[derive(Resource, Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CombatSettings {
    pub targeting: TargetingSettings,
    pub attack: AttackSettings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TargetingSettings {
    /// Дальность захвата новой цели
    pub max_lock_distance: f32,
    /// Дальность удержания уже захваченной цели
    pub max_initial_lock_distance: f32,
    /// Смещение начала sweep вперёд от view origin
    pub trace_forward_offset: f32,
    pub trace_length: f32,
    /// Half extents коробки (right, up, forward)
    pub trace_area_half_size: (f32, f32, f32),
    /// View origin = позиция актора + up * view_height
    pub view_height: f32,
    pub unlock_when_target_is_obstructed: bool,
    /// Период re-evaluation (секунды), ~1 ms = "следующий тик"
    pub target_trace_interval: f32,
    pub highlight_parameter: String,
    pub targetable_overlay_modes: Vec<OverlayMode>,
    pub target_channels: Vec<TraceChannel>,
    pub obstruction_channels: Vec<TraceChannel>,
}

impl Default for TargetingSettings {
    fn default() -> Self {
        Self {
            max_lock_distance: 1000.0,
            max_initial_lock_distance: 1200.0,
            trace_forward_offset: 150.0,
            trace_length: 200.0,
            trace_area_half_size: (300.0, 150.0, 500.0),
            view_height: 60.0,
            unlock_when_target_is_obstructed: true,
            target_trace_interval: DEFAULT_TARGET_TRACE_INTERVAL,
            highlight_parameter: "Highlight".to_string(),
            targetable_overlay_modes: vec![OverlayMode::Default],
            target_channels: vec![TraceChannel::Pawn],
            obstruction_channels: vec![TraceChannel::WorldStatic, TraceChannel::WorldDynamic],
        }
    }
}

impl TargetingSettings {
    pub fn half_extents(&self) -> Vec3 {
        let (right, up, forward) = self.trace_area_half_size;
        Vec3::new(right, up, forward)
    }

    pub fn trace_interval(&self) -> Duration {
        interval_or(self.target_trace_interval, DEFAULT_TARGET_TRACE_INTERVAL)
    }

    pub fn is_targetable(&self, overlay: OverlayMode) -> bool {
        self.targetable_overlay_modes.contains(&overlay)
    }
}

/// Пороги энергии для ImpactForm (Tap < push ≤ Push < blow ≤ Blow)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImpactFormThresholds {
    pub push: f32,
    pub blow: f32,
}

impl Default for ImpactFormThresholds {
    fn default() -> Self {
        Self { push: 100.0, blow: 300.0 }
    }
}

/// Параметры атаки по primary action input
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PrimaryActionDefaults {
    pub attack_type: AttackType,
    pub strength: AttackStrength,
    pub base_damage: f32,
    pub play_rate: f32,
}

impl Default for PrimaryActionDefaults {
    fn default() -> Self {
        Self {
            attack_type: AttackType::RightFist,
            strength: AttackStrength::Medium,
            base_damage: 0.10,
            play_rate: 1.3,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AttackSettings {
    /// Период attack-trace sweep (секунды)
    pub attack_trace_interval: f32,
    pub attack_trace_channels: Vec<TraceChannel>,
    /// Sphere sweep вперёд для поиска potential target
    pub potential_target_distance: f32,
    pub potential_target_radius: f32,
    /// Riposte если цель блокировала меньше N секунд назад
    pub riposte_window: f32,
    /// Special если consecutive hits > N
    pub special_consecutive_hits: u32,
    pub impact_base_energy: f32,
    pub impact_form_thresholds: ImpactFormThresholds,
    pub rotate_to_input_on_start: bool,
    /// Скорость exponential-decay yaw интерполяции (1/сек), ≤ 0 = snap
    pub rotation_interpolation_speed: f32,
    pub primary_action: PrimaryActionDefaults,
    /// Fallback unarmed trace без StrikeSockets: высота, вылет вперёд, радиус
    pub unarmed_trace_height: f32,
    pub unarmed_reach: f32,
    pub unarmed_trace_radius: f32,
}

impl Default for AttackSettings {
    fn default() -> Self {
        Self {
            attack_trace_interval: DEFAULT_ATTACK_TRACE_INTERVAL,
            attack_trace_channels: vec![TraceChannel::Pawn, TraceChannel::PhysicsBody],
            potential_target_distance: 100.0,
            potential_target_radius: 50.0,
            riposte_window: 2.0,
            special_consecutive_hits: 5,
            impact_base_energy: 50.0,
            impact_form_thresholds: ImpactFormThresholds::default(),
            rotate_to_input_on_start: true,
            rotation_interpolation_speed: 10.0,
            primary_action: PrimaryActionDefaults::default(),
            unarmed_trace_height: 100.0,
            unarmed_reach: 80.0,
            unarmed_trace_radius: 15.0,
        }
    }
}

impl AttackSettings {
    pub fn trace_interval(&self) -> Duration {
        interval_or(self.attack_trace_interval, DEFAULT_ATTACK_TRACE_INTERVAL)
    }
}

impl CombatSettings {
    pub fn from_ron_str(source: &str) -> Result<Self, ConfigError> {
        let settings: CombatSettings = ron_options().from_str(source)?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let source = std::fs::read_to_string(path)?;
        Self::from_ron_str(&source)
    }

    /// Load-time валидация (в runtime значения уже корректны)
    pub fn validate(&self) -> Result<(), ConfigError> {
        let targeting = &self.targeting;
        let attack = &self.attack;

        let positive: [(&'static str, f32); 6] = [
            ("targeting.max_lock_distance", targeting.max_lock_distance),
            ("targeting.max_initial_lock_distance", targeting.max_initial_lock_distance),
            ("targeting.target_trace_interval", targeting.target_trace_interval),
            ("attack.attack_trace_interval", attack.attack_trace_interval),
            ("attack.potential_target_distance", attack.potential_target_distance),
            ("attack.primary_action.play_rate", attack.primary_action.play_rate),
        ];
        for (field, value) in positive {
            if !(value > 0.0) {
                return Err(ConfigError::InvalidSetting { field, reason: "must be positive" });
            }
        }

        let (right, up, forward) = targeting.trace_area_half_size;
        if right < 0.0 || up < 0.0 || forward < 0.0 {
            return Err(ConfigError::InvalidSetting {
                field: "targeting.trace_area_half_size",
                reason: "half extents must be non-negative",
            });
        }

        if attack.potential_target_radius < 0.0 || attack.unarmed_trace_radius < 0.0 {
            return Err(ConfigError::InvalidSetting {
                field: "attack.trace radius",
                reason: "must be non-negative",
            });
        }

        let thresholds = attack.impact_form_thresholds;
        if thresholds.push > thresholds.blow {
            return Err(ConfigError::InvalidSetting {
                field: "attack.impact_form_thresholds",
                reason: "push threshold must not exceed blow threshold",
            });
        }

        if targeting.target_channels.is_empty() || attack.attack_trace_channels.is_empty() {
            return Err(ConfigError::InvalidSetting {
                field: "trace channels",
                reason: "at least one channel is required",
            });
        }

        Ok(())
    }
}
