//! Montage: playable анимационный unit + минимальный playback collaborator.
//!
//! Blend'инг и сама анимация: дело хоста. Здесь только тайминг:
//! позиция, play rate, окно attack trace (аналог anim notify state).

use bevy::math::FloatExt;
use bevy::prelude::*;
use serde::{Deserialize, Serialize};

/// Ссылка на анимационный asset
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Reflect, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MontageId(pub String);

impl MontageId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for MontageId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Активное окно удара внутри монтажа (секунды от начала)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TraceWindow {
    pub begin: f32,
    pub end: f32,
}

impl TraceWindow {
    pub fn contains(&self, position: f32) -> bool {
        position >= self.begin && position < self.end
    }
}

/// Playable монтаж + reference-height mapping
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MontageInfo {
    pub id: MontageId,
    /// Длина монтажа при play rate = 1 (секунды)
    pub duration: f32,
    pub blend_in_curve: Option<String>,
    pub interpolation_curve: Option<String>,
    pub start_relative_location: (f32, f32, f32),
    /// Домен mapping'а (min, max высота)
    pub reference_height: (f32, f32),
    /// Start time на границах домена
    pub start_time: (f32, f32),
    /// Play rate на границах домена
    pub play_rate: (f32, f32),
    pub trace_window: Option<TraceWindow>,
}

impl Default for MontageInfo {
    fn default() -> Self {
        Self {
            id: MontageId::default(),
            duration: 1.0,
            blend_in_curve: None,
            interpolation_curve: None,
            start_relative_location: (-65.0, 0.0, -100.0),
            reference_height: (50.0, 100.0),
            start_time: (0.5, 0.0),
            play_rate: (1.0, 1.0),
            trace_window: None,
        }
    }
}

impl MontageInfo {
    pub fn new(id: impl Into<String>, duration: f32) -> Self {
        Self {
            id: MontageId::new(id),
            duration,
            ..default()
        }
    }

    pub fn with_trace_window(mut self, begin: f32, end: f32) -> Self {
        self.trace_window = Some(TraceWindow { begin, end });
        self
    }

    pub fn start_time_for_height(&self, height: f32) -> f32 {
        map_range_clamped(self.reference_height, self.start_time, height)
    }

    pub fn play_rate_for_height(&self, height: f32) -> f32 {
        map_range_clamped(self.reference_height, self.play_rate, height)
    }
}

/// Piecewise-linear mapping, вход клампится к домену
pub fn map_range_clamped(input: (f32, f32), output: (f32, f32), value: f32) -> f32 {
    let (from, to) = input;
    let span = to - from;
    if span.abs() <= f32::EPSILON {
        return if value < from { output.0 } else { output.1 };
    }

    let t = ((value - from) / span).clamp(0.0, 1.0);
    output.0.lerp(output.1, t)
}

/// Что случилось с монтажом за тик
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MontageEvent {
    TraceWindowOpened,
    TraceWindowClosed,
    Finished,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlayingMontage {
    pub id: MontageId,
    pub position: f32,
    pub play_rate: f32,
    pub duration: f32,
    pub trace_window: Option<TraceWindow>,
    pub trace_open: bool,
    /// Окно уже отработало в этом проигрывании
    pub trace_done: bool,
}

/// Attack montage playback на персонаже
#[derive(Component, Debug, Clone, Default)]
pub struct MontagePlayer {
    current: Option<PlayingMontage>,
}

impl MontagePlayer {
    /// Запускает монтаж (заменяя текущий). false если play rate/длина невалидны.
    pub fn play(&mut self, info: &MontageInfo, play_rate: f32, start_position: f32) -> bool {
        if play_rate <= 0.0 || info.duration <= 0.0 {
            return false;
        }

        let position = start_position.clamp(0.0, info.duration);
        self.current = Some(PlayingMontage {
            id: info.id.clone(),
            position,
            play_rate,
            duration: info.duration,
            trace_window: info.trace_window,
            trace_open: false,
            // Старт после окна: notify уже пропущен
            trace_done: info.trace_window.is_some_and(|window| position >= window.end),
        });
        true
    }

    /// Останавливает монтаж. true если было открыто trace окно.
    pub fn stop(&mut self) -> bool {
        self.current.take().map(|playing| playing.trace_open).unwrap_or(false)
    }

    pub fn current(&self) -> Option<&PlayingMontage> {
        self.current.as_ref()
    }

    pub fn is_playing(&self, id: &MontageId) -> bool {
        self.current.as_ref().is_some_and(|playing| &playing.id == id)
    }

    pub fn is_playing_any(&self) -> bool {
        self.current.is_some()
    }

    /// Продвигает playback на dt, возвращает события в порядке возникновения
    pub fn advance(&mut self, delta: f32) -> Vec<MontageEvent> {
        let mut events = Vec::new();
        let Some(playing) = self.current.as_mut() else {
            return events;
        };

        playing.position += delta * playing.play_rate;

        if let Some(window) = playing.trace_window {
            if !playing.trace_open
                && !playing.trace_done
                && playing.position >= window.begin
                && window.begin < window.end
            {
                playing.trace_open = true;
                events.push(MontageEvent::TraceWindowOpened);
            }
            if playing.trace_open && playing.position >= window.end {
                playing.trace_open = false;
                playing.trace_done = true;
                events.push(MontageEvent::TraceWindowClosed);
            }
        }

        if playing.position >= playing.duration {
            if playing.trace_open {
                events.push(MontageEvent::TraceWindowClosed);
            }
            events.push(MontageEvent::Finished);
            self.current = None;
        }

        events
    }
}
