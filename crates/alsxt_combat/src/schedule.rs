//! Периодические таймеры (attack-trace sweep, target re-evaluation).
//!
//! `RepeatingSchedule` живёт внутри компонента-владельца и тикается из FixedUpdate,
//! поэтому тесты двигают виртуальное время явно через `tick(delta)`.

use bevy::prelude::*;
use std::time::Duration;

/// Отменяемый repeating таймер.
///
/// `None` = не запланирован (cancel handle уже использован или не выдавался).
#[derive(Debug, Clone, Default)]
pub struct RepeatingSchedule {
    timer: Option<Timer>,
}

impl RepeatingSchedule {
    /// (Пере)запускает таймер с нуля.
    pub fn start(&mut self, interval: Duration) {
        self.timer = Some(Timer::new(interval, TimerMode::Repeating));
    }

    pub fn cancel(&mut self) {
        self.timer = None;
    }

    pub fn is_scheduled(&self) -> bool {
        self.timer.is_some()
    }

    pub fn interval(&self) -> Option<Duration> {
        self.timer.as_ref().map(|timer| timer.duration())
    }

    /// Продвигает таймер, возвращает сколько раз он сработал за этот delta.
    ///
    /// Вызывающая сторона обычно схлопывает `n > 0` в один callback за тик.
    pub fn tick(&mut self, delta: Duration) -> u32 {
        let Some(timer) = self.timer.as_mut() else {
            return 0;
        };

        timer.tick(delta);
        timer.times_finished_this_tick()
    }
}
