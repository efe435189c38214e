//! Default-mode cycling.
//!
//! Tracks which screen the user has toggled to and advances it, either
//! manually (button press) or on the auto-cycle timer. The eligible set
//! is rebuilt from config on every step, so disabling a mode mid-flight
//! simply skips it on the next advance.

use crate::config::AppConfig;
use crate::display::kinds::DisplayStateKind;

/// Floor for the auto-cycle period; faster than this is unreadable.
pub const MIN_AUTO_CYCLE_SEC: u32 = 3;

/// All cycle-eligible modes, in toggle order. Glucose and Time are
/// always present; the rest join when enabled in config.
const CYCLE_ORDER: [DisplayStateKind; 7] = [
    DisplayStateKind::Glucose,
    DisplayStateKind::Time,
    DisplayStateKind::Weather,
    DisplayStateKind::Timer,
    DisplayStateKind::Stopwatch,
    DisplayStateKind::SystemMonitor,
    DisplayStateKind::Countdown,
];

#[derive(Debug)]
pub struct ModeCycler {
    current: DisplayStateKind,
    /// Monotonic ms of the last advance (manual or automatic).
    last_change_ms: u64,
    /// The sysmon screen has something to show. Pushed in from outside
    /// (the metrics feed is not this module's concern); an enabled but
    /// empty sysmon stays out of the rotation.
    sysmon_has_data: bool,
}

impl Default for ModeCycler {
    fn default() -> Self {
        Self::new()
    }
}

impl ModeCycler {
    pub fn new() -> Self {
        Self {
            current: DisplayStateKind::Glucose,
            last_change_ms: 0,
            sysmon_has_data: false,
        }
    }

    pub fn set_sysmon_has_data(&mut self, has_data: bool) {
        self.sysmon_has_data = has_data;
    }

    /// The mode the user is currently parked on.
    pub fn current(&self) -> DisplayStateKind {
        self.current
    }

    /// Advance to the next enabled mode. Resets the auto-cycle timer.
    pub fn next(&mut self, cfg: &AppConfig, now_ms: u64) -> DisplayStateKind {
        self.step(cfg, now_ms, 1)
    }

    /// Step back to the previous enabled mode. Resets the auto-cycle timer.
    pub fn prev(&mut self, cfg: &AppConfig, now_ms: u64) -> DisplayStateKind {
        self.step(cfg, now_ms, CYCLE_ORDER.len() - 1)
    }

    /// Advance automatically when auto-cycle is enabled and the period
    /// (floored to [`MIN_AUTO_CYCLE_SEC`]) has elapsed. Returns the new
    /// mode when a change happened.
    pub fn tick(&mut self, cfg: &AppConfig, now_ms: u64) -> Option<DisplayStateKind> {
        if !cfg.auto_cycle_enabled {
            return None;
        }
        let period_ms = u64::from(cfg.auto_cycle_sec.max(MIN_AUTO_CYCLE_SEC)) * 1000;
        if now_ms.saturating_sub(self.last_change_ms) < period_ms {
            return None;
        }
        Some(self.step(cfg, now_ms, 1))
    }

    fn step(&mut self, cfg: &AppConfig, now_ms: u64, by: usize) -> DisplayStateKind {
        let start = CYCLE_ORDER
            .iter()
            .position(|&m| m == self.current)
            .unwrap_or(0);
        // At most one full lap; Glucose is always eligible so this
        // terminates on it in the worst case.
        for i in 1..=CYCLE_ORDER.len() {
            let candidate = CYCLE_ORDER[(start + by * i) % CYCLE_ORDER.len()];
            if self.mode_enabled(candidate, cfg) {
                self.current = candidate;
                break;
            }
        }
        self.last_change_ms = now_ms;
        self.current
    }

    fn mode_enabled(&self, mode: DisplayStateKind, cfg: &AppConfig) -> bool {
        match mode {
            DisplayStateKind::Glucose | DisplayStateKind::Time => true,
            DisplayStateKind::Weather => cfg.weather_enabled,
            DisplayStateKind::Timer => cfg.timer_enabled,
            DisplayStateKind::Stopwatch => cfg.stopwatch_enabled,
            DisplayStateKind::SystemMonitor => cfg.sysmon_enabled && self.sysmon_has_data,
            DisplayStateKind::Countdown => cfg.countdown_enabled,
            _ => false,
        }
    }
}
