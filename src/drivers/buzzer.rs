//! Passive buzzer driver (LEDC PWM).
//!
//! Implements [`BeepPort`]. Beeps are queued, never blocking: `beep`
//! latches the pattern and `update` (called every tick) starts it and
//! toggles the PWM on and off on schedule. Between beeps of a pattern
//! the buzzer pauses for the same duration as the beep itself.

use log::debug;

use crate::app::ports::BeepPort;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Idle,
    On { until_ms: u64 },
    Gap { until_ms: u64 },
}

pub struct Buzzer {
    phase: Phase,
    /// Pattern latched by `beep`, started on the next `update`.
    pending: Option<(u8, u16, u16)>,
    /// Beeps still owed after the current one.
    remaining: u8,
    freq_hz: u16,
    duration_ms: u16,
}

impl Default for Buzzer {
    fn default() -> Self {
        Self::new()
    }
}

impl Buzzer {
    pub fn new() -> Self {
        Self {
            phase: Phase::Idle,
            pending: None,
            remaining: 0,
            freq_hz: 0,
            duration_ms: 0,
        }
    }

    pub fn is_active(&self) -> bool {
        self.phase != Phase::Idle || self.pending.is_some()
    }

    pub fn stop(&mut self) {
        self.tone_off();
        self.phase = Phase::Idle;
        self.pending = None;
        self.remaining = 0;
    }

    fn start(&mut self, count: u8, freq_hz: u16, duration_ms: u16, now_ms: u64) {
        if count == 0 {
            return;
        }
        self.freq_hz = freq_hz;
        self.duration_ms = duration_ms;
        self.remaining = count - 1;
        self.tone_on(freq_hz);
        self.phase = Phase::On { until_ms: now_ms + u64::from(duration_ms) };
    }

    // ── Platform-specific ─────────────────────────────────────

    #[cfg(target_os = "espidf")]
    fn tone_on(&mut self, freq_hz: u16) {
        // LEDC PWM on PIN_BUZZER at 50% duty:
        //   let timer = LedcTimerDriver::new(peripherals.ledc.timer0,
        //       &TimerConfig::default().frequency(freq_hz.Hz()))?;
        //   let mut channel = LedcDriver::new(peripherals.ledc.channel0,
        //       timer, pins.gpio15)?;
        //   channel.set_duty(channel.get_max_duty() / 2)?;
        // The LedcDriver handle is threaded in from main.rs.
        let _ = freq_hz;
    }

    #[cfg(not(target_os = "espidf"))]
    fn tone_on(&mut self, freq_hz: u16) {
        debug!("Buzzer(sim): tone {freq_hz} Hz");
    }

    #[cfg(target_os = "espidf")]
    fn tone_off(&mut self) {
        // channel.set_duty(0)
    }

    #[cfg(not(target_os = "espidf"))]
    fn tone_off(&mut self) {
        debug!("Buzzer(sim): off");
    }
}

impl BeepPort for Buzzer {
    /// Latch a pattern. A new request replaces anything in flight.
    fn beep(&mut self, count: u8, freq_hz: u16, duration_ms: u16) {
        self.pending = Some((count, freq_hz, duration_ms));
    }

    fn update(&mut self, now_ms: u64) {
        if let Some((count, freq, dur)) = self.pending.take() {
            self.start(count, freq, dur, now_ms);
            return;
        }
        match self.phase {
            Phase::Idle => {}
            Phase::On { until_ms } if now_ms >= until_ms => {
                self.tone_off();
                if self.remaining > 0 {
                    self.phase = Phase::Gap { until_ms: now_ms + u64::from(self.duration_ms) };
                } else {
                    self.phase = Phase::Idle;
                }
            }
            Phase::Gap { until_ms } if now_ms >= until_ms => {
                self.remaining -= 1;
                self.tone_on(self.freq_hz);
                self.phase = Phase::On { until_ms: now_ms + u64::from(self.duration_ms) };
            }
            _ => {}
        }
    }
}
