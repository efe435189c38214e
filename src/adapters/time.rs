//! Monotonic millisecond clock.
//!
//! Every deadline in the domain core (poll gate, stale cutoff, beep
//! cadence, boot screen) is expressed as a `u64` millisecond timestamp
//! handed in from outside; this is the only place those timestamps are
//! produced. On device it reads the ESP-IDF high-resolution timer,
//! which starts at zero on boot and never goes backwards; on the host
//! it measures from a `std::time::Instant` captured at construction.

pub struct BootClock {
    #[cfg(not(target_os = "espidf"))]
    epoch: std::time::Instant,
}

impl Default for BootClock {
    fn default() -> Self {
        Self::new()
    }
}

impl BootClock {
    pub fn new() -> Self {
        Self {
            #[cfg(not(target_os = "espidf"))]
            epoch: std::time::Instant::now(),
        }
    }

    /// Milliseconds since boot.
    #[cfg(target_os = "espidf")]
    pub fn now_ms(&self) -> u64 {
        // esp_timer_get_time is microseconds since boot, 64-bit.
        (unsafe { esp_idf_svc::sys::esp_timer_get_time() }) as u64 / 1_000
    }

    /// Milliseconds since this clock was created.
    #[cfg(not(target_os = "espidf"))]
    pub fn now_ms(&self) -> u64 {
        self.epoch.elapsed().as_millis() as u64
    }

    pub fn uptime_secs(&self) -> u64 {
        self.now_ms() / 1000
    }
}
