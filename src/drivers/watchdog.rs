//! Task watchdog.
//!
//! Subscribes the main task to the ESP-IDF TWDT. The timeout is 20 s:
//! a blocking backend poll may legitimately hold the loop for the full
//! 15 s HTTP transport timeout, and the loop feeds on both sides of
//! each tick, so anything past 20 s really is a hang.

#[cfg(target_os = "espidf")]
use esp_idf_svc::sys::*;

#[cfg(target_os = "espidf")]
const WDT_TIMEOUT_MS: u32 = 20_000;

pub struct Watchdog {
    #[cfg(target_os = "espidf")]
    subscribed: bool,
    #[cfg(not(target_os = "espidf"))]
    feeds: u32,
}

impl Default for Watchdog {
    fn default() -> Self {
        Self::new()
    }
}

impl Watchdog {
    pub fn new() -> Self {
        #[cfg(target_os = "espidf")]
        {
            // SAFETY: TWDT configuration and task subscription happen
            // once, from the main task, before the tick loop starts.
            unsafe {
                let cfg = esp_task_wdt_config_t {
                    timeout_ms: WDT_TIMEOUT_MS,
                    idle_core_mask: 0,
                    trigger_panic: true,
                };
                if esp_task_wdt_reconfigure(&cfg) != ESP_OK {
                    // Already configured by the bootloader settings;
                    // the subscribe below still applies.
                    log::warn!("Watchdog: reconfigure rejected, keeping existing timeout");
                }
                let subscribed = esp_task_wdt_add(core::ptr::null_mut()) == ESP_OK;
                if !subscribed {
                    log::warn!("Watchdog: main task not subscribed, feeds will be no-ops");
                }
                Self { subscribed }
            }
        }

        #[cfg(not(target_os = "espidf"))]
        Self { feeds: 0 }
    }

    #[cfg(target_os = "espidf")]
    pub fn feed(&mut self) {
        if self.subscribed {
            unsafe {
                esp_task_wdt_reset();
            }
        }
    }

    #[cfg(not(target_os = "espidf"))]
    pub fn feed(&mut self) {
        self.feeds = self.feeds.wrapping_add(1);
    }

    #[cfg(not(target_os = "espidf"))]
    pub fn feed_count(&self) -> u32 {
        self.feeds
    }
}
