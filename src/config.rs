//! System configuration parameters
//!
//! All tunable parameters for the GlucoMatrix display. Values are loaded
//! from NVS at boot and can be overridden at runtime through the admin
//! surface; `AppConfig` is the single source the core reads from.

use serde::{Deserialize, Serialize};

/// Which backend the ingestion service polls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DataSource {
    /// Single GET against `server_url`, optional bearer token.
    GenericJson,
    /// Dexcom Share two-step session API.
    DexcomShare,
}

/// Core application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    // --- WiFi ---
    pub wifi_ssid: heapless::String<32>,
    pub wifi_password: heapless::String<64>,

    // --- Data source ---
    pub data_source: DataSource,
    /// Generic backend URL (empty = not configured).
    pub server_url: heapless::String<256>,
    /// Optional bearer token for the generic backend.
    pub auth_token: heapless::String<256>,

    // --- Dexcom Share ---
    pub dexcom_username: heapless::String<64>,
    pub dexcom_password: heapless::String<64>,
    /// true = US servers (share2), false = international (shareous1).
    pub dexcom_us: bool,

    /// Glucose poll interval in seconds (floored to 15 at use sites).
    pub poll_interval_sec: u32,

    // --- Glucose thresholds (mg/dL) ---
    pub thresh_urgent_low: i32,
    pub thresh_low: i32,
    pub thresh_high: i32,
    pub thresh_urgent_high: i32,

    // --- Alerts ---
    pub alert_enabled: bool,
    /// Beep when glucose drops below this.
    pub alert_low: i32,
    /// Beep when glucose rises above this.
    pub alert_high: i32,
    /// Snooze duration in minutes.
    pub alert_snooze_min: u32,

    // --- Data freshness ---
    /// Minutes without a valid reading before StaleWarning.
    pub stale_timeout_min: u32,

    // --- Display modes ---
    pub weather_enabled: bool,
    pub timer_enabled: bool,
    pub stopwatch_enabled: bool,
    pub sysmon_enabled: bool,
    pub countdown_enabled: bool,

    // --- Notifications ---
    pub notify_enabled: bool,
    /// Default notification display time in seconds.
    pub notify_default_duration_sec: u32,

    // --- Auto-cycle ---
    pub auto_cycle_enabled: bool,
    /// Seconds per mode when auto-cycling (min 3).
    pub auto_cycle_sec: u32,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            wifi_ssid: heapless::String::new(),
            wifi_password: heapless::String::new(),

            data_source: DataSource::GenericJson,
            server_url: heapless::String::new(),
            auth_token: heapless::String::new(),

            dexcom_username: heapless::String::new(),
            dexcom_password: heapless::String::new(),
            dexcom_us: true,

            poll_interval_sec: 60,

            thresh_urgent_low: 70,
            thresh_low: 80,
            thresh_high: 180,
            thresh_urgent_high: 250,

            alert_enabled: false,
            alert_low: 70,
            alert_high: 250,
            alert_snooze_min: 15,

            stale_timeout_min: 20,

            weather_enabled: false,
            timer_enabled: true,
            stopwatch_enabled: true,
            sysmon_enabled: true,
            countdown_enabled: false,

            notify_enabled: true,
            notify_default_duration_sec: 60,

            auto_cycle_enabled: true,
            auto_cycle_sec: 10,
        }
    }
}

/// Minimum poll interval the ingestion service will honor.
pub const MIN_POLL_INTERVAL_SEC: u32 = 15;

impl AppConfig {
    /// WiFi credentials have been provisioned.
    pub fn has_wifi_credentials(&self) -> bool {
        !self.wifi_ssid.is_empty()
    }

    /// Dexcom Share credentials are present.
    pub fn has_dexcom(&self) -> bool {
        !self.dexcom_username.is_empty() && !self.dexcom_password.is_empty()
    }

    /// A usable glucose data source is configured.
    pub fn has_data_source(&self) -> bool {
        match self.data_source {
            DataSource::GenericJson => !self.server_url.is_empty(),
            DataSource::DexcomShare => self.has_dexcom(),
        }
    }

    /// Poll interval in milliseconds, floored to the 15 s minimum.
    pub fn poll_interval_ms(&self) -> u64 {
        u64::from(self.poll_interval_sec.max(MIN_POLL_INTERVAL_SEC)) * 1000
    }

    /// Stale timeout in milliseconds.
    pub fn stale_timeout_ms(&self) -> u64 {
        u64::from(self.stale_timeout_min) * 60_000
    }

    /// Range-check the fields an admin surface can set. Run before any
    /// persist or live apply; invalid values are rejected, not clamped.
    pub fn validate(&self) -> Result<(), &'static str> {
        if !(self.thresh_urgent_low < self.thresh_low
            && self.thresh_low < self.thresh_high
            && self.thresh_high < self.thresh_urgent_high)
        {
            return Err("glucose thresholds must be strictly increasing");
        }
        if self.alert_low >= self.alert_high {
            return Err("alert_low must be below alert_high");
        }
        if self.poll_interval_sec == 0 {
            return Err("poll_interval_sec must be nonzero");
        }
        if self.stale_timeout_min == 0 {
            return Err("stale_timeout_min must be nonzero");
        }
        Ok(())
    }
}
