//! Port traits: everything the glucose service needs from the outside
//! world, expressed as traits so the domain core compiles and tests on
//! a host machine with no radio, panel, or flash attached.
//!
//! Production wires ESP-IDF adapters into these seams; the test suites
//! wire in scripted fakes. The service itself never sees a socket or a
//! GPIO.

use crate::config::AppConfig;
use crate::display::kinds::DisplayStateKind;
use crate::error::HttpTransportError;
use crate::glucose::ingest::Reading;

// ───────────────────────────────────────────────────────────────
// HTTP transport
// ───────────────────────────────────────────────────────────────

/// Maximum response body retained from any backend. Longer bodies are
/// truncated by the adapter; the core never sees more than this.
pub const MAX_BODY_LEN: usize = 512;

/// A completed HTTP exchange.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    /// Body text, truncated at [`MAX_BODY_LEN`].
    pub body: heapless::String<MAX_BODY_LEN>,
}

impl HttpResponse {
    pub fn ok(&self) -> bool {
        self.status == 200
    }
}

/// Blocking HTTP transport with an explicit per-request timeout.
///
/// The calling context is suspended for the duration of the request
/// (spec'd at 10–15 s worst case); implementations MUST enforce the
/// timeout so the surrounding loop's watchdog budget holds.
pub trait HttpPort {
    /// GET with an optional `Authorization: Bearer` token.
    fn get(&mut self, url: &str, bearer: Option<&str>) -> Result<HttpResponse, HttpTransportError>;

    /// POST a JSON body (empty string allowed — Dexcom reads are empty
    /// POSTs). `Content-Type`/`Accept: application/json` are implied.
    fn post(&mut self, url: &str, body: &str) -> Result<HttpResponse, HttpTransportError>;
}

// ───────────────────────────────────────────────────────────────
// Connectivity
// ───────────────────────────────────────────────────────────────

/// The connectivity oracle the evaluator consults each tick.
pub trait ConnectivityPort {
    fn is_connected(&self) -> bool;

    /// Drive reconnect state machinery. Called once per service tick;
    /// the default is a no-op for adapters with nothing to pump.
    fn poll(&mut self) {}
}

// ───────────────────────────────────────────────────────────────
// Notifications
// ───────────────────────────────────────────────────────────────

/// Exposes whether an unexpired notification is pending display.
pub trait NotifyPort {
    fn has_active(&self) -> bool;
}

// ───────────────────────────────────────────────────────────────
// Rendering
// ───────────────────────────────────────────────────────────────

/// Data the renderer needs alongside the resolved display state.
/// Pixel layout is the adapter's problem; the core only decides *what*.
#[derive(Debug, Clone, Copy)]
pub struct RenderData<'a> {
    pub reading: &'a Reading,
    /// Cached server message text (valid when state is `Message`).
    pub message: &'a str,
    /// Delta from the previous valid reading, mg/dL.
    pub delta: i32,
    /// Milliseconds since the last valid reading; `None` = never.
    pub age_ms: Option<u64>,
}

/// Write-side port: the domain hands the resolved state to the panel.
pub trait RenderPort {
    fn render(&mut self, state: DisplayStateKind, data: &RenderData<'_>);
}

// ───────────────────────────────────────────────────────────────
// Buzzer
// ───────────────────────────────────────────────────────────────

/// Fire-and-forget beep requests. Must not block.
pub trait BeepPort {
    fn beep(&mut self, count: u8, freq_hz: u16, duration_ms: u16);

    /// Advance any in-flight pattern. Called once per service tick; the
    /// default is a no-op for sinks with no timing of their own.
    fn update(&mut self, now_ms: u64) {
        let _ = now_ms;
    }
}

// ───────────────────────────────────────────────────────────────
// Events
// ───────────────────────────────────────────────────────────────

/// Receives the structured [`AppEvent`](super::events::AppEvent) stream.
/// Where it ends up (serial console, MQTT, a web push) is the
/// implementor's choice.
pub trait EventSink {
    fn emit(&mut self, event: &super::events::AppEvent);
}

// ───────────────────────────────────────────────────────────────
// Config persistence
// ───────────────────────────────────────────────────────────────

/// Loads and persists the application configuration.
///
/// Implementations MUST run [`AppConfig::validate`] before persisting:
/// a zero poll interval or inverted thresholds coming in over an admin
/// channel is rejected with [`ConfigError::ValidationFailed`], never
/// silently clamped.
pub trait ConfigPort {
    /// Read the stored config, falling back to [`AppConfig::default`]
    /// when none has ever been saved.
    fn load(&self) -> Result<AppConfig, ConfigError>;

    /// Validate, then persist.
    fn save(&self, config: &AppConfig) -> Result<(), ConfigError>;
}

// ───────────────────────────────────────────────────────────────
// Error types
// ───────────────────────────────────────────────────────────────

#[derive(Debug)]
pub enum ConfigError {
    /// Nothing stored yet (first boot).
    NotFound,
    /// The stored blob would not deserialize.
    Corrupted,
    /// A field failed range validation; the message names the field.
    ValidationFailed(&'static str),
    /// The backing partition has no room left.
    StorageFull,
    /// Anything else the storage backend reports.
    IoError,
}

impl core::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::NotFound => f.write_str("no stored config"),
            Self::Corrupted => f.write_str("stored config is corrupt"),
            Self::ValidationFailed(msg) => write!(f, "config rejected: {msg}"),
            Self::StorageFull => f.write_str("config partition full"),
            Self::IoError => f.write_str("config storage I/O error"),
        }
    }
}
