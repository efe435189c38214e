//! GlucoMatrix Firmware — Main Entry Point
//!
//! Hexagonal architecture on an Ulanzi TC001 pixel clock:
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                   Adapters (outer ring)                  │
//! │                                                          │
//! │  HttpAdapter   WifiAdapter   NvsAdapter   SerialEventLog │
//! │  (HttpPort)    (Connectivity)(Config+NVS) (EventSink)    │
//! │  MatrixDriver  Buzzer        BootClock                   │
//! │  (RenderPort)  (BeepPort)    (monotonic ms)              │
//! │                                                          │
//! │  ─────────────── Port Trait Boundary ───────────────     │
//! │                                                          │
//! │  ┌────────────────────────────────────────────────────┐  │
//! │  │            AppService (pure logic)                 │  │
//! │  │  Ingestion · Alerts · Cycling · Display arbiter    │  │
//! │  └────────────────────────────────────────────────────┘  │
//! └──────────────────────────────────────────────────────────┘
//! ```

use anyhow::Result;
use log::{info, warn};

use glucomatrix::adapters::http::HttpAdapter;
use glucomatrix::adapters::log_sink::SerialEventLog;
use glucomatrix::adapters::nvs::NvsAdapter;
use glucomatrix::adapters::time::BootClock;
use glucomatrix::adapters::wifi::WifiAdapter;
use glucomatrix::app::ports::ConfigPort;
use glucomatrix::app::service::AppService;
use glucomatrix::drivers::buzzer::Buzzer;
use glucomatrix::drivers::matrix::MatrixDriver;
use glucomatrix::drivers::watchdog::Watchdog;

/// Loop cadence. Everything time-sensitive inside the service is gated
/// on its own deadlines, so the cadence only bounds responsiveness.
const TICK_MS: u64 = 100;

fn main() -> Result<()> {
    // ── Runtime bootstrap ─────────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;

    info!("GlucoMatrix v{}", env!("CARGO_PKG_VERSION"));

    let mut watchdog = Watchdog::new();
    let time = BootClock::new();

    // ── Config from NVS, defaults on first boot ───────────────
    let nvs = match NvsAdapter::new() {
        Ok(n) => n,
        Err(e) => {
            warn!("NVS init failed ({e}), halting");
            return Err(anyhow::anyhow!("NVS init failed: {e}"));
        }
    };
    let cfg = nvs.load().unwrap_or_else(|e| {
        warn!("Config load failed ({e}), using defaults");
        Default::default()
    });

    // ── WiFi bring-up ─────────────────────────────────────────
    let mut wifi = WifiAdapter::new();
    if cfg.has_wifi_credentials() {
        if let Err(e) = wifi
            .set_credentials(&cfg.wifi_ssid, &cfg.wifi_password)
            .and_then(|()| wifi.connect())
        {
            // Reconnect backoff takes over from inside the tick loop.
            warn!("WiFi bring-up failed: {e}");
        }
    } else {
        warn!("No WiFi credentials provisioned");
    }

    // ── Wire adapters into the service ────────────────────────
    let matrix = MatrixDriver::new(&cfg);
    let mut service = AppService::new(
        cfg,
        HttpAdapter::new(),
        wifi,
        matrix,
        Buzzer::new(),
        SerialEventLog::new(),
        nvs,
    );

    info!("System ready. Entering tick loop.");

    // ── Tick loop ─────────────────────────────────────────────
    loop {
        // Fed on both sides of the tick: a poll inside may block up to
        // the HTTP transport timeout.
        watchdog.feed();
        service.tick(time.now_ms());
        watchdog.feed();

        std::thread::sleep(std::time::Duration::from_millis(TICK_MS));
    }
}
