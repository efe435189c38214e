//! Display state enumeration and threshold color banding.

use crate::config::AppConfig;

/// Every logical screen the panel can show. Closed set: the evaluator,
/// the renderer, and the `force_mode` wire table all match on it
/// exhaustively.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum DisplayStateKind {
    Boot = 0,
    Glucose = 1,
    Time = 2,
    Weather = 3,
    Timer = 4,
    Stopwatch = 5,
    SystemMonitor = 6,
    Countdown = 7,
    Trend = 8,
    Message = 9,
    Notify = 10,
    StaleWarning = 11,
    NoData = 12,
    NoWifi = 13,
    NoConfig = 14,
}

impl DisplayStateKind {
    /// Short name for logs and the admin API.
    pub fn name(self) -> &'static str {
        match self {
            Self::Boot => "BOOT",
            Self::Glucose => "GLUCOSE",
            Self::Time => "TIME",
            Self::Weather => "WEATHER",
            Self::Timer => "TIMER",
            Self::Stopwatch => "STOPWATCH",
            Self::SystemMonitor => "SYSMON",
            Self::Countdown => "COUNTDOWN",
            Self::Trend => "TREND",
            Self::Message => "MESSAGE",
            Self::Notify => "NOTIFY",
            Self::StaleWarning => "STALE",
            Self::NoData => "NO_DATA",
            Self::NoWifi => "NO_WIFI",
            Self::NoConfig => "NO_CFG",
        }
    }

    /// Decode a server-pushed `force_mode` ordinal.
    ///
    /// Explicit table, no numeric cast: values outside the enumeration
    /// are ignored (`None`) rather than wrapped into a nearby state.
    pub fn from_wire(value: i32) -> Option<Self> {
        match value {
            0 => Some(Self::Boot),
            1 => Some(Self::Glucose),
            2 => Some(Self::Time),
            3 => Some(Self::Weather),
            4 => Some(Self::Timer),
            5 => Some(Self::Stopwatch),
            6 => Some(Self::SystemMonitor),
            7 => Some(Self::Countdown),
            8 => Some(Self::Trend),
            9 => Some(Self::Message),
            10 => Some(Self::Notify),
            11 => Some(Self::StaleWarning),
            12 => Some(Self::NoData),
            13 => Some(Self::NoWifi),
            14 => Some(Self::NoConfig),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Threshold color banding
// ---------------------------------------------------------------------------

/// Which configured band a glucose value falls into. The renderer maps
/// bands to theme colors; the core only classifies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GlucoseBand {
    UrgentLow,
    Low,
    InRange,
    High,
    UrgentHigh,
}

/// Classify a glucose value against the configured thresholds.
///
/// Boundary semantics follow the original banding: the low bounds are
/// exclusive below (`< urgent_low`, `< low`), the high bounds inclusive
/// (`<= high`, `<= urgent_high`).
pub fn glucose_band(mg_dl: i32, cfg: &AppConfig) -> GlucoseBand {
    if mg_dl < cfg.thresh_urgent_low {
        GlucoseBand::UrgentLow
    } else if mg_dl < cfg.thresh_low {
        GlucoseBand::Low
    } else if mg_dl <= cfg.thresh_high {
        GlucoseBand::InRange
    } else if mg_dl <= cfg.thresh_urgent_high {
        GlucoseBand::High
    } else {
        GlucoseBand::UrgentHigh
    }
}
