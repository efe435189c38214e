//! Glucose ingestion service.
//!
//! Owns the single published [`Reading`], the poll/failure bookkeeping,
//! the history ring, and the Dexcom session manager — the one explicit
//! state bundle behind every freshness signal the evaluator reads.
//!
//! ## Polling contract
//!
//! [`poll`](GlucoseIngestionService::poll) is called once per scheduler
//! tick and no-ops unless the configured interval (floored to 15 s) has
//! elapsed since the last *attempt*. `last_poll_at` is updated
//! unconditionally whenever an attempt is made, so a failing backend is
//! retried at the normal cadence, never in a tight storm.
//!
//! ## Failure policy
//!
//! Every error on the poll path — unreachable host, non-200, parse
//! error, non-positive glucose, Dexcom auth failure — increments the
//! failure counter and caches a diagnostic string. The previously
//! published Reading is never cleared or touched: staleness is
//! communicated structurally via elapsed time, not by blanking data.

use log::{info, warn};
use serde::Deserialize;

use crate::app::ports::{HttpPort, HttpResponse, MAX_BODY_LEN};
use crate::config::{AppConfig, DataSource};
use crate::display::kinds::DisplayStateKind;
use crate::error::{AuthError, PollError};
use crate::glucose::history::{HistoryBuffer, HistoryEntry, HISTORY_CAPACITY};
use crate::glucose::session::{DexcomCredentials, DexcomSessionManager};
use crate::glucose::trend::{self, TrendKind, TrendRaw};

/// Maximum server-pushed message text retained.
pub const MAX_MESSAGE_LEN: usize = 127;
/// Maximum cached diagnostic error string.
pub const MAX_ERROR_LEN: usize = 128;

/// Dexcom Share read endpoint, relative to the regional base.
const DEXCOM_READ_PATH: &str = "/Publisher/ReadPublisherLatestGlucoseValues";
/// Lookback window and entry cap for the read request.
const DEXCOM_READ_QUERY: &str = "minutes=10&maxCount=1";

// ---------------------------------------------------------------------------
// Reading
// ---------------------------------------------------------------------------

/// One glucose observation, replaced wholesale on every successful poll.
#[derive(Debug, Clone, Default)]
pub struct Reading {
    /// Glucose in mg/dL; 0 = no valid value.
    pub glucose_mg_dl: i32,
    pub trend: TrendKind,
    /// Optional server-pushed text, truncated at [`MAX_MESSAGE_LEN`].
    pub message: heapless::String<MAX_MESSAGE_LEN>,
    /// Server display override, already table-decoded. `None` = none.
    pub force_mode: Option<DisplayStateKind>,
    /// Backend-reported epoch seconds. Informational only — staleness
    /// uses `received_at_ms` exclusively.
    pub source_timestamp: u64,
    /// Monotonic milliseconds at successful parse.
    pub received_at_ms: u64,
    pub valid: bool,
}

// ---------------------------------------------------------------------------
// Poll bookkeeping
// ---------------------------------------------------------------------------

/// Transport/diagnostic state of the polling loop.
#[derive(Debug, Clone, Default)]
pub struct PollState {
    /// Consecutive failures since the last valid reading.
    pub failure_count: u32,
    /// Status of the most recent HTTP exchange (0 = none yet).
    pub last_http_status: u16,
    /// Body of the most recent HTTP exchange, truncated.
    pub last_body: heapless::String<MAX_BODY_LEN>,
    /// Human-readable description of the most recent failure.
    pub last_error: heapless::String<MAX_ERROR_LEN>,
    /// Monotonic: set on the first valid reading, never reverts.
    pub ever_received: bool,
    /// Monotonic ms of the last valid reading; `None` = never.
    pub last_success_at_ms: Option<u64>,
}

/// The freshness signals the display evaluator consumes each tick.
#[derive(Debug, Clone, Copy)]
pub struct IngestionSignals {
    pub failure_count: u32,
    pub ever_received: bool,
    /// Milliseconds since the last valid reading; `None` = never.
    pub age_ms: Option<u64>,
    pub reading_valid: bool,
    pub force_mode: Option<DisplayStateKind>,
    pub has_message: bool,
}

// ---------------------------------------------------------------------------
// Wire payloads
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
struct GenericPayload {
    glucose: i64,
    #[serde(default)]
    timestamp: u64,
    #[serde(default)]
    trend: Option<String>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    force_mode: Option<i32>,
}

#[derive(Deserialize)]
struct ShareEntry {
    #[serde(rename = "Value")]
    value: i64,
    #[serde(rename = "Trend", default)]
    trend: Option<TrendRaw>,
    #[serde(rename = "WT", default)]
    wt: Option<String>,
    #[serde(rename = "ST", default)]
    st: Option<String>,
}

/// Candidate reading parsed from a backend, pre-publication.
struct Parsed {
    glucose: i32,
    trend: TrendKind,
    message: heapless::String<MAX_MESSAGE_LEN>,
    force_mode: Option<DisplayStateKind>,
    source_timestamp: u64,
}

// ---------------------------------------------------------------------------
// Service
// ---------------------------------------------------------------------------

/// Orchestrates periodic polling and owns all ingestion-derived state.
pub struct GlucoseIngestionService {
    reading: Reading,
    poll_state: PollState,
    history: HistoryBuffer,
    session: DexcomSessionManager,
    /// Value of the previous *valid* reading; failures do not participate.
    prev_glucose: Option<i32>,
    delta: i32,
    last_poll_ms: Option<u64>,
}

impl Default for GlucoseIngestionService {
    fn default() -> Self {
        Self::new()
    }
}

impl GlucoseIngestionService {
    pub fn new() -> Self {
        Self {
            reading: Reading::default(),
            poll_state: PollState::default(),
            history: HistoryBuffer::new(),
            session: DexcomSessionManager::new(),
            prev_glucose: None,
            delta: 0,
            last_poll_ms: None,
        }
    }

    /// Interval-gated poll. Returns `None` when the interval has not
    /// elapsed; otherwise the attempt's outcome.
    pub fn poll(
        &mut self,
        http: &mut impl HttpPort,
        cfg: &AppConfig,
        now_ms: u64,
    ) -> Option<Result<i32, PollError>> {
        if let Some(last) = self.last_poll_ms {
            if now_ms.saturating_sub(last) < cfg.poll_interval_ms() {
                return None;
            }
        }
        Some(self.force_poll(http, cfg, now_ms))
    }

    /// Poll immediately, bypassing the interval gate (admin/test hook).
    /// Updates `last_poll_at` unconditionally so the regular cadence
    /// continues from here.
    pub fn force_poll(
        &mut self,
        http: &mut impl HttpPort,
        cfg: &AppConfig,
        now_ms: u64,
    ) -> Result<i32, PollError> {
        self.last_poll_ms = Some(now_ms);

        let fetched = match cfg.data_source {
            DataSource::GenericJson => self.fetch_generic(http, cfg),
            DataSource::DexcomShare => self.fetch_dexcom(http, cfg, now_ms),
        };

        match fetched {
            Ok(parsed) => {
                let glucose = parsed.glucose;
                self.publish(parsed, now_ms);
                Ok(glucose)
            }
            Err(err) => {
                self.record_failure(err);
                Err(err)
            }
        }
    }

    // ── Queries ───────────────────────────────────────────────

    /// The latest published reading (possibly invalid if none has ever
    /// arrived).
    pub fn reading(&self) -> &Reading {
        &self.reading
    }

    pub fn poll_state(&self) -> &PollState {
        &self.poll_state
    }

    pub fn failure_count(&self) -> u32 {
        self.poll_state.failure_count
    }

    pub fn ever_received(&self) -> bool {
        self.poll_state.ever_received
    }

    /// Delta from the previous valid reading, mg/dL.
    pub fn delta(&self) -> i32 {
        self.delta
    }

    /// Milliseconds since the last valid reading; `None` = never.
    pub fn time_since_last_reading(&self, now_ms: u64) -> Option<u64> {
        self.poll_state
            .last_success_at_ms
            .map(|t| now_ms.saturating_sub(t))
    }

    /// Up to `max_count` history entries, oldest first.
    pub fn read_history(&self, max_count: usize) -> heapless::Vec<HistoryEntry, HISTORY_CAPACITY> {
        self.history.read(max_count)
    }

    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    /// Snapshot of the signals the evaluator consumes.
    pub fn signals(&self, now_ms: u64) -> IngestionSignals {
        IngestionSignals {
            failure_count: self.poll_state.failure_count,
            ever_received: self.poll_state.ever_received,
            age_ms: self.time_since_last_reading(now_ms),
            reading_valid: self.reading.valid,
            force_mode: self.reading.force_mode,
            has_message: !self.reading.message.is_empty(),
        }
    }

    #[cfg(test)]
    pub(crate) fn session_handshakes(&self) -> u32 {
        self.session.handshake_count()
    }

    // ── Backends ──────────────────────────────────────────────

    fn fetch_generic(
        &mut self,
        http: &mut impl HttpPort,
        cfg: &AppConfig,
    ) -> Result<Parsed, PollError> {
        let bearer = (!cfg.auth_token.is_empty()).then_some(cfg.auth_token.as_str());
        let resp = http.get(&cfg.server_url, bearer).map_err(|e| {
            self.note_transport_failure();
            PollError::from(e)
        })?;
        self.note_response(&resp);
        if !resp.ok() {
            return Err(PollError::Http(resp.status));
        }

        let payload: GenericPayload =
            serde_json::from_str(&resp.body).map_err(|_| PollError::Parse)?;
        if payload.glucose <= 0 {
            return Err(PollError::InvalidValue);
        }

        Ok(Parsed {
            glucose: payload.glucose as i32,
            trend: payload
                .trend
                .as_deref()
                .map(trend::map_token)
                .unwrap_or(TrendKind::Unknown),
            message: bounded(payload.message.as_deref().unwrap_or("")),
            force_mode: payload.force_mode.and_then(DisplayStateKind::from_wire),
            source_timestamp: payload.timestamp,
        })
    }

    fn fetch_dexcom(
        &mut self,
        http: &mut impl HttpPort,
        cfg: &AppConfig,
        now_ms: u64,
    ) -> Result<Parsed, PollError> {
        let creds = DexcomCredentials {
            username: cfg.dexcom_username.as_str(),
            password: cfg.dexcom_password.as_str(),
            us_region: cfg.dexcom_us,
        };
        let session: heapless::String<64> =
            bounded(self.session.ensure_session(http, &creds, now_ms)?);

        let mut url: heapless::String<384> = heapless::String::new();
        let _ = url.push_str(creds.base_url());
        let _ = url.push_str(DEXCOM_READ_PATH);
        let _ = url.push_str("?sessionId=");
        let _ = url.push_str(&session);
        let _ = url.push('&');
        let _ = url.push_str(DEXCOM_READ_QUERY);

        // Dexcom requires POST even for reads.
        let resp = http.post(&url, "").map_err(|e| {
            self.note_transport_failure();
            PollError::from(e)
        })?;
        self.note_response(&resp);

        if resp.status == 500 {
            // Backend-reported session expiry: drop the cache so the
            // next poll redoes the handshake.
            self.session.invalidate();
            return Err(PollError::Auth(AuthError::Expired));
        }
        if !resp.ok() {
            return Err(PollError::Http(resp.status));
        }

        let entries: Vec<ShareEntry> =
            serde_json::from_str(&resp.body).map_err(|_| PollError::Parse)?;
        let entry = entries.first().ok_or(PollError::Parse)?;
        if entry.value <= 0 {
            return Err(PollError::InvalidValue);
        }

        Ok(Parsed {
            glucose: entry.value as i32,
            trend: entry
                .trend
                .as_ref()
                .map(trend::map)
                .unwrap_or(TrendKind::Unknown),
            message: heapless::String::new(),
            force_mode: None,
            source_timestamp: entry
                .wt
                .as_deref()
                .or(entry.st.as_deref())
                .and_then(parse_share_timestamp)
                .unwrap_or(0),
        })
    }

    // ── State updates ─────────────────────────────────────────

    /// Replace the published reading and update every derived signal.
    /// Runs only for `glucose > 0` — the parse paths reject the rest.
    fn publish(&mut self, parsed: Parsed, now_ms: u64) {
        self.delta = match self.prev_glucose {
            Some(prev) => parsed.glucose - prev,
            None => 0,
        };
        self.prev_glucose = Some(parsed.glucose);
        self.history.record(parsed.glucose, self.delta, now_ms);

        self.reading = Reading {
            glucose_mg_dl: parsed.glucose,
            trend: parsed.trend,
            message: parsed.message,
            force_mode: parsed.force_mode,
            source_timestamp: parsed.source_timestamp,
            received_at_ms: now_ms,
            valid: true,
        };

        self.poll_state.failure_count = 0;
        self.poll_state.ever_received = true;
        self.poll_state.last_success_at_ms = Some(now_ms);
        self.poll_state.last_error.clear();

        info!(
            "Glucose: {} mg/dL, trend {}, delta {:+}",
            parsed.glucose,
            self.reading.trend.name(),
            self.delta
        );
    }

    fn record_failure(&mut self, err: PollError) {
        self.poll_state.failure_count = self.poll_state.failure_count.saturating_add(1);
        self.poll_state.last_error = bounded(&format!("{err}"));
        warn!(
            "Glucose poll failed ({}), consecutive failures: {}",
            err, self.poll_state.failure_count
        );
    }

    fn note_response(&mut self, resp: &HttpResponse) {
        self.poll_state.last_http_status = resp.status;
        self.poll_state.last_body = resp.body.clone();
    }

    fn note_transport_failure(&mut self) {
        self.poll_state.last_http_status = 0;
        self.poll_state.last_body.clear();
    }
}

/// Extract epoch seconds from a Share timestamp like `"Date(1700000000000)"`
/// or `"/Date(1700000000000)/"` — the digits between the parentheses are
/// epoch milliseconds.
fn parse_share_timestamp(raw: &str) -> Option<u64> {
    let open = raw.find('(')?;
    let digits: &str = &raw[open + 1..];
    let end = digits
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(digits.len());
    digits[..end].parse::<u64>().ok().map(|ms| ms / 1000)
}

/// Copy into a bounded string, truncating at capacity.
fn bounded<const N: usize>(s: &str) -> heapless::String<N> {
    let mut out = heapless::String::new();
    for c in s.chars() {
        if out.push(c).is_err() {
            break;
        }
    }
    out
}
