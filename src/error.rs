//! Unified error types for the GlucoMatrix firmware.
//!
//! Follows embedded practice: every fallible path in the ingestion core
//! funnels into [`PollError`], which the service converts into a failure
//! counter increment plus a cached diagnostic string. Nothing in this
//! taxonomy is fatal — the display loop keeps ticking through all of it.

use core::fmt;

// ---------------------------------------------------------------------------
// HTTP transport
// ---------------------------------------------------------------------------

/// Failures below the HTTP status line, reported by the transport adapter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpTransportError {
    /// Could not reach the host (DNS, TCP, TLS).
    Connect,
    /// The request exceeded the per-request timeout.
    Timeout,
}

impl fmt::Display for HttpTransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Connect => write!(f, "connection failed"),
            Self::Timeout => write!(f, "request timed out"),
        }
    }
}

// ---------------------------------------------------------------------------
// Dexcom session
// ---------------------------------------------------------------------------

/// Failures of the Dexcom Share two-step login.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthError {
    /// Authenticate or login endpoint unreachable or non-200.
    Unreachable,
    /// Login succeeded but returned the null-GUID sentinel (or a token too
    /// short to be real). The account exists but remote sharing is off —
    /// a configuration problem the user must fix in the Dexcom app, so it
    /// is surfaced distinctly from a plain auth failure.
    ShareNotEnabled,
    /// The read endpoint reported session expiry (HTTP 500); the next
    /// `ensure_session` call will redo the full handshake.
    Expired,
}

impl fmt::Display for AuthError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unreachable => write!(f, "Dexcom auth unreachable"),
            Self::ShareNotEnabled => {
                write!(f, "Dexcom Share not enabled (enable sharing in the Dexcom app)")
            }
            Self::Expired => write!(f, "Dexcom session expired"),
        }
    }
}

// ---------------------------------------------------------------------------
// Poll path
// ---------------------------------------------------------------------------

/// Every way a single glucose poll can fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollError {
    /// Transport-level failure before any status line.
    Connect(HttpTransportError),
    /// Non-200 HTTP status from the backend.
    Http(u16),
    /// Malformed JSON or a missing required field.
    Parse,
    /// The payload parsed but carried a non-positive glucose value.
    InvalidValue,
    /// Dexcom session establishment failed.
    Auth(AuthError),
}

impl fmt::Display for PollError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Connect(e) => write!(f, "connect: {e}"),
            Self::Http(status) => write!(f, "HTTP {status}"),
            Self::Parse => write!(f, "malformed response"),
            Self::InvalidValue => write!(f, "non-positive glucose value"),
            Self::Auth(e) => write!(f, "auth: {e}"),
        }
    }
}

impl From<HttpTransportError> for PollError {
    fn from(e: HttpTransportError) -> Self {
        Self::Connect(e)
    }
}

impl From<AuthError> for PollError {
    fn from(e: AuthError) -> Self {
        Self::Auth(e)
    }
}
