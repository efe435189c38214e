//! Dexcom Share session lifecycle.
//!
//! Dexcom's proprietary relay requires a two-step login before readings
//! can be fetched: authenticate (account name + password → account id),
//! then login (account id + password → session token). The token is
//! valid for about an hour; we cache it with a TTL and re-run the full
//! handshake lazily whenever it is missing or expired. The read path
//! reports expiry out-of-band (HTTP 500), in which case the caller
//! invalidates the cache and the *next* poll re-authenticates.

use log::{info, warn};
use serde_json::json;

use crate::app::ports::HttpPort;
use crate::error::AuthError;

/// Application id the Share API expects from third-party clients.
const DEXCOM_APP_ID: &str = "d89443d2-327c-4a6f-89e5-496bbb0317db";
const DEXCOM_US_BASE: &str = "https://share2.dexcom.com/ShareWebServices/Services";
const DEXCOM_OUS_BASE: &str = "https://shareous1.dexcom.com/ShareWebServices/Services";
const AUTH_PATH: &str = "/General/AuthenticatePublisherAccount";
const LOGIN_PATH: &str = "/General/LoginPublisherAccountById";

/// Login "succeeds" with this token when the account has never enabled
/// remote sharing.
const NULL_SESSION: &str = "00000000-0000-0000-0000-000000000000";
/// Tokens shorter than this cannot be real session GUIDs.
const MIN_SESSION_LEN: usize = 10;

/// Session tokens are re-established after this long.
pub const SESSION_TTL_MS: u64 = 3_600_000;

/// Maximum session token length retained.
pub const MAX_SESSION_LEN: usize = 64;

/// Credentials for the Share API.
#[derive(Debug, Clone, Copy)]
pub struct DexcomCredentials<'a> {
    pub username: &'a str,
    pub password: &'a str,
    /// true = US servers (share2), false = international (shareous1).
    pub us_region: bool,
}

impl DexcomCredentials<'_> {
    pub fn base_url(&self) -> &'static str {
        if self.us_region {
            DEXCOM_US_BASE
        } else {
            DEXCOM_OUS_BASE
        }
    }
}

/// Either no session, or a fresh-enough cached token. Never partially
/// valid: expiry is checked on every access and an expired token is
/// treated exactly like an absent one.
pub struct DexcomSessionManager {
    session: Option<CachedSession>,
    /// Handshakes performed since construction (diagnostics + tests).
    handshake_count: u32,
}

struct CachedSession {
    token: heapless::String<MAX_SESSION_LEN>,
    created_at_ms: u64,
}

impl Default for DexcomSessionManager {
    fn default() -> Self {
        Self::new()
    }
}

impl DexcomSessionManager {
    pub fn new() -> Self {
        Self {
            session: None,
            handshake_count: 0,
        }
    }

    /// Return the cached session token, running the two-step handshake
    /// if the cache is empty or older than [`SESSION_TTL_MS`].
    pub fn ensure_session(
        &mut self,
        http: &mut impl HttpPort,
        creds: &DexcomCredentials<'_>,
        now_ms: u64,
    ) -> Result<&str, AuthError> {
        let fresh = self
            .session
            .as_ref()
            .is_some_and(|s| now_ms.saturating_sub(s.created_at_ms) < SESSION_TTL_MS);
        if !fresh {
            self.session = None;
            let token = self.handshake(http, creds, now_ms)?;
            self.session = Some(CachedSession {
                token,
                created_at_ms: now_ms,
            });
        }
        // Freshly inserted above when it was absent.
        Ok(self.session.as_ref().map(|s| s.token.as_str()).unwrap_or(""))
    }

    /// Drop the cached session. The next [`ensure_session`] call redoes
    /// the full handshake. Called when the read endpoint reports expiry.
    ///
    /// [`ensure_session`]: Self::ensure_session
    pub fn invalidate(&mut self) {
        if self.session.take().is_some() {
            info!("Dexcom: session invalidated, will re-authenticate on next poll");
        }
    }

    /// True when a token is cached (fresh or not).
    pub fn has_session(&self) -> bool {
        self.session.is_some()
    }

    /// Number of full handshakes performed so far.
    pub fn handshake_count(&self) -> u32 {
        self.handshake_count
    }

    // ── Internal ──────────────────────────────────────────────────

    fn handshake(
        &mut self,
        http: &mut impl HttpPort,
        creds: &DexcomCredentials<'_>,
        _now_ms: u64,
    ) -> Result<heapless::String<MAX_SESSION_LEN>, AuthError> {
        self.handshake_count += 1;
        let base = creds.base_url();

        // Step 1: account name + password → account id.
        let auth_body = json!({
            "accountName": creds.username,
            "password": creds.password,
            "applicationId": DEXCOM_APP_ID,
        })
        .to_string();
        let mut url: heapless::String<256> = heapless::String::new();
        let _ = url.push_str(base);
        let _ = url.push_str(AUTH_PATH);

        info!(
            "Dexcom: authenticating '{}' ({})",
            creds.username,
            if creds.us_region { "US" } else { "OUS" }
        );
        let resp = http.post(&url, &auth_body).map_err(|e| {
            warn!("Dexcom: authenticate unreachable — {e}");
            AuthError::Unreachable
        })?;
        if !resp.ok() {
            warn!("Dexcom: authenticate failed, HTTP {}", resp.status);
            return Err(AuthError::Unreachable);
        }
        let account_id = strip_quotes(resp.body.trim());
        let account_id: heapless::String<64> = bounded(account_id);

        // Step 2: account id + password → session token.
        let login_body = json!({
            "accountId": account_id.as_str(),
            "password": creds.password,
            "applicationId": DEXCOM_APP_ID,
        })
        .to_string();
        let mut url: heapless::String<256> = heapless::String::new();
        let _ = url.push_str(base);
        let _ = url.push_str(LOGIN_PATH);

        let resp = http.post(&url, &login_body).map_err(|e| {
            warn!("Dexcom: login unreachable — {e}");
            AuthError::Unreachable
        })?;
        if !resp.ok() {
            warn!("Dexcom: login failed, HTTP {}", resp.status);
            return Err(AuthError::Unreachable);
        }

        let token = strip_quotes(resp.body.trim());
        if token == NULL_SESSION || token.len() < MIN_SESSION_LEN {
            warn!("Dexcom: null session — Share is not enabled for this account");
            return Err(AuthError::ShareNotEnabled);
        }

        // Log only a prefix of the token; `bounded` cuts on a char
        // boundary, a byte slice would not.
        info!("Dexcom: login OK, session {}…", bounded::<8>(token));
        Ok(bounded(token))
    }
}

/// Strip one layer of surrounding double quotes, if present.
fn strip_quotes(s: &str) -> &str {
    s.strip_prefix('"')
        .and_then(|s| s.strip_suffix('"'))
        .unwrap_or(s)
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
