//! Blocking HTTP transport adapter.
//!
//! Implements [`HttpPort`] over the ESP-IDF HTTP client. Requests are
//! synchronous with a hard 15 s timeout, matching the port contract:
//! the calling tick is suspended at most that long, and the main loop
//! feeds the watchdog on either side of it.
//!
//! ## cfg gating
//!
//! - **`target_os = "espidf"`**: `esp_idf_svc::http::client::EspHttpConnection`.
//! - **all other targets**: simulation stub that reports every request
//!   as unreachable — host tests inject scripted transports instead.

use log::warn;

use crate::app::ports::{HttpPort, HttpResponse};
use crate::error::HttpTransportError;

/// Per-request timeout, connect included.
pub const REQUEST_TIMEOUT_SECS: u64 = 15;

pub struct HttpAdapter {
    _private: (),
}

impl Default for HttpAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl HttpAdapter {
    pub fn new() -> Self {
        Self { _private: () }
    }

    #[cfg(target_os = "espidf")]
    fn request(
        &mut self,
        method: esp_idf_svc::http::Method,
        url: &str,
        bearer: Option<&str>,
        body: &str,
    ) -> Result<HttpResponse, HttpTransportError> {
        use esp_idf_svc::http::client::{Configuration, EspHttpConnection};
        use esp_idf_svc::io::{Read as _, Write as _};

        let mut conn = EspHttpConnection::new(&Configuration {
            timeout: Some(core::time::Duration::from_secs(REQUEST_TIMEOUT_SECS)),
            crt_bundle_attach: Some(esp_idf_svc::sys::esp_crt_bundle_attach),
            ..Default::default()
        })
        .map_err(|e| {
            warn!("HTTP: client init failed: {e}");
            HttpTransportError::Connect
        })?;

        let mut auth: heapless::String<280> = heapless::String::new();
        let mut headers: heapless::Vec<(&str, &str), 4> = heapless::Vec::new();
        let _ = headers.push(("Accept", "application/json"));
        if !body.is_empty() || method == esp_idf_svc::http::Method::Post {
            let _ = headers.push(("Content-Type", "application/json"));
        }
        if let Some(token) = bearer {
            let _ = auth.push_str("Bearer ");
            let _ = auth.push_str(token);
            let _ = headers.push(("Authorization", auth.as_str()));
        }

        conn.initiate_request(method, url, &headers)
            .map_err(|_| HttpTransportError::Connect)?;
        if !body.is_empty() {
            conn.write(body.as_bytes())
                .map_err(|_| HttpTransportError::Connect)?;
        }
        conn.initiate_response()
            .map_err(|_| HttpTransportError::Timeout)?;

        let status = conn.status();
        let mut out: heapless::String<MAX_BODY_LEN> = heapless::String::new();
        let mut buf = [0u8; 256];
        loop {
            let n = conn.read(&mut buf).map_err(|_| HttpTransportError::Timeout)?;
            if n == 0 {
                break;
            }
            // Truncate past the cap; the core never needs more.
            for &b in &buf[..n] {
                if out.push(b as char).is_err() {
                    return Ok(HttpResponse { status, body: out });
                }
            }
        }
        debug!("HTTP {status}: {} bytes", out.len());
        Ok(HttpResponse { status, body: out })
    }
}

#[cfg(target_os = "espidf")]
impl HttpPort for HttpAdapter {
    fn get(&mut self, url: &str, bearer: Option<&str>) -> Result<HttpResponse, HttpTransportError> {
        self.request(esp_idf_svc::http::Method::Get, url, bearer, "")
    }

    fn post(&mut self, url: &str, body: &str) -> Result<HttpResponse, HttpTransportError> {
        self.request(esp_idf_svc::http::Method::Post, url, None, body)
    }
}

#[cfg(not(target_os = "espidf"))]
impl HttpPort for HttpAdapter {
    fn get(&mut self, url: &str, _bearer: Option<&str>) -> Result<HttpResponse, HttpTransportError> {
        warn!("HTTP(sim): GET {url} — no network in simulation");
        Err(HttpTransportError::Connect)
    }

    fn post(&mut self, url: &str, _body: &str) -> Result<HttpResponse, HttpTransportError> {
        warn!("HTTP(sim): POST {url} — no network in simulation");
        Err(HttpTransportError::Connect)
    }
}
