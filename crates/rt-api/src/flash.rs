//! # Flash alerts
//!
//! Alerts queued by one request and shown on the next page render. They
//! ride in the `alerts` cookie as `base64url(json).base64url(hmac)`, so the
//! client can carry them but not forge them. A cookie that fails
//! verification reads as no alerts.

use axum::extract::FromRequestParts;
use axum::http::header::SET_COOKIE;
use axum::http::request::Parts;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponseParts, ResponseParts};
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use hmac::{Hmac, Mac};
use rt_core::models::Alert;
use sha2::Sha256;
use std::convert::Infallible;
use tracing::debug;

use crate::session::{cookie_header, read_cookie};
use crate::state::AppState;

pub const FLASH_COOKIE: &str = "alerts";

type HmacSha256 = Hmac<Sha256>;

/// Signing key for the flash cookie.
#[derive(Clone)]
pub struct FlashKey {
    mac: HmacSha256,
}

impl FlashKey {
    pub fn new(secret: &[u8]) -> Result<Self, hmac::digest::InvalidLength> {
        Ok(Self {
            mac: HmacSha256::new_from_slice(secret)?,
        })
    }

    pub fn encode(&self, alerts: &[Alert]) -> serde_json::Result<String> {
        let payload = serde_json::to_vec(alerts)?;
        let mut mac = self.mac.clone();
        mac.update(&payload);
        let signature = mac.finalize().into_bytes();
        Ok(format!(
            "{}.{}",
            URL_SAFE_NO_PAD.encode(&payload),
            URL_SAFE_NO_PAD.encode(signature)
        ))
    }

    /// Returns the alerts only if the signature checks out.
    pub fn decode(&self, value: &str) -> Option<Vec<Alert>> {
        let (payload, signature) = value.split_once('.')?;
        let payload = URL_SAFE_NO_PAD.decode(payload).ok()?;
        let signature = URL_SAFE_NO_PAD.decode(signature).ok()?;

        let mut mac = self.mac.clone();
        mac.update(&payload);
        if mac.verify_slice(&signature).is_err() {
            debug!("discarding flash cookie with a bad signature");
            return None;
        }
        serde_json::from_slice(&payload).ok()
    }
}

/// The pending alerts for this request.
///
/// Return it as a response part to persist changes; untouched alerts leave
/// the cookie as it was.
pub struct Flash {
    key: FlashKey,
    alerts: Vec<Alert>,
    changed: bool,
}

impl Flash {
    pub fn from_headers(headers: &HeaderMap, key: &FlashKey) -> Self {
        let alerts = read_cookie(headers, FLASH_COOKIE)
            .and_then(|value| key.decode(value))
            .unwrap_or_default();
        Self {
            key: key.clone(),
            alerts,
            changed: false,
        }
    }

    pub fn push(&mut self, alert: Alert) {
        self.alerts.push(alert);
        self.changed = true;
    }

    pub fn success(&mut self, message: impl Into<String>) {
        self.push(Alert::success(message));
    }

    pub fn danger(&mut self, message: impl Into<String>) {
        self.push(Alert::danger(message));
    }

    /// Drains the alerts for display; they will not be shown again.
    pub fn take(&mut self) -> Vec<Alert> {
        if !self.alerts.is_empty() {
            self.changed = true;
        }
        std::mem::take(&mut self.alerts)
    }

    pub fn alerts(&self) -> &[Alert] {
        &self.alerts
    }
}

impl FromRequestParts<AppState> for Flash {
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        Ok(Flash::from_headers(&parts.headers, &state.flash_key))
    }
}

impl IntoResponseParts for Flash {
    type Error = (StatusCode, &'static str);

    fn into_response_parts(self, mut res: ResponseParts) -> Result<ResponseParts, Self::Error> {
        if !self.changed {
            return Ok(res);
        }
        let header = if self.alerts.is_empty() {
            cookie_header(FLASH_COOKIE, "", true)
        } else {
            self.key
                .encode(&self.alerts)
                .ok()
                .and_then(|value| cookie_header(FLASH_COOKIE, &value, false))
        };
        let header = header.ok_or((StatusCode::INTERNAL_SERVER_ERROR, "cannot encode alerts"))?;
        res.headers_mut().append(SET_COOKIE, header);
        Ok(res)
    }
}
