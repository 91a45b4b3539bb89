//! Identity cookie plumbing.
//!
//! The signed-in username travels in `logged_in_as`; an empty value means
//! signed out.

use axum::http::header::{COOKIE, SET_COOKIE};
use axum::http::{HeaderMap, HeaderValue};
use axum::response::{IntoResponseParts, ResponseParts};
use std::convert::Infallible;

pub const IDENTITY_COOKIE: &str = "logged_in_as";

/// Finds a cookie by name across every `Cookie` header.
pub fn read_cookie<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value)
}

/// The caller's username, if the identity cookie is present and non-empty.
pub fn identity(headers: &HeaderMap) -> Option<&str> {
    read_cookie(headers, IDENTITY_COOKIE).filter(|user| !user.is_empty())
}

pub(crate) fn cookie_header(name: &str, value: &str, expire: bool) -> Option<HeaderValue> {
    let mut cookie = format!("{name}={value}; Path=/; HttpOnly; SameSite=Lax");
    if expire {
        cookie.push_str("; Max-Age=0");
    }
    HeaderValue::from_str(&cookie).ok()
}

/// Response part that sets the identity cookie.
pub struct SetIdentity(HeaderValue);

impl SetIdentity {
    /// `None` when `username` cannot travel as a bare cookie value.
    pub fn new(username: &str) -> Option<Self> {
        let storable = !username.is_empty()
            && username
                .bytes()
                .all(|b| b.is_ascii_graphic() && !matches!(b, b';' | b',' | b'"' | b'\\'));
        if !storable {
            return None;
        }
        cookie_header(IDENTITY_COOKIE, username, false).map(Self)
    }

    /// An empty identity, which reads as signed out.
    pub fn signed_out() -> Self {
        Self(HeaderValue::from_static("logged_in_as=; Path=/; HttpOnly; SameSite=Lax"))
    }
}

impl IntoResponseParts for SetIdentity {
    type Error = Infallible;

    fn into_response_parts(self, mut res: ResponseParts) -> Result<ResponseParts, Self::Error> {
        res.headers_mut().append(SET_COOKIE, self.0);
        Ok(res)
    }
}
