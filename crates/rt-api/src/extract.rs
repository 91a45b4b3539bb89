//! Guard extractors.
//!
//! Adding one of these to a handler's arguments runs the matching gate
//! before the handler body. A denial short-circuits the request with a
//! redirect and, when the gate produced one, a flash alert.

use axum::extract::{FromRequestParts, Path};
use axum::http::request::Parts;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Redirect, Response};
use rt_core::guard::{self, Decision, Denial};
use rt_core::models::Message;

use crate::flash::Flash;
use crate::session;
use crate::state::AppState;

/// The signed-in username.
pub struct CurrentUser(pub String);

/// A message the signed-in user sent or received.
pub struct AuthorizedMessage {
    pub user: String,
    pub message: Message,
}

/// Message ids in paths are lowercase hyphenated UUIDs.
pub fn is_message_id(id: &str) -> bool {
    id.len() == 36
        && id
            .bytes()
            .all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b) || b == b'-')
}

fn deny(parts: &Parts, state: &AppState, denial: Denial) -> Response {
    let mut flash = Flash::from_headers(&parts.headers, &state.flash_key);
    if let Some(alert) = denial.alert {
        flash.push(alert);
    }
    (flash, Redirect::to(denial.redirect)).into_response()
}

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = Response;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        match guard::authenticate(session::identity(&parts.headers)) {
            Decision::Proceed(user) => Ok(CurrentUser(user)),
            Decision::Deny(denial) => Err(deny(parts, state, denial)),
        }
    }
}

impl FromRequestParts<AppState> for AuthorizedMessage {
    type Rejection = Response;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let Path(id) = Path::<String>::from_request_parts(parts, state)
            .await
            .map_err(IntoResponse::into_response)?;
        if !is_message_id(&id) {
            return Err(StatusCode::NOT_FOUND.into_response());
        }

        let identity = session::identity(&parts.headers).map(str::to_owned);
        match guard::authorize(identity.as_deref(), &id, state.store.as_ref()).await {
            Decision::Proceed(auth) => Ok(AuthorizedMessage {
                user: auth.user,
                message: auth.message,
            }),
            Decision::Deny(denial) => Err(deny(parts, state, denial)),
        }
    }
}
