//! # Access Guard
//!
//! Pre-checks that run before a protected operation. Each gate returns a
//! [`Decision`]; denial is normal control flow, not an error.

use tracing::warn;

use crate::models::{Alert, Message};
use crate::traits::MessageStore;

pub const LOGIN_ROUTE: &str = "/login/";
pub const HOME_ROUTE: &str = "/";

pub const UNABLE_TO_LOAD: &str = "Unable to load message";
pub const NOT_AUTHORIZED: &str = "User not authorized to view message";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision<T> {
    Proceed(T),
    Deny(Denial),
}

/// Where to send a rejected request, and what to tell the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Denial {
    pub redirect: &'static str,
    pub alert: Option<Alert>,
}

impl Denial {
    fn to_login() -> Self {
        Self {
            redirect: LOGIN_ROUTE,
            alert: None,
        }
    }

    fn to_home(message: &str) -> Self {
        Self {
            redirect: HOME_ROUTE,
            alert: Some(Alert::danger(message)),
        }
    }
}

/// A caller allowed to act on a message, plus the message itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Authorized {
    pub user: String,
    pub message: Message,
}

/// Passes the username through when one is present and non-empty.
pub fn authenticate(identity: Option<&str>) -> Decision<String> {
    match identity {
        Some(user) if !user.is_empty() => Decision::Proceed(user.to_string()),
        _ => Decision::Deny(Denial::to_login()),
    }
}

/// Authenticates, loads the message, then requires the caller to be its
/// sender or recipient. The comparison is case-sensitive.
pub async fn authorize(
    identity: Option<&str>,
    message_id: &str,
    store: &dyn MessageStore,
) -> Decision<Authorized> {
    let user = match authenticate(identity) {
        Decision::Proceed(user) => user,
        Decision::Deny(denial) => return Decision::Deny(denial),
    };

    let message = match store.fetch(message_id).await {
        Ok(message) => message,
        Err(e) => {
            warn!(%user, message_id, error = %e, "failed to load message for authorization");
            return Decision::Deny(Denial::to_home(UNABLE_TO_LOAD));
        }
    };

    if !message.involves(&user) {
        warn!(%user, message_id, "user is neither sender nor recipient");
        return Decision::Deny(Denial::to_home(NOT_AUTHORIZED));
    }

    Decision::Proceed(Authorized { user, message })
}
