//! # rt-api Handlers
//!
//! This module coordinates the flow between HTTP requests and Core traits.
//! Handlers that change state finish with an alert and a redirect; the
//! rest render a page and drain pending alerts.

use askama::Template;
use axum::extract::{Form, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{Html, IntoResponse, Redirect, Response};
use chrono::Utc;
use rt_core::guard::{HOME_ROUTE, LOGIN_ROUTE};
use rt_core::models::NewMessage;
use rt_core::validation::{validate_login_form, validate_message_form};
use rt_core::ValidationError;
use rt_ui::{
    ComposeTemplate, DeleteMessageTemplate, ListMessagesTemplate, LoggedOutTemplate,
    LoginTemplate, ShredTemplate, ViewMessageTemplate,
};
use std::collections::HashMap;
use tracing::{error, info, warn};

use crate::extract::{AuthorizedMessage, CurrentUser};
use crate::flash::Flash;
use crate::session::{self, SetIdentity};
use crate::state::AppState;

const COMPOSE_ROUTE: &str = "/compose/";

fn render<T: Template>(template: &T) -> Result<Html<String>, StatusCode> {
    template.render().map(Html).map_err(|e| {
        error!(error = %e, "template rendering failed");
        StatusCode::INTERNAL_SERVER_ERROR
    })
}

/// Queues one danger alert per validation problem and redirects back to the form.
fn reject_form(mut flash: Flash, errors: Vec<ValidationError>, back_to: &'static str) -> Response {
    for e in errors {
        flash.danger(e.to_string());
    }
    (flash, Redirect::to(back_to)).into_response()
}

/// GET `/`: the caller's received and sent messages, newest first.
pub async fn list_messages(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    mut flash: Flash,
) -> Response {
    let sent = state.store.list_sent_by(&user).await;
    let received = state.store.list_received_by(&user).await;
    let (sent_messages, received_messages) = match (sent, received) {
        (Ok(sent), Ok(received)) => (sent, received),
        (Err(e), _) | (_, Err(e)) => {
            error!(%user, error = %e, "failed to list messages");
            flash.danger("Unable to load messages.");
            (Vec::new(), Vec::new())
        }
    };

    let page = ListMessagesTemplate {
        alerts: flash.take(),
        user: Some(user),
        sent_messages,
        received_messages,
    };
    (flash, render(&page)).into_response()
}

/// GET `/compose/`: the message form, addressed to anyone but the caller.
pub async fn show_compose_form(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    mut flash: Flash,
) -> Response {
    let people = match state.credentials.usernames().await {
        Ok(mut people) => {
            people.retain(|p| *p != user);
            people
        }
        Err(e) => {
            error!(error = %e, "failed to load usernames");
            flash.danger("Unable to load recipients.");
            Vec::new()
        }
    };

    let page = ComposeTemplate {
        alerts: flash.take(),
        user: Some(user),
        people,
    };
    (flash, render(&page)).into_response()
}

/// POST `/compose/`: validates the form and stores the message as sent by the caller.
pub async fn send_message(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    mut flash: Flash,
    Form(mut form): Form<HashMap<String, String>>,
) -> Response {
    let errors = validate_message_form(&form);
    if !errors.is_empty() {
        warn!(%user, problems = errors.len(), "rejected message form");
        return reject_form(flash, errors, COMPOSE_ROUTE);
    }

    let message = NewMessage {
        to: form.remove("to").unwrap_or_default(),
        from: user,
        subject: form.remove("subject").unwrap_or_default(),
        body: form.remove("body").unwrap_or_default(),
        time: Utc::now().naive_utc(),
    };
    let (from, to) = (message.from.clone(), message.to.clone());

    match state.store.create(message).await {
        Ok(id) => {
            info!(%id, %from, %to, "message sent");
            flash.success("Message sent!");
            (flash, Redirect::to(HOME_ROUTE)).into_response()
        }
        Err(e) => {
            error!(%from, %to, error = %e, "failed to store message");
            flash.danger("Unable to send message.");
            (flash, Redirect::to(COMPOSE_ROUTE)).into_response()
        }
    }
}

/// GET/POST `/view/{id}/`
pub async fn view_message(auth: AuthorizedMessage, mut flash: Flash) -> Response {
    let page = ViewMessageTemplate {
        alerts: flash.take(),
        user: Some(auth.user),
        message: auth.message,
    };
    (flash, render(&page)).into_response()
}

/// GET `/delete/{id}/`: confirmation page; nothing is removed yet.
pub async fn show_delete_form(auth: AuthorizedMessage, mut flash: Flash) -> Response {
    let page = DeleteMessageTemplate {
        alerts: flash.take(),
        user: Some(auth.user),
        message: auth.message,
    };
    (flash, render(&page)).into_response()
}

/// POST `/delete/{id}/`
pub async fn delete_message(
    State(state): State<AppState>,
    auth: AuthorizedMessage,
    mut flash: Flash,
) -> Response {
    let id = auth.message.id;
    match state.store.delete(&id).await {
        Ok(()) => {
            info!(%id, user = %auth.user, "message deleted");
            flash.success(format!("Deleted {id}."));
        }
        Err(e) => {
            warn!(%id, user = %auth.user, error = %e, "failed to delete message");
            flash.danger(format!("No such message {id}"));
        }
    }
    (flash, Redirect::to(HOME_ROUTE)).into_response()
}

/// GET `/shred/`: confirmation page for removing every message.
pub async fn show_shred_form(CurrentUser(user): CurrentUser, mut flash: Flash) -> Response {
    let page = ShredTemplate {
        alerts: flash.take(),
        user: Some(user),
    };
    (flash, render(&page)).into_response()
}

/// POST `/shred/`
pub async fn shred_messages(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    mut flash: Flash,
) -> Response {
    match state.store.clear_all().await {
        Ok(()) => {
            info!(%user, "all messages shredded");
            flash.success("Shredded all messages.");
        }
        Err(e) => {
            error!(%user, error = %e, "failed to shred messages");
            flash.danger("Failed to shred messages.");
        }
    }
    (flash, Redirect::to(HOME_ROUTE)).into_response()
}

/// GET `/login/`
pub async fn show_login_form(headers: HeaderMap, mut flash: Flash) -> Response {
    let page = LoginTemplate {
        alerts: flash.take(),
        user: session::identity(&headers).map(str::to_owned),
    };
    (flash, render(&page)).into_response()
}

/// POST `/login/`: usernames are case-insensitive, passwords are not.
pub async fn login(
    State(state): State<AppState>,
    mut flash: Flash,
    Form(form): Form<HashMap<String, String>>,
) -> Response {
    let errors = validate_login_form(&form);
    if !errors.is_empty() {
        return reject_form(flash, errors, LOGIN_ROUTE);
    }

    let username = form["username"].to_lowercase();
    let verified = match state.credentials.check(&username, &form["password"]).await {
        Ok(verified) => verified,
        Err(e) => {
            error!(error = %e, "failed to load credentials");
            false
        }
    };

    if !verified {
        warn!(%username, "failed login");
        flash.danger("Incorrect username/password information.");
        return (flash, Redirect::to(LOGIN_ROUTE)).into_response();
    }

    let Some(identity) = SetIdentity::new(&username) else {
        error!(%username, "username cannot be stored in the identity cookie");
        flash.danger(format!("Unable to log in as {username}."));
        return (flash, Redirect::to(LOGIN_ROUTE)).into_response();
    };

    info!(%username, "logged in");
    flash.success(format!("Successfully logged in as {username}."));
    (identity, flash, Redirect::to(HOME_ROUTE)).into_response()
}

/// GET `/logout/`
pub async fn logout(mut flash: Flash) -> Response {
    let page = LoggedOutTemplate {
        alerts: flash.take(),
        user: None,
    };
    (SetIdentity::signed_out(), flash, render(&page)).into_response()
}
