//! # rt-ui
//!
//! Askama templates for every RocketTalk page. Each page carries the
//! pending alerts and the signed-in user for the shared layout.

use askama::Template;
use rt_core::models::{Alert, Message};

#[derive(Template)]
#[template(path = "list_messages.html")]
pub struct ListMessagesTemplate {
    pub alerts: Vec<Alert>,
    pub user: Option<String>,
    pub sent_messages: Vec<Message>,
    pub received_messages: Vec<Message>,
}

#[derive(Template)]
#[template(path = "compose_message.html")]
pub struct ComposeTemplate {
    pub alerts: Vec<Alert>,
    pub user: Option<String>,
    /// Everyone the user can write to
    pub people: Vec<String>,
}

#[derive(Template)]
#[template(path = "view_message.html")]
pub struct ViewMessageTemplate {
    pub alerts: Vec<Alert>,
    pub user: Option<String>,
    pub message: Message,
}

#[derive(Template)]
#[template(path = "delete_message.html")]
pub struct DeleteMessageTemplate {
    pub alerts: Vec<Alert>,
    pub user: Option<String>,
    pub message: Message,
}

#[derive(Template)]
#[template(path = "shred_messages.html")]
pub struct ShredTemplate {
    pub alerts: Vec<Alert>,
    pub user: Option<String>,
}

#[derive(Template)]
#[template(path = "login.html")]
pub struct LoginTemplate {
    pub alerts: Vec<Alert>,
    pub user: Option<String>,
}

#[derive(Template)]
#[template(path = "logged_out.html")]
pub struct LoggedOutTemplate {
    pub alerts: Vec<Alert>,
    pub user: Option<String>,
}
