//! Submitted-form validation.
//!
//! Every required field is checked in declaration order and every problem is
//! reported; nothing short-circuits.

use std::collections::HashMap;

use crate::error::ValidationError;

pub const LOGIN_FIELDS: [&str; 2] = ["username", "password"];
pub const MESSAGE_FIELDS: [&str; 3] = ["to", "subject", "body"];

pub fn validate_login_form(form: &HashMap<String, String>) -> Vec<ValidationError> {
    validate_required(form, &LOGIN_FIELDS)
}

pub fn validate_message_form(form: &HashMap<String, String>) -> Vec<ValidationError> {
    validate_required(form, &MESSAGE_FIELDS)
}

fn validate_required(
    form: &HashMap<String, String>,
    fields: &[&'static str],
) -> Vec<ValidationError> {
    fields
        .iter()
        .filter_map(|&field| match form.get(field) {
            None => Some(ValidationError::Missing(field)),
            Some(value) if value.is_empty() => Some(ValidationError::Blank(field)),
            Some(_) => None,
        })
        .collect()
}
