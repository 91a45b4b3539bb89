use rt_core::traits::{CredentialStore, MessageStore};
use std::sync::Arc;

use crate::flash::FlashKey;

/// State shared across all request handlers.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn MessageStore>,
    pub credentials: Arc<dyn CredentialStore>,
    pub flash_key: FlashKey,
}
