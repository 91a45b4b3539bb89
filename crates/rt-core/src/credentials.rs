//! Plaintext username/password table.
//!
//! Keys are stored lowercase; lookups are exact, so callers lowercase the
//! submitted username before checking.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CredentialTable(BTreeMap<String, String>);

impl CredentialTable {
    pub fn new(entries: BTreeMap<String, String>) -> Self {
        Self(entries)
    }

    /// True iff `username` is present and maps to exactly `password`.
    pub fn check(&self, username: &str, password: &str) -> bool {
        self.0
            .get(username)
            .is_some_and(|stored| stored == password)
    }

    pub fn usernames(&self) -> Vec<String> {
        self.0.keys().cloned().collect()
    }
}

impl<K, V> FromIterator<(K, V)> for CredentialTable
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}
