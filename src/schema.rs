use chrono::{DateTime, Utc};
use getset::Getters;
use serde::{Deserialize, Serialize};
use typed_builder::TypedBuilder;

/// Placeholder for fields the account page did not provide.
pub const UNKNOWN: &str = "unknown";

#[derive(Clone, PartialEq, Eq, Debug, TypedBuilder, Getters, Serialize, Deserialize)]
#[getset(get = "pub")]
pub struct AccountSnapshot {
    #[builder(setter(into))]
    phone: String,
    #[builder(setter(into))]
    balance: String,
    #[builder(setter(into))]
    internet: String,
    #[builder(setter(into))]
    expiration: String,
}

impl AccountSnapshot {
    /// Key/value pairs in display order.
    pub fn fields(&self) -> [(&'static str, &str); 4] {
        [
            ("phone", self.phone.as_str()),
            ("balance", self.balance.as_str()),
            ("internet", self.internet.as_str()),
            ("expiration", self.expiration.as_str()),
        ]
    }
}

/// The snapshot as stored between runs.
#[derive(Clone, PartialEq, Debug, Getters, Serialize, Deserialize)]
#[getset(get = "pub")]
pub struct CachedSnapshot {
    #[serde(flatten)]
    snapshot: AccountSnapshot,
    checked: DateTime<Utc>,
}

impl CachedSnapshot {
    pub fn new(snapshot: AccountSnapshot, checked: DateTime<Utc>) -> Self {
        Self { snapshot, checked }
    }
}
