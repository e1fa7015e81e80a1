use std::fmt::Debug;

use serde::{Deserialize, Serialize};
use typed_builder::TypedBuilder;

#[derive(Debug, TypedBuilder)]
pub struct Credentials {
    pub phone: PhoneNumber,
    pub password: Password,
}

/// Subscriber number in the carrier's format, e.g. `33600000000`.
#[derive(
    Clone,
    PartialEq,
    Eq,
    Debug,
    derive_more::From,
    derive_more::AsRef,
    derive_more::Display,
    Serialize,
    Deserialize,
)]
#[as_ref(forward)]
pub struct PhoneNumber(String);

impl PhoneNumber {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[derive(Clone, derive_more::From, derive_more::AsRef, Serialize)]
#[as_ref(forward)]
pub struct Password(String);
impl Debug for Password {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Password(***)")
    }
}

/// Value sent in the `Cookie` header of authenticated requests.
/// Built from every `Set-Cookie` header of a successful login.
#[derive(Clone, PartialEq, Eq, Debug, derive_more::From, derive_more::Display)]
pub struct SessionCookie(String);

impl SessionCookie {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}
