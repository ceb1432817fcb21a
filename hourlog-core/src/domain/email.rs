use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A structurally valid email address.
///
/// Construction only goes through [`Email::parse`], and the serde
/// round trip re-validates, so a profile can never carry a broken
/// address no matter where the document came from.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Email(String);

#[derive(Debug, Error, PartialEq)]
pub enum EmailError {
    #[error("'{0}' is not an email address: expected exactly one '@'")]
    MissingOrRepeatedAt(String),
    #[error("'{0}' is not an email address: nothing before the '@'")]
    EmptyLocalPart(String),
    #[error("'{0}' is not an email address: malformed domain")]
    MalformedDomain(String),
}

impl Email {
    pub fn parse(value: impl Into<String>) -> Result<Self, EmailError> {
        let value = value.into();

        let Some((local, domain)) = value.split_once('@') else {
            return Err(EmailError::MissingOrRepeatedAt(value));
        };
        if domain.contains('@') {
            return Err(EmailError::MissingOrRepeatedAt(value));
        }
        if local.trim().is_empty() {
            return Err(EmailError::EmptyLocalPart(value));
        }

        let domain = domain.trim();
        if domain.is_empty()
            || !domain.contains('.')
            || domain.starts_with('.')
            || domain.ends_with('.')
        {
            return Err(EmailError::MalformedDomain(value));
        }

        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The canonical form used for cache keys and verification
    /// signatures: trimmed and lowercased.
    pub fn normalized(&self) -> String {
        normalize_email(&self.0).unwrap_or_default()
    }
}

/// Trims and lowercases an address, returning `None` for blank input.
pub fn normalize_email(email: &str) -> Option<String> {
    let normalized = email.trim().to_lowercase();
    if normalized.is_empty() {
        None
    } else {
        Some(normalized)
    }
}

impl TryFrom<String> for Email {
    type Error = EmailError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl TryFrom<&str> for Email {
    type Error = EmailError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl From<Email> for String {
    fn from(email: Email) -> Self {
        email.0
    }
}

impl AsRef<str> for Email {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Email {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}
