//! Local subscriber records
//!
//! A [`Subscriber`] is keyed by the normalized (lowercased) form of its email.
//! Removal is a soft marker (`deleted_at`), so a re-signup restores the same
//! record instead of creating a new identity.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::validate_email;

/// A syntactically valid email address
///
/// The address keeps the casing it was given with; comparisons and store
/// keys go through [`SubscriberEmail::normalized`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubscriberEmail(String);

impl SubscriberEmail {
    /// Parse and validate an email address
    pub fn parse(raw: impl AsRef<str>) -> Result<Self, crate::Error> {
        let trimmed = raw.as_ref().trim();

        if !validate_email(trimmed) {
            return Err(crate::Error::invalid_email(trimmed));
        }

        Ok(Self(trimmed.to_string()))
    }

    /// Lowercased form used for uniqueness and lookups
    pub fn normalized(&self) -> String {
        normalize_email(&self.0)
    }
}

impl AsRef<str> for SubscriberEmail {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl PartialEq for SubscriberEmail {
    fn eq(&self, other: &Self) -> bool {
        self.normalized() == other.normalized()
    }
}

impl Eq for SubscriberEmail {}

impl std::fmt::Display for SubscriberEmail {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Normalize a raw address for case-insensitive comparison
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// A locally persisted signup
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subscriber {
    /// Stable identity, preserved across removal and restoration
    pub id: Uuid,
    /// The address as first submitted
    pub email: SubscriberEmail,
    /// When the record was created
    pub created_at: DateTime<Utc>,
    /// When the record last changed state
    pub updated_at: DateTime<Utc>,
    /// Soft-removal marker; `None` means active
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Subscriber {
    /// Create a new active record
    ///
    /// Only stores create records, so construction stays inside the crate.
    pub(crate) fn new(email: SubscriberEmail) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            email,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        }
    }

    /// Whether the record is soft-removed
    pub fn is_removed(&self) -> bool {
        self.deleted_at.is_some()
    }

    /// Normalized key of this record
    pub fn key(&self) -> String {
        self.email.normalized()
    }

    pub(crate) fn mark_removed(&mut self) {
        let now = Utc::now();
        self.deleted_at = Some(now);
        self.updated_at = now;
    }

    pub(crate) fn mark_restored(&mut self) {
        self.deleted_at = None;
        self.updated_at = Utc::now();
    }
}
