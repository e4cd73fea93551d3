//! # User Directory & KYC Gate
//!
//! The wallet core doesn't own users — it asks a [`UserDirectory`] whether
//! a user id resolves and what their identity-verification status is. In
//! production that seam fronts the account service; here an in-memory
//! implementation ships for tests and demos.
//!
//! Only a [`KycStatus::Verified`] user may move money. The verification
//! pipeline itself (document upload, provider checks, webhook callbacks)
//! belongs to the directory's implementation; this crate treats whatever
//! status the directory reports as authoritative and current.

use async_trait::async_trait;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

// ---------------------------------------------------------------------------
// KycStatus
// ---------------------------------------------------------------------------

/// Where a user stands in the identity-verification pipeline.
///
/// The full pipeline is `None -> Pending -> Submitted -> Verified` with
/// `Rejected` reachable from any review stage. The wallet core only cares
/// about one question — is the user `Verified`? — but carries the full set
/// so callers can report *why* a gate closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KycStatus {
    /// Verification never started.
    None,
    /// Started, documents not yet submitted.
    Pending,
    /// Documents submitted, review in progress.
    Submitted,
    /// Identity confirmed. The only status that passes the money gate.
    Verified,
    /// Review failed. Requires a fresh submission to proceed.
    Rejected,
}

impl KycStatus {
    /// Whether this status passes the money-movement gate.
    pub fn is_verified(&self) -> bool {
        matches!(self, KycStatus::Verified)
    }
}

impl fmt::Display for KycStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KycStatus::None => write!(f, "none"),
            KycStatus::Pending => write!(f, "pending"),
            KycStatus::Submitted => write!(f, "submitted"),
            KycStatus::Verified => write!(f, "verified"),
            KycStatus::Rejected => write!(f, "rejected"),
        }
    }
}

// ---------------------------------------------------------------------------
// UserRecord
// ---------------------------------------------------------------------------

/// What the directory knows about a user, as far as the ledger cares.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRecord {
    /// The user's identifier.
    pub user_id: String,
    /// Current verification status.
    pub kyc_status: KycStatus,
}

impl UserRecord {
    /// Convenience constructor.
    pub fn new(user_id: &str, kyc_status: KycStatus) -> Self {
        Self {
            user_id: user_id.to_string(),
            kyc_status,
        }
    }
}

// ---------------------------------------------------------------------------
// UserDirectory
// ---------------------------------------------------------------------------

/// Resolves user ids to their verification state.
///
/// `None` means the id does not exist — the service reports that as
/// `UserNotFound` before any other check runs.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    /// Looks up a user by id.
    async fn lookup(&self, user_id: &str) -> Option<UserRecord>;
}

// ---------------------------------------------------------------------------
// InMemoryUserDirectory
// ---------------------------------------------------------------------------

/// Map-backed directory for tests and demos.
#[derive(Default)]
pub struct InMemoryUserDirectory {
    users: RwLock<HashMap<String, UserRecord>>,
}

impl InMemoryUserDirectory {
    /// Creates an empty directory.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces a user.
    pub fn insert(&self, record: UserRecord) {
        self.users.write().insert(record.user_id.clone(), record);
    }

    /// Updates an existing user's verification status. No-op for unknown ids.
    pub fn set_kyc_status(&self, user_id: &str, status: KycStatus) {
        if let Some(record) = self.users.write().get_mut(user_id) {
            record.kyc_status = status;
        }
    }
}

#[async_trait]
impl UserDirectory for InMemoryUserDirectory {
    async fn lookup(&self, user_id: &str) -> Option<UserRecord> {
        self.users.read().get(user_id).cloned()
    }
}
