use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use smartlock_core::{CardUid, CredentialKind};

/// One credential presented at the lock, granted or denied.
///
/// `credential` identifies what was presented: the card UID in decimal form
/// for cards, the scanned text for barcodes. PIN entries never store the
/// digits, so `credential` is `None` for them.
///
/// # Examples
///
/// ```
/// use smartlock_core::CardUid;
/// use smartlock_storage::models::AccessLog;
/// use chrono::Utc;
///
/// let log = AccessLog::card(CardUid::new([172, 61, 255, 160]), true, "ACCESS GRANTED", Utc::now());
/// assert!(log.was_granted());
/// assert_eq!(log.credential.as_deref(), Some("172:61:255:160"));
///
/// let pin = AccessLog::pin(false, "ACCESS DENIED", Utc::now());
/// assert!(pin.was_denied());
/// assert_eq!(pin.credential, None);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct AccessLog {
    /// Auto-increment primary key
    pub id: i64,

    /// `card`, `pin` or `barcode`
    pub credential_kind: String,

    pub credential: Option<String>,

    pub granted: bool,

    /// First display line shown for the attempt
    pub display_message: Option<String>,

    /// When the credential was presented
    pub timestamp: DateTime<Utc>,

    /// When the entry was written
    pub created_at: DateTime<Utc>,
}

impl AccessLog {
    pub fn new(
        kind: CredentialKind,
        credential: Option<String>,
        granted: bool,
        display_message: impl Into<String>,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            id: 0,
            credential_kind: kind.as_str().to_string(),
            credential,
            granted,
            display_message: Some(display_message.into()),
            timestamp,
            created_at: Utc::now(),
        }
    }

    pub fn card(
        uid: CardUid,
        granted: bool,
        display_message: impl Into<String>,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self::new(
            CredentialKind::Card,
            Some(uid.to_string()),
            granted,
            display_message,
            timestamp,
        )
    }

    pub fn pin(granted: bool, display_message: impl Into<String>, timestamp: DateTime<Utc>) -> Self {
        Self::new(CredentialKind::Pin, None, granted, display_message, timestamp)
    }

    pub fn barcode(
        code: impl Into<String>,
        granted: bool,
        display_message: impl Into<String>,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self::new(
            CredentialKind::Barcode,
            Some(code.into()),
            granted,
            display_message,
            timestamp,
        )
    }

    /// The credential kind as an enum, `None` for unknown stored values.
    pub fn kind(&self) -> Option<CredentialKind> {
        self.credential_kind.parse().ok()
    }

    pub fn was_granted(&self) -> bool {
        self.granted
    }

    pub fn was_denied(&self) -> bool {
        !self.granted
    }
}
