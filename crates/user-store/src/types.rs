//! Identity record types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One registered identity. Keyed by username in the persisted document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserRecord {
    /// Phone number in E.164 format (e.g., "+14155550123").
    pub number: String,

    /// Validation code texted to the number at registration. `Some` means
    /// the identity is still pending; `None` means it is active. This is
    /// the sole state discriminator.
    pub auth_code: Option<String>,

    /// Suppresses channel-to-SMS delivery when set. Has no effect on the
    /// SMS-to-channel direction.
    #[serde(default)]
    pub quiet: bool,

    /// When the identity was registered. Makes lookup order deterministic.
    #[serde(default = "Utc::now")]
    pub registered_at: DateTime<Utc>,
}

impl UserRecord {
    /// Create a pending record awaiting code confirmation.
    pub fn pending(number: String, auth_code: String) -> Self {
        Self {
            number,
            auth_code: Some(auth_code),
            quiet: false,
            registered_at: Utc::now(),
        }
    }

    /// An identity is active once its auth code has been cleared.
    pub fn is_active(&self) -> bool {
        self.auth_code.is_none()
    }
}

/// Result of a successful registration: what the workflow needs to text
/// the validation code to the new user.
#[derive(Debug, Clone)]
pub struct PendingRegistration {
    pub username: String,
    pub number: String,
    pub auth_code: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pending_record_is_not_active() {
        let record = UserRecord::pending("+14155550123".into(), "483921".into());
        assert!(!record.is_active());
        assert!(!record.quiet);
    }

    #[test]
    fn record_without_code_is_active() {
        let mut record = UserRecord::pending("+14155550123".into(), "483921".into());
        record.auth_code = None;
        assert!(record.is_active());
    }

    #[test]
    fn record_deserializes_with_defaults() {
        // Files written before the quiet/registered_at fields existed
        // still load.
        let json = r#"{"number": "+14155550123", "auth_code": null}"#;
        let record: UserRecord = serde_json::from_str(json).unwrap();
        assert!(record.is_active());
        assert!(!record.quiet);
    }

    #[test]
    fn record_serialization_round_trip() {
        let record = UserRecord::pending("+14155550123".into(), "012345".into());
        let json = serde_json::to_string(&record).unwrap();
        let restored: UserRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(restored.number, "+14155550123");
        assert_eq!(restored.auth_code.as_deref(), Some("012345"));
    }
}
