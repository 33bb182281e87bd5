use serde::{Deserialize, Serialize};

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;

/// A backend record identifier.
///
/// The backend is inconsistent about id types: some endpoints return numeric
/// ids, others return strings. Both deserialize into this untagged enum and
/// serialize back out unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RecordId {
    Int(i64),
    Str(String),
}

impl std::fmt::Display for RecordId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RecordId::Int(n) => write!(f, "{n}"),
            RecordId::Str(s) => write!(f, "{s}"),
        }
    }
}

impl From<i64> for RecordId {
    fn from(id: i64) -> Self {
        RecordId::Int(id)
    }
}

impl From<&str> for RecordId {
    fn from(id: &str) -> Self {
        RecordId::Str(id.to_string())
    }
}

/// The locally-synthesized user record for an authenticated session.
///
/// Built from the login form input, not from server identity claims; the
/// backend's login response carries only a token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionUser {
    /// Username entered at login.
    pub username: String,
    /// Optional display name, when one is known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl SessionUser {
    /// Synthesize a user record from a login username.
    pub fn from_username(username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            name: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_id_deserializes_from_number_and_string() {
        let n: RecordId = serde_json::from_str("42").unwrap();
        assert_eq!(n, RecordId::Int(42));

        let s: RecordId = serde_json::from_str("\"abc-123\"").unwrap();
        assert_eq!(s, RecordId::Str("abc-123".to_string()));
    }

    #[test]
    fn record_id_display_matches_wire_form() {
        assert_eq!(RecordId::Int(7).to_string(), "7");
        assert_eq!(RecordId::from("g-9").to_string(), "g-9");
    }

    #[test]
    fn session_user_round_trips_without_name() {
        let user = SessionUser::from_username("admin");
        let json = serde_json::to_string(&user).unwrap();
        assert_eq!(json, r#"{"username":"admin"}"#);

        let back: SessionUser = serde_json::from_str(&json).unwrap();
        assert_eq!(back, user);
    }
}
