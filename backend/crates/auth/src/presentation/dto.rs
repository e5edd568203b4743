//! API DTOs (Data Transfer Objects)

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::entity::device_session::DeviceSession;

// ============================================================================
// Login
// ============================================================================

/// Login request
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    /// Login handle or email
    pub login_or_email: String,
    pub password: String,
}

/// Access token response, also returned by refresh
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessTokenResponse {
    pub access_token: String,
}

/// Current user response
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MeResponse {
    pub user_id: String,
    pub login: String,
    pub email: String,
}

// ============================================================================
// Registration
// ============================================================================

/// Registration request
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationRequest {
    pub login: String,
    pub email: String,
    pub password: String,
}

/// Registration confirmation request
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmationRequest {
    pub code: String,
}

/// Confirmation email resend request
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResendRequest {
    pub email: String,
}

// ============================================================================
// Password Recovery
// ============================================================================

/// Password recovery request
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecoveryRequest {
    pub email: String,
}

/// New password request
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewPasswordRequest {
    pub new_password: String,
    pub recovery_code: String,
}

// ============================================================================
// Device Sessions
// ============================================================================

/// Active device session view
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceViewModel {
    pub device_id: String,
    pub ip: String,
    pub title: String,
    /// Last token issuance time, ISO 8601
    pub last_active_date: String,
}

impl DeviceViewModel {
    pub fn from_session(session: &DeviceSession) -> Self {
        let last_active = DateTime::<Utc>::from_timestamp(session.iat, 0)
            .unwrap_or_else(Utc::now)
            .to_rfc3339();

        Self {
            device_id: session.device_id.to_string(),
            ip: session.ip.clone().unwrap_or_else(|| "unknown".to_string()),
            title: session.device_title.clone(),
            last_active_date: last_active,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::value_object::{DeviceId, UserId};

    #[test]
    fn test_device_view_model_fields() {
        let session = DeviceSession::new(
            UserId::new(),
            DeviceId::new(),
            Some("10.0.0.1".to_string()),
            "Firefox on Linux".to_string(),
            1_700_000_000,
            1_700_001_200,
        );

        let view = DeviceViewModel::from_session(&session);
        assert_eq!(view.ip, "10.0.0.1");
        assert_eq!(view.title, "Firefox on Linux");
        assert!(view.last_active_date.starts_with("2023-11-14T"));

        let json = serde_json::to_value(&view).unwrap();
        assert!(json.get("deviceId").is_some());
        assert!(json.get("lastActiveDate").is_some());
    }

    #[test]
    fn test_login_request_camel_case() {
        let req: LoginRequest =
            serde_json::from_str(r#"{"loginOrEmail":"alice","password":"Pwd123"}"#).unwrap();
        assert_eq!(req.login_or_email, "alice");
    }
}
