//! Wire types of the HTTP API
//!
//! Field names are camelCase on the wire. Requests accept the participant's
//! phone number under `identity`, `phone` or `whatsapp`; missing fields
//! deserialize to empty strings so validation reports them as invalid
//! arguments instead of decode failures.

use crate::service::{ClaimOutcome, ParticipantStatus, Registration, SpinOutcome};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RegisterRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default, alias = "identity", alias = "whatsapp")]
    pub phone: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RegisterResponse {
    pub success: bool,
    pub is_new_identity: bool,
}

impl From<Registration> for RegisterResponse {
    fn from(registration: Registration) -> Self {
        RegisterResponse {
            success: true,
            is_new_identity: registration.is_new_identity,
        }
    }
}

/// Body of `/spin` and `/status`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IdentityRequest {
    #[serde(default, alias = "phone", alias = "whatsapp")]
    pub identity: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SpinResponse {
    pub prize: String,
    /// Degrees to rotate the wheel, whole extra turns included
    pub target_angle: f64,
    pub claimed_today: u64,
}

impl From<SpinOutcome> for SpinResponse {
    fn from(outcome: SpinOutcome) -> Self {
        SpinResponse {
            prize: outcome.prize.code().to_string(),
            target_angle: outcome.angle,
            claimed_today: outcome.claimed_today,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClaimRequest {
    #[serde(default, alias = "phone", alias = "whatsapp")]
    pub identity: String,
    #[serde(default)]
    pub prize: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ClaimResponse {
    pub coupon_number: u64,
    pub coupon_code: String,
    pub prize: String,
}

impl From<ClaimOutcome> for ClaimResponse {
    fn from(outcome: ClaimOutcome) -> Self {
        ClaimResponse {
            coupon_number: outcome.coupon_serial,
            coupon_code: outcome.coupon_code,
            prize: outcome.prize.code().to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StatusResponse {
    pub identity: String,
    pub spins_used: u64,
    pub spins_remaining: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_spin_at: Option<DateTime<Utc>>,
    pub claims_today: u64,
    pub claims_remaining: u64,
}

impl From<ParticipantStatus> for StatusResponse {
    fn from(status: ParticipantStatus) -> Self {
        StatusResponse {
            identity: status.identity.into_string(),
            spins_used: status.spins_used,
            spins_remaining: status.spins_remaining,
            next_spin_at: status.next_spin_at,
            claims_today: status.claims_today,
            claims_remaining: status.claims_remaining,
        }
    }
}

/// Error response format
///
/// ```json
/// {
///   "error": "spin_limit_reached",
///   "message": "spin quota exceeded, retry at 2024-05-02 22:00:00 UTC",
///   "retryAt": "2024-05-02T22:00:00Z"
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retry_at: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_aliases() {
        for body in [
            r#"{"identity": "21999998888"}"#,
            r#"{"phone": "21999998888"}"#,
            r#"{"whatsapp": "21999998888"}"#,
        ] {
            let request: IdentityRequest = serde_json::from_str(body).unwrap();
            assert_eq!(request.identity, "21999998888");
        }

        let request: RegisterRequest =
            serde_json::from_str(r#"{"name": "Ana", "whatsapp": "21999998888"}"#).unwrap();
        assert_eq!(request.phone, "21999998888");
    }

    #[test]
    fn test_missing_fields_default_to_empty() {
        let request: ClaimRequest = serde_json::from_str("{}").unwrap();
        assert!(request.identity.is_empty());
        assert!(request.prize.is_empty());
    }

    #[test]
    fn test_responses_use_camel_case() {
        let json = serde_json::to_value(SpinResponse {
            prize: "COMBO".into(),
            target_angle: 1390.5,
            claimed_today: 1,
        })
        .unwrap();
        assert_eq!(json["targetAngle"], 1390.5);
        assert_eq!(json["claimedToday"], 1);

        let json = serde_json::to_value(ErrorResponse {
            error: "invalid_argument".into(),
            message: "bad".into(),
            retry_at: None,
        })
        .unwrap();
        assert!(json.get("retryAt").is_none());
    }
}
