//! Session data model and the provider's token response shape.

use crate::error::{AuthError, Result};
use chrono::{DateTime, Duration, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Lifetime assumed when the provider names neither `expires_in` nor a JWT
/// `exp` claim.
pub const DEFAULT_TOKEN_LIFETIME_SECS: i64 = 3600;

/// The three network operations against the token endpoint.
///
/// Named in error messages and used as the slug of the matching diagnostic
/// snapshot file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationKind {
    /// Full authentication (password grant or web-session capture)
    Authentication,
    /// Refresh-token grant
    TokenRefresh,
    /// Authorization-code exchange
    CodeExchange,
}

impl OperationKind {
    /// Slug used in snapshot file names (`last-<slug>.json`).
    pub fn slug(&self) -> &'static str {
        match self {
            OperationKind::Authentication => "authentication",
            OperationKind::TokenRefresh => "token-refresh",
            OperationKind::CodeExchange => "code-exchange",
        }
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            OperationKind::Authentication => "authentication",
            OperationKind::TokenRefresh => "token refresh",
            OperationKind::CodeExchange => "code exchange",
        };
        write!(f, "{}", name)
    }
}

/// Decoded JWT claims the provider embeds in its token responses.
///
/// Only `exp` is interpreted; everything else is carried through the cache
/// untouched so nothing the provider sends is lost across invocations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JwtClaims {
    /// Expiry as a unix timestamp in seconds.
    pub exp: i64,
    #[serde(flatten)]
    pub extra: HashMap<String, serde_json::Value>,
}

/// A cached, usable session.
///
/// Persisted verbatim to the session cache file; the `jwt` field name matches
/// the provider's response shape so a captured web-session blob deserializes
/// directly.
#[derive(Clone, Serialize, Deserialize)]
pub struct Session {
    pub access_token: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    #[serde(rename = "jwt", skip_serializing_if = "Option::is_none")]
    pub claims: Option<JwtClaims>,
    pub expires_at: DateTime<Utc>,
}

impl Session {
    /// Whether the session is still usable at `now`.
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        now < self.expires_at
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("access_token", &"[REDACTED]")
            .field(
                "refresh_token",
                &self.refresh_token.as_ref().map(|_| "[REDACTED]"),
            )
            .field("claims", &self.claims)
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// Wire shape of the provider's token endpoint responses.
///
/// Every field is optional because success and failure share one shape; the
/// body content, not the HTTP status, decides which one arrived.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TokenResponse {
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
    pub expires_in: Option<i64>,
    pub jwt: Option<JwtClaims>,
    pub error: Option<String>,
    pub error_description: Option<String>,
}

impl TokenResponse {
    /// Classify the response body and build a [`Session`] from it.
    ///
    /// An `error_description` wins over everything else; a body without an
    /// access token is a failure naming the operation. Expiry comes from the
    /// JWT `exp` claim when present, otherwise from `expires_in` relative to
    /// `now`. A JWT expiry in the past is stored as-is; the next read will
    /// classify the session as expired.
    pub fn into_session(self, operation: OperationKind, now: DateTime<Utc>) -> Result<Session> {
        if let Some(description) = self.error_description {
            return Err(AuthError::Provider {
                operation,
                description,
            });
        }
        if let Some(error) = self.error {
            return Err(AuthError::Provider {
                operation,
                description: error,
            });
        }

        let access_token = self
            .access_token
            .ok_or(AuthError::MissingAccessToken { operation })?;

        let expires_at = match &self.jwt {
            Some(claims) => Utc
                .timestamp_opt(claims.exp, 0)
                .single()
                .ok_or_else(|| AuthError::Provider {
                    operation,
                    description: format!("Unrepresentable exp claim: {}", claims.exp),
                })?,
            None => {
                let lifetime = self.expires_in.unwrap_or(DEFAULT_TOKEN_LIFETIME_SECS);
                now + Duration::seconds(lifetime)
            }
        };

        Ok(Session {
            access_token,
            refresh_token: self.refresh_token,
            claims: self.jwt,
            expires_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_error_description_wins_over_token() {
        let response = TokenResponse {
            access_token: Some("tok".to_string()),
            error_description: Some("account locked".to_string()),
            ..Default::default()
        };
        let err = response
            .into_session(OperationKind::Authentication, now())
            .unwrap_err();
        assert!(matches!(err, AuthError::Provider { description, .. } if description == "account locked"));
    }

    #[test]
    fn test_missing_access_token_names_operation() {
        let response = TokenResponse::default();
        let err = response
            .into_session(OperationKind::TokenRefresh, now())
            .unwrap_err();
        assert!(matches!(
            err,
            AuthError::MissingAccessToken {
                operation: OperationKind::TokenRefresh
            }
        ));
    }

    #[test]
    fn test_expiry_from_jwt_exp_claim() {
        let response = TokenResponse {
            access_token: Some("tok".to_string()),
            expires_in: Some(60),
            jwt: Some(JwtClaims {
                exp: 1750000000,
                extra: HashMap::new(),
            }),
            ..Default::default()
        };
        let session = response
            .into_session(OperationKind::Authentication, now())
            .unwrap();
        assert_eq!(session.expires_at.timestamp(), 1750000000);
    }

    #[test]
    fn test_expiry_from_expires_in_without_jwt() {
        let response = TokenResponse {
            access_token: Some("tok".to_string()),
            expires_in: Some(600),
            ..Default::default()
        };
        let session = response
            .into_session(OperationKind::Authentication, now())
            .unwrap();
        assert_eq!(session.expires_at, now() + Duration::seconds(600));
    }

    #[test]
    fn test_expiry_defaults_to_one_hour() {
        let response = TokenResponse {
            access_token: Some("tok".to_string()),
            ..Default::default()
        };
        let session = response
            .into_session(OperationKind::Authentication, now())
            .unwrap();
        assert_eq!(session.expires_at, now() + Duration::seconds(3600));
    }

    #[test]
    fn test_past_jwt_expiry_stored_verbatim() {
        let past = now() - Duration::hours(2);
        let response = TokenResponse {
            access_token: Some("tok".to_string()),
            jwt: Some(JwtClaims {
                exp: past.timestamp(),
                extra: HashMap::new(),
            }),
            ..Default::default()
        };
        let session = response
            .into_session(OperationKind::Authentication, now())
            .unwrap();
        assert_eq!(session.expires_at, past);
        assert!(!session.is_valid_at(now()));
    }

    #[test]
    fn test_session_debug_redacts_tokens() {
        let session = Session {
            access_token: "secret-access".to_string(),
            refresh_token: Some("secret-refresh".to_string()),
            claims: None,
            expires_at: now(),
        };
        let debug = format!("{:?}", session);
        assert!(!debug.contains("secret-access"));
        assert!(!debug.contains("secret-refresh"));
    }

    #[test]
    fn test_session_round_trips_with_jwt_field_name() {
        let json = r#"{
            "access_token": "tok",
            "jwt": { "exp": 1750000000, "sub": "user-1" },
            "expires_at": "2025-06-15T15:06:40Z"
        }"#;
        let session: Session = serde_json::from_str(json).unwrap();
        let claims = session.claims.as_ref().unwrap();
        assert_eq!(claims.exp, 1750000000);
        assert_eq!(
            claims.extra.get("sub"),
            Some(&serde_json::json!("user-1"))
        );

        let out = serde_json::to_string(&session).unwrap();
        assert!(out.contains("\"jwt\""));
    }
}
