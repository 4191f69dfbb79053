//! Token endpoint transport.
//!
//! Sends the three grant types the widget uses and classifies what comes
//! back. The provider answers success and failure with the same body shape,
//! so classification reads the body, not the HTTP status; the status is only
//! logged. Every call leaves a diagnostic snapshot behind, with passwords
//! masked.

use crate::error::{AuthError, Result};
use crate::types::{OperationKind, Session, TokenResponse};
use bridge_traits::time::Clock;
use bridge_traits::{HttpClient, HttpRequest};
use core_runtime::debug::{DebugRecord, DebugRecorder, RequestSnapshot};
use std::sync::Arc;
use tracing::{debug, instrument, warn};

/// Client for the identity provider's token endpoint.
#[derive(Clone)]
pub struct TokenTransport {
    token_url: String,
    client_id: String,
    client_secret: String,
    http: Arc<dyn HttpClient>,
    recorder: DebugRecorder,
    clock: Arc<dyn Clock>,
}

impl TokenTransport {
    pub fn new(
        token_url: impl Into<String>,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        http: Arc<dyn HttpClient>,
        recorder: DebugRecorder,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            token_url: token_url.into(),
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            http,
            recorder,
            clock,
        }
    }

    /// Password grant.
    #[instrument(skip(self, password))]
    pub async fn exchange_password(&self, username: &str, password: &str) -> Result<Session> {
        self.post_form(
            OperationKind::Authentication,
            &[
                ("grant_type", "password"),
                ("username", username),
                ("password", password),
                ("client_id", &self.client_id),
                ("client_secret", &self.client_secret),
            ],
        )
        .await
    }

    /// Refresh-token grant.
    #[instrument(skip_all)]
    pub async fn refresh(&self, refresh_token: &str) -> Result<Session> {
        self.post_form(
            OperationKind::TokenRefresh,
            &[
                ("grant_type", "refresh_token"),
                ("refresh_token", refresh_token),
                ("client_id", &self.client_id),
                ("client_secret", &self.client_secret),
            ],
        )
        .await
    }

    /// Authorization-code exchange.
    #[instrument(skip(self, code))]
    pub async fn exchange_code(&self, code: &str, redirect_uri: &str) -> Result<Session> {
        self.post_form(
            OperationKind::CodeExchange,
            &[
                ("grant_type", "authorization_code"),
                ("code", code),
                ("redirect_uri", redirect_uri),
                ("client_id", &self.client_id),
                ("client_secret", &self.client_secret),
            ],
        )
        .await
    }

    async fn post_form(
        &self,
        operation: OperationKind,
        pairs: &[(&str, &str)],
    ) -> Result<Session> {
        let body = serde_urlencoded::to_string(pairs).map_err(|e| AuthError::Transport {
            operation,
            reason: format!("Form encoding failed: {}", e),
        })?;

        let request = HttpRequest::post(&self.token_url).form(body.clone());
        let mut record = DebugRecord {
            request: RequestSnapshot {
                method: "POST".to_string(),
                url: self.token_url.clone(),
                body: Some(body),
            },
            response: None,
            error: None,
        };

        let response = match self.http.execute(request).await {
            Ok(response) => response,
            Err(err) => {
                record.error = Some(err.to_string());
                self.recorder.record(operation.slug(), &record).await;
                return Err(AuthError::Transport {
                    operation,
                    reason: err.to_string(),
                });
            }
        };

        debug!(
            status = response.status,
            %operation,
            "Token endpoint answered"
        );
        if !response.is_success() {
            warn!(status = response.status, %operation, "Non-success status from token endpoint");
        }

        match response.json::<serde_json::Value>() {
            Ok(value) => {
                record.response = Some(value.clone());
                self.recorder.record(operation.slug(), &record).await;

                let parsed: TokenResponse =
                    serde_json::from_value(value).map_err(|e| AuthError::Transport {
                        operation,
                        reason: format!("Unexpected token response shape: {}", e),
                    })?;
                parsed.into_session(operation, self.clock.now())
            }
            Err(err) => {
                record.error = Some(format!("Body was not JSON: {}", err));
                self.recorder.record(operation.slug(), &record).await;
                Err(AuthError::Transport {
                    operation,
                    reason: format!("Body was not JSON: {}", err),
                })
            }
        }
    }
}
