//! Session manager.
//!
//! Drives the session lifecycle: cached sessions are reused while valid,
//! renewed when expired, and replaced by a full authentication when absent.
//! A valid cached session costs zero network requests.
//!
//! Renewal never falls back to a full authentication in the same call; a
//! failed refresh is terminal and the next invocation starts over. Each
//! state transition is emitted on the event bus so a host UI can show
//! progress.

use crate::error::{AuthError, Result};
use crate::interactive::Authenticate;
use crate::store::SessionStore;
use crate::transport::TokenTransport;
use crate::types::Session;
use bridge_traits::time::Clock;
use core_runtime::config::AuthStrategy;
use core_runtime::events::{AuthEvent, CoreEvent, EventBus, SessionState};
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{info, instrument, warn};

/// Owns the session lifecycle for one configured strategy.
pub struct SessionManager {
    strategy: AuthStrategy,
    store: SessionStore,
    transport: Arc<TokenTransport>,
    authenticator: Arc<dyn Authenticate>,
    clock: Arc<dyn Clock>,
    events: EventBus,
}

impl SessionManager {
    pub fn new(
        strategy: AuthStrategy,
        store: SessionStore,
        transport: Arc<TokenTransport>,
        authenticator: Arc<dyn Authenticate>,
        clock: Arc<dyn Clock>,
        events: EventBus,
    ) -> Self {
        Self {
            strategy,
            store,
            transport,
            authenticator,
            clock,
            events,
        }
    }

    /// Subscribe to session lifecycle events.
    pub fn subscribe(&self) -> broadcast::Receiver<CoreEvent> {
        self.events.subscribe()
    }

    /// Produce a usable access token, going to the network only when the
    /// cache cannot satisfy the call.
    #[instrument(skip(self), fields(strategy = %self.strategy))]
    pub async fn get_access_token(&self) -> Result<String> {
        match self.store.read().await {
            Ok(Some(session)) if session.is_valid_at(self.clock.now()) => {
                self.transition(SessionState::CachedValid);
                self.transition(SessionState::Ready);
                Ok(session.access_token)
            }
            Ok(Some(session)) => {
                self.transition(SessionState::CachedExpired);
                let renewed = self.renew(session).await?;
                self.finish(renewed).await
            }
            Ok(None) => {
                self.transition(SessionState::NoSession);
                let session = self.authenticate().await?;
                self.finish(session).await
            }
            Err(AuthError::CorruptSession(reason)) => {
                warn!(%reason, "Discarding corrupt session cache");
                if let Err(err) = self.store.clear().await {
                    warn!(error = %err, "Could not remove corrupt session cache");
                }
                self.transition(SessionState::NoSession);
                let session = self.authenticate().await?;
                self.finish(session).await
            }
            Err(err) => Err(self.fail(err)),
        }
    }

    /// Drop the cached session, forcing a full authentication next call.
    pub async fn clear_session(&self) -> Result<()> {
        self.store.clear().await
    }

    async fn authenticate(&self) -> Result<Session> {
        self.transition(SessionState::Authenticating);
        match self.authenticator.authenticate().await {
            Ok(session) => Ok(session),
            // Not a failure: the relaunched invocation finishes the flow.
            Err(AuthError::RelaunchPending) => Err(AuthError::RelaunchPending),
            Err(err) => Err(self.fail(err)),
        }
    }

    async fn renew(&self, expired: Session) -> Result<Session> {
        if !self.strategy.supports_refresh() {
            // Web-session captures carry no refresh token; renewal is a
            // fresh capture.
            return self.authenticate().await;
        }

        self.transition(SessionState::Refreshing);
        let refresh_token = match expired.refresh_token {
            Some(token) => token,
            None => return Err(self.fail(AuthError::MissingRefreshToken)),
        };
        match self.transport.refresh(&refresh_token).await {
            Ok(session) => Ok(session),
            Err(err) => Err(self.fail(err)),
        }
    }

    async fn finish(&self, session: Session) -> Result<String> {
        self.store.write(&session).await.map_err(|e| self.fail(e))?;
        self.events.emit(CoreEvent::Auth(AuthEvent::SessionPersisted {
            expires_at: session.expires_at,
        }));
        self.transition(SessionState::Ready);
        info!(expires_at = %session.expires_at, "Session ready");
        Ok(session.access_token)
    }

    fn transition(&self, state: SessionState) {
        self.events
            .emit(CoreEvent::Auth(AuthEvent::StateChanged { state }));
    }

    fn fail(&self, err: AuthError) -> AuthError {
        self.events.emit(CoreEvent::Auth(AuthEvent::AuthFailed {
            message: err.to_string(),
        }));
        self.transition(SessionState::Failed);
        err
    }
}
