//! User Interaction Abstractions
//!
//! The interactive authentication strategies need three host capabilities:
//! a blocking credential prompt, an embedded browser view, and a way to
//! re-invoke the program with a recovered parameter. Hosts without one of
//! these (widget contexts, headless builds) return
//! [`BridgeError::NotAvailable`](crate::BridgeError) so the core can fail
//! fast with an actionable message.

use async_trait::async_trait;
use std::fmt;

use crate::error::Result;

/// Username/password pair captured from a prompt.
///
/// Ephemeral: held in memory only for the duration of one password exchange,
/// never persisted. The `Debug` implementation redacts the password.
#[derive(Clone)]
pub struct CredentialInput {
    pub username: String,
    pub password: String,
}

impl fmt::Debug for CredentialInput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialInput")
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

/// Blocking modal credential prompt.
///
/// # Host behavior
///
/// - Interactive hosts present a modal with a username field and a secure
///   password field and block until the user continues or dismisses it.
/// - Non-interactive hosts (the widget runtime itself, headless shells)
///   return `BridgeError::NotAvailable` — the user has to run the program
///   in an interactive context first.
#[async_trait]
pub trait CredentialPrompt: Send + Sync {
    /// Present the prompt. Returns `None` when the user dismisses it.
    async fn request_credentials(&self) -> Result<Option<CredentialInput>>;
}

/// Embedded browser view.
///
/// Used by the two browser-driven strategies: the web-session capture reads a
/// token blob out of the page's session storage after the user logs in, and
/// the authorization-code flow watches navigations for the redirect URI.
#[async_trait]
pub trait BrowserView: Send + Sync {
    /// Load `url`, present the view until the user dismisses it, then read
    /// the given sessionStorage key from the page.
    ///
    /// Returns `None` when the key is absent (the user never completed the
    /// login).
    async fn read_session_storage(&self, url: &str, key: &str) -> Result<Option<String>>;

    /// Load `url` and present the view, intercepting navigations.
    ///
    /// The first navigation whose target starts with `redirect_prefix` is
    /// suppressed (the redirect target is not a real page) and its full URL
    /// returned. Returns `None` when the view is dismissed before any
    /// matching navigation happens.
    async fn capture_redirect(&self, url: &str, redirect_prefix: &str) -> Result<Option<String>>;
}

/// Re-invokes the program with a recovered parameter.
///
/// The authorization-code flow spans two program invocations: the browser
/// step cannot be resumed in-process, so the captured code is handed to a
/// fresh invocation through the host's URL-scheme or argument mechanism.
pub trait AppRelauncher: Send + Sync {
    /// Start a fresh invocation carrying the authorization code, then let the
    /// current invocation wind down.
    fn relaunch_with_code(&self, code: &str) -> Result<()>;
}
