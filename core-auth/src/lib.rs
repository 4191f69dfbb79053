//! # Session & Authentication Module
//!
//! Session lifecycle for the carrier's OAuth 2.0 identity provider.
//!
//! ## Overview
//!
//! This module acquires and maintains the access token every usage query
//! needs. Sessions are cached on disk between invocations; an expired cached
//! session is renewed with its refresh token where the strategy supports one,
//! and a missing session triggers a full authentication through the
//! configured strategy.
//!
//! ## Features
//!
//! - Three mutually-exclusive acquisition strategies: password grant,
//!   web-session capture, and the authorization-code flow
//! - Durable session cache with corruption detection
//! - Expiry derived from the provider's JWT claims when present
//! - Session state events for host UIs
//! - Per-operation diagnostic snapshots with credential masking

pub mod error;
pub mod interactive;
pub mod manager;
pub mod store;
pub mod transport;
pub mod types;

pub use core_runtime::config::AuthStrategy;
pub use core_runtime::events::SessionState;
pub use error::{AuthError, Result};
pub use interactive::{
    Authenticate, CodeFlowAuthenticator, PasswordAuthenticator, WebSessionAuthenticator,
    SESSION_STORAGE_KEY,
};
pub use manager::SessionManager;
pub use store::SessionStore;
pub use transport::TokenTransport;
pub use types::{JwtClaims, OperationKind, Session, TokenResponse};
