//! # Host Bridge Traits
//!
//! Platform abstraction traits that must be implemented by each host platform.
//!
//! ## Overview
//!
//! This crate defines the contract between the widget core and platform-specific
//! implementations. Each trait represents a capability the core requires but
//! that must be implemented differently per host (desktop, mobile widget
//! runtime, test harness).
//!
//! ## Traits
//!
//! ### Networking & I/O
//! - [`HttpClient`](http::HttpClient) - Async HTTP operations with TLS
//! - [`FileStore`](storage::FileStore) - Durable file storage, possibly
//!   backed by cloud-synced storage that offloads content
//!
//! ### User Interaction
//! - [`CredentialPrompt`](interact::CredentialPrompt) - Blocking modal
//!   credential entry
//! - [`BrowserView`](interact::BrowserView) - Embedded web view for
//!   interactive sign-in and redirect capture
//! - [`AppRelauncher`](interact::AppRelauncher) - Re-invoke the program with
//!   a recovered parameter (the authorization-code hand-off)
//!
//! ### Utilities
//! - [`Clock`](time::Clock) - Time source for deterministic expiry testing
//!
//! ## Fail-Fast Strategy
//!
//! The core fails fast with descriptive errors when a required capability is
//! missing. Hosts that cannot provide a capability (e.g., no embedded browser
//! on a headless build) return [`BridgeError::NotAvailable`](error::BridgeError)
//! so the core can surface an actionable message instead of hanging.
//!
//! ## Thread Safety
//!
//! All bridge traits require `Send + Sync` bounds to support safe concurrent
//! usage across async tasks.

pub mod error;
pub mod http;
pub mod interact;
pub mod storage;
pub mod time;

pub use error::BridgeError;

// Re-export commonly used types
pub use http::{HttpClient, HttpMethod, HttpRequest, HttpResponse};
pub use interact::{AppRelauncher, BrowserView, CredentialInput, CredentialPrompt};
pub use storage::FileStore;
pub use time::{Clock, SystemClock};
