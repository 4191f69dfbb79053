//! # Desktop Bridge Implementations
//!
//! Desktop adapters for the capability traits in `bridge-traits`:
//!
//! - [`ReqwestHttpClient`] - HTTP via reqwest with pooling and TLS
//! - [`TokioFileStore`] - file storage on local disk via `tokio::fs`
//! - [`ConsolePrompt`] - credential entry on an interactive terminal
//! - [`NoBrowser`] - embedded web views do not exist on desktop builds;
//!   browser-driven strategies fail fast with a capability error
//! - [`ProcessRelauncher`] - re-executes the current binary with the
//!   captured authorization code as an argument

pub mod filesystem;
pub mod http;
pub mod interact;

pub use filesystem::{default_data_dir, TokioFileStore};
pub use http::ReqwestHttpClient;
pub use interact::{ConsolePrompt, NoBrowser, ProcessRelauncher};
