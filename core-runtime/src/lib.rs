//! # Core Runtime Module
//!
//! Provides foundational runtime infrastructure for the widget core:
//! - Logging and tracing infrastructure
//! - Configuration management
//! - Event bus system
//! - Redacted request/response debug snapshots
//!
//! ## Overview
//!
//! This crate contains the runtime utilities the other core crates depend on.
//! It establishes the logging conventions, the immutable configuration struct
//! injected at startup, and the event broadcasting mechanism through which
//! hosts and tests observe the authentication lifecycle.

pub mod config;
pub mod debug;
pub mod error;
pub mod events;
pub mod logging;

pub use error::{Error, Result};
