//! Workspace placeholder crate.
//!
//! This crate exists to expose shared feature flags that map to the individual
//! workspace crates (e.g., `core-widget`, `bridge-desktop`). Host applications
//! can depend on `duw-workspace` with the `desktop-shims` feature enabled and
//! get the fully wired desktop widget core without referencing each crate
//! individually.
