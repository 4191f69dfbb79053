//! Interaction Adapters for Desktop Hosts
//!
//! Desktop builds have a terminal but no embedded web view, so the prompt is
//! implemented over stdin/stderr and the browser capability reports itself
//! unavailable. The relauncher re-executes the current binary, the desktop
//! rendition of the platform URL-scheme hand-off.

use async_trait::async_trait;
use bridge_traits::{
    error::{BridgeError, Result},
    interact::{AppRelauncher, BrowserView, CredentialInput, CredentialPrompt},
};
use std::io::{BufRead, IsTerminal, Write};
use std::process::Command;
use tracing::{debug, info};

/// Terminal credential prompt.
///
/// Fails with [`BridgeError::NotAvailable`] when stdin is not a terminal:
/// the password strategy must be run interactively at least once to seed the
/// session cache.
pub struct ConsolePrompt;

impl ConsolePrompt {
    pub fn new() -> Self {
        Self
    }

    fn read_line(prompt: &str) -> Result<String> {
        let mut stderr = std::io::stderr();
        write!(stderr, "{}", prompt).map_err(BridgeError::Io)?;
        stderr.flush().map_err(BridgeError::Io)?;

        let mut line = String::new();
        std::io::stdin()
            .lock()
            .read_line(&mut line)
            .map_err(BridgeError::Io)?;
        Ok(line.trim().to_string())
    }
}

impl Default for ConsolePrompt {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CredentialPrompt for ConsolePrompt {
    async fn request_credentials(&self) -> Result<Option<CredentialInput>> {
        if !std::io::stdin().is_terminal() {
            return Err(BridgeError::NotAvailable(
                "stdin is not a terminal; run the widget interactively to sign in".to_string(),
            ));
        }

        // Blocking terminal I/O; acceptable for a one-shot interactive prompt.
        let username = Self::read_line("Username: ")?;
        if username.is_empty() {
            debug!("Empty username, treating prompt as dismissed");
            return Ok(None);
        }
        let password = Self::read_line("Password: ")?;
        if password.is_empty() {
            debug!("Empty password, treating prompt as dismissed");
            return Ok(None);
        }

        Ok(Some(CredentialInput { username, password }))
    }
}

/// Browser capability stub for hosts without an embedded web view.
///
/// Both browser-driven strategies fail fast with an actionable message
/// instead of hanging on a view that can never be presented.
pub struct NoBrowser;

impl NoBrowser {
    pub fn new() -> Self {
        Self
    }

    fn unavailable() -> BridgeError {
        BridgeError::NotAvailable(
            "no embedded web view on this host; use the password strategy or \
             run on a host that provides a BrowserView"
                .to_string(),
        )
    }
}

impl Default for NoBrowser {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BrowserView for NoBrowser {
    async fn read_session_storage(&self, _url: &str, _key: &str) -> Result<Option<String>> {
        Err(Self::unavailable())
    }

    async fn capture_redirect(
        &self,
        _url: &str,
        _redirect_prefix: &str,
    ) -> Result<Option<String>> {
        Err(Self::unavailable())
    }
}

/// Re-executes the current binary with the authorization code appended as an
/// `--auth-code` argument.
pub struct ProcessRelauncher;

impl ProcessRelauncher {
    pub fn new() -> Self {
        Self
    }
}

impl Default for ProcessRelauncher {
    fn default() -> Self {
        Self::new()
    }
}

impl AppRelauncher for ProcessRelauncher {
    fn relaunch_with_code(&self, code: &str) -> Result<()> {
        let exe = std::env::current_exe().map_err(BridgeError::Io)?;
        info!(exe = ?exe, "Relaunching with captured authorization code");

        Command::new(exe)
            .arg("--auth-code")
            .arg(code)
            .spawn()
            .map_err(BridgeError::Io)?;
        Ok(())
    }
}
