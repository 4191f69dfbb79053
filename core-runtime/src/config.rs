//! # Widget Configuration
//!
//! Provides configuration management for the data-usage widget core.
//!
//! ## Overview
//!
//! The configuration system uses a builder pattern to construct an immutable
//! [`WidgetConfig`] that holds the carrier endpoints, the chosen
//! authentication strategy, and all injected capability handles. It enforces
//! fail-fast validation so a strategy is never dispatched without the
//! capabilities it needs.
//!
//! ## Usage
//!
//! ```ignore
//! use core_runtime::config::{AuthStrategy, WidgetConfig};
//!
//! let config = WidgetConfig::builder()
//!     .strategy(AuthStrategy::Password)
//!     .client_id("client-id")
//!     .client_secret("client-secret")
//!     .data_dir("/path/to/data")
//!     .http_client(http)
//!     .file_store(files)
//!     .credential_prompt(prompt)
//!     .build()?;
//! ```

use crate::error::{Error, Result};
use bridge_traits::{
    interact::{AppRelauncher, BrowserView, CredentialPrompt},
    storage::FileStore,
    time::{Clock, SystemClock},
    HttpClient,
};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Token endpoint of the carrier's identity provider.
pub const DEFAULT_TOKEN_URL: &str = "https://api.freenet-mobilfunk.de/v2/oidc/token";

/// Authorization endpoint for the code flow.
pub const DEFAULT_AUTHORIZE_URL: &str = "https://api.freenet-mobilfunk.de/v2/oidc/authorize";

/// Customer portal page used by the web-session capture strategy.
pub const DEFAULT_PORTAL_URL: &str = "https://freenet-mobilfunk.de/online-service";

/// GraphQL endpoint serving the usage quota query.
pub const DEFAULT_GRAPHQL_URL: &str = "https://graphql.mobilcom-debitel.services/cucina";

/// The three mutually-exclusive authentication strategies.
///
/// Chosen by static configuration, not runtime negotiation; exactly one is
/// active per installation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum AuthStrategy {
    /// Prompt for username/password and use the password grant.
    Password,
    /// Capture the token blob from the customer portal's session storage.
    WebSession,
    /// Authorization-code flow with a redirect callback across two
    /// program invocations.
    AuthorizationCode,
}

impl AuthStrategy {
    /// Identifier string used for logging and configuration.
    pub fn as_str(&self) -> &'static str {
        match self {
            AuthStrategy::Password => "password",
            AuthStrategy::WebSession => "web_session",
            AuthStrategy::AuthorizationCode => "authorization_code",
        }
    }

    /// Parse a strategy from its identifier string.
    ///
    /// # Examples
    ///
    /// ```
    /// use core_runtime::config::AuthStrategy;
    ///
    /// assert_eq!(AuthStrategy::parse("password"), Some(AuthStrategy::Password));
    /// assert_eq!(AuthStrategy::parse("invalid"), None);
    /// ```
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "password" => Some(AuthStrategy::Password),
            "web_session" | "websession" | "cookie" => Some(AuthStrategy::WebSession),
            "authorization_code" | "code" => Some(AuthStrategy::AuthorizationCode),
            _ => None,
        }
    }

    /// Whether sessions acquired under this strategy carry a refresh token.
    ///
    /// The web-session capture never yields one, so an expired session means
    /// redoing the full interactive capture.
    pub fn supports_refresh(&self) -> bool {
        !matches!(self, AuthStrategy::WebSession)
    }
}

impl fmt::Display for AuthStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Immutable widget configuration.
///
/// Holds all endpoints, credentials-of-record (client id/secret), the chosen
/// strategy, and the injected capability handles. Use [`WidgetConfig::builder`]
/// to construct instances.
#[derive(Clone)]
pub struct WidgetConfig {
    /// OAuth client id (required for password and code-flow strategies)
    pub client_id: Option<String>,

    /// OAuth client secret (required for password and code-flow strategies)
    pub client_secret: Option<String>,

    /// Token endpoint URL
    pub token_url: String,

    /// Authorization endpoint URL (code flow)
    pub authorize_url: String,

    /// Registered redirect URI (code flow)
    pub redirect_uri: Option<String>,

    /// Customer portal URL (web-session capture)
    pub portal_url: String,

    /// GraphQL endpoint for the usage query
    pub graphql_url: String,

    /// Directory holding the session cache and debug snapshots
    pub data_dir: PathBuf,

    /// The configured authentication strategy
    pub strategy: AuthStrategy,

    /// Authorization code recovered from the invocation arguments of a
    /// relaunched run; when present the code flow skips the browser step.
    pub pending_code: Option<String>,

    /// Debug mode: top-level errors are re-raised instead of rendered.
    pub debug: bool,

    /// HTTP client (required)
    pub http_client: Option<Arc<dyn HttpClient>>,

    /// Durable file storage (required)
    pub file_store: Option<Arc<dyn FileStore>>,

    /// Credential prompt (required for the password strategy)
    pub credential_prompt: Option<Arc<dyn CredentialPrompt>>,

    /// Embedded browser view (required for browser-driven strategies)
    pub browser: Option<Arc<dyn BrowserView>>,

    /// Relauncher for the code-flow hand-off
    pub relauncher: Option<Arc<dyn AppRelauncher>>,

    /// Time source (defaults to the system clock)
    pub clock: Arc<dyn Clock>,
}

impl fmt::Debug for WidgetConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WidgetConfig")
            .field("client_id", &self.client_id)
            .field("client_secret", &self.client_secret.as_ref().map(|_| "[REDACTED]"))
            .field("token_url", &self.token_url)
            .field("authorize_url", &self.authorize_url)
            .field("redirect_uri", &self.redirect_uri)
            .field("portal_url", &self.portal_url)
            .field("graphql_url", &self.graphql_url)
            .field("data_dir", &self.data_dir)
            .field("strategy", &self.strategy)
            .field("pending_code", &self.pending_code.as_ref().map(|_| "[REDACTED]"))
            .field("debug", &self.debug)
            .field("http_client", &self.http_client.as_ref().map(|_| "HttpClient { ... }"))
            .field("file_store", &self.file_store.as_ref().map(|_| "FileStore { ... }"))
            .field(
                "credential_prompt",
                &self.credential_prompt.as_ref().map(|_| "CredentialPrompt { ... }"),
            )
            .field("browser", &self.browser.as_ref().map(|_| "BrowserView { ... }"))
            .field("relauncher", &self.relauncher.as_ref().map(|_| "AppRelauncher { ... }"))
            .finish()
    }
}

impl WidgetConfig {
    /// Creates a new builder for constructing a `WidgetConfig`.
    pub fn builder() -> WidgetConfigBuilder {
        WidgetConfigBuilder::default()
    }

    /// Validates the configuration and returns an error if invalid.
    ///
    /// Checks that the data directory and endpoints are set and that the
    /// configured strategy has every capability it needs, with actionable
    /// messages when one is missing.
    pub fn validate(&self) -> Result<()> {
        if self.data_dir.as_os_str().is_empty() {
            return Err(Error::Config("Data directory cannot be empty".to_string()));
        }

        for (name, value) in [
            ("token URL", &self.token_url),
            ("portal URL", &self.portal_url),
            ("GraphQL URL", &self.graphql_url),
        ] {
            if value.is_empty() {
                return Err(Error::Config(format!("{} cannot be empty", name)));
            }
        }

        if self.http_client.is_none() {
            return Err(capability_missing(
                "HttpClient",
                "No HTTP client implementation provided. \
                 Desktop: enable the 'desktop-shims' feature for the reqwest default. \
                 Other hosts: inject a platform-native adapter.",
            ));
        }

        if self.file_store.is_none() {
            return Err(capability_missing(
                "FileStore",
                "No file store implementation provided for the session cache. \
                 Desktop: enable the 'desktop-shims' feature for the tokio default. \
                 Other hosts: inject the platform documents-directory adapter.",
            ));
        }

        match self.strategy {
            AuthStrategy::Password => {
                if self.client_id.as_deref().unwrap_or("").is_empty()
                    || self.client_secret.as_deref().unwrap_or("").is_empty()
                {
                    return Err(Error::Config(
                        "Password strategy requires client_id and client_secret".to_string(),
                    ));
                }
                if self.credential_prompt.is_none() {
                    return Err(capability_missing(
                        "CredentialPrompt",
                        "Password strategy needs a credential prompt; \
                         inject one or switch strategies.",
                    ));
                }
            }
            AuthStrategy::WebSession => {
                if self.browser.is_none() {
                    return Err(capability_missing(
                        "BrowserView",
                        "Web-session strategy needs an embedded browser view; \
                         inject one or switch strategies.",
                    ));
                }
            }
            AuthStrategy::AuthorizationCode => {
                if self.client_id.as_deref().unwrap_or("").is_empty()
                    || self.client_secret.as_deref().unwrap_or("").is_empty()
                {
                    return Err(Error::Config(
                        "Authorization-code strategy requires client_id and client_secret"
                            .to_string(),
                    ));
                }
                if self.redirect_uri.as_deref().unwrap_or("").is_empty() {
                    return Err(Error::Config(
                        "Authorization-code strategy requires a registered redirect_uri"
                            .to_string(),
                    ));
                }
                // A relaunched run already carries the code and never opens
                // the browser, so the interactive capabilities are only
                // required on the first leg.
                if self.pending_code.is_none() {
                    if self.browser.is_none() {
                        return Err(capability_missing(
                            "BrowserView",
                            "Authorization-code strategy needs an embedded browser view \
                             to reach the redirect; inject one or switch strategies.",
                        ));
                    }
                    if self.relauncher.is_none() {
                        return Err(capability_missing(
                            "AppRelauncher",
                            "Authorization-code strategy needs a relauncher to hand the \
                             captured code to a fresh invocation.",
                        ));
                    }
                }
            }
        }

        Ok(())
    }
}

fn capability_missing(capability: &str, message: &str) -> Error {
    Error::CapabilityMissing {
        capability: capability.to_string(),
        message: message.to_string(),
    }
}

/// Scan invocation arguments for a relaunch-recovered authorization code.
///
/// Accepts both `--auth-code <value>` and `--auth-code=<value>`.
pub fn pending_code_from_args<I>(args: I) -> Option<String>
where
    I: IntoIterator<Item = String>,
{
    let mut iter = args.into_iter();
    while let Some(arg) = iter.next() {
        if arg == "--auth-code" {
            return iter.next();
        }
        if let Some(value) = arg.strip_prefix("--auth-code=") {
            return Some(value.to_string());
        }
    }
    None
}

/// Builder for [`WidgetConfig`].
pub struct WidgetConfigBuilder {
    client_id: Option<String>,
    client_secret: Option<String>,
    token_url: String,
    authorize_url: String,
    redirect_uri: Option<String>,
    portal_url: String,
    graphql_url: String,
    data_dir: PathBuf,
    strategy: AuthStrategy,
    pending_code: Option<String>,
    debug: bool,
    http_client: Option<Arc<dyn HttpClient>>,
    file_store: Option<Arc<dyn FileStore>>,
    credential_prompt: Option<Arc<dyn CredentialPrompt>>,
    browser: Option<Arc<dyn BrowserView>>,
    relauncher: Option<Arc<dyn AppRelauncher>>,
    clock: Option<Arc<dyn Clock>>,
}

impl Default for WidgetConfigBuilder {
    fn default() -> Self {
        Self {
            client_id: None,
            client_secret: None,
            token_url: DEFAULT_TOKEN_URL.to_string(),
            authorize_url: DEFAULT_AUTHORIZE_URL.to_string(),
            redirect_uri: None,
            portal_url: DEFAULT_PORTAL_URL.to_string(),
            graphql_url: DEFAULT_GRAPHQL_URL.to_string(),
            data_dir: PathBuf::new(),
            strategy: AuthStrategy::WebSession,
            pending_code: None,
            debug: false,
            http_client: None,
            file_store: None,
            credential_prompt: None,
            browser: None,
            relauncher: None,
            clock: None,
        }
    }
}

impl WidgetConfigBuilder {
    pub fn client_id(mut self, client_id: impl Into<String>) -> Self {
        self.client_id = Some(client_id.into());
        self
    }

    pub fn client_secret(mut self, client_secret: impl Into<String>) -> Self {
        self.client_secret = Some(client_secret.into());
        self
    }

    pub fn token_url(mut self, url: impl Into<String>) -> Self {
        self.token_url = url.into();
        self
    }

    pub fn authorize_url(mut self, url: impl Into<String>) -> Self {
        self.authorize_url = url.into();
        self
    }

    pub fn redirect_uri(mut self, uri: impl Into<String>) -> Self {
        self.redirect_uri = Some(uri.into());
        self
    }

    pub fn portal_url(mut self, url: impl Into<String>) -> Self {
        self.portal_url = url.into();
        self
    }

    pub fn graphql_url(mut self, url: impl Into<String>) -> Self {
        self.graphql_url = url.into();
        self
    }

    pub fn data_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.data_dir = dir.as_ref().to_path_buf();
        self
    }

    pub fn strategy(mut self, strategy: AuthStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn pending_code(mut self, code: impl Into<String>) -> Self {
        self.pending_code = Some(code.into());
        self
    }

    pub fn debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    pub fn http_client(mut self, client: Arc<dyn HttpClient>) -> Self {
        self.http_client = Some(client);
        self
    }

    pub fn file_store(mut self, store: Arc<dyn FileStore>) -> Self {
        self.file_store = Some(store);
        self
    }

    pub fn credential_prompt(mut self, prompt: Arc<dyn CredentialPrompt>) -> Self {
        self.credential_prompt = Some(prompt);
        self
    }

    pub fn browser(mut self, browser: Arc<dyn BrowserView>) -> Self {
        self.browser = Some(browser);
        self
    }

    pub fn relauncher(mut self, relauncher: Arc<dyn AppRelauncher>) -> Self {
        self.relauncher = Some(relauncher);
        self
    }

    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Build and validate the configuration.
    pub fn build(self) -> Result<WidgetConfig> {
        let config = WidgetConfig {
            client_id: self.client_id,
            client_secret: self.client_secret,
            token_url: self.token_url,
            authorize_url: self.authorize_url,
            redirect_uri: self.redirect_uri,
            portal_url: self.portal_url,
            graphql_url: self.graphql_url,
            data_dir: self.data_dir,
            strategy: self.strategy,
            pending_code: self.pending_code,
            debug: self.debug,
            http_client: self.http_client,
            file_store: self.file_store,
            credential_prompt: self.credential_prompt,
            browser: self.browser,
            relauncher: self.relauncher,
            clock: self.clock.unwrap_or_else(|| Arc::new(SystemClock)),
        };
        config.validate()?;
        Ok(config)
    }
}
