//! Authentication strategies.
//!
//! Exactly one strategy is configured per installation. Each one ends in the
//! same place, a [`Session`], but gets there differently: the password
//! strategy trades prompted credentials at the token endpoint, the
//! web-session strategy lifts an existing token blob out of the customer
//! portal, and the code flow drives a browser to the authorization redirect
//! and finishes the exchange in a relaunched invocation.

use crate::error::{AuthError, Result};
use crate::transport::TokenTransport;
use crate::types::{OperationKind, Session, TokenResponse};
use async_trait::async_trait;
use bridge_traits::interact::{AppRelauncher, BrowserView, CredentialPrompt};
use bridge_traits::time::Clock;
use bridge_traits::BridgeError;
use std::sync::Arc;
use tracing::{debug, info, instrument};
use url::Url;

/// Session-storage key under which the portal keeps its token blob.
pub const SESSION_STORAGE_KEY: &str = "oidcdata";

/// A strategy that can produce a fresh [`Session`] from scratch.
#[async_trait]
pub trait Authenticate: Send + Sync {
    async fn authenticate(&self) -> Result<Session>;
}

fn environment(err: BridgeError) -> AuthError {
    AuthError::Environment(err.to_string())
}

/// Password grant driven by an interactive credential prompt.
pub struct PasswordAuthenticator {
    prompt: Arc<dyn CredentialPrompt>,
    transport: Arc<TokenTransport>,
}

impl PasswordAuthenticator {
    pub fn new(prompt: Arc<dyn CredentialPrompt>, transport: Arc<TokenTransport>) -> Self {
        Self { prompt, transport }
    }
}

#[async_trait]
impl Authenticate for PasswordAuthenticator {
    #[instrument(skip(self))]
    async fn authenticate(&self) -> Result<Session> {
        let input = self
            .prompt
            .request_credentials()
            .await
            .map_err(environment)?
            .ok_or(AuthError::Cancelled)?;

        let username = input.username.trim();
        let password = input.password.trim();
        if username.is_empty() || password.is_empty() {
            return Err(AuthError::Cancelled);
        }

        info!("Authenticating with password grant");
        self.transport.exchange_password(username, password).await
    }
}

/// Captures the token blob the customer portal keeps in browser session
/// storage.
///
/// The portal page performs its own sign-in; once it has, the blob under
/// [`SESSION_STORAGE_KEY`] has the same shape as a token endpoint response
/// and is classified the same way.
pub struct WebSessionAuthenticator {
    browser: Arc<dyn BrowserView>,
    portal_url: String,
    clock: Arc<dyn Clock>,
}

impl WebSessionAuthenticator {
    pub fn new(
        browser: Arc<dyn BrowserView>,
        portal_url: impl Into<String>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            browser,
            portal_url: portal_url.into(),
            clock,
        }
    }
}

#[async_trait]
impl Authenticate for WebSessionAuthenticator {
    #[instrument(skip(self))]
    async fn authenticate(&self) -> Result<Session> {
        info!(portal = %self.portal_url, "Capturing portal web session");
        let blob = self
            .browser
            .read_session_storage(&self.portal_url, SESSION_STORAGE_KEY)
            .await
            .map_err(environment)?
            .ok_or(AuthError::MissingAccessToken {
                operation: OperationKind::Authentication,
            })?;

        let response: TokenResponse =
            serde_json::from_str(&blob).map_err(|e| AuthError::Transport {
                operation: OperationKind::Authentication,
                reason: format!("Portal session blob was not a token response: {}", e),
            })?;
        response.into_session(OperationKind::Authentication, self.clock.now())
    }
}

/// Authorization-code flow spanning two invocations.
///
/// The first leg opens the authorization page in the browser and waits for
/// the redirect; the captured code is handed to a relaunched invocation,
/// which skips the browser and exchanges the code directly.
pub struct CodeFlowAuthenticator {
    browser: Option<Arc<dyn BrowserView>>,
    relauncher: Option<Arc<dyn AppRelauncher>>,
    transport: Arc<TokenTransport>,
    authorize_url: String,
    client_id: String,
    redirect_uri: String,
    pending_code: Option<String>,
}

impl CodeFlowAuthenticator {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        browser: Option<Arc<dyn BrowserView>>,
        relauncher: Option<Arc<dyn AppRelauncher>>,
        transport: Arc<TokenTransport>,
        authorize_url: impl Into<String>,
        client_id: impl Into<String>,
        redirect_uri: impl Into<String>,
        pending_code: Option<String>,
    ) -> Self {
        Self {
            browser,
            relauncher,
            transport,
            authorize_url: authorize_url.into(),
            client_id: client_id.into(),
            redirect_uri: redirect_uri.into(),
            pending_code,
        }
    }

    fn authorization_url(&self) -> Result<Url> {
        let mut url = Url::parse(&self.authorize_url)
            .map_err(|e| AuthError::Environment(format!("Bad authorize URL: {}", e)))?;
        url.query_pairs_mut()
            .append_pair("client_id", &self.client_id)
            .append_pair("redirect_uri", &self.redirect_uri)
            .append_pair("response_type", "code");
        Ok(url)
    }

    fn parse_redirect(&self, captured: &str) -> Result<String> {
        let url = Url::parse(captured)
            .map_err(|e| AuthError::InvalidRedirect(format!("Unparseable redirect: {}", e)))?;

        let mut code = None;
        let mut provider_error = None;
        for (key, value) in url.query_pairs() {
            match key.as_ref() {
                "code" => code = Some(value.into_owned()),
                "error" | "error_description" => {
                    // error_description, when present, is the better message
                    if key == "error_description" || provider_error.is_none() {
                        provider_error = Some(value.into_owned());
                    }
                }
                _ => {}
            }
        }

        if let Some(description) = provider_error {
            return Err(AuthError::Provider {
                operation: OperationKind::Authentication,
                description,
            });
        }
        code.ok_or_else(|| {
            AuthError::InvalidRedirect("Redirect carried no code parameter".to_string())
        })
    }
}

#[async_trait]
impl Authenticate for CodeFlowAuthenticator {
    #[instrument(skip(self))]
    async fn authenticate(&self) -> Result<Session> {
        if let Some(code) = &self.pending_code {
            debug!("Exchanging authorization code from relaunched invocation");
            return self.transport.exchange_code(code, &self.redirect_uri).await;
        }

        let browser = self.browser.as_ref().ok_or_else(|| {
            AuthError::Environment("No browser available for the authorization flow".to_string())
        })?;
        let relauncher = self.relauncher.as_ref().ok_or_else(|| {
            AuthError::Environment("No relauncher available for the code hand-off".to_string())
        })?;

        let authorize = self.authorization_url()?;
        info!("Opening authorization page");
        let captured = browser
            .capture_redirect(authorize.as_str(), &self.redirect_uri)
            .await
            .map_err(environment)?
            .ok_or(AuthError::FlowIncomplete)?;

        let code = self.parse_redirect(&captured)?;
        info!("Authorization code captured; relaunching");
        relauncher.relaunch_with_code(&code).map_err(environment)?;
        Err(AuthError::RelaunchPending)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bridge_traits::error::Result as BridgeResult;
    use bridge_traits::http::{HttpClient, HttpRequest, HttpResponse};
    use bridge_traits::interact::CredentialInput;
    use bridge_traits::storage::FileStore;
    use bridge_traits::time::SystemClock;
    use bytes::Bytes;
    use core_runtime::debug::DebugRecorder;
    use std::collections::HashMap;
    use std::path::{Path, PathBuf};
    use std::sync::Mutex;

    #[derive(Default)]
    struct MemoryStore {
        files: Mutex<HashMap<PathBuf, Bytes>>,
    }

    #[async_trait]
    impl FileStore for MemoryStore {
        async fn exists(&self, path: &Path) -> BridgeResult<bool> {
            Ok(self.files.lock().unwrap().contains_key(path))
        }
        async fn materialize(&self, _path: &Path) -> BridgeResult<()> {
            Ok(())
        }
        async fn read(&self, path: &Path) -> BridgeResult<Bytes> {
            self.files
                .lock()
                .unwrap()
                .get(path)
                .cloned()
                .ok_or_else(|| BridgeError::OperationFailed("not found".into()))
        }
        async fn write(&self, path: &Path, data: Bytes) -> BridgeResult<()> {
            self.files.lock().unwrap().insert(path.to_path_buf(), data);
            Ok(())
        }
        async fn delete(&self, path: &Path) -> BridgeResult<()> {
            self.files.lock().unwrap().remove(path);
            Ok(())
        }
    }

    struct ScriptedHttp {
        body: &'static str,
        seen_bodies: Mutex<Vec<String>>,
    }

    impl ScriptedHttp {
        fn new(body: &'static str) -> Self {
            Self {
                body,
                seen_bodies: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl HttpClient for ScriptedHttp {
        async fn execute(&self, request: HttpRequest) -> BridgeResult<HttpResponse> {
            self.seen_bodies.lock().unwrap().push(request.body_text());
            Ok(HttpResponse {
                status: 200,
                headers: HashMap::new(),
                body: Bytes::from(self.body),
            })
        }
    }

    fn transport(http: Arc<ScriptedHttp>) -> Arc<TokenTransport> {
        let recorder = DebugRecorder::new(
            Arc::new(MemoryStore::default()),
            PathBuf::from("/data"),
        );
        Arc::new(TokenTransport::new(
            "https://idp.example/token",
            "client-id",
            "client-secret",
            http,
            recorder,
            Arc::new(SystemClock),
        ))
    }

    struct ScriptedPrompt(BridgeResult<Option<CredentialInput>>);

    #[async_trait]
    impl CredentialPrompt for ScriptedPrompt {
        async fn request_credentials(&self) -> BridgeResult<Option<CredentialInput>> {
            match &self.0 {
                Ok(input) => Ok(input.clone()),
                Err(BridgeError::NotAvailable(msg)) => Err(BridgeError::NotAvailable(msg.clone())),
                Err(_) => Err(BridgeError::OperationFailed("scripted".into())),
            }
        }
    }

    struct ScriptedBrowser {
        storage: Option<String>,
        redirect: Option<String>,
        opened_urls: Mutex<Vec<String>>,
    }

    impl ScriptedBrowser {
        fn with_storage(blob: Option<&str>) -> Self {
            Self {
                storage: blob.map(|s| s.to_string()),
                redirect: None,
                opened_urls: Mutex::new(Vec::new()),
            }
        }

        fn with_redirect(url: Option<&str>) -> Self {
            Self {
                storage: None,
                redirect: url.map(|s| s.to_string()),
                opened_urls: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl BrowserView for ScriptedBrowser {
        async fn read_session_storage(
            &self,
            url: &str,
            _key: &str,
        ) -> BridgeResult<Option<String>> {
            self.opened_urls.lock().unwrap().push(url.to_string());
            Ok(self.storage.clone())
        }

        async fn capture_redirect(
            &self,
            url: &str,
            _redirect_prefix: &str,
        ) -> BridgeResult<Option<String>> {
            self.opened_urls.lock().unwrap().push(url.to_string());
            Ok(self.redirect.clone())
        }
    }

    #[derive(Default)]
    struct RecordingRelauncher {
        codes: Mutex<Vec<String>>,
    }

    impl AppRelauncher for RecordingRelauncher {
        fn relaunch_with_code(&self, code: &str) -> BridgeResult<()> {
            self.codes.lock().unwrap().push(code.to_string());
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_password_dismissed_prompt_is_cancelled() {
        let auth = PasswordAuthenticator::new(
            Arc::new(ScriptedPrompt(Ok(None))),
            transport(Arc::new(ScriptedHttp::new("{}"))),
        );
        assert!(matches!(
            auth.authenticate().await.unwrap_err(),
            AuthError::Cancelled
        ));
    }

    #[tokio::test]
    async fn test_password_unavailable_prompt_is_environment() {
        let auth = PasswordAuthenticator::new(
            Arc::new(ScriptedPrompt(Err(BridgeError::NotAvailable(
                "no terminal".into(),
            )))),
            transport(Arc::new(ScriptedHttp::new("{}"))),
        );
        assert!(matches!(
            auth.authenticate().await.unwrap_err(),
            AuthError::Environment(_)
        ));
    }

    #[tokio::test]
    async fn test_password_trims_credentials() {
        let http = Arc::new(ScriptedHttp::new(
            r#"{ "access_token": "tok", "expires_in": 3600 }"#,
        ));
        let auth = PasswordAuthenticator::new(
            Arc::new(ScriptedPrompt(Ok(Some(CredentialInput {
                username: "  alice  ".to_string(),
                password: " hunter2 ".to_string(),
            })))),
            transport(http.clone()),
        );

        auth.authenticate().await.unwrap();
        let bodies = http.seen_bodies.lock().unwrap();
        assert!(bodies[0].contains("username=alice&"));
        assert!(bodies[0].contains("password=hunter2&"));
    }

    #[tokio::test]
    async fn test_web_session_parses_portal_blob() {
        let blob = r#"{ "access_token": "tok", "jwt": { "exp": 1750000000 } }"#;
        let browser = Arc::new(ScriptedBrowser::with_storage(Some(blob)));
        let auth = WebSessionAuthenticator::new(
            browser.clone(),
            "https://portal.example/online-service",
            Arc::new(SystemClock),
        );

        let session = auth.authenticate().await.unwrap();
        assert_eq!(session.access_token, "tok");
        assert_eq!(session.expires_at.timestamp(), 1750000000);
        assert_eq!(
            browser.opened_urls.lock().unwrap()[0],
            "https://portal.example/online-service"
        );
    }

    #[tokio::test]
    async fn test_web_session_missing_blob_is_missing_token() {
        let auth = WebSessionAuthenticator::new(
            Arc::new(ScriptedBrowser::with_storage(None)),
            "https://portal.example",
            Arc::new(SystemClock),
        );
        assert!(matches!(
            auth.authenticate().await.unwrap_err(),
            AuthError::MissingAccessToken { .. }
        ));
    }

    #[tokio::test]
    async fn test_web_session_error_blob_is_provider_error() {
        let blob = r#"{ "error_description": "session expired" }"#;
        let auth = WebSessionAuthenticator::new(
            Arc::new(ScriptedBrowser::with_storage(Some(blob))),
            "https://portal.example",
            Arc::new(SystemClock),
        );
        assert!(matches!(
            auth.authenticate().await.unwrap_err(),
            AuthError::Provider { .. }
        ));
    }

    fn code_flow(
        browser: Option<Arc<dyn BrowserView>>,
        relauncher: Option<Arc<dyn AppRelauncher>>,
        http: Arc<ScriptedHttp>,
        pending_code: Option<String>,
    ) -> CodeFlowAuthenticator {
        CodeFlowAuthenticator::new(
            browser,
            relauncher,
            transport(http),
            "https://idp.example/authorize",
            "client-id",
            "widget://auth",
            pending_code,
        )
    }

    #[tokio::test]
    async fn test_code_flow_first_leg_relaunches_and_reports_pending() {
        let browser = Arc::new(ScriptedBrowser::with_redirect(Some(
            "widget://auth?code=abc123",
        )));
        let relauncher = Arc::new(RecordingRelauncher::default());
        let http = Arc::new(ScriptedHttp::new("{}"));
        let auth = code_flow(
            Some(browser.clone()),
            Some(relauncher.clone()),
            http.clone(),
            None,
        );

        assert!(matches!(
            auth.authenticate().await.unwrap_err(),
            AuthError::RelaunchPending
        ));
        assert_eq!(relauncher.codes.lock().unwrap().as_slice(), ["abc123"]);
        // No token request on the first leg
        assert!(http.seen_bodies.lock().unwrap().is_empty());

        let opened = browser.opened_urls.lock().unwrap();
        assert!(opened[0].starts_with("https://idp.example/authorize?"));
        assert!(opened[0].contains("client_id=client-id"));
        assert!(opened[0].contains("response_type=code"));
    }

    #[tokio::test]
    async fn test_code_flow_closed_browser_is_incomplete() {
        let auth = code_flow(
            Some(Arc::new(ScriptedBrowser::with_redirect(None))),
            Some(Arc::new(RecordingRelauncher::default())),
            Arc::new(ScriptedHttp::new("{}")),
            None,
        );
        assert!(matches!(
            auth.authenticate().await.unwrap_err(),
            AuthError::FlowIncomplete
        ));
    }

    #[tokio::test]
    async fn test_code_flow_redirect_error_param_is_provider_error() {
        let auth = code_flow(
            Some(Arc::new(ScriptedBrowser::with_redirect(Some(
                "widget://auth?error=access_denied",
            )))),
            Some(Arc::new(RecordingRelauncher::default())),
            Arc::new(ScriptedHttp::new("{}")),
            None,
        );
        assert!(matches!(
            auth.authenticate().await.unwrap_err(),
            AuthError::Provider { description, .. } if description == "access_denied"
        ));
    }

    #[tokio::test]
    async fn test_code_flow_redirect_without_code_is_invalid() {
        let auth = code_flow(
            Some(Arc::new(ScriptedBrowser::with_redirect(Some(
                "widget://auth?state=xyz",
            )))),
            Some(Arc::new(RecordingRelauncher::default())),
            Arc::new(ScriptedHttp::new("{}")),
            None,
        );
        assert!(matches!(
            auth.authenticate().await.unwrap_err(),
            AuthError::InvalidRedirect(_)
        ));
    }

    #[tokio::test]
    async fn test_code_flow_relaunch_leg_exchanges_directly() {
        let http = Arc::new(ScriptedHttp::new(
            r#"{ "access_token": "tok", "refresh_token": "ref" }"#,
        ));
        let auth = code_flow(None, None, http.clone(), Some("abc123".to_string()));

        let session = auth.authenticate().await.unwrap();
        assert_eq!(session.access_token, "tok");

        let bodies = http.seen_bodies.lock().unwrap();
        assert!(bodies[0].contains("grant_type=authorization_code"));
        assert!(bodies[0].contains("code=abc123"));
    }
}
