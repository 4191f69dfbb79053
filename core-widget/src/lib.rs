//! Widget façade and bootstrap helpers.
//!
//! This crate wires host-provided bridge implementations (HTTP, file store,
//! credential prompt, browser view, relauncher) into the widget core and
//! runs a full invocation: access token, usage query, view model. Desktop
//! apps typically enable the `desktop-shims` feature and start from
//! [`desktop_config`]; other hosts inject their own adapters through
//! [`WidgetConfig`].
//!
//! Error policy lives here and nowhere else: in normal mode every failure
//! degrades to an error view the host can render, in debug mode it is
//! re-raised for inspection. The one exception is the code flow's relaunch
//! hand-off, which is not a failure and always propagates so the first-leg
//! invocation can end quietly.

pub mod error;
pub mod view;

pub use error::{Result, WidgetError};
pub use view::{UsageTier, WidgetBody, WidgetView};

use bridge_traits::time::Clock;
use core_auth::{
    Authenticate, AuthError, CodeFlowAuthenticator, PasswordAuthenticator, SessionManager,
    SessionStore, TokenTransport, WebSessionAuthenticator,
};
use core_runtime::config::{AuthStrategy, WidgetConfig};
use core_runtime::debug::DebugRecorder;
use core_runtime::events::{CoreEvent, EventBus};
use core_usage::{UsageFetcher, UsageSummary};
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{info, instrument, warn};

/// Primary façade exposed to host applications.
pub struct DataUsageWidget {
    manager: SessionManager,
    fetcher: UsageFetcher,
    clock: Arc<dyn Clock>,
    debug: bool,
    events: EventBus,
}

impl DataUsageWidget {
    /// Wire a widget from a validated configuration.
    pub fn new(config: WidgetConfig) -> Result<Self> {
        config.validate().map_err(WidgetError::Runtime)?;

        let http = require(config.http_client.clone(), "HttpClient")?;
        let files = require(config.file_store.clone(), "FileStore")?;
        let clock = config.clock.clone();
        let events = EventBus::default();

        let recorder = DebugRecorder::new(files.clone(), config.data_dir.clone());
        let store = SessionStore::new(files, config.data_dir.clone());
        let transport = Arc::new(TokenTransport::new(
            config.token_url.clone(),
            config.client_id.clone().unwrap_or_default(),
            config.client_secret.clone().unwrap_or_default(),
            http.clone(),
            recorder.clone(),
            clock.clone(),
        ));

        let authenticator: Arc<dyn Authenticate> = match config.strategy {
            AuthStrategy::Password => {
                let prompt = require(config.credential_prompt.clone(), "CredentialPrompt")?;
                Arc::new(PasswordAuthenticator::new(prompt, transport.clone()))
            }
            AuthStrategy::WebSession => {
                let browser = require(config.browser.clone(), "BrowserView")?;
                Arc::new(WebSessionAuthenticator::new(
                    browser,
                    config.portal_url.clone(),
                    clock.clone(),
                ))
            }
            AuthStrategy::AuthorizationCode => {
                let redirect_uri = config.redirect_uri.clone().ok_or_else(|| {
                    core_runtime::Error::Config(
                        "Authorization-code strategy requires a redirect_uri".to_string(),
                    )
                })?;
                Arc::new(CodeFlowAuthenticator::new(
                    config.browser.clone(),
                    config.relauncher.clone(),
                    transport.clone(),
                    config.authorize_url.clone(),
                    config.client_id.clone().unwrap_or_default(),
                    redirect_uri,
                    config.pending_code.clone(),
                ))
            }
        };

        let manager = SessionManager::new(
            config.strategy,
            store,
            transport,
            authenticator,
            clock.clone(),
            events.clone(),
        );
        let fetcher = UsageFetcher::new(
            config.graphql_url.clone(),
            http,
            recorder,
            clock.clone(),
        );

        Ok(Self {
            manager,
            fetcher,
            clock,
            debug: config.debug,
            events,
        })
    }

    /// Subscribe to session lifecycle events.
    pub fn subscribe(&self) -> broadcast::Receiver<CoreEvent> {
        self.events.subscribe()
    }

    /// Acquire a token and fetch the current usage summary.
    #[instrument(skip(self))]
    pub async fn refresh(&self) -> Result<UsageSummary> {
        let access_token = self.manager.get_access_token().await?;
        let summary = self.fetcher.fetch(&access_token).await?;
        info!(
            used_percentage = summary.used_percentage,
            "Usage summary collected"
        );
        Ok(summary)
    }

    /// Run a full invocation and produce something renderable.
    ///
    /// Failures become an error view in normal mode and propagate in debug
    /// mode. [`AuthError::RelaunchPending`] is not a failure and always
    /// propagates.
    pub async fn run(&self) -> Result<WidgetView> {
        match self.refresh().await {
            Ok(summary) => Ok(WidgetView::fresh(summary, self.clock.now())),
            Err(WidgetError::Auth(AuthError::RelaunchPending)) => {
                Err(WidgetError::Auth(AuthError::RelaunchPending))
            }
            Err(err) if self.debug => Err(err),
            Err(err) => {
                warn!(error = %err, "Degrading to error view");
                Ok(WidgetView::error(err.to_string(), self.clock.now()))
            }
        }
    }

    /// Drop the cached session, forcing a full authentication next run.
    pub async fn sign_out(&self) -> Result<()> {
        self.manager.clear_session().await.map_err(WidgetError::Auth)
    }
}

fn require<T: ?Sized>(handle: Option<Arc<T>>, capability: &str) -> Result<Arc<T>> {
    handle.ok_or_else(|| {
        WidgetError::Runtime(core_runtime::Error::CapabilityMissing {
            capability: capability.to_string(),
            message: format!("{} was not injected", capability),
        })
    })
}

/// Pre-populated configuration builder for desktop hosts.
///
/// Fills in the reqwest HTTP client, the tokio file store, the platform data
/// directory, the console credential prompt, and the process relauncher, and
/// recovers a pending authorization code from the invocation arguments.
/// Desktop has no embedded browser, so browser-driven strategies fail with an
/// actionable message at authentication time.
#[cfg(all(feature = "desktop-shims", not(target_arch = "wasm32")))]
pub fn desktop_config(strategy: AuthStrategy) -> core_runtime::config::WidgetConfigBuilder {
    use bridge_desktop::{
        default_data_dir, ConsolePrompt, NoBrowser, ProcessRelauncher, ReqwestHttpClient,
        TokioFileStore,
    };
    use core_runtime::config::pending_code_from_args;

    let mut builder = WidgetConfig::builder()
        .strategy(strategy)
        .data_dir(default_data_dir())
        .http_client(Arc::new(ReqwestHttpClient::new()))
        .file_store(Arc::new(TokioFileStore::new()))
        .credential_prompt(Arc::new(ConsolePrompt::new()))
        .browser(Arc::new(NoBrowser::new()))
        .relauncher(Arc::new(ProcessRelauncher::new()));

    if let Some(code) = pending_code_from_args(std::env::args()) {
        builder = builder.pending_code(code);
    }
    builder
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use bridge_traits::error::{BridgeError, Result as BridgeResult};
    use bridge_traits::http::{HttpClient, HttpRequest, HttpResponse};
    use bridge_traits::interact::{CredentialInput, CredentialPrompt};
    use bridge_traits::storage::FileStore;
    use bytes::Bytes;
    use std::collections::{HashMap, VecDeque};
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

    #[derive(Default)]
    struct QueuedHttp {
        responses: Mutex<VecDeque<String>>,
    }

    impl QueuedHttp {
        fn push(&self, body: &str) {
            self.responses.lock().unwrap().push_back(body.to_string());
        }
    }

    #[async_trait]
    impl HttpClient for QueuedHttp {
        async fn execute(&self, _request: HttpRequest) -> BridgeResult<HttpResponse> {
            let body = self
                .responses
                .lock()
                .unwrap()
                .pop_front()
                .ok_or_else(|| BridgeError::OperationFailed("no scripted response".into()))?;
            Ok(HttpResponse {
                status: 200,
                headers: HashMap::new(),
                body: Bytes::from(body),
            })
        }
    }

    struct FixedPrompt;

    #[async_trait]
    impl CredentialPrompt for FixedPrompt {
        async fn request_credentials(&self) -> BridgeResult<Option<CredentialInput>> {
            Ok(Some(CredentialInput {
                username: "alice".to_string(),
                password: "hunter2".to_string(),
            }))
        }
    }

    fn widget(http: Arc<QueuedHttp>, debug: bool) -> DataUsageWidget {
        let config = WidgetConfig::builder()
            .strategy(AuthStrategy::Password)
            .client_id("client-id")
            .client_secret("client-secret")
            .data_dir("/data")
            .debug(debug)
            .http_client(http)
            .file_store(Arc::new(MemoryStore::default()))
            .credential_prompt(Arc::new(FixedPrompt))
            .build()
            .unwrap();
        DataUsageWidget::new(config).unwrap()
    }

    fn usage_body() -> &'static str {
        r#"{
            "data": { "me": { "customerProducts": [ {
                "costUsageBalance": { "usageQuotas": [ {
                    "validFor": { "endDate": "2030-01-01T00:00:00Z" },
                    "initialAmount": 10000000,
                    "usedAmount": 5000000
                } ] }
            } ] } }
        }"#
    }

    #[tokio::test]
    async fn test_run_produces_fresh_view() {
        let http = Arc::new(QueuedHttp::default());
        http.push(r#"{ "access_token": "tok", "expires_in": 3600 }"#);
        http.push(usage_body());

        let view = widget(http, false).run().await.unwrap();
        assert!(view.fresh);
        match view.body {
            WidgetBody::Usage(summary) => {
                assert_eq!(summary.used_percentage, 50);
                assert_eq!(summary.used_volume, "5 GB");
                assert_eq!(summary.initial_volume, "10 GB");
            }
            WidgetBody::Error { message } => panic!("unexpected error view: {}", message),
        }
    }

    #[tokio::test]
    async fn test_run_degrades_failures_to_error_view() {
        let http = Arc::new(QueuedHttp::default());
        http.push(r#"{ "error_description": "wrong password" }"#);

        let view = widget(http, false).run().await.unwrap();
        assert!(!view.fresh);
        assert!(view.tier().is_none());
        assert!(matches!(
            view.body,
            WidgetBody::Error { message } if message.contains("wrong password")
        ));
    }

    #[tokio::test]
    async fn test_debug_mode_reraises_failures() {
        let http = Arc::new(QueuedHttp::default());
        http.push(r#"{ "error_description": "wrong password" }"#);

        let err = widget(http, true).run().await.unwrap_err();
        assert!(matches!(
            err,
            WidgetError::Auth(AuthError::Provider { .. })
        ));
    }
}
