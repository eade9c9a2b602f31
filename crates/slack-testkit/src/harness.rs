//! Slack test harness
//!
//! The facade a test drives: owns the mock Slack server, the session
//! state it records into, the response-override registry, and the client
//! that delivers synthesized events and interactions to the application
//! under test.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use chrono::Utc;
use dashmap::DashMap;
use futures::FutureExt;
use futures::future::BoxFuture;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::trace;

use crate::error::{HarnessError, LogKind, ScreenKind};
use crate::logic::blocks::{block_contains_text, find_button_by_label, message_matches};
use crate::logic::classify::{API_PREFIX, ClassifiedRequest, VIEWS_PUBLISH_PATH, classify};
use crate::logic::client::AppClient;
use crate::logic::poll::poll_log;
use crate::server::{MockState, ServerGuard, start_server};
use crate::types::{
    ActiveScreen, Actor, ElementKind, EventEnvelope, InteractionPayload, MessageLogItem,
    RequestLogItem, View,
};

/// Port the mock Slack API binds when none is configured
pub const DEFAULT_PORT: u16 = 8123;
/// Bot user ID used in mentions when none is configured
pub const DEFAULT_BOT_ID: &str = "U0LAN0Z89";

/// Identity of the Slack app under test
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppIdentity {
    /// Bot user ID, as it appears in mention text
    pub bot_id: String,
}

impl Default for AppIdentity {
    fn default() -> Self {
        Self {
            bot_id: DEFAULT_BOT_ID.to_string(),
        }
    }
}

/// Configuration for a Slack test harness
///
/// Construct with struct-update syntax over [`Default`]; only the fields a
/// test needs have to be spelled out.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HarnessConfig {
    /// Port the mock Slack API binds on; 0 picks an ephemeral port
    pub port: u16,
    /// Endpoint of the application under test that receives events
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event_url: Option<String>,
    /// Endpoint of the application under test that receives interactions
    #[serde(skip_serializing_if = "Option::is_none")]
    pub interaction_url: Option<String>,
    /// Identity simulated activity runs as
    #[serde(skip_serializing_if = "Option::is_none")]
    pub actor: Option<Actor>,
    /// Identity of the app under test
    #[serde(default)]
    pub app: AppIdentity,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            event_url: None,
            interaction_url: None,
            actor: None,
            app: AppIdentity::default(),
        }
    }
}

/// Response override: produces the fields merged over the success envelope
pub(crate) type InterceptFn = Arc<dyn Fn() -> BoxFuture<'static, Value> + Send + Sync>;

/// Everything the mock server records for one session
#[derive(Debug, Default)]
pub(crate) struct SessionState {
    pub request_log: Vec<RequestLogItem>,
    pub message_log: Vec<MessageLogItem>,
    pub active_screen: Option<ActiveScreen>,
}

/// Filter over the request log
#[derive(Debug, Clone, Default)]
pub(crate) struct RequestMatcher {
    pub url: Option<String>,
    /// Matches only requests that classify as a view of this type
    pub view_type: Option<String>,
}

impl RequestMatcher {
    pub(crate) fn matches(&self, item: &RequestLogItem) -> bool {
        if let Some(url) = &self.url {
            if item.url != *url {
                return false;
            }
        }
        if let Some(view_type) = &self.view_type {
            let Ok(ClassifiedRequest::View { view }) = classify(&item.url, &item.data) else {
                return false;
            };
            if view.view_type.as_deref() != Some(view_type.as_str()) {
                return false;
            }
        }
        true
    }
}

/// Test harness impersonating the Slack platform
///
/// One instance per test. `init` starts the mock Slack API; the simulation
/// methods (`open_home`, `mention_app`, `run_shortcut`, `interact_with`)
/// drive the application under test; the assertion methods (`get_by_text`,
/// `has_view_publish`) observe what it sent back.
pub struct SlackHarness {
    initial: HarnessConfig,
    config: HarnessConfig,
    session: Arc<Mutex<SessionState>>,
    intercepts: Arc<DashMap<String, InterceptFn>>,
    client: AppClient,
    server: Option<ServerGuard>,
}

impl SlackHarness {
    /// Create a harness; nothing listens until `init` is awaited
    pub fn new(config: HarnessConfig) -> Self {
        Self {
            initial: config.clone(),
            config,
            session: Arc::new(Mutex::new(SessionState::default())),
            intercepts: Arc::new(DashMap::new()),
            client: AppClient::new(),
            server: None,
        }
    }

    /// Start the mock Slack API
    ///
    /// Resolves once the listener is accepting connections. Calling it on
    /// a running harness is a no-op.
    pub async fn init(&mut self) -> Result<(), HarnessError> {
        if self.server.is_some() {
            return Ok(());
        }

        let state = MockState {
            session: Arc::clone(&self.session),
            intercepts: Arc::clone(&self.intercepts),
        };
        let guard = start_server(self.config.port, state).await?;
        trace!(addr = %guard.addr, "Slack harness initialized");
        self.server = Some(guard);
        Ok(())
    }

    /// Stop the mock Slack API and release its socket
    ///
    /// A no-op when the server is not running.
    pub async fn teardown(&mut self) -> Result<(), HarnessError> {
        if let Some(guard) = self.server.take() {
            guard.shutdown().await;
            trace!("Slack harness torn down");
        }
        Ok(())
    }

    /// Address the mock Slack API is bound to, once `init` has resolved
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.server.as_ref().map(|guard| guard.addr)
    }

    /// Change the actor subsequent simulated activity runs as
    pub fn act_as(&mut self, actor: Actor) {
        self.config.actor = Some(actor);
    }

    /// Register a response override for one API path
    ///
    /// `url_suffix` is relative to the API prefix ("views.publish", not
    /// "/slack/api/views.publish"). The produced fields are merged over
    /// the generic success envelope. Registering the same suffix again
    /// replaces the previous override.
    pub fn intercept<F>(&self, url_suffix: &str, produce: F)
    where
        F: Fn() -> Value + Send + Sync + 'static,
    {
        self.intercept_async(url_suffix, move || std::future::ready(produce()));
    }

    /// Register an asynchronous response override for one API path
    pub fn intercept_async<F, Fut>(&self, url_suffix: &str, produce: F)
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Value> + Send + 'static,
    {
        let path = api_path(url_suffix);
        trace!(path = %path, "Registering response override");
        self.intercepts
            .insert(path, Arc::new(move || produce().boxed()));
    }

    /// Clear recorded requests, messages, overrides and the active screen,
    /// and restore the configuration snapshot taken at construction
    ///
    /// The server keeps running; `reset` is for reusing one harness across
    /// test cases.
    pub fn reset(&mut self) {
        trace!("Resetting Slack harness session");
        {
            let mut session = self.session.lock();
            session.request_log.clear();
            session.message_log.clear();
            session.active_screen = None;
        }
        self.intercepts.clear();
        self.config = self.initial.clone();
    }

    /// Simulate the actor opening the app home tab
    ///
    /// Requires a running server, an actor, and a configured `event_url`.
    /// The application under test typically reacts by publishing a home
    /// view back at the mock.
    pub async fn open_home(&self) -> Result<(), HarnessError> {
        self.require_server()?;
        let actor = self.require_actor()?;
        let url = self.event_url()?;

        let envelope = EventEnvelope::app_home_opened(actor);
        self.client.post_event(url, &envelope).await
    }

    /// Set the active screen to a channel
    ///
    /// Purely local: no traffic is sent. Subsequent `get_by_text` calls
    /// search messages posted to this channel.
    pub fn open_channel(&self, channel_id: &str) -> Result<(), HarnessError> {
        self.require_server()?;
        self.session.lock().active_screen = Some(ActiveScreen::Channel {
            channel_id: channel_id.to_string(),
        });
        Ok(())
    }

    /// Simulate the actor mentioning the app in a channel
    pub async fn mention_app(&self, channel_id: &str) -> Result<(), HarnessError> {
        self.require_server()?;
        let actor = self.require_actor()?;
        let url = self.event_url()?;

        let envelope =
            EventEnvelope::app_mention(actor, &self.config.app.bot_id, channel_id, Utc::now());
        self.client.post_event(url, &envelope).await
    }

    /// Simulate a user running a global shortcut
    ///
    /// Shortcuts are independent of the actor and the active screen; the
    /// payload carries a fixed synthetic identity and a fresh trigger ID.
    pub async fn run_shortcut(&self, callback_id: &str) -> Result<(), HarnessError> {
        let url = self.interaction_url()?;

        let payload = InteractionPayload::shortcut(callback_id, Utc::now());
        self.client.post_shortcut(url, &payload).await
    }

    /// Simulate the actor interacting with an element on the active view
    ///
    /// Finds the element by its label and delivers a block_actions payload
    /// carrying its action ID. Channels have no interactable elements.
    pub async fn interact_with(
        &self,
        element: ElementKind,
        label: &str,
    ) -> Result<(), HarnessError> {
        self.require_server()?;

        let action_id = {
            let session = self.session.lock();
            let view = match session.active_screen.as_ref() {
                None => return Err(HarnessError::NoActiveScreen),
                Some(ActiveScreen::Channel { .. }) => {
                    return Err(HarnessError::UnsupportedOperation);
                }
                Some(ActiveScreen::View(view)) => view,
            };
            let block = find_button_by_label(&view.blocks, label).ok_or_else(|| {
                HarnessError::ElementNotFound {
                    element,
                    label: label.to_string(),
                }
            })?;
            match block
                .accessory
                .as_ref()
                .and_then(|accessory| accessory.action_id.as_deref())
            {
                None | Some("") => return Err(HarnessError::MissingActionId { element }),
                Some(action_id) => action_id.to_string(),
            }
        };

        let actor = self.require_actor()?;
        let url = self.interaction_url()?;

        let payload = InteractionPayload::block_actions(actor, &action_id);
        self.client.post_interaction(url, &payload).await
    }

    /// Assert the given text is visible on the active screen
    ///
    /// On a view the current blocks are searched synchronously. On a
    /// channel the message log is polled, so a message that is still in
    /// flight when the assertion starts can still satisfy it.
    pub async fn get_by_text(&self, text: &str) -> Result<(), HarnessError> {
        self.require_server()?;

        let screen = self
            .session
            .lock()
            .active_screen
            .clone()
            .ok_or(HarnessError::NoActiveScreen)?;

        match screen {
            ActiveScreen::View(view) => {
                if view.blocks.iter().any(|block| block_contains_text(block, text)) {
                    Ok(())
                } else {
                    Err(HarnessError::TextNotFound {
                        text: text.to_string(),
                        context: ScreenKind::View,
                    })
                }
            }
            ActiveScreen::Channel { channel_id } => {
                let matches = self.poll_message_log(&channel_id, text).await?;
                if matches.is_empty() {
                    Err(HarnessError::TextNotFound {
                        text: text.to_string(),
                        context: ScreenKind::Channel,
                    })
                } else {
                    Ok(())
                }
            }
        }
    }

    /// Assert exactly `count` views have been published
    ///
    /// Polls the request log, so publishes still in flight can satisfy the
    /// expected count.
    pub async fn has_view_publish(&self, count: usize) -> Result<(), HarnessError> {
        self.require_server()?;

        let matches = self
            .poll_request_log(RequestMatcher {
                url: Some(VIEWS_PUBLISH_PATH.to_string()),
                view_type: None,
            })
            .await?;

        if matches.is_empty() && count != 0 {
            return Err(HarnessError::NoMatchingRequests);
        }
        if matches.len() != count {
            return Err(HarnessError::CountMismatch {
                expected: count,
                found: matches.len(),
            });
        }
        Ok(())
    }

    async fn poll_request_log(
        &self,
        matcher: RequestMatcher,
    ) -> Result<Vec<RequestLogItem>, HarnessError> {
        let session = Arc::clone(&self.session);
        poll_log(LogKind::Request, move || {
            let session = session.lock();
            if session.request_log.is_empty() {
                return None;
            }
            Some(
                session
                    .request_log
                    .iter()
                    .filter(|item| matcher.matches(item))
                    .cloned()
                    .collect(),
            )
        })
        .await
    }

    async fn poll_message_log(
        &self,
        channel_id: &str,
        text: &str,
    ) -> Result<Vec<MessageLogItem>, HarnessError> {
        let session = Arc::clone(&self.session);
        poll_log(LogKind::Message, move || {
            let session = session.lock();
            if session.message_log.is_empty() {
                return None;
            }
            Some(
                session
                    .message_log
                    .iter()
                    .filter(|item| {
                        item.channel_id == channel_id && message_matches(&item.message, text)
                    })
                    .cloned()
                    .collect(),
            )
        })
        .await
    }

    fn require_server(&self) -> Result<&ServerGuard, HarnessError> {
        self.server.as_ref().ok_or(HarnessError::NotInitialized)
    }

    fn require_actor(&self) -> Result<&Actor, HarnessError> {
        self.config.actor.as_ref().ok_or(HarnessError::NoActor)
    }

    fn event_url(&self) -> Result<&str, HarnessError> {
        self.config
            .event_url
            .as_deref()
            .ok_or(HarnessError::MissingConfiguration { option: "event_url" })
    }

    fn interaction_url(&self) -> Result<&str, HarnessError> {
        self.config
            .interaction_url
            .as_deref()
            .ok_or(HarnessError::MissingConfiguration {
                option: "interaction_url",
            })
    }

    /// Current view blocks, when the active screen is a view
    ///
    /// Mostly useful when debugging a failing lookup.
    pub fn active_view(&self) -> Option<View> {
        match self.session.lock().active_screen.as_ref() {
            Some(ActiveScreen::View(view)) => Some(view.clone()),
            _ => None,
        }
    }
}

/// Join a suffix onto the API prefix
fn api_path(url_suffix: &str) -> String {
    format!(
        "{}/{}",
        API_PREFIX.trim_end_matches('/'),
        url_suffix.trim_start_matches('/')
    )
}
