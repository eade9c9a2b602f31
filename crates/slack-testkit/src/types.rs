//! Slack test harness type definitions
//!
//! Defines the wire shapes exchanged with the application under test:
//! Block Kit views and blocks as they arrive at the mock Slack API, the
//! decoded form bodies and session logs, and the synthesized event,
//! interaction and shortcut payloads sent back out.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

/// Identity a test drives simulated activity as
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    /// Slack team ID (T...)
    pub team_id: String,
    /// Slack user ID (U...)
    pub user_id: String,
}

impl Actor {
    pub fn new(team_id: impl Into<String>, user_id: impl Into<String>) -> Self {
        Self {
            team_id: team_id.into(),
            user_id: user_id.into(),
        }
    }
}

/// Kind of interactable element targeted by `interact_with`
///
/// Only buttons are interactable today; the enum keeps unsupported element
/// kinds unrepresentable rather than validating strings at runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementKind {
    Button,
}

impl fmt::Display for ElementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ElementKind::Button => write!(f, "button"),
        }
    }
}

/// A Block Kit view as published or opened by the application under test
///
/// Only `type` and `blocks` are consumed; everything else round-trips
/// through `extra`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct View {
    /// View type ("home" or "modal")
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub view_type: Option<String>,
    /// Block Kit blocks making up the view
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub blocks: Vec<Block>,
    /// Additional properties
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A single Block Kit block
///
/// Treated as an open struct: blocks of any type deserialize, the matchers
/// decide which types they care about.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Block {
    /// Block type ("section", "header", "divider", ...)
    #[serde(rename = "type", default)]
    pub block_type: String,
    /// Text object, present on section and header blocks
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<TextObject>,
    /// Accessory element, e.g. a button attached to a section
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accessory: Option<Accessory>,
    /// Additional properties
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Block Kit text object
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TextObject {
    /// Text type ("plain_text" or "mrkdwn")
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub text_type: Option<String>,
    /// The text content
    #[serde(default)]
    pub text: String,
    /// Additional properties
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Accessory element attached to a section block
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Accessory {
    /// Element type ("button", "overflow", ...)
    #[serde(rename = "type", default)]
    pub accessory_type: String,
    /// Label text, present on buttons
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<TextObject>,
    /// Action ID delivered back in block_actions payloads
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action_id: Option<String>,
    /// Additional properties
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A message posted to a channel via chat.postMessage
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostedMessage {
    /// Block Kit blocks of the message
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub blocks: Vec<Block>,
    /// Plain text fallback of the message
    #[serde(default)]
    pub text: String,
}

/// What the simulated user is currently looking at
///
/// At most one screen is active; publishing a view replaces an open
/// channel and vice versa.
#[derive(Debug, Clone)]
pub enum ActiveScreen {
    /// A published or opened Block Kit view
    View(View),
    /// An open channel, tracked by ID
    Channel { channel_id: String },
}

/// One decoded form field value
///
/// Form bodies may carry a key once or several times; the log preserves
/// that shape, consumers normalize with [`FormValue::first`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FormValue {
    Single(String),
    Many(Vec<String>),
}

impl FormValue {
    /// First value for this key; the normalized shape every consumer reads
    pub fn first(&self) -> &str {
        match self {
            FormValue::Single(value) => value,
            FormValue::Many(values) => values.first().map(String::as_str).unwrap_or_default(),
        }
    }

    /// Fold another occurrence of the same key into this value
    pub(crate) fn push(&mut self, value: String) {
        match self {
            FormValue::Single(first) => {
                let first = std::mem::take(first);
                *self = FormValue::Many(vec![first, value]);
            }
            FormValue::Many(values) => values.push(value),
        }
    }
}

/// Decoded form-url-encoded request body
pub type FormData = BTreeMap<String, FormValue>;

/// One intercepted request, as recorded in the request log
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RequestLogItem {
    /// Request path, e.g. `/slack/api/views.publish`
    pub url: String,
    /// Decoded form body
    pub data: FormData,
}

/// One intercepted chat.postMessage, as recorded in the message log
#[derive(Debug, Clone, Serialize)]
pub struct MessageLogItem {
    /// Channel the message was posted to
    pub channel_id: String,
    /// The posted message
    pub message: PostedMessage,
}

/// Envelope for events delivered to the application under test
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EventEnvelope {
    Event {
        team_id: String,
        event: OutboundEvent,
        #[serde(skip_serializing_if = "Option::is_none")]
        user: Option<String>,
    },
}

/// Synthesized Slack events
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OutboundEvent {
    /// User opened the app home tab
    AppHomeOpened,
    /// User mentioned the app in a channel
    AppMention {
        user: String,
        team: String,
        text: String,
        ts: String,
        channel: String,
        event_ts: i64,
    },
}

impl EventEnvelope {
    /// Envelope for an `app_home_opened` event from the given actor
    pub fn app_home_opened(actor: &Actor) -> Self {
        EventEnvelope::Event {
            team_id: actor.team_id.clone(),
            event: OutboundEvent::AppHomeOpened,
            user: Some(actor.user_id.clone()),
        }
    }

    /// Envelope for an `app_mention` event: the actor mentions the bot in
    /// the given channel at the given instant
    pub fn app_mention(actor: &Actor, bot_id: &str, channel_id: &str, at: DateTime<Utc>) -> Self {
        EventEnvelope::Event {
            team_id: actor.team_id.clone(),
            event: OutboundEvent::AppMention {
                user: actor.user_id.clone(),
                team: actor.team_id.clone(),
                text: format!("<@{bot_id}>"),
                ts: message_ts(at),
                channel: channel_id.to_string(),
                event_ts: at.timestamp_micros(),
            },
            user: None,
        }
    }
}

/// Team identity carried by shortcut payloads
pub const SHORTCUT_TEAM_ID: &str = "T00000000";
pub const SHORTCUT_TEAM_DOMAIN: &str = "slack-testkit";
/// User identity carried by shortcut payloads
pub const SHORTCUT_USER_ID: &str = "U00000000";
pub const SHORTCUT_USERNAME: &str = "slack-testkit";

/// Interaction payloads delivered to the application under test
///
/// Sent double-encoded, as Slack does: a JSON string under a `payload`
/// key (JSON body for block_actions, form body for shortcuts).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InteractionPayload {
    /// A user clicked an interactive block element
    BlockActions {
        user: InteractionUser,
        actions: Vec<InteractionAction>,
    },
    /// A user ran a global shortcut
    Shortcut {
        action_ts: String,
        team: ShortcutTeam,
        user: ShortcutUser,
        is_enterprise_install: bool,
        enterprise: Option<Value>,
        callback_id: String,
        trigger_id: String,
    },
}

impl InteractionPayload {
    /// block_actions payload for the given actor clicking `action_id`
    pub fn block_actions(actor: &Actor, action_id: &str) -> Self {
        InteractionPayload::BlockActions {
            user: InteractionUser {
                id: actor.user_id.clone(),
                team_id: actor.team_id.clone(),
            },
            actions: vec![InteractionAction {
                action_id: action_id.to_string(),
            }],
        }
    }

    /// Shortcut payload for `callback_id`, fired at the given instant
    ///
    /// Carries the fixed synthetic team and user identity plus a trigger ID
    /// generated per call.
    pub fn shortcut(callback_id: &str, at: DateTime<Utc>) -> Self {
        InteractionPayload::Shortcut {
            action_ts: message_ts(at),
            team: ShortcutTeam {
                id: SHORTCUT_TEAM_ID.to_string(),
                domain: SHORTCUT_TEAM_DOMAIN.to_string(),
            },
            user: ShortcutUser {
                id: SHORTCUT_USER_ID.to_string(),
                username: SHORTCUT_USERNAME.to_string(),
                team_id: SHORTCUT_TEAM_ID.to_string(),
            },
            is_enterprise_install: false,
            enterprise: None,
            callback_id: callback_id.to_string(),
            trigger_id: generate_trigger_id(at),
        }
    }
}

/// User identity inside a block_actions payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InteractionUser {
    pub id: String,
    pub team_id: String,
}

/// One triggered action inside a block_actions payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InteractionAction {
    pub action_id: String,
}

/// Team identity inside a shortcut payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShortcutTeam {
    pub id: String,
    pub domain: String,
}

/// User identity inside a shortcut payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShortcutUser {
    pub id: String,
    pub username: String,
    pub team_id: String,
}

/// Slack message timestamp: seconds since the epoch with microsecond
/// precision, as a fixed-point string
fn message_ts(at: DateTime<Utc>) -> String {
    format!("{}.{:06}", at.timestamp(), at.timestamp_subsec_micros())
}

/// Trigger IDs look like Slack's `<millis>.<app id>.<hex>` but are random
fn generate_trigger_id(at: DateTime<Utc>) -> String {
    format!(
        "{}.{}.{}",
        at.timestamp_millis(),
        at.timestamp_subsec_micros(),
        Uuid::new_v4().simple()
    )
}

/// A Slack conversations API channel object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlackChannel {
    pub id: String,
    pub name: String,
    pub is_channel: bool,
    pub is_group: bool,
    pub is_im: bool,
    pub created: i64,
    pub is_archived: bool,
    pub is_general: bool,
    pub unlinked: i64,
    pub name_normalized: String,
    pub is_shared: bool,
    pub parent_conversation: Option<Value>,
    pub creator: String,
    pub is_moved: i64,
    pub is_ext_shared: bool,
    pub is_org_shared: bool,
    pub shared_team_ids: Vec<String>,
    pub internal_team_ids: Vec<String>,
    pub pending_shared: Vec<Value>,
    pub pending_connected_team_ids: Vec<Value>,
    pub is_pending_ext_shared: bool,
    pub is_member: bool,
    pub is_private: bool,
    pub is_mpim: bool,
    pub topic: ChannelTopic,
    pub purpose: ChannelTopic,
    pub num_members: i64,
}

/// Topic or purpose of a channel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelTopic {
    pub value: String,
    pub creator: String,
    pub last_set: i64,
}

/// A Slack team object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlackTeam {
    pub id: String,
    pub name: String,
}
