//! Ready-made Slack objects for tests
//!
//! Builders return fully-populated values with plausible defaults; tests
//! override individual fields with struct-update syntax:
//!
//! ```rust,ignore
//! use slack_testkit::fixtures;
//! use slack_testkit::types::SlackChannel;
//!
//! let channel = SlackChannel {
//!     id: "C0GENERAL".to_string(),
//!     name: "general".to_string(),
//!     ..fixtures::channel()
//! };
//! assert!(channel.is_member);
//! ```

use serde_json::Map;

use crate::types::{
    Accessory, Block, ChannelTopic, SlackChannel, SlackTeam, TextObject, View,
};

/// A public channel the bot is a member of
pub fn channel() -> SlackChannel {
    SlackChannel {
        id: "C12345678".to_string(),
        name: "channel-name".to_string(),
        is_channel: true,
        is_group: false,
        is_im: false,
        created: 1234,
        is_archived: false,
        is_general: false,
        unlinked: 0,
        name_normalized: "channel-name".to_string(),
        is_shared: false,
        parent_conversation: None,
        creator: "U12345678".to_string(),
        is_moved: 0,
        is_ext_shared: false,
        is_org_shared: false,
        shared_team_ids: Vec::new(),
        internal_team_ids: Vec::new(),
        pending_shared: Vec::new(),
        pending_connected_team_ids: Vec::new(),
        is_pending_ext_shared: false,
        is_member: true,
        is_private: false,
        is_mpim: false,
        topic: channel_topic(),
        purpose: channel_topic(),
        num_members: 1,
    }
}

fn channel_topic() -> ChannelTopic {
    ChannelTopic {
        value: String::new(),
        creator: "U12345678".to_string(),
        last_set: 0,
    }
}

/// A minimal team object
pub fn team() -> SlackTeam {
    SlackTeam {
        id: "T12345678".to_string(),
        name: "team-name".to_string(),
    }
}

/// A plain_text text object
pub fn plain_text(text: &str) -> TextObject {
    TextObject {
        text_type: Some("plain_text".to_string()),
        text: text.to_string(),
        extra: Map::new(),
    }
}

/// An mrkdwn text object
pub fn mrkdwn(text: &str) -> TextObject {
    TextObject {
        text_type: Some("mrkdwn".to_string()),
        text: text.to_string(),
        extra: Map::new(),
    }
}

/// A section block with mrkdwn text
pub fn section(text: &str) -> Block {
    Block {
        block_type: "section".to_string(),
        text: Some(mrkdwn(text)),
        accessory: None,
        extra: Map::new(),
    }
}

/// A header block
pub fn header(text: &str) -> Block {
    Block {
        block_type: "header".to_string(),
        text: Some(plain_text(text)),
        accessory: None,
        extra: Map::new(),
    }
}

/// A section block with a button accessory
///
/// Pass `action_id: None` to build a button the app forgot to wire up,
/// which is useful for exercising the missing-action-ID failure mode.
pub fn button_section(text: &str, label: &str, action_id: Option<&str>) -> Block {
    Block {
        block_type: "section".to_string(),
        text: Some(mrkdwn(text)),
        accessory: Some(Accessory {
            accessory_type: "button".to_string(),
            text: Some(plain_text(label)),
            action_id: action_id.map(str::to_string),
            extra: Map::new(),
        }),
        extra: Map::new(),
    }
}

/// An app home view over the given blocks
pub fn home_view(blocks: Vec<Block>) -> View {
    View {
        view_type: Some("home".to_string()),
        blocks,
        extra: Map::new(),
    }
}

/// A modal view over the given blocks
pub fn modal_view(blocks: Vec<Block>) -> View {
    View {
        view_type: Some("modal".to_string()),
        blocks,
        extra: Map::new(),
    }
}
