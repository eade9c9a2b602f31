//! Request classification
//!
//! Decodes the form-encoded bodies the Slack Web API accepts and sorts
//! intercepted calls into the shapes the session tracks: view publishes,
//! channel messages, and everything else.

use url::form_urlencoded;

use crate::error::HarnessError;
use crate::types::{FormData, FormValue, PostedMessage, View};

/// Every path under this prefix is recorded and classified
pub const API_PREFIX: &str = "/slack/api";

pub const VIEWS_PUBLISH_PATH: &str = "/slack/api/views.publish";
pub const VIEWS_OPEN_PATH: &str = "/slack/api/views.open";
pub const CHAT_POST_MESSAGE_PATH: &str = "/slack/api/chat.postMessage";

/// What an intercepted Slack API call means for the session
#[derive(Debug, Clone)]
pub enum ClassifiedRequest {
    /// views.publish or views.open: replaces the active screen
    View { view: View },
    /// chat.postMessage: lands in the message log
    Message {
        channel: String,
        message: PostedMessage,
    },
    /// Recorded but otherwise inert
    Unknown,
}

/// Decode a form-url-encoded body, folding repeated keys into one value
pub fn decode_form(body: &[u8]) -> FormData {
    let mut data = FormData::new();
    for (key, value) in form_urlencoded::parse(body) {
        match data.entry(key.into_owned()) {
            std::collections::btree_map::Entry::Occupied(mut entry) => {
                entry.get_mut().push(value.into_owned());
            }
            std::collections::btree_map::Entry::Vacant(entry) => {
                entry.insert(FormValue::Single(value.into_owned()));
            }
        }
    }
    data
}

/// Classify an intercepted call by path and decoded body
///
/// Known endpoints with malformed bodies are an error, not a silent
/// unknown: a missing `view` or `channel` field means the application
/// under test sent something Slack would reject.
pub fn classify(path: &str, data: &FormData) -> Result<ClassifiedRequest, HarnessError> {
    match path {
        VIEWS_PUBLISH_PATH | VIEWS_OPEN_PATH => {
            let raw = data.get("view").map(FormValue::first).unwrap_or_default();
            if raw.is_empty() {
                return Err(malformed(path, "missing or empty `view` field"));
            }
            let view =
                serde_json::from_str(raw).map_err(|error| malformed(path, &error.to_string()))?;
            Ok(ClassifiedRequest::View { view })
        }
        CHAT_POST_MESSAGE_PATH => {
            let channel = data
                .get("channel")
                .map(FormValue::first)
                .unwrap_or_default();
            if channel.is_empty() {
                return Err(malformed(path, "missing or empty `channel` field"));
            }
            let blocks = match data.get("blocks") {
                Some(value) => serde_json::from_str(value.first())
                    .map_err(|error| malformed(path, &error.to_string()))?,
                None => Vec::new(),
            };
            let text = data
                .get("text")
                .map(FormValue::first)
                .unwrap_or_default()
                .to_string();
            Ok(ClassifiedRequest::Message {
                channel: channel.to_string(),
                message: PostedMessage { blocks, text },
            })
        }
        _ => Ok(ClassifiedRequest::Unknown),
    }
}

fn malformed(path: &str, reason: &str) -> HarnessError {
    HarnessError::MalformedRequest {
        endpoint: path
            .strip_prefix(API_PREFIX)
            .map(|endpoint| endpoint.trim_start_matches('/'))
            .unwrap_or(path)
            .to_string(),
        reason: reason.to_string(),
    }
}

#[cfg(test)]
mod tests {
    mod unit {
        use super::super::*;

        fn form(pairs: &[(&str, &str)]) -> FormData {
            let encoded: String = pairs
                .iter()
                .map(|(key, value)| {
                    format!(
                        "{}={}",
                        key,
                        form_urlencoded::byte_serialize(value.as_bytes()).collect::<String>()
                    )
                })
                .collect::<Vec<_>>()
                .join("&");
            decode_form(encoded.as_bytes())
        }

        #[test]
        fn test_decode_form_repeated_keys_become_many() {
            let data = decode_form(b"view=a&view=b&channel=C1");
            assert_eq!(
                data.get("view"),
                Some(&FormValue::Many(vec!["a".to_string(), "b".to_string()]))
            );
            assert_eq!(
                data.get("channel"),
                Some(&FormValue::Single("C1".to_string()))
            );
        }

        #[test]
        fn test_classify_views_publish_parses_embedded_view() {
            let data = form(&[(
                "view",
                r#"{"type":"home","blocks":[{"type":"section","text":{"type":"mrkdwn","text":"Hi"}}]}"#,
            )]);

            let classified = classify(VIEWS_PUBLISH_PATH, &data).unwrap();
            match classified {
                ClassifiedRequest::View { view } => {
                    assert_eq!(view.view_type.as_deref(), Some("home"));
                    assert_eq!(view.blocks.len(), 1);
                }
                other => panic!("Expected a view, got {other:?}"),
            }
        }

        #[test]
        fn test_classify_views_open_uses_same_shape() {
            let data = form(&[("view", r#"{"type":"modal"}"#)]);
            assert!(matches!(
                classify(VIEWS_OPEN_PATH, &data).unwrap(),
                ClassifiedRequest::View { .. }
            ));
        }

        #[test]
        fn test_classify_views_publish_without_view_is_malformed() {
            let data = form(&[("user_id", "U1")]);
            let error = classify(VIEWS_PUBLISH_PATH, &data).unwrap_err();
            assert!(matches!(
                &error,
                HarnessError::MalformedRequest { endpoint, .. } if endpoint == "views.publish"
            ));
        }

        #[test]
        fn test_classify_views_publish_with_invalid_json_is_malformed() {
            let data = form(&[("view", "{not json")]);
            assert!(matches!(
                classify(VIEWS_PUBLISH_PATH, &data),
                Err(HarnessError::MalformedRequest { .. })
            ));
        }

        #[test]
        fn test_classify_message_takes_first_of_repeated_fields() {
            let data = decode_form(b"channel=C1&channel=C2&text=hello");
            let classified = classify(CHAT_POST_MESSAGE_PATH, &data).unwrap();
            match classified {
                ClassifiedRequest::Message { channel, message } => {
                    assert_eq!(channel, "C1");
                    assert_eq!(message.text, "hello");
                    assert!(message.blocks.is_empty());
                }
                other => panic!("Expected a message, got {other:?}"),
            }
        }

        #[test]
        fn test_classify_message_parses_blocks() {
            let data = form(&[
                ("channel", "C1"),
                (
                    "blocks",
                    r#"[{"type":"section","text":{"type":"plain_text","text":"deployed"}}]"#,
                ),
            ]);

            let classified = classify(CHAT_POST_MESSAGE_PATH, &data).unwrap();
            match classified {
                ClassifiedRequest::Message { message, .. } => {
                    assert_eq!(message.blocks.len(), 1);
                    assert_eq!(message.text, "");
                }
                other => panic!("Expected a message, got {other:?}"),
            }
        }

        #[test]
        fn test_classify_message_without_channel_is_malformed() {
            let data = form(&[("text", "hello")]);
            let error = classify(CHAT_POST_MESSAGE_PATH, &data).unwrap_err();
            assert!(matches!(
                &error,
                HarnessError::MalformedRequest { endpoint, .. } if endpoint == "chat.postMessage"
            ));
        }

        #[test]
        fn test_classify_unrelated_path_is_unknown() {
            let data = form(&[("user", "U1")]);
            assert!(matches!(
                classify("/slack/api/users.info", &data).unwrap(),
                ClassifiedRequest::Unknown
            ));
        }
    }
}
