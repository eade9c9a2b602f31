//! Block Kit matchers
//!
//! Text and element lookups over the block shapes the harness tracks.
//! View lookups only consider text-bearing block types; message lookups
//! accept text on any block, matching how chat messages are asserted on.

use crate::types::{Block, PostedMessage};

/// True if this block carries the given text
///
/// Only section and header blocks are searched; the needle matches as a
/// case-sensitive substring.
pub fn block_contains_text(block: &Block, text: &str) -> bool {
    if block.block_type != "section" && block.block_type != "header" {
        return false;
    }
    block
        .text
        .as_ref()
        .is_some_and(|text_object| text_object.text.contains(text))
}

/// First section block whose button accessory carries exactly `label`
pub fn find_button_by_label<'a>(blocks: &'a [Block], label: &str) -> Option<&'a Block> {
    blocks.iter().find(|block| {
        block.block_type == "section"
            && block.accessory.as_ref().is_some_and(|accessory| {
                accessory.accessory_type == "button"
                    && accessory
                        .text
                        .as_ref()
                        .is_some_and(|text_object| text_object.text == label)
            })
    })
}

/// True if a posted message carries the given text, in any block or in
/// its plain-text fallback
pub fn message_matches(message: &PostedMessage, text: &str) -> bool {
    message.blocks.iter().any(|block| {
        block
            .text
            .as_ref()
            .is_some_and(|text_object| text_object.text.contains(text))
    }) || message.text.contains(text)
}
