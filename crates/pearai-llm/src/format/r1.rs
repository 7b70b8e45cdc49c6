//! Collapsed ("R1") message format for reasoning models.
//!
//! Reasoning endpoints reject a `system` role and require user and
//! assistant turns to alternate. The system prompt becomes a leading user
//! turn and every run of same-role turns is merged into one message.

use crate::format::openai_item;
use crate::types::{ChatMessage, ContentPart, ConversationTurn, MessageContent, Role};

/// Convert to the collapsed format. `system` turns are sent as `user`.
pub fn to_collapsed_format(system_prompt: &str, turns: &[ConversationTurn]) -> Vec<ChatMessage> {
    let mut merged: Vec<(&'static str, Vec<&ContentPart>)> = Vec::new();
    let leading = ContentPart::text(system_prompt);
    merged.push(("user", vec![&leading]));

    for turn in turns {
        let role = match turn.role {
            Role::Assistant => "assistant",
            Role::User | Role::System => "user",
        };
        match merged.last_mut() {
            Some((last_role, parts)) if *last_role == role => parts.extend(turn.content.iter()),
            _ => merged.push((role, turn.content.iter().collect())),
        }
    }

    merged
        .into_iter()
        .map(|(role, parts)| ChatMessage {
            role: role.to_string(),
            content: merged_content(&parts),
        })
        .collect()
}

fn merged_content(parts: &[&ContentPart]) -> MessageContent {
    let has_images = parts
        .iter()
        .any(|p| matches!(p, ContentPart::Image { .. }));
    if has_images {
        return MessageContent::Parts(parts.iter().map(|p| openai_item(p)).collect());
    }
    let text = parts
        .iter()
        .filter_map(|p| match p {
            ContentPart::Text { text } => Some(text.as_str()),
            ContentPart::Image { .. } => None,
        })
        .collect::<Vec<_>>()
        .join("\n");
    MessageContent::Text(text)
}
