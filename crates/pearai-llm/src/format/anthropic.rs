//! Anthropic messages format.

use serde::Serialize;

use crate::types::{ContentPart, ConversationTurn, Role};

/// Prompt-cache breakpoint marker.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CacheControl {
    #[serde(rename = "type")]
    pub kind: &'static str,
}

impl CacheControl {
    pub const fn ephemeral() -> Self {
        Self { kind: "ephemeral" }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImageSource {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub media_type: String,
    pub data: String,
}

/// A content block of an Anthropic message or system prompt.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AnthropicBlock {
    Text {
        text: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        cache_control: Option<CacheControl>,
    },
    Image {
        source: ImageSource,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnthropicMessage {
    pub role: &'static str,
    pub content: Vec<AnthropicBlock>,
}

/// System blocks plus the message list of a messages request.
#[derive(Debug, Clone, PartialEq)]
pub struct AnthropicPrompt {
    pub system: Vec<AnthropicBlock>,
    pub messages: Vec<AnthropicMessage>,
}

/// Convert turns to Anthropic blocks. With `cache` set, the system block and
/// the last text block of the final two user messages carry an ephemeral
/// cache marker.
pub fn to_anthropic_format(
    system_prompt: &str,
    turns: &[ConversationTurn],
    cache: bool,
) -> AnthropicPrompt {
    let system = vec![AnthropicBlock::Text {
        text: system_prompt.to_string(),
        cache_control: cache.then(CacheControl::ephemeral),
    }];

    let mut messages: Vec<AnthropicMessage> = turns
        .iter()
        .map(|turn| AnthropicMessage {
            role: match turn.role {
                Role::Assistant => "assistant",
                Role::User | Role::System => "user",
            },
            content: turn.content.iter().map(block).collect(),
        })
        .collect();

    if cache {
        for message in messages
            .iter_mut()
            .rev()
            .filter(|m| m.role == "user")
            .take(2)
        {
            let last_text = message
                .content
                .iter_mut()
                .rev()
                .find(|b| matches!(b, AnthropicBlock::Text { .. }));
            if let Some(AnthropicBlock::Text { cache_control, .. }) = last_text {
                *cache_control = Some(CacheControl::ephemeral());
            }
        }
    }

    AnthropicPrompt { system, messages }
}

fn block(part: &ContentPart) -> AnthropicBlock {
    match part {
        ContentPart::Text { text } => AnthropicBlock::Text {
            text: text.clone(),
            cache_control: None,
        },
        ContentPart::Image { media_type, data } => AnthropicBlock::Image {
            source: ImageSource {
                kind: "base64",
                media_type: media_type.clone(),
                data: data.clone(),
            },
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cached(block: &AnthropicBlock) -> bool {
        matches!(
            block,
            AnthropicBlock::Text {
                cache_control: Some(_),
                ..
            }
        )
    }

    #[test]
    fn system_turns_are_sent_as_user() {
        let turns = vec![ConversationTurn::new(
            Role::System,
            vec![ContentPart::text("note")],
        )];
        let prompt = to_anthropic_format("sys", &turns, false);
        assert_eq!(prompt.messages[0].role, "user");
        assert!(!cached(&prompt.system[0]));
    }

    #[test]
    fn cache_marks_last_two_user_messages() {
        let turns = vec![
            ConversationTurn::user("first"),
            ConversationTurn::assistant("reply"),
            ConversationTurn::user("second"),
            ConversationTurn::assistant("reply"),
            ConversationTurn::user("third"),
        ];
        let prompt = to_anthropic_format("sys", &turns, true);
        assert!(cached(&prompt.system[0]));
        let marks: Vec<bool> = prompt
            .messages
            .iter()
            .map(|m| m.content.iter().any(cached))
            .collect();
        assert_eq!(marks, vec![false, false, true, false, true]);
    }

    #[test]
    fn cache_marker_goes_on_last_text_block() {
        let turns = vec![ConversationTurn::new(
            Role::User,
            vec![
                ContentPart::text("a"),
                ContentPart::text("b"),
                ContentPart::image("image/png", "xyz"),
            ],
        )];
        let prompt = to_anthropic_format("sys", &turns, true);
        let content = &prompt.messages[0].content;
        assert!(!cached(&content[0]));
        assert!(cached(&content[1]));
    }

    #[test]
    fn image_block_serializes_base64_source() {
        let json = serde_json::to_value(block(&ContentPart::image("image/png", "xyz"))).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "type": "image",
                "source": {"type": "base64", "media_type": "image/png", "data": "xyz"}
            })
        );
    }

    #[test]
    fn text_block_without_cache_omits_marker() {
        let json = serde_json::to_value(block(&ContentPart::text("hi"))).unwrap();
        assert_eq!(json, serde_json::json!({"type": "text", "text": "hi"}));
    }
}
