//! Standard OpenAI chat message format.

use crate::format::openai_item;
use crate::types::{ChatMessage, ContentPart, ConversationTurn, MessageContent};

/// One `system` message followed by one message per turn.
///
/// A turn made of a single text part is sent as a plain string; anything
/// else becomes a multipart array.
pub fn to_standard_format(system_prompt: &str, turns: &[ConversationTurn]) -> Vec<ChatMessage> {
    let mut messages = Vec::with_capacity(turns.len() + 1);
    messages.push(ChatMessage::system(system_prompt));
    for turn in turns {
        messages.push(ChatMessage {
            role: turn.role.as_str().to_string(),
            content: turn_content(&turn.content),
        });
    }
    messages
}

fn turn_content(parts: &[ContentPart]) -> MessageContent {
    match parts {
        [] => MessageContent::Text(String::new()),
        [ContentPart::Text { text }] => MessageContent::Text(text.clone()),
        parts => MessageContent::Parts(parts.iter().map(openai_item).collect()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ContentItem, Role};

    #[test]
    fn system_message_leads() {
        let turns = vec![
            ConversationTurn::user("Hello"),
            ConversationTurn::assistant("Hi there"),
        ];
        let messages = to_standard_format("You are helpful", &turns);
        assert_eq!(messages.len(), 3);
        assert_eq!(messages[0].role, "system");
        assert_eq!(messages[0].text(), Some("You are helpful"));
        assert_eq!(messages[1].role, "user");
        assert_eq!(messages[1].text(), Some("Hello"));
        assert_eq!(messages[2].role, "assistant");
        assert_eq!(messages[2].text(), Some("Hi there"));
    }

    #[test]
    fn consecutive_same_role_turns_are_kept_apart() {
        let turns = vec![ConversationTurn::user("a"), ConversationTurn::user("b")];
        let messages = to_standard_format("sys", &turns);
        assert_eq!(messages.len(), 3);
        assert_eq!(messages[2].text(), Some("b"));
    }

    #[test]
    fn images_become_data_urls() {
        let turns = vec![ConversationTurn::new(
            Role::User,
            vec![
                ContentPart::text("what is this?"),
                ContentPart::image("image/png", "iVBORw0KGgo"),
            ],
        )];
        let messages = to_standard_format("sys", &turns);
        let MessageContent::Parts(parts) = &messages[1].content else {
            panic!("expected multipart content");
        };
        assert_eq!(
            parts[0],
            ContentItem::Text {
                text: "what is this?".into()
            }
        );
        assert!(matches!(
            &parts[1],
            ContentItem::ImageUrl { image_url } if image_url.url == "data:image/png;base64,iVBORw0KGgo"
        ));
    }

    #[test]
    fn multiple_text_parts_stay_multipart() {
        let turns = vec![ConversationTurn::new(
            Role::User,
            vec![ContentPart::text("one"), ContentPart::text("two")],
        )];
        let messages = to_standard_format("sys", &turns);
        assert!(matches!(&messages[1].content, MessageContent::Parts(p) if p.len() == 2));
    }

    #[test]
    fn empty_conversation_is_just_system() {
        let messages = to_standard_format("sys", &[]);
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].role, "system");
    }
}
