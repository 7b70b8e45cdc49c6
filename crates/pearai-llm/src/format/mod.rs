//! Conversions from provider-agnostic turns to provider request shapes.
//!
//! - [`to_standard_format`]: OpenAI chat messages with a separate system message
//! - [`to_collapsed_format`]: "R1" shape for reasoning models that reject a
//!   system role and require alternating turns
//! - [`to_anthropic_format`]: Anthropic messages with prompt-cache markers
//!
//! All converters are total; they never fail.

pub mod anthropic;
pub mod openai;
pub mod r1;

pub use anthropic::{AnthropicBlock, AnthropicMessage, AnthropicPrompt, to_anthropic_format};
pub use openai::to_standard_format;
pub use r1::to_collapsed_format;

use crate::types::{ContentItem, ContentPart, ImageUrl};

/// Map a content part onto an OpenAI multipart item, inlining images as
/// `data:` URLs.
pub(crate) fn openai_item(part: &ContentPart) -> ContentItem {
    match part {
        ContentPart::Text { text } => ContentItem::Text { text: text.clone() },
        ContentPart::Image { media_type, data } => ContentItem::ImageUrl {
            image_url: ImageUrl {
                url: format!("data:{media_type};base64,{data}"),
            },
        },
    }
}
