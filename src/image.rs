//! src/image.rs
//!
//! Generated-image extraction from assistant replies.
//!
//! Image generation models answer with a markdown image, often followed by a
//! download link to the same file:
//!
//! ```text
//! Here you go!
//! ![cat](https://cdn.example/cat.png "A cat")
//! [Download](https://cdn.example/cat.png)
//! ```
//!
//! The image url moves into the message metadata and both the image and the
//! download link are removed from the visible text.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::message::{GeneratedImageKind, GeneratedImages, Message, MessageMetadata, Role};

static IMAGE_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"!\[[^\]]*\]\((.*?)\s*("(?:.*[^"])")?\s*\)"#).unwrap());

static LINK_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"\[[^\]]*\]\((.*?)\s*("(?:.*[^"])")?\s*\)"#).unwrap());

static BLANK_LINES: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n\s*\n").unwrap());

fn remove_first(pattern: &Regex, text: &str) -> String {
    let removed = pattern.replace(text, "");
    BLANK_LINES.replace_all(&removed, "\n").trim().to_string()
}

/// Moves the first markdown image of `message` into `metadata.generate_image`.
///
/// Messages without an image are returned unchanged.
pub fn with_generate_image(mut message: Message) -> Message {
    let Some(url) = IMAGE_PATTERN
        .captures(&message.content)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
    else {
        return message;
    };

    let without_image = remove_first(&IMAGE_PATTERN, &message.content);
    message.content = if LINK_PATTERN.is_match(&without_image) {
        remove_first(&LINK_PATTERN, &without_image)
    } else {
        without_image
    };

    message
        .metadata
        .get_or_insert_with(MessageMetadata::default)
        .generate_image = Some(GeneratedImages {
        kind: GeneratedImageKind::Url,
        images: vec![url],
    });

    message
}

/// Copies the generated images of the last assistant message into its `images`.
pub fn add_image_file_to_contents(mut messages: Vec<Message>) -> Vec<Message> {
    let Some(idx) = messages
        .iter()
        .rposition(|message| message.role == Role::Assistant)
    else {
        return messages;
    };

    let last = &mut messages[idx];
    let images = last
        .metadata
        .as_ref()
        .and_then(|metadata| metadata.generate_image.as_ref())
        .map(|generated| generated.images.clone());
    if images.is_some() {
        last.images = images;
    }

    messages
}
