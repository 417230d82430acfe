//! src/detectors.rs
//!
//! Reasoning format detectors.
//!
//! Each detector recognises one output convention and splits a completion into
//! hidden reasoning and the visible answer:
//!
//! 1. `FoldTagDetector`: `<details><summary>label</summary>reasoning</details>answer`,
//!    including unterminated blocks while the message is still streaming.
//! 2. `MarkerDetector`: `###Thinking reasoning ###Response answer`, only for the
//!    model families that emit it.
//! 3. `ThinkTagDetector`: `<think>reasoning</think>answer`, a lone `</think>`, or an
//!    open `<think>` that has not been closed yet.
//!
//! Detectors are stateless. `process` never fails for input that `can_process`
//! accepted; anything it cannot split degrades to empty strings or the untouched
//! content.

use crate::message::{ExtractionResult, Message};
use crate::tags::{
    self, DETAILS_BLOCK, DETAILS_CLOSE, DETAILS_OPEN, MARKER_DELIMITER, MARKER_RESPONSE,
    MARKER_THINKING, SUMMARY_BLOCK, SUMMARY_CLOSE, SUMMARY_OPEN, THINK_BLOCK, THINK_CLOSE,
    THINK_OPEN,
};

/// A predicate + splitter pair for one reasoning convention.
pub trait ThoughtDetector {
    /// Whether this detector recognises `content` for `message`.
    fn can_process(&self, content: &str, message: &Message) -> bool;

    /// Splits `content` into reasoning and visible answer.
    fn process(&self, content: &str) -> ExtractionResult;
}

// ==========================================================================================

#[derive(Clone, Copy, Debug, Default)]
pub struct FoldTagDetector;

impl FoldTagDetector {
    fn has_complete_block(content: &str) -> bool {
        tags::contains_all(
            content,
            &[DETAILS_OPEN, SUMMARY_OPEN, SUMMARY_CLOSE, DETAILS_CLOSE],
        )
    }

    fn has_open_block(content: &str) -> bool {
        tags::contains_all(content, &[DETAILS_OPEN, SUMMARY_OPEN])
    }
}

impl ThoughtDetector for FoldTagDetector {
    fn can_process(&self, content: &str, message: &Message) -> bool {
        Self::has_complete_block(content)
            || (message.status.is_streaming() && Self::has_open_block(content))
    }

    fn process(&self, content: &str) -> ExtractionResult {
        if let Some(details) = DETAILS_BLOCK.captures(content) {
            let inner = tags::trim_content(&details[1]);
            return match SUMMARY_BLOCK.captures(inner) {
                Some(summary) => ExtractionResult::new(
                    tags::trim_content(&summary[2]),
                    tags::trim_content(&DETAILS_BLOCK.replace(content, "")),
                ),
                None => ExtractionResult::passthrough(content),
            };
        }

        if Self::has_open_block(content) {
            // While the block is open nothing of the answer is known yet.
            let Some(summary_start) = content
                .find(SUMMARY_OPEN)
                .map(|idx| idx + SUMMARY_OPEN.len())
            else {
                return ExtractionResult::passthrough(content);
            };
            let reasoning = match tags::find_from(content, SUMMARY_CLOSE, summary_start) {
                Some(summary_end) => &content[summary_end + SUMMARY_CLOSE.len()..],
                None => &content[summary_start..],
            };
            return ExtractionResult::new(tags::trim_content(reasoning), "");
        }

        ExtractionResult::passthrough(content)
    }
}

// ==========================================================================================

/// Detector for the `###Thinking` / `###Response` convention.
///
/// The markers are plain words that show up in ordinary prose, so the detector
/// only fires for the model families configured to use them.
#[derive(Clone, Debug)]
pub struct MarkerDetector {
    /// Lowercased family substrings matched against model id and name.
    families: Vec<String>,
}

impl MarkerDetector {
    pub fn new<I, S>(families: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            families: families
                .into_iter()
                .map(|family| family.as_ref().to_lowercase())
                .collect(),
        }
    }

    fn matches_family(&self, message: &Message) -> bool {
        let model_id = message.model_id.to_lowercase();
        let model_name = message.model_name().to_lowercase();
        self.families
            .iter()
            .any(|family| model_id.contains(family.as_str()) || model_name.contains(family.as_str()))
    }

    fn section<'a>(content: &'a str, heading: &str) -> &'a str {
        content
            .split(MARKER_DELIMITER)
            .map(tags::trim_content)
            .find_map(|part| part.strip_prefix(heading))
            .map(tags::trim_content)
            .unwrap_or("")
    }
}

impl ThoughtDetector for MarkerDetector {
    fn can_process(&self, content: &str, message: &Message) -> bool {
        self.matches_family(message) && content.contains("###Thinking")
    }

    fn process(&self, content: &str) -> ExtractionResult {
        ExtractionResult::new(
            Self::section(content, MARKER_THINKING),
            Self::section(content, MARKER_RESPONSE),
        )
    }
}

// ==========================================================================================

#[derive(Clone, Copy, Debug, Default)]
pub struct ThinkTagDetector;

impl ThoughtDetector for ThinkTagDetector {
    fn can_process(&self, content: &str, _message: &Message) -> bool {
        content.starts_with(THINK_OPEN) || content.contains(THINK_CLOSE)
    }

    fn process(&self, content: &str) -> ExtractionResult {
        if let Some(caps) = THINK_BLOCK.captures(content) {
            let block_end = caps.get(0).map_or(0, |m| m.end());
            return ExtractionResult::new(
                tags::trim_content(&caps[1]),
                tags::trim_content(&content[block_end..]),
            );
        }

        // Opening tag stripped upstream or never emitted.
        // Any later `</think>` stays in the answer.
        if !content.starts_with(THINK_OPEN) {
            if let Some((reasoning, rest)) = content.split_once(THINK_CLOSE) {
                return ExtractionResult::new(
                    tags::trim_content(reasoning),
                    tags::trim_content(rest),
                );
            }
        }

        // Still thinking: no answer yet.
        if let Some(reasoning) = content.strip_prefix(THINK_OPEN) {
            return ExtractionResult::new(tags::trim_content(reasoning), "");
        }

        ExtractionResult::passthrough(content)
    }
}

// ==========================================================================================

/// The closed set of supported conventions.
#[derive(Clone, Debug)]
pub enum Detector {
    FoldTag(FoldTagDetector),
    Marker(MarkerDetector),
    ThinkTag(ThinkTagDetector),
}

impl Detector {
    pub fn name(&self) -> &'static str {
        match self {
            Detector::FoldTag(_) => "fold_tag",
            Detector::Marker(_) => "marker",
            Detector::ThinkTag(_) => "think_tag",
        }
    }
}

impl ThoughtDetector for Detector {
    fn can_process(&self, content: &str, message: &Message) -> bool {
        match self {
            Detector::FoldTag(d) => d.can_process(content, message),
            Detector::Marker(d) => d.can_process(content, message),
            Detector::ThinkTag(d) => d.can_process(content, message),
        }
    }

    fn process(&self, content: &str) -> ExtractionResult {
        match self {
            Detector::FoldTag(d) => d.process(content),
            Detector::Marker(d) => d.process(content),
            Detector::ThinkTag(d) => d.process(content),
        }
    }
}

/// Detectors in priority order.
///
/// The fold detector comes first because its streaming predicate is the most
/// permissive. The think-tag detector comes last because it matches on a lone
/// opening or closing tag and would otherwise shadow the other two.
#[derive(Clone, Debug)]
pub struct DetectorRegistry {
    detectors: [Detector; 3],
}

impl DetectorRegistry {
    pub fn new(marker_families: &[String]) -> Self {
        Self {
            detectors: [
                Detector::FoldTag(FoldTagDetector),
                Detector::Marker(MarkerDetector::new(marker_families)),
                Detector::ThinkTag(ThinkTagDetector),
            ],
        }
    }

    /// First detector whose predicate accepts `content`.
    pub fn select(&self, content: &str, message: &Message) -> Option<&Detector> {
        self.detectors
            .iter()
            .find(|detector| detector.can_process(content, message))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Detector> {
        self.detectors.iter()
    }
}
