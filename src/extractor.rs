//! src/extractor.rs
//!
//! Reasoning extraction coordinator.

use crate::detectors::{DetectorRegistry, ThoughtDetector};
use crate::eligibility::{AssistantLookup, EligibilityGate, ModelClassifier, PatternModelClassifier};
use crate::message::{ExtractionResult, Message};
use crate::tags;
use anyhow::{Context, Result, ensure};
use rayon::ThreadPoolBuilder;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

// ==========================================================================================

/// Configuration for `ThoughtExtractor`.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractorConfig {
    /// Model families that emit `###Thinking` / `###Response` markers.
    ///
    /// Matched case-insensitively against both the model id and display name.
    pub marker_model_families: Vec<String>,

    /// Model families that only reason when the assistant enables it.
    ///
    /// Messages from these models are left alone unless the assistant has a
    /// `reasoning_effort` set.
    pub conditional_reasoning_families: Vec<String>,

    /// Case-insensitive regexes over the model id that identify reasoning models.
    ///
    /// Only used when the extractor builds its own classifier.
    pub reasoning_model_patterns: Vec<String>,

    /// Number of Rayon threads for batch extraction.
    ///
    /// - `Some(n)`: Use exactly `n` threads
    /// - `None`: Use default (number of CPU cores)
    pub num_threads: Option<usize>,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            marker_model_families: vec!["glm-zero-preview".to_string()],
            conditional_reasoning_families: vec![
                "claude-3-7-sonnet".to_string(),
                "claude-3.7-sonnet".to_string(),
            ],
            reasoning_model_patterns: [
                r"^o\d",
                r"deepseek-reasoner",
                r"deepseek-r1",
                r"qwq",
                r"qvq",
                r"glm-zero-preview",
                r"claude-3[.-]7-sonnet",
                r"thinking",
            ]
            .iter()
            .map(|p| p.to_string())
            .collect(),
            num_threads: None,
        }
    }
}

impl ExtractorConfig {
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json).context("failed to parse extractor config")?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        ensure!(
            !self.marker_model_families.is_empty(),
            "marker_model_families must name at least one model family"
        );
        for (name, list) in [
            ("marker_model_families", &self.marker_model_families),
            ("conditional_reasoning_families", &self.conditional_reasoning_families),
            ("reasoning_model_patterns", &self.reasoning_model_patterns),
        ] {
            ensure!(
                list.iter().all(|entry| !entry.trim().is_empty()),
                "{name} must not contain blank entries"
            );
        }
        if let Some(num_threads) = self.num_threads {
            ensure!(
                num_threads > 0,
                "num_threads must be at least 1, got {}",
                num_threads
            );

            // Unusual but not invalid
            let available = std::thread::available_parallelism().map_or(1, |n| n.get());
            if num_threads > available {
                tracing::warn!(
                    num_threads,
                    available,
                    "num_threads exceeds available parallelism"
                );
            }
        }

        PatternModelClassifier::new(&self.reasoning_model_patterns)?;

        Ok(())
    }
}

// ==========================================================================================

/// Main extraction coordinator.
///
/// Runs the eligibility gate, picks the first detector (in registry order) that
/// recognises the trimmed content, and returns its split. Extraction never
/// mutates the input; `with_message_thought` commits the result onto an owned
/// message in one step.
///
/// Each call re-parses the full content, so during streaming the caller invokes
/// it once per received chunk, in arrival order.
///
/// # Examples
/// ```
/// use thoughtextract::{ExtractorConfig, Message, Model, NoAssistants, ThoughtExtractor};
///
/// let extractor = ThoughtExtractor::new(ExtractorConfig::default(), NoAssistants).unwrap();
/// let message = Message::assistant("<think>plan</think>answer").with_model(Model {
///     id: "deepseek-r1".into(),
///     ..Default::default()
/// });
/// let message = extractor.with_message_thought(message);
/// assert_eq!(message.reasoning_content.as_deref(), Some("plan"));
/// assert_eq!(message.content, "answer");
/// ```
pub struct ThoughtExtractor {
    config: ExtractorConfig,
    registry: DetectorRegistry,
    classifier: Box<dyn ModelClassifier>,
    assistants: Box<dyn AssistantLookup>,
}

impl ThoughtExtractor {
    /// Builds an extractor that classifies models with the configured patterns.
    pub fn new(config: ExtractorConfig, assistants: impl AssistantLookup + 'static) -> Result<Self> {
        let classifier = PatternModelClassifier::new(&config.reasoning_model_patterns)?;
        Self::with_classifier(config, classifier, assistants)
    }

    /// Builds an extractor around an external model classifier.
    pub fn with_classifier(
        config: ExtractorConfig,
        classifier: impl ModelClassifier + 'static,
        assistants: impl AssistantLookup + 'static,
    ) -> Result<Self> {
        config.validate()?;

        if let Some(num_threads) = config.num_threads {
            ThreadPoolBuilder::new()
                .num_threads(num_threads)
                .build_global()
                .ok();
        }

        Ok(Self {
            registry: DetectorRegistry::new(&config.marker_model_families),
            config,
            classifier: Box::new(classifier),
            assistants: Box::new(assistants),
        })
    }

    pub fn config(&self) -> &ExtractorConfig {
        &self.config
    }

    pub fn registry(&self) -> &DetectorRegistry {
        &self.registry
    }

    fn gate(&self) -> EligibilityGate<'_> {
        EligibilityGate {
            classifier: self.classifier.as_ref(),
            assistants: self.assistants.as_ref(),
            conditional_families: &self.config.conditional_reasoning_families,
        }
    }

    /// Splits a message into reasoning and visible content.
    ///
    /// Returns `None` when the message is not eligible or no detector matches;
    /// in that case the message must be left untouched.
    pub fn extract(&self, message: &Message) -> Option<ExtractionResult> {
        if let Err(reason) = self.gate().check(message) {
            tracing::trace!(message_id = %message.id, reason = reason.as_str(), "Skipping reasoning extraction");
            return None;
        }

        self.split(tags::trim_content(&message.content), message)
    }

    /// Runs the detector registry without the eligibility gate.
    pub fn split(&self, content: &str, message: &Message) -> Option<ExtractionResult> {
        let detector = self.registry.select(content, message)?;
        tracing::debug!(
            message_id = %message.id,
            detector = detector.name(),
            content_len = content.len(),
            streaming = message.status.is_streaming(),
            "Reasoning detector selected"
        );
        Some(detector.process(content))
    }

    /// Extracts and commits the result onto `message`.
    pub fn with_message_thought(&self, mut message: Message) -> Message {
        if let Some(result) = self.extract(&message) {
            message.apply(result);
        }
        message
    }

    /// Extract reasoning for a batch of independent messages in parallel.
    ///
    /// Uses Rayon to process messages across the thread pool. Results are in
    /// input order.
    pub fn extract_batch(&self, messages: &[Message]) -> Vec<Option<ExtractionResult>> {
        messages
            .par_iter()
            .map(|message| self.extract(message))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    use crate::eligibility::NoAssistants;
    use crate::message::{Assistant, MessageStatus, Model, Role};

    fn extractor() -> ThoughtExtractor {
        ThoughtExtractor::new(ExtractorConfig::default(), NoAssistants).unwrap()
    }

    fn reasoning_message(content: &str) -> Message {
        Message::assistant(content).with_model(Model {
            id: "deepseek-r1".into(),
            name: "DeepSeek R1".into(),
            provider: "deepseek".into(),
        })
    }

    #[test]
    fn default_config_is_valid() {
        ExtractorConfig::default().validate().unwrap();
    }

    #[test]
    fn rejects_zero_threads() {
        let config = ExtractorConfig {
            num_threads: Some(0),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_blank_entries_and_bad_patterns() {
        let blank = ExtractorConfig {
            conditional_reasoning_families: vec!["  ".into()],
            ..Default::default()
        };
        assert!(blank.validate().is_err());

        let bad = ExtractorConfig {
            reasoning_model_patterns: vec!["[".into()],
            ..Default::default()
        };
        assert!(bad.validate().is_err());
    }

    #[test]
    fn config_from_partial_json() {
        let config = ExtractorConfig::from_json(r#"{ "marker_model_families": ["my-glm"] }"#).unwrap();
        assert_eq!(config.marker_model_families, ["my-glm"]);
        assert_eq!(config.conditional_reasoning_families.len(), 2);
        assert!(ExtractorConfig::from_json("{ not json").is_err());
    }

    #[test]
    fn think_tag_message_is_split() {
        let message = extractor().with_message_thought(reasoning_message(
            "  <think>chain of thought</think>visible answer\n",
        ));
        assert_eq!(message.reasoning_content.as_deref(), Some("chain of thought"));
        assert_eq!(message.content, "visible answer");
    }

    #[test]
    fn byte_order_mark_is_trimmed_like_whitespace() {
        let result = extractor()
            .extract(&reasoning_message("\u{feff}<think>a</think>b"))
            .unwrap();
        assert_eq!(result, ExtractionResult::new("a", "b"));
    }

    #[test]
    fn new_still_rejects_invalid_config() {
        let config = ExtractorConfig {
            num_threads: Some(0),
            ..Default::default()
        };
        assert!(ThoughtExtractor::new(config, NoAssistants).is_err());
    }

    #[test]
    fn producer_json_reaches_marker_detector_and_gate() {
        let glm: Message = serde_json::from_str(
            r####"{"role":"assistant","content":"###Thinking a###Response b","modelId":"glm-zero-preview","model":{"id":"glm-zero-preview","name":"GLM"},"assistantId":"a1"}"####,
        )
        .unwrap();
        assert_eq!(
            extractor().extract(&glm),
            Some(ExtractionResult::new("a", "b"))
        );

        let assistants: HashMap<String, Assistant> = [(
            "a1".to_string(),
            serde_json::from_str::<Assistant>(r#"{"id":"a1","settings":{"reasoning_effort":"high"}}"#)
                .unwrap(),
        )]
        .into_iter()
        .collect();
        let extractor = ThoughtExtractor::new(ExtractorConfig::default(), assistants).unwrap();
        let sonnet: Message = serde_json::from_str(
            r#"{"role":"assistant","content":"<think>x</think>y","modelId":"claude-3-7-sonnet","model":{"id":"claude-3-7-sonnet"},"assistantId":"a1"}"#,
        )
        .unwrap();
        assert_eq!(
            extractor.extract(&sonnet),
            Some(ExtractionResult::new("x", "y"))
        );
    }

    #[test]
    fn unmatched_content_is_untouched() {
        let original = reasoning_message("  just an answer  ");
        let message = extractor().with_message_thought(original.clone());
        assert_eq!(message, original);
    }

    #[test]
    fn non_reasoning_models_are_untouched() {
        let original = Message::assistant("<think>x</think>y").with_model(Model {
            id: "gpt-4o".into(),
            ..Default::default()
        });
        assert_eq!(extractor().with_message_thought(original.clone()), original);
    }

    #[test]
    fn user_messages_are_untouched() {
        let mut original = reasoning_message("<think>x</think>y");
        original.role = Role::User;
        assert_eq!(extractor().with_message_thought(original.clone()), original);
    }

    #[test]
    fn marker_format_for_configured_family() {
        let message = Message::assistant("###Thinking step one###Response final answer").with_model(
            Model {
                id: "glm-zero-preview".into(),
                ..Default::default()
            },
        );
        let message = extractor().with_message_thought(message);
        assert_eq!(message.reasoning_content.as_deref(), Some("step one"));
        assert_eq!(message.content, "final answer");
    }

    #[test]
    fn fold_streaming_then_complete() {
        let extractor = extractor();
        let streaming = reasoning_message("<details><summary>partial reason so far")
            .with_status(MessageStatus::Sending);
        let result = extractor.extract(&streaming).unwrap();
        assert_eq!(result, ExtractionResult::new("partial reason so far", ""));

        let done = reasoning_message("<details><summary>label</summary>my reasoning</details>final text");
        let result = extractor.extract(&done).unwrap();
        assert_eq!(result, ExtractionResult::new("my reasoning", "final text"));
    }

    #[test]
    fn extraction_is_idempotent() {
        let extractor = extractor();
        let once = extractor.with_message_thought(reasoning_message("<think>a</think>b"));
        let twice = extractor.with_message_thought(once.clone());
        assert_eq!(once, twice);
    }

    #[test]
    fn batch_preserves_order() {
        let extractor = extractor();
        let messages = vec![
            reasoning_message("<think>a</think>b"),
            reasoning_message("plain"),
            reasoning_message("c</think>d"),
        ];
        let results = extractor.extract_batch(&messages);
        assert_eq!(
            results,
            vec![
                Some(ExtractionResult::new("a", "b")),
                None,
                Some(ExtractionResult::new("c", "d")),
            ]
        );
    }
}
