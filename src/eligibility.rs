//! src/eligibility.rs
//!
//! Decides whether reasoning extraction should run for a message at all.
//!
//! Running the detectors on ordinary answers would misread incidental tag-like
//! text, so extraction is limited to assistant messages from reasoning models.
//! Some model families only reason when the assistant asked for it; for those the
//! assistant's `reasoning_effort` setting must be present.

use std::collections::HashMap;

use anyhow::{Context, Result};
use regex::{Regex, RegexBuilder};

use crate::message::{Assistant, Message, Model, Role};

/// Classifies whether a model produces reasoning traces.
pub trait ModelClassifier: Send + Sync {
    fn is_reasoning_model(&self, model: &Model) -> bool;
}

/// Resolves assistant configuration by id.
pub trait AssistantLookup: Send + Sync {
    fn assistant_by_id(&self, id: &str) -> Option<Assistant>;
}

impl AssistantLookup for HashMap<String, Assistant> {
    fn assistant_by_id(&self, id: &str) -> Option<Assistant> {
        self.get(id).cloned()
    }
}

/// Lookup with no configured assistants.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoAssistants;

impl AssistantLookup for NoAssistants {
    fn assistant_by_id(&self, _id: &str) -> Option<Assistant> {
        None
    }
}

/// Classifies models by matching their id against case-insensitive patterns.
#[derive(Clone, Debug)]
pub struct PatternModelClassifier {
    patterns: Vec<Regex>,
}

impl PatternModelClassifier {
    pub fn new<I, S>(patterns: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let patterns = patterns
            .into_iter()
            .map(|pattern| {
                let pattern = pattern.as_ref();
                RegexBuilder::new(pattern)
                    .case_insensitive(true)
                    .build()
                    .with_context(|| format!("invalid reasoning model pattern `{pattern}`"))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self { patterns })
    }
}

impl ModelClassifier for PatternModelClassifier {
    fn is_reasoning_model(&self, model: &Model) -> bool {
        self.patterns.iter().any(|pattern| pattern.is_match(&model.id))
    }
}

/// Why a message was not handed to the detectors.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Ineligible {
    NotAssistant,
    NoModel,
    NotReasoningModel,
    ReasoningDisabled,
}

impl Ineligible {
    pub fn as_str(self) -> &'static str {
        match self {
            Ineligible::NotAssistant => "not an assistant message",
            Ineligible::NoModel => "no model attached",
            Ineligible::NotReasoningModel => "model does not reason",
            Ineligible::ReasoningDisabled => "reasoning disabled for assistant",
        }
    }
}

/// Gate in front of the detector registry.
pub struct EligibilityGate<'a> {
    pub classifier: &'a dyn ModelClassifier,
    pub assistants: &'a dyn AssistantLookup,
    /// Model id substrings whose reasoning depends on assistant settings.
    pub conditional_families: &'a [String],
}

impl EligibilityGate<'_> {
    pub fn check(&self, message: &Message) -> Result<(), Ineligible> {
        if message.role != Role::Assistant {
            return Err(Ineligible::NotAssistant);
        }

        let model = message.model.as_ref().ok_or(Ineligible::NoModel)?;
        if !self.classifier.is_reasoning_model(model) {
            return Err(Ineligible::NotReasoningModel);
        }

        let conditional = self
            .conditional_families
            .iter()
            .any(|family| model.id.contains(family.as_str()));
        if conditional {
            let enabled = self
                .assistants
                .assistant_by_id(&message.assistant_id)
                .is_some_and(|assistant| assistant.reasoning_enabled());
            if !enabled {
                return Err(Ineligible::ReasoningDisabled);
            }
        }

        Ok(())
    }
}
