//! src/message.rs
//!
//! Chat message types consumed by the extraction pipeline.
//!
//! Only the fields the pipeline reads or writes are modelled here. Everything is
//! `serde`-friendly so a message stream producer can hand messages over as JSON.

use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
    System,
}

/// Lifecycle state of a message.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageStatus {
    Sending,
    Pending,
    Searching,
    #[default]
    Success,
    Paused,
    Error,
}

impl MessageStatus {
    /// True while content is still arriving from the model.
    pub fn is_streaming(self) -> bool {
        matches!(self, MessageStatus::Sending | MessageStatus::Pending)
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Model {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub provider: String,
}

/// Requested reasoning effort. Unknown levels are kept verbatim; only the
/// presence of a level matters to the gate.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ReasoningEffort {
    Low,
    Medium,
    High,
    Other(String),
}

impl From<String> for ReasoningEffort {
    fn from(level: String) -> Self {
        match level.as_str() {
            "low" => ReasoningEffort::Low,
            "medium" => ReasoningEffort::Medium,
            "high" => ReasoningEffort::High,
            _ => ReasoningEffort::Other(level),
        }
    }
}

impl From<ReasoningEffort> for String {
    fn from(effort: ReasoningEffort) -> Self {
        match effort {
            ReasoningEffort::Low => "low".to_string(),
            ReasoningEffort::Medium => "medium".to_string(),
            ReasoningEffort::High => "high".to_string(),
            ReasoningEffort::Other(level) => level,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssistantSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reasoning_effort: Option<ReasoningEffort>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assistant {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub settings: Option<AssistantSettings>,
}

impl Assistant {
    /// Whether reasoning was switched on for this assistant.
    pub fn reasoning_enabled(&self) -> bool {
        self.settings
            .as_ref()
            .is_some_and(|settings| settings.reasoning_effort.is_some())
    }
}

/// A segment of the answer backed by one or more grounding sources.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroundingSupport {
    pub segment: GroundingSegment,
    #[serde(default)]
    pub grounding_chunk_indices: Vec<usize>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroundingSegment {
    pub text: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroundingMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grounding_supports: Option<Vec<GroundingSupport>>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GeneratedImageKind {
    Url,
    Base64,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedImages {
    #[serde(rename = "type")]
    pub kind: GeneratedImageKind,
    pub images: Vec<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grounding_metadata: Option<GroundingMetadata>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generate_image: Option<GeneratedImages>,
}

/// A chat message in the producer's JSON shape (`modelId`, `assistantId`, ...).
/// `reasoning_content` keeps its snake_case name on the wire.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    #[serde(default)]
    pub id: String,
    pub role: Role,
    #[serde(default)]
    pub content: String,
    #[serde(
        rename = "reasoning_content",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub reasoning_content: Option<String>,
    #[serde(default)]
    pub status: MessageStatus,
    #[serde(default)]
    pub model_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<Model>,
    #[serde(default)]
    pub assistant_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<MessageMetadata>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub images: Option<Vec<String>>,
}

impl Message {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            id: String::new(),
            role,
            content: content.into(),
            reasoning_content: None,
            status: MessageStatus::default(),
            model_id: String::new(),
            model: None,
            assistant_id: String::new(),
            metadata: None,
            images: None,
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }

    /// Attaches a model, keeping `model_id` in sync with it.
    pub fn with_model(mut self, model: Model) -> Self {
        self.model_id = model.id.clone();
        self.model = Some(model);
        self
    }

    pub fn with_status(mut self, status: MessageStatus) -> Self {
        self.status = status;
        self
    }

    pub fn with_assistant_id(mut self, assistant_id: impl Into<String>) -> Self {
        self.assistant_id = assistant_id.into();
        self
    }

    /// Display name of the attached model, empty when there is none.
    pub fn model_name(&self) -> &str {
        self.model.as_ref().map(|m| m.name.as_str()).unwrap_or("")
    }

    /// Commits an extraction result. Both fields are overwritten together so the
    /// pair never reflects two different parses.
    pub fn apply(&mut self, result: ExtractionResult) {
        let ExtractionResult { reasoning, content } = result;
        self.reasoning_content = Some(reasoning);
        self.content = content;
    }
}

/// The split produced by a detector: hidden reasoning and visible answer.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionResult {
    pub reasoning: String,
    pub content: String,
}

impl ExtractionResult {
    pub fn new(reasoning: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            reasoning: reasoning.into(),
            content: content.into(),
        }
    }

    /// Result for a detector that matched but found nothing to split.
    pub(crate) fn passthrough(content: &str) -> Self {
        Self::new(String::new(), content)
    }
}
