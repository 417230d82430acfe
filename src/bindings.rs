//! src/bindings.rs
//!
//! Python bindings. Messages cross the boundary as JSON strings in the same shape
//! the message stream producer emits.

use std::collections::HashMap;

use crate::detectors::{DetectorRegistry, ThoughtDetector};
use crate::extractor::{ExtractorConfig, ThoughtExtractor};
use crate::message::{Assistant, ExtractionResult, Message, MessageStatus, Model};
use crate::{formats, image, tags};
use once_cell::sync::Lazy;
use pyo3::exceptions::PyValueError;
use pyo3::prelude::*;

/// Registry built from the default config, for the module-level function.
static DEFAULT_REGISTRY: Lazy<DetectorRegistry> =
    Lazy::new(|| DetectorRegistry::new(&ExtractorConfig::default().marker_model_families));

fn to_py_err(err: impl std::fmt::Display) -> PyErr {
    PyValueError::new_err(err.to_string())
}

fn parse_message(message_json: &str) -> PyResult<Message> {
    serde_json::from_str(message_json).map_err(to_py_err)
}

fn into_tuple(result: ExtractionResult) -> (String, String) {
    (result.reasoning, result.content)
}

/// Python-facing extractor class
#[pyclass(name = "ThoughtExtractor")]
pub struct PyThoughtExtractor {
    extractor: ThoughtExtractor,
}

#[pymethods]
impl PyThoughtExtractor {
    /// `config_json` follows `ExtractorConfig`; `assistants_json` is a list of assistants.
    #[new]
    #[pyo3(signature = (config_json=None, assistants_json=None))]
    fn new(config_json: Option<&str>, assistants_json: Option<&str>) -> PyResult<Self> {
        let config = match config_json {
            Some(json) => ExtractorConfig::from_json(json).map_err(to_py_err)?,
            None => ExtractorConfig::default(),
        };

        let assistants: Vec<Assistant> = match assistants_json {
            Some(json) => serde_json::from_str(json).map_err(to_py_err)?,
            None => Vec::new(),
        };
        let lookup: HashMap<String, Assistant> = assistants
            .into_iter()
            .map(|assistant| (assistant.id.clone(), assistant))
            .collect();

        let extractor = ThoughtExtractor::new(config, lookup).map_err(to_py_err)?;
        Ok(Self { extractor })
    }

    /// Returns `(reasoning, content)` or `None` when the message is left alone.
    fn extract(&self, message_json: &str) -> PyResult<Option<(String, String)>> {
        let message = parse_message(message_json)?;
        Ok(self.extractor.extract(&message).map(into_tuple))
    }

    /// Returns the message JSON with `content` and `reasoning_content` rewritten.
    fn with_message_thought(&self, message_json: &str) -> PyResult<String> {
        let message = self.extractor.with_message_thought(parse_message(message_json)?);
        serde_json::to_string(&message).map_err(to_py_err)
    }

    /// Extract a batch of messages in parallel.
    fn extract_batch(&self, messages_json: Vec<String>) -> PyResult<Vec<Option<(String, String)>>> {
        let messages = messages_json
            .iter()
            .map(|json| parse_message(json))
            .collect::<PyResult<Vec<_>>>()?;

        Ok(self
            .extractor
            .extract_batch(&messages)
            .into_iter()
            .map(|result| result.map(into_tuple))
            .collect())
    }
}

/// Runs the detectors on `content` without the eligibility gate.
#[pyfunction]
#[pyo3(signature = (content, model_id, model_name=None, status="success"))]
pub fn extract_thought(
    content: &str,
    model_id: &str,
    model_name: Option<&str>,
    status: &str,
) -> PyResult<Option<(String, String)>> {
    let status: MessageStatus =
        serde_json::from_value(serde_json::Value::String(status.to_string())).map_err(to_py_err)?;
    let message = Message::assistant(content)
        .with_model(Model {
            id: model_id.to_string(),
            name: model_name.unwrap_or_default().to_string(),
            provider: String::new(),
        })
        .with_status(status);

    let trimmed = tags::trim_content(&message.content);
    Ok(DEFAULT_REGISTRY
        .select(trimmed, &message)
        .map(|detector| into_tuple(detector.process(trimmed))))
}

#[pyfunction]
pub fn escape_dollar_number(text: &str) -> String {
    formats::escape_dollar_number(text)
}

#[pyfunction]
pub fn escape_brackets(text: &str) -> String {
    formats::escape_brackets(text)
}

#[pyfunction]
pub fn extract_title(html: &str) -> Option<String> {
    formats::extract_title(html)
}

#[pyfunction]
pub fn remove_svg_empty_lines(text: &str) -> String {
    formats::remove_svg_empty_lines(text)
}

#[pyfunction]
pub fn with_gemini_grounding(message_json: &str) -> PyResult<String> {
    Ok(formats::with_gemini_grounding(&parse_message(message_json)?))
}

#[pyfunction]
pub fn with_generate_image(message_json: &str) -> PyResult<String> {
    let message = image::with_generate_image(parse_message(message_json)?);
    serde_json::to_string(&message).map_err(to_py_err)
}

