pub mod detectors;
pub mod eligibility;
pub mod extractor;
pub mod formats;
pub mod image;
pub mod message;
pub mod tags;

#[cfg(feature = "python")]
mod bindings;

pub use detectors::{
    Detector, DetectorRegistry, FoldTagDetector, MarkerDetector, ThinkTagDetector, ThoughtDetector,
};
pub use eligibility::{
    AssistantLookup, EligibilityGate, Ineligible, ModelClassifier, NoAssistants,
    PatternModelClassifier,
};
pub use extractor::{ExtractorConfig, ThoughtExtractor};
pub use message::{
    Assistant, AssistantSettings, ExtractionResult, Message, MessageStatus, Model, ReasoningEffort,
    Role,
};

#[cfg(feature = "python")]
use pyo3::prelude::*;

#[cfg(feature = "python")]
#[pymodule]
fn thoughtextract(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_class::<bindings::PyThoughtExtractor>()?;
    m.add_function(wrap_pyfunction!(bindings::extract_thought, m)?)?;
    m.add_function(wrap_pyfunction!(bindings::escape_dollar_number, m)?)?;
    m.add_function(wrap_pyfunction!(bindings::escape_brackets, m)?)?;
    m.add_function(wrap_pyfunction!(bindings::extract_title, m)?)?;
    m.add_function(wrap_pyfunction!(bindings::remove_svg_empty_lines, m)?)?;
    m.add_function(wrap_pyfunction!(bindings::with_gemini_grounding, m)?)?;
    m.add_function(wrap_pyfunction!(bindings::with_generate_image, m)?)?;
    Ok(())
}
