//! Cell values.

use crate::MediaSource;
use serde::{Deserialize, Serialize};

/// A single cell's materialized value, tagged to match a [`crate::DType`].
///
/// # Examples
///
/// ```
/// use gentable_core::Value;
///
/// let v = Value::Str("hello".to_string());
/// assert!(!v.is_null());
/// assert!(Value::Null.is_null());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum Value {
    /// No value materialized yet (draft cell awaiting generation).
    Null,
    /// Integer value.
    Int(i64),
    /// Floating point value.
    Float(f64),
    /// Boolean value.
    Bool(bool),
    /// Text value.
    Str(String),
    /// Image media.
    Image(MediaSource),
    /// Audio media.
    Audio(MediaSource),
    /// Document media.
    Document(MediaSource),
    /// Embedding vector.
    Vector(Vec<f32>),
}

impl Value {
    /// Whether this value represents the absence of a value.
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Render this value for template substitution into an LLM prompt.
    ///
    /// Media and vector values render as a short placeholder rather than
    /// their raw bytes, since prompts are text.
    pub fn render_for_template(&self) -> String {
        match self {
            Value::Null => String::new(),
            Value::Int(i) => i.to_string(),
            Value::Float(f) => f.to_string(),
            Value::Bool(b) => b.to_string(),
            Value::Str(s) => s.clone(),
            Value::Image(_) => "[image]".to_string(),
            Value::Audio(_) => "[audio]".to_string(),
            Value::Document(_) => "[document]".to_string(),
            Value::Vector(v) => format!("[vector:{}]", v.len()),
        }
    }
}
