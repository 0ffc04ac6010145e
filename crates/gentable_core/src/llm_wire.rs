//! Wire-level request/response types passed to an `LmEngine` provider
//! (spec §4.C step 4 "Invoke LMEngine").

use crate::{Message, Output};
use serde::{Deserialize, Serialize};

/// A generation request sent to a model provider.
///
/// # Examples
///
/// ```
/// use gentable_core::{GenerateRequest, Message, Role, Input};
///
/// let request = GenerateRequest {
///     messages: vec![Message {
///         role: Role::User,
///         content: vec![Input::Text("Hello!".to_string())],
///     }],
///     max_tokens: Some(100),
///     temperature: Some(0.7),
///     model: Some("gemini-2.0-flash-lite".to_string()),
/// };
///
/// assert_eq!(request.messages.len(), 1);
/// assert_eq!(request.max_tokens, Some(100));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct GenerateRequest {
    /// The conversation messages to send.
    pub messages: Vec<Message>,
    /// Maximum number of tokens to generate.
    pub max_tokens: Option<u32>,
    /// Sampling temperature (0.0 to 1.0).
    pub temperature: Option<f32>,
    /// Model identifier to use.
    pub model: Option<String>,
}

/// One streamed or terminal chunk of a generation response (spec §4.C step 4).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerateChunk {
    /// The incremental text delta, if any.
    pub delta_text: Option<String>,
    /// Cumulative prompt tokens, present on the terminal chunk.
    pub prompt_tokens: Option<u64>,
    /// Cumulative completion tokens, present on the terminal chunk.
    pub completion_tokens: Option<u64>,
    /// Set only on the terminal chunk.
    pub finish_reason: Option<String>,
}

impl GenerateChunk {
    /// Whether this is the terminal chunk of the stream.
    pub fn is_terminal(&self) -> bool {
        self.finish_reason.is_some()
    }
}

/// The unified non-streaming response object.
///
/// # Examples
///
/// ```
/// use gentable_core::{GenerateResponse, Output};
///
/// let response = GenerateResponse {
///     outputs: vec![Output::Text("Hello! How can I help?".to_string())],
/// };
///
/// assert_eq!(response.outputs.len(), 1);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerateResponse {
    /// The generated outputs from the model.
    pub outputs: Vec<Output>,
}
