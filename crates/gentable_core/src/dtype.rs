//! Column data types.

use serde::{Deserialize, Serialize};

/// The set of scalar and vector types a column may hold.
///
/// # Examples
///
/// ```
/// use gentable_core::DType;
///
/// let vector = DType::Vector(1536);
/// assert_eq!(vector, DType::Vector(1536));
/// assert_ne!(DType::Int, DType::Float);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "dtype")]
pub enum DType {
    /// 64-bit signed integer.
    Int,
    /// 64-bit floating point.
    Float,
    /// Boolean.
    Bool,
    /// UTF-8 text.
    Str,
    /// Image media.
    Image,
    /// Audio media.
    Audio,
    /// Document media (PDF, DOCX, etc.).
    Document,
    /// Fixed-length embedding vector of the given dimensionality.
    Vector(u32),
}

impl DType {
    /// Whether this dtype is a media dtype (stored via [`crate::MediaSource`]).
    pub fn is_media(&self) -> bool {
        matches!(self, DType::Image | DType::Audio | DType::Document)
    }

    /// The vector dimensionality, if this is a vector dtype.
    pub fn vector_dim(&self) -> Option<u32> {
        match self {
            DType::Vector(n) => Some(*n),
            _ => None,
        }
    }
}
