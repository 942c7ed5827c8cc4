//! Structured error types for the assembly engine.
//!
//! Most bad input degrades instead of erroring: a defective width metric
//! falls back to unwrapped text, an unparseable timesheet row becomes a
//! pending entry. The variants here cover the conditions that must abort
//! an assembly: malformed input JSON, a broken form definition, and a
//! submitted image that cannot be decoded or embedded. Silently dropping
//! user-submitted evidence is never acceptable, so image failures carry
//! the offending file's name.

use thiserror::Error;

/// The unified error type returned by all public API functions.
#[derive(Debug, Error)]
pub enum RapportError {
    /// Input JSON failed to parse as a form definition or submission.
    #[error("Failed to parse input: {source}{hint}")]
    Parse {
        source: serde_json::Error,
        hint: String,
    },

    /// The form definition is internally inconsistent (bad column ratios,
    /// degenerate widget rects, duplicate field names).
    #[error("Invalid form definition: {0}")]
    Definition(String),

    /// A submitted image could not be decoded or embedded. This aborts
    /// the whole assembly rather than omitting the image.
    #[error("Image '{name}': {reason}")]
    Image { name: String, reason: String },
}

impl From<serde_json::Error> for RapportError {
    fn from(e: serde_json::Error) -> Self {
        let hint = match e.classify() {
            serde_json::error::Category::Syntax => {
                "\n  Hint: check for trailing commas, missing quotes, or unescaped characters."
            }
            serde_json::error::Category::Data => {
                "\n  Hint: the JSON is valid but doesn't match the expected schema. Check field names and types."
            }
            serde_json::error::Category::Eof => {
                "\n  Hint: unexpected end of input. Is the JSON truncated?"
            }
            serde_json::error::Category::Io => "",
        };
        RapportError::Parse {
            source: e,
            hint: hint.to_string(),
        }
    }
}
