use thiserror::Error;

/// Fatal script authoring errors. Missing variables are never errors.
#[derive(Debug, Error)]
pub enum ScriptError {
    #[error("invalid regex {pattern:?}: {source}")]
    InvalidRegex {
        pattern: String,
        #[source]
        source: regex::Error,
    },
    #[error("operand {operand:?} is not a number")]
    NotANumber { operand: String },
}

impl ScriptError {
    pub(crate) fn invalid_regex(pattern: &str, source: regex::Error) -> Self {
        Self::InvalidRegex {
            pattern: pattern.to_string(),
            source,
        }
    }
}

/// Parses an operand the way comparisons and arithmetic expect it.
pub fn parse_number(operand: &str) -> Result<f32, ScriptError> {
    operand
        .trim()
        .parse::<f32>()
        .map_err(|_| ScriptError::NotANumber {
            operand: operand.to_string(),
        })
}
