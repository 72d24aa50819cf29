mod article;
mod preference;
mod processing;

pub use article::*;
pub use preference::*;
pub use processing::*;

/// Unrecognised text value for one of the stored enums.
#[derive(Debug, Clone, thiserror::Error)]
#[error("unknown {field} value: {value:?}")]
pub struct ParseEnumError {
    pub field: &'static str,
    pub value: String,
}

impl ParseEnumError {
    pub fn new(field: &'static str, value: &str) -> Self {
        Self {
            field,
            value: value.to_string(),
        }
    }
}
