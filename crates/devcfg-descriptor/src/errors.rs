use thiserror::Error;

#[derive(Debug, Error)]
pub enum DescriptorError {
    #[error("malformed descriptor: {reason}")]
    MalformedDescriptor { reason: String },

    #[error("group '{group}' declared order does not match its children: {detail}")]
    InconsistentOrdering { group: String, detail: String },

    #[error("field '{path}' uses unknown type tag '{tag}'")]
    UnknownFieldType { path: String, tag: String },

    #[error("locale mapping of '{path}' has no '*' fallback entry")]
    MissingWildcardLabel { path: String },

    #[error("field '{path}' default value does not fit type '{tag}': {detail}")]
    InvalidDefault {
        path: String,
        tag: String,
        detail: String,
    },

    #[error("invalid period '{value}': {reason}")]
    InvalidPeriod { value: String, reason: String },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl DescriptorError {
    pub(crate) fn malformed(reason: impl Into<String>) -> Self {
        DescriptorError::MalformedDescriptor {
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, DescriptorError>;
