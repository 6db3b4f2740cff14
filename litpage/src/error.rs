use std::path::PathBuf;

use interpreter::ExecutionError;

use crate::segment::SegmentKind;

/// Convenience result type used across litpage.
pub type Result<T> = std::result::Result<T, LiterateError>;

/// Everything that can abort rendering a page. All of these are fatal for
/// the file being rendered.
#[derive(thiserror::Error, Debug)]
pub enum LiterateError {
    /// The segmenter was handed no lines at all.
    #[error("empty source: a literate file must start with a metadata block")]
    EmptyInput,

    /// The first segment is not a comment run.
    #[error("missing metadata block: expected leading `# ` lines holding a JSON object, found {found} at line {line}")]
    MissingMetadata { found: SegmentKind, line: usize },

    /// The leading comment run is not a JSON object.
    #[error("invalid metadata block at line {line}")]
    InvalidMetadata {
        line: usize,
        #[source]
        source: serde_json::Error,
    },

    /// A code segment raised while executing.
    #[error("code starting at line {line} failed")]
    Execution {
        line: usize,
        code: String,
        #[source]
        source: ExecutionError,
    },

    /// A `{{ ... }}` template expression raised while executing.
    #[error("template expression #{index} in {origin} failed")]
    Expression {
        origin: String,
        index: usize,
        code: String,
        #[source]
        source: ExecutionError,
    },

    /// Templates including each other too deeply, usually a cycle.
    #[error("template nesting deeper than {limit} levels at {}", .path.display())]
    NestingTooDeep { limit: usize, path: PathBuf },

    #[error("cannot read {}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl LiterateError {
    /// The embedded code responsible for the failure, if any.
    pub fn failing_code(&self) -> Option<(&str, &ExecutionError)> {
        match self {
            LiterateError::Execution { code, source, .. }
            | LiterateError::Expression { code, source, .. } => Some((code, source)),
            _ => None,
        }
    }

    /// This error followed by each of its causes, separated by `: `.
    pub fn chain_message(&self) -> String {
        let mut message = self.to_string();
        let mut cause = std::error::Error::source(self);
        while let Some(error) = cause {
            message.push_str(": ");
            message.push_str(&error.to_string());
            cause = error.source();
        }
        message
    }
}
