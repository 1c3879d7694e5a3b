use std::path::PathBuf;

use thiserror::Error;

/// Fatal input problems; any of these aborts a pipeline run
#[derive(Debug, Error)]
pub enum InputError {
    #[error("failed to read transcript {path:?}: {source}")]
    Unreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("no doctor utterances found in transcript")]
    NoDoctorTurns,

    #[error("no patient utterances found in transcript")]
    NoPatientTurns,

    #[error("transcript too short: {chars} characters (minimum {min})")]
    TooShort { chars: usize, min: usize },
}

/// Failures of an external collaborator (NER, sentiment, generative model).
///
/// These never abort a run: each stage converts them into its default record.
#[derive(Debug, Error)]
pub enum CollaboratorError {
    /// HTTP transport or connection error
    #[error("request failed: {0}")]
    Request(String),

    #[error("request timed out")]
    Timeout,

    /// Non-success HTTP status from the service
    #[error("API error: {status} - {body}")]
    Api { status: u16, body: String },

    /// The response body did not have the expected shape
    #[error("failed to parse response: {0}")]
    Parse(String),

    #[error("collaborator returned an empty response")]
    EmptyResponse,
}

impl From<reqwest::Error> for CollaboratorError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            CollaboratorError::Timeout
        } else if e.is_decode() {
            CollaboratorError::Parse(e.to_string())
        } else {
            CollaboratorError::Request(e.to_string())
        }
    }
}

/// Configuration the core components cannot work with
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {role} speaker pattern {pattern:?}: {source}")]
    SpeakerPattern {
        role: String,
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("invalid filler word {word:?}: {source}")]
    FillerWord {
        word: String,
        #[source]
        source: regex::Error,
    },

    #[error("invalid whitespace pattern: {0}")]
    Whitespace(#[source] regex::Error),

    #[error("intent vocabulary must contain at least one label")]
    EmptyIntentLabels,
}

#[derive(Debug, Error)]
pub enum OutputError {
    #[error("failed to create output directory {path:?}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write {path:?}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to serialize {name}: {source}")]
    Serialize {
        name: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Top-level error returned by the pipeline
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Input(#[from] InputError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Output(#[from] OutputError),
}

pub type Result<T, E = PipelineError> = std::result::Result<T, E>;
