use serde::Serialize;

/// Everything that can go wrong between a backend payload and a prepared chart.
#[derive(thiserror::Error, Debug)]
pub enum StatsError {
    /// Payload is present but is neither a record list nor a key/count mapping.
    #[error("unrecognised payload shape: {0}")]
    InvalidShape(String),

    /// An expected top-level field is absent from the payload.
    #[error("missing field `{0}`")]
    MissingField(&'static str),

    /// A formatter was handed a value outside its domain.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The fetch collaborator could not deliver a payload.
    #[error("fetch failed: {0}")]
    TransportFailure(String),

    /// A render target that is not a readable directory.
    #[error("not a directory: {0}")]
    NotADirectory(String),

    #[error("config error: {0}")]
    Config(String),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Why a panel has nothing to show. Every soft failure collapses into one of these.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EmptyReason {
    InvalidShape,
    MissingField,
    TransportFailure,
}

impl EmptyReason {
    /// Map a soft error onto its empty-state reason. Hard errors return `None`.
    pub fn from_error(err: &StatsError) -> Option<Self> {
        match err {
            StatsError::InvalidShape(_) => Some(Self::InvalidShape),
            StatsError::MissingField(_) => Some(Self::MissingField),
            StatsError::TransportFailure(_) => Some(Self::TransportFailure),
            StatsError::InvalidArgument(_)
            | StatsError::NotADirectory(_)
            | StatsError::Config(_)
            | StatsError::Json(_) => None,
        }
    }
}
