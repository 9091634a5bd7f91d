use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Problems with the command line that are caught before anything runs.
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("{name} must be within (0, 1], got {value}")]
    FractionOutOfRange {
        name: &'static str,
        value: f64,
    },

    #[error("no target specified")]
    EmptyTarget,

    #[error("home reserve must be a non-negative amount of GB, got {0}")]
    NegativeReserve(f64),

    #[error("loop interval must be at least one millisecond")]
    ZeroInterval,
}

#[derive(Debug, Error, PartialEq)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("worker script {script} could not be written or has no RAM cost")]
    MissingScript {
        script: &'static str,
    },

    #[error("target {target} is not reachable from this node")]
    UnknownTarget {
        target: String,
    },
}
