use thiserror::Error;

/// Recoverable failures of the learning core. None of them leave partial
/// effects behind: the operation that returns one has changed nothing.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LearnError {
    #[error("unit has no items")]
    EmptyUnit,
    #[error("session is already complete")]
    SessionComplete,
    #[error("no option selected")]
    NoSelection,
    #[error("no active session")]
    NoActiveSession,
    #[error("catalog has no courses")]
    NoCourses,
    #[error("unknown course: {0}")]
    UnknownCourse(String),
    #[error("unknown unit: {0}")]
    UnknownUnit(String),
}
