//! Error types shared across the crate.

use std::path::PathBuf;

use crate::scramble::CubeSize;

/// A formatted time string could not be turned back into seconds.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TimeFormatError {
    #[error("empty time string")]
    Empty,

    #[error("missing fractional part in {0:?}")]
    MissingFraction(String),

    #[error("expected exactly two fractional digits in {0:?}")]
    BadFraction(String),

    #[error("invalid number {part:?} in {input:?}")]
    InvalidNumber { input: String, part: String },

    #[error("seconds out of range in {0:?}")]
    SecondsOutOfRange(String),
}

/// A scramble token did not name a legal move.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ScrambleParseError {
    #[error("unknown face in move {0:?}")]
    UnknownFace(String),

    #[error("unknown modifier in move {0:?}")]
    UnknownModifier(String),

    #[error("unknown scramble type {0:?}")]
    UnknownCubeSize(String),
}

/// A session file was readable but its contents could not be accepted.
#[derive(Debug, thiserror::Error)]
pub enum SessionLoadError {
    #[error("session file is not valid JSON: {0}")]
    Corrupted(#[from] serde_json::Error),

    #[error("missing entry {0:?} in session file")]
    MissingField(&'static str),

    #[error("session file version {0} is newer than this build understands")]
    UnsupportedVersion(u32),

    #[error("solve {index} has an invalid time: {source}")]
    InvalidTime {
        index: usize,
        #[source]
        source: TimeFormatError,
    },

    #[error("solve {index} has an invalid date {value:?}")]
    InvalidDate { index: usize, value: String },

    #[error(transparent)]
    ScrambleType(#[from] ScrambleParseError),
}

/// Failures of the session file store.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("session {0:?} does not exist")]
    NotFound(String),

    #[error("session {0:?} already exists")]
    AlreadyExists(String),

    #[error("invalid session name {0:?}")]
    InvalidName(String),

    #[error("could not load {path}: {source}")]
    Load {
        path: PathBuf,
        #[source]
        source: SessionLoadError,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("could not encode session: {0}")]
    Encode(#[source] serde_json::Error),
}

/// Failures surfaced by the session coordinator to the shell.
#[derive(Debug, thiserror::Error)]
pub enum CoordinatorError {
    #[error("no session selected; create or open one to use the timer")]
    NoSession,

    #[error("there are no solves in this session")]
    NoSolves,

    #[error("solve {index} does not exist (session has {len} solves)")]
    NoSuchSolve { index: usize, len: usize },

    #[error("session {name:?} already holds {cube_size} solves")]
    CubeSizeLocked { name: String, cube_size: CubeSize },

    #[error(transparent)]
    Store(#[from] StoreError),
}
