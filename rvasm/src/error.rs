//! `rvasm`'s fail-fast error type.
//!
//! Assembly is fail-fast: the first hard error aborts the run, so there is
//! never more than one `AssembleError` per run to report. `ErrorKind` (from
//! `rv32core`) already implements `Display`, so `thiserror` just slots it
//! into the message.

use rv32core::error::ErrorKind;
use thiserror::Error;

#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("{kind}: {message} (line {line})")]
pub struct AssembleError {
    pub kind: ErrorKind,
    pub line: usize,
    pub message: String,
}

impl AssembleError {
    pub fn new(kind: ErrorKind, line: usize, message: impl Into<String>) -> AssembleError {
        AssembleError { kind, line, message: message.into() }
    }
}

pub type Result<T> = std::result::Result<T, AssembleError>;
