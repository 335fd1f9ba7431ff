//! `rvsim`'s error type: the rare unrecoverable conditions, distinct from
//! the runtime anomalies that get absorbed as warnings instead (misaligned
//! access, read-miss, div-by-zero, unknown opcode — those never reach this
//! type, see `crate::memory` and `crate::stage`).

use std::io;
use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SimError {
    #[error("failed to read {path}: {source}")]
    ImageRead { path: PathBuf, #[source] source: io::Error },

    #[error("failed to write {path}: {source}")]
    ImageWrite { path: PathBuf, #[source] source: io::Error },
}

pub type Result<T> = std::result::Result<T, SimError>;
