//! Shared error-kind vocabulary: the taxonomy both tools report errors
//! against.
//!
//! `rvasm` wraps this in a richer error carrying the offending token and
//! source line; `rvsim`'s CLI maps the same kinds back to the process exit
//! code a caller sees. Keeping the kind/code pairing in one place means the
//! two tools can't drift apart the way two independently maintained copies
//! of the same table eventually would.

use std::fmt;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum ErrorKind {
    Syntax,
    InvalidInstruction,
    InvalidRegister,
    InvalidImmediate,
    InvalidData,
    InvalidLabel,
}

impl ErrorKind {
    /// Process exit code for this error kind.
    pub fn exit_code(self) -> i32 {
        match self {
            ErrorKind::Syntax => 1,
            ErrorKind::InvalidInstruction => 2,
            ErrorKind::InvalidRegister => 3,
            ErrorKind::InvalidImmediate => 4,
            ErrorKind::InvalidData => 5,
            ErrorKind::InvalidLabel => 6,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            ErrorKind::Syntax => "ERROR_SYNTAX",
            ErrorKind::InvalidInstruction => "INVALID_INSTRUCTION",
            ErrorKind::InvalidRegister => "INVALID_REGISTER",
            ErrorKind::InvalidImmediate => "INVALID_IMMEDIATE_VALUE",
            ErrorKind::InvalidData => "INVALID_DATA",
            ErrorKind::InvalidLabel => "INVALID_LABEL",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}
