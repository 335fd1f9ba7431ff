//! `rv32core`: the instruction-set tables, encode/decode engine, register
//! file layout and memory-image format shared by the `rvasm` assembler and
//! the `rvsim` pipelined simulator.
//!
//! Neither `rvasm` nor `rvsim` keeps its own copy of the opcode/funct
//! tables; both build on [`isa`] and [`instruction`] so the encoder and the
//! decoder can never drift apart.

pub mod error;
pub mod fields;
pub mod image;
pub mod instruction;
pub mod isa;
pub mod registers;

pub use image::{DataImage, TextImage, DATA_BASE};
pub use instruction::Instruction;
pub use isa::{Format, Mnemonic};
pub use registers::{Reg, RegisterFile};
