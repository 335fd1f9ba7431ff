//! The four inter-stage latches.
//!
//! Each latch is `Option<T>`: `None` is the bubble state, a pipeline slot
//! carrying no real instruction that propagates as a no-op. Rust's own
//! niche for "absent" stands in for a separate valid/invalid bool field
//! next to the real payload.

use rv32core::instruction::Instruction;
use rv32core::registers::Reg;

use crate::control::ControlBundle;

/// Output of fetch, input to decode.
#[derive(Clone, Debug)]
pub struct IfId {
    pub pc: u32,
    pub seq: u64,
    pub raw: u32,
    pub predicted_taken: bool,
    pub predicted_target: u32,
}

/// Output of decode, input to execute.
#[derive(Clone, Debug)]
pub struct IdEx {
    pub pc: u32,
    pub seq: u64,
    pub instruction: Instruction,
    pub control: ControlBundle,
    pub rd: Reg,
    pub rs1_val: i32,
    pub rs2_val: i32,
}

/// Output of execute, input to memory.
#[derive(Clone, Debug)]
pub struct ExMem {
    pub pc: u32,
    pub seq: u64,
    pub control: ControlBundle,
    pub rd: Reg,
    pub alu_result: i32,
    pub store_data: i32,
}

/// Output of memory, input to writeback.
#[derive(Clone, Debug)]
pub struct MemWb {
    pub pc: u32,
    pub seq: u64,
    pub control: ControlBundle,
    pub rd: Reg,
    pub write_value: i32,
}
