//! Execute, memory and writeback. Each is a pure function from its input
//! latch (plus whatever ambient state it legitimately reads — the register
//! file for forwarding, the data memory) to its output latch.

use rv32core::isa::Mnemonic;
use rv32core::registers::RegisterFile;

use crate::control::{AluOp, ControlBundle, OutputSelect};
use crate::decode;
use crate::latch::{ExMem, IdEx, MemWb};
use crate::memory::DataMemory;

/// Result of a writeback: whether a register was actually committed, and
/// whether the instruction that reached writeback was a real (non-NOP,
/// non-bubble) one.
pub struct WritebackResult {
    pub committed: bool,
}

pub fn execute(id_ex: &IdEx, regs: &RegisterFile, ex_mem: Option<&ExMem>, mem_wb: Option<&MemWb>) -> ExMem {
    let instr = &id_ex.instruction;
    let rs1_val = decode::forward(instr.rs1, regs, ex_mem, mem_wb);
    let rs2_val = decode::forward(instr.rs2, regs, ex_mem, mem_wb);
    let operand_b = if id_ex.control.use_immediate { instr.imm } else { rs2_val };

    let alu_result = match instr.mnemonic {
        Mnemonic::Auipc => (id_ex.pc as i32).wrapping_add(instr.imm),
        Mnemonic::Lui => instr.imm,
        Mnemonic::Jal | Mnemonic::Jalr => id_ex.pc.wrapping_add(4) as i32,
        _ => alu_compute(id_ex.control.alu_op, rs1_val, operand_b),
    };

    ExMem {
        pc: id_ex.pc,
        seq: id_ex.seq,
        control: id_ex.control,
        rd: instr.rd,
        alu_result,
        store_data: rs2_val,
    }
}

fn alu_compute(op: AluOp, a: i32, b: i32) -> i32 {
    match op {
        AluOp::Add => a.wrapping_add(b),
        AluOp::Sub => a.wrapping_sub(b),
        AluOp::And => a & b,
        AluOp::Or => a | b,
        AluOp::Xor => a ^ b,
        AluOp::Sll => ((a as u32).wrapping_shl((b as u32) & 0x1F)) as i32,
        AluOp::Srl => ((a as u32).wrapping_shr((b as u32) & 0x1F)) as i32,
        AluOp::Sra => a.wrapping_shr((b as u32) & 0x1F),
        AluOp::Slt => (a < b) as i32,
        AluOp::Sltu => ((a as u32) < (b as u32)) as i32,
        AluOp::Mul => a.wrapping_mul(b),
        AluOp::Mulh => (((a as i64).wrapping_mul(b as i64)) >> 32) as i32,
        AluOp::Mulhsu => (((a as i64).wrapping_mul(b as u32 as i64)) >> 32) as i32,
        AluOp::Mulhu => (((a as u32 as u64).wrapping_mul(b as u32 as u64)) >> 32) as i32,
        AluOp::Div => {
            if b == 0 {
                eprintln!("warning: division by zero");
                0
            } else {
                a.wrapping_div(b)
            }
        }
        AluOp::Divu => {
            if b == 0 {
                eprintln!("warning: division by zero");
                0
            } else {
                ((a as u32) / (b as u32)) as i32
            }
        }
        AluOp::Rem => {
            if b == 0 {
                eprintln!("warning: division by zero");
                0
            } else {
                a.wrapping_rem(b)
            }
        }
        AluOp::Remu => {
            if b == 0 {
                eprintln!("warning: division by zero");
                0
            } else {
                ((a as u32) % (b as u32)) as i32
            }
        }
        AluOp::Pass => b,
    }
}

pub fn memory(ex_mem: &ExMem, data: &mut DataMemory) -> MemWb {
    let write_value = match ex_mem.control.output_select {
        OutputSelect::Memory => data.load(ex_mem.alu_result as u32, ex_mem.control.mem_size),
        OutputSelect::Alu | OutputSelect::PcPlus4 => ex_mem.alu_result,
    };

    if ex_mem.control.mem_write {
        data.store(ex_mem.alu_result as u32, ex_mem.store_data, ex_mem.control.mem_size);
    }

    MemWb {
        pc: ex_mem.pc,
        seq: ex_mem.seq,
        control: ex_mem.control,
        rd: ex_mem.rd,
        write_value,
    }
}

/// Commits `mem_wb` to the register file. Returns whether this counted as
/// a real committed instruction (non-NOP).
pub fn writeback(mem_wb: &MemWb, regs: &mut RegisterFile) -> WritebackResult {
    if mem_wb.control.reg_write {
        regs.write(mem_wb.rd, mem_wb.write_value);
    }
    WritebackResult { committed: !mem_wb.control.is_nop }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum InstructionCategory {
    DataTransfer,
    Alu,
    Control,
}

/// Categorizes a committed instruction for the per-category statistics.
pub fn categorize(control: &ControlBundle) -> InstructionCategory {
    if control.is_branch || control.output_select == OutputSelect::PcPlus4 {
        InstructionCategory::Control
    } else if control.mem_read || control.mem_write {
        InstructionCategory::DataTransfer
    } else {
        InstructionCategory::Alu
    }
}
