//! The decode stage: turns a fetched word into a control bundle and
//! resolved operands, and — because branch resolution happens at decode
//! rather than execute — decides the taken/target outcome for every
//! control-flow instruction right here.

use rv32core::instruction::Instruction;
use rv32core::isa::Mnemonic;
use rv32core::registers::{Reg, RegisterFile};

use crate::control::ControlBundle;
use crate::latch::{ExMem, MemWb};
use crate::trace::Stage as TraceStage;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct BranchOutcome {
    pub taken: bool,
    pub target: u32,
}

pub struct Decoded {
    pub instruction: Instruction,
    pub control: ControlBundle,
    pub rs1_val: i32,
    pub rs2_val: i32,
    pub branch: Option<BranchOutcome>,
}

/// Looks up a register's value, preferring EX/MEM's result over MEM/WB's
/// over the architectural register file. Called from both decode
/// (resolving branches and base ID/EX operands)
/// and execute (re-resolving immediately before the ALU runs), each with
/// whatever `ex_mem`/`mem_wb` currently hold at that point in the cycle.
pub fn forward(reg: Reg, regs: &RegisterFile, ex_mem: Option<&ExMem>, mem_wb: Option<&MemWb>) -> i32 {
    if reg.is_zero() {
        return 0;
    }
    if let Some(ex_mem) = ex_mem {
        if ex_mem.control.reg_write && !ex_mem.control.is_nop && ex_mem.rd == reg {
            return ex_mem.alu_result;
        }
    }
    if let Some(mem_wb) = mem_wb {
        if mem_wb.control.reg_write && !mem_wb.control.is_nop && mem_wb.rd == reg {
            return mem_wb.write_value;
        }
    }
    regs.read(reg)
}

/// Reports which latch (if any) [`forward`] would actually pull `reg`'s
/// value from, so the caller can log it against the consuming instruction.
/// Kept separate from `forward` itself so the hot path stays a plain value
/// lookup.
pub fn forward_source(reg: Reg, ex_mem: Option<&ExMem>, mem_wb: Option<&MemWb>) -> Option<TraceStage> {
    if reg.is_zero() {
        return None;
    }
    if let Some(ex_mem) = ex_mem {
        if ex_mem.control.reg_write && !ex_mem.control.is_nop && ex_mem.rd == reg {
            return Some(TraceStage::Execute);
        }
    }
    if let Some(mem_wb) = mem_wb {
        if mem_wb.control.reg_write && !mem_wb.control.is_nop && mem_wb.rd == reg {
            return Some(TraceStage::Memory);
        }
    }
    None
}

/// Resolves direction and target for every control-flow mnemonic; `None`
/// for anything else. `imm` is the already-sign-extended field value.
pub fn resolve_branch(mnemonic: Mnemonic, pc: u32, imm: i32, rs1_val: i32, rs2_val: i32) -> Option<BranchOutcome> {
    use Mnemonic::*;

    let pc_relative = pc.wrapping_add(imm as u32);
    match mnemonic {
        Beq => Some(BranchOutcome { taken: rs1_val == rs2_val, target: pc_relative }),
        Bne => Some(BranchOutcome { taken: rs1_val != rs2_val, target: pc_relative }),
        Blt => Some(BranchOutcome { taken: rs1_val < rs2_val, target: pc_relative }),
        Bge => Some(BranchOutcome { taken: rs1_val >= rs2_val, target: pc_relative }),
        Bltu => Some(BranchOutcome { taken: (rs1_val as u32) < (rs2_val as u32), target: pc_relative }),
        Bgeu => Some(BranchOutcome { taken: (rs1_val as u32) >= (rs2_val as u32), target: pc_relative }),
        Jal => Some(BranchOutcome { taken: true, target: pc_relative }),
        Jalr => Some(BranchOutcome { taken: true, target: (rs1_val.wrapping_add(imm) as u32) & !1u32 }),
        _ => None,
    }
}

/// Decodes a fetched word. Returns `None` for an unrecognized opcode — the
/// caller turns that into an `is_nop` bubble rather than an error (spec
/// §4.6 "An unrecognized combination sets is_nop and prints a
/// diagnostic").
pub fn decode(raw: u32, pc: u32, regs: &RegisterFile, ex_mem: Option<&ExMem>, mem_wb: Option<&MemWb>) -> Option<Decoded> {
    let instruction = Instruction::decode(raw)?;
    let control = ControlBundle::for_mnemonic(instruction.mnemonic);
    let rs1_val = forward(instruction.rs1, regs, ex_mem, mem_wb);
    let rs2_val = forward(instruction.rs2, regs, ex_mem, mem_wb);
    let branch = resolve_branch(instruction.mnemonic, pc, instruction.imm, rs1_val, rs2_val);
    Some(Decoded { instruction, control, rs1_val, rs2_val, branch })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rv32core::registers::RegisterFile;

    fn reg(n: u32) -> Reg {
        Reg::from_index(n).unwrap()
    }

    #[test]
    fn forward_prefers_ex_mem_over_mem_wb_and_regfile() {
        let regs = RegisterFile::new();
        let ex_mem = ExMem {
            pc: 0,
            seq: 0,
            control: ControlBundle::for_mnemonic(Mnemonic::Add),
            rd: reg(5),
            alu_result: 111,
            store_data: 0,
        };
        let mem_wb = MemWb {
            pc: 0,
            seq: 0,
            control: ControlBundle::for_mnemonic(Mnemonic::Add),
            rd: reg(5),
            write_value: 222,
        };
        assert_eq!(forward(reg(5), &regs, Some(&ex_mem), Some(&mem_wb)), 111);
        assert_eq!(forward(reg(5), &regs, None, Some(&mem_wb)), 222);
        assert_eq!(forward(reg(5), &regs, None, None), 0);
    }

    #[test]
    fn forward_source_names_the_latch_that_would_supply_the_value() {
        let ex_mem = ExMem {
            pc: 0,
            seq: 0,
            control: ControlBundle::for_mnemonic(Mnemonic::Add),
            rd: reg(5),
            alu_result: 111,
            store_data: 0,
        };
        let mem_wb = MemWb {
            pc: 0,
            seq: 0,
            control: ControlBundle::for_mnemonic(Mnemonic::Add),
            rd: reg(5),
            write_value: 222,
        };
        assert_eq!(forward_source(reg(5), Some(&ex_mem), Some(&mem_wb)), Some(TraceStage::Execute));
        assert_eq!(forward_source(reg(5), None, Some(&mem_wb)), Some(TraceStage::Memory));
        assert_eq!(forward_source(reg(5), None, None), None);
        assert_eq!(forward_source(reg(0), Some(&ex_mem), None), None);
    }

    #[test]
    fn forward_never_returns_nonzero_for_x0() {
        let mut regs = RegisterFile::new();
        regs.write(reg(0), 999); // suppressed by RegisterFile itself, belt and suspenders here
        assert_eq!(forward(reg(0), &regs, None, None), 0);
    }

    #[test]
    fn beq_taken_targets_pc_plus_immediate() {
        let outcome = resolve_branch(Mnemonic::Beq, 100, 16, 7, 7).unwrap();
        assert!(outcome.taken);
        assert_eq!(outcome.target, 116);
    }

    #[test]
    fn bne_not_taken_on_equal_operands() {
        let outcome = resolve_branch(Mnemonic::Bne, 100, 16, 7, 7).unwrap();
        assert!(!outcome.taken);
    }

    #[test]
    fn bltu_treats_operands_as_unsigned() {
        let outcome = resolve_branch(Mnemonic::Bltu, 0, 4, -1, 1).unwrap();
        assert!(!outcome.taken); // -1 as u32 is huge, not less than 1
    }

    #[test]
    fn jal_is_always_taken_to_pc_plus_immediate() {
        let outcome = resolve_branch(Mnemonic::Jal, 40, 8, 0, 0).unwrap();
        assert!(outcome.taken);
        assert_eq!(outcome.target, 48);
    }

    #[test]
    fn jalr_clears_the_low_bit_of_its_target() {
        let outcome = resolve_branch(Mnemonic::Jalr, 40, 5, 10, 0).unwrap();
        assert!(outcome.taken);
        assert_eq!(outcome.target, 14); // (10 + 5) & !1
    }

    #[test]
    fn non_control_flow_mnemonic_resolves_to_none() {
        assert_eq!(resolve_branch(Mnemonic::Add, 0, 0, 0, 0), None);
    }

    #[test]
    fn unrecognized_word_decodes_to_none() {
        let regs = RegisterFile::new();
        assert!(decode(0x0000_007F, 0, &regs, None, None).is_none());
    }
}
