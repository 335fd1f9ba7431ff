//! Data-hazard detection. Pure functions over the current latch snapshot;
//! the simulator owns the bookkeeping (distinct-vs-total stall counting)
//! this feeds.

use rv32core::instruction::Instruction;
use rv32core::registers::Reg;

use crate::latch::{ExMem, IdEx, IfId, MemWb};

fn reads(instr: &Instruction, rd: Reg) -> bool {
    !rd.is_zero() && (instr.rs1 == rd || instr.rs2 == rd)
}

/// True if the instruction about to be decoded (`if_id`) must stall this
/// cycle given the producers currently occupying the pipeline.
///
/// With forwarding enabled the only unavoidable hazard is load-use: a load
/// in ID/EX whose destination is a source of the instruction in IF/ID.
/// Without forwarding, any in-flight producer (ID/EX, EX/MEM, or MEM/WB)
/// that hasn't reached writeback yet blocks the consumer.
pub fn detect_stall(
    if_id: Option<&IfId>,
    id_ex: Option<&IdEx>,
    ex_mem: Option<&ExMem>,
    mem_wb: Option<&MemWb>,
    forwarding: bool,
) -> bool {
    let consumer = match if_id.and_then(|f| Instruction::decode(f.raw)) {
        Some(instr) => instr,
        None => return false,
    };

    if forwarding {
        id_ex
            .map(|l| l.control.mem_read && reads(&consumer, l.rd))
            .unwrap_or(false)
    } else {
        let producers = [
            id_ex.map(|l| (l.control.reg_write, l.rd)),
            ex_mem.map(|l| (l.control.reg_write, l.rd)),
            mem_wb.map(|l| (l.control.reg_write, l.rd)),
        ];
        producers.iter().flatten().any(|&(writes, rd)| writes && reads(&consumer, rd))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rv32core::isa::Mnemonic;
    use rv32core::Instruction as RawInstruction;
    use crate::control::ControlBundle;

    fn reg(n: u32) -> Reg {
        Reg::from_index(n).unwrap()
    }

    fn if_id_for(instr: RawInstruction) -> IfId {
        IfId { pc: 0, seq: 0, raw: instr.encode(), predicted_taken: false, predicted_target: 4 }
    }

    #[test]
    fn load_use_stalls_even_with_forwarding() {
        let consumer = if_id_for(RawInstruction::r(Mnemonic::Add, reg(3), reg(1), reg(2)));
        let load = IdEx {
            pc: 0,
            seq: 0,
            instruction: RawInstruction::i(Mnemonic::Lw, reg(1), reg(4), 0),
            control: ControlBundle::for_mnemonic(Mnemonic::Lw),
            rd: reg(1),
            rs1_val: 0,
            rs2_val: 0,
        };
        assert!(detect_stall(Some(&consumer), Some(&load), None, None, true));
    }

    #[test]
    fn non_load_producer_needs_no_stall_with_forwarding() {
        let consumer = if_id_for(RawInstruction::r(Mnemonic::Add, reg(3), reg(1), reg(2)));
        let adder = IdEx {
            pc: 0,
            seq: 0,
            instruction: RawInstruction::r(Mnemonic::Add, reg(1), reg(5), reg(6)),
            control: ControlBundle::for_mnemonic(Mnemonic::Add),
            rd: reg(1),
            rs1_val: 0,
            rs2_val: 0,
        };
        assert!(!detect_stall(Some(&consumer), Some(&adder), None, None, true));
    }

    #[test]
    fn without_forwarding_any_in_flight_producer_stalls() {
        let consumer = if_id_for(RawInstruction::r(Mnemonic::Add, reg(3), reg(1), reg(2)));
        let ex_mem = ExMem {
            pc: 0,
            seq: 0,
            control: ControlBundle::for_mnemonic(Mnemonic::Add),
            rd: reg(2),
            alu_result: 0,
            store_data: 0,
        };
        assert!(detect_stall(Some(&consumer), None, Some(&ex_mem), None, false));
    }

    #[test]
    fn x0_destination_never_causes_a_stall() {
        let consumer = if_id_for(RawInstruction::r(Mnemonic::Add, reg(3), reg(1), reg(2)));
        let load = IdEx {
            pc: 0,
            seq: 0,
            instruction: RawInstruction::i(Mnemonic::Lw, reg(0), reg(4), 0),
            control: ControlBundle::for_mnemonic(Mnemonic::Lw),
            rd: reg(0),
            rs1_val: 0,
            rs2_val: 0,
        };
        assert!(!detect_stall(Some(&consumer), Some(&load), None, None, true));
    }

    #[test]
    fn no_if_id_means_nothing_to_stall_for() {
        assert!(!detect_stall(None, None, None, None, true));
    }
}
