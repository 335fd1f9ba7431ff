//! Per-instruction trace facility: for each instruction number, records
//! the cycle it entered each stage, its disassembled form, the forwarding
//! events that benefited it, and any BTB updates attributable to it.

use std::collections::BTreeMap;
use std::fmt;

use rv32core::instruction::Instruction;
use rv32core::registers::Reg;

#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Debug)]
pub enum Stage {
    Fetch,
    Decode,
    Execute,
    Memory,
    Writeback,
}

#[derive(Clone, Copy, Debug)]
pub struct ForwardEvent {
    pub register: Reg,
    pub from: Stage,
}

#[derive(Clone, Debug, Default)]
pub struct InstructionTrace {
    pub disassembly: String,
    pub stage_entered_at: BTreeMap<Stage, u64>,
    pub forwards: Vec<ForwardEvent>,
    pub btb_updated: bool,
}

/// A minimal but complete disassembly, good enough for a trace line (spec
/// leaves the exact textual form unspecified beyond "disassembled form").
pub fn disassemble(instr: &Instruction) -> String {
    let mnemonic = format!("{:?}", instr.mnemonic).to_lowercase();
    use rv32core::isa::Format;
    match rv32core::isa::format(instr.mnemonic) {
        Format::R => format!("{} {}, {}, {}", mnemonic, instr.rd, instr.rs1, instr.rs2),
        Format::I | Format::IShift => format!("{} {}, {}, {}", mnemonic, instr.rd, instr.rs1, instr.imm),
        Format::S | Format::B => format!("{} {}, {}, {}", mnemonic, instr.rs1, instr.rs2, instr.imm),
        Format::U | Format::J => format!("{} {}, {}", mnemonic, instr.rd, instr.imm),
    }
}

impl fmt::Display for InstructionTrace {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.disassembly)
    }
}

/// Keyed by the monotonically increasing instruction number assigned at
/// fetch.
#[derive(Clone, Debug, Default)]
pub struct Tracer {
    entries: BTreeMap<u64, InstructionTrace>,
    /// When set, only this instruction number's events are recorded (spec
    /// §4.10 "single-instruction trace selection").
    selected: Option<u64>,
}

impl Tracer {
    pub fn new(selected: Option<u64>) -> Tracer {
        Tracer { entries: BTreeMap::new(), selected }
    }

    fn tracked(&self, seq: u64) -> bool {
        self.selected.map(|s| s == seq).unwrap_or(true)
    }

    pub fn enter_stage(&mut self, seq: u64, stage: Stage, cycle: u64) {
        if !self.tracked(seq) {
            return;
        }
        self.entries.entry(seq).or_default().stage_entered_at.insert(stage, cycle);
    }

    pub fn set_disassembly(&mut self, seq: u64, instr: &Instruction) {
        if !self.tracked(seq) {
            return;
        }
        self.entries.entry(seq).or_default().disassembly = disassemble(instr);
    }

    pub fn record_forward(&mut self, seq: u64, register: Reg, from: Stage) {
        if !self.tracked(seq) {
            return;
        }
        self.entries.entry(seq).or_default().forwards.push(ForwardEvent { register, from });
    }

    pub fn record_btb_update(&mut self, seq: u64) {
        if !self.tracked(seq) {
            return;
        }
        self.entries.entry(seq).or_default().btb_updated = true;
    }

    pub fn get(&self, seq: u64) -> Option<&InstructionTrace> {
        self.entries.get(&seq)
    }

    pub fn iter(&self) -> impl Iterator<Item = (u64, &InstructionTrace)> {
        self.entries.iter().map(|(&seq, trace)| (seq, trace))
    }
}
