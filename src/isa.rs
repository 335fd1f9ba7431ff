//! The single canonical RV32I+M instruction table.
//!
//! Every mnemonic's format, opcode, funct3 and funct7 live here exactly once.
//! Both the assembler's encoder and the simulator's decoder are built on top
//! of these lookups so the two can never drift apart into two independent,
//! slowly diverging copies of the same table.

use util::EnumFromStr;
use util_derive::EnumFromStr;

#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash)]
pub enum Format {
    R,
    I,
    /// The shift-immediate subfamily of I (`slli`/`srli`/`srai`): same
    /// encoding as `I` except the low 5 bits of the immediate field are a
    /// shift amount and the top 7 bits are a funct7 that distinguishes
    /// logical from arithmetic shifts.
    IShift,
    S,
    B,
    U,
    J,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash, EnumFromStr)]
#[allow(non_camel_case_types)]
pub enum Mnemonic {
    // R-type, base integer
    Add,
    Sub,
    And,
    Or,
    Xor,
    Sll,
    Srl,
    Sra,
    Slt,
    Sltu,
    // R-type, M extension
    Mul,
    Mulh,
    Mulhsu,
    Mulhu,
    Div,
    Divu,
    Rem,
    Remu,
    // I-type, arithmetic/logical immediate
    Addi,
    Andi,
    Ori,
    Xori,
    Slti,
    Sltiu,
    // I-type, shift immediate
    Slli,
    Srli,
    Srai,
    // I-type, loads
    Lb,
    Lh,
    Lw,
    Lbu,
    Lhu,
    // I-type, jalr
    Jalr,
    // S-type, stores
    Sb,
    Sh,
    Sw,
    // B-type, branches
    Beq,
    Bne,
    Blt,
    Bge,
    Bltu,
    Bgeu,
    // U-type
    Lui,
    Auipc,
    // J-type
    Jal,
}

pub const ALL_MNEMONICS: &[Mnemonic] = &[
    Mnemonic::Add,
    Mnemonic::Sub,
    Mnemonic::And,
    Mnemonic::Or,
    Mnemonic::Xor,
    Mnemonic::Sll,
    Mnemonic::Srl,
    Mnemonic::Sra,
    Mnemonic::Slt,
    Mnemonic::Sltu,
    Mnemonic::Mul,
    Mnemonic::Mulh,
    Mnemonic::Mulhsu,
    Mnemonic::Mulhu,
    Mnemonic::Div,
    Mnemonic::Divu,
    Mnemonic::Rem,
    Mnemonic::Remu,
    Mnemonic::Addi,
    Mnemonic::Andi,
    Mnemonic::Ori,
    Mnemonic::Xori,
    Mnemonic::Slti,
    Mnemonic::Sltiu,
    Mnemonic::Slli,
    Mnemonic::Srli,
    Mnemonic::Srai,
    Mnemonic::Lb,
    Mnemonic::Lh,
    Mnemonic::Lw,
    Mnemonic::Lbu,
    Mnemonic::Lhu,
    Mnemonic::Jalr,
    Mnemonic::Sb,
    Mnemonic::Sh,
    Mnemonic::Sw,
    Mnemonic::Beq,
    Mnemonic::Bne,
    Mnemonic::Blt,
    Mnemonic::Bge,
    Mnemonic::Bltu,
    Mnemonic::Bgeu,
    Mnemonic::Lui,
    Mnemonic::Auipc,
    Mnemonic::Jal,
];

/// Opcode, funct3 and funct7 as the RISC-V manual assigns them. `None` means
/// "this format doesn't carry that field" (U/J have no funct3; I/S/B/U/J have
/// no funct7 outside the shift-immediate subfamily).
struct Spec {
    format: Format,
    opcode: u32,
    funct3: Option<u32>,
    funct7: Option<u32>,
}

const OP: u32 = 0b0110011;
const OP_IMM: u32 = 0b0010011;
const LOAD: u32 = 0b0000011;
const STORE: u32 = 0b0100011;
const BRANCH: u32 = 0b1100011;
const LUI: u32 = 0b0110111;
const AUIPC: u32 = 0b0010111;
const JAL: u32 = 0b1101111;
const JALR: u32 = 0b1100111;

const FUNCT7_BASE: u32 = 0b0000000;
const FUNCT7_ALT: u32 = 0b0100000; // SUB, SRA, SRAI
const FUNCT7_MULDIV: u32 = 0b0000001;

fn spec_of(m: Mnemonic) -> Spec {
    use Mnemonic::*;
    match m {
        Add => Spec { format: Format::R, opcode: OP, funct3: Some(0x0), funct7: Some(FUNCT7_BASE) },
        Sub => Spec { format: Format::R, opcode: OP, funct3: Some(0x0), funct7: Some(FUNCT7_ALT) },
        Sll => Spec { format: Format::R, opcode: OP, funct3: Some(0x1), funct7: Some(FUNCT7_BASE) },
        Slt => Spec { format: Format::R, opcode: OP, funct3: Some(0x2), funct7: Some(FUNCT7_BASE) },
        Sltu => Spec { format: Format::R, opcode: OP, funct3: Some(0x3), funct7: Some(FUNCT7_BASE) },
        Xor => Spec { format: Format::R, opcode: OP, funct3: Some(0x4), funct7: Some(FUNCT7_BASE) },
        Srl => Spec { format: Format::R, opcode: OP, funct3: Some(0x5), funct7: Some(FUNCT7_BASE) },
        Sra => Spec { format: Format::R, opcode: OP, funct3: Some(0x5), funct7: Some(FUNCT7_ALT) },
        Or => Spec { format: Format::R, opcode: OP, funct3: Some(0x6), funct7: Some(FUNCT7_BASE) },
        And => Spec { format: Format::R, opcode: OP, funct3: Some(0x7), funct7: Some(FUNCT7_BASE) },

        Mul => Spec { format: Format::R, opcode: OP, funct3: Some(0x0), funct7: Some(FUNCT7_MULDIV) },
        Mulh => Spec { format: Format::R, opcode: OP, funct3: Some(0x1), funct7: Some(FUNCT7_MULDIV) },
        Mulhsu => Spec { format: Format::R, opcode: OP, funct3: Some(0x2), funct7: Some(FUNCT7_MULDIV) },
        Mulhu => Spec { format: Format::R, opcode: OP, funct3: Some(0x3), funct7: Some(FUNCT7_MULDIV) },
        Div => Spec { format: Format::R, opcode: OP, funct3: Some(0x4), funct7: Some(FUNCT7_MULDIV) },
        Divu => Spec { format: Format::R, opcode: OP, funct3: Some(0x5), funct7: Some(FUNCT7_MULDIV) },
        Rem => Spec { format: Format::R, opcode: OP, funct3: Some(0x6), funct7: Some(FUNCT7_MULDIV) },
        Remu => Spec { format: Format::R, opcode: OP, funct3: Some(0x7), funct7: Some(FUNCT7_MULDIV) },

        Addi => Spec { format: Format::I, opcode: OP_IMM, funct3: Some(0x0), funct7: None },
        Slti => Spec { format: Format::I, opcode: OP_IMM, funct3: Some(0x2), funct7: None },
        Sltiu => Spec { format: Format::I, opcode: OP_IMM, funct3: Some(0x3), funct7: None },
        Xori => Spec { format: Format::I, opcode: OP_IMM, funct3: Some(0x4), funct7: None },
        Ori => Spec { format: Format::I, opcode: OP_IMM, funct3: Some(0x6), funct7: None },
        Andi => Spec { format: Format::I, opcode: OP_IMM, funct3: Some(0x7), funct7: None },

        Slli => Spec { format: Format::IShift, opcode: OP_IMM, funct3: Some(0x1), funct7: Some(FUNCT7_BASE) },
        Srli => Spec { format: Format::IShift, opcode: OP_IMM, funct3: Some(0x5), funct7: Some(FUNCT7_BASE) },
        Srai => Spec { format: Format::IShift, opcode: OP_IMM, funct3: Some(0x5), funct7: Some(FUNCT7_ALT) },

        Lb => Spec { format: Format::I, opcode: LOAD, funct3: Some(0x0), funct7: None },
        Lh => Spec { format: Format::I, opcode: LOAD, funct3: Some(0x1), funct7: None },
        Lw => Spec { format: Format::I, opcode: LOAD, funct3: Some(0x2), funct7: None },
        Lbu => Spec { format: Format::I, opcode: LOAD, funct3: Some(0x4), funct7: None },
        Lhu => Spec { format: Format::I, opcode: LOAD, funct3: Some(0x5), funct7: None },

        Jalr => Spec { format: Format::I, opcode: JALR, funct3: Some(0x0), funct7: None },

        Sb => Spec { format: Format::S, opcode: STORE, funct3: Some(0x0), funct7: None },
        Sh => Spec { format: Format::S, opcode: STORE, funct3: Some(0x1), funct7: None },
        Sw => Spec { format: Format::S, opcode: STORE, funct3: Some(0x2), funct7: None },

        Beq => Spec { format: Format::B, opcode: BRANCH, funct3: Some(0x0), funct7: None },
        Bne => Spec { format: Format::B, opcode: BRANCH, funct3: Some(0x1), funct7: None },
        Blt => Spec { format: Format::B, opcode: BRANCH, funct3: Some(0x4), funct7: None },
        Bge => Spec { format: Format::B, opcode: BRANCH, funct3: Some(0x5), funct7: None },
        Bltu => Spec { format: Format::B, opcode: BRANCH, funct3: Some(0x6), funct7: None },
        Bgeu => Spec { format: Format::B, opcode: BRANCH, funct3: Some(0x7), funct7: None },

        Lui => Spec { format: Format::U, opcode: LUI, funct3: None, funct7: None },
        Auipc => Spec { format: Format::U, opcode: AUIPC, funct3: None, funct7: None },

        Jal => Spec { format: Format::J, opcode: JAL, funct3: None, funct7: None },
    }
}

pub fn format(m: Mnemonic) -> Format {
    spec_of(m).format
}

pub fn opcode(m: Mnemonic) -> u32 {
    spec_of(m).opcode
}

pub fn funct3(m: Mnemonic) -> Option<u32> {
    spec_of(m).funct3
}

pub fn funct7(m: Mnemonic) -> Option<u32> {
    spec_of(m).funct7
}

/// Reverse lookup used by the decoder: given the raw opcode/funct3/funct7
/// fields pulled out of a machine word, find the mnemonic they denote.
/// Returns `None` for a combination that matches no known mnemonic (the
/// simulator absorbs that as a warning, not a panic).
pub fn lookup(opcode: u32, funct3: Option<u32>, funct7: Option<u32>) -> Option<Mnemonic> {
    ALL_MNEMONICS
        .iter()
        .copied()
        .find(|&m| {
            let s = spec_of(m);
            if s.opcode != opcode {
                return false;
            }
            if s.funct3 != funct3 {
                return false;
            }
            match (s.funct7, funct7) {
                (Some(a), Some(b)) => a == b,
                (None, _) => true,
                (Some(_), None) => false,
            }
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_mnemonic_round_trips_through_lookup() {
        for &m in ALL_MNEMONICS {
            let s = spec_of(m);
            assert_eq!(lookup(s.opcode, s.funct3, s.funct7), Some(m), "{:?}", m);
        }
    }

    #[test]
    fn add_and_sub_share_opcode_and_funct3_but_not_funct7() {
        assert_eq!(opcode(Mnemonic::Add), opcode(Mnemonic::Sub));
        assert_eq!(funct3(Mnemonic::Add), funct3(Mnemonic::Sub));
        assert_ne!(funct7(Mnemonic::Add), funct7(Mnemonic::Sub));
    }

    #[test]
    fn mnemonic_from_str_is_case_insensitive() {
        assert_eq!("addi".parse::<Mnemonic>(), Ok(Mnemonic::Addi));
        assert_eq!("ADDI".parse::<Mnemonic>(), Ok(Mnemonic::Addi));
        assert_eq!("AddI".parse::<Mnemonic>(), Ok(Mnemonic::Addi));
    }

    #[test]
    fn unknown_mnemonic_text_is_err() {
        assert!("frobnicate".parse::<Mnemonic>().is_err());
    }

    #[test]
    fn shift_immediate_funct7_distinguishes_logical_from_arithmetic() {
        assert_eq!(format(Mnemonic::Slli), Format::IShift);
        assert_ne!(funct7(Mnemonic::Srli), funct7(Mnemonic::Srai));
    }
}
