//! The per-instruction control bundle, produced by table lookup on
//! (opcode, funct3, funct7). `ControlBundle::for_mnemonic` *is* that table
//! lookup, built on top of `rv32core::isa` rather than a second copy of it.

use rv32core::isa::Mnemonic;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum OutputSelect {
    Alu,
    Memory,
    PcPlus4,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum MemSize {
    Byte,
    Half,
    Word,
    ByteUnsigned,
    HalfUnsigned,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum AluOp {
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
    Mul,
    Mulh,
    Mulhsu,
    Mulhu,
    Div,
    Divu,
    Rem,
    Remu,
    /// Passes operand B through unchanged (`lui`'s immediate, `auipc`'s
    /// offset before the PC is added back in by the execute stage).
    Pass,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct ControlBundle {
    pub mem_read: bool,
    pub mem_write: bool,
    pub reg_write: bool,
    pub is_branch: bool,
    pub use_immediate: bool,
    pub output_select: OutputSelect,
    pub alu_op: AluOp,
    pub mem_size: MemSize,
    pub is_nop: bool,
}

impl ControlBundle {
    /// An invalid-latch / unrecognized-opcode bubble: every effect
    /// suppressed.
    pub fn nop() -> ControlBundle {
        ControlBundle {
            mem_read: false,
            mem_write: false,
            reg_write: false,
            is_branch: false,
            use_immediate: false,
            output_select: OutputSelect::Alu,
            alu_op: AluOp::Add,
            mem_size: MemSize::Word,
            is_nop: true,
        }
    }

    pub fn for_mnemonic(m: Mnemonic) -> ControlBundle {
        use Mnemonic::*;

        let base = ControlBundle {
            mem_read: false,
            mem_write: false,
            reg_write: false,
            is_branch: false,
            use_immediate: false,
            output_select: OutputSelect::Alu,
            alu_op: AluOp::Add,
            mem_size: MemSize::Word,
            is_nop: false,
        };

        match m {
            Add => ControlBundle { reg_write: true, alu_op: AluOp::Add, ..base },
            Sub => ControlBundle { reg_write: true, alu_op: AluOp::Sub, ..base },
            And => ControlBundle { reg_write: true, alu_op: AluOp::And, ..base },
            Or => ControlBundle { reg_write: true, alu_op: AluOp::Or, ..base },
            Xor => ControlBundle { reg_write: true, alu_op: AluOp::Xor, ..base },
            Sll => ControlBundle { reg_write: true, alu_op: AluOp::Sll, ..base },
            Srl => ControlBundle { reg_write: true, alu_op: AluOp::Srl, ..base },
            Sra => ControlBundle { reg_write: true, alu_op: AluOp::Sra, ..base },
            Slt => ControlBundle { reg_write: true, alu_op: AluOp::Slt, ..base },
            Sltu => ControlBundle { reg_write: true, alu_op: AluOp::Sltu, ..base },

            Mul => ControlBundle { reg_write: true, alu_op: AluOp::Mul, ..base },
            Mulh => ControlBundle { reg_write: true, alu_op: AluOp::Mulh, ..base },
            Mulhsu => ControlBundle { reg_write: true, alu_op: AluOp::Mulhsu, ..base },
            Mulhu => ControlBundle { reg_write: true, alu_op: AluOp::Mulhu, ..base },
            Div => ControlBundle { reg_write: true, alu_op: AluOp::Div, ..base },
            Divu => ControlBundle { reg_write: true, alu_op: AluOp::Divu, ..base },
            Rem => ControlBundle { reg_write: true, alu_op: AluOp::Rem, ..base },
            Remu => ControlBundle { reg_write: true, alu_op: AluOp::Remu, ..base },

            Addi => ControlBundle { reg_write: true, use_immediate: true, alu_op: AluOp::Add, ..base },
            Andi => ControlBundle { reg_write: true, use_immediate: true, alu_op: AluOp::And, ..base },
            Ori => ControlBundle { reg_write: true, use_immediate: true, alu_op: AluOp::Or, ..base },
            Xori => ControlBundle { reg_write: true, use_immediate: true, alu_op: AluOp::Xor, ..base },
            Slti => ControlBundle { reg_write: true, use_immediate: true, alu_op: AluOp::Slt, ..base },
            Sltiu => ControlBundle { reg_write: true, use_immediate: true, alu_op: AluOp::Sltu, ..base },

            Slli => ControlBundle { reg_write: true, use_immediate: true, alu_op: AluOp::Sll, ..base },
            Srli => ControlBundle { reg_write: true, use_immediate: true, alu_op: AluOp::Srl, ..base },
            Srai => ControlBundle { reg_write: true, use_immediate: true, alu_op: AluOp::Sra, ..base },

            Lb => ControlBundle { reg_write: true, use_immediate: true, mem_read: true, output_select: OutputSelect::Memory, mem_size: MemSize::Byte, alu_op: AluOp::Add, ..base },
            Lh => ControlBundle { reg_write: true, use_immediate: true, mem_read: true, output_select: OutputSelect::Memory, mem_size: MemSize::Half, alu_op: AluOp::Add, ..base },
            Lw => ControlBundle { reg_write: true, use_immediate: true, mem_read: true, output_select: OutputSelect::Memory, mem_size: MemSize::Word, alu_op: AluOp::Add, ..base },
            Lbu => ControlBundle { reg_write: true, use_immediate: true, mem_read: true, output_select: OutputSelect::Memory, mem_size: MemSize::ByteUnsigned, alu_op: AluOp::Add, ..base },
            Lhu => ControlBundle { reg_write: true, use_immediate: true, mem_read: true, output_select: OutputSelect::Memory, mem_size: MemSize::HalfUnsigned, alu_op: AluOp::Add, ..base },

            Jalr => ControlBundle { reg_write: true, use_immediate: true, output_select: OutputSelect::PcPlus4, alu_op: AluOp::Add, ..base },

            Sb => ControlBundle { mem_write: true, use_immediate: true, mem_size: MemSize::Byte, alu_op: AluOp::Add, ..base },
            Sh => ControlBundle { mem_write: true, use_immediate: true, mem_size: MemSize::Half, alu_op: AluOp::Add, ..base },
            Sw => ControlBundle { mem_write: true, use_immediate: true, mem_size: MemSize::Word, alu_op: AluOp::Add, ..base },

            Beq | Bne | Blt | Bge | Bltu | Bgeu => ControlBundle { is_branch: true, alu_op: AluOp::Sub, ..base },

            Lui => ControlBundle { reg_write: true, use_immediate: true, alu_op: AluOp::Pass, ..base },
            Auipc => ControlBundle { reg_write: true, use_immediate: true, alu_op: AluOp::Pass, ..base },

            Jal => ControlBundle { reg_write: true, output_select: OutputSelect::PcPlus4, ..base },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loads_read_memory_and_write_back() {
        let c = ControlBundle::for_mnemonic(Mnemonic::Lw);
        assert!(c.mem_read);
        assert!(c.reg_write);
        assert_eq!(c.output_select, OutputSelect::Memory);
        assert_eq!(c.mem_size, MemSize::Word);
    }

    #[test]
    fn stores_write_memory_and_never_the_register_file() {
        let c = ControlBundle::for_mnemonic(Mnemonic::Sb);
        assert!(c.mem_write);
        assert!(!c.reg_write);
        assert_eq!(c.mem_size, MemSize::Byte);
    }

    #[test]
    fn branches_carry_is_branch_but_never_write_back() {
        let c = ControlBundle::for_mnemonic(Mnemonic::Bge);
        assert!(c.is_branch);
        assert!(!c.reg_write);
    }

    #[test]
    fn jal_and_jalr_select_pc_plus_4() {
        assert_eq!(ControlBundle::for_mnemonic(Mnemonic::Jal).output_select, OutputSelect::PcPlus4);
        assert_eq!(ControlBundle::for_mnemonic(Mnemonic::Jalr).output_select, OutputSelect::PcPlus4);
    }

    #[test]
    fn nop_suppresses_every_effect() {
        let c = ControlBundle::nop();
        assert!(c.is_nop);
        assert!(!c.reg_write && !c.mem_read && !c.mem_write && !c.is_branch);
    }
}
