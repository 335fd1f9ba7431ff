//! `rvasm`: the two-pass assembler that lowers RV32I+M assembly text into a
//! `(TextImage, DataImage)` pair.
//!
//! [`assemble`] is the whole pipeline: [`frontend::scan`] is pass 1 (segment
//! dispatch + label table), [`data::assemble_data`] lays out the data
//! segment, and [`encode::encode_instruction`] is pass 2, run once per
//! `.text` statement after [`encode::expand_pseudo`] rewrites any
//! pseudo-instruction.

pub mod data;
pub mod encode;
pub mod error;
pub mod frontend;

pub use error::{AssembleError, Result};

use rv32core::image::{DataImage, TextImage};

/// Assembles a complete source file into its text and data images.
/// Fails fast: the first error encountered aborts assembly without
/// producing partial output.
pub fn assemble(source: &str) -> Result<(TextImage, DataImage)> {
    let scanned = frontend::scan(source)?;
    let data_image = data::assemble_data(&scanned.data_directives)?;

    let mut text_image = TextImage::new();
    for item in &scanned.text_items {
        let tokenized = encode::tokenize(&item.text, item.line)?;
        let expanded = encode::expand_pseudo(tokenized, item.line)?;
        let instruction = encode::encode_instruction(item, &expanded, &scanned.labels)?;
        text_image.insert(item.pc, instruction.encode());
    }

    Ok((text_image, data_image))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rv32core::isa::Mnemonic;
    use rv32core::Instruction;

    #[test]
    fn scenario_three_values_add() {
        let src = ".text\naddi x1, x0, 5\naddi x2, x0, 7\nadd x3, x1, x2\n";
        let (text, _data) = assemble(src).unwrap();
        assert_eq!(text.len(), 3);
        let insn = Instruction::decode(text.get(8).unwrap()).unwrap();
        assert_eq!(insn.mnemonic, Mnemonic::Add);
    }

    #[test]
    fn unconditional_branch_resolves_to_forward_label() {
        let src = ".text\nbeq x0, x0, L\naddi x1, x0, 99\nL: addi x2, x0, 1\n";
        let (text, _data) = assemble(src).unwrap();
        let branch = Instruction::decode(text.get(0).unwrap()).unwrap();
        assert_eq!(branch.imm, 8);
    }

    #[test]
    fn jal_and_jalr_round_trip_return_address() {
        let src = ".text\njal x1, FN\naddi x5, x0, 0\nFN: jalr x0, 0(x1)\n";
        let (text, _data) = assemble(src).unwrap();
        let jal = Instruction::decode(text.get(0).unwrap()).unwrap();
        assert_eq!(jal.imm, 8);
    }

    #[test]
    fn data_and_text_segments_are_independent() {
        let src = ".data\n.word 1, 2, 3\n.text\nlw x1, 0(x2)\n";
        let (text, data) = assemble(src).unwrap();
        assert_eq!(text.len(), 1);
        assert_eq!(data.get(rv32core::image::DATA_BASE), Some(1));
    }

    #[test]
    fn error_aborts_before_producing_output() {
        let src = ".text\naddi x1, x0, 99999\n";
        assert!(assemble(src).is_err());
    }
}
