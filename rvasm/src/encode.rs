//! Pass 2: pseudo-instruction expansion and per-format encoding.
//!
//! Every mnemonic's operand shape is driven by [`rv32core::isa::format`], so
//! adding a mnemonic to the shared table is enough for this module to know
//! how to parse its operands — there is no second, hand-maintained operand
//! table to keep in sync.

use crate::error::{AssembleError, Result};
use crate::frontend::TextItem;
use rv32core::error::ErrorKind;
use rv32core::isa::{self, Format, Mnemonic};
use rv32core::registers::{self, Reg};
use rv32core::Instruction;
use std::collections::HashMap;

/// A mnemonic plus its comma-split operand strings, still untyped text.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParsedLine {
    pub mnemonic: String,
    pub operands: Vec<String>,
}

/// Splits `"mnemonic op1, op2, op3"` into a mnemonic and its operand list.
pub fn tokenize(text: &str, line_no: usize) -> Result<ParsedLine> {
    let mut parts = text.splitn(2, char::is_whitespace);
    let mnemonic = parts.next().unwrap_or("").to_string();
    if mnemonic.is_empty() {
        return Err(AssembleError::new(ErrorKind::Syntax, line_no, "empty instruction"));
    }
    let rest = parts.next().unwrap_or("").trim();
    let operands = if rest.is_empty() {
        Vec::new()
    } else {
        rest.split(',').map(|s| s.trim().to_string()).collect()
    };
    Ok(ParsedLine { mnemonic, operands })
}

/// Rewrites the five fixed pseudo-instructions into their real instruction
/// form. Anything else passes through unchanged.
pub fn expand_pseudo(parsed: ParsedLine, line_no: usize) -> Result<ParsedLine> {
    let lower = parsed.mnemonic.to_ascii_lowercase();
    match lower.as_str() {
        "nop" => {
            expect_operand_count(&parsed, 0, line_no)?;
            Ok(op("addi", &["x0", "x0", "0"]))
        }
        "mv" => {
            expect_operand_count(&parsed, 2, line_no)?;
            Ok(op("addi", &[&parsed.operands[0], &parsed.operands[1], "0"]))
        }
        "not" => {
            expect_operand_count(&parsed, 2, line_no)?;
            Ok(op("xori", &[&parsed.operands[0], &parsed.operands[1], "-1"]))
        }
        "neg" => {
            expect_operand_count(&parsed, 2, line_no)?;
            Ok(op("sub", &[&parsed.operands[0], "x0", &parsed.operands[1]]))
        }
        "li" => {
            expect_operand_count(&parsed, 2, line_no)?;
            Ok(op("addi", &[&parsed.operands[0], "x0", &parsed.operands[1]]))
        }
        _ => Ok(parsed),
    }
}

fn op(mnemonic: &str, operands: &[&str]) -> ParsedLine {
    ParsedLine { mnemonic: mnemonic.to_string(), operands: operands.iter().map(|s| s.to_string()).collect() }
}

fn expect_operand_count(parsed: &ParsedLine, n: usize, line_no: usize) -> Result<()> {
    if parsed.operands.len() != n {
        return Err(AssembleError::new(
            ErrorKind::Syntax,
            line_no,
            format!("\"{}\" expects {} operand(s), got {}", parsed.mnemonic, n, parsed.operands.len()),
        ));
    }
    Ok(())
}

/// A bare integer-literal parse failure, not yet tagged with an
/// [`ErrorKind`] — callers (instruction immediates vs. data directives)
/// attach the kind that fits their context.
pub struct IntLiteralError {
    pub message: String,
}

/// Parses a decimal or `0x`-prefixed hex integer literal, with an optional
/// leading `-`. Shared by instruction immediates and data directives (spec
/// §4.3 "malformed hex" is INVALID_IMMEDIATE_VALUE for instructions).
pub fn parse_integer_literal(text: &str, _line_no: usize) -> std::result::Result<i64, IntLiteralError> {
    let (negative, body) = match text.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, text),
    };
    let magnitude: i64 = if let Some(hex) = body.strip_prefix("0x").or_else(|| body.strip_prefix("0X")) {
        i64::from_str_radix(hex, 16).map_err(|_| IntLiteralError { message: format!("malformed hex literal \"{}\"", text) })?
    } else {
        body.parse().map_err(|_| IntLiteralError { message: format!("malformed integer literal \"{}\"", text) })?
    };
    Ok(if negative { -magnitude } else { magnitude })
}

fn parse_immediate(text: &str, line_no: usize) -> Result<i64> {
    parse_integer_literal(text, line_no).map_err(|e| AssembleError::new(ErrorKind::InvalidImmediate, line_no, e.message))
}

fn check_range(value: i64, lo: i64, hi: i64, line_no: usize, what: &str) -> Result<i32> {
    if value < lo || value > hi {
        return Err(AssembleError::new(
            ErrorKind::InvalidImmediate,
            line_no,
            format!("{} {} out of range [{}, {}]", what, value, lo, hi),
        ));
    }
    Ok(value as i32)
}

fn parse_reg(text: &str, line_no: usize) -> Result<Reg> {
    match registers::parse_register(text) {
        Some(Ok(reg)) => Ok(reg),
        Some(Err(index)) => Err(AssembleError::new(
            ErrorKind::InvalidRegister,
            line_no,
            format!("register index {} out of range 0..32", index),
        )),
        None => Err(AssembleError::new(ErrorKind::InvalidRegister, line_no, format!("unrecognized register \"{}\"", text))),
    }
}

/// Splits a `imm(reg)` memory operand (loads, stores, `jalr`) into its
/// offset and base-register text. An empty `imm` (`"(x2)"`) means offset 0.
fn parse_mem_operand(text: &str, line_no: usize) -> Result<(i64, &str)> {
    let open = text
        .find('(')
        .ok_or_else(|| AssembleError::new(ErrorKind::Syntax, line_no, format!("expected imm(reg) operand, got \"{}\"", text)))?;
    let close = text
        .rfind(')')
        .filter(|&c| c > open)
        .ok_or_else(|| AssembleError::new(ErrorKind::Syntax, line_no, format!("unbalanced parentheses in \"{}\"", text)))?;

    let imm_text = text[..open].trim();
    let reg_text = text[open + 1..close].trim();
    let imm = if imm_text.is_empty() { 0 } else { parse_immediate(imm_text, line_no)? };
    Ok((imm, reg_text))
}

fn expect_operands(operands: &[String], n: usize, line_no: usize) -> Result<()> {
    if operands.len() != n {
        return Err(AssembleError::new(
            ErrorKind::Syntax,
            line_no,
            format!("expected {} operand(s), got {}", n, operands.len()),
        ));
    }
    Ok(())
}

fn resolve_label(name: &str, labels: &HashMap<String, u32>, line_no: usize) -> Result<u32> {
    labels
        .get(name)
        .copied()
        .ok_or_else(|| AssembleError::new(ErrorKind::InvalidLabel, line_no, format!("undefined label \"{}\"", name)))
}

const I_IMM_MIN: i64 = -2048;
const I_IMM_MAX: i64 = 2047;
const SHAMT_MIN: i64 = 0;
const SHAMT_MAX: i64 = 31;
const U_IMM_MIN: i64 = 0;
const U_IMM_MAX: i64 = 0xF_FFFF;
const B_OFFSET_MIN: i64 = -4096;
const B_OFFSET_MAX: i64 = 4094;
const J_OFFSET_MIN: i64 = -1_048_576;
const J_OFFSET_MAX: i64 = 1_048_574;

fn check_even_offset(offset: i64, line_no: usize) -> Result<()> {
    if offset % 2 != 0 {
        return Err(AssembleError::new(ErrorKind::InvalidImmediate, line_no, format!("branch/jump offset {} is odd", offset)));
    }
    Ok(())
}

/// Encodes one already-pseudo-expanded instruction line into its final
/// [`Instruction`], resolving branch/jump operands against `labels`.
pub fn encode_instruction(item: &TextItem, parsed: &ParsedLine, labels: &HashMap<String, u32>) -> Result<Instruction> {
    let mnemonic: Mnemonic = parsed
        .mnemonic
        .parse()
        .map_err(|_| AssembleError::new(ErrorKind::InvalidInstruction, item.line, format!("unknown mnemonic \"{}\"", parsed.mnemonic)))?;
    let ops = &parsed.operands;
    let line = item.line;

    match isa::format(mnemonic) {
        Format::R => {
            expect_operands(ops, 3, line)?;
            let rd = parse_reg(&ops[0], line)?;
            let rs1 = parse_reg(&ops[1], line)?;
            let rs2 = parse_reg(&ops[2], line)?;
            Ok(Instruction::r(mnemonic, rd, rs1, rs2))
        }

        Format::I if is_load_or_jalr(mnemonic) => {
            expect_operands(ops, 2, line)?;
            let rd = parse_reg(&ops[0], line)?;
            let (imm, rs1_text) = parse_mem_operand(&ops[1], line)?;
            let rs1 = parse_reg(rs1_text, line)?;
            let imm = check_range(imm, I_IMM_MIN, I_IMM_MAX, line, "offset")?;
            Ok(Instruction::i(mnemonic, rd, rs1, imm))
        }

        Format::I => {
            expect_operands(ops, 3, line)?;
            let rd = parse_reg(&ops[0], line)?;
            let rs1 = parse_reg(&ops[1], line)?;
            let imm = parse_immediate(&ops[2], line)?;
            let imm = check_range(imm, I_IMM_MIN, I_IMM_MAX, line, "immediate")?;
            Ok(Instruction::i(mnemonic, rd, rs1, imm))
        }

        Format::IShift => {
            expect_operands(ops, 3, line)?;
            let rd = parse_reg(&ops[0], line)?;
            let rs1 = parse_reg(&ops[1], line)?;
            let shamt = parse_immediate(&ops[2], line)?;
            let shamt = check_range(shamt, SHAMT_MIN, SHAMT_MAX, line, "shift amount")?;
            Ok(Instruction::i(mnemonic, rd, rs1, shamt))
        }

        Format::S => {
            expect_operands(ops, 2, line)?;
            let rs2 = parse_reg(&ops[0], line)?;
            let (imm, rs1_text) = parse_mem_operand(&ops[1], line)?;
            let rs1 = parse_reg(rs1_text, line)?;
            let imm = check_range(imm, I_IMM_MIN, I_IMM_MAX, line, "offset")?;
            Ok(Instruction::s(mnemonic, rs1, rs2, imm))
        }

        Format::B => {
            expect_operands(ops, 3, line)?;
            let rs1 = parse_reg(&ops[0], line)?;
            let rs2 = parse_reg(&ops[1], line)?;
            let target = resolve_label(&ops[2], labels, line)?;
            let offset = target as i64 - item.pc as i64;
            check_even_offset(offset, line)?;
            let offset = check_range(offset, B_OFFSET_MIN, B_OFFSET_MAX, line, "branch offset")?;
            Ok(Instruction::b(mnemonic, rs1, rs2, offset))
        }

        Format::U => {
            expect_operands(ops, 2, line)?;
            let rd = parse_reg(&ops[0], line)?;
            let imm = parse_immediate(&ops[1], line)?;
            let imm20 = check_range(imm, U_IMM_MIN, U_IMM_MAX, line, "U-type immediate")?;
            Ok(Instruction::u(mnemonic, rd, imm20 << 12))
        }

        Format::J => {
            expect_operands(ops, 2, line)?;
            let rd = parse_reg(&ops[0], line)?;
            let target = resolve_label(&ops[1], labels, line)?;
            let offset = target as i64 - item.pc as i64;
            check_even_offset(offset, line)?;
            let offset = check_range(offset, J_OFFSET_MIN, J_OFFSET_MAX, line, "jump offset")?;
            Ok(Instruction::j(mnemonic, rd, offset))
        }
    }
}

fn is_load_or_jalr(mnemonic: Mnemonic) -> bool {
    matches!(
        mnemonic,
        Mnemonic::Lb | Mnemonic::Lh | Mnemonic::Lw | Mnemonic::Lbu | Mnemonic::Lhu | Mnemonic::Jalr
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use rv32core::registers::Reg;

    fn item(pc: u32, text: &str) -> TextItem {
        TextItem { line: 1, pc, text: text.to_string() }
    }

    fn encode(pc: u32, text: &str, labels: &HashMap<String, u32>) -> Instruction {
        let it = item(pc, text);
        let parsed = tokenize(&it.text, it.line).unwrap();
        let parsed = expand_pseudo(parsed, it.line).unwrap();
        encode_instruction(&it, &parsed, labels).unwrap()
    }

    #[test]
    fn addi_encodes_with_abi_register_names() {
        let insn = encode(0, "addi a0, zero, 5", &HashMap::new());
        assert_eq!(insn.mnemonic, Mnemonic::Addi);
        assert_eq!(insn.rd, Reg::from_index(10).unwrap());
        assert_eq!(insn.imm, 5);
    }

    #[test]
    fn nop_expands_to_addi_zero_zero_zero() {
        let insn = encode(0, "nop", &HashMap::new());
        assert_eq!(insn.mnemonic, Mnemonic::Addi);
        assert_eq!(insn.rd, Reg::ZERO);
        assert_eq!(insn.rs1, Reg::ZERO);
        assert_eq!(insn.imm, 0);
    }

    #[test]
    fn li_expands_to_addi_with_zero_reg() {
        let insn = encode(0, "li t0, 100", &HashMap::new());
        assert_eq!(insn.mnemonic, Mnemonic::Addi);
        assert_eq!(insn.rs1, Reg::ZERO);
        assert_eq!(insn.imm, 100);
    }

    #[test]
    fn load_parses_offset_paren_register() {
        let insn = encode(0, "lw x1, 16(x2)", &HashMap::new());
        assert_eq!(insn.mnemonic, Mnemonic::Lw);
        assert_eq!(insn.rs1, Reg::from_index(2).unwrap());
        assert_eq!(insn.imm, 16);
    }

    #[test]
    fn branch_offset_is_relative_to_current_pc() {
        let mut labels = HashMap::new();
        labels.insert("L".to_string(), 20);
        let insn = encode(8, "beq x0, x0, L", &labels);
        assert_eq!(insn.imm, 12);
    }

    #[test]
    fn i_immediate_boundaries_accepted() {
        encode(0, "addi x1, x0, 2047", &HashMap::new());
        encode(0, "addi x1, x0, -2048", &HashMap::new());
    }

    #[test]
    fn i_immediate_out_of_range_is_invalid_immediate() {
        let it = item(0, "addi x1, x0, 2048");
        let parsed = tokenize(&it.text, it.line).unwrap();
        let err = encode_instruction(&it, &parsed, &HashMap::new()).unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidImmediate);
    }

    #[test]
    fn shift_amount_32_is_rejected() {
        let it = item(0, "slli x1, x2, 32");
        let parsed = tokenize(&it.text, it.line).unwrap();
        let err = encode_instruction(&it, &parsed, &HashMap::new()).unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidImmediate);
    }

    #[test]
    fn undefined_label_is_invalid_label() {
        let it = item(0, "jal x1, NOWHERE");
        let parsed = tokenize(&it.text, it.line).unwrap();
        let err = encode_instruction(&it, &parsed, &HashMap::new()).unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidLabel);
    }

    #[test]
    fn unknown_mnemonic_is_invalid_instruction() {
        let it = item(0, "frobnicate x1, x2, x3");
        let parsed = tokenize(&it.text, it.line).unwrap();
        let err = encode_instruction(&it, &parsed, &HashMap::new()).unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidInstruction);
    }

    #[test]
    fn wrong_operand_count_is_syntax_error() {
        let it = item(0, "add x1, x2");
        let parsed = tokenize(&it.text, it.line).unwrap();
        let err = encode_instruction(&it, &parsed, &HashMap::new()).unwrap_err();
        assert_eq!(err.kind, ErrorKind::Syntax);
    }

    #[test]
    fn out_of_range_register_is_invalid_register() {
        let it = item(0, "add x32, x1, x2");
        let parsed = tokenize(&it.text, it.line).unwrap();
        let err = encode_instruction(&it, &parsed, &HashMap::new()).unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidRegister);
    }
}
