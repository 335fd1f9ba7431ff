//! Line tokenizer, segment dispatch and label-table construction.
//!
//! This single left-to-right scan over the source lines *is* pass 1: it
//! tracks the current segment, strips comments/whitespace, and — while
//! walking the `.text` segment with a PC cursor — records every label's
//! address the moment it's seen. Everything downstream (pseudo-op
//! expansion, per-format encoding) is pass 2 and lives in [`crate::encode`].

use crate::error::{AssembleError, Result};
use rv32core::error::ErrorKind;
use std::collections::HashMap;

/// One `.text` statement after label stripping, still in raw textual form.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TextItem {
    pub line: usize,
    pub pc: u32,
    pub text: String,
}

#[derive(Clone, Debug, Default)]
pub struct Scanned {
    pub labels: HashMap<String, u32>,
    pub text_items: Vec<TextItem>,
    /// `(source line number, directive text with comment stripped)`.
    pub data_directives: Vec<(usize, String)>,
}

#[derive(PartialEq, Eq)]
enum Segment {
    None,
    Data,
    Text,
}

fn strip_comment(line: &str) -> &str {
    match line.find('#') {
        Some(pos) => &line[..pos],
        None => line,
    }
}

/// Scans the whole source file, dispatching lines to `.data`/`.text` and
/// building the label table as it goes.
pub fn scan(source: &str) -> Result<Scanned> {
    let mut segment = Segment::None;
    let mut pc: u32 = 0;
    let mut out = Scanned::default();

    for (index, raw_line) in source.lines().enumerate() {
        let line_no = index + 1;
        let stripped = strip_comment(raw_line).trim();
        if stripped.is_empty() {
            continue;
        }

        match stripped {
            ".data" => {
                segment = Segment::Data;
                continue;
            }
            ".text" => {
                segment = Segment::Text;
                continue;
            }
            _ => {}
        }

        match segment {
            Segment::Data => out.data_directives.push((line_no, stripped.to_string())),
            Segment::Text => scan_text_line(stripped, line_no, &mut pc, &mut out)?,
            Segment::None => {
                return Err(AssembleError::new(
                    ErrorKind::Syntax,
                    line_no,
                    "statement appears before any .data/.text directive",
                ));
            }
        }
    }

    Ok(out)
}

/// Handles one non-blank `.text` line, peeling off zero or more
/// `label:` prefixes and, if anything remains, appending it as a text item
/// at the current PC. A label and an instruction may share one logical
/// line, so this keeps peeling label prefixes until none remain.
fn scan_text_line(mut line: &str, line_no: usize, pc: &mut u32, out: &mut Scanned) -> Result<()> {
    loop {
        match line.find(':') {
            Some(pos) => {
                let label = line[..pos].trim();
                if label.is_empty() {
                    return Err(AssembleError::new(ErrorKind::Syntax, line_no, "empty label name"));
                }
                if out.labels.insert(label.to_string(), *pc).is_some() {
                    return Err(AssembleError::new(
                        ErrorKind::InvalidLabel,
                        line_no,
                        format!("label \"{}\" defined more than once", label),
                    ));
                }
                line = line[pos + 1..].trim();
                if line.is_empty() {
                    return Ok(());
                }
            }
            None => {
                out.text_items.push(TextItem { line: line_no, pc: *pc, text: line.to_string() });
                *pc += 4;
                return Ok(());
            }
        }
    }
}
