//! Data-segment layout, starting at `DATA_BASE`.
//!
//! Each directive places one or more elements of its declared size at the
//! current cursor and advances the cursor by exactly that many bytes per
//! element, so a later directive's first address is the previous
//! directive's last address plus its element size: addresses grow
//! monotonically per directive and respect each element's declared size.

use crate::error::{AssembleError, Result};
use crate::encode::parse_integer_literal;
use rv32core::error::ErrorKind;
use rv32core::image::{DataImage, DATA_BASE};

pub fn assemble_data(directives: &[(usize, String)]) -> Result<DataImage> {
    let mut image = DataImage::new();
    let mut addr = DATA_BASE;

    for (line_no, text) in directives {
        let line_no = *line_no;
        let mut parts = text.splitn(2, char::is_whitespace);
        let directive = parts.next().unwrap_or("");
        let rest = parts.next().unwrap_or("").trim();

        addr = match directive {
            ".byte" => layout_ints(&mut image, rest, addr, 1, line_no)?,
            ".half" => layout_ints(&mut image, rest, addr, 2, line_no)?,
            ".word" => layout_ints(&mut image, rest, addr, 4, line_no)?,
            ".dword" => layout_ints(&mut image, rest, addr, 8, line_no)?,
            ".asciiz" => layout_string(&mut image, rest, addr, true, line_no)?,
            ".string" => layout_string(&mut image, rest, addr, false, line_no)?,
            _ => {
                return Err(AssembleError::new(
                    ErrorKind::InvalidData,
                    line_no,
                    format!("unknown data directive \"{}\"", directive),
                ))
            }
        };
    }

    Ok(image)
}

/// Lays out a comma-separated list of integer literals, `size` bytes each.
/// `.dword` (size 8) splits each literal into two consecutive 32-bit cells,
/// since [`DataImage`] cells are themselves 32 bits wide.
fn layout_ints(image: &mut DataImage, rest: &str, mut addr: u32, size: u32, line_no: usize) -> Result<u32> {
    if rest.is_empty() {
        return Err(AssembleError::new(ErrorKind::InvalidData, line_no, "missing data value(s)"));
    }

    for token in rest.split(',') {
        let token = token.trim();
        let value = parse_integer_literal(token, line_no).map_err(|e| AssembleError::new(ErrorKind::InvalidData, line_no, e.message))?;

        if size == 8 {
            let bits = value as u64;
            image.insert(addr, (bits & 0xFFFF_FFFF) as u32 as i32);
            image.insert(addr + 4, ((bits >> 32) & 0xFFFF_FFFF) as u32 as i32);
        } else {
            let mask = (1i64 << (size * 8)) - 1;
            image.insert(addr, (value & mask) as u32 as i32);
        }
        addr += size;
    }

    Ok(addr)
}

fn layout_string(image: &mut DataImage, rest: &str, mut addr: u32, nul_terminated: bool, line_no: usize) -> Result<u32> {
    let text = parse_quoted_string(rest, line_no)?;
    for byte in text.bytes() {
        image.insert(addr, byte as i32);
        addr += 1;
    }
    if nul_terminated {
        image.insert(addr, 0);
        addr += 1;
    }
    Ok(addr)
}

fn parse_quoted_string(text: &str, line_no: usize) -> Result<String> {
    if text.len() < 2 || !text.starts_with('"') || !text.ends_with('"') {
        return Err(AssembleError::new(
            ErrorKind::InvalidData,
            line_no,
            format!("expected a quoted string, got \"{}\"", text),
        ));
    }
    Ok(text[1..text.len() - 1].to_string())
}
