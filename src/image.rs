//! The text and data memory images and their on-disk format.
//!
//! Both images are sparse `address -> word` maps: most of a 32-bit address
//! space is never touched, so a `BTreeMap` keyed by address stands in for
//! the flat byte arrays a real core would use. The on-disk format is a
//! plain line-oriented `0xADDR 0xVALUE` text file (uppercase, zero-padded to
//! 8 hex digits), one entry per line, in ascending address order. A
//! `read`/`write` pair works over any `Read`/`Write`, with `read_file`/
//! `write_file` convenience wrappers over a `Path`.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::Path;

/// Base address of the data segment, also the convention new
/// simulator-created store addresses are placed relative to.
pub const DATA_BASE: u32 = 0x1000_0000;

fn format_line(address: u32, value: u32) -> String {
    format!("0x{:08X} 0x{:08X}\n", address, value)
}

/// Parses one `0xADDR 0xVALUE # optional-comment` line (spec §6). Returns
/// `None` for a blank line (which `write`/`read` never produce themselves
/// but which a hand-edited image file might contain at EOF).
fn parse_line(line: &str) -> Option<io::Result<(u32, u32)>> {
    let line = match line.find('#') {
        Some(pos) => &line[..pos],
        None => line,
    };
    let line = line.trim();
    if line.is_empty() {
        return None;
    }

    let mut parts = line.split_whitespace();
    let result = (|| {
        let addr_tok = parts
            .next()
            .ok_or_else(|| invalid_data(format!("missing address field in \"{}\"", line)))?;
        let value_tok = parts
            .next()
            .ok_or_else(|| invalid_data(format!("missing value field in \"{}\"", line)))?;
        if parts.next().is_some() {
            return Err(invalid_data(format!("too many fields in \"{}\"", line)));
        }
        let address = parse_hex_u32(addr_tok)?;
        let value = parse_hex_u32(value_tok)?;
        Ok((address, value))
    })();
    Some(result)
}

fn parse_hex_u32(token: &str) -> io::Result<u32> {
    let digits = token
        .strip_prefix("0x")
        .or_else(|| token.strip_prefix("0X"))
        .unwrap_or(token);
    u32::from_str_radix(digits, 16)
        .map_err(|_| invalid_data(format!("not a hex literal: \"{}\"", token)))
}

fn invalid_data(message: String) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidData, message)
}

fn read_pairs<R: BufRead>(reader: R) -> io::Result<BTreeMap<u32, u32>> {
    let mut map = BTreeMap::new();
    for line in reader.lines() {
        if let Some(parsed) = parse_line(&line?) {
            let (address, value) = parsed?;
            map.insert(address, value);
        }
    }
    Ok(map)
}

fn write_pairs<W: Write>(mut writer: W, map: &BTreeMap<u32, u32>) -> io::Result<()> {
    for (&address, &value) in map.iter() {
        writer.write_all(format_line(address, value).as_bytes())?;
    }
    Ok(())
}

/// Address-keyed instruction words.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TextImage {
    words: BTreeMap<u32, u32>,
}

impl TextImage {
    pub fn new() -> TextImage {
        TextImage { words: BTreeMap::new() }
    }

    pub fn get(&self, address: u32) -> Option<u32> {
        self.words.get(&address).copied()
    }

    pub fn insert(&mut self, address: u32, word: u32) {
        self.words.insert(address, word);
    }

    pub fn iter(&self) -> impl Iterator<Item = (u32, u32)> + '_ {
        self.words.iter().map(|(&a, &w)| (a, w))
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    pub fn read_file<P: AsRef<Path>>(path: P) -> io::Result<TextImage> {
        let words = read_pairs(BufReader::new(File::open(path)?))?;
        Ok(TextImage { words })
    }

    pub fn write_file<P: AsRef<Path>>(&self, path: P) -> io::Result<()> {
        write_pairs(BufWriter::new(File::create(path)?), &self.words)
    }
}

/// Address-keyed data words. Values are signed 32-bit cells; stored on
/// disk as their bit pattern, same as `TextImage`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DataImage {
    values: BTreeMap<u32, i32>,
}

impl DataImage {
    pub fn new() -> DataImage {
        DataImage { values: BTreeMap::new() }
    }

    pub fn get(&self, address: u32) -> Option<i32> {
        self.values.get(&address).copied()
    }

    /// Writes `value` at `address`. A store to an address absent from the
    /// image (including one the simulator invents, not just ones the
    /// assembler emitted) simply creates a new entry.
    pub fn insert(&mut self, address: u32, value: i32) {
        self.values.insert(address, value);
    }

    pub fn iter(&self) -> impl Iterator<Item = (u32, i32)> + '_ {
        self.values.iter().map(|(&a, &v)| (a, v))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn read_file<P: AsRef<Path>>(path: P) -> io::Result<DataImage> {
        let words = read_pairs(BufReader::new(File::open(path)?))?;
        let values = words.into_iter().map(|(a, w)| (a, w as i32)).collect();
        Ok(DataImage { values })
    }

    /// Writes every entry back out, in ascending address order, exactly the
    /// way it would be read back in, including addresses the original image
    /// had that the run never touched.
    pub fn write_file<P: AsRef<Path>>(&self, path: P) -> io::Result<()> {
        let words: BTreeMap<u32, u32> = self.values.iter().map(|(&a, &v)| (a, v as u32)).collect();
        write_pairs(BufWriter::new(File::create(path)?), &words)
    }
}
