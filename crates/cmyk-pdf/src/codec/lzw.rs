//! LZW encoder compatible with the PDF `/LZWDecode` filter.
//!
//! Codes are packed most-significant bit first. The code width starts at 9
//! bits and grows one code early (`/EarlyChange 1`), capping at 12. When the
//! dictionary is full a clear code is emitted and the table starts over.

use std::collections::HashMap;

const CLEAR_CODE: u16 = 256;
const EOI_CODE: u16 = 257;
const FIRST_FREE_CODE: u16 = 258;
const MAX_CODE: u16 = 4095;
const MIN_WIDTH: u8 = 9;
const MAX_WIDTH: u8 = 12;

/// Encode `data` as an LZW stream.
///
/// The stream always opens with a clear code and closes with EOI. An empty
/// input yields the single byte `0x80`.
pub fn encode(data: &[u8]) -> Vec<u8> {
    let Some((&first, rest)) = data.split_first() else {
        return vec![0x80];
    };

    let mut writer = BitWriter::with_capacity(data.len() / 2 + 16);
    // Keyed by (prefix code, next byte): each entry extends an existing code
    // by one byte, so the table is a trie flattened into a map.
    let mut table: HashMap<(u16, u8), u16> = HashMap::with_capacity(usize::from(MAX_CODE));
    let mut next_code = FIRST_FREE_CODE;
    let mut width = MIN_WIDTH;

    writer.write(CLEAR_CODE, width);
    let mut current = u16::from(first);

    for &byte in rest {
        if let Some(&code) = table.get(&(current, byte)) {
            current = code;
            continue;
        }

        writer.write(current, width);

        if next_code <= MAX_CODE {
            table.insert((current, byte), next_code);
            next_code += 1;
            if next_code == 1 << width && width < MAX_WIDTH {
                width += 1;
            }
        } else {
            writer.write(CLEAR_CODE, width);
            table.clear();
            next_code = FIRST_FREE_CODE;
            width = MIN_WIDTH;
        }

        current = u16::from(byte);
    }

    writer.write(current, width);
    writer.write(EOI_CODE, width);
    writer.finish()
}

/// MSB-first bit accumulator.
struct BitWriter {
    out: Vec<u8>,
    buffer: u32,
    bits: u8,
}

impl BitWriter {
    fn with_capacity(capacity: usize) -> Self {
        Self {
            out: Vec::with_capacity(capacity),
            buffer: 0,
            bits: 0,
        }
    }

    fn write(&mut self, code: u16, width: u8) {
        self.buffer = (self.buffer << width) | u32::from(code);
        self.bits += width;
        while self.bits >= 8 {
            self.bits -= 8;
            self.out.push((self.buffer >> self.bits) as u8);
        }
        self.buffer &= (1 << self.bits) - 1;
    }

    fn finish(mut self) -> Vec<u8> {
        if self.bits > 0 {
            self.out.push((self.buffer << (8 - self.bits)) as u8);
        }
        self.out
    }
}
