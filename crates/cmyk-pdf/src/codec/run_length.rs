//! Run-length encoder compatible with the PDF `/RunLengthDecode` filter.
//!
//! Control byte `n` in 0..=127 copies the next `n + 1` bytes literally;
//! `n` in 129..=255 repeats the next byte `257 - n` times; 128 ends the data.

const EOD: u8 = 128;
const MAX_RUN: usize = 128;

/// Encode `data` greedily: any run of two or more identical bytes becomes a
/// repeat run, everything else accumulates into literal runs of up to 128.
///
/// An empty input yields just the terminator.
pub fn encode(data: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(data.len() + data.len() / MAX_RUN + 2);
    let mut literal_start = 0;
    let mut i = 0;

    while i < data.len() {
        let run = repeat_len(&data[i..]);
        if run >= 2 {
            flush_literal(&mut out, &data[literal_start..i]);
            out.push((257 - run) as u8);
            out.push(data[i]);
            i += run;
            literal_start = i;
        } else {
            i += 1;
            if i - literal_start == MAX_RUN {
                flush_literal(&mut out, &data[literal_start..i]);
                literal_start = i;
            }
        }
    }

    flush_literal(&mut out, &data[literal_start..]);
    out.push(EOD);
    out
}

fn repeat_len(data: &[u8]) -> usize {
    let first = data[0];
    data.iter()
        .take(MAX_RUN)
        .take_while(|&&b| b == first)
        .count()
}

fn flush_literal(out: &mut Vec<u8>, literal: &[u8]) {
    if literal.is_empty() {
        return;
    }
    out.push((literal.len() - 1) as u8);
    out.extend_from_slice(literal);
}
