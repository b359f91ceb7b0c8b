//! Stream compression
//!
//! The two PDF stream filters the exporter can write. Both encoders are
//! total: every byte sequence encodes, and decoding through the matching PDF
//! filter reproduces the input exactly.

pub mod lzw;
pub mod run_length;

use std::fmt;
use std::str::FromStr;

use crate::ExportError;

/// Compression applied to the image stream and, if present, its soft mask.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CompressionMode {
    #[default]
    None,
    RunLength,
    Lzw,
}

impl CompressionMode {
    pub fn encode(self, data: &[u8]) -> Vec<u8> {
        match self {
            CompressionMode::None => data.to_vec(),
            CompressionMode::RunLength => run_length::encode(data),
            CompressionMode::Lzw => lzw::encode(data),
        }
    }

    /// Value of the stream's `/Filter` entry.
    pub fn filter_name(self) -> Option<&'static str> {
        match self {
            CompressionMode::None => None,
            CompressionMode::RunLength => Some("/RunLengthDecode"),
            CompressionMode::Lzw => Some("/LZWDecode"),
        }
    }

    /// Value of the stream's `/DecodeParms` entry.
    pub fn decode_parms(self) -> Option<&'static str> {
        match self {
            CompressionMode::Lzw => Some("<< /EarlyChange 1 >>"),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            CompressionMode::None => "none",
            CompressionMode::RunLength => "runLength",
            CompressionMode::Lzw => "lzw",
        }
    }
}

impl fmt::Display for CompressionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CompressionMode {
    type Err = ExportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "none" => Ok(CompressionMode::None),
            "runlength" | "run-length" | "rle" => Ok(CompressionMode::RunLength),
            "lzw" => Ok(CompressionMode::Lzw),
            _ => Err(ExportError::UnsupportedCompression(s.to_string())),
        }
    }
}
