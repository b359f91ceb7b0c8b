//! Byte-level serialization: header, objects, cross-reference table and
//! trailer.
//!
//! Stream lengths and xref offsets are derived here from the bytes actually
//! written; callers never supply them.

use super::syntax::{reference, Dictionary};
use crate::PdfVersion;

/// Binary marker comment so transports treat the file as binary.
const BINARY_MARKER: &[u8] = b"%\xE2\xE3\xCF\xD3\n";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ObjectBody {
    Dictionary(Dictionary),
    Stream { dict: Dictionary, data: Vec<u8> },
}

/// One indirect object, generation 0.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PdfObject {
    pub id: u32,
    pub body: ObjectBody,
}

impl PdfObject {
    pub fn dictionary(id: u32, dict: Dictionary) -> Self {
        Self {
            id,
            body: ObjectBody::Dictionary(dict),
        }
    }

    pub fn stream(id: u32, dict: Dictionary, data: Vec<u8>) -> Self {
        Self {
            id,
            body: ObjectBody::Stream { dict, data },
        }
    }
}

/// Serialized document plus the layout facts callers may want to check.
#[derive(Debug, Clone)]
pub struct WrittenDocument {
    pub bytes: Vec<u8>,
    /// Byte offset of every object, indexed by id; entry 0 is the free head.
    pub xref_offsets: Vec<usize>,
    pub startxref: usize,
}

/// Serialize `objects`, which must carry ids `1..=objects.len()` in order.
pub fn write_document(
    version: PdfVersion,
    objects: &[PdfObject],
    root: u32,
    info: Option<u32>,
) -> WrittenDocument {
    debug_assert!(objects
        .iter()
        .enumerate()
        .all(|(i, object)| object.id as usize == i + 1));

    let payload: usize = objects
        .iter()
        .map(|object| match &object.body {
            ObjectBody::Stream { data, .. } => data.len(),
            ObjectBody::Dictionary(_) => 0,
        })
        .sum();
    let mut out = Vec::with_capacity(payload + 512 + objects.len() * 128);

    out.extend_from_slice(format!("%PDF-{version}\n").as_bytes());
    out.extend_from_slice(BINARY_MARKER);

    let mut xref_offsets = Vec::with_capacity(objects.len() + 1);
    xref_offsets.push(0);

    for object in objects {
        xref_offsets.push(out.len());
        write_object(&mut out, object);
    }

    let startxref = out.len();
    out.extend_from_slice(format!("xref\n0 {}\n", xref_offsets.len()).as_bytes());
    out.extend_from_slice(b"0000000000 65535 f \n");
    for offset in &xref_offsets[1..] {
        out.extend_from_slice(format!("{offset:010} 00000 n \n").as_bytes());
    }

    let trailer = Dictionary::new()
        .with("Size", xref_offsets.len().to_string())
        .with("Root", reference(root))
        .with_opt("Info", info.map(reference));
    out.extend_from_slice(format!("trailer\n{trailer}\nstartxref\n{startxref}\n%%EOF").as_bytes());

    WrittenDocument {
        bytes: out,
        xref_offsets,
        startxref,
    }
}

fn write_object(out: &mut Vec<u8>, object: &PdfObject) {
    match &object.body {
        ObjectBody::Dictionary(dict) => {
            out.extend_from_slice(format!("{} 0 obj\n{dict}\nendobj\n", object.id).as_bytes());
        }
        ObjectBody::Stream { dict, data } => {
            let dict = dict.clone().with("Length", data.len().to_string());
            out.extend_from_slice(format!("{} 0 obj\n{dict}\nstream\n", object.id).as_bytes());
            out.extend_from_slice(data);
            out.extend_from_slice(b"\nendstream\nendobj\n");
        }
    }
}
