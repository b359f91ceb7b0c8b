//! ICC output profiles.
//!
//! The exporter never interprets profile contents beyond a header sanity
//! check; the bytes are embedded verbatim as an `/ICCBased` stream and
//! referenced from the PDF/X output intent.

use std::sync::Arc;
use thiserror::Error;

const HEADER_LEN: usize = 128;
const SIGNATURE_OFFSET: usize = 36;
const COLOR_SPACE_OFFSET: usize = 16;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProfileError {
    #[error("ICC profile too short: {0} bytes")]
    Truncated(usize),

    #[error("Missing 'acsp' signature in ICC header")]
    BadSignature,

    #[error("ICC profile declares {declared} bytes but only {actual} are present")]
    SizeMismatch { declared: usize, actual: usize },

    #[error("ICC profile color space is {0}, expected CMYK")]
    NotCmyk(String),
}

/// An immutable, cheaply clonable CMYK output profile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IccProfile {
    id: String,
    name: String,
    output_condition_identifier: String,
    output_condition: String,
    data: Arc<[u8]>,
}

impl IccProfile {
    /// Validate the ICC header and wrap the bytes.
    ///
    /// The output condition and identifier default to `name`; override them
    /// with [`with_output_condition`](Self::with_output_condition).
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        data: impl Into<Arc<[u8]>>,
    ) -> Result<Self, ProfileError> {
        let data = data.into();
        validate_header(&data)?;
        let name = name.into();

        Ok(Self {
            id: id.into(),
            output_condition_identifier: name.clone(),
            output_condition: name.clone(),
            name,
            data,
        })
    }

    #[inline]
    pub fn with_output_condition(
        mut self,
        identifier: impl Into<String>,
        condition: impl Into<String>,
    ) -> Self {
        self.output_condition_identifier = identifier.into();
        self.output_condition = condition.into();
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Human-readable name, written as the output intent's `/Info`.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn output_condition_identifier(&self) -> &str {
        &self.output_condition_identifier
    }

    pub fn output_condition(&self) -> &str {
        &self.output_condition
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }
}

fn validate_header(data: &[u8]) -> Result<(), ProfileError> {
    if data.len() < HEADER_LEN {
        return Err(ProfileError::Truncated(data.len()));
    }
    if &data[SIGNATURE_OFFSET..SIGNATURE_OFFSET + 4] != b"acsp" {
        return Err(ProfileError::BadSignature);
    }

    let declared = u32::from_be_bytes([data[0], data[1], data[2], data[3]]) as usize;
    if declared > data.len() {
        return Err(ProfileError::SizeMismatch {
            declared,
            actual: data.len(),
        });
    }

    let space = &data[COLOR_SPACE_OFFSET..COLOR_SPACE_OFFSET + 4];
    if space != b"CMYK" {
        return Err(ProfileError::NotCmyk(
            String::from_utf8_lossy(space).trim_end().to_string(),
        ));
    }
    Ok(())
}

/// Build a minimal, header-only CMYK profile. Test support only.
#[doc(hidden)]
pub fn synthetic_header(len: usize) -> Vec<u8> {
    let mut data = vec![0u8; len.max(HEADER_LEN)];
    let size = data.len() as u32;
    data[0..4].copy_from_slice(&size.to_be_bytes());
    data[12..16].copy_from_slice(b"prtr");
    data[COLOR_SPACE_OFFSET..COLOR_SPACE_OFFSET + 4].copy_from_slice(b"CMYK");
    data[20..24].copy_from_slice(b"Lab ");
    data[SIGNATURE_OFFSET..SIGNATURE_OFFSET + 4].copy_from_slice(b"acsp");
    data
}
