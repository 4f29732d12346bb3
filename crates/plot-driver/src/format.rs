//! Sample decoding
//!
//! A sample is one fixed-width unsigned integer per record. Width and
//! byte order are constant for the whole session.

use crate::error::PlotError;
use serde::{Deserialize, Serialize};

/// Byte order of samples on the wire
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ByteOrder {
    #[default]
    Little,
    Big,
}

/// Wire encoding of one sample
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SampleFormat {
    /// Bytes per sample: 1, 2, 4 or 8
    pub width: usize,
    /// Byte order
    pub byte_order: ByteOrder,
}

impl Default for SampleFormat {
    fn default() -> Self {
        Self {
            width: 2,
            byte_order: ByteOrder::Little,
        }
    }
}

impl SampleFormat {
    /// Create a validated format
    pub fn new(width: usize, byte_order: ByteOrder) -> Result<Self, PlotError> {
        let format = Self { width, byte_order };
        format.validate()?;
        Ok(format)
    }

    /// Reject widths that are not a native unsigned integer size
    pub fn validate(&self) -> Result<(), PlotError> {
        match self.width {
            1 | 2 | 4 | 8 => Ok(()),
            other => Err(PlotError::UnsupportedWidth(other)),
        }
    }

    /// Check that records of `record_size` bytes hold exactly one sample
    pub fn check_record_size(&self, record_size: usize) -> Result<(), PlotError> {
        self.validate()?;
        if record_size != self.width {
            return Err(PlotError::WidthMismatch {
                record_size,
                width: self.width,
            });
        }
        Ok(())
    }

    /// Largest value representable in this width
    pub fn max_value(&self) -> u64 {
        if self.width >= 8 {
            u64::MAX
        } else {
            (1u64 << (self.width * 8)) - 1
        }
    }

    /// Decode one sample. Pure: depends only on the bytes and the format.
    pub fn decode(&self, bytes: &[u8]) -> Result<u64, PlotError> {
        self.validate()?;
        if bytes.len() != self.width {
            return Err(PlotError::ShortRecord {
                expected: self.width,
                actual: bytes.len(),
            });
        }

        let mut word = [0u8; 8];
        let value = match self.byte_order {
            ByteOrder::Little => {
                word[..self.width].copy_from_slice(bytes);
                u64::from_le_bytes(word)
            }
            ByteOrder::Big => {
                word[8 - self.width..].copy_from_slice(bytes);
                u64::from_be_bytes(word)
            }
        };
        Ok(value)
    }

    /// Encode one sample the way a device would put it on the wire
    pub fn encode(&self, value: u64) -> Result<Vec<u8>, PlotError> {
        self.validate()?;
        if value > self.max_value() {
            return Err(PlotError::Overflow {
                value,
                width: self.width,
            });
        }

        let bytes = match self.byte_order {
            ByteOrder::Little => value.to_le_bytes()[..self.width].to_vec(),
            ByteOrder::Big => value.to_be_bytes()[8 - self.width..].to_vec(),
        };
        Ok(bytes)
    }
}
