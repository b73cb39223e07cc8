//! Core types for S-records

use crate::error::SRecordError;
use alloc::format;
use bytes::Bytes;
use core::fmt;
use serde::{Deserialize, Serialize};

/// Kind of record, identified by the digit after the `S` marker
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RecordType {
    /// Header (vendor text, address usually 0)
    S0,
    /// Data with a 16-bit address
    S1,
    /// Data with a 24-bit address
    S2,
    /// Data with a 32-bit address
    S3,
    /// Reserved
    S4,
    /// 16-bit count of preceding data records
    S5,
    /// 24-bit count of preceding data records
    S6,
    /// Terminator with a 32-bit start address
    S7,
    /// Terminator with a 24-bit start address
    S8,
    /// Terminator with a 16-bit start address
    S9,
}

impl RecordType {
    /// Parse the ASCII type digit
    pub fn from_digit(digit: u8) -> Option<Self> {
        let ty = match digit {
            b'0' => RecordType::S0,
            b'1' => RecordType::S1,
            b'2' => RecordType::S2,
            b'3' => RecordType::S3,
            b'4' => RecordType::S4,
            b'5' => RecordType::S5,
            b'6' => RecordType::S6,
            b'7' => RecordType::S7,
            b'8' => RecordType::S8,
            b'9' => RecordType::S9,
            _ => return None,
        };
        Some(ty)
    }

    /// ASCII digit written after the marker
    pub const fn as_digit(&self) -> u8 {
        match self {
            RecordType::S0 => b'0',
            RecordType::S1 => b'1',
            RecordType::S2 => b'2',
            RecordType::S3 => b'3',
            RecordType::S4 => b'4',
            RecordType::S5 => b'5',
            RecordType::S6 => b'6',
            RecordType::S7 => b'7',
            RecordType::S8 => b'8',
            RecordType::S9 => b'9',
        }
    }

    /// Width of the address field in bytes, `None` for the reserved S4
    pub const fn address_size(&self) -> Option<usize> {
        match self {
            RecordType::S0 | RecordType::S1 | RecordType::S5 | RecordType::S9 => Some(2),
            RecordType::S2 | RecordType::S6 | RecordType::S8 => Some(3),
            RecordType::S3 | RecordType::S7 => Some(4),
            RecordType::S4 => None,
        }
    }

    /// S1, S2 or S3
    pub const fn is_data(&self) -> bool {
        matches!(self, RecordType::S1 | RecordType::S2 | RecordType::S3)
    }

    /// S5 or S6
    pub const fn is_count(&self) -> bool {
        matches!(self, RecordType::S5 | RecordType::S6)
    }

    /// S7, S8 or S9
    pub const fn is_terminator(&self) -> bool {
        matches!(self, RecordType::S7 | RecordType::S8 | RecordType::S9)
    }
}

impl fmt::Display for RecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "S{}", self.as_digit() as char)
    }
}

/// Address width used by the encoder; picks the data and terminator types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub enum AddressWidth {
    /// 2-byte addresses: S1 data, S9 terminator
    Bits16,
    /// 3-byte addresses: S2 data, S8 terminator
    Bits24,
    /// 4-byte addresses: S3 data, S7 terminator
    Bits32,
}

impl AddressWidth {
    /// Width from a bit count; only 16, 24 and 32 are valid
    pub fn from_bits(bits: u32) -> Result<Self, SRecordError> {
        match bits {
            16 => Ok(AddressWidth::Bits16),
            24 => Ok(AddressWidth::Bits24),
            32 => Ok(AddressWidth::Bits32),
            other => Err(SRecordError::InvalidConfig(format!(
                "address width must be 16, 24 or 32 bits, got {}",
                other
            ))),
        }
    }

    /// Width from a byte count (2, 3 or 4)
    pub fn from_size(size: usize) -> Option<Self> {
        match size {
            2 => Some(AddressWidth::Bits16),
            3 => Some(AddressWidth::Bits24),
            4 => Some(AddressWidth::Bits32),
            _ => None,
        }
    }

    /// Width whose data record type is `ty`
    pub fn from_data_type(ty: RecordType) -> Option<Self> {
        match ty {
            RecordType::S1 => Some(AddressWidth::Bits16),
            RecordType::S2 => Some(AddressWidth::Bits24),
            RecordType::S3 => Some(AddressWidth::Bits32),
            _ => None,
        }
    }

    /// Width whose terminator record type is `ty`
    pub fn from_terminator_type(ty: RecordType) -> Option<Self> {
        match ty {
            RecordType::S9 => Some(AddressWidth::Bits16),
            RecordType::S8 => Some(AddressWidth::Bits24),
            RecordType::S7 => Some(AddressWidth::Bits32),
            _ => None,
        }
    }

    /// Number of address bits
    pub const fn bits(&self) -> u32 {
        match self {
            AddressWidth::Bits16 => 16,
            AddressWidth::Bits24 => 24,
            AddressWidth::Bits32 => 32,
        }
    }

    /// Number of address bytes
    pub const fn size(&self) -> usize {
        match self {
            AddressWidth::Bits16 => 2,
            AddressWidth::Bits24 => 3,
            AddressWidth::Bits32 => 4,
        }
    }

    /// Largest address representable at this width
    pub const fn max_address(&self) -> u32 {
        match self {
            AddressWidth::Bits16 => 0xFFFF,
            AddressWidth::Bits24 => 0xFF_FFFF,
            AddressWidth::Bits32 => 0xFFFF_FFFF,
        }
    }

    /// Record type used for data lines
    pub const fn data_type(&self) -> RecordType {
        match self {
            AddressWidth::Bits16 => RecordType::S1,
            AddressWidth::Bits24 => RecordType::S2,
            AddressWidth::Bits32 => RecordType::S3,
        }
    }

    /// Record type used for the terminator line
    pub const fn terminator_type(&self) -> RecordType {
        match self {
            AddressWidth::Bits16 => RecordType::S9,
            AddressWidth::Bits24 => RecordType::S8,
            AddressWidth::Bits32 => RecordType::S7,
        }
    }
}

impl Default for AddressWidth {
    fn default() -> Self {
        AddressWidth::Bits24
    }
}

impl TryFrom<u32> for AddressWidth {
    type Error = SRecordError;

    fn try_from(bits: u32) -> Result<Self, Self::Error> {
        AddressWidth::from_bits(bits)
    }
}

impl From<AddressWidth> for u32 {
    fn from(width: AddressWidth) -> Self {
        width.bits()
    }
}

/// A decoded, fully validated S-record
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    /// Record kind
    pub record_type: RecordType,

    /// Address field; for S5/S6 this is the record count
    pub address: u32,

    /// Payload bytes
    pub payload: Bytes,

    /// Declared byte count (address + payload + checksum)
    pub count: u8,

    /// Declared checksum, already verified
    pub checksum: u8,
}

impl Record {
    /// Width of this record's address field in bytes
    pub fn address_size(&self) -> usize {
        self.record_type.address_size().unwrap_or(0)
    }

    /// True for S1/S2/S3 records, the only ones that carry image bytes
    pub fn is_data(&self) -> bool {
        self.record_type.is_data()
    }

    /// Address one past the last payload byte
    pub fn end_address(&self) -> u32 {
        self.address.wrapping_add(self.payload.len() as u32)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_address_width_serializes_as_bits() {
        assert_eq!(serde_json::to_string(&AddressWidth::Bits16).unwrap(), "16");
        assert_eq!(
            serde_json::from_str::<AddressWidth>("32").unwrap(),
            AddressWidth::Bits32
        );
        assert!(serde_json::from_str::<AddressWidth>("20").is_err());
        assert!(serde_json::from_str::<AddressWidth>("\"Bits24\"").is_err());
    }

    #[test]
    fn test_address_size_for_every_digit() {
        let expected = [
            (b'0', Some(2)),
            (b'1', Some(2)),
            (b'2', Some(3)),
            (b'3', Some(4)),
            (b'4', None),
            (b'5', Some(2)),
            (b'6', Some(3)),
            (b'7', Some(4)),
            (b'8', Some(3)),
            (b'9', Some(2)),
        ];

        for (digit, size) in expected {
            let ty = RecordType::from_digit(digit).unwrap();
            assert_eq!(ty.address_size(), size, "type {}", ty);
            assert_eq!(ty.as_digit(), digit);
        }
    }

    #[test]
    fn test_from_digit_rejects_non_digits() {
        assert_eq!(RecordType::from_digit(b'A'), None);
        assert_eq!(RecordType::from_digit(b' '), None);
    }

    #[test]
    fn test_width_type_table_both_directions() {
        let table = [
            (AddressWidth::Bits16, RecordType::S1, RecordType::S9),
            (AddressWidth::Bits24, RecordType::S2, RecordType::S8),
            (AddressWidth::Bits32, RecordType::S3, RecordType::S7),
        ];

        for (width, data, term) in table {
            assert_eq!(width.data_type(), data);
            assert_eq!(width.terminator_type(), term);
            assert_eq!(AddressWidth::from_data_type(data), Some(width));
            assert_eq!(AddressWidth::from_terminator_type(term), Some(width));
            assert_eq!(data.address_size(), Some(width.size()));
            assert_eq!(term.address_size(), Some(width.size()));
            assert_eq!(AddressWidth::from_size(width.size()), Some(width));
        }
    }

    #[test]
    fn test_from_bits() {
        assert_eq!(AddressWidth::from_bits(16), Ok(AddressWidth::Bits16));
        assert_eq!(AddressWidth::from_bits(32).unwrap().size(), 4);
        assert!(matches!(
            AddressWidth::from_bits(8),
            Err(SRecordError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_record_type_display() {
        assert_eq!(RecordType::S3.to_string(), "S3");
    }
}
