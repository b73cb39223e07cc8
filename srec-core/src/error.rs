//! Error types for S-record conversion

use alloc::string::String;
use core::fmt;

/// Field of a record whose characters were expected to be hex digits
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HexField {
    /// The two-digit byte count
    Count,
    /// The address field (4, 6 or 8 digits)
    Address,
    /// A payload byte
    Payload,
    /// The trailing checksum byte
    Checksum,
}

impl fmt::Display for HexField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            HexField::Count => "count",
            HexField::Address => "address",
            HexField::Payload => "payload",
            HexField::Checksum => "checksum",
        };
        f.write_str(name)
    }
}

/// Errors that can occur while decoding or encoding S-records
#[cfg_attr(feature = "std", derive(thiserror::Error))]
#[derive(Debug, Clone, PartialEq)]
pub enum SRecordError {
    /// Line does not start with an `S` marker
    #[cfg_attr(feature = "std", error("Missing record marker: expected 'S'"))]
    MissingMarker,

    /// Character after the `S` marker is not a decimal digit
    #[cfg_attr(feature = "std", error("Invalid record type {0:?}: expected a digit 0-9"))]
    InvalidType(u8),

    /// A field contained characters that are not hex digits
    #[cfg_attr(feature = "std", error("Invalid hex digits in {field} field of record at line {line}"))]
    InvalidHexDigits {
        /// Which field failed
        field: HexField,
        /// 1-based line of the record
        line: usize,
    },

    /// Declared byte count is larger than the format allows
    #[cfg_attr(feature = "std", error("Record byte count {0} exceeds maximum 32"))]
    CountOutOfRange(u8),

    /// S4 records are reserved and never valid
    #[cfg_attr(feature = "std", error("Reserved record type S4 at line {0}"))]
    ReservedType(usize),

    /// Record body is shorter than its count field declares
    #[cfg_attr(feature = "std", error("Truncated record at line {line}: count declares {declared} bytes, record holds {found}"))]
    PayloadLengthMismatch {
        /// 1-based line of the record
        line: usize,
        /// Byte count field
        declared: u8,
        /// Address, payload and checksum bytes present
        found: usize,
    },

    /// Declared checksum does not match the record contents
    #[cfg_attr(feature = "std", error("Checksum mismatch at line {line}: expected {expected:02X}, got {actual:02X}"))]
    ChecksumMismatch {
        /// 1-based line of the record
        line: usize,
        /// Checksum computed from the record
        expected: u8,
        /// Checksum declared on the line
        actual: u8,
    },

    /// Single character is not a hex digit
    #[cfg_attr(feature = "std", error("Invalid hex digit {0:?}"))]
    InvalidHexDigit(u8),

    /// Encoder configuration violates an invariant
    #[cfg_attr(feature = "std", error("Invalid encoder configuration: {0}"))]
    InvalidConfig(String),

    /// Too many data records for an S6 count record
    #[cfg_attr(feature = "std", error("Data record count {0} does not fit an S6 count record"))]
    CountOverflow(u32),

    /// Reading from the input failed
    #[cfg_attr(feature = "std", error("Source IO error: {0}"))]
    SourceIo(String),

    /// Writing to the output failed
    #[cfg_attr(feature = "std", error("Sink IO error: {0}"))]
    SinkIo(String),
}

impl SRecordError {
    /// Integer status for this error.
    ///
    /// Structural decode failures map to 2..=11 in the order the decoder
    /// checks them; stream and configuration failures are negative.
    /// A missing marker is 1 and only surfaces from [`crate::Record::parse`],
    /// since a stream without further markers simply ends.
    pub fn code(&self) -> i32 {
        match self {
            SRecordError::MissingMarker => 1,
            SRecordError::InvalidType(_) => 2,
            SRecordError::InvalidHexDigits {
                field: HexField::Count,
                ..
            } => 3,
            SRecordError::CountOutOfRange(_) => 4,
            SRecordError::ReservedType(_) => 6,
            SRecordError::InvalidHexDigits {
                field: HexField::Address,
                ..
            } => 7,
            SRecordError::InvalidHexDigits {
                field: HexField::Payload,
                ..
            } => 8,
            SRecordError::PayloadLengthMismatch { .. } => 9,
            SRecordError::InvalidHexDigits {
                field: HexField::Checksum,
                ..
            } => 10,
            SRecordError::ChecksumMismatch { .. } => 11,
            SRecordError::SourceIo(_) => -1,
            SRecordError::SinkIo(_) => -2,
            SRecordError::InvalidConfig(_) => -3,
            SRecordError::CountOverflow(_) => -4,
            SRecordError::InvalidHexDigit(_) => -5,
        }
    }

    /// True for errors caused by malformed record text
    pub fn is_malformed_record(&self) -> bool {
        (1..=11).contains(&self.code())
    }
}

/// Map a conversion result to the single integer status: 0 on success,
/// otherwise [`SRecordError::code`].
pub fn status_code<T>(result: &Result<T, SRecordError>) -> i32 {
    match result {
        Ok(_) => 0,
        Err(e) => e.code(),
    }
}

#[cfg(not(feature = "std"))]
impl fmt::Display for SRecordError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "S-record error {}: {:?}", self.code(), self)
    }
}

#[cfg(feature = "std")]
impl From<std::io::Error> for SRecordError {
    fn from(err: std::io::Error) -> Self {
        SRecordError::SourceIo(err.to_string())
    }
}
