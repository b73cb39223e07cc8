//! Constants and limits for the Motorola S-record format

/// Record marker, accepted in either case on input
pub const RECORD_MARKER: u8 = b'S';

/// Lowercase form of the record marker
pub const RECORD_MARKER_LOWER: u8 = b's';

/// Largest byte count the decoder accepts on a single record
/// (address bytes + payload bytes + checksum byte)
pub const MAX_RECORD_COUNT: u8 = 32;

/// Largest line budget the encoder may be configured with
pub const MAX_CHUNK_SIZE: u8 = MAX_RECORD_COUNT;

/// Default line budget used by the encoder
pub const DEFAULT_CHUNK_SIZE: u8 = 32;

/// Default address width used by the encoder, in bits
pub const DEFAULT_ADDRESS_BITS: u32 = 24;

/// Line terminator written after every synthesized record
pub const LINE_ENDING: &[u8; 2] = b"\r\n";

/// Header emitted when no custom header is configured:
/// an S0 record at address 0 carrying the text "HDR"
pub const DEFAULT_HEADER: &str = "S00600004844521B";

/// Largest number of data records an S5 count record can report.
/// Anything above this needs the 3-byte S6 form.
pub const MAX_S5_COUNT: u32 = 0xFFFF;

/// Largest number of data records an S6 count record can report
pub const MAX_S6_COUNT: u32 = 0xFF_FFFF;
