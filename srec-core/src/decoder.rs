//! S-record decoding (strict mode)
//!
//! Each record is checked in a fixed order: marker, type digit, count,
//! address, payload, checksum. The first failing check decides the error.

use crate::checksum::Checksum;
use crate::constants::{MAX_RECORD_COUNT, RECORD_MARKER, RECORD_MARKER_LOWER};
use crate::error::{HexField, SRecordError};
use crate::hex::{hex_pair_to_byte, hex_to_uint, is_hex_digits};
use crate::types::{Record, RecordType};
use alloc::string::String;
use alloc::vec::Vec;
use bytes::Bytes;
use core::iter::FusedIterator;
use core::str::FromStr;
use serde::Serialize;
use tracing::debug;
#[cfg(feature = "std")]
use std::io::{BufRead, BufReader, Read, Write};
#[cfg(feature = "std")]
use tracing::{info, warn};

/// Byte-level input for the record decoder
pub trait ByteSource {
    /// Next byte, or `None` at end of input
    fn next_byte(&mut self) -> Result<Option<u8>, SRecordError>;

    /// Skip past the next `S`/`s` marker. Returns `false` if the input
    /// ended first.
    fn skip_to_marker(&mut self) -> Result<bool, SRecordError>;

    /// Current 1-based line number
    fn line(&self) -> usize;
}

/// In-memory input
#[derive(Debug, Clone)]
pub struct SliceSource<'a> {
    data: &'a [u8],
    pos: usize,
    line: usize,
}

impl<'a> SliceSource<'a> {
    /// Wrap a byte slice
    pub fn new(data: &'a [u8]) -> Self {
        Self {
            data,
            pos: 0,
            line: 1,
        }
    }
}

impl ByteSource for SliceSource<'_> {
    fn next_byte(&mut self) -> Result<Option<u8>, SRecordError> {
        let byte = self.data.get(self.pos).copied();
        if let Some(b) = byte {
            self.pos += 1;
            if b == b'\n' {
                self.line += 1;
            }
        }
        Ok(byte)
    }

    fn skip_to_marker(&mut self) -> Result<bool, SRecordError> {
        let rest = &self.data[self.pos..];
        match memchr::memchr2(RECORD_MARKER, RECORD_MARKER_LOWER, rest) {
            Some(i) => {
                self.line += memchr::memchr_iter(b'\n', &rest[..i]).count();
                self.pos += i + 1;
                Ok(true)
            }
            None => {
                self.line += memchr::memchr_iter(b'\n', rest).count();
                self.pos = self.data.len();
                Ok(false)
            }
        }
    }

    fn line(&self) -> usize {
        self.line
    }
}

/// Buffered reader input
#[cfg(feature = "std")]
#[derive(Debug)]
pub struct ReaderSource<R> {
    reader: R,
    line: usize,
}

#[cfg(feature = "std")]
impl<R: BufRead> ReaderSource<R> {
    /// Wrap a buffered reader
    pub fn new(reader: R) -> Self {
        Self { reader, line: 1 }
    }

    /// Give back the reader
    pub fn into_inner(self) -> R {
        self.reader
    }
}

#[cfg(feature = "std")]
impl<R: BufRead> ByteSource for ReaderSource<R> {
    fn next_byte(&mut self) -> Result<Option<u8>, SRecordError> {
        let byte = self.reader.fill_buf()?.first().copied();
        if let Some(b) = byte {
            self.reader.consume(1);
            if b == b'\n' {
                self.line += 1;
            }
        }
        Ok(byte)
    }

    fn skip_to_marker(&mut self) -> Result<bool, SRecordError> {
        loop {
            let (skip, found) = {
                let buf = self.reader.fill_buf()?;
                if buf.is_empty() {
                    return Ok(false);
                }
                match memchr::memchr2(RECORD_MARKER, RECORD_MARKER_LOWER, buf) {
                    Some(i) => {
                        self.line += memchr::memchr_iter(b'\n', &buf[..i]).count();
                        (i + 1, true)
                    }
                    None => {
                        self.line += memchr::memchr_iter(b'\n', buf).count();
                        (buf.len(), false)
                    }
                }
            };

            self.reader.consume(skip);
            if found {
                return Ok(true);
            }
        }
    }

    fn line(&self) -> usize {
        self.line
    }
}

/// Pulls validated records out of a [`ByteSource`]
#[derive(Debug)]
pub struct RecordDecoder<S> {
    source: S,
    records: usize,
    done: bool,
}

impl<'a> RecordDecoder<SliceSource<'a>> {
    /// Decode records from an in-memory buffer
    pub fn from_bytes(data: &'a [u8]) -> Self {
        Self::new(SliceSource::new(data))
    }
}

#[cfg(feature = "std")]
impl<R: Read> RecordDecoder<ReaderSource<BufReader<R>>> {
    /// Decode records from any reader, buffering it internally
    pub fn from_reader(reader: R) -> Self {
        Self::new(ReaderSource::new(BufReader::new(reader)))
    }
}

impl<S: ByteSource> RecordDecoder<S> {
    /// Create a decoder over a byte source
    pub fn new(source: S) -> Self {
        Self {
            source,
            records: 0,
            done: false,
        }
    }

    /// Number of records decoded so far
    pub fn records_decoded(&self) -> usize {
        self.records
    }

    /// Give back the byte source
    pub fn into_source(self) -> S {
        self.source
    }

    /// Decode the next record.
    ///
    /// Returns `Ok(None)` once no further marker exists in the input; that
    /// is the normal end of a file, not an error.
    pub fn next_record(&mut self) -> Result<Option<Record>, SRecordError> {
        if !self.source.skip_to_marker()? {
            return Ok(None);
        }
        let line = self.source.line();

        let digit = self.source.next_byte()?;
        let record_type = match digit.and_then(RecordType::from_digit) {
            Some(ty) => ty,
            None => return Err(SRecordError::InvalidType(digit.unwrap_or(0))),
        };

        let mut count_digits = [0u8; 2];
        self.read_hex_field(&mut count_digits, HexField::Count, line)?;
        let count = hex_to_uint(&count_digits) as u8;
        if count > MAX_RECORD_COUNT {
            return Err(SRecordError::CountOutOfRange(count));
        }

        let address_size = record_type
            .address_size()
            .ok_or(SRecordError::ReservedType(line))?;

        let mut address_digits = [0u8; 8];
        let address_digits = &mut address_digits[..address_size * 2];
        self.read_hex_field(address_digits, HexField::Address, line)?;
        let address = hex_to_uint(address_digits);

        let mut checksum = Checksum::new(count);
        checksum.add_address(address, address_size);

        let payload_len = match (count as usize).checked_sub(address_size + 1) {
            Some(len) => len,
            None => {
                return Err(SRecordError::PayloadLengthMismatch {
                    line,
                    declared: count,
                    found: address_size + 1,
                })
            }
        };

        let mut payload = Vec::with_capacity(payload_len);
        while payload.len() < payload_len {
            let pair = match self.read_payload_pair()? {
                Some(pair) => pair,
                None => {
                    return Err(SRecordError::PayloadLengthMismatch {
                        line,
                        declared: count,
                        found: address_size + payload.len() + 1,
                    })
                }
            };
            let byte = hex_pair_to_byte(pair).map_err(|_| SRecordError::InvalidHexDigits {
                field: HexField::Payload,
                line,
            })?;
            checksum.add(byte);
            payload.push(byte);
        }

        let mut checksum_digits = [0u8; 2];
        self.read_hex_field(&mut checksum_digits, HexField::Checksum, line)?;
        let declared = hex_to_uint(&checksum_digits) as u8;
        let expected = checksum.value();
        if declared != expected {
            return Err(SRecordError::ChecksumMismatch {
                line,
                expected,
                actual: declared,
            });
        }

        self.records += 1;
        debug!(
            "Decoded {} at line {}: address {:#X}, {} payload bytes",
            record_type,
            line,
            address,
            payload.len()
        );

        Ok(Some(Record {
            record_type,
            address,
            payload: Bytes::from(payload),
            count,
            checksum: declared,
        }))
    }

    /// Fill `buf` and require every byte to be a hex digit
    fn read_hex_field(
        &mut self,
        buf: &mut [u8],
        field: HexField,
        line: usize,
    ) -> Result<(), SRecordError> {
        let mut filled = 0;
        while filled < buf.len() {
            match self.source.next_byte()? {
                Some(b) => {
                    buf[filled] = b;
                    filled += 1;
                }
                None => break,
            }
        }

        if filled < buf.len() || !is_hex_digits(buf) {
            return Err(SRecordError::InvalidHexDigits { field, line });
        }
        Ok(())
    }

    /// Two payload characters, or `None` if the line or input ends first
    fn read_payload_pair(&mut self) -> Result<Option<[u8; 2]>, SRecordError> {
        let mut pair = [0u8; 2];
        for slot in pair.iter_mut() {
            match self.source.next_byte()? {
                Some(b'\r') | Some(b'\n') | None => return Ok(None),
                Some(b) => *slot = b,
            }
        }
        Ok(Some(pair))
    }
}

impl<S: ByteSource> Iterator for RecordDecoder<S> {
    type Item = Result<Record, SRecordError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        match self.next_record() {
            Ok(Some(record)) => Some(Ok(record)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}

impl<S: ByteSource> FusedIterator for RecordDecoder<S> {}

impl Record {
    /// Parse a single record line
    pub fn parse<T: AsRef<[u8]>>(line: T) -> Result<Record, SRecordError> {
        RecordDecoder::from_bytes(line.as_ref())
            .next_record()?
            .ok_or(SRecordError::MissingMarker)
    }
}

impl FromStr for Record {
    type Err = SRecordError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Record::parse(s)
    }
}

/// What a decode pass saw
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DecodeSummary {
    /// Records of any type
    pub records: usize,
    /// S1/S2/S3 records
    pub data_records: usize,
    /// Image bytes written to the output
    pub bytes_written: u64,
    /// Text of the last S0 header, lossily decoded
    pub header: Option<String>,
    /// Value of the last S5/S6 count record
    pub declared_count: Option<u32>,
    /// Address carried by the S7/S8/S9 terminator
    pub start_address: Option<u32>,
}

impl DecodeSummary {
    /// False if a count record was present and disagrees with the number
    /// of data records
    pub fn count_matches(&self) -> bool {
        self.declared_count
            .map_or(true, |declared| declared as usize == self.data_records)
    }

    /// Fold one record into the summary
    pub fn observe(&mut self, record: &Record) {
        self.records += 1;
        match record.record_type {
            RecordType::S0 => {
                self.header = Some(String::from_utf8_lossy(&record.payload).into_owned());
            }
            RecordType::S5 | RecordType::S6 => self.declared_count = Some(record.address),
            RecordType::S7 | RecordType::S8 | RecordType::S9 => {
                self.start_address = Some(record.address)
            }
            RecordType::S1 | RecordType::S2 | RecordType::S3 => {
                self.data_records += 1;
                self.bytes_written += record.payload.len() as u64;
            }
            RecordType::S4 => {}
        }
    }
}

/// Decode an S-record stream into a flat binary image.
///
/// Only S1/S2/S3 payloads are written, in file order. Header, count and
/// terminator records are validated but contribute no bytes. The first
/// malformed record aborts the conversion; bytes already written for
/// earlier records stay in `output`.
#[cfg(feature = "std")]
pub fn decode_to_binary<R: Read, W: Write>(
    input: R,
    mut output: W,
) -> Result<DecodeSummary, SRecordError> {
    let mut decoder = RecordDecoder::from_reader(input);
    let mut summary = DecodeSummary::default();

    let result = copy_data_records(&mut decoder, &mut output, &mut summary);
    let flushed = output.flush();
    result?;
    flushed.map_err(|e| SRecordError::SinkIo(e.to_string()))?;

    if !summary.count_matches() {
        warn!(
            "Count record declares {:?} data records, found {}",
            summary.declared_count, summary.data_records
        );
    }

    info!(
        "Decoded {} records ({} data, {} bytes)",
        summary.records, summary.data_records, summary.bytes_written
    );

    Ok(summary)
}

#[cfg(feature = "std")]
fn copy_data_records<S: ByteSource, W: Write>(
    decoder: &mut RecordDecoder<S>,
    output: &mut W,
    summary: &mut DecodeSummary,
) -> Result<(), SRecordError> {
    while let Some(record) = decoder.next_record()? {
        if record.is_data() {
            output
                .write_all(&record.payload)
                .map_err(|e| SRecordError::SinkIo(e.to_string()))?;
        }
        summary.observe(&record);
    }
    Ok(())
}

/// Decode an in-memory S-record buffer into a binary image
#[cfg(feature = "std")]
pub fn decode_to_vec(data: &[u8]) -> Result<Vec<u8>, SRecordError> {
    let mut image = Vec::new();
    decode_to_binary(data, &mut image)?;
    Ok(image)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_data_record() {
        let record = Record::parse("S1130000285F245F2212226A000424290008237C2A").unwrap();

        assert_eq!(record.record_type, RecordType::S1);
        assert_eq!(record.address, 0x0000);
        assert_eq!(record.count, 0x13);
        assert_eq!(record.payload.len(), 16);
        assert_eq!(&record.payload[..4], &[0x28, 0x5F, 0x24, 0x5F]);
        assert_eq!(record.checksum, 0x2A);
    }

    #[test]
    fn test_parse_lowercase() {
        let record: Record = "s1130000285f245f2212226a000424290008237c2a".parse().unwrap();
        assert_eq!(record.record_type, RecordType::S1);
        assert_eq!(record.payload[2], 0x24);
    }

    #[test]
    fn test_parse_header() {
        let record = Record::parse("S00600004844521B").unwrap();
        assert_eq!(record.record_type, RecordType::S0);
        assert_eq!(record.payload.as_ref(), b"HDR");
    }

    #[test]
    fn test_parse_terminators() {
        let s9 = Record::parse("S9030000FC").unwrap();
        assert_eq!(s9.record_type, RecordType::S9);
        assert!(s9.payload.is_empty());

        let s8 = Record::parse("S8042180005A").unwrap();
        assert_eq!(s8.address, 0x218000);

        let s7 = Record::parse("S70500001000EA").unwrap();
        assert_eq!(s7.address, 0x1000);
    }

    #[test]
    fn test_missing_marker() {
        assert_eq!(Record::parse("9030000FC"), Err(SRecordError::MissingMarker));
        assert_eq!(Record::parse(""), Err(SRecordError::MissingMarker));
    }

    #[test]
    fn test_invalid_type() {
        assert_eq!(
            Record::parse("SX030000FC"),
            Err(SRecordError::InvalidType(b'X'))
        );
    }

    #[test]
    fn test_invalid_count_digits() {
        assert_eq!(
            Record::parse("S1G30000FC"),
            Err(SRecordError::InvalidHexDigits {
                field: HexField::Count,
                line: 1
            })
        );
    }

    #[test]
    fn test_count_out_of_range() {
        assert_eq!(
            Record::parse("S121000000"),
            Err(SRecordError::CountOutOfRange(0x21))
        );
    }

    #[test]
    fn test_count_checked_before_reserved_type() {
        assert_eq!(
            Record::parse("S4FF0000"),
            Err(SRecordError::CountOutOfRange(0xFF))
        );
        assert_eq!(Record::parse("S4030000FC"), Err(SRecordError::ReservedType(1)));
    }

    #[test]
    fn test_invalid_address_digits() {
        assert_eq!(
            Record::parse("S10300Z0FC"),
            Err(SRecordError::InvalidHexDigits {
                field: HexField::Address,
                line: 1
            })
        );
    }

    #[test]
    fn test_invalid_payload_digits() {
        assert_eq!(
            Record::parse("S1050000ZZ00FA"),
            Err(SRecordError::InvalidHexDigits {
                field: HexField::Payload,
                line: 1
            })
        );
    }

    #[test]
    fn test_truncated_payload_at_end_of_input() {
        assert_eq!(
            Record::parse("S1070010FFEE"),
            Err(SRecordError::PayloadLengthMismatch {
                line: 1,
                declared: 7,
                found: 5
            })
        );
    }

    #[test]
    fn test_truncated_payload_at_end_of_line() {
        assert_eq!(
            Record::parse("S1070010FFEE\r\nS9030000FC\r\n"),
            Err(SRecordError::PayloadLengthMismatch {
                line: 1,
                declared: 7,
                found: 5
            })
        );
    }

    #[test]
    fn test_count_smaller_than_address() {
        assert_eq!(
            Record::parse("S1020000FD"),
            Err(SRecordError::PayloadLengthMismatch {
                line: 1,
                declared: 2,
                found: 3
            })
        );
    }

    #[test]
    fn test_invalid_checksum_digits() {
        assert_eq!(
            Record::parse("S9030000F"),
            Err(SRecordError::InvalidHexDigits {
                field: HexField::Checksum,
                line: 1
            })
        );
    }

    #[test]
    fn test_checksum_mismatch() {
        assert_eq!(
            Record::parse("S9030000FD"),
            Err(SRecordError::ChecksumMismatch {
                line: 1,
                expected: 0xFC,
                actual: 0xFD
            })
        );
    }

    #[test]
    fn test_short_count_line_rejected() {
        // Count covers one payload byte, so EE is read as the checksum
        let err = Record::parse("S1040010FFEEDD99").unwrap_err();
        assert_eq!(
            err,
            SRecordError::ChecksumMismatch {
                line: 1,
                expected: 0xEC,
                actual: 0xEE
            }
        );
        assert_eq!(err.code(), 11);
    }

    #[test]
    fn test_iterator_skips_noise_and_tracks_lines() {
        let input = b"; comment\r\n\r\nS00600004844521B\r\nS9030000FC\r\nS9030000FD\r\n";
        let results: Vec<_> = RecordDecoder::from_bytes(input).collect();

        assert_eq!(results.len(), 3);
        assert_eq!(results[0].as_ref().unwrap().record_type, RecordType::S0);
        assert_eq!(results[1].as_ref().unwrap().record_type, RecordType::S9);
        assert_eq!(
            results[2],
            Err(SRecordError::ChecksumMismatch {
                line: 5,
                expected: 0xFC,
                actual: 0xFD
            })
        );
    }

    #[test]
    fn test_reader_source_tracks_lines() {
        let input = b"\n\nS1050000AABB95\nS1G7\n";
        let mut decoder = RecordDecoder::from_reader(&input[..]);

        assert!(decoder.next_record().unwrap().is_some());
        assert_eq!(
            decoder.next_record(),
            Err(SRecordError::InvalidHexDigits {
                field: HexField::Count,
                line: 4
            })
        );
    }

    #[test]
    fn test_iterator_fuses_after_error() {
        let input = b"S00600004844521B\r\nS9030000FD\r\nS9030000FC\r\n";
        let mut decoder = RecordDecoder::from_bytes(input);

        assert!(decoder.next().unwrap().is_ok());
        assert_eq!(
            decoder.next(),
            Some(Err(SRecordError::ChecksumMismatch {
                line: 2,
                expected: 0xFC,
                actual: 0xFD
            }))
        );
        assert_eq!(decoder.next(), None);
        assert_eq!(decoder.records_decoded(), 1);
    }

    #[test]
    fn test_decode_to_binary_writes_only_data() {
        let input = b"S00600004844521B\r\n\
S107000001020304EE\r\n\
S5030001FB\r\n\
S9030000FC\r\n";
        let mut image = Vec::new();
        let summary = decode_to_binary(&input[..], &mut image).unwrap();

        assert_eq!(image, vec![0x01, 0x02, 0x03, 0x04]);
        assert_eq!(summary.records, 4);
        assert_eq!(summary.data_records, 1);
        assert_eq!(summary.bytes_written, 4);
        assert_eq!(summary.header.as_deref(), Some("HDR"));
        assert_eq!(summary.declared_count, Some(1));
        assert_eq!(summary.start_address, Some(0));
        assert!(summary.count_matches());
    }

    #[test]
    fn test_decode_keeps_bytes_written_before_failure() {
        let input = b"S107000001020304EE\r\nS1G7\r\n";
        let mut image = Vec::new();
        let result = decode_to_binary(&input[..], &mut image);

        assert_eq!(crate::error::status_code(&result), 3);
        assert_eq!(image, vec![0x01, 0x02, 0x03, 0x04]);
    }

    #[test]
    fn test_reader_source_matches_slice_source() {
        let input = b"junk S00600004844521B\nS107000001020304EE\nS9030000FC";
        let from_slice: Vec<_> = RecordDecoder::from_bytes(input).collect();
        let from_reader: Vec<_> = RecordDecoder::from_reader(&input[..]).collect();

        assert_eq!(from_slice, from_reader);
        assert_eq!(from_slice.len(), 3);
    }
}
