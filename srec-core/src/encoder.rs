//! S-record encoding
//!
//! A binary image is cut into chunks that fit the configured line budget.
//! The output is laid out as:
//! 1. Header (custom text, or the default S0 "HDR" record)
//! 2. One S1/S2/S3 data record per chunk
//! 3. Optional S5/S6 count record
//! 4. Terminator (custom text, or S9/S8/S7 carrying the final address)

use crate::checksum::checksum;
use crate::constants::{
    DEFAULT_ADDRESS_BITS, DEFAULT_CHUNK_SIZE, DEFAULT_HEADER, LINE_ENDING, MAX_CHUNK_SIZE,
    MAX_RECORD_COUNT, MAX_S5_COUNT, MAX_S6_COUNT, RECORD_MARKER,
};
use crate::error::SRecordError;
use crate::types::{AddressWidth, Record, RecordType};
use alloc::format;
use alloc::string::String;
use bytes::{BufMut, Bytes, BytesMut};
use serde::{Deserialize, Serialize};
#[cfg(feature = "std")]
use std::io::{BufWriter, ErrorKind, Read, Write};
#[cfg(feature = "std")]
use tracing::{debug, info, warn};

/// Output settings for binary to S-record conversion
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EncoderConfig {
    /// Load address of the first image byte
    pub start: u32,

    /// Address width; selects S1/S2/S3 data and S9/S8/S7 terminator records
    pub address_width: AddressWidth,

    /// Byte count of a full data line: address + payload + checksum
    pub chunk_size: u8,

    /// Header written verbatim instead of the default S0 record
    pub header: Option<String>,

    /// Trailer written verbatim instead of a synthesized terminator
    pub tail: Option<String>,

    /// Write an S5/S6 record with the number of data records
    pub emit_count_record: bool,

    /// Advance the address past a final short chunk before writing the
    /// terminator. When false the terminator carries the address following
    /// the last full chunk.
    pub advance_address_on_remainder: bool,
}

impl Default for EncoderConfig {
    fn default() -> Self {
        Self {
            start: 0,
            address_width: AddressWidth::default(),
            chunk_size: DEFAULT_CHUNK_SIZE,
            header: None,
            tail: None,
            emit_count_record: false,
            advance_address_on_remainder: true,
        }
    }
}

impl EncoderConfig {
    /// Start building a configuration for an image loaded at `start`
    pub fn builder(start: u32) -> EncoderBuilder {
        EncoderBuilder::new(start)
    }

    /// Check the configuration invariants
    pub fn validate(&self) -> Result<(), SRecordError> {
        let address_size = self.address_width.size();

        if self.chunk_size > MAX_CHUNK_SIZE {
            return Err(SRecordError::InvalidConfig(format!(
                "chunk size {} exceeds maximum {}",
                self.chunk_size, MAX_CHUNK_SIZE
            )));
        }

        if (self.chunk_size as usize) < address_size + 2 {
            return Err(SRecordError::InvalidConfig(format!(
                "chunk size {} leaves no room for payload with {}-byte addresses",
                self.chunk_size, address_size
            )));
        }

        if self.start > self.address_width.max_address() {
            return Err(SRecordError::InvalidConfig(format!(
                "start address {:#X} does not fit {} bits",
                self.start,
                self.address_width.bits()
            )));
        }

        Ok(())
    }

    /// Payload bytes carried by a full data line
    pub fn payload_len(&self) -> usize {
        self.chunk_size as usize - self.address_width.size() - 1
    }
}

/// Builder for [`EncoderConfig`]
#[derive(Debug, Clone)]
pub struct EncoderBuilder {
    config: EncoderConfig,
    address_bits: u32,
    header_text: Option<String>,
}

impl EncoderBuilder {
    /// Create a builder with default width and chunk size
    pub fn new(start: u32) -> Self {
        Self {
            config: EncoderConfig {
                start,
                ..EncoderConfig::default()
            },
            address_bits: DEFAULT_ADDRESS_BITS,
            header_text: None,
        }
    }

    /// Set the address width in bits (16, 24 or 32)
    pub fn address_bits(mut self, bits: u32) -> Self {
        self.address_bits = bits;
        self
    }

    /// Set the address width
    pub fn address_width(mut self, width: AddressWidth) -> Self {
        self.address_bits = width.bits();
        self
    }

    /// Set the full-line byte count
    pub fn chunk_size(mut self, size: u8) -> Self {
        self.config.chunk_size = size;
        self
    }

    /// Use a pre-formatted header line, written verbatim
    pub fn header_line(mut self, line: impl Into<String>) -> Self {
        self.config.header = Some(line.into());
        self.header_text = None;
        self
    }

    /// Synthesize an S0 header carrying `text`
    pub fn header_text(mut self, text: impl Into<String>) -> Self {
        self.header_text = Some(text.into());
        self.config.header = None;
        self
    }

    /// Use a pre-formatted terminator line, written verbatim
    pub fn tail_line(mut self, line: impl Into<String>) -> Self {
        self.config.tail = Some(line.into());
        self
    }

    /// Emit an S5/S6 count record
    pub fn with_count_record(mut self) -> Self {
        self.config.emit_count_record = true;
        self
    }

    /// Keep the terminator address at the end of the last full chunk
    pub fn legacy_remainder_address(mut self) -> Self {
        self.config.advance_address_on_remainder = false;
        self
    }

    /// Validate and produce the configuration
    pub fn build(self) -> Result<EncoderConfig, SRecordError> {
        let mut config = self.config;
        config.address_width = AddressWidth::from_bits(self.address_bits)?;

        if let Some(text) = self.header_text {
            let line = header_record(&text)?;
            config.header = Some(String::from_utf8_lossy(&line).into_owned());
        }

        config.validate()?;
        Ok(config)
    }
}

/// Format one record line (with CRLF) into `buf`
fn put_record(
    buf: &mut BytesMut,
    record_type: RecordType,
    address: u32,
    address_size: usize,
    payload: &[u8],
) {
    let count = (address_size + payload.len() + 1) as u8;

    let mut body = BytesMut::with_capacity(count as usize + 1);
    body.put_u8(count);
    body.put_slice(&address.to_be_bytes()[4 - address_size..]);
    body.put_slice(payload);
    body.put_u8(checksum(count, address, address_size, payload));

    buf.put_u8(RECORD_MARKER);
    buf.put_u8(record_type.as_digit());
    buf.put_slice(::hex::encode_upper(&body).as_bytes());
    buf.put_slice(LINE_ENDING);
}

/// Encode a single record line, CRLF included.
///
/// The address is truncated to the width implied by `record_type`.
pub fn encode_record(
    record_type: RecordType,
    address: u32,
    payload: &[u8],
) -> Result<Bytes, SRecordError> {
    let address_size = record_type
        .address_size()
        .ok_or_else(|| SRecordError::InvalidConfig(String::from("S4 is reserved")))?;

    let count = address_size + payload.len() + 1;
    if count > MAX_RECORD_COUNT as usize {
        return Err(SRecordError::InvalidConfig(format!(
            "record byte count {} exceeds maximum {}",
            count, MAX_RECORD_COUNT
        )));
    }

    let mut buf = BytesMut::with_capacity(4 + count * 2 + LINE_ENDING.len());
    put_record(&mut buf, record_type, address, address_size, payload);
    Ok(buf.freeze())
}

/// Encode a complete Record struct
pub fn encode_record_struct(record: &Record) -> Result<Bytes, SRecordError> {
    encode_record(record.record_type, record.address, &record.payload)
}

/// S0 header record at address 0 carrying `text`
pub fn header_record(text: &str) -> Result<Bytes, SRecordError> {
    encode_record(RecordType::S0, 0, text.as_bytes())
}

/// Append user-supplied text, terminating it with CRLF unless it already
/// ends a line
fn put_verbatim(buf: &mut BytesMut, text: &str) {
    buf.put_slice(text.as_bytes());
    if !text.ends_with('\n') {
        buf.put_slice(LINE_ENDING);
    }
}

/// What an encode pass produced
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct EncodeSummary {
    /// Image bytes consumed
    pub input_bytes: u64,
    /// S1/S2/S3 records written
    pub data_records: u32,
    /// Type of the count record, if one was written
    pub count_record: Option<RecordType>,
    /// Address following the last chunk, as written to the terminator
    pub final_address: u32,
    /// Text bytes written
    pub output_bytes: u64,
}

/// Writes S-record lines for a binary image, one chunk at a time
#[cfg(feature = "std")]
pub struct RecordEncoder<W: Write> {
    config: EncoderConfig,
    writer: W,
    line: BytesMut,
    address: u32,
    wrapped: bool,
    summary: EncodeSummary,
}

#[cfg(feature = "std")]
impl<W: Write> RecordEncoder<W> {
    /// Create an encoder; fails if `config` is invalid
    pub fn new(config: EncoderConfig, writer: W) -> Result<Self, SRecordError> {
        config.validate()?;

        let line_capacity = 4 + 2 * MAX_CHUNK_SIZE as usize + LINE_ENDING.len();
        Ok(Self {
            address: config.start,
            config,
            writer,
            line: BytesMut::with_capacity(line_capacity),
            wrapped: false,
            summary: EncodeSummary::default(),
        })
    }

    /// Configuration in use
    pub fn config(&self) -> &EncoderConfig {
        &self.config
    }

    /// Address the next data record will carry
    pub fn address(&self) -> u32 {
        self.address & self.config.address_width.max_address()
    }

    /// Write the header line
    pub fn write_header(&mut self) -> Result<(), SRecordError> {
        match &self.config.header {
            Some(text) => put_verbatim(&mut self.line, text),
            None => put_verbatim(&mut self.line, DEFAULT_HEADER),
        }
        self.flush_line()
    }

    /// Write one data record.
    ///
    /// `chunk` must be non-empty and no longer than
    /// [`EncoderConfig::payload_len`]; a shorter chunk is treated as the
    /// final remainder of the image.
    pub fn write_chunk(&mut self, chunk: &[u8]) -> Result<(), SRecordError> {
        let payload_len = self.config.payload_len();
        if chunk.is_empty() || chunk.len() > payload_len {
            return Err(SRecordError::InvalidConfig(format!(
                "chunk of {} bytes does not fit a {}-byte payload",
                chunk.len(),
                payload_len
            )));
        }

        let width = self.config.address_width;
        let address = self.address();
        put_record(&mut self.line, width.data_type(), address, width.size(), chunk);
        self.flush_line()?;

        self.summary.data_records += 1;
        self.summary.input_bytes += chunk.len() as u64;

        if chunk.len() == payload_len || self.config.advance_address_on_remainder {
            self.advance(chunk.len());
        }
        Ok(())
    }

    /// Write the S5/S6 count record if the configuration asks for one
    pub fn write_count_record(&mut self) -> Result<Option<RecordType>, SRecordError> {
        if !self.config.emit_count_record {
            return Ok(None);
        }

        let count = self.summary.data_records;
        let record_type = if count <= MAX_S5_COUNT {
            RecordType::S5
        } else if count <= MAX_S6_COUNT {
            RecordType::S6
        } else {
            return Err(SRecordError::CountOverflow(count));
        };

        let size = record_type.address_size().unwrap_or(2);
        put_record(&mut self.line, record_type, count, size, &[]);
        self.flush_line()?;

        self.summary.count_record = Some(record_type);
        Ok(Some(record_type))
    }

    /// Write the terminator line
    pub fn write_terminator(&mut self) -> Result<(), SRecordError> {
        self.summary.final_address = self.address();

        match &self.config.tail {
            Some(text) => put_verbatim(&mut self.line, text),
            None => {
                let width = self.config.address_width;
                put_record(
                    &mut self.line,
                    width.terminator_type(),
                    self.summary.final_address,
                    width.size(),
                    &[],
                );
            }
        }
        self.flush_line()
    }

    /// Flush the writer and return the summary along with it
    pub fn finish(mut self) -> Result<(EncodeSummary, W), SRecordError> {
        self.writer
            .flush()
            .map_err(|e| SRecordError::SinkIo(e.to_string()))?;
        Ok((self.summary, self.writer))
    }

    fn advance(&mut self, len: usize) {
        let max = self.config.address_width.max_address();
        if !self.wrapped && u64::from(self.address()) + len as u64 > u64::from(max) {
            warn!(
                "Image runs past the {}-bit address space; addresses wrap",
                self.config.address_width.bits()
            );
            self.wrapped = true;
        }
        self.address = self.address.wrapping_add(len as u32);
    }

    fn flush_line(&mut self) -> Result<(), SRecordError> {
        self.writer
            .write_all(&self.line)
            .map_err(|e| SRecordError::SinkIo(e.to_string()))?;
        self.summary.output_bytes += self.line.len() as u64;
        self.line.clear();
        Ok(())
    }
}

/// Fill `buf` from `reader`, stopping early only at end of input
#[cfg(feature = "std")]
fn read_chunk<R: Read>(reader: &mut R, buf: &mut [u8]) -> Result<usize, SRecordError> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(SRecordError::SourceIo(e.to_string())),
        }
    }
    Ok(filled)
}

/// Encode a binary image read from `input` as S-records written to `output`.
///
/// The configuration is validated before anything is written. Read and
/// write failures abort the conversion; text already written stays in
/// `output`.
#[cfg(feature = "std")]
pub fn encode_to_srecord<R: Read, W: Write>(
    config: &EncoderConfig,
    mut input: R,
    output: W,
) -> Result<EncodeSummary, SRecordError> {
    let mut encoder = RecordEncoder::new(config.clone(), BufWriter::new(output))?;
    let payload_len = config.payload_len();

    debug!(
        "Encoding at {:#X}: {} data records, {} payload bytes per line",
        config.start,
        config.address_width.data_type(),
        payload_len
    );

    encoder.write_header()?;

    let mut chunk = [0u8; MAX_CHUNK_SIZE as usize];
    loop {
        let n = read_chunk(&mut input, &mut chunk[..payload_len])?;
        if n == 0 {
            break;
        }
        encoder.write_chunk(&chunk[..n])?;
        if n < payload_len {
            break;
        }
    }

    encoder.write_count_record()?;
    encoder.write_terminator()?;
    let (summary, _) = encoder.finish()?;

    info!(
        "Encoded {} bytes into {} data records ({} bytes of text)",
        summary.input_bytes, summary.data_records, summary.output_bytes
    );

    Ok(summary)
}

/// Encode an in-memory image into S-record text
#[cfg(feature = "std")]
pub fn encode_to_vec(config: &EncoderConfig, image: &[u8]) -> Result<Vec<u8>, SRecordError> {
    let mut out = Vec::new();
    encode_to_srecord(config, image, &mut out)?;
    Ok(out)
}
