//! # srec-core
//!
//! Conversion between flat binary images and Motorola S-record text
//! (S19/S28/S37).
//!
//! ## Modules
//!
//! - `constants`: Format constants and limits
//! - `hex`: Hex digit primitives
//! - `checksum`: Record checksum
//! - `types`: Core types (Record, RecordType, AddressWidth)
//! - `error`: Error type and integer status codes
//! - `decoder`: Strict record decoding and S-record to binary conversion
//! - `encoder`: Record synthesis and binary to S-record conversion

#![cfg_attr(not(feature = "std"), no_std)]
#![warn(missing_docs)]

extern crate alloc;

pub mod checksum;
pub mod constants;
pub mod decoder;
pub mod encoder;
pub mod error;
pub mod hex;
pub mod types;

// Re-export commonly used types
pub use decoder::{DecodeSummary, RecordDecoder};
pub use encoder::{EncodeSummary, EncoderBuilder, EncoderConfig};
pub use error::{status_code, HexField, SRecordError};
pub use types::{AddressWidth, Record, RecordType};

#[cfg(feature = "std")]
pub use decoder::decode_to_binary;
#[cfg(feature = "std")]
pub use encoder::{encode_to_srecord, RecordEncoder};

/// Result type alias for S-record operations
pub type Result<T> = core::result::Result<T, SRecordError>;
