//! Fuzz entry points for srec-core
//!
//! Both functions take arbitrary bytes and must never panic; they are meant
//! to be called from a cargo-fuzz target or any other harness.

use srec_core::{
    decoder::{decode_to_vec, RecordDecoder},
    encoder::encode_to_vec,
    AddressWidth, EncoderConfig,
};

pub fn fuzz_decode(data: &[u8]) {
    // Try to decode - should never panic
    let _ = decode_to_vec(data);

    for record in RecordDecoder::from_bytes(data) {
        if record.is_err() {
            break;
        }
    }
}

/// Use the first bytes as encoder settings and the rest as the image;
/// whatever encodes must decode back to the same image
pub fn fuzz_round_trip(data: &[u8]) {
    let Some((&selector, image)) = data.split_first() else {
        return;
    };

    let address_width = match selector % 3 {
        0 => AddressWidth::Bits16,
        1 => AddressWidth::Bits24,
        _ => AddressWidth::Bits32,
    };
    let chunk_size = (address_width.size() as u8 + 2) + (selector >> 2) % 27;

    let config = EncoderConfig {
        start: 0,
        address_width,
        chunk_size: chunk_size.min(32),
        emit_count_record: selector & 0x80 != 0,
        ..Default::default()
    };

    let Ok(text) = encode_to_vec(&config, image) else {
        return;
    };
    match decode_to_vec(&text) {
        Ok(decoded) => assert_eq!(decoded, image, "round trip changed the image"),
        Err(e) => panic!("encoder output failed to decode: {}", e),
    }
}
