//! Example showing how the decoder reacts to a damaged S-record file

use rand::Rng;
use srec_core::{decode_to_binary, encoder::encode_to_vec, status_code, EncoderConfig};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("S-record Corrupted Decode Example\n");

    // Step 1: Encode a clean image
    let image: Vec<u8> = (0..256u32).map(|i| (i * 13) as u8).collect();
    let config = EncoderConfig::builder(0x1000).address_bits(16).build()?;
    let mut text = encode_to_vec(&config, &image)?;
    println!("Step 1: Encoded {} bytes into {} bytes of text", image.len(), text.len());

    // Step 2: Damage one hex digit somewhere after the header
    let mut rng = rand::thread_rng();
    let header_len = text.iter().position(|&b| b == b'\n').map_or(0, |p| p + 1);
    let pos = loop {
        let pos = rng.gen_range(header_len..text.len());
        // Leave the type digit alone so the damage lands in a checksummed field
        if text[pos].is_ascii_hexdigit() && text[pos - 1] != b'S' {
            break pos;
        }
    };
    let original = text[pos];
    text[pos] = if original == b'0' { b'1' } else { b'0' };
    println!(
        "Step 2: Changed {:?} to {:?} at offset {}",
        original as char, text[pos] as char, pos
    );

    // Step 3: Decode and report
    let mut recovered = Vec::new();
    let result = decode_to_binary(&text[..], &mut recovered);

    println!("\nStep 3: Decode status {}", status_code(&result));
    match result {
        Ok(summary) => println!("Unexpectedly clean: {} data records", summary.data_records),
        Err(e) => println!("Rejected: {}", e),
    }
    println!(
        "Bytes written before the failure: {} of {}",
        recovered.len(),
        image.len()
    );
    assert_eq!(&recovered[..], &image[..recovered.len()]);

    Ok(())
}
