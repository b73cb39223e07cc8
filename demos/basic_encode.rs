//! Basic encoding example

use srec_core::{encode_to_srecord, EncoderConfig};
use std::fs::File;
use std::io::BufWriter;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("S-record Basic Encoding Example\n");

    // A small "firmware" image: a vector table followed by some code bytes
    let mut image = Vec::new();
    for i in 0u32..16 {
        image.extend_from_slice(&(0x0800_0100 + i * 4).to_le_bytes());
    }
    image.extend_from_slice(b"\x00\xBF\x70\x47 hello from flash");

    let config = EncoderConfig::builder(0x0800_0000)
        .address_bits(32)
        .chunk_size(21)
        .header_text("basic_encode")
        .with_count_record()
        .build()?;

    println!("Image size:       {} bytes", image.len());
    println!("Payload per line: {} bytes", config.payload_len());

    let output = BufWriter::new(File::create("example_output.s37")?);
    let summary = encode_to_srecord(&config, &image[..], output)?;

    println!("Data records:     {}", summary.data_records);
    println!("Count record:     {:?}", summary.count_record);
    println!("Final address:    {:#010X}", summary.final_address);
    println!("\nWrote {} bytes to example_output.s37", summary.output_bytes);
    println!("Use 'srec to-bin --input example_output.s37' to read it back");

    Ok(())
}
