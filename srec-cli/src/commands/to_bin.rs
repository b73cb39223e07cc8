use crate::default_output;
use anyhow::{Context, Result};
use srec_core::{decode_to_binary, DecodeSummary};
use std::fs::File;
use std::io::{BufReader, BufWriter};
use tracing::{info, warn};

pub fn execute(input: &str, output: Option<&str>) -> Result<DecodeSummary> {
    let output = output.map_or_else(|| default_output(input, "bin"), str::to_owned);
    info!("Converting {} to binary {}", input, output);

    let reader = BufReader::new(
        File::open(input).with_context(|| format!("Failed to open input file: {}", input))?,
    );
    let writer = BufWriter::new(
        File::create(&output)
            .with_context(|| format!("Failed to create output file: {}", output))?,
    );

    // Bytes decoded before a failure stay in the output file
    let summary = decode_to_binary(reader, writer)
        .with_context(|| format!("Failed to decode {}", input))?;

    if !summary.count_matches() {
        warn!(
            "{} declares {:?} data records but contains {}",
            input, summary.declared_count, summary.data_records
        );
    }

    println!("Decoded {} records from {}", summary.records, input);
    println!("Data records:  {}", summary.data_records);
    println!("Image bytes:   {}", summary.bytes_written);
    if let Some(address) = summary.start_address {
        println!("Start address: {:#X}", address);
    }
    println!("Output:        {}", output);

    Ok(summary)
}
