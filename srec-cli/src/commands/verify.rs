use anyhow::{Context, Result};
use colored::*;
use serde::Serialize;
use srec_core::{decode_to_binary, DecodeSummary};
use std::fs::File;
use std::io::{self, BufReader, Read};
use tracing::{info, warn};

#[derive(Serialize)]
struct VerifyReport<'a> {
    input: &'a str,
    count_matches: bool,
    #[serde(flatten)]
    summary: &'a DecodeSummary,
}

pub fn execute(input: &str, json: bool) -> Result<DecodeSummary> {
    info!("Verifying file: {}", input);

    // Read input file or stdin
    let reader: Box<dyn Read> = if input == "-" {
        Box::new(io::stdin().lock())
    } else {
        Box::new(BufReader::new(
            File::open(input).with_context(|| format!("Failed to read input file: {}", input))?,
        ))
    };

    let summary = match decode_to_binary(reader, io::sink()) {
        Ok(summary) => summary,
        Err(e) => {
            if !json {
                println!("{} {}: {}", "✗".red(), input, e);
            }
            return Err(e).with_context(|| format!("Failed to verify {}", input));
        }
    };

    if json {
        let report = VerifyReport {
            input,
            count_matches: summary.count_matches(),
            summary: &summary,
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(summary);
    }

    println!("\n=== Verification Results ===");
    println!("Records:            {}", summary.records);
    println!("Data records:       {}", summary.data_records);
    println!("Image bytes:        {}", summary.bytes_written);
    if let Some(header) = &summary.header {
        println!("Header:             {:?}", header.trim_end_matches('\0'));
    }
    if let Some(address) = summary.start_address {
        println!("Start address:      {:#X}", address);
    }

    println!("\n=== Summary ===");
    if summary.count_matches() {
        println!("{} All records valid", "✓".green());
    } else {
        warn!(
            "Count record declares {:?} data records",
            summary.declared_count
        );
        println!(
            "{} Records valid but the count record does not match",
            "!".yellow()
        );
    }

    Ok(summary)
}
