use crate::{default_output, parse_address};
use anyhow::{Context, Result};
use clap::Args;
use srec_core::{encode_to_srecord, encoder::header_record, AddressWidth, EncodeSummary, EncoderConfig};
use std::fs::{self, File};
use std::io::BufReader;
use tracing::{debug, info};

/// Options for binary to S-record conversion
#[derive(Args, Debug, Clone, Default)]
pub struct ToSrecArgs {
    /// Input binary image
    #[arg(short, long)]
    pub input: String,

    /// Output S-record file (defaults to <input>.s19)
    #[arg(short, long)]
    pub output: Option<String>,

    /// Load address of the first byte (decimal or 0x hex)
    #[arg(long, value_parser = parse_address)]
    pub start: Option<u32>,

    /// Address width in bits: 16, 24 or 32
    #[arg(long)]
    pub bits: Option<u32>,

    /// Bytes per data line counting address and checksum (at most 32)
    #[arg(long)]
    pub chunk_size: Option<u8>,

    /// Text for a synthesized S0 header
    #[arg(long, conflicts_with = "header_line")]
    pub header: Option<String>,

    /// Pre-formatted header line, written verbatim
    #[arg(long)]
    pub header_line: Option<String>,

    /// Pre-formatted terminator line, written verbatim
    #[arg(long)]
    pub tail_line: Option<String>,

    /// Write an S5/S6 count record
    #[arg(long)]
    pub count: bool,

    /// Leave the terminator address at the end of the last full line
    #[arg(long)]
    pub legacy_remainder: bool,

    /// JSON file with encoder settings; flags override its values
    #[arg(long)]
    pub config: Option<String>,
}

/// Merge the config file (if any) with explicit flags
pub fn resolve_config(args: &ToSrecArgs) -> Result<EncoderConfig> {
    let mut config = match &args.config {
        Some(path) => {
            let content = fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file: {}", path))?;
            serde_json::from_str::<EncoderConfig>(&content)
                .with_context(|| format!("Failed to parse config file: {}", path))?
        }
        None => EncoderConfig::default(),
    };

    if let Some(start) = args.start {
        config.start = start;
    }
    if let Some(bits) = args.bits {
        config.address_width = AddressWidth::from_bits(bits)?;
    }
    if let Some(chunk_size) = args.chunk_size {
        config.chunk_size = chunk_size;
    }
    if let Some(text) = &args.header {
        let line = header_record(text)?;
        config.header = Some(String::from_utf8_lossy(&line).into_owned());
    }
    if let Some(line) = &args.header_line {
        config.header = Some(line.clone());
    }
    if let Some(line) = &args.tail_line {
        config.tail = Some(line.clone());
    }
    if args.count {
        config.emit_count_record = true;
    }
    if args.legacy_remainder {
        config.advance_address_on_remainder = false;
    }

    config.validate()?;
    debug!("Encoder config: {:?}", config);
    Ok(config)
}

pub fn execute(args: &ToSrecArgs) -> Result<EncodeSummary> {
    let config = resolve_config(args)?;
    let output = args
        .output
        .clone()
        .unwrap_or_else(|| default_output(&args.input, "s19"));

    info!(
        "Converting {} to S-records {} at {:#X} ({}-bit)",
        args.input,
        output,
        config.start,
        config.address_width.bits()
    );

    let reader = BufReader::new(
        File::open(&args.input)
            .with_context(|| format!("Failed to open input file: {}", args.input))?,
    );
    let writer = File::create(&output)
        .with_context(|| format!("Failed to create output file: {}", output))?;

    let summary = encode_to_srecord(&config, reader, writer)
        .with_context(|| format!("Failed to encode {}", args.input))?;

    println!("Encoded {} bytes from {}", summary.input_bytes, args.input);
    println!("Data records:  {}", summary.data_records);
    if let Some(record_type) = summary.count_record {
        println!("Count record:  {}", record_type);
    }
    println!("Final address: {:#X}", summary.final_address);
    println!("Output:        {} ({} bytes)", output, summary.output_bytes);

    Ok(summary)
}
