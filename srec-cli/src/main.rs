use clap::{Parser, Subcommand};
use srec_cli::{commands, exit_code, to_srec::ToSrecArgs};
use std::process::ExitCode;
use tracing::error;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "srec")]
#[command(about = "srec - Convert between binary images and Motorola S-records", long_about = None)]
#[command(version)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Decode an S-record file into a flat binary image
    ToBin {
        /// Input S-record file
        #[arg(short, long)]
        input: String,

        /// Output binary file (defaults to <input>.bin)
        #[arg(short, long)]
        output: Option<String>,
    },

    /// Encode a binary image as S-records
    ToSrec(ToSrecArgs),

    /// Check every record of an S-record file without writing an image
    Verify {
        /// Input file to verify, or - for stdin
        #[arg(short, long)]
        input: String,

        /// Print the summary as JSON
        #[arg(long)]
        json: bool,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Setup logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    // Execute command
    let result = match cli.command {
        Commands::ToBin { input, output } => {
            commands::to_bin::execute(&input, output.as_deref()).map(drop)
        }
        Commands::ToSrec(args) => commands::to_srec::execute(&args).map(drop),
        Commands::Verify { input, json } => commands::verify::execute(&input, json).map(drop),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{:#}", e);
            ExitCode::from(exit_code(&e) as u8)
        }
    }
}
