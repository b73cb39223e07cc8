//! Library entry for srec-cli used by integration tests and embedding.

pub mod commands;

use srec_core::SRecordError;
use std::path::Path;

// Re-export commonly used items
pub use crate::commands::{to_bin, to_srec, verify};

/// Parse a load address given in decimal or `0x` hex
pub fn parse_address(value: &str) -> Result<u32, String> {
    let value = value.trim();
    let parsed = match value
        .strip_prefix("0x")
        .or_else(|| value.strip_prefix("0X"))
    {
        Some(digits) => u32::from_str_radix(digits, 16),
        None => value.parse::<u32>(),
    };
    parsed.map_err(|e| format!("invalid address '{}': {}", value, e))
}

/// Output path used when none is given: the input path with `extension`
/// appended
pub fn default_output(input: &str, extension: &str) -> String {
    let mut path = Path::new(input).as_os_str().to_owned();
    path.push(".");
    path.push(extension);
    path.to_string_lossy().into_owned()
}

/// Process exit status for a failed command.
///
/// Conversion failures carry the core status code, truncated to a byte
/// the way the shell reports it. Anything else exits with 1.
pub fn exit_code(error: &anyhow::Error) -> i32 {
    error
        .chain()
        .find_map(|cause| cause.downcast_ref::<SRecordError>())
        .map_or(1, |e| e.code().rem_euclid(256))
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Context;

    #[test]
    fn test_parse_address() {
        assert_eq!(parse_address("0x1000"), Ok(0x1000));
        assert_eq!(parse_address("0XFFFFFFFF"), Ok(0xFFFF_FFFF));
        assert_eq!(parse_address("4096"), Ok(4096));
        assert!(parse_address("0x1_0000_0000").is_err());
        assert!(parse_address("bogus").is_err());
    }

    #[test]
    fn test_default_output() {
        assert_eq!(default_output("image", "s19"), "image.s19");
        assert_eq!(default_output("dir/fw.s28", "bin"), "dir/fw.s28.bin");
    }

    #[test]
    fn test_exit_code() {
        let err = anyhow::Error::from(SRecordError::ChecksumMismatch {
            line: 3,
            expected: 0x10,
            actual: 0x11,
        });
        assert_eq!(exit_code(&err), 11);

        let wrapped = Err::<(), _>(SRecordError::MissingMarker)
            .context("Failed to decode input")
            .unwrap_err();
        assert_eq!(exit_code(&wrapped), 1);

        let io = anyhow::Error::from(SRecordError::SourceIo("gone".into()));
        assert_eq!(exit_code(&io), 255);

        assert_eq!(exit_code(&anyhow::anyhow!("usage")), 1);
    }
}
