//! Input/output helpers for the command-line front end.
//!
//! The parser core never touches storage; these helpers read the raw
//! text (from a file or standard input) and guard output paths before
//! anything is written.

use std::fs;
use std::io::Read;
use std::path::Path;

use crate::error::TabError;

/// Conventional argument meaning standard input or output.
pub const STDIO_SENTINEL: &str = "-";

/// Read the whole input, from standard input when the sentinel is
/// given, otherwise from the named file.
pub fn read_data(input: &str) -> Result<String, TabError> {
    if input == STDIO_SENTINEL {
        let mut data = String::new();
        std::io::stdin().read_to_string(&mut data)?;
        Ok(data)
    } else {
        Ok(fs::read_to_string(input)?)
    }
}

/// Check that a named input exists before parsing starts.
pub fn validate_input(input: &str) -> Result<(), TabError> {
    if input == STDIO_SENTINEL || Path::new(input).exists() {
        Ok(())
    } else {
        Err(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("File {input} does not exist."),
        )
        .into())
    }
}

/// Refuse to clobber an existing output file unless overwriting was
/// requested.
pub fn validate_output(output: &str, overwrite: bool) -> Result<(), TabError> {
    if output == STDIO_SENTINEL || !Path::new(output).exists() {
        return Ok(());
    }
    if overwrite {
        log::warn!("Overwriting {output}.");
        Ok(())
    } else {
        Err(std::io::Error::new(
            std::io::ErrorKind::AlreadyExists,
            format!("File {output} exists and not overwriting."),
        )
        .into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stdio_sentinel_is_always_valid() {
        assert!(validate_input("-").is_ok());
        assert!(validate_output("-", false).is_ok());
    }

    #[test]
    fn test_missing_input_is_an_error() {
        let result = validate_input("/no/such/file.tc");
        assert!(matches!(result, Err(TabError::Io(_))));
    }

    #[test]
    fn test_missing_output_is_fine() {
        assert!(validate_output("/no/such/file.json", false).is_ok());
    }

    #[test]
    fn test_existing_output_requires_overwrite() {
        let path = std::env::temp_dir().join("parsetab-io-test.json");
        fs::write(&path, "{}").unwrap();
        let path = path.to_string_lossy().into_owned();
        assert!(matches!(
            validate_output(&path, false),
            Err(TabError::Io(_))
        ));
        assert!(validate_output(&path, true).is_ok());
        let _ = fs::remove_file(&path);
    }
}
