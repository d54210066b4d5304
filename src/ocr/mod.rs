//! OCR engine boundary.
//!
//! Recognition is delegated entirely to external engines behind the
//! [`OcrBackend`] trait:
//! - Tesseract via command-line (default)
//! - PaddleOCR via ONNX Runtime (feature: ocr-paddle)
//!
//! Engine errors are reported as strings to the caller, not parsed.

mod backend;
mod tesseract;

#[cfg(feature = "ocr-paddle")]
mod paddle;

pub use backend::{backend_for, EngineConfig, OcrBackend, OcrBackendType, OcrError, OcrOutput};
pub use tesseract::TesseractBackend;

#[cfg(feature = "ocr-paddle")]
pub use paddle::PaddleBackend;

use std::process::Command;

/// Check if a binary is available in PATH.
pub fn check_binary(name: &str) -> bool {
    Command::new("which")
        .arg(name)
        .output()
        .map(|o| o.status.success())
        .unwrap_or(false)
}

/// Availability of the external tools the pipeline shells out to.
pub fn check_tools() -> Vec<(String, bool)> {
    ["tesseract", "pdftoppm"]
        .iter()
        .map(|tool| (tool.to_string(), check_binary(tool)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_tools() {
        let tools = check_tools();
        assert_eq!(tools.len(), 2);
        for (tool, available) in tools {
            println!("{}: {}", tool, if available { "found" } else { "missing" });
        }
    }
}
