//! OCR backend abstraction.

use std::path::{Path, PathBuf};
use std::time::Instant;

use thiserror::Error;

/// Errors from OCR backends.
#[derive(Debug, Error)]
pub enum OcrError {
    #[error("Backend not available: {0}")]
    BackendNotAvailable(String),

    #[error("OCR failed: {0}")]
    OcrFailed(String),

    #[error("Model not found: {0}")]
    ModelNotFound(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result of recognizing one image.
#[derive(Debug, Clone)]
pub struct OcrOutput {
    /// Extracted text content.
    pub text: String,
    /// Which backend produced this result.
    pub backend: OcrBackendType,
    /// Processing time in milliseconds.
    pub processing_time_ms: u64,
}

/// Available OCR backend types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OcrBackendType {
    /// Tesseract OCR via command-line.
    Tesseract,
    /// PaddleOCR via ONNX Runtime.
    PaddleOcr,
}

impl OcrBackendType {
    pub fn as_str(&self) -> &'static str {
        match self {
            OcrBackendType::Tesseract => "tesseract",
            OcrBackendType::PaddleOcr => "paddle",
        }
    }

    pub fn from_name(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "tesseract" => Some(OcrBackendType::Tesseract),
            "paddle" | "paddleocr" => Some(OcrBackendType::PaddleOcr),
            _ => None,
        }
    }
}

impl std::fmt::Display for OcrBackendType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Engine configuration shared by backends.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Language for OCR (e.g., "eng", "chi_sim").
    pub language: String,
    /// Path to model files (for backends that need them).
    pub model_path: Option<PathBuf>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            language: "eng".to_string(),
            model_path: None,
        }
    }
}

/// Trait for OCR backends.
pub trait OcrBackend: Send + Sync {
    /// Get the backend type.
    fn backend_type(&self) -> OcrBackendType;

    /// Check if this backend is available (dependencies installed, models
    /// present).
    fn is_available(&self) -> bool;

    /// Get a description of what's needed to make this backend available.
    fn availability_hint(&self) -> String;

    /// Core OCR: extract text from an image file.
    fn run_ocr(&self, image_path: &Path) -> Result<String, OcrError>;

    /// Run OCR on an image file, returning a timed result.
    fn recognize(&self, image_path: &Path) -> Result<OcrOutput, OcrError> {
        let start = Instant::now();
        let text = self.run_ocr(image_path)?;
        Ok(OcrOutput {
            text,
            backend: self.backend_type(),
            processing_time_ms: start.elapsed().as_millis() as u64,
        })
    }
}

/// Construct the backend for a type, or explain why it can't be built.
pub fn backend_for(
    backend_type: OcrBackendType,
    config: EngineConfig,
) -> Result<Box<dyn OcrBackend>, OcrError> {
    match backend_type {
        OcrBackendType::Tesseract => Ok(Box::new(super::TesseractBackend::with_config(config))),
        #[cfg(feature = "ocr-paddle")]
        OcrBackendType::PaddleOcr => Ok(Box::new(super::PaddleBackend::with_config(config))),
        #[cfg(not(feature = "ocr-paddle"))]
        OcrBackendType::PaddleOcr => Err(OcrError::BackendNotAvailable(
            "built without the ocr-paddle feature".to_string(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_type_names() {
        assert_eq!(OcrBackendType::from_name("tesseract"), Some(OcrBackendType::Tesseract));
        assert_eq!(OcrBackendType::from_name("PaddleOCR"), Some(OcrBackendType::PaddleOcr));
        assert_eq!(OcrBackendType::from_name("unknown"), None);
        assert_eq!(OcrBackendType::Tesseract.to_string(), "tesseract");
    }
}
