//! PaddleOCR backend via ONNX Runtime.
//!
//! Uses paddle-ocr-rs with PP-OCRv4 detection/recognition models located
//! on disk (no network fetch); see `availability_hint` for the expected
//! locations.

use std::path::PathBuf;
use std::sync::{Mutex, OnceLock};

use paddle_ocr_rs::ocr_lite::OcrLite;

use super::backend::{EngineConfig, OcrBackend, OcrBackendType, OcrError};

/// Global cached OcrLite instance (initialized once, reused for all OCR
/// calls). detect_from_path needs &mut self, hence the Mutex.
static OCR_ENGINE: OnceLock<Mutex<OcrLite>> = OnceLock::new();

const DET_MODEL_NAME: &str = "ch_PP-OCRv4_det_infer.onnx";
const REC_MODEL_NAME: &str = "ch_PP-OCRv4_rec_infer.onnx";
const CLS_MODEL_NAME: &str = "ch_ppocr_mobile_v2.0_cls_infer.onnx";

/// PaddleOCR backend.
pub struct PaddleBackend {
    config: EngineConfig,
}

impl PaddleBackend {
    /// Create a new PaddleOCR backend with default configuration.
    pub fn new() -> Self {
        Self {
            config: EngineConfig::default(),
        }
    }

    /// Create a new PaddleOCR backend with custom configuration.
    pub fn with_config(config: EngineConfig) -> Self {
        Self { config }
    }

    /// Standard candidate directories to search for models.
    fn candidate_dirs(&self) -> Vec<PathBuf> {
        let mut dirs_list = Vec::new();
        if let Some(ref path) = self.config.model_path {
            dirs_list.push(path.clone());
        }
        if let Some(d) = dirs::data_dir() {
            dirs_list.push(d.join("invoscan").join("models"));
        }
        if let Some(d) = dirs::home_dir() {
            dirs_list.push(d.join(".invoscan").join("models"));
        }
        dirs_list.push(PathBuf::from("./models"));
        dirs_list
    }

    /// Find a directory containing the required model files.
    fn find_model_dir(&self) -> Option<PathBuf> {
        self.candidate_dirs().into_iter().find(|dir| {
            dir.join(DET_MODEL_NAME).exists() && dir.join(REC_MODEL_NAME).exists()
        })
    }

    /// Get or initialize the cached OCR engine.
    fn get_or_init_engine(&self) -> Result<&'static Mutex<OcrLite>, OcrError> {
        if let Some(engine) = OCR_ENGINE.get() {
            return Ok(engine);
        }

        let model_dir = self.find_model_dir().ok_or_else(|| {
            OcrError::ModelNotFound(
                "PaddleOCR model files not found in any model directory".to_string(),
            )
        })?;

        let det = model_dir.join(DET_MODEL_NAME);
        let cls = model_dir.join(CLS_MODEL_NAME);
        let rec = model_dir.join(REC_MODEL_NAME);

        let mut ocr = OcrLite::new();
        let num_threads = 4;
        ocr.init_models(
            &det.to_string_lossy(),
            &cls.to_string_lossy(),
            &rec.to_string_lossy(),
            num_threads,
        )
        .map_err(|e| OcrError::OcrFailed(format!("Failed to init PaddleOCR: {}", e)))?;

        // If another thread beat us to it, use theirs.
        let _ = OCR_ENGINE.set(Mutex::new(ocr));
        OCR_ENGINE
            .get()
            .ok_or_else(|| OcrError::OcrFailed("Failed to cache OCR engine".to_string()))
    }
}

impl Default for PaddleBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl OcrBackend for PaddleBackend {
    fn backend_type(&self) -> OcrBackendType {
        OcrBackendType::PaddleOcr
    }

    fn is_available(&self) -> bool {
        self.find_model_dir().is_some()
    }

    fn availability_hint(&self) -> String {
        match self.find_model_dir() {
            Some(path) => format!("PaddleOCR models found at {:?}", path),
            None => format!(
                "PaddleOCR models ({}, {}) not found; place them in one of {:?}",
                DET_MODEL_NAME,
                REC_MODEL_NAME,
                self.candidate_dirs()
            ),
        }
    }

    fn run_ocr(&self, image_path: &std::path::Path) -> Result<String, OcrError> {
        let engine_mutex = self.get_or_init_engine()?;
        let mut ocr = engine_mutex
            .lock()
            .map_err(|e| OcrError::OcrFailed(format!("Failed to lock OCR engine: {}", e)))?;

        let result = ocr
            .detect_from_path(
                image_path.to_str().unwrap_or(""),
                50,    // padding
                1024,  // max side length
                0.5,   // box score threshold
                0.3,   // unclip ratio
                1.6,   // box threshold
                false, // do angle
                false, // most angle
            )
            .map_err(|e| OcrError::OcrFailed(format!("PaddleOCR detection failed: {}", e)))?;

        let texts: Vec<String> = result
            .text_blocks
            .iter()
            .map(|block| block.text.clone())
            .collect();

        Ok(texts.join("\n"))
    }
}
