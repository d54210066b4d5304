//! File loaders: plain images and pdftoppm-rendered PDFs.

use std::path::{Path, PathBuf};
use std::process::Command;

use tempfile::TempDir;

use super::{DocumentError, Page};

/// A file that could not be loaded. Other files in the same batch still
/// load normally.
#[derive(Debug)]
pub struct LoadFailure {
    pub path: PathBuf,
    pub error: DocumentError,
}

/// Load every path into an ordered page list, capturing per-file failures
/// instead of aborting the batch.
pub fn load_paths(paths: &[PathBuf], pdf_dpi: u32) -> (Vec<Page>, Vec<LoadFailure>) {
    let mut pages = Vec::new();
    let mut failures = Vec::new();
    for path in paths {
        match load_path(path, pdf_dpi) {
            Ok(mut loaded) => pages.append(&mut loaded),
            Err(error) => {
                tracing::warn!(path = %path.display(), %error, "failed to load file");
                failures.push(LoadFailure {
                    path: path.clone(),
                    error,
                });
            }
        }
    }
    (pages, failures)
}

/// Load one file into pages.
pub fn load_path(path: &Path, pdf_dpi: u32) -> Result<Vec<Page>, DocumentError> {
    let ext = path
        .extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .unwrap_or_default();

    match ext.as_str() {
        "pdf" => render_pdf(path, pdf_dpi),
        "png" | "jpg" | "jpeg" | "tif" | "tiff" | "bmp" | "gif" => {
            let image = image::open(path)?;
            Ok(vec![Page::from_image(image, path.to_path_buf(), None)])
        }
        other => Err(DocumentError::UnsupportedFileType(other.to_string())),
    }
}

/// Rasterize a PDF into one page image per page using pdftoppm.
fn render_pdf(path: &Path, dpi: u32) -> Result<Vec<Page>, DocumentError> {
    let temp_dir = TempDir::new()?;
    let temp_path = temp_dir.path();

    let status = Command::new("pdftoppm")
        .args(["-png", "-r", &dpi.to_string()])
        .arg(path)
        .arg(temp_path.join("page"))
        .status();

    match status {
        Ok(s) if s.success() => {}
        Ok(_) => {
            return Err(DocumentError::RenderFailed(format!(
                "pdftoppm failed on {}",
                path.display()
            )))
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(DocumentError::ToolNotFound(
                "pdftoppm (install poppler-utils)".to_string(),
            ))
        }
        Err(e) => return Err(DocumentError::Io(e)),
    }

    // pdftoppm names output page-01.png, page-02.png, ... (digit width
    // depends on the page count); lexicographic order is page order.
    let mut images: Vec<PathBuf> = std::fs::read_dir(temp_path)?
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| p.extension().map(|ext| ext == "png").unwrap_or(false))
        .collect();
    images.sort();

    if images.is_empty() {
        return Err(DocumentError::RenderFailed(format!(
            "no pages generated from {}",
            path.display()
        )));
    }

    let mut pages = Vec::with_capacity(images.len());
    for (i, image_path) in images.iter().enumerate() {
        let image = image::open(image_path)?;
        pages.push(Page::from_image(
            image,
            path.to_path_buf(),
            Some(i as u32 + 1),
        ));
    }
    Ok(pages)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unsupported_extension() {
        let err = load_path(Path::new("notes.docx"), 300).unwrap_err();
        assert!(matches!(err, DocumentError::UnsupportedFileType(ref e) if e == "docx"));
    }

    #[test]
    fn test_load_paths_captures_failures() {
        let (pages, failures) = load_paths(
            &[PathBuf::from("missing.png"), PathBuf::from("missing.docx")],
            300,
        );
        assert!(pages.is_empty());
        assert_eq!(failures.len(), 2);
    }

    #[test]
    fn test_load_roundtrip_png() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("sample.png");
        image::DynamicImage::new_rgb8(40, 30).save(&path).unwrap();

        let pages = load_path(&path, 300).unwrap();
        assert_eq!(pages.len(), 1);
        assert_eq!(pages[0].width(), 40);
        assert_eq!(pages[0].height(), 30);
        assert_eq!(pages[0].page_number(), None);
    }
}
