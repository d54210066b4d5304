//! Background recognition over page regions.
//!
//! OCR calls are long-running and blocking, so each request runs on a
//! blocking worker; completion is delivered back to the submitting task
//! over a channel, never by touching shared UI state from the worker.
//!
//! Every request is tagged with a monotonically increasing [`RequestId`]
//! and the service remembers the latest one issued. Two overlapping
//! requests may complete in either order; the consumer checks
//! [`Recognizer::is_current`] so a late result from a superseded request
//! is discarded instead of overwriting newer rows.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use image::DynamicImage;
use tempfile::TempDir;
use tokio::sync::mpsc;

use crate::document::{crop_clamped, Page};
use crate::geometry::Rect;
use crate::ocr::{OcrBackend, OcrError};

/// Minimum region size, in source pixels, for a field to be worth
/// recognizing.
const MIN_FIELD_PX: f32 = 5.0;

/// Monotonic identifier for a recognition request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RequestId(u64);

/// A named region to recognize, in source-image coordinates.
#[derive(Debug, Clone)]
pub struct FieldRegion {
    pub name: String,
    pub rect: Rect,
}

/// One recognized field: its name and the extracted text. Per-field engine
/// errors land here as text, they never abort the request.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldText {
    pub name: String,
    pub text: String,
}

/// Completion event delivered to the submitting task.
#[derive(Debug)]
pub enum RecognitionEvent {
    Completed {
        request: RequestId,
        fields: Vec<FieldText>,
    },
    Failed {
        request: RequestId,
        error: String,
    },
}

impl RecognitionEvent {
    pub fn request(&self) -> RequestId {
        match self {
            RecognitionEvent::Completed { request, .. } => *request,
            RecognitionEvent::Failed { request, .. } => *request,
        }
    }
}

/// Submits recognition requests to blocking workers and hands back tagged
/// completion events.
pub struct Recognizer {
    backend: Arc<dyn OcrBackend>,
    events: mpsc::UnboundedSender<RecognitionEvent>,
    next_id: AtomicU64,
    latest: AtomicU64,
}

impl Recognizer {
    /// Create a recognizer. Events for every submitted request arrive on
    /// the returned receiver in completion order, which is not submission
    /// order when requests overlap.
    pub fn new(backend: Arc<dyn OcrBackend>) -> (Self, mpsc::UnboundedReceiver<RecognitionEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (
            Self {
                backend,
                events: tx,
                next_id: AtomicU64::new(0),
                latest: AtomicU64::new(0),
            },
            rx,
        )
    }

    /// Submit one page's regions for recognition. Returns immediately with
    /// the request tag; the page raster is copied so later edits don't
    /// affect the in-flight request.
    pub fn submit(&self, page: &Page, fields: Vec<FieldRegion>) -> RequestId {
        let id = RequestId(self.next_id.fetch_add(1, Ordering::SeqCst) + 1);
        self.latest.store(id.0, Ordering::SeqCst);

        let backend = Arc::clone(&self.backend);
        let image = page.image().clone();
        let events = self.events.clone();

        tokio::task::spawn_blocking(move || {
            let event = match run_request(backend.as_ref(), &image, &fields) {
                Ok(fields) => RecognitionEvent::Completed {
                    request: id,
                    fields,
                },
                Err(e) => RecognitionEvent::Failed {
                    request: id,
                    error: e.to_string(),
                },
            };
            // Receiver may be gone if the host shut down mid-request.
            let _ = events.send(event);
        });

        id
    }

    /// Whether `id` is the most recently submitted request. Consumers use
    /// this to drop results that were superseded while in flight.
    pub fn is_current(&self, id: RequestId) -> bool {
        self.latest.load(Ordering::SeqCst) == id.0
    }
}

/// Recognize each field region of one page image. Fails only on setup
/// errors; per-field problems become the field's text.
fn run_request(
    backend: &dyn OcrBackend,
    image: &DynamicImage,
    fields: &[FieldRegion],
) -> Result<Vec<FieldText>, OcrError> {
    let temp_dir = TempDir::new()?;
    let mut results = Vec::with_capacity(fields.len());

    for (i, field) in fields.iter().enumerate() {
        if field.rect.width() < MIN_FIELD_PX || field.rect.height() < MIN_FIELD_PX {
            results.push(FieldText {
                name: field.name.clone(),
                text: "invalid region".to_string(),
            });
            continue;
        }

        let crop = crop_clamped(image, &field.rect);
        let crop_path = temp_dir.path().join(format!("region-{}.png", i + 1));
        if let Err(e) = crop.to_rgb8().save(&crop_path) {
            results.push(FieldText {
                name: field.name.clone(),
                text: format!("crop failed: {}", e),
            });
            continue;
        }

        let text = match backend.recognize(&crop_path) {
            Ok(output) => {
                tracing::debug!(
                    field = %field.name,
                    backend = %output.backend,
                    ms = output.processing_time_ms,
                    "field recognized"
                );
                output.text.trim().to_string()
            }
            Err(e) => {
                tracing::warn!(field = %field.name, %e, "field recognition failed");
                format!("recognition error: {}", e)
            }
        };
        results.push(FieldText {
            name: field.name.clone(),
            text,
        });
    }

    Ok(results)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Point;
    use crate::ocr::OcrBackendType;
    use std::path::{Path, PathBuf};
    use std::sync::atomic::AtomicUsize;
    use std::time::Duration;

    /// Backend that returns a counter per call; the first call can be
    /// delayed to force out-of-order completion.
    struct ScriptedBackend {
        calls: AtomicUsize,
        first_call_delay: Duration,
        fail: bool,
    }

    impl ScriptedBackend {
        fn new() -> Self {
            Self {
                calls: AtomicUsize::new(0),
                first_call_delay: Duration::ZERO,
                fail: false,
            }
        }

        fn slow_first(delay: Duration) -> Self {
            Self {
                first_call_delay: delay,
                ..Self::new()
            }
        }

        fn failing() -> Self {
            Self {
                fail: true,
                ..Self::new()
            }
        }
    }

    impl OcrBackend for ScriptedBackend {
        fn backend_type(&self) -> OcrBackendType {
            OcrBackendType::Tesseract
        }

        fn is_available(&self) -> bool {
            true
        }

        fn availability_hint(&self) -> String {
            "scripted".to_string()
        }

        fn run_ocr(&self, _image_path: &Path) -> Result<String, OcrError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if call == 0 && !self.first_call_delay.is_zero() {
                std::thread::sleep(self.first_call_delay);
            }
            if self.fail {
                return Err(OcrError::OcrFailed("scripted failure".to_string()));
            }
            Ok(format!("text-{}", call + 1))
        }
    }

    fn page() -> Page {
        Page::from_image(
            DynamicImage::new_rgb8(200, 200),
            PathBuf::from("page.png"),
            None,
        )
    }

    fn field(name: &str, a: (f32, f32), b: (f32, f32)) -> FieldRegion {
        FieldRegion {
            name: name.to_string(),
            rect: Rect::from_corners(Point::new(a.0, a.1), Point::new(b.0, b.1)),
        }
    }

    #[tokio::test]
    async fn test_completed_event_carries_field_names() {
        let (recognizer, mut events) = Recognizer::new(Arc::new(ScriptedBackend::new()));
        let id = recognizer.submit(
            &page(),
            vec![
                field("Region 1", (0.0, 0.0), (50.0, 50.0)),
                field("Region 2", (60.0, 0.0), (120.0, 50.0)),
            ],
        );

        match events.recv().await.unwrap() {
            RecognitionEvent::Completed { request, fields } => {
                assert_eq!(request, id);
                assert_eq!(fields.len(), 2);
                assert_eq!(fields[0].name, "Region 1");
                assert!(fields[0].text.starts_with("text-"));
            }
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_degenerate_region_becomes_invalid_cell() {
        let (recognizer, mut events) = Recognizer::new(Arc::new(ScriptedBackend::new()));
        recognizer.submit(&page(), vec![field("Tiny", (0.0, 0.0), (2.0, 2.0))]);

        match events.recv().await.unwrap() {
            RecognitionEvent::Completed { fields, .. } => {
                assert_eq!(fields[0].text, "invalid region");
            }
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_engine_error_becomes_cell_text() {
        let (recognizer, mut events) = Recognizer::new(Arc::new(ScriptedBackend::failing()));
        recognizer.submit(&page(), vec![field("Amount", (0.0, 0.0), (50.0, 50.0))]);

        match events.recv().await.unwrap() {
            RecognitionEvent::Completed { fields, .. } => {
                assert!(fields[0].text.starts_with("recognition error:"));
            }
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_stale_result_is_detectable() {
        let backend = Arc::new(ScriptedBackend::slow_first(Duration::from_millis(80)));
        let (recognizer, mut events) = Recognizer::new(backend);

        let first = recognizer.submit(&page(), vec![field("A", (0.0, 0.0), (50.0, 50.0))]);
        let second = recognizer.submit(&page(), vec![field("A", (0.0, 0.0), (50.0, 50.0))]);

        assert!(!recognizer.is_current(first));
        assert!(recognizer.is_current(second));

        // Both events arrive; only the second survives the staleness check,
        // regardless of completion order.
        let mut applied = Vec::new();
        for _ in 0..2 {
            let event = events.recv().await.unwrap();
            if recognizer.is_current(event.request()) {
                applied.push(event.request());
            }
        }
        assert_eq!(applied, vec![second]);
    }
}
