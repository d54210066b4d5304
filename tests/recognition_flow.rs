//! End-to-end flow: draw regions over a page, recognize them on the
//! background worker, collect rows into the table, export CSV.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use image::DynamicImage;

use invoscan::document::Page;
use invoscan::editor::RegionEditor;
use invoscan::export;
use invoscan::geometry::Point;
use invoscan::ocr::{OcrBackend, OcrBackendType, OcrError};
use invoscan::recognize::{FieldRegion, RecognitionEvent, Recognizer};
use invoscan::table::ResultsTable;

/// Deterministic engine: names results by call order, optionally stalling
/// the first call so it finishes after later ones.
struct CountingBackend {
    calls: AtomicUsize,
    first_call_delay: Duration,
}

impl CountingBackend {
    fn new(first_call_delay: Duration) -> Self {
        Self {
            calls: AtomicUsize::new(0),
            first_call_delay,
        }
    }
}

impl OcrBackend for CountingBackend {
    fn backend_type(&self) -> OcrBackendType {
        OcrBackendType::Tesseract
    }

    fn is_available(&self) -> bool {
        true
    }

    fn availability_hint(&self) -> String {
        "test backend".to_string()
    }

    fn run_ocr(&self, _image_path: &Path) -> Result<String, OcrError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        if call == 0 && !self.first_call_delay.is_zero() {
            std::thread::sleep(self.first_call_delay);
        }
        Ok(format!("value {}", call + 1))
    }
}

fn page() -> Page {
    Page::from_image(
        DynamicImage::new_rgb8(400, 400),
        PathBuf::from("invoice.png"),
        None,
    )
}

fn draw(editor: &mut RegionEditor, a: (f32, f32), b: (f32, f32)) {
    editor.begin_draw(Point::new(a.0, a.1));
    editor.update_draw(Point::new(b.0, b.1));
    editor.end_draw(Point::new(b.0, b.1));
}

#[tokio::test]
async fn editor_regions_flow_into_exported_table() {
    let page = page();

    // 400x400 page shown in a 200x200 viewport: display input is halved.
    let mut editor = RegionEditor::new(200.0, 200.0);
    editor.load(&page);
    draw(&mut editor, (10.0, 10.0), (90.0, 40.0));
    draw(&mut editor, (10.0, 60.0), (90.0, 90.0));

    let fields: Vec<FieldRegion> = editor
        .scaled_regions(page.width(), page.height())
        .into_iter()
        .enumerate()
        .map(|(i, rect)| FieldRegion {
            name: format!("Region {}", i + 1),
            rect,
        })
        .collect();
    assert_eq!(fields.len(), 2);

    let (recognizer, mut events) = Recognizer::new(Arc::new(CountingBackend::new(Duration::ZERO)));
    recognizer.submit(&page, fields);

    let mut table = ResultsTable::new();
    match events.recv().await.expect("worker event") {
        RecognitionEvent::Completed { fields, .. } => {
            table.push_row(fields.into_iter().map(|f| (f.name, f.text)).collect());
        }
        RecognitionEvent::Failed { error, .. } => panic!("recognition failed: {}", error),
    }

    assert_eq!(table.headers(), &["Region 1", "Region 2"]);
    assert_eq!(table.row_count(), 1);

    let dir = tempfile::TempDir::new().unwrap();
    let out = dir.path().join("extract.csv");
    export::write_csv(&out, &table).unwrap();
    let written = std::fs::read_to_string(&out).unwrap();
    assert!(written.starts_with("Region 1,Region 2\r\n"));
    assert!(written.contains("value"));
}

#[tokio::test]
async fn stale_request_never_overwrites_newer_rows() {
    let page = page();
    let field = FieldRegion {
        name: "Amount".to_string(),
        rect: invoscan::geometry::Rect {
            x1: 0.0,
            y1: 0.0,
            x2: 100.0,
            y2: 100.0,
        },
    };

    // First request stalls in the engine; second finishes immediately.
    let backend = Arc::new(CountingBackend::new(Duration::from_millis(100)));
    let (recognizer, mut events) = Recognizer::new(backend);

    let first = recognizer.submit(&page, vec![field.clone()]);
    let second = recognizer.submit(&page, vec![field]);
    assert!(!recognizer.is_current(first));

    // Apply events as they arrive, the way a UI consumer drains the
    // channel: stale results are dropped, whatever order they land in.
    let mut table = ResultsTable::new();
    let mut applied = Vec::new();
    for _ in 0..2 {
        let event = events.recv().await.expect("worker event");
        if !recognizer.is_current(event.request()) {
            continue;
        }
        if let RecognitionEvent::Completed { request, fields } = event {
            applied.push(request);
            table.push_row(fields.into_iter().map(|f| (f.name, f.text)).collect());
        }
    }

    assert_eq!(applied, vec![second]);
    assert_eq!(table.row_count(), 1);
}
