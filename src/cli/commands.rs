//! CLI commands implementation.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::{Parser, Subcommand};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use tokio::sync::Mutex;

use crate::config::Settings;
use crate::document;
use crate::export;
use crate::flatten::flatten_tree;
use crate::ocr::{self, backend_for, EngineConfig, OcrBackendType};
use crate::recognize::{RecognitionEvent, Recognizer, RequestId};
use crate::table::ResultsTable;
use crate::template::RegionTemplate;

#[derive(Parser)]
#[command(name = "invoscan")]
#[command(about = "Region-based OCR extraction for scanned invoices and forms")]
#[command(version)]
pub struct Cli {
    /// Config file path
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Check if verbose mode is enabled (for early logging setup).
pub fn is_verbose() -> bool {
    std::env::args().any(|arg| arg == "-v" || arg == "--verbose")
}

#[derive(Subcommand)]
enum Commands {
    /// Recognize template regions across documents and export a spreadsheet
    Scan {
        /// Image or PDF files to process
        files: Vec<PathBuf>,
        /// Region template file (TOML)
        #[arg(short, long)]
        template: PathBuf,
        /// Output spreadsheet path (default: derived from the first input)
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// OCR language (overrides config)
        #[arg(long)]
        language: Option<String>,
        /// OCR backend: tesseract or paddle (overrides config)
        #[arg(long)]
        backend: Option<String>,
        /// PDF render resolution in DPI (overrides config)
        #[arg(long)]
        dpi: Option<u32>,
        /// Limit number of pages to process (0 = unlimited)
        #[arg(short, long, default_value = "0")]
        limit: usize,
    },

    /// Write a starter region template
    Template {
        /// Where to write the template
        #[arg(default_value = "template.toml")]
        path: PathBuf,
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Move every file in a folder tree into a single directory
    Flatten {
        /// Source folder to flatten
        source: PathBuf,
        /// Destination directory
        dest: PathBuf,
    },

    /// Check availability of external tools
    Tools,
}

pub async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let settings = Settings::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Scan {
            files,
            template,
            output,
            language,
            backend,
            dpi,
            limit,
        } => {
            cmd_scan(
                settings, files, template, output, language, backend, dpi, limit,
            )
            .await
        }
        Commands::Template { path, force } => cmd_template(path, force),
        Commands::Flatten { source, dest } => cmd_flatten(source, dest),
        Commands::Tools => cmd_tools(),
    }
}

#[allow(clippy::too_many_arguments)]
async fn cmd_scan(
    settings: Settings,
    files: Vec<PathBuf>,
    template_path: PathBuf,
    output: Option<PathBuf>,
    language: Option<String>,
    backend: Option<String>,
    dpi: Option<u32>,
    limit: usize,
) -> anyhow::Result<()> {
    anyhow::ensure!(!files.is_empty(), "no input files given");

    let template = RegionTemplate::load(&template_path)
        .with_context(|| format!("failed to load template {}", template_path.display()))?;
    anyhow::ensure!(!template.fields.is_empty(), "template has no fields");

    let backend_name = backend.unwrap_or_else(|| settings.backend.clone());
    let backend_type = OcrBackendType::from_name(&backend_name)
        .with_context(|| format!("unknown OCR backend '{}'", backend_name))?;
    let engine_config = EngineConfig {
        language: language.unwrap_or_else(|| settings.language.clone()),
        model_path: None,
    };
    let ocr_backend = backend_for(backend_type, engine_config)?;
    if !ocr_backend.is_available() {
        anyhow::bail!("{}", ocr_backend.availability_hint());
    }

    // Load every input; one bad file doesn't abort the batch.
    let pdf_dpi = dpi.unwrap_or(settings.pdf_dpi);
    let (mut pages, failures) = document::load_paths(&files, pdf_dpi);
    for failure in &failures {
        eprintln!(
            "{} {}: {}",
            style("skipping").yellow(),
            failure.path.display(),
            failure.error
        );
    }
    anyhow::ensure!(!pages.is_empty(), "no pages could be loaded");
    if limit > 0 && pages.len() > limit {
        pages.truncate(limit);
    }
    let document = document::Document::new(pages);

    let table = Arc::new(Mutex::new(ResultsTable::new()));
    let autosave = export::spawn_autosave(
        Arc::clone(&table),
        settings.autosave_dir.clone(),
        Duration::from_secs(settings.autosave_interval_secs),
    );

    let (recognizer, mut events) = Recognizer::new(Arc::from(ocr_backend));

    // Submit every page up front; completions arrive in whatever order the
    // workers finish, so collect them by request tag and append rows in
    // submission order afterwards.
    let mut order: Vec<(RequestId, String)> = Vec::with_capacity(document.len());
    for page in document.pages() {
        let mut fields = template.resolve(page.width(), page.height());
        fields.retain(|f| f.rect.width() > 0.0 && f.rect.height() > 0.0);
        let id = recognizer.submit(page, fields);
        order.push((id, page.display_name()));
    }

    let progress = ProgressBar::new(order.len() as u64);
    progress.set_style(
        ProgressStyle::with_template("{spinner} [{bar:40}] {pos}/{len} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar()),
    );

    let mut completed: HashMap<RequestId, RecognitionEvent> = HashMap::new();
    while completed.len() < order.len() {
        let Some(event) = events.recv().await else {
            break;
        };
        progress.inc(1);
        completed.insert(event.request(), event);
    }
    progress.finish_and_clear();

    for (id, page_name) in &order {
        match completed.remove(id) {
            Some(RecognitionEvent::Completed { fields, .. }) => {
                let mut cells = vec![("File".to_string(), page_name.clone())];
                cells.extend(fields.into_iter().map(|f| (f.name, f.text)));
                table.lock().await.push_row(cells);
            }
            Some(RecognitionEvent::Failed { error, .. }) => {
                eprintln!(
                    "{} {}: {}",
                    style("recognition failed").red(),
                    page_name,
                    error
                );
            }
            None => {
                eprintln!("{} {}", style("no result for").red(), page_name);
            }
        }
    }

    autosave.abort();

    let snapshot = table.lock().await.clone();
    anyhow::ensure!(!snapshot.is_empty(), "no pages were recognized");

    let output_path = output.unwrap_or_else(|| {
        let basename = files[0]
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "scan".to_string());
        PathBuf::from(export::export_filename(
            &basename,
            None,
            chrono::Local::now(),
        ))
    });
    export::write_csv(&output_path, &snapshot)
        .with_context(|| format!("failed to write {}", output_path.display()))?;

    println!(
        "{} {} rows -> {}",
        style("exported").green(),
        snapshot.row_count(),
        output_path.display()
    );
    Ok(())
}

fn cmd_template(path: PathBuf, force: bool) -> anyhow::Result<()> {
    if path.exists() && !force {
        anyhow::bail!(
            "{} already exists (use --force to overwrite)",
            path.display()
        );
    }
    RegionTemplate::starter().save(&path)?;
    println!("{} {}", style("wrote").green(), path.display());
    Ok(())
}

fn cmd_flatten(source: PathBuf, dest: PathBuf) -> anyhow::Result<()> {
    anyhow::ensure!(source.is_dir(), "{} is not a directory", source.display());
    let summary = flatten_tree(&source, &dest)?;
    println!(
        "{} moved {}, skipped {}",
        style("done").green(),
        summary.moved,
        summary.skipped
    );
    Ok(())
}

fn cmd_tools() -> anyhow::Result<()> {
    for (tool, available) in ocr::check_tools() {
        let status = if available {
            style("found").green()
        } else {
            style("missing").red()
        };
        println!("{:12} {}", tool, status);
    }
    Ok(())
}
