// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// ScanDock — document scanning from the command line.
//
// Entry point. Initialises logging and services, then runs one command:
// photos come in through the file bridge, get edited in an editor session,
// and are saved as page PNGs plus a merged PDF.

mod services;

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use scandock_bridge::{FileBridge, NativeCamera, NativeShare};
use scandock_core::AppConfig;
use scandock_core::error::{Result, ScandockError};
use scandock_core::human_errors::humanize_error;
use scandock_core::types::{CaptureMode, EditParams, EnhanceMode, FilterMode, ROTATION_STEP, ScanId};
use scandock_document::image::crop::compute_display_rect;
use scandock_document::{Rect, Size};
use scandock_editor::EditorSession;
use serde::Serialize;
use tracing::info;

use services::app_services::AppServices;

#[derive(Parser)]
#[command(name = "scandock")]
#[command(version, about = "Multi-page document scanner", long_about = None)]
struct Cli {
    /// Data directory (default: $XDG_DATA_HOME/scandock)
    #[arg(long, global = true, value_name = "DIR")]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Capture image files as pages of a new scan and save it
    Scan {
        /// Page images, in order
        #[arg(value_name = "IMAGES", required = true)]
        images: Vec<PathBuf>,

        #[command(flatten)]
        edit: EditArgs,
    },

    /// Replace one page of a saved scan with a new image
    Retake {
        id: i64,
        /// Zero-based page index
        page: usize,
        image: PathBuf,

        #[command(flatten)]
        edit: EditArgs,
    },

    /// Move a page of a saved scan to a new position
    Reorder { id: i64, from: usize, to: usize },

    /// Remove a page from a saved scan
    RemovePage { id: i64, page: usize },

    /// List saved scans, newest first
    List {
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Show the pages of a saved scan
    Show { id: i64 },

    /// Delete a saved scan and its files
    Delete { id: i64 },

    /// Copy a scan's PDF into a directory
    Export {
        id: i64,
        #[arg(value_name = "DIR")]
        dir: PathBuf,
    },

    /// Print the active configuration, after applying any changes given
    Config {
        /// Title prefix for new scans
        #[arg(long, value_name = "PREFIX")]
        title_prefix: Option<String>,

        /// Subdirectory of the data dir holding scan folders
        #[arg(long, value_name = "NAME")]
        scans_dir: Option<String>,

        /// Restore every setting to its default
        #[arg(long, conflicts_with_all = ["title_prefix", "scans_dir"])]
        reset: bool,
    },
}

/// Edits applied to every captured page.
#[derive(clap::Args, Debug, Clone)]
struct EditArgs {
    /// Enhancement: none, contrast, sharpen or docboost
    #[arg(long, default_value = "none")]
    enhance: EnhanceMode,

    /// Colour filter: none, gray, bw, warm or cool
    #[arg(long, default_value = "none")]
    filter: FilterMode,

    /// Contrast scale (0.8 - 2.0)
    #[arg(long, default_value = "1.0")]
    contrast: f32,

    /// Sharpen strength
    #[arg(long, default_value = "0.0")]
    sharpness: f32,

    /// Quarter turns to record for display
    #[arg(long, default_value = "0")]
    rotate: u32,

    /// Crop box in image pixels (left,top,right,bottom)
    #[arg(long, value_name = "L,T,R,B")]
    crop: Option<String>,
}

impl EditArgs {
    fn params(&self) -> EditParams {
        EditParams {
            enhance: self.enhance,
            filter: self.filter,
            rotation: self.rotate as f32 * ROTATION_STEP,
            contrast: self.contrast,
            sharpness: self.sharpness,
        }
    }

    fn crop_rect(&self) -> Result<Option<Rect>> {
        self.crop.as_deref().map(parse_rect).transpose()
    }
}

#[derive(Serialize)]
struct ScanSummary {
    id: i64,
    title: String,
    created: String,
    pages: usize,
    pdf: String,
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            let human = humanize_error(&err);
            eprintln!("{}\n{}", human.message, human.suggestion);
            tracing::debug!(error = %err, "command failed");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let services = AppServices::init(cli.data_dir.as_deref())?;
    info!(data_dir = %services.data_dir().display(), "ScanDock starting");

    match cli.command {
        Commands::Scan { images, edit } => {
            let session = EditorSession::default();
            let camera = Arc::new(FileBridge::new(images.clone()));
            for image in &images {
                capture_page(&session, camera.clone(), CaptureMode::AddPage, image).await?;
                apply_edits(&session, &edit).await?;
            }
            let outcome = services.save_session(&session).await?;
            println!(
                "Saved scan {} ({} pages) to {}",
                outcome.scan_id.0,
                outcome.pages.len(),
                outcome.pdf_path.display()
            );
        }

        Commands::Retake { id, page, image, edit } => {
            let session = services.open_scan(ScanId(id))?;
            check_page(&session, page)?;
            session.select_page(page);
            let camera = Arc::new(FileBridge::new(vec![image.clone()]));
            capture_page(&session, camera, CaptureMode::Retake, &image).await?;
            apply_edits(&session, &edit).await?;
            services.save_session(&session).await?;
            println!("Replaced page {page} of scan {id}");
        }

        Commands::Reorder { id, from, to } => {
            let session = services.open_scan(ScanId(id))?;
            session.move_page(from, to)?;
            services.save_session(&session).await?;
            println!("Moved page {from} to {to} in scan {id}");
        }

        Commands::RemovePage { id, page } => {
            let session = services.open_scan(ScanId(id))?;
            session.remove_page(page)?;
            if session.with_pages(|pages| pages.is_empty()) {
                services.delete_scan(ScanId(id))?;
                println!("Removed the last page; scan {id} deleted");
            } else {
                services.save_session(&session).await?;
                println!("Removed page {page} from scan {id}");
            }
        }

        Commands::List { json } => {
            let mut summaries = Vec::new();
            for scan in services.list_scans()? {
                let Some(id) = scan.id else { continue };
                summaries.push(ScanSummary {
                    id: id.0,
                    pages: services.page_count(id)?,
                    created: format_millis(scan.created_at),
                    title: scan.title,
                    pdf: scan.pdf_path,
                });
            }
            if json {
                println!("{}", serde_json::to_string_pretty(&summaries)?);
            } else if summaries.is_empty() {
                println!("No scans yet.");
            } else {
                for s in &summaries {
                    println!("{:>5}  {:<24}  {:>3} pages  {}", s.id, s.title, s.pages, s.created);
                }
            }
        }

        Commands::Show { id } => {
            let record = services.scan(ScanId(id))?;
            let session = services.open_scan(ScanId(id))?;
            println!("{} ({})", record.title, format_millis(record.created_at));
            println!("PDF: {}", record.pdf_path);
            session.with_pages(|pages| {
                for (i, page) in pages.pages().iter().enumerate() {
                    let (w, h) = page.current().dimensions();
                    let edits = page.edits();
                    println!(
                        "  page {i}: {w}x{h}  enhance={:?} filter={:?} rotation={} contrast={:.2} sharpness={:.2}",
                        edits.enhance, edits.filter, edits.rotation, edits.contrast, edits.sharpness
                    );
                }
            });
        }

        Commands::Delete { id } => {
            services.delete_scan(ScanId(id))?;
            println!("Deleted scan {id}");
        }

        Commands::Export { id, dir } => {
            let record = services.scan(ScanId(id))?;
            let share = FileBridge::new(Vec::new()).with_outbox(&dir);
            share.share_file(&record.pdf_path, "application/pdf")?;
            println!("Exported {} to {}", record.pdf_path, dir.display());
        }

        Commands::Config {
            title_prefix,
            scans_dir,
            reset,
        } => {
            let mut config = if reset {
                AppConfig::default()
            } else {
                services.config()
            };
            if let Some(prefix) = title_prefix {
                config.scan_title_prefix = prefix;
            }
            if let Some(name) = scans_dir {
                config.scans_dir_name = name;
            }
            if config != services.config() {
                services.save_config(&config)?;
                info!("configuration updated");
            }
            println!("{}", serde_json::to_string_pretty(&config)?);
        }
    }
    Ok(())
}

async fn capture_page(
    session: &EditorSession,
    camera: Arc<FileBridge>,
    mode: CaptureMode,
    image: &Path,
) -> Result<usize> {
    let camera: Arc<dyn NativeCamera> = camera;
    session
        .capture(camera, mode)
        .await?
        .ok_or_else(|| ScandockError::CaptureFailed(format!("no page taken from {}", image.display())))
}

/// Crop (if asked) and render the selected page.
async fn apply_edits(session: &EditorSession, edit: &EditArgs) -> Result<()> {
    if let Some(crop) = edit.crop_rect()? {
        // Show the page at its own size so view coordinates are pixels.
        let display = session.with_pages(|pages| {
            pages.selected().map(|page| {
                let (w, h) = page.original().dimensions();
                compute_display_rect(w, h, Size::new(w as f32, h as f32))
            })
        });
        let display = display.ok_or(ScandockError::IndexOutOfRange { index: 0, len: 0 })?;
        session.apply_crop(crop, display).await?;
    }
    session.recompute(edit.params()).await?;
    Ok(())
}

fn check_page(session: &EditorSession, index: usize) -> Result<()> {
    let len = session.with_pages(|pages| pages.len());
    if index < len {
        Ok(())
    } else {
        Err(ScandockError::IndexOutOfRange { index, len })
    }
}

fn parse_rect(s: &str) -> Result<Rect> {
    let values: Vec<f32> = s
        .split(',')
        .map(|v| v.trim().parse::<f32>())
        .collect::<std::result::Result<_, _>>()
        .map_err(|e| ScandockError::Transform(format!("bad crop box {s:?}: {e}")))?;
    match values.as_slice() {
        &[left, top, right, bottom] => Ok(Rect::new(left, top, right, bottom)),
        _ => Err(ScandockError::Transform(format!(
            "crop box needs four values, got {s:?}"
        ))),
    }
}

fn format_millis(millis: i64) -> String {
    chrono::DateTime::from_timestamp_millis(millis)
        .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| millis.to_string())
}
