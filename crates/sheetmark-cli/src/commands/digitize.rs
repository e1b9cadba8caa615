//! The `sheetmark digitize` command.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use sheetmark_backends::config::{create_recognizer, load_config_from};
use sheetmark_core::capture::{capture_sheet, CaptureOutcome};
use sheetmark_core::session::{DigitizationSession, SessionSummary};
use sheetmark_core::traits::{ImageHandle, RecordStore};

pub async fn execute(exam_id: u64, sheets: PathBuf, config_path: Option<PathBuf>) -> Result<()> {
    let config = load_config_from(config_path.as_deref())?;
    let store = config.open_store();

    let mut session = DigitizationSession::open_for_exam(&store, exam_id)
        .with_context(|| format!("cannot digitize exam {exam_id}"))?;
    let recognizer = create_recognizer(&config.recognizer, &session);
    let images = collect_sheets(&sheets)?;

    println!(
        "Digitizing exam {exam_id}: {} sheet(s), {} student(s), recognizer {}",
        images.len(),
        session.entries().len(),
        recognizer.name()
    );

    let mut skipped = 0usize;
    for path in images {
        let image = ImageHandle::new(path.display().to_string());

        match capture_sheet(&mut session, recognizer.as_ref(), &image).await {
            Ok(CaptureOutcome::Applied) => {}
            Ok(CaptureOutcome::Discarded) => {
                tracing::warn!(%image, "recognition result discarded");
                skipped += 1;
                continue;
            }
            Err(e) => {
                tracing::warn!(%image, "skipping sheet: {e:#}");
                skipped += 1;
                continue;
            }
        }

        match session.save() {
            Ok(saved) => {
                store.record_draft(saved.to_draft(exam_id))?;
                println!(
                    "  {image}: {} total {}",
                    saved.entry.ktu_id, saved.entry.total
                );
            }
            Err(e) if e.is_recoverable() => {
                tracing::warn!(%image, "skipping sheet: {e}");
                println!("  {image}: skipped ({e})");
                session.retake();
                skipped += 1;
            }
            Err(e) => return Err(e.into()),
        }
    }

    print_summary(&session.summary());
    if skipped > 0 {
        println!("{skipped} sheet(s) skipped.");
    }

    Ok(())
}

/// A single sheet, or every sheet in a directory in name order.
///
/// In a directory, a `.json` file that shares its stem with another file is
/// that file's sidecar and is not a sheet of its own.
fn collect_sheets(path: &Path) -> Result<Vec<PathBuf>> {
    if !path.is_dir() {
        anyhow::ensure!(path.exists(), "sheet not found: {}", path.display());
        return Ok(vec![path.to_path_buf()]);
    }

    let mut files: Vec<PathBuf> = std::fs::read_dir(path)
        .with_context(|| format!("failed to read directory: {}", path.display()))?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| p.is_file())
        .collect();
    files.sort();

    let is_sidecar = |p: &PathBuf| {
        p.extension().is_some_and(|ext| ext == "json")
            && files
                .iter()
                .any(|other| other != p && other.file_stem() == p.file_stem())
    };
    let sheets = files.iter().filter(|p| !is_sidecar(p)).cloned().collect();
    Ok(sheets)
}

fn print_summary(summary: &SessionSummary) {
    use comfy_table::{Cell, Table};

    let mut table = Table::new();
    table.set_header(vec!["Roll No", "Name", "Status", "Total"]);
    for row in &summary.rows {
        table.add_row(vec![
            Cell::new(&row.ktu_id),
            Cell::new(&row.student_name),
            Cell::new(row.status),
            Cell::new(row.total),
        ]);
    }

    println!("\n{table}");
    println!(
        "Progress: {} ({:.0}%), estimated total {}",
        summary.progress,
        summary.progress.fraction() * 100.0,
        summary.estimated_total
    );
}
