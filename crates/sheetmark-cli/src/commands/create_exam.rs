//! The `sheetmark create-exam` command.

use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::NaiveDate;

use sheetmark_backends::config::load_config_from;
use sheetmark_core::model::{Exam, ExamStatus};
use sheetmark_core::parser::{parse_pattern_file, validate_pattern};
use sheetmark_core::traits::RecordStore;

pub fn execute(
    pattern_path: PathBuf,
    exam_id: Option<u64>,
    course: Option<String>,
    date: Option<String>,
    series: Option<String>,
    config_path: Option<PathBuf>,
) -> Result<()> {
    let config = load_config_from(config_path.as_deref())?;
    let doc = parse_pattern_file(&pattern_path)?;

    let exam_id = exam_id
        .or(doc.exam.exam_id)
        .context("no exam id: pass --exam-id or set exam_id under [exam]")?;
    let course_code = course
        .or(doc.exam.course_code)
        .context("no course: pass --course or set course_code under [exam]")?;
    let date = match date {
        Some(raw) => NaiveDate::parse_from_str(&raw, "%Y-%m-%d")
            .with_context(|| format!("invalid --date {raw:?}, expected YYYY-MM-DD"))?,
        None => doc
            .exam
            .date
            .unwrap_or_else(|| chrono::Local::now().date_naive()),
    };
    let series_type = series
        .or(doc.exam.series)
        .unwrap_or_else(|| config.default_series.clone());

    for w in validate_pattern(&doc.config) {
        tracing::warn!(location = w.location.as_deref().unwrap_or("-"), "{}", w.message);
    }

    let estimated = doc.config.estimated_total();
    let questions = doc.config.total_questions;
    let batch = doc.config.target_batch_id.clone();

    let store = config.open_store();
    store
        .create_exam(Exam {
            exam_id,
            course_code: course_code.clone(),
            date,
            series_type: series_type.clone(),
            pattern_config: doc.config,
            status: ExamStatus::Scheduled,
        })
        .with_context(|| format!("failed to create exam in {}", store.path().display()))?;

    println!("Created exam {exam_id}: {course_code} {series_type} on {date} for batch {batch}");
    println!("  {questions} questions, estimated total {estimated}");

    Ok(())
}
