//! Collaborator interfaces: the record store and the sheet recognizer.
//!
//! Implementations live in `sheetmark-backends`.

use std::collections::BTreeMap;
use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::StoreError;
use crate::model::{CapturedSheet, DraftMarks, Exam, ExamId, ExamPatternConfig, StudentRecord};

// ---------------------------------------------------------------------------
// Record store
// ---------------------------------------------------------------------------

/// Persistence boundary for students, exams and saved marks.
///
/// Calls are synchronous request/response. Failures are reported to the
/// operator, never retried here.
pub trait RecordStore: Send + Sync {
    /// All students enrolled in `batch_id`, in roster order.
    fn batch_students(&self, batch_id: &str) -> Result<Vec<StudentRecord>, StoreError>;

    fn exam(&self, exam_id: ExamId) -> Result<Option<Exam>, StoreError>;

    /// Persist a new exam. Fails with [`StoreError::Duplicate`] if the id is
    /// taken.
    fn create_exam(&self, exam: Exam) -> Result<(), StoreError>;

    /// Insert or replace the saved marks of one student for one exam.
    fn record_draft(&self, draft: DraftMarks) -> Result<(), StoreError>;

    fn drafts(&self, exam_id: ExamId) -> Result<Vec<DraftMarks>, StoreError>;

    /// The pattern of `exam_id`, if the exam exists.
    fn exam_pattern_config(&self, exam_id: ExamId) -> Result<Option<ExamPatternConfig>, StoreError> {
        Ok(self.exam(exam_id)?.map(|exam| exam.pattern_config))
    }
}

// ---------------------------------------------------------------------------
// Sheet recognizer
// ---------------------------------------------------------------------------

/// Opaque reference to a scanned answer-sheet image.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ImageHandle(pub String);

impl ImageHandle {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ImageHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// What a recognizer reads off a sheet.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecognitionResult {
    #[serde(alias = "detected_roll_suffix", alias = "rollNo")]
    pub detected_roll_suffix: String,
    #[serde(default)]
    pub marks: BTreeMap<String, i64>,
}

impl From<RecognitionResult> for CapturedSheet {
    fn from(result: RecognitionResult) -> Self {
        CapturedSheet {
            detected_roll_suffix: result.detected_roll_suffix,
            marks: result.marks,
        }
    }
}

/// Turns a scanned sheet into a roll suffix and raw marks.
///
/// This is the only latency-bearing step of digitization. How the result is
/// produced (ML inference, manual entry, a stand-in) is up to the
/// implementation.
#[async_trait]
pub trait SheetRecognizer: Send + Sync {
    /// Human-readable recognizer name (e.g. "simulated").
    fn name(&self) -> &str;

    async fn recognize(&self, image: &ImageHandle) -> anyhow::Result<RecognitionResult>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recognition_result_accepts_form_field_name() {
        let json = r#"{"rollNo": "23", "marks": {"1": 5, "2_a": 3}}"#;
        let result: RecognitionResult = serde_json::from_str(json).unwrap();
        assert_eq!(result.detected_roll_suffix, "23");
        assert_eq!(result.marks.get("2_a"), Some(&3));

        let sheet = CapturedSheet::from(result);
        assert_eq!(sheet.marks.len(), 2);
    }
}
