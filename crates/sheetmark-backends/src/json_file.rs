//! Record store backed by a single JSON document on disk.
//!
//! Every call re-reads the file, so edits made by other tools between calls
//! are picked up. Writes replace the whole file through a temporary sibling
//! and a rename. A missing file reads as an empty store.

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use serde::{Deserialize, Serialize};

use sheetmark_core::model::{DraftMarks, Exam, ExamId, StudentRecord};
use sheetmark_core::traits::RecordStore;
use sheetmark_core::StoreError;

use crate::memory::upsert_draft;

/// A batch of students, e.g. "2024-2026 MCA".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchRecord {
    #[serde(alias = "batch_id")]
    pub batch_id: String,
    #[serde(alias = "batch_name")]
    pub batch_name: String,
    #[serde(default, alias = "current_semester")]
    pub current_semester: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseRecord {
    #[serde(alias = "course_code")]
    pub course_code: String,
    #[serde(alias = "course_name")]
    pub course_name: String,
    #[serde(default)]
    pub department: Option<String>,
}

/// On-disk layout of a [`JsonFileStore`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreDocument {
    #[serde(default)]
    pub batches: Vec<BatchRecord>,
    #[serde(default)]
    pub courses: Vec<CourseRecord>,
    #[serde(default)]
    pub students: Vec<StudentRecord>,
    #[serde(default)]
    pub exams: Vec<Exam>,
    #[serde(default)]
    pub drafts: Vec<DraftMarks>,
}

/// File-backed [`RecordStore`].
pub struct JsonFileStore {
    path: PathBuf,
    /// Serializes read-modify-write cycles within this process.
    write_lock: Mutex<()>,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the whole document.
    pub fn load(&self) -> Result<StoreDocument, StoreError> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Ok(StoreDocument::default());
            }
            Err(e) => {
                return Err(StoreError::Unavailable(format!(
                    "failed to read {}: {e}",
                    self.path.display()
                )))
            }
        };
        serde_json::from_str(&content).map_err(|e| {
            StoreError::Unavailable(format!("failed to parse {}: {e}", self.path.display()))
        })
    }

    /// Replace the whole document.
    pub fn save(&self, doc: &StoreDocument) -> Result<(), StoreError> {
        let json = serde_json::to_string_pretty(doc)
            .map_err(|e| StoreError::Unavailable(format!("failed to serialize store: {e}")))?;
        let tmp = self.path.with_extension("json.tmp");
        let written = std::fs::write(&tmp, json).and_then(|_| std::fs::rename(&tmp, &self.path));
        if let Err(e) = written {
            let _ = std::fs::remove_file(&tmp);
            return Err(StoreError::Unavailable(format!(
                "failed to write {}: {e}",
                self.path.display()
            )));
        }
        Ok(())
    }

    fn update<T>(
        &self,
        apply: impl FnOnce(&mut StoreDocument) -> Result<T, StoreError>,
    ) -> Result<T, StoreError> {
        let _guard = self
            .write_lock
            .lock()
            .map_err(|_| StoreError::Unavailable("store lock poisoned".into()))?;
        let mut doc = self.load()?;
        let value = apply(&mut doc)?;
        self.save(&doc)?;
        Ok(value)
    }
}

impl RecordStore for JsonFileStore {
    fn batch_students(&self, batch_id: &str) -> Result<Vec<StudentRecord>, StoreError> {
        Ok(self
            .load()?
            .students
            .into_iter()
            .filter(|s| s.batch_id == batch_id)
            .collect())
    }

    fn exam(&self, exam_id: ExamId) -> Result<Option<Exam>, StoreError> {
        Ok(self
            .load()?
            .exams
            .into_iter()
            .find(|e| e.exam_id == exam_id))
    }

    fn create_exam(&self, exam: Exam) -> Result<(), StoreError> {
        self.update(|doc| {
            if doc.exams.iter().any(|e| e.exam_id == exam.exam_id) {
                return Err(StoreError::Duplicate(format!("exam {}", exam.exam_id)));
            }
            tracing::info!(exam_id = exam.exam_id, path = %self.path.display(), "created exam");
            doc.exams.push(exam);
            Ok(())
        })
    }

    fn record_draft(&self, draft: DraftMarks) -> Result<(), StoreError> {
        self.update(|doc| {
            upsert_draft(&mut doc.drafts, draft);
            Ok(())
        })
    }

    fn drafts(&self, exam_id: ExamId) -> Result<Vec<DraftMarks>, StoreError> {
        Ok(self
            .load()?
            .drafts
            .into_iter()
            .filter(|d| d.exam_id == exam_id)
            .collect())
    }
}
