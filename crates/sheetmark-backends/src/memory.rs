//! In-memory record store for tests and demos.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard};

use sheetmark_core::model::{DraftMarks, Exam, ExamId, StudentRecord};
use sheetmark_core::traits::RecordStore;
use sheetmark_core::StoreError;

/// A record store held entirely in memory.
///
/// Can be switched to "unavailable" to exercise error paths without a real
/// backend.
#[derive(Default)]
pub struct InMemoryStore {
    students: Mutex<Vec<StudentRecord>>,
    exams: Mutex<Vec<Exam>>,
    drafts: Mutex<Vec<DraftMarks>>,
    unavailable: AtomicBool,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_students(self, students: Vec<StudentRecord>) -> Self {
        if let Ok(mut guard) = self.students.lock() {
            guard.extend(students);
        }
        self
    }

    pub fn with_exam(self, exam: Exam) -> Self {
        if let Ok(mut guard) = self.exams.lock() {
            guard.push(exam);
        }
        self
    }

    /// Make every subsequent call fail with [`StoreError::Unavailable`].
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::Relaxed);
    }

    fn check(&self) -> Result<(), StoreError> {
        if self.unavailable.load(Ordering::Relaxed) {
            return Err(StoreError::Unavailable("in-memory store is offline".into()));
        }
        Ok(())
    }
}

fn lock<T>(mutex: &Mutex<T>) -> Result<MutexGuard<'_, T>, StoreError> {
    mutex
        .lock()
        .map_err(|_| StoreError::Unavailable("store lock poisoned".into()))
}

impl RecordStore for InMemoryStore {
    fn batch_students(&self, batch_id: &str) -> Result<Vec<StudentRecord>, StoreError> {
        self.check()?;
        Ok(lock(&self.students)?
            .iter()
            .filter(|s| s.batch_id == batch_id)
            .cloned()
            .collect())
    }

    fn exam(&self, exam_id: ExamId) -> Result<Option<Exam>, StoreError> {
        self.check()?;
        Ok(lock(&self.exams)?
            .iter()
            .find(|e| e.exam_id == exam_id)
            .cloned())
    }

    fn create_exam(&self, exam: Exam) -> Result<(), StoreError> {
        self.check()?;
        let mut exams = lock(&self.exams)?;
        if exams.iter().any(|e| e.exam_id == exam.exam_id) {
            return Err(StoreError::Duplicate(format!("exam {}", exam.exam_id)));
        }
        tracing::debug!(exam_id = exam.exam_id, "created exam");
        exams.push(exam);
        Ok(())
    }

    fn record_draft(&self, draft: DraftMarks) -> Result<(), StoreError> {
        self.check()?;
        let mut drafts = lock(&self.drafts)?;
        upsert_draft(&mut drafts, draft);
        Ok(())
    }

    fn drafts(&self, exam_id: ExamId) -> Result<Vec<DraftMarks>, StoreError> {
        self.check()?;
        Ok(lock(&self.drafts)?
            .iter()
            .filter(|d| d.exam_id == exam_id)
            .cloned()
            .collect())
    }
}

/// Replace the draft for the same exam and student, or append.
pub(crate) fn upsert_draft(drafts: &mut Vec<DraftMarks>, draft: DraftMarks) {
    match drafts
        .iter_mut()
        .find(|d| d.exam_id == draft.exam_id && d.ktu_id == draft.ktu_id)
    {
        Some(existing) => *existing = draft,
        None => drafts.push(draft),
    }
}
