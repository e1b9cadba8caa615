//! Digitization sessions.
//!
//! A session holds the roster of one exam's batch and walks each student's
//! sheet through scan → verify → save. Every student starts `Pending` and
//! moves to `Done` when a sheet matching their roll number is saved. `Done`
//! is terminal; saving another sheet for the same student only replaces the
//! total.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::capture::{CaptureOutcome, CaptureTicket};
use crate::error::SheetError;
use crate::model::{
    parse_int_or_zero, CapturedSheet, DigitizationEntry, DraftMarks, EntryStatus, ExamId,
    ExamPatternConfig, StudentRecord,
};
use crate::scoring::entered_total;
use crate::traits::{RecognitionResult, RecordStore};

/// Number of trailing roll-identifier characters a grader reads off a sheet.
const ROLL_SUFFIX_LEN: usize = 3;

/// The human-enterable roll suffix of a roll identifier: its last three
/// characters with non-digits removed (`TKM24MCA023` → `023`).
pub fn roll_suffix(ktu_id: &str) -> String {
    let tail: Vec<char> = ktu_id.chars().rev().take(ROLL_SUFFIX_LEN).collect();
    tail.into_iter()
        .rev()
        .filter(|c| c.is_ascii_digit())
        .collect()
}

/// Completed versus total sheets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Progress {
    pub completed: usize,
    pub total: usize,
}

impl Progress {
    /// Completion ratio in `0.0..=1.0`; an empty roster counts as complete.
    pub fn fraction(&self) -> f64 {
        if self.total == 0 {
            1.0
        } else {
            self.completed as f64 / self.total as f64
        }
    }

    pub fn is_complete(&self) -> bool {
        self.completed == self.total
    }
}

impl fmt::Display for Progress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.completed, self.total)
    }
}

/// Result of a successful [`DigitizationSession::save`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SavedSheet {
    /// The student's entry after the save.
    pub entry: DigitizationEntry,
    /// The sheet that was saved, with its roll suffix as entered.
    pub sheet: CapturedSheet,
}

impl SavedSheet {
    /// Persistable form of this save.
    pub fn to_draft(&self, exam_id: ExamId) -> DraftMarks {
        DraftMarks {
            exam_id,
            ktu_id: self.entry.ktu_id.clone(),
            marks: self.sheet.marks.clone(),
            total_obtained: self.entry.total,
            is_absent: false,
        }
    }
}

/// One row of a [`SessionSummary`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryRow {
    pub ktu_id: String,
    pub student_name: String,
    pub status: EntryStatus,
    pub total: i64,
}

/// Serializable snapshot of a session for display or export.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSummary {
    pub target_batch_id: String,
    pub estimated_total: f64,
    pub rows: Vec<SummaryRow>,
    pub progress: Progress,
}

/// In-memory state of one exam's digitization.
#[derive(Debug, Clone)]
pub struct DigitizationSession {
    config: ExamPatternConfig,
    roster: Vec<StudentRecord>,
    /// Parallel to `roster`.
    entries: Vec<DigitizationEntry>,
    in_flight: Option<CapturedSheet>,
    /// Sequence number of the most recent capture request.
    latest_request: u64,
    /// Request still waiting for its recognition result, if any.
    pending_request: Option<u64>,
}

impl DigitizationSession {
    /// Open a session over the students of the config's target batch.
    ///
    /// Students from other batches are ignored. An empty roster is allowed.
    pub fn open(config: ExamPatternConfig, roster: Vec<StudentRecord>) -> Self {
        let roster: Vec<StudentRecord> = roster
            .into_iter()
            .filter(|s| s.batch_id == config.target_batch_id)
            .collect();
        let entries = roster
            .iter()
            .map(|s| DigitizationEntry::pending(s.ktu_id.clone()))
            .collect();
        tracing::info!(
            batch = %config.target_batch_id,
            students = roster.len(),
            "opened digitization session"
        );
        Self {
            config,
            roster,
            entries,
            in_flight: None,
            latest_request: 0,
            pending_request: None,
        }
    }

    /// Resolve `exam_id`'s pattern and roster through the store and open a
    /// session.
    pub fn open_for_exam(store: &dyn RecordStore, exam_id: ExamId) -> Result<Self, SheetError> {
        let config = store
            .exam_pattern_config(exam_id)?
            .ok_or(SheetError::ConfigNotFound(exam_id))?;
        let roster = store.batch_students(&config.target_batch_id)?;
        Ok(Self::open(config, roster))
    }

    pub fn config(&self) -> &ExamPatternConfig {
        &self.config
    }

    pub fn roster(&self) -> &[StudentRecord] {
        &self.roster
    }

    pub fn entries(&self) -> &[DigitizationEntry] {
        &self.entries
    }

    pub fn entry(&self, ktu_id: &str) -> Option<&DigitizationEntry> {
        self.entries.iter().find(|e| e.ktu_id == ktu_id)
    }

    /// The sheet currently being verified.
    pub fn in_flight(&self) -> Option<&CapturedSheet> {
        self.in_flight.as_ref()
    }

    /// Whether a capture was requested and its result has not arrived.
    pub fn capture_pending(&self) -> bool {
        self.pending_request.is_some()
    }

    // --- capture -----------------------------------------------------------

    /// Start a new capture. Any unsaved sheet is discarded and any earlier
    /// request still in progress loses interest in its result.
    pub fn request_capture(&mut self) -> CaptureTicket {
        self.latest_request += 1;
        self.pending_request = Some(self.latest_request);
        if self.in_flight.take().is_some() {
            tracing::debug!("discarded unsaved sheet for new capture");
        }
        CaptureTicket::new(self.latest_request)
    }

    /// Apply a recognition result if `ticket` is the outstanding request.
    /// Results for superseded or already-completed requests are discarded.
    pub fn complete_capture(
        &mut self,
        ticket: CaptureTicket,
        result: RecognitionResult,
    ) -> CaptureOutcome {
        if self.pending_request != Some(ticket.sequence()) {
            tracing::debug!(
                ticket = ticket.sequence(),
                latest = self.latest_request,
                "discarding stale recognition result"
            );
            return CaptureOutcome::Discarded;
        }
        self.pending_request = None;
        self.in_flight = Some(result.into());
        CaptureOutcome::Applied
    }

    /// Withdraw `ticket` if it is still the outstanding request, e.g. after
    /// its recognition failed. A superseded ticket leaves the session alone.
    pub fn cancel_capture(&mut self, ticket: CaptureTicket) {
        if self.pending_request == Some(ticket.sequence()) {
            self.pending_request = None;
            tracing::debug!(ticket = ticket.sequence(), "capture cancelled");
        }
    }

    /// Make `result` the sheet being verified, replacing any unsaved one.
    pub fn ingest_capture(&mut self, result: RecognitionResult) -> &CapturedSheet {
        let ticket = self.request_capture();
        self.pending_request = None;
        tracing::debug!(ticket = ticket.sequence(), "ingested capture");
        self.in_flight.insert(result.into())
    }

    // --- verification ------------------------------------------------------

    /// Overwrite one mark of the in-flight sheet. Non-numeric input is 0.
    pub fn edit_mark(&mut self, key: &str, raw: &str) -> Result<(), SheetError> {
        let sheet = self.in_flight.as_mut().ok_or(SheetError::NoCaptureInFlight)?;
        sheet.marks.insert(key.to_string(), parse_int_or_zero(raw));
        Ok(())
    }

    /// Replace the roll suffix of the in-flight sheet with the grader's
    /// correction.
    pub fn set_roll_suffix(&mut self, raw: &str) -> Result<(), SheetError> {
        let sheet = self.in_flight.as_mut().ok_or(SheetError::NoCaptureInFlight)?;
        sheet.detected_roll_suffix = raw.trim().to_string();
        Ok(())
    }

    /// The first student, in roster order, whose roll identifier ends with
    /// `suffix`. The suffix is compared as given, so an empty suffix matches
    /// the first student.
    pub fn match_student(&self, suffix: &str) -> Result<&StudentRecord, SheetError> {
        self.match_index(suffix).map(|i| &self.roster[i])
    }

    fn match_index(&self, suffix: &str) -> Result<usize, SheetError> {
        self.roster
            .iter()
            .position(|s| s.ktu_id.ends_with(suffix))
            .ok_or_else(|| SheetError::StudentNotFound {
                suffix: suffix.to_string(),
            })
    }

    /// Bind the in-flight sheet to its student and record the entered total.
    ///
    /// On any error the in-flight sheet and all entries are left exactly as
    /// they were, so the grader can correct the roll number and retry.
    pub fn save(&mut self) -> Result<SavedSheet, SheetError> {
        let sheet = self.in_flight.as_ref().ok_or(SheetError::NoCaptureInFlight)?;
        let index = match self.match_index(&sheet.detected_roll_suffix) {
            Ok(index) => index,
            Err(err) => {
                tracing::warn!("{err}");
                return Err(err);
            }
        };
        let total = entered_total(&sheet.marks);

        let entry = &mut self.entries[index];
        entry.status = EntryStatus::Done;
        entry.total = total;
        let entry = entry.clone();

        let sheet = self.in_flight.take().unwrap_or_default();
        tracing::info!(ktu_id = %entry.ktu_id, total, "saved answer sheet");
        Ok(SavedSheet { entry, sheet })
    }

    /// Drop the in-flight sheet (and interest in any pending capture) without
    /// touching entries.
    pub fn retake(&mut self) {
        self.in_flight = None;
        self.pending_request = None;
    }

    // --- reporting ---------------------------------------------------------

    pub fn progress(&self) -> Progress {
        Progress {
            completed: self
                .entries
                .iter()
                .filter(|e| e.status == EntryStatus::Done)
                .count(),
            total: self.entries.len(),
        }
    }

    pub fn summary(&self) -> SessionSummary {
        let rows = self
            .roster
            .iter()
            .zip(&self.entries)
            .map(|(student, entry)| SummaryRow {
                ktu_id: student.ktu_id.clone(),
                student_name: student.student_name.clone(),
                status: entry.status,
                total: entry.total,
            })
            .collect();
        SessionSummary {
            target_batch_id: self.config.target_batch_id.clone(),
            estimated_total: self.config.estimated_total(),
            rows,
            progress: self.progress(),
        }
    }
}
