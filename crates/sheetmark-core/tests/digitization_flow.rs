//! End-to-end digitization tests: configure a pattern, persist it through the
//! in-memory record store, open a session and grade sheets.

use std::collections::BTreeMap;

use chrono::NaiveDate;

use sheetmark_backends::InMemoryStore;
use sheetmark_core::model::{
    EntryStatus, Exam, ExamId, ExamPatternConfig, ExamStatus, StudentRecord, SubPart,
};
use sheetmark_core::pattern::{PatternGrid, QuestionField};
use sheetmark_core::rules::ChoiceRuleSet;
use sheetmark_core::scoring::estimated_total;
use sheetmark_core::session::DigitizationSession;
use sheetmark_core::traits::{RecognitionResult, RecordStore};
use sheetmark_core::{SheetError, StoreError};

fn student(ktu_id: &str, name: &str) -> StudentRecord {
    StudentRecord {
        ktu_id: ktu_id.into(),
        student_name: name.into(),
        batch_id: "MCA2024".into(),
    }
}

fn roster() -> Vec<StudentRecord> {
    vec![
        student("TKM24MCA001", "Anjali"),
        student("TKM24MCA002", "Bilal"),
        student("TKM24MCA003", "Chitra"),
    ]
}

/// Q1 plain (5), Q2 split into a=3, b=2, Q3-Q6 "any 2" at 5 each.
fn configure() -> ExamPatternConfig {
    let mut grid = PatternGrid::generate(6).unwrap();
    grid.set_field(2, QuestionField::HasSubQuestions(true)).unwrap();
    grid.set_sub_mark(2, SubPart::A, 3).unwrap();
    grid.set_sub_mark(2, SubPart::B, 2).unwrap();

    let mut rules = ChoiceRuleSet::new();
    rules.add_rule_raw("3", "6", "2").unwrap();

    assert_eq!(estimated_total(&grid, &rules), 20.0);
    ExamPatternConfig::from_parts("MCA2024", &grid, &rules)
}

fn exam(exam_id: ExamId, config: ExamPatternConfig) -> Exam {
    Exam {
        exam_id,
        course_code: "20MCA201".into(),
        date: NaiveDate::from_ymd_opt(2026, 3, 14).unwrap(),
        series_type: "Series 1".into(),
        pattern_config: config,
        status: ExamStatus::Scheduled,
    }
}

#[test]
fn three_student_session_end_to_end() {
    let mut session = DigitizationSession::open(configure(), roster());

    session.ingest_capture(RecognitionResult {
        detected_roll_suffix: "001".into(),
        marks: BTreeMap::new(),
    });
    session.edit_mark("1", "5").unwrap();
    session.edit_mark("2_a", "3").unwrap();
    session.edit_mark("2_b", "2").unwrap();
    let saved = session.save().unwrap();

    assert_eq!(saved.entry.ktu_id, "TKM24MCA001");
    let a = session.entry("TKM24MCA001").unwrap();
    assert_eq!(a.status, EntryStatus::Done);
    assert_eq!(a.total, 10);
    for ktu_id in ["TKM24MCA002", "TKM24MCA003"] {
        assert_eq!(session.entry(ktu_id).unwrap().status, EntryStatus::Pending);
        assert_eq!(session.entry(ktu_id).unwrap().total, 0);
    }
    let progress = session.progress();
    assert_eq!((progress.completed, progress.total), (1, 3));
}

#[test]
fn session_opens_through_store_and_records_drafts() {
    let store = InMemoryStore::new().with_students(roster());
    store.create_exam(exam(7, configure())).unwrap();
    assert!(matches!(
        store.create_exam(exam(7, configure())),
        Err(StoreError::Duplicate(_))
    ));

    let mut session = DigitizationSession::open_for_exam(&store, 7).unwrap();
    assert_eq!(session.roster().len(), 3);

    // Entered totals ignore the choice block: the student attempted three of
    // the four alternatives and every entered mark counts.
    session.ingest_capture(RecognitionResult {
        detected_roll_suffix: "3".into(),
        marks: [("3", 4), ("4", 5), ("5", 2)]
            .into_iter()
            .map(|(k, v)| (k.to_string(), v))
            .collect(),
    });
    let saved = session.save().unwrap();
    assert_eq!(saved.entry.ktu_id, "TKM24MCA003");
    assert_eq!(saved.entry.total, 11);
    store.record_draft(saved.to_draft(7)).unwrap();

    let drafts = store.drafts(7).unwrap();
    assert_eq!(drafts.len(), 1);
    assert_eq!(drafts[0].ktu_id, "TKM24MCA003");
    assert_eq!(drafts[0].total_obtained, 11);
}

#[test]
fn missing_exam_is_config_not_found() {
    let store = InMemoryStore::new();
    let err = DigitizationSession::open_for_exam(&store, 99).unwrap_err();
    assert!(matches!(err, SheetError::ConfigNotFound(99)));
    assert!(!err.is_recoverable());
}

#[test]
fn unreachable_store_is_unavailable() {
    let store = InMemoryStore::new();
    store.set_unavailable(true);
    let err = DigitizationSession::open_for_exam(&store, 1).unwrap_err();
    assert!(matches!(err, SheetError::Unavailable(_)));
}

#[test]
fn batch_without_students_opens_empty_session() {
    let store = InMemoryStore::new();
    store.create_exam(exam(3, configure())).unwrap();
    let session = DigitizationSession::open_for_exam(&store, 3).unwrap();
    assert!(session.entries().is_empty());
    assert_eq!(session.progress().to_string(), "0/0");
}

#[test]
fn persisted_config_round_trips_through_json() {
    let config = configure();
    let json = serde_json::to_string(&exam(5, config.clone())).unwrap();
    assert!(json.contains("\"targetBatchId\":\"MCA2024\""));
    assert!(json.contains("\"choiceRules\""));

    let back: Exam = serde_json::from_str(&json).unwrap();
    assert_eq!(back.pattern_config, config);
    assert_eq!(back.pattern_config.estimated_total(), 20.0);
}
