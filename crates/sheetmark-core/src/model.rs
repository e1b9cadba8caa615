//! Core data model types for sheetmark.
//!
//! These are the records shared by pattern configuration, scoring and
//! digitization: questions, choice rules, exams, students and the per-student
//! digitization state.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::pattern::PatternGrid;
use crate::rules::ChoiceRuleSet;
use crate::scoring;

/// Natural identifier of an exam record.
pub type ExamId = u64;

/// Default maximum marks for a freshly generated question.
pub const DEFAULT_MAX_MARKS: u32 = 5;

/// Label of a sub-question part.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubPart {
    A,
    B,
    C,
    D,
}

impl SubPart {
    /// All parts in sheet order.
    pub const ALL: [SubPart; 4] = [SubPart::A, SubPart::B, SubPart::C, SubPart::D];

    pub fn as_str(&self) -> &'static str {
        match self {
            SubPart::A => "a",
            SubPart::B => "b",
            SubPart::C => "c",
            SubPart::D => "d",
        }
    }
}

impl fmt::Display for SubPart {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SubPart {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "a" => Ok(SubPart::A),
            "b" => Ok(SubPart::B),
            "c" => Ok(SubPart::C),
            "d" => Ok(SubPart::D),
            other => Err(format!("unknown sub-question part: {other}")),
        }
    }
}

/// Marks allotted to each sub-question part. Unused parts stay at zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubMarks {
    #[serde(default)]
    pub a: u32,
    #[serde(default)]
    pub b: u32,
    #[serde(default)]
    pub c: u32,
    #[serde(default)]
    pub d: u32,
}

impl SubMarks {
    pub fn get(&self, part: SubPart) -> u32 {
        match part {
            SubPart::A => self.a,
            SubPart::B => self.b,
            SubPart::C => self.c,
            SubPart::D => self.d,
        }
    }

    pub fn set(&mut self, part: SubPart, value: u32) {
        match part {
            SubPart::A => self.a = value,
            SubPart::B => self.b = value,
            SubPart::C => self.c = value,
            SubPart::D => self.d = value,
        }
    }

    /// Sum of all four parts, saturating at `u32::MAX`.
    pub fn total(&self) -> u32 {
        [self.a, self.b, self.c, self.d]
            .into_iter()
            .fold(0, u32::saturating_add)
    }
}

/// A single question on the answer sheet.
///
/// When `has_sub_questions` is set, `max_marks` is derived from `sub_marks`;
/// the grid keeps it in sync on every sub-mark write.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    /// Question number, 1-based and contiguous within a pattern.
    #[serde(alias = "q_no")]
    pub q_no: u32,
    /// Informational syllabus module tag.
    #[serde(default = "default_module")]
    pub module: i64,
    #[serde(default, alias = "has_sub_questions")]
    pub has_sub_questions: bool,
    #[serde(alias = "max_marks")]
    pub max_marks: u32,
    #[serde(default, alias = "sub_marks")]
    pub sub_marks: SubMarks,
}

impl Question {
    /// A question with the defaults used when a grid is generated.
    pub fn new(q_no: u32) -> Self {
        Self {
            q_no,
            module: default_module(),
            has_sub_questions: false,
            max_marks: DEFAULT_MAX_MARKS,
            sub_marks: SubMarks::default(),
        }
    }

    /// Sub-parts that carry marks, in sheet order.
    pub fn active_parts(&self) -> impl Iterator<Item = SubPart> + '_ {
        SubPart::ALL
            .into_iter()
            .filter(move |part| self.sub_marks.get(*part) > 0)
    }
}

fn default_module() -> i64 {
    1
}

/// "Answer any `solve_count` of questions `from_q..=to_q`".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChoiceRule {
    pub id: Uuid,
    #[serde(alias = "from_q")]
    pub from_q: u32,
    #[serde(alias = "to_q")]
    pub to_q: u32,
    #[serde(alias = "solve_count")]
    pub solve_count: u32,
}

impl ChoiceRule {
    /// Whether `q_no` falls inside this rule's inclusive range.
    pub fn covers(&self, q_no: u32) -> bool {
        q_no >= self.from_q && q_no <= self.to_q
    }
}

impl fmt::Display for ChoiceRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Q{}-Q{} (answer any {})",
            self.from_q, self.to_q, self.solve_count
        )
    }
}

/// The pattern an exam is graded against.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExamPatternConfig {
    /// Batch whose students sit this exam.
    #[serde(alias = "target_batch_id")]
    pub target_batch_id: String,
    #[serde(alias = "total_questions")]
    pub total_questions: u32,
    #[serde(default)]
    pub questions: Vec<Question>,
    #[serde(default, alias = "choice_rules")]
    pub choice_rules: Vec<ChoiceRule>,
}

impl ExamPatternConfig {
    /// Snapshot a grid and its rules into a persistable config.
    pub fn from_parts(
        target_batch_id: impl Into<String>,
        grid: &PatternGrid,
        rules: &ChoiceRuleSet,
    ) -> Self {
        Self {
            target_batch_id: target_batch_id.into(),
            total_questions: grid.total_questions(),
            questions: grid.questions().to_vec(),
            choice_rules: rules.rules().to_vec(),
        }
    }

    pub fn grid(&self) -> PatternGrid {
        PatternGrid::from_questions(self.questions.clone())
    }

    pub fn rule_set(&self) -> ChoiceRuleSet {
        ChoiceRuleSet::from_rules(self.choice_rules.clone())
    }

    /// See [`scoring::estimated_total`].
    pub fn estimated_total(&self) -> f64 {
        scoring::estimated_total(&self.grid(), &self.rule_set())
    }
}

/// Lifecycle of an exam record.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExamStatus {
    #[default]
    Scheduled,
    Completed,
    Published,
}

impl fmt::Display for ExamStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExamStatus::Scheduled => write!(f, "scheduled"),
            ExamStatus::Completed => write!(f, "completed"),
            ExamStatus::Published => write!(f, "published"),
        }
    }
}

/// An exam record. Created once at configuration time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Exam {
    #[serde(alias = "exam_id")]
    pub exam_id: ExamId,
    #[serde(alias = "course_code")]
    pub course_code: String,
    pub date: NaiveDate,
    /// Series label, e.g. "Series 1".
    #[serde(alias = "series_type")]
    pub series_type: String,
    #[serde(alias = "pattern_config")]
    pub pattern_config: ExamPatternConfig,
    #[serde(default)]
    pub status: ExamStatus,
}

/// A student as held by the record store. Read-only to the engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentRecord {
    /// University roll identifier, e.g. `TVE21MCA023`.
    #[serde(alias = "ktu_id")]
    pub ktu_id: String,
    #[serde(alias = "student_name")]
    pub student_name: String,
    #[serde(alias = "batch_id")]
    pub batch_id: String,
}

/// Digitization state of one student's sheet.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntryStatus {
    #[default]
    Pending,
    Done,
}

impl fmt::Display for EntryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntryStatus::Pending => write!(f, "Pending"),
            EntryStatus::Done => write!(f, "Done"),
        }
    }
}

/// Per-student row of a digitization session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DigitizationEntry {
    pub ktu_id: String,
    pub status: EntryStatus,
    /// Entered total; zero until the sheet is saved.
    pub total: i64,
}

impl DigitizationEntry {
    pub fn pending(ktu_id: impl Into<String>) -> Self {
        Self {
            ktu_id: ktu_id.into(),
            status: EntryStatus::Pending,
            total: 0,
        }
    }
}

/// The sheet currently being verified by the grader.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CapturedSheet {
    /// Roll number suffix as read from the sheet (or corrected by the grader).
    pub detected_roll_suffix: String,
    /// Mark-key (`"3"` or `"3_a"`) to entered mark.
    #[serde(default)]
    pub marks: BTreeMap<String, i64>,
}

/// Persisted result of a saved sheet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DraftMarks {
    #[serde(alias = "exam_id")]
    pub exam_id: ExamId,
    #[serde(alias = "ktu_id")]
    pub ktu_id: String,
    #[serde(default, alias = "q_marks_json")]
    pub marks: BTreeMap<String, i64>,
    #[serde(alias = "total_obtained")]
    pub total_obtained: i64,
    #[serde(default, alias = "is_absent")]
    pub is_absent: bool,
}

/// Key under which a mark is entered: `"<q_no>"` or `"<q_no>_<part>"`.
pub fn mark_key(q_no: u32, part: Option<SubPart>) -> String {
    match part {
        Some(part) => format!("{q_no}_{part}"),
        None => q_no.to_string(),
    }
}

/// The mark-keys a grader fills in for a pattern, in sheet order, paired with
/// the maximum each key can carry.
///
/// Questions with sub-questions contribute one key per part with a positive
/// sub-mark; all others contribute a single key.
pub fn mark_keys(questions: &[Question]) -> Vec<(String, u32)> {
    let mut keys = Vec::new();
    for q in questions {
        if q.has_sub_questions {
            for part in q.active_parts() {
                keys.push((mark_key(q.q_no, Some(part)), q.sub_marks.get(part)));
            }
        } else {
            keys.push((mark_key(q.q_no, None), q.max_marks));
        }
    }
    keys
}

/// Lenient integer parse used for grader input.
///
/// Reads an optional sign followed by leading digits, ignoring surrounding
/// whitespace and any trailing garbage (`"7 marks"` is 7). Anything without a
/// leading number, including the empty string, is 0.
pub fn parse_int_or_zero(raw: &str) -> i64 {
    let s = raw.trim_start();
    let (negative, digits) = match s.as_bytes().first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        _ => (false, s),
    };
    let end = digits
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(digits.len());
    let value = digits[..end]
        .bytes()
        .fold(0i64, |acc, b| acc.saturating_mul(10).saturating_add(i64::from(b - b'0')));
    if negative {
        -value
    } else {
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sub_part_display_and_parse() {
        assert_eq!(SubPart::A.to_string(), "a");
        assert_eq!("C".parse::<SubPart>().unwrap(), SubPart::C);
        assert!("e".parse::<SubPart>().is_err());
    }

    #[test]
    fn parse_int_or_zero_is_lenient() {
        assert_eq!(parse_int_or_zero("12"), 12);
        assert_eq!(parse_int_or_zero("  7 marks"), 7);
        assert_eq!(parse_int_or_zero("-3"), -3);
        assert_eq!(parse_int_or_zero("+4"), 4);
        assert_eq!(parse_int_or_zero(""), 0);
        assert_eq!(parse_int_or_zero("abc"), 0);
        assert_eq!(parse_int_or_zero("-"), 0);
    }

    #[test]
    fn mark_keys_follow_sheet_layout() {
        let mut q2 = Question::new(2);
        q2.has_sub_questions = true;
        q2.sub_marks = SubMarks {
            a: 3,
            b: 0,
            c: 2,
            d: 0,
        };
        let keys = mark_keys(&[Question::new(1), q2]);
        assert_eq!(
            keys,
            vec![
                ("1".to_string(), 5),
                ("2_a".to_string(), 3),
                ("2_c".to_string(), 2)
            ]
        );
    }

    #[test]
    fn pattern_config_accepts_snake_case_records() {
        let json = r#"{
            "target_batch_id": "MCA2024",
            "total_questions": 1,
            "questions": [
                {"qNo": 1, "module": 2, "hasSubQuestions": false, "maxMarks": 10,
                 "subMarks": {"a": 0, "b": 0, "c": 0, "d": 0}}
            ],
            "choice_rules": []
        }"#;
        let config: ExamPatternConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.target_batch_id, "MCA2024");
        assert_eq!(config.questions[0].max_marks, 10);
        assert_eq!(config.questions[0].module, 2);
    }

    #[test]
    fn question_serializes_with_camel_case_names() {
        let json = serde_json::to_value(Question::new(4)).unwrap();
        assert_eq!(json["qNo"], 4);
        assert_eq!(json["hasSubQuestions"], false);
        assert_eq!(json["maxMarks"], 5);
        assert_eq!(json["subMarks"]["d"], 0);
    }
}
