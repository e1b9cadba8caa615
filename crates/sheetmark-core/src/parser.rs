//! TOML pattern file parser.
//!
//! Loads exam patterns from TOML files and lints them. A pattern file is
//! applied the same way an operator edits a grid: generate the default grid,
//! apply per-question overrides, then add choice rules in file order.

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use serde::Deserialize;

use crate::model::{ExamId, ExamPatternConfig, SubPart};
use crate::pattern::{PatternGrid, QuestionField};
use crate::rules::ChoiceRuleSet;

/// Intermediate TOML structure for pattern files.
#[derive(Debug, Deserialize)]
struct TomlPatternFile {
    #[serde(default)]
    exam: Option<TomlExamHeader>,
    pattern: TomlPatternHeader,
    #[serde(default)]
    questions: Vec<TomlQuestion>,
    #[serde(default)]
    choice_rules: Vec<TomlChoiceRule>,
}

#[derive(Debug, Deserialize)]
struct TomlExamHeader {
    #[serde(default)]
    exam_id: Option<ExamId>,
    #[serde(default)]
    course_code: Option<String>,
    #[serde(default)]
    date: Option<NaiveDate>,
    #[serde(default)]
    series: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TomlPatternHeader {
    target_batch_id: String,
    total_questions: i64,
}

#[derive(Debug, Deserialize)]
struct TomlQuestion {
    q_no: u32,
    #[serde(default)]
    module: Option<i64>,
    #[serde(default)]
    has_sub_questions: Option<bool>,
    #[serde(default)]
    max_marks: Option<u32>,
    #[serde(default)]
    sub_marks: BTreeMap<String, i64>,
}

#[derive(Debug, Deserialize)]
struct TomlChoiceRule {
    #[serde(default)]
    from_q: Option<u32>,
    #[serde(default)]
    to_q: Option<u32>,
    #[serde(default)]
    solve_count: Option<u32>,
}

/// Exam metadata carried by a pattern file. Every field is optional so the
/// CLI can fill gaps from flags.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExamHeader {
    pub exam_id: Option<ExamId>,
    pub course_code: Option<String>,
    pub date: Option<NaiveDate>,
    pub series: Option<String>,
}

/// A parsed pattern file.
#[derive(Debug, Clone)]
pub struct PatternDocument {
    pub exam: ExamHeader,
    pub config: ExamPatternConfig,
}

/// Parse a pattern file from disk.
pub fn parse_pattern_file(path: &Path) -> Result<PatternDocument> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read pattern file: {}", path.display()))?;

    parse_pattern_str(&content, path)
}

/// Parse a TOML string into a `PatternDocument` (useful for testing).
pub fn parse_pattern_str(content: &str, source_path: &Path) -> Result<PatternDocument> {
    let parsed: TomlPatternFile = toml::from_str(content)
        .with_context(|| format!("failed to parse TOML: {}", source_path.display()))?;

    let mut grid = PatternGrid::generate(parsed.pattern.total_questions)
        .with_context(|| format!("invalid [pattern] in {}", source_path.display()))?;

    for q in &parsed.questions {
        apply_question(&mut grid, q)
            .with_context(|| format!("invalid question {} in {}", q.q_no, source_path.display()))?;
    }

    let mut rules = ChoiceRuleSet::new();
    for (i, r) in parsed.choice_rules.iter().enumerate() {
        rules
            .add_rule(r.from_q, r.to_q, r.solve_count)
            .with_context(|| format!("invalid choice rule #{} in {}", i + 1, source_path.display()))?;
    }

    let exam = parsed
        .exam
        .map(|h| ExamHeader {
            exam_id: h.exam_id,
            course_code: h.course_code,
            date: h.date,
            series: h.series,
        })
        .unwrap_or_default();

    Ok(PatternDocument {
        exam,
        config: ExamPatternConfig::from_parts(parsed.pattern.target_batch_id, &grid, &rules),
    })
}

fn apply_question(grid: &mut PatternGrid, q: &TomlQuestion) -> Result<()> {
    if let Some(module) = q.module {
        grid.set_field(q.q_no, QuestionField::Module(module))?;
    }
    if let Some(max_marks) = q.max_marks {
        grid.set_field(q.q_no, QuestionField::MaxMarks(max_marks))?;
    }
    for (label, value) in &q.sub_marks {
        let part: SubPart = label.parse().map_err(|e: String| anyhow::anyhow!("{}", e))?;
        grid.set_sub_mark(q.q_no, part, *value)?;
    }
    // Listing sub-marks implies sub-questions unless the file says otherwise.
    let has_sub = q.has_sub_questions.unwrap_or(!q.sub_marks.is_empty());
    grid.set_field(q.q_no, QuestionField::HasSubQuestions(has_sub))?;
    Ok(())
}

/// A warning from pattern validation.
#[derive(Debug, Clone)]
pub struct ValidationWarning {
    /// What the warning is about, e.g. `Q3` or `rule Q6-Q9 (answer any 2)`.
    pub location: Option<String>,
    /// Warning message.
    pub message: String,
}

/// Lint a pattern for questionable but accepted configurations.
///
/// Nothing reported here is rejected by the grid or the rule set; these are
/// hints for the operator.
pub fn validate_pattern(config: &ExamPatternConfig) -> Vec<ValidationWarning> {
    let mut warnings = Vec::new();

    if config.questions.len() as u32 != config.total_questions {
        warnings.push(ValidationWarning {
            location: None,
            message: format!(
                "totalQuestions is {} but {} questions are defined",
                config.total_questions,
                config.questions.len()
            ),
        });
    }

    for (i, q) in config.questions.iter().enumerate() {
        let expected = i as u32 + 1;
        if q.q_no != expected {
            warnings.push(ValidationWarning {
                location: Some(format!("Q{}", q.q_no)),
                message: format!("questions are not numbered contiguously (expected Q{expected})"),
            });
            break;
        }
    }

    for q in &config.questions {
        if !q.has_sub_questions {
            continue;
        }
        let sub_total = q.sub_marks.total();
        if sub_total == 0 {
            warnings.push(ValidationWarning {
                location: Some(format!("Q{}", q.q_no)),
                message: "has sub-questions but every sub-mark is zero".into(),
            });
        } else if sub_total != q.max_marks {
            warnings.push(ValidationWarning {
                location: Some(format!("Q{}", q.q_no)),
                message: format!(
                    "maxMarks {} does not match sub-mark total {sub_total}",
                    q.max_marks
                ),
            });
        }
    }

    for (i, rule) in config.choice_rules.iter().enumerate() {
        let location = Some(format!("rule {rule}"));
        if rule.from_q > rule.to_q {
            warnings.push(ValidationWarning {
                location: location.clone(),
                message: "range is inverted and covers no question".into(),
            });
            continue;
        }
        let in_grid = config
            .questions
            .iter()
            .filter(|q| rule.covers(q.q_no))
            .count();
        if in_grid == 0 {
            warnings.push(ValidationWarning {
                location: location.clone(),
                message: "range covers no question in the grid".into(),
            });
        } else if u64::from(rule.to_q - rule.from_q) + 1 != in_grid as u64 {
            warnings.push(ValidationWarning {
                location: location.clone(),
                message: format!("range extends past the grid; only {in_grid} question(s) covered"),
            });
        }
        if rule.solve_count == 0 {
            warnings.push(ValidationWarning {
                location: location.clone(),
                message: "solveCount is zero; the block contributes nothing".into(),
            });
        } else if rule.solve_count as usize > in_grid && in_grid > 0 {
            warnings.push(ValidationWarning {
                location: location.clone(),
                message: format!(
                    "solveCount {} exceeds the {in_grid} question(s) in range",
                    rule.solve_count
                ),
            });
        }
        for earlier in &config.choice_rules[..i] {
            if earlier.from_q <= earlier.to_q
                && rule.from_q <= earlier.to_q
                && earlier.from_q <= rule.to_q
            {
                warnings.push(ValidationWarning {
                    location: location.clone(),
                    message: format!("overlaps rule {earlier}, which takes precedence"),
                });
            }
        }
    }

    warnings
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    const VALID_TOML: &str = r#"
[exam]
exam_id = 42
course_code = "20MCA201"
date = "2026-03-14"
series = "Series 1"

[pattern]
target_batch_id = "MCA2024"
total_questions = 9

[[questions]]
q_no = 1
module = 1
max_marks = 3

[[questions]]
q_no = 2
module = 2
sub_marks = { a = 4, b = 3 }

[[choice_rules]]
from_q = 6
to_q = 9
solve_count = 2
"#;

    fn parse(toml: &str) -> Result<PatternDocument> {
        parse_pattern_str(toml, &PathBuf::from("test.toml"))
    }

    #[test]
    fn parse_valid_toml() {
        let doc = parse(VALID_TOML).unwrap();
        assert_eq!(doc.exam.exam_id, Some(42));
        assert_eq!(doc.exam.course_code.as_deref(), Some("20MCA201"));
        assert_eq!(
            doc.exam.date,
            Some(NaiveDate::from_ymd_opt(2026, 3, 14).unwrap())
        );

        let config = &doc.config;
        assert_eq!(config.target_batch_id, "MCA2024");
        assert_eq!(config.total_questions, 9);
        assert_eq!(config.questions[0].max_marks, 3);

        let q2 = &config.questions[1];
        assert!(q2.has_sub_questions);
        assert_eq!(q2.module, 2);
        assert_eq!(q2.max_marks, 7);

        assert_eq!(config.choice_rules.len(), 1);
        // 3 + 7 + 3 * 5 + (2/4 * 5) * 4
        assert_eq!(config.estimated_total(), 35.0);
        assert!(validate_pattern(config).is_empty());
    }

    #[test]
    fn parse_minimal_pattern() {
        let toml = r#"
[pattern]
target_batch_id = "B1"
total_questions = 4
"#;
        let doc = parse(toml).unwrap();
        assert_eq!(doc.exam, ExamHeader::default());
        assert_eq!(doc.config.questions.len(), 4);
        assert_eq!(doc.config.estimated_total(), 20.0);
    }

    #[test]
    fn zero_questions_is_an_error() {
        let toml = r#"
[pattern]
target_batch_id = "B1"
total_questions = 0
"#;
        let err = parse(toml).unwrap_err();
        assert!(format!("{err:#}").contains("at least one question"));
    }

    #[test]
    fn incomplete_rule_is_an_error() {
        let toml = r#"
[pattern]
target_batch_id = "B1"
total_questions = 4

[[choice_rules]]
from_q = 1
solve_count = 1
"#;
        let err = parse(toml).unwrap_err();
        let message = format!("{err:#}");
        assert!(message.contains("choice rule #1"));
        assert!(message.contains("toQ"));
    }

    #[test]
    fn question_outside_grid_is_an_error() {
        let toml = r#"
[pattern]
target_batch_id = "B1"
total_questions = 2

[[questions]]
q_no = 5
max_marks = 2
"#;
        assert!(parse(toml).is_err());
    }

    #[test]
    fn unknown_sub_part_is_an_error() {
        let toml = r#"
[pattern]
target_batch_id = "B1"
total_questions = 1

[[questions]]
q_no = 1
sub_marks = { e = 2 }
"#;
        let err = parse(toml).unwrap_err();
        assert!(format!("{err:#}").contains("unknown sub-question part"));
    }

    #[test]
    fn parse_malformed_toml() {
        assert!(parse("this is not [valid toml }{").is_err());
    }

    #[test]
    fn lint_reports_malformed_rules() {
        let toml = r#"
[pattern]
target_batch_id = "B1"
total_questions = 6

[[choice_rules]]
from_q = 5
to_q = 3
solve_count = 1

[[choice_rules]]
from_q = 1
to_q = 2
solve_count = 3

[[choice_rules]]
from_q = 2
to_q = 8
solve_count = 0
"#;
        let doc = parse(toml).unwrap();
        let warnings = validate_pattern(&doc.config);
        let has = |needle: &str| warnings.iter().any(|w| w.message.contains(needle));
        assert!(has("inverted"));
        assert!(has("exceeds"));
        assert!(has("zero"));
        assert!(has("extends past the grid"));
        assert!(has("overlaps"));
    }

    #[test]
    fn lint_reports_empty_sub_questions() {
        let toml = r#"
[pattern]
target_batch_id = "B1"
total_questions = 2

[[questions]]
q_no = 2
has_sub_questions = true
"#;
        let doc = parse(toml).unwrap();
        let warnings = validate_pattern(&doc.config);
        assert_eq!(warnings.len(), 1);
        assert!(warnings
            .iter()
            .any(|w| w.location.as_deref() == Some("Q2") && w.message.contains("zero")));
    }

    #[test]
    fn parse_file_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pattern.toml");
        std::fs::write(&path, VALID_TOML).unwrap();
        let doc = parse_pattern_file(&path).unwrap();
        assert_eq!(doc.config.total_questions, 9);

        assert!(parse_pattern_file(&dir.path().join("missing.toml")).is_err());
    }
}
