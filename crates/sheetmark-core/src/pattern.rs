//! The question grid of an exam pattern.

use serde::{Deserialize, Serialize};

use crate::error::SheetError;
use crate::model::{parse_int_or_zero, Question, SubPart};

/// A single editable field of a question, other than its sub-marks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuestionField {
    Module(i64),
    HasSubQuestions(bool),
    MaxMarks(u32),
}

/// Ordered questions `1..=N` of a pattern.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatternGrid {
    questions: Vec<Question>,
}

impl PatternGrid {
    /// Generate a fresh grid of `total_questions` default questions.
    ///
    /// Signed input so that zero and negative counts from a form can be
    /// rejected instead of wrapping.
    pub fn generate(total_questions: i64) -> Result<Self, SheetError> {
        let count = u32::try_from(total_questions)
            .ok()
            .filter(|n| *n >= 1)
            .ok_or(SheetError::InvalidCount(total_questions))?;
        let questions = (1..=count).map(Question::new).collect();
        tracing::debug!(count, "generated pattern grid");
        Ok(Self { questions })
    }

    /// Replace this grid with a freshly generated one. Prior per-question
    /// edits are discarded; on error the grid is left as it was.
    pub fn regenerate(&mut self, total_questions: i64) -> Result<(), SheetError> {
        *self = Self::generate(total_questions)?;
        Ok(())
    }

    /// Rebuild a grid from persisted questions, ordered by question number.
    pub fn from_questions(mut questions: Vec<Question>) -> Self {
        questions.sort_by_key(|q| q.q_no);
        Self { questions }
    }

    pub fn total_questions(&self) -> u32 {
        self.questions.len() as u32
    }

    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    pub fn question(&self, q_no: u32) -> Option<&Question> {
        self.questions.iter().find(|q| q.q_no == q_no)
    }

    fn question_mut(&mut self, q_no: u32) -> Result<&mut Question, SheetError> {
        self.questions
            .iter_mut()
            .find(|q| q.q_no == q_no)
            .ok_or(SheetError::UnknownQuestion(q_no))
    }

    /// Update `module`, `has_sub_questions` or `max_marks` in place.
    /// Sub-marks are never touched.
    pub fn set_field(&mut self, q_no: u32, field: QuestionField) -> Result<(), SheetError> {
        let question = self.question_mut(q_no)?;
        match field {
            QuestionField::Module(module) => question.module = module,
            QuestionField::HasSubQuestions(flag) => question.has_sub_questions = flag,
            QuestionField::MaxMarks(marks) => question.max_marks = marks,
        }
        Ok(())
    }

    /// Set one sub-mark (negative values clamp to 0) and recompute
    /// `max_marks` as the sum of all four parts.
    ///
    /// The recomputation happens whether or not the question currently has
    /// sub-questions enabled.
    pub fn set_sub_mark(&mut self, q_no: u32, part: SubPart, value: i64) -> Result<(), SheetError> {
        let question = self.question_mut(q_no)?;
        let clamped = u32::try_from(value.max(0)).unwrap_or(u32::MAX);
        question.sub_marks.set(part, clamped);
        question.max_marks = question.sub_marks.total();
        Ok(())
    }

    /// Like [`set_sub_mark`](Self::set_sub_mark) but for raw form input;
    /// non-numeric text counts as 0.
    pub fn set_sub_mark_raw(&mut self, q_no: u32, part: SubPart, raw: &str) -> Result<(), SheetError> {
        self.set_sub_mark(q_no, part, parse_int_or_zero(raw))
    }

    /// Sum of every question's `max_marks`, ignoring choice rules.
    pub fn sum_of_max_marks(&self) -> u64 {
        self.questions.iter().map(|q| u64::from(q.max_marks)).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn huge_sub_marks_saturate_max_marks() {
        let mut grid = PatternGrid::generate(1).unwrap();
        grid.set_sub_mark_raw(1, SubPart::A, "4294967295").unwrap();
        grid.set_sub_mark_raw(1, SubPart::B, "1").unwrap();
        let q = grid.question(1).unwrap();
        assert_eq!(q.sub_marks.get(SubPart::B), 1);
        assert_eq!(q.max_marks, u32::MAX);
    }

    #[test]
    fn generate_uses_defaults() {
        let grid = PatternGrid::generate(3).unwrap();
        assert_eq!(grid.total_questions(), 3);
        let numbers: Vec<u32> = grid.questions().iter().map(|q| q.q_no).collect();
        assert_eq!(numbers, vec![1, 2, 3]);
        for q in grid.questions() {
            assert_eq!(q.module, 1);
            assert!(!q.has_sub_questions);
            assert_eq!(q.max_marks, 5);
            assert_eq!(q.sub_marks.total(), 0);
        }
    }

    #[test]
    fn generate_rejects_empty_grid() {
        assert!(matches!(
            PatternGrid::generate(0),
            Err(SheetError::InvalidCount(0))
        ));
        assert!(matches!(
            PatternGrid::generate(-4),
            Err(SheetError::InvalidCount(-4))
        ));
    }

    #[test]
    fn regenerate_discards_edits() {
        let mut grid = PatternGrid::generate(2).unwrap();
        grid.set_field(1, QuestionField::MaxMarks(12)).unwrap();
        grid.regenerate(4).unwrap();
        assert_eq!(grid.total_questions(), 4);
        assert_eq!(grid.question(1).unwrap().max_marks, 5);
    }

    #[test]
    fn failed_regenerate_keeps_grid() {
        let mut grid = PatternGrid::generate(2).unwrap();
        grid.set_field(2, QuestionField::Module(3)).unwrap();
        assert!(grid.regenerate(0).is_err());
        assert_eq!(grid.total_questions(), 2);
        assert_eq!(grid.question(2).unwrap().module, 3);
    }

    #[test]
    fn set_field_leaves_sub_marks_alone() {
        let mut grid = PatternGrid::generate(1).unwrap();
        grid.set_sub_mark(1, SubPart::A, 4).unwrap();
        grid.set_field(1, QuestionField::MaxMarks(9)).unwrap();
        grid.set_field(1, QuestionField::HasSubQuestions(true)).unwrap();
        let q = grid.question(1).unwrap();
        assert_eq!(q.max_marks, 9);
        assert_eq!(q.sub_marks.a, 4);
        assert!(q.has_sub_questions);
    }

    #[test]
    fn sub_mark_updates_keep_max_marks_in_sync() {
        let mut grid = PatternGrid::generate(1).unwrap();
        grid.set_field(1, QuestionField::HasSubQuestions(true)).unwrap();
        let steps = [
            (SubPart::A, 3),
            (SubPart::B, 4),
            (SubPart::D, 2),
            (SubPart::B, 0),
            (SubPart::C, -6),
        ];
        for (part, value) in steps {
            grid.set_sub_mark(1, part, value).unwrap();
            let q = grid.question(1).unwrap();
            let s = q.sub_marks;
            assert_eq!(q.max_marks, s.a + s.b + s.c + s.d);
        }
        assert_eq!(grid.question(1).unwrap().max_marks, 5);
        assert_eq!(grid.question(1).unwrap().sub_marks.c, 0);
    }

    #[test]
    fn sub_marks_recompute_while_sub_questions_disabled() {
        let mut grid = PatternGrid::generate(1).unwrap();
        grid.set_sub_mark(1, SubPart::A, 6).unwrap();
        grid.set_sub_mark(1, SubPart::B, 4).unwrap();
        assert_eq!(grid.question(1).unwrap().max_marks, 10);

        grid.set_field(1, QuestionField::HasSubQuestions(true)).unwrap();
        assert_eq!(grid.question(1).unwrap().max_marks, 10);
    }

    #[test]
    fn raw_sub_mark_input_coerces_to_zero() {
        let mut grid = PatternGrid::generate(1).unwrap();
        grid.set_sub_mark_raw(1, SubPart::A, "7").unwrap();
        grid.set_sub_mark_raw(1, SubPart::B, "seven").unwrap();
        grid.set_sub_mark_raw(1, SubPart::C, "").unwrap();
        let q = grid.question(1).unwrap();
        assert_eq!(q.sub_marks.b, 0);
        assert_eq!(q.max_marks, 7);
    }

    #[test]
    fn unknown_question_is_rejected() {
        let mut grid = PatternGrid::generate(2).unwrap();
        assert!(matches!(
            grid.set_field(3, QuestionField::Module(2)),
            Err(SheetError::UnknownQuestion(3))
        ));
        assert!(grid.set_sub_mark(0, SubPart::A, 1).is_err());
    }
}
