//! Score aggregation.
//!
//! Two separate totals are computed here and never mixed:
//!
//! - [`estimated_total`]: the nominal full-marks ceiling of a pattern. Each
//!   question inside a choice block is credited its proportional share of the
//!   block's "best N" allowance, so a block may contribute a fractional
//!   amount.
//! - [`entered_total`]: what one student actually scored, the literal sum of
//!   the marks entered for their sheet. Choice rules do not apply.

use std::collections::BTreeMap;

use crate::pattern::PatternGrid;
use crate::rules::ChoiceRuleSet;

/// Expected maximum of a pattern under its choice rules, rounded to two
/// decimals.
///
/// A question covered by rule `r` contributes
/// `r.solve_count / k * max_marks`, where `k` is the number of grid questions
/// inside `r`'s range. Uncovered questions contribute `max_marks` in full.
/// Rounding is applied once, to the sum.
pub fn estimated_total(grid: &PatternGrid, rules: &ChoiceRuleSet) -> f64 {
    let questions = grid.questions();
    let raw: f64 = questions
        .iter()
        .map(|q| match rules.rule_covering(q.q_no) {
            Some(rule) => {
                let in_range = questions.iter().filter(|other| rule.covers(other.q_no)).count();
                f64::from(rule.solve_count) / in_range as f64 * f64::from(q.max_marks)
            }
            None => f64::from(q.max_marks),
        })
        .sum();
    round_2dp(raw)
}

/// Literal sum of the marks entered for a sheet, saturating at the `i64`
/// bounds.
pub fn entered_total(marks: &BTreeMap<String, i64>) -> i64 {
    marks.values().copied().fold(0, i64::saturating_add)
}

/// Half-up rounding to two decimal places. Estimates are never negative, so
/// `f64::round` (half away from zero) is half-up here.
fn round_2dp(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
