//! Choice rules ("answer any N of questions X–Y").
//!
//! Rules are accepted as given: ranges may overlap, be inverted, or ask for
//! more answers than the range holds. Lookup is first-match by insertion
//! order. [`crate::parser::validate_pattern`] reports the questionable cases.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::SheetError;
use crate::model::ChoiceRule;

/// The choice rules of one pattern, in insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChoiceRuleSet {
    rules: Vec<ChoiceRule>,
}

impl ChoiceRuleSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a rule set from persisted rules, keeping their order.
    pub fn from_rules(rules: Vec<ChoiceRule>) -> Self {
        Self { rules }
    }

    pub fn rules(&self) -> &[ChoiceRule] {
        &self.rules
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Add a rule. Every field must be present; nothing else is checked.
    pub fn add_rule(
        &mut self,
        from_q: Option<u32>,
        to_q: Option<u32>,
        solve_count: Option<u32>,
    ) -> Result<&ChoiceRule, SheetError> {
        let from_q = from_q.ok_or(SheetError::IncompleteRule { field: "fromQ" })?;
        let to_q = to_q.ok_or(SheetError::IncompleteRule { field: "toQ" })?;
        let solve_count = solve_count.ok_or(SheetError::IncompleteRule {
            field: "solveCount",
        })?;

        let rule = ChoiceRule {
            id: Uuid::new_v4(),
            from_q,
            to_q,
            solve_count,
        };
        tracing::debug!(%rule, "added choice rule");
        self.rules.push(rule);
        Ok(&self.rules[self.rules.len() - 1])
    }

    /// Add a rule from raw form input. Blank or non-numeric fields count as
    /// missing.
    pub fn add_rule_raw(
        &mut self,
        from_q: &str,
        to_q: &str,
        solve_count: &str,
    ) -> Result<&ChoiceRule, SheetError> {
        self.add_rule(field(from_q), field(to_q), field(solve_count))
    }

    /// Remove the rule with `id`; absent ids are ignored.
    pub fn remove_rule(&mut self, id: Uuid) {
        self.rules.retain(|r| r.id != id);
    }

    /// The first rule, by insertion order, whose range contains `q_no`.
    pub fn rule_covering(&self, q_no: u32) -> Option<&ChoiceRule> {
        self.rules.iter().find(|r| r.covers(q_no))
    }
}

fn field(raw: &str) -> Option<u32> {
    raw.trim().parse().ok()
}
