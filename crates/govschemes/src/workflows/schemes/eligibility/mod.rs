mod rules;

pub(crate) use rules::admits;

use super::domain::{Query, SchemeRecord};
use serde::{Deserialize, Serialize};

/// Stateless evaluator matching a resolved query against catalog records.
///
/// A record qualifies only when every [`Criterion`] passes. The filter never
/// fails: malformed rows are rejected when the catalog is loaded.
#[derive(Debug, Clone, Copy, Default)]
pub struct EligibilityFilter;

impl EligibilityFilter {
    pub fn new() -> Self {
        Self
    }

    pub fn is_eligible(&self, query: &Query, record: &SchemeRecord) -> bool {
        Criterion::ALL
            .iter()
            .all(|criterion| rules::passes(*criterion, record, query))
    }

    /// Matching records in catalog order.
    pub fn matching<'a>(&self, query: &Query, catalog: &'a [SchemeRecord]) -> Vec<&'a SchemeRecord> {
        catalog
            .iter()
            .filter(|record| self.is_eligible(query, record))
            .collect()
    }

    /// Per-criterion audit trail for a single record.
    pub fn explain(&self, query: &Query, record: &SchemeRecord) -> Vec<CriterionCheck> {
        Criterion::ALL
            .iter()
            .map(|criterion| CriterionCheck {
                criterion: *criterion,
                passed: rules::passes(*criterion, record, query),
                notes: rules::describe(*criterion, record, query),
            })
            .collect()
    }
}

/// The six conjunctive eligibility predicates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Criterion {
    Gender,
    Age,
    State,
    Income,
    Student,
    Married,
}

impl Criterion {
    pub const ALL: [Criterion; 6] = [
        Criterion::Gender,
        Criterion::Age,
        Criterion::State,
        Criterion::Income,
        Criterion::Student,
        Criterion::Married,
    ];

    pub const fn label(self) -> &'static str {
        match self {
            Criterion::Gender => "gender",
            Criterion::Age => "age",
            Criterion::State => "state",
            Criterion::Income => "income",
            Criterion::Student => "student",
            Criterion::Married => "married",
        }
    }
}

/// Outcome of one criterion, allowing transparent audits of a rejection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CriterionCheck {
    pub criterion: Criterion,
    pub passed: bool,
    pub notes: String,
}
