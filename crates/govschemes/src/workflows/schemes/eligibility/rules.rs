use super::super::domain::{Query, SchemeRecord, Wildcard};
use super::Criterion;

/// A scheme requirement admits an offered value when they agree or the
/// requirement is the wildcard.
pub(crate) fn admits<T: Wildcard + PartialEq>(required: &T, offered: &T) -> bool {
    required == offered || required.is_wildcard()
}

pub(crate) fn passes(criterion: Criterion, record: &SchemeRecord, query: &Query) -> bool {
    match criterion {
        Criterion::Gender => admits(&record.gender, &query.gender),
        Criterion::Age => record.start_age <= query.age && query.age <= record.end_age,
        Criterion::State => admits(&record.state, &query.state),
        // The stored figure behaves as an income ceiling.
        Criterion::Income => record.income.is_unbounded() || record.income >= query.income,
        Criterion::Student => admits(&record.student, &query.student),
        Criterion::Married => admits(&record.married, &query.married),
    }
}

pub(crate) fn describe(criterion: Criterion, record: &SchemeRecord, query: &Query) -> String {
    match criterion {
        Criterion::Gender => format!(
            "scheme gender '{}' against '{}'",
            record.gender, query.gender
        ),
        Criterion::Age => format!(
            "age {} against range {}-{}",
            query.age, record.start_age, record.end_age
        ),
        Criterion::State => format!("scheme state '{}' against '{}'", record.state, query.state),
        Criterion::Income if record.income.is_unbounded() => {
            "scheme has no income ceiling".to_string()
        }
        Criterion::Income => format!(
            "income {} against ceiling {}",
            query.income, record.income
        ),
        Criterion::Student => format!(
            "scheme student status '{}' against '{}'",
            record.student, query.student
        ),
        Criterion::Married => format!(
            "scheme marital status '{}' against '{}'",
            record.married, query.married
        ),
    }
}
