use super::domain::{Profile, Query, Wildcard};

/// Folds stored preferences into a one-shot query.
///
/// Gender, state, student and married status take the profile's value
/// unless the profile holds the wildcard. Age and income have no stored
/// counterpart and always come from the query.
pub struct ProfileMerger;

impl ProfileMerger {
    pub fn resolve(query: &Query, profile: Option<&Profile>) -> Query {
        let Some(profile) = profile else {
            return query.clone();
        };

        Query {
            gender: prefer(profile.gender, query.gender),
            age: query.age,
            state: profile
                .state
                .clone()
                .unwrap_or_else(|| query.state.clone()),
            income: query.income,
            student: prefer(profile.student, query.student),
            married: prefer(profile.married, query.married),
        }
    }
}

fn prefer<T: Wildcard + Copy>(stored: T, asked: T) -> T {
    if stored.is_wildcard() {
        asked
    } else {
        stored
    }
}
