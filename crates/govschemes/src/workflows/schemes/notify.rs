use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::domain::{AttributeParseError, Profile, SchemeRecord, Wildcard};
use super::eligibility::admits;
use super::repository::SchemeNotice;

pub(crate) const SCHEME_ADDED_TEMPLATE: &str = "scheme_added";

/// Which stored profiles hear about a newly added scheme.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationAudience {
    /// Every stored profile.
    #[default]
    All,
    /// Only profiles whose stored preferences do not rule the scheme out.
    Matching,
}

impl FromStr for NotificationAudience {
    type Err = AttributeParseError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "all" | "everyone" => Ok(Self::All),
            "matching" | "filtered" => Ok(Self::Matching),
            _ => Err(AttributeParseError {
                attribute: "notification audience",
                value: value.to_string(),
            }),
        }
    }
}

impl NotificationAudience {
    pub fn includes(self, profile: &Profile, record: &SchemeRecord) -> bool {
        match self {
            NotificationAudience::All => true,
            NotificationAudience::Matching => profile_may_qualify(profile, record),
        }
    }
}

/// Age and income are not stored on profiles, so only the four preference
/// attributes are compared. A wildcard on either side passes.
pub(crate) fn profile_may_qualify(profile: &Profile, record: &SchemeRecord) -> bool {
    let gender = profile.gender.is_wildcard() || admits(&record.gender, &profile.gender);
    let state = profile
        .state
        .as_ref()
        .map_or(true, |state| admits(&record.state, state));
    let student = profile.student.is_wildcard() || admits(&record.student, &profile.student);
    let married = profile.married.is_wildcard() || admits(&record.married, &profile.married);

    gender && state && student && married
}

pub(crate) fn scheme_added_notice(profile: &Profile, record: &SchemeRecord) -> SchemeNotice {
    let email = Some(profile.email.trim())
        .filter(|email| !email.is_empty())
        .map(str::to_string);

    SchemeNotice {
        template: SCHEME_ADDED_TEMPLATE.to_string(),
        recipient: profile.identity.clone(),
        email,
        scheme_name: record.name.clone(),
        message: format!(
            "Hello {}, a new scheme '{}' has been added that might be of interest to you. Check it out!",
            profile.identity, record.name
        ),
    }
}
