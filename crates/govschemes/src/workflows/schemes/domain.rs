use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::normalizer::{normalize_text, tidy_name};

/// Identity key for stored profiles.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub String);

impl UserId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into().trim().to_string())
    }

    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Attribute values carrying a "no constraint" sentinel.
pub trait Wildcard {
    fn is_wildcard(&self) -> bool;
}

/// Raised when free text does not name a known attribute value.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unrecognized {attribute} value '{value}'")]
pub struct AttributeParseError {
    pub attribute: &'static str,
    pub value: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Gender {
    Male,
    Female,
    Other,
    #[default]
    Any,
}

impl Gender {
    pub const fn as_str(self) -> &'static str {
        match self {
            Gender::Male => "male",
            Gender::Female => "female",
            Gender::Other => "other",
            Gender::Any => "any",
        }
    }
}

impl Wildcard for Gender {
    fn is_wildcard(&self) -> bool {
        *self == Gender::Any
    }
}

impl FromStr for Gender {
    type Err = AttributeParseError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match normalize_text(value).as_str() {
            "male" => Ok(Gender::Male),
            "female" => Ok(Gender::Female),
            "other" => Ok(Gender::Other),
            "any" => Ok(Gender::Any),
            _ => Err(AttributeParseError {
                attribute: "gender",
                value: value.to_string(),
            }),
        }
    }
}

/// Yes/no attribute used for student and marital status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Answer {
    Yes,
    No,
    #[default]
    Any,
}

impl Answer {
    pub const fn as_str(self) -> &'static str {
        match self {
            Answer::Yes => "yes",
            Answer::No => "no",
            Answer::Any => "any",
        }
    }
}

impl Wildcard for Answer {
    fn is_wildcard(&self) -> bool {
        *self == Answer::Any
    }
}

impl FromStr for Answer {
    type Err = AttributeParseError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match normalize_text(value).as_str() {
            "yes" | "y" | "true" => Ok(Answer::Yes),
            "no" | "n" | "false" => Ok(Answer::No),
            "any" => Ok(Answer::Any),
            _ => Err(AttributeParseError {
                attribute: "yes/no",
                value: value.to_string(),
            }),
        }
    }
}

macro_rules! string_conversions {
    ($($ty:ty),+) => {
        $(
            impl TryFrom<String> for $ty {
                type Error = AttributeParseError;

                fn try_from(value: String) -> Result<Self, Self::Error> {
                    value.parse()
                }
            }

            impl From<$ty> for String {
                fn from(value: $ty) -> Self {
                    value.as_str().to_string()
                }
            }

            impl fmt::Display for $ty {
                fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                    f.write_str(self.as_str())
                }
            }
        )+
    };
}

string_conversions!(Gender, Answer);

/// Lower-cased state name. `central` on a scheme means every state.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct StateName(String);

impl StateName {
    pub const CENTRAL: &'static str = "central";

    pub fn new(value: &str) -> Self {
        Self(normalize_text(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_central(&self) -> bool {
        self.0 == Self::CENTRAL
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Profile-side reading: blank and `any` defer to the query.
    pub fn preference(value: &str) -> Option<Self> {
        let state = Self::new(value);
        if state.is_empty() || state.0 == "any" {
            None
        } else {
            Some(state)
        }
    }
}

impl Wildcard for StateName {
    fn is_wildcard(&self) -> bool {
        self.is_central()
    }
}

impl From<String> for StateName {
    fn from(value: String) -> Self {
        Self::new(&value)
    }
}

impl From<&str> for StateName {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<StateName> for String {
    fn from(value: StateName) -> Self {
        value.0
    }
}

impl fmt::Display for StateName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Non-negative annual income. On a scheme, zero lifts the income constraint.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct Income(f64);

impl Income {
    pub const UNBOUNDED: Income = Income(0.0);

    pub fn new(value: f64) -> Result<Self, AttributeParseError> {
        if value.is_finite() && value >= 0.0 {
            Ok(Self(value))
        } else {
            Err(AttributeParseError {
                attribute: "income",
                value: value.to_string(),
            })
        }
    }

    pub fn value(self) -> f64 {
        self.0
    }

    pub fn is_unbounded(self) -> bool {
        self.0 == 0.0
    }
}

impl TryFrom<f64> for Income {
    type Error = AttributeParseError;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Income> for f64 {
    fn from(value: Income) -> Self {
        value.0
    }
}

impl FromStr for Income {
    type Err = AttributeParseError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let parsed = value
            .trim()
            .replace(',', "")
            .parse::<f64>()
            .map_err(|_| AttributeParseError {
                attribute: "income",
                value: value.to_string(),
            })?;
        Self::new(parsed)
    }
}

impl fmt::Display for Income {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Attributes a caller supplies for one eligibility search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Query {
    #[serde(default)]
    pub gender: Gender,
    pub age: u32,
    #[serde(default)]
    pub state: StateName,
    #[serde(default)]
    pub income: Income,
    #[serde(default)]
    pub student: Answer,
    #[serde(default)]
    pub married: Answer,
}

impl Query {
    /// Query that only pins age; every other attribute is left open.
    pub fn for_age(age: u32) -> Self {
        Self {
            gender: Gender::Any,
            age,
            state: StateName::default(),
            income: Income::UNBOUNDED,
            student: Answer::Any,
            married: Answer::Any,
        }
    }
}

/// Durable per-user preferences consulted before every search.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub identity: UserId,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub gender: Gender,
    #[serde(default)]
    pub state: Option<StateName>,
    #[serde(default)]
    pub student: Answer,
    #[serde(default)]
    pub married: Answer,
}

impl Profile {
    /// Fresh profile written at sign-up: every preference defers to the query.
    pub fn blank(identity: UserId) -> Self {
        Self {
            identity,
            email: String::new(),
            gender: Gender::Any,
            state: None,
            student: Answer::Any,
            married: Answer::Any,
        }
    }
}

/// Inbound profile edit; identity comes from the caller's context.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileUpdate {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub gender: Gender,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub student: Answer,
    #[serde(default)]
    pub married: Answer,
}

impl ProfileUpdate {
    pub fn into_profile(self, identity: UserId) -> Profile {
        Profile {
            identity,
            email: self.email.trim().to_string(),
            gender: self.gender,
            state: self.state.as_deref().and_then(StateName::preference),
            student: self.student,
            married: self.married,
        }
    }
}

/// Why a scheme could not be admitted to the catalog.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RecordDefect {
    #[error("missing required field '{0}'")]
    MissingField(&'static str),
    #[error("field '{field}' is not a non-negative number: '{value}'")]
    NotNumeric { field: &'static str, value: String },
    #[error(transparent)]
    UnknownValue(#[from] AttributeParseError),
    #[error("start age {start} exceeds end age {end}")]
    InvertedAgeRange { start: u32, end: u32 },
    #[error("unreadable row: {0}")]
    Unreadable(String),
}

/// One catalog entry describing a programme's qualifying criteria.
///
/// Built through [`SchemeRecord::new`], which normalizes text attributes and
/// guarantees `start_age <= end_age`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemeRecord {
    pub name: String,
    pub state: StateName,
    pub gender: Gender,
    pub start_age: u32,
    pub end_age: u32,
    /// Income ceiling; zero means no ceiling.
    pub income: Income,
    pub student: Answer,
    pub married: Answer,
}

impl SchemeRecord {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        name: &str,
        state: &str,
        gender: Gender,
        start_age: u32,
        end_age: u32,
        income: Income,
        student: Answer,
        married: Answer,
    ) -> Result<Self, RecordDefect> {
        let name = tidy_name(name);
        if name.is_empty() {
            return Err(RecordDefect::MissingField("NAME"));
        }

        let state = StateName::new(state);
        if state.is_empty() {
            return Err(RecordDefect::MissingField("STATE"));
        }

        if start_age > end_age {
            return Err(RecordDefect::InvertedAgeRange {
                start: start_age,
                end: end_age,
            });
        }

        Ok(Self {
            name,
            state,
            gender,
            start_age,
            end_age,
            income,
            student,
            married,
        })
    }

    pub fn summary(&self) -> SchemeSummary {
        SchemeSummary {
            name: self.name.clone(),
            state: self.state.clone(),
        }
    }
}

/// Projection used by the "find matches" view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemeSummary {
    pub name: String,
    pub state: StateName,
}

/// Admin-entered scheme awaiting validation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemeDraft {
    pub name: String,
    pub state: String,
    #[serde(default)]
    pub gender: Gender,
    pub start_age: u32,
    pub end_age: u32,
    #[serde(default)]
    pub income: Income,
    #[serde(default)]
    pub student: Answer,
    #[serde(default)]
    pub married: Answer,
}

impl SchemeDraft {
    pub fn validate(self) -> Result<SchemeRecord, RecordDefect> {
        SchemeRecord::new(
            &self.name,
            &self.state,
            self.gender,
            self.start_age,
            self.end_age,
            self.income,
            self.student,
            self.married,
        )
    }
}
