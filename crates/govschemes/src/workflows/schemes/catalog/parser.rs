use std::io::Read;

use serde::{Deserialize, Deserializer, Serialize};

use super::super::domain::{Answer, Gender, Income, RecordDefect, SchemeRecord};
use super::{CatalogLoad, MalformedRecordError};

pub(crate) const CATALOG_HEADERS: [&str; 8] = [
    "NAME",
    "STATE",
    "GENDER",
    "START AGE",
    "END AGE",
    "INCOME",
    "STUDENT",
    "MARRIED",
];

pub(crate) fn parse_catalog<R: Read>(reader: R) -> Result<CatalogLoad, csv::Error> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(reader);
    csv_reader.headers()?;

    let mut load = CatalogLoad::default();
    for (index, row) in csv_reader.deserialize::<SchemeRow>().enumerate() {
        let row_number = index + 1;
        let outcome = match row {
            Ok(row) => {
                let name = row.name.clone();
                row.into_record().map_err(|defect| MalformedRecordError {
                    row: row_number,
                    name,
                    defect,
                })
            }
            Err(err) => Err(MalformedRecordError {
                row: row_number,
                name: None,
                defect: RecordDefect::Unreadable(err.to_string()),
            }),
        };

        match outcome {
            Ok(record) => load.records.push(record),
            Err(rejected) => load.rejected.push(rejected),
        }
    }

    Ok(load)
}

/// Raw catalog row as laid out in the CSV file.
#[derive(Debug, Default, Serialize, Deserialize)]
pub(crate) struct SchemeRow {
    #[serde(rename = "NAME", default, deserialize_with = "empty_string_as_none")]
    name: Option<String>,
    #[serde(rename = "STATE", default, deserialize_with = "empty_string_as_none")]
    state: Option<String>,
    #[serde(rename = "GENDER", default, deserialize_with = "empty_string_as_none")]
    gender: Option<String>,
    #[serde(
        rename = "START AGE",
        default,
        deserialize_with = "empty_string_as_none"
    )]
    start_age: Option<String>,
    #[serde(rename = "END AGE", default, deserialize_with = "empty_string_as_none")]
    end_age: Option<String>,
    #[serde(rename = "INCOME", default, deserialize_with = "empty_string_as_none")]
    income: Option<String>,
    #[serde(rename = "STUDENT", default, deserialize_with = "empty_string_as_none")]
    student: Option<String>,
    #[serde(rename = "MARRIED", default, deserialize_with = "empty_string_as_none")]
    married: Option<String>,
}

impl SchemeRow {
    fn into_record(self) -> Result<SchemeRecord, RecordDefect> {
        let name = required(self.name, "NAME")?;
        let state = required(self.state, "STATE")?;
        let gender = required(self.gender, "GENDER")?.parse::<Gender>()?;
        let start_age = parse_age(required(self.start_age, "START AGE")?, "START AGE")?;
        let end_age = parse_age(required(self.end_age, "END AGE")?, "END AGE")?;
        let income_raw = required(self.income, "INCOME")?;
        let income = income_raw
            .parse::<Income>()
            .map_err(|_| RecordDefect::NotNumeric {
                field: "INCOME",
                value: income_raw,
            })?;
        let student = required(self.student, "STUDENT")?.parse::<Answer>()?;
        let married = required(self.married, "MARRIED")?.parse::<Answer>()?;

        SchemeRecord::new(
            &name, &state, gender, start_age, end_age, income, student, married,
        )
    }
}

impl From<&SchemeRecord> for SchemeRow {
    fn from(record: &SchemeRecord) -> Self {
        Self {
            name: Some(record.name.clone()),
            state: Some(record.state.to_string()),
            gender: Some(record.gender.to_string()),
            start_age: Some(record.start_age.to_string()),
            end_age: Some(record.end_age.to_string()),
            income: Some(record.income.to_string()),
            student: Some(record.student.to_string()),
            married: Some(record.married.to_string()),
        }
    }
}

fn required(value: Option<String>, field: &'static str) -> Result<String, RecordDefect> {
    value.ok_or(RecordDefect::MissingField(field))
}

/// Whole-number ages written as floats (`18.0`) are accepted.
fn parse_age(value: String, field: &'static str) -> Result<u32, RecordDefect> {
    if let Ok(age) = value.parse::<u32>() {
        return Ok(age);
    }
    match value.parse::<f64>() {
        Ok(age) if age.fract() == 0.0 && (0.0..=f64::from(u32::MAX)).contains(&age) => {
            Ok(age as u32)
        }
        _ => Err(RecordDefect::NotNumeric { field, value }),
    }
}

fn empty_string_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let opt = Option::<String>::deserialize(deserializer)?;
    Ok(opt.filter(|value| !value.trim().is_empty()))
}
