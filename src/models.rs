use std::sync::Arc;

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Deserializer, Serialize};

use crate::trigger::Trigger;

#[derive(Clone)]
pub struct AppState {
    pub trigger: Arc<Trigger>,
}

/* -------------------------
   Upstream records
--------------------------*/

// Upstream payloads are decoded leniently:
// - unknown fields are ignored
// - a missing field or an explicit `null` becomes the zero value
//   ("" for strings, 0 for numbers, [] for lists, None for timestamps)
// - whole-number floats and numeric strings are accepted for integers
// - a present timestamp that cannot be parsed fails the decode
// - `appointmentDate` is required: every appointment must land on a day

#[allow(dead_code)] // not every field feeds a view
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppointmentRecord {
    #[serde(default, deserialize_with = "null_as_default")]
    pub id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub patient_id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub doctor_id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub doctor_name: String,
    #[serde(deserialize_with = "required_timestamp")]
    pub appointment_date: NaiveDateTime,
    #[serde(default, deserialize_with = "null_as_default")]
    pub status: String,
}

#[allow(dead_code)]
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PatientRecord {
    #[serde(deserialize_with = "null_as_default")]
    pub id: String,
    #[serde(deserialize_with = "null_as_default")]
    pub patient_identifier: String,
    #[serde(deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(deserialize_with = "lenient_int")]
    pub age: i32,
    #[serde(deserialize_with = "null_as_default")]
    pub gender: String,
    #[serde(deserialize_with = "null_as_default")]
    pub contact_number: String,
    /// Entries are treated as symptoms by the symptoms view.
    #[serde(deserialize_with = "null_as_default")]
    pub medical_history: Vec<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub prescriptions: Vec<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub lab_results: Vec<String>,
    #[serde(deserialize_with = "lenient_timestamp")]
    pub created_at: Option<NaiveDateTime>,
    #[serde(deserialize_with = "lenient_timestamp")]
    pub updated_at: Option<NaiveDateTime>,
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    // Only called when the field is present; `null` maps to the zero value.
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

fn lenient_int<'de, D>(deserializer: D) -> Result<i32, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error;

    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    let n = match value {
        None => return Ok(0),
        Some(serde_json::Value::Number(n)) => match (n.as_i64(), n.as_f64()) {
            (Some(i), _) => i,
            (None, Some(f)) if f.fract() == 0.0 => f as i64,
            _ => return Err(D::Error::custom(format!("not a whole number: {n}"))),
        },
        Some(serde_json::Value::String(s)) => s
            .trim()
            .parse::<i64>()
            .map_err(|_| D::Error::custom(format!("not a whole number: {s:?}")))?,
        Some(other) => return Err(D::Error::custom(format!("not a number: {other}"))),
    };
    i32::try_from(n).map_err(|_| D::Error::custom(format!("out of range: {n}")))
}

fn required_timestamp<'de, D>(deserializer: D) -> Result<NaiveDateTime, D::Error>
where
    D: Deserializer<'de>,
{
    lenient_timestamp(deserializer)?
        .ok_or_else(|| serde::de::Error::custom("appointmentDate is required"))
}

fn lenient_timestamp<'de, D>(deserializer: D) -> Result<Option<NaiveDateTime>, D::Error>
where
    D: Deserializer<'de>,
{
    let Some(raw) = Option::<String>::deserialize(deserializer)? else {
        return Ok(None);
    };
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(None);
    }
    parse_timestamp(raw)
        .map(Some)
        .ok_or_else(|| serde::de::Error::custom(format!("invalid timestamp: {raw:?}")))
}

const LOCAL_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];

/// Parses a wall-clock timestamp. Offsets are dropped, not normalized.
pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    if let Some(ts) = LOCAL_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
    {
        return Some(ts);
    }
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.naive_local());
    }
    // bare date: midnight
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

/* -------------------------
   Summary rows
--------------------------*/

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AppointmentsPerDoctor {
    pub doctor_id: String,
    pub doctor_name: String,
    pub appointment_count: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AppointmentsOverTime {
    /// Calendar day, `YYYY-MM-DD`.
    pub period: String,
    pub appointment_count: i64,
}

/// Keyed by patient gender; the `specialty` name follows the reporting table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SymptomsBySpecialty {
    pub specialty: String,
    pub symptom: String,
    pub occurrence_count: i64,
}
