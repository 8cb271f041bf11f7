//! HR API models for request and response payloads

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::fmt;
use tracing::warn;

/// Generic `{status, data, message}` envelope returned by most endpoints
#[derive(Debug, Clone, Deserialize)]
pub struct Envelope {
    #[serde(default)]
    pub status: bool,
    #[serde(default)]
    pub data: Value,
    pub message: Option<String>,
}

impl Envelope {
    /// Decode the `data` member
    pub fn into_data<T: DeserializeOwned>(self) -> Result<T, serde_json::Error> {
        serde_json::from_value(self.data)
    }
}

/// Request for user login
#[derive(Debug, Serialize)]
pub struct LoginRequest<'a> {
    pub email: &'a str,
    pub password: &'a str,
}

/// Payload of a successful login
#[derive(Debug, Clone, Deserialize)]
pub struct LoginData {
    pub access_token: String,
    pub refresh_token: String,
    pub email: String,
}

/// Request for token refresh
#[derive(Debug, Serialize)]
pub struct RefreshRequest<'a> {
    pub refresh: &'a str,
}

/// Response for token refresh
#[derive(Debug, Deserialize)]
pub struct RefreshResponse {
    pub access: String,
}

/// Employee identifier, numeric or textual depending on the deployment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EmployeeId {
    Number(i64),
    Text(String),
}

impl fmt::Display for EmployeeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EmployeeId::Number(id) => write!(f, "{id}"),
            EmployeeId::Text(id) => f.write_str(id),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Employee {
    pub designation: Option<String>,
}

/// Profile of the signed-in user
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserProfile {
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub employee_id: Option<EmployeeId>,
    #[serde(default)]
    pub employee: Option<Employee>,
    #[serde(default)]
    pub profile_image_url: Option<String>,
}

impl UserProfile {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_string()
    }

    pub fn designation(&self) -> Option<&str> {
        self.employee.as_ref()?.designation.as_deref()
    }
}

/// Direction of a punch; the discriminant is the wire `flag`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PunchDirection {
    In = 0,
    Out = 1,
}

impl PunchDirection {
    pub fn flag(self) -> u8 {
        self as u8
    }
}

impl fmt::Display for PunchDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PunchDirection::In => f.write_str("punch in"),
            PunchDirection::Out => f.write_str("punch out"),
        }
    }
}

/// Attendance record as listed by `GET attendance/`
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AttendanceRecord {
    pub date: NaiveDate,
    #[serde(default, deserialize_with = "optional_time")]
    pub punch_in_time: Option<NaiveTime>,
    #[serde(default, deserialize_with = "optional_time")]
    pub punch_out_time: Option<NaiveTime>,
    #[serde(default)]
    pub punch_in_location: Option<String>,
    #[serde(default)]
    pub punch_out_location: Option<String>,
    #[serde(default)]
    pub punch_in_image: Option<String>,
    #[serde(default)]
    pub punch_out_image: Option<String>,
    #[serde(default)]
    pub flag: Option<u8>,
}

impl AttendanceRecord {
    /// A record is open while it has a punch-in and no punch-out
    pub fn is_open(&self) -> bool {
        self.punch_in_time.is_some() && self.punch_out_time.is_none()
    }

    /// Punch-in instant in device-local time
    pub fn punched_in_at(&self) -> Option<NaiveDateTime> {
        self.punch_in_time.map(|time| self.date.and_time(time))
    }
}

/// Accepts `HH:MM:SS`, `HH:MM:SS.ffffff`, null and the empty string
fn optional_time<'de, D>(deserializer: D) -> Result<Option<NaiveTime>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(value) => NaiveTime::parse_from_str(value, "%H:%M:%S%.f")
            .or_else(|_| NaiveTime::parse_from_str(value, "%H:%M"))
            .map(Some)
            .map_err(serde::de::Error::custom),
    }
}

/// Page of attendance records, newest first
///
/// Records are kept raw: only the most recent one drives the punched-in
/// state, so a malformed historical record must not fail the whole page.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AttendanceList {
    #[serde(default)]
    pub results: Vec<Value>,
}

impl AttendanceList {
    /// Most recent record, decoded strictly
    pub fn latest(&self) -> Result<Option<AttendanceRecord>, serde_json::Error> {
        self.results
            .first()
            .cloned()
            .map(serde_json::from_value::<AttendanceRecord>)
            .transpose()
    }

    /// Every record that decodes; malformed ones are skipped
    pub fn records(self) -> Vec<AttendanceRecord> {
        self.results
            .into_iter()
            .enumerate()
            .filter_map(|(index, raw)| match serde_json::from_value::<AttendanceRecord>(raw) {
                Ok(record) => Some(record),
                Err(e) => {
                    warn!("Skipping malformed attendance record #{}: {}", index, e);
                    None
                }
            })
            .collect()
    }
}

/// Body of `POST attendance/`
///
/// Only the fields of the submitted direction are serialized.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AttendanceSubmission {
    pub email: String,
    pub date: String,
    pub flag: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub punch_in_time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub punch_in_location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub punch_in_image: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub punch_out_time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub punch_out_location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub punch_out_image: Option<String>,
}

impl AttendanceSubmission {
    pub fn new(
        direction: PunchDirection,
        email: impl Into<String>,
        at: NaiveDateTime,
        location: impl Into<String>,
        image: impl Into<String>,
    ) -> Self {
        let time = Some(at.format("%H:%M:%S").to_string());
        let location = Some(location.into());
        let image = Some(image.into());

        let mut submission = Self {
            email: email.into(),
            date: at.format("%Y-%m-%d").to_string(),
            flag: direction.flag(),
            punch_in_time: None,
            punch_in_location: None,
            punch_in_image: None,
            punch_out_time: None,
            punch_out_location: None,
            punch_out_image: None,
        };

        match direction {
            PunchDirection::In => {
                submission.punch_in_time = time;
                submission.punch_in_location = location;
                submission.punch_in_image = image;
            }
            PunchDirection::Out => {
                submission.punch_out_time = time;
                submission.punch_out_location = location;
                submission.punch_out_image = image;
            }
        }

        submission
    }
}

/// Geographic position in decimal degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }
}

impl fmt::Display for Coordinates {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.6}, {:.6}", self.latitude, self.longitude)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn at(h: u32, m: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 5, 17)
            .and_then(|d| d.and_hms_opt(h, m, s))
            .expect("valid datetime")
    }

    #[test]
    fn test_open_record_exposes_punch_in_instant() {
        let record: AttendanceRecord = serde_json::from_value(json!({
            "date": "2024-05-17",
            "punch_in_time": "09:05:30",
            "punch_out_time": null,
            "punch_in_location": "Main office"
        }))
        .expect("decode record");

        assert!(record.is_open());
        assert_eq!(record.punched_in_at(), Some(at(9, 5, 30)));
    }

    #[test]
    fn test_closed_record_and_empty_strings() {
        let closed: AttendanceRecord = serde_json::from_value(json!({
            "date": "2024-05-17",
            "punch_in_time": "09:05:30.123456",
            "punch_out_time": "17:45:00"
        }))
        .expect("decode record");
        assert!(!closed.is_open());

        let blank: AttendanceRecord = serde_json::from_value(json!({
            "date": "2024-05-17",
            "punch_in_time": "",
            "punch_out_time": ""
        }))
        .expect("decode record");
        assert!(!blank.is_open());
        assert_eq!(blank.punched_in_at(), None);
    }

    #[test]
    fn test_punch_in_submission_only_carries_punch_in_fields() {
        let submission = AttendanceSubmission::new(
            PunchDirection::In,
            "jane@example.com",
            at(8, 59, 1),
            "Main office",
            "data:image/jpeg;base64,AAAA",
        );

        let body = serde_json::to_value(&submission).expect("encode submission");
        assert_eq!(
            body,
            json!({
                "email": "jane@example.com",
                "date": "2024-05-17",
                "flag": 0,
                "punch_in_time": "08:59:01",
                "punch_in_location": "Main office",
                "punch_in_image": "data:image/jpeg;base64,AAAA"
            })
        );
    }

    #[test]
    fn test_punch_out_submission_only_carries_punch_out_fields() {
        let submission = AttendanceSubmission::new(
            PunchDirection::Out,
            "jane@example.com",
            at(18, 0, 0),
            "Unknown Address",
            "data:image/jpeg;base64,BBBB",
        );

        let body = serde_json::to_value(&submission).expect("encode submission");
        assert_eq!(body["flag"], 1);
        assert_eq!(body["punch_out_time"], "18:00:00");
        assert_eq!(body["punch_out_location"], "Unknown Address");
        assert!(body.get("punch_in_time").is_none());
        assert!(body.get("punch_in_image").is_none());
    }

    #[test]
    fn test_malformed_history_does_not_hide_the_latest_record() {
        let list: AttendanceList = serde_json::from_value(json!({
            "results": [
                { "date": "2024-05-17", "punch_in_time": "09:00:00", "punch_out_time": null },
                { "date": null, "punch_in_time": "08:45:00" },
                { "date": "2024-05-15", "punch_in_time": "08:45 AM" },
                { "date": "2024-05-14", "punch_in_time": "08:30:00", "punch_out_time": "17:00:00" }
            ]
        }))
        .expect("decode list");

        let latest = list.latest().expect("decode latest").expect("latest record");
        assert!(latest.is_open());
        assert_eq!(latest.punched_in_at(), Some(at(9, 0, 0)));

        let records = list.records();
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].date, NaiveDate::from_ymd_opt(2024, 5, 14).expect("date"));
    }

    #[test]
    fn test_malformed_latest_record_is_an_error() {
        let list: AttendanceList = serde_json::from_value(json!({
            "results": [{ "date": "2024-05-17", "punch_in_time": "9 o'clock" }]
        }))
        .expect("decode list");
        assert!(list.latest().is_err());

        assert_eq!(AttendanceList::default().latest().expect("empty page"), None);
    }

    #[test]
    fn test_user_profile_accessors() {
        let envelope: Envelope = serde_json::from_value(json!({
            "status": true,
            "data": {
                "first_name": "Jane",
                "last_name": "Doe",
                "email": "jane@example.com",
                "employee_id": 42,
                "employee": { "designation": "Engineer" },
                "profile_image_url": null
            }
        }))
        .expect("decode envelope");

        let profile: UserProfile = envelope.into_data().expect("decode profile");
        assert_eq!(profile.full_name(), "Jane Doe");
        assert_eq!(profile.designation(), Some("Engineer"));
        assert_eq!(profile.employee_id, Some(EmployeeId::Number(42)));
        assert_eq!(
            profile.employee_id.map(|id| id.to_string()),
            Some("42".into())
        );
    }
}
