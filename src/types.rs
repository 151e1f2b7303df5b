/// Shared types used across the codebase

use chrono::NaiveTime;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

/// Procedural state of a case (expediente)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum CaseStatus {
    #[default]
    #[serde(rename = "Abierto")]
    Open,
    #[serde(rename = "En Trámite")]
    InProgress,
    #[serde(rename = "Pausado")]
    Paused,
    #[serde(rename = "Cerrado")]
    Closed,
}

impl CaseStatus {
    pub const ALL: [CaseStatus; 4] = [
        CaseStatus::Open,
        CaseStatus::InProgress,
        CaseStatus::Paused,
        CaseStatus::Closed,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CaseStatus::Open => "Abierto",
            CaseStatus::InProgress => "En Trámite",
            CaseStatus::Paused => "Pausado",
            CaseStatus::Closed => "Cerrado",
        }
    }
}

/// Priority of a deadline alert
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Priority {
    #[serde(rename = "Alta")]
    High,
    #[default]
    #[serde(rename = "Media")]
    Medium,
    #[serde(rename = "Baja")]
    Low,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::High => "Alta",
            Priority::Medium => "Media",
            Priority::Low => "Baja",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown value '{0}'")]
pub struct UnknownVariant(pub String);

impl FromStr for CaseStatus {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CaseStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| UnknownVariant(s.to_string()))
    }
}

impl TryFrom<String> for CaseStatus {
    type Error = UnknownVariant;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl FromStr for Priority {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Alta" => Ok(Priority::High),
            "Media" => Ok(Priority::Medium),
            "Baja" => Ok(Priority::Low),
            other => Err(UnknownVariant(other.to_string())),
        }
    }
}

impl TryFrom<String> for Priority {
    type Error = UnknownVariant;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl fmt::Display for CaseStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// Deserialize an optional value where an empty string counts as absent.
///
/// HTML date/time inputs submit `""` when left blank.
pub fn blank_as_none<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr,
    T::Err: fmt::Display,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(s) => s.parse().map(Some).map_err(serde::de::Error::custom),
    }
}

/// Like [`blank_as_none`] but keeps "field absent" apart from "field cleared",
/// for PATCH bodies. Use with `#[serde(default)]`.
pub fn patch_blank_as_none<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr,
    T::Err: fmt::Display,
{
    blank_as_none(deserializer).map(Some)
}

/// Parse a wall-clock time, with or without seconds.
pub fn parse_time(s: &str) -> Result<NaiveTime, chrono::ParseError> {
    NaiveTime::parse_from_str(s, "%H:%M:%S").or_else(|_| NaiveTime::parse_from_str(s, "%H:%M"))
}

/// Optional time of day; blank strings count as absent.
pub fn time_blank_as_none<'de, D>(deserializer: D) -> Result<Option<NaiveTime>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(s) => parse_time(s).map(Some).map_err(serde::de::Error::custom),
    }
}

pub fn patch_time_blank_as_none<'de, D>(deserializer: D) -> Result<Option<Option<NaiveTime>>, D::Error>
where
    D: Deserializer<'de>,
{
    time_blank_as_none(deserializer).map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use serde_json::json;

    #[derive(Debug, Deserialize)]
    struct Form {
        #[serde(default, deserialize_with = "blank_as_none")]
        fecha: Option<NaiveDate>,
        #[serde(default, deserialize_with = "patch_time_blank_as_none")]
        hora: Option<Option<NaiveTime>>,
    }

    #[test]
    fn status_uses_spanish_wire_names() {
        assert_eq!(serde_json::to_value(CaseStatus::InProgress).unwrap(), json!("En Trámite"));
        let parsed: CaseStatus = serde_json::from_value(json!("Cerrado")).unwrap();
        assert_eq!(parsed, CaseStatus::Closed);
        assert_eq!("Pausado".parse::<CaseStatus>().unwrap(), CaseStatus::Paused);
        assert!("Archivado".parse::<CaseStatus>().is_err());
    }

    #[test]
    fn priority_defaults_to_medium() {
        assert_eq!(Priority::default(), Priority::Medium);
        assert_eq!(Priority::try_from("Alta".to_string()).unwrap(), Priority::High);
    }

    #[test]
    fn blank_strings_become_none() {
        let form: Form = serde_json::from_value(json!({ "fecha": "", "hora": "" })).unwrap();
        assert_eq!(form.fecha, None);
        assert_eq!(form.hora, Some(None));

        let form: Form = serde_json::from_value(json!({ "fecha": "2025-03-01" })).unwrap();
        assert_eq!(form.fecha, NaiveDate::from_ymd_opt(2025, 3, 1));
        assert_eq!(form.hora, None);

        let form: Form = serde_json::from_value(json!({ "hora": "09:30" })).unwrap();
        assert_eq!(form.hora, Some(NaiveTime::from_hms_opt(9, 30, 0)));

        let form: Form = serde_json::from_value(json!({ "hora": "17:05:10" })).unwrap();
        assert_eq!(form.hora, Some(NaiveTime::from_hms_opt(17, 5, 10)));
    }

    #[test]
    fn malformed_dates_are_rejected() {
        let result: Result<Form, _> = serde_json::from_value(json!({ "fecha": "01/03/2025" }));
        assert!(result.is_err());
    }
}
