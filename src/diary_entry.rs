use chrono::{Local, NaiveDateTime, Timelike};
use serde::{Serialize, Serializer};
use thiserror::Error;

// Timestamps are stored the way the diary file has always recorded them:
// local time, no zone suffix, exactly three fractional digits.
const DATE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3f";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DiaryEntry {
    pub id: String,
    pub title: String,
    pub content: String,
    #[serde(serialize_with = "serialize_date")]
    pub date: NaiveDateTime,
}

/// A stored document that does not match the entry shape.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("entry is not a JSON object")]
    NotAnObject,
    #[error("missing field `{0}`")]
    MissingField(&'static str),
    #[error("field `{0}` must be a string")]
    InvalidField(&'static str),
    #[error("field `date` is not an ISO-8601 timestamp: {0}")]
    InvalidDate(#[from] chrono::ParseError),
}

impl DiaryEntry {
    pub fn new(title: String, content: String) -> Self {
        let now = Local::now();
        DiaryEntry {
            id: now.timestamp_millis().to_string(),
            title,
            content,
            date: truncate_to_millis(now.naive_local()),
        }
    }

    /// Strict reader for one stored document; the derived `Serialize` impl is
    /// the matching writer. No field is defaulted, a missing `id` is an error.
    pub fn from_json(doc: &serde_json::Value) -> Result<Self, DecodeError> {
        if !doc.is_object() {
            return Err(DecodeError::NotAnObject);
        }
        let date = string_field(doc, "date")?.parse::<NaiveDateTime>()?;
        Ok(DiaryEntry {
            id: string_field(doc, "id")?.to_owned(),
            title: string_field(doc, "title")?.to_owned(),
            content: string_field(doc, "content")?.to_owned(),
            date,
        })
    }
}

fn string_field<'a>(
    doc: &'a serde_json::Value,
    field: &'static str,
) -> Result<&'a str, DecodeError> {
    doc.get(field)
        .ok_or(DecodeError::MissingField(field))?
        .as_str()
        .ok_or(DecodeError::InvalidField(field))
}

fn serialize_date<S>(date: &NaiveDateTime, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.collect_str(&date.format(DATE_FORMAT))
}

// The file keeps three fractional digits, so anything finer would not survive
// a reload.
fn truncate_to_millis(date: NaiveDateTime) -> NaiveDateTime {
    let millis = date.nanosecond() / 1_000_000;
    date.with_nanosecond(millis * 1_000_000).unwrap_or(date)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> DiaryEntry {
        DiaryEntry {
            id: "1714573800000".to_string(),
            title: "Arrival".to_string(),
            content: "First day in the new flat.\nStill unpacking.".to_string(),
            date: "2024-05-01T14:30:00.000".parse().unwrap(),
        }
    }

    #[test]
    fn encode_decode_round_trip() {
        let entry = sample();
        let doc = serde_json::to_value(&entry).unwrap();
        assert_eq!(DiaryEntry::from_json(&doc).unwrap(), entry);
    }

    #[test]
    fn new_entries_round_trip_at_millisecond_precision() {
        let entry = DiaryEntry::new("t".to_string(), "c".to_string());
        let doc = serde_json::to_value(&entry).unwrap();
        assert_eq!(DiaryEntry::from_json(&doc).unwrap(), entry);
    }

    #[test]
    fn date_keeps_the_legacy_format() {
        let doc = serde_json::to_value(sample()).unwrap();
        assert_eq!(doc["date"], json!("2024-05-01T14:30:00.000"));
    }

    #[test]
    fn encoded_document_has_exactly_four_keys() {
        let doc = serde_json::to_value(sample()).unwrap();
        let obj = doc.as_object().unwrap();
        assert_eq!(obj.len(), 4);
        for key in ["id", "title", "content", "date"] {
            assert!(obj.contains_key(key), "missing key {key}");
        }
    }

    #[test]
    fn missing_field_is_named() {
        let doc = json!({"id": "1", "title": "t", "date": "2024-05-01T14:30:00.000"});
        let err = DiaryEntry::from_json(&doc).unwrap_err();
        assert_eq!(err.to_string(), "missing field `content`");
    }

    #[test]
    fn non_string_field_is_named() {
        let doc = json!({"id": 7, "title": "t", "content": "c", "date": "2024-05-01T14:30:00.000"});
        let err = DiaryEntry::from_json(&doc).unwrap_err();
        assert_eq!(err.to_string(), "field `id` must be a string");
    }

    #[test]
    fn unparseable_date_is_rejected() {
        let doc = json!({"id": "1", "title": "t", "content": "c", "date": "yesterday"});
        assert!(matches!(
            DiaryEntry::from_json(&doc).unwrap_err(),
            DecodeError::InvalidDate(_)
        ));
    }

    #[test]
    fn non_object_entry_is_rejected() {
        assert!(matches!(
            DiaryEntry::from_json(&json!(42)).unwrap_err(),
            DecodeError::NotAnObject
        ));
    }
}
