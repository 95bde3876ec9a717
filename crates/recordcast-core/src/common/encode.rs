//! Stateless encoders, one per [`Format`].
//!
//! [`encode`] is a pure function: the same record and format always produce
//! the same bytes. Each call yields exactly one [`EncodeOutcome`], which is
//! what lets the collector count outcomes instead of tracking individual
//! tasks.
//!
//! Output shapes:
//!
//! - JSON: compact object, e.g.
//!   `{"name":"Alice","age":30,"salary":50000.5,"occupation":"Engineer"}`
//! - XML: `<User>` root with one child element per field
//! - TOML: flat `key = value` document

use crate::types::{Format, Record};
use bytes::Bytes;
use core::fmt;

/// Root element name of the XML encoding.
pub const XML_ROOT: &str = "User";

/// A record could not be represented in the requested format.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("{format} encoding failed: {reason}")]
pub struct EncodeError {
    pub format: Format,
    pub reason: String,
}

impl EncodeError {
    pub fn new(format: Format, reason: impl fmt::Display) -> Self {
        Self {
            format,
            reason: reason.to_string(),
        }
    }
}

/// The single result of one encode task.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EncodeOutcome {
    Success(Bytes),
    Failure(EncodeError),
}

impl EncodeOutcome {
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }
}

impl From<Result<Bytes, EncodeError>> for EncodeOutcome {
    fn from(result: Result<Bytes, EncodeError>) -> Self {
        match result {
            Ok(bytes) => Self::Success(bytes),
            Err(e) => Self::Failure(e),
        }
    }
}

/// Serializes `record` into `format`.
///
/// # Errors
///
/// Returns an [`EncodeError`] if the serializer rejects the value.
pub fn encode(record: &Record, format: Format) -> Result<Bytes, EncodeError> {
    let encoded = match format {
        Format::Json => serde_json::to_vec(record).map_err(|e| EncodeError::new(format, e))?,
        Format::Xml => quick_xml::se::to_string_with_root(XML_ROOT, record)
            .map(String::into_bytes)
            .map_err(|e| EncodeError::new(format, e))?,
        Format::Toml => toml::to_string(record)
            .map(String::into_bytes)
            .map_err(|e| EncodeError::new(format, e))?,
    };
    Ok(Bytes::from(encoded))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Salary;

    fn alice() -> Record {
        Record {
            name: "Alice".to_string(),
            age: 30,
            salary: Salary::from_cents(5_000_050),
            occupation: "Engineer".to_string(),
        }
    }

    #[test]
    fn json_is_compact_and_unpadded() {
        let bytes = encode(&alice(), Format::Json).unwrap();
        assert_eq!(
            &bytes[..],
            br#"{"name":"Alice","age":30,"salary":50000.5,"occupation":"Engineer"}"#
        );
    }

    #[test]
    fn json_round_trips_every_field() {
        let record = Record {
            name: "Zoë \"Z\" <O'Neil>".to_string(),
            age: -4,
            salary: Salary::from_cents(7),
            occupation: String::new(),
        };
        let bytes = encode(&record, Format::Json).unwrap();
        let decoded = Record::from_json(&bytes).unwrap();
        assert_eq!(decoded, record);
    }

    #[test]
    fn xml_uses_user_root_with_field_elements() {
        let bytes = encode(&alice(), Format::Xml).unwrap();
        let xml = core::str::from_utf8(&bytes).unwrap();
        assert!(xml.starts_with("<User>"));
        assert!(xml.ends_with("</User>"));
        assert!(xml.contains("<name>Alice</name>"));
        assert!(xml.contains("<age>30</age>"));
        assert!(xml.contains("<salary>50000.5</salary>"));
        assert!(xml.contains("<occupation>Engineer</occupation>"));
    }

    #[test]
    fn xml_escapes_markup_in_strings() {
        let mut record = alice();
        record.name = "<b>&</b>".to_string();
        let bytes = encode(&record, Format::Xml).unwrap();
        let xml = core::str::from_utf8(&bytes).unwrap();
        assert!(!xml.contains("<b>"));
        assert!(xml.contains("&lt;b&gt;&amp;&lt;/b&gt;"));
    }

    #[test]
    fn toml_parses_back_into_the_same_record() {
        let bytes = encode(&alice(), Format::Toml).unwrap();
        let text = core::str::from_utf8(&bytes).unwrap();
        assert!(text.contains("name = \"Alice\""));
        assert!(text.contains("salary = 50000.5"));
        let decoded: Record = toml::from_str(text).unwrap();
        assert_eq!(decoded, alice());
    }

    #[test]
    fn every_format_is_deterministic_and_non_empty() {
        for format in Format::ALL {
            let first = encode(&alice(), format).unwrap();
            let second = encode(&alice(), format).unwrap();
            assert!(!first.is_empty(), "{format} produced no bytes");
            assert_eq!(first, second, "{format} is not deterministic");
        }
    }

    #[test]
    fn outcome_from_result() {
        let ok: EncodeOutcome = Ok::<_, EncodeError>(Bytes::from_static(b"x")).into();
        assert!(ok.is_success());

        let failure = EncodeError::new(Format::Toml, "unsupported value");
        let err: EncodeOutcome = Err(failure.clone()).into();
        assert_eq!(err, EncodeOutcome::Failure(failure));
        assert_eq!(
            EncodeError::new(Format::Xml, "boom").to_string(),
            "xml encoding failed: boom"
        );
    }
}
