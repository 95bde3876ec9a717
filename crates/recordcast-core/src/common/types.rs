//! # Record Types and Wire Formats
//!
//! This module defines the record that flows through the service and the
//! closed set of wire formats every fetched record is re-serialized into.
//!
//! ## Overview
//!
//! - [`Record`] - the stored user-like record. Field names are identical in
//!   every wire format (`name`, `age`, `salary`, `occupation`).
//! - [`Salary`] - a fixed-precision decimal with exactly two fractional
//!   digits, held as an integer count of hundredths so values never drift
//!   between the store and the encoders.
//! - [`Format`] - JSON, XML and TOML. The set is fixed at compile time;
//!   [`FORMAT_COUNT`] is the fan-out factor per record.

use crate::Error;
use core::fmt;
use serde::{Deserialize, Deserializer, Serialize, Serializer, de};

/// Number of wire formats each record is encoded into.
pub const FORMAT_COUNT: usize = 3;

/// A user-like record as accepted by `POST /user` and returned by the store.
///
/// String fields are always unpadded once a record leaves the store.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    pub name: String,
    pub age: i32,
    pub salary: Salary,
    pub occupation: String,
}

impl Record {
    /// Decodes a record from a JSON request body.
    ///
    /// # Errors
    ///
    /// Returns [`Error::RequestDecode`] if the body is not a JSON object with
    /// all four fields, or the salary is not a finite number.
    pub fn from_json(body: &[u8]) -> Result<Self, Error> {
        serde_json::from_slice(body).map_err(|e| Error::RequestDecode {
            reason: e.to_string(),
        })
    }
}

/// Fixed-precision decimal with two fractional digits.
///
/// Serializes as a plain number (`50000.50` becomes `50000.5`) and rounds to
/// the nearest hundredth on the way in.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Salary(i64);

impl Salary {
    /// Number of hundredths in one whole unit.
    pub const SCALE: i64 = 100;

    pub const fn from_cents(cents: i64) -> Self {
        Self(cents)
    }

    pub const fn cents(self) -> i64 {
        self.0
    }

    /// Rounds `value` to the nearest hundredth.
    ///
    /// Returns `None` for NaN, infinities, and values outside the `i64`
    /// hundredths range.
    pub fn from_f64(value: f64) -> Option<Self> {
        if !value.is_finite() {
            return None;
        }
        let scaled = (value * Self::SCALE as f64).round();
        // `i64::MAX as f64` rounds up to 2^63, hence the strict upper bound.
        if scaled < i64::MIN as f64 || scaled >= i64::MAX as f64 {
            return None;
        }
        Some(Self(scaled as i64))
    }

    pub fn as_f64(self) -> f64 {
        self.0 as f64 / Self::SCALE as f64
    }
}

impl fmt::Display for Salary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        let scale = Self::SCALE as u64;
        write!(f, "{sign}{}.{:02}", abs / scale, abs % scale)
    }
}

impl Serialize for Salary {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(self.as_f64())
    }
}

impl<'de> Deserialize<'de> for Salary {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = f64::deserialize(deserializer)?;
        Self::from_f64(value).ok_or_else(|| {
            de::Error::custom(format!("salary {value} is not a representable decimal"))
        })
    }
}

/// Target wire format of a single encode task.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Format {
    Json,
    Xml,
    Toml,
}

impl Format {
    /// Every supported format, in dispatch order.
    pub const ALL: [Self; FORMAT_COUNT] = [Self::Json, Self::Xml, Self::Toml];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Xml => "xml",
            Self::Toml => "toml",
        }
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn salary_rounds_to_hundredths() {
        assert_eq!(Salary::from_f64(50000.5), Some(Salary::from_cents(5_000_050)));
        assert_eq!(Salary::from_f64(0.125), Some(Salary::from_cents(13)));
        assert_eq!(Salary::from_f64(-1.005), Some(Salary::from_cents(-100)));
    }

    #[test]
    fn salary_rejects_non_finite_values() {
        assert_eq!(Salary::from_f64(f64::NAN), None);
        assert_eq!(Salary::from_f64(f64::INFINITY), None);
        assert_eq!(Salary::from_f64(1e300), None);
    }

    #[test]
    fn salary_displays_two_fractional_digits() {
        assert_eq!(Salary::from_cents(5_000_050).to_string(), "50000.50");
        assert_eq!(Salary::from_cents(7).to_string(), "0.07");
        assert_eq!(Salary::from_cents(-1_250).to_string(), "-12.50");
    }

    #[test]
    fn record_decodes_from_json_body() {
        let body = br#"{"name":"Alice","age":30,"salary":50000.50,"occupation":"Engineer"}"#;
        let record = Record::from_json(body).unwrap();
        assert_eq!(record.name, "Alice");
        assert_eq!(record.age, 30);
        assert_eq!(record.salary, Salary::from_cents(5_000_050));
        assert_eq!(record.occupation, "Engineer");
    }

    #[test]
    fn record_accepts_integer_salary() {
        let body = br#"{"name":"Bob","age":41,"salary":1200,"occupation":"Chef"}"#;
        let record = Record::from_json(body).unwrap();
        assert_eq!(record.salary, Salary::from_cents(120_000));
    }

    #[test]
    fn malformed_body_is_a_decode_error() {
        for body in [
            &b"not json"[..],
            br#"{"name":"Alice","age":30}"#,
            br#"{"name":"Alice","age":"thirty","salary":1,"occupation":"x"}"#,
        ] {
            assert!(matches!(
                Record::from_json(body),
                Err(Error::RequestDecode { .. })
            ));
        }
    }

    #[test]
    fn formats_are_a_closed_set_of_three() {
        assert_eq!(Format::ALL.len(), FORMAT_COUNT);
        let names: Vec<_> = Format::ALL.iter().map(ToString::to_string).collect();
        assert_eq!(names, ["json", "xml", "toml"]);
    }
}
