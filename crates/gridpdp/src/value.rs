//! Typed attribute values.
//!
//! The set of kinds is closed: every comparison site matches exhaustively on
//! [`AttributeValue`], and comparing two different kinds yields `None`
//! ("not comparable") rather than an error.

use std::cmp::Ordering;
use std::fmt::{self, Display};

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ValueError;
use crate::temporal::{self, Duration, Period};

// ============================================================================
// AttributeKind
// ============================================================================

/// The kind of an attribute value, identified in documents by its type id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AttributeKind {
    #[serde(rename = "string")]
    String,
    #[serde(rename = "dateTime")]
    DateTime,
    #[serde(rename = "date")]
    Date,
    #[serde(rename = "time")]
    Time,
    #[serde(rename = "duration")]
    Duration,
    #[serde(rename = "period")]
    Period,
    #[serde(rename = "anyURI")]
    AnyUri,
    #[serde(rename = "x500Name")]
    X500Name,
}

impl AttributeKind {
    pub const ALL: [AttributeKind; 8] = [
        AttributeKind::String,
        AttributeKind::DateTime,
        AttributeKind::Date,
        AttributeKind::Time,
        AttributeKind::Duration,
        AttributeKind::Period,
        AttributeKind::AnyUri,
        AttributeKind::X500Name,
    ];

    /// The canonical type identifier for this kind.
    pub fn type_id(self) -> &'static str {
        match self {
            AttributeKind::String => "string",
            AttributeKind::DateTime => "dateTime",
            AttributeKind::Date => "date",
            AttributeKind::Time => "time",
            AttributeKind::Duration => "duration",
            AttributeKind::Period => "period",
            AttributeKind::AnyUri => "anyURI",
            AttributeKind::X500Name => "x500Name",
        }
    }

    /// Whether values of this kind are plain text that a regular expression
    /// can be applied to.
    pub fn is_textual(self) -> bool {
        matches!(
            self,
            AttributeKind::String | AttributeKind::AnyUri | AttributeKind::X500Name
        )
    }

    /// Parses a raw literal as a value of this kind.
    pub fn parse(self, raw: &str) -> Result<AttributeValue, ValueError> {
        match self {
            AttributeKind::String => Ok(AttributeValue::String(raw.to_string())),
            AttributeKind::AnyUri => Ok(AttributeValue::AnyUri(raw.trim().to_string())),
            AttributeKind::X500Name => Ok(AttributeValue::X500Name(raw.trim().to_string())),
            AttributeKind::DateTime => temporal::parse_datetime(raw)
                .map(AttributeValue::DateTime)
                .ok_or_else(|| ValueError::invalid(self, raw, "expected an RFC 3339 date-time")),
            AttributeKind::Date => NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
                .map(AttributeValue::Date)
                .map_err(|e| ValueError::invalid(self, raw, e.to_string())),
            AttributeKind::Time => NaiveTime::parse_from_str(raw.trim(), "%H:%M:%S%.f")
                .map(AttributeValue::Time)
                .map_err(|e| ValueError::invalid(self, raw, e.to_string())),
            AttributeKind::Duration => Duration::parse(raw)
                .map(AttributeValue::Duration)
                .map_err(|reason| ValueError::invalid(self, raw, reason)),
            AttributeKind::Period => Period::parse(raw)
                .map(AttributeValue::Period)
                .map_err(|reason| ValueError::invalid(self, raw, reason)),
        }
    }
}

impl Display for AttributeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.type_id())
    }
}

// ============================================================================
// AttributeValue
// ============================================================================

/// A typed, immutable attribute value.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum AttributeValue {
    String(String),
    DateTime(DateTime<Utc>),
    Date(NaiveDate),
    Time(NaiveTime),
    Duration(Duration),
    Period(Period),
    AnyUri(String),
    /// Distinguished name, e.g. `/O=Grid/CN=Alice`.
    X500Name(String),
}

impl AttributeValue {
    pub fn kind(&self) -> AttributeKind {
        match self {
            AttributeValue::String(_) => AttributeKind::String,
            AttributeValue::DateTime(_) => AttributeKind::DateTime,
            AttributeValue::Date(_) => AttributeKind::Date,
            AttributeValue::Time(_) => AttributeKind::Time,
            AttributeValue::Duration(_) => AttributeKind::Duration,
            AttributeValue::Period(_) => AttributeKind::Period,
            AttributeValue::AnyUri(_) => AttributeKind::AnyUri,
            AttributeValue::X500Name(_) => AttributeKind::X500Name,
        }
    }

    pub fn type_id(&self) -> &'static str {
        self.kind().type_id()
    }

    /// Canonical string form. Parsing it with the same kind yields an equal value.
    pub fn encode(&self) -> String {
        match self {
            AttributeValue::String(s) | AttributeValue::AnyUri(s) | AttributeValue::X500Name(s) => {
                s.clone()
            }
            AttributeValue::DateTime(t) => temporal::encode_datetime(t),
            AttributeValue::Date(d) => d.format("%Y-%m-%d").to_string(),
            AttributeValue::Time(t) => t.format("%H:%M:%S%.f").to_string(),
            AttributeValue::Duration(d) => d.encode(),
            AttributeValue::Period(p) => p.encode(),
        }
    }

    /// Text of the textual kinds, used by regular-expression matching.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            AttributeValue::String(s) | AttributeValue::AnyUri(s) | AttributeValue::X500Name(s) => {
                Some(s)
            }
            _ => None,
        }
    }

    /// Kind-specific equality. `None` when the kinds differ.
    pub fn equal(&self, other: &AttributeValue) -> Option<bool> {
        match (self, other) {
            (AttributeValue::String(a), AttributeValue::String(b))
            | (AttributeValue::AnyUri(a), AttributeValue::AnyUri(b))
            | (AttributeValue::X500Name(a), AttributeValue::X500Name(b)) => Some(a == b),
            (AttributeValue::DateTime(a), AttributeValue::DateTime(b)) => Some(a == b),
            (AttributeValue::Date(a), AttributeValue::Date(b)) => Some(a == b),
            (AttributeValue::Time(a), AttributeValue::Time(b)) => Some(a == b),
            (AttributeValue::Duration(a), AttributeValue::Duration(b)) => Some(a == b),
            (AttributeValue::Period(a), AttributeValue::Period(b)) => Some(a == b),
            _ => None,
        }
    }

    /// Ordering for the ordered kinds (date-time, date, time).
    ///
    /// Values of different kinds, and kinds without a natural order, return `None`.
    pub fn compare(&self, other: &AttributeValue) -> Option<Ordering> {
        match (self, other) {
            (AttributeValue::DateTime(a), AttributeValue::DateTime(b)) => Some(a.cmp(b)),
            (AttributeValue::Date(a), AttributeValue::Date(b)) => Some(a.cmp(b)),
            (AttributeValue::Time(a), AttributeValue::Time(b)) => Some(a.cmp(b)),
            _ => None,
        }
    }

    pub fn less_than(&self, other: &AttributeValue) -> Option<bool> {
        self.compare(other).map(Ordering::is_lt)
    }

    /// Whether this date-time falls inside `period` (inclusive).
    ///
    /// `None` unless `self` is a date-time and `period` a period.
    pub fn in_range(&self, period: &AttributeValue) -> Option<bool> {
        match (self, period) {
            (AttributeValue::DateTime(t), AttributeValue::Period(p)) => Some(p.contains(*t)),
            _ => None,
        }
    }
}

impl Display for AttributeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.type_id(), self.encode())
    }
}

// ============================================================================
// Tests
// ============================================================================
