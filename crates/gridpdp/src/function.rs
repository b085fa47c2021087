//! Comparison functions used by target matchers.
//!
//! A function is a family (equal, match, in-range) applied to one attribute
//! kind. Pattern literals are compiled once, when the policy is loaded.

use std::fmt::{self, Display};

use regex::Regex;

use crate::value::{AttributeKind, AttributeValue};

/// The three comparison families.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FunctionFamily {
    Equal,
    Match,
    InRange,
}

impl FunctionFamily {
    pub fn suffix(self) -> &'static str {
        match self {
            FunctionFamily::Equal => "equal",
            FunctionFamily::Match => "match",
            FunctionFamily::InRange => "inrange",
        }
    }

    /// Recognises the short family names used in policy documents.
    pub fn from_short_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "equal" => Some(FunctionFamily::Equal),
            "match" => Some(FunctionFamily::Match),
            "inrange" => Some(FunctionFamily::InRange),
            _ => None,
        }
    }
}

/// A compiled pattern literal.
#[derive(Debug, Clone)]
pub enum Pattern {
    Value(AttributeValue),
    Regex { source: String, regex: Regex },
}

impl Pattern {
    /// Canonical text of the pattern, for diagnostics.
    pub fn encode(&self) -> String {
        match self {
            Pattern::Value(v) => v.encode(),
            Pattern::Regex { source, .. } => source.clone(),
        }
    }
}

/// A concrete comparison function, e.g. `string-equal` or `period-inrange`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Function {
    family: FunctionFamily,
    kind: AttributeKind,
}

impl Function {
    /// `None` when the family does not apply to `kind`.
    pub fn new(family: FunctionFamily, kind: AttributeKind) -> Option<Self> {
        let supported = match family {
            FunctionFamily::Equal => true,
            FunctionFamily::Match => kind.is_textual(),
            FunctionFamily::InRange => kind == AttributeKind::Period,
        };
        supported.then_some(Self { family, kind })
    }

    /// The registered identifier, `<type>-<family>`.
    pub fn id(&self) -> String {
        format!("{}-{}", self.kind.type_id(), self.family.suffix())
    }

    pub fn family(&self) -> FunctionFamily {
        self.family
    }

    /// Kind of the pattern literal.
    pub fn pattern_kind(&self) -> AttributeKind {
        self.kind
    }

    /// Kind of request attribute this function can be applied to.
    pub fn candidate_kind(&self) -> AttributeKind {
        match self.family {
            FunctionFamily::InRange => AttributeKind::DateTime,
            FunctionFamily::Equal | FunctionFamily::Match => self.kind,
        }
    }

    /// Compiles a raw pattern literal for this function.
    pub fn compile(&self, raw: &str) -> Result<Pattern, String> {
        match self.family {
            FunctionFamily::Equal | FunctionFamily::InRange => self
                .kind
                .parse(raw)
                .map(Pattern::Value)
                .map_err(|e| e.to_string()),
            FunctionFamily::Match => {
                let regex = Regex::new(&format!("^(?:{raw})$"))
                    .map_err(|e| format!("bad regular expression '{raw}': {e}"))?;
                Ok(Pattern::Regex {
                    source: raw.to_string(),
                    regex,
                })
            }
        }
    }

    /// Applies the function. `None` means the candidate is not comparable
    /// with the pattern (wrong kind), which callers treat as indeterminate.
    pub fn evaluate(&self, pattern: &Pattern, candidate: &AttributeValue) -> Option<bool> {
        if candidate.kind() != self.candidate_kind() {
            return None;
        }
        match (self.family, pattern) {
            (FunctionFamily::Equal, Pattern::Value(p)) => p.equal(candidate),
            (FunctionFamily::InRange, Pattern::Value(p)) => candidate.in_range(p),
            (FunctionFamily::Match, Pattern::Regex { regex, .. }) => {
                candidate.as_text().map(|text| regex.is_match(text))
            }
            _ => None,
        }
    }
}

impl Display for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.kind.type_id(), self.family.suffix())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    fn value(kind: AttributeKind, raw: &str) -> AttributeValue {
        kind.parse(raw).unwrap()
    }

    #[test]
    fn test_supported_combinations() {
        assert!(Function::new(FunctionFamily::Equal, AttributeKind::Duration).is_some());
        assert!(Function::new(FunctionFamily::Match, AttributeKind::X500Name).is_some());
        assert!(Function::new(FunctionFamily::Match, AttributeKind::DateTime).is_none());
        assert!(Function::new(FunctionFamily::InRange, AttributeKind::Period).is_some());
        assert!(Function::new(FunctionFamily::InRange, AttributeKind::String).is_none());
    }

    #[test]
    fn test_ids() {
        let f = Function::new(FunctionFamily::Match, AttributeKind::AnyUri).unwrap();
        assert_eq!(f.id(), "anyURI-match");
        assert_eq!(f.to_string(), "anyURI-match");
    }

    #[test_case("/O=Grid/CN=.*", "/O=Grid/CN=Alice", Some(true); "prefix")]
    #[test_case("/O=Grid/CN=.*", "/O=Other/O=Grid/CN=Alice", Some(false); "anchored at start")]
    #[test_case("/O=Grid", "/O=Grid/CN=Alice", Some(false); "anchored at end")]
    fn test_match_dn(pattern: &str, candidate: &str, expected: Option<bool>) {
        let f = Function::new(FunctionFamily::Match, AttributeKind::X500Name).unwrap();
        let p = f.compile(pattern).unwrap();
        assert_eq!(f.evaluate(&p, &value(AttributeKind::X500Name, candidate)), expected);
    }

    #[test]
    fn test_bad_regex_is_rejected() {
        let f = Function::new(FunctionFamily::Match, AttributeKind::String).unwrap();
        assert!(f.compile("(unclosed").is_err());
    }

    #[test]
    fn test_wrong_candidate_kind_is_not_comparable() {
        let f = Function::new(FunctionFamily::Equal, AttributeKind::String).unwrap();
        let p = f.compile("2020-01-01T00:00:00Z").unwrap();
        let t = value(AttributeKind::DateTime, "2020-01-01T00:00:00Z");
        assert_eq!(f.evaluate(&p, &t), None);
    }

    #[test]
    fn test_in_range_takes_date_time_candidates() {
        let f = Function::new(FunctionFamily::InRange, AttributeKind::Period).unwrap();
        let p = f.compile("2020-01-01T00:00:00/P1Y").unwrap();
        let inside = value(AttributeKind::DateTime, "2020-12-31T23:59:59");
        let outside = value(AttributeKind::DateTime, "2021-01-01T00:00:01");
        assert_eq!(f.evaluate(&p, &inside), Some(true));
        assert_eq!(f.evaluate(&p, &outside), Some(false));
        assert_eq!(f.evaluate(&p, &value(AttributeKind::Date, "2020-06-01")), None);
    }

    #[test_case("Equal", Some(FunctionFamily::Equal))]
    #[test_case("MATCH", Some(FunctionFamily::Match))]
    #[test_case("Inrange", Some(FunctionFamily::InRange))]
    #[test_case("string-equal", None)]
    fn test_short_names(name: &str, expected: Option<FunctionFamily>) {
        assert_eq!(FunctionFamily::from_short_name(name), expected);
    }
}
