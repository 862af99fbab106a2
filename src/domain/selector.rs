//! Label selector parsing and matching
//!
//! Selectors are validated locally so a malformed selector is rejected
//! before any request reaches the API server.

use crate::error::{Error, Result};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

const MAX_NAME_LEN: usize = 63;
const MAX_PREFIX_LEN: usize = 253;

/// A single selector term
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Requirement {
    Exists(String),
    NotExists(String),
    Equals(String, String),
    NotEquals(String, String),
    In(String, BTreeSet<String>),
    NotIn(String, BTreeSet<String>),
}

impl Requirement {
    fn matches(&self, labels: &BTreeMap<String, String>) -> bool {
        match self {
            Requirement::Exists(key) => labels.contains_key(key),
            Requirement::NotExists(key) => !labels.contains_key(key),
            Requirement::Equals(key, value) => labels.get(key) == Some(value),
            Requirement::NotEquals(key, value) => labels.get(key) != Some(value),
            Requirement::In(key, values) => labels.get(key).is_some_and(|v| values.contains(v)),
            Requirement::NotIn(key, values) => !labels.get(key).is_some_and(|v| values.contains(v)),
        }
    }
}

impl fmt::Display for Requirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Requirement::Exists(key) => write!(f, "{}", key),
            Requirement::NotExists(key) => write!(f, "!{}", key),
            Requirement::Equals(key, value) => write!(f, "{}={}", key, value),
            Requirement::NotEquals(key, value) => write!(f, "{}!={}", key, value),
            Requirement::In(key, values) => write!(f, "{} in ({})", key, join(values)),
            Requirement::NotIn(key, values) => write!(f, "{} notin ({})", key, join(values)),
        }
    }
}

fn join(values: &BTreeSet<String>) -> String {
    values.iter().map(String::as_str).collect::<Vec<_>>().join(",")
}

/// A validated, non-empty label selector
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelSelector {
    requirements: Vec<Requirement>,
}

impl LabelSelector {
    /// Parse and validate a selector string
    pub fn parse(input: &str) -> Result<Self> {
        let invalid = |reason: String| Error::SelectorInvalid {
            selector: input.to_string(),
            reason,
        };

        if input.trim().is_empty() {
            return Err(invalid("selector must not be empty".into()));
        }

        let requirements = split_terms(input)
            .map_err(&invalid)?
            .into_iter()
            .map(|term| parse_term(term).map_err(&invalid))
            .collect::<Result<Vec<_>>>()?;

        Ok(Self { requirements })
    }

    /// Parsed requirements in input order
    pub fn requirements(&self) -> &[Requirement] {
        &self.requirements
    }

    /// Check whether a label set satisfies every requirement
    pub fn matches(&self, labels: &BTreeMap<String, String>) -> bool {
        self.requirements.iter().all(|r| r.matches(labels))
    }
}

impl fmt::Display for LabelSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let terms: Vec<String> = self.requirements.iter().map(ToString::to_string).collect();
        write!(f, "{}", terms.join(","))
    }
}

// =============================================================================
// Parsing
// =============================================================================

/// Split on commas outside of parenthesised value sets
fn split_terms(input: &str) -> std::result::Result<Vec<&str>, String> {
    let mut terms = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;

    for (idx, ch) in input.char_indices() {
        match ch {
            '(' => {
                if depth > 0 {
                    return Err("nested parentheses".into());
                }
                depth += 1;
            }
            ')' => {
                if depth == 0 {
                    return Err("unbalanced ')'".into());
                }
                depth -= 1;
            }
            ',' if depth == 0 => {
                terms.push(input[start..idx].trim());
                start = idx + 1;
            }
            _ => {}
        }
    }
    if depth != 0 {
        return Err("unbalanced '('".into());
    }
    terms.push(input[start..].trim());

    if terms.iter().any(|t| t.is_empty()) {
        return Err("empty requirement".into());
    }
    Ok(terms)
}

fn parse_term(term: &str) -> std::result::Result<Requirement, String> {
    if let Some((head, rest)) = term.split_once('(') {
        let values = rest
            .strip_suffix(')')
            .ok_or_else(|| format!("trailing characters after value set in {:?}", term))?;
        let mut words = head.split_whitespace();
        let (key, op) = match (words.next(), words.next(), words.next()) {
            (Some(key), Some(op), None) => (key, op),
            _ => return Err(format!("expected '<key> in|notin (...)' in {:?}", term)),
        };
        validate_key(key)?;
        let set = values
            .split(',')
            .map(|v| {
                let v = v.trim();
                validate_value(v).map(|_| v.to_string())
            })
            .collect::<std::result::Result<BTreeSet<_>, _>>()?;
        if set.iter().all(String::is_empty) {
            return Err(format!("empty value set for key {:?}", key));
        }
        return match op {
            "in" => Ok(Requirement::In(key.to_string(), set)),
            "notin" => Ok(Requirement::NotIn(key.to_string(), set)),
            other => Err(format!("unknown set operator {:?}", other)),
        };
    }

    if let Some(key) = term.strip_prefix('!') {
        let key = key.trim();
        validate_key(key)?;
        return Ok(Requirement::NotExists(key.to_string()));
    }

    let (key, value, negated) = if let Some((k, v)) = term.split_once("!=") {
        (k, v, true)
    } else if let Some((k, v)) = term.split_once("==") {
        (k, v, false)
    } else if let Some((k, v)) = term.split_once('=') {
        (k, v, false)
    } else {
        validate_key(term)?;
        return Ok(Requirement::Exists(term.to_string()));
    };

    let (key, value) = (key.trim(), value.trim());
    validate_key(key)?;
    validate_value(value)?;

    if negated {
        Ok(Requirement::NotEquals(key.to_string(), value.to_string()))
    } else {
        Ok(Requirement::Equals(key.to_string(), value.to_string()))
    }
}

fn validate_key(key: &str) -> std::result::Result<(), String> {
    let name = match key.split_once('/') {
        Some((prefix, name)) => {
            if prefix.is_empty() || prefix.len() > MAX_PREFIX_LEN {
                return Err(format!("invalid key prefix in {:?}", key));
            }
            if !prefix
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' || c == '.')
            {
                return Err(format!("invalid key prefix in {:?}", key));
            }
            name
        }
        None => key,
    };
    if name.is_empty() {
        return Err(format!("empty key in {:?}", key));
    }
    validate_name(name).map_err(|reason| format!("invalid key {:?}: {}", key, reason))
}

fn validate_value(value: &str) -> std::result::Result<(), String> {
    if value.is_empty() {
        return Ok(());
    }
    validate_name(value).map_err(|reason| format!("invalid value {:?}: {}", value, reason))
}

fn validate_name(name: &str) -> std::result::Result<(), &'static str> {
    if name.len() > MAX_NAME_LEN {
        return Err("longer than 63 characters");
    }
    if !name
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
    {
        return Err("contains characters outside [A-Za-z0-9._-]");
    }
    let starts_ok = name.chars().next().is_some_and(|c| c.is_ascii_alphanumeric());
    let ends_ok = name.chars().last().is_some_and(|c| c.is_ascii_alphanumeric());
    if !starts_ok || !ends_ok {
        return Err("must start and end with an alphanumeric character");
    }
    Ok(())
}
