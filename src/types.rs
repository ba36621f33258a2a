// SPDX-License-Identifier: PMPL-1.0-or-later

//! Serde-facing data: schemas and JSON <-> term conversion
//!
//! JSON strings, integers and booleans map to atomic terms; arrays map to
//! compound terms. Floats, nulls and objects have no term form.

use crate::error::{DbError, Result};
use crate::kanren::Term;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Per-attribute schema flags
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AttrSpec {
    /// Attribute holds several values per entity
    #[serde(default)]
    pub many: bool,
    /// Attribute values are entity identifiers (a foreign-key style join)
    #[serde(default)]
    pub reference: bool,
}

/// Attribute declarations, keyed by attribute name
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Schema {
    pub attributes: BTreeMap<String, AttrSpec>,
}

impl Schema {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, attribute: &str, spec: AttrSpec) -> Self {
        self.attributes.insert(attribute.to_string(), spec);
        self
    }

    pub fn get(&self, attribute: &str) -> AttrSpec {
        self.attributes.get(attribute).copied().unwrap_or_default()
    }

    pub fn is_many(&self, attribute: &str) -> bool {
        self.get(attribute).many
    }

    /// Attribute terms flagged as references, for the store index
    pub fn references(&self) -> Vec<Term> {
        self.attributes
            .iter()
            .filter(|(_, spec)| spec.reference)
            .map(|(name, _)| Term::str(name))
            .collect()
    }
}

/// Convert a JSON value into a ground term
pub fn term_from_json(value: &serde_json::Value) -> Result<Term> {
    use serde_json::Value;
    match value {
        Value::String(s) => Ok(Term::str(s)),
        Value::Bool(b) => Ok(Term::Bool(*b)),
        Value::Number(n) => n
            .as_i64()
            .map(Term::Int)
            .ok_or_else(|| DbError::validation(format!("unsupported number {}", n))),
        Value::Array(items) => Ok(Term::compound(
            items.iter().map(term_from_json).collect::<Result<Vec<_>>>()?,
        )),
        Value::Null => Err(DbError::validation("null has no term form")),
        Value::Object(_) => Err(DbError::validation(format!(
            "object {} has no term form",
            value
        ))),
    }
}

/// Convert a term into JSON; unbound variables render as `"?_G<n>"`
pub fn term_to_json(term: &Term) -> serde_json::Value {
    use serde_json::Value;
    match term {
        Term::Var(v) => Value::String(format!("?_G{}", v.0)),
        Term::Str(s) => Value::String(s.to_string()),
        Term::Int(n) => Value::from(*n),
        Term::Bool(b) => Value::Bool(*b),
        Term::Compound(items) => Value::Array(items.iter().map(term_to_json).collect()),
    }
}

/// Entity id from a JSON object key: numeric keys stay strings, as in the
/// source document
pub fn entity_from_key(key: &str) -> Result<Term> {
    if key.is_empty() {
        return Err(DbError::validation("entity id must not be empty"));
    }
    Ok(Term::str(key))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_scalars_and_arrays() {
        assert_eq!(term_from_json(&json!("a")).unwrap(), Term::str("a"));
        assert_eq!(term_from_json(&json!(3)).unwrap(), Term::Int(3));
        assert_eq!(term_from_json(&json!(false)).unwrap(), Term::Bool(false));
        assert_eq!(
            term_from_json(&json!([1, ["x"]])).unwrap(),
            Term::compound(vec![Term::Int(1), Term::compound(vec![Term::str("x")])])
        );
    }

    #[test]
    fn test_rejects_unrepresentable() {
        assert!(term_from_json(&json!(null)).is_err());
        assert!(term_from_json(&json!(1.5)).is_err());
        assert!(term_from_json(&json!({"a": 1})).is_err());
    }

    #[test]
    fn test_term_to_json() {
        let term = Term::compound(vec![Term::str("a"), Term::Int(2), Term::Bool(true)]);
        assert_eq!(term_to_json(&term), json!(["a", 2, true]));
    }

    #[test]
    fn test_schema_deserialize() {
        let schema: Schema = serde_json::from_value(json!({
            "father_of": {"many": true, "reference": true},
            "name": {}
        }))
        .unwrap();
        assert!(schema.is_many("father_of"));
        assert!(!schema.is_many("name"));
        assert!(!schema.is_many("unknown"));
        assert_eq!(schema.references(), vec![Term::str("father_of")]);
    }
}
