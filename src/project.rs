// SPDX-License-Identifier: PMPL-1.0-or-later

//! Schema-driven projection of entities into nested JSON records
//!
//! Built purely on `find`/`find_all`; it never touches the store directly.

use crate::db::Database;
use crate::error::Result;
use crate::kanren::Term;
use crate::types::term_to_json;
use serde::Deserialize;
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// One entry of a pull pattern: `"name"` or `{ "relation": [sub-keys] }`
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum PullKey {
    Attr(String),
    Nested(BTreeMap<String, Vec<PullKey>>),
}

impl PullKey {
    pub fn attr(name: &str) -> Self {
        PullKey::Attr(name.to_string())
    }

    pub fn nested(relation: &str, keys: Vec<PullKey>) -> Self {
        let mut map = BTreeMap::new();
        map.insert(relation.to_string(), keys);
        PullKey::Nested(map)
    }
}

impl Database {
    /// Project `id` through `keys`.
    ///
    /// Attributes declared `many` become arrays, others the first value or
    /// null. Nested relations pull every related entity recursively.
    pub fn pull(&self, id: &Term, keys: &[PullKey]) -> Result<Value> {
        let mut record = Map::new();
        for key in keys {
            match key {
                PullKey::Attr(attribute) => {
                    let value = if self.schema().is_many(attribute) {
                        Value::Array(
                            self.find_all(id.clone(), attribute)?
                                .iter()
                                .map(term_to_json)
                                .collect(),
                        )
                    } else {
                        self.find(id.clone(), attribute)?
                            .as_ref()
                            .map(term_to_json)
                            .unwrap_or(Value::Null)
                    };
                    record.insert(attribute.clone(), value);
                }
                PullKey::Nested(relations) => {
                    for (relation, child_keys) in relations {
                        let children = self
                            .find_all(id.clone(), relation)?
                            .iter()
                            .map(|child| self.pull(child, child_keys))
                            .collect::<Result<Vec<_>>>()?;
                        record.insert(relation.clone(), Value::Array(children));
                    }
                }
            }
        }
        Ok(Value::Object(record))
    }
}
