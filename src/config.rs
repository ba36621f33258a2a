// SPDX-License-Identifier: PMPL-1.0-or-later

//! Database configuration files (YAML or JSON)

use crate::db::Database;
use crate::kanren::store::SearchMode;
use crate::kanren::trace::StderrTracer;
use crate::types::Schema;
use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Attribute declarations
    pub schema: Schema,
    /// Print every resolution step to stderr
    pub trace: bool,
    /// Stop consuming results after this many rows
    pub limit: Option<usize>,
    /// Candidate retrieval strategy
    pub search: SearchMode,
}

impl Config {
    pub fn from_file(path: &Path) -> Result<Self> {
        let content =
            fs::read_to_string(path).with_context(|| format!("reading config {}", path.display()))?;
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => serde_json::from_str(&content)
                .with_context(|| format!("parsing {}", path.display())),
            Some("yaml") | Some("yml") => serde_yaml::from_str(&content)
                .with_context(|| format!("parsing {}", path.display())),
            _ => Err(anyhow!(
                "config {} must be json/yaml/yml",
                path.to_string_lossy()
            )),
        }
    }

    /// Empty database set up per this configuration
    pub fn build_database(&self) -> Database {
        let mut db = Database::with_schema(self.schema.clone());
        db.set_search_mode(self.search);
        if self.trace {
            db.set_tracer(Box::new(StderrTracer::new()));
        }
        db
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_yaml_config() {
        let config: Config = serde_yaml::from_str(
            "schema:\n  father_of:\n    many: true\n    reference: true\n\
             limit: 10\nsearch: full_scan\n",
        )
        .unwrap();
        assert!(config.schema.is_many("father_of"));
        assert_eq!(config.limit, Some(10));
        assert_eq!(config.search, SearchMode::FullScan);
        assert!(!config.trace);
    }

    #[test]
    fn test_defaults_and_unknown_fields() {
        let config: Config = serde_json::from_str("{}").unwrap();
        assert_eq!(config.search, SearchMode::Indexed);
        assert!(config.limit.is_none());
        assert!(serde_json::from_str::<Config>(r#"{"tracing": true}"#).is_err());
    }
}
