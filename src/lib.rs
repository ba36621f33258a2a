// SPDX-License-Identifier: PMPL-1.0-or-later

//! Triplog: an in-process deductive triple store.
//!
//! Facts are `(entity, attribute, value)` triples. Rules derive new
//! triples from a conjunction of goals, resolved Prolog-style by
//! unification and depth-first backtracking.
//!
//! ENGINE PILLARS:
//! 1. **Kanren**: terms, unification, the indexed store and the lazy
//!    resolution engine.
//! 2. **Database**: loading entity documents, inserts and the
//!    `find`/`find_all`/`entities_where` conveniences.
//! 3. **Projection**: schema-driven `pull` of nested records.
//!
//! ```
//! use triplog::{Database, Goal, Term};
//! use serde_json::json;
//!
//! let db = Database::from_entities(&json!({
//!     "adam": {"name": "Adam", "father_of": ["cain", "abel"]},
//!     "cain": {"name": "Cain"},
//!     "abel": {"name": "Abel"}
//! })).unwrap();
//!
//! let rows = db.query(|q| vec![
//!     Goal::triple(q.var("parent"), "name", "Adam"),
//!     Goal::triple(q.var("parent"), "father_of", q.var("child")),
//!     Goal::triple(q.var("child"), "name", q.var("name")),
//! ]).unwrap();
//! let mut names: Vec<String> = rows
//!     .map(|row| row.unwrap().get("name").and_then(Term::as_str).unwrap().to_string())
//!     .collect();
//! names.sort();
//! assert_eq!(names, vec!["Abel", "Cain"]);
//! ```

pub mod config;
pub mod db;
pub mod error;
pub mod kanren;
pub mod project;
pub mod types;

pub use config::Config;
pub use db::Database;
pub use error::{DbError, Result};
pub use kanren::{Goal, Query, QueryBuilder, Row, Rule, Term};
pub use project::PullKey;
pub use types::{AttrSpec, Schema};
