// SPDX-License-Identifier: PMPL-1.0-or-later

//! miniKanren-inspired deductive engine over triples
//!
//! Provides:
//! - **Terms and substitutions** with persistent, shareable environments
//! - **Fact/rule store** with a positional index for candidate retrieval
//! - **SLD resolution** as a lazy, pull-based stream of answers
//! - **Built-ins** (`neq`, `assert`) that demand fully bound arguments
//! - **Rule catalogs** loaded from JSON
//!
//! Inspired by miniKanren (Byrd, Friedman) and classic Prolog
//! depth-first search, without cut or negation.

pub mod builtins;
pub mod core;
pub mod query;
pub mod rules;
pub mod solve;
pub mod store;
pub mod trace;

pub use self::core::{Substitution, Term, Var};
pub use builtins::{Builtin, CompareOp, Predicate};
pub use query::{Goal, Query, QueryBuilder, Row, Triple};
pub use rules::{parse_query, RuleCatalog};
pub use solve::{Rows, Solutions};
pub use store::{Entry, Rule, SearchMode, Store};
pub use trace::{NoopTracer, RecordingTracer, StderrTracer, TraceEvent, Tracer};
