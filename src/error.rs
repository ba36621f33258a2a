// SPDX-License-Identifier: PMPL-1.0-or-later

//! Engine error taxonomy
//!
//! A failed unification or an exhausted branch is not an error; the search
//! just yields nothing there. Only the conditions below surface to callers.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DbError {
    /// A built-in ran with an argument that is still unbound
    #[error("arguments to `{builtin}` must be fully instantiated, got {term}")]
    Instantiation { builtin: &'static str, term: String },

    /// Malformed input at construction or insert time
    #[error("invalid input: {0}")]
    Validation(String),
}

impl DbError {
    pub fn validation(msg: impl Into<String>) -> Self {
        DbError::Validation(msg.into())
    }

    pub fn is_instantiation(&self) -> bool {
        matches!(self, DbError::Instantiation { .. })
    }
}

pub type Result<T> = std::result::Result<T, DbError>;
