// SPDX-License-Identifier: PMPL-1.0-or-later

//! Built-in constraint goals
//!
//! Built-ins never bind anything. They either pass the environment through
//! unchanged or fail the branch, and they refuse to run on unbound input.

use crate::error::{DbError, Result};
use crate::kanren::core::{Substitution, Term, Var};
use serde::Deserialize;
use std::fmt;
use std::rc::Rc;

/// Boolean check over fully instantiated arguments
pub type Predicate = Rc<dyn Fn(&[Term]) -> bool>;

#[derive(Clone)]
pub enum Builtin {
    /// Structural disequality of two ground terms
    Neq(Term, Term),
    /// Caller-supplied predicate over ground arguments
    Assert {
        label: String,
        args: Vec<Term>,
        predicate: Predicate,
    },
}

/// Integer comparisons available to data-driven rules
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompareOp {
    Lt,
    Le,
    Gt,
    Ge,
}

impl CompareOp {
    pub fn as_str(self) -> &'static str {
        match self {
            CompareOp::Lt => "lt",
            CompareOp::Le => "le",
            CompareOp::Gt => "gt",
            CompareOp::Ge => "ge",
        }
    }

    pub fn holds(self, lhs: i64, rhs: i64) -> bool {
        match self {
            CompareOp::Lt => lhs < rhs,
            CompareOp::Le => lhs <= rhs,
            CompareOp::Gt => lhs > rhs,
            CompareOp::Ge => lhs >= rhs,
        }
    }
}

impl Builtin {
    pub fn name(&self) -> &'static str {
        match self {
            Builtin::Neq(..) => "neq",
            Builtin::Assert { .. } => "assert",
        }
    }

    /// Integer comparison as an `assert`; non-integer arguments fail the branch
    pub fn compare(op: CompareOp, lhs: Term, rhs: Term) -> Self {
        Builtin::Assert {
            label: op.as_str().to_string(),
            args: vec![lhs, rhs],
            predicate: Rc::new(move |args: &[Term]| match (args[0].as_int(), args[1].as_int()) {
                (Some(a), Some(b)) => op.holds(a, b),
                _ => false,
            }),
        }
    }

    /// Run the check under `env`.
    ///
    /// `Ok(false)` is an ordinary dead end; an unbound argument is an
    /// instantiation error that aborts the whole query.
    pub fn check(&self, env: &Substitution) -> Result<bool> {
        match self {
            Builtin::Neq(lhs, rhs) => {
                let lhs = instantiate("neq", env, lhs)?;
                let rhs = instantiate("neq", env, rhs)?;
                Ok(lhs != rhs)
            }
            Builtin::Assert {
                args, predicate, ..
            } => {
                let values = args
                    .iter()
                    .map(|arg| instantiate("assert", env, arg))
                    .collect::<Result<Vec<_>>>()?;
                Ok(predicate(&values))
            }
        }
    }

    pub fn offset(&self, base: u64) -> Builtin {
        match self {
            Builtin::Neq(lhs, rhs) => Builtin::Neq(lhs.offset(base), rhs.offset(base)),
            Builtin::Assert {
                label,
                args,
                predicate,
            } => Builtin::Assert {
                label: label.clone(),
                args: args.iter().map(|t| t.offset(base)).collect(),
                predicate: Rc::clone(predicate),
            },
        }
    }

    pub(crate) fn max_var(&self) -> Option<Var> {
        match self {
            Builtin::Neq(lhs, rhs) => lhs.max_var().max(rhs.max_var()),
            Builtin::Assert { args, .. } => args.iter().filter_map(Term::max_var).max(),
        }
    }
}

fn instantiate(builtin: &'static str, env: &Substitution, term: &Term) -> Result<Term> {
    let value = env.reify(term);
    if value.is_ground() {
        Ok(value)
    } else {
        Err(DbError::Instantiation {
            builtin,
            term: value.to_string(),
        })
    }
}

impl fmt::Debug for Builtin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Builtin::Neq(lhs, rhs) => f.debug_tuple("Neq").field(lhs).field(rhs).finish(),
            Builtin::Assert { label, args, .. } => f
                .debug_struct("Assert")
                .field("label", label)
                .field("args", args)
                .finish_non_exhaustive(),
        }
    }
}

impl fmt::Display for Builtin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Builtin::Neq(lhs, rhs) => write!(f, "{} != {}", lhs, rhs),
            Builtin::Assert { label, args, .. } => {
                write!(f, "{}(", label)?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", arg)?;
                }
                write!(f, ")")
            }
        }
    }
}
