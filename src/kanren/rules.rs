// SPDX-License-Identifier: PMPL-1.0-or-later

//! Data-driven rule loader
//!
//! Rules and ad-hoc queries share one JSON goal format. A string starting
//! with `?` is a variable scoped to its rule (or query); `?_` is a fresh
//! anonymous variable at every mention.

use crate::db::Database;
use crate::error::{DbError, Result};
use crate::kanren::builtins::{Builtin, CompareOp};
use crate::kanren::query::{Goal, Query, QueryBuilder};
use crate::kanren::store::Rule;
use crate::kanren::Term;
use crate::types::term_from_json;
use anyhow::Context;
use serde::Deserialize;
use serde_json::Value;
use std::fs;
use std::path::Path;

#[derive(Debug, Deserialize)]
pub struct RuleSpec {
    pub name: String,
    pub head: [Value; 3],
    #[serde(default)]
    pub body: Vec<GoalSpec>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum GoalSpec {
    Triple([Value; 3]),
    Neq { neq: [Value; 2] },
    Compare { compare: CompareOp, args: [Value; 2] },
}

impl RuleSpec {
    pub fn to_rule(&self) -> Result<Rule> {
        let mut scope = QueryBuilder::new();
        let mut goals = vec![Goal::Pattern([
            pattern_term(&self.head[0], &mut scope)?,
            pattern_term(&self.head[1], &mut scope)?,
            pattern_term(&self.head[2], &mut scope)?,
        ])];
        for spec in &self.body {
            goals.push(spec.to_goal(&mut scope)?);
        }
        Ok(Rule::from_goals(scope, goals)?.named(self.name.clone()))
    }
}

impl GoalSpec {
    pub fn to_goal(&self, scope: &mut QueryBuilder) -> Result<Goal> {
        match self {
            GoalSpec::Triple([e, a, v]) => Ok(Goal::Pattern([
                pattern_term(e, scope)?,
                pattern_term(a, scope)?,
                pattern_term(v, scope)?,
            ])),
            GoalSpec::Neq { neq: [lhs, rhs] } => Ok(Goal::Builtin(Builtin::Neq(
                pattern_term(lhs, scope)?,
                pattern_term(rhs, scope)?,
            ))),
            GoalSpec::Compare {
                compare,
                args: [lhs, rhs],
            } => Ok(Goal::Builtin(Builtin::compare(
                *compare,
                pattern_term(lhs, scope)?,
                pattern_term(rhs, scope)?,
            ))),
        }
    }
}

/// Build a query from goal specs; `?name` variables become row fields
pub fn query_from_specs(specs: &[GoalSpec]) -> Result<Query> {
    let mut scope = QueryBuilder::new();
    let goals = specs
        .iter()
        .map(|spec| spec.to_goal(&mut scope))
        .collect::<Result<Vec<_>>>()?;
    Query::from_goals(scope, goals)
}

/// Parse a JSON goal list, e.g. `[["?p", "name", "Adam"], ["?p", "father_of", "?c"]]`
pub fn parse_query(json: &str) -> anyhow::Result<Query> {
    let specs: Vec<GoalSpec> = serde_json::from_str(json).context("parsing query goals")?;
    Ok(query_from_specs(&specs)?)
}

fn pattern_term(value: &Value, scope: &mut QueryBuilder) -> Result<Term> {
    match value {
        Value::String(s) if s == "?_" => Ok(scope.fresh()),
        Value::String(s) => match s.strip_prefix('?') {
            Some("") => Err(DbError::validation("variable name missing after `?`")),
            Some(name) => Ok(scope.var(name)),
            None => Ok(Term::str(s)),
        },
        Value::Array(items) => Ok(Term::compound(
            items
                .iter()
                .map(|item| pattern_term(item, scope))
                .collect::<Result<Vec<_>>>()?,
        )),
        other => term_from_json(other),
    }
}

#[derive(Debug)]
pub struct RuleCatalog {
    pub rules: Vec<Rule>,
}

impl RuleCatalog {
    pub fn new() -> Self {
        Self { rules: Vec::new() }
    }

    pub fn from_json(data: &str) -> anyhow::Result<Self> {
        let specs: Vec<RuleSpec> = serde_json::from_str(data).context("parsing rule catalog")?;
        let rules = specs
            .iter()
            .map(|spec| {
                spec.to_rule()
                    .with_context(|| format!("building rule `{}`", spec.name))
            })
            .collect::<anyhow::Result<Vec<_>>>()?;
        Ok(Self { rules })
    }

    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let data = fs::read_to_string(path)
            .with_context(|| format!("reading rule catalog {}", path.display()))?;
        Self::from_json(&data)
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn apply_to(&self, db: &mut Database) {
        // Rules are cloned so one catalog can seed several databases.
        for rule in &self.rules {
            db.add_rule(rule.clone());
        }
    }
}

impl Default for RuleCatalog {
    fn default() -> Self {
        Self::new()
    }
}
