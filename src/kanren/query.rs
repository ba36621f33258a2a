// SPDX-License-Identifier: PMPL-1.0-or-later

//! Goals, query scopes and result rows
//!
//! A `QueryBuilder` interns variable names to ids for one query or rule
//! definition. Ids are dense from zero so an activation can be renamed by
//! adding a single base offset.

use crate::error::{DbError, Result};
use crate::kanren::builtins::{Builtin, Predicate};
use crate::kanren::core::{Substitution, Term, Var};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::rc::Rc;

/// `(entity, attribute, value)` pattern
pub type Triple = [Term; 3];

/// One conjunct of a query or rule body
#[derive(Debug, Clone)]
pub enum Goal {
    Pattern(Triple),
    Builtin(Builtin),
}

impl Goal {
    pub fn triple(
        entity: impl Into<Term>,
        attribute: impl Into<Term>,
        value: impl Into<Term>,
    ) -> Self {
        Goal::Pattern([entity.into(), attribute.into(), value.into()])
    }

    pub fn neq(lhs: impl Into<Term>, rhs: impl Into<Term>) -> Self {
        Goal::Builtin(Builtin::Neq(lhs.into(), rhs.into()))
    }

    /// Wrap a boolean check; every argument must be bound when it runs
    pub fn assert<F>(args: Vec<Term>, predicate: F) -> Self
    where
        F: Fn(&[Term]) -> bool + 'static,
    {
        let predicate: Predicate = Rc::new(predicate);
        Goal::Builtin(Builtin::Assert {
            label: "assert".to_string(),
            args,
            predicate,
        })
    }

    pub fn offset(&self, base: u64) -> Goal {
        match self {
            Goal::Pattern(triple) => Goal::Pattern(offset_triple(triple, base)),
            Goal::Builtin(builtin) => Goal::Builtin(builtin.offset(base)),
        }
    }

    pub(crate) fn max_var(&self) -> Option<Var> {
        match self {
            Goal::Pattern(triple) => triple.iter().filter_map(Term::max_var).max(),
            Goal::Builtin(builtin) => builtin.max_var(),
        }
    }
}

pub(crate) fn offset_triple(triple: &Triple, base: u64) -> Triple {
    [
        triple[0].offset(base),
        triple[1].offset(base),
        triple[2].offset(base),
    ]
}

impl fmt::Display for Goal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Goal::Pattern([e, a, v]) => write!(f, "({}, {}, {})", e, a, v),
            Goal::Builtin(builtin) => write!(f, "{}", builtin),
        }
    }
}

/// Variable scope for one query or rule definition
#[derive(Debug, Default)]
pub struct QueryBuilder {
    names: Vec<Option<String>>,
    lookup: HashMap<String, Var>,
}

impl QueryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Variable for `name`, created on first mention
    pub fn var(&mut self, name: &str) -> Term {
        if let Some(var) = self.lookup.get(name) {
            return Term::Var(*var);
        }
        let var = Var(self.names.len() as u64);
        self.names.push(Some(name.to_string()));
        self.lookup.insert(name.to_string(), var);
        Term::Var(var)
    }

    /// Anonymous variable; never reported in result rows
    pub fn fresh(&mut self) -> Term {
        let var = Var(self.names.len() as u64);
        self.names.push(None);
        Term::Var(var)
    }

    /// Number of variables allocated in this scope
    pub fn len(&self) -> u64 {
        self.names.len() as u64
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Named variables in first-mention order
    pub fn named(&self) -> Vec<(String, Var)> {
        self.names
            .iter()
            .enumerate()
            .filter_map(|(i, name)| name.as_ref().map(|n| (n.clone(), Var(i as u64))))
            .collect()
    }

    /// Reject goals mentioning variables that this scope never handed out
    pub(crate) fn check_goals(&self, goals: &[Goal]) -> Result<()> {
        for goal in goals {
            if let Some(var) = goal.max_var() {
                if var.0 >= self.len() {
                    return Err(DbError::validation(format!(
                        "goal {} uses variable _G{} outside its scope",
                        goal, var.0
                    )));
                }
            }
        }
        Ok(())
    }
}

/// A conjunctive query plus the named variables it reports
#[derive(Debug, Clone)]
pub struct Query {
    goals: Vec<Goal>,
    vars: Vec<(String, Var)>,
    scope: u64,
}

impl Query {
    pub fn build<F>(f: F) -> Result<Self>
    where
        F: FnOnce(&mut QueryBuilder) -> Vec<Goal>,
    {
        let mut scope = QueryBuilder::new();
        let goals = f(&mut scope);
        Self::from_goals(scope, goals)
    }

    pub fn from_goals(scope: QueryBuilder, goals: Vec<Goal>) -> Result<Self> {
        scope.check_goals(&goals)?;
        Ok(Self {
            vars: scope.named(),
            scope: scope.len(),
            goals,
        })
    }

    pub fn goals(&self) -> &[Goal] {
        &self.goals
    }

    pub fn vars(&self) -> &[(String, Var)] {
        &self.vars
    }

    /// First variable id free for rule activations
    pub fn scope_len(&self) -> u64 {
        self.scope
    }
}

/// One query answer: each named variable mapped to its ground value
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Row {
    values: BTreeMap<String, Term>,
}

impl Row {
    /// Decode the named variables, or report the first one left unbound
    pub(crate) fn decode(
        env: &Substitution,
        vars: &[(String, Var)],
    ) -> std::result::Result<Self, String> {
        let mut values = BTreeMap::new();
        for (name, var) in vars {
            match env.resolve(*var) {
                Some(value) => {
                    values.insert(name.clone(), value);
                }
                None => return Err(name.clone()),
            }
        }
        Ok(Self { values })
    }

    pub fn get(&self, name: &str) -> Option<&Term> {
        self.values.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Term)> {
        self.values.iter()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl fmt::Display for Row {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (name, value)) in self.values.iter().enumerate() {
            if i > 0 {
                write!(f, "  ")?;
            }
            write!(f, "{}={}", name, value)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_interns_names() {
        let mut q = QueryBuilder::new();
        let a = q.var("parent");
        let b = q.var("child");
        let a2 = q.var("parent");
        let anon = q.fresh();
        assert_eq!(a, a2);
        assert_ne!(a, b);
        assert_eq!(anon, Term::Var(Var(2)));
        assert_eq!(q.len(), 3);
        assert_eq!(
            q.named(),
            vec![("parent".to_string(), Var(0)), ("child".to_string(), Var(1))]
        );
    }

    #[test]
    fn test_query_rejects_foreign_variables() {
        let err = Query::build(|q| vec![Goal::triple(q.var("x"), "name", Term::Var(Var(9)))])
            .unwrap_err();
        assert!(matches!(err, DbError::Validation(_)));
    }

    #[test]
    fn test_row_decode_reports_unbound() {
        let env = Substitution::new().extend(Var(0), Term::str("alice"));
        let vars = vec![("who".to_string(), Var(0)), ("age".to_string(), Var(1))];
        assert_eq!(Row::decode(&env, &vars).unwrap_err(), "age");
        let row = Row::decode(&env, &vars[..1]).unwrap();
        assert_eq!(row.get("who"), Some(&Term::str("alice")));
    }

    #[test]
    fn test_goal_offset() {
        let goal = Goal::triple(Term::Var(Var(1)), "parent", Term::Var(Var(0)));
        let renamed = goal.offset(50);
        assert_eq!(renamed.max_var(), Some(Var(51)));
        assert_eq!(renamed.to_string(), "(_G51, \"parent\", _G50)");
    }
}
