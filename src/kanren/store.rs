// SPDX-License-Identifier: PMPL-1.0-or-later

//! Fact/rule store and its positional index
//!
//! Entries keep their insertion order; every index bucket holds entry
//! positions in ascending order, so merged candidate lists come out in
//! store order without sorting.

use crate::error::{DbError, Result};
use crate::kanren::core::{Substitution, Term};
use crate::kanren::query::{offset_triple, Goal, QueryBuilder, Triple};
use serde::Deserialize;
use std::collections::{HashMap, HashSet};

/// How candidate entries are retrieved for a pattern goal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchMode {
    /// Use the positional index
    #[default]
    Indexed,
    /// Offer every entry and let unification filter
    FullScan,
}

/// Derivation rule: head pattern plus ordered body goals.
///
/// Variables are scope-local ids `0..var_count`; `head_at`/`body_at`
/// shift them into a fresh range for each activation.
#[derive(Debug, Clone)]
pub struct Rule {
    name: Option<String>,
    head: Triple,
    body: Vec<Goal>,
    var_count: u64,
}

impl Rule {
    /// Define a rule; the first goal is the head, the rest the body
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
        let mut goals = goals.into_iter();
        let head = match goals.next() {
            Some(Goal::Pattern(head)) => head,
            Some(Goal::Builtin(builtin)) => {
                return Err(DbError::validation(format!(
                    "rule head must be a triple pattern, got {}",
                    builtin
                )))
            }
            None => return Err(DbError::validation("rule has no head")),
        };
        Ok(Self {
            name: None,
            head,
            body: goals.collect(),
            var_count: scope.len(),
        })
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn head(&self) -> &Triple {
        &self.head
    }

    pub fn body(&self) -> &[Goal] {
        &self.body
    }

    pub fn var_count(&self) -> u64 {
        self.var_count
    }

    pub fn head_at(&self, base: u64) -> Triple {
        offset_triple(&self.head, base)
    }

    pub fn body_at(&self, base: u64) -> Vec<Goal> {
        self.body.iter().map(|goal| goal.offset(base)).collect()
    }
}

#[derive(Debug, Clone)]
pub enum Entry {
    /// Ground triple
    Fact(Triple),
    Rule(Rule),
}

impl Entry {
    pub fn head(&self) -> &Triple {
        match self {
            Entry::Fact(triple) => triple,
            Entry::Rule(rule) => rule.head(),
        }
    }
}

#[derive(Debug, Default)]
struct Index {
    by_entity: HashMap<Term, Vec<usize>>,
    entity_wild: Vec<usize>,
    by_attribute: HashMap<Term, Vec<usize>>,
    attribute_wild: Vec<usize>,
    attribute_rules: HashMap<Term, Vec<usize>>,
    /// Facts of reference attributes keyed by (attribute, value)
    joins: HashMap<(Term, Term), Vec<usize>>,
}

impl Index {
    fn add(&mut self, pos: usize, entry: &Entry, references: &HashSet<Term>) {
        let [entity, attribute, value] = entry.head();

        if entity.is_ground() {
            self.by_entity.entry(entity.clone()).or_default().push(pos);
        } else {
            self.entity_wild.push(pos);
        }

        if attribute.is_ground() {
            self.by_attribute
                .entry(attribute.clone())
                .or_default()
                .push(pos);
            match entry {
                Entry::Rule(_) => self
                    .attribute_rules
                    .entry(attribute.clone())
                    .or_default()
                    .push(pos),
                Entry::Fact(_) if references.contains(attribute) => self
                    .joins
                    .entry((attribute.clone(), value.clone()))
                    .or_default()
                    .push(pos),
                Entry::Fact(_) => {}
            }
        } else {
            self.attribute_wild.push(pos);
        }
    }
}

/// All facts and rules, plus the index derived from them
#[derive(Debug, Default)]
pub struct Store {
    entries: Vec<Entry>,
    index: Index,
    references: HashSet<Term>,
}

impl Store {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store whose index keeps join buckets for the given attributes
    pub fn with_references<I>(references: I) -> Self
    where
        I: IntoIterator<Item = Term>,
    {
        Self {
            references: references.into_iter().collect(),
            ..Self::default()
        }
    }

    /// Replace the reference attribute set and rebuild the index
    pub fn set_references<I>(&mut self, references: I)
    where
        I: IntoIterator<Item = Term>,
    {
        self.references = references.into_iter().collect();
        self.index = Index::default();
        for (pos, entry) in self.entries.iter().enumerate() {
            self.index.add(pos, entry, &self.references);
        }
    }

    pub fn add_fact(&mut self, fact: Triple) -> Result<()> {
        if let Some(term) = fact.iter().find(|t| !t.is_ground()) {
            return Err(DbError::validation(format!(
                "fact ({}, {}, {}) is not ground: {}",
                fact[0], fact[1], fact[2], term
            )));
        }
        self.push(Entry::Fact(fact));
        Ok(())
    }

    pub fn add_rule(&mut self, rule: Rule) {
        self.push(Entry::Rule(rule));
    }

    fn push(&mut self, entry: Entry) {
        let pos = self.entries.len();
        self.index.add(pos, &entry, &self.references);
        self.entries.push(entry);
    }

    pub fn entry(&self, pos: usize) -> Option<&Entry> {
        self.entries.get(pos)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn fact_count(&self) -> usize {
        self.entries
            .iter()
            .filter(|e| matches!(e, Entry::Fact(_)))
            .count()
    }

    pub fn rule_count(&self) -> usize {
        self.entries.len() - self.fact_count()
    }

    /// True if any stored fact or rule head names `entity` directly
    pub fn has_entity(&self, entity: &Term) -> bool {
        self.index.by_entity.contains_key(entity)
    }

    /// Distinct concrete entities, in order of first appearance
    pub fn entities(&self) -> Vec<Term> {
        let mut seen = HashSet::new();
        self.entries
            .iter()
            .map(|e| &e.head()[0])
            .filter(|t| t.is_ground() && seen.insert((*t).clone()))
            .cloned()
            .collect()
    }

    /// Distinct concrete attributes, in order of first appearance
    pub fn attributes(&self) -> Vec<Term> {
        let mut seen = HashSet::new();
        self.entries
            .iter()
            .map(|e| &e.head()[1])
            .filter(|t| t.is_ground() && seen.insert((*t).clone()))
            .cloned()
            .collect()
    }

    /// Entry positions that could unify with `goal` under `env`, in store
    /// order. May contain false positives, never false negatives.
    pub fn search_space(&self, env: &Substitution, goal: &Triple, mode: SearchMode) -> Vec<usize> {
        if mode == SearchMode::FullScan {
            return (0..self.entries.len()).collect();
        }

        let entity = env.reify(&goal[0]);
        let attribute = env.reify(&goal[1]);
        let value = env.reify(&goal[2]);
        let index = &self.index;

        match (
            entity.is_ground(),
            attribute.is_ground(),
            value.is_ground(),
        ) {
            (true, true, _) => intersect(
                &union(bucket(&index.by_entity, &entity), &index.entity_wild),
                &union(bucket(&index.by_attribute, &attribute), &index.attribute_wild),
            ),
            (true, false, _) => union(bucket(&index.by_entity, &entity), &index.entity_wild),
            (false, true, true) if self.references.contains(&attribute) => {
                let joined = index
                    .joins
                    .get(&(attribute.clone(), value))
                    .map(Vec::as_slice)
                    .unwrap_or(&[]);
                union(
                    &union(bucket(&index.attribute_rules, &attribute), &index.attribute_wild),
                    joined,
                )
            }
            (false, true, _) => {
                union(bucket(&index.by_attribute, &attribute), &index.attribute_wild)
            }
            (false, false, _) => (0..self.entries.len()).collect(),
        }
    }
}

fn bucket<'a>(map: &'a HashMap<Term, Vec<usize>>, key: &Term) -> &'a [usize] {
    map.get(key).map(Vec::as_slice).unwrap_or(&[])
}

/// Merge two ascending position lists
fn union(a: &[usize], b: &[usize]) -> Vec<usize> {
    let mut out = Vec::with_capacity(a.len() + b.len());
    let (mut i, mut j) = (0, 0);
    while i < a.len() && j < b.len() {
        if a[i] < b[j] {
            out.push(a[i]);
            i += 1;
        } else if b[j] < a[i] {
            out.push(b[j]);
            j += 1;
        } else {
            out.push(a[i]);
            i += 1;
            j += 1;
        }
    }
    out.extend_from_slice(&a[i..]);
    out.extend_from_slice(&b[j..]);
    out
}

/// Positions present in both ascending lists
fn intersect(a: &[usize], b: &[usize]) -> Vec<usize> {
    let mut out = Vec::new();
    let (mut i, mut j) = (0, 0);
    while i < a.len() && j < b.len() {
        if a[i] < b[j] {
            i += 1;
        } else if b[j] < a[i] {
            j += 1;
        } else {
            out.push(a[i]);
            i += 1;
            j += 1;
        }
    }
    out
}
