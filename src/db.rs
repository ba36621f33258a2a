// SPDX-License-Identifier: PMPL-1.0-or-later

//! Database facade over the store and the resolution engine
//!
//! Queries borrow the database immutably and `insert` needs `&mut self`,
//! so the borrow checker already rules out mutation while a result stream
//! is alive. Callers sharing a database some other way (for example behind
//! a `RefCell`) must keep inserts between queries themselves.

use crate::error::{DbError, Result};
use crate::kanren::query::{Goal, Query, QueryBuilder, Triple};
use crate::kanren::solve::Rows;
use crate::kanren::store::{Rule, SearchMode, Store};
use crate::kanren::trace::{NoopTracer, Tracer};
use crate::kanren::Term;
use crate::types::{entity_from_key, term_from_json, Schema};
use serde_json::Value;
use std::collections::HashSet;

pub struct Database {
    store: Store,
    schema: Schema,
    tracer: Box<dyn Tracer>,
    mode: SearchMode,
    next_id: u64,
}

impl Default for Database {
    fn default() -> Self {
        Self::new()
    }
}

impl Database {
    pub fn new() -> Self {
        Self::with_schema(Schema::new())
    }

    pub fn with_schema(schema: Schema) -> Self {
        Self {
            store: Store::with_references(schema.references()),
            schema,
            tracer: Box::new(NoopTracer),
            mode: SearchMode::Indexed,
            next_id: 0,
        }
    }

    /// Database seeded from a `{ id: { attribute: value } }` document
    pub fn from_entities(data: &Value) -> Result<Self> {
        let mut db = Self::new();
        db.load_entities(data)?;
        Ok(db)
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn set_schema(&mut self, schema: Schema) {
        self.store.set_references(schema.references());
        self.schema = schema;
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    pub fn set_tracer(&mut self, tracer: Box<dyn Tracer>) {
        self.tracer = tracer;
    }

    pub fn set_search_mode(&mut self, mode: SearchMode) {
        self.mode = mode;
    }

    pub fn add_fact(
        &mut self,
        entity: impl Into<Term>,
        attribute: impl Into<Term>,
        value: impl Into<Term>,
    ) -> Result<()> {
        self.store
            .add_fact([entity.into(), attribute.into(), value.into()])
    }

    pub fn add_rule(&mut self, rule: Rule) {
        self.store.add_rule(rule);
    }

    /// Load entity data; returns the number of facts added.
    ///
    /// The whole document is validated before anything is stored.
    pub fn load_entities(&mut self, data: &Value) -> Result<usize> {
        let entities = data
            .as_object()
            .ok_or_else(|| DbError::validation("entity data must be a JSON object"))?;
        let mut facts = Vec::new();
        for (key, body) in entities {
            entity_facts(entity_from_key(key)?, body, &mut facts)?;
        }
        self.store_facts(facts)
    }

    /// Import row-oriented data, taking each row's id from `id_key`
    pub fn load_rows(&mut self, rows: &[Value], id_key: &str) -> Result<usize> {
        let mut facts = Vec::new();
        for (n, row) in rows.iter().enumerate() {
            let columns = row
                .as_object()
                .ok_or_else(|| DbError::validation(format!("row {} is not an object", n)))?;
            let id = match columns.get(id_key) {
                Some(Value::Null) | None => {
                    return Err(DbError::validation(format!(
                        "row {} has no `{}` identifier",
                        n, id_key
                    )))
                }
                Some(Value::String(s)) => entity_from_key(s)?,
                Some(other) => term_from_json(other)?,
            };
            let mut rest = columns.clone();
            rest.remove(id_key);
            entity_facts(id, &Value::Object(rest), &mut facts)?;
        }
        self.store_facts(facts)
    }

    /// Append an entity under a freshly generated id and return the id
    pub fn insert(&mut self, attributes: &Value) -> Result<Term> {
        let id = loop {
            self.next_id += 1;
            let candidate = Term::from(format!("e{}", self.next_id));
            if !self.store.has_entity(&candidate) {
                break candidate;
            }
        };
        let mut facts = Vec::new();
        entity_facts(id.clone(), attributes, &mut facts)?;
        self.store_facts(facts)?;
        Ok(id)
    }

    fn store_facts(&mut self, facts: Vec<Triple>) -> Result<usize> {
        let count = facts.len();
        for fact in facts {
            self.store.add_fact(fact)?;
        }
        Ok(count)
    }

    /// Stream the rows of a prepared query
    pub fn run(&self, query: Query) -> Rows<'_> {
        Rows::new(&self.store, self.tracer.as_ref(), self.mode, query)
    }

    /// Build a query in a fresh variable scope and stream its rows
    pub fn query<F>(&self, f: F) -> Result<Rows<'_>>
    where
        F: FnOnce(&mut QueryBuilder) -> Vec<Goal>,
    {
        Ok(self.run(Query::build(f)?))
    }

    /// First value of `attribute` on `id`
    pub fn find(&self, id: impl Into<Term>, attribute: &str) -> Result<Option<Term>> {
        let id = id.into();
        let mut rows = self.query(|q| vec![Goal::triple(id, attribute, q.var("value"))])?;
        match rows.next() {
            Some(row) => Ok(row?.get("value").cloned()),
            None => Ok(None),
        }
    }

    /// Every value of `attribute` on `id`, in store order
    pub fn find_all(&self, id: impl Into<Term>, attribute: &str) -> Result<Vec<Term>> {
        let id = id.into();
        let rows = self.query(|q| vec![Goal::triple(id, attribute, q.var("value"))])?;
        let mut values = Vec::new();
        for row in rows {
            if let Some(value) = row?.get("value") {
                values.push(value.clone());
            }
        }
        Ok(values)
    }

    /// Entities carrying every `(attribute, value)` pair
    pub fn entities_where(&self, params: &[(&str, Term)]) -> Result<Vec<Term>> {
        let rows = self.query(|q| {
            let id = q.var("id");
            params
                .iter()
                .map(|(attribute, value)| Goal::triple(id.clone(), *attribute, value.clone()))
                .collect()
        })?;
        let mut seen = HashSet::new();
        let mut ids = Vec::new();
        for row in rows {
            if let Some(id) = row?.get("id") {
                if seen.insert(id.clone()) {
                    ids.push(id.clone());
                }
            }
        }
        Ok(ids)
    }
}

fn entity_facts(id: Term, body: &Value, out: &mut Vec<Triple>) -> Result<()> {
    let attributes = body
        .as_object()
        .ok_or_else(|| {
            DbError::validation(format!("entity {} must map attributes to values", id))
        })?;
    for (attribute, value) in attributes {
        let attr = Term::str(attribute);
        match value {
            Value::Array(values) => {
                for value in values {
                    out.push([id.clone(), attr.clone(), term_from_json(value)?]);
                }
            }
            other => out.push([id.clone(), attr.clone(), term_from_json(other)?]),
        }
    }
    Ok(())
}
