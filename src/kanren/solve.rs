// SPDX-License-Identifier: PMPL-1.0-or-later

//! Depth-first SLD resolution as a pull-based iterator
//!
//! The search state is an explicit stack of choice points. Nothing runs
//! ahead of the consumer: each `next` call advances just far enough to
//! produce one solution, and dropping the iterator abandons the search.
//!
//! Remaining goals are a persistent list, so a rule activation pushes its
//! body in front of the caller's continuation without copying it. The
//! resulting order is the same as resolving the body to completion and
//! then the rest of the conjunction for each body solution.

use crate::error::Result;
use crate::kanren::core::Substitution;
use crate::kanren::query::{Goal, Query, Row, Triple};
use crate::kanren::store::{Entry, SearchMode, Store};
use crate::kanren::trace::{TraceEvent, Tracer};
use rpds::List;

struct ChoicePoint {
    env: Substitution,
    goal: Triple,
    rest: List<Goal>,
    candidates: Vec<usize>,
    next: usize,
}

/// Lazy stream of environments satisfying a conjunction of goals
pub struct Solutions<'a> {
    store: &'a Store,
    tracer: &'a dyn Tracer,
    mode: SearchMode,
    next_var: u64,
    pending: Option<(Substitution, List<Goal>)>,
    stack: Vec<ChoicePoint>,
}

impl<'a> Solutions<'a> {
    /// Start resolving `goals` under `env`.
    ///
    /// `next_var` must exceed every variable id already in use by the goals
    /// and the environment; rule activations allocate from there upward.
    pub fn new(
        store: &'a Store,
        tracer: &'a dyn Tracer,
        mode: SearchMode,
        env: Substitution,
        goals: &[Goal],
        next_var: u64,
    ) -> Self {
        let mut list = List::new();
        for goal in goals.iter().rev() {
            list.push_front_mut(goal.clone());
        }
        Self {
            store,
            tracer,
            mode,
            next_var,
            pending: Some((env, list)),
            stack: Vec::new(),
        }
    }

    /// Take the first goal of a pending conjunction.
    /// Returns a solution when the conjunction is empty.
    fn expand(&mut self, env: Substitution, goals: List<Goal>) -> Option<Result<Substitution>> {
        let (goal, rest) = match (goals.first(), goals.drop_first()) {
            (Some(goal), Some(rest)) => (goal.clone(), rest),
            _ => {
                self.tracer.trace(&TraceEvent::Solution {
                    bindings: env.len(),
                });
                return Some(Ok(env));
            }
        };

        match goal {
            Goal::Builtin(ref builtin) => match builtin.check(&env) {
                Ok(passed) => {
                    self.tracer.trace(&TraceEvent::Check { builtin, passed });
                    if passed {
                        self.pending = Some((env, rest));
                    }
                }
                Err(err) => {
                    self.stack.clear();
                    return Some(Err(err));
                }
            },
            Goal::Pattern(ref triple) => {
                let candidates = self.store.search_space(&env, triple, self.mode);
                self.tracer.trace(&TraceEvent::Goal {
                    goal: &goal,
                    candidates: candidates.len(),
                });
                self.stack.push(ChoicePoint {
                    env,
                    goal: triple.clone(),
                    rest,
                    candidates,
                    next: 0,
                });
            }
        }
        None
    }

    /// Try the next candidate of the innermost choice point.
    /// Returns false when the search space is exhausted.
    fn backtrack(&mut self) -> bool {
        let Some(cp) = self.stack.last_mut() else {
            return false;
        };
        let Some(&pos) = cp.candidates.get(cp.next) else {
            self.stack.pop();
            return true;
        };
        cp.next += 1;

        match self.store.entry(pos) {
            Some(Entry::Fact(fact)) => {
                let unified = unify_triple(&cp.env, &cp.goal, fact);
                self.tracer.trace(&TraceEvent::Fact {
                    fact,
                    matched: unified.is_some(),
                });
                if let Some(env) = unified {
                    self.pending = Some((env, cp.rest.clone()));
                }
            }
            Some(Entry::Rule(rule)) => {
                // ids are only consumed when the head unifies; a failed
                // attempt leaves no binding that mentions them
                let base = self.next_var;
                let head = rule.head_at(base);
                if let Some(env) = unify_triple(&cp.env, &cp.goal, &head) {
                    self.next_var += rule.var_count();
                    self.tracer.trace(&TraceEvent::Rule {
                        name: rule.name(),
                        head: &head,
                        base,
                    });
                    let mut goals = cp.rest.clone();
                    for goal in rule.body_at(base).into_iter().rev() {
                        goals.push_front_mut(goal);
                    }
                    self.pending = Some((env, goals));
                }
            }
            None => {}
        }
        true
    }
}

impl Iterator for Solutions<'_> {
    type Item = Result<Substitution>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some((env, goals)) = self.pending.take() {
                if let Some(found) = self.expand(env, goals) {
                    return Some(found);
                }
            } else if !self.backtrack() {
                return None;
            }
        }
    }
}

fn unify_triple(env: &Substitution, goal: &Triple, head: &Triple) -> Option<Substitution> {
    env.unify(&goal[0], &head[0])?
        .unify(&goal[1], &head[1])?
        .unify(&goal[2], &head[2])
}

/// Decoded rows of a query; incomplete solutions are skipped
pub struct Rows<'a> {
    solutions: Solutions<'a>,
    tracer: &'a dyn Tracer,
    query: Query,
    failed: bool,
}

impl<'a> Rows<'a> {
    pub fn new(store: &'a Store, tracer: &'a dyn Tracer, mode: SearchMode, query: Query) -> Self {
        let solutions = Solutions::new(
            store,
            tracer,
            mode,
            Substitution::new(),
            query.goals(),
            query.scope_len(),
        );
        Self {
            solutions,
            tracer,
            query,
            failed: false,
        }
    }
}

impl Iterator for Rows<'_> {
    type Item = Result<Row>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        loop {
            match self.solutions.next()? {
                Ok(env) => match Row::decode(&env, self.query.vars()) {
                    Ok(row) => return Some(Ok(row)),
                    Err(var) => self.tracer.trace(&TraceEvent::Incomplete { var: &var }),
                },
                Err(err) => {
                    self.failed = true;
                    return Some(Err(err));
                }
            }
        }
    }
}
