// SPDX-License-Identifier: PMPL-1.0-or-later

//! Resolution observers

use crate::kanren::builtins::Builtin;
use crate::kanren::query::{Goal, Triple};
use colored::*;
use std::cell::Cell;
use std::rc::Rc;

/// One step of the search, as seen by a `Tracer`
#[derive(Debug)]
pub enum TraceEvent<'a> {
    /// A pattern goal was selected and its candidates computed
    Goal { goal: &'a Goal, candidates: usize },
    /// A fact was tried against the selected goal
    Fact { fact: &'a Triple, matched: bool },
    /// A rule head unified; its body runs with variables from `base` upward
    Rule { name: Option<&'a str>, head: &'a Triple, base: u64 },
    /// A built-in was evaluated
    Check { builtin: &'a Builtin, passed: bool },
    /// Every goal was satisfied
    Solution { bindings: usize },
    /// A solution was dropped because `var` stayed unbound
    Incomplete { var: &'a str },
}

/// Observer invoked at each resolution step
pub trait Tracer {
    fn trace(&self, event: &TraceEvent<'_>);
}

impl<T: Tracer + ?Sized> Tracer for Rc<T> {
    fn trace(&self, event: &TraceEvent<'_>) {
        (**self).trace(event)
    }
}

/// Default observer: ignores everything
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopTracer;

impl Tracer for NoopTracer {
    fn trace(&self, _event: &TraceEvent<'_>) {}
}

/// Prints each event to stderr
#[derive(Debug, Default)]
pub struct StderrTracer {
    step: Cell<u64>,
}

impl StderrTracer {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Tracer for StderrTracer {
    fn trace(&self, event: &TraceEvent<'_>) {
        let step = self.step.get() + 1;
        self.step.set(step);
        let line = match event {
            TraceEvent::Goal { goal, candidates } => {
                format!("{} {} ({} candidates)", "goal".bold().cyan(), goal, candidates)
            }
            TraceEvent::Fact { fact, matched } => {
                let mark = if *matched { "match".green() } else { "miss".dimmed() };
                format!("  {} ({}, {}, {})", mark, fact[0], fact[1], fact[2])
            }
            TraceEvent::Rule { name, head, base } => format!(
                "  {} {} ({}, {}, {}) @{}",
                "rule".bold().yellow(),
                name.unwrap_or("<anonymous>"),
                head[0],
                head[1],
                head[2],
                base
            ),
            TraceEvent::Check { builtin, passed } => {
                let mark = if *passed { "pass".green() } else { "fail".red() };
                format!("  {} {}", mark, builtin)
            }
            TraceEvent::Solution { bindings } => {
                format!("{} ({} bindings)", "solution".bold().green(), bindings)
            }
            TraceEvent::Incomplete { var } => {
                format!("{} ?{} left unbound", "dropped".bold().red(), var)
            }
        };
        eprintln!("{:>6} {}", step.to_string().dimmed(), line);
    }
}

/// Collects rendered events; handy for asserting on search order
#[derive(Debug, Default)]
pub struct RecordingTracer {
    events: std::cell::RefCell<Vec<String>>,
}

impl RecordingTracer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<String> {
        self.events.borrow().clone()
    }
}

impl Tracer for RecordingTracer {
    fn trace(&self, event: &TraceEvent<'_>) {
        let rendered = match event {
            TraceEvent::Goal { goal, .. } => format!("goal {}", goal),
            TraceEvent::Fact { fact, matched } => {
                format!("fact ({}, {}, {}) {}", fact[0], fact[1], fact[2], matched)
            }
            TraceEvent::Rule { name, .. } => format!("rule {}", name.unwrap_or("_")),
            TraceEvent::Check { builtin, passed } => format!("check {} {}", builtin.name(), passed),
            TraceEvent::Solution { .. } => "solution".to_string(),
            TraceEvent::Incomplete { var } => format!("incomplete {}", var),
        };
        self.events.borrow_mut().push(rendered);
    }
}
