// SPDX-License-Identifier: PMPL-1.0-or-later

//! Terms, substitutions and unification
//!
//! A substitution is a persistent map, so extending it is O(log n) and
//! every earlier substitution stays valid. Backtracking is just dropping
//! the newer value.

use rpds::HashTrieMap;
use std::fmt;
use std::rc::Rc;

/// Logic variable identity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Var(pub u64);

impl Var {
    /// Shift a scope-local variable into an activation's id range
    pub fn offset(self, base: u64) -> Var {
        Var(self.0 + base)
    }
}

/// A logic term
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Term {
    /// Logic variable
    Var(Var),
    /// String atom
    Str(Rc<str>),
    /// Integer value
    Int(i64),
    /// Boolean value
    Bool(bool),
    /// Fixed-arity ordered sequence of terms
    Compound(Rc<[Term]>),
}

impl Term {
    pub fn str(s: &str) -> Self {
        Term::Str(Rc::from(s))
    }

    pub fn compound(items: Vec<Term>) -> Self {
        Term::Compound(Rc::from(items))
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Term::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Term::Int(n) => Some(*n),
            _ => None,
        }
    }

    /// True when no variable occurs anywhere in the term
    pub fn is_ground(&self) -> bool {
        match self {
            Term::Var(_) => false,
            Term::Compound(items) => items.iter().all(Term::is_ground),
            _ => true,
        }
    }

    /// Largest variable id occurring in the term
    pub fn max_var(&self) -> Option<Var> {
        match self {
            Term::Var(v) => Some(*v),
            Term::Compound(items) => items.iter().filter_map(Term::max_var).max(),
            _ => None,
        }
    }

    /// Rename every variable by adding `base` to its id
    pub fn offset(&self, base: u64) -> Term {
        match self {
            Term::Var(v) => Term::Var(v.offset(base)),
            Term::Compound(items) if !self.is_ground() => {
                Term::compound(items.iter().map(|t| t.offset(base)).collect())
            }
            _ => self.clone(),
        }
    }
}

impl From<&str> for Term {
    fn from(s: &str) -> Self {
        Term::str(s)
    }
}

impl From<String> for Term {
    fn from(s: String) -> Self {
        Term::Str(Rc::from(s))
    }
}

impl From<i64> for Term {
    fn from(n: i64) -> Self {
        Term::Int(n)
    }
}

impl From<i32> for Term {
    fn from(n: i32) -> Self {
        Term::Int(n as i64)
    }
}

impl From<bool> for Term {
    fn from(b: bool) -> Self {
        Term::Bool(b)
    }
}

impl From<Var> for Term {
    fn from(v: Var) -> Self {
        Term::Var(v)
    }
}

impl From<Vec<Term>> for Term {
    fn from(items: Vec<Term>) -> Self {
        Term::compound(items)
    }
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Term::Var(v) => write!(f, "_G{}", v.0),
            Term::Str(s) => write!(f, "{:?}", s),
            Term::Int(n) => write!(f, "{}", n),
            Term::Bool(b) => write!(f, "{}", b),
            Term::Compound(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, "]")
            }
        }
    }
}

/// Substitution: persistent mapping from variables to terms
#[derive(Debug, Clone, Default)]
pub struct Substitution {
    bindings: HashTrieMap<Var, Term>,
}

impl Substitution {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.bindings.size()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    /// Follow variable-to-variable chains until reaching a non-variable
    /// or an unbound variable
    pub fn walk(&self, term: &Term) -> Term {
        let mut current = term;
        while let Term::Var(v) = current {
            match self.bindings.get(v) {
                Some(bound) => current = bound,
                None => break,
            }
        }
        current.clone()
    }

    /// New substitution with one more binding; `self` is untouched
    pub fn extend(&self, var: Var, term: Term) -> Substitution {
        Substitution {
            bindings: self.bindings.insert(var, term),
        }
    }

    /// Unify two terms, extending the substitution if successful
    pub fn unify(&self, t1: &Term, t2: &Term) -> Option<Substitution> {
        let t1 = self.walk(t1);
        let t2 = self.walk(t2);

        match (&t1, &t2) {
            // Same term (covers a variable meeting itself, so no self-binding)
            (a, b) if a == b => Some(self.clone()),

            // Variable binding
            (Term::Var(v), _) => self.bind(*v, t2),
            (_, Term::Var(v)) => self.bind(*v, t1),

            // Compound term unification
            (Term::Compound(xs), Term::Compound(ys)) => {
                if xs.len() != ys.len() {
                    return None;
                }
                let mut subst = self.clone();
                for (x, y) in xs.iter().zip(ys.iter()) {
                    subst = subst.unify(x, y)?;
                }
                Some(subst)
            }

            // No unification possible
            _ => None,
        }
    }

    /// Bind `var` unless `term` mentions it; a cyclic binding fails instead
    fn bind(&self, var: Var, term: Term) -> Option<Substitution> {
        if self.occurs(var, &term) {
            None
        } else {
            Some(self.extend(var, term))
        }
    }

    fn occurs(&self, var: Var, term: &Term) -> bool {
        match self.walk(term) {
            Term::Var(v) => v == var,
            Term::Compound(items) => items.iter().any(|item| self.occurs(var, item)),
            _ => false,
        }
    }

    /// Resolve a term all the way down, including inside compounds
    pub fn reify(&self, term: &Term) -> Term {
        match self.walk(term) {
            Term::Compound(items) => {
                Term::compound(items.iter().map(|t| self.reify(t)).collect())
            }
            other => other,
        }
    }

    /// Extract the ground value of a variable, if it has one
    pub fn resolve(&self, var: Var) -> Option<Term> {
        let resolved = self.reify(&Term::Var(var));
        if resolved.is_ground() {
            Some(resolved)
        } else {
            None
        }
    }
}
