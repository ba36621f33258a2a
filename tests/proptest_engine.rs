// SPDX-License-Identifier: PMPL-1.0-or-later

//! Property tests for unification and candidate retrieval

use proptest::prelude::*;
use std::collections::HashMap;
use triplog::kanren::{SearchMode, Substitution, Var};
use triplog::types::{AttrSpec, Schema};
use triplog::{Database, Goal, Row, Rule, Term};

fn arb_ground() -> impl Strategy<Value = Term> {
    let leaf = prop_oneof![
        "[a-c]".prop_map(|s| Term::str(&s)),
        (0i64..3).prop_map(Term::Int),
        any::<bool>().prop_map(Term::Bool),
    ];
    leaf.prop_recursive(3, 16, 3, |inner| {
        proptest::collection::vec(inner, 0..3).prop_map(Term::compound)
    })
}

/// Replace the subterms picked by `holes` (preorder) with distinct variables
fn punch(term: &Term, holes: &mut impl Iterator<Item = bool>, next: &mut u64) -> Term {
    if holes.next().unwrap_or(false) {
        *next += 1;
        return Term::Var(Var(*next));
    }
    match term {
        Term::Compound(items) => {
            Term::compound(items.iter().map(|item| punch(item, holes, next)).collect())
        }
        other => other.clone(),
    }
}

/// Like `punch`, but holes draw from a small shared pool of variable ids,
/// so the same variable can show up in both terms and more than once
fn punch_shared(term: &Term, holes: &mut impl Iterator<Item = Option<u64>>) -> Term {
    if let Some(var) = holes.next().flatten() {
        return Term::Var(Var(var));
    }
    match term {
        Term::Compound(items) => {
            Term::compound(items.iter().map(|item| punch_shared(item, holes)).collect())
        }
        other => other.clone(),
    }
}

/// Equal up to a consistent one-to-one renaming of variables
fn is_variant(
    a: &Term,
    b: &Term,
    map: &mut HashMap<Var, Var>,
    back: &mut HashMap<Var, Var>,
) -> bool {
    match (a, b) {
        (Term::Var(x), Term::Var(y)) => {
            *map.entry(*x).or_insert(*y) == *y && *back.entry(*y).or_insert(*x) == *x
        }
        (Term::Compound(xs), Term::Compound(ys)) => {
            xs.len() == ys.len()
                && xs.iter().zip(ys.iter()).all(|(x, y)| is_variant(x, y, map, back))
        }
        _ => a == b,
    }
}

proptest! {
    /// A ground term with holes punched in it unifies back to its source term
    #[test]
    fn punched_pattern_unifies_with_its_source(
        ground in arb_ground(),
        holes in proptest::collection::vec(prop::bool::weighted(0.3), 0..24),
    ) {
        let pattern = punch(&ground, &mut holes.into_iter(), &mut 0);
        let env = Substitution::new().unify(&pattern, &ground);
        prop_assert!(env.is_some());
        let env = env.unwrap();
        prop_assert_eq!(env.reify(&pattern), ground.clone());
        prop_assert!(env.reify(&pattern).is_ground());
    }

    /// Success and the resulting instance do not depend on argument order
    #[test]
    fn unification_is_symmetric(
        ground in arb_ground(),
        other in arb_ground(),
        holes in proptest::collection::vec(any::<bool>(), 0..24),
    ) {
        let pattern = punch(&other, &mut holes.into_iter(), &mut 0);
        let forward = Substitution::new().unify(&pattern, &ground);
        let backward = Substitution::new().unify(&ground, &pattern);
        prop_assert_eq!(forward.is_some(), backward.is_some());
        if let (Some(f), Some(b)) = (forward, backward) {
            prop_assert_eq!(f.reify(&pattern), b.reify(&pattern));
        }
    }

    /// Variables on both sides: success is order independent, each result
    /// really unifies the pair, and the two unifiers differ only by renaming
    #[test]
    fn unification_is_symmetric_with_variables_on_both_sides(
        left in arb_ground(),
        right in arb_ground(),
        holes in proptest::collection::vec(proptest::option::weighted(0.4, 0u64..4), 0..32),
    ) {
        let mut holes = holes.into_iter();
        let a = punch_shared(&left, &mut holes);
        let b = punch_shared(&right, &mut holes);
        let forward = Substitution::new().unify(&a, &b);
        let backward = Substitution::new().unify(&b, &a);
        prop_assert_eq!(forward.is_some(), backward.is_some());
        if let (Some(f), Some(g)) = (forward, backward) {
            prop_assert_eq!(f.reify(&a), f.reify(&b));
            prop_assert_eq!(g.reify(&a), g.reify(&b));
            prop_assert!(is_variant(
                &f.reify(&a),
                &g.reify(&a),
                &mut HashMap::new(),
                &mut HashMap::new()
            ));
        }
    }

    /// Distinct ground terms never unify
    #[test]
    fn ground_terms_unify_only_when_equal(a in arb_ground(), b in arb_ground()) {
        let env = Substitution::new().unify(&a, &b);
        prop_assert_eq!(env.is_some(), a == b);
        if let Some(env) = env {
            prop_assert!(env.is_empty());
        }
    }
}

const ENTITIES: [&str; 4] = ["e0", "e1", "e2", "e3"];

#[derive(Debug, Clone)]
enum Slot {
    Var(&'static str),
    Const(Term),
}

fn arb_value() -> impl Strategy<Value = Term> {
    prop_oneof![
        (0usize..4).prop_map(|i| Term::str(ENTITIES[i])),
        (0i64..2).prop_map(Term::Int),
    ]
}

fn arb_fact() -> impl Strategy<Value = (Term, &'static str, Term)> {
    (0usize..4, prop::sample::select(vec!["p", "q"]), arb_value())
        .prop_map(|(e, a, v)| (Term::str(ENTITIES[e]), a, v))
}

fn arb_slot(name: &'static str, constants: Vec<Term>) -> impl Strategy<Value = Slot> {
    prop_oneof![
        1 => Just(Slot::Var(name)),
        2 => prop::sample::select(constants).prop_map(Slot::Const),
    ]
}

fn arb_pattern() -> impl Strategy<Value = [Slot; 3]> {
    let entities: Vec<Term> = ENTITIES.iter().map(|e| Term::str(e)).collect();
    let attributes: Vec<Term> = ["p", "q", "r", "s"].iter().map(|a| Term::str(a)).collect();
    let mut values = entities.clone();
    values.extend([Term::Int(0), Term::Int(1)]);
    (
        arb_slot("a", entities),
        arb_slot("b", attributes),
        arb_slot("c", values),
    )
        .prop_map(|(e, a, v)| [e, a, v])
}

fn build(facts: &[(Term, &'static str, Term)], mode: SearchMode) -> Database {
    let schema = Schema::new().with(
        "p",
        AttrSpec {
            many: true,
            reference: true,
        },
    );
    let mut db = Database::with_schema(schema);
    db.set_search_mode(mode);
    for (entity, attribute, value) in facts {
        db.add_fact(entity.clone(), *attribute, value.clone()).unwrap();
    }
    db.add_rule(
        Rule::build(|q| {
            vec![
                Goal::triple(q.var("x"), "r", q.var("y")),
                Goal::triple(q.var("x"), "p", q.var("z")),
                Goal::triple(q.var("z"), "q", q.var("y")),
            ]
        })
        .unwrap(),
    );
    db.add_rule(
        Rule::build(|q| {
            vec![
                Goal::triple(q.var("x"), "s", q.var("y")),
                Goal::triple(q.var("x"), "p", q.var("y")),
                Goal::neq(q.var("x"), q.var("y")),
            ]
        })
        .unwrap(),
    );
    db
}

fn answers(db: &Database, pattern: &[Slot; 3]) -> Vec<Row> {
    db.query(|q| {
        let mut term = |slot: &Slot| match slot {
            Slot::Var(name) => q.var(name),
            Slot::Const(value) => value.clone(),
        };
        vec![Goal::triple(
            term(&pattern[0]),
            term(&pattern[1]),
            term(&pattern[2]),
        )]
    })
    .unwrap()
    .collect::<Result<Vec<_>, _>>()
    .unwrap()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    /// The index narrows candidates without losing or reordering answers
    #[test]
    fn index_agrees_with_full_scan(
        facts in proptest::collection::vec(arb_fact(), 0..12),
        pattern in arb_pattern(),
    ) {
        let indexed = build(&facts, SearchMode::Indexed);
        let scanned = build(&facts, SearchMode::FullScan);
        prop_assert_eq!(answers(&indexed, &pattern), answers(&scanned, &pattern));
    }

    /// Facts alone: a fully variable pattern returns one row per stored fact
    #[test]
    fn open_pattern_enumerates_every_fact(
        facts in proptest::collection::vec(arb_fact(), 0..12),
    ) {
        let mut db = Database::new();
        for (entity, attribute, value) in &facts {
            db.add_fact(entity.clone(), *attribute, value.clone()).unwrap();
        }
        let rows = answers(&db, &[Slot::Var("a"), Slot::Var("b"), Slot::Var("c")]);
        prop_assert_eq!(rows.len(), facts.len());
        for (row, (entity, attribute, value)) in rows.iter().zip(&facts) {
            prop_assert_eq!(row.get("a"), Some(entity));
            prop_assert_eq!(row.get("b"), Some(&Term::str(attribute)));
            prop_assert_eq!(row.get("c"), Some(value));
        }
    }
}
