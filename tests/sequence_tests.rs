//! Integration tests for the query engine's cursor and operator semantics.

use stepseq::lambda::Callback;
use stepseq::query::{self, Sequence};
use stepseq::value::Value;
use stepseq::StepseqError;

fn ints(values: &[i64]) -> Vec<Value> {
    values.iter().map(|i| Value::Int(*i)).collect()
}

fn obj(pairs: &[(&str, i64)]) -> Value {
    Value::Object(
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), Value::Int(*v)))
            .collect(),
    )
}

#[test]
fn exhausted_cursor_never_changes_current() {
    let mut seq = Sequence::from_items(ints(&[1, 2, 3]));
    while seq.move_next() {}
    let last = seq.current().unwrap();
    assert_eq!(last, Value::Int(3));

    for _ in 0..5 {
        assert!(!seq.move_next());
        assert_eq!(seq.current().unwrap(), last);
    }
    assert!(!seq.is_valid());
}

#[test]
fn projection_changes_only_current() {
    let plain: Vec<Value> = {
        let mut seq = Sequence::from_items(ints(&[4, 5, 6]));
        seq.to_array().unwrap()
    };
    let projected: Vec<Value> = {
        let mut seq = Sequence::from_items(ints(&[4, 5, 6]))
            .select(Callback::parse("x => x * 100").unwrap());
        seq.to_array().unwrap()
    };
    assert_eq!(plain.len(), projected.len());
    assert_eq!(projected, ints(&[400, 500, 600]));
}

#[test]
fn distinct_preserves_first_seen_order() {
    let seq = query::from_array(ints(&[1, 2, 2, 3, 1]));
    let mut distinct = seq.distinct(None).unwrap();
    assert_eq!(distinct.to_array().unwrap(), ints(&[1, 2, 3]));
}

#[test]
fn group_by_is_stable_in_key_and_member_order() {
    let seq = query::from_array(vec![
        obj(&[("k", 0), ("v", 1)]),
        obj(&[("k", 1), ("v", 2)]),
        obj(&[("k", 0), ("v", 3)]),
    ]);
    let mut groups = seq
        .group_by(Callback::parse("x => x.k").unwrap(), None)
        .unwrap()
        .to_array()
        .unwrap();

    assert_eq!(groups.len(), 2);
    let first = groups.remove(0);
    assert_eq!(first.get_property("key"), Value::Int(0));
    assert_eq!(
        first.get_property("items"),
        Value::Array(vec![obj(&[("k", 0), ("v", 1)]), obj(&[("k", 0), ("v", 3)])])
    );
    let second = groups.remove(0);
    assert_eq!(second.get_property("key"), Value::Int(1));
    assert_eq!(second.get_property("length"), Value::Int(1));
}

#[test]
fn order_by_then_by_compound_sort() {
    let seq = query::from_array(vec![
        obj(&[("a", 1), ("b", 2)]),
        obj(&[("a", 1), ("b", 1)]),
        obj(&[("a", 0), ("b", 5)]),
    ]);
    let sorted = seq
        .order_by(Callback::parse("x => x.a").unwrap(), None)
        .unwrap()
        .then_by(Callback::parse("x => x.b").unwrap(), None)
        .unwrap()
        .to_array()
        .unwrap();
    assert_eq!(
        sorted,
        vec![
            obj(&[("a", 0), ("b", 5)]),
            obj(&[("a", 1), ("b", 1)]),
            obj(&[("a", 1), ("b", 2)]),
        ]
    );
}

#[test]
fn order_by_descending_reverses_comparer() {
    let seq = query::from_array(ints(&[2, 9, 4]));
    let sorted = seq
        .order_by_descending(Callback::parse("x => x").unwrap(), None)
        .unwrap()
        .to_array()
        .unwrap();
    assert_eq!(sorted, ints(&[9, 4, 2]));
}

#[test]
fn object_backed_sequence_exposes_property_keys() {
    let mut seq = query::from_object(vec![
        ("alpha".to_string(), Value::Int(1)),
        ("beta".to_string(), Value::Int(2)),
    ]);
    assert!(seq.move_next());
    assert_eq!(seq.item_key(), Value::Str("alpha".to_string()));
    assert_eq!(seq.current().unwrap(), Value::Int(1));
    assert!(seq.move_next());
    assert_eq!(seq.item_key(), Value::Str("beta".to_string()));
    assert!(!seq.move_next());
}

#[test]
fn reset_allows_reiteration_of_backed_sequences() {
    let mut seq = query::from_array(ints(&[1, 2]));
    assert_eq!(seq.to_array().unwrap(), ints(&[1, 2]));
    assert_eq!(seq.to_array().unwrap(), ints(&[]));
    seq.reset();
    assert_eq!(seq.to_array().unwrap(), ints(&[1, 2]));
}

#[test]
fn as_enumerable_coerces_containers_and_rejects_scalars() {
    assert!(query::as_enumerable(&Value::Array(vec![]), false)
        .unwrap()
        .is_some());
    assert!(query::as_enumerable(&Value::Object(vec![]), false)
        .unwrap()
        .is_some());
    assert!(query::as_enumerable(&Value::Int(1), false)
        .unwrap()
        .is_none());
    assert!(matches!(
        query::as_enumerable(&Value::Str("nope".into()), true),
        Err(StepseqError::NotEnumerable { .. })
    ));
}

#[test]
fn join_emits_cross_product_of_matching_groups() {
    let people = query::from_array(vec![
        obj(&[("dept", 1), ("id", 10)]),
        obj(&[("dept", 2), ("id", 20)]),
        obj(&[("dept", 1), ("id", 11)]),
    ]);
    let depts = query::from_array(vec![
        obj(&[("dept", 1), ("floor", 3)]),
        obj(&[("dept", 2), ("floor", 4)]),
    ]);
    let mut joined = people
        .join(
            depts,
            Callback::parse("p => p.dept").unwrap(),
            Callback::parse("d => d.dept").unwrap(),
            Callback::parse("(p, d) => p.id + d.floor").unwrap(),
            None,
        )
        .unwrap();
    // groups are built in first-seen key order, so dept 1's members pair up
    // before dept 2's
    assert_eq!(joined.to_array().unwrap(), ints(&[13, 14, 24]));
}

#[test]
fn terminal_errors_match_taxonomy() {
    let mut empty = query::from_array(vec![]);
    assert!(matches!(
        empty.first(None),
        Err(StepseqError::EmptySequence { .. })
    ));

    let mut empty = query::from_array(vec![]);
    assert_eq!(
        empty.first_or_default(None, Value::Int(-1)).unwrap(),
        Value::Int(-1)
    );

    let mut pair = query::from_array(ints(&[1, 1]));
    assert!(matches!(
        pair.single_or_default(None, Value::Null),
        Err(StepseqError::MultipleMatches { .. })
    ));
}

#[test]
fn cancellation_stops_each_after_current_item() {
    use std::cell::RefCell;
    use std::rc::Rc;

    let seen = Rc::new(RefCell::new(0));
    let counter = seen.clone();
    let mut seq = query::from_array(ints(&[1, 2, 3, 4, 5]));
    seq.each(&Callback::native(move |args, ctx| {
        *counter.borrow_mut() += 1;
        if args[0] == Value::Int(3) {
            ctx.cancel(true);
        }
        Ok(Value::Undefined)
    }))
    .unwrap();
    assert_eq!(*seen.borrow(), 3);
}
