//! The sequence type and its operator library.
//!
//! A sequence is a pull-based, single-pass cursor over dynamic values.
//! `select` is the only lazy operator; every other combinator drains the
//! source cursor through `move_next`/`current` and returns a brand-new
//! array-backed sequence. Draining consumes the cursor, so re-iterating a
//! source requires `reset()`.

use crate::error::{Result, StepseqError};
use crate::lambda::{Callback, ItemContext};
use crate::query::cursor::Cursor;
use crate::query::grouping::Grouping;
use crate::query::ordering::{sort_items, SortSpec};
use crate::value::Value;
use std::rc::Rc;

/// A pull-based sequence of dynamic values
#[derive(Debug, Clone)]
pub struct Sequence {
    cursor: Cursor,
    projection: Option<Callback>,
    group_key: Option<Value>,
    /// Pre-sort items retained by ordered sequences so `then_by` can
    /// re-derive the sort from the original order
    original_items: Option<Vec<Value>>,
    sort_specs: Vec<SortSpec>,
}

impl Sequence {
    pub(crate) fn new(cursor: Cursor) -> Self {
        Self {
            cursor,
            projection: None,
            group_key: None,
            original_items: None,
            sort_specs: Vec::new(),
        }
    }

    /// Array-backed sequence over the given items
    pub fn from_items(items: Vec<Value>) -> Self {
        Self::new(Cursor::items(items))
    }

    /// Object-backed sequence over property entries; `item_key` reports the
    /// property name, `current` its value
    pub fn from_entries(entries: Vec<(String, Value)>) -> Self {
        Self::new(Cursor::entries(entries))
    }

    /// Array-backed sequence carrying a group key
    pub fn grouped(key: Value, items: Vec<Value>) -> Self {
        let mut seq = Self::from_items(items);
        seq.group_key = Some(key);
        seq
    }

    /// Sequence of `count` consecutive integers starting at `start`
    pub fn range(start: i64, count: usize) -> Self {
        Self::from_items((0..count).map(|i| Value::Int(start + i as i64)).collect())
    }

    // ---- cursor primitives ----

    /// Advance the cursor; returns whether a new valid item is available
    pub fn move_next(&mut self) -> bool {
        self.cursor.move_next()
    }

    /// The projected value under the cursor. `undefined` before the first
    /// advance; after exhaustion this keeps returning the last element.
    pub fn current(&self) -> Result<Value> {
        let raw = match self.cursor.raw_current() {
            Some(value) => value.clone(),
            None => return Ok(Value::Undefined),
        };
        match &self.projection {
            None => Ok(raw),
            Some(projection) => {
                let index = Value::Int(self.cursor.position().max(0) as i64);
                projection.call(&[raw, index])
            }
        }
    }

    /// Rewind to before the first element
    pub fn reset(&mut self) {
        self.cursor.reset();
    }

    pub fn is_valid(&self) -> bool {
        self.cursor.is_valid()
    }

    /// Index (array-backed) or property name (object-backed) of the
    /// current item
    pub fn item_key(&self) -> Value {
        self.cursor.item_key()
    }

    /// The group key, for sequences produced by grouping
    pub fn group_key(&self) -> Option<&Value> {
        self.group_key.as_ref()
    }

    // ---- the one lazy operator ----

    /// Attach or replace the projection applied by `current`. No
    /// enumeration happens; the same sequence is returned.
    pub fn select(mut self, selector: Callback) -> Sequence {
        self.projection = Some(selector);
        self
    }

    // ---- iteration plumbing ----

    /// Drain the cursor, applying the projection, honoring the per-item
    /// cancel flag when a callback is supplied.
    fn drain(&mut self) -> Result<Vec<Value>> {
        let mut out = Vec::new();
        while self.cursor.move_next() {
            out.push(self.current()?);
        }
        crate::logging::log_sequence_operation("drain", out.len(), None);
        Ok(out)
    }

    /// Drain while feeding each `(item, index)` pair to `f`; `f` may cancel
    /// iteration after the current item via the `ItemContext`.
    fn drain_with<F>(&mut self, mut f: F) -> Result<()>
    where
        F: FnMut(Value, usize, &ItemContext) -> Result<()>,
    {
        let ctx = ItemContext::new();
        let mut index = 0usize;
        while self.cursor.move_next() {
            let item = self.current()?;
            f(item, index, &ctx)?;
            if ctx.is_cancelled() {
                break;
            }
            index += 1;
        }
        Ok(())
    }

    fn invoke_predicate(
        predicate: &Callback,
        item: &Value,
        index: usize,
        ctx: &ItemContext,
    ) -> Result<bool> {
        let result = predicate.invoke(&[item.clone(), Value::Int(index as i64)], ctx)?;
        Ok(result.is_truthy())
    }

    // ---- eager combinators ----

    /// Keep the items the predicate accepts
    pub fn where_(mut self, predicate: Callback) -> Result<Sequence> {
        let mut out = Vec::new();
        self.drain_with(|item, index, ctx| {
            if Self::invoke_predicate(&predicate, &item, index, ctx)? {
                out.push(item);
            }
            Ok(())
        })?;
        Ok(Sequence::from_items(out))
    }

    /// Map each item to an enumerable and flatten the results.
    /// Non-enumerable mapped values are kept as single items.
    pub fn select_many(mut self, selector: Callback) -> Result<Sequence> {
        let mut out = Vec::new();
        self.drain_with(|item, index, ctx| {
            let mapped = selector.invoke(&[item, Value::Int(index as i64)], ctx)?;
            match crate::query::as_enumerable(&mapped, false)? {
                Some(mut inner) => out.append(&mut inner.drain()?),
                None => out.push(mapped),
            }
            Ok(())
        })?;
        Ok(Sequence::from_items(out))
    }

    /// Distinct items in first-seen order
    pub fn distinct(mut self, equality: Option<Callback>) -> Result<Sequence> {
        let mut out: Vec<Value> = Vec::new();
        self.drain_with(|item, _index, _ctx| {
            if !contains_value(&out, &item, equality.as_ref())? {
                out.push(item);
            }
            Ok(())
        })?;
        Ok(Sequence::from_items(out))
    }

    /// This sequence followed by all of `other`
    pub fn concat(mut self, mut other: Sequence) -> Result<Sequence> {
        let mut out = self.drain()?;
        out.append(&mut other.drain()?);
        Ok(Sequence::from_items(out))
    }

    /// Pairwise combination until the shorter side ends. Without a result
    /// selector each pair becomes a two-element array.
    pub fn zip(mut self, mut other: Sequence, result: Option<Callback>) -> Result<Sequence> {
        let left = self.drain()?;
        let right = other.drain()?;
        let mut out = Vec::new();
        for (a, b) in left.into_iter().zip(right) {
            match &result {
                Some(selector) => out.push(selector.call(&[a, b])?),
                None => out.push(Value::Array(vec![a, b])),
            }
        }
        Ok(Sequence::from_items(out))
    }

    /// Distinct items of this sequence that are absent from `other`
    pub fn except(mut self, mut other: Sequence, equality: Option<Callback>) -> Result<Sequence> {
        let excluded = other.drain()?;
        let mut out: Vec<Value> = Vec::new();
        self.drain_with(|item, _index, _ctx| {
            if !contains_value(&excluded, &item, equality.as_ref())?
                && !contains_value(&out, &item, equality.as_ref())?
            {
                out.push(item);
            }
            Ok(())
        })?;
        Ok(Sequence::from_items(out))
    }

    /// Distinct items present in both sequences
    pub fn intersect(
        mut self,
        mut other: Sequence,
        equality: Option<Callback>,
    ) -> Result<Sequence> {
        let candidates = other.drain()?;
        let mut out: Vec<Value> = Vec::new();
        self.drain_with(|item, _index, _ctx| {
            if contains_value(&candidates, &item, equality.as_ref())?
                && !contains_value(&out, &item, equality.as_ref())?
            {
                out.push(item);
            }
            Ok(())
        })?;
        Ok(Sequence::from_items(out))
    }

    /// Distinct items of both sequences, this sequence's first
    pub fn union(self, other: Sequence, equality: Option<Callback>) -> Result<Sequence> {
        self.concat(other)?.distinct(equality)
    }

    /// Items in reverse order
    pub fn reverse(mut self) -> Result<Sequence> {
        let mut items = self.drain()?;
        items.reverse();
        Ok(Sequence::from_items(items))
    }

    /// Skip the first `count` items
    pub fn skip(mut self, count: usize) -> Result<Sequence> {
        let items = self.drain()?;
        Ok(Sequence::from_items(
            items.into_iter().skip(count).collect(),
        ))
    }

    /// Take at most the first `count` items
    pub fn take(mut self, count: usize) -> Result<Sequence> {
        let items = self.drain()?;
        Ok(Sequence::from_items(
            items.into_iter().take(count).collect(),
        ))
    }

    /// Skip items while the predicate holds, then keep everything after
    pub fn skip_while(mut self, predicate: Callback) -> Result<Sequence> {
        let mut out = Vec::new();
        let mut skipping = true;
        self.drain_with(|item, index, ctx| {
            if skipping && Self::invoke_predicate(&predicate, &item, index, ctx)? {
                return Ok(());
            }
            skipping = false;
            out.push(item);
            Ok(())
        })?;
        Ok(Sequence::from_items(out))
    }

    /// Keep items while the predicate holds, then stop
    pub fn take_while(mut self, predicate: Callback) -> Result<Sequence> {
        let mut out = Vec::new();
        self.drain_with(|item, index, ctx| {
            if Self::invoke_predicate(&predicate, &item, index, ctx)? {
                out.push(item);
            } else {
                ctx.cancel(true);
            }
            Ok(())
        })?;
        Ok(Sequence::from_items(out))
    }

    // ---- ordering ----

    /// Stable sort by the selector's keys using the comparer
    /// (default: numeric/string less-than)
    pub fn order_by(self, selector: Callback, comparer: Option<Callback>) -> Result<Sequence> {
        self.order_by_spec(SortSpec::ascending(selector, comparer))
    }

    /// `order_by` with the comparer's arguments swapped
    pub fn order_by_descending(
        self,
        selector: Callback,
        comparer: Option<Callback>,
    ) -> Result<Sequence> {
        self.order_by_spec(SortSpec::descending(selector, comparer))
    }

    fn order_by_spec(mut self, spec: SortSpec) -> Result<Sequence> {
        let original = self.drain()?;
        let specs = vec![spec];
        let sorted = sort_items(&original, &specs)?;
        let mut seq = Sequence::from_items(sorted);
        seq.original_items = Some(original);
        seq.sort_specs = specs;
        Ok(seq)
    }

    /// Add a secondary sort key. The sort is re-derived from the original
    /// pre-sort items, not refined from the already-sorted view.
    pub fn then_by(self, selector: Callback, comparer: Option<Callback>) -> Result<Sequence> {
        self.then_by_spec(SortSpec::ascending(selector, comparer))
    }

    pub fn then_by_descending(
        self,
        selector: Callback,
        comparer: Option<Callback>,
    ) -> Result<Sequence> {
        self.then_by_spec(SortSpec::descending(selector, comparer))
    }

    fn then_by_spec(mut self, spec: SortSpec) -> Result<Sequence> {
        match self.original_items.take() {
            Some(original) => {
                let mut specs = std::mem::take(&mut self.sort_specs);
                specs.push(spec);
                let sorted = sort_items(&original, &specs)?;
                let mut seq = Sequence::from_items(sorted);
                seq.original_items = Some(original);
                seq.sort_specs = specs;
                Ok(seq)
            }
            // then_by on an unordered sequence degenerates to order_by
            None => self.order_by_spec(spec),
        }
    }

    // ---- grouping and joining ----

    /// Group items by key in first-seen key order. Linear scan per item
    /// against the existing group keys; no hashing.
    pub fn group_by(self, key_selector: Callback, key_eq: Option<Callback>) -> Result<Sequence> {
        let groups = collect_groups(self, &key_selector, key_eq.as_ref())?;
        let items = groups
            .into_iter()
            .map(|(key, members)| Value::Group(Rc::new(Grouping::new(key, members))))
            .collect();
        Ok(Sequence::from_items(items))
    }

    /// Correlate two sequences on matching keys, emitting the cross product
    /// of matching groups' members through the result selector
    pub fn join(
        self,
        inner: Sequence,
        outer_key: Callback,
        inner_key: Callback,
        result: Callback,
        key_eq: Option<Callback>,
    ) -> Result<Sequence> {
        let outer_groups = collect_groups(self, &outer_key, key_eq.as_ref())?;
        let inner_groups = collect_groups(inner, &inner_key, key_eq.as_ref())?;
        let mut out = Vec::new();
        for (okey, outer_items) in &outer_groups {
            for (ikey, inner_items) in &inner_groups {
                if values_equal(okey, ikey, key_eq.as_ref())? {
                    for outer_item in outer_items {
                        for inner_item in inner_items {
                            out.push(result.call(&[outer_item.clone(), inner_item.clone()])?);
                        }
                    }
                }
            }
        }
        Ok(Sequence::from_items(out))
    }

    /// One result per outer item, paired with all matching inner items as
    /// a grouping (empty when nothing matches)
    pub fn group_join(
        self,
        inner: Sequence,
        outer_key: Callback,
        inner_key: Callback,
        result: Callback,
        key_eq: Option<Callback>,
    ) -> Result<Sequence> {
        let outer_groups = collect_groups(self, &outer_key, key_eq.as_ref())?;
        let inner_groups = collect_groups(inner, &inner_key, key_eq.as_ref())?;
        let mut out = Vec::new();
        for (okey, outer_items) in &outer_groups {
            let mut matching: Vec<Value> = Vec::new();
            for (ikey, inner_items) in &inner_groups {
                if values_equal(okey, ikey, key_eq.as_ref())? {
                    matching.extend(inner_items.iter().cloned());
                }
            }
            for outer_item in outer_items {
                let sub = Value::Group(Rc::new(Grouping::new(okey.clone(), matching.clone())));
                out.push(result.call(&[outer_item.clone(), sub])?);
            }
        }
        Ok(Sequence::from_items(out))
    }

    // ---- casting ----

    /// Convert every item to the kind named by `tag`
    pub fn cast(mut self, tag: &str) -> Result<Sequence> {
        // Validate the tag before draining anything
        if !crate::value::is_known_tag(tag) {
            return Err(StepseqError::UnsupportedCast {
                type_tag: tag.to_string(),
            });
        }
        let items = self.drain()?;
        let mut out = Vec::with_capacity(items.len());
        for item in &items {
            out.push(crate::value::cast_to(item, tag)?);
        }
        Ok(Sequence::from_items(out))
    }

    /// Keep only the items whose kind matches `tag`
    pub fn of_type(mut self, tag: &str) -> Result<Sequence> {
        if !crate::value::is_known_tag(tag) {
            return Err(StepseqError::UnsupportedCast {
                type_tag: tag.to_string(),
            });
        }
        let items = self.drain()?;
        let mut out = Vec::new();
        for item in items {
            if crate::value::matches_tag(&item, tag)? {
                out.push(item);
            }
        }
        Ok(Sequence::from_items(out))
    }

    /// The sequence itself, or a single default item when empty
    pub fn default_if_empty(mut self, default: Value) -> Result<Sequence> {
        let items = self.drain()?;
        if items.is_empty() {
            Ok(Sequence::from_items(vec![default]))
        } else {
            Ok(Sequence::from_items(items))
        }
    }

    // ---- terminals ----

    /// Invoke `f` for each `(item, index)`; `f` may cancel iteration
    pub fn each(&mut self, f: &Callback) -> Result<()> {
        self.drain_with(|item, index, ctx| {
            f.invoke(&[item, Value::Int(index as i64)], ctx)?;
            Ok(())
        })
    }

    /// Materialize the remaining items
    pub fn to_array(&mut self) -> Result<Vec<Value>> {
        self.drain()
    }

    /// Alias for `to_array`
    pub fn to_vec(&mut self) -> Result<Vec<Value>> {
        self.drain()
    }

    /// Build an object from the remaining items. Keys come from the key
    /// selector (rendered as strings); values from the value selector or
    /// the item itself. A repeated key replaces the earlier entry.
    pub fn to_object(
        &mut self,
        key_selector: &Callback,
        value_selector: Option<&Callback>,
    ) -> Result<Value> {
        let mut entries: Vec<(String, Value)> = Vec::new();
        self.drain_with(|item, index, ctx| {
            let key = key_selector
                .invoke(&[item.clone(), Value::Int(index as i64)], ctx)?
                .to_display_string();
            let value = match value_selector {
                Some(selector) => selector.invoke(&[item, Value::Int(index as i64)], ctx)?,
                None => item,
            };
            if let Some(entry) = entries.iter_mut().find(|(k, _)| *k == key) {
                entry.1 = value;
            } else {
                entries.push((key, value));
            }
            Ok(())
        })?;
        Ok(Value::Object(entries))
    }

    /// Whether any item matches (or the sequence is non-empty)
    pub fn any(&mut self, predicate: Option<&Callback>) -> Result<bool> {
        let mut found = false;
        self.drain_with(|item, index, ctx| {
            let matched = match predicate {
                Some(p) => Self::invoke_predicate(p, &item, index, ctx)?,
                None => true,
            };
            if matched {
                found = true;
                ctx.cancel(true);
            }
            Ok(())
        })?;
        Ok(found)
    }

    /// Whether every item matches
    pub fn all(&mut self, predicate: &Callback) -> Result<bool> {
        let mut holds = true;
        self.drain_with(|item, index, ctx| {
            if !Self::invoke_predicate(predicate, &item, index, ctx)? {
                holds = false;
                ctx.cancel(true);
            }
            Ok(())
        })?;
        Ok(holds)
    }

    /// Count of (matching) items
    pub fn count(&mut self, predicate: Option<&Callback>) -> Result<usize> {
        let mut n = 0usize;
        self.drain_with(|item, index, ctx| {
            let matched = match predicate {
                Some(p) => Self::invoke_predicate(p, &item, index, ctx)?,
                None => true,
            };
            if matched {
                n += 1;
            }
            Ok(())
        })?;
        Ok(n)
    }

    /// Whether an equal item occurs in the sequence
    pub fn contains(&mut self, needle: &Value, equality: Option<&Callback>) -> Result<bool> {
        let mut found = false;
        self.drain_with(|item, _index, ctx| {
            if values_equal(&item, needle, equality)? {
                found = true;
                ctx.cancel(true);
            }
            Ok(())
        })?;
        Ok(found)
    }

    /// First (matching) item; `EmptySequence` when none
    pub fn first(&mut self, predicate: Option<&Callback>) -> Result<Value> {
        match self.find_first(predicate)? {
            Some(item) => Ok(item),
            None => Err(StepseqError::EmptySequence {
                operation: "first".to_string(),
            }),
        }
    }

    /// First (matching) item, or the supplied default
    pub fn first_or_default(
        &mut self,
        predicate: Option<&Callback>,
        default: Value,
    ) -> Result<Value> {
        Ok(self.find_first(predicate)?.unwrap_or(default))
    }

    fn find_first(&mut self, predicate: Option<&Callback>) -> Result<Option<Value>> {
        let mut found = None;
        self.drain_with(|item, index, ctx| {
            let matched = match predicate {
                Some(p) => Self::invoke_predicate(p, &item, index, ctx)?,
                None => true,
            };
            if matched {
                found = Some(item);
                ctx.cancel(true);
            }
            Ok(())
        })?;
        Ok(found)
    }

    /// Last (matching) item; `EmptySequence` when none
    pub fn last(&mut self, predicate: Option<&Callback>) -> Result<Value> {
        match self.find_last(predicate)? {
            Some(item) => Ok(item),
            None => Err(StepseqError::EmptySequence {
                operation: "last".to_string(),
            }),
        }
    }

    pub fn last_or_default(
        &mut self,
        predicate: Option<&Callback>,
        default: Value,
    ) -> Result<Value> {
        Ok(self.find_last(predicate)?.unwrap_or(default))
    }

    fn find_last(&mut self, predicate: Option<&Callback>) -> Result<Option<Value>> {
        let mut found = None;
        self.drain_with(|item, index, ctx| {
            let matched = match predicate {
                Some(p) => Self::invoke_predicate(p, &item, index, ctx)?,
                None => true,
            };
            if matched {
                found = Some(item);
            }
            Ok(())
        })?;
        Ok(found)
    }

    /// Exactly one (matching) item; `EmptySequence` when none,
    /// `MultipleMatches` when more than one
    pub fn single(&mut self, predicate: Option<&Callback>) -> Result<Value> {
        match self.find_single(predicate, "single")? {
            Some(item) => Ok(item),
            None => Err(StepseqError::EmptySequence {
                operation: "single".to_string(),
            }),
        }
    }

    /// Like `single`, but emptiness yields the default instead of raising.
    /// A second match still raises `MultipleMatches`.
    pub fn single_or_default(
        &mut self,
        predicate: Option<&Callback>,
        default: Value,
    ) -> Result<Value> {
        Ok(self
            .find_single(predicate, "single_or_default")?
            .unwrap_or(default))
    }

    fn find_single(
        &mut self,
        predicate: Option<&Callback>,
        operation: &str,
    ) -> Result<Option<Value>> {
        let mut found: Option<Value> = None;
        let mut second = false;
        self.drain_with(|item, index, ctx| {
            let matched = match predicate {
                Some(p) => Self::invoke_predicate(p, &item, index, ctx)?,
                None => true,
            };
            if matched {
                if found.is_some() {
                    second = true;
                    ctx.cancel(true);
                } else {
                    found = Some(item);
                }
            }
            Ok(())
        })?;
        if second {
            return Err(StepseqError::MultipleMatches {
                operation: operation.to_string(),
            });
        }
        Ok(found)
    }

    /// Item at `index`; `EmptySequence` when the sequence is shorter
    pub fn element_at(&mut self, index: usize) -> Result<Value> {
        match self.find_element_at(index)? {
            Some(item) => Ok(item),
            None => Err(StepseqError::EmptySequence {
                operation: format!("element_at({index})"),
            }),
        }
    }

    pub fn element_at_or_default(&mut self, index: usize, default: Value) -> Result<Value> {
        Ok(self.find_element_at(index)?.unwrap_or(default))
    }

    fn find_element_at(&mut self, target: usize) -> Result<Option<Value>> {
        let mut found = None;
        self.drain_with(|item, index, ctx| {
            if index == target {
                found = Some(item);
                ctx.cancel(true);
            }
            Ok(())
        })?;
        Ok(found)
    }

    /// Fold the items with `f(accumulator, item, index)`
    pub fn aggregate(&mut self, seed: Value, f: &Callback) -> Result<Value> {
        let mut accumulator = seed;
        self.drain_with(|item, index, ctx| {
            accumulator = f.invoke(
                &[accumulator.clone(), item, Value::Int(index as i64)],
                ctx,
            )?;
            Ok(())
        })?;
        Ok(accumulator)
    }

    /// Numeric sum of the (selected) items; starts at integer zero
    pub fn sum(&mut self, selector: Option<&Callback>) -> Result<Value> {
        let mut total = Value::Int(0);
        self.drain_with(|item, index, ctx| {
            let value = match selector {
                Some(s) => s.invoke(&[item, Value::Int(index as i64)], ctx)?,
                None => item,
            };
            total = total.add(&value)?;
            Ok(())
        })?;
        Ok(total)
    }

    /// Smallest (selected) item by the default comparison;
    /// `EmptySequence` when empty
    pub fn min(&mut self, selector: Option<&Callback>) -> Result<Value> {
        self.extremum(selector, "min", |ordering| ordering.is_lt())
    }

    /// Largest (selected) item; `EmptySequence` when empty
    pub fn max(&mut self, selector: Option<&Callback>) -> Result<Value> {
        self.extremum(selector, "max", |ordering| ordering.is_gt())
    }

    fn extremum(
        &mut self,
        selector: Option<&Callback>,
        operation: &str,
        better: impl Fn(std::cmp::Ordering) -> bool,
    ) -> Result<Value> {
        let mut best: Option<Value> = None;
        self.drain_with(|item, index, ctx| {
            let value = match selector {
                Some(s) => s.invoke(&[item, Value::Int(index as i64)], ctx)?,
                None => item,
            };
            best = Some(match best.take() {
                None => value,
                Some(current_best) => {
                    if better(value.compare(&current_best)) {
                        value
                    } else {
                        current_best
                    }
                }
            });
            Ok(())
        })?;
        best.ok_or_else(|| StepseqError::EmptySequence {
            operation: operation.to_string(),
        })
    }
}

/// Whether two values are equal under the optional equality comparer
/// (default: loose equality)
fn values_equal(a: &Value, b: &Value, equality: Option<&Callback>) -> Result<bool> {
    match equality {
        None => Ok(a.loose_eq(b)),
        Some(eq) => Ok(eq.call(&[a.clone(), b.clone()])?.is_truthy()),
    }
}

fn contains_value(haystack: &[Value], needle: &Value, equality: Option<&Callback>) -> Result<bool> {
    for item in haystack {
        if values_equal(item, needle, equality)? {
            return Ok(true);
        }
    }
    Ok(false)
}

/// Drain a sequence into `(key, members)` groups in first-seen key order.
/// Linear scan per item against existing keys; no hashing.
fn collect_groups(
    mut source: Sequence,
    key_selector: &Callback,
    key_eq: Option<&Callback>,
) -> Result<Vec<(Value, Vec<Value>)>> {
    let mut groups: Vec<(Value, Vec<Value>)> = Vec::new();
    source.drain_with(|item, index, ctx| {
        let key = key_selector.invoke(&[item.clone(), Value::Int(index as i64)], ctx)?;
        for (existing, members) in groups.iter_mut() {
            if values_equal(existing, &key, key_eq)? {
                members.push(item);
                return Ok(());
            }
        }
        groups.push((key, vec![item]));
        Ok(())
    })?;
    Ok(groups)
}
