//! Sort machinery for `order_by`/`then_by`.
//!
//! Each sort level is a `SortSpec`; `then_by` composes levels and re-sorts
//! from the original pre-sort items rather than refining the sorted view.

use crate::error::{Result, StepseqError};
use crate::lambda::Callback;
use crate::value::Value;
use std::cell::RefCell;
use std::cmp::Ordering;

/// One level of an ordering: key selector, optional comparer, direction
#[derive(Debug, Clone)]
pub struct SortSpec {
    pub selector: Callback,
    pub comparer: Option<Callback>,
    pub descending: bool,
}

impl SortSpec {
    pub fn ascending(selector: Callback, comparer: Option<Callback>) -> Self {
        Self {
            selector,
            comparer,
            descending: false,
        }
    }

    pub fn descending(selector: Callback, comparer: Option<Callback>) -> Self {
        Self {
            selector,
            comparer,
            descending: true,
        }
    }
}

/// Stable-sort `items` by the composed key levels in `specs`.
///
/// Keys are precomputed per item; a descending level compares with the
/// comparer's arguments swapped.
pub fn sort_items(items: &[Value], specs: &[SortSpec]) -> Result<Vec<Value>> {
    let mut rows: Vec<(Vec<Value>, Value)> = Vec::with_capacity(items.len());
    for (index, item) in items.iter().enumerate() {
        let mut keys = Vec::with_capacity(specs.len());
        for spec in specs {
            keys.push(
                spec.selector
                    .call(&[item.clone(), Value::Int(index as i64)])?,
            );
        }
        rows.push((keys, item.clone()));
    }

    // User comparers are fallible but sort_by's closure is not; capture the
    // first failure and surface it after the sort.
    let failure: RefCell<Option<StepseqError>> = RefCell::new(None);
    rows.sort_by(|a, b| {
        for (level, spec) in specs.iter().enumerate() {
            let (x, y) = if spec.descending {
                (&b.0[level], &a.0[level])
            } else {
                (&a.0[level], &b.0[level])
            };
            let ordering = match &spec.comparer {
                None => x.compare(y),
                Some(comparer) => match comparer.call(&[x.clone(), y.clone()]) {
                    Ok(result) => int_ordering(&result),
                    Err(err) => {
                        failure.borrow_mut().get_or_insert(err);
                        Ordering::Equal
                    }
                },
            };
            if ordering != Ordering::Equal {
                return ordering;
            }
        }
        Ordering::Equal
    });

    if let Some(err) = failure.into_inner() {
        return Err(err);
    }
    Ok(rows.into_iter().map(|(_, item)| item).collect())
}

fn int_ordering(value: &Value) -> Ordering {
    match value {
        Value::Int(i) => i.cmp(&0),
        Value::Float(f) => f.partial_cmp(&0.0).unwrap_or(Ordering::Equal),
        _ => Ordering::Equal,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ints(values: &[i64]) -> Vec<Value> {
        values.iter().map(|i| Value::Int(*i)).collect()
    }

    #[test]
    fn test_single_level_sort() {
        let spec = SortSpec::ascending(Callback::selector(|v, _| v.clone()), None);
        let sorted = sort_items(&ints(&[3, 1, 2]), &[spec]).unwrap();
        assert_eq!(sorted, ints(&[1, 2, 3]));
    }

    #[test]
    fn test_descending_swaps_arguments() {
        let spec = SortSpec::descending(Callback::selector(|v, _| v.clone()), None);
        let sorted = sort_items(&ints(&[1, 3, 2]), &[spec]).unwrap();
        assert_eq!(sorted, ints(&[3, 2, 1]));
    }

    #[test]
    fn test_stability_on_equal_keys() {
        let spec = SortSpec::ascending(Callback::selector(|_, _| Value::Int(0)), None);
        let sorted = sort_items(&ints(&[5, 4, 6]), &[spec]).unwrap();
        assert_eq!(sorted, ints(&[5, 4, 6]));
    }

    #[test]
    fn test_custom_comparer_failure_propagates() {
        let spec = SortSpec::ascending(
            Callback::selector(|v, _| v.clone()),
            Some(Callback::from_fn(|_| {
                Err(StepseqError::step_failure("comparer exploded"))
            })),
        );
        assert!(sort_items(&ints(&[2, 1]), &[spec]).is_err());
    }
}
