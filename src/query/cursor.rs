//! Cursor strategies backing a sequence.
//!
//! One concrete sequence type is parameterized by this enum instead of an
//! inheritance chain: array-backed cursors key items by index, object-backed
//! cursors key them by property name. Grouped and ordered sequences reuse
//! the array-backed strategy with extra state held on the sequence itself.

use crate::value::Value;

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Cursor {
    Items {
        items: Vec<Value>,
        pos: isize,
        valid: bool,
    },
    Entries {
        entries: Vec<(String, Value)>,
        pos: isize,
        valid: bool,
    },
}

impl Cursor {
    pub fn items(items: Vec<Value>) -> Self {
        Cursor::Items {
            items,
            pos: -1,
            valid: false,
        }
    }

    pub fn entries(entries: Vec<(String, Value)>) -> Self {
        Cursor::Entries {
            entries,
            pos: -1,
            valid: false,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Cursor::Items { items, .. } => items.len(),
            Cursor::Entries { entries, .. } => entries.len(),
        }
    }

    pub fn position(&self) -> isize {
        match self {
            Cursor::Items { pos, .. } | Cursor::Entries { pos, .. } => *pos,
        }
    }

    pub fn is_valid(&self) -> bool {
        match self {
            Cursor::Items { valid, .. } | Cursor::Entries { valid, .. } => *valid,
        }
    }

    /// Advance by exactly one element. When already past the end this
    /// returns false repeatedly and leaves the position (and therefore the
    /// current element) untouched.
    pub fn move_next(&mut self) -> bool {
        let len = self.len() as isize;
        match self {
            Cursor::Items { pos, valid, .. } | Cursor::Entries { pos, valid, .. } => {
                if *pos + 1 < len {
                    *pos += 1;
                    *valid = true;
                    true
                } else {
                    *valid = false;
                    false
                }
            }
        }
    }

    /// Rewind to before the first element
    pub fn reset(&mut self) {
        match self {
            Cursor::Items { pos, valid, .. } | Cursor::Entries { pos, valid, .. } => {
                *pos = -1;
                *valid = false;
            }
        }
    }

    /// The raw (pre-projection) element under the cursor
    pub fn raw_current(&self) -> Option<&Value> {
        match self {
            Cursor::Items { items, pos, .. } => {
                if *pos >= 0 {
                    items.get(*pos as usize)
                } else {
                    None
                }
            }
            Cursor::Entries { entries, pos, .. } => {
                if *pos >= 0 {
                    entries.get(*pos as usize).map(|(_, v)| v)
                } else {
                    None
                }
            }
        }
    }

    /// The element's key: index for array-backed cursors, property name for
    /// object-backed ones. `undefined` before the first advance.
    pub fn item_key(&self) -> Value {
        match self {
            Cursor::Items { pos, .. } => {
                if *pos >= 0 {
                    Value::Int(*pos as i64)
                } else {
                    Value::Undefined
                }
            }
            Cursor::Entries { entries, pos, .. } => {
                if *pos >= 0 {
                    entries
                        .get(*pos as usize)
                        .map(|(k, _)| Value::Str(k.clone()))
                        .unwrap_or(Value::Undefined)
                } else {
                    Value::Undefined
                }
            }
        }
    }
}
