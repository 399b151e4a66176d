//! Structural byte-size estimation for cached values.
//!
//! The cache charges each stored value an estimated in-memory cost so a byte
//! budget can be enforced. Estimation is structural and recursive:
//! collections are summed over their elements, maps over keys and values,
//! and scalars are charged a fixed cost per kind.
//!
//! ## Cost Table
//!
//! | Kind                                  | Bytes                         |
//! |---------------------------------------|-------------------------------|
//! | `()`, `None`, JSON `null`             | 2                             |
//! | `str` / `String` of `len` bytes       | `2 + 4 * ceil(len / 4)`       |
//! | `bool`                                | 4                             |
//! | `char`                                | 4                             |
//! | native numerics                       | their width (`u8` = 1 … `u128` = 16) |
//! | JSON numbers, `Duration`              | 8                             |
//! | `SystemTime`                          | 26 (cost of its ISO-8601 text)|
//! | sequences, sets                       | sum of elements               |
//! | maps                                  | sum of keys and values        |
//! | `Rc` / `Arc`                          | pointee, once per allocation  |
//!
//! Shared pointers are tracked in a [`SizeVisitor`] so an allocation reached
//! twice is charged once and reference cycles terminate.
//!
//! ## Example Usage
//!
//! ```
//! use std::collections::BTreeMap;
//!
//! use hotset::size::estimate_size;
//!
//! let mut object = BTreeMap::new();
//! object.insert("a".to_string(), 1i64);
//!
//! assert_eq!(estimate_size(&object), 14);
//! assert_eq!(estimate_size(&123123f64), 8);
//! assert_eq!(estimate_size("1"), 6);
//! assert_eq!(estimate_size(&vec![1i64, 2, 3]), 24);
//! ```

use std::cell::RefCell;
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet, VecDeque};
use std::mem;
use std::rc::Rc;
use std::sync::Arc;
use std::time::{Duration, SystemTime};

use rustc_hash::FxHashSet;

/// Per-kind byte costs.
pub mod cost {
    /// Unit, `None` and JSON `null`.
    pub const UNDEFINED: usize = 2;
    /// Fixed header charged to every string.
    pub const STRING: usize = 2;
    /// Booleans.
    pub const BOOLEAN: usize = 4;
    /// JSON numbers and durations.
    pub const NUMBER: usize = 8;
    /// Timestamps, charged as their 24-character ISO-8601 rendering.
    pub const TIMESTAMP: usize = super::string_size(24);
}

/// Bytes charged for a string of `len` code units: a fixed header plus the
/// length rounded up to a 4-byte boundary.
#[inline]
pub const fn string_size(len: usize) -> usize {
    cost::STRING + 4 * len.div_ceil(4)
}

/// [`string_size`] of `text` measured in UTF-16 code units, so non-ASCII
/// text costs the same as its UTF-16 form rather than its UTF-8 bytes.
#[inline]
pub fn text_size(text: &str) -> usize {
    string_size(text.encode_utf16().count())
}

/// Tracks shared allocations already charged during one estimation.
#[derive(Debug, Default)]
pub struct SizeVisitor {
    seen: FxHashSet<usize>,
}

impl SizeVisitor {
    /// Creates a visitor with nothing seen yet.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `ptr` and returns `true` the first time it is seen.
    pub fn first_visit<T: ?Sized>(&mut self, ptr: *const T) -> bool {
        self.seen.insert(ptr.cast::<()>() as usize)
    }
}

/// Values whose in-memory cost can be estimated.
pub trait EstimateSize {
    /// Estimated bytes, skipping shared allocations `visitor` already charged.
    fn estimate_size_with(&self, visitor: &mut SizeVisitor) -> usize;
}

/// Estimates the byte cost of `value` with a fresh visitor.
pub fn estimate_size<T: EstimateSize + ?Sized>(value: &T) -> usize {
    value.estimate_size_with(&mut SizeVisitor::new())
}

/// Renders a byte count with binary units, e.g. `"12 KB"`.
///
/// ```
/// use hotset::size::human_bytes;
///
/// assert_eq!(human_bytes(0), "0 Byte");
/// assert_eq!(human_bytes(512), "512 Bytes");
/// assert_eq!(human_bytes(1536), "2 KB");
/// assert_eq!(human_bytes(5 * 1024 * 1024), "5 MB");
/// ```
pub fn human_bytes(bytes: usize) -> String {
    const UNITS: [&str; 5] = ["Bytes", "KB", "MB", "GB", "TB"];
    if bytes == 0 {
        return "0 Byte".to_string();
    }
    let bytes = bytes as f64;
    let exp = ((bytes.ln() / 1024f64.ln()).floor() as usize).min(UNITS.len() - 1);
    let scaled = (bytes / 1024f64.powi(exp as i32)).round();
    format!("{scaled} {}", UNITS[exp])
}

// ---------------------------------------------------------------------------
// Scalars
// ---------------------------------------------------------------------------

macro_rules! native_width {
    ($($ty:ty),* $(,)?) => {
        $(
            impl EstimateSize for $ty {
                #[inline]
                fn estimate_size_with(&self, _: &mut SizeVisitor) -> usize {
                    mem::size_of::<$ty>()
                }
            }
        )*
    };
}

native_width!(
    u8, u16, u32, u64, u128, usize, i8, i16, i32, i64, i128, isize, f32, f64
);

impl EstimateSize for bool {
    #[inline]
    fn estimate_size_with(&self, _: &mut SizeVisitor) -> usize {
        cost::BOOLEAN
    }
}

impl EstimateSize for char {
    #[inline]
    fn estimate_size_with(&self, _: &mut SizeVisitor) -> usize {
        mem::size_of::<char>()
    }
}

impl EstimateSize for () {
    #[inline]
    fn estimate_size_with(&self, _: &mut SizeVisitor) -> usize {
        cost::UNDEFINED
    }
}

impl EstimateSize for str {
    #[inline]
    fn estimate_size_with(&self, _: &mut SizeVisitor) -> usize {
        text_size(self)
    }
}

impl EstimateSize for String {
    #[inline]
    fn estimate_size_with(&self, visitor: &mut SizeVisitor) -> usize {
        self.as_str().estimate_size_with(visitor)
    }
}

impl EstimateSize for Duration {
    #[inline]
    fn estimate_size_with(&self, _: &mut SizeVisitor) -> usize {
        cost::NUMBER
    }
}

impl EstimateSize for SystemTime {
    #[inline]
    fn estimate_size_with(&self, _: &mut SizeVisitor) -> usize {
        cost::TIMESTAMP
    }
}

// ---------------------------------------------------------------------------
// Wrappers
// ---------------------------------------------------------------------------

impl<T: EstimateSize> EstimateSize for Option<T> {
    fn estimate_size_with(&self, visitor: &mut SizeVisitor) -> usize {
        match self {
            Some(value) => value.estimate_size_with(visitor),
            None => cost::UNDEFINED,
        }
    }
}

impl<T: EstimateSize + ?Sized> EstimateSize for &T {
    #[inline]
    fn estimate_size_with(&self, visitor: &mut SizeVisitor) -> usize {
        (**self).estimate_size_with(visitor)
    }
}

impl<T: EstimateSize + ?Sized> EstimateSize for Box<T> {
    #[inline]
    fn estimate_size_with(&self, visitor: &mut SizeVisitor) -> usize {
        (**self).estimate_size_with(visitor)
    }
}

impl<T: EstimateSize + ?Sized> EstimateSize for Rc<T> {
    fn estimate_size_with(&self, visitor: &mut SizeVisitor) -> usize {
        if visitor.first_visit(Rc::as_ptr(self)) {
            (**self).estimate_size_with(visitor)
        } else {
            0
        }
    }
}

impl<T: EstimateSize + ?Sized> EstimateSize for Arc<T> {
    fn estimate_size_with(&self, visitor: &mut SizeVisitor) -> usize {
        if visitor.first_visit(Arc::as_ptr(self)) {
            (**self).estimate_size_with(visitor)
        } else {
            0
        }
    }
}

impl<T: EstimateSize + ?Sized> EstimateSize for RefCell<T> {
    /// Charges 0 while the cell is mutably borrowed.
    fn estimate_size_with(&self, visitor: &mut SizeVisitor) -> usize {
        self.try_borrow()
            .map_or(0, |value| value.estimate_size_with(visitor))
    }
}

// ---------------------------------------------------------------------------
// Collections
// ---------------------------------------------------------------------------

fn sum_items<'a, T, I>(items: I, visitor: &mut SizeVisitor) -> usize
where
    T: EstimateSize + 'a,
    I: IntoIterator<Item = &'a T>,
{
    items
        .into_iter()
        .map(|item| item.estimate_size_with(visitor))
        .sum()
}

fn sum_pairs<'a, K, V, I>(pairs: I, visitor: &mut SizeVisitor) -> usize
where
    K: EstimateSize + 'a,
    V: EstimateSize + 'a,
    I: IntoIterator<Item = (&'a K, &'a V)>,
{
    pairs
        .into_iter()
        .map(|(key, value)| key.estimate_size_with(visitor) + value.estimate_size_with(visitor))
        .sum()
}

impl<T: EstimateSize> EstimateSize for [T] {
    fn estimate_size_with(&self, visitor: &mut SizeVisitor) -> usize {
        sum_items(self, visitor)
    }
}

impl<T: EstimateSize, const N: usize> EstimateSize for [T; N] {
    fn estimate_size_with(&self, visitor: &mut SizeVisitor) -> usize {
        sum_items(self, visitor)
    }
}

impl<T: EstimateSize> EstimateSize for Vec<T> {
    fn estimate_size_with(&self, visitor: &mut SizeVisitor) -> usize {
        sum_items(self, visitor)
    }
}

impl<T: EstimateSize> EstimateSize for VecDeque<T> {
    fn estimate_size_with(&self, visitor: &mut SizeVisitor) -> usize {
        sum_items(self, visitor)
    }
}

impl<T: EstimateSize> EstimateSize for BTreeSet<T> {
    fn estimate_size_with(&self, visitor: &mut SizeVisitor) -> usize {
        sum_items(self, visitor)
    }
}

impl<T: EstimateSize, S> EstimateSize for HashSet<T, S> {
    fn estimate_size_with(&self, visitor: &mut SizeVisitor) -> usize {
        sum_items(self, visitor)
    }
}

impl<K: EstimateSize, V: EstimateSize> EstimateSize for BTreeMap<K, V> {
    fn estimate_size_with(&self, visitor: &mut SizeVisitor) -> usize {
        sum_pairs(self, visitor)
    }
}

impl<K: EstimateSize, V: EstimateSize, S> EstimateSize for HashMap<K, V, S> {
    fn estimate_size_with(&self, visitor: &mut SizeVisitor) -> usize {
        sum_pairs(self, visitor)
    }
}

macro_rules! tuple_sum {
    ($($name:ident),+) => {
        impl<$($name: EstimateSize),+> EstimateSize for ($($name,)+) {
            #[allow(non_snake_case)]
            fn estimate_size_with(&self, visitor: &mut SizeVisitor) -> usize {
                let ($($name,)+) = self;
                0 $(+ $name.estimate_size_with(visitor))+
            }
        }
    };
}

tuple_sum!(A);
tuple_sum!(A, B);
tuple_sum!(A, B, C);
tuple_sum!(A, B, C, D);
tuple_sum!(A, B, C, D, E);

// ---------------------------------------------------------------------------
// JSON
// ---------------------------------------------------------------------------

#[cfg(feature = "json")]
impl EstimateSize for serde_json::Value {
    fn estimate_size_with(&self, visitor: &mut SizeVisitor) -> usize {
        use serde_json::Value;

        match self {
            Value::Null => cost::UNDEFINED,
            Value::Bool(_) => cost::BOOLEAN,
            Value::Number(_) => cost::NUMBER,
            Value::String(text) => text_size(text),
            Value::Array(items) => sum_items(items, visitor),
            Value::Object(map) => map
                .iter()
                .map(|(key, value)| text_size(key) + value.estimate_size_with(visitor))
                .sum(),
        }
    }
}
