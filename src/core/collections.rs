//! Collection aliases used across the crate.
//!
//! Feature maps keyed by identifier are ordered `BTreeMap`s so that every pass
//! over a section (and every diagnostic it produces) is deterministic. Scratch
//! structures of the geometric passes, where order does not matter, use the fast
//! non-cryptographic hasher from `rustc-hash` and inline small buffers.

pub(crate) mod spatial_hash_grid;

use rustc_hash::{FxBuildHasher, FxHashMap};
use smallvec::SmallVec;

/// Hash map with the `FxHasher`.
///
/// Not DoS-resistant; only used with keys derived from section geometry.
///
/// # Examples
///
/// ```rust
/// use pseudosection::core::collections::FastHashMap;
///
/// let mut map: FastHashMap<(usize, usize), usize> = FastHashMap::default();
/// map.insert((0, 1), 2);
/// assert_eq!(map.get(&(0, 1)), Some(&2));
/// ```
pub type FastHashMap<K, V> = FxHashMap<K, V>;

/// Build hasher of [`FastHashMap`].
pub type FastBuildHasher = FxBuildHasher;

/// Vec storing up to `N` elements inline before spilling to the heap.
///
/// # Examples
///
/// ```rust
/// use pseudosection::core::collections::SmallBuffer;
///
/// let mut sources: SmallBuffer<u32, 2> = SmallBuffer::new();
/// sources.push(1);
/// sources.push(2);
/// assert!(!sources.spilled());
/// ```
pub type SmallBuffer<T, const N: usize> = SmallVec<[T; N]>;

/// Creates a [`FastHashMap`] with pre-allocated capacity.
#[inline]
#[must_use]
pub fn fast_hash_map_with_capacity<K, V>(capacity: usize) -> FastHashMap<K, V> {
    FastHashMap::with_capacity_and_hasher(capacity, FastBuildHasher::default())
}
