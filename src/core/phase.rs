//! Phase names and phase assemblages.
//!
//! A [`Phase`] is an opaque mineral/melt/fluid name as it appears in the
//! thermodynamic dataset (`"sill"`, `"q"`, `"liq"`, ...). An [`Assemblage`] is an
//! unordered set of phases without duplicates. Assemblages are used both for the
//! full phase content of a feature and for its zero-mode subset.
//!
//! Assemblages are backed by an ordered set, so equal assemblages always hash,
//! compare and print identically regardless of construction order. This makes
//! them usable directly as field-map keys.

use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::collections::BTreeSet;
use std::fmt;

/// Builds an [`Assemblage`] from phase names.
///
/// # Examples
///
/// ```rust
/// use pseudosection::assemblage;
///
/// let a = assemblage!["q", "mu", "bi"];
/// let b = assemblage!["bi", "q", "mu", "q"];
/// assert_eq!(a, b);
/// assert_eq!(a.len(), 3);
///
/// let empty = assemblage![];
/// assert!(empty.is_empty());
/// ```
#[macro_export]
macro_rules! assemblage {
    () => {
        $crate::core::phase::Assemblage::new()
    };
    ($($phase:expr),+ $(,)?) => {
        [$($phase),+]
            .into_iter()
            .collect::<$crate::core::phase::Assemblage>()
    };
}

/// Name of a single phase.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Phase(String);

impl Phase {
    /// Creates a phase from its name.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Returns the phase name.
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for Phase {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Phase {
    fn from(name: &str) -> Self {
        Self(name.to_owned())
    }
}

impl From<String> for Phase {
    fn from(name: String) -> Self {
        Self(name)
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A set of phases.
///
/// All set operations return new assemblages; an assemblage is never mutated
/// through a shared reference.
#[derive(Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Assemblage(BTreeSet<Phase>);

impl Assemblage {
    /// Creates an empty assemblage.
    #[must_use]
    pub const fn new() -> Self {
        Self(BTreeSet::new())
    }

    /// Number of phases.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if the assemblage has no phases.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns `true` if the phase with the given name is present.
    #[inline]
    #[must_use]
    pub fn contains(&self, phase: &str) -> bool {
        self.0.contains(phase)
    }

    /// Adds a phase, returning `true` if it was not present before.
    pub fn insert(&mut self, phase: impl Into<Phase>) -> bool {
        self.0.insert(phase.into())
    }

    /// Iterates phases in name order.
    pub fn iter(&self) -> impl Iterator<Item = &Phase> + '_ {
        self.0.iter()
    }

    /// Returns `true` if every phase of `self` is in `other`.
    #[must_use]
    pub fn is_subset(&self, other: &Self) -> bool {
        self.0.is_subset(&other.0)
    }

    /// Returns `true` if `self` and `other` share no phase.
    #[must_use]
    pub fn is_disjoint(&self, other: &Self) -> bool {
        self.0.is_disjoint(&other.0)
    }

    /// Phases in either assemblage.
    #[must_use]
    pub fn union(&self, other: &Self) -> Self {
        Self(self.0.union(&other.0).cloned().collect())
    }

    /// Phases in both assemblages.
    #[must_use]
    pub fn intersection(&self, other: &Self) -> Self {
        Self(self.0.intersection(&other.0).cloned().collect())
    }

    /// Phases of `self` that are not in `other`.
    #[must_use]
    pub fn difference(&self, other: &Self) -> Self {
        Self(self.0.difference(&other.0).cloned().collect())
    }

    /// Phases in exactly one of the two assemblages.
    #[must_use]
    pub fn symmetric_difference(&self, other: &Self) -> Self {
        Self(self.0.symmetric_difference(&other.0).cloned().collect())
    }

    /// Intersection of all assemblages in the iterator.
    ///
    /// Returns `None` for an empty iterator, since there is no neutral element to
    /// return.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use pseudosection::assemblage;
    /// use pseudosection::core::phase::Assemblage;
    ///
    /// let a = assemblage!["q", "mu", "bi", "g"];
    /// let b = assemblage!["q", "mu", "bi"];
    /// let c = assemblage!["q", "bi", "chl"];
    /// assert_eq!(
    ///     Assemblage::intersect_all([&a, &b, &c]),
    ///     Some(assemblage!["q", "bi"])
    /// );
    /// assert_eq!(Assemblage::intersect_all(std::iter::empty()), None);
    /// ```
    #[must_use]
    pub fn intersect_all<'a, I>(assemblages: I) -> Option<Self>
    where
        I: IntoIterator<Item = &'a Self>,
    {
        let mut iter = assemblages.into_iter();
        let first = iter.next()?.clone();
        Some(iter.fold(first, |acc, next| acc.intersection(next)))
    }

    /// Space separated phase names in name order, skipping `excess` phases.
    #[must_use]
    pub fn joined(&self, excess: &Self) -> String {
        self.0
            .iter()
            .filter(|phase| !excess.0.contains(*phase))
            .map(Phase::as_str)
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl<P> FromIterator<P> for Assemblage
where
    P: Into<Phase>,
{
    fn from_iter<I: IntoIterator<Item = P>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

impl<'a> IntoIterator for &'a Assemblage {
    type Item = &'a Phase;
    type IntoIter = std::collections::btree_set::Iter<'a, Phase>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl fmt::Display for Assemblage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{{}}}", self.joined(&Self::new()))
    }
}
