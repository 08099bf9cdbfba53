//! Polymorph pairs.
//!
//! Two phases of identical composition but different structure (the aluminosilicates,
//! quartz/coesite, diamond/graphite) are treated as mutually substitutable wherever
//! one of them is a zero-mode phase. The table is fixed; no runtime registration is
//! supported.

use crate::core::phase::Assemblage;

/// Fixed table of polymorph pairs.
pub const POLYMORPHS: [PolymorphPair; 5] = [
    PolymorphPair::new("sill", "and"),
    PolymorphPair::new("ky", "and"),
    PolymorphPair::new("sill", "ky"),
    PolymorphPair::new("q", "coe"),
    PolymorphPair::new("diam", "gph"),
];

/// Two mutually substitutable phase names.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct PolymorphPair {
    a: &'static str,
    b: &'static str,
}

impl PolymorphPair {
    /// Creates a pair.
    #[must_use]
    pub const fn new(a: &'static str, b: &'static str) -> Self {
        Self { a, b }
    }

    /// The two phase names.
    #[must_use]
    pub const fn phases(self) -> (&'static str, &'static str) {
        (self.a, self.b)
    }

    /// The pair as an assemblage.
    #[must_use]
    pub fn to_assemblage(self) -> Assemblage {
        [self.a, self.b].into_iter().collect()
    }

    /// Both phases of the pair are present in `assemblage`.
    #[must_use]
    pub fn is_within(self, assemblage: &Assemblage) -> bool {
        assemblage.contains(self.a) && assemblage.contains(self.b)
    }

    /// `assemblage` is exactly this pair.
    #[must_use]
    pub fn equals(self, assemblage: &Assemblage) -> bool {
        assemblage.len() == 2 && self.is_within(assemblage)
    }

    /// `assemblage` contains at least one phase of the pair.
    #[must_use]
    pub fn touches(self, assemblage: &Assemblage) -> bool {
        assemblage.contains(self.a) || assemblage.contains(self.b)
    }

    /// Replaces the pair phase in a zero-mode set by its counterpart.
    ///
    /// Returns `None` when the zero-mode set holds neither or both pair phases,
    /// since no distinct substituted variant exists in those cases.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use pseudosection::assemblage;
    /// use pseudosection::core::polymorph::PolymorphPair;
    ///
    /// let pair = PolymorphPair::new("sill", "ky");
    /// assert_eq!(pair.substitute(&assemblage!["sill"]), Some(assemblage!["ky"]));
    /// assert_eq!(pair.substitute(&assemblage!["sill", "g"]), Some(assemblage!["ky", "g"]));
    /// assert_eq!(pair.substitute(&assemblage!["g"]), None);
    /// assert_eq!(pair.substitute(&assemblage!["sill", "ky"]), None);
    /// ```
    #[must_use]
    pub fn substitute(self, out: &Assemblage) -> Option<Assemblage> {
        match (out.contains(self.a), out.contains(self.b)) {
            (true, false) | (false, true) => Some(out.symmetric_difference(&self.to_assemblage())),
            _ => None,
        }
    }
}

/// Polymorph pairs fully contained in `assemblage`, in table order.
pub fn pairs_within(assemblage: &Assemblage) -> impl Iterator<Item = PolymorphPair> + '_ {
    POLYMORPHS
        .iter()
        .copied()
        .filter(move |pair| pair.is_within(assemblage))
}

/// First polymorph pair fully contained in `assemblage`.
#[must_use]
pub fn first_pair_within(assemblage: &Assemblage) -> Option<PolymorphPair> {
    pairs_within(assemblage).next()
}

/// `assemblage` equals one of the polymorph pairs.
#[must_use]
pub fn is_polymorph_pair(assemblage: &Assemblage) -> bool {
    POLYMORPHS.iter().any(|pair| pair.equals(assemblage))
}
