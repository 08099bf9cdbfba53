//! Identity resolution of newly proposed features.
//!
//! A candidate duplicates a registered feature of the same kind when both carry the
//! same assemblage and the candidate's zero-mode set equals the stored one, or one
//! of its polymorph-substituted variants. Resolution never mutates the section:
//! it hands back a copy of the candidate whose zero-mode set has been normalized to
//! the stored representation, together with the identifier to register it under.

use crate::core::feature::{Feature, FeatureId};
use crate::core::invariant_point::InvariantPoint;
use crate::core::polymorph::pairs_within;
use crate::core::section::{Section, SectionError};
use crate::core::univariant_line::UnivariantLine;
use std::collections::BTreeMap;

/// Outcome of resolving a candidate.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Identity {
    /// Not registered yet; the identifier is the next free one.
    New(FeatureId),
    /// Duplicates the registered feature with this identifier.
    Existing(FeatureId),
}

impl Identity {
    /// The candidate is not registered yet.
    #[must_use]
    pub const fn is_new(self) -> bool {
        matches!(self, Self::New(_))
    }

    /// Identifier to register the candidate under.
    #[must_use]
    pub const fn id(self) -> FeatureId {
        match self {
            Self::New(id) | Self::Existing(id) => id,
        }
    }
}

/// A candidate paired with its resolved identity.
#[derive(Clone, Debug, PartialEq)]
pub struct Resolved<F> {
    /// Resolved identity.
    pub identity: Identity,
    /// The candidate, with its identifier assigned and its zero-mode set
    /// normalized to the registered representation.
    pub feature: F,
}

/// Next free identifier of a feature map, `None` when the largest one is
/// `u32::MAX`.
fn next_id<F>(registered: &BTreeMap<FeatureId, F>) -> Option<FeatureId> {
    registered
        .last_key_value()
        .map_or(Some(FeatureId::FIRST), |(id, _)| id.next())
}

/// Resolves `candidate` against `registered`.
///
/// Exposed for feature maps kept outside a [`Section`]; most callers use
/// [`Section::resolve_invariant_point`] and [`Section::resolve_univariant_line`].
///
/// # Errors
///
/// Returns [`SectionError::IdentifiersExhausted`] if the candidate is new and
/// no identifier follows the largest registered one.
pub fn resolve<F: Feature>(
    candidate: &F,
    registered: &BTreeMap<FeatureId, F>,
) -> Result<Resolved<F>, SectionError> {
    let phases = candidate.phases();
    let out = candidate.out();
    let found = registered
        .iter()
        .filter(|(_, stored)| stored.phases() == phases)
        .find(|(_, stored)| {
            stored.out() == out
                || pairs_within(phases).any(|pair| pair.substitute(stored.out()).as_ref() == Some(out))
        });

    let mut feature = candidate.clone();
    let identity = match found {
        Some((id, stored)) => {
            if stored.out() != out {
                tracing::debug!(
                    "{} {id}: zero modes {out} normalized to polymorph equivalent {}",
                    F::KIND,
                    stored.out()
                );
                feature.set_out(stored.out().clone());
            }
            Identity::Existing(*id)
        }
        None => Identity::New(
            next_id(registered).ok_or(SectionError::IdentifiersExhausted { kind: F::KIND })?,
        ),
    };
    feature.set_id(identity.id());
    Ok(Resolved { identity, feature })
}

impl Section {
    /// Next identifier handed to a new invariant point.
    #[must_use]
    pub fn next_invariant_point_id(&self) -> Option<FeatureId> {
        next_id(&self.invpoints)
    }

    /// Next identifier handed to a new univariant line.
    #[must_use]
    pub fn next_univariant_line_id(&self) -> Option<FeatureId> {
        next_id(&self.unilines)
    }

    /// Resolves a candidate invariant point without registering it.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use pseudosection::assemblage;
    /// use pseudosection::core::identity::Identity;
    /// use pseudosection::core::invariant_point::InvariantPointBuilder;
    /// use pseudosection::core::section::{Section, SectionKind};
    ///
    /// let section = Section::new(SectionKind::Pt);
    /// let ip = InvariantPointBuilder::default()
    ///     .phases(assemblage!["g", "bi", "mu"])
    ///     .out(assemblage!["g", "mu"])
    ///     .at(560.0, 5.2)
    ///     .build()
    ///     .unwrap();
    /// let resolved = section.resolve_invariant_point(&ip).unwrap();
    /// assert!(resolved.identity.is_new());
    /// assert_eq!(resolved.identity.id().get(), 1);
    /// ```
    ///
    /// # Errors
    ///
    /// Returns [`SectionError::IdentifiersExhausted`] for a new point when no
    /// identifier is left.
    pub fn resolve_invariant_point(
        &self,
        candidate: &InvariantPoint,
    ) -> Result<Resolved<InvariantPoint>, SectionError> {
        resolve(candidate, &self.invpoints)
    }

    /// Resolves a candidate univariant line without registering it.
    ///
    /// # Errors
    ///
    /// Returns [`SectionError::IdentifiersExhausted`] for a new line when no
    /// identifier is left.
    pub fn resolve_univariant_line(
        &self,
        candidate: &UnivariantLine,
    ) -> Result<Resolved<UnivariantLine>, SectionError> {
        resolve(candidate, &self.unilines)
    }

    /// Resolves and, when new, stores an invariant point.
    ///
    /// A duplicate leaves the registered point untouched.
    ///
    /// # Errors
    ///
    /// Returns [`SectionError::Feature`] if the candidate is malformed and
    /// [`SectionError::IdentifiersExhausted`] if a new point finds no free
    /// identifier.
    pub fn register_invariant_point(
        &mut self,
        candidate: InvariantPoint,
    ) -> Result<Identity, SectionError> {
        candidate.validate()?;
        let Resolved { identity, feature } = self.resolve_invariant_point(&candidate)?;
        if identity.is_new() {
            self.insert_invariant_point(identity.id(), feature)?;
        }
        Ok(identity)
    }

    /// Resolves and, when new, stores and trims a univariant line.
    ///
    /// # Errors
    ///
    /// Returns [`SectionError::Feature`] if the candidate is malformed and
    /// [`SectionError::DanglingBound`] if it is bounded by an unregistered
    /// invariant point, or [`SectionError::IdentifiersExhausted`] if a new
    /// line finds no free identifier.
    pub fn register_univariant_line(
        &mut self,
        candidate: UnivariantLine,
    ) -> Result<Identity, SectionError> {
        candidate.validate()?;
        let Resolved { identity, feature } = self.resolve_univariant_line(&candidate)?;
        if identity.is_new() {
            self.insert_univariant_line(identity.id(), feature)?;
        }
        Ok(identity)
    }
}
