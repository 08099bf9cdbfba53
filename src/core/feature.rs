//! Shared pieces of the feature model.
//!
//! Invariant points and univariant lines share identifiers, the phase/zero-mode
//! pair, passthrough calculation payload and construction-time validation. The
//! [`Feature`] trait is the seam used by identity resolution so the same code
//! handles both feature kinds in separate identifier spaces.

use crate::core::phase::Assemblage;
use derive_builder::UninitializedFieldError;
use geo::Coord;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::num::NonZeroU32;

// =============================================================================
// IDENTIFIERS
// =============================================================================

/// Identifier of a registered feature, unique within its kind in a section.
///
/// Identifier `0` is the "no bounding point" sentinel of the external data
/// contract and is unrepresentable here: use [`FeatureId::from_raw`] to map raw
/// integers, which yields `None` for `0`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FeatureId(NonZeroU32);

impl FeatureId {
    /// The first identifier handed out in an empty section.
    pub const FIRST: Self = Self(NonZeroU32::MIN);

    /// Maps a raw identifier, treating `0` as "unbounded".
    ///
    /// # Examples
    ///
    /// ```rust
    /// use pseudosection::core::feature::FeatureId;
    ///
    /// assert!(FeatureId::from_raw(0).is_none());
    /// assert_eq!(FeatureId::from_raw(3).map(FeatureId::get), Some(3));
    /// ```
    #[must_use]
    pub const fn from_raw(raw: u32) -> Option<Self> {
        match NonZeroU32::new(raw) {
            Some(id) => Some(Self(id)),
            None => None,
        }
    }

    /// Raw integer value, never `0`.
    #[inline]
    #[must_use]
    pub const fn get(self) -> u32 {
        self.0.get()
    }

    /// The following identifier, `None` once the identifier space is
    /// exhausted.
    #[must_use]
    pub const fn next(self) -> Option<Self> {
        match self.0.checked_add(1) {
            Some(id) => Some(Self(id)),
            None => None,
        }
    }
}

impl fmt::Display for FeatureId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Serde adapter storing an optional bound as a raw integer, `0` meaning open.
pub(crate) mod raw_bound {
    use super::FeatureId;
    use serde::{Deserialize, Deserializer, Serializer};

    #[allow(clippy::ref_option)]
    pub fn serialize<S: Serializer>(bound: &Option<FeatureId>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u32(bound.map_or(0, FeatureId::get))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<FeatureId>, D::Error> {
        Ok(Option::<u32>::deserialize(deserializer)?.and_then(FeatureId::from_raw))
    }
}

/// Space separated identifiers, as used in diagnostics.
pub(crate) fn join_ids<'a, I>(ids: I) -> String
where
    I: IntoIterator<Item = &'a FeatureId>,
{
    ids.into_iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(" ")
}

// =============================================================================
// CALCULATION PAYLOAD
// =============================================================================

/// Per-sample result of the external calculation.
///
/// Carried for re-display and re-calculation only; topology never inspects it.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct CalcResult {
    /// Phase name to variable name to value.
    pub data: BTreeMap<String, BTreeMap<String, f64>>,
    /// Starting-guess lines that reproduce this sample.
    pub ptguess: Vec<String>,
}

impl CalcResult {
    /// Phase names present in the result, or the variable names of `phase`.
    ///
    /// `None` when `phase` is not present.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use pseudosection::core::feature::CalcResult;
    /// use std::collections::BTreeMap;
    ///
    /// let mut result = CalcResult::default();
    /// result
    ///     .data
    ///     .insert("g".to_owned(), BTreeMap::from([("mode".to_owned(), 0.0)]));
    /// assert_eq!(result.datakeys(None), Some(vec!["g"]));
    /// assert_eq!(result.datakeys(Some("g")), Some(vec!["mode"]));
    /// assert_eq!(result.datakeys(Some("bi")), None);
    /// ```
    #[must_use]
    pub fn datakeys(&self, phase: Option<&str>) -> Option<Vec<&str>> {
        match phase {
            None => Some(self.data.keys().map(String::as_str).collect()),
            Some(phase) => self
                .data
                .get(phase)
                .map(|vars| vars.keys().map(String::as_str).collect()),
        }
    }
}

// =============================================================================
// ERRORS
// =============================================================================

/// Malformed feature specification.
///
/// Raised at construction and registration time; a feature that fails these
/// checks never enters a section.
#[derive(Clone, Debug, thiserror::Error, PartialEq, Eq)]
pub enum FeatureError {
    /// A required builder field was not set.
    #[error("Missing required feature field `{field}`")]
    MissingField {
        /// Name of the missing field.
        field: &'static str,
    },

    /// The assemblage has no phases.
    #[error("Feature assemblage is empty")]
    EmptyAssemblage,

    /// Zero-mode phases are not all present in the assemblage.
    #[error("Zero-mode phases {out} are not a subset of assemblage {phases}")]
    ZeroModeNotSubset {
        /// The feature assemblage.
        phases: Assemblage,
        /// The offending zero-mode set.
        out: Assemblage,
    },

    /// Wrong number of zero-mode phases for the feature kind.
    #[error("{kind} requires {expected} zero-mode phase(s), got {actual}")]
    ZeroModeArity {
        /// Feature kind name.
        kind: &'static str,
        /// Required zero-mode set size.
        expected: usize,
        /// Actual zero-mode set size.
        actual: usize,
    },

    /// An invariant point without any coordinate.
    #[error("Invariant point has no coordinates")]
    MissingCoordinates,

    /// A sample coordinate is NaN or infinite.
    #[error("Sample {index} has non-finite coordinates ({x}, {y})")]
    NonFiniteSample {
        /// Index of the sample.
        index: usize,
        /// Sample x.
        x: String,
        /// Sample y.
        y: String,
    },

    /// The used range does not fit the sample sequence.
    #[error("Used range {start}..{stop} does not fit {len} samples")]
    UsedRangeOutOfBounds {
        /// Range start.
        start: usize,
        /// Range stop.
        stop: usize,
        /// Number of samples.
        len: usize,
    },

    /// Calculation results do not line up with samples.
    #[error("Calculated feature has {samples} samples but {results} results")]
    ResultCountMismatch {
        /// Number of samples.
        samples: usize,
        /// Number of results.
        results: usize,
    },
}

impl From<UninitializedFieldError> for FeatureError {
    fn from(err: UninitializedFieldError) -> Self {
        Self::MissingField {
            field: err.field_name(),
        }
    }
}

/// Shared checks for both feature kinds.
pub(crate) fn validate_common(
    kind: &'static str,
    phases: &Assemblage,
    out: &Assemblage,
    out_arity: usize,
    samples: &[Coord<f64>],
    results: &[CalcResult],
    manual: bool,
) -> Result<(), FeatureError> {
    if phases.is_empty() {
        return Err(FeatureError::EmptyAssemblage);
    }
    if !out.is_subset(phases) {
        return Err(FeatureError::ZeroModeNotSubset {
            phases: phases.clone(),
            out: out.clone(),
        });
    }
    if out.len() != out_arity {
        return Err(FeatureError::ZeroModeArity {
            kind,
            expected: out_arity,
            actual: out.len(),
        });
    }
    if let Some((index, c)) = samples
        .iter()
        .enumerate()
        .find(|(_, c)| !c.x.is_finite() || !c.y.is_finite())
    {
        return Err(FeatureError::NonFiniteSample {
            index,
            x: c.x.to_string(),
            y: c.y.to_string(),
        });
    }
    if !manual && !results.is_empty() && results.len() != samples.len() {
        return Err(FeatureError::ResultCountMismatch {
            samples: samples.len(),
            results: results.len(),
        });
    }
    Ok(())
}

// =============================================================================
// FEATURE TRAIT
// =============================================================================

/// Common view of invariant points and univariant lines.
pub trait Feature: Clone {
    /// Human readable kind name.
    const KIND: &'static str;

    /// Identifier, once registered.
    fn id(&self) -> Option<FeatureId>;

    /// Assigns the identifier.
    fn set_id(&mut self, id: FeatureId);

    /// Phase assemblage.
    fn phases(&self) -> &Assemblage;

    /// Zero-mode phases.
    fn out(&self) -> &Assemblage;

    /// Replaces the zero-mode phases (identity normalization only).
    fn set_out(&mut self, out: Assemblage);

    /// User-defined rather than calculated.
    fn is_manual(&self) -> bool;

    /// Re-runs construction-time validation.
    ///
    /// # Errors
    ///
    /// Returns [`FeatureError`] if the feature is malformed.
    fn validate(&self) -> Result<(), FeatureError>;

    /// Full label: phases (minus `excess`) then ` - ` then zero-mode phases.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use pseudosection::assemblage;
    /// use pseudosection::core::feature::Feature;
    /// use pseudosection::core::univariant_line::UnivariantLineBuilder;
    ///
    /// let line = UnivariantLineBuilder::default()
    ///     .phases(assemblage!["g", "bi", "q", "H2O"])
    ///     .out(assemblage!["g"])
    ///     .build()
    ///     .unwrap();
    /// assert_eq!(line.label(&assemblage!["q", "H2O"]), "bi g - g");
    /// ```
    fn label(&self, excess: &Assemblage) -> String {
        format!(
            "{} - {}",
            self.phases().joined(excess),
            self.out().joined(&Assemblage::new())
        )
    }

    /// Identifier optionally followed by the zero-mode phases.
    fn annotation(&self, show_out: bool) -> String {
        let id = self.id().map_or(0, FeatureId::get);
        if show_out {
            format!("{id} {}", self.out().joined(&Assemblage::new()))
        } else {
            id.to_string()
        }
    }
}
