//! Pseudosections: the container of registered features and the diagram domain.
//!
//! A [`Section`] owns invariant points and univariant lines keyed by identifier,
//! the rectangular domain of the diagram and the set of excess phases. Geometry is
//! always computed with the y axis scaled by [`Section::ratio`] so that Euclidean
//! distances are meaningful across axes with very different units; stored
//! coordinates are never rescaled.

use crate::core::feature::{Feature, FeatureError, FeatureId};
use crate::core::invariant_point::InvariantPoint;
use crate::core::phase::Assemblage;
use crate::core::univariant_line::UnivariantLine;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

// =============================================================================
// ERRORS
// =============================================================================

/// Errors raised by section operations.
#[derive(Clone, Debug, thiserror::Error, PartialEq)]
pub enum SectionError {
    /// The feature itself is malformed.
    #[error(transparent)]
    Feature(#[from] FeatureError),

    /// An axis range is empty, inverted or not finite.
    #[error("Invalid {axis} range ({min}, {max}); expected finite min < max")]
    InvalidRange {
        /// Axis name.
        axis: &'static str,
        /// Lower bound.
        min: f64,
        /// Upper bound.
        max: f64,
    },

    /// No invariant point with this identifier.
    #[error("Unknown invariant point {0}")]
    UnknownInvariantPoint(FeatureId),

    /// No univariant line with this identifier.
    #[error("Unknown univariant line {0}")]
    UnknownUnivariantLine(FeatureId),

    /// Every identifier of a feature kind is taken.
    #[error("No {kind} identifier left to assign")]
    IdentifiersExhausted {
        /// Feature kind name.
        kind: &'static str,
    },

    /// A line is bounded by an invariant point that is not registered.
    #[error("Univariant line {line} is bounded by unknown invariant point {point}")]
    DanglingBound {
        /// The line.
        line: FeatureId,
        /// The missing invariant point.
        point: FeatureId,
    },
}

// =============================================================================
// SECTION KIND
// =============================================================================

/// Which state variables span the diagram.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SectionKind {
    /// Temperature on x, pressure on y.
    #[default]
    Pt,
    /// Temperature on x, composition on y.
    Tx,
    /// Composition on x, pressure on y.
    Px,
}

/// Display metadata of one axis.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Axis {
    /// Short variable name.
    pub var: &'static str,
    /// Axis label.
    pub label: &'static str,
    /// Coordinate display resolution.
    pub resolution: f64,
}

const TEMPERATURE: Axis = Axis {
    var: "T",
    label: "Temperature [C]",
    resolution: 0.01,
};
const PRESSURE: Axis = Axis {
    var: "p",
    label: "Pressure [kbar]",
    resolution: 0.001,
};
const COMPOSITION: Axis = Axis {
    var: "C",
    label: "Composition",
    resolution: 0.001,
};

impl SectionKind {
    /// Horizontal axis.
    #[must_use]
    pub const fn x_axis(self) -> Axis {
        match self {
            Self::Pt | Self::Tx => TEMPERATURE,
            Self::Px => COMPOSITION,
        }
    }

    /// Vertical axis.
    #[must_use]
    pub const fn y_axis(self) -> Axis {
        match self {
            Self::Pt | Self::Px => PRESSURE,
            Self::Tx => COMPOSITION,
        }
    }

    /// Default `(xrange, yrange)`.
    #[must_use]
    pub const fn default_ranges(self) -> ((f64, f64), (f64, f64)) {
        match self {
            Self::Pt => ((200.0, 1000.0), (0.1, 20.0)),
            Self::Tx => ((200.0, 1000.0), (0.0, 1.0)),
            Self::Px => ((0.0, 1.0), (0.1, 20.0)),
        }
    }

    const fn name(self) -> &'static str {
        match self {
            Self::Pt => "PTsection",
            Self::Tx => "TXsection",
            Self::Px => "PXsection",
        }
    }
}

// =============================================================================
// SECTION
// =============================================================================

/// Registered features and the diagram domain.
///
/// # Examples
///
/// ```rust
/// use pseudosection::core::section::{Section, SectionKind};
///
/// let section = Section::new(SectionKind::Pt);
/// assert_eq!(section.xrange(), (200.0, 1000.0));
/// assert!((section.ratio() - 800.0 / 19.9).abs() < 1e-12);
///
/// let custom = Section::new(SectionKind::Tx).with_ranges((400.0, 800.0), (0.0, 1.0)).unwrap();
/// assert_eq!(custom.ratio(), 400.0);
/// assert!(Section::new(SectionKind::Tx).with_ranges((1.0, 1.0), (0.0, 1.0)).is_err());
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "SectionData", into = "SectionData")]
pub struct Section {
    kind: SectionKind,
    xrange: (f64, f64),
    yrange: (f64, f64),
    excess: Assemblage,
    pub(crate) invpoints: BTreeMap<FeatureId, InvariantPoint>,
    pub(crate) unilines: BTreeMap<FeatureId, UnivariantLine>,
}

impl Default for Section {
    fn default() -> Self {
        Self::new(SectionKind::default())
    }
}

fn check_range(axis: &'static str, (min, max): (f64, f64)) -> Result<(), SectionError> {
    if min.is_finite() && max.is_finite() && min < max {
        Ok(())
    } else {
        Err(SectionError::InvalidRange { axis, min, max })
    }
}

impl Section {
    /// Empty section with the default ranges of `kind`.
    #[must_use]
    pub fn new(kind: SectionKind) -> Self {
        let (xrange, yrange) = kind.default_ranges();
        Self {
            kind,
            xrange,
            yrange,
            excess: Assemblage::new(),
            invpoints: BTreeMap::new(),
            unilines: BTreeMap::new(),
        }
    }

    /// Replaces the domain ranges.
    ///
    /// # Errors
    ///
    /// Returns [`SectionError::InvalidRange`] for empty, inverted or non-finite
    /// ranges.
    pub fn with_ranges(mut self, xrange: (f64, f64), yrange: (f64, f64)) -> Result<Self, SectionError> {
        check_range(self.kind.x_axis().var, xrange)?;
        check_range(self.kind.y_axis().var, yrange)?;
        self.xrange = xrange;
        self.yrange = yrange;
        Ok(self)
    }

    /// Sets the phases present everywhere, omitted from labels.
    #[must_use]
    pub fn with_excess(mut self, excess: Assemblage) -> Self {
        self.excess = excess;
        self
    }

    /// Section kind.
    #[must_use]
    pub const fn kind(&self) -> SectionKind {
        self.kind
    }

    /// Horizontal domain range.
    #[must_use]
    pub const fn xrange(&self) -> (f64, f64) {
        self.xrange
    }

    /// Vertical domain range.
    #[must_use]
    pub const fn yrange(&self) -> (f64, f64) {
        self.yrange
    }

    /// Excess phases.
    #[must_use]
    pub const fn excess(&self) -> &Assemblage {
        &self.excess
    }

    /// Aspect ratio `x span / y span`; y coordinates are multiplied by it for
    /// every geometric computation.
    #[must_use]
    pub fn ratio(&self) -> f64 {
        (self.xrange.1 - self.xrange.0) / (self.yrange.1 - self.yrange.0)
    }

    // -------------------------------------------------------------------------
    // Lookup
    // -------------------------------------------------------------------------

    /// Invariant point by identifier.
    #[must_use]
    pub fn invariant_point(&self, id: FeatureId) -> Option<&InvariantPoint> {
        self.invpoints.get(&id)
    }

    /// Univariant line by identifier.
    #[must_use]
    pub fn univariant_line(&self, id: FeatureId) -> Option<&UnivariantLine> {
        self.unilines.get(&id)
    }

    /// Invariant points in identifier order.
    pub fn invariant_points(&self) -> impl Iterator<Item = (FeatureId, &InvariantPoint)> + '_ {
        self.invpoints.iter().map(|(id, ip)| (*id, ip))
    }

    /// Univariant lines in identifier order.
    pub fn univariant_lines(&self) -> impl Iterator<Item = (FeatureId, &UnivariantLine)> + '_ {
        self.unilines.iter().map(|(id, ul)| (*id, ul))
    }

    /// Number of invariant points.
    #[must_use]
    pub fn number_of_invariant_points(&self) -> usize {
        self.invpoints.len()
    }

    /// Number of univariant lines.
    #[must_use]
    pub fn number_of_univariant_lines(&self) -> usize {
        self.unilines.len()
    }

    /// Lines bounded at either end by invariant point `point`.
    pub fn lines_through(&self, point: FeatureId) -> impl Iterator<Item = FeatureId> + '_ {
        self.unilines
            .iter()
            .filter(move |(_, ul)| ul.begin() == Some(point) || ul.end() == Some(point))
            .map(|(id, _)| *id)
    }

    // -------------------------------------------------------------------------
    // Mutation
    // -------------------------------------------------------------------------

    /// Stores an invariant point under `id`, replacing any previous one.
    ///
    /// Calculation results of manual points are discarded. Lines bounded by a
    /// replaced point are trimmed again against its new coordinate.
    ///
    /// # Errors
    ///
    /// Returns [`SectionError::Feature`] if the point is malformed.
    pub fn insert_invariant_point(
        &mut self,
        id: FeatureId,
        mut ip: InvariantPoint,
    ) -> Result<(), SectionError> {
        ip.validate()?;
        if ip.is_manual() {
            ip.discard_results();
        }
        ip.set_id(id);
        if self.invpoints.insert(id, ip).is_some() {
            let affected: Vec<FeatureId> = self.lines_through(id).collect();
            for line_id in affected {
                self.trim_line(line_id)?;
            }
        }
        Ok(())
    }

    /// Stores a univariant line under `id`, replacing any previous one, and trims
    /// it.
    ///
    /// # Errors
    ///
    /// Returns [`SectionError::Feature`] if the line is malformed and
    /// [`SectionError::DanglingBound`] if it refers to an unregistered invariant
    /// point.
    pub fn insert_univariant_line(
        &mut self,
        id: FeatureId,
        mut ul: UnivariantLine,
    ) -> Result<(), SectionError> {
        ul.validate()?;
        for point in [ul.begin(), ul.end()].into_iter().flatten() {
            if !self.invpoints.contains_key(&point) {
                return Err(SectionError::DanglingBound { line: id, point });
            }
        }
        if ul.is_manual() {
            ul.discard_results();
        }
        ul.set_id(id);
        self.unilines.insert(id, ul);
        self.trim_line(id)
    }

    /// Removes an invariant point, opening and re-trimming every line bounded by
    /// it.
    ///
    /// # Errors
    ///
    /// Returns [`SectionError::UnknownInvariantPoint`] if there is no such point.
    pub fn remove_invariant_point(&mut self, id: FeatureId) -> Result<InvariantPoint, SectionError> {
        let ip = self
            .invpoints
            .remove(&id)
            .ok_or(SectionError::UnknownInvariantPoint(id))?;
        let affected: Vec<FeatureId> = self.lines_through(id).collect();
        for line_id in affected {
            if let Some(ul) = self.unilines.get_mut(&line_id) {
                let begin = ul.begin().filter(|b| *b != id);
                let end = ul.end().filter(|e| *e != id);
                ul.set_bounds(begin, end);
            }
            self.trim_line(line_id)?;
        }
        tracing::debug!("Removed invariant point {id}; reopened lines bounded by it");
        Ok(ip)
    }

    /// Removes a univariant line.
    ///
    /// # Errors
    ///
    /// Returns [`SectionError::UnknownUnivariantLine`] if there is no such line.
    pub fn remove_univariant_line(&mut self, id: FeatureId) -> Result<UnivariantLine, SectionError> {
        self.unilines
            .remove(&id)
            .ok_or(SectionError::UnknownUnivariantLine(id))
    }
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.kind.name())?;
        writeln!(f, "Univariant lines: {}", self.unilines.len())?;
        writeln!(f, "Invariant points: {}", self.invpoints.len())?;
        writeln!(
            f,
            "{} range: {} {}",
            self.kind.x_axis().var,
            self.xrange.0,
            self.xrange.1
        )?;
        write!(
            f,
            "{} range: {} {}",
            self.kind.y_axis().var,
            self.yrange.0,
            self.yrange.1
        )
    }
}

// =============================================================================
// SERIALIZATION
// =============================================================================

/// Wire form of a [`Section`]; deserialization re-validates every feature.
#[derive(Serialize, Deserialize)]
struct SectionData {
    kind: SectionKind,
    xrange: (f64, f64),
    yrange: (f64, f64),
    #[serde(default)]
    excess: Assemblage,
    invpoints: BTreeMap<FeatureId, InvariantPoint>,
    unilines: BTreeMap<FeatureId, UnivariantLine>,
}

impl From<Section> for SectionData {
    fn from(section: Section) -> Self {
        Self {
            kind: section.kind,
            xrange: section.xrange,
            yrange: section.yrange,
            excess: section.excess,
            invpoints: section.invpoints,
            unilines: section.unilines,
        }
    }
}

impl TryFrom<SectionData> for Section {
    type Error = SectionError;

    fn try_from(data: SectionData) -> Result<Self, Self::Error> {
        let mut section = Self::new(data.kind)
            .with_ranges(data.xrange, data.yrange)?
            .with_excess(data.excess);
        for (id, mut ip) in data.invpoints {
            ip.validate()?;
            ip.set_id(id);
            section.invpoints.insert(id, ip);
        }
        // Stored lines keep their used range and trimmed coordinates verbatim.
        for (id, mut ul) in data.unilines {
            ul.validate()?;
            for point in [ul.begin(), ul.end()].into_iter().flatten() {
                if !section.invpoints.contains_key(&point) {
                    return Err(SectionError::DanglingBound { line: id, point });
                }
            }
            ul.set_id(id);
            section.unilines.insert(id, ul);
        }
        Ok(section)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assemblage;
    use crate::core::invariant_point::InvariantPointBuilder;
    use crate::core::univariant_line::UnivariantLineBuilder;
    use geo::coord;

    fn id(raw: u32) -> FeatureId {
        FeatureId::from_raw(raw).unwrap()
    }

    #[test]
    fn section_kinds_have_expected_axes() {
        assert_eq!(SectionKind::Pt.x_axis().var, "T");
        assert_eq!(SectionKind::Pt.y_axis().var, "p");
        assert_eq!(SectionKind::Tx.y_axis().label, "Composition");
        assert_eq!(SectionKind::Px.x_axis().var, "C");
        assert_eq!(SectionKind::Px.default_ranges(), ((0.0, 1.0), (0.1, 20.0)));
    }

    #[test]
    fn invalid_ranges_are_rejected() {
        let err = Section::new(SectionKind::Pt)
            .with_ranges((200.0, 100.0), (1.0, 2.0))
            .unwrap_err();
        assert!(matches!(err, SectionError::InvalidRange { axis: "T", .. }));
        assert!(
            Section::new(SectionKind::Pt)
                .with_ranges((0.0, 1.0), (f64::NAN, 2.0))
                .is_err()
        );
    }

    #[test]
    fn dangling_bound_is_rejected() {
        let mut section = Section::new(SectionKind::Pt);
        let line = UnivariantLineBuilder::default()
            .phases(assemblage!["g", "bi"])
            .out(assemblage!["g"])
            .samples(vec![coord! { x: 300.0, y: 2.0 }, coord! { x: 400.0, y: 3.0 }])
            .begin(id(4))
            .build()
            .unwrap();
        assert_eq!(
            section.insert_univariant_line(id(1), line),
            Err(SectionError::DanglingBound {
                line: id(1),
                point: id(4)
            })
        );
    }

    #[test]
    fn removing_a_point_opens_its_lines() {
        let mut section = Section::new(SectionKind::Pt);
        let ip = InvariantPointBuilder::default()
            .phases(assemblage!["g", "bi", "mu"])
            .out(assemblage!["g", "mu"])
            .at(350.0, 2.5)
            .build()
            .unwrap();
        section.insert_invariant_point(id(1), ip).unwrap();
        let line = UnivariantLineBuilder::default()
            .phases(assemblage!["g", "bi", "mu"])
            .out(assemblage!["g"])
            .samples(vec![coord! { x: 300.0, y: 2.0 }, coord! { x: 400.0, y: 3.0 }])
            .begin(id(1))
            .build()
            .unwrap();
        section.insert_univariant_line(id(1), line).unwrap();
        assert_eq!(section.lines_through(id(1)).collect::<Vec<_>>(), vec![id(1)]);

        section.remove_invariant_point(id(1)).unwrap();
        let ul = section.univariant_line(id(1)).unwrap();
        assert_eq!(ul.connected(), 0);
        assert_eq!(ul.trimmed(), ul.samples());
        assert!(matches!(
            section.remove_invariant_point(id(1)),
            Err(SectionError::UnknownInvariantPoint(_))
        ));
    }

    #[test]
    fn moving_a_point_retrims_its_lines() {
        let mut section = Section::new(SectionKind::Pt);
        let point = |x: f64, y: f64| {
            InvariantPointBuilder::default()
                .phases(assemblage!["g", "bi", "mu"])
                .out(assemblage!["g", "mu"])
                .at(x, y)
                .build()
                .unwrap()
        };
        section.insert_invariant_point(id(1), point(350.0, 2.5)).unwrap();
        let line = UnivariantLineBuilder::default()
            .phases(assemblage!["g", "bi", "mu"])
            .out(assemblage!["g"])
            .samples(vec![coord! { x: 300.0, y: 2.0 }, coord! { x: 400.0, y: 3.0 }])
            .begin(id(1))
            .build()
            .unwrap();
        section.insert_univariant_line(id(1), line).unwrap();
        assert_eq!(
            section.univariant_line(id(1)).unwrap().trimmed().first(),
            Some(&coord! { x: 350.0, y: 2.5 })
        );

        section.insert_invariant_point(id(1), point(320.0, 2.2)).unwrap();
        let ul = section.univariant_line(id(1)).unwrap();
        assert_eq!(ul.trimmed().first(), Some(&coord! { x: 320.0, y: 2.2 }));
        assert_eq!(ul.trimmed().last(), Some(&coord! { x: 400.0, y: 3.0 }));
    }

    #[test]
    fn display_summarizes_contents() {
        let section = Section::new(SectionKind::Tx);
        let text = section.to_string();
        assert!(text.starts_with("TXsection"));
        assert!(text.contains("Univariant lines: 0"));
        assert!(text.contains("C range: 0 1"));
    }
}
