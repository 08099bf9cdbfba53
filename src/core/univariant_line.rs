//! Univariant lines.
//!
//! A univariant line is a calculated curve along which one phase is at zero mode.
//! The external calculation usually overshoots the physically meaningful span, so
//! each line keeps its full sample sequence together with the [`UsedRange`]
//! selecting the samples between its bounding invariant points, and the derived
//! trimmed coordinate sequence used for rendering and field extraction.

use crate::core::feature::{
    CalcResult, Feature, FeatureError, FeatureId, validate_common,
};
use crate::core::invariant_point::InvariantPoint;
use crate::core::phase::{Assemblage, Phase};
use crate::core::polymorph::POLYMORPHS;
use crate::geometry::polyline::Polyline;
use derive_builder::Builder;
use geo::Coord;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Range;

/// Half-open range of samples lying between the bounding points of a line.
///
/// Invariant: `start <= stop <= samples.len()`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UsedRange {
    /// First used sample.
    pub start: usize,
    /// One past the last used sample.
    pub stop: usize,
}

impl UsedRange {
    /// Range covering `len` samples.
    #[must_use]
    pub const fn full(len: usize) -> Self {
        Self {
            start: 0,
            stop: len,
        }
    }

    /// The empty range.
    #[must_use]
    pub const fn empty() -> Self {
        Self { start: 0, stop: 0 }
    }

    /// Number of used samples.
    #[must_use]
    pub const fn len(self) -> usize {
        self.stop.saturating_sub(self.start)
    }

    /// No sample is used.
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.stop <= self.start
    }

    /// As a slice range.
    #[must_use]
    pub const fn as_range(self) -> Range<usize> {
        self.start..self.stop
    }

    /// The range widened by one sample on each side, clamped to `len`.
    #[must_use]
    pub fn widened(self, len: usize) -> Range<usize> {
        self.start.saturating_sub(1)..(self.stop + 1).min(len)
    }
}

/// A one-dimensional equilibrium feature.
///
/// # Examples
///
/// ```rust
/// use pseudosection::assemblage;
/// use pseudosection::core::feature::FeatureId;
/// use pseudosection::core::univariant_line::UnivariantLineBuilder;
/// use geo::coord;
///
/// let line = UnivariantLineBuilder::default()
///     .phases(assemblage!["g", "bi", "mu", "q"])
///     .out(assemblage!["g"])
///     .samples(vec![coord! { x: 500.0, y: 4.0 }, coord! { x: 550.0, y: 6.0 }])
///     .begin(FeatureId::FIRST)
///     .build()
///     .unwrap();
/// assert_eq!(line.connected(), 1);
/// assert_eq!(line.used().len(), 2);
/// ```
#[derive(Builder, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[builder(build_fn(validate = "Self::validate", error = "FeatureError"))]
pub struct UnivariantLine {
    #[builder(setter(skip))]
    pub(crate) id: Option<FeatureId>,
    /// Phase assemblage.
    #[builder(setter(into))]
    pub(crate) phases: Assemblage,
    /// The single zero-mode phase.
    #[builder(setter(into))]
    pub(crate) out: Assemblage,
    /// Full calculated sample sequence, ordered along the calculation.
    #[builder(default)]
    pub(crate) samples: Vec<Coord<f64>>,
    /// Per-sample calculation payload.
    #[builder(default)]
    pub(crate) results: Vec<CalcResult>,
    /// User-defined rather than calculated.
    #[builder(default)]
    pub(crate) manual: bool,
    /// Calculation input that produced this line.
    #[builder(default, setter(into))]
    pub(crate) cmd: String,
    /// Raw calculation output.
    #[builder(default, setter(into))]
    pub(crate) output: String,
    /// Variance of the calculation.
    #[builder(default)]
    pub(crate) variance: i32,
    /// Invariant point bounding the start of the line, `None` when open.
    #[builder(default, setter(strip_option))]
    #[serde(default, with = "crate::core::feature::raw_bound")]
    pub(crate) begin: Option<FeatureId>,
    /// Invariant point bounding the end of the line, `None` when open.
    #[builder(default, setter(strip_option))]
    #[serde(default, with = "crate::core::feature::raw_bound")]
    pub(crate) end: Option<FeatureId>,
    #[builder(setter(skip), default = "self.full_range()")]
    pub(crate) used: UsedRange,
    #[builder(setter(skip), default = "self.samples.clone().unwrap_or_default()")]
    pub(crate) trimmed: Vec<Coord<f64>>,
}

impl UnivariantLineBuilder {
    fn full_range(&self) -> UsedRange {
        UsedRange::full(self.samples.as_ref().map_or(0, Vec::len))
    }

    fn validate(&self) -> Result<(), FeatureError> {
        let (Some(phases), Some(out)) = (&self.phases, &self.out) else {
            return Ok(());
        };
        validate_common(
            UnivariantLine::KIND,
            phases,
            out,
            1,
            self.samples.as_deref().unwrap_or(&[]),
            self.results.as_deref().unwrap_or(&[]),
            self.manual.unwrap_or(false),
        )
    }
}

impl UnivariantLine {
    /// Bounding invariant point at the start.
    #[must_use]
    pub const fn begin(&self) -> Option<FeatureId> {
        self.begin
    }

    /// Bounding invariant point at the end.
    #[must_use]
    pub const fn end(&self) -> Option<FeatureId> {
        self.end
    }

    /// Sets both bounding invariant points; `None` leaves that end open.
    ///
    /// The trimmed coordinates are stale until the line is trimmed again.
    pub fn set_bounds(&mut self, begin: Option<FeatureId>, end: Option<FeatureId>) {
        self.begin = begin;
        self.end = end;
    }

    /// Number of bounded ends.
    #[must_use]
    pub fn connected(&self) -> usize {
        usize::from(self.begin.is_some()) + usize::from(self.end.is_some())
    }

    /// Full calculated sample sequence.
    #[must_use]
    pub fn samples(&self) -> &[Coord<f64>] {
        &self.samples
    }

    /// Range of samples between the bounding points.
    #[must_use]
    pub const fn used(&self) -> UsedRange {
        self.used
    }

    /// Samples between the bounding points.
    #[must_use]
    pub fn used_samples(&self) -> &[Coord<f64>] {
        self.samples.get(self.used.as_range()).unwrap_or(&[])
    }

    /// Begin coordinate, used samples, end coordinate.
    #[must_use]
    pub fn trimmed(&self) -> &[Coord<f64>] {
        &self.trimmed
    }

    /// Per-sample calculation payload.
    #[must_use]
    pub fn results(&self) -> &[CalcResult] {
        &self.results
    }

    /// Calculation input.
    #[must_use]
    pub fn cmd(&self) -> &str {
        &self.cmd
    }

    /// Raw calculation output.
    #[must_use]
    pub fn output(&self) -> &str {
        &self.output
    }

    /// Calculation variance.
    #[must_use]
    pub const fn variance(&self) -> i32 {
        self.variance
    }

    /// Index of the middle used sample.
    #[must_use]
    pub const fn mid_index(&self) -> usize {
        (self.used.start + self.used.stop) / 2
    }

    /// Starting-guess lines of sample `index`, or of the middle used sample.
    #[must_use]
    pub fn ptguess(&self, index: Option<usize>) -> Option<&[String]> {
        self.results
            .get(index.unwrap_or_else(|| self.mid_index()))
            .map(|r| r.ptguess.as_slice())
    }

    /// Result keys of the middle used sample.
    #[must_use]
    pub fn datakeys(&self, phase: Option<&str>) -> Option<Vec<&str>> {
        self.results.get(self.mid_index())?.datakeys(phase)
    }

    /// Point at half the arclength of the trimmed coordinates.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use pseudosection::assemblage;
    /// use pseudosection::core::univariant_line::UnivariantLineBuilder;
    /// use geo::coord;
    ///
    /// let line = UnivariantLineBuilder::default()
    ///     .phases(assemblage!["g", "bi"])
    ///     .out(assemblage!["g"])
    ///     .samples(vec![
    ///         coord! { x: 0.0, y: 0.0 },
    ///         coord! { x: 4.0, y: 0.0 },
    ///         coord! { x: 4.0, y: 2.0 },
    ///     ])
    ///     .build()
    ///     .unwrap();
    /// assert_eq!(line.label_point(), Some(coord! { x: 3.0, y: 0.0 }));
    /// ```
    #[must_use]
    pub fn label_point(&self) -> Option<Coord<f64>> {
        let curve = Polyline::new(self.trimmed.clone());
        curve.interpolate(curve.length() / 2.0)
    }

    /// Whether `ip` can theoretically terminate this line.
    ///
    /// Metastability is not checked.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use pseudosection::assemblage;
    /// use pseudosection::core::invariant_point::InvariantPointBuilder;
    /// use pseudosection::core::univariant_line::UnivariantLineBuilder;
    ///
    /// let ip = InvariantPointBuilder::default()
    ///     .phases(assemblage!["g", "bi", "mu", "q"])
    ///     .out(assemblage!["g", "mu"])
    ///     .at(560.0, 5.2)
    ///     .build()
    ///     .unwrap();
    /// let through = UnivariantLineBuilder::default()
    ///     .phases(assemblage!["bi", "mu", "q"])
    ///     .out(assemblage!["mu"])
    ///     .build()
    ///     .unwrap();
    /// let elsewhere = UnivariantLineBuilder::default()
    ///     .phases(assemblage!["bi", "chl", "q"])
    ///     .out(assemblage!["chl"])
    ///     .build()
    ///     .unwrap();
    /// assert!(through.contains_invariant_point(&ip));
    /// assert!(!elsewhere.contains_invariant_point(&ip));
    /// ```
    #[must_use]
    pub fn contains_invariant_point(&self, ip: &InvariantPoint) -> bool {
        let mut switch_point = None;
        let mut switch_line = None;
        for pair in POLYMORPHS {
            if pair.is_within(ip.phases()) && !pair.equals(ip.out()) && pair.touches(ip.out()) {
                let poly = pair.to_assemblage();
                switch_point = Some(ip.out().symmetric_difference(&poly));
                if pair.is_within(&self.phases) && pair.touches(&self.out) {
                    switch_line = Some(poly.difference(&self.out));
                }
                break;
            }
        }

        if terminates(&self.phases, &self.out, ip.phases(), ip.out()) {
            return true;
        }
        if let Some(out) = switch_point {
            if terminates(&self.phases, &self.out, ip.phases(), &out) {
                return true;
            }
        }
        switch_line.is_some_and(|out| terminates(&self.phases, &out, ip.phases(), ip.out()))
    }

    pub(crate) fn discard_results(&mut self) {
        self.results.clear();
    }
}

/// Line `(line_phases, line_out)` ends at a point `(point_phases, point_out)`.
fn terminates(
    line_phases: &Assemblage,
    line_out: &Assemblage,
    point_phases: &Assemblage,
    point_out: &Assemblage,
) -> bool {
    if point_phases == line_phases && point_out.difference(line_out).len() == 1 {
        return true;
    }
    let single = |p: &Phase| -> Assemblage { [p.clone()].into_iter().collect() };
    point_out.iter().any(|a| {
        let aset = single(a);
        let others = point_out.difference(&aset);
        others
            .iter()
            .any(|b| point_phases.difference(&single(b)) == *line_phases && aset == *line_out)
    })
}

impl Feature for UnivariantLine {
    const KIND: &'static str = "Univariant line";

    fn id(&self) -> Option<FeatureId> {
        self.id
    }

    fn set_id(&mut self, id: FeatureId) {
        self.id = Some(id);
    }

    fn phases(&self) -> &Assemblage {
        &self.phases
    }

    fn out(&self) -> &Assemblage {
        &self.out
    }

    fn set_out(&mut self, out: Assemblage) {
        self.out = out;
    }

    fn is_manual(&self) -> bool {
        self.manual
    }

    fn validate(&self) -> Result<(), FeatureError> {
        validate_common(
            Self::KIND,
            &self.phases,
            &self.out,
            1,
            &self.samples,
            &self.results,
            self.manual,
        )?;
        if self.used.start > self.used.stop || self.used.stop > self.samples.len() {
            return Err(FeatureError::UsedRangeOutOfBounds {
                start: self.used.start,
                stop: self.used.stop,
                len: self.samples.len(),
            });
        }
        Ok(())
    }
}

impl fmt::Display for UnivariantLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Uni: {}", self.label(&Assemblage::new()))
    }
}
